// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # regex-repl
//!
//! Proxy-Wasm filter that rewrites the `:path` request header: the first
//! match of a configured regular expression is replaced with a template that
//! may reference the pattern's capture group, e.g. `banana/([0-9]*)` with
//! `status/$1` turns `/fruit/banana/42` into `/fruit/status/42`.
//!
//! The host-independent pieces (rule, factory, handler, pool) build on any
//! target. The Proxy-Wasm entry points are only compiled for `wasm32`.

pub mod config;
pub mod error;
pub mod factory;
pub mod handler;
pub mod headers;
pub mod observability;
pub mod pool;
pub mod rewrite;

#[cfg(target_arch = "wasm32")]
mod plugin;

pub use config::PluginConfig;
pub use error::FilterError;
pub use factory::{FilterFactory, FilterRegistry};
pub use handler::{FilterStatus, HandlerState, RequestHandler, PATH_HEADER};
pub use headers::{HeaderStore, MemoryHeaders};
pub use observability::{EventSink, LifecycleEvent, LogSink};
pub use pool::HandlerPool;
pub use rewrite::FilterConfiguration;
