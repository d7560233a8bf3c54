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

//! # Lifecycle Events
//!
//! Every factory and handler transition is reported as a [`LifecycleEvent`]
//! to an [`EventSink`]. The default sink, [`LogSink`], writes the event as a
//! `key=value` line through the `log` facade at a configurable severity.
//! Emitting an event never fails the request.

use log::Level;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent<'a> {
    FilterConfigured {
        name: &'a str,
        pattern: &'a str,
        replacement: &'a str,
    },
    HandlerCreated {
        request_id: u32,
    },
    RequestHeaders {
        request_id: u32,
        header_count: usize,
        end_of_stream: bool,
    },
    HeaderRewritten {
        request_id: u32,
        header: &'a str,
        from: &'a str,
        to: &'a str,
    },
    StreamComplete {
        request_id: u32,
    },
    HandlerDeleted {
        request_id: u32,
    },
    FilterTeardown {
        name: &'a str,
    },
}

impl LifecycleEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::FilterConfigured { .. } => "filter_configured",
            LifecycleEvent::HandlerCreated { .. } => "handler_created",
            LifecycleEvent::RequestHeaders { .. } => "request_headers",
            LifecycleEvent::HeaderRewritten { .. } => "header_rewritten",
            LifecycleEvent::StreamComplete { .. } => "stream_complete",
            LifecycleEvent::HandlerDeleted { .. } => "handler_deleted",
            LifecycleEvent::FilterTeardown { .. } => "filter_teardown",
        }
    }
}

impl fmt::Display for LifecycleEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "event={}", self.name())?;
        match self {
            LifecycleEvent::FilterConfigured {
                name,
                pattern,
                replacement,
            } => write!(
                f,
                " filter={} pattern={:?} replacement={:?}",
                name, pattern, replacement
            ),
            LifecycleEvent::HandlerCreated { request_id }
            | LifecycleEvent::StreamComplete { request_id }
            | LifecycleEvent::HandlerDeleted { request_id } => {
                write!(f, " context_id={}", request_id)
            }
            LifecycleEvent::RequestHeaders {
                request_id,
                header_count,
                end_of_stream,
            } => write!(
                f,
                " context_id={} header_count={} end_of_stream={}",
                request_id, header_count, end_of_stream
            ),
            LifecycleEvent::HeaderRewritten {
                request_id,
                header,
                from,
                to,
            } => write!(
                f,
                " context_id={} header={} from={:?} to={:?}",
                request_id, header, from, to
            ),
            LifecycleEvent::FilterTeardown { name } => write!(f, " filter={}", name),
        }
    }
}

/// Receives lifecycle events from a factory and its handlers.
pub trait EventSink {
    fn emit(&self, event: &LifecycleEvent);
}

/// Forwards lifecycle events to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    level: Level,
}

impl LogSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(Level::Warn)
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: &LifecycleEvent) {
        log::log!(self.level, "{}", event);
    }
}
