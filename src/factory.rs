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

//! # Filter Factory
//!
//! A [`FilterRegistry`] hands out uniquely named [`FilterFactory`] values.
//! Each factory owns one immutable [`FilterConfiguration`] and builds a
//! [`RequestHandler`] per request. Handlers share the configuration by
//! reference count, never by copy.

use crate::error::FilterError;
use crate::handler::RequestHandler;
use crate::observability::{EventSink, LifecycleEvent, LogSink};
use crate::rewrite::FilterConfiguration;
use std::collections::HashSet;
use std::rc::Rc;

/// Root id assumed when the host does not supply one.
pub const DEFAULT_FILTER_NAME: &str = "regex-repl";

/// Registration name of one root context.
///
/// Every plugin configuration loaded into a VM gets its own root context,
/// and several of them may share a root id, so the context id is part of
/// the name.
pub fn registration_name(root_id: &str, context_id: u32) -> String {
    let root_id = if root_id.is_empty() {
        DEFAULT_FILTER_NAME
    } else {
        root_id
    };
    format!("{}/{}", root_id, context_id)
}

/// Names of the filters currently loaded.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    names: HashSet<String>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the rule and registers a factory for it under `name`.
    pub fn initialize(
        &mut self,
        name: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<FilterFactory, FilterError> {
        let config = FilterConfiguration::new(pattern, replacement)?;
        self.initialize_with(name, config)
    }

    pub fn initialize_with(
        &mut self,
        name: &str,
        config: FilterConfiguration,
    ) -> Result<FilterFactory, FilterError> {
        if name.is_empty() {
            return Err(FilterError::EmptyName);
        }
        if self.names.contains(name) {
            return Err(FilterError::DuplicateName(name.to_string()));
        }
        self.names.insert(name.to_string());
        Ok(FilterFactory::new(name, config))
    }

    /// Swaps the factory held in `current` for one built from `config`.
    ///
    /// The previous factory is torn down only once the new one is
    /// registered. On error `current` and its registration are untouched.
    pub fn reconfigure(
        &mut self,
        current: &mut Option<FilterFactory>,
        name: &str,
        config: FilterConfiguration,
        sink: Rc<dyn EventSink>,
    ) -> Result<(), FilterError> {
        let holds_name = current.as_ref().map_or(false, |f| f.name() == name);
        let next = if holds_name {
            FilterFactory::new(name, config)
        } else {
            self.initialize_with(name, config)?
        };
        if let Some(mut previous) = current.replace(next.with_sink(sink)) {
            previous.on_teardown();
            if !holds_name {
                self.release(previous.name());
            }
        }
        Ok(())
    }

    /// Frees `name` for a later registration. Returns whether it was held.
    pub fn release(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

pub struct FilterFactory {
    name: String,
    config: Rc<FilterConfiguration>,
    sink: Rc<dyn EventSink>,
    torn_down: bool,
}

impl FilterFactory {
    fn new(name: &str, config: FilterConfiguration) -> Self {
        Self {
            name: name.to_string(),
            config: Rc::new(config),
            sink: Rc::new(LogSink::default()),
            torn_down: false,
        }
    }

    /// Routes lifecycle events of this factory and its handlers to `sink`,
    /// starting with a `filter_configured` event.
    pub fn with_sink(mut self, sink: Rc<dyn EventSink>) -> Self {
        self.sink = sink;
        self.sink.emit(&LifecycleEvent::FilterConfigured {
            name: &self.name,
            pattern: self.config.pattern(),
            replacement: self.config.replacement(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Rc<FilterConfiguration> {
        &self.config
    }

    pub fn create_handler(&self, request_id: u32) -> RequestHandler {
        RequestHandler::new(request_id, self.config.clone(), self.sink.clone())
    }

    /// Called once when the filter is unloaded. Later calls do nothing.
    pub fn on_teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.sink.emit(&LifecycleEvent::FilterTeardown { name: &self.name });
    }
}
