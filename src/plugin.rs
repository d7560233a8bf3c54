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

use crate::config::PluginConfig;
use crate::error::FilterError;
use crate::factory::{registration_name, FilterFactory, FilterRegistry};
use crate::handler::{FilterStatus, RequestHandler};
use crate::headers::{decode_value, HeaderStore};
use crate::observability::LogSink;
use log::{error, info, warn};
use proxy_wasm::hostcalls;
use proxy_wasm::traits::*;
use proxy_wasm::types::*;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static REGISTRY: RefCell<FilterRegistry> = RefCell::new(FilterRegistry::new());
}

proxy_wasm::main! {{
    proxy_wasm::set_log_level(LogLevel::Trace);
    proxy_wasm::set_root_context(|context_id| -> Box<dyn RootContext> {
        Box::new(RegexReplRoot { context_id, factory: None })
    });
}}

struct RegexReplRoot {
    context_id: u32,
    factory: Option<FilterFactory>,
}

impl RegexReplRoot {
    fn filter_name(&self) -> String {
        let root_id = self
            .get_property(vec!["plugin_root_id"])
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default();
        registration_name(&root_id, self.context_id)
    }

    fn configure(&mut self) -> Result<(), FilterError> {
        let raw = self.get_plugin_configuration().unwrap_or_default();
        let config = PluginConfig::from_bytes(&raw)?;
        let level = config.log_level()?;
        let rule = config.filter_configuration()?;
        let name = self.filter_name();

        REGISTRY.with(|registry| {
            registry.borrow_mut().reconfigure(
                &mut self.factory,
                &name,
                rule,
                Rc::new(LogSink::new(level)),
            )
        })
    }
}

impl Context for RegexReplRoot {
    fn on_done(&mut self) -> bool {
        if let Some(mut factory) = self.factory.take() {
            factory.on_teardown();
            REGISTRY.with(|registry| registry.borrow_mut().release(factory.name()));
        }
        true
    }
}

impl RootContext for RegexReplRoot {
    fn on_vm_start(&mut self, _: usize) -> bool {
        info!("context_id={} vm started", self.context_id);
        true
    }

    fn on_configure(&mut self, _: usize) -> bool {
        match self.configure() {
            Ok(()) => true,
            Err(err) => {
                error!("context_id={} rejecting configuration: {}", self.context_id, err);
                false
            }
        }
    }

    fn create_http_context(&self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        let handler = self
            .factory
            .as_ref()
            .map(|factory| factory.create_handler(context_id));
        if handler.is_none() {
            warn!("context_id={} filter is not configured", context_id);
        }
        Some(Box::new(RegexReplHttp { handler }))
    }

    fn get_type(&self) -> Option<ContextType> {
        Some(ContextType::HttpContext)
    }
}

/// Request headers of the stream currently being dispatched.
struct HostRequestHeaders;

impl HeaderStore for HostRequestHeaders {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError> {
        let raw = hostcalls::get_map_value_bytes(MapType::HttpRequestHeaders, key).map_err(
            |status| FilterError::HostCall {
                call: "get_map_value_bytes",
                reason: format!("{:?}", status),
            },
        )?;
        decode_value(key, raw)
    }

    fn replace(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        hostcalls::set_map_value(MapType::HttpRequestHeaders, key, Some(value)).map_err(|status| {
            FilterError::HostCall {
                call: "set_map_value",
                reason: format!("{:?}", status),
            }
        })
    }
}

/// Without a handler the root was never configured; requests fail closed.
struct RegexReplHttp {
    handler: Option<RequestHandler>,
}

impl RegexReplHttp {
    fn fail_closed(&self) -> Action {
        // Do not forward a request whose path may be stale.
        self.send_http_response(500, vec![], Some(b"Request path could not be rewritten.\n"));
        Action::Pause
    }
}

impl Drop for RegexReplHttp {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.as_mut() {
            handler.on_delete();
        }
    }
}

impl Context for RegexReplHttp {
    fn on_done(&mut self) -> bool {
        self.handler
            .as_mut()
            .map_or(true, |handler| handler.on_stream_complete())
    }
}

impl HttpContext for RegexReplHttp {
    fn on_http_request_headers(&mut self, num_headers: usize, end_of_stream: bool) -> Action {
        let status = match self.handler.as_mut() {
            Some(handler) => {
                handler.on_request_headers(&mut HostRequestHeaders, num_headers, end_of_stream)
            }
            None => FilterStatus::StopIteration,
        };
        match status {
            FilterStatus::Continue => Action::Continue,
            FilterStatus::StopIteration => self.fail_closed(),
        }
    }
}
