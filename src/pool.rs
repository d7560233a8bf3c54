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

use crate::error::FilterError;
use crate::factory::FilterFactory;
use crate::handler::{FilterStatus, RequestHandler};
use crate::headers::HeaderStore;
use std::collections::HashMap;

/// Open handlers keyed by request id, for hosts that drive the lifecycle
/// through explicit create and destroy calls.
pub struct HandlerPool {
    factory: FilterFactory,
    handlers: HashMap<u32, RequestHandler>,
}

impl HandlerPool {
    pub fn new(factory: FilterFactory) -> Self {
        Self {
            factory,
            handlers: HashMap::new(),
        }
    }

    pub fn open(&mut self, request_id: u32) -> Result<(), FilterError> {
        if self.handlers.contains_key(&request_id) {
            return Err(FilterError::DuplicateRequest(request_id));
        }
        let handler = self.factory.create_handler(request_id);
        self.handlers.insert(request_id, handler);
        Ok(())
    }

    pub fn on_request_headers<H: HeaderStore + ?Sized>(
        &mut self,
        request_id: u32,
        headers: &mut H,
        header_count: usize,
        end_of_stream: bool,
    ) -> Result<FilterStatus, FilterError> {
        let handler = self
            .handlers
            .get_mut(&request_id)
            .ok_or(FilterError::UnknownRequest(request_id))?;
        Ok(handler.on_request_headers(headers, header_count, end_of_stream))
    }

    pub fn on_stream_complete(&mut self, request_id: u32) -> Result<bool, FilterError> {
        let handler = self
            .handlers
            .get_mut(&request_id)
            .ok_or(FilterError::UnknownRequest(request_id))?;
        Ok(handler.on_stream_complete())
    }

    /// Deletes the handler for `request_id`. Returns false if none was open.
    pub fn close(&mut self, request_id: u32) -> bool {
        match self.handlers.remove(&request_id) {
            Some(mut handler) => {
                handler.on_delete();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deletes every open handler and tears the factory down.
    pub fn teardown(mut self) -> FilterFactory {
        for (_, mut handler) in self.handlers.drain() {
            handler.on_delete();
        }
        self.factory.on_teardown();
        self.factory
    }
}
