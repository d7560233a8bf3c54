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
use crate::headers::HeaderStore;
use crate::observability::{EventSink, LifecycleEvent};
use crate::rewrite::FilterConfiguration;
use log::error;
use std::rc::Rc;

/// Header rewritten by the filter.
pub const PATH_HEADER: &str = ":path";

/// What the host should do after the request headers were processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    Continue,
    StopIteration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Created,
    HeadersProcessed,
    Completed,
    Deleted,
}

/// Per-request context. Rewrites `:path` once, then only tracks lifecycle.
pub struct RequestHandler {
    request_id: u32,
    config: Rc<FilterConfiguration>,
    sink: Rc<dyn EventSink>,
    state: HandlerState,
}

impl RequestHandler {
    pub(crate) fn new(
        request_id: u32,
        config: Rc<FilterConfiguration>,
        sink: Rc<dyn EventSink>,
    ) -> Self {
        sink.emit(&LifecycleEvent::HandlerCreated { request_id });
        Self {
            request_id,
            config,
            sink,
            state: HandlerState::Created,
        }
    }

    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn on_request_headers<H: HeaderStore + ?Sized>(
        &mut self,
        headers: &mut H,
        header_count: usize,
        end_of_stream: bool,
    ) -> FilterStatus {
        self.sink.emit(&LifecycleEvent::RequestHeaders {
            request_id: self.request_id,
            header_count,
            end_of_stream,
        });
        if self.state != HandlerState::Created {
            return FilterStatus::Continue;
        }
        self.state = HandlerState::HeadersProcessed;

        match self.rewrite_path(headers) {
            Ok(()) => FilterStatus::Continue,
            Err(err) => {
                error!("context_id={} failed to rewrite {}: {}", self.request_id, PATH_HEADER, err);
                FilterStatus::StopIteration
            }
        }
    }

    fn rewrite_path<H: HeaderStore + ?Sized>(&self, headers: &mut H) -> Result<(), FilterError> {
        let value = match headers.get(PATH_HEADER)? {
            Some(value) => value,
            None => return Ok(()),
        };
        let edit = self.config.rewrite(&value);
        if edit == value.as_str() {
            return Ok(());
        }
        headers.replace(PATH_HEADER, &edit)?;
        self.sink.emit(&LifecycleEvent::HeaderRewritten {
            request_id: self.request_id,
            header: PATH_HEADER,
            from: &value,
            to: &edit,
        });
        Ok(())
    }

    /// Always lets the host keep its default response handling.
    pub fn on_stream_complete(&mut self) -> bool {
        if matches!(self.state, HandlerState::Created | HandlerState::HeadersProcessed) {
            self.state = HandlerState::Completed;
            self.sink.emit(&LifecycleEvent::StreamComplete {
                request_id: self.request_id,
            });
        }
        true
    }

    /// Safe at any point after creation, and more than once.
    pub fn on_delete(&mut self) {
        if self.state == HandlerState::Deleted {
            return;
        }
        self.state = HandlerState::Deleted;
        self.sink.emit(&LifecycleEvent::HandlerDeleted {
            request_id: self.request_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::testing::UnavailableHeaders;
    use crate::headers::MemoryHeaders;
    use crate::observability::testing::RecordingSink;

    fn handler(request_id: u32) -> (RequestHandler, Rc<RecordingSink>) {
        let sink = Rc::new(RecordingSink::default());
        let config = Rc::new(FilterConfiguration::shipped().unwrap());
        (RequestHandler::new(request_id, config, sink.clone()), sink)
    }

    #[test]
    fn test_rewrites_path_in_place() {
        let (mut handler, sink) = handler(1);
        let mut headers = MemoryHeaders::new().with(PATH_HEADER, "/fruit/banana/42/extra");

        assert_eq!(handler.on_request_headers(&mut headers, 3, true), FilterStatus::Continue);
        assert_eq!(headers.value(PATH_HEADER), Some("/fruit/status/42/extra"));
        assert_eq!(headers.reads(), 1);
        assert_eq!(headers.writes(), 1);
        assert_eq!(handler.state(), HandlerState::HeadersProcessed);
        assert!(sink
            .events()
            .contains(&"event=request_headers context_id=1 header_count=3 end_of_stream=true".to_string()));
        assert_eq!(sink.count("header_rewritten"), 1);
    }

    #[test]
    fn test_unmatched_path_is_not_written() {
        let (mut handler, sink) = handler(2);
        let mut headers = MemoryHeaders::new().with(PATH_HEADER, "/fruit/apple/42");

        assert_eq!(handler.on_request_headers(&mut headers, 1, false), FilterStatus::Continue);
        assert_eq!(headers.value(PATH_HEADER), Some("/fruit/apple/42"));
        assert_eq!(headers.writes(), 0);
        assert_eq!(sink.count("header_rewritten"), 0);
    }

    #[test]
    fn test_match_producing_same_text_is_not_written() {
        let sink = Rc::new(RecordingSink::default());
        let config = Rc::new(FilterConfiguration::new("status/([0-9]+)", "status/$1").unwrap());
        let mut handler = RequestHandler::new(3, config, sink);
        let mut headers = MemoryHeaders::new().with(PATH_HEADER, "/status/200");

        handler.on_request_headers(&mut headers, 1, true);
        assert_eq!(headers.writes(), 0);
    }

    #[test]
    fn test_missing_path_continues_without_write() {
        let (mut handler, _) = handler(4);
        let mut headers = MemoryHeaders::new().with(":method", "GET");

        assert_eq!(handler.on_request_headers(&mut headers, 1, true), FilterStatus::Continue);
        assert_eq!(headers.reads(), 1);
        assert_eq!(headers.writes(), 0);
        assert_eq!(headers.value(PATH_HEADER), None);
    }

    #[test]
    fn test_read_failure_stops_without_write() {
        let (mut handler, _) = handler(5);
        let mut headers = UnavailableHeaders::on_read();

        assert_eq!(handler.on_request_headers(&mut headers, 1, true), FilterStatus::StopIteration);
        assert_eq!(headers.inner.writes(), 0);
        assert_eq!(headers.inner.value(PATH_HEADER), Some("/banana/1"));
    }

    #[test]
    fn test_write_failure_stops() {
        let (mut handler, sink) = handler(6);
        let mut headers = UnavailableHeaders::on_write();

        assert_eq!(handler.on_request_headers(&mut headers, 1, true), FilterStatus::StopIteration);
        assert_eq!(sink.count("header_rewritten"), 0);
    }

    #[test]
    fn test_headers_are_processed_once() {
        let (mut handler, _) = handler(7);
        let mut headers = MemoryHeaders::new().with(PATH_HEADER, "/banana/1");

        handler.on_request_headers(&mut headers, 1, false);
        headers.replace(PATH_HEADER, "/banana/2").unwrap();
        assert_eq!(handler.on_request_headers(&mut headers, 1, true), FilterStatus::Continue);

        assert_eq!(headers.reads(), 1);
        assert_eq!(headers.value(PATH_HEADER), Some("/banana/2"));
    }

    #[test]
    fn test_full_lifecycle() {
        let (mut handler, sink) = handler(8);
        assert_eq!(handler.state(), HandlerState::Created);

        let mut headers = MemoryHeaders::new().with(PATH_HEADER, "/banana/");
        handler.on_request_headers(&mut headers, 2, true);
        assert_eq!(headers.value(PATH_HEADER), Some("/status/"));

        assert!(handler.on_stream_complete());
        assert_eq!(handler.state(), HandlerState::Completed);
        handler.on_delete();
        assert_eq!(handler.state(), HandlerState::Deleted);

        let names: Vec<String> = sink
            .events()
            .iter()
            .map(|e| e.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "event=handler_created",
                "event=request_headers",
                "event=header_rewritten",
                "event=stream_complete",
                "event=handler_deleted",
            ]
        );
    }

    #[test]
    fn test_delete_without_headers() {
        let (mut handler, sink) = handler(9);
        handler.on_delete();
        handler.on_delete();
        assert_eq!(handler.state(), HandlerState::Deleted);
        assert_eq!(sink.count("handler_deleted"), 1);

        // Completion after deletion does not resurrect the handler.
        assert!(handler.on_stream_complete());
        assert_eq!(handler.state(), HandlerState::Deleted);
        assert_eq!(sink.count("stream_complete"), 0);
    }

    #[test]
    fn test_complete_without_headers() {
        let (mut handler, sink) = handler(10);
        assert!(handler.on_stream_complete());
        assert!(handler.on_stream_complete());
        assert_eq!(handler.state(), HandlerState::Completed);
        assert_eq!(sink.count("stream_complete"), 1);
    }

    #[test]
    fn test_concurrent_handlers_share_configuration() {
        let sink = Rc::new(RecordingSink::default());
        let config = Rc::new(FilterConfiguration::shipped().unwrap());
        let mut first = RequestHandler::new(11, config.clone(), sink.clone());
        let mut second = RequestHandler::new(12, config.clone(), sink);

        let mut first_headers = MemoryHeaders::new().with(PATH_HEADER, "/banana/1");
        let mut second_headers = MemoryHeaders::new().with(PATH_HEADER, "/x/banana/22/y");

        second.on_request_headers(&mut second_headers, 1, true);
        first.on_request_headers(&mut first_headers, 1, true);

        assert_eq!(first_headers.value(PATH_HEADER), Some("/status/1"));
        assert_eq!(second_headers.value(PATH_HEADER), Some("/x/status/22/y"));
        assert_eq!(Rc::strong_count(&config), 3);
    }

    /// Raw byte store decoded the same way the host header map is.
    struct RawHeaders {
        path: Vec<u8>,
        writes: usize,
    }

    impl HeaderStore for RawHeaders {
        fn get(&self, key: &str) -> Result<Option<String>, FilterError> {
            crate::headers::decode_value(key, Some(self.path.clone()))
        }

        fn replace(&mut self, _: &str, value: &str) -> Result<(), FilterError> {
            self.writes += 1;
            self.path = value.as_bytes().to_vec();
            Ok(())
        }
    }

    #[test]
    fn test_non_utf8_path_stops_without_write() {
        let (mut handler, _) = handler(13);
        let mut headers = RawHeaders {
            path: b"/banana/\xff".to_vec(),
            writes: 0,
        };

        assert_eq!(handler.on_request_headers(&mut headers, 1, true), FilterStatus::StopIteration);
        assert_eq!(headers.writes, 0);
    }
}
