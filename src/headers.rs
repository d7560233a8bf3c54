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
use std::cell::Cell;
use std::collections::HashMap;

/// Header surface of the current request.
///
/// Envoy's "headers" include the colon-prefixed pseudo headers such as
/// `:path`, `:method` and `:authority` alongside regular HTTP headers.
pub trait HeaderStore {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError>;
    /// Sets `key` to `value`, replacing any existing value.
    fn replace(&mut self, key: &str, value: &str) -> Result<(), FilterError>;
}

/// Decodes a raw header value read from the host. Values that are not
/// UTF-8 are reported as a failed host read.
pub fn decode_value(key: &str, raw: Option<Vec<u8>>) -> Result<Option<String>, FilterError> {
    raw.map(|bytes| {
        String::from_utf8(bytes).map_err(|err| FilterError::HostCall {
            call: "get_map_value_bytes",
            reason: format!("{} is not valid UTF-8: {}", key, err),
        })
    })
    .transpose()
}

/// In-process header store for embedders that own their own request state.
///
/// Counts the reads and writes made through [`HeaderStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryHeaders {
    values: HashMap<String, String>,
    reads: Cell<usize>,
    writes: usize,
}

impl MemoryHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Looks a value up without counting a read.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl HeaderStore for MemoryHeaders {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.values.get(key).cloned())
    }

    fn replace(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        self.writes += 1;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_headers_get_and_replace() {
        let mut headers = MemoryHeaders::new().with(":path", "/a");
        assert_eq!(headers.get(":path").unwrap().as_deref(), Some("/a"));
        assert_eq!(headers.get(":method").unwrap(), None);

        headers.replace(":path", "/b").unwrap();
        assert_eq!(headers.value(":path"), Some("/b"));
        assert_eq!(headers.reads(), 2);
        assert_eq!(headers.writes(), 1);
    }

    #[test]
    fn test_replace_creates_missing_header() {
        let mut headers = MemoryHeaders::new();
        headers.replace("x-new", "1").unwrap();
        assert_eq!(headers.value("x-new"), Some("1"));
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value(":path", None).unwrap(), None);
        assert_eq!(
            decode_value(":path", Some(b"/banana/1".to_vec())).unwrap().as_deref(),
            Some("/banana/1")
        );
    }

    #[test]
    fn test_decode_value_rejects_invalid_utf8() {
        let err = decode_value(":path", Some(vec![b'/', 0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, FilterError::HostCall { call: "get_map_value_bytes", .. }));
        assert!(!err.is_config());
    }
}
