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
use crate::rewrite::{FilterConfiguration, DEFAULT_PATTERN, DEFAULT_REPLACEMENT};
use log::Level;
use serde::Deserialize;
use std::str::FromStr;

/// Plugin configuration as delivered by the host, e.g.
/// `{"pattern": "banana/([0-9]*)", "replacement": "status/$1", "log_level": "warn"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    pub pattern: String,
    pub replacement: String,
    pub log_level: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            replacement: DEFAULT_REPLACEMENT.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl PluginConfig {
    /// Parses the raw plugin configuration. Blank input selects the defaults.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FilterError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Severity used for lifecycle events.
    pub fn log_level(&self) -> Result<Level, FilterError> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| FilterError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn filter_configuration(&self) -> Result<FilterConfiguration, FilterError> {
        FilterConfiguration::new(&self.pattern, &self.replacement)
    }
}
