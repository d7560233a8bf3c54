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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("filter name must not be empty")]
    EmptyName,
    #[error("a filter named {0:?} is already registered")]
    DuplicateName(String),
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern {pattern:?} has {groups} capture groups, at most one is supported")]
    TooManyGroups { pattern: String, groups: usize },
    #[error("invalid plugin configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
    #[error("host call {call} failed: {reason}")]
    HostCall { call: &'static str, reason: String },
    #[error("no handler is open for request {0}")]
    UnknownRequest(u32),
    #[error("a handler is already open for request {0}")]
    DuplicateRequest(u32),
}

impl FilterError {
    /// Configuration errors refuse the filter load; everything else is
    /// scoped to a single request.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FilterError::EmptyName
                | FilterError::DuplicateName(_)
                | FilterError::InvalidPattern { .. }
                | FilterError::TooManyGroups { .. }
                | FilterError::InvalidConfig(_)
                | FilterError::InvalidLogLevel(_)
        )
    }
}
