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

//! # Rewrite Rule
//!
//! A compiled pattern plus replacement template, applied to a single header
//! value. The replacement follows the `regex` crate conventions: `$1` or
//! `${1}` expands to the first capture group, `$$` is a literal dollar sign,
//! and a group that is absent or did not participate in the match expands to
//! nothing.

use crate::error::FilterError;
use regex::Regex;
use std::borrow::Cow;

/// Pattern shipped with the filter when no configuration is supplied.
pub const DEFAULT_PATTERN: &str = "banana/([0-9]*)";
/// Replacement shipped with the filter when no configuration is supplied.
pub const DEFAULT_REPLACEMENT: &str = "status/$1";

/// Immutable rewrite rule shared by every handler of one filter.
#[derive(Debug, Clone)]
pub struct FilterConfiguration {
    pattern: Regex,
    replacement: String,
}

impl FilterConfiguration {
    /// Compiles `pattern` and pairs it with `replacement`.
    ///
    /// Fails if the pattern does not parse or declares more than one
    /// capture group.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, FilterError> {
        let compiled = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        // captures_len() counts the implicit whole-match group.
        let groups = compiled.captures_len() - 1;
        if groups > 1 {
            return Err(FilterError::TooManyGroups {
                pattern: pattern.to_string(),
                groups,
            });
        }
        Ok(Self {
            pattern: compiled,
            replacement: replacement.to_string(),
        })
    }

    /// `DEFAULT_PATTERN` paired with `DEFAULT_REPLACEMENT`.
    pub fn shipped() -> Result<Self, FilterError> {
        Self::new(DEFAULT_PATTERN, DEFAULT_REPLACEMENT)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces the first match of the pattern in `value`.
    ///
    /// Returns the input borrowed when nothing matched.
    pub fn rewrite<'a>(&self, value: &'a str) -> Cow<'a, str> {
        self.pattern.replace(value, self.replacement.as_str())
    }
}
