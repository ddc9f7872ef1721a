// Copyright 2025 eraflo
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

//! Optional on-disk run configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Represents the structure of a run configuration file.
///
/// Every field is optional; command-line flags win over file values, and
/// anything left unset falls back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Arbitration policy name: `naive`, `ordered`, or `monitor`.
    pub policy: Option<String>,
    /// Meals each philosopher eats.
    pub meals: Option<u32>,
    /// Ring size; ignored when `names` is present.
    pub seats: Option<usize>,
    /// Explicit seat names, in ring order.
    pub names: Option<Vec<String>>,
    /// Thinking pause in milliseconds.
    pub think_ms: Option<u64>,
    /// Eating pause in milliseconds.
    pub eat_ms: Option<u64>,
    /// Abort the run if it has not finished after this many milliseconds.
    pub deadline_ms: Option<u64>,
}

impl RunFile {
    /// Loads and parses `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("could not parse config file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_file() {
        let file: RunFile = toml::from_str(
            r#"
            policy = "ordered"
            meals = 3
            seats = 8
            think_ms = 100
            eat_ms = 250
            deadline_ms = 60000
            "#,
        )
        .unwrap();
        assert_eq!(file.policy.as_deref(), Some("ordered"));
        assert_eq!(file.meals, Some(3));
        assert_eq!(file.seats, Some(8));
        assert_eq!(file.think_ms, Some(100));
        assert_eq!(file.eat_ms, Some(250));
        assert_eq!(file.deadline_ms, Some(60_000));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result: Result<RunFile, _> = toml::from_str("forks = 5");
        assert!(result.is_err());
    }

    #[test]
    fn an_empty_file_is_all_defaults() {
        let file: RunFile = toml::from_str("").unwrap();
        assert!(file.policy.is_none());
        assert!(file.names.is_none());
    }
}
