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

//! Error types for table construction and coordination.
//!
//! Misuse of the shared fork state (releasing a fork that is free, or held by
//! another seat) is a programming error, not a runtime condition, and panics
//! instead of appearing here.

use std::fmt;
use std::time::Duration;

use crate::policy::PolicyKind;

/// An error surfaced by the table coordinator.
#[derive(Debug)]
pub enum TableError {
    /// The configured ring has fewer than three seats, which cannot form a
    /// table where every fork is shared by two distinct neighbors.
    TableTooSmall {
        /// The number of seats that was requested.
        seats: usize,
    },
    /// The OS refused to start a philosopher thread. By the time this is
    /// returned, every philosopher that did start has been cancelled and
    /// joined.
    Spawn {
        /// The name of the philosopher whose thread could not be started.
        name: String,
        /// The underlying OS error.
        source: std::io::Error,
    },
    /// The run did not finish before its deadline: at least one philosopher
    /// was still blocked when time ran out. Under the naive policy this is
    /// the expected signature of the ring deadlocking; under the other
    /// policies it would indicate a genuine bug.
    Stalled {
        /// The policy the table was running.
        policy: PolicyKind,
        /// How long the coordinator waited before giving up.
        waited: Duration,
    },
    /// A fork acquisition was abandoned because the table was cancelled.
    /// Philosophers translate this into an early exit from their dining loop;
    /// it never escapes the coordinator.
    Cancelled,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::TableTooSmall { seats } => {
                write!(f, "a table of {seats} seat(s) cannot form a ring; at least 3 are required")
            }
            TableError::Spawn { name, .. } => {
                write!(f, "failed to start the thread for philosopher '{name}'")
            }
            TableError::Stalled { policy, waited } => {
                write!(
                    f,
                    "{policy} table still had blocked philosophers after {waited:?}"
                )
            }
            TableError::Cancelled => {
                write!(f, "fork acquisition abandoned: the table was cancelled")
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
