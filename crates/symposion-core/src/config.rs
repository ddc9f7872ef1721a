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

//! Run configuration for a table.

use std::time::Duration;

use crate::policy::PolicyKind;

/// The names seated at the default table, in ring order.
pub const DEFAULT_PHILOSOPHERS: [&str; 5] =
    ["Plato", "Confucius", "Socrates", "Voltaire", "Descartes"];

/// Configuration for a single table run.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// One name per seat, in ring order. Seat `i` shares fork `i` with its
    /// left neighbor and fork `(i + 1) % seats` with its right neighbor.
    pub names: Vec<String>,
    /// Meals each philosopher eats before leaving the table.
    pub meals: u32,
    /// Arbitration policy shared by every seat.
    pub policy: PolicyKind,
    /// Length of one thinking pause.
    pub think_time: Duration,
    /// Length of one eating pause.
    pub eat_time: Duration,
}

impl Default for TableConfig {
    /// Five classic guests, five meals each, monitor arbitration, one-second
    /// pauses.
    fn default() -> Self {
        Self {
            names: DEFAULT_PHILOSOPHERS.iter().map(|n| n.to_string()).collect(),
            meals: 5,
            policy: PolicyKind::Monitor,
            think_time: Duration::from_secs(1),
            eat_time: Duration::from_secs(1),
        }
    }
}

impl TableConfig {
    /// A table of `seats` seats: the classic names first, numbered guests
    /// after them.
    pub fn with_seats(seats: usize) -> Self {
        let names = (0..seats)
            .map(|i| match DEFAULT_PHILOSOPHERS.get(i) {
                Some(name) => name.to_string(),
                None => format!("Guest {}", i + 1),
            })
            .collect();
        Self {
            names,
            ..Self::default()
        }
    }

    /// Number of seats (= forks) at the table.
    pub fn seats(&self) -> usize {
        self.names.len()
    }
}
