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

//! Arbitration policies: how a seat acquires its two adjacent forks.
//!
//! All three strategies implement the same [`Arbiter`] capability and are
//! selected by a [`PolicyKind`] tag at table-construction time, so the
//! deadlock-prone baseline and its two fixes can be swapped with one
//! configuration value:
//!
//! - [`NaiveArbiter`]: left fork then right fork, each an independent
//!   blocking wait. Deadlocks when every seat holds its left fork at once.
//! - [`OrderedArbiter`]: acquisition order alternates around the ring,
//!   which makes a complete circular wait impossible.
//! - [`MonitorArbiter`]: a global state table grants both forks at once
//!   based on neighbor state; a seat never blocks while both of its forks
//!   are free.

mod monitor;
mod naive;
mod ordered;

pub use monitor::MonitorArbiter;
pub use naive::NaiveArbiter;
pub use ordered::OrderedArbiter;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::TableError;
use crate::fork::ForkSet;

/// The dual-fork acquisition capability every policy provides.
///
/// One arbiter instance is shared by every seat at the table.
pub trait Arbiter: Send + Sync {
    /// Blocks until `seat` holds both of its adjacent forks.
    ///
    /// Returns [`TableError::Cancelled`] once the table's cancel flag trips;
    /// anything grabbed before that point has been put back by the time this
    /// returns.
    fn acquire(&self, seat: usize) -> Result<(), TableError>;

    /// Puts both of `seat`'s forks back on the table.
    ///
    /// Panics if `seat` does not currently hold them.
    fn release(&self, seat: usize);
}

/// Selects which arbitration strategy a table runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Left-then-right independent grabs; may deadlock.
    Naive,
    /// Alternating acquisition order around the ring; deadlock-free.
    Ordered,
    /// Neighbor-state arbitration under one global lock; deadlock-free and
    /// never blocks a seat whose forks are both free.
    Monitor,
}

impl PolicyKind {
    /// Parses a policy name, returning `None` if it is unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "naive" => Some(PolicyKind::Naive),
            "ordered" => Some(PolicyKind::Ordered),
            "monitor" => Some(PolicyKind::Monitor),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Naive => "naive",
            PolicyKind::Ordered => "ordered",
            PolicyKind::Monitor => "monitor",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyKind::from_name(s)
            .ok_or_else(|| format!("unknown policy '{s}', expected naive, ordered, or monitor"))
    }
}

/// The fork to the left of `seat` (it shares the seat's index).
pub(crate) fn left_fork(seat: usize) -> usize {
    seat
}

/// The fork to the right of `seat`, wrapping around the ring.
pub(crate) fn right_fork(seat: usize, seats: usize) -> usize {
    (seat + 1) % seats
}

/// Builds the shared arbiter for `kind` over `forks`.
pub fn make_arbiter(
    kind: PolicyKind,
    forks: Arc<ForkSet>,
    cancel: CancelFlag,
) -> Arc<dyn Arbiter> {
    match kind {
        PolicyKind::Naive => Arc::new(NaiveArbiter::new(forks, cancel)),
        PolicyKind::Ordered => Arc::new(OrderedArbiter::new(forks, cancel)),
        PolicyKind::Monitor => Arc::new(MonitorArbiter::new(forks, cancel)),
    }
}
