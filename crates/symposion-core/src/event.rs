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

//! Table events and the channel that carries them.
//!
//! Every state transition a philosopher makes is published as a
//! [`TableEvent`]; the channel serializes them into one totally ordered
//! stream, which is what the runtime prints and what the tests replay.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// A single observable state transition at the table.
///
/// `Display` renders the canonical log line for the transition, e.g.
/// `Plato is eating for 2 time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// The philosopher is thinking; no shared state is touched.
    Thinking {
        /// Seat index in the ring.
        seat: usize,
        /// The philosopher's name.
        name: Arc<str>,
    },
    /// The philosopher is hungry and has asked the arbiter for both forks.
    GrabbingForks {
        /// Seat index in the ring.
        seat: usize,
        /// The philosopher's name.
        name: Arc<str>,
    },
    /// Both forks are held and meal `meal` is underway.
    Eating {
        /// Seat index in the ring.
        seat: usize,
        /// The philosopher's name.
        name: Arc<str>,
        /// 1-based meal number.
        meal: u32,
    },
    /// Both forks are about to go back on the table.
    PuttingAwayForks {
        /// Seat index in the ring.
        seat: usize,
        /// The philosopher's name.
        name: Arc<str>,
    },
}

impl TableEvent {
    /// The seat this event belongs to.
    pub fn seat(&self) -> usize {
        match self {
            TableEvent::Thinking { seat, .. }
            | TableEvent::GrabbingForks { seat, .. }
            | TableEvent::Eating { seat, .. }
            | TableEvent::PuttingAwayForks { seat, .. } => *seat,
        }
    }

    /// The name of the philosopher this event belongs to.
    pub fn name(&self) -> &str {
        match self {
            TableEvent::Thinking { name, .. }
            | TableEvent::GrabbingForks { name, .. }
            | TableEvent::Eating { name, .. }
            | TableEvent::PuttingAwayForks { name, .. } => name,
        }
    }
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEvent::Thinking { name, .. } => write!(f, "{name} is thinking"),
            TableEvent::GrabbingForks { name, .. } => {
                write!(f, "{name} is trying to grab forks")
            }
            TableEvent::Eating { name, meal, .. } => {
                write!(f, "{name} is eating for {meal} time")
            }
            TableEvent::PuttingAwayForks { name, .. } => {
                write!(f, "{name} is putting away forks")
            }
        }
    }
}

/// A thread-safe event channel between a table's philosophers and whoever
/// observes the run.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<TableEvent>,
    receiver: Receiver<TableEvent>,
}

impl EventBus {
    /// Creates a new bus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Returns a clone of the sender end of the channel.
    /// One is handed to every philosopher at spawn time.
    pub fn sender(&self) -> Sender<TableEvent> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    /// Intended for the observer of the run to consume events.
    pub fn receiver(&self) -> &Receiver<TableEvent> {
        &self.receiver
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
