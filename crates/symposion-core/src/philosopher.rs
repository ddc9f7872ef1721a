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

//! The per-seat worker loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::cancel::CancelFlag;
use crate::config::TableConfig;
use crate::event::TableEvent;
use crate::policy::Arbiter;

/// Upper bound on one sliced sleep during a pause; bounds how long a
/// cancellation goes unnoticed while thinking or eating.
const PAUSE_SLICE: Duration = Duration::from_millis(25);

/// One seat at the table: a worker that thinks, asks the shared arbiter for
/// both forks, eats, and puts them back, a fixed number of times.
///
/// The philosopher owns no shared state. Everything it touches (the arbiter,
/// the event channel, the cancel flag) is handed to it at construction, so
/// its whole lifecycle is visible at the spawn site.
pub struct Philosopher {
    seat: usize,
    name: Arc<str>,
    meals: u32,
    think_time: Duration,
    eat_time: Duration,
    arbiter: Arc<dyn Arbiter>,
    events: Sender<TableEvent>,
    cancel: CancelFlag,
}

impl Philosopher {
    /// Wires a philosopher to its table's shared state.
    pub fn new(
        seat: usize,
        name: Arc<str>,
        config: &TableConfig,
        arbiter: Arc<dyn Arbiter>,
        events: Sender<TableEvent>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            seat,
            name,
            meals: config.meals,
            think_time: config.think_time,
            eat_time: config.eat_time,
            arbiter,
            events,
            cancel,
        }
    }

    /// Runs the dining loop to completion or cancellation.
    ///
    /// Returns the number of meals actually eaten. On cancellation the loop
    /// exits at the next slice boundary with everything it held put back.
    pub fn dine(&self) -> u32 {
        let mut eaten = 0;
        for meal in 1..=self.meals {
            self.publish(TableEvent::Thinking {
                seat: self.seat,
                name: self.name.clone(),
            });
            if self.pause(self.think_time) {
                break;
            }

            self.publish(TableEvent::GrabbingForks {
                seat: self.seat,
                name: self.name.clone(),
            });
            if self.arbiter.acquire(self.seat).is_err() {
                break;
            }

            self.publish(TableEvent::Eating {
                seat: self.seat,
                name: self.name.clone(),
                meal,
            });
            let cancelled = self.pause(self.eat_time);

            self.publish(TableEvent::PuttingAwayForks {
                seat: self.seat,
                name: self.name.clone(),
            });
            self.arbiter.release(self.seat);
            eaten += 1;

            if cancelled {
                break;
            }
        }
        log::debug!("{} left the table after {eaten} meal(s)", self.name);
        eaten
    }

    fn publish(&self, event: TableEvent) {
        log::trace!("{event}");
        if let Err(e) = self.events.send(event) {
            log::error!("failed to send table event: {e}; receiver likely disconnected");
        }
    }

    /// Sleeps for `length` in slices, watching the cancel flag.
    /// Returns `true` if the pause was cut short by a cancellation.
    fn pause(&self, length: Duration) -> bool {
        let end = Instant::now() + length;
        loop {
            if self.cancel.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= end {
                return false;
            }
            thread::sleep((end - now).min(PAUSE_SLICE));
        }
    }
}
