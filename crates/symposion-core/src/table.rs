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

//! The coordinator: builds the shared state, seats the philosophers, joins
//! them all.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::cancel::CancelFlag;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::event::{EventBus, TableEvent};
use crate::fork::ForkSet;
use crate::philosopher::Philosopher;
use crate::policy::{self, Arbiter};

/// A ring needs at least this many seats for every fork to sit between two
/// distinct neighbors.
const MIN_SEATS: usize = 3;

/// How often the join loop re-checks the workers and the deadline.
const JOIN_SLICE: Duration = Duration::from_millis(10);

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Total meals eaten across all seats.
    pub meals_served: u64,
    /// Wall-clock time from the first spawn to the last join.
    pub elapsed: Duration,
}

/// Coordinates one banquet: owns the shared state, spawns one named OS thread
/// per seat, and blocks until every philosopher has finished.
///
/// The table takes no part in arbitration after spawning; it only joins.
/// All shared state is built here and handed out as `Arc`s, so several
/// independent tables can run side by side in one process.
pub struct Table {
    config: TableConfig,
    forks: Arc<ForkSet>,
    arbiter: Arc<dyn Arbiter>,
    cancel: CancelFlag,
    bus: EventBus,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Builds the shared state for `config` and returns the table together
    /// with the receiving end of its event stream.
    ///
    /// ## Errors
    /// [`TableError::TableTooSmall`] if the config seats fewer than three.
    pub fn new(config: TableConfig) -> Result<(Self, Receiver<TableEvent>), TableError> {
        let kind = config.policy;
        Self::with_arbiter(config, |forks, cancel| {
            policy::make_arbiter(kind, forks, cancel)
        })
    }

    /// Like [`new`](Self::new), but the arbiter comes from a caller-supplied
    /// factory instead of `config.policy`.
    ///
    /// This is the seam a harness uses to wire an instrumented arbiter, for
    /// example a gated naive arbiter that forces the circular-wait
    /// interleaving, to otherwise stock table machinery.
    pub fn with_arbiter<F>(
        config: TableConfig,
        make: F,
    ) -> Result<(Self, Receiver<TableEvent>), TableError>
    where
        F: FnOnce(Arc<ForkSet>, CancelFlag) -> Arc<dyn Arbiter>,
    {
        let seats = config.seats();
        if seats < MIN_SEATS {
            return Err(TableError::TableTooSmall { seats });
        }
        let forks = Arc::new(ForkSet::new(seats));
        let cancel = CancelFlag::new();
        let arbiter = make(Arc::clone(&forks), cancel.clone());
        let bus = EventBus::new();
        let receiver = bus.receiver().clone();
        Ok((
            Self {
                config,
                forks,
                arbiter,
                cancel,
                bus,
            },
            receiver,
        ))
    }

    /// The shared fork state, for observers.
    pub fn forks(&self) -> Arc<ForkSet> {
        Arc::clone(&self.forks)
    }

    /// A handle that aborts the run when tripped. Philosophers finish their
    /// current step, put back anything they hold, and leave.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the banquet to completion. Equivalent to
    /// `run_with_deadline(None)`.
    pub fn run(self) -> Result<RunReport, TableError> {
        self.run_with_deadline(None)
    }

    /// Seats every philosopher and blocks until all of them have finished.
    ///
    /// With a deadline, a run still blocked when it expires is cancelled,
    /// joined, and reported as [`TableError::Stalled`]. This is how a harness tells
    /// a deadlocked run apart from a slow one.
    ///
    /// ## Errors
    /// - [`TableError::Spawn`] if a thread could not be started; every
    ///   philosopher that did start is cancelled and joined first, so partial
    ///   runs never linger.
    /// - [`TableError::Stalled`] if the deadline expired.
    ///
    /// ## Panics
    /// Re-raises a philosopher panic (a precondition violation in the
    /// arbitration layer) rather than swallowing it.
    pub fn run_with_deadline(self, deadline: Option<Duration>) -> Result<RunReport, TableError> {
        let seats = self.config.seats();
        let start = Instant::now();
        log::info!(
            "seating {seats} philosophers ({} policy, {} meal(s) each)",
            self.config.policy,
            self.config.meals
        );

        let mut handles: Vec<JoinHandle<u32>> = Vec::with_capacity(seats);
        for (seat, name) in self.config.names.iter().enumerate() {
            let philosopher = Philosopher::new(
                seat,
                Arc::from(name.as_str()),
                &self.config,
                Arc::clone(&self.arbiter),
                self.bus.sender(),
                self.cancel.clone(),
            );
            let spawned = thread::Builder::new()
                .name(format!("seat-{seat}"))
                .spawn(move || philosopher.dine());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    log::error!(
                        "could not start philosopher '{name}'; cancelling {} already seated",
                        handles.len()
                    );
                    self.cancel.cancel();
                    Self::join_all(handles);
                    return Err(TableError::Spawn {
                        name: name.clone(),
                        source,
                    });
                }
            }
        }

        loop {
            if handles.iter().all(JoinHandle::is_finished) {
                break;
            }
            if let Some(limit) = deadline {
                if start.elapsed() >= limit {
                    log::warn!("table still blocked after {limit:?}; cancelling the run");
                    self.cancel.cancel();
                    Self::join_all(handles);
                    return Err(TableError::Stalled {
                        policy: self.config.policy,
                        waited: limit,
                    });
                }
            }
            thread::sleep(JOIN_SLICE);
        }

        let meals_served = Self::join_all(handles);
        assert!(
            self.forks.all_free(),
            "philosophers have left but forks are still marked held"
        );
        let elapsed = start.elapsed();
        log::info!("banquet over: {meals_served} meal(s) served in {elapsed:?}");
        Ok(RunReport {
            meals_served,
            elapsed,
        })
    }

    /// Joins every handle, summing meals. A worker panic is re-raised: it
    /// means the arbitration layer hit a precondition violation, and shared
    /// state can no longer be trusted.
    fn join_all(handles: Vec<JoinHandle<u32>>) -> u64 {
        let mut meals = 0;
        for handle in handles {
            match handle.join() {
                Ok(eaten) => meals += u64::from(eaten),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        meals
    }
}
