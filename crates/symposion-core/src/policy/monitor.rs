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

//! Condition-based arbitration with a global state table.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::cancel::CancelFlag;
use crate::error::TableError;
use crate::fork::ForkSet;
use crate::policy::{left_fork, right_fork, Arbiter};

/// Upper bound on how long a seat waits for its grant token between
/// cancellation checks.
const GRANT_SLICE: Duration = Duration::from_millis(25);

/// What the arbiter believes each seat is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DinerState {
    /// Not interested in forks.
    Thinking,
    /// Waiting to be granted both forks.
    Hungry,
    /// Holding both forks.
    Eating,
}

/// Grants both forks at once, based on neighbor state, under one global lock.
///
/// Each seat has a single-slot grant channel that starts empty. `acquire`
/// registers the seat as hungry and then blocks on that slot; whichever call
/// observes that the seat may eat (its own `acquire`, or a neighbor's
/// `release`) performs the state transition, marks both forks held, and
/// deposits the one token. "Eating" and "holding both forks" are therefore
/// the same fact, established atomically under the lock, and adjacent seats
/// can never be eating at the same time.
///
/// Unlike the blocking policies, a hungry seat whose forks are both free is
/// granted them immediately, on its own call stack, without parking at all.
pub struct MonitorArbiter {
    forks: Arc<ForkSet>,
    cancel: CancelFlag,
    states: Mutex<Vec<DinerState>>,
    grants: Vec<Sender<()>>,
    slots: Vec<Receiver<()>>,
}

impl MonitorArbiter {
    /// Creates the arbiter over `forks`, everyone thinking.
    pub fn new(forks: Arc<ForkSet>, cancel: CancelFlag) -> Self {
        let seats = forks.len();
        let (grants, slots) = (0..seats).map(|_| crossbeam_channel::bounded(1)).unzip();
        Self {
            forks,
            cancel,
            states: Mutex::new(vec![DinerState::Thinking; seats]),
            grants,
            slots,
        }
    }

    fn seats(&self) -> usize {
        self.grants.len()
    }

    /// Grants `seat` both forks if it is hungry and neither neighbor is
    /// eating. Must be called with `states` locked.
    fn grant_if_able(&self, states: &mut [DinerState], seat: usize) {
        let seats = self.seats();
        let prev = (seat + seats - 1) % seats;
        let next = (seat + 1) % seats;
        if states[seat] == DinerState::Hungry
            && states[prev] != DinerState::Eating
            && states[next] != DinerState::Eating
        {
            states[seat] = DinerState::Eating;
            let left = left_fork(seat);
            let right = right_fork(seat, seats);
            if !self.forks.try_hold_pair(left, right, seat) {
                panic!("forks {left} and {right} granted to seat {seat} while still held");
            }
            if self.grants[seat].try_send(()).is_err() {
                panic!("grant slot for seat {seat} already holds a token");
            }
            log::trace!("seat {seat} granted forks {left} and {right}");
        }
    }

    /// Withdraws `seat` from the table after a cancellation, undoing a grant
    /// that may have landed while the seat was giving up.
    fn abandon(&self, seat: usize) {
        let mut states = self.states.lock().unwrap();
        match states[seat] {
            DinerState::Eating => {
                // a grant raced the cancellation; drain the token, put the
                // forks back, and pass them on
                let _ = self.slots[seat].try_recv();
                states[seat] = DinerState::Thinking;
                let seats = self.seats();
                self.forks
                    .release_pair(left_fork(seat), right_fork(seat, seats), seat);
                self.grant_if_able(&mut states, (seat + seats - 1) % seats);
                self.grant_if_able(&mut states, (seat + 1) % seats);
            }
            DinerState::Hungry => states[seat] = DinerState::Thinking,
            DinerState::Thinking => {}
        }
    }
}

impl Arbiter for MonitorArbiter {
    fn acquire(&self, seat: usize) -> Result<(), TableError> {
        {
            let mut states = self.states.lock().unwrap();
            states[seat] = DinerState::Hungry;
            self.grant_if_able(&mut states, seat);
        }
        loop {
            match self.slots[seat].recv_timeout(GRANT_SLICE) {
                Ok(()) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel.is_cancelled() {
                        self.abandon(seat);
                        return Err(TableError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("grant sender lives as long as the arbiter")
                }
            }
        }
    }

    fn release(&self, seat: usize) {
        let mut states = self.states.lock().unwrap();
        if states[seat] != DinerState::Eating {
            panic!(
                "seat {seat} put away forks while {:?}, not eating",
                states[seat]
            );
        }
        states[seat] = DinerState::Thinking;
        let seats = self.seats();
        self.forks
            .release_pair(left_fork(seat), right_fork(seat, seats), seat);
        self.grant_if_able(&mut states, (seat + seats - 1) % seats);
        self.grant_if_able(&mut states, (seat + 1) % seats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn arbiter(seats: usize) -> (Arc<MonitorArbiter>, Arc<ForkSet>, CancelFlag) {
        let forks = Arc::new(ForkSet::new(seats));
        let cancel = CancelFlag::new();
        let arbiter = Arc::new(MonitorArbiter::new(Arc::clone(&forks), cancel.clone()));
        (arbiter, forks, cancel)
    }

    #[test]
    fn free_forks_are_granted_without_parking() {
        let (arbiter, forks, _) = arbiter(5);
        arbiter.acquire(0).unwrap();
        assert_eq!(forks.holder(0), Some(0));
        assert_eq!(forks.holder(1), Some(0));
        arbiter.release(0);
        assert!(forks.all_free());
    }

    #[test]
    fn a_neighbor_of_an_eating_seat_waits_until_the_release() {
        let (arbiter, forks, _) = arbiter(5);
        arbiter.acquire(0).unwrap();

        let hungry = {
            let arbiter = Arc::clone(&arbiter);
            thread::spawn(move || arbiter.acquire(1))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!hungry.is_finished(), "seat 1 ate next to an eating seat 0");
        // seat 1 holds nothing while it waits
        assert_eq!(forks.holder(1), Some(0));
        assert_eq!(forks.holder(2), None);

        arbiter.release(0);
        hungry.join().unwrap().unwrap();
        assert_eq!(forks.holder(1), Some(1));
        assert_eq!(forks.holder(2), Some(1));
        arbiter.release(1);
        assert!(forks.all_free());
    }

    #[test]
    fn opposite_seats_eat_concurrently() {
        let (arbiter, forks, _) = arbiter(5);
        arbiter.acquire(0).unwrap();
        // seat 2 shares no fork with seat 0 and must not be held up
        arbiter.acquire(2).unwrap();
        assert_eq!(forks.holder(2), Some(2));
        assert_eq!(forks.holder(3), Some(2));
        arbiter.release(0);
        arbiter.release(2);
        assert!(forks.all_free());
    }

    #[test]
    fn cancelled_waiter_withdraws_cleanly() {
        let (arbiter, forks, cancel) = arbiter(5);
        arbiter.acquire(0).unwrap();

        let hungry = {
            let arbiter = Arc::clone(&arbiter);
            thread::spawn(move || arbiter.acquire(1))
        };

        thread::sleep(Duration::from_millis(50));
        cancel.cancel();
        let result = hungry.join().unwrap();
        assert!(matches!(result, Err(TableError::Cancelled)));

        // the eating seat is unaffected and can still finish normally
        arbiter.release(0);
        assert!(forks.all_free());
    }

    #[test]
    #[should_panic(expected = "put away forks")]
    fn releasing_without_eating_panics() {
        let (arbiter, _, _) = arbiter(3);
        arbiter.release(1);
    }
}
