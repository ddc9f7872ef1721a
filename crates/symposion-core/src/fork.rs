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

//! The shared ring of forks.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::cancel::CancelFlag;
use crate::error::TableError;

/// Upper bound on how long a blocked [`ForkSet::hold`] sleeps between
/// cancellation checks. Releases notify the condvar, so this bounds only the
/// latency of noticing a cancellation.
const WAIT_SLICE: Duration = Duration::from_millis(25);

/// A fixed ring of forks, each either free or held by exactly one seat.
///
/// All fork state lives behind one mutex and every acquisition is a
/// test-and-set against it, so a fork can never be observed held by two seats
/// at once. The set makes no ordering or fairness promises of its own; wait
/// ordering is the business of the arbitration policy layered on top.
#[derive(Debug)]
pub struct ForkSet {
    len: usize,
    /// `Some(seat)` while held, `None` while on the table.
    slots: Mutex<Vec<Option<usize>>>,
    freed: Condvar,
}

impl ForkSet {
    /// Creates `len` forks, all free.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            slots: Mutex::new(vec![None; len]),
            freed: Condvar::new(),
        }
    }

    /// Number of forks (and seats) in the ring.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the ring has no forks at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Non-blocking test-and-set of one fork.
    ///
    /// Returns `false` if `fork` is already held, by anyone.
    pub fn try_hold(&self, fork: usize, seat: usize) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if slots[fork].is_some() {
            return false;
        }
        slots[fork] = Some(seat);
        log::trace!("fork {fork} picked up by seat {seat}");
        true
    }

    /// Both-or-neither acquisition of two forks in one critical section.
    ///
    /// Either both forks transition to held-by-`seat` or neither does.
    pub fn try_hold_pair(&self, a: usize, b: usize, seat: usize) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if slots[a].is_some() || slots[b].is_some() {
            return false;
        }
        slots[a] = Some(seat);
        slots[b] = Some(seat);
        log::trace!("forks {a} and {b} picked up by seat {seat}");
        true
    }

    /// Blocks until `fork` transitions free → held-by-`seat`.
    ///
    /// Wakes on every release and re-tests; polls `cancel` between waits and
    /// returns [`TableError::Cancelled`] once it trips, leaving the fork
    /// untouched.
    pub fn hold(&self, fork: usize, seat: usize, cancel: &CancelFlag) -> Result<(), TableError> {
        let mut slots = self.slots.lock().unwrap();
        loop {
            if cancel.is_cancelled() {
                return Err(TableError::Cancelled);
            }
            if slots[fork].is_none() {
                slots[fork] = Some(seat);
                log::trace!("fork {fork} picked up by seat {seat} after waiting");
                return Ok(());
            }
            let (guard, _) = self.freed.wait_timeout(slots, WAIT_SLICE).unwrap();
            slots = guard;
        }
    }

    /// Puts one fork back on the table and wakes waiters.
    ///
    /// Panics if the fork is free or held by a different seat: continuing in
    /// either case would corrupt the one-owner-per-fork invariant.
    pub fn release(&self, fork: usize, seat: usize) {
        let mut slots = self.slots.lock().unwrap();
        Self::clear(&mut slots, fork, seat);
        drop(slots);
        self.freed.notify_all();
    }

    /// Puts two forks back in one critical section and wakes waiters once.
    ///
    /// Same preconditions per fork as [`release`](Self::release).
    pub fn release_pair(&self, a: usize, b: usize, seat: usize) {
        let mut slots = self.slots.lock().unwrap();
        Self::clear(&mut slots, a, seat);
        Self::clear(&mut slots, b, seat);
        drop(slots);
        self.freed.notify_all();
    }

    fn clear(slots: &mut [Option<usize>], fork: usize, seat: usize) {
        match slots[fork] {
            Some(owner) if owner == seat => {
                slots[fork] = None;
                log::trace!("fork {fork} put back by seat {seat}");
            }
            Some(owner) => {
                panic!("seat {seat} tried to put back fork {fork}, which seat {owner} holds")
            }
            None => panic!("seat {seat} tried to put back fork {fork}, which is already free"),
        }
    }

    /// The seat currently holding `fork`, if any.
    pub fn holder(&self, fork: usize) -> Option<usize> {
        self.slots.lock().unwrap()[fork]
    }

    /// Whether every fork is back on the table.
    pub fn all_free(&self) -> bool {
        self.slots.lock().unwrap().iter().all(Option::is_none)
    }
}
