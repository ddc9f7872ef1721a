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

//! The deadlock-prone baseline policy.

use std::sync::{Arc, Barrier};

use crate::cancel::CancelFlag;
use crate::error::TableError;
use crate::fork::ForkSet;
use crate::policy::{left_fork, right_fork, Arbiter};

/// Grabs the left fork, then the right fork, each as an independent blocking
/// wait.
///
/// This is the textbook broken arbitration, kept as the baseline the other
/// two arbiters fix: when every seat happens to hold its left fork at the
/// same moment, each one blocks forever on a right fork its neighbor holds,
/// and the ring forms a circular wait with no progress possible. Cancelling
/// the table recovers such a run: every seat abandons its wait and puts its
/// left fork back.
///
/// An optional rendezvous gate between the two grabs lets a harness force
/// that interleaving on demand instead of waiting for the scheduler to
/// produce it.
pub struct NaiveArbiter {
    forks: Arc<ForkSet>,
    cancel: CancelFlag,
    gate: Option<Arc<Barrier>>,
}

impl NaiveArbiter {
    /// Creates the baseline arbiter over `forks`.
    pub fn new(forks: Arc<ForkSet>, cancel: CancelFlag) -> Self {
        Self {
            forks,
            cancel,
            gate: None,
        }
    }

    /// Like [`new`](Self::new), but every seat that has taken its left fork
    /// waits at `gate` before reaching for its right one.
    ///
    /// With a barrier sized to the full ring, no seat grabs its second fork
    /// until every seat holds its first, so the circular wait is certain
    /// rather than merely possible.
    pub fn with_gate(forks: Arc<ForkSet>, cancel: CancelFlag, gate: Arc<Barrier>) -> Self {
        Self {
            forks,
            cancel,
            gate: Some(gate),
        }
    }
}

impl Arbiter for NaiveArbiter {
    fn acquire(&self, seat: usize) -> Result<(), TableError> {
        let left = left_fork(seat);
        let right = right_fork(seat, self.forks.len());

        self.forks.hold(left, seat, &self.cancel)?;
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if let Err(err) = self.forks.hold(right, seat, &self.cancel) {
            // abandoning the wait must not leave the left fork off the table
            self.forks.release(left, seat);
            return Err(err);
        }
        Ok(())
    }

    fn release(&self, seat: usize) {
        self.forks.release(left_fork(seat), seat);
        self.forks.release(right_fork(seat, self.forks.len()), seat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_and_releases_both_forks() {
        let forks = Arc::new(ForkSet::new(5));
        let arbiter = NaiveArbiter::new(Arc::clone(&forks), CancelFlag::new());

        arbiter.acquire(1).unwrap();
        assert_eq!(forks.holder(1), Some(1));
        assert_eq!(forks.holder(2), Some(1));

        arbiter.release(1);
        assert!(forks.all_free());
    }

    #[test]
    fn cancelled_acquire_puts_the_left_fork_back() {
        let forks = Arc::new(ForkSet::new(5));
        let cancel = CancelFlag::new();
        let arbiter = Arc::new(NaiveArbiter::new(Arc::clone(&forks), cancel.clone()));

        // seat 3 already holds fork 3, so seat 2 will grab fork 2 and then
        // block on fork 3
        assert!(forks.try_hold(3, 3));
        let blocked = {
            let arbiter = Arc::clone(&arbiter);
            std::thread::spawn(move || arbiter.acquire(2))
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(forks.holder(2), Some(2));

        cancel.cancel();
        let result = blocked.join().unwrap();
        assert!(matches!(result, Err(TableError::Cancelled)));
        // the abandoned acquire released the fork it was holding
        assert_eq!(forks.holder(2), None);
        assert_eq!(forks.holder(3), Some(3));
    }
}
