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

//! The asymmetric-order policy.

use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::TableError;
use crate::fork::ForkSet;
use crate::policy::{left_fork, right_fork, Arbiter};

/// Acquires the two forks in alternating order around the ring: an even seat
/// takes its left fork first, an odd seat its right fork first.
///
/// A circular wait needs every seat to hold one fork while waiting for the
/// next seat's. With alternating acquisition order, at least one adjacent
/// pair contends for its shared fork as the *first* grab on both sides, and
/// whichever seat loses that race holds nothing while it waits, so a cycle
/// spanning the whole ring can never close. Release order is unconstrained.
pub struct OrderedArbiter {
    forks: Arc<ForkSet>,
    cancel: CancelFlag,
}

impl OrderedArbiter {
    /// Creates the arbiter over `forks`.
    pub fn new(forks: Arc<ForkSet>, cancel: CancelFlag) -> Self {
        Self { forks, cancel }
    }
}

impl Arbiter for OrderedArbiter {
    fn acquire(&self, seat: usize) -> Result<(), TableError> {
        let left = left_fork(seat);
        let right = right_fork(seat, self.forks.len());
        let (first, second) = if seat % 2 == 0 {
            (left, right)
        } else {
            (right, left)
        };

        self.forks.hold(first, seat, &self.cancel)?;
        if let Err(err) = self.forks.hold(second, seat, &self.cancel) {
            self.forks.release(first, seat);
            return Err(err);
        }
        Ok(())
    }

    fn release(&self, seat: usize) {
        self.forks.release(left_fork(seat), seat);
        self.forks.release(right_fork(seat, self.forks.len()), seat);
    }
}
