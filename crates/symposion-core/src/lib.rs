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

//! # Symposion Core
//!
//! Ring arbitration of shared forks: N philosopher threads sit around a
//! table, and each must hold the two forks adjacent to its seat before it can
//! eat. The crate provides the shared fork state, three interchangeable
//! arbitration policies (one deliberately deadlock-prone, two deadlock-free),
//! the per-seat worker loop, and the coordinator that spawns and joins a full
//! banquet.
//!
//! All shared state is explicitly constructed and handed out as `Arc`s at
//! spawn time, so several independent tables can run in one process.

#![warn(missing_docs)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod event;
pub mod fork;
pub mod philosopher;
pub mod policy;
pub mod table;

pub use cancel::CancelFlag;
pub use config::TableConfig;
pub use error::TableError;
pub use event::{EventBus, TableEvent};
pub use fork::ForkSet;
pub use philosopher::Philosopher;
pub use policy::{Arbiter, PolicyKind};
pub use table::{RunReport, Table};
