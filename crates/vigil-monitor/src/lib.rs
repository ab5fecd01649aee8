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

//! # Vigil Monitor
//!
//! The monitoring service layer: ledgers that track per-task stack margins
//! and heap allocator statistics, a warning gate that deduplicates
//! emissions, a report aggregator, and the [`MonitorService`] that drives
//! the periodic sampling pass.
//!
//! The contracts consumed here (sample sources, sinks, severity bands) live
//! in `vigil-core`; concrete sources and sinks live in `vigil-infra`.

#![warn(missing_docs)]

pub mod heap;
pub mod report;
pub mod service;
pub mod stack;
pub mod warning;

pub use heap::ledger::HeapLedger;
pub use report::aggregator::ReportAggregator;
pub use service::{MonitorService, HEAP_ENTITY};
pub use stack::ledger::{StackLedger, StackSample, TaskKey};
pub use warning::gate::WarningGate;
