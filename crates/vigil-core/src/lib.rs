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

//! # Vigil Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! for the runtime resource-health monitor.
//!
//! This crate defines the "common language" of the monitor: severity bands,
//! measurement-source contracts, report and warning value types, and the
//! error taxonomy. The `vigil-monitor` crate provides the ledgers and the
//! service that aggregate measurements, while `vigil-infra` provides the
//! concrete sources and sinks.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod lock;
pub mod report;
pub mod sampling;
pub mod severity;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use report::{
    HeapSummary, Report, ReportSink, StackStats, TaskSummary, Uptime, WarningRecord, WarningSink,
};
pub use sampling::{HeapSampleSource, HeapStats, StackSampleSource, TaskId};
pub use severity::SeverityBand;
