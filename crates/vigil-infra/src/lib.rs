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

//! # Vigil Infra
//!
//! Concrete implementations of the monitor's external contracts: a
//! simulated kernel usable as a sample source in tests and SITL-style
//! runs, log-facade sinks that emit structured JSON, and a console
//! renderer for reports.

#![warn(missing_docs)]

pub mod kernel;
pub mod sink;

pub use kernel::simulated::SimulatedKernel;
pub use sink::console::{render_report, ConsoleReportSink};
pub use sink::log_sink::{LogReportSink, LogWarningSink};
