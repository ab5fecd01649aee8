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

//! Sinks that emit structured JSON through the `log` facade.
//!
//! Fire-and-forget by contract: a report that fails to serialize is logged
//! as an error and dropped, never surfaced back to the monitor.

use vigil_core::report::{Report, ReportSink, WarningRecord, WarningSink};
use vigil_core::SeverityBand;

/// Publishes reports as single-line JSON at info level.
#[derive(Debug, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn publish(&self, report: &Report) {
        match serde_json::to_string(report) {
            Ok(json) => log::info!(target: "vigil::report", "{json}"),
            Err(err) => log::error!(target: "vigil::report", "Failed to serialize report: {err}"),
        }
    }
}

/// Publishes warnings as single-line JSON, level chosen by band.
#[derive(Debug, Default)]
pub struct LogWarningSink;

impl WarningSink for LogWarningSink {
    fn publish(&self, warning: &WarningRecord) {
        let json = match serde_json::to_string(warning) {
            Ok(json) => json,
            Err(err) => {
                log::error!(target: "vigil::warning", "Failed to serialize warning: {err}");
                return;
            }
        };
        match warning.band {
            SeverityBand::Critical => log::error!(target: "vigil::warning", "{json}"),
            _ => log::warn!(target: "vigil::warning", "{json}"),
        }
    }
}
