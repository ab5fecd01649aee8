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

//! Monitor configuration.

use std::time::Duration;

/// Tunable parameters of the monitor, fixed at construction.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum time between sampling passes.
    pub sample_interval: Duration,
    /// A report is aggregated and published every this many sampling passes.
    /// Zero disables periodic reports; `publish_report` stays available for
    /// on-demand snapshots.
    pub report_every: u32,
    /// Maximum number of tasks the stack registry will accept.
    pub max_tasks: usize,
    /// Bounded wait for a ledger lock before the operation fails with
    /// `LedgerBusy`.
    pub lock_timeout: Duration,
}

impl Default for MonitorConfig {
    /// 100 ms sampling with a report every 50th pass (5 s), up to 8 tasks.
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(100),
            report_every: 50,
            max_tasks: 8,
            lock_timeout: Duration::from_millis(10),
        }
    }
}
