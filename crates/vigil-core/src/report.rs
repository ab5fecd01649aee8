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

//! Report and warning value types, and the sink contracts that consume them.
//!
//! Everything here is plain immutable data: a `Report` is produced once per
//! aggregation pass and never mutated afterwards. Sinks are fire-and-forget;
//! the monitor does not depend on a sink succeeding.

use crate::severity::SeverityBand;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Milliseconds since the monitor started.
///
/// All externally visible timestamps use this instead of wall-clock time so
/// reports serialize portably and stay meaningful on targets without an RTC.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Uptime(pub u64);

impl Uptime {
    /// Returns the uptime as whole seconds, truncating.
    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }
}

/// Snapshot of one monitored task's stack health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task name, unique within the registry.
    pub name: String,
    /// Configured stack capacity in words; fixed at registration.
    pub capacity_words: u32,
    /// Remaining stack observed at the last sample, in words.
    pub current_margin_words: u32,
    /// Worst (smallest) margin ever observed, in words.
    pub minimum_margin_words: u32,
    /// Usage percentage derived from the current margin.
    pub usage_percent: u8,
    /// Usage percentage derived from the worst-ever margin.
    pub peak_usage_percent: u8,
    /// Whether a warning has ever been emitted for this task.
    pub warning_issued: bool,
    /// When the task was last sampled.
    pub last_sample: Uptime,
}

impl TaskSummary {
    /// Severity band of the current usage.
    pub fn band(&self) -> SeverityBand {
        SeverityBand::classify(self.usage_percent)
    }

    /// Severity band of the peak usage.
    pub fn peak_band(&self) -> SeverityBand {
        SeverityBand::classify(self.peak_usage_percent)
    }
}

/// Snapshot of the allocator ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeapSummary {
    /// Total heap capacity in bytes; fixed at init.
    pub capacity_bytes: usize,
    /// Bytes currently free.
    pub current_free_bytes: usize,
    /// Smallest number of free bytes ever observed.
    pub minimum_free_bytes: usize,
    /// Cumulative successful allocations.
    pub alloc_count: u64,
    /// Cumulative deallocations.
    pub dealloc_count: u64,
    /// Cumulative failed allocations.
    pub failure_count: u64,
    /// Heuristic fragmentation estimate in [0, 1]. An approximation derived
    /// from allocation churn, not a free-list walk.
    pub fragmentation: f64,
}

impl HeapSummary {
    /// Bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.capacity_bytes.saturating_sub(self.current_free_bytes)
    }

    /// Most bytes ever in use simultaneously, derived from the minimum free.
    pub fn peak_used_bytes(&self) -> usize {
        self.capacity_bytes.saturating_sub(self.minimum_free_bytes)
    }

    /// Current usage percentage, truncating.
    pub fn usage_percent(&self) -> u8 {
        if self.capacity_bytes == 0 {
            return 0;
        }
        // Widened so `used * 100` cannot overflow usize on 32-bit targets.
        (self.used_bytes() as u64 * 100 / self.capacity_bytes as u64) as u8
    }

    /// Severity band of the current usage.
    pub fn band(&self) -> SeverityBand {
        SeverityBand::classify(self.usage_percent())
    }
}

/// Registry-wide stack monitoring counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStats {
    /// Number of tasks currently monitored.
    pub tasks_monitored: u32,
    /// Total warnings emitted for stack usage.
    pub warnings_issued: u32,
    /// Samples that classified at `Caution` or worse.
    pub high_usage_events: u32,
    /// Samples that classified at `Critical`.
    pub critical_usage_events: u32,
    /// Total samples taken across all tasks.
    pub proactive_checks: u64,
    /// Task that triggered the most recent warning, if any.
    pub last_warning_task: Option<String>,
    /// When the most recent warning was emitted.
    pub last_warning_time: Option<Uptime>,
}

/// Immutable snapshot of the whole monitor, produced by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Uptime of the aggregation pass that produced this report.
    pub produced_at: Uptime,
    /// Per-task stack summaries, in registration order.
    pub tasks: Vec<TaskSummary>,
    /// Allocator summary, absent until the heap ledger is initialized.
    pub heap: Option<HeapSummary>,
    /// Registry-wide stack counters.
    pub stack_stats: StackStats,
}

impl Report {
    /// The worst severity band present anywhere in the report.
    pub fn worst_band(&self) -> SeverityBand {
        let task_worst = self
            .tasks
            .iter()
            .map(TaskSummary::band)
            .max()
            .unwrap_or(SeverityBand::Normal);
        let heap_band = self
            .heap
            .as_ref()
            .map(HeapSummary::band)
            .unwrap_or(SeverityBand::Normal);
        task_worst.max(heap_band)
    }
}

/// A single warning emission, produced by the warning gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    /// Identifier of the entity the warning concerns (task name, or "heap").
    pub entity: String,
    /// Severity band at the time of issue.
    pub band: SeverityBand,
    /// Usage percentage that triggered the warning.
    pub usage_percent: u8,
    /// When the warning was emitted.
    pub issued_at: Uptime,
}

/// Consumes finished reports. Fire-and-forget.
pub trait ReportSink: Send + Sync + Debug {
    /// Publishes a report. Must not block the monitor.
    fn publish(&self, report: &Report);
}

/// Consumes warning emissions. Fire-and-forget.
pub trait WarningSink: Send + Sync + Debug {
    /// Publishes a warning. Must not block the monitor.
    fn publish(&self, warning: &WarningRecord);
}
