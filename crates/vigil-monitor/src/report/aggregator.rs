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

//! Periodic snapshotting of both ledgers into immutable reports.

use crate::heap::ledger::HeapLedger;
use crate::stack::ledger::StackLedger;
use vigil_core::report::{Report, Uptime};
use vigil_core::{MonitorError, MonitorResult};

/// Read-only aggregator over the stack and heap ledgers.
///
/// Each snapshot holds a ledger's lock only for the duration of the copy,
/// so producers are never blocked across the whole aggregation pass.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    stack: StackLedger,
    heap: HeapLedger,
}

impl ReportAggregator {
    /// Creates an aggregator reading from the given ledgers.
    pub fn new(stack: StackLedger, heap: HeapLedger) -> Self {
        Self { stack, heap }
    }

    /// Produces an immutable report tagged with `now`.
    ///
    /// An uninitialized heap ledger is reported as absent rather than as an
    /// error; any other ledger failure propagates.
    pub fn snapshot(&self, now: Uptime) -> MonitorResult<Report> {
        let (tasks, stack_stats) = self.stack.summaries()?;
        let heap = match self.heap.snapshot() {
            Ok(summary) => Some(summary),
            Err(MonitorError::NotInitialized) => None,
            Err(err) => return Err(err),
        };
        Ok(Report {
            produced_at: now,
            tasks,
            heap,
            stack_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn aggregator() -> ReportAggregator {
        let stack = StackLedger::new(8, Duration::from_millis(10));
        let heap = HeapLedger::new(Duration::from_millis(10));
        ReportAggregator::new(stack.clone(), heap.clone())
    }

    #[test]
    fn test_snapshot_without_heap_init() {
        let agg = aggregator();
        let report = agg.snapshot(Uptime(100)).unwrap();
        assert_eq!(report.produced_at, Uptime(100));
        assert!(report.tasks.is_empty());
        assert!(report.heap.is_none());
    }

    #[test]
    fn test_snapshot_reflects_ledgers() {
        let stack = StackLedger::new(8, Duration::from_millis(10));
        let heap = HeapLedger::new(Duration::from_millis(10));
        let agg = ReportAggregator::new(stack.clone(), heap.clone());

        let key = stack.register("Net", 512).unwrap();
        stack.sample(key, 128, Uptime(7)).unwrap();
        heap.init(32 * 1024).unwrap();
        heap.record_allocation(true, 256, 30_000, 30_000).unwrap();

        let report = agg.snapshot(Uptime(8)).unwrap();
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].name, "Net");
        assert_eq!(report.tasks[0].usage_percent, 75);
        let heap_summary = report.heap.unwrap();
        assert_eq!(heap_summary.alloc_count, 1);
        assert_eq!(heap_summary.current_free_bytes, 30_000);
        assert_eq!(report.stack_stats.proactive_checks, 1);
    }

    #[test]
    fn test_snapshots_are_independent_values() {
        let stack = StackLedger::new(8, Duration::from_millis(10));
        let heap = HeapLedger::new(Duration::from_millis(10));
        let agg = ReportAggregator::new(stack.clone(), heap);

        let key = stack.register("T", 100).unwrap();
        stack.sample(key, 50, Uptime(1)).unwrap();
        let first = agg.snapshot(Uptime(1)).unwrap();

        stack.sample(key, 10, Uptime(2)).unwrap();
        let second = agg.snapshot(Uptime(2)).unwrap();

        // The earlier snapshot is untouched by later mutation.
        assert_eq!(first.tasks[0].usage_percent, 50);
        assert_eq!(second.tasks[0].usage_percent, 90);
    }
}
