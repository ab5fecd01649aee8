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

//! Service driving the periodic sampling pass.
//!
//! One pass pulls fresh measurements from the sample sources into the
//! ledgers, classifies the results, feeds them through the warning gate,
//! and publishes warnings as they emit. Every `report_every` passes the
//! aggregator snapshots both ledgers into a report for the report sinks.

use std::sync::Arc;
use std::time::Instant;

use crate::heap::ledger::HeapLedger;
use crate::report::aggregator::ReportAggregator;
use crate::stack::ledger::{StackLedger, TaskKey};
use crate::warning::gate::WarningGate;
use vigil_core::report::{Report, ReportSink, Uptime, WarningSink};
use vigil_core::sampling::{HeapSampleSource, StackSampleSource, TaskId};
use vigil_core::{MonitorConfig, MonitorError, MonitorResult};

/// Gate entity identifier used for the heap ledger.
pub const HEAP_ENTITY: &str = "heap";

#[derive(Debug)]
struct TaskBinding {
    key: TaskKey,
    task_id: TaskId,
    name: String,
}

/// The resource-health monitoring service.
///
/// Owns the ledgers, the warning gate, the aggregator, the sample sources
/// and the sinks. `tick` is meant to be called from one periodic monitor
/// task; the ledgers themselves additionally accept event-driven updates
/// from arbitrary task contexts through their own handles.
#[derive(Debug)]
pub struct MonitorService {
    config: MonitorConfig,
    stack: StackLedger,
    heap: HeapLedger,
    gate: WarningGate,
    aggregator: ReportAggregator,
    stack_source: Arc<dyn StackSampleSource>,
    heap_source: Arc<dyn HeapSampleSource>,
    report_sinks: Vec<Arc<dyn ReportSink>>,
    warning_sinks: Vec<Arc<dyn WarningSink>>,
    bindings: Vec<TaskBinding>,
    started: Instant,
    last_pass: Option<Instant>,
    passes: u32,
}

impl MonitorService {
    /// Creates a service with fresh ledgers reading from the given sources.
    pub fn new(
        config: MonitorConfig,
        stack_source: Arc<dyn StackSampleSource>,
        heap_source: Arc<dyn HeapSampleSource>,
    ) -> Self {
        let stack = StackLedger::new(config.max_tasks, config.lock_timeout);
        let heap = HeapLedger::new(config.lock_timeout);
        let aggregator = ReportAggregator::new(stack.clone(), heap.clone());
        Self {
            config,
            stack,
            heap,
            gate: WarningGate::new(),
            aggregator,
            stack_source,
            heap_source,
            report_sinks: Vec::new(),
            warning_sinks: Vec::new(),
            bindings: Vec::new(),
            started: Instant::now(),
            last_pass: None,
            passes: 0,
        }
    }

    /// Adds a report sink.
    pub fn add_report_sink(&mut self, sink: Arc<dyn ReportSink>) {
        self.report_sinks.push(sink);
    }

    /// Adds a warning sink.
    pub fn add_warning_sink(&mut self, sink: Arc<dyn WarningSink>) {
        self.warning_sinks.push(sink);
    }

    /// Registers a task for monitoring and binds it to its kernel id.
    ///
    /// The name [`HEAP_ENTITY`] is reserved for the allocator and rejected
    /// as a duplicate: the warning gate is keyed by name, and a task under
    /// that name would share gate state with the heap.
    pub fn register_task(
        &mut self,
        name: &str,
        capacity_words: u32,
        task_id: TaskId,
    ) -> MonitorResult<TaskKey> {
        if name == HEAP_ENTITY {
            return Err(MonitorError::DuplicateName(name.to_string()));
        }
        let key = self.stack.register(name, capacity_words)?;
        let name = self.stack.task_name(key)?;
        self.bindings.push(TaskBinding { key, task_id, name });
        Ok(key)
    }

    /// One-time heap ledger initialization.
    pub fn init_heap(&self, capacity_bytes: usize) -> MonitorResult<()> {
        self.heap.init(capacity_bytes)
    }

    /// Handle to the stack ledger for event-driven producers and cold reads.
    pub fn stack_ledger(&self) -> &StackLedger {
        &self.stack
    }

    /// Handle to the heap ledger for event-driven producers.
    pub fn heap_ledger(&self) -> &HeapLedger {
        &self.heap
    }

    /// Milliseconds since the service was created.
    pub fn uptime(&self) -> Uptime {
        Uptime(self.started.elapsed().as_millis() as u64)
    }

    /// Runs a sampling pass if the sampling interval has elapsed.
    ///
    /// Returns whether a pass ran. Meant to be called at least as often as
    /// the configured interval; calling it faster is cheap.
    pub fn tick(&mut self) -> MonitorResult<bool> {
        let due = match self.last_pass {
            Some(at) => at.elapsed() >= self.config.sample_interval,
            None => true,
        };
        if !due {
            return Ok(false);
        }
        self.run_pass()?;
        Ok(true)
    }

    /// Runs one sampling pass unconditionally.
    ///
    /// A task the kernel no longer reports a margin for is skipped and
    /// logged; a ledger lock timeout propagates to the caller, which may
    /// simply retry on the next tick.
    pub fn run_pass(&mut self) -> MonitorResult<()> {
        let now = self.uptime();
        log::trace!("Sampling pass at {} ms", now.0);

        for binding in &self.bindings {
            let Some(margin) = self.stack_source.stack_margin_words(binding.task_id) else {
                log::debug!("No stack margin for task '{}', skipping", binding.name);
                continue;
            };
            let sample = self.stack.sample(binding.key, margin, now)?;
            if let Some(warning) =
                self.gate
                    .observe(&binding.name, sample.band, sample.usage_percent, now)
            {
                self.stack.mark_warning(binding.key, now)?;
                log::warn!(
                    "Task '{}' stack usage {}% ({})",
                    warning.entity,
                    warning.usage_percent,
                    warning.band
                );
                for sink in &self.warning_sinks {
                    sink.publish(&warning);
                }
            }
        }

        match self.heap.refresh(self.heap_source.heap_stats()) {
            Ok(()) => {
                let summary = self.heap.snapshot()?;
                let percent = summary.usage_percent();
                if let Some(warning) =
                    self.gate
                        .observe(HEAP_ENTITY, summary.band(), percent, now)
                {
                    log::warn!("Heap usage {}% ({})", percent, warning.band);
                    for sink in &self.warning_sinks {
                        sink.publish(&warning);
                    }
                }
            }
            // Nothing to refresh until the application initializes the heap
            // ledger; stack monitoring proceeds regardless.
            Err(MonitorError::NotInitialized) => {}
            Err(err) => return Err(err),
        }

        self.last_pass = Some(Instant::now());
        self.passes += 1;
        // report_every of 0 disables periodic reports.
        if self.config.report_every > 0 && self.passes % self.config.report_every == 0 {
            self.publish_report(now)?;
        }
        Ok(())
    }

    /// Aggregates and publishes a report immediately, returning it.
    pub fn publish_report(&self, now: Uptime) -> MonitorResult<Report> {
        let report = self.aggregator.snapshot(now)?;
        for sink in &self.report_sinks {
            sink.publish(&report);
        }
        Ok(report)
    }

    /// Number of sampling passes completed so far.
    pub fn passes(&self) -> u32 {
        self.passes
    }
}
