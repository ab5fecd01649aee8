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

//! End-to-end flow: simulated kernel -> ledgers -> gate -> report.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_core::report::{Report, ReportSink, WarningRecord, WarningSink};
use vigil_core::sampling::TaskId;
use vigil_core::{MonitorConfig, SeverityBand};
use vigil_infra::{render_report, SimulatedKernel};
use vigil_monitor::{MonitorService, HEAP_ENTITY};

#[derive(Debug, Default)]
struct Collector {
    warnings: Mutex<Vec<WarningRecord>>,
    reports: Mutex<Vec<Report>>,
}

impl WarningSink for Collector {
    fn publish(&self, warning: &WarningRecord) {
        self.warnings.lock().unwrap().push(warning.clone());
    }
}

impl ReportSink for Collector {
    fn publish(&self, report: &Report) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        sample_interval: Duration::ZERO,
        report_every: 4,
        max_tasks: 8,
        lock_timeout: Duration::from_millis(50),
    }
}

#[test]
fn full_monitoring_flow() {
    let _ = env_logger::builder().is_test(true).try_init();
    let kernel = Arc::new(SimulatedKernel::new(8_192));
    let collector = Arc::new(Collector::default());

    let mut service = MonitorService::new(test_config(), kernel.clone(), kernel.clone());
    service.add_warning_sink(collector.clone());
    service.add_report_sink(collector.clone());

    service.register_task("Sensor", 1000, TaskId(1)).unwrap();
    service.register_task("Network", 2000, TaskId(2)).unwrap();
    service.init_heap(kernel.heap_capacity()).unwrap();

    // Pass 1: everything healthy.
    kernel.set_stack_margin(TaskId(1), 800);
    kernel.set_stack_margin(TaskId(2), 1500);
    service.run_pass().unwrap();

    // Passes 2-3: the sensor task degrades into Warning and stays there;
    // the heap fills past 90%.
    kernel.set_stack_margin(TaskId(1), 150); // 85%
    assert!(kernel.allocate(7_600));
    service.run_pass().unwrap();
    service.run_pass().unwrap();

    // Pass 4: sensor recovers, heap drains; the report is published here.
    kernel.set_stack_margin(TaskId(1), 700);
    kernel.free(7_600);
    service.run_pass().unwrap();

    // Exactly two warnings: one for the sensor's Warning band, one for the
    // heap going Critical. The repeated pass 3 observations are suppressed.
    let warnings = collector.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 2);
    let sensor = warnings.iter().find(|w| w.entity == "Sensor").unwrap();
    assert_eq!(sensor.band, SeverityBand::Warning);
    assert_eq!(sensor.usage_percent, 85);
    let heap = warnings.iter().find(|w| w.entity == HEAP_ENTITY).unwrap();
    assert_eq!(heap.band, SeverityBand::Critical);
    drop(warnings);

    let reports = collector.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];

    // The report reflects the recovered present and the recorded worst case.
    let sensor = report.tasks.iter().find(|t| t.name == "Sensor").unwrap();
    assert_eq!(sensor.usage_percent, 30);
    assert_eq!(sensor.minimum_margin_words, 150);
    assert_eq!(sensor.peak_usage_percent, 85);
    assert!(sensor.warning_issued);

    let network = report.tasks.iter().find(|t| t.name == "Network").unwrap();
    assert_eq!(network.usage_percent, 25);
    assert!(!network.warning_issued);

    let heap = report.heap.as_ref().unwrap();
    assert_eq!(heap.current_free_bytes, 8_192);
    assert_eq!(heap.minimum_free_bytes, 8_192 - 7_600);
    assert_eq!(heap.alloc_count, 1);
    assert_eq!(heap.dealloc_count, 1);

    assert_eq!(report.stack_stats.tasks_monitored, 2);
    assert_eq!(report.stack_stats.proactive_checks, 8);
    assert_eq!(report.stack_stats.warnings_issued, 1); // heap is not a stack warning
    assert_eq!(
        report.stack_stats.last_warning_task.as_deref(),
        Some("Sensor")
    );

    // The console rendering of the same report stays coherent.
    let text = render_report(report);
    assert!(text.contains("Sensor"));
    assert!(text.contains("WARNING!"));
}

#[test]
fn recovered_task_rewarns_on_recurrence() {
    let kernel = Arc::new(SimulatedKernel::new(1_024));
    let collector = Arc::new(Collector::default());
    let mut service = MonitorService::new(test_config(), kernel.clone(), kernel.clone());
    service.add_warning_sink(collector.clone());
    service.register_task("Flappy", 100, TaskId(7)).unwrap();

    for margin in [25, 25, 90, 25] {
        kernel.set_stack_margin(TaskId(7), margin);
        service.run_pass().unwrap();
    }

    // Caution, suppressed duplicate, silent recovery, fresh Caution.
    let warnings = collector.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.band == SeverityBand::Caution));
}

#[test]
fn vanished_task_leaves_ledger_state_intact() {
    let kernel = Arc::new(SimulatedKernel::new(1_024));
    let mut service = MonitorService::new(test_config(), kernel.clone(), kernel.clone());
    service.register_task("Doomed", 500, TaskId(3)).unwrap();

    kernel.set_stack_margin(TaskId(3), 100);
    service.run_pass().unwrap();
    kernel.remove_task(TaskId(3));
    service.run_pass().unwrap();

    // The last observed state survives the task's disappearance.
    assert_eq!(service.stack_ledger().usage_percent("Doomed").unwrap(), 80);
    assert_eq!(
        service.stack_ledger().peak_usage_percent("Doomed").unwrap(),
        80
    );
}
