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

//! Plain-text report rendering for a console dashboard.

use std::fmt::Write as _;

use vigil_core::report::{Report, ReportSink};
use vigil_core::SeverityBand;

const BAR_SLOTS: usize = 20;

/// Renders a usage bar like `[########------------]  40%`.
fn usage_bar(percent: u8) -> String {
    let filled = (percent as usize / (100 / BAR_SLOTS)).min(BAR_SLOTS);
    let mut bar = String::with_capacity(BAR_SLOTS + 8);
    bar.push('[');
    for slot in 0..BAR_SLOTS {
        bar.push(if slot < filled { '#' } else { '-' });
    }
    let _ = write!(bar, "] {percent:3}%");
    bar
}

fn band_suffix(band: SeverityBand) -> &'static str {
    match band {
        SeverityBand::Normal => "",
        SeverityBand::Caution => " Caution",
        SeverityBand::Warning => " WARNING!",
        SeverityBand::Critical => " CRITICAL!",
    }
}

/// Renders a full report as a fixed-width text block.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "========================================");
    let _ = writeln!(
        out,
        "RESOURCE REPORT  (uptime {} s)",
        report.produced_at.as_secs()
    );
    let _ = writeln!(out, "========================================");

    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>8} {:>8}  {:<26}",
        "Task", "Size", "Free", "Min Free", "Peak Usage"
    );
    for task in &report.tasks {
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:>8} {:>8}  {}{}",
            task.name,
            task.capacity_words,
            task.current_margin_words,
            task.minimum_margin_words,
            usage_bar(task.peak_usage_percent),
            band_suffix(task.peak_band()),
        );
    }

    let stats = &report.stack_stats;
    let _ = writeln!(
        out,
        "Stack: {} tasks, {} checks, {} warnings, {} critical events",
        stats.tasks_monitored,
        stats.proactive_checks,
        stats.warnings_issued,
        stats.critical_usage_events
    );
    if let (Some(task), Some(at)) = (&stats.last_warning_task, stats.last_warning_time) {
        let _ = writeln!(out, "Last warning: '{}' at {} s", task, at.as_secs());
    }

    match &report.heap {
        Some(heap) => {
            let _ = writeln!(
                out,
                "Heap:  {}/{} bytes used {}{}",
                heap.used_bytes(),
                heap.capacity_bytes,
                usage_bar(heap.usage_percent()),
                band_suffix(heap.band()),
            );
            let _ = writeln!(
                out,
                "       peak {} bytes, allocs {}, frees {}, failures {}, frag ~{:.0}%",
                heap.peak_used_bytes(),
                heap.alloc_count,
                heap.dealloc_count,
                heap.failure_count,
                heap.fragmentation * 100.0
            );
        }
        None => {
            let _ = writeln!(out, "Heap:  not initialized");
        }
    }
    let _ = writeln!(out, "========================================");
    out
}

/// Prints each report to stdout as a dashboard block.
#[derive(Debug, Default)]
pub struct ConsoleReportSink;

impl ReportSink for ConsoleReportSink {
    fn publish(&self, report: &Report) {
        print!("{}", render_report(report));
    }
}
