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

//! Bounded registry of monitored task stacks.
//!
//! Each entry tracks the configured capacity, the margin observed at the
//! last sample, and a running minimum that is monotonic for the lifetime of
//! the entry: a later, healthier sample never erases a previously observed
//! worse case. Registration returns a dense [`TaskKey`] so the hot sampling
//! path never does a name lookup.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_core::lock::bounded_lock;
use vigil_core::report::{StackStats, TaskSummary, Uptime};
use vigil_core::{MonitorError, MonitorResult, SeverityBand};

/// Longest task name retained by the registry; longer names are truncated,
/// matching the kernel's own task-name limit.
pub const MAX_TASK_NAME_LEN: usize = 16;

/// Dense handle into the stack registry, returned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey(usize);

/// Result of one sampling update, fed to the warning gate by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackSample {
    /// Usage percentage derived from the sampled margin.
    pub usage_percent: u8,
    /// Severity band of that usage.
    pub band: SeverityBand,
    /// Usage percentage of the worst margin ever observed.
    pub peak_usage_percent: u8,
}

#[derive(Debug)]
struct TaskEntry {
    name: String,
    capacity_words: u32,
    current_margin_words: u32,
    minimum_margin_words: u32,
    usage_percent: u8,
    peak_usage_percent: u8,
    warning_issued: bool,
    last_sample: Uptime,
}

#[derive(Debug, Default)]
struct StackInner {
    tasks: Vec<TaskEntry>,
    stats: StackStats,
}

/// Thread-safe, bounded registry of monitored task stacks.
///
/// Cheap to clone; clones share the same underlying registry. Every
/// read-modify-write holds the registry lock, which keeps per-entry minima
/// monotonic under concurrent samplers.
#[derive(Debug, Clone)]
pub struct StackLedger {
    inner: Arc<Mutex<StackInner>>,
    max_tasks: usize,
    lock_timeout: Duration,
}

fn usage_percent(capacity_words: u32, margin_words: u32) -> u8 {
    if capacity_words == 0 {
        return 100;
    }
    let used = u64::from(capacity_words - margin_words);
    (used * 100 / u64::from(capacity_words)) as u8
}

impl StackLedger {
    /// Creates an empty ledger accepting at most `max_tasks` registrations.
    pub fn new(max_tasks: usize, lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StackInner::default())),
            max_tasks,
            lock_timeout,
        }
    }

    /// Registers a task for monitoring and returns its handle.
    ///
    /// The stack is assumed untouched at registration, so the initial margin
    /// and the running minimum both start at `capacity_words`. Names longer
    /// than [`MAX_TASK_NAME_LEN`] are truncated before the uniqueness check.
    pub fn register(&self, name: &str, capacity_words: u32) -> MonitorResult<TaskKey> {
        let name = truncate_name(name);
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        if inner.tasks.len() >= self.max_tasks {
            return Err(MonitorError::CapacityExceeded {
                max: self.max_tasks,
            });
        }
        if inner.tasks.iter().any(|t| t.name == name) {
            return Err(MonitorError::DuplicateName(name));
        }
        let key = TaskKey(inner.tasks.len());
        inner.tasks.push(TaskEntry {
            name: name.clone(),
            capacity_words,
            current_margin_words: capacity_words,
            minimum_margin_words: capacity_words,
            usage_percent: 0,
            peak_usage_percent: 0,
            warning_issued: false,
            last_sample: Uptime(0),
        });
        inner.stats.tasks_monitored = inner.tasks.len() as u32;
        log::info!("Registered stack monitor for task '{name}' ({capacity_words} words)");
        Ok(key)
    }

    /// Records a fresh margin measurement for a task.
    ///
    /// Margins above the configured capacity are clamped to it, so the
    /// `minimum <= current <= capacity` invariant holds even against a noisy
    /// source. The running minimum only ever decreases; the peak usage
    /// percentage is always the classification of that minimum.
    pub fn sample(&self, key: TaskKey, margin_words: u32, now: Uptime) -> MonitorResult<StackSample> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let entry = inner
            .tasks
            .get_mut(key.0)
            .ok_or_else(|| MonitorError::UnknownEntity(format!("task key {}", key.0)))?;

        let margin = margin_words.min(entry.capacity_words);
        entry.current_margin_words = margin;
        entry.usage_percent = usage_percent(entry.capacity_words, margin);
        if margin < entry.minimum_margin_words {
            entry.minimum_margin_words = margin;
            entry.peak_usage_percent = usage_percent(entry.capacity_words, margin);
        }
        entry.last_sample = now;

        let sample = StackSample {
            usage_percent: entry.usage_percent,
            band: SeverityBand::classify(entry.usage_percent),
            peak_usage_percent: entry.peak_usage_percent,
        };

        inner.stats.proactive_checks += 1;
        if sample.band.is_elevated() {
            inner.stats.high_usage_events += 1;
        }
        if sample.band == SeverityBand::Critical {
            inner.stats.critical_usage_events += 1;
        }
        Ok(sample)
    }

    /// Marks that a warning was emitted for a task, updating the global
    /// counters the report surfaces.
    pub fn mark_warning(&self, key: TaskKey, now: Uptime) -> MonitorResult<()> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let name = {
            let entry = inner
                .tasks
                .get_mut(key.0)
                .ok_or_else(|| MonitorError::UnknownEntity(format!("task key {}", key.0)))?;
            entry.warning_issued = true;
            entry.name.clone()
        };
        inner.stats.warnings_issued += 1;
        inner.stats.last_warning_task = Some(name);
        inner.stats.last_warning_time = Some(now);
        Ok(())
    }

    /// Current usage percentage of a task, by name.
    pub fn usage_percent(&self, name: &str) -> MonitorResult<u8> {
        self.read_entry(name, |entry| entry.usage_percent)
    }

    /// Peak usage percentage of a task, by name.
    pub fn peak_usage_percent(&self, name: &str) -> MonitorResult<u8> {
        self.read_entry(name, |entry| entry.peak_usage_percent)
    }

    /// Name of a registered task, by key.
    pub fn task_name(&self, key: TaskKey) -> MonitorResult<String> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        inner
            .tasks
            .get(key.0)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| MonitorError::UnknownEntity(format!("task key {}", key.0)))
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> MonitorResult<usize> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        Ok(inner.tasks.len())
    }

    /// Copies every entry into report summaries, in registration order,
    /// together with the registry-wide counters. The lock is held only for
    /// the duration of the copy.
    pub fn summaries(&self) -> MonitorResult<(Vec<TaskSummary>, StackStats)> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let tasks = inner
            .tasks
            .iter()
            .map(|entry| TaskSummary {
                name: entry.name.clone(),
                capacity_words: entry.capacity_words,
                current_margin_words: entry.current_margin_words,
                minimum_margin_words: entry.minimum_margin_words,
                usage_percent: entry.usage_percent,
                peak_usage_percent: entry.peak_usage_percent,
                warning_issued: entry.warning_issued,
                last_sample: entry.last_sample,
            })
            .collect();
        Ok((tasks, inner.stats.clone()))
    }

    fn read_entry<R>(&self, name: &str, read: impl FnOnce(&TaskEntry) -> R) -> MonitorResult<R> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        inner
            .tasks
            .iter()
            .find(|t| t.name == name)
            .map(read)
            .ok_or_else(|| MonitorError::UnknownEntity(name.to_string()))
    }
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_TASK_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> StackLedger {
        StackLedger::new(8, Duration::from_millis(10))
    }

    #[test]
    fn test_register_and_initial_state() {
        let ledger = ledger();
        let key = ledger.register("Sensor", 1000).unwrap();

        // Untouched stack: full margin, zero usage.
        let sample = ledger.sample(key, 1000, Uptime(1)).unwrap();
        assert_eq!(sample.usage_percent, 0);
        assert_eq!(sample.band, SeverityBand::Normal);
        assert_eq!(ledger.usage_percent("Sensor").unwrap(), 0);
        assert_eq!(ledger.peak_usage_percent("Sensor").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_name_leaves_registry_unchanged() {
        let ledger = ledger();
        ledger.register("A", 1000).unwrap();
        let err = ledger.register("A", 500).unwrap_err();
        assert_eq!(err, MonitorError::DuplicateName("A".to_string()));

        // Original entry keeps its capacity: a full margin still reads 0%.
        let (summaries, _) = ledger.summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].capacity_words, 1000);
    }

    #[test]
    fn test_registry_capacity_bound() {
        let ledger = StackLedger::new(3, Duration::from_millis(10));
        for i in 0..3 {
            ledger.register(&format!("T{i}"), 100).unwrap();
        }
        let err = ledger.register("T3", 100).unwrap_err();
        assert_eq!(err, MonitorError::CapacityExceeded { max: 3 });
        assert_eq!(ledger.task_count().unwrap(), 3);
    }

    #[test]
    fn test_minimum_margin_is_monotonic() {
        let ledger = ledger();
        let key = ledger.register("Worker", 1000).unwrap();

        let margins = [900, 400, 700, 250, 800, 999];
        for (i, margin) in margins.iter().enumerate() {
            ledger.sample(key, *margin, Uptime(i as u64)).unwrap();
        }

        let (summaries, _) = ledger.summaries().unwrap();
        let entry = &summaries[0];
        // The minimum equals the smallest submitted margin, regardless of
        // later recoveries.
        assert_eq!(entry.minimum_margin_words, 250);
        assert_eq!(entry.current_margin_words, 999);
        assert_eq!(entry.peak_usage_percent, 75);
        assert_eq!(entry.usage_percent, 0);
    }

    #[test]
    fn test_zero_margin_is_critical() {
        let ledger = ledger();
        let key = ledger.register("Tight", 128).unwrap();
        let sample = ledger.sample(key, 0, Uptime(5)).unwrap();
        assert_eq!(sample.usage_percent, 100);
        assert_eq!(sample.band, SeverityBand::Critical);
    }

    #[test]
    fn test_margin_above_capacity_clamped() {
        let ledger = ledger();
        let key = ledger.register("Noisy", 256).unwrap();
        let sample = ledger.sample(key, 512, Uptime(1)).unwrap();
        assert_eq!(sample.usage_percent, 0);
        let (summaries, _) = ledger.summaries().unwrap();
        assert_eq!(summaries[0].current_margin_words, 256);
    }

    #[test]
    fn test_usage_percent_truncates() {
        let ledger = ledger();
        let key = ledger.register("Odd", 3).unwrap();
        // 1 of 3 words used: 33.3% truncates to 33.
        let sample = ledger.sample(key, 2, Uptime(1)).unwrap();
        assert_eq!(sample.usage_percent, 33);
    }

    #[test]
    fn test_unknown_entity_reads() {
        let ledger = ledger();
        assert_eq!(
            ledger.usage_percent("Ghost").unwrap_err(),
            MonitorError::UnknownEntity("Ghost".to_string())
        );
        assert_eq!(
            ledger.peak_usage_percent("Ghost").unwrap_err(),
            MonitorError::UnknownEntity("Ghost".to_string())
        );
    }

    #[test]
    fn test_name_truncation() {
        let ledger = ledger();
        ledger
            .register("AVeryLongTaskNameIndeed", 100)
            .unwrap();
        assert!(ledger.usage_percent("AVeryLongTaskNam").is_ok());
    }

    #[test]
    fn test_stats_counters() {
        let ledger = ledger();
        let key = ledger.register("Busy", 100).unwrap();

        ledger.sample(key, 80, Uptime(1)).unwrap(); // 20% -> Normal
        ledger.sample(key, 25, Uptime(2)).unwrap(); // 75% -> Caution
        ledger.sample(key, 5, Uptime(3)).unwrap(); // 95% -> Critical

        let (_, stats) = ledger.summaries().unwrap();
        assert_eq!(stats.tasks_monitored, 1);
        assert_eq!(stats.proactive_checks, 3);
        assert_eq!(stats.high_usage_events, 2);
        assert_eq!(stats.critical_usage_events, 1);
        assert_eq!(stats.warnings_issued, 0);
    }

    #[test]
    fn test_mark_warning_updates_stats() {
        let ledger = ledger();
        let key = ledger.register("Hot", 100).unwrap();
        ledger.mark_warning(key, Uptime(42)).unwrap();

        let (summaries, stats) = ledger.summaries().unwrap();
        assert!(summaries[0].warning_issued);
        assert_eq!(stats.warnings_issued, 1);
        assert_eq!(stats.last_warning_task.as_deref(), Some("Hot"));
        assert_eq!(stats.last_warning_time, Some(Uptime(42)));
    }

    #[test]
    fn test_concurrent_samples_keep_minimum() {
        // Generous lock timeout: the point here is the monotonic fold under
        // contention, not the bounded wait.
        let ledger = StackLedger::new(8, Duration::from_secs(1));
        let key = ledger.register("Shared", 10_000).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for step in 0..100u32 {
                        let margin = 10_000 - (worker * 100 + step);
                        ledger.sample(key, margin, Uptime(0)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (summaries, stats) = ledger.summaries().unwrap();
        // Worst submitted margin: worker 3, step 99.
        assert_eq!(summaries[0].minimum_margin_words, 10_000 - 399);
        assert_eq!(stats.proactive_checks, 400);
    }
}
