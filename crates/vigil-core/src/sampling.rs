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

//! Measurement-source contracts.
//!
//! The monitor never measures anything itself: the surrounding kernel or
//! application implements these traits and the monitor polls them on its
//! sampling tick. Both contracts are synchronous and non-blocking, since a
//! monitored task may itself be the one doing the sampling.

use std::fmt::Debug;

/// Opaque identifier the kernel uses to address a task.
///
/// Assigned by the embedding application when it binds a task to the
/// monitor; the monitor only passes it back to the sample source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

/// Supplies remaining-stack-margin measurements for tasks.
pub trait StackSampleSource: Send + Sync + Debug {
    /// Returns the high-water-mark style remaining stack for a task, in
    /// words, or `None` if the kernel no longer knows the task.
    fn stack_margin_words(&self, task: TaskId) -> Option<u32>;
}

/// Supplies allocator-wide heap statistics.
pub trait HeapSampleSource: Send + Sync + Debug {
    /// Returns a snapshot of the allocator's current counters.
    fn heap_stats(&self) -> HeapStats;
}

/// A raw allocator statistics snapshot as reported by the kernel.
///
/// Counters are cumulative since allocator start; `minimum_ever_free_bytes`
/// is the allocator's own running minimum, which the heap ledger folds into
/// its own (the two can differ when the ledger attaches late).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes currently free.
    pub free_bytes: usize,
    /// Smallest number of free bytes the allocator has ever observed.
    pub minimum_ever_free_bytes: usize,
    /// Cumulative successful allocation count.
    pub alloc_count: u64,
    /// Cumulative deallocation count.
    pub dealloc_count: u64,
    /// Cumulative failed-allocation count.
    pub fail_count: u64,
}
