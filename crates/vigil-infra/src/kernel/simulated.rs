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

//! Scriptable in-process kernel for tests and simulator runs.
//!
//! Stands in for the real-time kernel's measurement API: stack margins can
//! be set per task, and heap activity can either be scripted wholesale or
//! driven through the allocate/free helpers, which maintain the same
//! counters a real allocator port would.

use std::collections::HashMap;
use std::sync::Mutex;

use vigil_core::sampling::{HeapSampleSource, HeapStats, StackSampleSource, TaskId};

#[derive(Debug)]
struct KernelState {
    margins: HashMap<TaskId, u32>,
    heap_capacity: usize,
    heap: HeapStats,
}

/// A simulated kernel implementing both sample-source contracts.
///
/// All methods take `&self`; interior state is mutex-guarded so the kernel
/// can be shared between a scripting test thread and the monitor.
#[derive(Debug)]
pub struct SimulatedKernel {
    state: Mutex<KernelState>,
}

impl SimulatedKernel {
    /// Creates a kernel with an untouched heap of the given capacity.
    pub fn new(heap_capacity: usize) -> Self {
        Self {
            state: Mutex::new(KernelState {
                margins: HashMap::new(),
                heap_capacity,
                heap: HeapStats {
                    free_bytes: heap_capacity,
                    minimum_ever_free_bytes: heap_capacity,
                    ..HeapStats::default()
                },
            }),
        }
    }

    /// Heap capacity the kernel was created with.
    pub fn heap_capacity(&self) -> usize {
        self.state.lock().unwrap().heap_capacity
    }

    /// Scripts the remaining stack margin for a task.
    pub fn set_stack_margin(&self, task: TaskId, margin_words: u32) {
        self.state.lock().unwrap().margins.insert(task, margin_words);
    }

    /// Removes a task, as if the kernel deleted it.
    pub fn remove_task(&self, task: TaskId) {
        self.state.lock().unwrap().margins.remove(&task);
    }

    /// Replaces the heap statistics wholesale.
    pub fn set_heap_stats(&self, stats: HeapStats) {
        self.state.lock().unwrap().heap = stats;
    }

    /// Simulates one allocation attempt; returns whether it succeeded.
    ///
    /// Success takes the bytes out of the free pool and folds the running
    /// minimum; exhaustion only bumps the failure counter, exactly like a
    /// real allocator port reporting a failed `malloc`.
    pub fn allocate(&self, bytes: usize) -> bool {
        let mut state = self.state.lock().unwrap();
        if bytes > state.heap.free_bytes {
            state.heap.fail_count += 1;
            return false;
        }
        state.heap.free_bytes -= bytes;
        state.heap.minimum_ever_free_bytes =
            state.heap.minimum_ever_free_bytes.min(state.heap.free_bytes);
        state.heap.alloc_count += 1;
        true
    }

    /// Simulates freeing `bytes` back to the pool.
    pub fn free(&self, bytes: usize) {
        let mut state = self.state.lock().unwrap();
        state.heap.free_bytes = (state.heap.free_bytes + bytes).min(state.heap_capacity);
        state.heap.dealloc_count += 1;
    }
}

impl StackSampleSource for SimulatedKernel {
    fn stack_margin_words(&self, task: TaskId) -> Option<u32> {
        self.state.lock().unwrap().margins.get(&task).copied()
    }
}

impl HeapSampleSource for SimulatedKernel {
    fn heap_stats(&self) -> HeapStats {
        self.state.lock().unwrap().heap
    }
}
