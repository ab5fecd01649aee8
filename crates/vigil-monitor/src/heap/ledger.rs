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

//! Rolling allocator statistics ledger.
//!
//! The ledger is fed two ways: event-driven, by the application recording
//! individual allocation outcomes, and tick-driven, by the service adopting
//! a kernel-wide [`HeapStats`] snapshot. Both paths fold the running
//! minimum monotonically and keep cumulative counters non-decreasing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_core::lock::bounded_lock;
use vigil_core::report::HeapSummary;
use vigil_core::sampling::HeapStats;
use vigil_core::{MonitorError, MonitorResult};

#[derive(Debug)]
struct HeapState {
    capacity_bytes: usize,
    current_free_bytes: usize,
    minimum_free_bytes: usize,
    alloc_count: u64,
    dealloc_count: u64,
    failure_count: u64,
}

impl HeapState {
    /// Sets the current free measurement and keeps `minimum <= current`.
    fn set_free(&mut self, free_bytes: usize) {
        self.current_free_bytes = free_bytes.min(self.capacity_bytes);
        self.minimum_free_bytes = self.minimum_free_bytes.min(self.current_free_bytes);
    }
}

/// Thread-safe ledger of heap allocator statistics.
///
/// Cheap to clone; clones share the same underlying state. Initialized once
/// with a fixed capacity and never destroyed.
#[derive(Debug, Clone)]
pub struct HeapLedger {
    inner: Arc<Mutex<Option<HeapState>>>,
    lock_timeout: Duration,
}

impl HeapLedger {
    /// Creates an uninitialized ledger.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            lock_timeout,
        }
    }

    /// One-time initialization with the allocator's fixed capacity.
    ///
    /// The heap is assumed untouched: free and minimum-free both start at
    /// capacity.
    pub fn init(&self, capacity_bytes: usize) -> MonitorResult<()> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        if inner.is_some() {
            return Err(MonitorError::AlreadyInitialized);
        }
        *inner = Some(HeapState {
            capacity_bytes,
            current_free_bytes: capacity_bytes,
            minimum_free_bytes: capacity_bytes,
            alloc_count: 0,
            dealloc_count: 0,
            failure_count: 0,
        });
        log::info!("Heap ledger initialized ({capacity_bytes} bytes)");
        Ok(())
    }

    /// Records the outcome of one allocation attempt.
    ///
    /// A failed attempt only increments the failure counter: no bytes were
    /// actually taken, so the supplied free-byte measurements are discarded
    /// on purpose rather than folded into the ledger.
    pub fn record_allocation(
        &self,
        success: bool,
        bytes_requested: usize,
        current_free: usize,
        minimum_ever_free: usize,
    ) -> MonitorResult<()> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let state = inner.as_mut().ok_or(MonitorError::NotInitialized)?;
        if !success {
            state.failure_count += 1;
            log::debug!("Allocation of {bytes_requested} bytes failed");
            return Ok(());
        }
        state.alloc_count += 1;
        state.minimum_free_bytes = state.minimum_free_bytes.min(minimum_ever_free);
        state.set_free(current_free);
        Ok(())
    }

    /// Records one deallocation and the resulting free measurement.
    pub fn record_deallocation(&self, current_free: usize) -> MonitorResult<()> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let state = inner.as_mut().ok_or(MonitorError::NotInitialized)?;
        state.dealloc_count += 1;
        state.set_free(current_free);
        Ok(())
    }

    /// Adopts a kernel-wide statistics snapshot from the sampling tick.
    ///
    /// Cumulative counters fold with `max` so an event-driven ledger and a
    /// source that counts independently never move a counter backwards; the
    /// minimum folds with `min` as always.
    pub fn refresh(&self, stats: HeapStats) -> MonitorResult<()> {
        let mut inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let state = inner.as_mut().ok_or(MonitorError::NotInitialized)?;
        state.alloc_count = state.alloc_count.max(stats.alloc_count);
        state.dealloc_count = state.dealloc_count.max(stats.dealloc_count);
        state.failure_count = state.failure_count.max(stats.fail_count);
        state.minimum_free_bytes = state.minimum_free_bytes.min(stats.minimum_ever_free_bytes);
        state.set_free(stats.free_bytes);
        Ok(())
    }

    /// Heuristic fragmentation estimate in [0, 1].
    ///
    /// This is an approximation derived from allocation churn, carried over
    /// unchanged from the original monitor: a true measurement would need
    /// to walk the allocator's free list, which only the allocator can do.
    pub fn estimate_fragmentation(&self) -> MonitorResult<f64> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let state = inner.as_ref().ok_or(MonitorError::NotInitialized)?;
        Ok(fragmentation_estimate(state.alloc_count))
    }

    /// Pure read returning a value copy of the ledger.
    pub fn snapshot(&self) -> MonitorResult<HeapSummary> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        let state = inner.as_ref().ok_or(MonitorError::NotInitialized)?;
        Ok(HeapSummary {
            capacity_bytes: state.capacity_bytes,
            current_free_bytes: state.current_free_bytes,
            minimum_free_bytes: state.minimum_free_bytes,
            alloc_count: state.alloc_count,
            dealloc_count: state.dealloc_count,
            failure_count: state.failure_count,
            fragmentation: fragmentation_estimate(state.alloc_count),
        })
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> MonitorResult<bool> {
        let inner = bounded_lock(&self.inner, self.lock_timeout)?;
        Ok(inner.is_some())
    }
}

// Allocation-count modulo proxy, not a free-list walk.
fn fragmentation_estimate(alloc_count: u64) -> f64 {
    (alloc_count % 100) as f64 / 100.0 * 0.3
}
