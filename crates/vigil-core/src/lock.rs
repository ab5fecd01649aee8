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

//! Bounded mutex acquisition.
//!
//! Ledger critical sections are short, but a monitored task may itself be
//! the caller, so no monitor operation is allowed to block indefinitely.
//! Acquisition spins on `try_lock` with a deadline and fails with
//! [`MonitorError::LedgerBusy`] once it passes.

use crate::error::{MonitorError, MonitorResult};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Acquires `mutex` within `timeout`, or fails with `LedgerBusy`.
///
/// A poisoned mutex is treated as busy rather than propagating the panic of
/// another task into the caller; the monitor must never itself become a
/// fault path.
pub fn bounded_lock<T>(mutex: &Mutex<T>, timeout: Duration) -> MonitorResult<MutexGuard<'_, T>> {
    let deadline = Instant::now() + timeout;
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(std::sync::TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(MonitorError::LedgerBusy);
                }
                std::thread::yield_now();
            }
            Err(std::sync::TryLockError::Poisoned(_)) => return Err(MonitorError::LedgerBusy),
        }
    }
}
