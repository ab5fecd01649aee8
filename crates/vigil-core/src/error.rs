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

//! Error taxonomy of the monitor.
//!
//! Every variant is a local, synchronous, recoverable-by-caller condition.
//! None of them crash the monitor; failed operations leave the ledgers
//! unchanged.

use std::fmt::Display;

/// Convenience alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// An error that can occur within the monitoring system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// An operation referenced a task that was never registered.
    UnknownEntity(String),
    /// A registration used a name that is already registered.
    DuplicateName(String),
    /// The bounded task registry is full.
    CapacityExceeded {
        /// The configured maximum number of monitored tasks.
        max: usize,
    },
    /// The heap ledger was initialized a second time.
    AlreadyInitialized,
    /// A heap ledger operation ran before `init`.
    NotInitialized,
    /// A ledger lock could not be acquired within the bounded wait.
    LedgerBusy,
}

impl Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::UnknownEntity(name) => write!(f, "unknown monitored task: {name}"),
            MonitorError::DuplicateName(name) => {
                write!(f, "task name already registered: {name}")
            }
            MonitorError::CapacityExceeded { max } => {
                write!(f, "task registry full ({max} entries)")
            }
            MonitorError::AlreadyInitialized => write!(f, "heap ledger already initialized"),
            MonitorError::NotInitialized => write!(f, "heap ledger not initialized"),
            MonitorError::LedgerBusy => write!(f, "ledger lock wait timed out"),
        }
    }
}

impl std::error::Error for MonitorError {}
