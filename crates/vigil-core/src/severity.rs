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

//! Severity classification of usage percentages.
//!
//! A single banding scheme is shared by stack and heap monitoring so that
//! "80% of a task's stack" and "80% of the heap" read the same on a report.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A discrete severity classification of a usage percentage.
///
/// The ordering is meaningful: `Normal < Caution < Warning < Critical`,
/// which is what the warning gate relies on to detect escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityBand {
    /// Usage below every threshold.
    Normal,
    /// Usage at or above 70%.
    Caution,
    /// Usage at or above 80%.
    Warning,
    /// Usage at or above 90%.
    Critical,
}

impl SeverityBand {
    /// Inclusive lower bound of the `Caution` band, in percent.
    pub const CAUTION_PERCENT: u8 = 70;
    /// Inclusive lower bound of the `Warning` band, in percent.
    pub const WARNING_PERCENT: u8 = 80;
    /// Inclusive lower bound of the `Critical` band, in percent.
    pub const CRITICAL_PERCENT: u8 = 90;

    /// Classifies a usage percentage into a severity band.
    ///
    /// Total over the whole `u8` range; values above 100 (which the ledgers
    /// never produce) saturate into `Critical`. Band boundaries are inclusive
    /// on their lower bound: 70 is already `Caution`, not `Normal`.
    pub fn classify(percent: u8) -> Self {
        match percent {
            p if p >= Self::CRITICAL_PERCENT => SeverityBand::Critical,
            p if p >= Self::WARNING_PERCENT => SeverityBand::Warning,
            p if p >= Self::CAUTION_PERCENT => SeverityBand::Caution,
            _ => SeverityBand::Normal,
        }
    }

    /// Returns `true` for any band other than `Normal`.
    pub fn is_elevated(&self) -> bool {
        *self != SeverityBand::Normal
    }

    /// Short uppercase label used in console output.
    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Normal => "ok",
            SeverityBand::Caution => "CAUTION",
            SeverityBand::Warning => "WARNING",
            SeverityBand::Critical => "CRITICAL",
        }
    }
}

impl Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
