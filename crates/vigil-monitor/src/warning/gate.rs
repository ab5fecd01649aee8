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

//! Per-entity warning gate.
//!
//! A sustained bad condition produces one warning, not one per sample. The
//! gate re-emits only on new information: a strictly worse band, or a
//! recurrence after the entity recovered to `Normal`.

use std::collections::HashMap;

use vigil_core::report::{Uptime, WarningRecord};
use vigil_core::SeverityBand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// Last observation was `Normal` (or the entity was never observed).
    Quiet,
    /// An elevated band was warned about and has not cleared yet.
    Escalating(SeverityBand),
}

/// Deduplicating warning gate over all monitored entities.
///
/// Entities start in the quiet state on first observation; no registration
/// step is needed. Driven from the single sampling pass, so it takes
/// `&mut self` and needs no lock of its own.
#[derive(Debug, Default)]
pub struct WarningGate {
    states: HashMap<String, GateState>,
}

impl WarningGate {
    /// Creates an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one classified sample through the gate.
    ///
    /// Returns a [`WarningRecord`] when the observation warrants a new
    /// emission: the first elevated band out of quiet, or a strict
    /// escalation above the band already warned about. A `Normal`
    /// observation silently clears the state so a later recurrence warns
    /// again.
    pub fn observe(
        &mut self,
        entity: &str,
        band: SeverityBand,
        usage_percent: u8,
        now: Uptime,
    ) -> Option<WarningRecord> {
        let state = self
            .states
            .entry(entity.to_string())
            .or_insert(GateState::Quiet);

        let emit = match (*state, band) {
            (_, SeverityBand::Normal) => {
                *state = GateState::Quiet;
                false
            }
            (GateState::Quiet, _) => {
                *state = GateState::Escalating(band);
                true
            }
            (GateState::Escalating(current), _) if band > current => {
                *state = GateState::Escalating(band);
                true
            }
            // Equal or lower elevated band: suppressed duplicate, the
            // latched band stays so a dip to Caution after a Warning does
            // not re-warn on the way back up to Warning.
            (GateState::Escalating(_), _) => false,
        };

        emit.then(|| WarningRecord {
            entity: entity.to_string(),
            band,
            usage_percent,
            issued_at: now,
        })
    }

    /// Number of entities the gate has observed at least once.
    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(gate: &mut WarningGate, bands: &[SeverityBand]) -> Vec<usize> {
        bands
            .iter()
            .enumerate()
            .filter_map(|(i, band)| gate.observe("T", *band, 0, Uptime(i as u64)).map(|_| i + 1))
            .collect()
    }

    #[test]
    fn test_sustained_condition_warns_once() {
        use SeverityBand::*;
        let mut gate = WarningGate::new();
        let emitted = drive(&mut gate, &[Caution, Caution, Caution, Caution]);
        assert_eq!(emitted, vec![1]);
    }

    #[test]
    fn test_escalate_recover_recur_sequence() {
        use SeverityBand::*;
        let mut gate = WarningGate::new();
        // The canonical sequence: emissions at positions 1, 3 and 6 only.
        let emitted = drive(
            &mut gate,
            &[Caution, Caution, Warning, Warning, Normal, Caution],
        );
        assert_eq!(emitted, vec![1, 3, 6]);
    }

    #[test]
    fn test_de_escalation_does_not_rewarn() {
        use SeverityBand::*;
        let mut gate = WarningGate::new();
        // Critical latches; dropping to Warning and climbing back is not
        // new information.
        let emitted = drive(&mut gate, &[Critical, Warning, Caution, Warning, Critical]);
        assert_eq!(emitted, vec![1]);
    }

    #[test]
    fn test_normal_never_emits() {
        use SeverityBand::*;
        let mut gate = WarningGate::new();
        let emitted = drive(&mut gate, &[Normal, Normal, Normal]);
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_entities_are_independent() {
        use SeverityBand::*;
        let mut gate = WarningGate::new();
        assert!(gate.observe("A", Caution, 72, Uptime(1)).is_some());
        // B's first Caution is its own first emission.
        assert!(gate.observe("B", Caution, 75, Uptime(2)).is_some());
        // A is still latched.
        assert!(gate.observe("A", Caution, 73, Uptime(3)).is_none());
        assert_eq!(gate.entity_count(), 2);
    }

    #[test]
    fn test_record_carries_context() {
        let mut gate = WarningGate::new();
        let record = gate
            .observe("Sensor", SeverityBand::Warning, 83, Uptime(1_234))
            .unwrap();
        assert_eq!(record.entity, "Sensor");
        assert_eq!(record.band, SeverityBand::Warning);
        assert_eq!(record.usage_percent, 83);
        assert_eq!(record.issued_at, Uptime(1_234));
    }
}
