use std::collections::BTreeMap;

use tracing::warn;

use super::types::AvailabilitySlot;
use crate::error::ValidationError;

/// A player's weekly availability addressable by day of week
///
/// Each day's slots are ordered by start then end time. Malformed slots are
/// skipped during indexing and kept in `rejected` for the caller to report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityIndex {
    by_day: BTreeMap<u8, Vec<AvailabilitySlot>>,
    rejected: Vec<ValidationError>,
}

impl AvailabilityIndex {
    /// Builds the per-day index from an unordered slot list
    pub fn index_by_day(slots: &[AvailabilitySlot]) -> Self {
        let mut by_day: BTreeMap<u8, Vec<AvailabilitySlot>> = BTreeMap::new();
        let mut rejected = Vec::new();

        for slot in slots {
            // Slots should have been validated on write, but one bad row must not poison the rest
            if let Err(e) = slot.validate() {
                warn!(error = %e, day = slot.day_of_week, "skipping malformed availability slot");
                rejected.push(e);
                continue;
            }
            by_day.entry(slot.day_of_week).or_default().push(slot.clone());
        }

        for day_slots in by_day.values_mut() {
            day_slots.sort_by_key(|s| (s.start_time, s.end_time, !s.is_preferred));
        }

        Self { by_day, rejected }
    }

    /// Slots for one day, empty when the player has nothing that day
    pub fn slots_for(&self, day_of_week: u8) -> &[AvailabilitySlot] {
        self.by_day
            .get(&day_of_week)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Days that have at least one slot, in ascending order
    pub fn days(&self) -> impl Iterator<Item = u8> + '_ {
        self.by_day.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_day.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }

    pub fn rejected(&self) -> &[ValidationError] {
        &self.rejected
    }
}
