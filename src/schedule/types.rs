use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::slot_utils::{hhmm, minutes_to_time_string, MINUTES_PER_DAY};
use crate::error::ValidationError;

/// One weekly recurring block a player is willing to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    /// 0 = Sunday, 6 = Saturday
    pub day_of_week: u8,
    /// Minutes since midnight
    #[serde(with = "hhmm")]
    pub start_time: u32,
    #[serde(with = "hhmm")]
    pub end_time: u32,
    #[serde(default)]
    pub is_preferred: bool,
}

impl AvailabilitySlot {
    pub fn new(day_of_week: u8, start_time: u32, end_time: u32, is_preferred: bool) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
            is_preferred,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.day_of_week > 6 {
            return Err(ValidationError::DayOutOfRange(self.day_of_week));
        }
        if self.end_time > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidTime(minutes_to_time_string(self.end_time)));
        }
        if self.start_time >= self.end_time {
            return Err(ValidationError::EmptyRange {
                start: minutes_to_time_string(self.start_time),
                end: minutes_to_time_string(self.end_time),
            });
        }
        Ok(())
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// An externally sourced absolute interval (e.g. a calendar entry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyEvent {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusyEvent {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whether the event overlaps `[start, end)`; touching endpoints do not conflict
    pub fn conflicts_with(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && self.end > start
    }
}

/// Half-open range of minutes within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Common part of two ranges, None when they do not overlap
    pub fn overlap(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end > start).then_some(TimeRange { start, end })
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Hours of the day scanned for candidate slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for DayWindow {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 22,
        }
    }
}

impl DayWindow {
    pub fn is_valid(&self) -> bool {
        self.start_hour < self.end_hour && self.end_hour <= 24
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_hour * 60, self.end_hour * 60)
    }
}

/// A concrete fixed-duration window proposed as mutually available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
    pub preferred_by_a: bool,
    pub preferred_by_b: bool,
}

/// Externally supplied compatibility score for an opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compatibility {
    pub score: f64,
    #[serde(default)]
    pub factors: Vec<String>,
}

/// One (slot, opponent) pairing handed to the ranker
#[derive(Debug, Clone, PartialEq)]
pub struct RankCandidate {
    pub slot: CandidateSlot,
    pub opponent_id: String,
    pub preference_a: bool,
    pub preference_b: bool,
    pub compatibility: Option<Compatibility>,
}

impl RankCandidate {
    /// Pairing whose preference flags come from the slot itself
    pub fn from_slot(
        slot: CandidateSlot,
        opponent_id: impl Into<String>,
        compatibility: Option<Compatibility>,
    ) -> Self {
        Self {
            preference_a: slot.preferred_by_a,
            preference_b: slot.preferred_by_b,
            slot,
            opponent_id: opponent_id.into(),
            compatibility,
        }
    }
}

/// A ranked scheduling suggestion returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub opponent_id: String,
    pub datetime: NaiveDateTime,
    pub end: NaiveDateTime,
    pub confidence: f64,
    pub reason: String,
    pub day_of_week: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_day_and_empty_range() {
        assert_eq!(
            AvailabilitySlot::new(7, 60, 120, false).validate(),
            Err(ValidationError::DayOutOfRange(7))
        );
        assert!(matches!(
            AvailabilitySlot::new(1, 120, 120, false).validate(),
            Err(ValidationError::EmptyRange { .. })
        ));
        assert!(AvailabilitySlot::new(6, 0, MINUTES_PER_DAY, true).validate().is_ok());
    }

    #[test]
    fn overlap_discards_touching_ranges() {
        let a = TimeRange::new(17 * 60, 20 * 60);
        let b = TimeRange::new(18 * 60, 19 * 60 + 30);
        assert_eq!(a.overlap(&b), Some(TimeRange::new(18 * 60, 19 * 60 + 30)));
        assert_eq!(a.overlap(&TimeRange::new(20 * 60, 21 * 60)), None);
    }

    #[test]
    fn availability_slot_serializes_times_as_hhmm() {
        let slot = AvailabilitySlot::new(1, 17 * 60, 20 * 60, true);
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["startTime"], "17:00");
        assert_eq!(json["endTime"], "20:00");
        let back: AvailabilitySlot = serde_json::from_value(json).unwrap();
        assert_eq!(back, slot);
    }
}
