//! Mutual availability: overlapping recurring ranges of two players turned
//! into fixed-length candidate slots on concrete dates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::availability::AvailabilityIndex;
use super::slot_utils::{at_minute, day_of_week};
use super::types::{BusyEvent, CandidateSlot, DayWindow, TimeRange};
use crate::error::SchedulingError;

/// One side of a pairing: recurring availability plus absolute busy events
#[derive(Debug, Clone, Copy)]
pub struct PlayerSchedule<'a> {
    pub availability: &'a AvailabilityIndex,
    pub busy: &'a [BusyEvent],
}

impl<'a> PlayerSchedule<'a> {
    pub fn new(availability: &'a AvailabilityIndex, busy: &'a [BusyEvent]) -> Self {
        Self { availability, busy }
    }

    /// Availability without any calendar data
    pub fn free(availability: &'a AvailabilityIndex) -> Self {
        Self {
            availability,
            busy: &[],
        }
    }
}

/// Shape of the generated candidate slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectParams {
    pub slot_duration_minutes: u32,
    pub step_minutes: u32,
    #[serde(default)]
    pub day_window: DayWindow,
}

impl Default for IntersectParams {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 120,
            step_minutes: 30,
            day_window: DayWindow::default(),
        }
    }
}

impl IntersectParams {
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.slot_duration_minutes == 0 {
            return Err(SchedulingError::InvalidParameter(
                "slot duration must be positive".to_string(),
            ));
        }
        if self.step_minutes == 0 {
            return Err(SchedulingError::InvalidParameter(
                "step must be positive".to_string(),
            ));
        }
        if !self.day_window.is_valid() {
            return Err(SchedulingError::InvalidParameter(format!(
                "day window {}:00-{}:00 is not a valid range",
                self.day_window.start_hour, self.day_window.end_hour
            )));
        }
        Ok(())
    }
}

/// Lazy sequence of `[start, start + duration]` windows inside an overlap
#[derive(Debug, Clone)]
pub struct CandidateWindows {
    next_start: u32,
    overlap_end: u32,
    duration: u32,
    step: u32,
}

impl CandidateWindows {
    pub fn new(overlap: TimeRange, duration: u32, step: u32) -> Self {
        Self {
            next_start: overlap.start,
            overlap_end: overlap.end,
            duration,
            step,
        }
    }
}

impl Iterator for CandidateWindows {
    type Item = TimeRange;

    fn next(&mut self) -> Option<TimeRange> {
        // Zero step would never advance
        if self.step == 0 || self.duration == 0 {
            return None;
        }
        let end = self.next_start.checked_add(self.duration)?;
        if end > self.overlap_end {
            return None;
        }
        let window = TimeRange::new(self.next_start, end);
        self.next_start = self.next_start.saturating_add(self.step);
        Some(window)
    }
}

/// Candidate slots on `target` where both players are simultaneously free
pub fn intersect(
    player_a: &PlayerSchedule<'_>,
    player_b: &PlayerSchedule<'_>,
    target: NaiveDate,
    params: &IntersectParams,
) -> Result<Vec<CandidateSlot>, SchedulingError> {
    params.validate()?;
    Ok(intersect_day(player_a, player_b, target, params))
}

/// `intersect` applied to every date in `[from, to]`, in chronological order
pub fn intersect_range(
    player_a: &PlayerSchedule<'_>,
    player_b: &PlayerSchedule<'_>,
    from: NaiveDate,
    to: NaiveDate,
    params: &IntersectParams,
) -> Result<Vec<CandidateSlot>, SchedulingError> {
    params.validate()?;
    if to < from {
        return Err(SchedulingError::InvalidParameter(format!(
            "date range ends ({to}) before it starts ({from})"
        )));
    }

    let mut candidates = Vec::new();
    for date in from.iter_days().take_while(|date| *date <= to) {
        candidates.extend(intersect_day(player_a, player_b, date, params));
    }
    debug!(
        %from,
        %to,
        candidates = candidates.len(),
        "computed mutual availability over range"
    );
    Ok(candidates)
}

fn intersect_day(
    player_a: &PlayerSchedule<'_>,
    player_b: &PlayerSchedule<'_>,
    target: NaiveDate,
    params: &IntersectParams,
) -> Vec<CandidateSlot> {
    let day = day_of_week(target);
    let slots_a = player_a.availability.slots_for(day);
    let slots_b = player_b.availability.slots_for(day);
    if slots_a.is_empty() || slots_b.is_empty() {
        trace!(%target, day, "no availability on one side");
        return Vec::new();
    }

    let window = params.day_window.range();
    // (start, end) -> (preferred by a, preferred by b); overlapping source ranges collapse here
    let mut windows: BTreeMap<TimeRange, (bool, bool)> = BTreeMap::new();

    for slot_a in slots_a {
        for slot_b in slots_b {
            let Some(overlap) = slot_a
                .range()
                .overlap(&slot_b.range())
                .and_then(|o| o.overlap(&window))
            else {
                continue;
            };

            for candidate in
                CandidateWindows::new(overlap, params.slot_duration_minutes, params.step_minutes)
            {
                let flags = windows.entry(candidate).or_insert((false, false));
                flags.0 |= slot_a.is_preferred;
                flags.1 |= slot_b.is_preferred;
            }
        }
    }

    windows
        .into_iter()
        .filter_map(|(range, (preferred_by_a, preferred_by_b))| {
            // Only the end of the last representable date can fail
            let start = at_minute(target, range.start)?;
            let end = at_minute(target, range.end)?;
            let conflicts = player_a
                .busy
                .iter()
                .chain(player_b.busy.iter())
                .any(|busy| busy.conflicts_with(start, end));
            Some(CandidateSlot {
                start,
                end,
                available: !conflicts,
                preferred_by_a,
                preferred_by_b,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::schedule::slot_utils::{minute_of_day, parse_datetime};
    use crate::schedule::types::AvailabilitySlot;

    const H: u32 = 60;

    // 2025-01-06 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn index(slots: &[AvailabilitySlot]) -> AvailabilityIndex {
        AvailabilityIndex::index_by_day(slots)
    }

    fn params(duration: u32, step: u32) -> IntersectParams {
        IntersectParams {
            slot_duration_minutes: duration,
            step_minutes: step,
            day_window: DayWindow::default(),
        }
    }

    fn busy(start: &str, end: &str) -> BusyEvent {
        BusyEvent::new(parse_datetime(start).unwrap(), parse_datetime(end).unwrap())
    }

    fn monday_evening_players() -> (AvailabilityIndex, AvailabilityIndex) {
        (
            index(&[AvailabilitySlot::new(1, 17 * H, 20 * H, true)]),
            index(&[AvailabilitySlot::new(1, 18 * H, 19 * H + 30, true)]),
        )
    }

    #[test]
    fn overlap_shorter_than_duration_yields_nothing() {
        let (a, b) = monday_evening_players();
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            &params(120, 30),
        )
        .unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn hour_slots_step_through_overlap() {
        let (a, b) = monday_evening_players();
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            &params(60, 30),
        )
        .unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, parse_datetime("2025-01-06 18:00").unwrap());
        assert_eq!(slots[0].end, parse_datetime("2025-01-06 19:00").unwrap());
        assert_eq!(slots[1].start, parse_datetime("2025-01-06 18:30").unwrap());
        assert_eq!(slots[1].end, parse_datetime("2025-01-06 19:30").unwrap());
        assert!(slots.iter().all(|s| s.available));
        assert!(slots.iter().all(|s| s.preferred_by_a && s.preferred_by_b));
    }

    #[test]
    fn busy_event_marks_overlapping_slots_unavailable() {
        let (a, b) = monday_evening_players();
        let b_busy = vec![busy("2025-01-06 18:15", "2025-01-06 18:45")];
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::new(&b, &b_busy),
            monday(),
            &params(60, 30),
        )
        .unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| !s.available));
    }

    #[test]
    fn busy_event_touching_slot_edge_does_not_conflict() {
        let (a, b) = monday_evening_players();
        let a_busy = vec![
            busy("2025-01-06 17:00", "2025-01-06 18:00"),
            busy("2025-01-06 19:30", "2025-01-06 21:00"),
        ];
        let slots = intersect(
            &PlayerSchedule::new(&a, &a_busy),
            &PlayerSchedule::free(&b),
            monday(),
            &params(60, 30),
        )
        .unwrap();
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn exact_and_enclosing_busy_events_conflict() {
        let (a, b) = monday_evening_players();
        for event in [
            busy("2025-01-06 18:00", "2025-01-06 19:00"),
            busy("2025-01-06 12:00", "2025-01-06 23:00"),
        ] {
            let events = vec![event];
            let slots = intersect(
                &PlayerSchedule::new(&a, &events),
                &PlayerSchedule::free(&b),
                monday(),
                &params(60, 30),
            )
            .unwrap();
            assert!(!slots[0].available);
        }
    }

    #[test]
    fn zero_duration_is_invalid() {
        let (a, b) = monday_evening_players();
        let err = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            &params(0, 30),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidParameter(_)));
    }

    #[test]
    fn zero_step_and_bad_window_are_invalid() {
        let (a, b) = monday_evening_players();
        let (pa, pb) = (PlayerSchedule::free(&a), PlayerSchedule::free(&b));
        assert!(intersect(&pa, &pb, monday(), &params(60, 0)).is_err());

        let mut inverted = params(60, 30);
        inverted.day_window = DayWindow {
            start_hour: 22,
            end_hour: 6,
        };
        assert!(intersect(&pa, &pb, monday(), &inverted).is_err());
    }

    #[test]
    fn missing_day_is_empty_not_error() {
        let (a, b) = monday_evening_players();
        let tuesday = monday() + Duration::days(1);
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            tuesday,
            &params(60, 30),
        )
        .unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn overlaps_are_clipped_to_day_window() {
        let a = index(&[AvailabilitySlot::new(1, 0, 24 * 60, false)]);
        let b = index(&[AvailabilitySlot::new(1, 4 * H, 8 * H, false)]);
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            &params(120, 60),
        )
        .unwrap();
        // 06:00-08:00 is the only window inside the default 06-22 window
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, parse_datetime("2025-01-06 06:00").unwrap());
    }

    #[test]
    fn multiple_ranges_are_paired_and_deduplicated() {
        let a = index(&[
            AvailabilitySlot::new(1, 8 * H, 10 * H, false),
            AvailabilitySlot::new(1, 8 * H, 12 * H, true),
            AvailabilitySlot::new(1, 18 * H, 20 * H, false),
        ]);
        let b = index(&[
            AvailabilitySlot::new(1, 9 * H, 11 * H, false),
            AvailabilitySlot::new(1, 19 * H, 21 * H, true),
        ]);
        let slots = intersect(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            &params(60, 60),
        )
        .unwrap();
        let starts: Vec<u32> = slots
            .iter()
            .map(|s| minute_of_day(s.start))
            .collect();
        assert_eq!(starts, vec![9 * H, 10 * H, 19 * H]);
        // 09:00 comes from both the plain and the preferred range of A
        assert!(slots[0].preferred_by_a);
        assert!(!slots[0].preferred_by_b);
        assert!(slots[2].preferred_by_b);
    }

    #[test]
    fn range_covers_each_date_in_order() {
        let a = index(&[
            AvailabilitySlot::new(1, 18 * H, 20 * H, false),
            AvailabilitySlot::new(3, 18 * H, 20 * H, false),
        ]);
        let b = a.clone();
        let from = monday();
        let to = from + Duration::days(9);
        let slots = intersect_range(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            from,
            to,
            &params(120, 30),
        )
        .unwrap();
        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.start.date()).collect();
        assert_eq!(
            dates,
            vec![
                from,
                from + Duration::days(2),
                from + Duration::days(7),
                from + Duration::days(9)
            ]
        );
    }

    #[test]
    fn range_ending_on_the_last_date_does_not_overflow() {
        let late: Vec<AvailabilitySlot> = (0..7)
            .map(|day| AvailabilitySlot::new(day, 22 * H, 24 * H, false))
            .collect();
        let (a, b) = (index(&late), index(&late));
        let params = IntersectParams {
            slot_duration_minutes: 120,
            step_minutes: 30,
            day_window: DayWindow {
                start_hour: 0,
                end_hour: 24,
            },
        };
        let to = NaiveDate::MAX;
        let from = to.pred_opt().unwrap();
        let slots = intersect_range(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            from,
            to,
            &params,
        )
        .unwrap();
        // The 22:00-24:00 window on the last date would end past it
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start.date(), from);
        assert_eq!(slots[0].end, to.and_time(chrono::NaiveTime::MIN));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let (a, b) = monday_evening_players();
        let err = intersect_range(
            &PlayerSchedule::free(&a),
            &PlayerSchedule::free(&b),
            monday(),
            monday() - Duration::days(1),
            &params(60, 30),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidParameter(_)));
    }

    #[test]
    fn windows_iterator_is_restartable() {
        let windows = CandidateWindows::new(TimeRange::new(0, 90), 60, 15);
        let first: Vec<_> = windows.clone().collect();
        let second: Vec<_> = windows.collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }
}
