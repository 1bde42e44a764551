//! Collaborator seams around the engine: where availability, calendar busy
//! times and compatibility scores come from.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::compatibility::{compatibility_between, recommend_players, PlayerProfile};
use crate::error::ServiceError;
use crate::schedule::{AvailabilitySlot, BusyEvent, Compatibility};

/// Source of a player's weekly recurring availability
pub trait AvailabilityStore {
    fn availability(&self, player_id: &str) -> Result<Vec<AvailabilitySlot>, ServiceError>;
}

/// Source of absolute busy intervals (e.g. a synced calendar)
pub trait BusyEventSource {
    /// Events intersecting the dates `[from, to]`; a player without a calendar has none
    fn busy_events(
        &self,
        player_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BusyEvent>, ServiceError>;
}

/// Opaque scorer of how well two players would match
pub trait CompatibilityOracle {
    fn compatibility(&self, player_id: &str, opponent_id: &str) -> Option<Compatibility>;

    /// Opponent ids worth proposing to `player_id`, best first
    fn recommended_opponents(&self, player_id: &str, limit: usize) -> Vec<String>;
}

/// In-process stand-in for the hosted backend, seeded from CSV or the HTTP API
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    availability: HashMap<String, Vec<AvailabilitySlot>>,
    busy: HashMap<String, Vec<BusyEvent>>,
    profiles: HashMap<String, PlayerProfile>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_availability(&mut self, player_id: &str, slot: AvailabilitySlot) {
        self.availability
            .entry(player_id.to_string())
            .or_default()
            .push(slot);
    }

    /// Removes one matching slot, returns whether anything was removed
    pub fn remove_availability(&mut self, player_id: &str, slot: &AvailabilitySlot) -> bool {
        let Some(slots) = self.availability.get_mut(player_id) else {
            return false;
        };
        match slots.iter().position(|s| s == slot) {
            Some(pos) => {
                slots.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replaces every player's availability at once (bulk upload)
    pub fn replace_availability(&mut self, rows: Vec<(String, AvailabilitySlot)>) {
        self.availability.clear();
        for (player_id, slot) in rows {
            self.add_availability(&player_id, slot);
        }
    }

    pub fn add_busy_event(&mut self, player_id: &str, event: BusyEvent) {
        self.busy.entry(player_id.to_string()).or_default().push(event);
    }

    pub fn replace_busy_events(&mut self, rows: Vec<(String, BusyEvent)>) {
        self.busy.clear();
        for (player_id, event) in rows {
            self.add_busy_event(&player_id, event);
        }
    }

    pub fn upsert_profile(&mut self, profile: PlayerProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn replace_profiles(&mut self, profiles: Vec<PlayerProfile>) {
        self.profiles.clear();
        for profile in profiles {
            self.upsert_profile(profile);
        }
    }

    pub fn profile(&self, player_id: &str) -> Option<&PlayerProfile> {
        self.profiles.get(player_id)
    }

    /// All profiles, ordered by id so callers see a stable order
    pub fn profiles(&self) -> Vec<PlayerProfile> {
        let mut profiles: Vec<PlayerProfile> = self.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    pub fn player_count(&self) -> usize {
        self.availability.len()
    }
}

impl AvailabilityStore for InMemoryStore {
    fn availability(&self, player_id: &str) -> Result<Vec<AvailabilitySlot>, ServiceError> {
        Ok(self.availability.get(player_id).cloned().unwrap_or_default())
    }
}

impl BusyEventSource for InMemoryStore {
    fn busy_events(
        &self,
        player_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BusyEvent>, ServiceError> {
        let range_start = from.and_time(NaiveTime::MIN);
        let range_end = to
            .succ_opt()
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN));
        Ok(self
            .busy
            .get(player_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.conflicts_with(range_start, range_end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl CompatibilityOracle for InMemoryStore {
    fn compatibility(&self, player_id: &str, opponent_id: &str) -> Option<Compatibility> {
        let player = self.profiles.get(player_id)?;
        let opponent = self.profiles.get(opponent_id)?;
        Some(compatibility_between(player, opponent))
    }

    fn recommended_opponents(&self, player_id: &str, limit: usize) -> Vec<String> {
        let Some(player) = self.profiles.get(player_id) else {
            return Vec::new();
        };
        recommend_players(player, &self.profiles(), limit)
            .into_iter()
            .map(|r| r.recommended_player_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slot_utils::parse_datetime;

    #[test]
    fn busy_events_are_filtered_to_the_date_range() {
        let mut store = InMemoryStore::new();
        for (start, end) in [
            ("2025-01-05 23:00", "2025-01-06 01:00"),
            ("2025-01-06 18:00", "2025-01-06 19:00"),
            ("2025-01-08 09:00", "2025-01-08 10:00"),
        ] {
            store.add_busy_event(
                "p1",
                BusyEvent::new(parse_datetime(start).unwrap(), parse_datetime(end).unwrap()),
            );
        }
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let events = store.busy_events("p1", monday, monday).unwrap();
        assert_eq!(events.len(), 2);
        assert!(store.busy_events("nobody", monday, monday).unwrap().is_empty());
    }

    #[test]
    fn busy_events_up_to_the_last_date() {
        let mut store = InMemoryStore::new();
        let last = NaiveDate::MAX.and_time(NaiveTime::MIN);
        store.add_busy_event("p1", BusyEvent::new(last, last + chrono::Duration::hours(1)));
        let events = store
            .busy_events("p1", NaiveDate::MAX, NaiveDate::MAX)
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn add_and_remove_availability() {
        let mut store = InMemoryStore::new();
        let slot = AvailabilitySlot::new(2, 600, 720, true);
        store.add_availability("p1", slot.clone());
        assert_eq!(store.availability("p1").unwrap(), vec![slot.clone()]);
        assert!(store.remove_availability("p1", &slot));
        assert!(!store.remove_availability("p1", &slot));
        assert!(store.availability("p1").unwrap().is_empty());
    }

    #[test]
    fn oracle_needs_both_profiles() {
        let mut store = InMemoryStore::new();
        store.upsert_profile(PlayerProfile {
            id: "p1".to_string(),
            full_name: "Ana".to_string(),
            location: Some("Denver".to_string()),
            age: None,
            current_rating: None,
            playing_style: None,
            coordinates: None,
        });
        assert!(store.compatibility("p1", "p2").is_none());
        assert!(store.recommended_opponents("p2", 5).is_empty());
    }
}
