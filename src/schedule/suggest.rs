//! End-to-end smart scheduling: fetch both players' data from the collaborators,
//! intersect their availability over the horizon and rank what is free.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::availability::AvailabilityIndex;
use super::intersect::{intersect, intersect_range, IntersectParams, PlayerSchedule};
use super::ranking::{ConfidenceRanker, ScoringWeights};
use super::types::{CandidateSlot, DayWindow, RankCandidate, Suggestion};
use crate::error::{SchedulingError, ServiceError};
use crate::store::{AvailabilityStore, BusyEventSource, CompatibilityOracle};

/// Longest search horizon a single request may scan
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Tunables of the scheduling pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub slot_duration_minutes: u32,
    pub step_minutes: u32,
    pub day_window: DayWindow,
    /// Number of days, starting at the requested date, searched for suggestions
    pub horizon_days: u32,
    pub max_results: usize,
    /// Opponents taken from recommendations when the caller names none
    pub recommended_opponents: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 120,
            step_minutes: 30,
            day_window: DayWindow::default(),
            horizon_days: 14,
            max_results: 10,
            recommended_opponents: 5,
        }
    }
}

impl SchedulingConfig {
    /// Last date of the horizon starting at `from`
    pub fn horizon_end(&self, from: NaiveDate) -> Result<NaiveDate, SchedulingError> {
        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(SchedulingError::InvalidParameter(format!(
                "horizon must cover 1 to {MAX_HORIZON_DAYS} days, got {}",
                self.horizon_days
            )));
        }
        from.checked_add_days(Days::new(u64::from(self.horizon_days - 1)))
            .ok_or_else(|| {
                SchedulingError::InvalidParameter(format!(
                    "horizon of {} days from {from} runs past the last supported date",
                    self.horizon_days
                ))
            })
    }

    pub fn intersect_params(&self) -> IntersectParams {
        IntersectParams {
            slot_duration_minutes: self.slot_duration_minutes,
            step_minutes: self.step_minutes,
            day_window: self.day_window,
        }
    }
}

/// Scheduling context bound to a data source
pub struct SmartScheduler<'a, S> {
    store: &'a S,
    config: &'a SchedulingConfig,
    ranker: ConfidenceRanker,
}

impl<'a, S> SmartScheduler<'a, S>
where
    S: AvailabilityStore + BusyEventSource + CompatibilityOracle,
{
    pub fn new(store: &'a S, config: &'a SchedulingConfig, weights: ScoringWeights) -> Self {
        Self {
            store,
            config,
            ranker: ConfidenceRanker::new(weights),
        }
    }

    /// Candidate slots on one date, each player's own calendar applied
    #[instrument(skip(self))]
    pub fn mutual_availability(
        &self,
        user_id: &str,
        opponent_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CandidateSlot>, ServiceError> {
        let params = self.config.intersect_params();
        params.validate()?;

        let user_index = AvailabilityIndex::index_by_day(&self.store.availability(user_id)?);
        let opponent_index = AvailabilityIndex::index_by_day(&self.store.availability(opponent_id)?);
        let user_busy = self.store.busy_events(user_id, date, date)?;
        let opponent_busy = self.store.busy_events(opponent_id, date, date)?;

        let slots = intersect(
            &PlayerSchedule::new(&user_index, &user_busy),
            &PlayerSchedule::new(&opponent_index, &opponent_busy),
            date,
            &params,
        )?;
        debug!(slots = slots.len(), "mutual availability computed");
        Ok(slots)
    }

    /// Ranked suggestions against the given opponents over the configured horizon
    #[instrument(skip(self, opponent_ids), fields(opponents = opponent_ids.len()))]
    pub fn suggest(
        &self,
        user_id: &str,
        opponent_ids: &[String],
        from: NaiveDate,
    ) -> Result<Vec<Suggestion>, ServiceError> {
        let to = self.config.horizon_end(from)?;
        let params = self.config.intersect_params();
        params.validate()?;

        // Fetch everything up front so collaborator failures surface before any engine work
        let user_index = AvailabilityIndex::index_by_day(&self.store.availability(user_id)?);
        let user_busy = self.store.busy_events(user_id, from, to)?;

        let mut opponents = Vec::with_capacity(opponent_ids.len());
        for opponent_id in opponent_ids.iter().filter(|id| id.as_str() != user_id) {
            let index = AvailabilityIndex::index_by_day(&self.store.availability(opponent_id)?);
            let busy = self.store.busy_events(opponent_id, from, to)?;
            let compatibility = self.store.compatibility(user_id, opponent_id);
            opponents.push((opponent_id, index, busy, compatibility));
        }

        let user = PlayerSchedule::new(&user_index, &user_busy);
        let mut candidates = Vec::new();
        for (opponent_id, index, busy, compatibility) in &opponents {
            let free_slots = intersect_range(
                &user,
                &PlayerSchedule::new(index, busy),
                from,
                to,
                &params,
            )?
            .into_iter()
            .filter(|slot| slot.available);

            candidates.extend(free_slots.map(|slot| {
                RankCandidate::from_slot(slot, opponent_id.as_str(), compatibility.clone())
            }));
        }

        let suggestions = self.ranker.rank(&candidates, self.config.max_results);
        info!(
            user = user_id,
            %from,
            %to,
            candidates = candidates.len(),
            suggestions = suggestions.len(),
            "generated smart scheduling suggestions"
        );
        Ok(suggestions)
    }

    /// `suggest` against the players the compatibility oracle recommends
    pub fn suggest_for_recommended(
        &self,
        user_id: &str,
        from: NaiveDate,
    ) -> Result<Vec<Suggestion>, ServiceError> {
        let opponents = self
            .store
            .recommended_opponents(user_id, self.config.recommended_opponents);
        self.suggest(user_id, &opponents, from)
    }
}
