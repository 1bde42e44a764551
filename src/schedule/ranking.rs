//! Confidence scoring for (slot, opponent) pairings.
//!
//! Score = base + preference bonus + optimal-time bonus + weekend bonus
//! + compatibility * weight, clamped to [0, 1]. The preference bonus is either
//! the both-preferred or the single-preferred weight, never both.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::slot_utils::{day_of_week, is_weekend};
use super::types::{RankCandidate, Suggestion};

/// Compatibility score from which an opponent is labelled "highly compatible".
const HIGH_COMPATIBILITY: f64 = 0.8;
/// Compatibility score from which an opponent is labelled "compatible".
const COMPATIBLE: f64 = 0.5;

const FALLBACK_REASON: &str = "Good mutual availability";

/// Weights of the confidence model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f64,
    pub both_preferred: f64,
    pub single_preferred: f64,
    pub optimal_time: f64,
    pub weekend: f64,
    pub compatibility: f64,
    /// Start hours (inclusive) considered prime time on Saturday and Sunday
    pub weekend_optimal_hours: RangeInclusive<u32>,
    /// Start hours (inclusive) considered prime time Monday to Friday
    pub weekday_optimal_hours: RangeInclusive<u32>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            both_preferred: 0.3,
            single_preferred: 0.15,
            optimal_time: 0.2,
            weekend: 0.1,
            compatibility: 0.2,
            weekend_optimal_hours: 9..=11,
            weekday_optimal_hours: 17..=19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceMatch {
    Both,
    One,
    Neither,
}

/// Which bonuses applied to a pairing and the resulting confidence
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub preference: PreferenceMatch,
    pub optimal_time: bool,
    pub weekend: bool,
    pub compatibility: Option<f64>,
    pub confidence: f64,
}

impl ScoreBreakdown {
    /// Human-readable rationale, labels in fixed priority order
    pub fn reason(&self) -> String {
        let mut reasons = Vec::new();

        match self.preference {
            PreferenceMatch::Both => reasons.push("both players' preferred time"),
            PreferenceMatch::One => reasons.push("one player's preferred time"),
            PreferenceMatch::Neither => {}
        }

        match self.compatibility {
            Some(score) if score >= HIGH_COMPATIBILITY => reasons.push("highly compatible opponent"),
            Some(score) if score >= COMPATIBLE => reasons.push("compatible opponent"),
            _ => {}
        }

        if self.optimal_time {
            if self.weekend {
                reasons.push("optimal weekend morning slot");
            } else {
                reasons.push("popular evening time");
            }
        }

        if self.weekend {
            reasons.push("weekend match");
        }

        if reasons.is_empty() {
            FALLBACK_REASON.to_string()
        } else {
            format!("Great time because: {}", reasons.join(", "))
        }
    }
}

/// Scores pairings and returns a sorted, capped suggestion list
#[derive(Debug, Clone, Default)]
pub struct ConfidenceRanker {
    weights: ScoringWeights,
}

impl ConfidenceRanker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, candidate: &RankCandidate) -> ScoreBreakdown {
        let w = &self.weights;
        let start = candidate.slot.start;
        let hour = start.hour();
        let weekend = is_weekend(start);

        let preference = match (candidate.preference_a, candidate.preference_b) {
            (true, true) => PreferenceMatch::Both,
            (true, false) | (false, true) => PreferenceMatch::One,
            (false, false) => PreferenceMatch::Neither,
        };

        let optimal_time = if weekend {
            w.weekend_optimal_hours.contains(&hour)
        } else {
            w.weekday_optimal_hours.contains(&hour)
        };

        let compatibility = candidate.compatibility.as_ref().map(|c| c.score);

        let mut sum = w.base;
        sum += match preference {
            PreferenceMatch::Both => w.both_preferred,
            PreferenceMatch::One => w.single_preferred,
            PreferenceMatch::Neither => 0.0,
        };
        if optimal_time {
            sum += w.optimal_time;
        }
        if weekend {
            sum += w.weekend;
        }
        if let Some(score) = compatibility {
            sum += score * w.compatibility;
        }

        ScoreBreakdown {
            preference,
            optimal_time,
            weekend,
            compatibility,
            confidence: clamp_confidence(sum),
        }
    }

    /// Ranks pairings by confidence (desc) then start time (asc), keeping at most `max_results`
    pub fn rank(&self, candidates: &[RankCandidate], max_results: usize) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = candidates
            .iter()
            .map(|candidate| {
                let breakdown = self.score(candidate);
                Suggestion {
                    opponent_id: candidate.opponent_id.clone(),
                    datetime: candidate.slot.start,
                    end: candidate.slot.end,
                    confidence: breakdown.confidence,
                    reason: breakdown.reason(),
                    day_of_week: day_of_week(candidate.slot.start.date()),
                }
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.datetime.cmp(&b.datetime))
        });
        suggestions.truncate(max_results);

        debug!(
            candidates = candidates.len(),
            returned = suggestions.len(),
            "ranked scheduling suggestions"
        );
        suggestions
    }
}

fn clamp_confidence(sum: f64) -> f64 {
    if sum.is_finite() {
        sum.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
