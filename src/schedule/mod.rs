pub mod types;
pub mod slot_utils;
pub mod availability;
pub mod intersect;
pub mod ranking;
pub mod suggest;

pub use types::{
    AvailabilitySlot, BusyEvent, CandidateSlot, Compatibility, DayWindow, RankCandidate,
    Suggestion, TimeRange,
};
pub use availability::AvailabilityIndex;
pub use intersect::{intersect, intersect_range, CandidateWindows, IntersectParams, PlayerSchedule};
pub use ranking::{ConfidenceRanker, ScoreBreakdown, ScoringWeights};
pub use suggest::{SchedulingConfig, SmartScheduler};
