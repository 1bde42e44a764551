//! CourtMate scheduling engine: mutual availability between two tennis
//! players, confidence-ranked match suggestions and skill rating conversion.

pub mod compatibility;
pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod logging;
pub mod parser;
pub mod rating;
pub mod schedule;
pub mod store;
pub mod web;

pub use error::{SchedulingError, ServiceError, ValidationError};
pub use schedule::{
    intersect, AvailabilityIndex, AvailabilitySlot, BusyEvent, CandidateSlot, ConfidenceRanker,
    IntersectParams, SchedulingConfig, ScoringWeights, SmartScheduler, Suggestion,
};
pub use store::{AvailabilityStore, BusyEventSource, CompatibilityOracle, InMemoryStore};
