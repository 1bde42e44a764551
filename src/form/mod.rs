pub mod submission;
pub mod export;

pub use submission::{AvailabilitySubmission, validate_submission};
pub use export::export_availability_to_csv;
