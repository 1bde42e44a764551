//! Skill rating helpers: UTR to NTRP conversion and the onboarding skill quiz.

use crate::error::ValidationError;

pub const UTR_MIN: f64 = 1.0;
pub const UTR_MAX: f64 = 16.5;

/// NTRP assigned to anyone at or below UTR 1.0; UTR players are competitive by nature.
pub const NTRP_FLOOR: f64 = 2.5;
/// NTRP ceiling, reached at UTR 10.0.
pub const NTRP_CEILING: f64 = 7.0;
const UTR_CEILING: f64 = 10.0;
/// NTRP gained per UTR point inside each band.
const NTRP_PER_UTR: f64 = 0.5;

/// Unrounded piecewise-linear mapping, clamped to [2.5, 7.0]
///
/// Each unit UTR band `[n, n + 1]` maps linearly onto a half-point NTRP band
/// starting at 2.5 for UTR 1.0.
pub fn utr_to_ntrp_raw(utr: f64) -> f64 {
    // NaN falls through to the floor
    if !(utr >= UTR_MIN) {
        return NTRP_FLOOR;
    }
    if utr >= UTR_CEILING {
        return NTRP_CEILING;
    }
    let band_floor = (utr.ceil() - 1.0).max(UTR_MIN);
    let band_base = NTRP_FLOOR + (band_floor - UTR_MIN) * NTRP_PER_UTR;
    band_base + (utr - band_floor) * NTRP_PER_UTR
}

/// Rounds to the nearest 0.5, ties go up (5.25 -> 5.5, 4.75 -> 5.0)
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0 + 0.5).floor() / 2.0
}

/// NTRP equivalent of a UTR rating, rounded to the nearest half point
pub fn utr_to_ntrp(utr: f64) -> f64 {
    round_to_half(utr_to_ntrp_raw(utr))
}

/// Checks a user-entered UTR before conversion
pub fn validate_utr(utr: f64) -> Result<f64, ValidationError> {
    if utr.is_finite() && (UTR_MIN..=UTR_MAX).contains(&utr) {
        Ok(utr)
    } else {
        Err(ValidationError::UtrOutOfRange(utr))
    }
}

/// NTRP from skill quiz answers, each worth 1-5 points
pub fn ntrp_from_quiz(points: &[u32]) -> Result<f64, ValidationError> {
    if points.is_empty() {
        return Err(ValidationError::EmptyQuiz);
    }
    let average = points.iter().map(|&p| p as f64).sum::<f64>() / points.len() as f64;

    // Half-point buckets from 1.5 up to 5.0
    let mut ntrp = 1.5;
    while ntrp < 5.0 && average > ntrp {
        ntrp += 0.5;
    }
    Ok(ntrp)
}
