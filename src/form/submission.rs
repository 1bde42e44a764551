use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schedule::slot_utils::parse_time_to_minutes;
use crate::schedule::AvailabilitySlot;

/// Availability submission from the frontend, times as entered ("HH:MM")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySubmission {
    pub player_id: String,
    /// 0 = Sunday, 6 = Saturday
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_preferred: bool,
}

/// Validates a submission and turns it into a stored slot
pub fn validate_submission(
    req: &AvailabilitySubmission,
) -> Result<(String, AvailabilitySlot), ValidationError> {
    // Validate player ID
    let player_id = req.player_id.trim();
    if player_id.is_empty() {
        return Err(ValidationError::MissingField("playerId"));
    }

    let start = parse_time_to_minutes(&req.start_time)
        .ok_or_else(|| ValidationError::InvalidTime(req.start_time.clone()))?;
    let end = parse_time_to_minutes(&req.end_time)
        .ok_or_else(|| ValidationError::InvalidTime(req.end_time.clone()))?;

    // Day range and start < end
    let slot = AvailabilitySlot::new(req.day_of_week, start, end, req.is_preferred);
    slot.validate()?;

    Ok((player_id.to_string(), slot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(player_id: &str, day: u8, start: &str, end: &str) -> AvailabilitySubmission {
        AvailabilitySubmission {
            player_id: player_id.to_string(),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_preferred: true,
        }
    }

    #[test]
    fn accepts_a_well_formed_submission() {
        let (player, slot) = validate_submission(&submission(" p1 ", 3, "18:00", "20:30")).unwrap();
        assert_eq!(player, "p1");
        assert_eq!(slot, AvailabilitySlot::new(3, 18 * 60, 20 * 60 + 30, true));
    }

    #[test]
    fn rejects_each_kind_of_bad_input() {
        assert_eq!(
            validate_submission(&submission("", 3, "18:00", "20:00")).unwrap_err(),
            ValidationError::MissingField("playerId")
        );
        assert_eq!(
            validate_submission(&submission("p1", 7, "18:00", "20:00")).unwrap_err(),
            ValidationError::DayOutOfRange(7)
        );
        assert_eq!(
            validate_submission(&submission("p1", 3, "6pm", "20:00")).unwrap_err(),
            ValidationError::InvalidTime("6pm".to_string())
        );
        assert!(matches!(
            validate_submission(&submission("p1", 3, "20:00", "18:00")).unwrap_err(),
            ValidationError::EmptyRange { .. }
        ));
    }

    #[test]
    fn deserializes_camel_case_with_default_preference() {
        let req: AvailabilitySubmission = serde_json::from_str(
            r#"{"playerId":"p1","dayOfWeek":6,"startTime":"09:00","endTime":"11:00"}"#,
        )
        .unwrap();
        assert!(!req.is_preferred);
        assert!(validate_submission(&req).is_ok());
    }
}
