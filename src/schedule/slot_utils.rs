use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parses a time string (HH:MM) to minutes since midnight
/// "24:00" is accepted so a range can run until the end of the day
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    // Accept HH:MM:SS as stored by some backends, seconds are ignored
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let hours: u32 = parts[0].parse().ok()?;
    let minutes: u32 = parts[1].parse().ok()?;
    if hours == 24 && minutes == 0 {
        return Some(MINUTES_PER_DAY);
    }
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    if minutes == MINUTES_PER_DAY {
        return "24:00".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    format!("{:02}:{:02}", hours % 24, mins)
}

/// Day of week as stored in availability rows (0 = Sunday, 6 = Saturday)
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn is_weekend(datetime: NaiveDateTime) -> bool {
    matches!(datetime.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Absolute time for a minute offset on the given date, None past the last representable instant
pub fn at_minute(date: NaiveDate, minutes: u32) -> Option<NaiveDateTime> {
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::minutes(minutes as i64))
}

/// Minutes since midnight of an absolute time
pub fn minute_of_day(datetime: NaiveDateTime) -> u32 {
    datetime.hour() * 60 + datetime.minute()
}

/// Parses an absolute local timestamp, either "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DDTHH:MM[:SS]"
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Serde adapter storing minutes since midnight as "HH:MM"
pub mod hhmm {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::minutes_to_time_string(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_to_minutes(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {raw:?}")))
    }
}
