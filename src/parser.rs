use std::io::Read;
use std::path::Path;

use csv::{Reader, StringRecord};
use tracing::{info, warn};

use crate::compatibility::{GeoPoint, PlayerProfile, PlayingStyle};
use crate::config::DataPaths;
use crate::schedule::slot_utils::{parse_datetime, parse_time_to_minutes};
use crate::schedule::{AvailabilitySlot, BusyEvent};
use crate::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("missing column: {0}")]
    MissingColumn(&'static str),
}

const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1"
}

/// Parses a day of week given either as 0-6 (0 = Sunday) or as a day name
fn parse_day(value: &str) -> Option<u8> {
    let value = value.trim();
    if let Ok(day) = value.parse::<u8>() {
        return Some(day);
    }
    let lower = value.to_lowercase();
    DAY_NAMES
        .iter()
        .position(|name| *name == lower || name[..3] == lower)
        .map(|pos| pos as u8)
}

/// Finds a column by header name (case-insensitive)
fn column(headers: &StringRecord, name: &'static str) -> Result<usize, ParseError> {
    optional_column(headers, name).ok_or(ParseError::MissingColumn(name))
}

fn optional_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn field<'a>(record: &'a StringRecord, col: Option<usize>) -> Option<&'a str> {
    col.and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Reads weekly availability rows: player_id, day_of_week, start_time, end_time, is_preferred
pub fn read_availability<R: Read>(input: R) -> Result<Vec<(String, AvailabilitySlot)>, ParseError> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let player_col = column(&headers, "player_id")?;
    let day_col = column(&headers, "day_of_week")?;
    let start_col = column(&headers, "start_time")?;
    let end_col = column(&headers, "end_time")?;
    let preferred_col = optional_column(&headers, "is_preferred");

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;

        let Some(player_id) = field(&record, Some(player_col)) else {
            warn!(line = line + 2, "skipping availability row without player id");
            continue;
        };
        let day = field(&record, Some(day_col)).and_then(parse_day);
        let start = field(&record, Some(start_col)).and_then(parse_time_to_minutes);
        let end = field(&record, Some(end_col)).and_then(parse_time_to_minutes);
        let (Some(day), Some(start), Some(end)) = (day, start, end) else {
            warn!(line = line + 2, player = player_id, "skipping unreadable availability row");
            continue;
        };

        let is_preferred = field(&record, preferred_col).map(parse_bool).unwrap_or(false);
        let slot = AvailabilitySlot::new(day, start, end, is_preferred);
        if let Err(e) = slot.validate() {
            warn!(line = line + 2, player = player_id, error = %e, "skipping invalid availability row");
            continue;
        }
        rows.push((player_id.to_string(), slot));
    }

    Ok(rows)
}

/// Reads calendar busy intervals: player_id, start, end
pub fn read_busy_events<R: Read>(input: R) -> Result<Vec<(String, BusyEvent)>, ParseError> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let player_col = column(&headers, "player_id")?;
    let start_col = column(&headers, "start")?;
    let end_col = column(&headers, "end")?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let player_id = field(&record, Some(player_col));
        let start = field(&record, Some(start_col)).and_then(parse_datetime);
        let end = field(&record, Some(end_col)).and_then(parse_datetime);

        let (Some(player_id), Some(start), Some(end)) = (player_id, start, end) else {
            warn!(line = line + 2, "skipping unreadable busy event row");
            continue;
        };
        // A reversed or empty interval can never block a slot
        if end <= start {
            warn!(line = line + 2, player = player_id, %start, %end, "skipping busy event that ends before it starts");
            continue;
        }
        rows.push((player_id.to_string(), BusyEvent::new(start, end)));
    }

    Ok(rows)
}

/// Reads player profiles: id, full_name, location, age, current_rating, playing_style, lat, lng
pub fn read_profiles<R: Read>(input: R) -> Result<Vec<PlayerProfile>, ParseError> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let id_col = column(&headers, "id")?;
    let name_col = optional_column(&headers, "full_name");
    let location_col = optional_column(&headers, "location");
    let age_col = optional_column(&headers, "age");
    let rating_col = optional_column(&headers, "current_rating");
    let style_col = optional_column(&headers, "playing_style");
    let lat_col = optional_column(&headers, "lat");
    let lng_col = optional_column(&headers, "lng");

    let mut profiles = Vec::new();
    for result in reader.records() {
        let record = result?;

        // Skip if essential fields are missing
        let Some(id) = field(&record, Some(id_col)) else {
            continue;
        };

        let lat = field(&record, lat_col).and_then(|v| v.parse::<f64>().ok());
        let lng = field(&record, lng_col).and_then(|v| v.parse::<f64>().ok());

        profiles.push(PlayerProfile {
            id: id.to_string(),
            full_name: field(&record, name_col).unwrap_or(id).to_string(),
            location: field(&record, location_col).map(str::to_string),
            age: field(&record, age_col).and_then(|v| v.parse().ok()),
            current_rating: field(&record, rating_col).and_then(|v| v.parse().ok()),
            playing_style: field(&record, style_col).and_then(PlayingStyle::parse),
            coordinates: lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng }),
        });
    }

    Ok(profiles)
}

pub fn load_availability<P: AsRef<Path>>(path: P) -> Result<Vec<(String, AvailabilitySlot)>, ParseError> {
    read_availability(std::fs::File::open(path)?)
}

pub fn load_busy_events<P: AsRef<Path>>(path: P) -> Result<Vec<(String, BusyEvent)>, ParseError> {
    read_busy_events(std::fs::File::open(path)?)
}

pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<PlayerProfile>, ParseError> {
    read_profiles(std::fs::File::open(path)?)
}

/// Seeds an in-memory store from whichever data files are configured and present
pub fn load_store(paths: &DataPaths) -> Result<InMemoryStore, ParseError> {
    let mut store = InMemoryStore::new();

    if let Some(path) = paths.availability.as_deref().filter(|p| p.exists()) {
        let rows = load_availability(path)?;
        info!(path = %path.display(), rows = rows.len(), "loaded availability");
        store.replace_availability(rows);
    }
    if let Some(path) = paths.busy_events.as_deref().filter(|p| p.exists()) {
        let rows = load_busy_events(path)?;
        info!(path = %path.display(), rows = rows.len(), "loaded busy events");
        store.replace_busy_events(rows);
    }
    if let Some(path) = paths.profiles.as_deref().filter(|p| p.exists()) {
        let profiles = load_profiles(path)?;
        info!(path = %path.display(), profiles = profiles.len(), "loaded player profiles");
        store.replace_profiles(profiles);
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_availability_and_skips_bad_rows() {
        let csv = "\
player_id,day_of_week,start_time,end_time,is_preferred
p1,1,17:00,20:00,yes
p1,Saturday,09:00,11:00,
p2,8,10:00,11:00,true
p2,2,12:00,10:00,true
,3,10:00,11:00,true
p2,3,noon,13:00,no
p2,sun,07:30,09:00,1
";
        let rows = read_availability(csv.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                ("p1".to_string(), AvailabilitySlot::new(1, 17 * 60, 20 * 60, true)),
                ("p1".to_string(), AvailabilitySlot::new(6, 9 * 60, 11 * 60, false)),
                ("p2".to_string(), AvailabilitySlot::new(0, 7 * 60 + 30, 9 * 60, true)),
            ]
        );
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "player_id,start_time,end_time\np1,10:00,11:00\n";
        assert!(matches!(
            read_availability(csv.as_bytes()),
            Err(ParseError::MissingColumn("day_of_week"))
        ));
    }

    #[test]
    fn reads_busy_events() {
        let csv = "\
player_id,start,end
p1,2025-01-06 18:15,2025-01-06 18:45
p1,tomorrow,2025-01-06 18:45
p1,2025-01-06 20:00,2025-01-06 19:00
p1,2025-01-06 21:00,2025-01-06 21:00
p2,2025-01-07T09:00:00,2025-01-07T10:00:00
";
        let rows = read_busy_events(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "p1");
        assert_eq!(rows[1].0, "p2");
    }

    #[test]
    fn reads_profiles_with_optional_fields() {
        let csv = "\
id,full_name,location,age,current_rating,playing_style,lat,lng
p1,Ana Ruiz,Austin,29,4.0,aggressive,30.27,-97.74
p2,,,,,,,
";
        let profiles = read_profiles(csv.as_bytes()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].playing_style, Some(PlayingStyle::Aggressive));
        assert_eq!(profiles[0].coordinates, Some(GeoPoint { lat: 30.27, lng: -97.74 }));
        assert_eq!(profiles[1].full_name, "p2");
        assert_eq!(profiles[1].age, None);
    }
}
