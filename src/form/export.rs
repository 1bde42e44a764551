use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;

use crate::parser::ParseError;
use crate::schedule::slot_utils::minutes_to_time_string;
use crate::schedule::AvailabilitySlot;

const AVAILABILITY_HEADER: [&str; 5] = [
    "player_id",
    "day_of_week",
    "start_time",
    "end_time",
    "is_preferred",
];

/// Appends availability rows in the format `parser::load_availability` reads
///
/// The header row is written only when the file does not exist yet.
pub fn export_availability_to_csv(
    rows: &[(String, AvailabilitySlot)],
    csv_path: &Path,
) -> Result<(), ParseError> {
    let file_exists = csv_path.exists();

    // Open file in append mode
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if !file_exists {
        wtr.write_record(AVAILABILITY_HEADER)?;
    }

    for (player_id, slot) in rows {
        wtr.write_record([
            player_id.as_str(),
            slot.day_of_week.to_string().as_str(),
            minutes_to_time_string(slot.start_time).as_str(),
            minutes_to_time_string(slot.end_time).as_str(),
            if slot.is_preferred { "yes" } else { "no" },
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load_availability;

    #[test]
    fn appends_without_repeating_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("availability.csv");

        let first = vec![("p1".to_string(), AvailabilitySlot::new(1, 17 * 60, 20 * 60, true))];
        let second = vec![("p2".to_string(), AvailabilitySlot::new(6, 9 * 60, 24 * 60, false))];
        export_availability_to_csv(&first, &path).unwrap();
        export_availability_to_csv(&second, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("player_id").count(), 1);

        let rows = load_availability(&path).unwrap();
        assert_eq!(rows, [first, second].concat());
    }
}
