use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::schedule::slot_utils::day_of_week;
use crate::schedule::{CandidateSlot, Suggestion};

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Day name for a day-of-week index (0 = Sunday)
pub fn day_name(day_of_week: u8) -> &'static str {
    DAY_NAMES
        .get(day_of_week as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Formats a suggestion as: Day YYYY-MM-DD HH:MM-HH:MM vs opponent (85%) reason
pub fn format_suggestion(suggestion: &Suggestion) -> String {
    format!(
        "{} {} {}-{} vs {} ({:.0}%) {}",
        day_name(suggestion.day_of_week),
        suggestion.datetime.format("%Y-%m-%d"),
        suggestion.datetime.format("%H:%M"),
        suggestion.end.format("%H:%M"),
        suggestion.opponent_id,
        suggestion.confidence * 100.0,
        suggestion.reason
    )
}

/// Prints ranked suggestions in a readable format
pub fn print_suggestions(user_id: &str, suggestions: &[Suggestion]) {
    println!("\n=== Suggestions for {} ===", user_id);
    println!("Total suggestions: {}", suggestions.len());

    if suggestions.is_empty() {
        println!("No mutual availability found in the search horizon.");
        return;
    }

    for (rank, suggestion) in suggestions.iter().enumerate() {
        println!("  {:>2}. {}", rank + 1, format_suggestion(suggestion));
    }
}

/// Prints the candidate windows for one day, marking calendar conflicts
pub fn print_candidates(user_id: &str, opponent_id: &str, slots: &[CandidateSlot]) {
    println!("\n=== Mutual availability: {} / {} ===", user_id, opponent_id);

    if slots.is_empty() {
        println!("No overlapping availability.");
        return;
    }

    for slot in slots {
        let status = if slot.available { "free" } else { "[BUSY]" };
        let preferred = match (slot.preferred_by_a, slot.preferred_by_b) {
            (true, true) => " preferred by both",
            (true, false) => " preferred by you",
            (false, true) => " preferred by opponent",
            (false, false) => "",
        };
        println!(
            "  {} {}-{} {}{}",
            day_name(day_of_week(slot.start.date())),
            slot.start.format("%H:%M"),
            slot.end.format("%H:%M"),
            status,
            preferred
        );
    }
}

/// Writes suggestions to a file, one per line, under a header with the user id
pub fn write_suggestions_to_file(
    user_id: &str,
    suggestions: &[Suggestion],
    path: &Path,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    // Write header
    writeln!(file, "** Suggestions for {} **", user_id)?;

    for suggestion in suggestions {
        writeln!(file, "{}", format_suggestion(suggestion))?;
    }

    Ok(())
}
