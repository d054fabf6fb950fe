use chatlens_core::{ChatRecord, Season};
use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::parsers::ParsedLine;

/// Day-of-week names indexed by [`ChatRecord::day_of_week`].
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Attach temporal features to a parsed line.
pub fn derive(line: ParsedLine) -> ChatRecord {
    let ParsedLine {
        timestamp,
        sender,
        message,
    } = line;

    ChatRecord {
        day_of_week: day_of_week(&timestamp),
        season: season_of(&timestamp),
        hour_of_day: timestamp.hour() as u8,
        timestamp,
        sender,
        message,
    }
}

/// Monday-based weekday index, 0-6.
pub fn day_of_week(timestamp: &NaiveDateTime) -> u8 {
    timestamp.weekday().num_days_from_monday() as u8
}

/// Season bucket of a timestamp.
pub fn season_of(timestamp: &NaiveDateTime) -> Season {
    // chrono guarantees month() is within 1..=12
    Season::from_month(timestamp.month()).unwrap_or(Season::Winter)
}
