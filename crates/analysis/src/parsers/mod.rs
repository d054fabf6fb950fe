use chatlens_core::config::ParserConfig;
use chatlens_core::constants::{SENDER_SEPARATOR, TIMESTAMP_SEPARATOR};
use chatlens_core::ChatRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, trace};

use crate::error::AnalysisResult;
use crate::features;

/// A transcript line split into its three fields, before feature derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Timestamp of the message.
    pub timestamp: NaiveDateTime,
    /// Sender display name.
    pub sender: String,
    /// Message body, possibly empty.
    pub message: String,
}

/// Why a line was not turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// The timestamp segment did not match the configured format.
    InvalidTimestamp,
    /// No `": "` after the timestamp, so no sender could be determined.
    MissingSender,
}

/// Result of parsing a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line yielded a record.
    Parsed(ParsedLine),
    /// The line was empty or whitespace only.
    Blank,
    /// The line was rejected.
    Dropped(DropReason),
}

/// Counters collected while parsing a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Lines seen, blank ones included.
    pub total_lines: usize,
    /// Empty or whitespace-only lines, skipped silently.
    pub blank_lines: usize,
    /// Lines rejected for any reason.
    pub dropped_lines: usize,
    /// Lines rejected because of an unparseable timestamp.
    pub invalid_timestamp: usize,
    /// Lines rejected because no sender could be determined.
    pub missing_sender: usize,
    /// Parsed lines removed because their body was the media placeholder.
    pub media_filtered: usize,
    /// Whether the leading record was discarded.
    pub header_skipped: bool,
    /// Records handed to the rest of the pipeline.
    pub records: usize,
}

impl ParseReport {
    fn record_drop(&mut self, reason: DropReason) {
        self.dropped_lines += 1;
        match reason {
            DropReason::InvalidTimestamp => self.invalid_timestamp += 1,
            DropReason::MissingSender => self.missing_sender += 1,
        }
    }
}

/// Records parsed from a transcript together with the parse counters.
#[derive(Debug, Clone)]
pub struct ParsedTranscript {
    /// Validated records in transcript order.
    pub records: Vec<ChatRecord>,
    /// Counters describing what was dropped.
    pub report: ParseReport,
}

/// Parser for `MM/DD/YY, HH:MM - Sender: Message` chat exports.
///
/// Malformed lines never abort the parse; they are counted in the
/// [`ParseReport`] instead. Continuation lines of multi-line messages carry no
/// timestamp and are therefore dropped rather than merged into the previous
/// message.
#[derive(Debug, Clone)]
pub struct TranscriptParser {
    timestamp_format: String,
    media_placeholder: String,
    skip_first_record: bool,
}

impl TranscriptParser {
    /// Creates a parser from configuration.
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp_format: config.timestamp_format.clone(),
            media_placeholder: config.media_placeholder.clone(),
            skip_first_record: config.skip_first_record,
        }
    }

    /// Parse one line without applying transcript-level filters.
    pub fn parse_line(&self, line: &str) -> LineOutcome {
        let line = line.trim_start_matches('\u{feff}').trim_end_matches('\r');
        if line.trim().is_empty() {
            return LineOutcome::Blank;
        }

        let Some((stamp, rest)) = line.split_once(TIMESTAMP_SEPARATOR) else {
            return LineOutcome::Dropped(DropReason::InvalidTimestamp);
        };

        let Ok(timestamp) = NaiveDateTime::parse_from_str(stamp.trim(), &self.timestamp_format)
        else {
            return LineOutcome::Dropped(DropReason::InvalidTimestamp);
        };

        let Some((sender, message)) = rest.split_once(SENDER_SEPARATOR) else {
            return LineOutcome::Dropped(DropReason::MissingSender);
        };
        if sender.trim().is_empty() {
            return LineOutcome::Dropped(DropReason::MissingSender);
        }

        LineOutcome::Parsed(ParsedLine {
            timestamp,
            sender: sender.to_string(),
            message: message.to_string(),
        })
    }

    /// Parse a whole transcript into featured records.
    pub fn parse(&self, raw: &str) -> ParsedTranscript {
        let mut report = ParseReport::default();
        let mut records = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            report.total_lines += 1;
            match self.parse_line(line) {
                LineOutcome::Parsed(parsed) => {
                    if parsed.message.trim() == self.media_placeholder {
                        report.media_filtered += 1;
                        continue;
                    }
                    records.push(features::derive(parsed));
                }
                LineOutcome::Blank => report.blank_lines += 1,
                LineOutcome::Dropped(reason) => {
                    trace!("dropping line {}: {:?}", index + 1, reason);
                    report.record_drop(reason);
                }
            }
        }

        if self.skip_first_record && !records.is_empty() {
            let header = records.remove(0);
            report.header_skipped = true;
            debug!("skipped leading record from {}", header.sender);
        }

        report.records = records.len();
        info!(
            "parsed {} records ({} dropped, {} media omitted)",
            report.records, report.dropped_lines, report.media_filtered
        );

        ParsedTranscript { records, report }
    }

    /// Read and parse a transcript file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> AnalysisResult<ParsedTranscript> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse(&content))
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlens_core::Season;

    fn keep_all() -> TranscriptParser {
        TranscriptParser::new(&ParserConfig {
            skip_first_record: false,
            ..ParserConfig::default()
        })
    }

    #[test]
    fn parses_scenario_line() {
        let parsed = keep_all().parse("01/05/23, 09:15 - Alice: Hello there");
        assert_eq!(parsed.records.len(), 1);

        let record = &parsed.records[0];
        assert_eq!(record.sender, "Alice");
        assert_eq!(record.message, "Hello there");
        assert_eq!(record.hour_of_day, 9);
        assert_eq!(record.day_of_week, 3);
        assert_eq!(record.season, Season::Winter);
    }

    #[test]
    fn invalid_timestamp_is_dropped_and_counted() {
        let parsed = keep_all().parse("13/40/23, bad - X: Y");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.report.dropped_lines, 1);
        assert_eq!(parsed.report.invalid_timestamp, 1);
    }

    #[test]
    fn line_without_sender_separator_is_dropped() {
        let parsed = keep_all().parse("01/05/23, 09:15 - Alice joined using this group's invite link");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.report.missing_sender, 1);
        assert_eq!(parsed.report.dropped_lines, 1);
    }

    #[test]
    fn continuation_lines_are_not_merged() {
        let raw = "01/05/23, 09:15 - Alice: first line\nsecond line of the same message\n01/05/23, 09:16 - Bob: ok";
        let parsed = keep_all().parse(raw);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].message, "first line");
        assert_eq!(parsed.report.dropped_lines, 1);
    }

    #[test]
    fn empty_body_is_preserved() {
        let parsed = keep_all().parse("01/05/23, 09:15 - Alice: ");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].message, "");
    }

    #[test]
    fn media_placeholder_rows_are_filtered() {
        let raw = "01/05/23, 09:15 - Alice: <Media omitted>\n01/05/23, 09:16 - Bob: nice";
        let parsed = keep_all().parse(raw);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].sender, "Bob");
        assert_eq!(parsed.report.media_filtered, 1);
        assert_eq!(parsed.report.dropped_lines, 0);
    }

    #[test]
    fn body_after_first_separator_keeps_later_colons() {
        let parsed = keep_all().parse("01/05/23, 09:15 - Alice: note: bring snacks");
        assert_eq!(parsed.records[0].sender, "Alice");
        assert_eq!(parsed.records[0].message, "note: bring snacks");
    }

    #[test]
    fn blank_lines_are_not_counted_as_dropped() {
        let parsed = keep_all().parse("\n01/05/23, 09:15 - Alice: hi\n\r\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.report.blank_lines, 2);
        assert_eq!(parsed.report.dropped_lines, 0);
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let parsed = keep_all().parse("\u{feff}01/05/23, 09:15 - Alice: hi\r\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].message, "hi");
    }

    #[test]
    fn default_parser_discards_first_record() {
        let raw = "01/05/23, 09:00 - Alice: Messages are end-to-end encrypted\n01/05/23, 09:15 - Bob: hey";
        let skipping = TranscriptParser::default().parse(raw);
        assert!(skipping.report.header_skipped);
        assert_eq!(skipping.records.len(), 1);
        assert_eq!(skipping.records[0].sender, "Bob");

        let keeping = keep_all().parse(raw);
        assert!(!keeping.report.header_skipped);
        assert_eq!(keeping.records.len(), 2);
    }

    #[test]
    fn header_skip_applies_after_media_filtering() {
        let raw = "01/05/23, 09:00 - Alice: <Media omitted>\n01/05/23, 09:15 - Bob: hey\n01/05/23, 09:20 - Carol: yo";
        let parsed = TranscriptParser::default().parse(raw);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].sender, "Carol");
    }

    #[test]
    fn canonical_line_round_trips() {
        let raw = "03/14/23, 23:59 - Dana: pi day 🎉\n12/31/22, 00:00 - Eve: \n07/04/23, 12:30 - Bob: a: b";
        let parser = keep_all();
        let first = parser.parse(raw);
        assert_eq!(first.records.len(), 3);

        for record in &first.records {
            let LineOutcome::Parsed(line) = parser.parse_line(&record.to_line()) else {
                panic!("re-serialized record failed to parse: {}", record.to_line());
            };
            assert_eq!(line.timestamp, record.timestamp);
            assert_eq!(line.sender, record.sender);
            assert_eq!(line.message, record.message);
        }
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, "01/05/23, 09:15 - Alice: hi\n01/05/23, 09:16 - Bob: yo\n").unwrap();

        let parsed = TranscriptParser::default().parse_file(&path).unwrap();
        assert_eq!(parsed.report.total_lines, 2);
        assert_eq!(parsed.records.len(), 1);
    }
}
