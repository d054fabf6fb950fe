//! Application constants and configuration defaults.

/// Timestamp layout of the export, `MM/DD/YY, HH:MM` on a 24-hour clock.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%m/%d/%y, %H:%M";

/// Separator between the timestamp and the rest of a transcript line.
pub const TIMESTAMP_SEPARATOR: &str = " - ";

/// Separator between the sender and the message body.
pub const SENDER_SEPARATOR: &str = ": ";

/// Body the exporter writes in place of attachments.
pub const MEDIA_OMITTED_PLACEHOLDER: &str = "<Media omitted>";

/// Default number of entries in ranked outputs.
pub const DEFAULT_TOP_N: usize = 10;

/// Tokens shorter than this many characters are ignored in word rankings.
pub const DEFAULT_MIN_WORD_LENGTH: usize = 4;

/// Token prefixes that mark laughter ("jajaja", "jejeje").
pub const DEFAULT_LAUGHTER_PREFIXES: [&str; 2] = ["jaj", "jej"];

/// Default run-level timeout for classifier invocations, in seconds.
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 120;

/// File name of the tokenizer inside a model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// File name of the weights inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// File name of the head dimensions inside a model directory.
pub const MODEL_CONFIG_FILE: &str = "config.json";
