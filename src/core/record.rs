//! Newline-delimited JSON input records for the CLI front-ends.

use std::io::BufRead;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::error::ClassifierError;

/// One line of classifier-training input.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRecord {
    pub text: String,
    pub label: String,
}

impl TrainingRecord {
    pub const EXPECTED: &'static str = r#"{"text": "text content", "label": "label"}"#;
}

/// One line of classification input.
#[derive(Debug, Clone, Deserialize)]
pub struct TextRecord {
    pub text: String,
}

impl TextRecord {
    pub const EXPECTED: &'static str = r#"{"text": "text content"}"#;
}

/// Reads one JSON record per line, skipping blank lines.
///
/// The first malformed line aborts the whole batch; the offending raw line
/// and the expected shape are carried in the error for debugging.
pub fn read_json_records<T: DeserializeOwned>(
    reader: impl BufRead,
    expected: &'static str,
) -> anyhow::Result<Vec<T>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::error!(%err, line, "failed to parse input line");
                return Err(ClassifierError::MalformedRecord {
                    line: line.to_string(),
                    expected,
                }
                .into());
            }
        }
    }
    Ok(records)
}
