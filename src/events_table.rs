//! Per-message CSV event table
//!
//! One row per MIDI message with its absolute timestamp. Columns that do not
//! apply to a message type are left blank.

use crate::error::{AnalysisError, Result};
use crate::midi::{MessageKind, TimedMessage};
use crate::onsets::absolute_times;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column names, in file order
pub const EVENT_TABLE_HEADER: [&str; 8] = [
    "timestamp_s",
    "type",
    "channel",
    "note",
    "velocity",
    "control",
    "value",
    "program",
];

/// Row of the event table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub timestamp_s: Option<f64>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub channel: Option<u8>,
    pub note: Option<u8>,
    pub velocity: Option<u8>,
    pub control: Option<u8>,
    pub value: Option<u8>,
    pub program: Option<u8>,
}

impl EventRow {
    /// Build the row for a message at an absolute time
    pub fn from_message(time_sec: f64, kind: &MessageKind) -> Self {
        let mut row = EventRow {
            timestamp_s: Some(round_micros(time_sec)),
            event_type: Some(kind.type_name().to_string()),
            channel: kind.channel(),
            note: None,
            velocity: None,
            control: None,
            value: None,
            program: None,
        };

        match *kind {
            MessageKind::NoteOn { note, velocity, .. } | MessageKind::NoteOff { note, velocity, .. } => {
                row.note = Some(note);
                row.velocity = Some(velocity);
            }
            MessageKind::ControlChange { control, value, .. } => {
                row.control = Some(control);
                row.value = Some(value);
            }
            MessageKind::ProgramChange { program, .. } => {
                row.program = Some(program);
            }
            _ => {}
        }

        row
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.event_type.as_deref() == Some(name)
    }

    /// Timestamp of a row known to be complete
    pub fn time(&self) -> f64 {
        self.timestamp_s.unwrap_or(0.0)
    }
}

fn round_micros(time_sec: f64) -> f64 {
    (time_sec * 1e6).round() / 1e6
}

/// Convert a flattened message stream into table rows
pub fn rows_from_messages(messages: &[TimedMessage]) -> Vec<EventRow> {
    absolute_times(messages)
        .into_iter()
        .zip(messages)
        .map(|(time, message)| EventRow::from_message(time, &message.kind))
        .collect()
}

/// Write rows as CSV with a header line
pub fn write_events_csv<P: AsRef<Path>>(rows: &[EventRow], path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        if rows.is_empty() {
            writer.write_record(EVENT_TABLE_HEADER)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    crate::output::write_text(path, &String::from_utf8_lossy(&buffer))
}

/// Read an event table, dropping rows without a type or timestamp
pub fn read_events_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EventRow>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<EventRow>().enumerate() {
        let row = record.map_err(|e| {
            AnalysisError::MalformedEventTable(format!("row {}: {}", line + 2, e))
        })?;
        let has_type = row.event_type.as_deref().is_some_and(|t| !t.is_empty());
        if has_type && row.timestamp_s.is_some() {
            rows.push(row);
        }
    }

    log::debug!("Loaded {} event rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Output path used when none is given: the input with a `.csv` extension
pub fn default_csv_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}
