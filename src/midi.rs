//! MIDI file reading
//!
//! Flattens a Standard MIDI File into a single stream of [`TimedMessage`]s whose
//! `delta_sec` is the time since the previous message, which is the shape the
//! onset extractor and the event table consume.

use crate::error::{AnalysisError, Result};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;

/// Tempo assumed until the first set_tempo event (120 BPM)
pub const DEFAULT_TEMPO_USPQ: u32 = 500_000;

/// Decoded message payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    PolyAftertouch { channel: u8, note: u8, value: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelAftertouch { channel: u8, value: u8 },
    PitchWheel { channel: u8, value: i16 },
    SysEx,
    SetTempo { uspq: u32 },
    Meta(&'static str),
}

impl MessageKind {
    /// Lowercase type tag used in the event table
    pub fn type_name(&self) -> &'static str {
        match self {
            MessageKind::NoteOn { .. } => "note_on",
            MessageKind::NoteOff { .. } => "note_off",
            MessageKind::PolyAftertouch { .. } => "polytouch",
            MessageKind::ControlChange { .. } => "control_change",
            MessageKind::ProgramChange { .. } => "program_change",
            MessageKind::ChannelAftertouch { .. } => "aftertouch",
            MessageKind::PitchWheel { .. } => "pitchwheel",
            MessageKind::SysEx => "sysex",
            MessageKind::SetTempo { .. } => "set_tempo",
            MessageKind::Meta(name) => *name,
        }
    }

    /// Channel for channel-voice messages
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MessageKind::NoteOn { channel, .. }
            | MessageKind::NoteOff { channel, .. }
            | MessageKind::PolyAftertouch { channel, .. }
            | MessageKind::ControlChange { channel, .. }
            | MessageKind::ProgramChange { channel, .. }
            | MessageKind::ChannelAftertouch { channel, .. }
            | MessageKind::PitchWheel { channel, .. } => Some(channel),
            _ => None,
        }
    }
}

/// One message with its time relative to the previous message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMessage {
    /// Seconds since the previous message in the merged stream
    pub delta_sec: f64,
    pub kind: MessageKind,
}

impl TimedMessage {
    pub fn new(delta_sec: f64, kind: MessageKind) -> Self {
        Self { delta_sec, kind }
    }
}

/// Read and flatten a MIDI file
pub fn read_midi_file<P: AsRef<Path>>(path: P) -> Result<Vec<TimedMessage>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let data = std::fs::read(path).map_err(|source| AnalysisError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_midi_bytes(&data)
}

/// Parse SMF bytes into a merged, time-converted message stream
pub fn parse_midi_bytes(data: &[u8]) -> Result<Vec<TimedMessage>> {
    let smf = Smf::parse(data).map_err(|e| AnalysisError::MalformedMidi(e.to_string()))?;

    if smf.header.format == Format::Sequential {
        return Err(AnalysisError::MalformedMidi(
            "cannot merge tracks of a format 2 (sequential) file".to_string(),
        ));
    }

    let merged = merge_tracks(&smf);
    let mut tempo = DEFAULT_TEMPO_USPQ;
    let mut messages = Vec::with_capacity(merged.len());

    for (delta_ticks, kind) in merged {
        let delta_sec = if delta_ticks > 0 {
            ticks_to_seconds(delta_ticks, smf.header.timing, tempo)
        } else {
            0.0
        };
        messages.push(TimedMessage::new(delta_sec, kind));
        // Tempo applies to the messages after the set_tempo event
        if let MessageKind::SetTempo { uspq } = kind {
            tempo = uspq;
        }
    }

    log::debug!("Parsed {} MIDI messages from {} tracks", messages.len(), smf.tracks.len());
    Ok(messages)
}

/// Convert a tick delta to seconds for the given timing and tempo
pub fn ticks_to_seconds(ticks: u64, timing: Timing, tempo_uspq: u32) -> f64 {
    match timing {
        Timing::Metrical(tpb) => {
            ticks as f64 * tempo_uspq as f64 * 1e-6 / tpb.as_int() as f64
        }
        Timing::Timecode(fps, subframes) => {
            ticks as f64 / (fps.as_f32() as f64 * subframes as f64)
        }
    }
}

/// Merge all tracks into one list of (delta ticks, message), ordered by absolute tick.
///
/// Tracks are concatenated in file order and stably sorted, so events sharing a
/// tick keep their track order. Per-track end-of-track markers are replaced by a
/// single one at the latest tick.
fn merge_tracks(smf: &Smf) -> Vec<(u64, MessageKind)> {
    let mut absolute: Vec<(u64, MessageKind)> = Vec::new();
    let mut last_tick = 0u64;

    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            last_tick = last_tick.max(tick);
            if let Some(kind) = decode_event(&event.kind) {
                absolute.push((tick, kind));
            }
        }
    }

    absolute.sort_by_key(|(tick, _)| *tick);
    absolute.push((last_tick, MessageKind::Meta("end_of_track")));

    let mut previous = 0u64;
    absolute
        .into_iter()
        .map(|(tick, kind)| {
            let delta = tick - previous;
            previous = tick;
            (delta, kind)
        })
        .collect()
}

/// Decode a track event; end-of-track markers are dropped here and re-added by the merge
fn decode_event(kind: &TrackEventKind) -> Option<MessageKind> {
    let decoded = match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match *message {
                MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                    channel,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, vel } => MessageKind::NoteOff {
                    channel,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::Aftertouch { key, vel } => MessageKind::PolyAftertouch {
                    channel,
                    note: key.as_int(),
                    value: vel.as_int(),
                },
                MidiMessage::Controller { controller, value } => MessageKind::ControlChange {
                    channel,
                    control: controller.as_int(),
                    value: value.as_int(),
                },
                MidiMessage::ProgramChange { program } => MessageKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                },
                MidiMessage::ChannelAftertouch { vel } => MessageKind::ChannelAftertouch {
                    channel,
                    value: vel.as_int(),
                },
                MidiMessage::PitchBend { bend } => MessageKind::PitchWheel {
                    channel,
                    value: bend.as_int(),
                },
            }
        }
        TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => MessageKind::SysEx,
        TrackEventKind::Meta(MetaMessage::EndOfTrack) => return None,
        TrackEventKind::Meta(MetaMessage::Tempo(uspq)) => MessageKind::SetTempo {
            uspq: uspq.as_int(),
        },
        TrackEventKind::Meta(meta) => MessageKind::Meta(meta_name(meta)),
    };
    Some(decoded)
}

fn meta_name(meta: &MetaMessage) -> &'static str {
    match meta {
        MetaMessage::TrackNumber(_) => "sequence_number",
        MetaMessage::Text(_) => "text",
        MetaMessage::Copyright(_) => "copyright",
        MetaMessage::TrackName(_) => "track_name",
        MetaMessage::InstrumentName(_) => "instrument_name",
        MetaMessage::Lyric(_) => "lyrics",
        MetaMessage::Marker(_) => "marker",
        MetaMessage::CuePoint(_) => "cue_marker",
        MetaMessage::DeviceName(_) => "device_name",
        MetaMessage::MidiChannel(_) => "channel_prefix",
        MetaMessage::MidiPort(_) => "midi_port",
        MetaMessage::EndOfTrack => "end_of_track",
        MetaMessage::Tempo(_) => "set_tempo",
        MetaMessage::SmpteOffset(_) => "smpte_offset",
        MetaMessage::TimeSignature(..) => "time_signature",
        MetaMessage::KeySignature(..) => "key_signature",
        MetaMessage::SequencerSpecific(_) => "sequencer_specific",
        _ => "unknown_meta",
    }
}
