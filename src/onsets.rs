//! Onset extraction
//!
//! Splits a flattened MIDI stream into the three monitored roles of the
//! experiment: the metronome reference, the gesture instrument and the control
//! keyboard.

use crate::midi::{MessageKind, TimedMessage};
use serde::{Deserialize, Serialize};

/// Monitored role of a note number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Reference,
    Gesture,
    Control,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Reference => "reference",
            Role::Gesture => "gesture",
            Role::Control => "control",
        }
    }
}

/// Note numbers identifying each role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleNotes {
    /// Metronome click (C0)
    pub reference_note: u8,
    /// Web Theremin pinch gesture (C4)
    pub gesture_note: u8,
    /// MIDI keyboard (C3)
    pub control_note: u8,
}

impl Default for RoleNotes {
    fn default() -> Self {
        Self {
            reference_note: 24,
            gesture_note: 60,
            control_note: 48,
        }
    }
}

impl RoleNotes {
    /// Role of a note number, checked in reference, gesture, control order
    pub fn role_of(&self, note: u8) -> Option<Role> {
        if note == self.reference_note {
            Some(Role::Reference)
        } else if note == self.gesture_note {
            Some(Role::Gesture)
        } else if note == self.control_note {
            Some(Role::Control)
        } else {
            None
        }
    }

    pub fn note_for(&self, role: Role) -> u8 {
        match role {
            Role::Reference => self.reference_note,
            Role::Gesture => self.gesture_note,
            Role::Control => self.control_note,
        }
    }
}

/// Absolute onset times (seconds) per role, in encounter order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OnsetSets {
    pub reference: Vec<f64>,
    pub gesture: Vec<f64>,
    pub control: Vec<f64>,
}

impl OnsetSets {
    pub fn get(&self, role: Role) -> &[f64] {
        match role {
            Role::Reference => &self.reference,
            Role::Gesture => &self.gesture,
            Role::Control => &self.control,
        }
    }

    fn push(&mut self, role: Role, time_sec: f64) {
        match role {
            Role::Reference => self.reference.push(time_sec),
            Role::Gesture => self.gesture.push(time_sec),
            Role::Control => self.control.push(time_sec),
        }
    }
}

/// Extract note-on onsets (velocity > 0) for each configured role
pub fn extract_onsets(messages: &[TimedMessage], roles: &RoleNotes) -> OnsetSets {
    let mut onsets = OnsetSets::default();
    let mut absolute_time = 0.0;

    for message in messages {
        // Accumulate before testing so the clock includes this message's own delta
        absolute_time += message.delta_sec;

        if let MessageKind::NoteOn { note, velocity, .. } = message.kind {
            if velocity == 0 {
                continue;
            }
            if let Some(role) = roles.role_of(note) {
                onsets.push(role, absolute_time);
            }
        }
    }

    onsets
}

/// Absolute time of every message, in message order
pub fn absolute_times(messages: &[TimedMessage]) -> Vec<f64> {
    messages
        .iter()
        .scan(0.0, |clock, message| {
            *clock += message.delta_sec;
            Some(*clock)
        })
        .collect()
}
