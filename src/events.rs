//! Timed note and pedal events

use crate::detect::{RawNote, RawPedal};
use serde::{Deserialize, Serialize};

/// Index into the note curve columns; the only place class indices turn
/// into absolute MIDI notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchClass(pub usize);

impl PitchClass {
    /// Absolute MIDI note for this class under the configured root
    pub fn midi_note(self, begin_note: u8) -> u8 {
        begin_note + self.0 as u8
    }
}

/// A decoded piano note, immutable once produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub onset_time: f32,
    pub offset_time: f32,
    pub midi_note: u8,
    /// Integer velocity in `0..=velocity_scale`
    pub velocity: u8,
}

/// A decoded sustain pedal depression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedalEvent {
    pub onset_time: f32,
    pub offset_time: f32,
}

/// Complete decode result for one inference call.
///
/// `pedals` is `None` when the caller supplied no pedal curves, and
/// `Some(vec![])` when pedal curves were supplied but yielded no events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub notes: Vec<NoteEvent>,
    pub pedals: Option<Vec<PedalEvent>>,
}

/// Convert per-class raw tuples to a flat, time-ascending note list.
///
/// `per_class[k]` holds the tuples for pitch class `k`, which maps to MIDI
/// note `begin_note + k`. The merge is a stable sort over the
/// class-ascending concatenation, so notes with exactly equal onset times
/// order by ascending pitch.
pub fn notes_to_events(
    per_class: &[Vec<RawNote>],
    frames_per_second: u32,
    begin_note: u8,
    velocity_scale: u8,
) -> Vec<NoteEvent> {
    let fps = frames_per_second as f32;
    let mut events: Vec<NoteEvent> = Vec::new();

    for (class, tuples) in per_class.iter().enumerate() {
        let midi_note = PitchClass(class).midi_note(begin_note);
        for t in tuples {
            events.push(NoteEvent {
                onset_time: (t.onset_frame as f32 + t.onset_shift) / fps,
                offset_time: (t.offset_frame as f32 + t.offset_shift) / fps,
                midi_note,
                velocity: scale_velocity(t.velocity, velocity_scale),
            });
        }
    }

    events.sort_by(|a, b| a.onset_time.total_cmp(&b.onset_time));
    events
}

/// Convert raw pedal tuples to a flat, time-ascending pedal list
pub fn pedals_to_events(tuples: &[RawPedal], frames_per_second: u32) -> Vec<PedalEvent> {
    let fps = frames_per_second as f32;
    let mut events: Vec<PedalEvent> = tuples
        .iter()
        .map(|t| PedalEvent {
            onset_time: t.onset_frame as f32 / fps,
            offset_time: (t.offset_frame as f32 + t.offset_shift) / fps,
        })
        .collect();

    events.sort_by(|a, b| a.onset_time.total_cmp(&b.onset_time));
    events
}

/// Clamp a normalized velocity to [0, 1] and scale to an integer in
/// `0..=velocity_scale`
fn scale_velocity(velocity_norm: f32, velocity_scale: u8) -> u8 {
    (velocity_norm.clamp(0.0, 1.0) * velocity_scale as f32).round() as u8
}
