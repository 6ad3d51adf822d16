//! MIDI export and the reference read path

use crate::config::ExportConfig;
use crate::error::{PianoError, Result};
use crate::events::{NoteEvent, PedalEvent};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// MIDI controller number for the sustain pedal
const SUSTAIN_CONTROLLER: u8 = 64;

/// Intermediate merge representation: one channel message at an absolute time
#[derive(Debug, Clone, Copy)]
struct RollMessage {
    time: f32,
    kind: RollKind,
}

#[derive(Debug, Clone, Copy)]
enum RollKind {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    ControlChange { value: u8 },
}

/// Serialize note and pedal events into a two-track MIDI file.
///
/// Track 0 carries tempo and time signature metadata; track 1 carries the
/// time-sorted message stream. The fixed tempo makes one tick a fixed
/// fraction of a second, so `tick = round((t - start_time) * ticks_per_second)`.
/// Messages landing before `start_time` are discarded. Encoding the same
/// event collection always yields byte-identical output: the merge is a
/// stable sort by time with insertion order as the secondary key.
pub fn encode_midi(
    start_time: f32,
    notes: &[NoteEvent],
    pedals: Option<&[PedalEvent]>,
    export: &ExportConfig,
) -> Result<Vec<u8>> {
    let ticks_per_second = export.ticks_per_second();

    let mut roll: Vec<RollMessage> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        roll.push(RollMessage {
            time: note.onset_time,
            kind: RollKind::NoteOn {
                key: note.midi_note,
                velocity: note.velocity,
            },
        });
        roll.push(RollMessage {
            time: note.offset_time,
            kind: RollKind::NoteOff {
                key: note.midi_note,
            },
        });
    }
    if let Some(pedals) = pedals {
        for pedal in pedals {
            roll.push(RollMessage {
                time: pedal.onset_time,
                kind: RollKind::ControlChange { value: 127 },
            });
            roll.push(RollMessage {
                time: pedal.offset_time,
                kind: RollKind::ControlChange { value: 0 },
            });
        }
    }

    // Stable: exact time ties keep insertion order
    roll.sort_by(|a, b| a.time.total_cmp(&b.time));

    // Track 0: tempo and time signature metadata
    let track0 = vec![
        TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(
                export.microseconds_per_beat(),
            ))),
        },
        TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
        TrackEvent {
            delta: u28::from(1),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];

    // Track 1: delta-encoded message stream. The running previous-tick
    // state advances only for emitted (non-discarded) messages.
    let mut track1 = Vec::with_capacity(roll.len() + 1);
    let mut previous_ticks: i64 = 0;
    for message in &roll {
        let this_ticks = ((message.time - start_time) * ticks_per_second).round() as i64;
        if this_ticks < 0 {
            continue;
        }
        let delta = (this_ticks - previous_ticks) as u32;
        previous_ticks = this_ticks;

        let midi_message = match message.kind {
            RollKind::NoteOn { key, velocity } => MidiMessage::NoteOn {
                key: u7::from(key),
                vel: u7::from(velocity),
            },
            RollKind::NoteOff { key } => MidiMessage::NoteOff {
                key: u7::from(key),
                vel: u7::from(0),
            },
            RollKind::ControlChange { value } => MidiMessage::Controller {
                controller: u7::from(SUSTAIN_CONTROLLER),
                value: u7::from(value),
            },
        };

        track1.push(TrackEvent {
            delta: u28::from(delta),
            kind: TrackEventKind::Midi {
                channel: u4::from(0),
                message: midi_message,
            },
        });
    }
    track1.push(TrackEvent {
        delta: u28::from(1),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(u15::from(export.ticks_per_beat)),
        },
        tracks: vec![track0, track1],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| anyhow::anyhow!("failed to write MIDI data: {:?}", e))?;
    Ok(bytes)
}

/// Encode events and write them to `path`.
///
/// The file handle is scoped to this function: it is closed on every exit
/// path, and a failed write surfaces once as an export error.
pub fn write_midi<P: AsRef<Path>>(
    path: P,
    start_time: f32,
    notes: &[NoteEvent],
    pedals: Option<&[PedalEvent]>,
    export: &ExportConfig,
) -> Result<()> {
    let bytes = encode_midi(start_time, notes, pedals, export)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(&bytes)?;
    Ok(())
}

/// One channel message recovered from a MIDI file, with its absolute time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMessage {
    pub time: f32,
    pub message: MidiPayload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiPayload {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
}

/// Parse a two-track MIDI file of the layout produced by [`encode_midi`]
/// back into ordered `(message, absolute_seconds)` pairs.
///
/// Reference read path for evaluation and tests; the decode path never
/// calls it. Tempo is taken from track 0, channel messages from track 1.
pub fn parse_midi_events(bytes: &[u8]) -> Result<Vec<TimedMessage>> {
    let smf = Smf::parse(bytes)
        .map_err(|e| PianoError::MidiParseError(format!("invalid MIDI data: {}", e)))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int() as f32,
        Timing::Timecode(_, _) => {
            return Err(PianoError::MidiParseError(
                "timecode-based files are not supported".to_string(),
            ));
        }
    };

    if smf.tracks.len() != 2 {
        return Err(PianoError::MidiParseError(format!(
            "expected 2 tracks (metadata + events), found {}",
            smf.tracks.len()
        )));
    }

    let mut microseconds_per_beat = 500_000.0_f32;
    for event in &smf.tracks[0] {
        if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
            microseconds_per_beat = tempo.as_int() as f32;
            break;
        }
    }
    let ticks_per_second = ticks_per_beat * 1_000_000.0 / microseconds_per_beat;

    let mut ticks: u64 = 0;
    let mut messages = Vec::new();
    for event in &smf.tracks[1] {
        ticks += event.delta.as_int() as u64;
        let payload = match event.kind {
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } => MidiPayload::NoteOn {
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, vel } => MidiPayload::NoteOff {
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::Controller { controller, value } => MidiPayload::ControlChange {
                    controller: controller.as_int(),
                    value: value.as_int(),
                },
                _ => continue,
            },
            _ => continue,
        };
        messages.push(TimedMessage {
            time: ticks as f32 / ticks_per_second,
            message: payload,
        });
    }

    Ok(messages)
}

/// Read and parse a MIDI file from disk
pub fn read_midi_events<P: AsRef<Path>>(path: P) -> Result<Vec<TimedMessage>> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| PianoError::MidiParseError(format!("cannot read file: {}", e)))?;
    parse_midi_events(&bytes)
}
