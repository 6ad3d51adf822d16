//! Piano-to-MIDI Decoder
//!
//! Converts frame-wise transcription model output curves (note activity,
//! onset/offset regression, velocity, sustain pedal activity) into
//! timestamped note and pedal events, and serializes them into two-track
//! MIDI files with a fixed tick resolution.

pub mod config;
pub mod curves;
pub mod detect;
pub mod error;
pub mod events;
pub mod midi;
pub mod observer;
pub mod peaks;

pub use config::Config;
pub use curves::CurveSet;
pub use error::{PianoError, Result as PianoResult};
pub use events::{NoteEvent, PedalEvent, Transcription};

use crate::observer::TranscriptionObserver;
use std::path::Path;

/// Main decode pipeline: curves in, transcription and MIDI files out
pub struct PianoToMidi {
    config: Config,
}

impl PianoToMidi {
    /// Create a decoder with a validated configuration
    pub fn new(config: Config) -> PianoResult<Self> {
        config::validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode one inference call's curves into note and pedal events.
    ///
    /// Pure and deterministic: the same curve set always yields the same
    /// transcription, and the input arrays are never mutated.
    pub fn decode(&self, curves: &CurveSet) -> PianoResult<Transcription> {
        curves.validate(&self.config)?;

        let notes = self.decode_notes(curves)?;
        let pedals = if curves.has_pedal() {
            Some(self.decode_pedals(curves)?)
        } else {
            None
        };

        log::debug!(
            "decoded {} notes, {} pedal events",
            notes.len(),
            pedals.as_ref().map_or(0, Vec::len)
        );

        Ok(Transcription { notes, pedals })
    }

    /// Decode and hand the finished event lists to a diagnostic observer.
    ///
    /// Observer failures are logged and swallowed; they never affect the
    /// decoded result.
    pub fn decode_observed(
        &self,
        curves: &CurveSet,
        observer: &mut dyn TranscriptionObserver,
    ) -> PianoResult<Transcription> {
        let transcription = self.decode(curves)?;
        if let Err(e) = observer.observe(&transcription.notes, transcription.pedals.as_deref()) {
            log::warn!("transcription observer failed: {}", e);
        }
        Ok(transcription)
    }

    /// Serialize a transcription and write it to a MIDI file
    pub fn export_midi<P: AsRef<Path>>(
        &self,
        transcription: &Transcription,
        start_time: f32,
        path: P,
    ) -> PianoResult<()> {
        midi::write_midi(
            path,
            start_time,
            &transcription.notes,
            transcription.pedals.as_deref(),
            &self.config.export,
        )
    }

    fn decode_notes(&self, curves: &CurveSet) -> PianoResult<Vec<NoteEvent>> {
        let thresholds = &self.config.thresholds;
        let peaks_cfg = &self.config.peaks;

        let frame = curves.get(curves::FRAME_OUTPUT)?;
        let velocity = curves.get(curves::VELOCITY_OUTPUT)?;

        let (onset_mask, onset_shift) = peaks::binarize_regression(
            curves.get(curves::REG_ONSET_OUTPUT)?,
            thresholds.onset_threshold,
            peaks_cfg.onset_neighbour,
        );
        let (offset_mask, offset_shift) = peaks::binarize_regression(
            curves.get(curves::REG_OFFSET_OUTPUT)?,
            thresholds.offset_threshold,
            peaks_cfg.offset_neighbour,
        );

        // Pitch classes are independent; a class-ascending scan keeps the
        // merge deterministic
        let per_class: Vec<_> = (0..self.config.decoder.classes_num)
            .map(|k| {
                detect::detect_notes(
                    frame.column(k),
                    onset_mask.column(k),
                    onset_shift.column(k),
                    offset_mask.column(k),
                    offset_shift.column(k),
                    velocity.column(k),
                    thresholds.frame_threshold,
                )
            })
            .collect();

        Ok(events::notes_to_events(
            &per_class,
            self.config.decoder.frames_per_second,
            self.config.decoder.begin_note,
            self.config.decoder.velocity_scale,
        ))
    }

    fn decode_pedals(&self, curves: &CurveSet) -> PianoResult<Vec<PedalEvent>> {
        let thresholds = &self.config.thresholds;
        let peaks_cfg = &self.config.peaks;

        let pedal_frame = curves.get(curves::PEDAL_FRAME_OUTPUT)?;
        let (offset_mask, offset_shift) = peaks::binarize_regression(
            curves.get(curves::REG_PEDAL_OFFSET_OUTPUT)?,
            thresholds.pedal_offset_threshold,
            peaks_cfg.offset_neighbour,
        );

        let raw = detect::detect_pedals(
            pedal_frame.column(0),
            offset_mask.column(0),
            offset_shift.column(0),
            thresholds.pedal_frame_threshold,
            peaks_cfg.pedal_decay_hold,
        );

        Ok(events::pedals_to_events(
            &raw,
            self.config.decoder.frames_per_second,
        ))
    }
}

/// Validate a curve set against a configuration without decoding
pub fn validate_input(curves: &CurveSet, config: &Config) -> PianoResult<()> {
    config::validate_config(config)?;
    curves.validate(config)?;
    Ok(())
}
