//! Injectable decode diagnostics
//!
//! Observers run after assembly, outside the decode algorithms, and never
//! influence the decoded result.

use crate::error::{PianoError, Result};
use crate::events::{NoteEvent, PedalEvent};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Hook invoked once per decode call with the finished event lists
pub trait TranscriptionObserver {
    fn observe(&mut self, notes: &[NoteEvent], pedals: Option<&[PedalEvent]>) -> Result<()>;
}

/// Dumps decoded notes sampled on a fixed time cadence to a side file.
///
/// Writes one line per note whose onset, rounded to a tenth of a second,
/// lands on the half-second grid (0.5s, 1.5s, 2.5s, ...). Useful for
/// spot-checking velocities against a reference rendition.
pub struct VelocityTraceWriter {
    path: PathBuf,
}

impl VelocityTraceWriter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn on_cadence(onset_time: f32) -> bool {
        let tenths = (onset_time * 10.0).round() as i64;
        tenths.rem_euclid(10) == 5
    }
}

impl TranscriptionObserver for VelocityTraceWriter {
    fn observe(&mut self, notes: &[NoteEvent], _pedals: Option<&[PedalEvent]>) -> Result<()> {
        let mut file = File::create(&self.path)
            .map_err(|e| PianoError::TraceExportError(format!("cannot create trace file: {}", e)))?;

        writeln!(file, "onset_sec\tmidi_note\tvelocity")
            .map_err(|e| PianoError::TraceExportError(format!("write failed: {}", e)))?;

        for note in notes {
            if Self::on_cadence(note.onset_time) {
                writeln!(
                    file,
                    "{:.1}\t{}\t{}",
                    note.onset_time, note.midi_note, note.velocity
                )
                .map_err(|e| PianoError::TraceExportError(format!("write failed: {}", e)))?;
            }
        }

        Ok(())
    }
}
