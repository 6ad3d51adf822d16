//! Model output curves and their shape contract

use crate::config::Config;
use crate::error::{PianoError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Frame-wise note activity probability, `[frames x classes]`
pub const FRAME_OUTPUT: &str = "frame_output";
/// Onset regression curve, `[frames x classes]`
pub const REG_ONSET_OUTPUT: &str = "reg_onset_output";
/// Offset regression curve, `[frames x classes]`
pub const REG_OFFSET_OUTPUT: &str = "reg_offset_output";
/// Velocity curve, `[frames x classes]`
pub const VELOCITY_OUTPUT: &str = "velocity_output";
/// Frame-wise sustain pedal activity, `[frames x 1]`
pub const PEDAL_FRAME_OUTPUT: &str = "pedal_frame_output";
/// Pedal onset regression, `[frames x 1]`; accepted but unused by the decoder
pub const REG_PEDAL_ONSET_OUTPUT: &str = "reg_pedal_onset_output";
/// Pedal offset regression, `[frames x 1]`
pub const REG_PEDAL_OFFSET_OUTPUT: &str = "reg_pedal_offset_output";

const REQUIRED_NOTE_CURVES: [&str; 4] = [
    FRAME_OUTPUT,
    REG_ONSET_OUTPUT,
    REG_OFFSET_OUTPUT,
    VELOCITY_OUTPUT,
];

/// A set of named model output curves for one inference call.
///
/// Curves are read-only once inserted; the decoder never mutates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveSet {
    curves: HashMap<String, Array2<f32>>,
}

impl CurveSet {
    pub fn new() -> Self {
        Self {
            curves: HashMap::new(),
        }
    }

    /// Insert a curve under a well-known name, replacing any previous entry
    pub fn insert(&mut self, name: &str, curve: Array2<f32>) {
        self.curves.insert(name.to_string(), curve);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Fetch a curve, failing with the missing curve's name
    pub fn get(&self, name: &str) -> Result<&Array2<f32>> {
        self.curves
            .get(name)
            .ok_or_else(|| PianoError::MissingCurve(name.to_string()))
    }

    /// Whether the caller supplied pedal curves at all.
    ///
    /// Absent pedal curves mean "no pedal support requested", which is
    /// distinct from pedal curves that yield no events.
    pub fn has_pedal(&self) -> bool {
        self.contains(PEDAL_FRAME_OUTPUT)
    }

    /// Frame count shared by all curves; 0 for an empty set
    pub fn frames(&self) -> usize {
        self.curves
            .get(FRAME_OUTPUT)
            .or_else(|| self.curves.values().next())
            .map_or(0, |c| c.nrows())
    }

    /// Validate the shape contract against the configured class count.
    ///
    /// All present curves must agree on `frames`; note curves must carry
    /// `classes_num` columns; pedal curves must be single-column. A pedal
    /// activity curve without its offset regression companion (or vice
    /// versa) is a contract violation.
    pub fn validate(&self, config: &Config) -> Result<()> {
        for name in REQUIRED_NOTE_CURVES {
            self.get(name)?;
        }

        let frames = self.frames();
        for (name, curve) in &self.curves {
            if curve.nrows() != frames {
                return Err(PianoError::ShapeMismatch(format!(
                    "curve '{}' has {} frames, expected {}",
                    name,
                    curve.nrows(),
                    frames
                )));
            }
        }

        let classes = config.decoder.classes_num;
        for name in REQUIRED_NOTE_CURVES {
            let curve = self.get(name)?;
            if curve.ncols() != classes {
                return Err(PianoError::ShapeMismatch(format!(
                    "curve '{}' has {} classes, expected {}",
                    name,
                    curve.ncols(),
                    classes
                )));
            }
        }

        let pedal_curves = [
            PEDAL_FRAME_OUTPUT,
            REG_PEDAL_ONSET_OUTPUT,
            REG_PEDAL_OFFSET_OUTPUT,
        ];
        for name in pedal_curves {
            if let Ok(curve) = self.get(name) {
                if curve.ncols() != 1 {
                    return Err(PianoError::ShapeMismatch(format!(
                        "pedal curve '{}' has {} columns, expected 1",
                        name,
                        curve.ncols()
                    )));
                }
            }
        }

        // Pedal curves travel as a pair: activity plus offset regression
        if self.contains(PEDAL_FRAME_OUTPUT) {
            self.get(REG_PEDAL_OFFSET_OUTPUT)?;
        }
        if self.contains(REG_PEDAL_OFFSET_OUTPUT) {
            self.get(PEDAL_FRAME_OUTPUT)?;
        }

        Ok(())
    }
}
