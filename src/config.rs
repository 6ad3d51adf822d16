//! Configuration system for the piano-to-MIDI decoder

use crate::error::{PianoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub decoder: DecoderConfig,
    pub thresholds: ThresholdConfig,
    pub peaks: PeakConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            decoder: DecoderConfig::default(),
            thresholds: ThresholdConfig::default(),
            peaks: PeakConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Core decoder parameters, fixed per session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Frame rate of the model output curves, in frames per second
    pub frames_per_second: u32,
    /// Number of pitch classes in the note curves
    pub classes_num: usize,
    /// MIDI note number of pitch class 0 (A0 = 21 for an 88-key piano)
    pub begin_note: u8,
    /// Maximum integer velocity after scaling
    pub velocity_scale: u8,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 100,
            classes_num: 88,
            begin_note: 21,
            velocity_scale: 127,
        }
    }
}

/// Detection thresholds applied to regression and activity curves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub onset_threshold: f32,
    pub offset_threshold: f32,
    pub frame_threshold: f32,
    pub pedal_offset_threshold: f32,
    pub pedal_frame_threshold: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            onset_threshold: 0.3,
            offset_threshold: 0.3,
            frame_threshold: 0.1,
            pedal_offset_threshold: 0.2,
            pedal_frame_threshold: 0.5,
        }
    }
}

/// Peak picking neighbourhoods and decay confirmation windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Monotonic neighbourhood for onset regression peaks
    pub onset_neighbour: usize,
    /// Monotonic neighbourhood for offset regression peaks (offset curves are noisier)
    pub offset_neighbour: usize,
    /// Consecutive below-threshold frames required to end a pedal by decay
    pub pedal_decay_hold: usize,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            onset_neighbour: 2,
            offset_neighbour: 4,
            pedal_decay_hold: 10,
        }
    }
}

/// MIDI file timing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub ticks_per_beat: u16,
    pub beats_per_second: u32,
}

impl ExportConfig {
    /// Tick resolution derived from the fixed tempo
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_beat as f32 * self.beats_per_second as f32
    }

    /// MIDI set_tempo value in microseconds per beat
    pub fn microseconds_per_beat(&self) -> u32 {
        1_000_000 / self.beats_per_second
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        // Matches the MAESTRO dataset MIDI layout: 384 ticks/beat at
        // 2 beats/second gives 768 ticks/second.
        Self {
            ticks_per_beat: 384,
            beats_per_second: 2,
        }
    }
}

/// Load configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        PianoError::ConfigValidationFailed(format!(
            "cannot read {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| PianoError::ConfigValidationFailed(format!("JSON parse error: {}", e)))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration parameters, failing fast on the first violation
pub fn validate_config(config: &Config) -> Result<()> {
    let d = &config.decoder;
    if d.frames_per_second == 0 {
        return Err(PianoError::InvalidConfigParameter(
            "frames_per_second must be > 0".to_string(),
        ));
    }
    if d.classes_num == 0 {
        return Err(PianoError::InvalidConfigParameter(
            "classes_num must be > 0".to_string(),
        ));
    }
    if d.begin_note as usize + d.classes_num > 128 {
        return Err(PianoError::InvalidConfigParameter(format!(
            "begin_note {} + classes_num {} exceeds the MIDI note range",
            d.begin_note, d.classes_num
        )));
    }
    if d.velocity_scale == 0 || d.velocity_scale > 127 {
        return Err(PianoError::InvalidConfigParameter(format!(
            "velocity_scale {} must be in 1..=127",
            d.velocity_scale
        )));
    }

    let t = &config.thresholds;
    for (name, value) in [
        ("onset_threshold", t.onset_threshold),
        ("offset_threshold", t.offset_threshold),
        ("frame_threshold", t.frame_threshold),
        ("pedal_offset_threshold", t.pedal_offset_threshold),
        ("pedal_frame_threshold", t.pedal_frame_threshold),
    ] {
        if !(value > 0.0 && value < 1.0) {
            return Err(PianoError::InvalidConfigParameter(format!(
                "{} = {} must lie in (0, 1)",
                name, value
            )));
        }
    }

    let p = &config.peaks;
    if p.onset_neighbour == 0 || p.offset_neighbour == 0 {
        return Err(PianoError::InvalidConfigParameter(
            "peak neighbourhoods must be >= 1".to_string(),
        ));
    }
    if p.pedal_decay_hold == 0 {
        return Err(PianoError::InvalidConfigParameter(
            "pedal_decay_hold must be >= 1".to_string(),
        ));
    }

    let e = &config.export;
    if e.ticks_per_beat == 0 || e.ticks_per_beat > 32767 {
        return Err(PianoError::InvalidConfigParameter(format!(
            "ticks_per_beat {} must be in 1..=32767",
            e.ticks_per_beat
        )));
    }
    if e.beats_per_second == 0 {
        return Err(PianoError::InvalidConfigParameter(
            "beats_per_second must be > 0".to_string(),
        ));
    }

    Ok(())
}
