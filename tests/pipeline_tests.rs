//! End-to-end validation tests for the decode pipeline

use ndarray::Array2;
use piano2midi::config::{validate_config, Config};
use piano2midi::curves::{
    FRAME_OUTPUT, PEDAL_FRAME_OUTPUT, REG_OFFSET_OUTPUT, REG_ONSET_OUTPUT,
    REG_PEDAL_OFFSET_OUTPUT, VELOCITY_OUTPUT,
};
use piano2midi::{CurveSet, PianoError, PianoToMidi};

const FRAMES: usize = 500;
const CLASSES: usize = 88;

/// Regression bump with a monotonic rise and fall wide enough for both
/// onset and offset neighbourhoods, peaking at `frame`
fn insert_bump(curve: &mut Array2<f32>, frame: usize, class: usize) {
    let profile = [0.1, 0.2, 0.4, 0.7, 1.0, 0.7, 0.4, 0.2, 0.1];
    for (i, &v) in profile.iter().enumerate() {
        curve[[frame - 4 + i, class]] = v;
    }
}

/// Curve set with one note in the given class: onset bump, offset bump,
/// and sustained frame activity between them
fn single_note_curves(class: usize, onset_frame: usize, offset_frame: usize) -> CurveSet {
    let mut reg_onset = Array2::zeros((FRAMES, CLASSES));
    let mut reg_offset = Array2::zeros((FRAMES, CLASSES));
    let mut frame_activity = Array2::zeros((FRAMES, CLASSES));

    insert_bump(&mut reg_onset, onset_frame, class);
    insert_bump(&mut reg_offset, offset_frame, class);
    for i in onset_frame..=offset_frame {
        frame_activity[[i, class]] = 0.9;
    }

    let mut curves = CurveSet::new();
    curves.insert(FRAME_OUTPUT, frame_activity);
    curves.insert(REG_ONSET_OUTPUT, reg_onset);
    curves.insert(REG_OFFSET_OUTPUT, reg_offset);
    curves.insert(VELOCITY_OUTPUT, Array2::from_elem((FRAMES, CLASSES), 0.5));
    curves
}

fn add_pedal_curves(curves: &mut CurveSet, active: Option<std::ops::Range<usize>>) {
    let mut pedal_frame = Array2::zeros((FRAMES, 1));
    let mut reg_pedal_offset = Array2::zeros((FRAMES, 1));
    if let Some(range) = active {
        let end = range.end;
        for i in range {
            pedal_frame[[i, 0]] = 0.9;
        }
        insert_bump(&mut reg_pedal_offset, end, 0);
    }
    curves.insert(PEDAL_FRAME_OUTPUT, pedal_frame);
    curves.insert(REG_PEDAL_OFFSET_OUTPUT, reg_pedal_offset);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_single_note() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        // Class 39 above A0 is middle C
        let curves = single_note_curves(39, 100, 150);
        let transcription = decoder.decode(&curves).unwrap();

        assert_eq!(transcription.notes.len(), 1);
        let note = transcription.notes[0];
        assert_eq!(note.midi_note, 60);
        // Symmetric bumps carry zero shift
        assert!((note.onset_time - 1.0).abs() < 1e-6);
        assert!((note.offset_time - 1.5).abs() < 1e-6);
        assert_eq!(note.velocity, 64);

        // No pedal curves supplied: pedal output is explicitly absent
        assert!(transcription.pedals.is_none());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let curves = single_note_curves(39, 100, 150);

        let first = decoder.decode(&curves).unwrap();
        let second = decoder.decode(&curves).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_pedal() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        add_pedal_curves(&mut curves, Some(200..300));
        let transcription = decoder.decode(&curves).unwrap();

        let pedals = transcription.pedals.expect("pedal curves were supplied");
        assert_eq!(pedals.len(), 1);
        assert!((pedals[0].onset_time - 2.0).abs() < 1e-6);
        assert!((pedals[0].offset_time - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_silent_pedal_curves_yield_empty_list_not_absent() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        add_pedal_curves(&mut curves, None);
        let transcription = decoder.decode(&curves).unwrap();

        // Distinct from the no-pedal-support case above
        assert_eq!(transcription.pedals, Some(Vec::new()));
    }

    #[test]
    fn test_same_pitch_notes_never_overlap() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 260);
        // A second onset before the first note's end forces a hand-off
        {
            let mut reg_onset = curves.get(REG_ONSET_OUTPUT).unwrap().clone();
            insert_bump(&mut reg_onset, 110, 39);
            curves.insert(REG_ONSET_OUTPUT, reg_onset);
            let mut frame_activity = curves.get(FRAME_OUTPUT).unwrap().clone();
            for i in 100..=260 {
                frame_activity[[i, 39]] = 0.9;
            }
            curves.insert(FRAME_OUTPUT, frame_activity);
        }
        let transcription = decoder.decode(&curves).unwrap();

        assert_eq!(transcription.notes.len(), 2);
        assert!((transcription.notes[0].offset_time - 1.1).abs() < 1e-6);
        assert!((transcription.notes[1].onset_time - 1.1).abs() < 1e-6);
        for pair in transcription.notes.windows(2) {
            assert!(pair[0].offset_time <= pair[1].onset_time + 1e-6);
        }
    }

    #[test]
    fn test_merged_notes_are_time_ascending() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 200, 250);
        {
            let mut reg_onset = curves.get(REG_ONSET_OUTPUT).unwrap().clone();
            let mut reg_offset = curves.get(REG_OFFSET_OUTPUT).unwrap().clone();
            let mut frame_activity = curves.get(FRAME_OUTPUT).unwrap().clone();
            insert_bump(&mut reg_onset, 50, 70);
            insert_bump(&mut reg_offset, 90, 70);
            for i in 50..=90 {
                frame_activity[[i, 70]] = 0.9;
            }
            curves.insert(REG_ONSET_OUTPUT, reg_onset);
            curves.insert(REG_OFFSET_OUTPUT, reg_offset);
            curves.insert(FRAME_OUTPUT, frame_activity);
        }
        let transcription = decoder.decode(&curves).unwrap();

        assert_eq!(transcription.notes.len(), 2);
        for pair in transcription.notes.windows(2) {
            assert!(pair[0].onset_time <= pair[1].onset_time);
        }
        // The higher pitch starts earlier and must come first
        assert_eq!(transcription.notes[0].midi_note, 91);
    }

    #[test]
    fn test_missing_required_curve_is_named() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        let mut without_velocity = CurveSet::new();
        for name in [FRAME_OUTPUT, REG_ONSET_OUTPUT, REG_OFFSET_OUTPUT] {
            without_velocity.insert(name, curves.get(name).unwrap().clone());
        }
        curves = without_velocity;

        match decoder.decode(&curves) {
            Err(PianoError::MissingCurve(name)) => assert_eq!(name, VELOCITY_OUTPUT),
            other => panic!("expected MissingCurve, got {:?}", other),
        }
    }

    #[test]
    fn test_pedal_activity_without_offset_regression_rejected() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        curves.insert(PEDAL_FRAME_OUTPUT, Array2::zeros((FRAMES, 1)));

        match decoder.decode(&curves) {
            Err(PianoError::MissingCurve(name)) => {
                assert_eq!(name, REG_PEDAL_OFFSET_OUTPUT)
            }
            other => panic!("expected MissingCurve, got {:?}", other),
        }
    }

    #[test]
    fn test_frame_count_mismatch_rejected() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        curves.insert(VELOCITY_OUTPUT, Array2::from_elem((FRAMES - 1, CLASSES), 0.5));

        match decoder.decode(&curves) {
            Err(PianoError::ShapeMismatch(_)) => {}
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_class_count_mismatch_rejected() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        curves.insert(VELOCITY_OUTPUT, Array2::from_elem((FRAMES, CLASSES - 1), 0.5));

        match decoder.decode(&curves) {
            Err(PianoError::ShapeMismatch(_)) => {}
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_rejects_bad_parameters() {
        let mut config = Config::default();
        config.decoder.velocity_scale = 0;
        assert!(matches!(
            validate_config(&config),
            Err(PianoError::InvalidConfigParameter(_))
        ));

        let mut config = Config::default();
        config.decoder.begin_note = 100;
        assert!(matches!(
            validate_config(&config),
            Err(PianoError::InvalidConfigParameter(_))
        ));

        let mut config = Config::default();
        config.thresholds.onset_threshold = 1.5;
        assert!(matches!(
            validate_config(&config),
            Err(PianoError::InvalidConfigParameter(_))
        ));

        let mut config = Config::default();
        config.peaks.onset_neighbour = 0;
        assert!(matches!(
            validate_config(&config),
            Err(PianoError::InvalidConfigParameter(_))
        ));

        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_decoder_construction_validates_config() {
        let mut config = Config::default();
        config.decoder.frames_per_second = 0;
        assert!(PianoToMidi::new(config).is_err());
    }

    #[test]
    fn test_silent_curves_yield_empty_transcription() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = CurveSet::new();
        for name in [FRAME_OUTPUT, REG_ONSET_OUTPUT, REG_OFFSET_OUTPUT, VELOCITY_OUTPUT] {
            curves.insert(name, Array2::zeros((FRAMES, CLASSES)));
        }
        let transcription = decoder.decode(&curves).unwrap();

        assert!(transcription.notes.is_empty());
        assert!(transcription.pedals.is_none());
    }

    #[test]
    fn test_decode_to_midi_bytes() {
        let decoder = PianoToMidi::new(Config::default()).unwrap();
        let mut curves = single_note_curves(39, 100, 150);
        add_pedal_curves(&mut curves, Some(200..300));
        let transcription = decoder.decode(&curves).unwrap();

        let bytes = piano2midi::midi::encode_midi(
            0.0,
            &transcription.notes,
            transcription.pedals.as_deref(),
            &decoder.config().export,
        )
        .unwrap();
        let messages = piano2midi::midi::parse_midi_events(&bytes).unwrap();

        // NoteOn, NoteOff, two pedal control changes
        assert_eq!(messages.len(), 4);
    }
}
