//! Note and pedal event assembly from binarized curves
//!
//! Scans one pitch class at a time, opening a candidate note at each
//! flagged onset and closing it on whichever end signal fires first: the
//! next offset flag, a frame-activity decay crossing, a competing onset
//! for the same pitch, or truncation at the end of the sequence.

use ndarray::ArrayView1;

/// Raw detection tuple for one note instance, in frame units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNote {
    pub onset_frame: usize,
    pub offset_frame: usize,
    pub onset_shift: f32,
    pub offset_shift: f32,
    /// Velocity curve value sampled at the onset frame, unclamped
    pub velocity: f32,
}

/// Raw detection tuple for one sustain pedal depression, in frame units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPedal {
    pub onset_frame: usize,
    pub offset_frame: usize,
    pub offset_shift: f32,
}

/// Detect notes for a single pitch class.
///
/// All inputs are per-frame columns of equal length. Emitted tuples are
/// ordered by onset and never overlap: a later onset at or before a note's
/// determined offset forces that note to end at the later onset's frame,
/// and the blocked onset opens the next candidate. An onset at the final
/// frame cannot form a positive-duration note and is dropped.
pub fn detect_notes(
    frame: ArrayView1<f32>,
    onset_mask: ArrayView1<bool>,
    onset_shift: ArrayView1<f32>,
    offset_mask: ArrayView1<bool>,
    offset_shift: ArrayView1<f32>,
    velocity: ArrayView1<f32>,
    frame_threshold: f32,
) -> Vec<RawNote> {
    let frames = frame.len();
    let mut tuples = Vec::new();
    if frames == 0 {
        return tuples;
    }
    let last = frames - 1;
    let onsets: Vec<usize> = (0..frames).filter(|&i| onset_mask[i]).collect();

    for (k, &bgn) in onsets.iter().enumerate() {
        // Truncate at the sequence end when no end signal ever fires
        let (mut fin, mut fin_shift) =
            note_end(&frame, &offset_mask, &offset_shift, bgn, frame_threshold)
                .unwrap_or((last, 0.0));

        // Same-pitch notes never overlap; the blocked onset is not dropped,
        // it opens the next candidate on the following iteration
        if let Some(&next) = onsets.get(k + 1) {
            if next < fin {
                fin = next;
                fin_shift = 0.0;
            }
        }

        if fin > bgn {
            tuples.push(RawNote {
                onset_frame: bgn,
                offset_frame: fin,
                onset_shift: onset_shift[bgn],
                offset_shift: fin_shift,
                velocity: velocity[bgn],
            });
        }
    }

    tuples
}

/// First end signal after `bgn`: an offset flag (with its sub-frame shift)
/// or a frame-activity decay crossing (shift 0), whichever comes first.
fn note_end(
    frame: &ArrayView1<f32>,
    offset_mask: &ArrayView1<bool>,
    offset_shift: &ArrayView1<f32>,
    bgn: usize,
    frame_threshold: f32,
) -> Option<(usize, f32)> {
    for j in (bgn + 1)..frame.len() {
        if offset_mask[j] {
            return Some((j, offset_shift[j]));
        }
        if frame[j] < frame_threshold {
            return Some((j, 0.0));
        }
    }
    None
}

/// Detect sustain pedal depressions from the pedal activity curve.
///
/// There is no pedal onset channel: a depression opens at the first frame
/// where activity rises to `frame_threshold` from below. The end follows
/// the same offset-flag-or-decay rule as notes, except a decay only counts
/// after `decay_hold` consecutive below-threshold frames, so brief dips do
/// not cut a held pedal.
pub fn detect_pedals(
    frame: ArrayView1<f32>,
    offset_mask: ArrayView1<bool>,
    offset_shift: ArrayView1<f32>,
    frame_threshold: f32,
    decay_hold: usize,
) -> Vec<RawPedal> {
    let frames = frame.len();
    let mut tuples = Vec::new();
    if frames == 0 {
        return tuples;
    }
    let last = frames - 1;

    let mut i = 1;
    while i < frames {
        if frame[i] >= frame_threshold && frame[i - 1] < frame_threshold {
            let bgn = i;
            let (fin, fin_shift) = pedal_end(
                &frame,
                &offset_mask,
                &offset_shift,
                bgn,
                frame_threshold,
                decay_hold,
            )
            .unwrap_or((last, 0.0));

            if fin > bgn {
                tuples.push(RawPedal {
                    onset_frame: bgn,
                    offset_frame: fin,
                    offset_shift: fin_shift,
                });
            }
            i = fin + 1;
        } else {
            i += 1;
        }
    }

    tuples
}

fn pedal_end(
    frame: &ArrayView1<f32>,
    offset_mask: &ArrayView1<bool>,
    offset_shift: &ArrayView1<f32>,
    bgn: usize,
    threshold: f32,
    decay_hold: usize,
) -> Option<(usize, f32)> {
    let frames = frame.len();
    for j in (bgn + 1)..frames {
        if offset_mask[j] {
            return Some((j, offset_shift[j]));
        }
        if frame[j] < threshold {
            let run_end = (j + decay_hold).min(frames);
            if (j..run_end).all(|m| frame[m] < threshold) {
                return Some((j, 0.0));
            }
        }
    }
    None
}
