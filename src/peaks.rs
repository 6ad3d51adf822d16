//! Binarizing peak picker for regression curves

use ndarray::{Array2, ArrayView1};

/// Binarize a regression output into event flags plus sub-frame shifts.
///
/// A regression column like `[0.0, 0.0, 0.15, 0.30, 0.40, 0.35, 0.20, ...]`
/// becomes a mask with a single `true` at the peak frame, and a fractional
/// shift estimating where the continuous peak lies relative to that frame.
/// Frames within `neighbour` of either boundary are never flagged.
pub fn binarize_regression(
    reg: &Array2<f32>,
    threshold: f32,
    neighbour: usize,
) -> (Array2<bool>, Array2<f32>) {
    let (frames, classes) = reg.dim();
    let mut mask = Array2::from_elem((frames, classes), false);
    let mut shift = Array2::zeros((frames, classes));

    for k in 0..classes {
        let x = reg.column(k);
        for n in neighbour..frames.saturating_sub(neighbour) {
            if x[n] > threshold && is_monotonic_neighbour(&x, n, neighbour) {
                mask[[n, k]] = true;
                shift[[n, k]] = sub_frame_shift(x[n - 1], x[n], x[n + 1]);
            }
        }
    }

    (mask, shift)
}

/// Whether the curve rises into `x[n]` and falls away from it over
/// `neighbour` frames on each side (plateaus count as monotonic).
fn is_monotonic_neighbour(x: &ArrayView1<f32>, n: usize, neighbour: usize) -> bool {
    for i in 0..neighbour {
        if x[n - i] < x[n - i - 1] {
            return false;
        }
        if x[n + i] < x[n + i + 1] {
            return false;
        }
    }
    true
}

/// Estimate the fractional-frame position of the true peak from the flagged
/// frame's value `b` and its immediate neighbours `a` and `c`, assuming a
/// locally symmetric triangular bump. Degenerate denominators yield 0.
fn sub_frame_shift(a: f32, b: f32, c: f32) -> f32 {
    let denominator = if a > c { b - c } else { b - a };
    if denominator == 0.0 {
        0.0
    } else {
        (c - a) / denominator / 2.0
    }
}
