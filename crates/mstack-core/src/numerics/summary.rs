//! Reduction of per-object ensembles to a peak value and asymmetric
//! one-sigma error bars.

use crate::common::ErrorAnchor;
use crate::common::constants::{ONE_SIGMA_HIGH_PERCENTILE, ONE_SIGMA_LOW_PERCENTILE};
use crate::domain::{StackError, StackResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

#[derive(Debug, Clone, PartialEq)]
pub struct PeakEstimate {
    /// Central value per object.
    pub peak: Array1<f64>,
    /// `[lower, upper]` deviation per object, shape (n_objects, 2).
    pub error: Array2<f64>,
}

impl PeakEstimate {
    pub fn len(&self) -> usize {
        self.peak.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peak.is_empty()
    }
}

/// Linear-interpolation percentile of an ascending slice, `p` in [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// Returns `(peak, lower_error, upper_error)` for one object's draws.
///
/// Non-finite draws are ignored. An ensemble whose finite draws are all
/// identical has zero error regardless of the anchor.
pub fn summarize_draws(
    draws: ArrayView1<'_, f64>,
    nominal: f64,
    anchor: ErrorAnchor,
) -> (f64, f64, f64) {
    let mut finite: Vec<f64> = draws.iter().copied().filter(|draw| draw.is_finite()).collect();
    if finite.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    finite.sort_by(f64::total_cmp);

    let peak = percentile(&finite, 50.0);
    if finite[0] == finite[finite.len() - 1] {
        return (peak, 0.0, 0.0);
    }

    let low = percentile(&finite, ONE_SIGMA_LOW_PERCENTILE);
    let high = percentile(&finite, ONE_SIGMA_HIGH_PERCENTILE);
    let reference = match anchor {
        ErrorAnchor::Nominal => nominal,
        ErrorAnchor::Peak => peak,
    };
    (peak, reference - low, high - reference)
}

/// Row-wise [`summarize_draws`] over an (n_objects, n_draws) ensemble.
pub fn compute_onesig_pdf(
    ensemble: ArrayView2<'_, f64>,
    nominal: ArrayView1<'_, f64>,
    anchor: ErrorAnchor,
) -> StackResult<PeakEstimate> {
    let rows = ensemble.nrows();
    if nominal.len() != rows {
        return Err(StackError::internal(
            "SYS.ENSEMBLE_SHAPE",
            format!(
                "ensemble has {} objects but {} nominal values were supplied",
                rows,
                nominal.len()
            ),
        ));
    }

    let mut peak = Array1::<f64>::zeros(rows);
    let mut error = Array2::<f64>::zeros((rows, 2));
    for (index, (draws, value)) in ensemble.rows().into_iter().zip(nominal.iter()).enumerate() {
        let (center, lower, upper) = summarize_draws(draws, *value, anchor);
        peak[index] = center;
        error[[index, 0]] = lower;
        error[[index, 1]] = upper;
    }

    Ok(PeakEstimate { peak, error })
}
