//! Monte Carlo flux ensembles.

use crate::domain::StackError;
use ndarray::{Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("value/uncertainty length mismatch: values={values}, sigmas={sigmas}")]
    LengthMismatch { values: usize, sigmas: usize },
    #[error("uncertainty at index {index} must be non-negative, got {value}")]
    NegativeSigma { index: usize, value: f64 },
    #[error("draw count must be positive")]
    ZeroDraws,
}

impl From<SamplingError> for StackError {
    fn from(error: SamplingError) -> Self {
        StackError::input_validation("INPUT.SAMPLING", error.to_string())
    }
}

/// Draws `draw_count` Gaussian samples per object, centred on `values[i]`
/// with spread `sigmas[i]`.
///
/// The generator is seeded once per call and rows are filled in object
/// order, so identical inputs and seed reproduce the ensemble exactly. A
/// zero uncertainty yields the nominal value repeated across the row.
pub fn random_pdf(
    values: ArrayView1<'_, f64>,
    sigmas: ArrayView1<'_, f64>,
    seed: u64,
    draw_count: usize,
) -> Result<Array2<f64>, SamplingError> {
    if values.len() != sigmas.len() {
        return Err(SamplingError::LengthMismatch {
            values: values.len(),
            sigmas: sigmas.len(),
        });
    }
    if draw_count == 0 {
        return Err(SamplingError::ZeroDraws);
    }
    if let Some((index, value)) = sigmas
        .iter()
        .enumerate()
        .find(|(_, sigma)| **sigma < 0.0)
    {
        return Err(SamplingError::NegativeSigma {
            index,
            value: *value,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut ensemble = Array2::<f64>::zeros((values.len(), draw_count));
    for ((mut row, value), sigma) in ensemble
        .rows_mut()
        .into_iter()
        .zip(values.iter())
        .zip(sigmas.iter())
    {
        for draw in row.iter_mut() {
            let deviate: f64 = StandardNormal.sample(&mut rng);
            *draw = if *sigma == 0.0 {
                *value
            } else {
                value + sigma * deviate
            };
        }
    }

    Ok(ensemble)
}
