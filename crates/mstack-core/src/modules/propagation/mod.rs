//! Flux-to-abundance propagation over a directory of binned measurements.
//!
//! Two strategies share [`derive_properties`]: a deterministic single pass
//! on nominal fluxes, and a Monte Carlo ensemble pass that randomizes each
//! line, forwards every draw through the same kernels and reduces the
//! resulting distributions to peaks and asymmetric errors.

mod deterministic;
mod ensemble;
mod inputs;

pub use deterministic::DeterministicPass;
pub use ensemble::EnsemblePropagation;

use super::PropagationStrategy;
use super::attenuation::{compute_ebv, line_ratio_atten};
use super::ratios::{FluxMap, RatioMap, flux_ratios};
use super::temperature::{PropertyMap, metallicity_calculation, temp_calculation};
use crate::common::AnalysisConfig;
use crate::domain::{
    BalmerSource, DerivedProperty, EmissionLine, FluxRatio, OutputArtifact, PropagationRequest,
    RunMode, StackError, StackResult,
};
use ndarray::{Array, Dimension, RemoveAxis};
use serde::Serialize;

/// Ratios, optional E(B-V) and derived properties for one set of fluxes.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuantities<D: Dimension> {
    pub ratios: RatioMap<D>,
    pub ebv: Option<Array<f64, D>>,
    pub properties: PropertyMap<D>,
}

/// Ratio builder, optional dust step, temperature and abundances.
///
/// With `apply_dust` the HGAMMA/HBETA decrement fixes E(B-V), which then
/// corrects R, [OII]/Hb and [OIII]/Hb before they enter the abundance
/// formulas. The reported `two_beta`/`three_beta` ratios stay observed.
pub fn derive_properties<D>(
    fluxes: &FluxMap<D>,
    apply_dust: bool,
    config: &AnalysisConfig,
) -> StackResult<DerivedQuantities<D>>
where
    D: Dimension + RemoveAxis,
{
    let reddening = config.reddening();
    let ebv = if apply_dust {
        let observed = flux_ratios(fluxes, false, None, reddening)?;
        let decrement = observed
            .get(&BalmerSource::HgHb.ratio())
            .ok_or_else(|| StackError::missing_line(EmissionLine::HGamma.as_str()))?;
        Some(compute_ebv(decrement, BalmerSource::HgHb, reddening))
    } else {
        None
    };

    let ratios = flux_ratios(fluxes, true, ebv.as_ref(), reddening)?;
    let te = temp_calculation(ratio(&ratios, FluxRatio::R)?);

    let two_beta = ratio(&ratios, FluxRatio::TwoBeta)?;
    let three_beta = ratio(&ratios, FluxRatio::ThreeBeta)?;
    let mut properties = match &ebv {
        Some(ebv) => {
            let two_beta = line_ratio_atten(
                two_beta,
                ebv,
                EmissionLine::Oii3727,
                EmissionLine::HBeta,
                reddening,
            )?;
            let three_beta = line_ratio_atten(
                three_beta,
                ebv,
                EmissionLine::Oiii5007,
                EmissionLine::HBeta,
                reddening,
            )?;
            metallicity_calculation(&te, &two_beta, &three_beta, None)?
        }
        None => metallicity_calculation(&te, two_beta, three_beta, None)?,
    };
    properties.insert(DerivedProperty::Temperature, te);

    Ok(DerivedQuantities {
        ratios,
        ebv,
        properties,
    })
}

fn ratio<D: Dimension>(ratios: &RatioMap<D>, key: FluxRatio) -> StackResult<&Array<f64, D>> {
    ratios.get(&key).ok_or_else(|| {
        StackError::internal(
            "SYS.RATIO_MISSING",
            format!("ratio '{}' was not produced by the ratio builder", key),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationReport {
    pub mode: RunMode,
    pub apply_dust: bool,
    pub draw_count: Option<usize>,
    pub detected_bins: Vec<i64>,
    pub artifacts: Vec<OutputArtifact>,
}

impl PropagationReport {
    pub fn summary_line(&self) -> String {
        let bins = match self.mode {
            RunMode::Deterministic => "all bins".to_string(),
            RunMode::Ensemble => format!("{} detected bins", self.detected_bins.len()),
        };
        let draws = self
            .draw_count
            .map(|count| format!(", {} draws", count))
            .unwrap_or_default();
        format!(
            "Propagation ({}{}) completed for {}{}; {} artifacts written.",
            self.mode,
            if self.apply_dust { ", dust corrected" } else { "" },
            bins,
            draws,
            self.artifacts.len()
        )
    }

    pub fn to_json(&self) -> StackResult<String> {
        serde_json::to_string_pretty(self).map_err(|error| {
            StackError::internal(
                "SYS.REPORT_SERIALIZE",
                format!("failed to serialize propagation report: {}", error),
            )
        })
    }
}

pub fn strategy_for(mode: RunMode) -> Box<dyn PropagationStrategy> {
    match mode {
        RunMode::Deterministic => Box::new(DeterministicPass),
        RunMode::Ensemble => Box::new(EnsemblePropagation),
    }
}

pub fn run_propagation(
    request: &PropagationRequest,
    config: &AnalysisConfig,
) -> StackResult<PropagationReport> {
    config.validate()?;
    let strategy = strategy_for(request.mode);
    tracing::info!(
        mode = %strategy.mode(),
        directory = %request.directory.display(),
        apply_dust = request.apply_dust,
        "Starting propagation"
    );
    strategy.execute(request, config)
}
