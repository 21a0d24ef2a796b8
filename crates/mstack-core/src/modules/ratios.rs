use super::temperature::r_calculation;
use crate::common::ReddeningTable;
use crate::common::constants::OIII_DOUBLET_FACTOR;
use crate::domain::{EmissionLine, FluxRatio, StackError, StackResult};
use crate::numerics::combine;
use ndarray::{Array, Dimension};
use std::collections::BTreeMap;

pub type FluxMap<D> = BTreeMap<EmissionLine, Array<f64, D>>;
pub type RatioMap<D> = BTreeMap<FluxRatio, Array<f64, D>>;

pub fn required_line<D: Dimension>(
    fluxes: &FluxMap<D>,
    line: EmissionLine,
) -> StackResult<&Array<f64, D>> {
    fluxes
        .get(&line)
        .ok_or_else(|| StackError::missing_line(line.as_str()))
}

/// Builds the named line ratios from per-line fluxes.
///
/// Accepts nominal vectors and (object x draw) ensembles alike; every ratio
/// keeps the input shape. Balmer decrements appear only when HGAMMA/HDELTA
/// are supplied, and `R` only when `include_r` is set. `ebv` reddening
/// corrects `R` and nothing else.
pub fn flux_ratios<D: Dimension>(
    fluxes: &FluxMap<D>,
    include_r: bool,
    ebv: Option<&Array<f64, D>>,
    reddening: &ReddeningTable,
) -> StackResult<RatioMap<D>> {
    let oii = required_line(fluxes, EmissionLine::Oii3727)?;
    let oiii = required_line(fluxes, EmissionLine::Oiii5007)?;
    let hbeta = required_line(fluxes, EmissionLine::HBeta)?;

    let two_beta = combine(oii, hbeta, |o2, hb| o2 / hb)?;
    let three_beta = combine(oiii, hbeta, |o3, hb| OIII_DOUBLET_FACTOR * o3 / hb)?;
    let log_r23 = combine(&two_beta, &three_beta, |two, three| (two + three).log10())?;
    let log_o32 = combine(oiii, oii, |o3, o2| (OIII_DOUBLET_FACTOR * o3 / o2).log10())?;

    let mut ratios = RatioMap::new();
    ratios.insert(FluxRatio::TwoBeta, two_beta);
    ratios.insert(FluxRatio::ThreeBeta, three_beta);
    ratios.insert(FluxRatio::LogR23, log_r23);
    ratios.insert(FluxRatio::LogO32, log_o32);

    for (line, ratio) in [
        (EmissionLine::HGamma, FluxRatio::HgHb),
        (EmissionLine::HDelta, FluxRatio::HdHb),
    ] {
        if let Some(balmer) = fluxes.get(&line) {
            ratios.insert(ratio, combine(balmer, hbeta, |num, hb| num / hb)?);
        }
    }

    if include_r {
        let auroral = required_line(fluxes, EmissionLine::Oiii4363)?;
        ratios.insert(FluxRatio::R, r_calculation(auroral, oiii, ebv, reddening)?);
    }

    Ok(ratios)
}
