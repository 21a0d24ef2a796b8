//! Nebular attenuation from Balmer decrements and its corrections.

use super::table::{Table, read_table, write_table};
use crate::common::constants::{HA_HB_CASE_B, HALPHA_SFR_CALIBRATION, HD_HB_CASE_B, HG_HB_CASE_B};
use crate::common::{AnalysisConfig, ReddeningTable};
use crate::domain::{
    BIN_ID_COLUMN, BalmerSource, EmissionLine, OutputArtifact, StackError, StackResult,
};
use crate::numerics::combine;
use ndarray::{Array, Array1, Dimension};
use std::path::Path;

pub const EBV_COLUMN: &str = "E(B-V)";

impl BalmerSource {
    /// Dust-free Case B value of the decrement.
    pub const fn case_b(self) -> f64 {
        match self {
            Self::HgHb => HG_HB_CASE_B,
            Self::HdHb => HD_HB_CASE_B,
        }
    }
}

/// E(B-V) = -2.5 log10(ratio / ratio_caseB) / (k_num - k_Hb).
pub fn compute_ebv<D: Dimension>(
    decrement: &Array<f64, D>,
    source: BalmerSource,
    reddening: &ReddeningTable,
) -> Array<f64, D> {
    let delta_k = reddening.k(source.numerator()) - reddening.k(EmissionLine::HBeta);
    let case_b = source.case_b();
    decrement.mapv(|ratio| -2.5 * (ratio / case_b).log10() / delta_k)
}

/// Corrects an observed `top / bottom` line ratio for attenuation.
pub fn line_ratio_atten<D: Dimension>(
    ratio: &Array<f64, D>,
    ebv: &Array<f64, D>,
    top: EmissionLine,
    bottom: EmissionLine,
    reddening: &ReddeningTable,
) -> StackResult<Array<f64, D>> {
    let delta_k = reddening.k(top) - reddening.k(bottom);
    combine(ratio, ebv, |value, color_excess| {
        value * 10f64.powf(0.4 * color_excess * delta_k)
    })
}

/// Dust-corrected log SFR (M_sun/yr) from log H-beta luminosity (erg/s),
/// following Ly et al. (2015) eq. 2.
pub fn hb_sfr<D: Dimension>(
    log_l_hbeta: &Array<f64, D>,
    ebv: &Array<f64, D>,
    reddening: &ReddeningTable,
) -> StackResult<Array<f64, D>> {
    let zero_point = (HALPHA_SFR_CALIBRATION * HA_HB_CASE_B).log10();
    let k_hbeta = reddening.k(EmissionLine::HBeta);
    combine(log_l_hbeta, ebv, |log_l, color_excess| {
        zero_point + 0.4 * color_excess * k_hbeta + log_l
    })
}

/// Appends `HgHb`, `HdHb` and `E(B-V)` columns, derived from the observed
/// Balmer fluxes of the fit table, to the bin derived-property table.
pub fn annotate_ebv(
    directory: &Path,
    use_revised: bool,
    config: &AnalysisConfig,
) -> StackResult<OutputArtifact> {
    let files = &config.files;
    let (fit_name, derived_name) = if use_revised {
        (&files.bin_fit_revised, &files.derived_properties_revised)
    } else {
        (&files.bin_fit, &files.derived_properties)
    };

    let fit_table = read_table(&directory.join(fit_name))?;
    let derived_path = directory.join(derived_name);
    let mut derived = read_table(&derived_path)?;
    ensure_matching_bins(&fit_table, &derived)?;

    let hbeta = fit_table.float_column(&EmissionLine::HBeta.observed_flux_column())?;
    let hgamma = fit_table.float_column(&EmissionLine::HGamma.observed_flux_column())?;
    let hdelta = fit_table.float_column(&EmissionLine::HDelta.observed_flux_column())?;

    let hg_hb: Array1<f64> = combine(&hgamma, &hbeta, |hg, hb| hg / hb)?;
    let hd_hb: Array1<f64> = combine(&hdelta, &hbeta, |hd, hb| hd / hb)?;
    let ebv = compute_ebv(&hg_hb, BalmerSource::HgHb, config.reddening());

    tracing::info!(path = %derived_path.display(), "Adding dust attenuation information");
    derived.put_float_column(BalmerSource::HgHb.ratio().as_str(), hg_hb.to_vec())?;
    derived.put_float_column(BalmerSource::HdHb.ratio().as_str(), hd_hb.to_vec())?;
    derived.put_float_column(EBV_COLUMN, ebv.to_vec())?;

    write_table(&derived, &derived_path, true)
}

fn ensure_matching_bins(fit: &Table, derived: &Table) -> StackResult<()> {
    let fit_ids = fit.int_column(BIN_ID_COLUMN)?;
    let derived_ids = derived.int_column(BIN_ID_COLUMN)?;
    if fit_ids != derived_ids {
        return Err(StackError::input_validation(
            "INPUT.BIN_MISMATCH",
            format!(
                "bin ids of '{}' and '{}' do not agree",
                fit.name(),
                derived.name()
            ),
        ));
    }
    Ok(())
}
