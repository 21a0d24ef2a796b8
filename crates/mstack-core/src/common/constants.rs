//! Physical and empirical constants shared by the attenuation, ratio and
//! abundance kernels.

/// Intrinsic [OIII] 5007/4959 doublet ratio.
pub const OIII_DOUBLET_RATIO: f64 = 3.1;
/// Converts an [OIII] 5007 flux into the 4959+5007 doublet sum.
pub const OIII_DOUBLET_FACTOR: f64 = 1.0 + 1.0 / OIII_DOUBLET_RATIO;

/// Case B, zero-reddening Balmer decrements.
pub const HD_HB_CASE_B: f64 = 0.259;
pub const HG_HB_CASE_B: f64 = 0.468;
pub const HA_HB_CASE_B: f64 = 2.86;

/// Total-to-selective extinction for the Milky Way curve.
pub const R_V: f64 = 3.1;

/// Kennicutt (1998) Halpha calibration in M_sun/yr per erg/s.
pub const HALPHA_SFR_CALIBRATION: f64 = 4.4e-42;

/// Nicholls et al. (2014) fit for T_e = a (-log R - b)^(-c).
pub const TEMP_A: f64 = 13205.0;
pub const TEMP_B: f64 = 0.92506;
pub const TEMP_C: f64 = 0.98062;

/// Izotov et al. (2006) O+ abundance coefficients.
pub const O_SINGLY_CONSTANT: f64 = 5.961;
pub const O_SINGLY_INV_T: f64 = 1.676;
pub const O_SINGLY_LOG_T: f64 = 0.4;
pub const O_SINGLY_LINEAR_T: f64 = 0.034;
pub const O_SINGLY_DENSITY: f64 = 1.35;

/// Izotov et al. (2006) O++ abundance coefficients.
pub const O_DOUBLY_CONSTANT: f64 = 6.200;
pub const O_DOUBLY_INV_T: f64 = 1.251;
pub const O_DOUBLY_LOG_T: f64 = 0.55;
pub const O_DOUBLY_LINEAR_T: f64 = 0.014;

/// Low-ionization zone temperature relation t2 = slope * t3 + offset.
pub const T2_SLOPE: f64 = 0.7;
pub const T2_OFFSET: f64 = 0.17;

/// Electron density (cm^-3) folded into x2 = 1e-4 * n_e * t2^-0.5.
pub const ELECTRON_DENSITY: f64 = 1.0e3;

/// One-sigma percentiles of a normal distribution.
pub const ONE_SIGMA_LOW_PERCENTILE: f64 = 15.8655;
pub const ONE_SIGMA_HIGH_PERCENTILE: f64 = 84.1345;

pub const DEFAULT_DRAW_COUNT: usize = 1000;

#[cfg(test)]
mod tests {
    use super::{
        ONE_SIGMA_HIGH_PERCENTILE, ONE_SIGMA_LOW_PERCENTILE, OIII_DOUBLET_FACTOR,
        OIII_DOUBLET_RATIO,
    };

    #[test]
    fn doublet_factor_matches_ratio() {
        assert!((OIII_DOUBLET_FACTOR - (OIII_DOUBLET_RATIO + 1.0) / OIII_DOUBLET_RATIO).abs() < 1.0e-15);
    }

    #[test]
    fn one_sigma_percentiles_are_symmetric() {
        assert!((ONE_SIGMA_LOW_PERCENTILE + ONE_SIGMA_HIGH_PERCENTILE - 100.0).abs() < 1.0e-12);
    }
}
