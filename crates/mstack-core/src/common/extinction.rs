//! Cardelli, Clayton & Mathis (1989) extinction curve and the per-line
//! reddening coefficients derived from it.

use super::constants::R_V;
use crate::domain::EmissionLine;
use std::collections::BTreeMap;

/// k(lambda) = A(lambda) / E(B-V) for a rest wavelength in Angstrom.
///
/// Valid for 0.3 <= x <= 8 inverse microns; anything else yields NaN.
pub fn cardelli(wavelength_angstrom: f64, r_v: f64) -> f64 {
    let x = 1.0e4 / wavelength_angstrom;
    let (a, b) = if (0.3..1.1).contains(&x) {
        let scale = x.powf(1.61);
        (0.574 * scale, -0.527 * scale)
    } else if (1.1..3.3).contains(&x) {
        let y = x - 1.82;
        let a = 1.0 + 0.17699 * y - 0.50447 * y.powi(2) - 0.02427 * y.powi(3)
            + 0.72085 * y.powi(4)
            + 0.01979 * y.powi(5)
            - 0.77530 * y.powi(6)
            + 0.32999 * y.powi(7);
        let b = 1.41338 * y + 2.28305 * y.powi(2) + 1.07233 * y.powi(3)
            - 5.38434 * y.powi(4)
            - 0.62251 * y.powi(5)
            + 5.30260 * y.powi(6)
            - 2.09002 * y.powi(7);
        (a, b)
    } else if (3.3..=8.0).contains(&x) {
        let (fa, fb) = if x >= 5.9 {
            let d = x - 5.9;
            (
                -0.04473 * d.powi(2) - 0.009779 * d.powi(3),
                0.2130 * d.powi(2) + 0.1207 * d.powi(3),
            )
        } else {
            (0.0, 0.0)
        };
        (
            1.752 - 0.316 * x - 0.104 / ((x - 4.67).powi(2) + 0.341) + fa,
            -3.090 + 1.825 * x + 1.206 / ((x - 4.62).powi(2) + 0.263) + fb,
        )
    } else {
        return f64::NAN;
    };

    r_v * a + b
}

/// Reddening coefficient per emission line, fixed after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReddeningTable {
    coefficients: BTreeMap<EmissionLine, f64>,
}

impl ReddeningTable {
    pub fn cardelli(r_v: f64) -> Self {
        let coefficients = EmissionLine::ALL
            .into_iter()
            .map(|line| (line, cardelli(line.wavelength(), r_v)))
            .collect();
        Self { coefficients }
    }

    pub fn k(&self, line: EmissionLine) -> f64 {
        self.coefficients.get(&line).copied().unwrap_or(f64::NAN)
    }

    /// A(lambda) = k(lambda) * E(B-V) for every line in the table.
    pub fn attenuation(&self, ebv: f64) -> BTreeMap<EmissionLine, f64> {
        self.coefficients
            .iter()
            .map(|(line, k)| (*line, k * ebv))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmissionLine, f64)> + '_ {
        self.coefficients.iter().map(|(line, k)| (*line, *k))
    }
}

impl Default for ReddeningTable {
    fn default() -> Self {
        Self::cardelli(R_V)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReddeningTable, cardelli};
    use crate::common::constants::R_V;
    use crate::domain::EmissionLine;

    #[test]
    fn hbeta_coefficient_matches_published_value() {
        let k_hbeta = cardelli(4861.32, R_V);
        assert!((k_hbeta - 3.61).abs() < 0.01, "k(Hb) = {k_hbeta}");
    }

    #[test]
    fn coefficients_decrease_toward_the_red() {
        let table = ReddeningTable::default();
        let values: Vec<f64> = EmissionLine::ALL
            .into_iter()
            .map(|line| table.k(line))
            .collect();
        for pair in values.windows(2) {
            assert!(pair[0] > pair[1], "{:?} should be decreasing", values);
        }
    }

    #[test]
    fn out_of_range_wavelength_is_nan() {
        assert!(cardelli(500.0, R_V).is_nan());
        assert!(cardelli(1.0e6, R_V).is_nan());
    }

    #[test]
    fn attenuation_scales_linearly_with_ebv() {
        let table = ReddeningTable::default();
        let a_lambda = table.attenuation(0.2);
        for (line, k) in table.iter() {
            assert!((a_lambda[&line] - 0.2 * k).abs() < 1.0e-12);
        }
        assert!(table.attenuation(0.0).values().all(|value| *value == 0.0));
    }
}
