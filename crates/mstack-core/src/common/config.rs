//! Run-wide analysis configuration.
//!
//! Built once at startup and passed by reference into every stage; nothing
//! mutates it afterwards.

use super::constants::{DEFAULT_DRAW_COUNT, R_V};
use super::extinction::ReddeningTable;
use crate::domain::{StackError, StackResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Reference point for the asymmetric error bars of an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorAnchor {
    /// Deviations measured from the measured (nominal) value.
    #[default]
    Nominal,
    /// Deviations measured from the ensemble peak.
    Peak,
}

/// File names read and written inside a bin directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputNames {
    pub bin_fit: String,
    pub bin_fit_revised: String,
    pub derived_properties: String,
    pub derived_properties_revised: String,
    pub derived_properties_revised_dust: String,
    pub validation: String,
    pub validation_revised: String,
    pub flux_ensemble: String,
    pub flux_errors: String,
    pub flux_peaks: String,
    pub derived_ensemble: String,
    pub derived_errors: String,
    pub derived_peaks: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            bin_fit: "bin_emission_line_fit.tbl".to_string(),
            bin_fit_revised: "bin_emission_line_fit.revised.tbl".to_string(),
            derived_properties: "bin_derived_properties.tbl".to_string(),
            derived_properties_revised: "bin_derived_properties.revised.tbl".to_string(),
            derived_properties_revised_dust: "bin_derived_properties.revised.dustcorr.tbl"
                .to_string(),
            validation: "bin_validation.tbl".to_string(),
            validation_revised: "bin_validation.revised.tbl".to_string(),
            flux_ensemble: "flux_propdist.ens".to_string(),
            flux_errors: "flux_errors.ens".to_string(),
            flux_peaks: "flux_xpeak.ens".to_string(),
            derived_ensemble: "der_prop_propdist.ens".to_string(),
            derived_errors: "der_prop_errors.ens".to_string(),
            derived_peaks: "der_prop_xpeak.ens".to_string(),
        }
    }
}

impl OutputNames {
    pub fn validation_table(&self, revised: bool) -> &str {
        if revised {
            &self.validation_revised
        } else {
            &self.validation
        }
    }

    pub fn revised_derived_table(&self, apply_dust: bool) -> &str {
        if apply_dust {
            &self.derived_properties_revised_dust
        } else {
            &self.derived_properties_revised
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub draw_count: usize,
    pub base_seed: u64,
    pub r_v: f64,
    pub error_anchor: ErrorAnchor,
    pub files: OutputNames,
    #[serde(skip)]
    reddening: ReddeningTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            draw_count: DEFAULT_DRAW_COUNT,
            base_seed: 0,
            r_v: R_V,
            error_anchor: ErrorAnchor::default(),
            files: OutputNames::default(),
            reddening: ReddeningTable::cardelli(R_V),
        }
    }
}

impl AnalysisConfig {
    pub fn with_draw_count(mut self, draw_count: usize) -> Self {
        self.draw_count = draw_count;
        self
    }

    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    pub fn with_error_anchor(mut self, anchor: ErrorAnchor) -> Self {
        self.error_anchor = anchor;
        self
    }

    pub fn with_r_v(mut self, r_v: f64) -> Self {
        self.r_v = r_v;
        self.reddening = ReddeningTable::cardelli(r_v);
        self
    }

    pub fn reddening(&self) -> &ReddeningTable {
        &self.reddening
    }

    /// Seed for the line at `position` in the fixed line order.
    pub fn seed_for(&self, position: usize) -> u64 {
        self.base_seed.wrapping_add(position as u64)
    }

    pub fn validate(&self) -> StackResult<()> {
        if self.draw_count == 0 {
            return Err(StackError::input_validation(
                "INPUT.DRAW_COUNT",
                "draw count must be a positive integer",
            ));
        }
        if !self.r_v.is_finite() || self.r_v <= 0.0 {
            return Err(StackError::input_validation(
                "INPUT.R_V",
                format!("R_V must be finite and positive, got {}", self.r_v),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(source: &str) -> StackResult<Self> {
        let parsed: Self = serde_json::from_str(source).map_err(|error| {
            StackError::input_validation(
                "INPUT.CONFIG_PARSE",
                format!("failed to parse analysis configuration: {}", error),
            )
        })?;
        let config = parsed.with_r_v_rebuilt();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> StackResult<Self> {
        if !path.is_file() {
            return Err(StackError::missing_file(path));
        }
        let source = fs::read_to_string(path).map_err(|source| {
            StackError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read configuration '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json_str(&source)
    }

    fn with_r_v_rebuilt(self) -> Self {
        let r_v = self.r_v;
        self.with_r_v(r_v)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisConfig, ErrorAnchor};
    use crate::domain::{EmissionLine, StackErrorCategory};

    #[test]
    fn default_config_uses_milky_way_curve() {
        let config = AnalysisConfig::default();
        assert_eq!(config.draw_count, 1000);
        assert_eq!(config.error_anchor, ErrorAnchor::Nominal);
        assert!(config.reddening().k(EmissionLine::HBeta) > 3.5);
    }

    #[test]
    fn json_overrides_rebuild_the_reddening_table() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "drawCount": 250, "baseSeed": 7, "rV": 4.05, "errorAnchor": "peak" }"#,
        )
        .expect("config should parse");

        assert_eq!(config.draw_count, 250);
        assert_eq!(config.seed_for(3), 10);
        assert_eq!(config.error_anchor, ErrorAnchor::Peak);
        assert_eq!(
            config.reddening(),
            AnalysisConfig::default().with_r_v(4.05).reddening()
        );
        assert_eq!(config.files.bin_fit, "bin_emission_line_fit.tbl");
    }

    #[test]
    fn zero_draw_count_is_rejected() {
        let error = AnalysisConfig::from_json_str(r#"{ "drawCount": 0 }"#)
            .expect_err("zero draws should be rejected");
        assert_eq!(error.category(), StackErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.DRAW_COUNT");
    }
}
