use super::inputs::nominal_fluxes;
use super::{PropagationReport, derive_properties};
use crate::common::AnalysisConfig;
use crate::domain::{
    BIN_ID_COLUMN, DerivedProperty, PropagationRequest, RunMode, StackError, StackResult,
};
use crate::modules::PropagationStrategy;
use crate::modules::attenuation::EBV_COLUMN;
use crate::modules::table::{ColumnData, Table, read_table, write_table};

/// Runs the formulas once on nominal fluxes; no ensembles, no detection mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicPass;

impl PropagationStrategy for DeterministicPass {
    fn mode(&self) -> RunMode {
        RunMode::Deterministic
    }

    fn execute(
        &self,
        request: &PropagationRequest,
        config: &AnalysisConfig,
    ) -> StackResult<PropagationReport> {
        let files = &config.files;
        let flux_table = read_table(&request.path(&files.bin_fit))?;
        let bin_ids = flux_table.int_column(BIN_ID_COLUMN)?;
        let fluxes = nominal_fluxes(&flux_table)?;
        let derived = derive_properties(&fluxes, request.apply_dust, config)?;

        let mut output = Table::new(files.derived_properties.as_str());
        output.put_column(BIN_ID_COLUMN, ColumnData::Int(bin_ids.clone()))?;
        for (ratio, values) in &derived.ratios {
            output.put_float_column(ratio.as_str(), values.to_vec())?;
        }
        if let Some(ebv) = &derived.ebv {
            output.put_float_column(EBV_COLUMN, ebv.to_vec())?;
        }
        for property in DerivedProperty::ALL {
            let values = derived.properties.get(&property).ok_or_else(|| {
                StackError::internal(
                    "SYS.PROPERTY_MISSING",
                    format!("derived property '{}' was not produced", property),
                )
            })?;
            output.put_float_column(property.as_str(), values.to_vec())?;
        }

        let artifact = write_table(&output, &request.path(&files.derived_properties), true)?;
        Ok(PropagationReport {
            mode: RunMode::Deterministic,
            apply_dust: request.apply_dust,
            draw_count: None,
            detected_bins: bin_ids,
            artifacts: vec![artifact],
        })
    }
}
