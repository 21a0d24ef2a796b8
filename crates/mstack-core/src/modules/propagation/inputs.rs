use crate::domain::{
    BIN_ID_COLUMN, DETECTION_COLUMN, DetectionFlag, EmissionLine, StackError, StackResult,
};
use crate::modules::ratios::FluxMap;
use crate::modules::table::Table;
use ndarray::{Array1, Axis, Ix1};

/// Measured flux and its RMS uncertainty for one line.
pub(super) struct LineMeasurement {
    pub(super) flux: Array1<f64>,
    pub(super) rms: Array1<f64>,
}

pub(super) fn nominal_fluxes(table: &Table) -> StackResult<FluxMap<Ix1>> {
    EmissionLine::ALL
        .into_iter()
        .map(|line| -> StackResult<_> { Ok((line, table.float_column(&line.flux_column())?)) })
        .collect()
}

/// Flux and RMS of `line` restricted to `rows`, in row order.
pub(super) fn line_measurement(
    table: &Table,
    line: EmissionLine,
    rows: &[usize],
) -> StackResult<LineMeasurement> {
    let flux = table.float_column(&line.flux_column())?;
    let rms = table.float_column(&line.rms_column())?;
    Ok(LineMeasurement {
        flux: flux.select(Axis(0), rows),
        rms: rms.select(Axis(0), rows),
    })
}

/// Row indices whose detection flag marks a reliable detection.
pub(super) fn detected_rows(validation: &Table) -> StackResult<Vec<usize>> {
    let flags = validation.float_column(DETECTION_COLUMN)?;
    Ok(flags
        .iter()
        .enumerate()
        .filter(|(_, flag)| DetectionFlag::from_value(**flag).is_reliable())
        .map(|(row, _)| row)
        .collect())
}

pub(super) fn bin_ids(table: &Table, rows: &[usize]) -> StackResult<Vec<i64>> {
    let ids = table.int_column(BIN_ID_COLUMN)?;
    Ok(rows.iter().map(|row| ids[*row]).collect())
}

/// The flux, property and validation tables must describe the same bins
/// in the same order.
pub(super) fn ensure_aligned(reference: &Table, others: &[&Table]) -> StackResult<()> {
    let reference_ids = reference.int_column(BIN_ID_COLUMN)?;
    for other in others {
        if other.len() != reference.len() {
            return Err(StackError::input_validation(
                "INPUT.TABLE_LENGTH",
                format!(
                    "table '{}' has {} rows but '{}' has {}",
                    other.name(),
                    other.len(),
                    reference.name(),
                    reference.len()
                ),
            ));
        }
        if other.has_column(BIN_ID_COLUMN) && other.int_column(BIN_ID_COLUMN)? != reference_ids {
            return Err(StackError::input_validation(
                "INPUT.BIN_MISMATCH",
                format!(
                    "bin ids of '{}' and '{}' do not agree",
                    other.name(),
                    reference.name()
                ),
            ));
        }
    }
    Ok(())
}
