//! Metallicities of individual galaxies from their bin's composite T_e.
//!
//! Each galaxy adopts the electron temperature measured on the stacked
//! spectrum of the bin it belongs to and combines it with its own
//! [OII]/Hb and [OIII]/Hb ratios.

use super::table::{Table, read_table, write_table};
use super::temperature::metallicity_calculation;
use crate::domain::{DerivedProperty, OutputArtifact, StackError, StackResult};
use crate::numerics::combine;
use ndarray::Array1;
use std::path::Path;

pub const COMPOSITE_ID_COLUMN: &str = "ID";
pub const COMPOSITE_TEMPERATURE_COLUMN: &str = "Temperature";
pub const BIN_NUMBER_COLUMN: &str = "Bin_number";
pub const ADOPTED_TEMPERATURE_COLUMN: &str = "Temperature";
pub const METALLICITY_COLUMN: &str = "com_O_log";

/// Composite temperature per galaxy; galaxies whose bin has no composite
/// measurement get NaN.
pub fn adopt_composite_temperature(composite: &Table, bins: &Table) -> StackResult<Array1<f64>> {
    let composite_ids = composite.int_column(COMPOSITE_ID_COLUMN)?;
    let composite_te = composite.float_column(COMPOSITE_TEMPERATURE_COLUMN)?;
    let galaxy_bins = bins.int_column(BIN_NUMBER_COLUMN)?;

    let mut adopted = Array1::from_elem(galaxy_bins.len(), f64::NAN);
    for (bin, te) in composite_ids.iter().zip(composite_te.iter()) {
        for (slot, galaxy_bin) in adopted.iter_mut().zip(&galaxy_bins) {
            if galaxy_bin == bin {
                *slot = *te;
            }
        }
    }
    Ok(adopted)
}

/// Appends the adopted temperature and `12+log(O/H)` to the individual
/// galaxy table.
pub fn composite_metallicity(composite: &Table, det3: &Table, bins: &Table) -> StackResult<Table> {
    if det3.len() != bins.len() {
        return Err(StackError::input_validation(
            "INPUT.TABLE_LENGTH",
            format!(
                "galaxy table '{}' has {} rows but bin table '{}' has {}",
                det3.name(),
                det3.len(),
                bins.name(),
                bins.len()
            ),
        ));
    }

    let te = adopt_composite_temperature(composite, bins)?;
    let o2 = det3.float_column("O2")?;
    let o3 = det3.float_column("O3")?;
    let hb = det3.float_column("Hb")?;

    // O3 already sums 4959 and 5007.
    let two_beta = combine(&o2, &hb, |o2, hb| o2 / hb)?;
    let three_beta = combine(&o3, &hb, |o3, hb| o3 / hb)?;
    let metals = metallicity_calculation(&te, &two_beta, &three_beta, None)?;
    let metallicity = metals
        .get(&DerivedProperty::LogOxygenAbundance)
        .ok_or_else(|| {
            StackError::internal("SYS.PROPERTY_MISSING", "metallicity was not produced")
        })?;

    let mut output = det3.clone();
    output.put_float_column(ADOPTED_TEMPERATURE_COLUMN, te.to_vec())?;
    output.put_float_column(METALLICITY_COLUMN, metallicity.to_vec())?;
    Ok(output)
}

/// Reads the composite, galaxy and bin tables and writes the galaxy table
/// with composite-temperature metallicities to `output`.
pub fn individual_metallicity(
    composite_path: &Path,
    det3_path: &Path,
    bins_path: &Path,
    output: &Path,
) -> StackResult<OutputArtifact> {
    let composite = read_table(composite_path)?;
    let det3 = read_table(det3_path)?;
    let bins = read_table(bins_path)?;

    let table = composite_metallicity(&composite, &det3, &bins)?;
    let unmatched = table
        .float_column(ADOPTED_TEMPERATURE_COLUMN)?
        .iter()
        .filter(|te| te.is_nan())
        .count();
    if unmatched > 0 {
        tracing::warn!(unmatched, "Galaxies without a composite temperature");
    }
    write_table(&table, output, true)
}
