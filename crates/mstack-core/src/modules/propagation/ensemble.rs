use super::inputs::{bin_ids, detected_rows, ensure_aligned, line_measurement};
use super::{PropagationReport, derive_properties};
use crate::common::AnalysisConfig;
use crate::domain::{
    DerivedProperty, EmissionLine, OutputArtifact, PropagationRequest, RunMode, StackError,
    StackResult,
};
use crate::modules::PropagationStrategy;
use crate::modules::archive::{EnsembleArchive, write_archive};
use crate::modules::attenuation::EBV_COLUMN;
use crate::modules::ratios::FluxMap;
use crate::modules::table::{read_table, write_table};
use crate::numerics::{PeakEstimate, compute_onesig_pdf, random_pdf};
use ndarray::{Array2, Axis, Ix2};

/// Monte Carlo propagation restricted to reliably detected bins.
///
/// Each line is sampled with its own seed, the paired draws flow through
/// [`derive_properties`], and every ensemble is reduced against the nominal
/// table value. Rows outside the detection mask are written back untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsemblePropagation;

/// The three archives written per stage: full draws, error pairs, peaks.
struct StageArchives {
    ensembles: EnsembleArchive,
    errors: EnsembleArchive,
    peaks: EnsembleArchive,
}

impl StageArchives {
    fn new() -> Self {
        Self {
            ensembles: EnsembleArchive::new(),
            errors: EnsembleArchive::new(),
            peaks: EnsembleArchive::new(),
        }
    }

    fn record(&mut self, name: &str, draws: Array2<f64>, estimate: &PeakEstimate) {
        self.errors.insert(format!("{}_error", name), estimate.error.clone());
        self.peaks.insert_vector(format!("{}_peak", name), estimate.peak.view());
        self.ensembles.insert(name, draws);
    }

    fn write(
        &self,
        request: &PropagationRequest,
        names: [&str; 3],
    ) -> StackResult<Vec<OutputArtifact>> {
        let [ensembles, errors, peaks] = names;
        Ok(vec![
            write_archive(&self.ensembles, &request.path(ensembles))?,
            write_archive(&self.errors, &request.path(errors))?,
            write_archive(&self.peaks, &request.path(peaks))?,
        ])
    }
}

impl PropagationStrategy for EnsemblePropagation {
    fn mode(&self) -> RunMode {
        RunMode::Ensemble
    }

    fn execute(
        &self,
        request: &PropagationRequest,
        config: &AnalysisConfig,
    ) -> StackResult<PropagationReport> {
        let files = &config.files;
        let flux_table = read_table(&request.path(&files.bin_fit))?;
        let derived_table = read_table(&request.path(&files.derived_properties))?;
        let validation_table = read_table(
            &request.path(files.validation_table(request.revised_validation)),
        )?;
        ensure_aligned(&flux_table, &[&derived_table, &validation_table])?;

        let rows = detected_rows(&validation_table)?;
        let detected_bins = bin_ids(&flux_table, &rows)?;
        if rows.is_empty() {
            tracing::warn!(
                table = validation_table.name(),
                "No reliable detections; revised tables will equal their inputs"
            );
        } else {
            tracing::info!(detected = rows.len(), draws = config.draw_count, "Randomizing fluxes");
        }

        let mut artifacts = Vec::new();

        let mut revised_fluxes = flux_table.clone();
        let mut flux_archives = StageArchives::new();
        let mut ensembles: FluxMap<Ix2> = FluxMap::new();
        for line in EmissionLine::ALL {
            let measured = line_measurement(&flux_table, line, &rows)?;
            let draws = random_pdf(
                measured.flux.view(),
                measured.rms.view(),
                config.seed_for(line.position()),
                config.draw_count,
            )?;
            let estimate =
                compute_onesig_pdf(draws.view(), measured.flux.view(), config.error_anchor)?;
            tracing::debug!(line = %line, seed = config.seed_for(line.position()), "Sampled line");

            revised_fluxes.set_float_rows(&line.flux_column(), &rows, &estimate.peak.to_vec())?;
            flux_archives.record(line.as_str(), draws.clone(), &estimate);
            ensembles.insert(line, draws);
        }

        artifacts.push(write_table(&revised_fluxes, &request.path(&files.bin_fit_revised), true)?);
        artifacts.extend(flux_archives.write(
            request,
            [
                files.flux_ensemble.as_str(),
                files.flux_errors.as_str(),
                files.flux_peaks.as_str(),
            ],
        )?);

        let derived = derive_properties(&ensembles, request.apply_dust, config)?;

        let mut revised_properties = derived_table.clone();
        let mut property_archives = StageArchives::new();
        for property in DerivedProperty::ALL {
            let draws = derived.properties.get(&property).ok_or_else(|| {
                StackError::internal(
                    "SYS.PROPERTY_MISSING",
                    format!("derived property '{}' was not produced", property),
                )
            })?;
            let nominal = derived_table
                .float_column(property.as_str())?
                .select(Axis(0), &rows);
            let estimate = compute_onesig_pdf(draws.view(), nominal.view(), config.error_anchor)?;

            revised_properties.set_float_rows(property.as_str(), &rows, &estimate.peak.to_vec())?;
            property_archives.record(property.as_str(), draws.clone(), &estimate);
        }
        if let Some(ebv) = derived.ebv {
            property_archives.ensembles.insert(EBV_COLUMN, ebv);
        }

        let revised_name = files.revised_derived_table(request.apply_dust);
        artifacts.push(write_table(&revised_properties, &request.path(revised_name), true)?);
        artifacts.extend(property_archives.write(
            request,
            [
                files.derived_ensemble.as_str(),
                files.derived_errors.as_str(),
                files.derived_peaks.as_str(),
            ],
        )?);

        Ok(PropagationReport {
            mode: RunMode::Ensemble,
            apply_dust: request.apply_dust,
            draw_count: Some(config.draw_count),
            detected_bins,
            artifacts,
        })
    }
}
