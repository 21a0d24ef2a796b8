use mstack_core::common::AnalysisConfig;
use mstack_core::domain::{DerivedProperty, EmissionLine, PropagationRequest, RunMode};
use mstack_core::modules::archive::read_archive;
use mstack_core::modules::run_propagation;
use mstack_core::modules::table::{ColumnData, Table, read_table, write_table};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BIN_IDS: [i64; 3] = [1, 2, 3];

fn line_level(line: EmissionLine, row: usize) -> f64 {
    let step = row as f64;
    match line {
        EmissionLine::Oii3727 => 100.0 + 10.0 * step,
        EmissionLine::HDelta => 12.5,
        EmissionLine::HGamma => 21.5 + step,
        EmissionLine::Oiii4363 => 1.5 + 0.25 * step,
        EmissionLine::HBeta => 50.0,
        EmissionLine::Oiii4958 => 100.5,
        EmissionLine::Oiii5007 => 300.5 + 20.0 * step,
    }
}

fn write_fixture(directory: &Path, rms_fraction: f64, detection: [f64; 3]) {
    let mut fit = Table::new("bin_emission_line_fit.tbl");
    fit.put_column("bin_ID", ColumnData::Int(BIN_IDS.to_vec()))
        .expect("bin ids should be stored");
    for line in EmissionLine::ALL {
        let fluxes: Vec<f64> = (0..BIN_IDS.len()).map(|row| line_level(line, row)).collect();
        let rms: Vec<f64> = fluxes.iter().map(|flux| flux * rms_fraction).collect();
        fit.put_float_column(line.flux_column(), fluxes.clone())
            .expect("flux column should be stored");
        fit.put_float_column(line.observed_flux_column(), fluxes)
            .expect("observed flux column should be stored");
        fit.put_float_column(line.rms_column(), rms)
            .expect("rms column should be stored");
    }
    write_table(&fit, &directory.join("bin_emission_line_fit.tbl"), false)
        .expect("fit table should be written");

    for name in ["bin_validation.tbl", "bin_validation.revised.tbl"] {
        let mut validation = Table::new(name);
        validation
            .put_column("bin_ID", ColumnData::Int(BIN_IDS.to_vec()))
            .expect("bin ids should be stored");
        validation
            .put_float_column("Detection", detection.to_vec())
            .expect("detection flags should be stored");
        write_table(&validation, &directory.join(name), false)
            .expect("validation table should be written");
    }
}

fn run(directory: &Path, mode: RunMode, apply_dust: bool, config: &AnalysisConfig) {
    let request = PropagationRequest::new(directory, mode).with_dust(apply_dust);
    run_propagation(&request, config).expect("propagation should succeed");
}

fn small_config() -> AnalysisConfig {
    AnalysisConfig::default()
        .with_draw_count(400)
        .with_base_seed(11)
}

#[test]
fn deterministic_pass_writes_nominal_properties() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 0.5, 1.0]);

    let request = PropagationRequest::new(temp.path(), RunMode::Deterministic);
    let report = run_propagation(&request, &AnalysisConfig::default())
        .expect("deterministic pass should succeed");
    assert_eq!(report.detected_bins, BIN_IDS.to_vec());
    assert_eq!(report.draw_count, None);
    assert_eq!(report.artifacts.len(), 1);

    let derived = read_table(&temp.path().join("bin_derived_properties.tbl"))
        .expect("derived table should exist");
    assert_eq!(derived.len(), 3);
    for name in ["bin_ID", "logR23", "logO32", "two_beta", "three_beta", "R", "HgHb", "HdHb"] {
        assert!(derived.has_column(name), "missing {name}");
    }
    assert!(!derived.has_column("E(B-V)"));
    for property in DerivedProperty::ALL {
        let values = derived
            .float_column(property.as_str())
            .expect("property column should exist");
        assert!(values.iter().all(|value| value.is_finite()), "{property}");
    }
    let two_beta = derived.float_column("two_beta").expect("two_beta");
    assert_eq!(two_beta[0], 2.0);
}

#[test]
fn ensemble_leaves_undetected_rows_bit_identical() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 0.5, 1.0]);
    run(temp.path(), RunMode::Deterministic, false, &AnalysisConfig::default());

    let request = PropagationRequest::new(temp.path(), RunMode::Ensemble);
    let report = run_propagation(&request, &small_config()).expect("ensemble should succeed");
    assert_eq!(report.detected_bins, vec![1, 3]);
    assert_eq!(report.draw_count, Some(400));
    assert_eq!(report.artifacts.len(), 8);

    let fit = read_table(&temp.path().join("bin_emission_line_fit.tbl")).expect("fit");
    let revised_fit =
        read_table(&temp.path().join("bin_emission_line_fit.revised.tbl")).expect("revised fit");
    for line in EmissionLine::ALL {
        let before = fit.float_column(&line.flux_column()).expect("flux");
        let after = revised_fit.float_column(&line.flux_column()).expect("flux");
        assert_eq!(before[1].to_bits(), after[1].to_bits(), "{line}");
        for row in [0, 2] {
            let relative = (after[row] - before[row]).abs() / before[row];
            assert!(relative < 0.02, "{line} row {row} moved by {relative}");
        }
    }

    let derived = read_table(&temp.path().join("bin_derived_properties.tbl")).expect("derived");
    let revised = read_table(&temp.path().join("bin_derived_properties.revised.tbl"))
        .expect("revised derived");
    for property in DerivedProperty::ALL {
        let before = derived.float_column(property.as_str()).expect("property");
        let after = revised.float_column(property.as_str()).expect("property");
        assert_eq!(before[1].to_bits(), after[1].to_bits(), "{property}");
    }
}

#[test]
fn ensemble_archives_hold_draws_errors_and_peaks() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 0.0, 1.0]);
    run(temp.path(), RunMode::Deterministic, false, &AnalysisConfig::default());
    run(temp.path(), RunMode::Ensemble, false, &small_config());

    let flux_draws = read_archive(&temp.path().join("flux_propdist.ens")).expect("flux draws");
    assert_eq!(flux_draws.len(), EmissionLine::ALL.len());
    assert_eq!(flux_draws.get("HBETA").expect("HBETA draws").dim(), (2, 400));

    let flux_errors = read_archive(&temp.path().join("flux_errors.ens")).expect("flux errors");
    let hbeta_error = flux_errors.get("HBETA_error").expect("HBETA errors");
    assert_eq!(hbeta_error.dim(), (2, 2));
    assert!(hbeta_error.iter().all(|value| *value > 0.0));

    let flux_peaks = read_archive(&temp.path().join("flux_xpeak.ens")).expect("flux peaks");
    assert_eq!(flux_peaks.vector("HBETA_peak").expect("HBETA peak").len(), 2);

    let derived_draws =
        read_archive(&temp.path().join("der_prop_propdist.ens")).expect("derived draws");
    assert_eq!(derived_draws.len(), DerivedProperty::ALL.len());
    assert_eq!(derived_draws.get("T_e").expect("T_e draws").dim(), (2, 400));
    assert!(derived_draws.get("E(B-V)").is_none());

    let derived_errors =
        read_archive(&temp.path().join("der_prop_errors.ens")).expect("derived errors");
    assert!(derived_errors.get("12+log(O/H)_error").is_some());
    let derived_peaks = read_archive(&temp.path().join("der_prop_xpeak.ens")).expect("peaks");
    assert!(derived_peaks.vector("T_e_peak").is_some());
}

#[test]
fn same_seed_reproduces_revised_tables() {
    let first = TempDir::new().expect("tempdir should be created");
    let second = TempDir::new().expect("tempdir should be created");
    for directory in [first.path(), second.path()] {
        write_fixture(directory, 0.08, [1.0, 1.0, 0.0]);
        run(directory, RunMode::Deterministic, false, &AnalysisConfig::default());
        run(directory, RunMode::Ensemble, false, &small_config());
    }

    for name in [
        "bin_emission_line_fit.revised.tbl",
        "bin_derived_properties.revised.tbl",
        "flux_propdist.ens",
    ] {
        let a = fs::read(first.path().join(name)).expect("first output");
        let b = fs::read(second.path().join(name)).expect("second output");
        assert_eq!(a, b, "{name} differs between identical runs");
    }
}

#[test]
fn zero_uncertainty_ensemble_matches_deterministic_pass() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.0, [1.0, 1.0, 1.0]);
    run(temp.path(), RunMode::Deterministic, false, &AnalysisConfig::default());
    run(temp.path(), RunMode::Ensemble, false, &small_config());

    let derived = read_table(&temp.path().join("bin_derived_properties.tbl")).expect("derived");
    let revised = read_table(&temp.path().join("bin_derived_properties.revised.tbl"))
        .expect("revised derived");
    for property in DerivedProperty::ALL {
        let before = derived.float_column(property.as_str()).expect("property");
        let after = revised.float_column(property.as_str()).expect("property");
        assert_eq!(before, after, "{property}");
    }

    let errors = read_archive(&temp.path().join("der_prop_errors.ens")).expect("errors");
    let te_error = errors.get("T_e_error").expect("T_e errors");
    assert!(te_error.iter().all(|value| *value == 0.0));
}

#[test]
fn dust_run_writes_dust_corrected_table_and_ebv_draws() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 1.0, 0.5]);
    run(temp.path(), RunMode::Deterministic, false, &AnalysisConfig::default());

    let request = PropagationRequest::new(temp.path(), RunMode::Ensemble).with_dust(true);
    let report = run_propagation(&request, &small_config()).expect("dust run should succeed");
    assert!(report.apply_dust);

    assert!(temp.path().join("bin_derived_properties.revised.dustcorr.tbl").is_file());
    assert!(!temp.path().join("bin_derived_properties.revised.tbl").exists());
    let draws = read_archive(&temp.path().join("der_prop_propdist.ens")).expect("draws");
    assert_eq!(draws.get("E(B-V)").expect("E(B-V) draws").dim(), (2, 400));
}

#[test]
fn original_validation_table_can_be_selected() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 1.0, 1.0]);
    run(temp.path(), RunMode::Deterministic, false, &AnalysisConfig::default());
    fs::remove_file(temp.path().join("bin_validation.revised.tbl"))
        .expect("revised validation should be removed");

    let revised = PropagationRequest::new(temp.path(), RunMode::Ensemble);
    let error = run_propagation(&revised, &small_config())
        .expect_err("revised validation table is missing");
    assert_eq!(error.placeholder(), "IO.TABLE_NOT_FOUND");
    assert_eq!(error.exit_code(), 3);
    assert!(error.message().contains("bin_validation.revised.tbl"));

    let original = revised.with_revised_validation(false);
    let report = run_propagation(&original, &small_config())
        .expect("original validation table should be used");
    assert_eq!(report.detected_bins, BIN_IDS.to_vec());
}

#[test]
fn missing_flux_table_aborts_before_any_output() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = PropagationRequest::new(temp.path(), RunMode::Ensemble);
    let error = run_propagation(&request, &small_config()).expect_err("no inputs");
    assert_eq!(error.placeholder(), "IO.TABLE_NOT_FOUND");
    assert_eq!(
        fs::read_dir(temp.path()).expect("tempdir should list").count(),
        0
    );
}

#[test]
fn invalid_draw_count_is_rejected() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_fixture(temp.path(), 0.05, [1.0, 1.0, 1.0]);
    let request = PropagationRequest::new(temp.path(), RunMode::Ensemble);
    let error = run_propagation(&request, &AnalysisConfig::default().with_draw_count(0))
        .expect_err("zero draws");
    assert_eq!(error.placeholder(), "INPUT.DRAW_COUNT");
}
