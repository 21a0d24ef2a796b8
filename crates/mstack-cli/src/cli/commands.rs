use super::CliError;
use anyhow::Context;
use mstack_core::common::AnalysisConfig;
use mstack_core::domain::{PropagationRequest, RunMode};
use mstack_core::modules::attenuation::annotate_ebv;
use mstack_core::modules::composite::individual_metallicity;
use mstack_core::modules::run_propagation;
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct PropagateArgs {
    /// Directory holding the bin tables
    #[arg(value_name = "DIR")]
    directory: PathBuf,

    /// Single pass on nominal fluxes, no randomization
    #[arg(long)]
    raw: bool,

    /// Correct for dust using the Hgamma/Hbeta decrement
    #[arg(long)]
    dust: bool,

    /// Use the original validation table instead of the revised one
    #[arg(long)]
    original_validation: bool,

    /// Number of Monte Carlo draws per object
    #[arg(long, value_name = "N")]
    draws: Option<usize>,

    /// Base seed; each line uses base + its position
    #[arg(long, value_name = "S")]
    seed: Option<u64>,

    /// JSON analysis configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl PropagateArgs {
    fn analysis_config(&self) -> Result<AnalysisConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(draws) = self.draws {
            config = config.with_draw_count(draws);
        }
        if let Some(seed) = self.seed {
            config = config.with_base_seed(seed);
        }
        Ok(config)
    }

    fn request(&self) -> PropagationRequest {
        let mode = if self.raw {
            RunMode::Deterministic
        } else {
            RunMode::Ensemble
        };
        PropagationRequest::new(self.directory.clone(), mode)
            .with_dust(self.dust)
            .with_revised_validation(!self.original_validation)
    }
}

#[derive(clap::Args)]
pub(super) struct EbvArgs {
    /// Directory holding the bin tables
    #[arg(value_name = "DIR")]
    directory: PathBuf,

    /// Annotate the revised tables
    #[arg(long)]
    revised: bool,
}

#[derive(clap::Args)]
pub(super) struct IndividualArgs {
    /// Composite table with ID and Temperature columns
    #[arg(long, value_name = "TBL")]
    composite: PathBuf,

    /// Individual galaxy table with O2, O3 and Hb columns
    #[arg(long, value_name = "TBL")]
    det3: PathBuf,

    /// Bin assignment table with a Bin_number column
    #[arg(long, value_name = "TBL")]
    bins: PathBuf,

    /// Output table path
    #[arg(long, value_name = "TBL")]
    output: PathBuf,
}

pub(super) fn run_propagate_command(args: PropagateArgs) -> Result<i32, CliError> {
    let config = args.analysis_config()?;
    let request = args.request();
    let report = run_propagation(&request, &config)?;

    if let Some(path) = &args.report {
        let json = report.to_json()?;
        tracing::info!(path = %path.display(), "Writing run report");
        fs::write(path, json)
            .with_context(|| format!("failed to write run report '{}'", path.display()))?;
        println!("JSON report: {}", path.display());
    }
    println!("{}", report.summary_line());
    Ok(0)
}

pub(super) fn run_ebv_command(args: EbvArgs) -> Result<i32, CliError> {
    let artifact = annotate_ebv(&args.directory, args.revised, &AnalysisConfig::default())?;
    println!("E(B-V) written to {}", artifact.path.display());
    Ok(0)
}

pub(super) fn run_individual_command(args: IndividualArgs) -> Result<i32, CliError> {
    let artifact = individual_metallicity(&args.composite, &args.det3, &args.bins, &args.output)?;
    println!("Individual metallicities written to {}", artifact.path.display());
    Ok(0)
}
