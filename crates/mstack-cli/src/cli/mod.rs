mod commands;

use clap::Parser;
use mstack_core::domain::StackError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let stack_error = error.as_stack_error();
            eprintln!("{}", stack_error.diagnostic_line());
            if let Some(summary_line) = stack_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            stack_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("mstack".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// Logs go to stderr; `RUST_LOG` applies unless `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed when `run` is called repeatedly.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "mstack",
    version,
    about = "Uncertainty propagation for stacked emission-line spectra"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Propagate flux uncertainties into temperatures and metallicities
    Propagate(commands::PropagateArgs),
    /// Add Balmer decrements and E(B-V) to the derived-property table
    Ebv(commands::EbvArgs),
    /// Metallicities of individual galaxies from composite temperatures
    Individual(commands::IndividualArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Propagate(args) => commands::run_propagate_command(args),
        CliCommand::Ebv(args) => commands::run_ebv_command(args),
        CliCommand::Individual(args) => commands::run_individual_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(StackError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_stack_error(&self) -> StackError {
        match self {
            Self::Usage(message) => {
                StackError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => StackError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<StackError> for CliError {
    fn from(error: StackError) -> Self {
        Self::Compute(error)
    }
}
