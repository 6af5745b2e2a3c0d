mod commands;

use clap::Parser;
use lpe_core::domain::LpeError;
use tracing_subscriber::EnvFilter;

const PROGRAM_NAME: &str = "lpe-check";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let lpe_error = error.as_lpe_error();
            eprintln!("{}", lpe_error.diagnostic_line());
            eprintln!("{}", lpe_error.fatal_exit_line());
            lpe_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
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

/// `RUST_LOG` wins over `-v` when set. Logs go to stderr; stdout carries
/// summaries only.
fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "lpe-check",
    about = "Isotope and pre/post-layout checks for extracted netlists"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compare the instance sections of a golden and a re-extracted SPF
    Isotope(commands::IsotopeArgs),
    /// Compare SPF devices against an OA-derived spectre netlist
    OaIsotope(commands::OaIsotopeArgs),
    /// Compare pre-layout and post-layout simulation results
    PoloCompare(commands::PoloCompareArgs),
    /// Scan a simulation output file for failure markers
    SimCheck(commands::SimCheckArgs),
    /// Run every check of a JSON scenario file
    Scenario(commands::ScenarioArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Isotope(args) => commands::run_isotope_command(args),
        CliCommand::OaIsotope(args) => commands::run_oa_isotope_command(args),
        CliCommand::PoloCompare(args) => commands::run_polo_compare_command(args),
        CliCommand::SimCheck(args) => commands::run_sim_check_command(args),
        CliCommand::Scenario(args) => commands::run_scenario_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(LpeError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_lpe_error(&self) -> LpeError {
        match self {
            Self::Usage(message) => LpeError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => LpeError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }

    fn compute(error: impl Into<LpeError>) -> Self {
        Self::Compute(error.into())
    }
}
