mod commands;
mod helpers;

use calo_core::domain::CaloError;
use clap::Parser;

pub fn run_from_env() -> i32 {
    let args = std::env::args().collect::<Vec<_>>();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_calo_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            if let Some(summary_line) = diagnostic.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            diagnostic.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "calo-rs",
    version,
    about = "Crystal calorimeter layout and event aggregation"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the crystal placement list
    Layout(commands::LayoutArgs),
    /// Summarize the apparatus volumes and materials
    Describe(commands::DescribeArgs),
    /// Aggregate a recorded hit stream into the output tables
    Replay(commands::ReplayArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Layout(args) => commands::run_layout_command(args),
        CliCommand::Describe(args) => commands::run_describe_command(args),
        CliCommand::Replay(args) => commands::run_replay_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(CaloError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CaloError> for CliError {
    fn from(error: CaloError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_calo_error(&self) -> CaloError {
        match self {
            Self::Usage(message) => CaloError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => CaloError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
