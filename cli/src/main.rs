//! txsim CLI: simulate EVM transactions before sending them.
//!
//! # Commands
//! ```text
//! txsim chains
//! txsim decode   --calldata <hex> --abi <path.json> [--json]
//! txsim simulate --calldata <hex> [--chain <name>] [--abi <path.json>]
//!                [--api-key <key>] [--json] [--save-images <dir>]
//! txsim shell    (reads `simulate`, `decode`, `chains`, `quit` lines from stdin)
//! ```
//!
//! Exit codes: `0` success, `1` usage or transport error, `2` the simulation
//! service reported an error for the transaction.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod logging;
mod render;
mod session;

use config::TxsimConfig;
use session::Session;

#[derive(Parser)]
#[command(
    name = "txsim",
    about = "Simulate EVM transactions before executing them",
    long_about = "
txsim: simulate an EVM transaction against the Dune SIM API, decode its
call data with a contract ABI and flag risky outcomes.

ENVIRONMENT VARIABLES:
  TXSIM_API_KEY   Dune SIM API key (same as --api-key)
  RUST_LOG        Log filter, overrides the config file
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported chains and their ids
    Chains,

    /// Decode call data using an ABI JSON file
    Decode(DecodeArgs),

    /// Simulate a transaction
    Simulate(SimulateArgs),

    /// Interactive session; results and NFT images are cached between commands
    Shell,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Raw call data (0x-prefixed hex)
    #[arg(long)]
    pub calldata: String,
    /// Path to the ABI JSON file
    #[arg(long)]
    pub abi: PathBuf,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Raw call data (0x-prefixed hex)
    #[arg(long)]
    pub calldata: String,
    /// Chain name, see `txsim chains`
    #[arg(long, default_value = txsim_core::chain::DEFAULT_CHAIN)]
    pub chain: String,
    /// Decode the call data with this ABI JSON file first
    #[arg(long)]
    pub abi: Option<PathBuf>,
    /// Dune SIM API key
    #[arg(long, env = "TXSIM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
    /// Save NFT preview images into this directory
    #[arg(long)]
    pub save_images: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = TxsimConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.log.level = "debug".into();
    }
    logging::init_tracing(&config.log);

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Chains => {
            render::chains(&mut out)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Decode(args) => session::decode(&args, &mut out),

        Commands::Simulate(args) => Session::from_config(&config)?.simulate(&args, &mut out).await,

        Commands::Shell => {
            let session = Session::from_config(&config)?;
            let interactive = std::io::stdin().is_terminal();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.run_shell(stdin, &mut out, interactive).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_defaults_to_ethereum() {
        let cli = Cli::try_parse_from(["txsim", "simulate", "--calldata", "0x", "--api-key", "k"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.chain, "Ethereum");
                assert_eq!(args.api_key.as_deref(), Some("k"));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn shell_takes_no_arguments() {
        assert!(matches!(Cli::try_parse_from(["txsim", "shell"]).unwrap().command, Commands::Shell));
        assert!(Cli::try_parse_from(["txsim", "shell", "--calldata", "0x"]).is_err());
    }
}
