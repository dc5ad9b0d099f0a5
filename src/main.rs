//! ERC-20 Ledger CLI Application
//!
//! A command-line interface for deploying and calling a fixed-supply token.

use clap::{Parser, Subcommand};
use erc20_ledger::cli::{self, AppState};
use erc20_ledger::deploy::DeployConfig;
use erc20_ledger::dispatch::Query;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "erc20")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A fixed-supply ERC-20 token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".erc20_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token ledger
    Deploy {
        /// Genesis config file (JSON); overrides the flags below
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Token name
        #[arg(long, default_value = "Token")]
        name: String,

        /// Token symbol
        #[arg(long, default_value = "TKN")]
        symbol: String,

        /// Decimal places
        #[arg(long, default_value = "18")]
        decimals: u8,

        /// Total supply, issued to the deployer
        #[arg(long, default_value = "1000")]
        supply: String,

        /// Deployer address
        #[arg(long)]
        deployer: Option<String>,

        /// Deployment nonce (feeds the ledger address)
        #[arg(long, default_value = "0")]
        nonce: u64,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Show token information
    Info,

    /// Show the total supply
    TotalSupply,

    /// Show the balance of an account
    Balance {
        #[arg(short, long)]
        account: String,
    },

    /// Show how much a spender may move on an owner's behalf
    Allowance {
        #[arg(short, long)]
        owner: String,

        #[arg(short, long)]
        spender: String,
    },

    /// Transfer tokens from the caller
    Transfer {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Allow a spender to move the caller's tokens
    Approve {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        spender: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Move tokens from an owner using the caller's allowance
    TransferFrom {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Send raw ABI calldata (hex) through the dispatcher
    Call {
        #[arg(short, long)]
        caller: String,

        #[arg(long)]
        data: String,
    },

    /// Print the ABI-encoded token name
    Name,

    /// Print the ABI-encoded token symbol
    Symbol,

    /// Show recent events
    Events {
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Export the ledger to a JSON file
    Export {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Import a ledger from a JSON file, replacing the current one
    Import {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// List stored backups
    Backups,

    /// Roll back to a stored backup
    Restore {
        /// Backup index (0 is the most recent)
        #[arg(short, long, default_value = "0")]
        backup: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Deploy doesn't need an existing ledger
    if let Commands::Deploy {
        config,
        name,
        symbol,
        decimals,
        supply,
        deployer,
        nonce,
        force,
    } = &cli.command
    {
        let config = match config {
            Some(path) => DeployConfig::from_file(path)?,
            None => {
                let deployer = deployer
                    .as_deref()
                    .ok_or("--deployer is required without --config")?;
                let mut config = DeployConfig::new(
                    name.clone(),
                    symbol.clone(),
                    cli::parse_address(deployer)?,
                    cli::parse_amount(supply)?,
                );
                config.decimals = *decimals;
                config
            }
        };
        return cli::cmd_deploy(&cli.data_dir, &config, *nonce, *force);
    }

    let mut state = AppState::open(cli.data_dir.clone())?;

    match cli.command {
        Commands::Deploy { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,
        Commands::TotalSupply => cli::cmd_total_supply(&state)?,
        Commands::Balance { account } => cli::cmd_balance(&state, &account)?,
        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,

        Commands::Transfer { caller, to, amount } => {
            cli::cmd_transfer(&state, &caller, &to, &amount)?
        }
        Commands::Approve {
            caller,
            spender,
            amount,
        } => cli::cmd_approve(&state, &caller, &spender, &amount)?,
        Commands::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => cli::cmd_transfer_from(&state, &caller, &from, &to, &amount)?,

        Commands::Call { caller, data } => cli::cmd_call(&state, &caller, &data)?,
        Commands::Name => cli::cmd_query(&state, Query::Name)?,
        Commands::Symbol => cli::cmd_query(&state, Query::Symbol)?,
        Commands::Events { count } => cli::cmd_events(&state, count)?,

        Commands::Export { path } => cli::cmd_export(&state, &path)?,
        Commands::Import { path } => cli::cmd_import(&mut state, &path)?,
        Commands::Backups => cli::cmd_backups(&state)?,
        Commands::Restore { backup } => cli::cmd_restore(&mut state, backup)?,
    }

    Ok(())
}
