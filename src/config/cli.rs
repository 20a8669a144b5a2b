use crate::core::AccountSlot;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "redalt-sync")]
#[command(about = "Copy subreddit subscriptions from one Reddit account to another")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "redalt-sync.toml")]
    pub config: String,

    /// Override the credentials file from the config
    #[arg(long, global = true)]
    pub credentials: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit JSON log lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Verify a bearer token and store it for an account
    Connect {
        #[arg(value_parser = parse_slot)]
        slot: AccountSlot,
        token: String,
    },
    /// Forget the stored token for an account
    Disconnect {
        #[arg(value_parser = parse_slot)]
        slot: AccountSlot,
    },
    /// Show connection state for both accounts
    Status,
    /// List an account's subscriptions
    List {
        #[arg(value_parser = parse_slot)]
        slot: AccountSlot,
    },
    /// Subscribe the target account to the selected source subscriptions
    Sync {
        /// Comma-separated subreddit names to copy
        #[arg(long, value_delimiter = ',', conflicts_with = "all")]
        select: Vec<String>,

        /// Copy every source subscription
        #[arg(long)]
        all: bool,

        /// Show what would be subscribed without writing
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_slot(value: &str) -> Result<AccountSlot, String> {
    value.parse::<AccountSlot>().map_err(|e| e.to_string())
}
