use anyhow::Context;
use clap::Parser;
use redalt_sync::core::orchestrator::{ItemOutcome, SyncPhase, SyncProgress};
use redalt_sync::core::{AccountSlot, ConfigProvider};
use redalt_sync::utils::error::ErrorSeverity;
use redalt_sync::utils::logger::{self, LogFormat};
use redalt_sync::utils::validation::Validate;
use redalt_sync::{
    CliConfig, Command, FileCredentialStore, JwtExpiryChecker, RedditApiClient, SyncConfig,
    SyncEngine, SyncError,
};
use std::sync::Arc;

type Engine = SyncEngine<FileCredentialStore, JwtExpiryChecker, RedditApiClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(cli.verbose, log_format);

    tracing::info!("Starting redalt-sync");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = SyncConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config file '{}'", cli.config))?;
    if let Some(path) = &cli.credentials {
        config.storage.credentials_path = path.clone();
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let api = Arc::new(RedditApiClient::from_config(&config)?);
    let store = FileCredentialStore::new(config.credentials_path());
    let engine = SyncEngine::new(store, JwtExpiryChecker::new(), api, &config);

    if let Err(e) = run(&engine, &config, cli.command).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(engine: &Engine, config: &SyncConfig, command: Command) -> Result<(), SyncError> {
    match command {
        Command::Connect { slot, token } => {
            let identity = engine.accounts().connect(slot, &token).await?;
            println!("✅ {} account connected as {}", slot, identity.username);
        }
        Command::Disconnect { slot } => {
            engine.accounts().disconnect(slot).await?;
            println!("🔌 {} account disconnected", slot);
        }
        Command::Status => {
            for slot in AccountSlot::ALL {
                let status = engine.accounts().status(slot).await;
                let icon = if status.is_connected() { "🟢" } else { "⚪" };
                println!("{} {:<6}  {}", icon, slot, status);
            }
        }
        Command::List { slot } => {
            let collection = engine.list(slot).await?;
            println!("{} total", collection.len());
            if collection.is_empty() {
                println!("No subreddits found");
            }
            for item in collection.iter() {
                println!("r/{:<30} {}", item.name, item.display_url(config.site_url()));
            }
        }
        Command::Sync {
            select,
            all,
            dry_run,
        } => {
            let selection = engine.prepare_selection(&select, all).await?;

            if dry_run {
                let pending = engine.plan(&selection).await?;
                println!("🔍 Would subscribe to {} subreddits:", pending.len());
                for name in pending {
                    println!("  r/{}", name);
                }
                return Ok(());
            }

            let readiness = engine.readiness(&selection).await?;
            println!("🚀 {}", readiness.message());
            let outcome = engine.sync(&selection, print_progress).await?;

            for result in outcome.job.failures() {
                if let ItemOutcome::Failed(reason) = &result.outcome {
                    println!("  ❌ r/{}: {}", result.name, reason);
                }
            }
            println!("{}", outcome.job.summary());
            if let Some(target) = outcome.refreshed_target {
                println!("🎯 Target account now has {} subscriptions", target.len());
            }
        }
    }

    Ok(())
}

fn print_progress(progress: &SyncProgress) {
    match progress.phase {
        SyncPhase::FetchingTarget => println!("Preparing to sync..."),
        SyncPhase::Applying if progress.completed == 0 => {
            println!("Subscribing to {} subreddits...", progress.total)
        }
        SyncPhase::Applying => {
            let failed = if progress.failed > 0 {
                format!(" - {} failed", progress.failed)
            } else {
                String::new()
            };
            println!(
                "Subscribing to subreddits... ({}/{}) {}%{}",
                progress.completed,
                progress.total,
                progress.percent(),
                failed
            );
        }
        _ => {}
    }
}
