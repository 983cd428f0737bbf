use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use curator_common::config::database_url_from_env;
use curator_common::Config;
use curator_engine::dispatch::{LogDispatcher, SteemDispatcher};
use curator_engine::state::PgRunState;
use curator_engine::steem::{SteemConnectAuth, SteemProvider};
use curator_engine::store::PgStore;
use curator_engine::traits::{ActionDispatcher, RunStateStore};
use curator_engine::{EngineConfig, EngineDeps, RunCoordinator, RunOutcome};
use steem_client::{SteemClient, SteemConnect};

#[derive(Parser)]
#[command(name = "curator", about = "Category-weighted curation bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one curation pass (default)
    Run {
        /// Log votes and comments instead of broadcasting them
        #[arg(long)]
        dry_run: bool,
        /// Skip the voting power check
        #[arg(long)]
        force: bool,
    },
    /// Force-clear a lease left behind by a crashed run
    Unlock,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing()?;

    let cli = Cli::parse();
    let (dry_run, force) = match cli.command.unwrap_or(Command::Run {
        dry_run: false,
        force: false,
    }) {
        Command::Unlock => return unlock().await,
        Command::Run { dry_run, force } => (dry_run, force),
    };

    let mut config = Config::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;
    let run_state = Arc::new(PgRunState::new(store.pool().clone()));

    config.dry_run |= dry_run;
    config.forced |= force;
    config.log_redacted();

    let node = Arc::new(SteemProvider::new(SteemClient::new(&config.steem_rpc_url)));
    let connect = Arc::new(SteemConnect::new(&config.steemconnect_host));
    let dispatcher: Arc<dyn ActionDispatcher> = if config.dry_run {
        Arc::new(LogDispatcher)
    } else {
        Arc::new(SteemDispatcher::new(connect.clone()))
    };

    let engine_config = EngineConfig::builder()
        .agent(config.bot_account.clone())
        .total_budget(config.total_budget)
        .batch_size(config.batch_size)
        .min_post_age(chrono::Duration::hours(config.min_post_age_hours))
        .lookup_delay(Duration::from_secs(config.lookup_delay_secs))
        .lock_ttl(chrono::Duration::minutes(config.lock_ttl_minutes))
        .forced(config.forced)
        .categories(config.categories.clone())
        .denylist(config.denylist.clone())
        .build();

    let deps = EngineDeps::builder()
        .repository(Arc::new(store))
        .content(node.clone())
        .accounts(node.clone())
        .follows(node)
        .auth(Arc::new(SteemConnectAuth::new(
            connect,
            config.refresh_token.clone(),
            config.client_secret.clone(),
        )))
        .dispatcher(dispatcher)
        .run_state(run_state)
        .build();

    let report = RunCoordinator::new(engine_config, deps).run().await?;
    match report.outcome {
        RunOutcome::Completed => Ok(ExitCode::SUCCESS),
        RunOutcome::Aborted(reason) if reason.is_failure() => {
            error!(reason = %reason, "Curation run failed");
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::Aborted(_) => Ok(ExitCode::SUCCESS),
    }
}

/// Clearing the lease needs only the database.
async fn unlock() -> Result<ExitCode> {
    let store = PgStore::connect(&database_url_from_env()?).await?;
    store.migrate().await?;
    let run_state = PgRunState::new(store.pool().clone());
    if run_state.force_release().await? {
        info!("Lease cleared");
    } else {
        info!("No lease held");
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("curator=info".parse()?);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
