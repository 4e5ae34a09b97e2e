//! CLI entrypoint (spec.md §6). Every subcommand opens its own connection
//! (or pool, for `scrape`), does one unit of pipeline work, and exits --
//! scheduling belongs to whatever cron wraps this binary, not to the binary
//! itself.

use chrono::Datelike;
use clap::{Parser, Subcommand};
use log::{error, info};
use matchcore_db::queries::rebuild::RebuildThresholds;
use matchcore_db::{Connection, PgConnection};
use matchcore_pipeline::config::PipelineConfig;
use matchcore_pipeline::rebuild::SwapMode;
use matchcore_pipeline::registry::AdapterRegistry;
use matchcore_pipeline::{linkage, promotion, rebuild, scheduler};
use miette::IntoDiagnostic;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "matchcore", about = "Youth-soccer match ingestion and reconciliation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run any pending database migrations.
    Migrate,
    /// Scrape one source adapter's active events into staging.
    Scrape {
        /// Id of a registered adapter (spec.md §4.1).
        #[arg(long)]
        adapter: String,
        /// Scrape only this event id instead of every discovered one.
        #[arg(long)]
        event: Option<String>,
    },
    /// Run the Promotion Pipeline (spec.md §4.5) until staging is drained.
    Promote {
        #[arg(long)]
        batch_size: Option<i64>,
        #[arg(long)]
        max_iters: Option<u32>,
    },
    /// Run the Event-Linkage Inferrer (spec.md §4.6).
    InferLinks {
        #[arg(long)]
        dry_run: bool,
    },
    /// Replay staging into the shadow tables (spec.md §4.7).
    Rebuild,
    /// Check a prior `rebuild` against the swap thresholds without swapping.
    ValidateRebuild {
        #[arg(long)]
        strict: bool,
    },
    /// Swap the shadow tables into production, or undo a prior swap.
    Swap {
        #[arg(long, conflicts_with_all = ["execute", "rollback"])]
        dry_run: bool,
        #[arg(long, conflicts_with_all = ["dry_run", "rollback"])]
        execute: bool,
        #[arg(long, conflicts_with_all = ["dry_run", "execute"])]
        rollback: bool,
    },
    /// Refresh every materialized read view.
    RefreshViews,
    /// Fuzzy-match ranked-but-unmatched teams (spec.md §4.8 `weekly_reconciliation`).
    Reconcile,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = PipelineConfig::load().into_diagnostic()?;
    let current_season_year = chrono::Utc::now().year();

    match cli.command {
        Command::Migrate => {
            matchcore_db::migrations::run_migrations().into_diagnostic()?;
            info!("migrations up to date");
        }
        Command::Scrape { adapter, event } => {
            let registry = AdapterRegistry::new();
            let Some(adapter) = registry.get(&adapter) else {
                error!(
                    "no adapter registered under id {adapter:?}; adapters are registered by the \
                    deployment embedding this binary, not shipped with the core crate"
                );
                std::process::exit(1);
            };

            let pool = matchcore_db::pool::get_pool(config.db_pool_size).into_diagnostic()?;
            let rate = Arc::new(matchcore_fetch::RateController::new(adapter.rate_limiting));
            let fetcher = Arc::new(matchcore_fetch::Fetcher::new(
                adapter.user_agents.clone(),
                matchcore_fetch::RetryLadder::default(),
                rate,
                std::time::Duration::from_secs(config.scraper.per_request_timeout_secs),
                config.scraper.sub_request_concurrency,
            ));

            let engine = matchcore_pipeline::engine::ScraperEngine::new(pool, config.scraper.clone());
            let stats = engine.run(adapter, fetcher, event.as_deref()).await.into_diagnostic()?;
            info!(
                "scrape finished: {} events attempted, {} succeeded, {} failed, {} matches staged",
                stats.events_attempted, stats.events_succeeded, stats.events_failed, stats.matches_staged
            );
        }
        Command::Promote { batch_size, max_iters } => {
            let mut conn = connect().into_diagnostic()?;
            let mut promotion_config = config.promotion.clone();
            if let Some(batch_size) = batch_size {
                promotion_config.batch_size = batch_size;
            }
            if max_iters.is_some() {
                promotion_config.max_iterations = max_iters;
            }
            let stats = promotion::promote_until_drained(
                &mut conn,
                &promotion_config,
                &config.data_policy,
                current_season_year,
            )
            .into_diagnostic()?;
            info!(
                "promote finished: {} seen, {} promoted, {} rejected; standings: {} seen, {} promoted, {} rejected",
                stats.rows_seen, stats.rows_promoted, stats.rows_rejected,
                stats.standings_seen, stats.standings_promoted, stats.standings_rejected
            );
        }
        Command::InferLinks { dry_run } => {
            let mut conn = connect().into_diagnostic()?;
            let links = linkage::infer_links(&mut conn, dry_run).into_diagnostic()?;
            info!("infer-links found {} link(s){}", links.len(), if dry_run { " (dry run)" } else { "" });
        }
        Command::Rebuild => {
            let mut conn = connect().into_diagnostic()?;
            let stats = rebuild::rebuild_from_staging(&mut conn, current_season_year).into_diagnostic()?;
            info!("rebuild finished: {} replayed, {} skipped", stats.rows_replayed, stats.rows_skipped);
        }
        Command::ValidateRebuild { strict } => {
            let mut conn = connect().into_diagnostic()?;
            let thresholds = RebuildThresholds::default();
            let (report, passed) = rebuild::validate_rebuild(&mut conn, &thresholds).into_diagnostic()?;
            info!("{report:#?}");
            if !passed && strict {
                error!("rebuild failed validation thresholds");
                std::process::exit(1);
            }
        }
        Command::Swap { dry_run, execute, rollback } => {
            let mut conn = connect().into_diagnostic()?;
            let thresholds = RebuildThresholds::default();
            let mode = match (dry_run, execute, rollback) {
                (_, true, _) => SwapMode::Execute,
                (_, _, true) => SwapMode::Rollback,
                _ => SwapMode::DryRun,
            };
            let outcome = conn
                .transaction(|conn| rebuild::execute_swap(conn, mode, &thresholds))
                .into_diagnostic()?;
            info!("{outcome:?}");
            if matches!(outcome, rebuild::SwapOutcome::ValidationFailed(_)) {
                error!("rebuild failed validation thresholds, refusing to swap");
                std::process::exit(1);
            }
        }
        Command::RefreshViews => {
            let mut conn = connect().into_diagnostic()?;
            matchcore_db::views::refresh_all_views(&mut conn).into_diagnostic()?;
            info!("refreshed {} materialized view(s)", matchcore_db::views::MATERIALIZED_VIEWS.len());
        }
        Command::Reconcile => {
            let mut conn = connect().into_diagnostic()?;
            let stats = scheduler::weekly_reconciliation(&mut conn, config.promotion.trigram_similarity_threshold)
                .into_diagnostic()?;
            info!("{stats}");
        }
    }

    Ok(())
}

fn connect() -> Result<PgConnection, diesel::ConnectionError> {
    PgConnection::establish(&matchcore_db::postgres_url_from_environment())
}
