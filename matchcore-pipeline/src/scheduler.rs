//! Component K: Scheduler/Orchestrator (spec.md §4.8). Each cron-triggered
//! job opens a durable `ingest_runs` row, does its work, and closes the row
//! with a stats payload or an abort marker -- one job function per cron
//! trigger instead of one long-lived binary.

use crate::config::{PipelineConfig, ScraperConfig};
use crate::engine::ScraperEngine;
use crate::error::EventError;
use crate::reconciliation;
use crate::registry::AdapterRegistry;
use crate::{linkage, promotion};
use chrono::{Duration, Utc};
use log::{info, warn};
use matchcore_db::queries::{events, runs};
use matchcore_db::{views, ConnectionPool, PgConnection, QueryError};
use matchcore_fetch::Fetcher;
use std::sync::Arc;

fn db_error(err: diesel::r2d2::PoolError) -> QueryError {
    QueryError::DatabaseError(diesel::result::DatabaseErrorKind::UnableToSendCommand, Box::new(err.to_string()))
}

/// `daily_active_events_sync` (spec.md §4.8): look back 7 days and forward 7
/// days across production matches, collect every touched event, and re-run
/// the Scraper Engine on each -- concurrently, one [`ScraperEngine::run`]
/// per event.
pub async fn daily_active_events_sync(
    pool: ConnectionPool,
    registry: &AdapterRegistry,
    fetcher: Arc<Fetcher>,
    scraper_config: ScraperConfig,
) -> Result<serde_json::Value, EventError> {
    let mut conn = pool.get().map_err(|err| EventError::Db(db_error(err)))?;
    let run = runs::start_run(&mut conn, "daily_active_events_sync").map_err(EventError::Db)?;

    let today = Utc::now().date_naive();
    let outcome: Result<serde_json::Value, EventError> = async {
        let refs = events::active_event_refs_in_window(
            &mut conn,
            today - Duration::days(7),
            today + Duration::days(7),
        )
        .map_err(EventError::Db)?;
        drop(conn);

        let engine = Arc::new(ScraperEngine::new(pool.clone(), scraper_config));
        let mut missing_adapters = Vec::new();
        let mut join_set = tokio::task::JoinSet::new();

        for event_ref in refs {
            let Some(adapter) = registry.get(&event_ref.source_platform) else {
                missing_adapters.push(event_ref.source_platform.clone());
                continue;
            };
            let adapter = adapter.clone();
            let engine = engine.clone();
            let fetcher = fetcher.clone();
            join_set.spawn(async move {
                let result = engine.run(&adapter, fetcher, Some(&event_ref.source_event_id)).await;
                (event_ref, result)
            });
        }

        let mut events_synced = 0usize;
        let mut matches_staged = 0usize;
        let mut events_failed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            let (event_ref, result) = joined.map_err(|err| EventError::TaskPanicked(err.to_string()))?;
            match result {
                Ok(stats) => {
                    events_synced += stats.events_succeeded;
                    matches_staged += stats.matches_staged;
                }
                Err(err) => {
                    events_failed += 1;
                    warn!(
                        "daily sync of event {} on {} failed: {err}",
                        event_ref.source_event_id, event_ref.source_platform
                    );
                }
            }
        }

        Ok(serde_json::json!({
            "events_synced": events_synced,
            "events_failed": events_failed,
            "matches_staged": matches_staged,
            "adapters_missing": missing_adapters,
        }))
    }
    .await;

    let mut conn = pool.get().map_err(|err| EventError::Db(db_error(err)))?;
    match outcome {
        Ok(stats) => {
            runs::finish_run(&mut conn, run.id, stats.clone()).map_err(EventError::Db)?;
            info!("daily_active_events_sync finished: {stats}");
            Ok(stats)
        }
        Err(err) => {
            runs::abort_run(&mut conn, run.id, None).ok();
            Err(err)
        }
    }
}

/// `nightly_promote` (spec.md §4.8): run the Promotion Pipeline until no
/// unprocessed staging rows remain, or `config.promotion.max_iterations` is
/// hit.
pub fn nightly_promote(
    conn: &mut PgConnection,
    config: &PipelineConfig,
    current_season_year: i32,
) -> Result<serde_json::Value, QueryError> {
    let run = runs::start_run(conn, "nightly_promote")?;

    let result = promotion::promote_until_drained(conn, &config.promotion, &config.data_policy, current_season_year);
    finish_or_abort(conn, run.id, result, |stats| {
        serde_json::json!({
            "rows_seen": stats.rows_seen,
            "rows_promoted": stats.rows_promoted,
            "rows_rejected": stats.rows_rejected,
        })
    })
}

/// `nightly_infer_links` (spec.md §4.8): run the Event-Linkage Inferrer and
/// apply every inference it finds.
pub fn nightly_infer_links(conn: &mut PgConnection) -> Result<serde_json::Value, QueryError> {
    let run = runs::start_run(conn, "nightly_infer_links")?;

    let result = linkage::infer_links(conn, false);
    finish_or_abort(conn, run.id, result, |links| {
        serde_json::json!({ "links_applied": links.len() })
    })
}

/// `nightly_view_refresh` (spec.md §4.8): refresh every materialized view.
pub fn nightly_view_refresh(conn: &mut PgConnection) -> Result<serde_json::Value, QueryError> {
    let run = runs::start_run(conn, "nightly_view_refresh")?;

    let result = views::refresh_all_views(conn);
    finish_or_abort(conn, run.id, result, |()| {
        serde_json::json!({ "views_refreshed": views::MATERIALIZED_VIEWS.len() })
    })
}

/// `weekly_reconciliation` (spec.md §4.8): fuzzy-match ranked-but-unmatched
/// teams against the rest of `teams_v2` (spec.md §4.3 strategy 6), then run
/// the duplicate-prefix periodic fixer (spec.md §8 scenario 4) over every
/// canonical team -- both are "once a week, sweep all of `teams_v2` for a
/// self-healing opportunity" jobs, so they share a run id.
pub fn weekly_reconciliation(
    conn: &mut PgConnection,
    trigram_threshold: f64,
) -> Result<serde_json::Value, QueryError> {
    let run = runs::start_run(conn, "weekly_reconciliation")?;

    let result = reconciliation::reconcile_ranked_teams(conn, trigram_threshold)
        .and_then(|rank_stats| {
            let prefix_stats = reconciliation::fix_duplicate_prefixes(conn)?;
            Ok((rank_stats, prefix_stats))
        });
    finish_or_abort(conn, run.id, result, |(rank_stats, prefix_stats)| {
        serde_json::json!({
            "candidates_examined": rank_stats.candidates_examined,
            "teams_linked": rank_stats.teams_linked,
            "prefix_fix_candidates_examined": prefix_stats.candidates_examined,
            "prefix_fix_renamed": prefix_stats.renamed,
            "prefix_fix_merged_as_alias": prefix_stats.merged_as_alias,
        })
    })
}

/// Close out an `ingest_runs` row: `finish_run` with a stats payload derived
/// from a successful result, or `abort_run` (no payload) on failure, either
/// way propagating the original `Result` to the caller.
fn finish_or_abort<T>(
    conn: &mut PgConnection,
    run_id: i64,
    result: Result<T, QueryError>,
    to_stats: impl FnOnce(&T) -> serde_json::Value,
) -> Result<serde_json::Value, QueryError> {
    match result {
        Ok(value) => {
            let stats = to_stats(&value);
            runs::finish_run(conn, run_id, stats.clone())?;
            Ok(stats)
        }
        Err(err) => {
            runs::abort_run(conn, run_id, None).ok();
            Err(err)
        }
    }
}
