use crate::adapter::{AdapterEvent, Discovery, SourceAdapter, StagedMatch};
use crate::checkpoint::{Checkpoint, EventCheckpoint, EventStatus};
use crate::config::ScraperConfig;
use crate::error::EventError;
use chrono::Utc;
use itertools::Itertools;
use log::{debug, info, warn};
use matchcore_db::ConnectionPool;
use matchcore_db::models::{NewStagingEvent, NewStagingGame};
use matchcore_db::queries::staging;
use matchcore_fetch::Fetcher;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub events_attempted: usize,
    pub events_succeeded: usize,
    pub events_failed: usize,
    pub matches_staged: usize,
}

/// Component C: Scraper Engine (spec.md §4.2). Owns nothing adapter-specific
/// -- the adapter, the fetcher, and the rate controller it wraps are all
/// values passed in. The only long-lived engine state is the pair of
/// semaphores bounding concurrency (spec.md §5).
pub struct ScraperEngine {
    pool: ConnectionPool,
    config: ScraperConfig,
    cancel: CancellationToken,
}

impl ScraperEngine {
    pub fn new(pool: ConnectionPool, config: ScraperConfig) -> Self {
        Self { pool, config, cancel: CancellationToken::new() }
    }

    /// Cooperative cancel handle (spec.md §4.2 "Cancellation"): stops
    /// scheduling new events, lets in-flight ones finish or time out.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(
        &self,
        adapter: &SourceAdapter,
        fetcher: Arc<Fetcher>,
        event_filter: Option<&str>,
    ) -> Result<RunStats, EventError> {
        let events = self.discover_events(adapter, &fetcher).await?;
        let events: Vec<AdapterEvent> = events
            .into_iter()
            .filter(|e| event_filter.is_none_or(|id| id == e.event_id))
            .take(adapter.data_policy.max_events_per_run)
            .collect();

        let checkpoint_path = Checkpoint::path_for_adapter(&self.config.checkpoint_dir, &adapter.id);
        let mut checkpoint = Checkpoint::load(&checkpoint_path).unwrap_or_default();

        let event_semaphore = Arc::new(Semaphore::new(self.config.event_concurrency.get()));
        let mut stats = RunStats::default();

        let mut join_set = tokio::task::JoinSet::new();
        for event in events {
            if self.cancel.is_cancelled() {
                info!("run cancelled, not scheduling further events");
                break;
            }
            if checkpoint.is_done(&event.event_id) {
                debug!("skipping already-completed event {}", event.event_id);
                continue;
            }

            let permit = event_semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let adapter = adapter.clone();
            // A fresh sub-request semaphore per event (spec.md §5): the
            // per-event bound is independent of every other event's, not a
            // limiter shared across the whole run.
            let fetcher = Arc::new(fetcher.for_event(self.config.sub_request_concurrency));
            let timeout = std::time::Duration::from_secs(self.config.per_event_timeout_secs);
            let cancel = self.cancel.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let event_id = event.event_id.clone();
                let result = tokio::select! {
                    res = tokio::time::timeout(timeout, (adapter.scrape_event)(fetcher, event)) => res,
                    _ = cancel.cancelled() => Ok(Err(EventError::Cancelled)),
                };
                (event_id, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (event_id, timeout_result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    return Err(EventError::TaskPanicked(join_err.to_string()));
                }
            };

            stats.events_attempted += 1;
            match timeout_result {
                Ok(Ok(staged_matches)) => {
                    let deduped = dedupe_by_match_key(staged_matches);
                    // spec.md §4.1 `data_policy.is_valid_match(m)->bool`: drop
                    // matches the adapter's own policy rejects before they
                    // ever reach staging.
                    let policy = &adapter.data_policy;
                    let accepted: Vec<StagedMatch> =
                        deduped.into_iter().filter(|m| policy.is_valid_match(m)).collect();
                    let staged_count = accepted.len();
                    self.persist_event(adapter, &event_id, &accepted).await?;

                    stats.events_succeeded += 1;
                    stats.matches_staged += staged_count;
                    checkpoint.record(
                        &event_id,
                        EventCheckpoint { status: EventStatus::Ok, matches: staged_count, timestamp: Utc::now(), error: None },
                    );
                }
                Ok(Err(err)) => {
                    warn!("event {event_id} failed: {err}");
                    stats.events_failed += 1;
                    checkpoint.record(
                        &event_id,
                        EventCheckpoint {
                            status: EventStatus::Error,
                            matches: 0,
                            timestamp: Utc::now(),
                            error: Some(err.to_string()),
                        },
                    );
                }
                Err(_elapsed) => {
                    warn!("event {event_id} timed out after {:?}", timeout);
                    stats.events_failed += 1;
                    checkpoint.record(
                        &event_id,
                        EventCheckpoint {
                            status: EventStatus::Error,
                            matches: 0,
                            timestamp: Utc::now(),
                            error: Some("timed out".to_string()),
                        },
                    );
                }
            }

            checkpoint.flush(&checkpoint_path).ok();
        }

        Ok(stats)
    }

    async fn discover_events(
        &self,
        adapter: &SourceAdapter,
        fetcher: &Arc<Fetcher>,
    ) -> Result<Vec<AdapterEvent>, EventError> {
        match &adapter.discovery {
            Discovery::Static(events) => Ok(events.clone()),
            Discovery::Callback(callback) => callback(fetcher).await,
        }
    }

    /// Bulk-insert into `staging_games` and register the event in
    /// `staging_events` (spec.md §4.2 steps 5-6).
    async fn persist_event(
        &self,
        adapter: &SourceAdapter,
        event_id: &str,
        staged: &[StagedMatch],
    ) -> Result<(), EventError> {
        let pool = self.pool.clone();
        let adapter_id = adapter.id.clone();
        let event_id = event_id.to_string();
        let staged = staged.to_vec();
        let batch_size = self.config.staging_insert_batch_size;

        tokio::task::spawn_blocking(move || -> Result<(), EventError> {
            let mut conn = pool.get().map_err(|err| {
                EventError::Db(matchcore_db::QueryError::DatabaseError(
                    diesel::result::DatabaseErrorKind::UnableToSendCommand,
                    Box::new(err.to_string()),
                ))
            })?;

            let now = Utc::now().naive_utc();
            for chunk in staged.chunks(batch_size) {
                let rows: Vec<NewStagingGame> = chunk
                    .iter()
                    .map(|m| NewStagingGame {
                        match_date: m.match_date,
                        match_time: m.match_time,
                        home_team_name: &m.home_team_name,
                        away_team_name: &m.away_team_name,
                        home_score: m.home_score,
                        away_score: m.away_score,
                        event_name: m.event_name.as_deref(),
                        event_id: m.event_id.as_deref(),
                        venue_name: m.venue_name.as_deref(),
                        field_name: m.field_name.as_deref(),
                        division: m.division.as_deref(),
                        source_platform: &adapter_id,
                        source_match_key: &m.match_key,
                        raw_data: &m.raw_data,
                        scraped_at: now,
                    })
                    .collect();
                staging::insert_staging_games(&mut conn, &rows)?;
            }

            staging::insert_staging_event(
                &mut conn,
                &NewStagingEvent {
                    event_name: &event_id,
                    event_type: None,
                    source_platform: &adapter_id,
                    source_event_id: &event_id,
                    state: None,
                    raw_data: &serde_json::Value::Null,
                    scraped_at: now,
                },
            )?;

            Ok(())
        })
        .await
        .map_err(|join_err| EventError::TaskPanicked(join_err.to_string()))??;

        Ok(())
    }
}

/// Dedupe within-event on `match_key`, first write wins (spec.md §4.2 step 4).
fn dedupe_by_match_key(matches: Vec<StagedMatch>) -> Vec<StagedMatch> {
    matches.into_iter().unique_by(|m| m.match_key.clone()).collect()
}
