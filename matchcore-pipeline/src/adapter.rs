use crate::error::EventError;
use chrono::NaiveDate;
use matchcore_fetch::{Fetcher, RateLimiting};
use std::sync::Arc;

/// A single match as an adapter's parser produces it, before it touches the
/// database. Field names mirror `staging_games` (spec.md §6 persisted-state
/// layout) so [`crate::engine`] can turn a `Vec<StagedMatch>` into
/// `NewStagingGame` rows without an adapter-specific mapping step.
#[derive(Debug, Clone)]
pub struct StagedMatch {
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<chrono::NaiveTime>,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub event_name: Option<String>,
    pub event_id: Option<String>,
    pub venue_name: Option<String>,
    pub field_name: Option<String>,
    pub division: Option<String>,
    pub match_key: String,
    pub raw_data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct DataPolicy {
    pub min_date: NaiveDate,
    pub max_future_days: i64,
    pub max_events_per_run: usize,
}

impl DataPolicy {
    pub fn is_valid_match(&self, m: &StagedMatch) -> bool {
        match m.match_date {
            Some(date) => {
                date >= self.min_date
                    && date <= chrono::Utc::now().date_naive() + chrono::Duration::days(self.max_future_days)
            }
            None => false,
        }
    }
}

/// One entry an adapter's `discovery` step produces: enough to call
/// `scrape_event` and to key the checkpoint (spec.md §4.1 `discovery`).
#[derive(Debug, Clone)]
pub struct AdapterEvent {
    pub event_id: String,
    pub event_name: String,
}

/// How an adapter finds the events it should scrape in a given run (spec.md
/// §4.1 `discovery`: "either a static event list or a callback that
/// discovers events").
#[derive(Clone)]
pub enum Discovery {
    Static(Vec<AdapterEvent>),
    Callback(Arc<dyn Fn(&Fetcher) -> DiscoveryFuture + Send + Sync>),
}

pub type DiscoveryFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<AdapterEvent>, EventError>> + Send>>;

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discovery::Static(events) => f.debug_tuple("Static").field(events).finish(),
            Discovery::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// `scrape_event(engine, event) -> list<StagedMatch>` (spec.md §4.1): the
/// only adapter-specific behavior the engine invokes. Replaces the source
/// repository's duck-typed callback object with a plain function value,
/// per the REDESIGN FLAGS note on dynamic adapter dispatch (spec.md §9).
pub type ScrapeFn = Arc<
    dyn Fn(Arc<Fetcher>, AdapterEvent) -> ScrapeFuture + Send + Sync,
>;

pub type ScrapeFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<StagedMatch>, EventError>> + Send>>;

/// A plugin-conforming source descriptor (spec.md §4.1). Adapters are value
/// objects plus functions; nothing here carries mutable state, so the same
/// `SourceAdapter` can be driven by any number of concurrent
/// [`crate::engine::ScraperEngine::run`] calls.
#[derive(Clone)]
pub struct SourceAdapter {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub technology: AdapterTechnology,
    pub rate_limiting: RateLimiting,
    pub user_agents: Vec<String>,
    pub data_policy: DataPolicy,
    pub discovery: Discovery,
    pub scrape_event: ScrapeFn,
}

impl std::fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("technology", &self.technology)
            .field("rate_limiting", &self.rate_limiting)
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterTechnology {
    Http,
    HeadlessBrowser,
}

/// `"<platform>-<event_id>-<match_id>"`, lowercased (spec.md §6 "wire-level
/// contract across all adapters").
pub fn match_key(platform: &str, event_id: &str, match_id: &str) -> String {
    format!("{platform}-{event_id}-{match_id}").to_lowercase()
}
