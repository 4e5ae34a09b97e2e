use matchcore_db::QueryError;
use matchcore_fetch::{FetchError, PageStreamError};
use miette::Diagnostic;
use thiserror::Error;

/// A single event failed. Recorded in the checkpoint and in the run summary;
/// never aborts the run (spec.md §7 "the engine surfaces per-event failures
/// and continues").
#[derive(Debug, Error, Diagnostic)]
pub enum EventError {
    #[error("fetching event data")]
    Fetch(#[from] FetchError),

    #[error("paging through event data")]
    Paging(#[from] PageStreamError),

    #[error("event page did not match the expected shape")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Db(#[from] QueryError),

    #[error("event timed out")]
    TimedOut,

    #[error("run cancelled")]
    Cancelled,

    #[error("scraper task panicked: {0}")]
    TaskPanicked(String),
}

/// Errors that abort an entire scraper/promotion/rebuild run rather than
/// being quarantined to one event or row (spec.md §7 `Fatal`).
#[derive(Debug, Error, Diagnostic)]
pub enum FatalError {
    #[error("database unreachable")]
    DbUnreachable(#[source] diesel::ConnectionError),

    #[error(transparent)]
    Db(#[from] QueryError),

    #[error("database connection pool exhausted or misconfigured")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("couldn't write checkpoint file")]
    Checkpoint(#[source] std::io::Error),

    #[error("couldn't spawn task")]
    Join(#[source] tokio::task::JoinError),

    #[error(transparent)]
    WriteProtectionDenied(#[from] matchcore_db::gate::WriteProtectionDenied),
}

/// Why a staging row was quarantined instead of promoted (spec.md §4.5 step
/// 4, §7 `ValidationReject`). Never retried; the row stays `processed=true`
/// with this recorded as `error_message`.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum PromotionRejection {
    #[error("home or away team could not be resolved")]
    TeamUnresolved,

    #[error("home and away team are the same team")]
    SelfMatch,

    #[error("missing match_date")]
    MissingDate,

    #[error("match_date outside the configured data policy window")]
    DateOutOfRange,

    #[error("home/away birth years differ by more than one year")]
    BirthYearMismatch,

    #[error("home/away genders differ")]
    GenderMismatch,

    #[error("standing has no event_id, or its event could not be resolved to a league")]
    StandingUnlinked,
}

impl PromotionRejection {
    pub fn message(&self) -> String {
        self.to_string()
    }
}
