use miette::Diagnostic;
use thiserror::Error;

/// Everything that can go wrong issuing a single logical fetch, after the
/// retry ladder has been exhausted. A [`FetchError`] never escapes a retryable
/// situation on its own -- it's what [`crate::Fetcher::fetch_json`] returns once
/// it gives up.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("error building request")]
    RequestBuild(#[source] reqwest::Error),

    #[error("error executing request")]
    RequestExecute(#[source] reqwest::Error),

    #[error("server returned an error status")]
    Status(#[source] reqwest::Error),

    #[error("error reading response body")]
    Body(#[source] reqwest::Error),

    #[error("error deserializing response body")]
    Deserialize(#[source] serde_json::Error),

    #[error("retry ladder exhausted after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },

    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, Error, Diagnostic)]
pub enum PageStreamError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("background fetch task exited abnormally")]
    JoinFailure(#[source] tokio::task::JoinError),
}
