use crate::error::FetchError;
use crate::rate::{RateController, RetryLadder};
use log::{debug, warn};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use std::num::NonZero;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A fetcher shared by one [`crate::RateController`] (and therefore one
/// scraper run). Adapters obtain one of these from the Scraper Engine rather
/// than building their own `reqwest::Client`, so rate limiting and UA
/// rotation apply uniformly regardless of which adapter is driving.
///
/// `sub_request_limiter` bounds concurrent sub-requests (spec.md §4.2 step 2
/// / §5 "bounded sub-request concurrency per event") separately from the
/// Scraper Engine's own event-level semaphore -- each request made through
/// this fetcher acquires a permit before it sleeps for its backoff slot.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    user_agents: Arc<Vec<String>>,
    retry_ladder: Arc<RetryLadder>,
    rate: Arc<RateController>,
    sub_request_limiter: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(
        user_agents: Vec<String>,
        retry_ladder: RetryLadder,
        rate: Arc<RateController>,
        request_timeout: Duration,
        sub_request_concurrency: NonZero<usize>,
    ) -> Self {
        assert!(
            !user_agents.is_empty(),
            "a source adapter must declare at least one user agent"
        );
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("reqwest client configuration is static and known-valid");
        Self {
            client,
            user_agents: Arc::new(user_agents),
            retry_ladder: Arc::new(retry_ladder),
            rate,
            sub_request_limiter: Arc::new(Semaphore::new(sub_request_concurrency.get())),
        }
    }

    /// A fetcher sharing this one's client, UA list, retry ladder, and
    /// (crucially) its [`RateController`] -- the reactive backoff state must
    /// stay shared across every request of the run -- but with its own fresh
    /// sub-request semaphore. The Scraper Engine calls this once per event so
    /// the per-event sub-request bound (spec.md §5) is independent of every
    /// other event's, the same way the event-level semaphore is independent
    /// of the run's other concurrency bound.
    pub fn for_event(&self, sub_request_concurrency: NonZero<usize>) -> Self {
        Self {
            client: self.client.clone(),
            user_agents: self.user_agents.clone(),
            retry_ladder: self.retry_ladder.clone(),
            rate: self.rate.clone(),
            sub_request_limiter: Arc::new(Semaphore::new(sub_request_concurrency.get())),
        }
    }

    fn random_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .expect("checked non-empty in new()")
    }

    /// Fetch and deserialize a single JSON resource, honoring the shared
    /// reactive backoff and retrying on transient network errors or 5xx
    /// responses per the retry ladder. A 429 is not retried against the
    /// ladder budget -- it just widens the shared backoff and is retried
    /// once the caller's next request naturally waits longer.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let _permit = self
            .sub_request_limiter
            .acquire()
            .await
            .expect("sub_request_limiter is never closed");

        let mut attempt = 0u32;
        loop {
            tokio::time::sleep(self.rate.current_backoff()).await;

            let request = self
                .client
                .get(url)
                .query(query)
                .header(reqwest::header::USER_AGENT, self.random_user_agent())
                .build()
                .map_err(FetchError::RequestBuild)?;

            let response = match self.client.execute(request).await {
                Ok(response) => response,
                Err(err) => {
                    if err.is_timeout() && attempt >= self.rate.max_retries() {
                        return Err(FetchError::Timeout);
                    }
                    if attempt >= self.rate.max_retries() {
                        return Err(FetchError::RequestExecute(err));
                    }
                    let delay = self.retry_ladder.delay_for(attempt);
                    warn!("transient network error fetching {url}, retrying in {delay:?}: {err}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
            };

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let delay = self.rate.on_rate_limited();
                debug!("429 from {url}, cooling down for {delay:?}");
                tokio::time::sleep(delay).await;
                continue;
            }

            if response.status().is_server_error() {
                if attempt >= self.rate.max_retries() {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt + 1,
                    });
                }
                let delay = self.rate.on_server_error();
                warn!("server error from {url}, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let response = response.error_for_status().map_err(FetchError::Status)?;
            let body = response.text().await.map_err(FetchError::Body)?;
            let value = serde_json::from_str(&body).map_err(FetchError::Deserialize)?;

            self.rate.on_success();
            return Ok(value);
        }
    }

    pub async fn wait_between_events(&self) {
        tokio::time::sleep(self.rate.between_events_delay()).await;
    }
}
