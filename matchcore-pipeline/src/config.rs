use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::num::NonZero;

/// Per-adapter concurrency and batching knobs that don't belong on the
/// adapter descriptor itself (spec.md §5 "two nested semaphores").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScraperConfig {
    pub event_concurrency: NonZero<usize>,
    pub sub_request_concurrency: NonZero<usize>,
    pub staging_insert_batch_size: usize,
    pub per_event_timeout_secs: u64,
    pub per_request_timeout_secs: u64,
    pub checkpoint_dir: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            event_concurrency: NonZero::new(5).unwrap(),
            sub_request_concurrency: NonZero::new(3).unwrap(),
            staging_insert_batch_size: 500,
            per_event_timeout_secs: 600,
            per_request_timeout_secs: 30,
            checkpoint_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PromotionConfig {
    pub batch_size: i64,
    pub max_iterations: Option<u32>,
    pub trigram_similarity_threshold: f64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_iterations: None,
            trigram_similarity_threshold: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataPolicyConfig {
    pub min_date: chrono::NaiveDate,
    pub max_future_days: i64,
    pub max_events_per_run: usize,
}

impl Default for DataPolicyConfig {
    fn default() -> Self {
        Self {
            min_date: chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            max_future_days: 365,
            max_events_per_run: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub db_pool_size: u32,
    pub scraper: ScraperConfig,
    pub promotion: PromotionConfig,
    pub data_policy: DataPolicyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_pool_size: 20,
            scraper: ScraperConfig::default(),
            promotion: PromotionConfig::default(),
            data_policy: DataPolicyConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("MATCHCORE.toml"))
            .merge(Env::prefixed("MATCHCORE_"))
    }

    pub fn load() -> figment::Result<Self> {
        Self::figment().extract()
    }
}
