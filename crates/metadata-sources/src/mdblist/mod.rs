//! MDBList: aggregated ratings keyed by IMDB id, plus curated JSON lists.

mod lists;
mod ratings;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;

use crate::http::{self, RateLimiter, RetryPolicy};

pub use lists::{MdbListItem, DEFAULT_LATEST_SHOWS_URL, DEFAULT_TOP_MOVIES_URL, LATEST_SHOWS_LIMIT};
pub use ratings::{normalize_rating_source, rating_max, MdbListRatingsConfig, RatingsMemo};

pub const DEFAULT_MDBLIST_API_URL: &str = "https://api.mdblist.com";

const MIN_INTERVAL: Duration = Duration::from_millis(100);
const RATINGS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MdbListClient {
    ratings_http: Client,
    lists_http: Client,
    api_base_url: String,
    top_movies_url: String,
    latest_shows_url: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
    settings: RwLock<RatingsMemo>,
}

impl MdbListClient {
    pub fn new(config: MdbListRatingsConfig) -> Self {
        Self {
            ratings_http: http::build_client(RATINGS_TIMEOUT),
            lists_http: http::build_client(http::DEFAULT_TIMEOUT),
            api_base_url: DEFAULT_MDBLIST_API_URL.to_string(),
            top_movies_url: DEFAULT_TOP_MOVIES_URL.to_string(),
            latest_shows_url: DEFAULT_LATEST_SHOWS_URL.to_string(),
            retry: RetryPolicy::default(),
            limiter: RateLimiter::new(MIN_INTERVAL),
            settings: RwLock::new(RatingsMemo {
                config,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_list_urls(mut self, top_movies: &str, latest_shows: &str) -> Self {
        self.top_movies_url = top_movies.to_string();
        self.latest_shows_url = latest_shows.to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
