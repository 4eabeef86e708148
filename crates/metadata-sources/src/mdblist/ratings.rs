use std::collections::HashMap;
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use metadata_models::{MediaType, Rating};
use serde::Deserialize;
use tracing::{debug, info};

use super::MdbListClient;
use crate::error::SourceError;
use crate::http;

#[derive(Debug, Clone, PartialEq)]
pub struct MdbListRatingsConfig {
    pub enabled: bool,
    pub api_key: String,
    pub enabled_ratings: Vec<String>,
    pub cache_ttl: Duration,
}

impl Default for MdbListRatingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            enabled_ratings: Vec::new(),
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl MdbListRatingsConfig {
    fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    fn allows(&self, source: &str) -> bool {
        self.enabled_ratings.iter().any(|s| s.eq_ignore_ascii_case(source))
    }
}

/// Settings plus the in-memory ratings memo they guard.
pub struct RatingsMemo {
    pub(super) config: MdbListRatingsConfig,
    pub(super) entries: HashMap<String, (Vec<Rating>, Instant)>,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    ratings: Vec<RatingEntry>,
}

#[derive(Debug, Deserialize)]
struct RatingEntry {
    #[serde(default)]
    source: String,
    #[serde(default)]
    value: Option<f64>,
}

/// MDBList calls the RT audience score `popcorn`.
pub fn normalize_rating_source(source: &str) -> String {
    match source.trim().to_lowercase().as_str() {
        "popcorn" => "audience".to_string(),
        other => other.to_string(),
    }
}

/// Top of each source's scale; unknown sources are assumed out of 10.
pub fn rating_max(source: &str) -> f64 {
    match source {
        "imdb" | "tmdb" | "trakt" => 10.0,
        "letterboxd" => 5.0,
        "tomatoes" | "audience" | "popcorn" | "metacritic" => 100.0,
        _ => 10.0,
    }
}

impl MdbListClient {
    fn read_settings(&self) -> RwLockReadGuard<'_, RatingsMemo> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_settings(&self) -> RwLockWriteGuard<'_, RatingsMemo> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.read_settings().config.is_active()
    }

    /// Swaps settings in place. The memo is dropped when the key or the enabled flag changes.
    pub fn update_settings(&self, config: MdbListRatingsConfig) {
        let mut settings = self.write_settings();
        if settings.config.api_key != config.api_key || settings.config.enabled != config.enabled {
            settings.entries.clear();
        }
        settings.config = config;
    }

    /// Ratings for an IMDB id, restricted to enabled sources. Empty when disabled.
    pub async fn ratings(&self, imdb_id: &str, media_type: MediaType) -> Result<Vec<Rating>, SourceError> {
        let imdb_id = imdb_id.trim();
        let config = self.read_settings().config.clone();
        if !config.is_active() || imdb_id.is_empty() || config.enabled_ratings.is_empty() {
            return Ok(Vec::new());
        }

        let imdb_id = if imdb_id.starts_with("tt") {
            imdb_id.to_string()
        } else {
            format!("tt{}", imdb_id)
        };
        let segment = media_type.mdblist_segment();
        let memo_key = format!("{}:{}", segment, imdb_id);

        let memoised = self
            .read_settings()
            .entries
            .get(&memo_key)
            .filter(|(_, fetched_at)| fetched_at.elapsed() < config.cache_ttl)
            .map(|(ratings, _)| ratings.clone());
        if let Some(ratings) = memoised {
            debug!("[mdblist] ratings memo hit for {}", memo_key);
            return Ok(ratings);
        }

        let url = format!("{}/imdb/{}/{}", self.api_base_url, segment, urlencoding::encode(&imdb_id));
        let url = url.as_str();
        let api_key = config.api_key.as_str();
        let response: MediaResponse = http::get_json("mdblist", &self.retry, &self.limiter, move || async move {
            Ok(self.ratings_http.get(url).query(&[("apikey", api_key)]))
        })
        .await?;

        let ratings: Vec<Rating> = response
            .ratings
            .into_iter()
            .filter_map(|entry| {
                let value = entry.value.filter(|v| *v != 0.0)?;
                let source = normalize_rating_source(&entry.source);
                if !config.allows(&source) {
                    return None;
                }
                Some(Rating {
                    max: rating_max(&source),
                    source,
                    value,
                })
            })
            .collect();

        info!("[mdblist] fetched {} ratings for {} {}", ratings.len(), segment, imdb_id);
        self.write_settings()
            .entries
            .insert(memo_key, (ratings.clone(), Instant::now()));
        Ok(ratings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(key: &str) -> MdbListRatingsConfig {
        MdbListRatingsConfig {
            enabled: true,
            api_key: key.to_string(),
            enabled_ratings: vec!["imdb".to_string(), "audience".to_string(), "letterboxd".to_string()],
            ..MdbListRatingsConfig::default()
        }
    }

    async fn mount_ratings(server: &MockServer, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/imdb/movie/tt0133093"))
            .and(query_param("apikey", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ratings": [
                {"source": "imdb", "value": 8.7},
                {"source": "popcorn", "value": 85},
                {"source": "letterboxd", "value": 4.2},
                {"source": "metacritic", "value": 73},
                {"source": "trakt", "value": null},
                {"source": "tmdb", "value": 0}
            ]})))
            .expect(expected)
            .mount(server)
            .await;
    }

    #[test]
    fn test_source_scales() {
        assert_eq!(normalize_rating_source("Popcorn"), "audience");
        assert_eq!(rating_max("letterboxd"), 5.0);
        assert_eq!(rating_max("metacritic"), 100.0);
        assert_eq!(rating_max("somethingelse"), 10.0);
    }

    #[tokio::test]
    async fn test_ratings_filtered_normalized_and_memoised() {
        let server = MockServer::start().await;
        mount_ratings(&server, 1).await;
        let client = MdbListClient::new(config("k"))
            .with_api_base_url(&server.uri())
            .with_retry_policy(RetryPolicy::immediate(3));

        let ratings = client.ratings("0133093", MediaType::Movie).await.unwrap();
        let sources: Vec<&str> = ratings.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["imdb", "audience", "letterboxd"]);
        assert_eq!(ratings[1].max, 100.0);
        assert_eq!(ratings[2].max, 5.0);

        let again = client.ratings("tt0133093", MediaType::Movie).await.unwrap();
        assert_eq!(again, ratings);
    }

    #[tokio::test]
    async fn test_key_change_drops_memo() {
        let server = MockServer::start().await;
        mount_ratings(&server, 2).await;
        let client = MdbListClient::new(config("k"))
            .with_api_base_url(&server.uri())
            .with_retry_policy(RetryPolicy::immediate(3));

        client.ratings("tt0133093", MediaType::Movie).await.unwrap();
        // Same key: memo survives a settings update.
        client.update_settings(config("k"));
        client.ratings("tt0133093", MediaType::Movie).await.unwrap();
        // Toggle off and back on: memo cleared.
        client.update_settings(MdbListRatingsConfig {
            enabled: false,
            ..config("k")
        });
        assert!(client.ratings("tt0133093", MediaType::Movie).await.unwrap().is_empty());
        client.update_settings(config("k"));
        client.ratings("tt0133093", MediaType::Movie).await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_client_returns_nothing() {
        let client = MdbListClient::new(MdbListRatingsConfig::default());
        assert!(!client.is_enabled());
        assert!(client.ratings("tt1", MediaType::Series).await.unwrap().is_empty());
    }
}
