use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::MdbListClient;
use crate::error::SourceError;
use crate::http;

pub const DEFAULT_TOP_MOVIES_URL: &str = "https://mdblist.com/lists/garycrawfordgc/top-movies-of-the-week/json";
pub const DEFAULT_LATEST_SHOWS_URL: &str = "https://mdblist.com/lists/garycrawfordgc/latest-tv-shows/json";
pub const LATEST_SHOWS_LIMIT: usize = 10;

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of an MDBList JSON list. `mediatype` is `movie` or `show`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MdbListItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub tvdbid: Option<i64>,
    #[serde(default)]
    pub tmdbid: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub imdb_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mediatype: String,
    #[serde(default)]
    pub release_year: i32,
}

impl MdbListItem {
    pub fn is_movie(&self) -> bool {
        self.mediatype.eq_ignore_ascii_case("movie")
    }

    pub fn tvdb_id(&self) -> i64 {
        self.tvdbid.unwrap_or(0)
    }
}

impl MdbListClient {
    /// Fetches any public list URL. No api key is needed.
    pub async fn list(&self, url: &str) -> Result<Vec<MdbListItem>, SourceError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SourceError::InvalidUrl(url.to_string()));
        }
        debug!("[mdblist] GET list {}", url);
        http::get_json("mdblist", &self.retry, &self.limiter, move || async move {
            Ok(self.lists_http.get(url))
        })
        .await
    }

    pub async fn top_movies(&self) -> Result<Vec<MdbListItem>, SourceError> {
        self.list(&self.top_movies_url).await
    }

    pub async fn latest_shows(&self) -> Result<Vec<MdbListItem>, SourceError> {
        let mut shows = self.list(&self.latest_shows_url).await?;
        shows.truncate(LATEST_SHOWS_LIMIT);
        Ok(shows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use crate::mdblist::MdbListRatingsConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MdbListClient {
        MdbListClient::new(MdbListRatingsConfig::default())
            .with_list_urls(
                &format!("{}/movies/json", server.uri()),
                &format!("{}/shows/json", server.uri()),
            )
            .with_retry_policy(RetryPolicy::immediate(2))
    }

    #[tokio::test]
    async fn test_latest_shows_truncated() {
        let server = MockServer::start().await;
        let shows: Vec<_> = (1..=15)
            .map(|i| json!({"id": i, "rank": i, "title": format!("Show {i}"), "tvdbid": i * 100,
                            "imdb_id": format!("tt{i}"), "mediatype": "show", "release_year": 2020}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/shows/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(shows)))
            .mount(&server)
            .await;

        let items = client(&server).latest_shows().await.unwrap();
        assert_eq!(items.len(), LATEST_SHOWS_LIMIT);
        assert_eq!(items[0].tvdb_id(), 100);
        assert!(!items[0].is_movie());
    }

    #[tokio::test]
    async fn test_list_tolerates_nulls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "rank": 1, "title": "Nosferatu", "tvdbid": null, "imdb_id": null, "mediatype": "movie", "release_year": 1922}
            ])))
            .mount(&server)
            .await;

        let items = client(&server).top_movies().await.unwrap();
        assert_eq!(items[0].tvdb_id(), 0);
        assert_eq!(items[0].imdb_id, "");
        assert!(items[0].is_movie());
    }

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let err = MdbListClient::new(MdbListRatingsConfig::default())
            .list("ftp://example.com/list")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidUrl(_)));
    }
}
