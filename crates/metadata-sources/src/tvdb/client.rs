use std::collections::HashMap;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{
    Alias, Artwork, BaseRecord, Envelope, Episode, EpisodePage, LoginData, MovieExtended, SearchResult,
    SeriesExtended, Translation,
};
use crate::error::SourceError;
use crate::http::{self, RateLimiter, RetryPolicy};
use crate::language::{accept_language, tvdb_language};

pub const DEFAULT_TVDB_BASE_URL: &str = "https://api4.thetvdb.com/v4";

const MIN_INTERVAL: Duration = Duration::from_millis(20);
const TOKEN_LIFETIME_HOURS: i64 = 23;
const TOKEN_SAFETY_MARGIN_MINUTES: i64 = 1;
const MAX_EPISODE_PAGES: u32 = 100;

struct BearerToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && now < self.expires_at - chrono::Duration::minutes(TOKEN_SAFETY_MARGIN_MINUTES)
    }
}

/// TVDB v4 client. Authenticates with a bearer token obtained from `/login`.
pub struct TvdbClient {
    http: Client,
    api_key: String,
    language: String,
    accept_language: String,
    base_url: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
    token: Mutex<Option<BearerToken>>,
    // Negative results are kept too, so a missing translation is asked for once.
    episode_translations: StdMutex<HashMap<String, Option<Translation>>>,
}

impl TvdbClient {
    pub fn new(api_key: &str, language: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key: api_key.trim().to_string(),
            language: tvdb_language(language),
            accept_language: accept_language(language),
            base_url: DEFAULT_TVDB_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            limiter: RateLimiter::new(MIN_INTERVAL),
            token: Mutex::new(None),
            episode_translations: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Three-letter language used for translation lookups.
    pub fn language(&self) -> &str {
        &self.language
    }

    async fn token(&self) -> Result<String, SourceError> {
        let mut guard = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        debug!("[tvdb] requesting bearer token");
        let request = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&serde_json::json!({ "apikey": self.api_key }));
        let login: Envelope<LoginData> = http::fetch_once(request).await.map_err(|e| match e {
            SourceError::Status { status: 401 | 403, body, .. } => {
                SourceError::Auth(format!("tvdb login rejected: {}", body))
            }
            other => other,
        })?;

        if login.data.token.trim().is_empty() {
            return Err(SourceError::Auth("tvdb login returned an empty token".to_string()));
        }

        info!("[tvdb] obtained bearer token");
        let value = login.data.token;
        *guard = Some(BearerToken {
            value: value.clone(),
            expires_at: now + chrono::Duration::hours(TOKEN_LIFETIME_HOURS),
        });
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::NotConfigured("tvdb"));
        }
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        debug!("[tvdb] GET {} acceptLanguage={:?}", path, self.accept_language);

        http::get_json("tvdb", &self.retry, &self.limiter, move || async move {
            let token = self.token().await?;
            let mut builder = self.http.get(url).bearer_auth(token).query(query);
            if !self.accept_language.is_empty() {
                builder = builder.header(ACCEPT_LANGUAGE, self.accept_language.as_str());
            }
            Ok(builder)
        })
        .await
    }

    /// `/search`. `kind` is `series` or `movie`; zero `year` and empty `remote_id` are omitted.
    pub async fn search(
        &self,
        query: &str,
        kind: &str,
        limit: u32,
        year: i32,
        remote_id: &str,
    ) -> Result<Vec<SearchResult>, SourceError> {
        let mut params = vec![
            ("query", query.to_string()),
            ("type", kind.to_string()),
            ("limit", limit.to_string()),
        ];
        if year > 0 {
            params.push(("year", year.to_string()));
        }
        if !remote_id.trim().is_empty() {
            params.push(("remote_id", remote_id.trim().to_string()));
        }
        let response: Envelope<Option<Vec<SearchResult>>> = self.get("/search", &params).await?;
        Ok(response.data.unwrap_or_default())
    }

    pub async fn series(&self, id: i64) -> Result<BaseRecord, SourceError> {
        let response: Envelope<BaseRecord> = self.get(&format!("/series/{}", id), &[]).await?;
        Ok(response.data)
    }

    pub async fn movie(&self, id: i64) -> Result<BaseRecord, SourceError> {
        let response: Envelope<BaseRecord> = self.get(&format!("/movies/{}", id), &[]).await?;
        Ok(response.data)
    }

    pub async fn series_extended(&self, id: i64, meta: &[&str]) -> Result<SeriesExtended, SourceError> {
        let params = meta_param(meta);
        let response: Envelope<SeriesExtended> = self.get(&format!("/series/{}/extended", id), &params).await?;
        Ok(response.data)
    }

    pub async fn movie_extended(&self, id: i64, meta: &[&str]) -> Result<MovieExtended, SourceError> {
        let params = meta_param(meta);
        let response: Envelope<MovieExtended> = self.get(&format!("/movies/{}/extended", id), &params).await?;
        Ok(response.data)
    }

    pub async fn series_artworks(&self, id: i64) -> Result<Vec<Artwork>, SourceError> {
        let response: Envelope<Option<Vec<Artwork>>> = self.get(&format!("/series/{}/artworks", id), &[]).await?;
        Ok(response.data.unwrap_or_default())
    }

    /// Movies have no artworks endpoint; the list comes from the extended record.
    pub async fn movie_artworks(&self, id: i64) -> Result<Vec<Artwork>, SourceError> {
        Ok(self.movie_extended(id, &["artwork"]).await?.artworks)
    }

    pub async fn series_aliases(&self, id: i64) -> Result<Vec<Alias>, SourceError> {
        Ok(self.series(id).await?.aliases)
    }

    pub async fn movie_aliases(&self, id: i64) -> Result<Vec<Alias>, SourceError> {
        Ok(self.movie(id).await?.aliases)
    }

    pub async fn series_translation(&self, id: i64, lang: &str) -> Result<Translation, SourceError> {
        let response: Envelope<Translation> =
            self.get(&format!("/series/{}/translations/{}", id, lang), &[]).await?;
        Ok(response.data)
    }

    pub async fn movie_translation(&self, id: i64, lang: &str) -> Result<Translation, SourceError> {
        let response: Envelope<Translation> =
            self.get(&format!("/movies/{}/translations/{}", id, lang), &[]).await?;
        Ok(response.data)
    }

    /// All episodes of a series for one season ordering, following `links.next`.
    pub async fn series_episodes(&self, id: i64, season_type: &str, lang: &str) -> Result<Vec<Episode>, SourceError> {
        let season_type = match season_type.trim().to_lowercase() {
            s if s.is_empty() => "official".to_string(),
            s => s,
        };
        let lang = tvdb_language(lang);
        let path = format!("/series/{}/episodes/{}/{}", id, season_type, lang);

        let mut episodes = Vec::new();
        for page in 0..MAX_EPISODE_PAGES {
            let response: EpisodePage = self.get(&path, &[("page", page.to_string())]).await?;
            episodes.extend(response.data.episodes);
            let has_next = response
                .links
                .next
                .as_deref()
                .map(|next| !next.trim().is_empty())
                .unwrap_or(false);
            if !has_next {
                return Ok(episodes);
            }
        }
        warn!(
            "[tvdb] series {} episodes still paginating after {} pages, truncating",
            id, MAX_EPISODE_PAGES
        );
        Ok(episodes)
    }

    /// Episode translation, memoised per client. `Ok(None)` when TVDB has nothing useful.
    pub async fn episode_translation(&self, id: i64, lang: &str) -> Result<Option<Translation>, SourceError> {
        let lang = if lang.trim().is_empty() { "eng" } else { lang.trim() };
        let key = format!("{}:{}", id, lang);
        let cached = self.memo().get(&key).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let result: Result<Envelope<Translation>, SourceError> =
            self.get(&format!("/episodes/{}/translations/{}", id, lang), &[]).await;
        match result {
            Ok(response) => {
                let translation = Some(response.data).filter(|t| !t.is_blank());
                self.memo().insert(key, translation.clone());
                Ok(translation)
            }
            Err(e) => {
                self.memo().insert(key, None);
                Err(e)
            }
        }
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<Translation>>> {
        self.episode_translations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn meta_param(meta: &[&str]) -> Vec<(&'static str, String)> {
    if meta.is_empty() {
        Vec::new()
    } else {
        vec![("meta", meta.join(","))]
    }
}
