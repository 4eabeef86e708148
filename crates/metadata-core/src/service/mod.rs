//! `MetadataService`: the aggregation layer over TVDB, TMDB and MDBList.
//!
//! Each family of operations lives in its own submodule. Clients are held
//! behind a lock so API keys can be swapped at runtime; the swap and the
//! cache wipe happen under the same write guard.

mod lists;
mod movies;
mod search;
mod series;
mod trailers;
mod trending;


use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use metadata_config::{MdbListSettings, PathManager, Settings};
use metadata_models::{Credits, MediaType, Release, Title};
use metadata_sources::mdblist::{DEFAULT_LATEST_SHOWS_URL, DEFAULT_MDBLIST_API_URL, DEFAULT_TOP_MOVIES_URL};
use metadata_sources::tmdb::DEFAULT_TMDB_BASE_URL;
use metadata_sources::tvdb::DEFAULT_TVDB_BASE_URL;
use metadata_sources::{MdbListClient, MdbListRatingsConfig, RetryPolicy, TmdbClient, TvdbClient};
use tokio::sync::{RwLock, RwLockReadGuard, Semaphore};
use tracing::{debug, info, warn};

use crate::cache::{cache_key, FileCache};
use crate::error::Result;
use crate::ids::normalize_imdb_id;
use crate::releases::refresh_release_state;
use crate::single_flight::SingleFlight;

/// Upper bound on concurrent upstream calls within one request.
pub(crate) const MAX_CONCURRENT: usize = 5;

const ID_CACHE_TTL_MULTIPLIER: u64 = 7;

/// Upstream base URLs. Tests point these at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub tvdb: String,
    pub tmdb: String,
    pub mdblist_api: String,
    pub mdblist_top_movies: String,
    pub mdblist_latest_shows: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            tvdb: DEFAULT_TVDB_BASE_URL.to_string(),
            tmdb: DEFAULT_TMDB_BASE_URL.to_string(),
            mdblist_api: DEFAULT_MDBLIST_API_URL.to_string(),
            mdblist_top_movies: DEFAULT_TOP_MOVIES_URL.to_string(),
            mdblist_latest_shows: DEFAULT_LATEST_SHOWS_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every upstream under one base URL, at the paths the mock server expects.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            tvdb: format!("{}/tvdb", base),
            tmdb: format!("{}/tmdb", base),
            mdblist_api: format!("{}/mdblist", base),
            mdblist_top_movies: format!("{}/lists/top-movies/json", base),
            mdblist_latest_shows: format!("{}/lists/latest-shows/json", base),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub tvdb_api_key: String,
    pub tmdb_api_key: String,
    pub language: String,
    pub cache_dir: PathBuf,
    pub id_cache_dir: PathBuf,
    pub ttl_hours: u64,
    pub demo_mode: bool,
    pub mdblist: MdbListRatingsConfig,
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings, paths: &PathManager) -> Self {
        let paths = match &settings.cache.directory {
            Some(dir) => paths.clone().with_cache_dir(dir),
            None => paths.clone(),
        };
        Self {
            tvdb_api_key: settings.metadata.tvdb_api_key.clone(),
            tmdb_api_key: settings.metadata.tmdb_api_key.clone(),
            language: settings.metadata.language.clone(),
            cache_dir: paths.metadata_cache_dir(),
            id_cache_dir: paths.id_cache_dir(),
            ttl_hours: settings.cache.metadata_ttl_hours,
            demo_mode: settings.metadata.demo_mode,
            mdblist: ratings_config(&settings.mdblist),
            endpoints: Endpoints::default(),
            retry: RetryPolicy::default(),
        }
    }
}

pub fn ratings_config(settings: &MdbListSettings) -> MdbListRatingsConfig {
    MdbListRatingsConfig {
        enabled: settings.enabled,
        api_key: settings.api_key.trim().to_string(),
        enabled_ratings: settings.enabled_ratings.clone(),
        cache_ttl: Duration::from_secs(settings.cache_ttl_hours.max(1).saturating_mul(3600)),
    }
}

struct Clients {
    tvdb: Arc<TvdbClient>,
    tmdb: Arc<TmdbClient>,
}

impl Clients {
    fn build(tvdb_key: &str, tmdb_key: &str, language: &str, endpoints: &Endpoints, retry: RetryPolicy) -> Self {
        Self {
            tvdb: Arc::new(
                TvdbClient::new(tvdb_key, language)
                    .with_base_url(&endpoints.tvdb)
                    .with_retry_policy(retry),
            ),
            tmdb: Arc::new(
                TmdbClient::new(tmdb_key, language)
                    .with_base_url(&endpoints.tmdb)
                    .with_retry_policy(retry),
            ),
        }
    }
}

pub struct MetadataService {
    clients: RwLock<Clients>,
    // Shared by running operations, exclusive for key swaps and cache wipes.
    requests: RwLock<()>,
    mdblist: Arc<MdbListClient>,
    cache: FileCache,
    // Stable id mappings (TMDB <-> IMDB) with a longer TTL.
    id_cache: FileCache,
    demo: AtomicBool,
    endpoints: Endpoints,
    retry: RetryPolicy,
    series_ids: SingleFlight<Result<i64>>,
}

impl MetadataService {
    pub fn new(options: ServiceOptions) -> Self {
        let clients = Clients::build(
            &options.tvdb_api_key,
            &options.tmdb_api_key,
            &options.language,
            &options.endpoints,
            options.retry,
        );
        let mdblist = MdbListClient::new(options.mdblist)
            .with_api_base_url(&options.endpoints.mdblist_api)
            .with_list_urls(
                &options.endpoints.mdblist_top_movies,
                &options.endpoints.mdblist_latest_shows,
            )
            .with_retry_policy(options.retry);

        Self {
            clients: RwLock::new(clients),
            requests: RwLock::new(()),
            mdblist: Arc::new(mdblist),
            cache: FileCache::with_ttl_hours(&options.cache_dir, options.ttl_hours),
            id_cache: FileCache::with_ttl_hours(
                &options.id_cache_dir,
                options.ttl_hours.saturating_mul(ID_CACHE_TTL_MULTIPLIER),
            ),
            demo: AtomicBool::new(options.demo_mode),
            endpoints: options.endpoints,
            retry: options.retry,
            series_ids: SingleFlight::new(),
        }
    }

    pub fn from_settings(settings: &Settings, paths: &PathManager) -> Self {
        Self::new(ServiceOptions::from_settings(settings, paths))
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn id_cache(&self) -> &FileCache {
        &self.id_cache
    }

    pub fn is_demo(&self) -> bool {
        self.demo.load(Ordering::Relaxed)
    }

    pub fn set_demo_mode(&self, enabled: bool) {
        self.demo.store(enabled, Ordering::Relaxed);
    }

    /// Held for the whole of an operation that may write to the caches.
    pub(crate) async fn lease(&self) -> RwLockReadGuard<'_, ()> {
        self.requests.read().await
    }

    pub(crate) async fn tvdb(&self) -> Arc<TvdbClient> {
        Arc::clone(&self.clients.read().await.tvdb)
    }

    pub(crate) async fn tmdb(&self) -> Arc<TmdbClient> {
        Arc::clone(&self.clients.read().await.tmdb)
    }

    pub(crate) fn mdblist(&self) -> &MdbListClient {
        &self.mdblist
    }

    /// Replaces both catalog clients and wipes every cached entry.
    ///
    /// Waits for running operations to finish first, so nothing fetched with
    /// the old keys can be stored after the wipe. The cache is cleared while
    /// the write guard is held, so no reader can pair the new clients with
    /// data fetched under the old keys.
    pub async fn update_api_keys(&self, tvdb_api_key: &str, tmdb_api_key: &str, language: &str) {
        let _exclusive = self.requests.write().await;
        let mut clients = self.clients.write().await;
        *clients = Clients::build(tvdb_api_key, tmdb_api_key, language, &self.endpoints, self.retry);

        match self.cache.clear().await {
            Ok(()) => info!("[metadata] cleared metadata cache due to API key change"),
            Err(e) => warn!("[metadata] failed to clear cache: {}", e),
        }
        if let Err(e) = self.id_cache.clear().await {
            warn!("[metadata] failed to clear ID cache: {}", e);
        }
    }

    pub fn update_mdblist_settings(&self, settings: &MdbListSettings) {
        self.mdblist.update_settings(ratings_config(settings));
        info!(
            "[metadata] updated MDBList settings (enabled={}, ratings={:?})",
            settings.enabled, settings.enabled_ratings
        );
    }

    pub async fn clear_cache(&self) -> Result<()> {
        let _exclusive = self.requests.write().await;
        self.cache.clear().await?;
        self.id_cache.clear().await?;
        Ok(())
    }

    /// IMDB id for a TMDB id through the id-mapping cache. Empty answers are cached as well.
    pub(crate) async fn imdb_for_tmdb(&self, tmdb: &TmdbClient, media_type: MediaType, tmdb_id: i64) -> String {
        if tmdb_id <= 0 {
            return String::new();
        }
        let id = tmdb_id.to_string();
        let key = cache_key(&["id", "tmdb-to-imdb", media_type.tmdb_segment(), &id]);
        if let Some(cached) = self.id_cache.lookup::<String>(&key).await {
            return cached;
        }

        match tmdb.imdb_id(media_type, tmdb_id).await {
            Ok(imdb_id) => {
                self.id_cache.store(&key, &imdb_id).await;
                imdb_id
            }
            Err(e) => {
                warn!(
                    "[metadata] failed to fetch IMDB ID for TMDB {}/{}: {}",
                    media_type.tmdb_segment(),
                    tmdb_id,
                    e
                );
                String::new()
            }
        }
    }

    /// TMDB movie id for an IMDB id through the id-mapping cache, 0 when unknown.
    pub(crate) async fn tmdb_for_imdb(&self, tmdb: &TmdbClient, imdb_id: &str) -> i64 {
        let imdb_id = normalize_imdb_id(imdb_id);
        if imdb_id.is_empty() {
            return 0;
        }
        let key = cache_key(&["id", "imdb-to-tmdb", "movie", &imdb_id]);
        if let Some(cached) = self.id_cache.lookup::<i64>(&key).await {
            return cached;
        }

        match tmdb.find_movie_by_imdb(&imdb_id).await {
            Ok(found) => {
                let tmdb_id = found.unwrap_or(0);
                self.id_cache.store(&key, &tmdb_id).await;
                tmdb_id
            }
            Err(e) => {
                warn!("[metadata] failed to fetch TMDB ID for IMDB {}: {}", imdb_id, e);
                0
            }
        }
    }

    /// Release dates for a TMDB movie, from cache when possible.
    pub(crate) async fn movie_releases(&self, tmdb: &TmdbClient, tmdb_id: i64) -> Option<Vec<Release>> {
        if tmdb_id <= 0 || !tmdb.is_configured() {
            return None;
        }
        let key = cache_key(&["tmdb", "movie", "releases", "v1", &tmdb_id.to_string()]);
        if let Some(cached) = self.cache.lookup::<Vec<Release>>(&key).await {
            if !cached.is_empty() {
                return Some(cached);
            }
        }

        match tmdb.release_dates(tmdb_id).await {
            Ok(releases) if !releases.is_empty() => {
                self.cache.store(&key, &releases).await;
                Some(releases)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("[metadata] tmdb release dates fetch failed tmdbId={} err={}", tmdb_id, e);
                None
            }
        }
    }

    /// Fills `releases` and the primary windows. False when nothing was found.
    pub(crate) async fn enrich_movie_releases(&self, tmdb: &TmdbClient, title: &mut Title, tmdb_id: i64) -> bool {
        let Some(releases) = self.movie_releases(tmdb, tmdb_id).await else {
            return false;
        };
        title.releases = releases;
        refresh_release_state(title, Utc::now());
        true
    }

    /// Fills missing poster, backdrop, IMDB id, name and year from TMDB `/movie/{id}`.
    pub(crate) async fn hydrate_movie_artwork(&self, tmdb: &TmdbClient, title: &mut Title, tmdb_id: i64) -> bool {
        let tmdb_id = if tmdb_id > 0 { tmdb_id } else { title.tmdb_id };
        if tmdb_id <= 0 || !tmdb.is_configured() {
            return false;
        }

        debug!("[metadata] fetching movie images from TMDB as fallback tmdbId={}", tmdb_id);
        let movie = match tmdb.movie_details(tmdb_id).await {
            Ok(movie) => movie,
            Err(e) => {
                warn!("[metadata] TMDB fallback failed for movie tmdbId={} err={}", tmdb_id, e);
                return false;
            }
        };

        let mut updated = false;
        if title.poster.is_none() && movie.poster.is_some() {
            title.poster = movie.poster;
            updated = true;
        }
        if title.backdrop.is_none() && movie.backdrop.is_some() {
            title.backdrop = movie.backdrop;
            updated = true;
        }
        if title.imdb_id.is_empty() && !movie.imdb_id.is_empty() {
            title.imdb_id = movie.imdb_id;
            updated = true;
        }
        if title.name.is_empty() && !movie.name.is_empty() {
            title.name = movie.name;
            updated = true;
        }
        if title.year == 0 && movie.year > 0 {
            title.year = movie.year;
            updated = true;
        }
        updated
    }

    /// TMDB cast, `None` when unavailable. Failures are logged.
    pub(crate) async fn fetch_credits(&self, tmdb: &TmdbClient, media_type: MediaType, tmdb_id: i64) -> Option<Credits> {
        if tmdb_id <= 0 || !tmdb.is_configured() {
            return None;
        }
        match tmdb.credits(media_type, tmdb_id).await {
            Ok(credits) if !credits.is_empty() => {
                debug!(
                    "[metadata] fetched {} cast members for {} tmdbId={}",
                    credits.cast.len(),
                    media_type.as_str(),
                    tmdb_id
                );
                Some(credits)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "[metadata] failed to fetch credits for {} tmdbId={}: {}",
                    media_type.as_str(),
                    tmdb_id,
                    e
                );
                None
            }
        }
    }

    /// MDBList ratings, empty when disabled or on failure.
    pub(crate) async fn fetch_ratings(&self, title: &mut Title) {
        if title.imdb_id.is_empty() || !self.mdblist.is_enabled() {
            return;
        }
        match self.mdblist.ratings(&title.imdb_id, title.media_type).await {
            Ok(ratings) => title.ratings = ratings,
            Err(e) => warn!("[metadata] ratings fetch failed imdbId={} err={}", title.imdb_id, e),
        }
    }
}

/// Runs `f` over every item with at most [`MAX_CONCURRENT`] in flight, keeping input order.
pub(crate) async fn bounded<I, T, F, Fut>(items: I, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let semaphore = Semaphore::new(MAX_CONCURRENT);
    let semaphore = &semaphore;
    let f = &f;
    join_all(items.into_iter().map(|item| async move {
        // Never closed.
        let _permit = semaphore.acquire().await.ok();
        f(item).await
    }))
    .await
}

/// First argument that is non-empty after trimming.
pub(crate) fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}
