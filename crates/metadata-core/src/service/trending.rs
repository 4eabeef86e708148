use chrono::{Datelike, Utc};
use metadata_config::TrendingMovieSource;
use metadata_models::{MediaType, Title, TrendingItem};
use metadata_sources::tvdb::SearchResult;
use metadata_sources::{MdbListItem, TmdbClient, TvdbClient};
use tracing::{debug, info, instrument, warn};

use super::{bounded, MetadataService};
use crate::artwork::{apply_tvdb_artworks, normalize_tvdb_image_url, tvdb_image};
use crate::cache::cache_key;
use crate::demo::{demo_slug, demo_trending};
use crate::error::Result;
use crate::ids::{first_imdb_remote_id, tvdb_title_id};
use crate::releases::refresh_list_release_state;

/// Trending media type from loose input. Anything unrecognized means series.
pub fn normalize_trending_type(value: &str) -> MediaType {
    match value.trim().to_lowercase().as_str() {
        "movie" | "movies" | "film" | "films" => MediaType::Movie,
        _ => MediaType::Series,
    }
}

impl MetadataService {
    /// Ranked trending titles.
    ///
    /// Demo mode serves the fixed catalog. Movies under the `released` policy
    /// come from the MDBList weekly feed. Otherwise TMDB trending is used when
    /// configured, falling back to the MDBList feeds when it fails or is empty.
    #[instrument(skip(self))]
    pub async fn trending(&self, media_type: &str, source: TrendingMovieSource) -> Result<Vec<TrendingItem>> {
        let _lease = self.lease().await;
        let media_type = normalize_trending_type(media_type);
        let tvdb = self.tvdb().await;
        let tmdb = self.tmdb().await;

        if self.is_demo() {
            let mut items = demo_trending(media_type);
            self.enrich_demo_artwork(&tvdb, &mut items, media_type).await;
            return Ok(items);
        }

        if media_type == MediaType::Movie && source == TrendingMovieSource::Released {
            return self.mdblist_trending(&tvdb, &tmdb, media_type).await;
        }

        if tmdb.is_configured() {
            let key = cache_key(&["tmdb", "trending", media_type.tmdb_segment(), "v2"]);
            if let Some(mut cached) = self.cache.lookup::<Vec<TrendingItem>>(&key).await {
                if !cached.is_empty() {
                    refresh_list_release_state(&mut cached, Utc::now());
                    return Ok(cached);
                }
            }

            match tmdb.trending(media_type).await {
                Ok(mut items) if !items.is_empty() => {
                    self.enrich_trending_imdb_ids(&tmdb, &mut items, media_type).await;
                    if media_type == MediaType::Movie {
                        self.enrich_trending_movie_releases(&tmdb, &mut items).await;
                    }
                    self.cache.store(&key, &items).await;
                    return Ok(items);
                }
                Ok(_) => info!(
                    "[metadata] tmdb trending returned no results type={}; falling back to {} feed",
                    media_type.tmdb_segment(),
                    media_type.as_str()
                ),
                Err(e) => warn!(
                    "[metadata] tmdb trending failed type={} err={}; falling back to {} feed",
                    media_type.tmdb_segment(),
                    e,
                    media_type.as_str()
                ),
            }
        } else {
            info!(
                "[metadata] tmdb trending unavailable type={}; using {} feed",
                media_type.tmdb_segment(),
                media_type.as_str()
            );
        }

        self.mdblist_trending(&tvdb, &tmdb, media_type).await
    }

    /// MDBList weekly movies or latest shows, enriched through TVDB.
    async fn mdblist_trending(
        &self,
        tvdb: &TvdbClient,
        tmdb: &TmdbClient,
        media_type: MediaType,
    ) -> Result<Vec<TrendingItem>> {
        let key = cache_key(&["mdblist", "trending", media_type.as_str(), "v2"]);
        if let Some(mut cached) = self.cache.lookup::<Vec<TrendingItem>>(&key).await {
            if !cached.is_empty() {
                refresh_list_release_state(&mut cached, Utc::now());
                return Ok(cached);
            }
        }

        let entries = match media_type {
            MediaType::Movie => self.mdblist().top_movies().await?,
            MediaType::Series => self.mdblist().latest_shows().await?,
        };
        info!(
            "[metadata] fetched {} MDBList {} entries for trending feed",
            entries.len(),
            media_type.as_str()
        );

        let mut items = Vec::with_capacity(entries.len());
        for entry in &entries {
            items.push(TrendingItem {
                rank: entry.rank,
                title: self.enrich_mdblist_item(tvdb, entry, media_type).await,
            });
        }
        if media_type == MediaType::Movie {
            self.enrich_trending_movie_releases(tmdb, &mut items).await;
        }

        if !items.is_empty() {
            self.cache.store(&key, &items).await;
        }
        Ok(items)
    }

    /// Builds a title from an MDBList entry, filling what TVDB knows about it.
    pub(crate) async fn enrich_mdblist_item(&self, tvdb: &TvdbClient, entry: &MdbListItem, media_type: MediaType) -> Title {
        let mut title = Title {
            id: format!("mdblist:{}:{}", media_type.as_str(), entry.id),
            name: entry.title.clone(),
            year: entry.release_year,
            language: tvdb.language().to_string(),
            media_type,
            imdb_id: entry.imdb_id.trim().to_string(),
            tmdb_id: entry.tmdbid.unwrap_or(0),
            popularity: 100.0 - f64::from(entry.rank),
            ..Title::default()
        };

        let mut found = false;
        if entry.tvdb_id() > 0 {
            found = self.apply_tvdb_record(tvdb, &mut title, entry.tvdb_id()).await;
        }

        if !found {
            if let Some(hit) = self.find_mdblist_entry(tvdb, entry, media_type).await {
                self.apply_search_hit(&mut title, &hit, tvdb.language());
                found = true;
            }
        }

        self.apply_artworks(tvdb, &mut title).await;

        if !found {
            debug!(
                "[metadata] no tvdb match for {} title={:?} year={}",
                media_type.as_str(),
                entry.title,
                entry.release_year
            );
            title.overview = placeholder_overview(media_type, entry.release_year, Utc::now().year());
        }
        title
    }

    /// Fills missing poster and backdrop from the title's TVDB artworks.
    pub(crate) async fn apply_artworks(&self, tvdb: &TvdbClient, title: &mut Title) {
        if title.tvdb_id <= 0 {
            return;
        }
        let artworks = match title.media_type {
            MediaType::Movie => tvdb.movie_artworks(title.tvdb_id).await,
            MediaType::Series => tvdb.series_artworks(title.tvdb_id).await,
        };
        match artworks {
            Ok(artworks) => {
                apply_tvdb_artworks(title, &artworks);
            }
            Err(e) => warn!(
                "[metadata] {} artworks fetch failed title={:?} tvdbId={} err={}",
                title.media_type.as_str(),
                title.name,
                title.tvdb_id,
                e
            ),
        }
    }

    /// Direct lookup by TVDB id. Name comes from the record (then translation) and popularity from its score.
    pub(crate) async fn apply_tvdb_record(&self, tvdb: &TvdbClient, title: &mut Title, tvdb_id: i64) -> bool {
        let lang = tvdb.language();
        let (record, translation) = match title.media_type {
            MediaType::Movie => (tvdb.movie(tvdb_id).await, tvdb.movie_translation(tvdb_id, lang).await.ok()),
            MediaType::Series => (tvdb.series(tvdb_id).await, tvdb.series_translation(tvdb_id, lang).await.ok()),
        };
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "[metadata] tvdb {} lookup failed id={} title={:?} err={}",
                    title.media_type.as_str(),
                    tvdb_id,
                    title.name,
                    e
                );
                return false;
            }
        };

        title.tvdb_id = tvdb_id;
        title.id = tvdb_title_id(title.media_type, tvdb_id);
        if !record.name.trim().is_empty() {
            title.name = record.name;
        }
        title.overview = record.overview;
        if let Some(translation) = translation {
            if !translation.name.trim().is_empty() {
                title.name = translation.name;
            }
            if !translation.overview.trim().is_empty() {
                title.overview = translation.overview;
            }
        }
        if record.score > 0.0 {
            title.popularity = record.score;
        }
        if title.poster.is_none() {
            title.poster = tvdb_image(&record.image, "poster");
        }
        true
    }

    /// Search by the MDBList id as remote id first, then by name and year alone.
    async fn find_mdblist_entry(
        &self,
        tvdb: &TvdbClient,
        entry: &MdbListItem,
        media_type: MediaType,
    ) -> Option<SearchResult> {
        let remote_id = entry.id.to_string();
        for remote in [remote_id.as_str(), ""] {
            match self
                .lookup_search(tvdb, media_type, &entry.title, entry.release_year, remote)
                .await
            {
                Ok(results) => {
                    if let Some(hit) = results.into_iter().next() {
                        debug!(
                            "[metadata] tvdb {} search matched title={:?} remoteId={:?} tvdbId={}",
                            media_type.as_str(),
                            entry.title,
                            remote,
                            hit.tvdb_id
                        );
                        return Some(hit);
                    }
                }
                Err(e) => warn!(
                    "[metadata] tvdb {} search failed title={:?} year={} err={}",
                    media_type.as_str(),
                    entry.title,
                    entry.release_year,
                    e
                ),
            }
        }
        None
    }

    pub(crate) fn apply_search_hit(&self, title: &mut Title, hit: &SearchResult, language: &str) {
        let tvdb_id = hit.tvdb_id();
        if tvdb_id > 0 {
            title.tvdb_id = tvdb_id;
            title.id = tvdb_title_id(title.media_type, tvdb_id);
        }
        if title.imdb_id.is_empty() {
            title.imdb_id = first_imdb_remote_id(&hit.remote_ids).unwrap_or_default();
        }

        let localized = hit.overviews.get(language).map(|s| s.trim()).unwrap_or_default();
        if !localized.is_empty() {
            title.overview = localized.to_string();
        } else if !hit.overview.trim().is_empty() {
            title.overview = hit.overview.clone();
        }

        if let Some(poster) = tvdb_image(&hit.image_url, "poster") {
            title.poster = Some(poster);
        }
        let thumbnail = normalize_tvdb_image_url(&hit.thumbnail);
        if !thumbnail.is_empty() {
            match title.media_type {
                MediaType::Series => title.backdrop = tvdb_image(&thumbnail, "backdrop"),
                MediaType::Movie if title.poster.is_none() => title.poster = tvdb_image(&thumbnail, "poster"),
                MediaType::Movie => {}
            }
        }
    }

    /// Cached TVDB `/search` used to match a known title (limit 5).
    /// Only non-empty answers are cached.
    pub(crate) async fn lookup_search(
        &self,
        tvdb: &TvdbClient,
        media_type: MediaType,
        query: &str,
        year: i32,
        remote_id: &str,
    ) -> Result<Vec<SearchResult>> {
        let year_part = if year > 0 { year.to_string() } else { String::new() };
        let key = cache_key(&["tvdb", "search", media_type.as_str(), query, &year_part, remote_id]);
        if let Some(cached) = self.cache.lookup::<Vec<SearchResult>>(&key).await {
            debug!(
                "[tvdb] {} search cache hit query={:?} year={} remoteId={:?}",
                media_type.as_str(),
                query,
                year,
                remote_id
            );
            return Ok(cached);
        }

        let results = tvdb.search(query, media_type.as_str(), 5, year, remote_id).await?;
        if !results.is_empty() {
            self.cache.store(&key, &results).await;
        }
        Ok(results)
    }

    /// Demo artwork comes from a TVDB search on name and year, cached per slug.
    pub(crate) async fn enrich_demo_artwork(&self, tvdb: &TvdbClient, items: &mut [TrendingItem], media_type: MediaType) {
        if !tvdb.is_configured() {
            debug!("[demo] tvdb not configured; skipping artwork");
            return;
        }
        for item in items.iter_mut() {
            let title = &mut item.title;
            let Some(slug) = demo_slug(&title.id).map(str::to_string) else {
                continue;
            };
            let key = cache_key(&["demo", "artwork", "v3", media_type.as_str(), &slug]);
            if let Some(cached) = self.cache.lookup::<Title>(&key).await {
                debug!(
                    "[demo] cache hit for {} slug={} hasPoster={} hasBackdrop={}",
                    media_type.as_str(),
                    slug,
                    cached.poster.is_some(),
                    cached.backdrop.is_some()
                );
                title.poster = cached.poster;
                title.backdrop = cached.backdrop;
                title.tvdb_id = cached.tvdb_id;
                continue;
            }

            let hit = match self.lookup_search(tvdb, media_type, &title.name, title.year, "").await {
                Ok(results) => results.into_iter().find(|r| r.tvdb_id() > 0),
                Err(e) => {
                    warn!("[demo] artwork search failed slug={} err={}", slug, e);
                    continue;
                }
            };
            let Some(hit) = hit else {
                continue;
            };
            title.tvdb_id = hit.tvdb_id();
            title.poster = tvdb_image(&hit.image_url, "poster");

            match media_type {
                MediaType::Movie => match tvdb.movie_extended(title.tvdb_id, &["artwork"]).await {
                    Ok(ext) => {
                        apply_tvdb_artworks(title, &ext.artworks);
                    }
                    Err(e) => warn!("[demo] movie tvdbId={} fetch error: {}", title.tvdb_id, e),
                },
                MediaType::Series => match tvdb.series_extended(title.tvdb_id, &["artworks"]).await {
                    Ok(ext) => {
                        if let Some(poster) = tvdb_image(&ext.poster, "poster").or_else(|| tvdb_image(&ext.image, "poster")) {
                            title.poster = Some(poster);
                        }
                        if let Some(backdrop) = tvdb_image(&ext.fanart, "backdrop") {
                            title.backdrop = Some(backdrop);
                        }
                        apply_tvdb_artworks(title, &ext.artworks);
                    }
                    Err(e) => warn!("[demo] series tvdbId={} fetch error: {}", title.tvdb_id, e),
                },
            }
            self.cache.store(&key, &*title).await;
        }
    }

    async fn enrich_trending_imdb_ids(&self, tmdb: &TmdbClient, items: &mut [TrendingItem], media_type: MediaType) {
        let pending = items
            .iter_mut()
            .filter(|item| item.title.imdb_id.is_empty() && item.title.tmdb_id > 0);
        bounded(pending, |item| async move {
            let imdb_id = self.imdb_for_tmdb(tmdb, media_type, item.title.tmdb_id).await;
            if !imdb_id.is_empty() {
                item.title.imdb_id = imdb_id;
            }
        })
        .await;
    }

    /// Release windows for movies that have a TMDB id and no windows yet.
    pub(crate) async fn enrich_trending_movie_releases(&self, tmdb: &TmdbClient, items: &mut [TrendingItem]) {
        let pending = items.iter_mut().filter(|item| {
            item.title.media_type == MediaType::Movie
                && item.title.theatrical_release.is_none()
                && item.title.home_release.is_none()
                && item.title.tmdb_id > 0
        });
        let enriched = bounded(pending, |item| async move {
            let tmdb_id = item.title.tmdb_id;
            self.enrich_movie_releases(tmdb, &mut item.title, tmdb_id).await
        })
        .await;

        let count = enriched.into_iter().filter(|done| *done).count();
        if count > 0 {
            info!("[metadata] enriched {} trending movies with release data", count);
        }
    }
}

fn placeholder_overview(media_type: MediaType, release_year: i32, current_year: i32) -> String {
    match media_type {
        MediaType::Movie if release_year > current_year => {
            format!("Upcoming movie scheduled for release in {}", release_year)
        }
        MediaType::Movie if release_year == current_year => {
            format!("New movie from {} - details may be added to TVDB soon", release_year)
        }
        MediaType::Movie => "Movie details not available in TVDB".to_string(),
        MediaType::Series => format!("TV series from {}", release_year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trending_type() {
        for movie in ["movie", "Movies", " film ", "FILMS"] {
            assert_eq!(normalize_trending_type(movie), MediaType::Movie);
        }
        for series in ["", "tv", "series", "show", "shows", "anything"] {
            assert_eq!(normalize_trending_type(series), MediaType::Series);
        }
    }

    #[test]
    fn test_placeholder_overview() {
        assert_eq!(
            placeholder_overview(MediaType::Movie, 2031, 2030),
            "Upcoming movie scheduled for release in 2031"
        );
        assert!(placeholder_overview(MediaType::Movie, 2030, 2030).starts_with("New movie from 2030"));
        assert_eq!(
            placeholder_overview(MediaType::Movie, 1999, 2030),
            "Movie details not available in TVDB"
        );
        assert_eq!(placeholder_overview(MediaType::Series, 2024, 2030), "TV series from 2024");
    }
}
