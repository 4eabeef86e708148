use chrono::Utc;
use metadata_models::{BatchMovieReleasesItem, BatchMovieReleasesQuery, MediaType, MovieDetailsQuery, Release, Title};
use metadata_sources::tvdb::{BaseRecord, MovieExtended, Translation};
use metadata_sources::{TmdbClient, TvdbClient};
use tracing::{debug, info, instrument, warn};

use super::{bounded, first_non_empty, MetadataService};
use crate::artwork::{apply_tvdb_artworks, tvdb_image};
use crate::cache::cache_key;
use crate::error::{MetadataError, Result};
use crate::ids::{normalize_imdb_id, parse_tmdb_id, parse_tvdb_id, scan_remote_ids, tvdb_title_id};
use crate::releases::refresh_release_state;

const MISSING_TMDB_ID: &str = "tmdb id required for release data (could not resolve from imdb)";
const RELEASE_FETCH_FAILED: &str = "failed to fetch release data";

/// TMDB id carried by a movie query, either explicitly or in a `tmdb:` title id.
fn request_tmdb_id(query: &MovieDetailsQuery) -> i64 {
    if query.tmdb_id > 0 {
        return query.tmdb_id;
    }
    if query.title_id.trim().to_lowercase().starts_with("tmdb:") {
        return parse_tmdb_id(&query.title_id);
    }
    0
}

fn movie_title(
    tvdb_id: i64,
    base: &BaseRecord,
    translation: Option<&Translation>,
    extended: Option<&MovieExtended>,
    requested_name: &str,
    language: &str,
) -> Title {
    let (translated_name, translated_overview) = translation
        .map(|t| (t.name.as_str(), t.overview.as_str()))
        .unwrap_or_default();

    let mut title = Title {
        id: tvdb_title_id(MediaType::Movie, tvdb_id),
        name: first_non_empty(&[translated_name, base.name.as_str(), requested_name]).to_string(),
        overview: first_non_empty(&[translated_overview, base.overview.as_str()]).to_string(),
        year: base.year,
        language: language.to_string(),
        media_type: MediaType::Movie,
        tvdb_id,
        status: base.status.name.trim().to_string(),
        ..Title::default()
    };

    if let Some(extended) = extended {
        apply_tvdb_artworks(&mut title, &extended.artworks);
        if title.poster.is_none() {
            title.poster = tvdb_image(&extended.image, "poster");
        }
        if title.year == 0 {
            title.year = extended.year;
        }
        title.runtime_minutes = extended.runtime;
        title.genres = extended
            .genres
            .iter()
            .map(|g| g.name.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        let remote = scan_remote_ids(&extended.remote_ids);
        title.imdb_id = remote.imdb_id;
        title.tmdb_id = remote.tmdb_id;
    }
    title
}

impl MetadataService {
    /// Movie metadata including MDBList ratings.
    #[instrument(skip(self), fields(title_id = %query.title_id, name = %query.name))]
    pub async fn movie_details(&self, query: &MovieDetailsQuery) -> Result<Title> {
        let _lease = self.lease().await;
        self.movie(query, true).await
    }

    /// Movie metadata without ratings.
    #[instrument(skip(self), fields(title_id = %query.title_id, name = %query.name))]
    pub async fn movie_info(&self, query: &MovieDetailsQuery) -> Result<Title> {
        let _lease = self.lease().await;
        self.movie(query, false).await
    }

    async fn movie(&self, query: &MovieDetailsQuery, include_ratings: bool) -> Result<Title> {
        let tvdb = self.tvdb().await;
        let tmdb = self.tmdb().await;
        let tmdb_id = request_tmdb_id(query);
        let can_fall_back = tmdb_id > 0 && tmdb.is_configured();

        let tvdb_id = self.resolve_movie_id(&tvdb, query, tmdb_id).await;
        if tvdb_id <= 0 {
            if can_fall_back {
                info!("[metadata] no tvdb id for movie, using TMDB directly tmdbId={}", tmdb_id);
                return self.tmdb_movie(&tvdb, &tmdb, query, tmdb_id).await;
            }
            return Err(MetadataError::NotFound(format!(
                "unable to resolve tvdb id for movie {:?}",
                query.name.trim()
            )));
        }

        let language = tvdb.language();
        let key = cache_key(&["tvdb", "movie", "details", "v1", language, &tvdb_id.to_string()]);
        if let Some(cached) = self.cache.lookup::<Title>(&key).await {
            if !cached.id.is_empty() {
                return Ok(self
                    .refresh_cached_movie(&tmdb, &key, cached, tmdb_id, include_ratings)
                    .await);
            }
        }

        let base = match tvdb.movie(tvdb_id).await {
            Ok(base) => base,
            Err(e) if can_fall_back => {
                warn!(
                    "[metadata] tvdb movie fetch failed tvdbId={} err={}; using TMDB tmdbId={}",
                    tvdb_id, e, tmdb_id
                );
                return self.tmdb_movie(&tvdb, &tmdb, query, tmdb_id).await;
            }
            Err(e) => return Err(e.into()),
        };
        let translation = tvdb
            .movie_translation(tvdb_id, language)
            .await
            .map_err(|e| {
                warn!(
                    "[metadata] movie translation fetch failed tvdbId={} lang={} err={}",
                    tvdb_id, language, e
                )
            })
            .ok();
        let extended = tvdb
            .movie_extended(tvdb_id, &["artwork"])
            .await
            .map_err(|e| warn!("[metadata] movie extended fetch failed tvdbId={} err={}", tvdb_id, e))
            .ok();

        let mut title = movie_title(
            tvdb_id,
            &base,
            translation.as_ref(),
            extended.as_ref(),
            &query.name,
            language,
        );
        let imdb_id = normalize_imdb_id(&query.imdb_id);
        if !imdb_id.is_empty() {
            title.imdb_id = imdb_id;
        }
        if tmdb_id > 0 {
            title.tmdb_id = tmdb_id;
        }

        if title.poster.is_none() || title.backdrop.is_none() {
            self.hydrate_movie_artwork(&tmdb, &mut title, tmdb_id).await;
        }
        let release_id = title.tmdb_id;
        if self.enrich_movie_releases(&tmdb, &mut title, release_id).await {
            debug!(
                "[metadata] movie release windows set tvdbId={} tmdbId={} releases={}",
                tvdb_id,
                release_id,
                title.releases.len()
            );
        }
        if include_ratings {
            self.fetch_ratings(&mut title).await;
        }
        title.credits = self.fetch_credits(&tmdb, MediaType::Movie, title.tmdb_id).await;

        info!(
            "[metadata] movie details complete tvdbId={} name={:?} hasPoster={} hasBackdrop={}",
            tvdb_id,
            title.name,
            title.poster.is_some(),
            title.backdrop.is_some()
        );
        self.cache.store(&key, &title).await;
        Ok(title)
    }

    /// Explicit id, title id, cached TMDB mapping, then a name search that
    /// drops the year when it finds nothing. 0 when unresolved.
    async fn resolve_movie_id(&self, tvdb: &TvdbClient, query: &MovieDetailsQuery, tmdb_id: i64) -> i64 {
        if query.tvdb_id > 0 {
            return query.tvdb_id;
        }
        if !query.title_id.trim().to_lowercase().starts_with("tmdb:") {
            let from_title = parse_tvdb_id(&query.title_id);
            if from_title > 0 {
                return from_title;
            }
        }

        let mapping_key = cache_key(&["tvdb", "resolve", "movie", "tmdb", &tmdb_id.to_string()]);
        if tmdb_id > 0 {
            if let Some(cached) = self.cache.lookup::<i64>(&mapping_key).await {
                if cached > 0 {
                    debug!("[metadata] movie tmdb mapping cache hit tmdbId={} tvdbId={}", tmdb_id, cached);
                    return cached;
                }
            }
        }

        let name = query.name.trim();
        if name.is_empty() {
            return 0;
        }
        let mut years = vec![query.year];
        if query.year > 0 {
            years.push(0);
        }
        for year in years {
            match self.lookup_search(tvdb, MediaType::Movie, name, year, "").await {
                Ok(results) if !results.is_empty() => {
                    let tvdb_id = results[0].tvdb_id();
                    if tvdb_id <= 0 {
                        debug!(
                            "[metadata] movie search hit has no tvdb id name={:?} hit={:?}",
                            name, results[0].name
                        );
                        return 0;
                    }
                    info!("[metadata] movie search found tvdbId={} name={:?} year={}", tvdb_id, name, year);
                    if tmdb_id > 0 {
                        self.cache.store(&mapping_key, &tvdb_id).await;
                    }
                    return tvdb_id;
                }
                Ok(_) => debug!("[metadata] movie search returned nothing name={:?} year={}", name, year),
                Err(e) => {
                    warn!("[metadata] movie search failed name={:?} year={} err={}", name, year, e);
                    return 0;
                }
            }
        }
        0
    }

    /// Brings an older cache entry up to date. Writes it back when anything changed.
    async fn refresh_cached_movie(
        &self,
        tmdb: &TmdbClient,
        key: &str,
        mut title: Title,
        tmdb_id: i64,
        include_ratings: bool,
    ) -> Title {
        debug!("[metadata] movie details cache hit id={}", title.id);
        let mut changed = false;

        if title.poster.is_none() || title.backdrop.is_none() {
            changed |= self.hydrate_movie_artwork(tmdb, &mut title, tmdb_id).await;
        }
        if title.releases.is_empty() {
            let release_id = title.tmdb_id;
            changed |= self.enrich_movie_releases(tmdb, &mut title, release_id).await;
        } else {
            refresh_release_state(&mut title, Utc::now());
        }

        let credits_id = if title.tmdb_id > 0 { title.tmdb_id } else { tmdb_id };
        if !title.has_credits() && credits_id > 0 {
            if let Some(credits) = self.fetch_credits(tmdb, MediaType::Movie, credits_id).await {
                title.credits = Some(credits);
                changed = true;
            }
        }
        // Entries written by `movie_info` carry no ratings.
        if include_ratings && title.ratings.is_empty() {
            self.fetch_ratings(&mut title).await;
            changed |= !title.ratings.is_empty();
        }

        if changed {
            self.cache.store(key, &title).await;
        }
        title
    }

    /// Movie built from TMDB alone, for titles TVDB cannot resolve.
    async fn tmdb_movie(
        &self,
        tvdb: &TvdbClient,
        tmdb: &TmdbClient,
        query: &MovieDetailsQuery,
        tmdb_id: i64,
    ) -> Result<Title> {
        let key = cache_key(&["tmdb", "movie", "details", "v1", tvdb.language(), &tmdb_id.to_string()]);
        if let Some(mut cached) = self.cache.lookup::<Title>(&key).await {
            if !cached.id.is_empty() {
                refresh_release_state(&mut cached, Utc::now());
                return Ok(cached);
            }
        }

        let mut title = tmdb.movie_details(tmdb_id).await?;
        if title.tmdb_id == 0 {
            title.tmdb_id = tmdb_id;
        }
        if title.name.is_empty() {
            title.name = query.name.trim().to_string();
        }
        self.enrich_movie_releases(tmdb, &mut title, tmdb_id).await;
        title.credits = self.fetch_credits(tmdb, MediaType::Movie, tmdb_id).await;
        debug!(
            "[metadata] movie from TMDB tmdbId={} name={:?} hasPoster={} hasBackdrop={}",
            tmdb_id,
            title.name,
            title.poster.is_some(),
            title.backdrop.is_some()
        );

        self.cache.store(&key, &title).await;
        Ok(title)
    }

    /// Theatrical and home release windows for many movies, in query order.
    #[instrument(skip(self, queries), fields(count = queries.len()))]
    pub async fn batch_movie_releases(&self, queries: &[BatchMovieReleasesQuery]) -> Vec<BatchMovieReleasesItem> {
        let _lease = self.lease().await;
        let tmdb = self.tmdb().await;
        let mut results: Vec<BatchMovieReleasesItem> = queries
            .iter()
            .map(|query| BatchMovieReleasesItem {
                query: query.clone(),
                ..BatchMovieReleasesItem::default()
            })
            .collect();

        let mut pending = Vec::new();
        for (index, item) in results.iter_mut().enumerate() {
            let query = &item.query;
            let mut tmdb_id = query.tmdb_id;
            if tmdb_id <= 0 {
                if let Some(rest) = query.title_id.trim().strip_prefix("tmdb:movie:") {
                    tmdb_id = rest.parse().unwrap_or(0);
                }
            }
            if tmdb_id <= 0 && !query.imdb_id.trim().is_empty() {
                tmdb_id = self.tmdb_for_imdb(&tmdb, &query.imdb_id).await;
            }
            if tmdb_id <= 0 {
                item.error = Some(MISSING_TMDB_ID.to_string());
                continue;
            }

            let key = cache_key(&["tmdb", "movie", "releases", "v1", &tmdb_id.to_string()]);
            match self.cache.lookup::<Vec<Release>>(&key).await {
                Some(releases) if !releases.is_empty() => {
                    let mut title = Title {
                        releases,
                        ..Title::default()
                    };
                    refresh_release_state(&mut title, Utc::now());
                    item.theatrical_release = title.theatrical_release;
                    item.home_release = title.home_release;
                }
                _ => pending.push((index, tmdb_id)),
            }
        }

        if pending.is_empty() {
            debug!("[metadata] batch movie releases all cached total={}", queries.len());
            return results;
        }

        let tmdb = &*tmdb;
        let fetched = bounded(pending.iter().copied(), |(index, tmdb_id)| async move {
            let mut title = Title {
                tmdb_id,
                ..Title::default()
            };
            let found = self.enrich_movie_releases(tmdb, &mut title, tmdb_id).await;
            (index, found.then_some(title))
        })
        .await;

        for (index, title) in fetched {
            let item = &mut results[index];
            match title {
                Some(title) => {
                    item.theatrical_release = title.theatrical_release;
                    item.home_release = title.home_release;
                }
                None => item.error = Some(RELEASE_FETCH_FAILED.to_string()),
            }
        }
        info!(
            "[metadata] batch movie releases complete total={} fetched={}",
            queries.len(),
            pending.len()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_sources::tvdb::{Artwork, Genre, RemoteId};

    #[test]
    fn test_request_tmdb_id() {
        let query = MovieDetailsQuery {
            tmdb_id: 653,
            title_id: "tmdb:movie:1".to_string(),
            ..MovieDetailsQuery::default()
        };
        assert_eq!(request_tmdb_id(&query), 653);

        let query = MovieDetailsQuery {
            title_id: "tmdb:movie:10331".to_string(),
            ..MovieDetailsQuery::default()
        };
        assert_eq!(request_tmdb_id(&query), 10331);

        let query = MovieDetailsQuery {
            title_id: "tvdb:movie:99".to_string(),
            ..MovieDetailsQuery::default()
        };
        assert_eq!(request_tmdb_id(&query), 0);
    }

    #[test]
    fn test_movie_title_from_tvdb_records() {
        let base = BaseRecord {
            name: "Nosferatu, eine Symphonie des Grauens".to_string(),
            overview: "Base overview".to_string(),
            year: 1922,
            ..BaseRecord::default()
        };
        let translation = Translation {
            name: "Nosferatu".to_string(),
            ..Translation::default()
        };
        let extended = MovieExtended {
            runtime: 94,
            genres: vec![Genre {
                name: "Horror".to_string(),
            }],
            artworks: vec![
                Artwork {
                    image: "/banners/movies/99/posters/1.jpg".to_string(),
                    artwork_type: "14".to_string(),
                    ..Artwork::default()
                },
                Artwork {
                    image: "/banners/movies/99/backgrounds/1.jpg".to_string(),
                    artwork_type: "15".to_string(),
                    ..Artwork::default()
                },
            ],
            remote_ids: vec![
                RemoteId {
                    id: "tt0013442".to_string(),
                    source_name: "IMDB".to_string(),
                    ..RemoteId::default()
                },
                RemoteId {
                    id: "653".to_string(),
                    source_name: "TheMovieDB.com".to_string(),
                    ..RemoteId::default()
                },
            ],
            ..MovieExtended::default()
        };

        let title = movie_title(99, &base, Some(&translation), Some(&extended), "", "eng");
        assert_eq!(title.id, "tvdb:movie:99");
        assert_eq!(title.name, "Nosferatu");
        assert_eq!(title.overview, "Base overview");
        assert_eq!(title.runtime_minutes, 94);
        assert_eq!(title.genres, vec!["Horror".to_string()]);
        assert_eq!(title.imdb_id, "tt0013442");
        assert_eq!(title.tmdb_id, 653);
        assert!(title.poster.unwrap().url.contains("posters"));
        assert!(title.backdrop.unwrap().url.contains("backgrounds"));
    }

    #[test]
    fn test_movie_title_falls_back_to_requested_name() {
        let title = movie_title(7, &BaseRecord::default(), None, None, "  Detour ", "eng");
        assert_eq!(title.name, "Detour");
        assert!(title.poster.is_none());
        assert_eq!(title.tmdb_id, 0);
    }
}
