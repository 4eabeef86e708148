use std::collections::{BTreeMap, HashMap};

use metadata_models::{
    BatchSeriesDetailsItem, MediaType, SeriesDetails, SeriesDetailsQuery, SeriesEpisode, SeriesSeason, Title,
};
use metadata_sources::tvdb::{BaseRecord, Episode, Season, SeriesExtended, Translation};
use metadata_sources::TvdbClient;
use tracing::{debug, info, instrument, warn};

use super::{bounded, first_non_empty, MetadataService};
use crate::artwork::{apply_tvdb_artworks, tvdb_image};
use crate::cache::cache_key;
use crate::error::{MetadataError, Result};
use crate::ids::{parse_tvdb_id, scan_remote_ids, tvdb_title_id};
use crate::resolver::pick_series_id;

const DEFAULT_SEASON_TYPE: &str = "official";

/// Episode ordering to request localized episodes with, taken from the first
/// season that declares one.
fn detect_season_type(seasons: &[Season]) -> String {
    seasons
        .iter()
        .map(|s| first_non_empty(&[s.season_type.kind.as_str(), s.season_type.name.as_str()]))
        .find(|kind| !kind.is_empty())
        .unwrap_or(DEFAULT_SEASON_TYPE)
        .to_lowercase()
}

/// Series-level title from the base record, the extended record and an
/// optional translation. Artworks on `extended` are applied last.
fn series_title(
    tvdb_id: i64,
    base: &BaseRecord,
    extended: &SeriesExtended,
    translation: Option<&Translation>,
    requested_name: &str,
    language: &str,
) -> Title {
    let (translated_name, translated_overview) = translation
        .map(|t| (t.name.as_str(), t.overview.as_str()))
        .unwrap_or_default();
    let remote = scan_remote_ids(&extended.remote_ids);

    let mut title = Title {
        id: tvdb_title_id(MediaType::Series, tvdb_id),
        name: first_non_empty(&[translated_name, extended.name.as_str(), base.name.as_str(), requested_name]).to_string(),
        overview: first_non_empty(&[translated_overview, extended.overview.as_str(), base.overview.as_str()]).to_string(),
        year: if base.year > 0 { base.year } else { extended.year },
        language: language.to_string(),
        media_type: MediaType::Series,
        tvdb_id,
        imdb_id: remote.imdb_id,
        tmdb_id: remote.tmdb_id,
        network: extended.network.trim().to_string(),
        status: first_non_empty(&[extended.status.name.as_str(), base.status.name.as_str()]).to_string(),
        runtime_minutes: extended.average_runtime,
        genres: extended
            .genres
            .iter()
            .map(|g| g.name.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect(),
        ..Title::default()
    };
    if title.network.is_empty() {
        if let Some(network) = &extended.original_network {
            title.network = network.name.trim().to_string();
        }
    }

    title.poster = tvdb_image(&extended.poster, "poster").or_else(|| tvdb_image(&extended.image, "poster"));
    title.backdrop = tvdb_image(&extended.fanart, "backdrop");
    apply_tvdb_artworks(&mut title, &extended.artworks);
    title
}

fn convert_episode(episode: &Episode, localized: Option<&Episode>) -> SeriesEpisode {
    let (localized_name, localized_overview) = localized
        .map(|l| (l.name.as_str(), l.overview.as_str()))
        .unwrap_or_default();
    SeriesEpisode {
        id: format!("tvdb:episode:{}", episode.id),
        tvdb_id: episode.id,
        name: first_non_empty(&[localized_name, episode.name.as_str(), episode.abbreviation.as_str()]).to_string(),
        overview: first_non_empty(&[localized_overview, episode.overview.as_str()]).to_string(),
        season_number: episode.season_number.max(0) as u32,
        episode_number: episode.number.max(0) as u32,
        absolute_episode_number: episode.absolute_number.max(0) as u32,
        aired_date: episode.aired.trim().to_string(),
        runtime_minutes: episode.runtime.max(0) as u32,
        image: tvdb_image(&episode.image, "still"),
    }
}

fn ensure_season(by_number: &mut BTreeMap<u32, SeriesSeason>, number: i32) -> Option<&mut SeriesSeason> {
    let number = u32::try_from(number).ok()?;
    Some(by_number.entry(number).or_insert_with(|| SeriesSeason {
        name: format!("Season {}", number),
        number,
        ..SeriesSeason::default()
    }))
}

/// Groups episodes into seasons. Negative season numbers are dropped; seasons
/// come back ordered by number with episodes ordered by `(number, tvdb id)`.
fn assemble_seasons(seasons: &[Season], episodes: &[Episode], localized: &HashMap<i64, Episode>) -> Vec<SeriesSeason> {
    let mut by_number: BTreeMap<u32, SeriesSeason> = BTreeMap::new();

    for season in seasons {
        let Some(target) = ensure_season(&mut by_number, season.number) else {
            continue;
        };
        if season.id > 0 {
            target.id = format!("tvdb:season:{}", season.id);
            target.tvdb_id = season.id;
        }
        if !season.name.trim().is_empty() {
            target.name = season.name.trim().to_string();
        }
        if !season.overview.trim().is_empty() {
            target.overview = season.overview.trim().to_string();
        }
        let kind = first_non_empty(&[season.season_type.name.as_str(), season.season_type.kind.as_str()]);
        if !kind.is_empty() {
            target.season_type = kind.to_string();
        }
        if let Some(image) = tvdb_image(&season.image, "poster") {
            target.image = Some(image);
        }
    }

    for episode in episodes {
        if let Some(season) = ensure_season(&mut by_number, episode.season_number) {
            season.episodes.push(convert_episode(episode, localized.get(&episode.id)));
        }
    }

    by_number
        .into_values()
        .map(|mut season| {
            season.episodes.sort_by_key(|e| (e.episode_number, e.tvdb_id));
            season.episode_count = season.episodes.len();
            season
        })
        .collect()
}

/// Demo mode keeps a single season: season 1, else whatever comes first.
fn clamp_demo_seasons(seasons: &mut Vec<SeriesSeason>) {
    if seasons.len() <= 1 {
        return;
    }
    let keep = seasons.iter().position(|s| s.number == 1).unwrap_or(0);
    let season = seasons.swap_remove(keep);
    *seasons = vec![season];
}

impl MetadataService {
    /// TVDB series id for a loose query.
    ///
    /// Explicit ids win, then the title id. Name-based resolution is coalesced
    /// per `(name, year, tmdb id)` so concurrent callers share one search.
    pub(crate) async fn resolve_series_id(&self, tvdb: &TvdbClient, query: &SeriesDetailsQuery) -> Result<i64> {
        if query.tvdb_id > 0 {
            return Ok(query.tvdb_id);
        }
        let from_title = parse_tvdb_id(&query.title_id);
        if from_title > 0 {
            return Ok(from_title);
        }
        let name = query.name.trim();
        if name.is_empty() {
            return Err(MetadataError::InvalidRequest(
                "series name required to resolve tvdb id".to_string(),
            ));
        }

        let year = query.year.to_string();
        let tmdb_id = query.tmdb_id.to_string();
        let key = cache_key(&["resolve", "series", name, &year, &tmdb_id]);
        self.series_ids
            .run(&key, || self.search_series_id(tvdb, name, query.year, query.tmdb_id))
            .await
    }

    async fn search_series_id(&self, tvdb: &TvdbClient, name: &str, year: i32, tmdb_id: i64) -> Result<i64> {
        let mapping_key = cache_key(&["tvdb", "resolve", "tmdb", &tmdb_id.to_string()]);
        if tmdb_id > 0 {
            if let Some(cached) = self.cache.lookup::<i64>(&mapping_key).await {
                if cached > 0 {
                    debug!("[metadata] series tmdb mapping cache hit tmdbId={} tvdbId={}", tmdb_id, cached);
                    return Ok(cached);
                }
            }
        }

        let results = self.lookup_search(tvdb, MediaType::Series, name, year, "").await?;
        let Some(tvdb_id) = pick_series_id(&results, tmdb_id, tvdb.language()) else {
            return Err(MetadataError::NotFound(format!("no tvdb match found for {:?}", name)));
        };
        info!(
            "[metadata] resolved series name={:?} year={} tmdbId={} tvdbId={}",
            name, year, tmdb_id, tvdb_id
        );
        if tmdb_id > 0 {
            self.cache.store(&mapping_key, &tvdb_id).await;
        }
        Ok(tvdb_id)
    }

    fn series_details_key(&self, language: &str, tvdb_id: i64) -> String {
        cache_key(&["tvdb", "series", "details", "v4", language, &tvdb_id.to_string()])
    }

    /// Full series metadata: title, seasons and episodes, ratings and cast.
    #[instrument(skip(self), fields(title_id = %query.title_id, name = %query.name))]
    pub async fn series_details(&self, query: &SeriesDetailsQuery) -> Result<SeriesDetails> {
        let _lease = self.lease().await;
        let tvdb = self.tvdb().await;
        let tvdb_id = self.resolve_series_id(&tvdb, query).await?;
        let key = self.series_details_key(tvdb.language(), tvdb_id);

        let mut details = match self.cache.lookup::<SeriesDetails>(&key).await {
            Some(cached) if !cached.seasons.is_empty() => self.refresh_cached_series(&tvdb, &key, cached).await,
            _ => {
                let details = self.fetch_series_details(&tvdb, tvdb_id, &query.name).await?;
                self.cache.store(&key, &details).await;
                details
            }
        };

        if self.is_demo() {
            clamp_demo_seasons(&mut details.seasons);
        }
        Ok(details)
    }

    /// Backfills what older cache entries may lack and writes them back when changed.
    async fn refresh_cached_series(&self, tvdb: &TvdbClient, key: &str, mut details: SeriesDetails) -> SeriesDetails {
        let title = &mut details.title;
        debug!(
            "[metadata] series details cache hit tvdbId={} hasBackdrop={} hasCredits={}",
            title.tvdb_id,
            title.backdrop.is_some(),
            title.has_credits()
        );
        let mut changed = false;

        if title.backdrop.is_none() && title.tvdb_id > 0 {
            match tvdb.series_artworks(title.tvdb_id).await {
                Ok(artworks) => changed |= apply_tvdb_artworks(title, &artworks),
                Err(e) => warn!(
                    "[metadata] series backdrop backfill failed tvdbId={} err={}",
                    title.tvdb_id, e
                ),
            }
        }

        if !title.has_credits() && title.tmdb_id > 0 {
            let tmdb = self.tmdb().await;
            if let Some(credits) = self.fetch_credits(&tmdb, MediaType::Series, title.tmdb_id).await {
                title.credits = Some(credits);
                changed = true;
            }
        }

        if changed {
            self.cache.store(key, &details).await;
        }
        details
    }

    async fn fetch_series_details(&self, tvdb: &TvdbClient, tvdb_id: i64, requested_name: &str) -> Result<SeriesDetails> {
        let language = tvdb.language();
        info!("[metadata] fetching series details tvdbId={} lang={}", tvdb_id, language);

        let base = tvdb.series(tvdb_id).await?;
        let extended = tvdb
            .series_extended(tvdb_id, &["episodes", "seasons", "artworks"])
            .await?;
        let season_type = detect_season_type(&extended.seasons);

        let (translation, localized) = tokio::join!(
            tvdb.series_translation(tvdb_id, language),
            tvdb.series_episodes(tvdb_id, &season_type, language),
        );
        let translation = translation
            .map_err(|e| {
                warn!(
                    "[metadata] series translation fetch failed tvdbId={} lang={} err={}",
                    tvdb_id, language, e
                )
            })
            .ok();
        let localized: HashMap<i64, Episode> = match localized {
            Ok(episodes) => episodes.into_iter().map(|e| (e.id, e)).collect(),
            Err(e) => {
                warn!(
                    "[metadata] localized episodes fetch failed tvdbId={} seasonType={} err={}",
                    tvdb_id, season_type, e
                );
                HashMap::new()
            }
        };

        let mut title = series_title(tvdb_id, &base, &extended, translation.as_ref(), requested_name, language);
        let seasons = assemble_seasons(&extended.seasons, &extended.episodes, &localized);
        debug!(
            "[metadata] series assembled tvdbId={} seasons={} episodes={} localized={}",
            tvdb_id,
            seasons.len(),
            extended.episodes.len(),
            localized.len()
        );

        self.fetch_ratings(&mut title).await;
        if title.tmdb_id > 0 {
            let tmdb = self.tmdb().await;
            title.credits = self.fetch_credits(&tmdb, MediaType::Series, title.tmdb_id).await;
        }

        Ok(SeriesDetails { title, seasons })
    }

    /// Series title with artwork and external ids only.
    #[instrument(skip(self), fields(title_id = %query.title_id, name = %query.name))]
    pub async fn series_info(&self, query: &SeriesDetailsQuery) -> Result<Title> {
        let _lease = self.lease().await;
        let tvdb = self.tvdb().await;
        let tvdb_id = self.resolve_series_id(&tvdb, query).await?;
        let language = tvdb.language();

        let key = cache_key(&["tvdb", "series", "info", "v1", language, &tvdb_id.to_string()]);
        if let Some(cached) = self.cache.lookup::<Title>(&key).await {
            return Ok(cached);
        }

        let base = tvdb.series(tvdb_id).await?;
        let extended = tvdb.series_extended(tvdb_id, &["artworks"]).await?;
        let translation = tvdb
            .series_translation(tvdb_id, language)
            .await
            .map_err(|e| warn!("[metadata] series info translation failed tvdbId={} err={}", tvdb_id, e))
            .ok();

        let title = series_title(tvdb_id, &base, &extended, translation.as_ref(), &query.name, language);
        debug!(
            "[metadata] series info tvdbId={} hasPoster={} hasBackdrop={}",
            tvdb_id,
            title.poster.is_some(),
            title.backdrop.is_some()
        );
        self.cache.store(&key, &title).await;
        Ok(title)
    }

    /// Details for many series. Results keep the order of `queries`; failures
    /// are reported per item.
    #[instrument(skip(self, queries), fields(count = queries.len()))]
    pub async fn batch_series_details(&self, queries: &[SeriesDetailsQuery]) -> Vec<BatchSeriesDetailsItem> {
        // Released before the misses run through `series_details`, which takes its own.
        let lease = self.lease().await;
        let tvdb = self.tvdb().await;
        let mut results: Vec<BatchSeriesDetailsItem> = queries
            .iter()
            .map(|query| BatchSeriesDetailsItem {
                query: query.clone(),
                ..BatchSeriesDetailsItem::default()
            })
            .collect();

        let mut pending = Vec::new();
        for (index, item) in results.iter_mut().enumerate() {
            let tvdb_id = match self.resolve_series_id(&tvdb, &item.query).await {
                Ok(id) => id,
                Err(e) => {
                    item.error = Some(e.to_string());
                    continue;
                }
            };
            let key = self.series_details_key(tvdb.language(), tvdb_id);
            match self.cache.lookup::<SeriesDetails>(&key).await {
                Some(mut cached) if !cached.seasons.is_empty() => {
                    if self.is_demo() {
                        clamp_demo_seasons(&mut cached.seasons);
                    }
                    item.details = Some(cached);
                }
                _ => pending.push(index),
            }
        }
        drop(lease);

        if pending.is_empty() {
            debug!("[metadata] batch series all cached count={}", queries.len());
            return results;
        }
        info!(
            "[metadata] batch series fetching cached={} uncached={} total={}",
            queries.len() - pending.len(),
            pending.len(),
            queries.len()
        );

        let fetched = bounded(pending.iter().copied(), |index| {
            let query = &queries[index];
            async move { (index, self.series_details(query).await) }
        })
        .await;

        for (index, outcome) in fetched {
            match outcome {
                Ok(details) => results[index].details = Some(details),
                Err(e) => {
                    warn!(
                        "[metadata] batch series fetch error index={} name={:?} err={}",
                        index, queries[index].name, e
                    );
                    results[index].error = Some(e.to_string());
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_sources::tvdb::{Artwork, RemoteId, SeasonType, Status};

    fn season(id: i64, number: i32, name: &str) -> Season {
        Season {
            id,
            number,
            name: name.to_string(),
            season_type: SeasonType {
                name: "Aired Order".to_string(),
                kind: "official".to_string(),
                ..SeasonType::default()
            },
            ..Season::default()
        }
    }

    fn episode(id: i64, season_number: i32, number: i32, name: &str) -> Episode {
        Episode {
            id,
            season_number,
            number,
            name: name.to_string(),
            ..Episode::default()
        }
    }

    #[test]
    fn test_detect_season_type() {
        assert_eq!(detect_season_type(&[]), "official");
        let mut dvd = season(1, 1, "");
        dvd.season_type = SeasonType {
            name: "DVD Order".to_string(),
            ..SeasonType::default()
        };
        assert_eq!(detect_season_type(&[dvd]), "dvd order");
        assert_eq!(detect_season_type(&[season(1, 1, "")]), "official");
    }

    #[test]
    fn test_assemble_seasons_orders_and_localizes() {
        let seasons = vec![season(20, 2, ""), season(10, 1, "Pilot Season"), season(99, -1, "Bogus")];
        let episodes = vec![
            episode(103, 1, 2, "Second"),
            episode(102, 1, 1, "First (b)"),
            episode(101, 1, 1, "First (a)"),
            episode(201, 2, 1, ""),
            episode(301, 3, 1, "Orphan"),
            episode(999, -1, 1, "Dropped"),
        ];
        let localized = HashMap::from([(
            103,
            Episode {
                id: 103,
                name: "Zweite".to_string(),
                overview: "Lokalisiert".to_string(),
                ..Episode::default()
            },
        )]);
        let mut nameless = episodes[3].clone();
        nameless.abbreviation = "S02E01".to_string();
        let mut episodes = episodes;
        episodes[3] = nameless;

        let result = assemble_seasons(&seasons, &episodes, &localized);
        let numbers: Vec<u32> = result.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let first = &result[0];
        assert_eq!(first.name, "Pilot Season");
        assert_eq!(first.id, "tvdb:season:10");
        assert_eq!(first.season_type, "Aired Order");
        assert_eq!(first.episode_count, 3);
        let ids: Vec<i64> = first.episodes.iter().map(|e| e.tvdb_id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(first.episodes[2].name, "Zweite");
        assert_eq!(first.episodes[2].overview, "Lokalisiert");

        assert_eq!(result[1].name, "Season 2");
        assert_eq!(result[1].episodes[0].name, "S02E01");
        // Episodes may create seasons the season list never mentioned.
        assert_eq!(result[2].name, "Season 3");
        assert_eq!(result[2].id, "");
    }

    #[test]
    fn test_episode_image_is_a_still() {
        let mut ep = episode(1, 1, 1, "Pilot");
        ep.image = "/banners/episodes/1.jpg".to_string();
        let converted = convert_episode(&ep, None);
        let image = converted.image.unwrap();
        assert_eq!(image.image_type, "still");
        assert_eq!(image.url, "https://artworks.thetvdb.com/banners/episodes/1.jpg");
    }

    #[test]
    fn test_clamp_demo_seasons() {
        let make = |numbers: &[u32]| -> Vec<SeriesSeason> {
            numbers
                .iter()
                .map(|&number| SeriesSeason {
                    number,
                    ..SeriesSeason::default()
                })
                .collect()
        };

        let mut seasons = make(&[0, 1, 2]);
        clamp_demo_seasons(&mut seasons);
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].number, 1);

        let mut seasons = make(&[0, 2, 3]);
        clamp_demo_seasons(&mut seasons);
        assert_eq!(seasons.iter().map(|s| s.number).collect::<Vec<_>>(), vec![0]);

        let mut seasons = make(&[4]);
        clamp_demo_seasons(&mut seasons);
        assert_eq!(seasons[0].number, 4);
    }

    #[test]
    fn test_series_title_precedence() {
        let base = BaseRecord {
            name: "Base Name".to_string(),
            overview: "Base overview".to_string(),
            year: 0,
            ..BaseRecord::default()
        };
        let extended = SeriesExtended {
            name: "Extended Name".to_string(),
            year: 1954,
            network: "NBC".to_string(),
            poster: "/banners/posters/1.jpg".to_string(),
            status: Status {
                name: "Ended".to_string(),
            },
            remote_ids: vec![RemoteId {
                id: "tt0046641".to_string(),
                source_name: "IMDB".to_string(),
                ..RemoteId::default()
            }],
            artworks: vec![Artwork {
                image: "/banners/fanart/1.jpg".to_string(),
                artwork_type: "3".to_string(),
                ..Artwork::default()
            }],
            ..SeriesExtended::default()
        };

        let title = series_title(42, &base, &extended, None, "Requested", "eng");
        assert_eq!(title.id, "tvdb:series:42");
        assert_eq!(title.name, "Extended Name");
        assert_eq!(title.overview, "Base overview");
        assert_eq!(title.year, 1954);
        assert_eq!(title.imdb_id, "tt0046641");
        assert_eq!(title.status, "Ended");
        assert_eq!(title.network, "NBC");
        assert!(title.poster.is_some());
        assert!(title.backdrop.is_some());

        let translation = Translation {
            name: "Übersetzt".to_string(),
            ..Translation::default()
        };
        let title = series_title(42, &base, &extended, Some(&translation), "Requested", "deu");
        assert_eq!(title.name, "Übersetzt");
        assert_eq!(title.language, "deu");
    }
}
