use metadata_models::{MediaType, Trailer, TrailerQuery, TrailerResponse};
use metadata_sources::{TmdbClient, TvdbClient};
use tracing::{debug, instrument, warn};

use super::MetadataService;
use crate::cache::cache_key;
use crate::error::Result;
use crate::ids::{parse_tmdb_id, parse_tvdb_id};
use crate::trailers::{convert_tvdb_trailers, dedupe_trailers, score_trailer, select_primary, select_primary_for_season};

impl MetadataService {
    /// Every known trailer for a title plus the best pick among them.
    ///
    /// Candidates come from TMDB season videos (season requests only), TMDB
    /// title videos and TVDB. Source failures are logged and skipped, so the
    /// response is at worst empty.
    #[instrument(skip(self), fields(title_id = %query.title_id, season = query.season_number))]
    pub async fn trailers(&self, query: &TrailerQuery) -> Result<TrailerResponse> {
        let _lease = self.lease().await;
        let tvdb = self.tvdb().await;
        let tmdb = self.tmdb().await;
        let media_type = query.media_type;

        let mut tmdb_id = if query.tmdb_id > 0 {
            query.tmdb_id
        } else {
            parse_tmdb_id(&query.title_id)
        };
        if tmdb_id <= 0 && media_type == MediaType::Movie && tmdb.is_configured() {
            tmdb_id = self.tmdb_for_imdb(&tmdb, &query.imdb_id).await;
        }
        let tvdb_id = if query.tvdb_id > 0 {
            query.tvdb_id
        } else {
            parse_tvdb_id(&query.title_id)
        };
        debug!(
            "[metadata] trailers request type={} tmdbId={} tvdbId={} name={:?}",
            media_type.as_str(),
            tmdb_id,
            tvdb_id,
            query.name
        );

        let mut combined = Vec::new();
        if tmdb_id > 0 && tmdb.is_configured() {
            if media_type == MediaType::Series && query.season_number > 0 {
                match self.tmdb_season_trailers(&tmdb, tmdb_id, query.season_number).await {
                    Ok(trailers) => combined.extend(trailers),
                    Err(e) => warn!(
                        "[metadata] tmdb season trailers fetch failed tmdbId={} season={} err={}",
                        tmdb_id, query.season_number, e
                    ),
                }
            }
            match self.tmdb_trailers(&tmdb, media_type, tmdb_id).await {
                Ok(trailers) => combined.extend(trailers),
                Err(e) => warn!(
                    "[metadata] tmdb trailers fetch failed type={} tmdbId={} err={}",
                    media_type.as_str(),
                    tmdb_id,
                    e
                ),
            }
        }
        if tvdb_id > 0 && tvdb.is_configured() {
            match self.tvdb_trailers(&tvdb, media_type, tvdb_id).await {
                Ok(trailers) => combined.extend(trailers),
                Err(e) => warn!(
                    "[metadata] tvdb trailers fetch failed type={} tvdbId={} err={}",
                    media_type.as_str(),
                    tvdb_id,
                    e
                ),
            }
        }

        let trailers = dedupe_trailers(combined);
        for (index, trailer) in trailers.iter().enumerate() {
            debug!(
                "[metadata] trailer[{}]: name={:?} type={:?} official={} season={} lang={:?} res={} source={:?} score={}",
                index,
                trailer.name,
                trailer.trailer_type,
                trailer.official,
                trailer.season_number,
                trailer.language,
                trailer.resolution,
                trailer.source,
                score_trailer(trailer)
            );
        }

        let primary = if query.season_number > 0 {
            select_primary_for_season(&trailers, query.season_number)
        } else {
            None
        }
        .or_else(|| select_primary(&trailers))
        .cloned();

        Ok(TrailerResponse {
            primary_trailer: primary,
            trailers,
        })
    }

    async fn tmdb_season_trailers(&self, tmdb: &TmdbClient, tmdb_id: i64, season: u32) -> Result<Vec<Trailer>> {
        let key = cache_key(&[
            "tmdb",
            "trailers",
            "season",
            &tmdb_id.to_string(),
            &season.to_string(),
            tmdb.language(),
        ]);
        if let Some(cached) = self.cache.lookup(&key).await {
            return Ok(cached);
        }
        let trailers = tmdb.season_videos(tmdb_id, season).await?;
        self.cache.store(&key, &trailers).await;
        Ok(trailers)
    }

    async fn tmdb_trailers(&self, tmdb: &TmdbClient, media_type: MediaType, tmdb_id: i64) -> Result<Vec<Trailer>> {
        let key = cache_key(&[
            "tmdb",
            "trailers",
            media_type.as_str(),
            &tmdb_id.to_string(),
            tmdb.language(),
        ]);
        if let Some(cached) = self.cache.lookup(&key).await {
            return Ok(cached);
        }
        let trailers = tmdb.videos(media_type, tmdb_id).await?;
        self.cache.store(&key, &trailers).await;
        Ok(trailers)
    }

    async fn tvdb_trailers(&self, tvdb: &TvdbClient, media_type: MediaType, tvdb_id: i64) -> Result<Vec<Trailer>> {
        let key = cache_key(&["tvdb", "trailers", media_type.as_str(), &tvdb_id.to_string()]);
        if let Some(cached) = self.cache.lookup(&key).await {
            return Ok(cached);
        }
        let source = match media_type {
            MediaType::Movie => tvdb.movie_extended(tvdb_id, &["trailers"]).await?.trailers,
            MediaType::Series => tvdb.series_extended(tvdb_id, &["trailers"]).await?.trailers,
        };
        let trailers = convert_tvdb_trailers(&source);
        self.cache.store(&key, &trailers).await;
        Ok(trailers)
    }
}
