use std::time::Duration;

use metadata_models::{
    CastMember, Collection, CollectionDetails, Credits, Image, MediaType, Release, ReleaseType, Title, Trailer,
    TrendingItem,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    CastEntry, CollectionResponse, CreditsResponse, ExternalIdsResponse, FindResponse, MovieResponse,
    ReleaseDatesResponse, TrendingResponse, Video, VideosResponse,
};
use crate::error::SourceError;
use crate::http::{self, RateLimiter, RetryPolicy};
use crate::language::tmdb_language;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

// Fixed sizes rather than "original" to keep payloads small.
pub const POSTER_SIZE: &str = "w780";
pub const BACKDROP_SIZE: &str = "w1280";
pub const PROFILE_SIZE: &str = "w185";

const MIN_INTERVAL: Duration = Duration::from_millis(20);
const MAX_CAST: usize = 8;

/// `{base}/{size}/{path}`, or `None` for an empty path.
pub fn build_image(base: &str, path: &str, size: &str, image_type: &str) -> Option<Image> {
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(Image::new(format!("{}/{}/{}", base, size, path), image_type))
}

/// Year from a `YYYY-MM-DD` date, 0 when absent.
fn parse_year(date: &str) -> i32 {
    date.trim()
        .get(..4)
        .and_then(|year| year.parse().ok())
        .unwrap_or(0)
}

/// TMDB v3 client authenticated with the `api_key` query parameter.
pub struct TmdbClient {
    http: Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl TmdbClient {
    pub fn new(api_key: &str, language: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key: api_key.trim().to_string(),
            language: tmdb_language(language),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_TMDB_IMAGE_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            limiter: RateLimiter::new(MIN_INTERVAL),
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

    /// Locale sent as `language` (`en-US` form).
    pub fn language(&self) -> &str {
        &self.language
    }

    fn image(&self, path: &str, size: &str, image_type: &str) -> Option<Image> {
        build_image(&self.image_base_url, path, size, image_type)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
        localized: bool,
    ) -> Result<T, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::NotConfigured("tmdb"));
        }
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        let mut query: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
        if localized {
            query.push(("language", self.language.clone()));
        }
        query.extend(extra.iter().cloned());
        let query = query.as_slice();
        debug!("[tmdb] GET {}", path);

        http::get_json("tmdb", &self.retry, &self.limiter, move || async move {
            Ok(self.http.get(url).query(query))
        })
        .await
    }

    /// `/trending/{movie|tv}/week`, ranked from 1 in response order.
    pub async fn trending(&self, media_type: MediaType) -> Result<Vec<TrendingItem>, SourceError> {
        let segment = media_type.tmdb_segment();
        let response: TrendingResponse = self.get(&format!("/trending/{}/week", segment), &[], true).await?;

        Ok(response
            .results
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let name = match media_type {
                    MediaType::Movie if !entry.title.is_empty() => entry.title,
                    _ if !entry.name.is_empty() => entry.name,
                    _ => entry.title,
                };
                let date = if entry.release_date.is_empty() {
                    &entry.first_air_date
                } else {
                    &entry.release_date
                };
                let popularity = if entry.popularity > 0.0 {
                    entry.popularity
                } else {
                    entry.vote_average.max(0.0)
                };
                let title = Title {
                    id: format!("tmdb:{}:{}", segment, entry.id),
                    name,
                    overview: entry.overview,
                    language: entry.original_language,
                    media_type,
                    tmdb_id: entry.id,
                    year: parse_year(date),
                    popularity,
                    poster: self.image(&entry.poster_path, POSTER_SIZE, "poster"),
                    backdrop: self.image(&entry.backdrop_path, BACKDROP_SIZE, "backdrop"),
                    ..Title::default()
                };
                TrendingItem {
                    rank: idx as u32 + 1,
                    title,
                }
            })
            .collect())
    }

    /// `/movie/{id}` with artwork, runtime, genres and the collection reference.
    pub async fn movie_details(&self, tmdb_id: i64) -> Result<Title, SourceError> {
        let movie: MovieResponse = self.get(&format!("/movie/{}", tmdb_id), &[], true).await?;

        let collection = movie.belongs_to_collection.map(|c| Collection {
            id: c.id,
            name: c.name,
            poster: self.image(&c.poster_path, POSTER_SIZE, "poster"),
            backdrop: self.image(&c.backdrop_path, BACKDROP_SIZE, "backdrop"),
        });
        let original_name = if movie.original_title != movie.title {
            movie.original_title
        } else {
            String::new()
        };

        Ok(Title {
            id: format!("tmdb:movie:{}", movie.id),
            name: movie.title,
            original_name,
            overview: movie.overview,
            language: movie.original_language,
            media_type: MediaType::Movie,
            tmdb_id: movie.id,
            imdb_id: movie.imdb_id.trim().to_string(),
            year: parse_year(&movie.release_date),
            popularity: movie.popularity,
            runtime_minutes: movie.runtime.unwrap_or(0),
            poster: self.image(&movie.poster_path, POSTER_SIZE, "poster"),
            backdrop: self.image(&movie.backdrop_path, BACKDROP_SIZE, "backdrop"),
            genres: movie
                .genres
                .into_iter()
                .map(|g| g.name)
                .filter(|name| !name.is_empty())
                .collect(),
            collection,
            ..Title::default()
        })
    }

    /// Every dated release across countries. `released` is left false for the caller to compute.
    pub async fn release_dates(&self, tmdb_id: i64) -> Result<Vec<Release>, SourceError> {
        let response: ReleaseDatesResponse =
            self.get(&format!("/movie/{}/release_dates", tmdb_id), &[], false).await?;

        let mut releases = Vec::new();
        for country in response.results {
            let country_code = country.iso_3166_1.trim().to_string();
            for entry in country.release_dates {
                let Some(release_type) = ReleaseType::from_tmdb_code(entry.release_type) else {
                    continue;
                };
                let mut note = entry.note.trim().to_string();
                if note.is_empty() && release_type == ReleaseType::TheatricalLimited {
                    note = "Limited".to_string();
                }
                releases.push(Release {
                    release_type,
                    date: entry.release_date.trim().to_string(),
                    country: country_code.clone(),
                    note,
                    source: "tmdb".to_string(),
                    primary: false,
                    released: false,
                });
            }
        }
        Ok(releases)
    }

    /// Top-billed cast. Series use `aggregate_credits` and take the character from the first role.
    pub async fn credits(&self, media_type: MediaType, tmdb_id: i64) -> Result<Credits, SourceError> {
        let path = match media_type {
            MediaType::Movie => format!("/movie/{}/credits", tmdb_id),
            MediaType::Series => format!("/tv/{}/aggregate_credits", tmdb_id),
        };
        let response: CreditsResponse = self.get(&path, &[], true).await?;

        let cast = response
            .cast
            .into_iter()
            .take(MAX_CAST)
            .map(|entry| self.cast_member(entry, media_type))
            .collect();
        Ok(Credits { cast })
    }

    fn cast_member(&self, entry: CastEntry, media_type: MediaType) -> CastMember {
        let character = match media_type {
            MediaType::Movie => entry.character.trim().to_string(),
            MediaType::Series => entry
                .roles
                .first()
                .map(|role| role.character.trim().to_string())
                .unwrap_or_default(),
        };
        let profile_url = self
            .image(&entry.profile_path, PROFILE_SIZE, "profile")
            .map(|image| image.url)
            .unwrap_or_default();
        CastMember {
            id: entry.id,
            name: entry.name.trim().to_string(),
            character,
            order: entry.order,
            profile_path: entry.profile_path,
            profile_url,
        }
    }

    /// IMDB id from `/{movie|tv}/{id}/external_ids`; empty when TMDB has none.
    pub async fn imdb_id(&self, media_type: MediaType, tmdb_id: i64) -> Result<String, SourceError> {
        let path = format!("/{}/{}/external_ids", media_type.tmdb_segment(), tmdb_id);
        let response: ExternalIdsResponse = self.get(&path, &[], false).await?;
        Ok(response.imdb_id.trim().to_string())
    }

    /// TMDB movie id for an IMDB id, `Ok(None)` when TMDB knows no such movie.
    pub async fn find_movie_by_imdb(&self, imdb_id: &str) -> Result<Option<i64>, SourceError> {
        let imdb_id = imdb_id.trim();
        if imdb_id.is_empty() {
            return Ok(None);
        }
        let imdb_id = if imdb_id.starts_with("tt") {
            imdb_id.to_string()
        } else {
            format!("tt{}", imdb_id)
        };
        let response: FindResponse = self
            .get(
                &format!("/find/{}", urlencoding::encode(&imdb_id)),
                &[("external_source", "imdb_id".to_string())],
                false,
            )
            .await?;
        Ok(response.movie_results.first().map(|entry| entry.id))
    }

    pub async fn videos(&self, media_type: MediaType, tmdb_id: i64) -> Result<Vec<Trailer>, SourceError> {
        let path = format!("/{}/{}/videos", media_type.tmdb_segment(), tmdb_id);
        let response: VideosResponse = self.get(&path, &[], true).await?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|video| video_to_trailer(video, 0))
            .collect())
    }

    pub async fn season_videos(&self, tmdb_id: i64, season_number: u32) -> Result<Vec<Trailer>, SourceError> {
        let path = format!("/tv/{}/season/{}/videos", tmdb_id, season_number);
        let response: VideosResponse = self.get(&path, &[], true).await?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|video| video_to_trailer(video, season_number))
            .collect())
    }

    /// `/collection/{id}` with its parts ordered by year.
    pub async fn collection(&self, collection_id: i64) -> Result<CollectionDetails, SourceError> {
        let response: CollectionResponse = self.get(&format!("/collection/{}", collection_id), &[], true).await?;

        let mut movies: Vec<Title> = response
            .parts
            .into_iter()
            .map(|part| Title {
                id: format!("tmdb:movie:{}", part.id),
                name: part.title,
                overview: part.overview,
                media_type: MediaType::Movie,
                tmdb_id: part.id,
                year: parse_year(&part.release_date),
                popularity: part.popularity,
                poster: self.image(&part.poster_path, POSTER_SIZE, "poster"),
                backdrop: self.image(&part.backdrop_path, BACKDROP_SIZE, "backdrop"),
                ..Title::default()
            })
            .collect();
        movies.sort_by_key(|movie| movie.year);

        Ok(CollectionDetails {
            id: response.id,
            name: response.name,
            overview: response.overview,
            poster: self.image(&response.poster_path, POSTER_SIZE, "poster"),
            backdrop: self.image(&response.backdrop_path, BACKDROP_SIZE, "backdrop"),
            movies,
        })
    }
}

fn video_to_trailer(video: Video, season_number: u32) -> Option<Trailer> {
    let key = video.key.trim().to_string();
    if key.is_empty() {
        return None;
    }
    let site = video.site.trim().to_string();
    let (url, embed_url, thumbnail_url) = match site.to_lowercase().as_str() {
        "youtube" => (
            format!("https://www.youtube.com/watch?v={}", key),
            format!("https://www.youtube.com/embed/{}", key),
            format!("https://img.youtube.com/vi/{}/hqdefault.jpg", key),
        ),
        "vimeo" => (
            format!("https://vimeo.com/{}", key),
            format!("https://player.vimeo.com/video/{}", key),
            String::new(),
        ),
        _ => (key.clone(), String::new(), String::new()),
    };
    Some(Trailer {
        name: video.name.trim().to_string(),
        site,
        trailer_type: video.video_type.trim().to_string(),
        url,
        embed_url,
        thumbnail_url,
        language: video.iso_639_1.trim().to_string(),
        country: video.iso_3166_1.trim().to_string(),
        key,
        official: video.official,
        published_at: video.published_at.trim().to_string(),
        resolution: video.size,
        source: "tmdb".to_string(),
        duration_seconds: 0,
        season_number,
    })
}
