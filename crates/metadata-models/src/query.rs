use serde::{Deserialize, Serialize};

use crate::media::MediaType;
use crate::release::Release;
use crate::series::SeriesDetails;

/// Loosely specified series lookup. Any subset of fields may be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesDetailsQuery {
    pub title_id: String,
    pub name: String,
    pub year: i32,
    #[serde(rename = "tvdbId")]
    pub tvdb_id: i64,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieDetailsQuery {
    pub title_id: String,
    pub name: String,
    pub year: i32,
    #[serde(rename = "imdbId")]
    pub imdb_id: String,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: i64,
    #[serde(rename = "tvdbId")]
    pub tvdb_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TrailerQuery {
    pub media_type: MediaType,
    pub title_id: String,
    pub name: String,
    pub year: i32,
    #[serde(rename = "imdbId")]
    pub imdb_id: String,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: i64,
    #[serde(rename = "tvdbId")]
    pub tvdb_id: i64,
    pub season_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchSeriesDetailsItem {
    pub query: SeriesDetailsQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<SeriesDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchMovieReleasesQuery {
    pub title_id: String,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: i64,
    #[serde(rename = "imdbId")]
    pub imdb_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchMovieReleasesItem {
    pub query: BatchMovieReleasesQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theatrical_release: Option<Release>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_release: Option<Release>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
