use serde::{Deserialize, Serialize};

use crate::credits::Credits;
use crate::media::{Collection, Image, MediaType};
use crate::rating::Rating;
use crate::release::Release;
use crate::trailer::Trailer;

/// Canonical merged record for a movie or series.
///
/// `id` is a composite of source, kind and native id (`tvdb:series:81189`,
/// `tmdb:movie:603`) and stays stable across cache refreshes.
/// `theatrical_release` / `home_release` always mirror the entry in `releases`
/// that carries the `primary` flag for their bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Title {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub original_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternate_titles: Vec<String>,
    pub overview: String,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub year: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<Image>,
    pub media_type: MediaType,
    #[serde(rename = "tvdbId", skip_serializing_if = "is_zero_i64")]
    pub tvdb_id: i64,
    #[serde(rename = "imdbId", skip_serializing_if = "String::is_empty")]
    pub imdb_id: String,
    #[serde(rename = "tmdbId", skip_serializing_if = "is_zero_i64")]
    pub tmdb_id: i64,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub popularity: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_trailer: Option<Trailer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<Trailer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub releases: Vec<Release>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theatrical_release: Option<Release>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_release: Option<Release>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ratings: Vec<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<Credits>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub runtime_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl Title {
    pub fn has_credits(&self) -> bool {
        self.credits.as_ref().map(|c| !c.is_empty()).unwrap_or(false)
    }
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// Entry of a trending feed. `rank` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingItem {
    pub rank: u32,
    pub title: Title,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: Title,
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_wire_format_uses_camel_case_ids() {
        let title = Title {
            id: "tvdb:series:1".to_string(),
            name: "Example".to_string(),
            tvdb_id: 1,
            imdb_id: "tt0000001".to_string(),
            ..Title::default()
        };
        let json = serde_json::to_value(&title).unwrap();
        assert_eq!(json["tvdbId"], 1);
        assert_eq!(json["imdbId"], "tt0000001");
        assert_eq!(json["mediaType"], "series");
        assert!(json.get("tmdbId").is_none());
        assert!(json.get("poster").is_none());
    }

    #[test]
    fn test_title_tolerates_sparse_json() {
        let title: Title = serde_json::from_str(r#"{"id":"x","name":"Only Name"}"#).unwrap();
        assert_eq!(title.name, "Only Name");
        assert_eq!(title.media_type, MediaType::Series);
        assert!(title.releases.is_empty());
    }
}
