//! TVDB v4 payloads. Every field is defaulted since the API omits or nulls freely.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodePage {
    #[serde(default)]
    pub data: EpisodePageData,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpisodePageData {
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
}

/// First run of four digits in a string, or the whole string as a number.
pub fn extract_year_candidate(value: &str) -> i32 {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() >= 4 {
        for window in bytes.windows(4) {
            if window.iter().all(u8::is_ascii_digit) {
                if let Ok(text) = std::str::from_utf8(window) {
                    if let Ok(year) = text.parse() {
                        return year;
                    }
                }
            }
        }
    }
    value.parse().unwrap_or(0)
}

/// Years arrive as numbers, strings like `"2019"`, or dates.
pub fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().map(|y| y as i32).unwrap_or(0),
        serde_json::Value::String(s) => extract_year_candidate(&s),
        _ => 0,
    })
}

/// Artwork types arrive as numeric codes or names.
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteId {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, rename = "type")]
    pub id_type: i64,
    #[serde(default, rename = "sourceName", deserialize_with = "null_as_empty")]
    pub source_name: String,
}

/// One hit from `/search`. Serializable so lookups can be cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub result_type: String,
    #[serde(default, rename = "objectID", deserialize_with = "null_as_empty")]
    pub object_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tvdb_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overviews: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub translations: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub primary_language: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_air_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub network: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remote_ids: Vec<RemoteId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

impl SearchResult {
    pub fn tvdb_id(&self) -> i64 {
        self.tvdb_id.trim().parse().unwrap_or(0)
    }

    pub fn year(&self) -> i32 {
        let year = extract_year_candidate(&self.year);
        if year > 0 {
            return year;
        }
        extract_year_candidate(&self.first_air_time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artwork {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub artwork_type: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Alias {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Translation {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, rename = "isPrimary")]
    pub is_primary: bool,
}

impl Translation {
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.overview.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeasonType {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Season {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "seriesId")]
    pub series_id: i64,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub season_type: SeasonType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub number: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "seriesId")]
    pub series_id: i64,
    #[serde(default, rename = "seasonNumber")]
    pub season_number: i32,
    #[serde(default)]
    pub number: i32,
    #[serde(default, rename = "absoluteNumber")]
    pub absolute_number: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub abbreviation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aired: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub runtime: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Trailer {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub runtime: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// `/series/{id}` and `/movies/{id}` base records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BaseRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<Alias>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesExtended {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default, rename = "originalLanguage", deserialize_with = "null_as_empty")]
    pub original_language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub network: String,
    #[serde(default, rename = "originalNetwork", deserialize_with = "null_as_default")]
    pub original_network: Option<Network>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fanart: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seasons: Vec<Season>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub episodes: Vec<Episode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trailers: Vec<Trailer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artworks: Vec<Artwork>,
    #[serde(default, rename = "remoteIds", deserialize_with = "null_as_default")]
    pub remote_ids: Vec<RemoteId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default, rename = "averageRuntime", deserialize_with = "null_as_default")]
    pub average_runtime: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Network {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieExtended {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub runtime: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trailers: Vec<Trailer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artworks: Vec<Artwork>,
    #[serde(default, rename = "remoteIds", deserialize_with = "null_as_default")]
    pub remote_ids: Vec<RemoteId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_candidate() {
        assert_eq!(extract_year_candidate("2019"), 2019);
        assert_eq!(extract_year_candidate("2008-01-20"), 2008);
        assert_eq!(extract_year_candidate(" aired 1999 "), 1999);
        assert_eq!(extract_year_candidate("abc"), 0);
        assert_eq!(extract_year_candidate("12"), 12);
    }

    #[test]
    fn test_lenient_decoding() {
        let record: BaseRecord =
            serde_json::from_str(r#"{"id": 1, "name": null, "year": "2011", "aliases": null}"#).unwrap();
        assert_eq!(record.year, 2011);
        assert_eq!(record.name, "");
        assert!(record.aliases.is_empty());

        let record: BaseRecord = serde_json::from_str(r#"{"id": 1, "year": 1994}"#).unwrap();
        assert_eq!(record.year, 1994);

        let art: Artwork = serde_json::from_str(r#"{"image": "/a.jpg", "type": 2}"#).unwrap();
        assert_eq!(art.artwork_type, "2");
        let art: Artwork = serde_json::from_str(r#"{"image": "/a.jpg", "type": "poster"}"#).unwrap();
        assert_eq!(art.artwork_type, "poster");
    }

    #[test]
    fn test_search_result_year_falls_back_to_first_air_time() {
        let hit: SearchResult = serde_json::from_str(
            r#"{"tvdb_id": "81189", "name": "Breaking Bad", "year": null, "first_air_time": "2008-01-20"}"#,
        )
        .unwrap();
        assert_eq!(hit.tvdb_id(), 81189);
        assert_eq!(hit.year(), 2008);
    }
}
