use serde::{Deserialize, Serialize};
use std::fmt;

use crate::title::Title;

/// Kind of catalog entry. Serialized as `movie` / `series`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[default]
    Series,
}

impl MediaType {
    /// Loose parse used by every request path.
    ///
    /// `movie`, `movies`, `film` and `films` map to [`MediaType::Movie`]; everything
    /// else (including the empty string, `tv` and `show`) is a series.
    pub fn parse_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" | "films" => MediaType::Movie,
            _ => MediaType::Series,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }

    /// Path segment TMDB uses for this kind (`movie` / `tv`).
    pub fn tmdb_segment(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }

    /// Media type name MDBList uses (`movie` / `show`).
    pub fn mdblist_segment(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "show",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(rename = "type")]
    pub image_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub width: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub height: u32,
}

impl Image {
    pub fn new(url: impl Into<String>, image_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            image_type: image_type.into(),
            width: 0,
            height: 0,
        }
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Movie franchise reference attached to a [`Title`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDetails {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<Image>,
    #[serde(default)]
    pub movies: Vec<Title>,
}
