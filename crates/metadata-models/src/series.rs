use serde::{Deserialize, Serialize};

use crate::media::Image;
use crate::title::Title;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesEpisode {
    pub id: String,
    #[serde(rename = "tvdbId")]
    pub tvdb_id: i64,
    pub name: String,
    pub overview: String,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub absolute_episode_number: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub aired_date: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub runtime_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

/// Season number 0 conventionally holds specials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesSeason {
    pub id: String,
    #[serde(rename = "tvdbId")]
    pub tvdb_id: i64,
    pub name: String,
    pub number: u32,
    pub overview: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub season_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    pub episodes: Vec<SeriesEpisode>,
    pub episode_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SeriesDetails {
    pub title: Title,
    pub seasons: Vec<SeriesSeason>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}
