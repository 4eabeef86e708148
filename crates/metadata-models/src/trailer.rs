use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Trailer {
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub trailer_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub embed_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    pub official: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub published_at: String,
    pub resolution: u32,
    pub source: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub duration_seconds: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub season_number: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrailerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_trailer: Option<Trailer>,
    #[serde(default)]
    pub trailers: Vec<Trailer>,
}
