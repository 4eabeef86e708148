use serde::{Deserialize, Deserializer};

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingResponse {
    #[serde(default)]
    pub results: Vec<TrendingEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingEntry {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_air_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieResponse {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub imdb_id: String,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genres: Vec<NamedEntry>,
    #[serde(default)]
    pub belongs_to_collection: Option<CollectionRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionRef {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionResponse {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
    #[serde(default)]
    pub parts: Vec<CollectionPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionPart {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backdrop_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseDatesResponse {
    #[serde(default)]
    pub results: Vec<ReleaseCountry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseCountry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default, rename = "type")]
    pub release_type: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreditsResponse {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CastEntry {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub character: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub profile_path: String,
    /// Only present on `aggregate_credits`.
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Role {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub character: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalIdsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub imdb_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindResponse {
    #[serde(default)]
    pub movie_results: Vec<FindEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindEntry {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideosResponse {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Video {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub site: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub published_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub iso_639_1: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub iso_3166_1: String,
    #[serde(default)]
    pub size: u32,
}
