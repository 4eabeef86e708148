mod client;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{TvdbClient, DEFAULT_TVDB_BASE_URL};
pub use types::{
    extract_year_candidate, Alias, Artwork, BaseRecord, Episode, Genre, MovieExtended, RemoteId, SearchResult, Season,
    SeasonType, SeriesExtended, Status, Trailer, Translation,
};
