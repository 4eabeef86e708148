pub mod credits;
pub mod media;
pub mod query;
pub mod rating;
pub mod release;
pub mod series;
pub mod title;
pub mod trailer;

pub use credits::{CastMember, Credits};
pub use media::{Collection, CollectionDetails, Image, MediaType};
pub use query::{
    BatchMovieReleasesItem, BatchMovieReleasesQuery, BatchSeriesDetailsItem, MovieDetailsQuery,
    SeriesDetailsQuery, TrailerQuery,
};
pub use rating::Rating;
pub use release::{Release, ReleaseType};
pub use series::{SeriesDetails, SeriesEpisode, SeriesSeason};
pub use title::{SearchResult, Title, TrendingItem};
pub use trailer::{Trailer, TrailerResponse};
