//! HTTP clients for the upstream catalogs (TVDB, TMDB, MDBList).
//!
//! Every client shares the retrying request helper in [`http`], owns its own
//! rate limiter, and accepts an overridable base URL so tests can point it at
//! a local mock server.

pub mod error;
pub mod http;
pub mod language;
pub mod mdblist;
pub mod tmdb;
pub mod tvdb;

pub use error::SourceError;
pub use http::{RateLimiter, RetryPolicy};
pub use mdblist::{MdbListClient, MdbListItem, MdbListRatingsConfig};
pub use tmdb::TmdbClient;
pub use tvdb::TvdbClient;
