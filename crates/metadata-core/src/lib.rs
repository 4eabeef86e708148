pub mod artwork;
pub mod cache;
pub mod demo;
pub mod error;
pub mod ids;
pub mod releases;
pub mod resolver;
pub mod service;
pub mod single_flight;
pub mod trailers;

pub use cache::{cache_key, CacheError, FileCache};
pub use error::{MetadataError, Result};
pub use service::{ratings_config, Endpoints, MetadataService, ServiceOptions};
pub use single_flight::SingleFlight;
