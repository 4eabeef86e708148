pub mod config;
pub mod paths;

pub use config::{
    CacheSettings, LoggingSettings, MdbListSettings, MetadataSettings, Settings, TrendingMovieSource,
    KNOWN_RATING_SOURCES,
};
pub use paths::{container_base_path, PathManager};
