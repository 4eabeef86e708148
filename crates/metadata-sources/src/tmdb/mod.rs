mod client;
mod types;


pub use client::{
    build_image, TmdbClient, BACKDROP_SIZE, DEFAULT_TMDB_BASE_URL, DEFAULT_TMDB_IMAGE_BASE_URL, POSTER_SIZE,
    PROFILE_SIZE,
};
