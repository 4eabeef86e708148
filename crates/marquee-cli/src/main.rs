use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{catalog, clear, config, titles, Context};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee - movie and TV metadata from TVDB, TMDB and MDBList")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked trending movies or series
    #[command(long_about = "Show this week's trending titles. Movies follow metadata.trending_movie_source unless --source is given: 'released' uses the MDBList feed of movies already out, 'all' prefers TMDB trending.")]
    Trending {
        /// movie or series
        #[arg(default_value = "series")]
        media_type: String,

        /// all or released (movies only)
        #[arg(long)]
        source: Option<String>,
    },
    /// Free-text search against TVDB
    Search {
        query: String,

        /// movie or series
        #[arg(long = "type", short = 't', default_value = "series")]
        media_type: String,
    },
    /// Series details with seasons and episodes
    Series {
        /// Series name, used when no id is given
        name: Option<String>,

        #[arg(long, default_value_t = 0)]
        year: i32,

        #[arg(long, value_name = "ID")]
        title_id: Option<String>,

        #[arg(long, default_value_t = 0)]
        tvdb_id: i64,

        #[arg(long, default_value_t = 0)]
        tmdb_id: i64,

        /// Title-level metadata only, without episodes
        #[arg(long, action = ArgAction::SetTrue)]
        info: bool,
    },
    /// Details for many series from a JSON file of queries
    #[command(long_about = "Read a JSON array of series queries (objects with any of titleId, name, year, tvdbId, tmdbId) and fetch details for each. Failures are reported per item.")]
    BatchSeries {
        file: PathBuf,
    },
    /// Movie details with releases, ratings and cast
    Movie {
        /// Movie name, used when no id is given
        name: Option<String>,

        #[arg(long, default_value_t = 0)]
        year: i32,

        #[arg(long, value_name = "ID")]
        title_id: Option<String>,

        #[arg(long)]
        imdb_id: Option<String>,

        #[arg(long, default_value_t = 0)]
        tmdb_id: i64,

        #[arg(long, default_value_t = 0)]
        tvdb_id: i64,

        /// Skip ratings
        #[arg(long, action = ArgAction::SetTrue)]
        info: bool,
    },
    /// Theatrical and home release windows for movies
    Releases {
        /// TMDB movie id (repeatable)
        #[arg(long = "tmdb-id", value_name = "ID")]
        tmdb_ids: Vec<i64>,

        /// IMDB id (repeatable)
        #[arg(long = "imdb-id", value_name = "ID")]
        imdb_ids: Vec<String>,
    },
    /// Trailers for a title and the best pick among them
    Trailers {
        /// movie or series
        #[arg(long = "type", short = 't', default_value = "series")]
        media_type: String,

        #[arg(long, value_name = "ID")]
        title_id: Option<String>,

        #[arg(long)]
        imdb_id: Option<String>,

        #[arg(long, default_value_t = 0)]
        tmdb_id: i64,

        #[arg(long, default_value_t = 0)]
        tvdb_id: i64,

        /// Prefer trailers for this season
        #[arg(long, default_value_t = 0)]
        season: u32,
    },
    /// A public MDBList list enriched with metadata
    List {
        url: String,

        /// Maximum items to enrich (0 for all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// IMDB id for a title name
    ResolveImdb {
        title: String,

        #[arg(long = "type", short = 't', default_value = "movie")]
        media_type: String,

        #[arg(long, default_value_t = 0)]
        year: i32,
    },
    /// Alternate names TVDB knows for a title
    Aliases {
        tvdb_id: i64,

        #[arg(long = "type", short = 't', default_value = "series")]
        media_type: String,
    },
    /// A TMDB movie collection
    Collection {
        id: i64,
    },
    /// View or edit configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Clear cached data
    Clear {
        /// Clear the metadata and ID caches
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks API keys)
    Show {
        /// Show API keys unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Set a dotted key such as metadata.tvdb_api_key
    #[command(long_about = "Set one configuration value by dotted key, e.g. 'marquee config set metadata.language fr'. Changing an API key or the language clears the metadata cache.")]
    Set {
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let ctx = Context::load(cli.config.clone())?;

    logging::init_logging(cli.verbose, cli.quiet, &ctx.settings.logging).map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Trending { media_type, source } => catalog::run_trending(&ctx, &media_type, source, &output).await,
        Commands::Search { query, media_type } => catalog::run_search(&ctx, &query, &media_type, &output).await,
        Commands::Series {
            name,
            year,
            title_id,
            tvdb_id,
            tmdb_id,
            info,
        } => {
            let query = metadata_models::SeriesDetailsQuery {
                title_id: title_id.unwrap_or_default(),
                name: name.unwrap_or_default(),
                year,
                tvdb_id,
                tmdb_id,
            };
            titles::run_series(&ctx, query, info, &output).await
        }
        Commands::BatchSeries { file } => titles::run_batch_series(&ctx, &file, &output).await,
        Commands::Movie {
            name,
            year,
            title_id,
            imdb_id,
            tmdb_id,
            tvdb_id,
            info,
        } => {
            let query = metadata_models::MovieDetailsQuery {
                title_id: title_id.unwrap_or_default(),
                name: name.unwrap_or_default(),
                year,
                imdb_id: imdb_id.unwrap_or_default(),
                tmdb_id,
                tvdb_id,
            };
            titles::run_movie(&ctx, query, info, &output).await
        }
        Commands::Releases { tmdb_ids, imdb_ids } => titles::run_releases(&ctx, tmdb_ids, imdb_ids, &output).await,
        Commands::Trailers {
            media_type,
            title_id,
            imdb_id,
            tmdb_id,
            tvdb_id,
            season,
        } => {
            let query = metadata_models::TrailerQuery {
                media_type: metadata_models::MediaType::parse_loose(&media_type),
                title_id: title_id.unwrap_or_default(),
                imdb_id: imdb_id.unwrap_or_default(),
                tmdb_id,
                tvdb_id,
                season_number: season,
                ..Default::default()
            };
            titles::run_trailers(&ctx, query, &output).await
        }
        Commands::List { url, limit } => catalog::run_list(&ctx, &url, limit, &output).await,
        Commands::ResolveImdb { title, media_type, year } => {
            titles::run_resolve_imdb(&ctx, &title, &media_type, year, &output).await
        }
        Commands::Aliases { tvdb_id, media_type } => titles::run_aliases(&ctx, tvdb_id, &media_type, &output).await,
        Commands::Collection { id } => catalog::run_collection(&ctx, id, &output).await,
        Commands::Config { cmd } => config::run_config(&ctx, cmd, &output).await,
        Commands::Clear { cache } => clear::run_clear(&ctx, cache, &output).await,
    }
}
