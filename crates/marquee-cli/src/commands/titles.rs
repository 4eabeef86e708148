use super::{render, Context};
use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use metadata_models::{BatchMovieReleasesQuery, MediaType, MovieDetailsQuery, SeriesDetailsQuery, TrailerQuery};
use serde_json::json;
use std::path::Path;

pub async fn run_series(ctx: &Context, query: SeriesDetailsQuery, info: bool, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    if info {
        let title = service.series_info(&query).await?;
        output.data(&title, render::title);
    } else {
        let details = service.series_details(&query).await?;
        output.data(&details, render::series);
    }
    Ok(())
}

/// Reads a JSON array of series queries.
pub fn read_series_queries(path: &Path) -> Result<Vec<SeriesDetailsQuery>> {
    let content =
        std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let queries: Vec<SeriesDetailsQuery> =
        serde_json::from_str(&content).wrap_err_with(|| format!("Failed to parse series queries in {}", path.display()))?;
    Ok(queries)
}

pub async fn run_batch_series(ctx: &Context, path: &Path, output: &Output) -> Result<()> {
    let queries = read_series_queries(path)?;
    if queries.is_empty() {
        output.warn("No queries in file");
        return Ok(());
    }
    let service = ctx.service()?;
    let items = service.batch_series_details(&queries).await;
    let failed = items.iter().filter(|item| item.error.is_some()).count();
    output.data(&items, |items| render::batch_series(items));
    if failed > 0 {
        output.warn(format!("{} of {} queries failed", failed, items.len()));
    }
    Ok(())
}

pub async fn run_movie(ctx: &Context, query: MovieDetailsQuery, info: bool, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let title = if info {
        service.movie_info(&query).await?
    } else {
        service.movie_details(&query).await?
    };
    output.data(&title, render::title);
    Ok(())
}

/// One query per id, TMDB ids first.
pub fn release_queries(tmdb_ids: Vec<i64>, imdb_ids: Vec<String>) -> Vec<BatchMovieReleasesQuery> {
    let by_tmdb = tmdb_ids.into_iter().map(|tmdb_id| BatchMovieReleasesQuery {
        tmdb_id,
        ..BatchMovieReleasesQuery::default()
    });
    let by_imdb = imdb_ids.into_iter().map(|imdb_id| BatchMovieReleasesQuery {
        imdb_id,
        ..BatchMovieReleasesQuery::default()
    });
    by_tmdb.chain(by_imdb).collect()
}

pub async fn run_releases(ctx: &Context, tmdb_ids: Vec<i64>, imdb_ids: Vec<String>, output: &Output) -> Result<()> {
    let queries = release_queries(tmdb_ids, imdb_ids);
    if queries.is_empty() {
        return Err(eyre!("Provide at least one --tmdb-id or --imdb-id"));
    }
    let service = ctx.service()?;
    let items = service.batch_movie_releases(&queries).await;
    output.data(&items, |items| render::releases(items));
    Ok(())
}

pub async fn run_trailers(ctx: &Context, query: TrailerQuery, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let response = service.trailers(&query).await?;
    output.data(&response, render::trailers);
    Ok(())
}

pub async fn run_resolve_imdb(ctx: &Context, title: &str, media_type: &str, year: i32, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let media_type = MediaType::parse_loose(media_type);
    match service.resolve_imdb_id(title, media_type, year).await {
        Some(imdb_id) => {
            if output.is_human() {
                output.success(&imdb_id);
            } else {
                output.data(&json!({ "title": title, "imdbId": imdb_id }), |_| {});
            }
            Ok(())
        }
        None => Err(eyre!("No IMDB id found for {:?}", title)),
    }
}

pub async fn run_aliases(ctx: &Context, tvdb_id: i64, media_type: &str, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let aliases = service.aliases(MediaType::parse_loose(media_type), tvdb_id).await?;
    output.data(&aliases, |aliases| {
        if aliases.is_empty() {
            println!("No aliases");
        }
        for alias in aliases {
            println!("{}", alias);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_release_queries_keep_argument_order() {
        let queries = release_queries(vec![603, 550], vec!["tt0013442".to_string()]);
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].tmdb_id, 603);
        assert_eq!(queries[1].tmdb_id, 550);
        assert_eq!(queries[2].imdb_id, "tt0013442");
        assert_eq!(queries[2].tmdb_id, 0);
    }

    #[test]
    fn test_read_series_queries_accepts_sparse_objects() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Dark", "year": 2017}}, {{"titleId": "tvdb:series:81189"}}, {{"tvdbId": 121361}}]"#
        )
        .unwrap();

        let queries = read_series_queries(file.path()).unwrap();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].name, "Dark");
        assert_eq!(queries[1].title_id, "tvdb:series:81189");
        assert_eq!(queries[2].tvdb_id, 121361);
    }

    #[test]
    fn test_read_series_queries_rejects_non_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "Dark"}}"#).unwrap();
        assert!(read_series_queries(file.path()).is_err());
    }
}
