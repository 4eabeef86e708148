use super::{render, Context};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use metadata_config::TrendingMovieSource;
use serde_json::json;

pub async fn run_trending(ctx: &Context, media_type: &str, source: Option<String>, output: &Output) -> Result<()> {
    let source = match source {
        Some(value) => value.parse::<TrendingMovieSource>().map_err(|e| eyre!("{}", e))?,
        None => ctx.settings.metadata.trending_movie_source,
    };
    let service = ctx.service()?;
    let items = service.trending(media_type, source).await?;
    output.data(&items, |items| render::trending(items));
    Ok(())
}

pub async fn run_search(ctx: &Context, query: &str, media_type: &str, output: &Output) -> Result<()> {
    if query.trim().is_empty() {
        return Err(eyre!("Search query cannot be empty"));
    }
    let service = ctx.service()?;
    let results = service.search(query, media_type).await?;
    output.data(&results, |results| render::search(results));
    Ok(())
}

pub async fn run_list(ctx: &Context, url: &str, limit: usize, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let (items, total) = service.custom_list(url, limit).await?;
    if output.is_human() {
        output.data(&items, |items| render::trending(items));
        output.info(format!("Showing {} of {} items", items.len(), total));
    } else {
        output.data(&json!({ "items": items, "total": total }), |_| {});
    }
    Ok(())
}

pub async fn run_collection(ctx: &Context, id: i64, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let collection = service.collection(id).await?;
    output.data(&collection, render::collection);
    Ok(())
}
