//! Human-readable tables for command results.

use comfy_table::{Attribute, Cell, Color, Table};
use metadata_models::{
    BatchMovieReleasesItem, BatchSeriesDetailsItem, CollectionDetails, Release, SearchResult, SeriesDetails, Title,
    TrailerResponse, TrendingItem,
};
use owo_colors::OwoColorize;

const OVERVIEW_WIDTH: usize = 200;
const CAST_SHOWN: usize = 5;

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn heading(text: &str) -> Cell {
    Cell::new(text).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

fn year(value: i32) -> String {
    if value > 0 {
        value.to_string()
    } else {
        "-".to_string()
    }
}

fn release_cell(release: Option<&Release>) -> String {
    match release {
        Some(r) => {
            let mark = if r.released { "✓".green().to_string() } else { "…".yellow().to_string() };
            let country = if r.country.is_empty() { String::new() } else { format!(" {}", r.country) };
            format!("{} {}{}", mark, r.date.get(..10).unwrap_or(&r.date), country)
        }
        None => "-".to_string(),
    }
}

fn external_ids(title: &Title) -> String {
    let mut ids = Vec::new();
    if title.tvdb_id > 0 {
        ids.push(format!("tvdb {}", title.tvdb_id));
    }
    if title.tmdb_id > 0 {
        ids.push(format!("tmdb {}", title.tmdb_id));
    }
    if !title.imdb_id.is_empty() {
        ids.push(title.imdb_id.clone());
    }
    ids.join(", ")
}

fn header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
}

pub fn trending(items: &[TrendingItem]) {
    if items.is_empty() {
        println!("{}", "No titles found".bright_black());
        return;
    }
    let mut t = table();
    t.set_header(vec![bold("#"), bold("Title"), bold("Year"), bold("IDs"), bold("Poster")]);
    for item in items {
        t.add_row(vec![
            Cell::new(item.rank),
            Cell::new(&item.title.name),
            Cell::new(year(item.title.year)),
            Cell::new(external_ids(&item.title)),
            Cell::new(if item.title.poster.is_some() { "✓" } else { "" }),
        ]);
    }
    println!("{}", t);
}

pub fn search(results: &[SearchResult]) {
    if results.is_empty() {
        println!("{}", "No results".bright_black());
        return;
    }
    let mut t = table();
    t.set_header(vec![bold("Title"), bold("Year"), bold("Type"), bold("ID"), bold("Score")]);
    for result in results {
        let title = &result.title;
        let name = if title.original_name.is_empty() {
            title.name.clone()
        } else {
            format!("{} ({})", title.name, title.original_name)
        };
        t.add_row(vec![
            Cell::new(name),
            Cell::new(year(title.year)),
            Cell::new(title.media_type.as_str()),
            Cell::new(&title.id),
            Cell::new(result.score),
        ]);
    }
    println!("{}", t);
}

pub fn title(title: &Title) {
    header(&format!("{} ({})", title.name, year(title.year)));
    let mut t = table();
    t.set_header(vec![heading("Field"), heading("Value")]);
    t.add_row(vec![Cell::new("ID"), Cell::new(&title.id)]);
    t.add_row(vec![Cell::new("Type"), Cell::new(title.media_type.as_str())]);
    t.add_row(vec![Cell::new("External IDs"), Cell::new(external_ids(title))]);
    if !title.overview.is_empty() {
        t.add_row(vec![Cell::new("Overview"), Cell::new(truncate(&title.overview, OVERVIEW_WIDTH))]);
    }
    if !title.genres.is_empty() {
        t.add_row(vec![Cell::new("Genres"), Cell::new(title.genres.join(", "))]);
    }
    if title.runtime_minutes > 0 {
        t.add_row(vec![Cell::new("Runtime"), Cell::new(format!("{} min", title.runtime_minutes))]);
    }
    if !title.network.is_empty() {
        t.add_row(vec![Cell::new("Network"), Cell::new(&title.network)]);
    }
    if !title.status.is_empty() {
        t.add_row(vec![Cell::new("Status"), Cell::new(&title.status)]);
    }
    if let Some(poster) = &title.poster {
        t.add_row(vec![Cell::new("Poster"), Cell::new(&poster.url)]);
    }
    if let Some(backdrop) = &title.backdrop {
        t.add_row(vec![Cell::new("Backdrop"), Cell::new(&backdrop.url)]);
    }
    if title.theatrical_release.is_some() || title.home_release.is_some() {
        t.add_row(vec![Cell::new("Theatrical"), Cell::new(release_cell(title.theatrical_release.as_ref()))]);
        t.add_row(vec![Cell::new("Home"), Cell::new(release_cell(title.home_release.as_ref()))]);
    }
    if !title.ratings.is_empty() {
        let ratings: Vec<String> = title
            .ratings
            .iter()
            .map(|r| format!("{} {}/{}", r.source, r.value, r.max))
            .collect();
        t.add_row(vec![Cell::new("Ratings"), Cell::new(ratings.join("  "))]);
    }
    if let Some(credits) = title.credits.as_ref().filter(|c| !c.is_empty()) {
        let cast: Vec<String> = credits
            .cast
            .iter()
            .take(CAST_SHOWN)
            .map(|m| {
                if m.character.is_empty() {
                    m.name.clone()
                } else {
                    format!("{} as {}", m.name, m.character)
                }
            })
            .collect();
        t.add_row(vec![Cell::new("Cast"), Cell::new(cast.join("\n"))]);
    }
    if let Some(collection) = &title.collection {
        t.add_row(vec![
            Cell::new("Collection"),
            Cell::new(format!("{} (id {})", collection.name, collection.id)),
        ]);
    }
    println!("{}", t);
}

pub fn series(details: &SeriesDetails) {
    title(&details.title);
    if details.seasons.is_empty() {
        return;
    }
    let mut t = table();
    t.set_header(vec![bold("Season"), bold("Name"), bold("Episodes"), bold("First aired")]);
    for season in &details.seasons {
        let first_aired = season
            .episodes
            .iter()
            .map(|e| e.aired_date.as_str())
            .find(|d| !d.is_empty())
            .unwrap_or("-");
        t.add_row(vec![
            Cell::new(season.number),
            Cell::new(&season.name),
            Cell::new(season.episode_count),
            Cell::new(first_aired),
        ]);
    }
    println!("{}", t);
}

pub fn batch_series(items: &[BatchSeriesDetailsItem]) {
    let mut t = table();
    t.set_header(vec![bold("Query"), bold("Result"), bold("Seasons")]);
    for item in items {
        let query = if item.query.name.is_empty() {
            item.query.title_id.clone()
        } else {
            item.query.name.clone()
        };
        match (&item.details, &item.error) {
            (Some(details), _) => t.add_row(vec![
                Cell::new(query),
                Cell::new(format!("{} {}", "✓".green(), details.title.id)),
                Cell::new(details.seasons.len()),
            ]),
            (None, error) => t.add_row(vec![
                Cell::new(query),
                Cell::new(format!("{} {}", "✗".red(), error.as_deref().unwrap_or("no details"))),
                Cell::new("-"),
            ]),
        };
    }
    println!("{}", t);
}

pub fn releases(items: &[BatchMovieReleasesItem]) {
    let mut t = table();
    t.set_header(vec![bold("Movie"), bold("Theatrical"), bold("Home")]);
    for item in items {
        let movie = if item.query.tmdb_id > 0 {
            format!("tmdb {}", item.query.tmdb_id)
        } else if !item.query.imdb_id.is_empty() {
            item.query.imdb_id.clone()
        } else {
            item.query.title_id.clone()
        };
        match &item.error {
            Some(error) => t.add_row(vec![
                Cell::new(movie),
                Cell::new(format!("{} {}", "✗".red(), error)),
                Cell::new("-"),
            ]),
            None => t.add_row(vec![
                Cell::new(movie),
                Cell::new(release_cell(item.theatrical_release.as_ref())),
                Cell::new(release_cell(item.home_release.as_ref())),
            ]),
        };
    }
    println!("{}", t);
}

pub fn trailers(response: &TrailerResponse) {
    match &response.primary_trailer {
        Some(primary) => println!("{} {} {}", "Primary:".bright_cyan().bold(), primary.name, primary.url),
        None => println!("{}", "No primary trailer".bright_black()),
    }
    if response.trailers.is_empty() {
        return;
    }
    let mut t = table();
    t.set_header(vec![bold("Name"), bold("Type"), bold("Season"), bold("Source"), bold("URL")]);
    for trailer in &response.trailers {
        t.add_row(vec![
            Cell::new(&trailer.name),
            Cell::new(&trailer.trailer_type),
            Cell::new(if trailer.season_number > 0 {
                trailer.season_number.to_string()
            } else {
                String::new()
            }),
            Cell::new(&trailer.source),
            Cell::new(&trailer.url),
        ]);
    }
    println!("{}", t);
}

pub fn collection(details: &CollectionDetails) {
    header(&details.name);
    if !details.overview.is_empty() {
        println!("{}", truncate(&details.overview, OVERVIEW_WIDTH));
    }
    let mut t = table();
    t.set_header(vec![bold("Year"), bold("Title"), bold("TMDB")]);
    for movie in &details.movies {
        t.add_row(vec![
            Cell::new(year(movie.year)),
            Cell::new(&movie.name),
            Cell::new(movie.tmdb_id),
        ]);
    }
    println!("{}", t);
}
