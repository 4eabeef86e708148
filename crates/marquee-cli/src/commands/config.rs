use super::Context;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use metadata_config::Settings;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(ctx: &Context, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(ctx, full, output),
        ConfigCommands::Init { force } => init_config(ctx, force, output),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value, output).await,
    }
}

fn show_config(ctx: &Context, full: bool, output: &Output) -> Result<()> {
    let settings = &ctx.settings;
    if !ctx.config_file.exists() {
        output.warn(format!("Configuration file not found at: {} (showing defaults)", ctx.config_file.display()));
        output.info("Run 'marquee config init' to create it.");
    }

    let secret = |value: &str| if full { value.to_string() } else { mask_string(value) };

    if !output.is_human() {
        output.data(
            &json!({
                "configFile": ctx.config_file.display().to_string(),
                "metadata": {
                    "tvdbApiKey": secret(&settings.metadata.tvdb_api_key),
                    "tmdbApiKey": secret(&settings.metadata.tmdb_api_key),
                    "language": settings.metadata.language,
                    "demoMode": settings.metadata.demo_mode,
                    "trendingMovieSource": settings.metadata.trending_movie_source.as_str(),
                },
                "cache": {
                    "directory": settings.cache.directory.as_ref().map(|d| d.display().to_string()),
                    "metadataTtlHours": settings.cache.metadata_ttl_hours,
                },
                "mdblist": {
                    "enabled": settings.mdblist.enabled,
                    "apiKey": secret(&settings.mdblist.api_key),
                    "enabledRatings": settings.mdblist.enabled_ratings,
                    "cacheTtlHours": settings.mdblist.cache_ttl_hours,
                },
                "logging": {
                    "level": settings.logging.level,
                    "json": settings.logging.json,
                    "file": settings.logging.file.as_ref().map(|f| f.display().to_string()),
                },
            }),
            |_| {},
        );
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let mut info_table = styled_table();
    info_table.set_header(vec![
        Cell::new("Config File").add_attribute(Attribute::Bold),
        Cell::new(ctx.config_file.display().to_string()),
    ]);
    println!("{}", info_table);

    let mut metadata = section("Metadata");
    metadata.add_row(vec![Cell::new("TVDB API Key"), Cell::new(secret(&settings.metadata.tvdb_api_key))]);
    metadata.add_row(vec![Cell::new("TMDB API Key"), Cell::new(secret(&settings.metadata.tmdb_api_key))]);
    metadata.add_row(vec![Cell::new("Language"), Cell::new(&settings.metadata.language)]);
    metadata.add_row(vec![Cell::new("Demo Mode"), Cell::new(check(settings.metadata.demo_mode))]);
    metadata.add_row(vec![
        Cell::new("Trending Movies"),
        Cell::new(settings.metadata.trending_movie_source.as_str()),
    ]);
    println!("{}", metadata);

    let mut cache = section("Cache");
    let directory = match &settings.cache.directory {
        Some(dir) => dir.display().to_string(),
        None => format!("{} (default)", ctx.paths.cache_dir().display()),
    };
    cache.add_row(vec![Cell::new("Directory"), Cell::new(directory)]);
    cache.add_row(vec![Cell::new("TTL (hours)"), Cell::new(settings.cache.metadata_ttl_hours)]);
    println!("{}", cache);

    let mut mdblist = section("MDBList Ratings");
    mdblist.add_row(vec![Cell::new("Enabled"), Cell::new(check(settings.mdblist.enabled))]);
    mdblist.add_row(vec![Cell::new("API Key"), Cell::new(secret(&settings.mdblist.api_key))]);
    mdblist.add_row(vec![Cell::new("Ratings"), Cell::new(settings.mdblist.enabled_ratings.join(", "))]);
    mdblist.add_row(vec![Cell::new("TTL (hours)"), Cell::new(settings.mdblist.cache_ttl_hours)]);
    println!("{}", mdblist);

    if settings.mdblist.enabled && !settings.mdblist.is_active() {
        output.warn("MDBList is enabled but has no API key; ratings will be skipped");
    }
    Ok(())
}

fn init_config(ctx: &Context, force: bool, output: &Output) -> Result<()> {
    if ctx.config_file.exists() && !force {
        return Err(eyre!(
            "Configuration already exists at {} (use --force to overwrite)",
            ctx.config_file.display()
        ));
    }
    Settings::default()
        .save_to_file(&ctx.config_file)
        .map_err(|e| eyre!("Failed to write config to {}: {}", ctx.config_file.display(), e))?;
    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    output.success(format!("Wrote default configuration to {}", ctx.config_file.display()));
    Ok(())
}

async fn set_config(ctx: &Context, key: &str, value: &str, output: &Output) -> Result<()> {
    let mut settings = ctx.settings.clone();
    let invalidates_cache = settings.set_value(key, value).map_err(|e| eyre!("{}", e))?;
    settings
        .save_to_file(&ctx.config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", ctx.config_file.display(), e))?;
    output.success(format!("Set {} in {}", key, ctx.config_file.display()));

    let refreshes_ratings = key.starts_with("mdblist.");
    if !invalidates_cache && !refreshes_ratings {
        return Ok(());
    }
    let service = Context {
        settings: settings.clone(),
        paths: ctx.paths.clone(),
        config_file: ctx.config_file.clone(),
    }
    .service()?;

    if refreshes_ratings {
        service.update_mdblist_settings(&settings.mdblist);
        output.info(format!(
            "MDBList ratings {}",
            if settings.mdblist.is_active() { "active" } else { "inactive" }
        ));
    }
    if invalidates_cache {
        // Cached entries were fetched with the old credentials or language.
        service
            .update_api_keys(
                &settings.metadata.tvdb_api_key,
                &settings.metadata.tmdb_api_key,
                &settings.metadata.language,
            )
            .await;
        output.info("Cleared metadata cache");
    }
    Ok(())
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn section(name: &str) -> Table {
    let mut table = styled_table();
    table.set_header(vec![Cell::new(name).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn check(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Shows the first and last four characters of longer secrets.
fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "*".repeat(chars.len()),
        len => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[len - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "(not set)");
        assert_eq!(mask_string("short"), "*****");
        assert_eq!(mask_string("abcd1234efgh5678"), "abcd...5678");
    }
}
