use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rating sources MDBList can return, after `popcorn` is renamed to `audience`.
pub const KNOWN_RATING_SOURCES: &[&str] = &[
    "imdb",
    "tmdb",
    "trakt",
    "letterboxd",
    "tomatoes",
    "audience",
    "metacritic",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub metadata: MetadataSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub mdblist: MdbListSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataSettings {
    #[serde(default)]
    pub tvdb_api_key: String,
    #[serde(default)]
    pub tmdb_api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub demo_mode: bool,
    #[serde(default)]
    pub trending_movie_source: TrendingMovieSource,
}

/// Where trending movies come from.
/// `released` uses the MDBList feed of movies already out; `all` prefers TMDB.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendingMovieSource {
    All,
    #[default]
    Released,
}

impl TrendingMovieSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Released => "released",
        }
    }
}

impl std::str::FromStr for TrendingMovieSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "released" | "" => Ok(Self::Released),
            other => Err(anyhow::anyhow!("Unknown trending movie source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    /// Overrides the platform cache directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_ttl_hours")]
    pub metadata_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MdbListSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_enabled_ratings")]
    pub enabled_ratings: Vec<String>,
    #[serde(default = "default_ttl_hours")]
    pub cache_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `None` means JSON when stdout is not a terminal.
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_enabled_ratings() -> Vec<String> {
    vec!["imdb".to_string(), "tomatoes".to_string(), "audience".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            tvdb_api_key: String::new(),
            tmdb_api_key: String::new(),
            language: default_language(),
            demo_mode: false,
            trending_movie_source: TrendingMovieSource::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: None,
            metadata_ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for MdbListSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            enabled_ratings: default_enabled_ratings(),
            cache_ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

impl MdbListSettings {
    /// Ratings are only fetched when enabled and keyed.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

impl Settings {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Loads the file if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache.metadata_ttl_hours == 0 {
            return Err(anyhow::anyhow!("cache.metadata_ttl_hours must be greater than zero"));
        }
        if self.mdblist.cache_ttl_hours == 0 {
            return Err(anyhow::anyhow!("mdblist.cache_ttl_hours must be greater than zero"));
        }
        for source in &self.mdblist.enabled_ratings {
            let normalized = source.trim().to_lowercase();
            if !KNOWN_RATING_SOURCES.contains(&normalized.as_str()) {
                return Err(anyhow::anyhow!("Unknown rating source in mdblist.enabled_ratings: {}", source));
            }
        }
        if self.metadata.language.trim().is_empty() {
            return Err(anyhow::anyhow!("metadata.language cannot be empty"));
        }
        Ok(())
    }

    /// Sets a dotted key such as `metadata.tvdb_api_key`.
    /// Returns true when an upstream credential or the language changed,
    /// which invalidates cached metadata.
    pub fn set_value(&mut self, key: &str, value: &str) -> anyhow::Result<bool> {
        let value = value.trim();
        let credentials_changed = match key {
            "metadata.tvdb_api_key" => replace(&mut self.metadata.tvdb_api_key, value),
            "metadata.tmdb_api_key" => replace(&mut self.metadata.tmdb_api_key, value),
            "metadata.language" => replace(&mut self.metadata.language, value),
            "metadata.demo_mode" => {
                self.metadata.demo_mode = parse_bool(key, value)?;
                false
            }
            "metadata.trending_movie_source" => {
                self.metadata.trending_movie_source = value.parse()?;
                false
            }
            "cache.directory" => {
                self.cache.directory = (!value.is_empty()).then(|| PathBuf::from(value));
                false
            }
            "cache.metadata_ttl_hours" => {
                self.cache.metadata_ttl_hours = parse_hours(key, value)?;
                false
            }
            "mdblist.enabled" => {
                self.mdblist.enabled = parse_bool(key, value)?;
                false
            }
            "mdblist.api_key" => replace(&mut self.mdblist.api_key, value),
            "mdblist.enabled_ratings" => {
                self.mdblist.enabled_ratings = value
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                false
            }
            "mdblist.cache_ttl_hours" => {
                self.mdblist.cache_ttl_hours = parse_hours(key, value)?;
                false
            }
            "logging.level" => {
                self.logging.level = value.to_string();
                false
            }
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        };
        self.validate()?;
        Ok(credentials_changed)
    }
}

fn replace(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    *slot = value.to_string();
    true
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!("{} expects a boolean, got {}", key, value)),
    }
}

fn parse_hours(key: &str, value: &str) -> anyhow::Result<u64> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} expects a whole number of hours, got {}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_settings_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut settings = Settings::default();
        settings.metadata.tvdb_api_key = "tvdb-key".to_string();
        settings.metadata.language = "fr".to_string();
        settings.mdblist.enabled = true;
        settings.mdblist.api_key = "mdb".to_string();

        settings.save_to_file(file.path()).unwrap();
        let loaded = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, settings);
        assert!(loaded.mdblist.is_active());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [metadata]
            tmdb_api_key = "abc"
            trending_movie_source = "all"
            "#,
        )
        .unwrap();
        assert_eq!(settings.metadata.tmdb_api_key, "abc");
        assert_eq!(settings.metadata.language, "en");
        assert_eq!(settings.metadata.trending_movie_source, TrendingMovieSource::All);
        assert_eq!(settings.cache.metadata_ttl_hours, 24);
        assert_eq!(settings.mdblist.enabled_ratings, vec!["imdb", "tomatoes", "audience"]);
        assert!(!settings.mdblist.is_active());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.cache.metadata_ttl_hours = 0;
        assert!(settings.validate().is_err());

        settings.cache.metadata_ttl_hours = 12;
        settings.mdblist.enabled_ratings.push("rottenapple".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_set_value_reports_credential_changes() {
        let mut settings = Settings::default();
        assert!(settings.set_value("metadata.tvdb_api_key", "new").unwrap());
        assert!(!settings.set_value("metadata.tvdb_api_key", "new").unwrap());
        assert!(!settings.set_value("metadata.demo_mode", "yes").unwrap());
        assert!(settings.metadata.demo_mode);

        settings.set_value("mdblist.enabled_ratings", "IMDB, metacritic").unwrap();
        assert_eq!(settings.mdblist.enabled_ratings, vec!["imdb", "metacritic"]);

        assert!(settings.set_value("cache.metadata_ttl_hours", "0").is_err());
        assert!(settings.set_value("nope.key", "1").is_err());
    }
}
