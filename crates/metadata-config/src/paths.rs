use anyhow::Result;
use std::path::{Path, PathBuf};

/// Container base path from `MARQUEE_BASE_PATH`, defaulting to "/app".
pub fn container_base_path() -> PathBuf {
    std::env::var("MARQUEE_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

#[derive(Debug, Clone)]
pub struct PathManager {
    config_dir: PathBuf,
    cache_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("marquee");
        let cache_dir = dirs::cache_dir()
            .map(|dir| dir.join("marquee"))
            .unwrap_or_else(|| config_dir.join("cache"));

        Ok(Self {
            log_dir: config_dir.join("logs"),
            config_dir,
            cache_dir,
        })
    }

    pub fn from_docker_env() -> Self {
        Self::with_base(container_base_path())
    }

    /// Everything under one root. Used for containers and tests.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            cache_dir: base.join("cache"),
            log_dir: base.join("logs"),
        }
    }

    /// Overrides the cache root, e.g. from `[cache] directory`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn metadata_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("metadata")
    }

    pub fn id_cache_dir(&self) -> PathBuf {
        self.metadata_cache_dir().join("ids")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("marquee.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        std::fs::create_dir_all(self.id_cache_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base path, so its presence means Docker.
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }
        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_cache_nested_under_metadata() {
        let paths = PathManager::with_base("/srv/marquee");
        assert_eq!(paths.metadata_cache_dir(), PathBuf::from("/srv/marquee/cache/metadata"));
        assert_eq!(paths.id_cache_dir(), PathBuf::from("/srv/marquee/cache/metadata/ids"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/marquee/config.toml"));
    }

    #[test]
    fn test_cache_override() {
        let paths = PathManager::with_base("/srv/marquee").with_cache_dir("/tmp/c");
        assert_eq!(paths.id_cache_dir(), PathBuf::from("/tmp/c/metadata/ids"));
        assert_eq!(paths.log_file(), PathBuf::from("/srv/marquee/logs/marquee.log"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path());
        paths.ensure_directories().unwrap();
        assert!(paths.id_cache_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
