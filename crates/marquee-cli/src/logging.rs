use anyhow::Result;
use metadata_config::LoggingSettings;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directive for the command-line verbosity flags.
///
/// `None` means no flag was given and the configured level (or `RUST_LOG`) applies.
fn verbosity_directive(verbose_level: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose_level {
        0 => None,
        // -v: debug, but hyper's connection chatter stays quiet
        1 => Some("debug,hyper::proto::h1=warn,hyper::client::pool=warn"),
        _ => Some("trace"),
    }
}

fn build_filter(verbose_level: u8, quiet: bool, settings: &LoggingSettings) -> EnvFilter {
    match verbosity_directive(verbose_level, quiet) {
        Some("error") => EnvFilter::new("error"),
        Some(directive) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.level.trim())),
    }
}

/// JSON when `RUST_LOG_JSON=true`, then the config flag, then whenever stdout is not a terminal.
fn use_json(settings: &LoggingSettings) -> bool {
    match std::env::var("RUST_LOG_JSON") {
        Ok(value) => value == "true",
        Err(_) => settings.json.unwrap_or_else(|| !io::stdout().is_terminal()),
    }
}

pub fn init_logging(verbose_level: u8, quiet: bool, settings: &LoggingSettings) -> Result<()> {
    let filter = build_filter(verbose_level, quiet, settings);
    let json = use_json(settings);
    let registry = Registry::default().with(filter);

    if let Some(log_path) = &settings.file {
        let (log_dir, log_prefix) = rotation_target(log_path)?;
        std::fs::create_dir_all(log_dir)?;
        // marquee.log, marquee.log.2026-10-17, ...
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).init();
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).init();
    }

    Ok(())
}

/// Directory and file prefix for the rolling appender (`logs/marquee.log` -> `logs`, `marquee`).
fn rotation_target(log_path: &Path) -> Result<(&Path, &str)> {
    let log_dir = log_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(log_filename);
    Ok((log_dir, log_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_verbosity_directive() {
        assert_eq!(verbosity_directive(0, false), None);
        assert_eq!(verbosity_directive(3, true), Some("error"));
        assert!(verbosity_directive(1, false).unwrap().starts_with("debug,"));
        assert_eq!(verbosity_directive(2, false), Some("trace"));
    }

    #[test]
    fn test_rotation_target_strips_extension() {
        let path = PathBuf::from("/var/log/marquee/marquee.log");
        let (dir, prefix) = rotation_target(&path).unwrap();
        assert_eq!(dir, Path::new("/var/log/marquee"));
        assert_eq!(prefix, "marquee");

        assert!(rotation_target(Path::new("marquee.log")).is_err());
    }
}
