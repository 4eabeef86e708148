//! Composite title identifiers and remote-id scanning.

use metadata_models::MediaType;
use metadata_sources::tvdb::RemoteId;

fn parse_tagged_id(title_id: &str, prefix: &str) -> i64 {
    let trimmed = title_id.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if trimmed.to_lowercase().starts_with(prefix) {
        if let Some(Ok(id)) = trimmed.rsplit(':').next().map(|last| last.trim().parse::<i64>()) {
            return id;
        }
    }
    trimmed.parse().unwrap_or(0)
}

/// `tvdb:<kind>:<id>` or a bare integer; 0 when neither applies.
pub fn parse_tvdb_id(title_id: &str) -> i64 {
    parse_tagged_id(title_id, "tvdb:")
}

/// `tmdb:<kind>:<id>` or a bare integer; 0 when neither applies.
pub fn parse_tmdb_id(title_id: &str) -> i64 {
    parse_tagged_id(title_id, "tmdb:")
}

pub fn tvdb_title_id(media_type: MediaType, id: i64) -> String {
    format!("tvdb:{}:{}", media_type.as_str(), id)
}

pub fn tmdb_title_id(media_type: MediaType, id: i64) -> String {
    format!("tmdb:{}:{}", media_type.tmdb_segment(), id)
}

/// `tt`-prefixed form of an IMDB id, or empty.
pub fn normalize_imdb_id(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with("tt") {
        trimmed.to_string()
    } else {
        format!("tt{}", trimmed)
    }
}

fn is_tmdb_source(source_name: &str) -> bool {
    let lower = source_name.to_lowercase();
    lower.contains("themoviedb") || lower.contains("tmdb")
}

/// External ids found in a TVDB remote-id list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteIds {
    pub imdb_id: String,
    pub tmdb_id: i64,
}

/// Later entries override earlier ones; a TMDB id that does not parse is skipped.
pub fn scan_remote_ids(remote_ids: &[RemoteId]) -> RemoteIds {
    let mut found = RemoteIds::default();
    for remote in remote_ids {
        let id = remote.id.trim();
        if id.is_empty() {
            continue;
        }
        let source = remote.source_name.to_lowercase();
        if source.contains("imdb") {
            found.imdb_id = id.to_string();
        } else if is_tmdb_source(&source) {
            if let Ok(tmdb_id) = id.parse() {
                found.tmdb_id = tmdb_id;
            }
        }
    }
    found
}

/// First non-empty IMDB id in the list.
pub fn first_imdb_remote_id(remote_ids: &[RemoteId]) -> Option<String> {
    remote_ids
        .iter()
        .filter(|remote| remote.source_name.to_lowercase().contains("imdb"))
        .map(|remote| remote.id.trim())
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Whether the list carries a TMDB remote id equal to `tmdb_id`.
pub fn has_tmdb_remote_id(remote_ids: &[RemoteId], tmdb_id: i64) -> bool {
    let wanted = tmdb_id.to_string();
    remote_ids
        .iter()
        .any(|remote| is_tmdb_source(&remote.source_name) && remote.id.trim() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(source: &str, id: &str) -> RemoteId {
        RemoteId {
            id: id.to_string(),
            source_name: source.to_string(),
            ..RemoteId::default()
        }
    }

    #[test]
    fn test_parse_tvdb_id() {
        assert_eq!(parse_tvdb_id("tvdb:series:81189"), 81189);
        assert_eq!(parse_tvdb_id(" TVDB:movie:12 "), 12);
        assert_eq!(parse_tvdb_id("81189"), 81189);
        assert_eq!(parse_tvdb_id("tmdb:tv:1396"), 0);
        assert_eq!(parse_tvdb_id("tvdb:series:abc"), 0);
        assert_eq!(parse_tvdb_id(""), 0);
    }

    #[test]
    fn test_parse_tmdb_id() {
        assert_eq!(parse_tmdb_id("tmdb:movie:603"), 603);
        assert_eq!(parse_tmdb_id("603"), 603);
        assert_eq!(parse_tmdb_id("tvdb:series:1"), 0);
    }

    #[test]
    fn test_title_id_formats() {
        assert_eq!(tvdb_title_id(MediaType::Series, 5), "tvdb:series:5");
        assert_eq!(tmdb_title_id(MediaType::Series, 5), "tmdb:tv:5");
        assert_eq!(tmdb_title_id(MediaType::Movie, 5), "tmdb:movie:5");
    }

    #[test]
    fn test_normalize_imdb_id() {
        assert_eq!(normalize_imdb_id("0133093"), "tt0133093");
        assert_eq!(normalize_imdb_id("tt0133093"), "tt0133093");
        assert_eq!(normalize_imdb_id(" "), "");
    }

    #[test]
    fn test_scan_remote_ids() {
        let ids = scan_remote_ids(&[
            remote("Official Website", "https://example.com"),
            remote("IMDB", "tt0903747"),
            remote("TheMovieDB.com", "1396"),
            remote("IMDB", "tt9999999"),
        ]);
        assert_eq!(ids.imdb_id, "tt9999999");
        assert_eq!(ids.tmdb_id, 1396);

        let ids = scan_remote_ids(&[remote("TheMovieDB.com", "1396"), remote("TMDB", "n/a"), remote("IMDB", " ")]);
        assert_eq!(ids.tmdb_id, 1396);
        assert_eq!(ids.imdb_id, "");
    }

    #[test]
    fn test_first_imdb_remote_id() {
        let remotes = vec![
            remote("IMDB", " "),
            remote("TheMovieDB.com", "1396"),
            remote("IMDB", "tt0903747"),
            remote("IMDB", "tt9999999"),
        ];
        assert_eq!(first_imdb_remote_id(&remotes).as_deref(), Some("tt0903747"));
        assert_eq!(first_imdb_remote_id(&[remote("TMDB", "1")]), None);
    }

    #[test]
    fn test_has_tmdb_remote_id() {
        let remotes = vec![remote("TheMovieDB.com", " 1396 "), remote("IMDB", "1396")];
        assert!(has_tmdb_remote_id(&remotes, 1396));
        assert!(!has_tmdb_remote_id(&remotes, 1397));
        assert!(!has_tmdb_remote_id(&[remote("IMDB", "1396")], 1396));
    }
}
