//! Picking a TVDB id out of search results.
//!
//! An exact TMDB cross-reference wins outright. Otherwise results are tiered
//! by primary language: the target language first, then Japanese (the usual
//! original language for anime), then anything else. The first result of the
//! highest non-empty tier is taken.

use metadata_sources::tvdb::SearchResult;

use crate::ids::has_tmdb_remote_id;

/// Original-language fallback tier.
pub const ORIGINAL_LANGUAGE_FALLBACK: &str = "jpn";

/// First result whose remote ids contain `tmdb_id`.
pub fn exact_tmdb_match(results: &[SearchResult], tmdb_id: i64) -> Option<i64> {
    if tmdb_id <= 0 {
        return None;
    }
    results
        .iter()
        .filter(|result| result.tvdb_id() > 0)
        .find(|result| has_tmdb_remote_id(&result.remote_ids, tmdb_id))
        .map(SearchResult::tvdb_id)
}

/// Language-tiered pick. `language` is the 3-letter TVDB code.
pub fn pick_by_language(results: &[SearchResult], language: &str) -> Option<i64> {
    let usable: Vec<&SearchResult> = results.iter().filter(|r| r.tvdb_id() > 0).collect();
    let tier = |lang: &str| {
        usable
            .iter()
            .copied()
            .find(|r| r.primary_language.trim().eq_ignore_ascii_case(lang))
    };

    tier(language)
        .or_else(|| tier(ORIGINAL_LANGUAGE_FALLBACK))
        .or_else(|| usable.first().copied())
        .map(SearchResult::tvdb_id)
}

/// Exact cross-reference first, then the language tiers.
pub fn pick_series_id(results: &[SearchResult], tmdb_id: i64, language: &str) -> Option<i64> {
    exact_tmdb_match(results, tmdb_id).or_else(|| pick_by_language(results, language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_sources::tvdb::RemoteId;

    fn result(tvdb_id: &str, language: &str) -> SearchResult {
        SearchResult {
            tvdb_id: tvdb_id.to_string(),
            primary_language: language.to_string(),
            ..SearchResult::default()
        }
    }

    #[test]
    fn test_exact_tmdb_match_wins_over_language() {
        let mut dub = result("2", "ita");
        dub.remote_ids = vec![RemoteId {
            id: "42".to_string(),
            source_name: "TheMovieDB.com".to_string(),
            ..RemoteId::default()
        }];
        let results = vec![result("1", "eng"), dub];

        assert_eq!(pick_series_id(&results, 42, "eng"), Some(2));
        assert_eq!(pick_series_id(&results, 43, "eng"), Some(1));
    }

    #[test]
    fn test_language_tiers() {
        let results = vec![result("10", "kor"), result("11", "jpn"), result("12", "eng")];
        assert_eq!(pick_by_language(&results, "eng"), Some(12));
        assert_eq!(pick_by_language(&results[..2], "eng"), Some(11));
        assert_eq!(pick_by_language(&results[..1], "eng"), Some(10));
        assert_eq!(pick_by_language(&results, "kor"), Some(10));
    }

    #[test]
    fn test_results_without_ids_are_ignored() {
        let results = vec![result("", "eng"), result("x", "eng"), result("7", "fra")];
        assert_eq!(pick_by_language(&results, "eng"), Some(7));
        assert_eq!(pick_by_language(&[], "eng"), None);
    }
}
