//! Trailer candidate merging and scoring.

use std::collections::HashSet;

use metadata_models::Trailer;
use metadata_sources::tvdb;
use reqwest::Url;

const PROMO_KEYWORDS: [&str; 6] = [
    "best reviewed",
    "pre-order",
    "recap",
    "behind the scenes",
    "making of",
    "featurette",
];

/// Heuristic quality score; the highest scoring candidate becomes primary.
pub fn score_trailer(trailer: &Trailer) -> i32 {
    let mut score = match trailer.trailer_type.trim().to_lowercase().as_str() {
        "trailer" => 100,
        "teaser" => 60,
        "clip" => 40,
        _ => 10,
    };
    if trailer.official {
        score += 25;
    }
    if trailer.language.trim().to_lowercase().starts_with("en") {
        score += 15;
    }
    if trailer.resolution >= 1080 {
        score += 10;
    } else if trailer.resolution >= 720 {
        score += 6;
    }
    if trailer.site.eq_ignore_ascii_case("youtube") {
        score += 5;
    }
    if trailer.source.eq_ignore_ascii_case("tmdb") {
        score += 3;
    }

    let name = trailer.name.to_lowercase();
    if name.contains("official trailer") {
        score += 20;
    }
    if name.contains("final trailer") {
        score += 18;
    }
    if name.contains("series trailer") {
        score += 15;
    }
    if PROMO_KEYWORDS.iter().any(|keyword| name.contains(keyword)) {
        score -= 50;
    }
    score
}

/// Drops candidates with an empty URL and keeps the first of each
/// case-insensitive URL.
pub fn dedupe_trailers(trailers: Vec<Trailer>) -> Vec<Trailer> {
    let mut seen = HashSet::new();
    trailers
        .into_iter()
        .filter(|trailer| {
            let key = trailer.url.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

fn best<'a>(candidates: impl Iterator<Item = &'a Trailer>) -> Option<&'a Trailer> {
    let mut best: Option<(&Trailer, i32)> = None;
    for trailer in candidates {
        let score = score_trailer(trailer);
        if score < 0 {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((trailer, score));
        }
    }
    best.map(|(trailer, _)| trailer)
}

/// Highest score; the earliest candidate wins a tie. Candidates scoring
/// below zero are never chosen.
pub fn select_primary(trailers: &[Trailer]) -> Option<&Trailer> {
    best(trailers.iter())
}

/// Best trailer tagged for `season`. Season 1 also accepts show-level
/// trailers (season 0), which usually promote the first season.
pub fn select_primary_for_season(trailers: &[Trailer], season: u32) -> Option<&Trailer> {
    if season == 0 {
        return None;
    }
    best(
        trailers
            .iter()
            .filter(|t| t.season_number == season || (season == 1 && t.season_number == 0)),
    )
}

/// Trailer site, key, embed URL and thumbnail derived from a video URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailerMetadata {
    pub site: String,
    pub key: String,
    pub embed_url: String,
    pub thumbnail_url: String,
}

pub fn derive_trailer_metadata(url: &str) -> TrailerMetadata {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return TrailerMetadata::default();
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();

    if host.contains("youtube.com") || host.contains("youtu.be") {
        let key = extract_youtube_id(&parsed);
        let (embed_url, thumbnail_url) = if key.is_empty() {
            (String::new(), String::new())
        } else {
            (
                format!("https://www.youtube.com/embed/{}", key),
                format!("https://img.youtube.com/vi/{}/hqdefault.jpg", key),
            )
        };
        return TrailerMetadata {
            site: "YouTube".to_string(),
            key,
            embed_url,
            thumbnail_url,
        };
    }

    if host.contains("vimeo.com") {
        let key = parsed.path().trim_matches('/').to_string();
        let embed_url = if key.is_empty() {
            String::new()
        } else {
            format!("https://player.vimeo.com/video/{}", key)
        };
        return TrailerMetadata {
            site: "Vimeo".to_string(),
            key,
            embed_url,
            thumbnail_url: String::new(),
        };
    }

    TrailerMetadata {
        site: parsed.host_str().unwrap_or_default().to_string(),
        ..TrailerMetadata::default()
    }
}

/// Video id from `youtu.be/ID`, `watch?v=ID`, `/embed/ID` or `/v/ID`.
pub fn extract_youtube_id(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    if host.contains("youtu.be") {
        return url.path().trim_matches('/').to_string();
    }
    if !host.contains("youtube.com") {
        return String::new();
    }
    if url.path().starts_with("/watch") {
        return url
            .query_pairs()
            .find(|(name, _)| name == "v")
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default();
    }
    let mut segments = url.path().trim_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some(prefix), Some(id)) if prefix.eq_ignore_ascii_case("embed") || prefix.eq_ignore_ascii_case("v") => {
            id.to_string()
        }
        _ => String::new(),
    }
}

pub fn convert_tvdb_trailers(source: &[tvdb::Trailer]) -> Vec<Trailer> {
    source
        .iter()
        .filter(|t| !t.url.trim().is_empty())
        .map(|t| {
            let url = t.url.trim().to_string();
            let meta = derive_trailer_metadata(&url);
            Trailer {
                name: t.name.trim().to_string(),
                site: meta.site,
                key: meta.key,
                embed_url: meta.embed_url,
                thumbnail_url: meta.thumbnail_url,
                url,
                language: t.language.trim().to_string(),
                duration_seconds: t.runtime.max(0) as u32,
                source: "tvdb".to_string(),
                ..Trailer::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailer(name: &str, kind: &str, url: &str) -> Trailer {
        Trailer {
            name: name.to_string(),
            trailer_type: kind.to_string(),
            url: url.to_string(),
            ..Trailer::default()
        }
    }

    #[test]
    fn test_score_components() {
        let mut t = trailer("Official Trailer", "Trailer", "u");
        t.official = true;
        t.language = "en".to_string();
        t.resolution = 1080;
        t.site = "YouTube".to_string();
        t.source = "tmdb".to_string();
        assert_eq!(score_trailer(&t), 100 + 25 + 15 + 10 + 5 + 3 + 20);

        let teaser = trailer("Teaser", "teaser", "u");
        assert_eq!(score_trailer(&teaser), 60);

        let mut clip = trailer("Clip", "Clip", "u");
        clip.resolution = 720;
        assert_eq!(score_trailer(&clip), 46);
    }

    #[test]
    fn test_promotional_names_are_penalized() {
        let featurette = trailer("Behind the Scenes Featurette", "Trailer", "u");
        assert_eq!(score_trailer(&featurette), 50);
        let unknown = trailer("Recap", "", "u");
        assert_eq!(score_trailer(&unknown), -40);
    }

    #[test]
    fn test_dedupe_keeps_first_case_insensitive() {
        let trailers = vec![
            trailer("a", "Trailer", "https://YouTube.com/watch?v=X"),
            trailer("b", "Trailer", " https://youtube.com/watch?v=x "),
            trailer("c", "Trailer", "https://youtube.com/watch?v=y"),
            trailer("d", "Trailer", "https://youtube.com/watch?v=X"),
            trailer("e", "Trailer", "  "),
        ];
        let deduped = dedupe_trailers(trailers);
        let names: Vec<_> = deduped.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_select_primary_prefers_score_then_order() {
        let trailers = vec![
            trailer("Teaser", "Teaser", "1"),
            trailer("Trailer A", "Trailer", "2"),
            trailer("Trailer B", "Trailer", "3"),
        ];
        assert_eq!(select_primary(&trailers).unwrap().name, "Trailer A");
        assert!(select_primary(&[]).is_none());
        assert!(select_primary(&[trailer("Season Recap", "Recap", "4")]).is_none());
    }

    #[test]
    fn test_select_primary_for_season() {
        let mut s2 = trailer("Season 2 Teaser", "Teaser", "1");
        s2.season_number = 2;
        let show = trailer("Official Trailer", "Trailer", "2");
        let trailers = vec![s2, show];

        assert_eq!(select_primary_for_season(&trailers, 2).unwrap().name, "Season 2 Teaser");
        assert_eq!(select_primary_for_season(&trailers, 1).unwrap().name, "Official Trailer");
        assert!(select_primary_for_season(&trailers, 3).is_none());
        assert!(select_primary_for_season(&trailers, 0).is_none());
    }

    #[test]
    fn test_derive_youtube_variants() {
        for url in [
            "https://youtu.be/abc123",
            "https://www.youtube.com/watch?v=abc123&t=4",
            "https://www.youtube.com/embed/abc123",
            "https://youtube.com/v/abc123",
        ] {
            let meta = derive_trailer_metadata(url);
            assert_eq!(meta.site, "YouTube", "{}", url);
            assert_eq!(meta.key, "abc123", "{}", url);
            assert_eq!(meta.embed_url, "https://www.youtube.com/embed/abc123");
            assert_eq!(meta.thumbnail_url, "https://img.youtube.com/vi/abc123/hqdefault.jpg");
        }
    }

    #[test]
    fn test_derive_vimeo_and_other_hosts() {
        let vimeo = derive_trailer_metadata("https://vimeo.com/76979871");
        assert_eq!(vimeo.site, "Vimeo");
        assert_eq!(vimeo.embed_url, "https://player.vimeo.com/video/76979871");

        let other = derive_trailer_metadata("https://cdn.example.com/t.mp4");
        assert_eq!(other.site, "cdn.example.com");
        assert!(other.key.is_empty());

        assert_eq!(derive_trailer_metadata("not a url"), TrailerMetadata::default());
    }

    #[test]
    fn test_convert_tvdb_trailers_skips_blank_urls() {
        let source = vec![
            tvdb::Trailer {
                name: " Trailer ".to_string(),
                url: "https://www.youtube.com/watch?v=zzz".to_string(),
                language: "eng".to_string(),
                runtime: 120,
                ..tvdb::Trailer::default()
            },
            tvdb::Trailer::default(),
        ];
        let converted = convert_tvdb_trailers(&source);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].name, "Trailer");
        assert_eq!(converted[0].key, "zzz");
        assert_eq!(converted[0].source, "tvdb");
        assert_eq!(converted[0].duration_seconds, 120);
    }
}
