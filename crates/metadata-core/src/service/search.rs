use std::collections::{HashMap, HashSet};

use metadata_models::{Image, MediaType, SearchResult, Title, TrendingItem};
use metadata_sources::tvdb::SearchResult as TvdbHit;
use tracing::{debug, instrument};

use super::trending::normalize_trending_type;
use super::{bounded, first_non_empty, MetadataService};
use crate::artwork::normalize_tvdb_image_url;
use crate::cache::cache_key;
use crate::demo::demo_search;
use crate::error::Result;
use crate::ids::{scan_remote_ids, tvdb_title_id};

const SEARCH_LIMIT: u32 = 20;

/// Media type of a hit, preferring its own `type` over the requested one.
fn hit_media_type(hit: &TvdbHit, requested: MediaType) -> MediaType {
    match hit.result_type.trim().to_lowercase().as_str() {
        "movie" | "movies" | "film" | "films" => MediaType::Movie,
        "series" | "show" | "shows" | "tv" => MediaType::Series,
        _ => requested,
    }
}

fn localized<'a>(values: &'a HashMap<String, String>, language: &str) -> &'a str {
    let pick = |lang: &str| values.get(lang).map(|v| v.trim()).unwrap_or_default();
    first_non_empty(&[pick(language), pick("eng")])
}

/// Original name plus every translation (sorted by language), deduped
/// case-insensitively and never repeating the display name.
fn alternate_titles(hit: &TvdbHit, name: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut langs: Vec<&String> = hit.translations.keys().collect();
    langs.sort();

    std::iter::once(hit.name.as_str())
        .chain(langs.into_iter().map(|lang| hit.translations[lang].as_str()))
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty() && !candidate.eq_ignore_ascii_case(name))
        .filter(|candidate| seen.insert(candidate.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn round_score(score: f64) -> i64 {
    let truncated = score as i64;
    if score > 0.0 && truncated == 0 {
        (score + 0.5) as i64
    } else {
        truncated
    }
}

/// Converts a TVDB search hit. Hits without any usable name are dropped.
pub(crate) fn convert_hit(hit: &TvdbHit, requested: MediaType, language: &str) -> Option<SearchResult> {
    let media_type = hit_media_type(hit, requested);
    let original_name = hit.name.trim();
    let name = first_non_empty(&[localized(&hit.translations, language), original_name]);
    if name.is_empty() {
        return None;
    }
    let overview = first_non_empty(&[localized(&hit.overviews, language), hit.overview.trim()]);

    let tvdb_id = hit.tvdb_id();
    let id = if tvdb_id > 0 {
        tvdb_title_id(media_type, tvdb_id)
    } else {
        let fallback = name.to_lowercase().replace(' ', "-");
        let tail = first_non_empty(&[hit.slug.trim(), hit.object_id.trim(), fallback.as_str()]).to_string();
        format!("tvdb:{}:{}", media_type.as_str(), tail)
    };

    let mut title = Title {
        id,
        name: name.to_string(),
        overview: overview.to_string(),
        year: hit.year(),
        language: first_non_empty(&[hit.primary_language.trim(), language]).to_string(),
        media_type,
        tvdb_id,
        network: hit.network.trim().to_string(),
        alternate_titles: alternate_titles(hit, name),
        ..Title::default()
    };
    if !original_name.is_empty() && !original_name.eq_ignore_ascii_case(name) {
        title.original_name = original_name.to_string();
    }

    let poster = normalize_tvdb_image_url(&hit.image_url);
    if !poster.is_empty() {
        title.poster = Some(Image::new(poster, "poster"));
    }
    let thumbnail = normalize_tvdb_image_url(&hit.thumbnail);
    if !thumbnail.is_empty() {
        if title.poster.is_none() {
            title.poster = Some(Image::new(thumbnail.clone(), "poster"));
        }
        title.backdrop = Some(Image::new(thumbnail, "backdrop"));
    }

    let remote = scan_remote_ids(&hit.remote_ids);
    title.imdb_id = remote.imdb_id;
    title.tmdb_id = remote.tmdb_id;

    Some(SearchResult {
        title,
        score: round_score(hit.score),
    })
}

impl MetadataService {
    /// Free-text search against TVDB (or the demo catalog in demo mode).
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, media_type: &str) -> Result<Vec<SearchResult>> {
        let _lease = self.lease().await;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let media_type = normalize_trending_type(media_type);
        let tvdb = self.tvdb().await;

        if self.is_demo() {
            let mut items: Vec<TrendingItem> = demo_search(query, media_type)
                .into_iter()
                .map(|title| TrendingItem { rank: 0, title })
                .collect();
            self.enrich_demo_artwork(&tvdb, &mut items, media_type).await;
            return Ok(items
                .into_iter()
                .map(|item| SearchResult {
                    title: item.title,
                    score: 100,
                })
                .collect());
        }

        let key = cache_key(&["tvdb", "search", media_type.as_str(), query]);
        if let Some(cached) = self.cache.lookup::<Vec<SearchResult>>(&key).await {
            if cached.iter().any(|r| !r.title.name.trim().is_empty()) {
                return Ok(cached);
            }
        }

        let hits = tvdb.search(query, media_type.as_str(), SEARCH_LIMIT, 0, "").await?;
        let language = tvdb.language();
        let mut results: Vec<SearchResult> = hits
            .iter()
            .filter_map(|hit| convert_hit(hit, media_type, language))
            .collect();
        debug!("[metadata] search query={:?} type={} results={}", query, media_type.as_str(), results.len());

        let tvdb = &*tvdb;
        let missing = results
            .iter_mut()
            .filter(|r| r.title.poster.is_none() && r.title.tvdb_id > 0);
        bounded(missing, |result| async move { self.apply_artworks(tvdb, &mut result.title).await }).await;

        self.cache.store(&key, &results).await;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_sources::tvdb::RemoteId;

    fn hit() -> TvdbHit {
        TvdbHit {
            result_type: "series".to_string(),
            tvdb_id: "81189".to_string(),
            name: "Shingeki no Kyojin".to_string(),
            overview: "Original overview".to_string(),
            translations: HashMap::from([
                ("eng".to_string(), "Attack on Titan".to_string()),
                ("fra".to_string(), "L'Attaque des Titans".to_string()),
                ("deu".to_string(), "attack on titan".to_string()),
            ]),
            overviews: HashMap::from([("eng".to_string(), "Humanity fights titans.".to_string())]),
            year: "2013".to_string(),
            image_url: "/banners/posters/81189-1.jpg".to_string(),
            remote_ids: vec![
                RemoteId {
                    id: "tt2560140".to_string(),
                    source_name: "IMDB".to_string(),
                    ..RemoteId::default()
                },
                RemoteId {
                    id: "1429".to_string(),
                    source_name: "TheMovieDB.com".to_string(),
                    ..RemoteId::default()
                },
            ],
            score: 0.6,
            ..TvdbHit::default()
        }
    }

    #[test]
    fn test_convert_hit_prefers_translation_and_keeps_original_name() {
        let result = convert_hit(&hit(), MediaType::Series, "eng").unwrap();
        let title = &result.title;
        assert_eq!(title.id, "tvdb:series:81189");
        assert_eq!(title.name, "Attack on Titan");
        assert_eq!(title.original_name, "Shingeki no Kyojin");
        assert_eq!(title.overview, "Humanity fights titans.");
        assert_eq!(title.year, 2013);
        assert_eq!(title.imdb_id, "tt2560140");
        assert_eq!(title.tmdb_id, 1429);
        assert_eq!(
            title.poster.as_ref().map(|p| p.url.as_str()),
            Some("https://artworks.thetvdb.com/banners/posters/81189-1.jpg")
        );
        assert_eq!(result.score, 1);
    }

    #[test]
    fn test_alternate_titles_are_deduped_and_sorted_by_language() {
        let result = convert_hit(&hit(), MediaType::Series, "eng").unwrap();
        // deu duplicates the display name, eng is the display name.
        assert_eq!(
            result.title.alternate_titles,
            vec!["Shingeki no Kyojin".to_string(), "L'Attaque des Titans".to_string()]
        );
    }

    #[test]
    fn test_convert_hit_falls_back_to_slug_and_thumbnail() {
        let hit = TvdbHit {
            result_type: "movie".to_string(),
            slug: "nosferatu".to_string(),
            name: "Nosferatu".to_string(),
            thumbnail: "https://artworks.thetvdb.com/thumb.jpg".to_string(),
            ..TvdbHit::default()
        };
        let result = convert_hit(&hit, MediaType::Series, "eng").unwrap();
        assert_eq!(result.title.media_type, MediaType::Movie);
        assert_eq!(result.title.id, "tvdb:movie:nosferatu");
        assert_eq!(result.title.poster.as_ref().unwrap().url, "https://artworks.thetvdb.com/thumb.jpg");
        assert_eq!(result.title.backdrop.as_ref().unwrap().image_type, "backdrop");
    }

    #[test]
    fn test_convert_hit_without_name_is_dropped() {
        let hit = TvdbHit {
            tvdb_id: "1".to_string(),
            ..TvdbHit::default()
        };
        assert!(convert_hit(&hit, MediaType::Series, "eng").is_none());
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.0), 0);
        assert_eq!(round_score(0.2), 0);
        assert_eq!(round_score(0.6), 1);
        assert_eq!(round_score(87.9), 87);
    }
}
