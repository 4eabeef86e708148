use chrono::Utc;
use metadata_models::{CollectionDetails, MediaType, Title, TrendingItem};
use metadata_sources::{MdbListItem, TmdbClient, TvdbClient};
use tracing::{debug, info, instrument, warn};

use super::MetadataService;
use crate::cache::cache_key;
use crate::error::{MetadataError, Result};
use crate::ids::first_imdb_remote_id;
use crate::releases::refresh_list_release_state;

/// MDBList marks series as `show`; anything unrecognized is treated as a movie.
fn list_item_media_type(item: &MdbListItem) -> MediaType {
    match item.mediatype.trim().to_lowercase().as_str() {
        "show" | "series" | "tv" => MediaType::Series,
        _ => MediaType::Movie,
    }
}

/// Items past `limit` are dropped; 0 means no limit.
fn apply_limit(mut items: Vec<TrendingItem>, limit: usize) -> Vec<TrendingItem> {
    if limit > 0 {
        items.truncate(limit);
    }
    items
}

impl MetadataService {
    /// A public MDBList list, enriched through TVDB.
    ///
    /// Returns at most `limit` items (0 for all) along with the list's total
    /// size. Only complete enrichments are cached, so a limited first call
    /// never hides the tail of the list from later calls.
    #[instrument(skip(self))]
    pub async fn custom_list(&self, url: &str, limit: usize) -> Result<(Vec<TrendingItem>, usize)> {
        let _lease = self.lease().await;
        let url = url.trim();
        let key = cache_key(&["mdblist", "custom", "v3", url]);
        if let Some(mut cached) = self.cache.lookup::<Vec<TrendingItem>>(&key).await {
            if !cached.is_empty() {
                debug!("[metadata] custom list cache hit url={} items={}", url, cached.len());
                refresh_list_release_state(&mut cached, Utc::now());
                let total = cached.len();
                return Ok((apply_limit(cached, limit), total));
            }
        }

        let entries = self.mdblist().list(url).await?;
        let total = entries.len();
        let wanted = if limit > 0 { limit.min(total) } else { total };
        info!(
            "[metadata] fetched {} items from custom list url={} enriching={}",
            total, url, wanted
        );

        let tvdb = self.tvdb().await;
        let tmdb = self.tmdb().await;
        let mut items = Vec::with_capacity(wanted);
        for entry in entries.iter().take(wanted) {
            items.push(TrendingItem {
                rank: entry.rank,
                title: self.enrich_list_item(&tvdb, &tmdb, entry).await,
            });
        }

        if !items.is_empty() && wanted == total {
            self.cache.store(&key, &items).await;
        }
        Ok((items, total))
    }

    async fn enrich_list_item(&self, tvdb: &TvdbClient, tmdb: &TmdbClient, entry: &MdbListItem) -> Title {
        let media_type = list_item_media_type(entry);
        let mut title = Title {
            id: format!("mdblist:{}:{}", media_type.as_str(), entry.id),
            name: entry.title.clone(),
            year: entry.release_year,
            language: tvdb.language().to_string(),
            media_type,
            imdb_id: entry.imdb_id.trim().to_string(),
            tmdb_id: entry.tmdbid.unwrap_or(0),
            popularity: 100.0 - f64::from(entry.rank),
            ..Title::default()
        };

        let mut found = entry.tvdb_id() > 0 && self.apply_tvdb_record(tvdb, &mut title, entry.tvdb_id()).await;
        if !found {
            // TVDB accepts IMDB ids as remote ids.
            let mut years = vec![entry.release_year];
            if entry.release_year > 0 {
                years.push(0);
            }
            for year in years {
                match self
                    .lookup_search(tvdb, media_type, &entry.title, year, &title.imdb_id)
                    .await
                {
                    Ok(results) => {
                        if let Some(hit) = results.into_iter().find(|hit| hit.tvdb_id() > 0) {
                            self.apply_search_hit(&mut title, &hit, tvdb.language());
                            found = true;
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "[metadata] custom list {} search failed title={:?} year={} err={}",
                            media_type.as_str(),
                            entry.title,
                            year,
                            e
                        );
                        break;
                    }
                }
            }
        }
        if !found {
            debug!(
                "[metadata] no tvdb match for custom list item title={:?} year={} type={}",
                entry.title,
                entry.release_year,
                media_type.as_str()
            );
        }
        self.apply_artworks(tvdb, &mut title).await;

        match media_type {
            MediaType::Movie => {
                if title.tmdb_id <= 0 && !title.imdb_id.is_empty() {
                    title.tmdb_id = self.tmdb_for_imdb(tmdb, &title.imdb_id).await;
                }
                let tmdb_id = title.tmdb_id;
                self.enrich_movie_releases(tmdb, &mut title, tmdb_id).await;
            }
            MediaType::Series if title.tvdb_id > 0 && title.status.is_empty() => {
                match tvdb.series_extended(title.tvdb_id, &[]).await {
                    Ok(extended) => title.status = extended.status.name.trim().to_string(),
                    Err(e) => debug!("[metadata] series status fetch failed tvdbId={} err={}", title.tvdb_id, e),
                }
            }
            MediaType::Series => {}
        }
        title
    }

    /// A TMDB collection with its parts ordered by year.
    #[instrument(skip(self))]
    pub async fn collection(&self, collection_id: i64) -> Result<CollectionDetails> {
        let _lease = self.lease().await;
        if collection_id <= 0 {
            return Err(MetadataError::InvalidRequest("collection id required".to_string()));
        }
        let tmdb = self.tmdb().await;
        if !tmdb.is_configured() {
            return Err(MetadataError::NotConfigured("tmdb".to_string()));
        }

        let key = cache_key(&["tmdb", "collection", "v1", tmdb.language(), &collection_id.to_string()]);
        if let Some(cached) = self.cache.lookup::<CollectionDetails>(&key).await {
            return Ok(cached);
        }
        let collection = tmdb.collection(collection_id).await?;
        self.cache.store(&key, &collection).await;
        Ok(collection)
    }

    /// Alternate names TVDB knows for a title.
    #[instrument(skip(self))]
    pub async fn aliases(&self, media_type: MediaType, tvdb_id: i64) -> Result<Vec<String>> {
        let _lease = self.lease().await;
        if tvdb_id <= 0 {
            return Ok(Vec::new());
        }
        let key = cache_key(&["tvdb", "aliases", media_type.as_str(), &tvdb_id.to_string()]);
        if let Some(cached) = self.cache.lookup::<Vec<String>>(&key).await {
            return Ok(cached);
        }

        let tvdb = self.tvdb().await;
        let aliases = match media_type {
            MediaType::Movie => tvdb.movie_aliases(tvdb_id).await?,
            MediaType::Series => tvdb.series_aliases(tvdb_id).await?,
        };
        let names: Vec<String> = aliases
            .into_iter()
            .map(|alias| alias.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        self.cache.store(&key, &names).await;
        Ok(names)
    }

    /// IMDB id of the first TVDB search result that carries one.
    #[instrument(skip(self))]
    pub async fn resolve_imdb_id(&self, title: &str, media_type: MediaType, year: i32) -> Option<String> {
        let _lease = self.lease().await;
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let tvdb = self.tvdb().await;
        let results = match self.lookup_search(&tvdb, media_type, title, year, "").await {
            Ok(results) => results,
            Err(e) => {
                warn!("[metadata] imdb resolution search failed title={:?} err={}", title, e);
                return None;
            }
        };

        let found = results.iter().find_map(|hit| first_imdb_remote_id(&hit.remote_ids));
        match &found {
            Some(imdb_id) => debug!("[metadata] resolved imdb id {} for {:?}", imdb_id, title),
            None => debug!(
                "[metadata] no imdb id in {} tvdb results for {:?}",
                results.len(),
                title
            ),
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_media_type() {
        let item = |kind: &str| MdbListItem {
            mediatype: kind.to_string(),
            ..MdbListItem::default()
        };
        assert_eq!(list_item_media_type(&item("show")), MediaType::Series);
        assert_eq!(list_item_media_type(&item("TV")), MediaType::Series);
        assert_eq!(list_item_media_type(&item("movie")), MediaType::Movie);
        assert_eq!(list_item_media_type(&item("")), MediaType::Movie);
    }

    #[test]
    fn test_apply_limit() {
        let items: Vec<TrendingItem> = (1..=4)
            .map(|rank| TrendingItem {
                rank,
                title: Title::default(),
            })
            .collect();
        assert_eq!(apply_limit(items.clone(), 0).len(), 4);
        assert_eq!(apply_limit(items.clone(), 2).len(), 2);
        assert_eq!(apply_limit(items, 10).len(), 4);
    }
}
