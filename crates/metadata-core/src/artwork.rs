//! TVDB artwork normalization and poster/backdrop classification.

use metadata_models::{Image, Title};
use metadata_sources::tvdb::Artwork;
use reqwest::Url;

pub const TVDB_ARTWORK_BASE_URL: &str = "https://artworks.thetvdb.com";

const POSTER_TYPE_CODES: [&str; 3] = ["2", "4", "14"];
const BACKDROP_TYPE_CODES: [&str; 3] = ["3", "5", "15"];

/// Rewrites a TVDB image reference to an absolute https URL.
pub fn normalize_tvdb_image_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(url) = Url::parse(trimmed) {
        if url.has_host() {
            return trimmed.to_string();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    if trimmed.to_lowercase().contains("thetvdb.com") {
        return format!("https://{}", trimmed);
    }
    format!("{}/{}", TVDB_ARTWORK_BASE_URL, trimmed.trim_start_matches('/'))
}

/// Builds an image with a normalized URL, or `None` for an empty reference.
pub fn tvdb_image(value: &str, image_type: &str) -> Option<Image> {
    let url = normalize_tvdb_image_url(value);
    if url.is_empty() {
        None
    } else {
        Some(Image::new(url, image_type))
    }
}

pub fn looks_like_poster(artwork: &Artwork) -> bool {
    let kind = artwork.artwork_type.trim().to_lowercase();
    if kind.contains("poster") || kind.contains("cover") || POSTER_TYPE_CODES.contains(&kind.as_str()) {
        return true;
    }
    let path = artwork.image.to_lowercase();
    path.contains("poster") || path.contains("/covers/")
}

pub fn looks_like_backdrop(artwork: &Artwork) -> bool {
    let kind = artwork.artwork_type.trim().to_lowercase();
    if kind.contains("background")
        || kind.contains("fanart")
        || kind.contains("backdrop")
        || BACKDROP_TYPE_CODES.contains(&kind.as_str())
    {
        return true;
    }
    let path = artwork.image.to_lowercase();
    path.contains("background") || path.contains("fanart") || path.contains("backdrop")
}

/// Fills a missing poster and backdrop from an artworks list.
///
/// Existing images are never replaced. Scanning stops once both are set.
/// Returns whether the title changed.
pub fn apply_tvdb_artworks(title: &mut Title, artworks: &[Artwork]) -> bool {
    let mut updated = false;
    for artwork in artworks {
        if title.poster.is_some() && title.backdrop.is_some() {
            break;
        }
        let url = normalize_tvdb_image_url(&artwork.image);
        if url.is_empty() {
            continue;
        }
        if title.poster.is_none() && looks_like_poster(artwork) {
            title.poster = Some(Image {
                url: url.clone(),
                image_type: "poster".to_string(),
                width: artwork.width,
                height: artwork.height,
            });
            updated = true;
        }
        if title.backdrop.is_none() && looks_like_backdrop(artwork) {
            title.backdrop = Some(Image {
                url,
                image_type: "backdrop".to_string(),
                width: artwork.width,
                height: artwork.height,
            });
            updated = true;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artwork(kind: &str, image: &str) -> Artwork {
        Artwork {
            artwork_type: kind.to_string(),
            image: image.to_string(),
            width: 680,
            height: 1000,
            ..Artwork::default()
        }
    }

    #[test]
    fn test_normalize_tvdb_image_url() {
        assert_eq!(normalize_tvdb_image_url(""), "");
        assert_eq!(
            normalize_tvdb_image_url("https://artworks.thetvdb.com/banners/a.jpg"),
            "https://artworks.thetvdb.com/banners/a.jpg"
        );
        assert_eq!(
            normalize_tvdb_image_url("//artworks.thetvdb.com/banners/a.jpg"),
            "https://artworks.thetvdb.com/banners/a.jpg"
        );
        assert_eq!(
            normalize_tvdb_image_url("artworks.thetvdb.com/banners/a.jpg"),
            "https://artworks.thetvdb.com/banners/a.jpg"
        );
        assert_eq!(
            normalize_tvdb_image_url("/banners/posters/1.jpg"),
            "https://artworks.thetvdb.com/banners/posters/1.jpg"
        );
        assert_eq!(
            normalize_tvdb_image_url("banners/posters/1.jpg"),
            "https://artworks.thetvdb.com/banners/posters/1.jpg"
        );
    }

    #[test]
    fn test_classification_by_type_code() {
        assert!(looks_like_poster(&artwork("2", "/banners/v4/a.jpg")));
        assert!(looks_like_poster(&artwork("14", "/banners/v4/a.jpg")));
        assert!(looks_like_backdrop(&artwork("3", "/banners/v4/a.jpg")));
        assert!(looks_like_backdrop(&artwork("15", "/banners/v4/a.jpg")));
        assert!(!looks_like_poster(&artwork("7", "/banners/v4/a.jpg")));
        assert!(!looks_like_backdrop(&artwork("7", "/banners/v4/a.jpg")));
    }

    #[test]
    fn test_classification_by_substring() {
        assert!(looks_like_poster(&artwork("", "/banners/posters/81189-1.jpg")));
        assert!(looks_like_poster(&artwork("", "/banners/movies/covers/1.jpg")));
        assert!(looks_like_poster(&artwork("Season Cover", "/x.jpg")));
        assert!(looks_like_backdrop(&artwork("", "/banners/fanart/original/1.jpg")));
        assert!(looks_like_backdrop(&artwork("Background", "/x.jpg")));
    }

    #[test]
    fn test_apply_fills_missing_and_keeps_existing() {
        let mut title = Title {
            backdrop: Some(Image::new("https://existing/backdrop.jpg", "backdrop")),
            ..Title::default()
        };
        let arts = vec![
            artwork("3", "/banners/fanart/1.jpg"),
            artwork("", ""),
            artwork("2", "/banners/posters/1.jpg"),
            artwork("2", "/banners/posters/2.jpg"),
        ];

        assert!(apply_tvdb_artworks(&mut title, &arts));
        let poster = title.poster.unwrap();
        assert_eq!(poster.url, "https://artworks.thetvdb.com/banners/posters/1.jpg");
        assert_eq!(poster.width, 680);
        assert_eq!(title.backdrop.unwrap().url, "https://existing/backdrop.jpg");
    }

    #[test]
    fn test_apply_reports_no_change() {
        let mut title = Title::default();
        assert!(!apply_tvdb_artworks(&mut title, &[artwork("7", "/banners/clearlogo/1.png")]));
        assert!(title.poster.is_none());
    }
}
