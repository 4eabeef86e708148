//! Language code conversions between the forms each catalog expects.
//!
//! TVDB wants ISO 639-2 (`eng`), TMDB wants a region tag (`en-US`), and
//! `Accept-Language` gets the bare ISO 639-1 code (`en`).

/// ISO 639-1 to the three-letter codes TVDB uses.
const TVDB_CODES: &[(&str, &str)] = &[
    ("en", "eng"),
    ("es", "spa"),
    ("fr", "fra"),
    ("de", "deu"),
    ("it", "ita"),
    ("pt", "por"),
    ("ja", "jpn"),
    ("ko", "kor"),
    ("zh", "zho"),
    ("ru", "rus"),
    ("ar", "ara"),
    ("hi", "hin"),
    ("nl", "nld"),
    ("sv", "swe"),
    ("no", "nor"),
    ("da", "dan"),
    ("fi", "fin"),
    ("pl", "pol"),
    ("tr", "tur"),
    ("he", "heb"),
    ("cs", "ces"),
    ("hu", "hun"),
    ("ro", "ron"),
    ("th", "tha"),
    ("vi", "vie"),
];

pub const DEFAULT_TVDB_LANGUAGE: &str = "eng";

/// Reduces any tag to a lowercase two-letter code: `"fr-CA"` becomes `"fr"`.
pub fn normalize_language_code(lang: &str) -> String {
    let lang = lang.split(';').next().unwrap_or_default();
    let lang = lang.trim().to_lowercase();
    let primary = lang.split(['-', '_']).next().unwrap_or_default();
    primary.chars().take(2).collect()
}

/// Maps a two-letter code to TVDB's three-letter form, returning `None` when unknown.
pub fn iso639_1_to_2(code: &str) -> Option<&'static str> {
    TVDB_CODES
        .iter()
        .find(|(short, _)| *short == code)
        .map(|(_, long)| *long)
}

/// Maps a three-letter code back to two letters, returning `None` when unknown.
pub fn iso639_2_to_1(code: &str) -> Option<&'static str> {
    let code = code.to_lowercase();
    TVDB_CODES
        .iter()
        .find(|(_, long)| *long == code)
        .map(|(short, _)| *short)
}

/// The language code to send to TVDB. Unrecognised input falls back to `"eng"`.
pub fn tvdb_language(lang: &str) -> String {
    let trimmed = lang.trim().to_lowercase();
    if trimmed.is_empty() {
        return DEFAULT_TVDB_LANGUAGE.to_string();
    }
    if trimmed.len() == 3 && iso639_2_to_1(&trimmed).is_some() {
        return trimmed;
    }
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        // A bare unknown three-letter code is not a regional tag to shorten.
        return DEFAULT_TVDB_LANGUAGE.to_string();
    }
    iso639_1_to_2(&normalize_language_code(&trimmed))
        .unwrap_or(DEFAULT_TVDB_LANGUAGE)
        .to_string()
}

/// Two-letter form for `Accept-Language`, from either a two- or three-letter code.
pub fn accept_language(lang: &str) -> String {
    let trimmed = lang.trim().to_lowercase();
    if trimmed.len() == 3 {
        if let Some(short) = iso639_2_to_1(&trimmed) {
            return short.to_string();
        }
    }
    normalize_language_code(&trimmed)
}

/// TMDB's `language` query parameter, e.g. `"en-US"` or `"pt-BR"`.
pub fn tmdb_language(lang: &str) -> String {
    let lang = lang.trim().replace('_', "-");
    let lang = if lang.len() == 3 {
        iso639_2_to_1(&lang).unwrap_or("en").to_string()
    } else {
        lang
    };

    if lang.len() == 2 {
        return format!("{}-US", lang.to_lowercase());
    }
    if lang.len() >= 5 && lang.is_char_boundary(2) && lang.is_char_boundary(3) {
        return format!("{}-{}", lang[..2].to_lowercase(), lang[3..].to_uppercase());
    }
    "en-US".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_language_code() {
        assert_eq!(normalize_language_code("fr-CA"), "fr");
        assert_eq!(normalize_language_code(" EN_us "), "en");
        assert_eq!(normalize_language_code("de;q=0.8"), "de");
        assert_eq!(normalize_language_code("eng"), "en");
        assert_eq!(normalize_language_code(""), "");
    }

    #[test]
    fn test_tvdb_language() {
        assert_eq!(tvdb_language("en"), "eng");
        assert_eq!(tvdb_language("ja"), "jpn");
        assert_eq!(tvdb_language("fr-CA"), "fra");
        assert_eq!(tvdb_language("spa"), "spa");
        assert_eq!(tvdb_language("xyz"), "eng");
        assert_eq!(tvdb_language("klingon"), "eng");
        assert_eq!(tvdb_language("qq"), "eng");
        assert_eq!(tvdb_language(""), "eng");
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("eng"), "en");
        assert_eq!(accept_language("fr-CA"), "fr");
        assert_eq!(accept_language("pt"), "pt");
    }

    #[test]
    fn test_tmdb_language() {
        assert_eq!(tmdb_language("en"), "en-US");
        assert_eq!(tmdb_language("jpn"), "ja-US");
        assert_eq!(tmdb_language("xyz"), "en-US");
        assert_eq!(tmdb_language("pt_br"), "pt-BR");
        assert_eq!(tmdb_language("x"), "en-US");
    }
}
