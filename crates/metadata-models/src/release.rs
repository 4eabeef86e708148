use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseType {
    Premiere,
    TheatricalLimited,
    Theatrical,
    Digital,
    Physical,
    Tv,
}

impl ReleaseType {
    /// Maps TMDB's numeric `release_dates` type.
    pub fn from_tmdb_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ReleaseType::Premiere),
            2 => Some(ReleaseType::TheatricalLimited),
            3 => Some(ReleaseType::Theatrical),
            4 => Some(ReleaseType::Digital),
            5 => Some(ReleaseType::Physical),
            6 => Some(ReleaseType::Tv),
            _ => None,
        }
    }

    pub fn is_theatrical(&self) -> bool {
        matches!(
            self,
            ReleaseType::Theatrical | ReleaseType::TheatricalLimited | ReleaseType::Premiere
        )
    }

    pub fn is_home(&self) -> bool {
        matches!(self, ReleaseType::Digital | ReleaseType::Physical | ReleaseType::Tv)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub released: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_type_codes() {
        assert_eq!(ReleaseType::from_tmdb_code(2), Some(ReleaseType::TheatricalLimited));
        assert_eq!(ReleaseType::from_tmdb_code(6), Some(ReleaseType::Tv));
        assert_eq!(ReleaseType::from_tmdb_code(9), None);
        assert!(ReleaseType::Premiere.is_theatrical());
        assert!(ReleaseType::Physical.is_home());
    }

    #[test]
    fn test_release_type_serializes_camel_case() {
        let json = serde_json::to_string(&ReleaseType::TheatricalLimited).unwrap();
        assert_eq!(json, "\"theatricalLimited\"");
    }
}
