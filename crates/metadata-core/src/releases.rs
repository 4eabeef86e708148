//! Release window selection.
//!
//! Releases fall into a theatrical bucket (theatrical, then limited, then
//! premiere) and a home bucket (digital, then physical, then tv). Within a
//! bucket the best priority wins and ties go to the earliest date. Exactly
//! one entry per non-empty bucket carries `primary`.

use chrono::{DateTime, NaiveDate, Utc};
use metadata_models::{MediaType, Release, ReleaseType, Title, TrendingItem};

/// Accepts RFC 3339 timestamps or anything starting with `YYYY-MM-DD`.
pub fn parse_release_time(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed.get(..10)?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn theatrical_priority(release_type: ReleaseType) -> Option<u8> {
    match release_type {
        ReleaseType::Theatrical => Some(0),
        ReleaseType::TheatricalLimited => Some(1),
        ReleaseType::Premiere => Some(2),
        _ => None,
    }
}

fn home_priority(release_type: ReleaseType) -> Option<u8> {
    match release_type {
        ReleaseType::Digital => Some(0),
        ReleaseType::Physical => Some(1),
        ReleaseType::Tv => Some(2),
        _ => None,
    }
}

fn best_index(releases: &[Release], priority: fn(ReleaseType) -> Option<u8>) -> Option<usize> {
    releases
        .iter()
        .enumerate()
        .filter_map(|(idx, release)| {
            let rank = priority(release.release_type)?;
            let ts = parse_release_time(&release.date)?;
            Some((rank, ts, idx))
        })
        .min()
        .map(|(_, _, idx)| idx)
}

/// Flags the primary entry of each bucket and returns copies of them as
/// `(theatrical, home)`. Entries without a parseable date never win.
pub fn bucket_releases(releases: &mut [Release]) -> (Option<Release>, Option<Release>) {
    for release in releases.iter_mut() {
        release.primary = false;
    }
    let theatrical = best_index(releases, theatrical_priority);
    let home = best_index(releases, home_priority);

    let mut pick = |idx: Option<usize>| {
        idx.map(|i| {
            releases[i].primary = true;
            releases[i].clone()
        })
    };
    let theatrical = pick(theatrical);
    let home = pick(home);
    (theatrical, home)
}

/// Recomputes `released` against `now` and re-selects the primary windows.
///
/// Run after every fetch and on every cache read, so a release that has since
/// passed is reported as released even when the entry was cached earlier.
pub fn refresh_release_state(title: &mut Title, now: DateTime<Utc>) {
    if title.releases.is_empty() {
        title.theatrical_release = None;
        title.home_release = None;
        return;
    }
    for release in title.releases.iter_mut() {
        release.released = parse_release_time(&release.date)
            .map(|ts| ts <= now)
            .unwrap_or(false);
    }
    let (theatrical, home) = bucket_releases(&mut title.releases);
    title.theatrical_release = theatrical;
    title.home_release = home;
}

/// [`refresh_release_state`] over the movies of a cached list.
pub fn refresh_list_release_state(items: &mut [TrendingItem], now: DateTime<Utc>) {
    for item in items.iter_mut().filter(|item| item.title.media_type == MediaType::Movie) {
        refresh_release_state(&mut item.title, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn release(release_type: ReleaseType, date: &str) -> Release {
        Release {
            release_type,
            date: date.to_string(),
            country: "US".to_string(),
            note: String::new(),
            source: "tmdb".to_string(),
            primary: false,
            released: false,
        }
    }

    #[test]
    fn test_parse_release_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_release_time("2024-05-01T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_release_time("2024-05-01"), Some(expected));
        assert_eq!(parse_release_time("2024-05-01 garbage"), Some(expected));
        assert_eq!(parse_release_time(""), None);
        assert_eq!(parse_release_time("soon"), None);
    }

    #[test]
    fn test_one_primary_per_bucket() {
        let mut releases = vec![
            release(ReleaseType::Tv, "2023-01-01"),
            release(ReleaseType::Theatrical, "2022-07-01"),
            release(ReleaseType::Digital, "2022-10-01"),
            release(ReleaseType::Theatrical, "2022-06-15"),
            release(ReleaseType::Digital, "2022-09-20"),
        ];
        let (theatrical, home) = bucket_releases(&mut releases);

        assert_eq!(theatrical.unwrap().date, "2022-06-15");
        assert_eq!(home.unwrap().date, "2022-09-20");
        assert_eq!(releases.iter().filter(|r| r.primary).count(), 2);
        assert!(releases[3].primary);
        assert!(releases[4].primary);
    }

    #[test]
    fn test_priority_beats_earlier_date() {
        let mut releases = vec![
            release(ReleaseType::Premiere, "2022-01-01"),
            release(ReleaseType::TheatricalLimited, "2022-02-01"),
            release(ReleaseType::Physical, "2022-03-01"),
            release(ReleaseType::Tv, "2022-01-15"),
        ];
        let (theatrical, home) = bucket_releases(&mut releases);
        assert_eq!(theatrical.unwrap().release_type, ReleaseType::TheatricalLimited);
        assert_eq!(home.unwrap().release_type, ReleaseType::Physical);
    }

    #[test]
    fn test_undated_entries_never_win() {
        let mut releases = vec![release(ReleaseType::Theatrical, ""), release(ReleaseType::Premiere, "2020-01-01")];
        let (theatrical, home) = bucket_releases(&mut releases);
        assert_eq!(theatrical.unwrap().release_type, ReleaseType::Premiere);
        assert!(home.is_none());
        assert!(!releases[0].primary);
    }

    #[test]
    fn test_refresh_recomputes_released_flag() {
        let mut title = Title {
            releases: vec![
                release(ReleaseType::Theatrical, "2024-05-01"),
                release(ReleaseType::Digital, "2024-08-01"),
            ],
            ..Title::default()
        };

        let before = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        refresh_release_state(&mut title, before);
        assert!(title.theatrical_release.as_ref().unwrap().released);
        assert!(!title.home_release.as_ref().unwrap().released);

        let after = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        refresh_release_state(&mut title, after);
        assert!(title.home_release.as_ref().unwrap().released);
        assert_eq!(title.home_release.as_ref(), title.releases.iter().find(|r| r.primary && r.release_type.is_home()));
    }

    #[test]
    fn test_refresh_clears_windows_without_releases() {
        let mut title = Title {
            theatrical_release: Some(release(ReleaseType::Theatrical, "2020-01-01")),
            ..Title::default()
        };
        refresh_release_state(&mut title, Utc::now());
        assert!(title.theatrical_release.is_none());
    }
}
