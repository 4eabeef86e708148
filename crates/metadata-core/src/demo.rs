//! Fixed catalog of public-domain titles served in demo mode.

use metadata_models::{MediaType, Title, TrendingItem};

pub struct DemoEntry {
    pub slug: &'static str,
    pub name: &'static str,
    pub year: i32,
    pub overview: &'static str,
}

pub const DEMO_MOVIES: &[DemoEntry] = &[
    DemoEntry {
        slug: "night-of-the-living-dead",
        name: "Night of the Living Dead",
        year: 1968,
        overview: "A group of strangers barricade themselves in a farmhouse as the recently dead rise and surround it.",
    },
    DemoEntry {
        slug: "nosferatu",
        name: "Nosferatu",
        year: 1922,
        overview: "An estate agent travels to Transylvania to close a sale with the reclusive Count Orlok.",
    },
    DemoEntry {
        slug: "the-general",
        name: "The General",
        year: 1926,
        overview: "A Confederate railroad engineer chases the Union spies who stole his beloved locomotive.",
    },
    DemoEntry {
        slug: "his-girl-friday",
        name: "His Girl Friday",
        year: 1940,
        overview: "A newspaper editor schemes to keep his ex-wife, his best reporter, from remarrying.",
    },
    DemoEntry {
        slug: "charade",
        name: "Charade",
        year: 1963,
        overview: "A widow in Paris is pursued by men who want the fortune her late husband stole.",
    },
    DemoEntry {
        slug: "the-cabinet-of-dr-caligari",
        name: "The Cabinet of Dr. Caligari",
        year: 1920,
        overview: "A hypnotist uses a somnambulist to commit murders in a small German town.",
    },
    DemoEntry {
        slug: "sherlock-jr",
        name: "Sherlock Jr.",
        year: 1924,
        overview: "A projectionist who dreams of being a detective walks into the film he is showing.",
    },
    DemoEntry {
        slug: "detour",
        name: "Detour",
        year: 1945,
        overview: "A nightclub pianist hitchhiking to Los Angeles is drawn into a fatal chain of events.",
    },
];

pub const DEMO_SERIES: &[DemoEntry] = &[
    DemoEntry {
        slug: "the-cisco-kid",
        name: "The Cisco Kid",
        year: 1950,
        overview: "A charming outlaw and his sidekick Pancho ride the Old West righting wrongs.",
    },
    DemoEntry {
        slug: "sherlock-holmes-1954",
        name: "Sherlock Holmes",
        year: 1954,
        overview: "The consulting detective and Dr. Watson take on cases across London.",
    },
    DemoEntry {
        slug: "flash-gordon-1954",
        name: "Flash Gordon",
        year: 1954,
        overview: "Flash Gordon and his companions patrol the galaxy for the Galactic Bureau of Investigation.",
    },
    DemoEntry {
        slug: "the-lone-ranger",
        name: "The Lone Ranger",
        year: 1949,
        overview: "A masked former Texas Ranger and his companion Tonto fight injustice on the frontier.",
    },
    DemoEntry {
        slug: "one-step-beyond",
        name: "One Step Beyond",
        year: 1959,
        overview: "Dramatizations of reportedly true stories of the paranormal, introduced by John Newland.",
    },
];

fn entries(media_type: MediaType) -> &'static [DemoEntry] {
    match media_type {
        MediaType::Movie => DEMO_MOVIES,
        MediaType::Series => DEMO_SERIES,
    }
}

pub fn demo_title(entry: &DemoEntry, media_type: MediaType) -> Title {
    Title {
        id: format!("demo:{}:{}", media_type.as_str(), entry.slug),
        name: entry.name.to_string(),
        overview: entry.overview.to_string(),
        year: entry.year,
        media_type,
        ..Title::default()
    }
}

/// Whole catalog for `media_type`, ranked from 1 in catalog order.
pub fn demo_trending(media_type: MediaType) -> Vec<TrendingItem> {
    entries(media_type)
        .iter()
        .enumerate()
        .map(|(idx, entry)| TrendingItem {
            rank: idx as u32 + 1,
            title: demo_title(entry, media_type),
        })
        .collect()
}

/// Case-insensitive substring match on the name.
pub fn demo_search(query: &str, media_type: MediaType) -> Vec<Title> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    entries(media_type)
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
        .map(|entry| demo_title(entry, media_type))
        .collect()
}

/// Slug part of a `demo:` title id.
pub fn demo_slug(title_id: &str) -> Option<&str> {
    title_id.strip_prefix("demo:")?.split(':').nth(1)
}
