pub mod artists;
pub mod tracks;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Window over which Spotify computes a user's affinity for items.
///
/// - `ShortTerm`: roughly the last 4 weeks
/// - `MediumTerm`: roughly the last 6 months
/// - `LongTerm`: roughly the last year
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortTerm => f.write_str("short_term"),
            Self::MediumTerm => f.write_str("medium_term"),
            Self::LongTerm => f.write_str("long_term"),
        }
    }
}

/// Paging object wrapping every list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub href: Option<String>,
    pub items: Vec<T>,
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}
