use super::{ExternalUrls, Image, Page, SimplifiedArtist, TimeRange};
use crate::macros::setter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub album: Option<Album>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub explicit: bool,
    pub popularity: Option<u32>,
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Track {
    /// The first credited artist, which Spotify lists as the main one.
    pub fn primary_artist(&self) -> Option<&SimplifiedArtist> {
        self.artists.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

// Requests

/// `GET /me/top/tracks`
#[derive(Default, Debug, Clone, Serialize)]
pub struct GetTopTracks {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<TimeRange>,
}

impl GetTopTracks {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt limit: u32);
    setter!(opt offset: u32);
    setter!(opt time_range: TimeRange);
}

impl Request for GetTopTracks {
    type Data = Self;
    type Response = TopTracksResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/me/top/tracks".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

// Responses

pub type TopTracksResponse = Page<Track>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_tracks_page() {
        let body = r#"{
            "href": "https://api.spotify.com/v1/me/top/tracks",
            "limit": 1,
            "offset": 0,
            "total": 1,
            "next": null,
            "previous": null,
            "items": [
                {
                    "id": "3n3Ppam7vgaVa1iaRUc9Lp",
                    "name": "Mr. Brightside",
                    "artists": [
                        {"id": "0C0XlULifJtAgn6ZNCW2eu", "name": "The Killers", "type": "artist"},
                        {"id": "x", "name": "Someone Else", "type": "artist"}
                    ],
                    "album": {"id": "a", "name": "Hot Fuss", "release_date": "2004", "images": []},
                    "duration_ms": 222075,
                    "explicit": false,
                    "popularity": 88
                }
            ]
        }"#;

        let page: TopTracksResponse = serde_json::from_str(body).unwrap();
        let track = &page.items[0];
        assert_eq!(track.name, "Mr. Brightside");
        assert_eq!(
            track.primary_artist().map(|a| a.name.as_str()),
            Some("The Killers")
        );
        assert_eq!(track.album.as_ref().map(|a| a.name.as_str()), Some("Hot Fuss"));
    }

    #[test]
    fn track_without_artists_has_no_primary_artist() {
        let track: Track =
            serde_json::from_str(r#"{"name": "Untitled", "artists": []}"#).unwrap();
        assert!(track.primary_artist().is_none());
    }
}
