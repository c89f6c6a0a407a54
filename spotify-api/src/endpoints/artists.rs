use super::{ExternalUrls, Image, Page, TimeRange};
use crate::macros::setter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub popularity: Option<u32>,
    pub followers: Option<Followers>,
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

// Requests

/// `GET /me/top/artists`
#[derive(Default, Debug, Clone, Serialize)]
pub struct GetTopArtists {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<TimeRange>,
}

impl GetTopArtists {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt limit: u32);
    setter!(opt offset: u32);
    setter!(opt time_range: TimeRange);
}

impl Request for GetTopArtists {
    type Data = Self;
    type Response = TopArtistsResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/me/top/artists".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

// Responses

pub type TopArtistsResponse = Page<Artist>;
