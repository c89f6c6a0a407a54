use async_trait::async_trait;
use spotify_api::{
    endpoints::{artists::Artist, tracks::Track, TimeRange},
    Client, Request,
};

use super::ProfileSource;
use crate::common::ProfileSnapshot;
use crate::error::RoastError;

/// How many artists and tracks go into a roast.
pub const TOP_LIMIT: u32 = 5;

pub struct ProfileFetcher {
    api_base_url: String,
}

impl ProfileFetcher {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
        }
    }
}

#[async_trait]
impl ProfileSource for ProfileFetcher {
    async fn fetch_top(&self, access_token: &str) -> Result<ProfileSnapshot, RoastError> {
        let client = Client::with_base_url(&self.api_base_url, access_token);

        let artists = client
            .send(
                Request::top()
                    .artists()
                    .limit(TOP_LIMIT)
                    .time_range(TimeRange::MediumTerm),
            )
            .await?
            .items;

        let tracks = client
            .send(
                Request::top()
                    .tracks()
                    .limit(TOP_LIMIT)
                    .time_range(TimeRange::ShortTerm),
            )
            .await?
            .items;

        tracing::debug!(
            artists = artists.len(),
            tracks = tracks.len(),
            "Fetched top items"
        );

        snapshot_from(&artists, &tracks)
    }
}

/// Condense the two top-item lists into what the prompt and page need.
pub fn snapshot_from(artists: &[Artist], tracks: &[Track]) -> Result<ProfileSnapshot, RoastError> {
    let limit = TOP_LIMIT as usize;

    let top_artist_names = artists
        .iter()
        .take(limit)
        .map(|artist| artist.name.clone())
        .collect();

    let top_track_descriptions = tracks
        .iter()
        .take(limit)
        .map(|track| {
            let artist = track.primary_artist().ok_or_else(|| {
                RoastError::FetchFailed(format!("Track '{}' has no artists", track.name))
            })?;
            Ok(format!("{} by {}", track.name, artist.name))
        })
        .collect::<Result<Vec<_>, RoastError>>()?;

    let top_artist_image_url = artists
        .first()
        .and_then(|artist| artist.images.first())
        .map(|image| image.url.clone());

    Ok(ProfileSnapshot {
        top_artist_names,
        top_track_descriptions,
        top_artist_image_url,
    })
}
