use crate::endpoints::{artists::GetTopArtists, tracks::GetTopTracks};

/// Requests scoped to the current user's top items (`/me/top/*`).
pub struct TopItemsRepository;

impl TopItemsRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn artists(&self) -> GetTopArtists {
        GetTopArtists::new()
    }

    pub fn tracks(&self) -> GetTopTracks {
        GetTopTracks::new()
    }
}
