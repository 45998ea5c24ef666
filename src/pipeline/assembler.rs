use std::sync::Arc;

use tracing::info;

use crate::{
    catalog::MusicCatalog,
    error::SessionError,
    types::{PlaylistHandle, PlaylistResult, ResolvedTrack},
};

use super::SessionTokenManager;

/// Creates the playlist container and fills it.
pub struct PlaylistAssembler {
    catalog: Arc<dyn MusicCatalog>,
}

impl PlaylistAssembler {
    pub fn new(catalog: Arc<dyn MusicCatalog>) -> Self {
        Self { catalog }
    }

    /// Creates a non-public playlist.
    pub async fn create(
        &self,
        session: &SessionTokenManager,
        name: &str,
        description: &str,
    ) -> Result<PlaylistHandle, SessionError> {
        let catalog = &self.catalog;
        let handle = session
            .call(|token| async move {
                catalog
                    .create_playlist(&token, name, description, false)
                    .await
            })
            .await?;

        info!(playlist = %handle.id, "Playlist created");
        Ok(handle)
    }

    /// Attaches all tracks in one call, even when there are none.
    pub async fn attach(
        &self,
        session: &SessionTokenManager,
        handle: &PlaylistHandle,
        tracks: &[ResolvedTrack],
    ) -> Result<PlaylistResult, SessionError> {
        let catalog = &self.catalog;
        session
            .call(|token| async move { catalog.attach_tracks(&token, &handle.id, tracks).await })
            .await?;

        info!(playlist = %handle.id, tracks = tracks.len(), "Tracks attached");
        Ok(PlaylistResult {
            catalog_playlist_id: handle.id.clone(),
            public_url: handle.public_url.clone(),
            name: handle.name.clone(),
            resolved_track_count: tracks.len(),
        })
    }
}
