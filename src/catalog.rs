//! Capability interface for the music service.
//!
//! The pipeline only talks to the catalog through [`MusicCatalog`]. The
//! production implementation is [`crate::spotify::SpotifyClient`]; tests use
//! `fakes::FakeCatalog`.

use async_trait::async_trait;

use crate::{
    error::CatalogError,
    types::{Credential, Identity, PlaylistHandle, ResolvedTrack},
};

#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Returns the catalog id of the best match for `query`, if any.
    async fn search(&self, access_token: &str, query: &str)
    -> Result<Option<String>, CatalogError>;

    async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle, CatalogError>;

    /// Appends `tracks` to the playlist in the given order, in one request.
    async fn attach_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        tracks: &[ResolvedTrack],
    ) -> Result<(), CatalogError>;

    async fn get_identity(&self, access_token: &str) -> Result<Identity, CatalogError>;

    /// Exchanges a refresh token for a new credential.
    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential, CatalogError>;
}
