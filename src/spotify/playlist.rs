use reqwest::Client;

use crate::{
    error::CatalogError,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, PlaylistHandle, ResolvedTrack,
    },
};

/// Creates a playlist owned by the user behind `token`.
///
/// The playlist is created empty and never collaborative. Tracks are added
/// afterwards with [`add_tracks`].
///
/// # Arguments
///
/// * `http` - Shared HTTP client of the [`super::SpotifyClient`]
/// * `api_url` - Base URL of the Web API without a trailing slash
/// * `token` - Access token of the playlist owner
/// * `name` - Playlist title
/// * `description` - Playlist description shown in the Spotify clients
/// * `public` - Whether the playlist appears on the user's profile
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(PlaylistHandle)` - Id, name and public link of the new playlist
/// - `Err(CatalogError)` - The playlist could not be created
///
/// # Public URL
///
/// The link is taken from the response's `external_urls.spotify`. When the
/// response carries none, it is built from the playlist id as
/// `https://open.spotify.com/playlist/{id}`.
///
/// # API Endpoint
///
/// Uses `POST /me/playlists`, which creates the playlist for the current user
/// without needing their user id.
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] when the token is rejected
/// - [`CatalogError::Api`] for other error statuses
/// - [`CatalogError::Parse`] when the response is not a playlist object
pub async fn create(
    http: &Client,
    api_url: &str,
    token: &str,
    name: &str,
    description: &str,
    public: bool,
) -> Result<PlaylistHandle, CatalogError> {
    let url = format!("{uri}/me/playlists", uri = api_url);
    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: description.to_string(),
        public,
        collaborative: false,
    };

    let response = super::send(|| http.post(&url).bearer_auth(token).json(&body)).await?;
    let created = response
        .json::<CreatePlaylistResponse>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    let public_url = created
        .external_urls
        .spotify
        .unwrap_or_else(|| crate::utils::playlist_url(&created.id));

    Ok(PlaylistHandle {
        id: created.id,
        name: created.name,
        public_url,
    })
}

/// Appends tracks to a playlist in one request.
///
/// Tracks are sent as `spotify:track:{id}` URIs in the order given, which is
/// the order they appear in the playlist. An empty slice still issues the
/// request so the outcome is the same for every run.
///
/// # Arguments
///
/// * `http` - Shared HTTP client of the [`super::SpotifyClient`]
/// * `api_url` - Base URL of the Web API without a trailing slash
/// * `token` - Access token of the playlist owner
/// * `playlist_id` - Id returned by [`create`]
/// * `tracks` - Resolved tracks, at most 100
///
/// # Returns
///
/// Returns `Ok(())` once Spotify acknowledged the change with a snapshot id.
///
/// # API Endpoint
///
/// Uses `POST /playlists/{playlist_id}/tracks` with a JSON body `{ "uris": [...] }`.
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] when the token is rejected
/// - [`CatalogError::Api`] for other error statuses, e.g. an unknown playlist
/// - [`CatalogError::Parse`] when the acknowledgement cannot be read
pub async fn add_tracks(
    http: &Client,
    api_url: &str,
    token: &str,
    playlist_id: &str,
    tracks: &[ResolvedTrack],
) -> Result<(), CatalogError> {
    let url = format!("{uri}/playlists/{id}/tracks", uri = api_url, id = playlist_id);
    let body = AddTrackToPlaylistRequest {
        uris: tracks.iter().map(ResolvedTrack::uri).collect(),
    };

    let response = super::send(|| http.post(&url).bearer_auth(token).json(&body)).await?;
    response
        .json::<AddTrackToPlaylistResponse>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(())
}
