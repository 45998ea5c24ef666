//! # Spotify Integration Module
//!
//! HTTP implementation of [`MusicCatalog`] against the Spotify Web API. It is
//! the only place in the crate that knows Spotify's URLs, payloads and status
//! codes; everything above it speaks in [`CatalogError`] and domain types.
//!
//! ## Endpoints used
//!
//! - `GET /search?type=track&limit=1` - best match for a structured query
//! - `POST /me/playlists` - create a playlist owned by the token's user
//! - `POST /playlists/{playlist_id}/tracks` - append track URIs
//! - `GET /me` - identity behind the access token
//! - `POST /api/token` (accounts service) - refresh grant
//!
//! ## Status handling
//!
//! - `401`/`403` become [`CatalogError::Unauthorized`] so the session layer can
//!   refresh the credential.
//! - `429` with a short `Retry-After` is waited out once; longer waits are
//!   returned as errors.
//! - Any other non-success status becomes [`CatalogError::Api`] with the body
//!   text as message.
//!
//! The client owns a single `reqwest::Client` with a request timeout, so
//! connections are reused across the per-track searches of a run.

pub mod auth;
pub mod playlist;
pub mod search;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::warn;

use crate::{
    catalog::MusicCatalog,
    config::SpotifySettings,
    error::CatalogError,
    types::{Credential, Identity, PlaylistHandle, ResolvedTrack},
};

/// Longest `Retry-After` the client waits out before giving up.
const MAX_RETRY_AFTER_SECS: u64 = 5;

/// [`MusicCatalog`] backed by the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    settings: SpotifySettings,
}

impl SpotifyClient {
    /// Creates a client for the given Spotify settings.
    ///
    /// # Arguments
    ///
    /// * `settings` - API and token URLs plus client credentials
    /// * `timeout` - Upper bound for every request, including retries after `429`
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Network`] if the HTTP client cannot be built,
    /// e.g. when no TLS backend is available.
    pub fn new(settings: SpotifySettings, timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("promptlist/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, settings })
    }

    fn api_url(&self) -> &str {
        self.settings.api_url.trim_end_matches('/')
    }
}

#[async_trait]
impl MusicCatalog for SpotifyClient {
    async fn search(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<String>, CatalogError> {
        search::search_track(&self.http, self.api_url(), access_token, query).await
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle, CatalogError> {
        playlist::create(
            &self.http,
            self.api_url(),
            access_token,
            name,
            description,
            public,
        )
        .await
    }

    async fn attach_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        tracks: &[ResolvedTrack],
    ) -> Result<(), CatalogError> {
        playlist::add_tracks(&self.http, self.api_url(), access_token, playlist_id, tracks).await
    }

    async fn get_identity(&self, access_token: &str) -> Result<Identity, CatalogError> {
        auth::current_user(&self.http, self.api_url(), access_token).await
    }

    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential, CatalogError> {
        auth::refresh_token(&self.http, &self.settings, refresh_token).await
    }
}

/// Sends the request built by `build`, mapping Spotify's status codes onto
/// [`CatalogError`].
///
/// # Rate Limiting
///
/// - A `429 Too Many Requests` is retried once after the `Retry-After` delay
///   when that delay is at most five seconds
/// - Longer delays are logged and returned as [`CatalogError::Api`]
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] for `401` and `403`
/// - [`CatalogError::Api`] for any other non-success status, carrying the body
/// - [`CatalogError::Timeout`] or [`CatalogError::Network`] from the transport
pub(crate) async fn send<F>(build: F) -> Result<Response, CatalogError>
where
    F: Fn() -> RequestBuilder,
{
    let mut waited = false;

    loop {
        let response = build().send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized(status.as_u16()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS && !waited {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(1);

            if retry_after <= MAX_RETRY_AFTER_SECS {
                sleep(Duration::from_secs(retry_after)).await;
                waited = true;
                continue;
            }

            warn!(retry_after, "Spotify asked for an abnormally long back-off");
        }

        let message = response.text().await.unwrap_or_default();
        return Err(CatalogError::Api {
            status: status.as_u16(),
            message,
        });
    }
}
