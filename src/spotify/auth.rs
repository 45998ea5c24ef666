use chrono::{Duration, Utc};
use reqwest::Client;
use tracing::debug;

use crate::{
    config::SpotifySettings,
    error::CatalogError,
    types::{Credential, Identity, RefreshTokenResponse, UserProfileResponse},
};

/// Refreshes an expired access token using a refresh token.
///
/// Exchanges the refresh token at the accounts service for a new access
/// token. Confidential apps authenticate with HTTP basic auth; apps without a
/// client secret send only their client id in the form.
///
/// # Arguments
///
/// * `http` - Shared HTTP client of the [`super::SpotifyClient`]
/// * `settings` - Token URL and client credentials
/// * `refresh_token` - Refresh token of the session being renewed
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Credential)` - New access token with its expiry time
/// - `Err(CatalogError)` - The refresh failed
///
/// # Token Rotation
///
/// Spotify may or may not rotate the refresh token. When the response omits
/// it, the old one stays valid and is carried over into the new credential.
/// A missing `expires_in` is taken as one hour.
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] with status `400` when Spotify answers
///   `invalid_grant`, i.e. the refresh token was revoked or expired
/// - [`CatalogError::Api`] for other error statuses
/// - [`CatalogError::Parse`] when the token response cannot be read
pub async fn refresh_token(
    http: &Client,
    settings: &SpotifySettings,
    refresh_token: &str,
) -> Result<Credential, CatalogError> {
    debug!("Refreshing Spotify access token");

    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", settings.client_id.as_str()),
    ];

    let result = super::send(|| {
        let request = http.post(&settings.token_url).form(&form);
        match &settings.client_secret {
            Some(secret) => request.basic_auth(&settings.client_id, Some(secret)),
            None => request,
        }
    })
    .await;

    let response = match result {
        Ok(response) => response,
        Err(CatalogError::Api { status: 400, .. }) => {
            return Err(CatalogError::Unauthorized(400));
        }
        Err(e) => return Err(e),
    };

    let json = response
        .json::<RefreshTokenResponse>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(Credential {
        access_token: json.access_token,
        refresh_token: json
            .refresh_token
            .or_else(|| Some(refresh_token.to_string())),
        expires_at: Some(Utc::now() + Duration::seconds(json.expires_in.unwrap_or(3600))),
    })
}

/// Returns the Spotify user the access token belongs to.
///
/// # Arguments
///
/// * `http` - Shared HTTP client of the [`super::SpotifyClient`]
/// * `api_url` - Base URL of the Web API without a trailing slash
/// * `token` - Access token to identify
///
/// # Returns
///
/// Returns the user's Spotify id and display name, if they set one.
///
/// # API Endpoint
///
/// Uses `GET /me`.
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] when the token is rejected
/// - [`CatalogError::Parse`] when the profile cannot be read
pub async fn current_user(
    http: &Client,
    api_url: &str,
    token: &str,
) -> Result<Identity, CatalogError> {
    let url = format!("{uri}/me", uri = api_url);

    let response = super::send(|| http.get(&url).bearer_auth(token)).await?;
    let profile = response
        .json::<UserProfileResponse>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(Identity {
        id: profile.id,
        display_name: profile.display_name,
    })
}
