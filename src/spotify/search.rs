use reqwest::Client;

use crate::{error::CatalogError, types::SearchResponse};

/// Runs a track search and returns the id of the first hit.
///
/// Sends a structured query to Spotify's search endpoint and keeps only the
/// first item. Spotify orders results by relevance, so requesting a single
/// result is enough to get the best match it has.
///
/// # Arguments
///
/// * `http` - Shared HTTP client of the [`super::SpotifyClient`]
/// * `api_url` - Base URL of the Web API without a trailing slash
/// * `token` - Access token sent as bearer credential
/// * `query` - Structured query such as `track:"Amassakoul" artist:"Tinariwen"`
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Some(id))` - Spotify id of the best matching track
/// - `Ok(None)` - The search succeeded but found nothing
/// - `Err(CatalogError)` - The request or its response failed
///
/// # API Endpoint
///
/// Uses `GET /search` with the parameters:
/// - `q` - The structured query
/// - `type` - Always `track`
/// - `limit` - Always `1`
///
/// # Errors
///
/// - [`CatalogError::Unauthorized`] when the token is rejected (`401`/`403`)
/// - [`CatalogError::Api`] for other error statuses, including a `429` whose
///   `Retry-After` is too long to wait out
/// - [`CatalogError::Parse`] when the body is not a search response
/// - [`CatalogError::Timeout`] or [`CatalogError::Network`] for transport failures
///
/// # Example
///
/// ```ignore
/// let query = utils::build_track_query(&track);
/// if let Some(id) = search_track(&http, api_url, token, &query).await? {
///     println!("spotify:track:{}", id);
/// }
/// ```
pub async fn search_track(
    http: &Client,
    api_url: &str,
    token: &str,
    query: &str,
) -> Result<Option<String>, CatalogError> {
    let url = format!("{uri}/search", uri = api_url);

    let response = super::send(|| {
        http.get(&url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
    })
    .await?;

    let json = response
        .json::<SearchResponse>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(json.tracks.items.into_iter().next().map(|track| track.id))
}
