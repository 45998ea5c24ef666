use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::AUTHORIZATION},
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::{
    pipeline::RunRequest,
    server::AppState,
    types::{CreatePlaylistBody, CreatePlaylistReply, Credential},
};

use super::ApiError;

/// Account session carried as `Authorization: Bearer <account>`.
pub fn bearer_account(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let account = value.strip_prefix("Bearer ")?.trim();
    if account.is_empty() {
        None
    } else {
        Some(account.to_string())
    }
}

/// `POST /create-playlist`
///
/// The run executes on its own task. If the client goes away the handler
/// future is dropped, the drop guard fires and the run stops at its next
/// checkpoint.
///
/// The session is checked before the body so a request without one is
/// answered with `401` even when its body is also unusable.
pub async fn create_playlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePlaylistBody>, JsonRejection>,
) -> Result<Json<CreatePlaylistReply>, ApiError> {
    let account_id = bearer_account(&headers).ok_or(ApiError::MissingSession)?;
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let expires_at = body
        .expires_in
        .and_then(chrono::Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl));
    let request = RunRequest {
        account_id,
        prompt: body.prompt,
        credential: Credential::new(body.access_token, body.refresh_token)
            .with_expiry(expires_at),
    };

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let pipeline = Arc::clone(&state.pipeline);

    let outcome = tokio::spawn(async move { pipeline.run(request, cancel).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(CreatePlaylistReply {
        playlist_url: outcome.playlist.public_url,
        playlist_name: outcome.playlist.name,
        track_count: outcome.playlist.resolved_track_count,
    }))
}
