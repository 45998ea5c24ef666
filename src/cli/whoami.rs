use std::sync::Arc;

use crate::{
    config::{self, SpotifySettings},
    error, info,
    pipeline::SessionTokenManager,
    spotify::SpotifyClient,
    success,
    types::Credential,
    utils,
};

/// Checks a Spotify credential by asking who it belongs to. A credential
/// close to expiry is refreshed first.
pub async fn whoami(credential: Credential) {
    let settings = match SpotifySettings::from_env() {
        Ok(s) => s,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let timeout = match config::call_timeout() {
        Ok(t) => t,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let catalog = match SpotifyClient::new(settings, timeout) {
        Ok(c) => c,
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    };

    let session = SessionTokenManager::new(Arc::new(catalog), credential, timeout);

    if let Err(e) = session.ensure_fresh().await {
        error!("Credential could not be refreshed. Err: {}", e);
    }

    match session.verify().await {
        Ok(identity) => success!(
            "Credential belongs to {} ({})",
            identity.display_name.as_deref().unwrap_or("unnamed user"),
            identity.id
        ),
        Err(e) => error!("Credential rejected. Err: {}", e),
    }

    if session.has_refreshed().await {
        let credential = session.credential().await;
        info!(
            "Access token was refreshed (fingerprint {})",
            utils::fingerprint(&credential.access_token)
        );
    }
}
