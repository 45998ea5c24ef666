use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    time::timeout,
};
use tracing::{info, warn};

use crate::{
    catalog::MusicCatalog,
    error::{CatalogError, SessionError},
    types::{Credential, Identity},
    utils,
};

#[derive(Debug, Default)]
struct RefreshState {
    attempted: bool,
    failure: Option<String>,
}

/// Owns the music-service credential for one pipeline run.
///
/// The credential is replaced at most once. Refreshes are single-flight:
/// callers that were rejected with the same stale token serialize on one
/// lock, the first performs the refresh and the rest see the new token.
pub struct SessionTokenManager {
    catalog: Arc<dyn MusicCatalog>,
    credential: RwLock<Credential>,
    refresh: Mutex<RefreshState>,
    call_timeout: Duration,
}

impl SessionTokenManager {
    pub fn new(
        catalog: Arc<dyn MusicCatalog>,
        credential: Credential,
        call_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            credential: RwLock::new(credential),
            refresh: Mutex::new(RefreshState::default()),
            call_timeout,
        }
    }

    pub async fn access_token(&self) -> String {
        self.credential.read().await.access_token.clone()
    }

    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    /// Whether this session already used its one refresh.
    pub async fn has_refreshed(&self) -> bool {
        self.refresh.lock().await.attempted
    }

    /// Refreshes up front when the credential is known to be about to expire.
    pub async fn ensure_fresh(&self) -> Result<(), SessionError> {
        let current = self.credential().await;
        if current.is_expired() {
            info!("Credential expires shortly, refreshing before use");
            self.refresh_after(&current.access_token).await
        } else {
            Ok(())
        }
    }

    /// Replaces the credential after `stale_token` was rejected.
    ///
    /// Returns immediately if another caller already replaced that token.
    /// Fails with `AuthenticationExpired` when the session has no refresh
    /// token, when the refresh call fails, or when the single refresh was
    /// already spent.
    pub async fn refresh_after(&self, stale_token: &str) -> Result<(), SessionError> {
        let mut state = self.refresh.lock().await;

        let (current_token, refresh_token) = {
            let credential = self.credential.read().await;
            (
                credential.access_token.clone(),
                credential.refresh_token.clone(),
            )
        };

        if current_token != stale_token {
            return Ok(());
        }
        if let Some(reason) = &state.failure {
            return Err(SessionError::AuthenticationExpired(reason.clone()));
        }
        if state.attempted {
            return Err(SessionError::AuthenticationExpired(
                "credential rejected after refresh".to_string(),
            ));
        }
        state.attempted = true;

        let Some(refresh_token) = refresh_token else {
            let reason = "credential rejected and no refresh token available".to_string();
            state.failure = Some(reason.clone());
            return Err(SessionError::AuthenticationExpired(reason));
        };

        info!(token = %utils::fingerprint(stale_token), "Refreshing music-service credential");

        let result = match timeout(
            self.call_timeout,
            self.catalog.refresh_credential(&refresh_token),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout),
        };

        match result {
            Ok(credential) => {
                info!(token = %utils::fingerprint(&credential.access_token), "Credential refreshed");
                *self.credential.write().await = credential;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                let reason = format!("refresh failed: {}", e);
                state.failure = Some(reason.clone());
                Err(SessionError::AuthenticationExpired(reason))
            }
        }
    }

    /// Runs `op` once with the current token, bounded by the call timeout.
    /// Authorization failures are returned to the caller untouched.
    pub async fn call_once<T, F, Fut>(&self, op: F) -> Result<T, CatalogError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let token = self.access_token().await;
        self.bounded(op(token)).await
    }

    /// Runs `op` with the current token; on an authorization failure refreshes
    /// the credential and runs `op` exactly once more.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, SessionError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let token = self.access_token().await;

        match self.bounded(op(token.clone())).await {
            Err(CatalogError::Unauthorized(status)) => {
                warn!(status, "Music service rejected the credential");
                self.refresh_after(&token).await?;

                let token = self.access_token().await;
                match self.bounded(op(token)).await {
                    Err(CatalogError::Unauthorized(_)) => Err(SessionError::AuthenticationExpired(
                        "credential rejected after refresh".to_string(),
                    )),
                    other => other.map_err(SessionError::from),
                }
            }
            other => other.map_err(SessionError::from),
        }
    }

    /// Confirms the credential works by asking who it belongs to.
    pub async fn verify(&self) -> Result<Identity, SessionError> {
        let catalog = &self.catalog;
        self.call(|token| async move { catalog.get_identity(&token).await })
            .await
    }

    async fn bounded<T, Fut>(&self, fut: Fut) -> Result<T, CatalogError>
    where
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        match timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout),
        }
    }
}
