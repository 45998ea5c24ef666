use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{
    catalog::MusicCatalog,
    error::ResolveError,
    types::{DraftTrack, ResolvedTrack},
    utils,
};

use super::SessionTokenManager;

/// Searches in flight at once for one run.
pub const DEFAULT_MAX_CONCURRENT_SEARCHES: usize = 8;

enum SearchOutcome {
    Hit(String),
    Miss,
    Unauthorized,
}

/// Maps draft tracks to catalog ids, dropping the ones without a match.
pub struct CatalogResolver {
    catalog: Arc<dyn MusicCatalog>,
    max_concurrent: usize,
}

impl CatalogResolver {
    pub fn new(catalog: Arc<dyn MusicCatalog>) -> Self {
        Self::with_concurrency(catalog, DEFAULT_MAX_CONCURRENT_SEARCHES)
    }

    pub fn with_concurrency(catalog: Arc<dyn MusicCatalog>, max_concurrent: usize) -> Self {
        Self {
            catalog,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Resolves every track and returns the hits in input order.
    ///
    /// Searches run concurrently. A failed search counts as a miss for that
    /// track only. If any search was rejected for authorization the whole
    /// batch is reported as [`ResolveError::Unauthorized`] once every search
    /// has settled.
    pub async fn resolve_all(
        &self,
        session: &Arc<SessionTokenManager>,
        tracks: &[DraftTrack],
    ) -> Result<Vec<ResolvedTrack>, ResolveError> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(tracks.len());

        for track in tracks {
            let catalog = Arc::clone(&self.catalog);
            let session = Arc::clone(session);
            let permits = Arc::clone(&permits);
            let query = utils::build_track_query(track);

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await;
                let result = session
                    .call_once(|token| async move { catalog.search(&token, &query).await })
                    .await;

                match result {
                    Ok(Some(id)) => SearchOutcome::Hit(id),
                    Ok(None) => SearchOutcome::Miss,
                    Err(e) if e.is_unauthorized() => SearchOutcome::Unauthorized,
                    Err(e) => {
                        warn!(error = %e, "Track search failed, treating as no match");
                        SearchOutcome::Miss
                    }
                }
            });
            handles.push(handle);
        }

        let mut resolved = Vec::with_capacity(tracks.len());
        let mut rejected = false;

        for (handle, track) in handles.into_iter().zip(tracks) {
            match handle.await {
                Ok(SearchOutcome::Hit(catalog_id)) => resolved.push(ResolvedTrack { catalog_id }),
                Ok(SearchOutcome::Miss) => {
                    debug!(track = %track.name, artist = %track.artist, "No catalog match");
                }
                Ok(SearchOutcome::Unauthorized) => rejected = true,
                Err(e) => warn!("Search task join error: {}", e),
            }
        }

        if rejected {
            return Err(ResolveError::Unauthorized);
        }

        info!(
            suggested = tracks.len(),
            matched = resolved.len(),
            unmatched = tracks.len() - resolved.len(),
            "Tracks resolved"
        );
        Ok(resolved)
    }
}
