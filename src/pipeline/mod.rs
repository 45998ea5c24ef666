//! # Playlist pipeline
//!
//! Turns one `(prompt, account, credential)` request into one playlist on the
//! music service:
//!
//! ```text
//! Gating -> Generating -> Resolving -> Assembling -> Recording -> Done
//!    \           \            \             \
//!     +-----------+------------+-------------+----> Failed(kind)
//! ```
//!
//! - **Gating**: [`EntitlementGate::check`]; denial ends the run before any
//!   external call is made.
//! - **Generating**: [`TrackSuggestionEngine::generate`]; failures are fatal.
//! - **Resolving**: [`CatalogResolver::resolve_all`]; unmatched tracks are
//!   dropped. An authorization failure refreshes the credential and restarts
//!   the batch once.
//! - **Assembling**: [`PlaylistAssembler`]; a failed `create` is fatal, a
//!   failed `attach` is a degraded success with zero tracks.
//! - **Recording**: [`EntitlementGate::record_usage`]; a failure here is
//!   reported to operators and on the outcome, never to the caller as an error.
//!
//! Cancellation is checked before Generating, Resolving and Assembling.
//! Recording always follows a successful assembly since the playlist already
//! exists on the service.

mod assembler;
mod entitlement;
mod resolver;
mod session;
mod suggestion;

pub use assembler::PlaylistAssembler;
pub use entitlement::{EntitlementGate, GateDecision, evaluate};
pub use resolver::{CatalogResolver, DEFAULT_MAX_CONCURRENT_SEARCHES};
pub use session::SessionTokenManager;
pub use suggestion::{TrackSuggestionEngine, parse_draft, response_schema};

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    catalog::MusicCatalog,
    error::{PipelineError, ResolveError, SessionError},
    llm::LanguageModel,
    types::{Credential, DraftTrack, PlaylistResult, ResolvedTrack},
    utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Gating,
    Generating,
    Resolving,
    Assembling,
    Recording,
    Done,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub account_id: String,
    pub prompt: String,
    pub credential: Credential,
}

/// Non-fatal problems of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The playlist exists but adding its tracks failed.
    AssemblyPartial(String),
    /// The playlist exists but the usage counter was not updated.
    RecordingFailed(String),
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub playlist: PlaylistResult,
    /// Suggested tracks without a catalog match.
    pub unmatched: usize,
    pub degradations: Vec<Degradation>,
}

impl PipelineOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

struct Assembled {
    playlist: PlaylistResult,
    unmatched: usize,
    degradations: Vec<Degradation>,
}

pub struct PlaylistPipeline {
    gate: Arc<EntitlementGate>,
    engine: TrackSuggestionEngine,
    resolver: CatalogResolver,
    assembler: PlaylistAssembler,
    catalog: Arc<dyn MusicCatalog>,
    call_timeout: Duration,
}

impl PlaylistPipeline {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        catalog: Arc<dyn MusicCatalog>,
        gate: Arc<EntitlementGate>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            engine: TrackSuggestionEngine::new(model, call_timeout),
            resolver: CatalogResolver::new(Arc::clone(&catalog)),
            assembler: PlaylistAssembler::new(Arc::clone(&catalog)),
            catalog,
            call_timeout,
        }
    }

    pub fn gate(&self) -> &Arc<EntitlementGate> {
        &self.gate
    }

    /// A fresh credential session bound to this pipeline's catalog.
    pub fn session(&self, credential: Credential) -> Arc<SessionTokenManager> {
        Arc::new(SessionTokenManager::new(
            Arc::clone(&self.catalog),
            credential,
            self.call_timeout,
        ))
    }

    pub async fn run(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let span = info_span!(
            "pipeline",
            run = %utils::generate_run_id(),
            account = %request.account_id
        );

        async move {
            let result = self.execute(request, &cancel).await;
            match &result {
                Ok(outcome) => info!(
                    playlist = %outcome.playlist.catalog_playlist_id,
                    tracks = outcome.playlist.resolved_track_count,
                    unmatched = outcome.unmatched,
                    degraded = outcome.is_degraded(),
                    "Run finished"
                ),
                Err(e) => warn!(kind = e.kind().as_str(), error = %e, "Run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: RunRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        if request.prompt.trim().is_empty() {
            return Err(PipelineError::InvalidPrompt);
        }

        enter(RunState::Gating);
        if let GateDecision::Deny { reason } = self.gate.check(&request.account_id).await? {
            return Err(PipelineError::QuotaExceeded { reason });
        }

        let assembled = match self.produce(&request, cancel).await {
            Ok(assembled) => assembled,
            Err(e) => {
                self.gate.release(&request.account_id).await;
                return Err(e);
            }
        };

        enter(RunState::Recording);
        let mut degradations = assembled.degradations;
        if let Err(e) = self.gate.record_usage(&request.account_id).await {
            error!(error = %e, "Playlist created but usage could not be recorded");
            degradations.push(Degradation::RecordingFailed(e.to_string()));
        }

        enter(RunState::Done);
        Ok(PipelineOutcome {
            playlist: assembled.playlist,
            unmatched: assembled.unmatched,
            degradations,
        })
    }

    /// Generating through Assembling.
    async fn produce(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<Assembled, PipelineError> {
        checkpoint(cancel)?;
        enter(RunState::Generating);
        let draft = self.engine.generate(&request.prompt).await?;

        checkpoint(cancel)?;
        enter(RunState::Resolving);
        let session = self.session(request.credential.clone());
        session.ensure_fresh().await.map_err(session_failure)?;
        let resolved = self.resolve(&session, &draft.tracks).await?;
        let unmatched = draft.tracks.len() - resolved.len();

        checkpoint(cancel)?;
        enter(RunState::Assembling);
        let handle = self
            .assembler
            .create(&session, &draft.name, &draft.description)
            .await
            .map_err(session_failure)?;

        match self.assembler.attach(&session, &handle, &resolved).await {
            Ok(playlist) => Ok(Assembled {
                playlist,
                unmatched,
                degradations: Vec::new(),
            }),
            Err(e) => {
                error!(
                    playlist = %handle.id,
                    error = %e,
                    "Playlist created but attaching tracks failed"
                );
                Ok(Assembled {
                    playlist: PlaylistResult {
                        catalog_playlist_id: handle.id,
                        public_url: handle.public_url,
                        name: handle.name,
                        resolved_track_count: 0,
                    },
                    unmatched,
                    degradations: vec![Degradation::AssemblyPartial(e.to_string())],
                })
            }
        }
    }

    async fn resolve(
        &self,
        session: &Arc<SessionTokenManager>,
        tracks: &[DraftTrack],
    ) -> Result<Vec<ResolvedTrack>, PipelineError> {
        let stale = session.access_token().await;

        match self.resolver.resolve_all(session, tracks).await {
            Ok(resolved) => Ok(resolved),
            Err(ResolveError::Unauthorized) => {
                warn!("Catalog search rejected the credential, refreshing and restarting");
                session.refresh_after(&stale).await.map_err(session_failure)?;

                self.resolver
                    .resolve_all(session, tracks)
                    .await
                    .map_err(|_| {
                        PipelineError::AuthenticationExpired(
                            "catalog search rejected the refreshed credential".to_string(),
                        )
                    })
            }
        }
    }
}

fn enter(state: RunState) {
    debug!(state = ?state, "Entering state");
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

fn session_failure(err: SessionError) -> PipelineError {
    match err {
        SessionError::AuthenticationExpired(msg) => PipelineError::AuthenticationExpired(msg),
        SessionError::Catalog(e) => PipelineError::Assembly(e.to_string()),
    }
}
