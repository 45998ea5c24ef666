//! In-process collaborators for tests and local experiments.
//!
//! [`FakeCatalog`] and [`FakeLanguageModel`] implement the same traits as the
//! HTTP clients, keep call counters, and can be scripted to fail.

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    catalog::MusicCatalog,
    error::{CatalogError, LlmError, StoreError},
    llm::LanguageModel,
    management::{MemoryUsageStore, UsageStore},
    types::{
        AccountUsage, CompletionRequest, Credential, DraftPlaylist, DraftTrack, Identity,
        PlaylistHandle, ResolvedTrack,
    },
    utils,
};

pub const VALID_TOKEN: &str = "valid-token";
pub const REFRESHED_TOKEN: &str = "refreshed-token";

/// A playlist as the fake music service stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePlaylist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub public: bool,
    pub tracks: Vec<String>,
}

#[derive(Debug, Clone)]
enum RefreshBehavior {
    Succeed { token: String, accepted: bool },
    Fail,
}

pub struct FakeCatalog {
    tracks: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    failing_queries: HashSet<String>,
    accepted_tokens: Mutex<HashSet<String>>,
    refresh: RefreshBehavior,
    fail_create: bool,
    fail_attach: bool,
    playlists: Mutex<Vec<FakePlaylist>>,
    pub search_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub attach_calls: AtomicUsize,
    pub identity_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCatalog {
    /// Accepts [`VALID_TOKEN`]; a refresh yields an accepted [`REFRESHED_TOKEN`].
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            delays: HashMap::new(),
            failing_queries: HashSet::new(),
            accepted_tokens: Mutex::new(HashSet::from([VALID_TOKEN.to_string()])),
            refresh: RefreshBehavior::Succeed {
                token: REFRESHED_TOKEN.to_string(),
                accepted: true,
            },
            fail_create: false,
            fail_attach: false,
            playlists: Mutex::new(Vec::new()),
            search_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            attach_calls: AtomicUsize::new(0),
            identity_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    fn key(name: &str, artist: &str) -> String {
        utils::build_track_query(&DraftTrack {
            name: name.to_string(),
            artist: artist.to_string(),
        })
    }

    pub fn with_track(mut self, name: &str, artist: &str, id: &str) -> Self {
        self.tracks.insert(Self::key(name, artist), id.to_string());
        self
    }

    pub fn with_search_delay(mut self, name: &str, artist: &str, delay: Duration) -> Self {
        self.delays.insert(Self::key(name, artist), delay);
        self
    }

    /// Searches for this track fail with a server error.
    pub fn failing_search(mut self, name: &str, artist: &str) -> Self {
        self.failing_queries.insert(Self::key(name, artist));
        self
    }

    pub fn rejecting_all_tokens(mut self) -> Self {
        if let Ok(tokens) = self.accepted_tokens.get_mut() {
            tokens.clear();
        }
        self
    }

    /// A refresh hands out `token`; `accepted` decides whether the service
    /// then honors it.
    pub fn refreshing_to(mut self, token: &str, accepted: bool) -> Self {
        self.refresh = RefreshBehavior::Succeed {
            token: token.to_string(),
            accepted,
        };
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.refresh = RefreshBehavior::Fail;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_attach(mut self) -> Self {
        self.fail_attach = true;
        self
    }

    pub fn playlists(&self) -> Vec<FakePlaylist> {
        self.playlists
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Total catalog requests of any kind.
    pub fn total_calls(&self) -> usize {
        Self::count(&self.search_calls)
            + Self::count(&self.create_calls)
            + Self::count(&self.attach_calls)
            + Self::count(&self.identity_calls)
            + Self::count(&self.refresh_calls)
    }

    fn authorize(&self, token: &str) -> Result<(), CatalogError> {
        let accepted = self
            .accepted_tokens
            .lock()
            .map(|t| t.contains(token))
            .unwrap_or(false);
        if accepted {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized(401))
        }
    }
}

#[async_trait]
impl MusicCatalog for FakeCatalog {
    async fn search(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<String>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.authorize(access_token)?;

        if self.failing_queries.contains(query) {
            return Err(CatalogError::Api {
                status: 500,
                message: "search backend unavailable".to_string(),
            });
        }
        Ok(self.tracks.get(query).cloned())
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle, CatalogError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(access_token)?;
        if self.fail_create {
            return Err(CatalogError::Api {
                status: 500,
                message: "playlist service unavailable".to_string(),
            });
        }

        let mut playlists = self
            .playlists
            .lock()
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        let id = format!("playlist-{}", playlists.len() + 1);
        playlists.push(FakePlaylist {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            public,
            tracks: Vec::new(),
        });

        Ok(PlaylistHandle {
            public_url: utils::playlist_url(&id),
            id,
            name: name.to_string(),
        })
    }

    async fn attach_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        tracks: &[ResolvedTrack],
    ) -> Result<(), CatalogError> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(access_token)?;
        if self.fail_attach {
            return Err(CatalogError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }

        let mut playlists = self
            .playlists
            .lock()
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        let playlist = playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| CatalogError::Api {
                status: 404,
                message: "playlist not found".to_string(),
            })?;
        playlist
            .tracks
            .extend(tracks.iter().map(|t| t.catalog_id.clone()));
        Ok(())
    }

    async fn get_identity(&self, access_token: &str) -> Result<Identity, CatalogError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(access_token)?;
        Ok(Identity {
            id: "fake-user".to_string(),
            display_name: Some("Fake User".to_string()),
        })
    }

    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential, CatalogError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match &self.refresh {
            RefreshBehavior::Fail => Err(CatalogError::Unauthorized(400)),
            RefreshBehavior::Succeed { token, accepted } => {
                if *accepted {
                    if let Ok(mut tokens) = self.accepted_tokens.lock() {
                        tokens.insert(token.clone());
                    }
                }
                Ok(Credential::new(token.clone(), Some(refresh_token.to_string())))
            }
        }
    }
}

pub struct FakeLanguageModel {
    reply: Result<String, LlmError>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl FakeLanguageModel {
    /// Answers every request with `raw`.
    pub fn replying(raw: impl Into<String>) -> Self {
        Self {
            reply: Ok(raw.into()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_draft(draft: &DraftPlaylist) -> Self {
        Self::replying(serde_json::to_string(draft).unwrap_or_default())
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            reply: Err(error),
            delay: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.user_prompt);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// [`MemoryUsageStore`] whose increments can be made to fail.
pub struct FlakyUsageStore {
    inner: MemoryUsageStore,
    fail_increments: AtomicBool,
}

impl FlakyUsageStore {
    pub fn new(accounts: Vec<AccountUsage>) -> Self {
        Self {
            inner: MemoryUsageStore::with_accounts(accounts),
            fail_increments: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_increments.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UsageStore for FlakyUsageStore {
    async fn get(&self, account_id: &str) -> Result<Option<AccountUsage>, StoreError> {
        self.inner.get(account_id).await
    }

    async fn increment(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::other("disk full")));
        }
        self.inner.increment(account_id).await
    }

    async fn upsert(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        self.inner.upsert(account_id).await
    }

    async fn set_subscribed(
        &self,
        account_id: &str,
        subscribed: bool,
    ) -> Result<AccountUsage, StoreError> {
        self.inner.set_subscribed(account_id, subscribed).await
    }

    async fn list(&self) -> Result<Vec<AccountUsage>, StoreError> {
        self.inner.list().await
    }
}
