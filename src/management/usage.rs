use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{error::StoreError, types::AccountUsage};

/// Persisted usage counters and subscription flags, one record per account.
///
/// Every mutating call is a single atomic read-modify-write against the
/// underlying storage.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn get(&self, account_id: &str) -> Result<Option<AccountUsage>, StoreError>;

    /// Adds one to `playlist_count`. Fails with `AccountNotFound` when the
    /// record does not exist.
    async fn increment(&self, account_id: &str) -> Result<AccountUsage, StoreError>;

    /// Creates the record with a zero count if it does not exist yet.
    async fn upsert(&self, account_id: &str) -> Result<AccountUsage, StoreError>;

    async fn set_subscribed(
        &self,
        account_id: &str,
        subscribed: bool,
    ) -> Result<AccountUsage, StoreError>;

    async fn list(&self) -> Result<Vec<AccountUsage>, StoreError>;
}

type Accounts = BTreeMap<String, AccountUsage>;

fn new_account(account_id: &str) -> AccountUsage {
    AccountUsage {
        account_id: account_id.to_string(),
        playlist_count: 0,
        is_subscribed: false,
    }
}

/// JSON-file backed [`UsageStore`].
///
/// The whole file is held in memory behind one lock. A mutation is applied to
/// a copy, written to disk, and only then made visible, so a failed write
/// leaves both the file and memory unchanged.
pub struct AccountUsageManager {
    path: PathBuf,
    accounts: Mutex<Accounts>,
}

impl AccountUsageManager {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let accounts = match async_fs::read_to_string(&path).await {
            Ok(content) => {
                let records: Vec<AccountUsage> = serde_json::from_str(&content)?;
                records
                    .into_iter()
                    .map(|a| (a.account_id.clone(), a))
                    .collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Accounts::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            accounts: Mutex::new(accounts),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, accounts: &Accounts) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let records: Vec<&AccountUsage> = accounts.values().collect();
        let json = serde_json::to_string_pretty(&records)?;

        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn modify<F>(&self, account_id: &str, f: F) -> Result<AccountUsage, StoreError>
    where
        F: FnOnce(Option<AccountUsage>) -> Result<AccountUsage, StoreError> + Send,
    {
        let mut accounts = self.accounts.lock().await;
        let updated = f(accounts.get(account_id).cloned())?;

        let mut next = accounts.clone();
        next.insert(account_id.to_string(), updated.clone());
        self.persist(&next).await?;

        *accounts = next;
        Ok(updated)
    }
}

#[async_trait]
impl UsageStore for AccountUsageManager {
    async fn get(&self, account_id: &str) -> Result<Option<AccountUsage>, StoreError> {
        Ok(self.accounts.lock().await.get(account_id).cloned())
    }

    async fn increment(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        self.modify(account_id, |current| {
            let mut account =
                current.ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;
            account.playlist_count += 1;
            Ok(account)
        })
        .await
    }

    async fn upsert(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        if let Some(existing) = self.get(account_id).await? {
            return Ok(existing);
        }
        self.modify(account_id, |current| {
            Ok(current.unwrap_or_else(|| new_account(account_id)))
        })
        .await
    }

    async fn set_subscribed(
        &self,
        account_id: &str,
        subscribed: bool,
    ) -> Result<AccountUsage, StoreError> {
        self.modify(account_id, |current| {
            let mut account =
                current.ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;
            account.is_subscribed = subscribed;
            Ok(account)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<AccountUsage>, StoreError> {
        Ok(self.accounts.lock().await.values().cloned().collect())
    }
}

/// In-memory [`UsageStore`], used by tests and for ephemeral runs.
#[derive(Default)]
pub struct MemoryUsageStore {
    accounts: Mutex<Accounts>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<AccountUsage>) -> Self {
        Self {
            accounts: Mutex::new(
                accounts
                    .into_iter()
                    .map(|a| (a.account_id.clone(), a))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn get(&self, account_id: &str) -> Result<Option<AccountUsage>, StoreError> {
        Ok(self.accounts.lock().await.get(account_id).cloned())
    }

    async fn increment(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;
        account.playlist_count += 1;
        Ok(account.clone())
    }

    async fn upsert(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        let mut accounts = self.accounts.lock().await;
        Ok(accounts
            .entry(account_id.to_string())
            .or_insert_with(|| new_account(account_id))
            .clone())
    }

    async fn set_subscribed(
        &self,
        account_id: &str,
        subscribed: bool,
    ) -> Result<AccountUsage, StoreError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;
        account.is_subscribed = subscribed;
        Ok(account.clone())
    }

    async fn list(&self) -> Result<Vec<AccountUsage>, StoreError> {
        Ok(self.accounts.lock().await.values().cloned().collect())
    }
}
