use promptlist::error::StoreError;
use promptlist::management::{AccountUsageManager, MemoryUsageStore, UsageStore};
use promptlist::types::AccountUsage;
use tempfile::TempDir;

mod account_usage_manager {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = AccountUsageManager::load(dir.path().join("accounts.json"))
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("nobody").await.unwrap().is_none());
        // Nothing written until the first mutation
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_upsert_increment_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("accounts.json");

        let store = AccountUsageManager::load(&path).await.unwrap();
        let created = store.upsert("acct-1").await.unwrap();
        assert_eq!(created.playlist_count, 0);
        assert!(!created.is_subscribed);

        store.increment("acct-1").await.unwrap();
        let usage = store.increment("acct-1").await.unwrap();
        assert_eq!(usage.playlist_count, 2);

        store.set_subscribed("acct-1", true).await.unwrap();

        let reloaded = AccountUsageManager::load(&path).await.unwrap();
        let usage = reloaded.get("acct-1").await.unwrap().unwrap();
        assert_eq!(
            usage,
            AccountUsage {
                account_id: "acct-1".to_string(),
                playlist_count: 2,
                is_subscribed: true,
            }
        );
    }

    #[tokio::test]
    async fn test_upsert_keeps_existing_record() {
        let dir = TempDir::new().unwrap();
        let store = AccountUsageManager::load(dir.path().join("accounts.json"))
            .await
            .unwrap();

        store.upsert("acct-1").await.unwrap();
        store.increment("acct-1").await.unwrap();
        let again = store.upsert("acct-1").await.unwrap();
        assert_eq!(again.playlist_count, 1);
    }

    #[tokio::test]
    async fn test_increment_unknown_account() {
        let dir = TempDir::new().unwrap();
        let store = AccountUsageManager::load(dir.path().join("accounts.json"))
            .await
            .unwrap();

        let result = store.increment("ghost").await;
        assert!(matches!(result, Err(StoreError::AccountNotFound(id)) if id == "ghost"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = AccountUsageManager::load(&path).await;
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(
            AccountUsageManager::load(dir.path().join("accounts.json"))
                .await
                .unwrap(),
        );
        store.upsert("acct-1").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment("acct-1").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let usage = store.get("acct-1").await.unwrap().unwrap();
        assert_eq!(usage.playlist_count, 10);
    }
}

mod memory_store {
    use super::*;

    #[tokio::test]
    async fn test_with_accounts() {
        let store = MemoryUsageStore::with_accounts(vec![AccountUsage {
            account_id: "acct-1".to_string(),
            playlist_count: 2,
            is_subscribed: false,
        }]);

        let usage = store.increment("acct-1").await.unwrap();
        assert_eq!(usage.playlist_count, 3);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_subscribed_unknown_account() {
        let store = MemoryUsageStore::new();
        let result = store.set_subscribed("ghost", true).await;
        assert!(matches!(result, Err(StoreError::AccountNotFound(_))));
    }
}
