use tabled::Table;

use crate::{
    config, error, info,
    management::{AccountUsageManager, UsageStore},
    success,
    types::FREE_QUOTA,
    utils, warning,
};

async fn open_store() -> AccountUsageManager {
    let path = config::usage_store_path();
    match AccountUsageManager::load(&path).await {
        Ok(store) => store,
        Err(e) => error!(
            "Cannot load account usage from {}. Err: {}",
            path.display(),
            e
        ),
    }
}

pub async fn list_accounts() {
    let store = open_store().await;
    let accounts = match store.list().await {
        Ok(a) => a,
        Err(e) => error!("Cannot list accounts. Err: {}", e),
    };

    if accounts.is_empty() {
        warning!("No accounts yet. Add one with `promptlist accounts add <id>`");
        return;
    }

    let table = Table::new(utils::account_table_rows(accounts));
    println!("{}", table);
    info!("Free quota: {} playlists per account", FREE_QUOTA);
}

pub async fn add_account(account_id: &str) {
    let store = open_store().await;
    match store.upsert(account_id).await {
        Ok(usage) => success!(
            "Account '{}' ready ({} playlists created)",
            usage.account_id,
            usage.playlist_count
        ),
        Err(e) => error!("Cannot add account. Err: {}", e),
    }
}

pub async fn subscribe_account(account_id: &str, subscribed: bool) {
    let store = open_store().await;
    match store.set_subscribed(account_id, subscribed).await {
        Ok(usage) if usage.is_subscribed => {
            success!("Account '{}' is now subscribed", usage.account_id)
        }
        Ok(usage) => success!("Account '{}' is no longer subscribed", usage.account_id),
        Err(e) => error!("Cannot update subscription. Err: {}", e),
    }
}
