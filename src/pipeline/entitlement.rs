use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    management::UsageStore,
    types::{AccountUsage, FREE_QUOTA},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { reason: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Decides a single usage record against `quota`, counting `in_flight` runs
/// that were admitted but have not recorded their usage yet.
pub fn evaluate(usage: &AccountUsage, in_flight: u64, quota: u64) -> GateDecision {
    if usage.is_subscribed || usage.playlist_count + in_flight < quota {
        GateDecision::Allow
    } else {
        GateDecision::Deny {
            reason: format!(
                "You have used all {} free playlists. Subscribe to keep creating playlists.",
                quota
            ),
        }
    }
}

/// Free quota / subscription check around a pipeline run.
///
/// In strict mode every admitted run holds a slot until it either records
/// its usage or is released, and admission is decided under the same lock
/// that guards the slots. Concurrent runs for one account at the quota
/// boundary are therefore serialized. Without strict mode `check` is a plain
/// read and two runs racing at the boundary may both be admitted.
pub struct EntitlementGate {
    store: Arc<dyn UsageStore>,
    quota: u64,
    strict: bool,
    in_flight: Mutex<HashMap<String, u64>>,
}

impl EntitlementGate {
    pub fn new(store: Arc<dyn UsageStore>, strict: bool) -> Self {
        Self {
            store,
            quota: FREE_QUOTA,
            strict,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn UsageStore> {
        &self.store
    }

    pub async fn check(&self, account_id: &str) -> Result<GateDecision, StoreError> {
        if !self.strict {
            let usage = self.load(account_id).await?;
            return Ok(evaluate(&usage, 0, self.quota));
        }

        let mut in_flight = self.in_flight.lock().await;
        let usage = self.load(account_id).await?;
        let pending = in_flight.get(account_id).copied().unwrap_or(0);
        let decision = evaluate(&usage, pending, self.quota);

        if decision.is_allowed() {
            *in_flight.entry(account_id.to_string()).or_insert(0) += 1;
        }

        debug!(
            count = usage.playlist_count,
            subscribed = usage.is_subscribed,
            pending,
            allowed = decision.is_allowed(),
            "Entitlement checked"
        );
        Ok(decision)
    }

    /// Adds one playlist to the account's persisted count.
    ///
    /// There is no deduplication: each call counts. In strict mode the run's
    /// admission slot is freed in the same critical section as the increment.
    pub async fn record_usage(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        if !self.strict {
            return self.store.increment(account_id).await;
        }

        let mut in_flight = self.in_flight.lock().await;
        let result = self.store.increment(account_id).await;
        Self::free_slot(&mut in_flight, account_id);
        result
    }

    /// Frees the admission slot of a run that ended before recording usage.
    pub async fn release(&self, account_id: &str) {
        if self.strict {
            let mut in_flight = self.in_flight.lock().await;
            Self::free_slot(&mut in_flight, account_id);
        }
    }

    fn free_slot(in_flight: &mut HashMap<String, u64>, account_id: &str) {
        match in_flight.get_mut(account_id) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                in_flight.remove(account_id);
            }
            None => warn!(account = %account_id, "Released an admission slot that was not held"),
        }
    }

    async fn load(&self, account_id: &str) -> Result<AccountUsage, StoreError> {
        self.store
            .get(account_id)
            .await?
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))
    }
}
