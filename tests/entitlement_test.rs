use std::sync::Arc;

use promptlist::error::StoreError;
use promptlist::management::{MemoryUsageStore, UsageStore};
use promptlist::pipeline::{EntitlementGate, GateDecision, evaluate};
use promptlist::types::{AccountUsage, FREE_QUOTA};

fn usage(count: u64, subscribed: bool) -> AccountUsage {
    AccountUsage {
        account_id: "acct-1".to_string(),
        playlist_count: count,
        is_subscribed: subscribed,
    }
}

fn gate_with(count: u64, subscribed: bool, strict: bool) -> EntitlementGate {
    let store = MemoryUsageStore::with_accounts(vec![usage(count, subscribed)]);
    EntitlementGate::new(Arc::new(store), strict)
}

mod evaluate_decision {
    use super::*;

    #[test]
    fn test_below_quota_allows() {
        assert_eq!(evaluate(&usage(2, false), 0, FREE_QUOTA), GateDecision::Allow);
        assert_eq!(evaluate(&usage(0, false), 0, FREE_QUOTA), GateDecision::Allow);
    }

    #[test]
    fn test_at_quota_denies() {
        let decision = evaluate(&usage(3, false), 0, FREE_QUOTA);
        match decision {
            GateDecision::Deny { reason } => assert!(reason.contains("3 free playlists")),
            GateDecision::Allow => panic!("Expected a denial at the quota"),
        }
    }

    #[test]
    fn test_subscription_overrides_count() {
        assert!(evaluate(&usage(3, true), 0, FREE_QUOTA).is_allowed());
        assert!(evaluate(&usage(250, true), 7, FREE_QUOTA).is_allowed());
    }

    #[test]
    fn test_in_flight_runs_count_against_quota() {
        assert!(evaluate(&usage(1, false), 1, FREE_QUOTA).is_allowed());
        assert!(!evaluate(&usage(1, false), 2, FREE_QUOTA).is_allowed());
    }
}

mod gate {
    use super::*;

    #[tokio::test]
    async fn test_unknown_account() {
        let gate = EntitlementGate::new(Arc::new(MemoryUsageStore::new()), true);
        let result = gate.check("ghost").await;
        assert!(matches!(result, Err(StoreError::AccountNotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_check_does_not_mutate_counts() {
        let gate = gate_with(2, false, false);
        assert!(gate.check("acct-1").await.unwrap().is_allowed());
        assert!(gate.check("acct-1").await.unwrap().is_allowed());

        let stored = gate.store().get("acct-1").await.unwrap().unwrap();
        assert_eq!(stored.playlist_count, 2);
    }

    #[tokio::test]
    async fn test_n_recordings_add_exactly_n() {
        let gate = gate_with(0, true, true);
        for _ in 0..5 {
            assert!(gate.check("acct-1").await.unwrap().is_allowed());
            gate.record_usage("acct-1").await.unwrap();
        }

        let stored = gate.store().get("acct-1").await.unwrap().unwrap();
        assert_eq!(stored.playlist_count, 5);
    }

    #[tokio::test]
    async fn test_strict_mode_holds_slot_until_recorded() {
        let gate = gate_with(2, false, true);

        assert!(gate.check("acct-1").await.unwrap().is_allowed());
        // The first run has not recorded yet but still holds the last slot
        assert!(!gate.check("acct-1").await.unwrap().is_allowed());

        gate.record_usage("acct-1").await.unwrap();
        assert!(!gate.check("acct-1").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_strict_mode_release_frees_slot() {
        let gate = gate_with(2, false, true);

        assert!(gate.check("acct-1").await.unwrap().is_allowed());
        gate.release("acct-1").await;
        assert!(gate.check("acct-1").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_lenient_mode_admits_racing_runs() {
        let gate = gate_with(2, false, false);
        assert!(gate.check("acct-1").await.unwrap().is_allowed());
        assert!(gate.check("acct-1").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_strict_mode_concurrent_admissions() {
        let gate = Arc::new(gate_with(1, false, true));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.check("acct-1").await.unwrap().is_allowed()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, FREE_QUOTA - 1);
    }
}
