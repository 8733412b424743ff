//! Concurrent delete/update consistency of the session registry.

mod common;

use common::PHONE;
use voice_pin_gateway::{RegistryError, SessionRegistry};

const URL: &str = "https://merchant.example.com/verify";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_finalize_has_one_winner() {
    for _ in 0..50 {
        let registry = SessionRegistry::new();
        let id = registry.create(PHONE, URL, "s").await.unwrap();

        let deleter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.delete(&id).await.is_some() })
        };
        let finalizer = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.finalize_verified(&id).await })
        };

        let deleted = deleter.await.unwrap();
        let finalized = finalizer.await.unwrap();

        assert!(deleted ^ finalized, "deleted: {deleted}, finalized: {finalized}");
        assert!(registry.get(&id).await.is_none());
        assert!(registry.find_by_phone(PHONE).await.is_none());
        assert!(registry.list_all().await.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_failed_attempts() {
    for _ in 0..50 {
        let registry = SessionRegistry::new();
        let id = registry.create(PHONE, URL, "s").await.unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.record_failed_attempt(&id).await })
            })
            .collect();
        let deleter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.delete(&id).await })
        };

        let removed = deleter.await.unwrap().expect("session deleted exactly once");

        let mut counted = Vec::new();
        for handle in attempts {
            match handle.await.unwrap() {
                Ok(n) => counted.push(n),
                Err(e) => assert_eq!(e, RegistryError::NotFound(id.to_string())),
            }
        }

        // Every attempt recorded before the delete is reflected in the removed
        // session; none lands after it.
        counted.sort_unstable();
        let expected: Vec<u32> = (1..=removed.attempts).collect();
        assert_eq!(counted, expected);

        assert!(registry.get(&id).await.is_none());
        assert!(registry.find_by_phone(PHONE).await.is_none());
        assert_eq!(registry.count().await, 0);
        assert!(registry.record_failed_attempt(&id).await.is_err());
    }
}
