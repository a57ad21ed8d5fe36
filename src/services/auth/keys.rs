//! Signing-key material for token verification.
//!
//! The decoding key is read by every request-handling task and written only
//! when key material is refreshed, so it is held behind `ArcSwap`: readers
//! take a cheap immutable snapshot, refresh installs a new snapshot, and
//! in-flight readers never observe a partial update.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid signing key material")]
    BadKey,

    #[error("key-set fetch timed out")]
    Timeout,

    #[error("key-set fetch failed: {0}")]
    Fetch(String),
}

/// Immutable key snapshot. Key material is not printable via Debug.
pub struct KeySnapshot {
    decoding_key: DecodingKey,
}

impl KeySnapshot {
    /// `pem` must be an Ed25519 public key in PKCS#8 PEM format.
    pub fn from_ed_pem(pem: &str) -> Result<Self, KeyError> {
        let decoding_key = DecodingKey::from_ed_pem(pem.as_bytes()).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse verification key PEM (expected Ed25519 PKCS#8 PEM)");
            KeyError::BadKey
        })?;
        Ok(Self { decoding_key })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for KeySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySnapshot").finish_non_exhaustive()
    }
}

/// Source of refreshed key material, typically a remote key-set (JWKS)
/// client. Retry policy belongs to the implementor, not to [`KeyStore`].
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch_key_pem(&self) -> Result<String, KeyError>;
}

/// Process-wide holder of the current verification key.
#[derive(Debug)]
pub struct KeyStore {
    current: ArcSwap<KeySnapshot>,
    refresh_timeout: Duration,
}

impl KeyStore {
    pub fn from_ed_pem(pem: &str, refresh_timeout: Duration) -> Result<Self, KeyError> {
        let snapshot = KeySnapshot::from_ed_pem(pem)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            refresh_timeout,
        })
    }

    /// Snapshot of the current key. Safe to hold across await points; a
    /// concurrent refresh does not affect it.
    pub fn current(&self) -> Arc<KeySnapshot> {
        self.current.load_full()
    }

    /// Fetch fresh key material and swap it in. Bounded by the configured
    /// timeout; a single attempt, no retry at this layer. On any failure the
    /// previous snapshot stays installed.
    pub async fn refresh_from(&self, source: &dyn KeySetSource) -> Result<(), KeyError> {
        let pem = tokio::time::timeout(self.refresh_timeout, source.fetch_key_pem())
            .await
            .map_err(|_| KeyError::Timeout)??;

        let snapshot = KeySnapshot::from_ed_pem(&pem)?;
        self.current.store(Arc::new(snapshot));
        tracing::info!("verification key refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PUBLIC_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEAhnJtqvzRVCB1FsVoibhCkafRR4AqChWLxMhTqUCJaqg=\n-----END PUBLIC KEY-----\n";

    struct StaticSource(String);

    #[async_trait]
    impl KeySetSource for StaticSource {
        async fn fetch_key_pem(&self) -> Result<String, KeyError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KeySetSource for FailingSource {
        async fn fetch_key_pem(&self) -> Result<String, KeyError> {
            Err(KeyError::Fetch("boom".to_string()))
        }
    }

    struct HangingSource;

    #[async_trait]
    impl KeySetSource for HangingSource {
        async fn fetch_key_pem(&self) -> Result<String, KeyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("test timeout should fire first")
        }
    }

    #[test]
    fn rejects_garbage_pem() {
        let err = KeyStore::from_ed_pem("not a pem", Duration::from_secs(1));
        assert!(matches!(err, Err(KeyError::BadKey)));
    }

    #[tokio::test]
    async fn refresh_swaps_snapshot() {
        let store = KeyStore::from_ed_pem(TEST_PUBLIC_PEM, Duration::from_secs(1)).unwrap();
        let before = store.current();
        store
            .refresh_from(&StaticSource(TEST_PUBLIC_PEM.to_string()))
            .await
            .unwrap();
        let after = store.current();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let store = KeyStore::from_ed_pem(TEST_PUBLIC_PEM, Duration::from_secs(1)).unwrap();
        let before = store.current();
        let err = store.refresh_from(&FailingSource).await;
        assert!(matches!(err, Err(KeyError::Fetch(_))));
        assert!(Arc::ptr_eq(&before, &store.current()));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_times_out_without_retry() {
        let store = KeyStore::from_ed_pem(TEST_PUBLIC_PEM, Duration::from_millis(50)).unwrap();
        let err = store.refresh_from(&HangingSource).await;
        assert!(matches!(err, Err(KeyError::Timeout)));
    }
}
