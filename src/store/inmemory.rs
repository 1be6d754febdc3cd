//! In-memory entity store implementation for testing.
//!
//! This module provides [`Store`], a thread-safe in-memory implementation of
//! [`EntityStore`](super::EntityStore) suitable for unit tests and examples.
//! Records are held as `serde_json::Value`, so anything the durable backend
//! could persist round-trips here too.
//!
//! # Example
//!
//! ```
//! use vault_indexer::store::inmemory;
//!
//! let store = inmemory::Store::new();
//! ```

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, RwLock},
};

use crate::{
    address::Address,
    entity::Entity,
    store::{CreateError, EntityStore},
};

/// Key for one record: entity kind plus address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RecordKey {
    kind: &'static str,
    id: Address,
}

/// In-memory entity store backed by a hash map.
///
/// Clones share the same underlying map, mirroring how handles to a real
/// database connection behave. The store additionally counts `save` calls
/// per record so tests can assert that redundant persistence was skipped.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<RecordKey, serde_json::Value>,
    save_counts: HashMap<RecordKey, u64>,
}

/// Error type for the in-memory store.
#[derive(Debug, thiserror::Error)]
pub enum InMemoryError {
    /// Serializing an entity to its stored representation failed.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Deserializing a stored record back into an entity failed.
    #[error("deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `save` has been called for the given record.
    ///
    /// Used by tests to observe that unchanged values were not re-persisted.
    #[must_use]
    pub fn save_count<E: Entity>(&self, id: Address) -> u64 {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        inner
            .save_counts
            .get(&RecordKey { kind: E::KIND, id })
            .copied()
            .unwrap_or(0)
    }

    /// Total number of records currently stored, across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        inner.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityStore for Store {
    type Error = InMemoryError;

    #[tracing::instrument(skip(self), fields(kind = E::KIND))]
    fn load<E>(
        &self,
        id: Address,
    ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send
    where
        E: Entity + serde::de::DeserializeOwned + Send,
    {
        let result = {
            let inner = self.inner.read().expect("in-memory store lock poisoned");
            inner
                .records
                .get(&RecordKey { kind: E::KIND, id })
                .cloned()
                .map(|value| {
                    serde_json::from_value(value).map_err(InMemoryError::Deserialization)
                })
                .transpose()
        };
        tracing::trace!(found = matches!(result, Ok(Some(_))), "loaded record");
        std::future::ready(result)
    }

    #[tracing::instrument(skip(self, entity), fields(kind = E::KIND, id = %entity.id()))]
    fn create<E>(
        &self,
        entity: &E,
    ) -> impl Future<Output = Result<(), CreateError<Self::Error>>> + Send
    where
        E: Entity + serde::Serialize + Sync,
    {
        let result = (|| {
            let key = RecordKey {
                kind: E::KIND,
                id: entity.id(),
            };
            let value = serde_json::to_value(entity)
                .map_err(|e| CreateError::Store(InMemoryError::Serialization(e)))?;

            let mut inner = self.inner.write().expect("in-memory store lock poisoned");
            if inner.records.contains_key(&key) {
                return Err(CreateError::AlreadyExists {
                    kind: E::KIND,
                    id: entity.id(),
                });
            }
            inner.records.insert(key, value);
            drop(inner);
            tracing::debug!("record created");
            Ok(())
        })();

        std::future::ready(result)
    }

    #[tracing::instrument(skip(self, entity), fields(kind = E::KIND, id = %entity.id()))]
    fn save<E>(
        &self,
        entity: &E,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        E: Entity + serde::Serialize + Sync,
    {
        let result = (|| {
            let key = RecordKey {
                kind: E::KIND,
                id: entity.id(),
            };
            let value = serde_json::to_value(entity).map_err(InMemoryError::Serialization)?;

            let mut inner = self.inner.write().expect("in-memory store lock poisoned");
            *inner.save_counts.entry(key.clone()).or_insert(0) += 1;
            inner.records.insert(key, value);
            drop(inner);
            tracing::trace!("record saved");
            Ok(())
        })();

        std::future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Strategy, Vault};

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::new(bytes)
    }

    #[test]
    fn new_store_is_empty() {
        let store = Store::new();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn load_returns_none_for_missing_record() {
        let store = Store::new();
        let vault: Option<Vault> = store.load(addr(1)).await.unwrap();
        assert!(vault.is_none());
    }

    #[tokio::test]
    async fn create_then_load_roundtrips() {
        let store = Store::new();
        let vault = Vault::new(addr(1), addr(2));

        store.create(&vault).await.unwrap();
        let loaded: Vault = store.load(addr(1)).await.unwrap().unwrap();
        assert_eq!(loaded, vault);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let store = Store::new();
        let vault = Vault::new(addr(1), addr(2));

        store.create(&vault).await.unwrap();
        let result = store.create(&vault).await;
        assert!(matches!(
            result,
            Err(CreateError::AlreadyExists { kind: "vault", .. })
        ));
    }

    #[tokio::test]
    async fn kinds_do_not_collide_on_the_same_address() {
        let store = Store::new();
        store.create(&Vault::new(addr(1), addr(2))).await.unwrap();
        store
            .create(&Strategy::new(addr(1), addr(9)))
            .await
            .unwrap();

        let vault: Option<Vault> = store.load(addr(1)).await.unwrap();
        let strategy: Option<Strategy> = store.load(addr(1)).await.unwrap();
        assert!(vault.is_some());
        assert!(strategy.is_some());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn save_overwrites_existing_record() {
        let store = Store::new();
        let mut vault = Vault::new(addr(1), addr(2));
        store.create(&vault).await.unwrap();

        vault.initialized = true;
        store.save(&vault).await.unwrap();

        let loaded: Vault = store.load(addr(1)).await.unwrap().unwrap();
        assert!(loaded.initialized);
    }

    #[tokio::test]
    async fn save_count_tracks_calls_per_record() {
        let store = Store::new();
        let vault = Vault::new(addr(1), addr(2));
        assert_eq!(store.save_count::<Vault>(addr(1)), 0);

        store.save(&vault).await.unwrap();
        store.save(&vault).await.unwrap();
        assert_eq!(store.save_count::<Vault>(addr(1)), 2);
        assert_eq!(store.save_count::<Strategy>(addr(1)), 0);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = Store::new();
        let handle = store.clone();
        handle.create(&Vault::new(addr(1), addr(2))).await.unwrap();

        let vault: Option<Vault> = store.load(addr(1)).await.unwrap();
        assert!(vault.is_some());
    }
}
