//! Entity persistence abstraction.
//!
//! The projector never talks to a concrete database; it is handed an
//! [`EntityStore`] supporting load-by-id, create-once, and upsert. The host
//! runtime supplies the durable implementation; [`inmemory`] provides the
//! reference implementation used throughout the tests.

use std::future::Future;

use thiserror::Error;

use crate::{address::Address, entity::Entity};

pub mod inmemory;

/// Error from create operations, which enforce first-seen uniqueness.
#[derive(Debug, Error)]
pub enum CreateError<StoreError>
where
    StoreError: std::error::Error + 'static,
{
    /// A record with this kind and id already exists. Creation events are
    /// delivered exactly once, so a duplicate signals an upstream replay and
    /// is fatal.
    #[error("{kind} `{id}` already exists")]
    AlreadyExists {
        /// Entity kind of the conflicting record.
        kind: &'static str,
        /// Address of the conflicting record.
        id: Address,
    },
    /// Underlying store error.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

/// Abstraction over the entity persistence layer.
///
/// Records are partitioned by [`Entity::KIND`] and keyed by address within a
/// partition. Implementations take `&self` and provide their own interior
/// mutability; event delivery is strictly sequential, so no concurrent
/// mutation is ever observed through this trait.
pub trait EntityStore: Send + Sync {
    /// Store-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a record by its address.
    ///
    /// Returns `None` when no record of this kind exists under `id`.
    ///
    /// # Errors
    ///
    /// Returns a store-specific error when the lookup itself fails.
    fn load<E>(
        &self,
        id: Address,
    ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send
    where
        E: Entity + serde::de::DeserializeOwned + Send;

    /// Persist a brand-new record, failing if one already exists.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError::AlreadyExists`] when a record of this kind is
    /// already stored under the entity's id, or [`CreateError::Store`] when
    /// persistence fails.
    fn create<E>(
        &self,
        entity: &E,
    ) -> impl Future<Output = Result<(), CreateError<Self::Error>>> + Send
    where
        E: Entity + serde::Serialize + Sync;

    /// Persist a record, inserting or overwriting as needed.
    ///
    /// # Errors
    ///
    /// Returns a store-specific error when persistence fails.
    fn save<E>(
        &self,
        entity: &E,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        E: Entity + serde::Serialize + Sync;
}
