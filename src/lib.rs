//! Event-sourced entity projector for vault and strategy contract events.
//!
//! This crate translates decoded on-chain events (vault deployment, deposits,
//! withdrawals, harvests, strategy trust changes) into reads and writes
//! against two persisted entities, [`Vault`](entity::Vault) and
//! [`Strategy`](entity::Strategy):
//!
//! - [`address`] - Contract address identifiers (`Address`)
//! - [`entity`] - The persisted read models (`Vault`, `Strategy`, `Entity`)
//! - [`event`] - Inbound event surface (`VaultEvent`, `EventContext`)
//! - [`reader`] - Failable read-backs to the chain (`ChainReader`, `CallResult`)
//! - [`store`] - Entity persistence abstraction (`EntityStore`)
//! - [`projector`] - The projection logic itself (`Projector`)
//!
//! The host runtime owns event decoding, delivery ordering, and the durable
//! persistence backend; everything here is the mapping in between. Delivery
//! is strictly sequential, so no handler ever observes a concurrent mutation.
//!
//! # Example
//!
//! ```ignore
//! use vault_indexer::{projector::Projector, store::inmemory};
//!
//! let store = inmemory::Store::new();
//! let projector = Projector::new(store, reader);
//! projector.apply(&ctx, &event).await?;
//! ```

pub mod address;
pub mod entity;
pub mod event;
pub mod projector;
pub mod reader;
pub mod store;

pub use address::Address;
pub use entity::{Entity, Strategy, Vault};
pub use event::{EventContext, VaultEvent};
pub use projector::{ProjectError, Projector, SubscriptionSink};
pub use reader::{CallResult, ChainReader};
pub use store::{CreateError, EntityStore};
