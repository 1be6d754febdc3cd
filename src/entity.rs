//! The persisted read models.
//!
//! Two entities, both append/update-only and keyed by contract address:
//! [`Vault`] for the yield-bearing contract itself and [`Strategy`] for each
//! yield-generating sub-component a vault references. Entities are created by
//! their lifecycle handlers, mutated field-by-field by later events, and
//! never deleted.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Marker trait for records the [`EntityStore`](crate::store::EntityStore)
/// can persist.
///
/// Each entity carries a stable [`Self::KIND`] identifier so a single store
/// can partition records by type; the key within a partition is the entity's
/// address.
pub trait Entity {
    /// Stable identifier for this entity type. Lowercase, kebab-case.
    const KIND: &'static str;

    /// The address that keys this record.
    fn id(&self) -> Address;
}

/// The aggregate record for a deployed vault contract.
///
/// Created once when the factory emits a deployment event; every numeric
/// metric starts at zero and is only populated by later harvests, deposits,
/// and withdrawals. The underlying token metadata is fetched once at creation
/// and stays `None` if that read reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Address of the vault contract. Immutable once created.
    pub id: Address,
    /// Address of the underlying asset token.
    pub underlying: Address,
    /// Symbol of the underlying token, if the creation-time read succeeded.
    pub underlying_symbol: Option<String>,
    /// Decimal count of the underlying token, if the creation-time read
    /// succeeded.
    pub underlying_decimals: Option<u8>,
    /// Whether the vault has completed initialization.
    pub initialized: bool,
    /// Whether the underlying token is the chain's wrapped native asset.
    pub underlying_is_weth: bool,
    /// Performance fee taken from harvested profit.
    pub fee_percent: u128,
    /// Fraction of holdings the vault aims to keep as idle float.
    pub target_float_percent: u128,
    /// Length of the period after a harvest during which another harvest may
    /// occur without waiting the full delay.
    pub harvest_window: u64,
    /// Minimum seconds between the start of one harvest window and the next.
    pub harvest_delay: u64,
    /// Harvest delay that takes effect after the next harvest.
    pub next_harvest_delay: u64,
    /// Timestamp of the most recent harvest.
    pub last_harvest_timestamp: u64,
    /// Timestamp at which the current harvest window opened.
    pub last_harvest_window_start_timestamp: u64,
    /// Total supply of vault shares.
    pub total_supply: u128,
    /// Underlying tokens held across all strategies.
    pub total_strategy_holdings: u128,
    /// Profit still locked from the most recent harvest.
    pub locked_profit: u128,
    /// Maximum locked profit observed for the current harvest cycle.
    pub max_locked_profit: u128,
    /// Underlying tokens per vault share.
    pub exchange_rate: u128,
    /// Idle underlying tokens held directly by the vault.
    pub total_float: u128,
    /// Total underlying tokens the vault controls, float included.
    pub total_holdings: u128,
    /// Ordered set of strategy addresses the vault currently trusts.
    /// Duplicate-free at steady state.
    pub trusted_strategies: Vec<Address>,
    /// Ordered queue of strategies withdrawals are pulled from.
    pub withdrawal_queue: Vec<Address>,
}

impl Vault {
    /// A vault in its just-deployed state: uninitialized, every metric zero,
    /// no trusted strategies, token metadata not yet fetched.
    #[must_use]
    pub fn new(id: Address, underlying: Address) -> Self {
        Self {
            id,
            underlying,
            underlying_symbol: None,
            underlying_decimals: None,
            initialized: false,
            underlying_is_weth: false,
            fee_percent: 0,
            target_float_percent: 0,
            harvest_window: 0,
            harvest_delay: 0,
            next_harvest_delay: 0,
            last_harvest_timestamp: 0,
            last_harvest_window_start_timestamp: 0,
            total_supply: 0,
            total_strategy_holdings: 0,
            locked_profit: 0,
            max_locked_profit: 0,
            exchange_rate: 0,
            total_float: 0,
            total_holdings: 0,
            trusted_strategies: Vec::new(),
            withdrawal_queue: Vec::new(),
        }
    }
}

impl Entity for Vault {
    const KIND: &'static str = "vault";

    fn id(&self) -> Address {
        self.id
    }
}

/// Sentinel used when the strategy name read reverts at creation time.
pub const UNKNOWN_NAME: &str = "NAME";

/// Sentinel used when the strategy symbol read reverts at creation time.
pub const UNKNOWN_SYMBOL: &str = "SYMBOL";

/// The record for a strategy contract referenced by a vault.
///
/// Created lazily on first reference (trust, deposit, withdrawal, or
/// seizure). `trusted` is kept equivalent to membership in the owning
/// vault's `trusted_strategies` by the trust handlers; `balance` mirrors the
/// on-chain value reported by the vault's strategy-data lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Address of the strategy contract.
    pub id: Address,
    /// The vault that first referenced this strategy.
    pub vault: Address,
    /// Human-readable name, or [`UNKNOWN_NAME`] if the read reverted.
    pub name: String,
    /// Token symbol, or [`UNKNOWN_SYMBOL`] if the read reverted.
    pub symbol: String,
    /// Whether the owning vault currently trusts this strategy.
    pub trusted: bool,
    /// Underlying tokens the strategy holds, as last read from the vault.
    pub balance: u128,
}

impl Strategy {
    /// A strategy in its just-created state: untrusted, zero balance,
    /// sentinel metadata.
    #[must_use]
    pub fn new(id: Address, vault: Address) -> Self {
        Self {
            id,
            vault,
            name: UNKNOWN_NAME.to_string(),
            symbol: UNKNOWN_SYMBOL.to_string(),
            trusted: false,
            balance: 0,
        }
    }
}

impl Entity for Strategy {
    const KIND: &'static str = "strategy";

    fn id(&self) -> Address {
        self.id
    }
}
