//! Inbound event surface.
//!
//! The host runtime decodes raw logs into [`VaultEvent`] values and delivers
//! them one at a time, each wrapped in an [`EventContext`] naming the
//! emitting contract and its block context. This module owns only the typed
//! shape of that surface; decoding itself is the host's concern.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Delivery context attached to every event.
///
/// `source` is the contract that emitted the event: the factory for
/// deployment events, the vault itself for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Address of the emitting contract.
    pub source: Address,
    /// Block the event was included in.
    pub block_number: u64,
    /// Timestamp of that block, in seconds.
    pub timestamp: u64,
}

/// A decoded vault or factory event.
///
/// Variant parameters mirror the on-chain event parameters; vault identity
/// and timestamps travel in the surrounding [`EventContext`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VaultEvent {
    /// A new vault was deployed by the factory.
    Deployed {
        /// Address of the freshly deployed vault.
        vault: Address,
        /// Address of the vault's underlying token.
        underlying: Address,
    },
    /// The vault completed initialization.
    Initialized,
    /// A harvest was executed over the listed strategies.
    Harvest {
        /// Strategies included in this harvest, in contract order.
        strategies: Vec<Address>,
    },
    /// The harvest window length changed.
    HarvestWindowUpdated {
        /// The new window length, in seconds.
        new_window: u64,
    },
    /// The harvest delay changed.
    HarvestDelayUpdated {
        /// The new delay, in seconds.
        new_delay: u64,
    },
    /// A future harvest delay was scheduled.
    HarvestDelayUpdateScheduled {
        /// The delay that takes effect after the next harvest.
        new_delay: u64,
    },
    /// The underlying-is-native-asset flag changed.
    UnderlyingIsWethUpdated {
        /// The new flag value.
        underlying_is_weth: bool,
    },
    /// The target float percentage changed.
    TargetFloatPercentUpdated {
        /// The new target float percentage.
        new_target_float_percent: u128,
    },
    /// The performance fee percentage changed.
    FeePercentUpdated {
        /// The new fee percentage.
        new_fee_percent: u128,
    },
    /// The vault began trusting a strategy.
    StrategyTrusted {
        /// The newly trusted strategy.
        strategy: Address,
    },
    /// The vault stopped trusting a strategy.
    StrategyDistrusted {
        /// The distrusted strategy.
        strategy: Address,
    },
    /// The vault deposited underlying tokens into a strategy.
    StrategyDeposit {
        /// The receiving strategy.
        strategy: Address,
    },
    /// The vault withdrew underlying tokens from a strategy.
    StrategyWithdrawal {
        /// The strategy withdrawn from.
        strategy: Address,
    },
    /// The vault seized a strategy's holdings.
    StrategySeized {
        /// The seized strategy.
        strategy: Address,
    },
    /// A user deposited underlying tokens into the vault.
    Deposit {
        /// The depositing user.
        user: Address,
        /// Amount of underlying tokens deposited.
        amount: u128,
    },
    /// A user withdrew underlying tokens from the vault.
    Withdraw {
        /// The withdrawing user.
        user: Address,
        /// Amount of underlying tokens withdrawn.
        amount: u128,
    },
}

impl VaultEvent {
    /// Stable kebab-case identifier for this event, used in logs and
    /// dispatch tracing.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Deployed { .. } => "vault-deployed",
            Self::Initialized => "initialized",
            Self::Harvest { .. } => "harvest",
            Self::HarvestWindowUpdated { .. } => "harvest-window-updated",
            Self::HarvestDelayUpdated { .. } => "harvest-delay-updated",
            Self::HarvestDelayUpdateScheduled { .. } => "harvest-delay-update-scheduled",
            Self::UnderlyingIsWethUpdated { .. } => "underlying-is-weth-updated",
            Self::TargetFloatPercentUpdated { .. } => "target-float-percent-updated",
            Self::FeePercentUpdated { .. } => "fee-percent-updated",
            Self::StrategyTrusted { .. } => "strategy-trusted",
            Self::StrategyDistrusted { .. } => "strategy-distrusted",
            Self::StrategyDeposit { .. } => "strategy-deposit",
            Self::StrategyWithdrawal { .. } => "strategy-withdrawal",
            Self::StrategySeized { .. } => "strategy-seized",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::new(bytes)
    }

    #[test]
    fn kind_matches_serde_tag() {
        let event = VaultEvent::StrategyTrusted { strategy: addr(1) };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], event.kind());
    }

    #[test]
    fn harvest_event_roundtrips() {
        let event = VaultEvent::Harvest {
            strategies: vec![addr(1), addr(2)],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: VaultEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unit_variant_has_no_extra_fields() {
        let value = serde_json::to_value(VaultEvent::Initialized).unwrap();
        assert_eq!(value, serde_json::json!({ "kind": "initialized" }));
    }
}
