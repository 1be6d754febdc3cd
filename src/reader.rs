//! Failable read-backs to the event source.
//!
//! Several handlers enrich their projection with current on-chain state that
//! is not present in the event payload: token metadata at vault creation,
//! vault-wide metrics on harvests and deposits, per-strategy balances. Every
//! such read can revert; a revert is never an error here, it simply leaves
//! the corresponding field at its previous value (or a sentinel default at
//! creation time).

use std::future::Future;

use crate::address::Address;

/// Outcome of a single contract call.
///
/// This is the `Ok(value) | Unavailable` union every read-back resolves to.
/// Consumers use [`CallResult::assign`] to apply the "overwrite on success,
/// keep the stale value on failure" policy uniformly instead of checking
/// revert flags per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResult<T> {
    /// The call succeeded and returned a value.
    Ok(T),
    /// The call reverted; no value is available.
    Reverted,
}

impl<T> CallResult<T> {
    /// Overwrite `slot` with the returned value, or leave it untouched when
    /// the call reverted. Returns whether the slot was written.
    pub fn assign(self, slot: &mut T) -> bool {
        match self {
            Self::Ok(value) => {
                *slot = value;
                true
            }
            Self::Reverted => false,
        }
    }

    /// Convert to an [`Option`], discarding the revert distinction.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Reverted => None,
        }
    }

    /// The returned value, or `default` when the call reverted.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Reverted => default,
        }
    }

    /// Map the returned value, preserving reverts.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallResult<U> {
        match self {
            Self::Ok(value) => CallResult::Ok(f(value)),
            Self::Reverted => CallResult::Reverted,
        }
    }
}

impl<T> From<Option<T>> for CallResult<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Reverted, Self::Ok)
    }
}

/// Synchronous-in-spirit read access back to the chain.
///
/// Each method mirrors one contract call the projector may issue. Calls are
/// individually failable and never retried; implementations signal a revert
/// with [`CallResult::Reverted`] rather than an error, because a failed read
/// is an expected outcome, not a fault.
pub trait ChainReader: Send + Sync {
    /// ERC-20 `symbol()` on the given token.
    fn token_symbol(&self, token: Address) -> impl Future<Output = CallResult<String>> + Send;

    /// ERC-20 `decimals()` on the given token.
    fn token_decimals(&self, token: Address) -> impl Future<Output = CallResult<u8>> + Send;

    /// `name()` on the given strategy contract.
    fn strategy_name(&self, strategy: Address)
    -> impl Future<Output = CallResult<String>> + Send;

    /// `symbol()` on the given strategy contract.
    fn strategy_symbol(
        &self,
        strategy: Address,
    ) -> impl Future<Output = CallResult<String>> + Send;

    /// The strategy's balance as reported by the vault's per-strategy data
    /// lookup, keyed by strategy address.
    fn strategy_balance(
        &self,
        vault: Address,
        strategy: Address,
    ) -> impl Future<Output = CallResult<u128>> + Send;

    /// `maxLockedProfit()` on the vault.
    fn max_locked_profit(&self, vault: Address)
    -> impl Future<Output = CallResult<u128>> + Send;

    /// `totalSupply()` on the vault.
    fn total_supply(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send;

    /// `totalStrategyHoldings()` on the vault.
    fn total_strategy_holdings(
        &self,
        vault: Address,
    ) -> impl Future<Output = CallResult<u128>> + Send;

    /// `lockedProfit()` on the vault.
    fn locked_profit(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send;

    /// `exchangeRate()` on the vault.
    fn exchange_rate(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send;

    /// `totalFloat()` on the vault.
    fn total_float(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send;

    /// `totalHoldings()` on the vault.
    fn total_holdings(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_overwrites_on_ok() {
        let mut slot = 10u128;
        assert!(CallResult::Ok(42).assign(&mut slot));
        assert_eq!(slot, 42);
    }

    #[test]
    fn assign_keeps_stale_value_on_revert() {
        let mut slot = 10u128;
        assert!(!CallResult::Reverted.assign(&mut slot));
        assert_eq!(slot, 10);
    }

    #[test]
    fn ok_discards_revert() {
        assert_eq!(CallResult::Ok(1).ok(), Some(1));
        assert_eq!(CallResult::<u8>::Reverted.ok(), None);
    }

    #[test]
    fn unwrap_or_uses_default_on_revert() {
        assert_eq!(CallResult::Ok("a").unwrap_or("b"), "a");
        assert_eq!(CallResult::Reverted.unwrap_or("b"), "b");
    }

    #[test]
    fn from_option() {
        assert_eq!(CallResult::from(Some(5)), CallResult::Ok(5));
        assert_eq!(CallResult::<u8>::from(None), CallResult::Reverted);
    }

    #[test]
    fn map_preserves_revert() {
        assert_eq!(CallResult::Ok(2).map(|v| v * 2), CallResult::Ok(4));
        assert_eq!(
            CallResult::<u8>::Reverted.map(|v| v * 2),
            CallResult::Reverted
        );
    }
}
