//! Shared fixtures for the integration tests.
//!
//! [`FakeReader`] is a scripted [`ChainReader`]: each read resolves from a
//! table seeded by the test, and anything not seeded reverts. That makes
//! "this call fails" scenarios a matter of leaving (or removing) an entry.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use vault_indexer::{Address, CallResult, ChainReader, EventContext, SubscriptionSink};

/// Short-hand address constructor: the address whose last byte is `n`.
pub fn addr(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    Address::new(bytes)
}

/// Delivery context for `vault` at the given timestamp.
pub fn ctx(vault: Address, timestamp: u64) -> EventContext {
    EventContext {
        source: vault,
        block_number: 1,
        timestamp,
    }
}

/// Vault metric identifiers understood by [`FakeReader::set_metric`].
pub mod metric {
    pub const MAX_LOCKED_PROFIT: &str = "max-locked-profit";
    pub const TOTAL_SUPPLY: &str = "total-supply";
    pub const TOTAL_STRATEGY_HOLDINGS: &str = "total-strategy-holdings";
    pub const LOCKED_PROFIT: &str = "locked-profit";
    pub const EXCHANGE_RATE: &str = "exchange-rate";
    pub const TOTAL_FLOAT: &str = "total-float";
    pub const TOTAL_HOLDINGS: &str = "total-holdings";

    pub const ALL: &[&str] = &[
        MAX_LOCKED_PROFIT,
        TOTAL_SUPPLY,
        TOTAL_STRATEGY_HOLDINGS,
        LOCKED_PROFIT,
        EXCHANGE_RATE,
        TOTAL_FLOAT,
        TOTAL_HOLDINGS,
    ];
}

#[derive(Default)]
struct ReaderState {
    token_symbols: HashMap<Address, String>,
    token_decimals: HashMap<Address, u8>,
    strategy_names: HashMap<Address, String>,
    strategy_symbols: HashMap<Address, String>,
    strategy_balances: HashMap<(Address, Address), u128>,
    metrics: HashMap<(Address, &'static str), u128>,
}

/// Scripted chain reader. Unseeded reads revert.
#[derive(Clone, Default)]
pub struct FakeReader {
    state: Arc<Mutex<ReaderState>>,
}

impl FakeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: Address, symbol: &str, decimals: u8) {
        let mut state = self.state.lock().unwrap();
        state.token_symbols.insert(token, symbol.to_string());
        state.token_decimals.insert(token, decimals);
    }

    pub fn set_strategy_metadata(&self, strategy: Address, name: &str, symbol: &str) {
        let mut state = self.state.lock().unwrap();
        state.strategy_names.insert(strategy, name.to_string());
        state.strategy_symbols.insert(strategy, symbol.to_string());
    }

    pub fn set_strategy_balance(&self, vault: Address, strategy: Address, balance: u128) {
        let mut state = self.state.lock().unwrap();
        state.strategy_balances.insert((vault, strategy), balance);
    }

    /// Make the per-strategy balance read revert again.
    pub fn clear_strategy_balance(&self, vault: Address, strategy: Address) {
        let mut state = self.state.lock().unwrap();
        state.strategy_balances.remove(&(vault, strategy));
    }

    pub fn set_metric(&self, vault: Address, name: &'static str, value: u128) {
        let mut state = self.state.lock().unwrap();
        state.metrics.insert((vault, name), value);
    }

    /// Seed every vault metric with the same value.
    pub fn set_all_metrics(&self, vault: Address, value: u128) {
        for name in metric::ALL {
            self.set_metric(vault, name, value);
        }
    }

    /// Make one vault metric read revert again.
    pub fn clear_metric(&self, vault: Address, name: &'static str) {
        let mut state = self.state.lock().unwrap();
        state.metrics.remove(&(vault, name));
    }

    fn metric(&self, vault: Address, name: &'static str) -> CallResult<u128> {
        let state = self.state.lock().unwrap();
        state.metrics.get(&(vault, name)).copied().into()
    }
}

impl ChainReader for FakeReader {
    fn token_symbol(&self, token: Address) -> impl Future<Output = CallResult<String>> + Send {
        let state = self.state.lock().unwrap();
        std::future::ready(state.token_symbols.get(&token).cloned().into())
    }

    fn token_decimals(&self, token: Address) -> impl Future<Output = CallResult<u8>> + Send {
        let state = self.state.lock().unwrap();
        std::future::ready(state.token_decimals.get(&token).copied().into())
    }

    fn strategy_name(
        &self,
        strategy: Address,
    ) -> impl Future<Output = CallResult<String>> + Send {
        let state = self.state.lock().unwrap();
        std::future::ready(state.strategy_names.get(&strategy).cloned().into())
    }

    fn strategy_symbol(
        &self,
        strategy: Address,
    ) -> impl Future<Output = CallResult<String>> + Send {
        let state = self.state.lock().unwrap();
        std::future::ready(state.strategy_symbols.get(&strategy).cloned().into())
    }

    fn strategy_balance(
        &self,
        vault: Address,
        strategy: Address,
    ) -> impl Future<Output = CallResult<u128>> + Send {
        let state = self.state.lock().unwrap();
        std::future::ready(state.strategy_balances.get(&(vault, strategy)).copied().into())
    }

    fn max_locked_profit(
        &self,
        vault: Address,
    ) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::MAX_LOCKED_PROFIT))
    }

    fn total_supply(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::TOTAL_SUPPLY))
    }

    fn total_strategy_holdings(
        &self,
        vault: Address,
    ) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::TOTAL_STRATEGY_HOLDINGS))
    }

    fn locked_profit(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::LOCKED_PROFIT))
    }

    fn exchange_rate(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::EXCHANGE_RATE))
    }

    fn total_float(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::TOTAL_FLOAT))
    }

    fn total_holdings(&self, vault: Address) -> impl Future<Output = CallResult<u128>> + Send {
        std::future::ready(self.metric(vault, metric::TOTAL_HOLDINGS))
    }
}

/// Subscription sink that records every registered vault.
#[derive(Clone, Default)]
pub struct RecordingSink {
    watched: Arc<Mutex<Vec<Address>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(&self) -> Vec<Address> {
        self.watched.lock().unwrap().clone()
    }
}

impl SubscriptionSink for RecordingSink {
    fn watch_vault(&self, vault: Address) {
        self.watched.lock().unwrap().push(vault);
    }
}
