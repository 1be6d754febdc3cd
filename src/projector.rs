//! The projection logic.
//!
//! [`Projector`] is a pure mapping from `(event, current entity state,
//! optional external read)` to updated entity state. Every handler follows
//! the same shape: load or create the entity named by the event, optionally
//! read current on-chain state back from the source contract, set a few
//! fields, persist. The host runtime delivers events strictly one at a time,
//! so handlers never race each other.
//!
//! Two failure modes exist (and only two): a missing entity is a fatal
//! ordering violation upstream and surfaces as a typed error; a reverted
//! read-back silently leaves the affected field at its previous value.

use thiserror::Error;

use crate::{
    address::Address,
    entity::{Strategy, Vault},
    event::{EventContext, VaultEvent},
    reader::{CallResult, ChainReader},
    store::{CreateError, EntityStore},
};

/// Errors that can occur while projecting an event.
#[derive(Debug, Error)]
pub enum ProjectError<StoreError>
where
    StoreError: std::error::Error + 'static,
{
    /// An event referenced a vault before its deployment event was
    /// processed. There is no recovery; delivery ordering is the host's
    /// contract.
    #[error("vault `{0}` has no record; event delivered before its deployment was processed")]
    MissingVault(Address),
    /// A balance refresh referenced a strategy with no record.
    #[error("strategy `{0}` has no record")]
    MissingStrategy(Address),
    /// Creating a record failed, including replayed creation events.
    #[error(transparent)]
    Create(#[from] CreateError<StoreError>),
    /// Underlying store error.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

/// Host-runtime hook for dynamic subscription registration.
///
/// Deploying a vault must register the new address so the host starts
/// delivering that contract's events. The unit implementation is a no-op for
/// hosts that subscribe by other means.
pub trait SubscriptionSink: Send + Sync {
    /// Register a newly deployed vault for event delivery.
    fn watch_vault(&self, vault: Address);
}

impl SubscriptionSink for () {
    fn watch_vault(&self, _vault: Address) {}
}

/// Projects decoded vault events into [`Vault`] and [`Strategy`] records.
///
/// Generic over the entity store, the chain reader used for enrichment
/// read-backs, and the subscription sink notified of new vaults.
pub struct Projector<S, R, N = ()> {
    store: S,
    reader: R,
    subscriptions: N,
}

impl<S, R> Projector<S, R> {
    /// Create a projector with no subscription sink.
    pub const fn new(store: S, reader: R) -> Self {
        Self {
            store,
            reader,
            subscriptions: (),
        }
    }
}

impl<S, R, N> Projector<S, R, N> {
    /// Create a projector that notifies `subscriptions` of deployed vaults.
    pub const fn with_subscriptions(store: S, reader: R, subscriptions: N) -> Self {
        Self {
            store,
            reader,
            subscriptions,
        }
    }

    /// The entity store this projector writes to.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S, R, N> Projector<S, R, N>
where
    S: EntityStore,
    R: ChainReader,
    N: SubscriptionSink,
{
    /// Route one decoded event to its handler.
    ///
    /// `ctx.source` names the vault for every event except deployment, where
    /// the vault address travels in the event parameters (the factory is the
    /// emitter).
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError`] when a referenced entity is missing or the
    /// store fails; reverted read-backs are not errors.
    #[tracing::instrument(skip(self, ctx, event), fields(source = %ctx.source, kind = event.kind()))]
    pub async fn apply(
        &self,
        ctx: &EventContext,
        event: &VaultEvent,
    ) -> Result<(), ProjectError<S::Error>> {
        match event {
            VaultEvent::Deployed { vault, underlying } => {
                self.on_vault_deployed(*vault, *underlying).await
            }
            VaultEvent::Initialized => self.on_vault_initialized(ctx.source).await,
            VaultEvent::Harvest { strategies } => {
                self.on_harvest(ctx.source, ctx.timestamp, strategies).await
            }
            VaultEvent::HarvestWindowUpdated { new_window } => {
                self.on_harvest_window_updated(ctx.source, *new_window).await
            }
            VaultEvent::HarvestDelayUpdated { new_delay } => {
                self.on_harvest_delay_updated(ctx.source, *new_delay).await
            }
            VaultEvent::HarvestDelayUpdateScheduled { new_delay } => {
                self.on_harvest_delay_update_scheduled(ctx.source, *new_delay)
                    .await
            }
            VaultEvent::UnderlyingIsWethUpdated { underlying_is_weth } => {
                self.on_underlying_is_weth_updated(ctx.source, *underlying_is_weth)
                    .await
            }
            VaultEvent::TargetFloatPercentUpdated {
                new_target_float_percent,
            } => {
                self.on_target_float_percent_updated(ctx.source, *new_target_float_percent)
                    .await
            }
            VaultEvent::FeePercentUpdated { new_fee_percent } => {
                self.on_fee_percent_updated(ctx.source, *new_fee_percent)
                    .await
            }
            VaultEvent::StrategyTrusted { strategy } => {
                self.on_strategy_trusted(ctx.source, *strategy).await
            }
            VaultEvent::StrategyDistrusted { strategy } => {
                self.on_strategy_distrusted(ctx.source, *strategy).await
            }
            VaultEvent::StrategyDeposit { strategy }
            | VaultEvent::StrategyWithdrawal { strategy }
            | VaultEvent::StrategySeized { strategy } => {
                self.on_strategy_flow(ctx.source, *strategy).await
            }
            VaultEvent::Deposit { user, amount } => {
                self.on_deposit(ctx.source, *user, *amount).await
            }
            VaultEvent::Withdraw { user, amount } => {
                self.on_withdraw(ctx.source, *user, *amount).await
            }
        }
    }

    /// Project a vault-deployment event into a new [`Vault`] record.
    ///
    /// Creation is unconditional: deployment events are delivered exactly
    /// once, so an existing record is a replay and surfaces as
    /// [`CreateError::AlreadyExists`]. The underlying token's symbol and
    /// decimals are fetched once here and stay absent if those reads revert.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Create`] on duplicate creation or store
    /// failure.
    pub async fn on_vault_deployed(
        &self,
        vault_id: Address,
        underlying: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        let mut vault = Vault::new(vault_id, underlying);
        vault.underlying_symbol = self.reader.token_symbol(underlying).await.ok();
        vault.underlying_decimals = self.reader.token_decimals(underlying).await.ok();

        self.store.create(&vault).await?;
        self.subscriptions.watch_vault(vault_id);

        tracing::info!(
            vault = %vault_id,
            underlying = %underlying,
            symbol = vault.underlying_symbol.as_deref(),
            "vault created"
        );
        Ok(())
    }

    /// Mark the vault as initialized.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_vault_initialized(
        &self,
        vault_id: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, "vault initialized");
        self.update_vault(vault_id, |vault| vault.initialized = true)
            .await
    }

    /// Update the vault's harvest window length.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_harvest_window_updated(
        &self,
        vault_id: Address,
        new_window: u64,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, new_window, "harvest window updated");
        self.update_vault(vault_id, |vault| vault.harvest_window = new_window)
            .await
    }

    /// Update the vault's harvest delay.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_harvest_delay_updated(
        &self,
        vault_id: Address,
        new_delay: u64,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, new_delay, "harvest delay updated");
        self.update_vault(vault_id, |vault| vault.harvest_delay = new_delay)
            .await
    }

    /// Record a harvest delay scheduled to take effect after the next
    /// harvest.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_harvest_delay_update_scheduled(
        &self,
        vault_id: Address,
        new_delay: u64,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, new_delay, "harvest delay update scheduled");
        self.update_vault(vault_id, |vault| vault.next_harvest_delay = new_delay)
            .await
    }

    /// Update whether the underlying token is the wrapped native asset.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_underlying_is_weth_updated(
        &self,
        vault_id: Address,
        underlying_is_weth: bool,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, underlying_is_weth, "underlying-is-weth updated");
        self.update_vault(vault_id, |vault| vault.underlying_is_weth = underlying_is_weth)
            .await
    }

    /// Update the vault's target float percentage.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_target_float_percent_updated(
        &self,
        vault_id: Address,
        new_target_float_percent: u128,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(
            vault = %vault_id,
            new_target_float_percent,
            "target float percent updated"
        );
        self.update_vault(vault_id, |vault| {
            vault.target_float_percent = new_target_float_percent;
        })
        .await
    }

    /// Update the vault's performance fee percentage.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_fee_percent_updated(
        &self,
        vault_id: Address,
        new_fee_percent: u128,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, new_fee_percent, "fee percent updated");
        self.update_vault(vault_id, |vault| vault.fee_percent = new_fee_percent)
            .await
    }

    /// Reconcile a harvest cycle.
    ///
    /// Opens a new harvest window when the delay has elapsed since the last
    /// harvest (an unset delay counts as zero, so a vault's first-ever
    /// harvest always opens a window), stamps the harvest timestamp, then
    /// refreshes the vault's derived metrics and each listed strategy's
    /// balance. Reverted metric reads leave the prior values in place, and a
    /// reverted balance read skips that strategy without aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no vault record exists,
    /// or [`ProjectError::MissingStrategy`] when a listed strategy has no
    /// record.
    pub async fn on_harvest(
        &self,
        vault_id: Address,
        timestamp: u64,
        strategies: &[Address],
    ) -> Result<(), ProjectError<S::Error>> {
        let mut vault = self.vault(vault_id).await?;

        if timestamp >= vault.last_harvest_timestamp.saturating_add(vault.harvest_delay) {
            vault.last_harvest_window_start_timestamp = timestamp;
        }
        vault.last_harvest_timestamp = timestamp;

        self.reader
            .max_locked_profit(vault_id)
            .await
            .assign(&mut vault.max_locked_profit);
        self.reader
            .total_supply(vault_id)
            .await
            .assign(&mut vault.total_supply);
        self.reader
            .total_strategy_holdings(vault_id)
            .await
            .assign(&mut vault.total_strategy_holdings);
        self.reader
            .locked_profit(vault_id)
            .await
            .assign(&mut vault.locked_profit);
        self.reader
            .exchange_rate(vault_id)
            .await
            .assign(&mut vault.exchange_rate);
        self.reader
            .total_float(vault_id)
            .await
            .assign(&mut vault.total_float);
        self.reader
            .total_holdings(vault_id)
            .await
            .assign(&mut vault.total_holdings);

        self.store.save(&vault).await.map_err(ProjectError::Store)?;

        tracing::info!(
            vault = %vault_id,
            timestamp,
            strategy_count = strategies.len(),
            "harvest reconciled"
        );

        for strategy in strategies {
            self.refresh_strategy_balance(vault_id, *strategy).await?;
        }
        Ok(())
    }

    /// Begin trusting a strategy, creating its record on first sight.
    ///
    /// The strategy's `trusted` flag is the single source of truth for
    /// membership: when it is already set the handler is a no-op, so
    /// replaying a trust event never produces a duplicate list entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no vault record exists.
    pub async fn on_strategy_trusted(
        &self,
        vault_id: Address,
        strategy_id: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        let mut strategy = self.get_or_create_strategy(vault_id, strategy_id).await?;
        if strategy.trusted {
            tracing::debug!(
                vault = %vault_id,
                strategy = %strategy_id,
                "strategy already trusted"
            );
            return Ok(());
        }

        let mut vault = self.vault(vault_id).await?;
        vault.trusted_strategies.push(strategy_id);
        self.store.save(&vault).await.map_err(ProjectError::Store)?;

        strategy.trusted = true;
        self.store
            .save(&strategy)
            .await
            .map_err(ProjectError::Store)?;

        tracing::info!(
            vault = %vault_id,
            strategy = %strategy_id,
            name = %strategy.name,
            "strategy trusted"
        );
        Ok(())
    }

    /// Stop trusting a strategy.
    ///
    /// Removes the strategy from the vault's trusted list when present
    /// (order of the remaining entries preserved), then forces the
    /// strategy's `trusted` flag off regardless of whether it was ever in
    /// the list.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no vault record exists.
    pub async fn on_strategy_distrusted(
        &self,
        vault_id: Address,
        strategy_id: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        let mut vault = self.vault(vault_id).await?;
        if let Some(index) = vault
            .trusted_strategies
            .iter()
            .position(|entry| *entry == strategy_id)
        {
            vault.trusted_strategies.remove(index);
            self.store.save(&vault).await.map_err(ProjectError::Store)?;
        }

        let mut strategy = self.get_or_create_strategy(vault_id, strategy_id).await?;
        strategy.trusted = false;
        self.store
            .save(&strategy)
            .await
            .map_err(ProjectError::Store)?;

        tracing::info!(
            vault = %vault_id,
            strategy = %strategy_id,
            name = %strategy.name,
            "strategy distrusted"
        );
        Ok(())
    }

    /// Refresh vault-wide metrics on a user deposit.
    ///
    /// The user and amount are observed only for the log line; no per-user
    /// state is tracked.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_deposit(
        &self,
        vault_id: Address,
        user: Address,
        amount: u128,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, user = %user, amount, "deposit");
        self.refresh_user_metrics(vault_id).await
    }

    /// Refresh vault-wide metrics on a user withdrawal.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingVault`] when no record exists.
    pub async fn on_withdraw(
        &self,
        vault_id: Address,
        user: Address,
        amount: u128,
    ) -> Result<(), ProjectError<S::Error>> {
        tracing::info!(vault = %vault_id, user = %user, amount, "withdraw");
        self.refresh_user_metrics(vault_id).await
    }

    /// Pull the strategy's current balance from the vault and persist it if
    /// it changed.
    ///
    /// Returns `None` when the read reverted (no mutation), otherwise the
    /// resolved balance. An unchanged balance is not re-persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::MissingStrategy`] when the read succeeded but
    /// no strategy record exists to write it to.
    pub async fn refresh_strategy_balance(
        &self,
        vault_id: Address,
        strategy_id: Address,
    ) -> Result<Option<u128>, ProjectError<S::Error>> {
        let CallResult::Ok(balance) = self.reader.strategy_balance(vault_id, strategy_id).await
        else {
            tracing::debug!(
                vault = %vault_id,
                strategy = %strategy_id,
                "strategy balance read reverted"
            );
            return Ok(None);
        };

        let mut strategy = self.strategy(strategy_id).await?;
        if strategy.balance != balance {
            strategy.balance = balance;
            self.store
                .save(&strategy)
                .await
                .map_err(ProjectError::Store)?;
            tracing::info!(
                vault = %vault_id,
                strategy = %strategy_id,
                balance,
                "strategy balance updated"
            );
        }
        Ok(Some(balance))
    }

    /// Return the strategy record, creating it on first reference.
    ///
    /// A new record starts untrusted with zero balance, its metadata filled
    /// from `name()`/`symbol()` read-backs (sentinel defaults when those
    /// revert), and its balance refreshed immediately after the first save.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Store`] when persistence fails.
    pub async fn get_or_create_strategy(
        &self,
        vault_id: Address,
        strategy_id: Address,
    ) -> Result<Strategy, ProjectError<S::Error>> {
        if let Some(existing) = self
            .store
            .load::<Strategy>(strategy_id)
            .await
            .map_err(ProjectError::Store)?
        {
            return Ok(existing);
        }

        let mut strategy = Strategy::new(strategy_id, vault_id);
        self.reader
            .strategy_name(strategy_id)
            .await
            .assign(&mut strategy.name);
        self.reader
            .strategy_symbol(strategy_id)
            .await
            .assign(&mut strategy.symbol);

        self.store
            .save(&strategy)
            .await
            .map_err(ProjectError::Store)?;

        tracing::info!(
            vault = %vault_id,
            strategy = %strategy_id,
            name = %strategy.name,
            "strategy created"
        );

        if let Some(balance) = self.refresh_strategy_balance(vault_id, strategy_id).await? {
            strategy.balance = balance;
        }
        Ok(strategy)
    }

    /// Vault deposits into, withdrawals from, and seizures of a strategy all
    /// resolve to the same projection: make sure the record exists, then
    /// refresh its balance.
    async fn on_strategy_flow(
        &self,
        vault_id: Address,
        strategy_id: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        self.get_or_create_strategy(vault_id, strategy_id).await?;
        self.refresh_strategy_balance(vault_id, strategy_id).await?;
        Ok(())
    }

    /// Refresh the user-facing vault metrics, stale-on-failure per field.
    async fn refresh_user_metrics(
        &self,
        vault_id: Address,
    ) -> Result<(), ProjectError<S::Error>> {
        let mut vault = self.vault(vault_id).await?;

        self.reader
            .total_supply(vault_id)
            .await
            .assign(&mut vault.total_supply);
        self.reader
            .locked_profit(vault_id)
            .await
            .assign(&mut vault.locked_profit);
        self.reader
            .exchange_rate(vault_id)
            .await
            .assign(&mut vault.exchange_rate);
        self.reader
            .total_float(vault_id)
            .await
            .assign(&mut vault.total_float);
        self.reader
            .total_holdings(vault_id)
            .await
            .assign(&mut vault.total_holdings);

        self.store.save(&vault).await.map_err(ProjectError::Store)
    }

    async fn vault(&self, id: Address) -> Result<Vault, ProjectError<S::Error>> {
        self.store
            .load::<Vault>(id)
            .await
            .map_err(ProjectError::Store)?
            .ok_or(ProjectError::MissingVault(id))
    }

    async fn strategy(&self, id: Address) -> Result<Strategy, ProjectError<S::Error>> {
        self.store
            .load::<Strategy>(id)
            .await
            .map_err(ProjectError::Store)?
            .ok_or(ProjectError::MissingStrategy(id))
    }

    async fn update_vault(
        &self,
        id: Address,
        mutate: impl FnOnce(&mut Vault),
    ) -> Result<(), ProjectError<S::Error>> {
        let mut vault = self.vault(id).await?;
        mutate(&mut vault);
        self.store.save(&vault).await.map_err(ProjectError::Store)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn missing_vault_error_mentions_ordering() {
        let error: ProjectError<io::Error> = ProjectError::MissingVault(Address::new([0; 20]));
        assert!(error.to_string().contains("before its deployment"));
    }

    #[test]
    fn create_conflict_is_transparent() {
        let error: ProjectError<io::Error> = CreateError::AlreadyExists {
            kind: "vault",
            id: Address::new([1; 20]),
        }
        .into();
        assert!(error.to_string().contains("already exists"));
    }
}
