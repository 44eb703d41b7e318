use std::sync::Arc;
use std::time::Duration;

use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{Address, TxHash, U256},
};
use futures::future::join_all;
use log::{debug, info, warn};

use crate::web3::contracts::constants::names::{
    ROCKET_CLAIM_NODE, ROCKET_CLAIM_TRUSTED_NODE, ROCKET_REWARDS_POOL,
};
use crate::web3::contracts::core::error::{ContractError, ContractResult, InvokeError};
use crate::web3::contracts::core::invoker::{Clock, ContractInvoker, GasInfo};
use crate::web3::contracts::helpers::fixed_point::Ratio;
use crate::web3::contracts::helpers::utils::{block_timestamp, read};
use crate::web3::contracts::structs::rewards::{
    ClaimerShare, ClaimsContractConfig, IntervalStatus, RewardInterval,
};
use crate::web3::wallet::Wallet;

/// Reward intervals and per-claimer eligibility.
///
/// Read-only except for [`submit_claim`](Self::submit_claim). Every call
/// re-queries the chain.
pub struct RewardsIntervalOracle<I: ContractInvoker, C: Clock> {
    invoker: Arc<I>,
    clock: Arc<C>,
}

impl<I: ContractInvoker, C: Clock> Clone for RewardsIntervalOracle<I, C> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<I: ContractInvoker, C: Clock> RewardsIntervalOracle<I, C> {
    pub fn new(invoker: Arc<I>, clock: Arc<C>) -> Self {
        Self { invoker, clock }
    }

    pub async fn get_current_interval(&self, at: Option<BlockId>) -> ContractResult<RewardInterval> {
        let invoker = self.invoker.as_ref();
        let (start, duration) = tokio::join!(
            read(invoker, ROCKET_REWARDS_POOL, "getClaimIntervalTimeStart", &[], at),
            read(invoker, ROCKET_REWARDS_POOL, "getClaimIntervalTime", &[], at),
        );
        let start = start?.u64(0)?;
        let duration = duration?.u64(0)?;
        if duration == 0 {
            return Err(ContractError::decode(
                ROCKET_REWARDS_POOL,
                "getClaimIntervalTime",
                "claim interval duration is zero",
            ));
        }

        Ok(RewardInterval {
            start,
            duration: Duration::from_secs(duration),
        })
    }

    /// When the next distribution happens, relative to block time at `at`.
    pub async fn get_interval_status(&self, at: Option<BlockId>) -> ContractResult<IntervalStatus> {
        let (interval, now) = tokio::join!(
            self.get_current_interval(at),
            block_timestamp(self.clock.as_ref(), at),
        );
        Ok(IntervalStatus::at(interval?, now?))
    }

    /// Total rewards to be distributed over the current interval, in wei.
    pub async fn get_interval_rewards_total(&self, at: Option<BlockId>) -> ContractResult<U256> {
        read(
            self.invoker.as_ref(),
            ROCKET_REWARDS_POOL,
            "getClaimIntervalRewardsTotal",
            &[],
            at,
        )
        .await?
        .uint(0)
    }

    async fn get_claiming_contract_perc(
        &self,
        category: &str,
        at: Option<BlockId>,
    ) -> ContractResult<Ratio> {
        let percent = read(
            self.invoker.as_ref(),
            ROCKET_REWARDS_POOL,
            "getClaimingContractPerc",
            &[DynSolValue::String(category.to_string())],
            at,
        )
        .await?
        .uint(0)
        .map(Ratio::from_raw)?;
        if !percent.is_fraction() {
            return Err(ContractError::InconsistentState(format!(
                "{category} rewards percent {percent} exceeds 1"
            )));
        }
        Ok(percent)
    }

    /// Share of interval rewards routed to node operators.
    pub async fn get_node_operator_rewards_percent(
        &self,
        at: Option<BlockId>,
    ) -> ContractResult<Ratio> {
        self.get_claiming_contract_perc(ROCKET_CLAIM_NODE, at).await
    }

    /// Share of interval rewards routed to oracle DAO members.
    pub async fn get_trusted_node_operator_rewards_percent(
        &self,
        at: Option<BlockId>,
    ) -> ContractResult<Ratio> {
        self.get_claiming_contract_perc(ROCKET_CLAIM_TRUSTED_NODE, at)
            .await
    }

    pub async fn get_category_config(
        &self,
        category: &str,
        at: Option<BlockId>,
    ) -> ContractResult<ClaimsContractConfig> {
        let exists = read(
            self.invoker.as_ref(),
            ROCKET_REWARDS_POOL,
            "getClaimingContractExists",
            &[DynSolValue::String(category.to_string())],
            at,
        )
        .await?
        .bool(0)?;
        if !exists {
            return Err(ContractError::NotFound(format!("claims category {category}")));
        }

        let (enabled, global_percent) = tokio::join!(
            read(self.invoker.as_ref(), category, "getEnabled", &[], at),
            self.get_claiming_contract_perc(category, at),
        );

        Ok(ClaimsContractConfig {
            name: category.to_string(),
            enabled: enabled?.bool(0)?,
            global_percent: global_percent?,
        })
    }

    /// Configs for several categories; their shares may not sum above 1.
    pub async fn get_category_configs(
        &self,
        categories: &[&str],
        at: Option<BlockId>,
    ) -> ContractResult<Vec<ClaimsContractConfig>> {
        let results = join_all(
            categories
                .iter()
                .map(|category| self.get_category_config(category, at)),
        )
        .await;
        let configs = results.into_iter().collect::<ContractResult<Vec<_>>>()?;

        let total = configs
            .iter()
            .try_fold(Ratio::ZERO, |total, config| {
                total.checked_add(config.global_percent)
            })
            .filter(Ratio::is_fraction)
            .ok_or_else(|| {
                ContractError::InconsistentState(format!(
                    "rewards percents of {categories:?} sum above 1"
                ))
            })?;
        debug!("Categories {categories:?} receive {total} of interval rewards");

        Ok(configs)
    }

    /// Eligibility of `claimer` in `category` for the current interval.
    ///
    /// The three underlying reads are independent; pass a block number as
    /// `at` to read them from one block.
    pub async fn get_claimer_share(
        &self,
        category: &str,
        claimer: Address,
        at: Option<BlockId>,
    ) -> ContractResult<ClaimerShare> {
        let invoker = self.invoker.as_ref();
        let args = [DynSolValue::from(claimer)];
        let (possible, percent, amount) = tokio::join!(
            read(invoker, category, "getClaimPossible", &args, at),
            read(invoker, category, "getClaimRewardsPerc", &args, at),
            read(invoker, category, "getClaimRewardsAmount", &args, at),
        );

        let percent_eligible = Ratio::from_raw(percent?.uint(0)?);
        if !percent_eligible.is_fraction() {
            return Err(ContractError::InconsistentState(format!(
                "{category} claim percent {percent_eligible} for {claimer} exceeds 1"
            )));
        }

        Ok(ClaimerShare {
            claimer,
            claim_possible: possible?.bool(0)?,
            percent_eligible,
            amount_eligible: amount?.uint(0)?,
        })
    }

    /// Unix time at which `claimer` registered with `category`.
    pub async fn get_registration_time(
        &self,
        category: &str,
        claimer: Address,
        at: Option<BlockId>,
    ) -> ContractResult<u64> {
        read(
            self.invoker.as_ref(),
            ROCKET_REWARDS_POOL,
            "getClaimingContractUserRegisteredTime",
            &[DynSolValue::String(category.to_string()), claimer.into()],
            at,
        )
        .await?
        .u64(0)
    }

    fn reject(&self, category: &str, claimer: Address, err: InvokeError) -> ContractError {
        match err {
            InvokeError::Reverted(reason) => {
                warn!("Claim on {category} for {claimer} rejected: {reason}");
                ContractError::ClaimRejected {
                    category: category.to_string(),
                    claimer,
                    reason,
                }
            }
            err => ContractError::transaction(category, "claim", err),
        }
    }

    pub async fn estimate_claim_gas(&self, category: &str, wallet: &Wallet) -> ContractResult<GasInfo> {
        self.invoker
            .estimate_gas(category, "claim", &[], wallet)
            .await
            .map(GasInfo::from_estimate)
            .map_err(|e| self.reject(category, wallet.address(), e))
    }

    /// Claims `claimer`'s rewards for the current interval.
    ///
    /// Not idempotent: once this succeeds, submitting again is rejected by
    /// the chain.
    pub async fn submit_claim(
        &self,
        category: &str,
        claimer: Address,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        if wallet.address() != claimer {
            return Err(ContractError::ClaimRejected {
                category: category.to_string(),
                claimer,
                reason: format!("signer {} is not the claimer", wallet.address()),
            });
        }

        let tx = self
            .invoker
            .transact(category, "claim", &[], wallet)
            .await
            .map_err(|e| self.reject(category, claimer, e))?;
        info!("Claimed {category} rewards for {claimer} in {tx}");
        Ok(tx)
    }
}

#[cfg(test)]
mod tests;
