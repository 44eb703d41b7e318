use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash, U256},
};
use log::info;

use crate::web3::contracts::constants::names::ROCKET_DAO_PROTOCOL;
use crate::web3::contracts::core::error::{ContractError, ContractResult};
use crate::web3::contracts::core::invoker::{ContractInvoker, GasInfo};
use crate::web3::contracts::helpers::fixed_point::Ratio;
use crate::web3::wallet::Wallet;

/// Protocol DAO settings writes, only accepted while the DAO is in
/// bootstrap mode.
pub struct DaoProtocolSettings<I: ContractInvoker> {
    invoker: Arc<I>,
}

impl<I: ContractInvoker> Clone for DaoProtocolSettings<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

fn setting_args(contract: &str, setting: &str, value: DynSolValue) -> [DynSolValue; 3] {
    [
        DynSolValue::String(contract.to_string()),
        DynSolValue::String(setting.to_string()),
        value,
    ]
}

fn claimer_args(contract: &str, percent: Ratio) -> ContractResult<[DynSolValue; 2]> {
    if !percent.is_fraction() {
        return Err(ContractError::Config(format!(
            "claimer percent {percent} for {contract} exceeds 1"
        )));
    }
    Ok([
        DynSolValue::String(contract.to_string()),
        DynSolValue::from(percent.raw()),
    ])
}

impl<I: ContractInvoker> DaoProtocolSettings<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self { invoker }
    }

    async fn bootstrap(
        &self,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let tx = self
            .invoker
            .transact(ROCKET_DAO_PROTOCOL, method, args, wallet)
            .await
            .map_err(|e| ContractError::transaction(ROCKET_DAO_PROTOCOL, method, e))?;
        info!("Bootstrapped protocol setting via {method} in {tx}");
        Ok(tx)
    }

    async fn estimate(
        &self,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        self.invoker
            .estimate_gas(ROCKET_DAO_PROTOCOL, method, args, wallet)
            .await
            .map(GasInfo::from_estimate)
            .map_err(|e| ContractError::transaction(ROCKET_DAO_PROTOCOL, method, e))
    }

    pub async fn bootstrap_bool(
        &self,
        contract: &str,
        setting: &str,
        value: bool,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let args = setting_args(contract, setting, DynSolValue::Bool(value));
        self.bootstrap("bootstrapSettingBool", &args, wallet).await
    }

    pub async fn bootstrap_uint(
        &self,
        contract: &str,
        setting: &str,
        value: U256,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let args = setting_args(contract, setting, DynSolValue::from(value));
        self.bootstrap("bootstrapSettingUint", &args, wallet).await
    }

    pub async fn bootstrap_address(
        &self,
        contract: &str,
        setting: &str,
        value: Address,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let args = setting_args(contract, setting, DynSolValue::Address(value));
        self.bootstrap("bootstrapSettingAddress", &args, wallet)
            .await
    }

    /// Sets the share of interval rewards paid to a claims contract.
    pub async fn bootstrap_claimer(
        &self,
        contract: &str,
        percent: Ratio,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let args = claimer_args(contract, percent)?;
        self.bootstrap("bootstrapSettingClaimer", &args, wallet)
            .await
    }

    pub async fn estimate_bootstrap_bool(
        &self,
        contract: &str,
        setting: &str,
        value: bool,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        let args = setting_args(contract, setting, DynSolValue::Bool(value));
        self.estimate("bootstrapSettingBool", &args, wallet).await
    }

    pub async fn estimate_bootstrap_uint(
        &self,
        contract: &str,
        setting: &str,
        value: U256,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        let args = setting_args(contract, setting, DynSolValue::from(value));
        self.estimate("bootstrapSettingUint", &args, wallet).await
    }

    pub async fn estimate_bootstrap_address(
        &self,
        contract: &str,
        setting: &str,
        value: Address,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        let args = setting_args(contract, setting, DynSolValue::Address(value));
        self.estimate("bootstrapSettingAddress", &args, wallet)
            .await
    }

    pub async fn estimate_bootstrap_claimer(
        &self,
        contract: &str,
        percent: Ratio,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        let args = claimer_args(contract, percent)?;
        self.estimate("bootstrapSettingClaimer", &args, wallet)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use crate::web3::contracts::constants::names::{ROCKET_CLAIM_NODE, ROCKET_REWARDS_POOL};
    use crate::web3::contracts::implementations::rewards_pool::RewardsIntervalOracle;

    const DEPOSIT_SETTINGS: &str = "rocketDAOProtocolSettingsDeposit";

    #[tokio::test]
    async fn test_bootstrap_settings() {
        let chain = Arc::new(MockChain::new());
        let settings = DaoProtocolSettings::new(chain.clone());
        let guardian = Wallet::random();

        settings
            .bootstrap_bool(DEPOSIT_SETTINGS, "deposit.enabled", true, &guardian)
            .await
            .unwrap();
        settings
            .bootstrap_uint(DEPOSIT_SETTINGS, "deposit.minimum", U256::from(10), &guardian)
            .await
            .unwrap();
        settings
            .bootstrap_address(
                ROCKET_REWARDS_POOL,
                "rewards.vault",
                Address::repeat_byte(9),
                &guardian,
            )
            .await
            .unwrap();

        assert_eq!(
            chain.setting(DEPOSIT_SETTINGS, "deposit.enabled").await,
            Some(DynSolValue::Bool(true))
        );
        assert_eq!(
            chain.setting(DEPOSIT_SETTINGS, "deposit.minimum").await,
            Some(DynSolValue::Uint(U256::from(10), 256))
        );
        assert_eq!(
            chain.setting(ROCKET_REWARDS_POOL, "rewards.vault").await,
            Some(DynSolValue::Address(Address::repeat_byte(9)))
        );
    }

    #[tokio::test]
    async fn test_bootstrap_claimer_sets_category_share() {
        let chain = Arc::new(MockChain::new());
        let settings = DaoProtocolSettings::new(chain.clone());
        let oracle = RewardsIntervalOracle::new(chain.clone(), chain.clone());
        let guardian = Wallet::random();
        let percent = Ratio::from_f64(0.15).unwrap();

        let gas = settings
            .estimate_bootstrap_claimer(ROCKET_CLAIM_NODE, percent, &guardian)
            .await
            .unwrap();
        assert!(gas.estimated_gas > 0);

        settings
            .bootstrap_claimer(ROCKET_CLAIM_NODE, percent, &guardian)
            .await
            .unwrap();
        assert_eq!(
            oracle.get_node_operator_rewards_percent(None).await.unwrap(),
            percent
        );
    }

    #[tokio::test]
    async fn test_claimer_percent_above_one_is_rejected_locally() {
        let chain = Arc::new(MockChain::new());
        let settings = DaoProtocolSettings::new(chain.clone());

        let result = settings
            .bootstrap_claimer(ROCKET_CLAIM_NODE, Ratio::from_f64(1.5).unwrap(), &Wallet::random())
            .await;
        assert!(matches!(result, Err(ContractError::Config(_))));
        assert!(chain.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_mode_off_reverts() {
        let chain = Arc::new(MockChain::new());
        let settings = DaoProtocolSettings::new(chain.clone());
        chain.set_bootstrap_mode(false).await;

        let err = settings
            .bootstrap_bool(DEPOSIT_SETTINGS, "deposit.enabled", false, &Wallet::random())
            .await
            .unwrap_err();
        assert_eq!(err.revert_reason(), Some("Bootstrap mode not engaged"));
    }
}
