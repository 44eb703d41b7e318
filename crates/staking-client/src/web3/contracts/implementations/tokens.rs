use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{Address, TxHash, U256},
};
use log::info;

use crate::web3::contracts::core::error::{ContractError, ContractResult};
use crate::web3::contracts::core::invoker::{ContractInvoker, GasInfo};
use crate::web3::contracts::helpers::utils::read;
use crate::web3::contracts::structs::tokens::{Balances, Token};
use crate::web3::wallet::Wallet;

/// ERC20 accessors for the protocol tokens.
pub struct TokenContracts<I: ContractInvoker> {
    invoker: Arc<I>,
}

impl<I: ContractInvoker> Clone for TokenContracts<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<I: ContractInvoker> TokenContracts<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self { invoker }
    }

    pub async fn total_supply(&self, token: Token, at: Option<BlockId>) -> ContractResult<U256> {
        read(self.invoker.as_ref(), token.contract_name(), "totalSupply", &[], at)
            .await?
            .uint(0)
    }

    pub async fn balance_of(
        &self,
        token: Token,
        owner: Address,
        at: Option<BlockId>,
    ) -> ContractResult<U256> {
        read(
            self.invoker.as_ref(),
            token.contract_name(),
            "balanceOf",
            &[owner.into()],
            at,
        )
        .await?
        .uint(0)
    }

    pub async fn allowance(
        &self,
        token: Token,
        owner: Address,
        spender: Address,
        at: Option<BlockId>,
    ) -> ContractResult<U256> {
        read(
            self.invoker.as_ref(),
            token.contract_name(),
            "allowance",
            &[owner.into(), spender.into()],
            at,
        )
        .await?
        .uint(0)
    }

    pub async fn eth_balance(&self, address: Address, at: Option<BlockId>) -> ContractResult<U256> {
        self.invoker
            .native_balance(address, at)
            .await
            .map_err(|e| ContractError::read("eth", "getBalance", e))
    }

    /// ETH held by the rETH or nETH contract itself.
    pub async fn contract_eth_balance(
        &self,
        token: Token,
        at: Option<BlockId>,
    ) -> ContractResult<U256> {
        if !token.holds_eth() {
            return Err(ContractError::Config(format!("{token} does not hold ETH")));
        }
        let address = self
            .invoker
            .contract_address(token.contract_name())
            .await
            .map_err(|e| ContractError::read(token.contract_name(), "address", e))?;
        self.eth_balance(address, at).await
    }

    /// ETH and token balances of `address`, read concurrently.
    pub async fn get_balances(
        &self,
        address: Address,
        at: Option<BlockId>,
    ) -> ContractResult<Balances> {
        let (eth, neth, reth, rpl) = tokio::join!(
            self.eth_balance(address, at),
            self.balance_of(Token::Neth, address, at),
            self.balance_of(Token::Reth, address, at),
            self.balance_of(Token::Rpl, address, at),
        );
        Ok(Balances {
            eth: eth?,
            neth: neth?,
            reth: reth?,
            rpl: rpl?,
        })
    }

    async fn send(
        &self,
        token: Token,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        let tx = self
            .invoker
            .transact(token.contract_name(), method, args, wallet)
            .await
            .map_err(|e| ContractError::transaction(token.contract_name(), method, e))?;
        info!("{token}.{method} from {} in {tx}", wallet.address());
        Ok(tx)
    }

    async fn estimate(
        &self,
        token: Token,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        self.invoker
            .estimate_gas(token.contract_name(), method, args, wallet)
            .await
            .map(GasInfo::from_estimate)
            .map_err(|e| ContractError::transaction(token.contract_name(), method, e))
    }

    pub async fn transfer(
        &self,
        token: Token,
        to: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        self.send(token, "transfer", &[to.into(), amount.into()], wallet)
            .await
    }

    pub async fn approve(
        &self,
        token: Token,
        spender: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        self.send(token, "approve", &[spender.into(), amount.into()], wallet)
            .await
    }

    /// Moves `amount` from `from` using the signer's allowance.
    pub async fn transfer_from(
        &self,
        token: Token,
        from: Address,
        to: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<TxHash> {
        self.send(
            token,
            "transferFrom",
            &[from.into(), to.into(), amount.into()],
            wallet,
        )
        .await
    }

    pub async fn estimate_transfer_gas(
        &self,
        token: Token,
        to: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        self.estimate(token, "transfer", &[to.into(), amount.into()], wallet)
            .await
    }

    pub async fn estimate_approve_gas(
        &self,
        token: Token,
        spender: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        self.estimate(token, "approve", &[spender.into(), amount.into()], wallet)
            .await
    }

    pub async fn estimate_transfer_from_gas(
        &self,
        token: Token,
        from: Address,
        to: Address,
        amount: U256,
        wallet: &Wallet,
    ) -> ContractResult<GasInfo> {
        self.estimate(
            token,
            "transferFrom",
            &[from.into(), to.into(), amount.into()],
            wallet,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use crate::web3::contracts::constants::names::{
        ROCKET_TOKEN_NETH, ROCKET_TOKEN_RETH, ROCKET_TOKEN_RPL,
    };
    use crate::web3::contracts::core::error::InvokeError;
    use crate::web3::contracts::helpers::fixed_point::SCALE;

    fn eth(value: u64) -> U256 {
        U256::from(value) * SCALE
    }

    #[tokio::test]
    async fn test_get_balances() {
        let chain = Arc::new(MockChain::new());
        let tokens = TokenContracts::new(chain.clone());
        let owner = Address::repeat_byte(0x01);
        chain.set_eth_balance(owner, eth(32)).await;
        chain.mint(ROCKET_TOKEN_RPL, owner, eth(1600)).await;
        chain.mint(ROCKET_TOKEN_RETH, owner, eth(3)).await;

        let balances = tokens.get_balances(owner, None).await.unwrap();
        assert_eq!(
            balances,
            Balances {
                eth: eth(32),
                neth: U256::ZERO,
                reth: eth(3),
                rpl: eth(1600),
            }
        );
        assert_eq!(tokens.total_supply(Token::Rpl, None).await.unwrap(), eth(1600));
    }

    #[tokio::test]
    async fn test_get_balances_returns_first_error() {
        let chain = Arc::new(MockChain::new());
        let tokens = TokenContracts::new(chain.clone());
        chain
            .fail_method(
                ROCKET_TOKEN_RPL,
                "balanceOf",
                InvokeError::Transport("rpl down".to_string()),
            )
            .await;
        chain
            .fail_method(
                ROCKET_TOKEN_NETH,
                "balanceOf",
                InvokeError::Transport("neth down".to_string()),
            )
            .await;

        let err = tokens
            .get_balances(Address::repeat_byte(0x02), None)
            .await
            .unwrap_err();
        match err {
            ContractError::ChainRead {
                contract, source, ..
            } => {
                assert_eq!(contract, ROCKET_TOKEN_NETH);
                assert_eq!(source, InvokeError::Transport("neth down".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Every branch ran to completion
        assert_eq!(chain.call_count(ROCKET_TOKEN_RPL, "balanceOf").await, 1);
        assert_eq!(chain.call_count(ROCKET_TOKEN_RETH, "balanceOf").await, 1);
    }

    #[tokio::test]
    async fn test_transfer_and_allowance() {
        let chain = Arc::new(MockChain::new());
        let tokens = TokenContracts::new(chain.clone());
        let owner = Wallet::random();
        let spender = Wallet::random();
        let recipient = Address::repeat_byte(0x03);
        chain.mint(ROCKET_TOKEN_RPL, owner.address(), eth(10)).await;

        tokens
            .transfer(Token::Rpl, recipient, eth(4), &owner)
            .await
            .unwrap();
        tokens
            .approve(Token::Rpl, spender.address(), eth(5), &owner)
            .await
            .unwrap();
        assert_eq!(
            tokens
                .allowance(Token::Rpl, owner.address(), spender.address(), None)
                .await
                .unwrap(),
            eth(5)
        );

        tokens
            .transfer_from(Token::Rpl, owner.address(), recipient, eth(2), &spender)
            .await
            .unwrap();
        assert_eq!(
            tokens
                .balance_of(Token::Rpl, recipient, None)
                .await
                .unwrap(),
            eth(6)
        );
        assert_eq!(
            tokens
                .allowance(Token::Rpl, owner.address(), spender.address(), None)
                .await
                .unwrap(),
            eth(3)
        );

        let err = tokens
            .transfer_from(Token::Rpl, owner.address(), recipient, eth(4), &spender)
            .await
            .unwrap_err();
        assert_eq!(err.revert_reason(), Some("ERC20: insufficient allowance"));
    }

    #[tokio::test]
    async fn test_transfer_above_balance_fails_estimate() {
        let chain = Arc::new(MockChain::new());
        let tokens = TokenContracts::new(chain.clone());
        let owner = Wallet::random();
        chain.mint(ROCKET_TOKEN_RETH, owner.address(), eth(1)).await;

        let gas = tokens
            .estimate_transfer_gas(Token::Reth, Address::repeat_byte(4), eth(1), &owner)
            .await
            .unwrap();
        assert_eq!(gas.safe_gas_limit, gas.estimated_gas * 3 / 2);

        let err = tokens
            .estimate_transfer_gas(Token::Reth, Address::repeat_byte(4), eth(2), &owner)
            .await
            .unwrap_err();
        assert_eq!(
            err.revert_reason(),
            Some("ERC20: transfer amount exceeds balance")
        );
    }

    #[tokio::test]
    async fn test_contract_eth_balance() {
        let chain = Arc::new(MockChain::new());
        let tokens = TokenContracts::new(chain.clone());
        let reth = chain.contract_address(ROCKET_TOKEN_RETH).await.unwrap();
        chain.set_eth_balance(reth, eth(7)).await;

        assert_eq!(
            tokens.contract_eth_balance(Token::Reth, None).await.unwrap(),
            eth(7)
        );
        assert!(matches!(
            tokens.contract_eth_balance(Token::Rpl, None).await,
            Err(ContractError::Config(_))
        ));
    }
}
