pub mod contracts;
pub mod wallet;

pub use contracts::core::builder::{ContractBuilder, StakingContracts};
pub use contracts::core::contract::ChainInvoker;
pub use wallet::{Wallet, WalletProvider};
