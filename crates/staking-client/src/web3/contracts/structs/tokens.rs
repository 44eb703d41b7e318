use std::fmt;

use alloy::primitives::U256;
use serde::Serialize;

use crate::web3::contracts::constants::names::{
    ROCKET_TOKEN_NETH, ROCKET_TOKEN_RETH, ROCKET_TOKEN_RPL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Rpl,
    Reth,
    Neth,
}

impl Token {
    pub const ALL: [Token; 3] = [Token::Rpl, Token::Reth, Token::Neth];

    pub fn contract_name(&self) -> &'static str {
        match self {
            Token::Rpl => ROCKET_TOKEN_RPL,
            Token::Reth => ROCKET_TOKEN_RETH,
            Token::Neth => ROCKET_TOKEN_NETH,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Rpl => "RPL",
            Token::Reth => "rETH",
            Token::Neth => "nETH",
        }
    }

    /// Tokens backed by ETH held in the token contract itself.
    pub fn holds_eth(&self) -> bool {
        matches!(self, Token::Reth | Token::Neth)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rpl" => Ok(Token::Rpl),
            "reth" => Ok(Token::Reth),
            "neth" => Ok(Token::Neth),
            other => Err(format!("unknown token: {other}")),
        }
    }
}

/// Token balances of an address, in wei.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub eth: U256,
    pub neth: U256,
    pub reth: U256,
    pub rpl: U256,
}
