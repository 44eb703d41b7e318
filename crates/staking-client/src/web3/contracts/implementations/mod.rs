pub mod dao_proposals;
pub mod dao_protocol;
pub mod dao_settings;
pub mod proposal_driver;
pub mod rewards_pool;
pub mod tokens;
