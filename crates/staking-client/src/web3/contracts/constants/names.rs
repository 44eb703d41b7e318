//! Registered contract names, as stored in the protocol storage contract.

pub const ROCKET_STORAGE: &str = "rocketStorage";

pub const ROCKET_REWARDS_POOL: &str = "rocketRewardsPool";
pub const ROCKET_CLAIM_NODE: &str = "rocketClaimNode";
pub const ROCKET_CLAIM_TRUSTED_NODE: &str = "rocketClaimTrustedNode";

pub const ROCKET_DAO_PROPOSAL: &str = "rocketDAOProposal";
pub const ROCKET_DAO_NODE_TRUSTED: &str = "rocketDAONodeTrusted";
pub const ROCKET_DAO_NODE_TRUSTED_PROPOSALS: &str = "rocketDAONodeTrustedProposals";
pub const ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS: &str =
    "rocketDAONodeTrustedSettingsProposals";
pub const ROCKET_DAO_PROTOCOL: &str = "rocketDAOProtocol";

pub const ROCKET_TOKEN_RPL: &str = "rocketTokenRPL";
pub const ROCKET_TOKEN_RETH: &str = "rocketTokenRETH";
pub const ROCKET_TOKEN_NETH: &str = "rocketTokenNETH";
