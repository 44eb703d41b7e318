pub mod proposal;
pub mod rewards;
pub mod tokens;
