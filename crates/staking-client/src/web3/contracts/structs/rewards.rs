use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::web3::contracts::helpers::fixed_point::Ratio;

/// Current reward distribution window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardInterval {
    /// Unix seconds.
    pub start: u64,
    pub duration: Duration,
}

impl RewardInterval {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.duration.as_secs())
    }

    /// First interval boundary strictly after `now`.
    ///
    /// Intervals only move when the chain advances them, so once `now` is
    /// past `end()` the next distribution is the next whole multiple of the
    /// duration.
    pub fn next_boundary_after(&self, now: u64) -> u64 {
        let secs = self.duration.as_secs().max(1);
        if now < self.end() {
            return self.end();
        }
        let elapsed = now - self.start;
        self.start + (elapsed / secs + 1) * secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalStatus {
    pub interval: RewardInterval,
    pub current_time: u64,
    pub next_interval_at: u64,
    pub seconds_until_next: u64,
}

impl IntervalStatus {
    pub fn at(interval: RewardInterval, now: u64) -> Self {
        let next_interval_at = interval.next_boundary_after(now);
        Self {
            interval,
            current_time: now,
            next_interval_at,
            seconds_until_next: next_interval_at.saturating_sub(now),
        }
    }
}

/// Share of a claimant category's rewards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimsContractConfig {
    pub name: String,
    pub enabled: bool,
    pub global_percent: Ratio,
}

/// What a claimer is owed in the current interval.
///
/// `amount_eligible` is authoritative: it is zero whenever nothing can be
/// claimed right now, even if `percent_eligible` is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimerShare {
    pub claimer: Address,
    pub claim_possible: bool,
    pub percent_eligible: Ratio,
    pub amount_eligible: U256,
}

impl ClaimerShare {
    pub fn has_claimable(&self) -> bool {
        self.amount_eligible > U256::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_boundary() {
        let interval = RewardInterval {
            start: 1_000,
            duration: Duration::from_secs(100),
        };
        assert_eq!(interval.end(), 1_100);
        assert_eq!(interval.next_boundary_after(1_000), 1_100);
        assert_eq!(interval.next_boundary_after(1_099), 1_100);
        // chain has not rolled the interval over yet
        assert_eq!(interval.next_boundary_after(1_100), 1_200);
        assert_eq!(interval.next_boundary_after(1_350), 1_400);

        let status = IntervalStatus::at(interval, 1_040);
        assert_eq!(status.next_interval_at, 1_100);
        assert_eq!(status.seconds_until_next, 60);
    }
}
