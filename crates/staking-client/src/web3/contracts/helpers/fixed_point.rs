//! 10^18 fixed-point arithmetic at the contract boundary.
//!
//! Every conversion here truncates toward zero. A claimer's share must never
//! be reported larger than what the chain holds.

use std::fmt;

use alloy::primitives::{U256, U512};
use serde::Serialize;

/// 10^18, the scale of on-chain percentages and of wei per ether.
pub const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
const SCALE_F64: f64 = 1e18;

fn widen(value: U256) -> U512 {
    U512::from_be_slice(&value.to_be_bytes::<32>())
}

fn narrow(value: U512) -> Option<U256> {
    let bytes = value.to_be_bytes::<64>();
    if bytes[..32].iter().any(|byte| *byte != 0) {
        return None;
    }
    Some(U256::from_be_slice(&bytes[32..]))
}

/// Largest integer not above `value`, exact for every finite float.
fn floor_to_u256(value: f64) -> Option<U256> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value < 1.0 {
        return Some(U256::ZERO);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    if exponent >= 0 {
        if exponent + 53 > 256 {
            return None;
        }
        Some(U256::from(mantissa) << (exponent as usize))
    } else {
        Some(U256::from(mantissa >> ((-exponent) as u32)))
    }
}

/// Float not above `value`: keeps the top 53 bits, drops the rest.
fn truncate_to_f64(value: U256) -> f64 {
    let bits = value.bit_len();
    if bits <= 53 {
        return value.to::<u64>() as f64;
    }
    let shift = bits - 53;
    let mantissa = (value >> shift).to::<u64>();
    mantissa as f64 * 2f64.powi(shift as i32)
}

/// Converts an ether-denominated float to wei, truncating.
///
/// Negative, non-finite or out-of-range input yields `None`.
pub fn ether_to_wei(value: f64) -> Option<U256> {
    floor_to_u256(value * SCALE_F64)
}

/// Converts wei to an ether-denominated float.
///
/// The result always maps back (through [`ether_to_wei`]) to at most
/// `value`. Near `U256::MAX` the nearest float can overflow the round trip;
/// it is then stepped down one ulp at a time until it fits.
pub fn wei_to_ether(value: U256) -> f64 {
    let whole = truncate_to_f64(value / SCALE);
    let frac = (value % SCALE).to::<u64>() as f64 / SCALE_F64;
    let mut result = whole + frac;
    while result > 0.0 && !ether_to_wei(result).is_some_and(|wei| wei <= value) {
        result = f64::from_bits(result.to_bits() - 1);
    }
    result
}

/// `floor(amount * numerator / denominator)` in 512-bit arithmetic.
pub fn mul_div_floor(amount: U256, numerator: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    narrow(widen(amount) * widen(numerator) / widen(denominator))
}

/// Amount owed to a claimer: `floor(pool * category * claimer)`.
///
/// Both percentages are applied before the single truncation, so the
/// result is the exact floor of the product.
pub fn claim_amount(pool: U256, category: Ratio, claimer: Ratio) -> Option<U256> {
    let product = widen(pool) * widen(category.raw()) * widen(claimer.raw());
    narrow(product / (widen(SCALE) * widen(SCALE)))
}

/// Fraction stored on chain as an integer scaled by 10^18.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ratio(U256);

impl Ratio {
    pub const ZERO: Ratio = Ratio(U256::ZERO);
    pub const ONE: Ratio = Ratio(SCALE);

    pub const fn from_raw(raw: U256) -> Self {
        Ratio(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Truncating conversion from a float fraction.
    pub fn from_f64(value: f64) -> Option<Self> {
        ether_to_wei(value).map(Ratio)
    }

    pub fn as_f64(&self) -> f64 {
        wei_to_ether(self.0)
    }

    /// Whether the value lies in `[0, 1]`.
    pub fn is_fraction(&self) -> bool {
        self.0 <= SCALE
    }

    pub fn checked_add(self, other: Ratio) -> Option<Ratio> {
        self.0.checked_add(other.0).map(Ratio)
    }

    /// `floor(amount * self)`.
    pub fn apply(&self, amount: U256) -> Option<U256> {
        mul_div_floor(amount, self.0, SCALE)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = (self.0 % SCALE).to::<u64>();
        let digits = format!("{frac:018}");
        let digits = digits.trim_end_matches('0');
        if digits.is_empty() {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.{digits}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth(value: u64) -> U256 {
        U256::from(value) * SCALE
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(Ratio::from_f64(0.0), Some(Ratio::ZERO));
        assert_eq!(Ratio::from_f64(1.0), Some(Ratio::ONE));
        assert_eq!(Ratio::ZERO.as_f64(), 0.0);
        assert_eq!(Ratio::ONE.as_f64(), 1.0);
        assert!(Ratio::ONE.is_fraction());
        assert!(!Ratio::from_raw(SCALE + U256::from(1)).is_fraction());

        assert_eq!(Ratio::from_f64(-0.1), None);
        assert_eq!(Ratio::from_f64(f64::NAN), None);
        assert_eq!(Ratio::from_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_from_f64_truncates() {
        assert_eq!(
            Ratio::from_f64(0.05).unwrap().raw(),
            U256::from(50_000_000_000_000_000u64)
        );
        // 1e-19 is below one unit of the scale.
        assert_eq!(Ratio::from_f64(1e-19), Some(Ratio::ZERO));
        assert_eq!(ether_to_wei(1.5), Some(U256::from(1_500_000_000_000_000_000u64)));
    }

    #[test]
    fn test_as_f64_never_overstates() {
        let samples = [
            U256::from(1),
            U256::from(333_333_333_333_333_333u64),
            U256::from(999_999_999_999_999_999u64),
            eth(24_000) + U256::from(7),
            U256::MAX,
            U256::MAX - SCALE,
        ];
        for raw in samples {
            let value = wei_to_ether(raw);
            assert!(value > 0.0);
            let back = ether_to_wei(value).unwrap();
            assert!(back <= raw, "{raw} -> {value} -> {back}");
        }
    }

    #[test]
    fn test_floor_near_overflow() {
        assert_eq!(floor_to_u256(2f64.powi(255)), Some(U256::from(1) << 255));
        assert_eq!(floor_to_u256(2f64.powi(256)), None);
        assert_eq!(floor_to_u256(12.9), Some(U256::from(12)));
        assert_eq!(truncate_to_f64(U256::MAX), 2f64.powi(256) - 2f64.powi(203));
    }

    #[test]
    fn test_claim_amount_truncates() {
        let category = Ratio::from_raw(U256::from(100_000_000_000_000_000u64)); // 0.10
        let claimer = Ratio::from_raw(U256::from(50_000_000_000_000_000u64)); // 0.05

        assert_eq!(claim_amount(eth(1000), category, claimer), Some(eth(5)));
        // 0.005 * 999 = 4.995, not rounded up
        assert_eq!(claim_amount(U256::from(999), category, claimer), Some(U256::from(4)));
        assert_eq!(claim_amount(U256::from(199), category, claimer), Some(U256::ZERO));
        assert_eq!(claim_amount(U256::MAX, Ratio::ONE, Ratio::ONE), Some(U256::MAX));
        assert_eq!(
            claim_amount(U256::MAX, Ratio::from_raw(SCALE * U256::from(2)), Ratio::ONE),
            None
        );
    }

    #[test]
    fn test_apply_and_mul_div() {
        let half = Ratio::from_raw(SCALE / U256::from(2));
        assert_eq!(half.apply(U256::from(7)), Some(U256::from(3)));
        assert_eq!(Ratio::ONE.apply(U256::MAX), Some(U256::MAX));
        assert_eq!(mul_div_floor(U256::MAX, U256::MAX, U256::MAX), Some(U256::MAX));
        assert_eq!(mul_div_floor(U256::from(1), U256::from(1), U256::ZERO), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ratio::ONE.to_string(), "1");
        assert_eq!(Ratio::from_raw(U256::from(50_000_000_000_000_000u64)).to_string(), "0.05");
        assert_eq!(Ratio::from_raw(U256::from(1)).to_string(), "0.000000000000000001");
    }
}
