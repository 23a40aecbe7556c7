//! Share target arithmetic.
//!
//! A target is the largest hash a share may have. Difficulty is how many times harder a target
//! is than the difficulty 1 target (`0xFFFF << 208`), so the two are inversely related.
use core::{convert::TryFrom, fmt};
use primitive_types::{U256, U512};

/// Fixed point scale used to divide a 256 bit target by a float factor.
const FACTOR_SCALE: u128 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(U256);

impl Target {
    /// Target of a difficulty 1 share.
    pub fn diff_1_target() -> Self {
        Self(U256::from(0xFFFF_u64) << 208)
    }

    pub fn max_value() -> Self {
        Self(U256::MAX)
    }

    /// Target for shares of difficulty `difficulty`, difficulty 0 is treated as 1.
    pub fn from_difficulty(difficulty: u64) -> Self {
        Self(Self::diff_1_target().0 / U256::from(difficulty.max(1)))
    }

    /// Integer difficulty of a share meeting this target, saturating at `u64::MAX`.
    pub fn to_difficulty(&self) -> u64 {
        if self.0.is_zero() {
            return u64::MAX;
        }
        let difficulty = Self::diff_1_target().0 / self.0;
        if difficulty > U256::from(u64::MAX) {
            u64::MAX
        } else {
            difficulty.low_u64()
        }
    }

    /// Divides the target by `factor`: a factor above 1 always yields a strictly smaller
    /// (harder) target and a factor below 1 a strictly larger one, up to the difficulty 1
    /// target. Non positive or non finite factors leave the target unchanged.
    pub fn div_by_factor(&self, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 || factor == 1.0 {
            return *self;
        }
        let diff_1 = Self::diff_1_target();
        let mut scaled = (factor * FACTOR_SCALE as f64).round().max(1.0) as u128;
        // keep the direction of the factor after rounding
        if factor > 1.0 && scaled <= FACTOR_SCALE {
            scaled = FACTOR_SCALE + 1;
        } else if factor < 1.0 && scaled >= FACTOR_SCALE {
            scaled = FACTOR_SCALE - 1;
        }
        let numerator = self.0.full_mul(U256::from(FACTOR_SCALE));
        let quotient = numerator / U512::from(scaled);
        let mut new = U256::try_from(quotient).unwrap_or(U256::MAX);

        if factor > 1.0 && new >= self.0 && !self.0.is_zero() {
            new = self.0 - 1;
        } else if factor < 1.0 && new <= self.0 && self.0 < U256::MAX {
            new = self.0 + 1;
        }
        if new > diff_1.0 && factor < 1.0 {
            return std::cmp::max(*self, diff_1);
        }
        Self(new)
    }
}

impl From<U256> for Target {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl From<Target> for U256 {
    fn from(v: Target) -> Self {
        v.0
    }
}

impl From<binary_sv2::U256> for Target {
    fn from(v: binary_sv2::U256) -> Self {
        Self(U256::from_little_endian(v.inner_as_ref()))
    }
}

impl From<Target> for binary_sv2::U256 {
    fn from(v: Target) -> Self {
        v.0.to_little_endian().into()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}
