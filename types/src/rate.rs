//! Fixed-point interest rates.
//!
//! Rates are stored as integers scaled by [`RATE_SCALE`], so "1.0" is exactly
//! `RATE_SCALE` and all accrual arithmetic stays deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed-point denominator (`P`): `10^18` represents 1.0.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Proportional growth per second, scaled by [`RATE_SCALE`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rate(u128);

impl Rate {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s (scale 1e18)", self.0)
    }
}

impl From<u128> for Rate {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}
