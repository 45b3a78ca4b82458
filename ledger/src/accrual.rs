//! Lazy interest accrual and settlement.
//!
//! Interest is simple (linear), not compounding between touches:
//!
//! `factor(a, now)  = P + rate(a) × (now − last_settled_at(a))`
//! `balance(a, now) = principal(a) × factor(a, now) / P`   (truncated)
//!
//! where `P` = [`RATE_SCALE`]. No job ever walks the account table; an account
//! pays for accrual only when it is touched, via [`AccrualEngine::settle`].
//!
//! # Overflow bounds
//!
//! `rate × elapsed` is computed in `u128` and must satisfy
//! `rate × elapsed ≤ u128::MAX − P` (about `3.4e38`); at the default rate of
//! `5e10` that is more than `10^20` years. `principal × factor` is computed in
//! 256 bits and cannot overflow; the final balance must fit in `u128`.
//! Anything beyond these bounds fails with [`LedgerError::ArithmeticOverflow`]
//! instead of wrapping.

use crate::account::AccountState;
use crate::error::LedgerError;
use primitive_types::U256;
use rebase_types::{Timestamp, RATE_SCALE};

/// Result of folding accrued interest into principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Interest materialized by this settlement.
    pub delta: u128,
    /// Principal after settlement.
    pub new_principal: u128,
    pub at: Timestamp,
}

/// Pure accrual arithmetic plus the settlement mutation.
pub struct AccrualEngine;

impl AccrualEngine {
    /// Seconds of accrual owed since the last settlement.
    ///
    /// Zero for an account that was never settled, and zero if `now` is
    /// earlier than the last settlement.
    pub fn elapsed(state: &AccountState, now: Timestamp) -> u64 {
        state
            .last_settled_at
            .map(|at| at.elapsed_since(now))
            .unwrap_or(0)
    }

    /// Compute the growth factor with checked arithmetic.
    pub fn interest_factor_checked(state: &AccountState, now: Timestamp) -> Option<u128> {
        let elapsed = Self::elapsed(state, now);
        let growth = state.personal_rate.raw().checked_mul(elapsed as u128)?;
        RATE_SCALE.checked_add(growth)
    }

    /// Growth factor since the last settlement, in [`RATE_SCALE`] units.
    pub fn interest_factor(state: &AccountState, now: Timestamp) -> Result<u128, LedgerError> {
        Self::interest_factor_checked(state, now).ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Principal plus interest owed at `now`, truncated toward zero.
    pub fn current_balance(state: &AccountState, now: Timestamp) -> Result<u128, LedgerError> {
        if state.principal == 0 {
            return Ok(0);
        }
        let factor = Self::interest_factor(state, now)?;
        let wide = U256::from(state.principal)
            .checked_mul(U256::from(factor))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let balance = wide / U256::from(RATE_SCALE);
        if balance > U256::from(u128::MAX) {
            return Err(LedgerError::ArithmeticOverflow);
        }
        Ok(balance.low_u128())
    }

    /// Fold interest owed at `now` into principal and advance the settlement
    /// timestamp.
    ///
    /// Afterwards `current_balance(state, now) == principal`, so a second call
    /// at the same `now` is a no-op. On error `state` is left untouched.
    pub fn settle(state: &mut AccountState, now: Timestamp) -> Result<Settlement, LedgerError> {
        let balance = Self::current_balance(state, now)?;
        // factor >= P, so the balance never drops below principal.
        let delta = balance.saturating_sub(state.principal);
        state.principal = balance;
        // A clock stepping backwards must not reopen an already-accrued window.
        state.last_settled_at = Some(match state.last_settled_at {
            Some(prev) if prev > now => prev,
            _ => now,
        });
        Ok(Settlement {
            delta,
            new_principal: balance,
            at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebase_types::Rate;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn funded(principal: u128, rate: u128, settled_at: u64) -> AccountState {
        AccountState {
            principal,
            personal_rate: Rate::new(rate),
            last_settled_at: Some(ts(settled_at)),
        }
    }

    #[test]
    fn never_settled_account_has_unit_factor() {
        let state = AccountState {
            principal: 0,
            personal_rate: Rate::new(5),
            last_settled_at: None,
        };
        assert_eq!(AccrualEngine::interest_factor(&state, ts(1_000)).unwrap(), RATE_SCALE);
    }

    #[test]
    fn factor_grows_linearly() {
        let state = funded(100, 50_000_000_000, 0);
        let factor = AccrualEngine::interest_factor(&state, ts(1_000)).unwrap();
        assert_eq!(factor, RATE_SCALE + 50_000_000_000 * 1_000);
    }

    #[test]
    fn balance_truncates_toward_zero() {
        // 100 * (1e18 + 5e13) / 1e18 = 100.005 -> 100
        let state = funded(100, 50_000_000_000, 0);
        assert_eq!(AccrualEngine::current_balance(&state, ts(1_000)).unwrap(), 100);

        // 10% per 1000s on 1e18 units: exactly 1.1e18
        let state = funded(RATE_SCALE, 100_000_000_000_000, 0);
        assert_eq!(
            AccrualEngine::current_balance(&state, ts(1_000)).unwrap(),
            1_100_000_000_000_000_000
        );

        // 3 * 1.5 = 4.5 -> 4
        let state = funded(3, RATE_SCALE / 2, 0);
        assert_eq!(AccrualEngine::current_balance(&state, ts(1)).unwrap(), 4);
    }

    #[test]
    fn large_principal_uses_wide_arithmetic() {
        // principal * factor exceeds u128 even though the result fits.
        let principal = u128::MAX / 4;
        let state = funded(principal, RATE_SCALE, 0);
        assert_eq!(AccrualEngine::current_balance(&state, ts(1)).unwrap(), principal * 2);
    }

    #[test]
    fn result_wider_than_u128_is_overflow() {
        let state = funded(u128::MAX / 2, RATE_SCALE, 0);
        assert!(matches!(
            AccrualEngine::current_balance(&state, ts(2)),
            Err(LedgerError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn rate_times_elapsed_overflow_is_reported() {
        let state = funded(1, u128::MAX, 0);
        assert!(matches!(
            AccrualEngine::interest_factor(&state, ts(2)),
            Err(LedgerError::ArithmeticOverflow)
        ));
        assert!(AccrualEngine::interest_factor_checked(&state, ts(2)).is_none());
    }

    #[test]
    fn settle_materializes_delta_and_is_idempotent() {
        let mut state = funded(RATE_SCALE, 1_000_000_000, 0);
        let first = AccrualEngine::settle(&mut state, ts(500)).unwrap();
        assert_eq!(first.delta, 500_000_000_000);
        assert_eq!(first.new_principal, RATE_SCALE + 500_000_000_000);
        assert_eq!(state.last_settled_at(), Some(ts(500)));
        assert_eq!(
            AccrualEngine::current_balance(&state, ts(500)).unwrap(),
            state.principal()
        );

        let second = AccrualEngine::settle(&mut state, ts(500)).unwrap();
        assert_eq!(second.delta, 0);
        assert_eq!(second.new_principal, first.new_principal);
    }

    #[test]
    fn settle_on_error_leaves_state_untouched() {
        let mut state = funded(1, u128::MAX, 0);
        let before = state.clone();
        assert!(AccrualEngine::settle(&mut state, ts(10)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn settle_ignores_backwards_clock() {
        let mut state = funded(1_000, RATE_SCALE / 1_000, 100);
        let s = AccrualEngine::settle(&mut state, ts(50)).unwrap();
        assert_eq!(s.delta, 0);
        assert_eq!(state.last_settled_at(), Some(ts(100)));
    }

    #[test]
    fn zero_principal_settles_to_zero() {
        let mut state = AccountState::default();
        let s = AccrualEngine::settle(&mut state, ts(42)).unwrap();
        assert_eq!(s.delta, 0);
        assert_eq!(state.principal(), 0);
        assert_eq!(state.last_settled_at(), Some(ts(42)));
    }
}
