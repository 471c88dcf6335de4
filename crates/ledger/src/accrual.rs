//! Interest accrual multipliers
//!
//! Two independent, monotone multipliers:
//! - the debt multiplier converts debt shares into owed stable units
//! - the LP multiplier converts LP shares into claimable pool units
//!
//! Both use simple interest per interval (`acc * (1 + apr * dt / year)`),
//! so no per-second compounding loop is needed. Compounding happens across
//! intervals because every refresh folds the interval into the stored value.

use lendpool_core::math::{self, MathError, PRECISION_BASE, SCALE, SECONDS_PER_YEAR};
use serde::{Deserialize, Serialize};

/// Snapshot of both multipliers after an accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrued {
    pub debt_multiplier: u128,
    pub lp_multiplier: u128,
}

/// Lazily computed accrual multipliers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualClock {
    acc_debt_per_share: u128,
    last_debt_update: u64,
    acc_lp_per_share: u128,
    last_lp_update: u64,
}

impl AccrualClock {
    /// Both multipliers start at 1.0 (`SCALE`)
    pub fn new(start: u64) -> Self {
        Self {
            acc_debt_per_share: SCALE,
            last_debt_update: start,
            acc_lp_per_share: SCALE,
            last_lp_update: start,
        }
    }

    pub fn acc_debt_per_share(&self) -> u128 {
        self.acc_debt_per_share
    }

    pub fn acc_lp_per_share(&self) -> u128 {
        self.acc_lp_per_share
    }

    pub fn last_debt_update(&self) -> u64 {
        self.last_debt_update
    }

    pub fn last_lp_update(&self) -> u64 {
        self.last_lp_update
    }

    pub fn is_debt_fresh(&self, now: u64) -> bool {
        self.last_debt_update >= now
    }

    pub fn is_lp_fresh(&self, now: u64) -> bool {
        self.last_lp_update >= now
    }

    /// Debt multiplier at `now` without touching state
    pub fn current_debt_multiplier(&self, now: u64, apr: u128) -> Result<u128, MathError> {
        let elapsed = now.saturating_sub(self.last_debt_update) as u128;
        if elapsed == 0 || apr == 0 {
            return Ok(self.acc_debt_per_share);
        }

        let growth = math::mul_div_floor(
            math::mul(self.acc_debt_per_share, apr)?,
            elapsed,
            PRECISION_BASE * SECONDS_PER_YEAR,
        )?;
        math::add(self.acc_debt_per_share, growth)
    }

    /// Persist the debt multiplier at `now`
    pub fn refresh_debt_multiplier(&mut self, now: u64, apr: u128) -> Result<u128, MathError> {
        let multiplier = self.current_debt_multiplier(now, apr)?;
        self.acc_debt_per_share = multiplier;
        self.last_debt_update = self.last_debt_update.max(now);
        Ok(multiplier)
    }

    /// LP multiplier at `now` without touching state.
    ///
    /// The interval's interest is the total debt, valued at the debt
    /// multiplier stored at the start of the interval, times the period
    /// rate. When both series are refreshed together this equals the growth
    /// of the debt multiplier over the same interval, so LPs are credited
    /// exactly what borrowers owe. With no LP shares outstanding nothing is
    /// distributed.
    pub fn current_lp_multiplier(
        &self,
        now: u64,
        apr: u128,
        total_debt_shares: u128,
        total_lp_shares: u128,
    ) -> Result<u128, MathError> {
        let elapsed = now.saturating_sub(self.last_lp_update) as u128;
        if elapsed == 0 || apr == 0 || total_debt_shares == 0 || total_lp_shares == 0 {
            return Ok(self.acc_lp_per_share);
        }

        let total_debt = math::mul_div_floor(total_debt_shares, self.acc_debt_per_share, SCALE)?;
        let interest = math::mul_div_floor(
            math::mul(total_debt, apr)?,
            elapsed,
            PRECISION_BASE * SECONDS_PER_YEAR,
        )?;
        let per_share = math::mul_div_floor(interest, SCALE, total_lp_shares)?;
        math::add(self.acc_lp_per_share, per_share)
    }

    /// Persist the LP multiplier at `now`
    pub fn refresh_lp_multiplier(
        &mut self,
        now: u64,
        apr: u128,
        total_debt_shares: u128,
        total_lp_shares: u128,
    ) -> Result<u128, MathError> {
        let multiplier = self.current_lp_multiplier(now, apr, total_debt_shares, total_lp_shares)?;
        self.acc_lp_per_share = multiplier;
        self.last_lp_update = self.last_lp_update.max(now);
        Ok(multiplier)
    }

    /// Refresh both series together.
    ///
    /// LP first: it reads the debt multiplier stored at the start of the
    /// interval, which the debt refresh then replaces. Both must run under
    /// the apr that was in force during the elapsed interval.
    pub fn accrue(
        &mut self,
        now: u64,
        apr: u128,
        total_debt_shares: u128,
        total_lp_shares: u128,
    ) -> Result<Accrued, MathError> {
        // Compute both before storing either so a failure leaves no trace.
        let lp_multiplier =
            self.current_lp_multiplier(now, apr, total_debt_shares, total_lp_shares)?;
        let debt_multiplier = self.current_debt_multiplier(now, apr)?;

        self.acc_lp_per_share = lp_multiplier;
        self.last_lp_update = self.last_lp_update.max(now);
        self.acc_debt_per_share = debt_multiplier;
        self.last_debt_update = self.last_debt_update.max(now);

        tracing::debug!(
            now,
            apr,
            debt_multiplier,
            lp_multiplier,
            "Accrual multipliers refreshed"
        );

        Ok(Accrued {
            debt_multiplier,
            lp_multiplier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: u64 = SECONDS_PER_YEAR as u64;

    #[test]
    fn test_new_clock_starts_at_one() {
        let clock = AccrualClock::new(100);
        assert_eq!(clock.acc_debt_per_share(), SCALE);
        assert_eq!(clock.acc_lp_per_share(), SCALE);
        assert!(clock.is_debt_fresh(100));
        assert!(!clock.is_debt_fresh(101));
    }

    #[test]
    fn test_one_year_at_five_percent() {
        let clock = AccrualClock::new(0);
        let multiplier = clock.current_debt_multiplier(YEAR, 500).unwrap();
        assert_eq!(multiplier, SCALE + SCALE / 20);
    }

    #[test]
    fn test_current_does_not_mutate() {
        let clock = AccrualClock::new(0);
        let _ = clock.current_debt_multiplier(YEAR, 500).unwrap();
        assert_eq!(clock.acc_debt_per_share(), SCALE);
        assert_eq!(clock.last_debt_update(), 0);
    }

    #[test]
    fn test_refresh_persists_and_compounds_across_intervals() {
        let mut clock = AccrualClock::new(0);
        clock.refresh_debt_multiplier(YEAR / 2, 1000).unwrap();
        clock.refresh_debt_multiplier(YEAR, 1000).unwrap();

        // 1.05 * 1.05 = 1.1025 > 1.10 simple
        assert_eq!(clock.acc_debt_per_share(), 1_102_500_000_000_000_000);
        assert_eq!(clock.last_debt_update(), YEAR);
    }

    #[test]
    fn test_zero_apr_or_zero_elapsed_is_identity() {
        let clock = AccrualClock::new(10);
        assert_eq!(clock.current_debt_multiplier(10, 500).unwrap(), SCALE);
        assert_eq!(clock.current_debt_multiplier(1_000, 0).unwrap(), SCALE);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut clock = AccrualClock::new(1_000);
        assert_eq!(clock.refresh_debt_multiplier(500, 500).unwrap(), SCALE);
        assert_eq!(clock.last_debt_update(), 1_000);
    }

    #[test]
    fn test_lp_multiplier_distributes_interest() {
        let clock = AccrualClock::new(0);
        // 1000 units borrowed against 2000 LP shares at 10% for one year:
        // interest 100, per share 0.05
        let lp = clock.current_lp_multiplier(YEAR, 1000, 1000, 2000).unwrap();
        assert_eq!(lp, SCALE + 50_000_000_000_000_000);
    }

    #[test]
    fn test_lp_interest_matches_debt_growth() {
        let mut clock = AccrualClock::new(0);
        let shares = 10_000;
        let before = clock.acc_debt_per_share();
        let accrued = clock.accrue(YEAR / 4, 800, shares, shares).unwrap();

        let owed = shares * (accrued.debt_multiplier - before) / SCALE;
        let credited = shares * (accrued.lp_multiplier - SCALE) / SCALE;
        assert_eq!(owed, credited);
    }

    #[test]
    fn test_lp_multiplier_skips_without_supply() {
        let mut clock = AccrualClock::new(0);
        let lp = clock.refresh_lp_multiplier(YEAR, 1000, 1000, 0).unwrap();
        assert_eq!(lp, SCALE);
        // time still advances so the interval is not re-distributed later
        assert_eq!(clock.last_lp_update(), YEAR);
    }

    #[test]
    fn test_accrue_refreshes_both_series() {
        let mut clock = AccrualClock::new(0);
        let accrued = clock.accrue(YEAR, 500, 1000, 1000).unwrap();

        assert_eq!(accrued.debt_multiplier, clock.acc_debt_per_share());
        assert_eq!(accrued.lp_multiplier, clock.acc_lp_per_share());
        assert!(clock.is_debt_fresh(YEAR));
        assert!(clock.is_lp_fresh(YEAR));
        assert!(accrued.lp_multiplier > SCALE);
    }

    #[test]
    fn test_accrue_overflow_leaves_state_untouched() {
        let mut clock = AccrualClock::new(0);
        let before = clock.clone();
        assert!(clock.accrue(YEAR, 500, u128::MAX / 2, 1).is_err());
        assert_eq!(clock, before);
    }
}
