/*
 *  Heistbot - Discord bot keeping a heist credit ledger for Discord servers.
 *  Copyright (C) 2025  Manuel de Castro <manuel@infor.uva.es>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use crate::account::Ledger;
use crate::error::{LedgerError, Result};
use crate::manager::AccountManager;
use crate::store::LedgerStore;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use std::ops::RangeInclusive;

/**
 * Whether a user may claim the daily bonus right now.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimStatus {
    Claimable,
    /// Carries the remaining wait, always in `(0, cooldown]`.
    OnCooldown(TimeDelta),
}

/**
 * Outcome of a successful claim.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claimed {
    pub bonus: u64,
    pub balance: u64,
}

/**
 * Cooldown gate and bonus draw of the daily claim.
 */
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct ClaimPolicy {
    bonus: RangeInclusive<u64>,
    cooldown: TimeDelta,
}

impl ClaimPolicy {
    pub fn new(bonus: RangeInclusive<u64>) -> ClaimPolicy {
        Self {
            bonus,
            cooldown: TimeDelta::hours(24),
        }
    }

    pub fn bonus_range(&self) -> &RangeInclusive<u64> {
        &self.bonus
    }

    /**
     * Reports the claim status of a user at `now`. Never mutates anything.
     *
     * A stored claim time in the future (the clock went backwards) caps the wait at one full
     * cooldown.
     */
    pub fn check(&self, ledger: &Ledger, user_id: &str, now: DateTime<Utc>) -> ClaimStatus {
        let Some(last_claim) = ledger
            .get(user_id)
            .and_then(|account| account.last_daily_claim_at())
        else {
            return ClaimStatus::Claimable;
        };

        let elapsed = now - last_claim;
        if elapsed >= self.cooldown {
            ClaimStatus::Claimable
        } else {
            ClaimStatus::OnCooldown((self.cooldown - elapsed).min(self.cooldown))
        }
    }

    /**
     * Claims the daily bonus for a user: fails with `LedgerError::Cooldown` if the last claim was
     * less than a cooldown ago, otherwise draws the bonus from `rng` and records the claim.
     */
    pub fn claim<S, R>(
        &self,
        manager: &mut AccountManager<S>,
        user_id: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Claimed>
    where
        S: LedgerStore,
        R: Rng,
    {
        if let ClaimStatus::OnCooldown(remaining) = self.check(manager.ledger(), user_id, now) {
            return Err(LedgerError::Cooldown(remaining));
        }

        let bonus = rng.gen_range(self.bonus.clone());
        let balance = manager.record_claim(user_id, bonus as i64, now)?;
        tracing::info!(user = user_id, bonus, balance, "daily bonus claimed");
        Ok(Claimed { bonus, balance })
    }
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self::new(3..=8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::memory_manager;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_unknown_user_is_claimable() {
        let manager = memory_manager();
        let policy = ClaimPolicy::default();

        assert_eq!(
            policy.check(manager.ledger(), "7", noon()),
            ClaimStatus::Claimable
        );
    }

    #[test]
    fn test_claim_twice_hits_cooldown() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);

        let claimed = policy.claim(&mut manager, "7", noon(), &mut rng).unwrap();
        assert!((3..=8).contains(&claimed.bonus));
        assert_eq!(claimed.balance, claimed.bonus);

        let err = policy
            .claim(&mut manager, "7", noon(), &mut rng)
            .unwrap_err();
        match err {
            LedgerError::Cooldown(remaining) => {
                assert!(remaining > TimeDelta::zero());
                assert!(remaining <= TimeDelta::hours(24));
                assert_eq!(remaining, TimeDelta::hours(24));
            }
            other => panic!("expected a cooldown error, got {other:?}"),
        }
        // The failed claim did not change anything.
        assert_eq!(manager.get_balance("7"), claimed.bonus);
    }

    #[test]
    fn test_remaining_shrinks_with_time() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::default();
        policy
            .claim(&mut manager, "7", noon(), &mut StepRng::new(0, 1))
            .unwrap();

        let later = noon() + TimeDelta::hours(20) + TimeDelta::minutes(30);
        assert_eq!(
            policy.check(manager.ledger(), "7", later),
            ClaimStatus::OnCooldown(TimeDelta::hours(3) + TimeDelta::minutes(30))
        );
    }

    #[test]
    fn test_claimable_after_exactly_a_day() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);
        policy.claim(&mut manager, "7", noon(), &mut rng).unwrap();

        let next_day = noon() + TimeDelta::hours(24);
        assert_eq!(
            policy.check(manager.ledger(), "7", next_day - TimeDelta::seconds(1)),
            ClaimStatus::OnCooldown(TimeDelta::seconds(1))
        );
        assert_eq!(
            policy.check(manager.ledger(), "7", next_day),
            ClaimStatus::Claimable
        );
        assert!(policy.claim(&mut manager, "7", next_day, &mut rng).is_ok());
    }

    #[test]
    fn test_clock_going_backwards_caps_wait() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::default();
        policy
            .claim(&mut manager, "7", noon(), &mut StepRng::new(0, 1))
            .unwrap();

        let earlier = noon() - TimeDelta::hours(2);
        assert_eq!(
            policy.check(manager.ledger(), "7", earlier),
            ClaimStatus::OnCooldown(TimeDelta::hours(24))
        );
    }

    #[test]
    fn test_accrual_does_not_gate_claims() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::default();
        manager.accrue(vec!["7".to_string()], 5, noon()).unwrap();

        assert_eq!(
            policy.check(manager.ledger(), "7", noon()),
            ClaimStatus::Claimable
        );
    }

    #[test]
    fn test_bonus_stays_in_range() {
        let policy = ClaimPolicy::new(3..=8);
        let mut rng = StdRng::seed_from_u64(99);

        for day in 0..50 {
            let mut manager = memory_manager();
            let now = noon() + TimeDelta::days(day);
            let claimed = policy.claim(&mut manager, "1", now, &mut rng).unwrap();
            assert!(policy.bonus_range().contains(&claimed.bonus));
        }
    }

    #[test]
    fn test_fixed_range_is_deterministic() {
        let mut manager = memory_manager();
        let policy = ClaimPolicy::new(4..=4);

        let claimed = policy
            .claim(&mut manager, "1", noon(), &mut StepRng::new(0, 1))
            .unwrap();
        assert_eq!(claimed, Claimed { bonus: 4, balance: 4 });
    }
}
