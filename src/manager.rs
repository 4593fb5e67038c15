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
use crate::account::{Account, Ledger};
use crate::error::{LedgerError, Result};
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/**
 * The ledger shared between command handlers and the accrual scheduler.
 *
 * Every mutation and its write-through save happen while holding the lock, so mutations and file
 * writes are serialized.
 */
pub type SharedLedger<S> = Arc<Mutex<AccountManager<S>>>;

/**
 * Owner of the in-memory ledger and its backing store.
 *
 * Every mutating operation saves the whole ledger before returning. If saving fails (after one
 * retry) the mutation is rolled back and `LedgerError::Persistence` is returned, so the in-memory
 * ledger never holds changes that are not on disk.
 */
pub struct AccountManager<S> {
    ledger: Ledger,
    store: S,
}

fn positive(amount: i64) -> Result<u64> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(amount as u64)
}

impl<S: LedgerStore> AccountManager<S> {
    /**
     * Loads the ledger from `store`. A corrupt store is an error, never an empty ledger.
     */
    pub fn open(store: S) -> Result<AccountManager<S>> {
        let ledger = store.load()?;
        tracing::info!(accounts = ledger.len(), "ledger loaded");
        Ok(Self { ledger, store })
    }

    pub fn into_shared(self) -> SharedLedger<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /**
     * Balance of a user; unknown users have 0 and are not added to the ledger.
     */
    pub fn get_balance(&self, user_id: &str) -> u64 {
        self.ledger.get(user_id).map_or(0, Account::balance)
    }

    /**
     * Adds `amount` credits to a user, creating the account if needed. Returns the new balance.
     */
    pub fn credit(&mut self, user_id: &str, amount: i64) -> Result<u64> {
        let amount = positive(amount)?;
        let balance = self.mutate_account(user_id, |account| account.deposit(amount))?;
        tracing::debug!(user = user_id, amount, balance, "credited");
        Ok(balance)
    }

    /**
     * Removes `amount` credits from a user, clamping at zero. Returns the new balance.
     */
    pub fn debit(&mut self, user_id: &str, amount: i64) -> Result<u64> {
        let amount = positive(amount)?;
        let balance = self.mutate_account(user_id, |account| account.withdraw(amount))?;
        tracing::debug!(user = user_id, amount, balance, "debited");
        Ok(balance)
    }

    /**
     * Stamps a daily claim at `now` and credits the bonus. Returns the new balance.
     *
     * The cooldown is not checked here; see `ClaimPolicy::claim`.
     */
    pub fn record_claim(&mut self, user_id: &str, bonus: i64, now: DateTime<Utc>) -> Result<u64> {
        let bonus = positive(bonus)?;
        let balance = self.mutate_account(user_id, |account| {
            account.set_last_daily_claim_at(Some(now));
            account.deposit(bonus);
        })?;
        tracing::debug!(user = user_id, bonus, balance, "daily claim recorded");
        Ok(balance)
    }

    /**
     * Credits `amount` to every user in `members` and stamps their accrual time, saving once for
     * the whole batch. A user listed more than once is credited once. Returns how many accounts
     * were credited.
     *
     * If the save fails the whole batch is rolled back.
     */
    pub fn accrue<I>(&mut self, members: I, amount: i64, now: DateTime<Utc>) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let amount = positive(amount)?;
        let mut seen = HashSet::new();
        let snapshot = self.ledger.clone();

        for user_id in members {
            if !seen.insert(user_id.clone()) {
                continue;
            }
            let account = self.ledger.account_mut(&user_id);
            account.deposit(amount);
            account.set_last_daily_accrual_at(Some(now));
        }
        if seen.is_empty() {
            return Ok(0);
        }

        if let Err(err) = self.persist() {
            self.ledger = snapshot;
            return Err(err);
        }
        Ok(seen.len())
    }

    fn mutate_account<F>(&mut self, user_id: &str, mutation: F) -> Result<u64>
    where
        F: FnOnce(&mut Account),
    {
        let previous = self.ledger.get(user_id).cloned();
        let account = self.ledger.account_mut(user_id);
        mutation(account);
        let balance = account.balance();

        if let Err(err) = self.persist() {
            self.ledger.restore(user_id, previous);
            return Err(err);
        }
        Ok(balance)
    }

    /**
     * Saves the ledger, retrying once.
     */
    fn persist(&self) -> Result<()> {
        match self.store.save(&self.ledger) {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(error = %first, "ledger save failed, retrying once");
                self.store.save(&self.ledger).inspect_err(|err| {
                    tracing::error!(error = %err, "ledger save failed, rolling back the mutation");
                })
            }
        }
    }
}
