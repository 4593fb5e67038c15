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
use chrono::{DateTime, Utc};
use getset::{CopyGetters, Setters};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Largest balance an account can hold. Balances stay within `i64` so every tool reading the ledger
/// file (and the slash command integer options) can represent them.
pub const MAX_BALANCE: u64 = i64::MAX as u64;

/**
 * Credit account of a single user.
 *
 * The balance never goes below zero. The two timestamps are independent: accrual only stamps
 * `last_daily_accrual_at`, and only the daily claim cooldown reads `last_daily_claim_at`.
 */
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, CopyGetters, Setters)]
pub struct Account {
    #[getset(get_copy = "pub")]
    #[serde(default, deserialize_with = "clamped_balance")]
    balance: u64,
    /// Last time the scheduled role accrual credited this account (informational only).
    #[getset(get_copy = "pub", set = "pub(crate)")]
    #[serde(default, alias = "last_daily", with = "timestamp")]
    last_daily_accrual_at: Option<DateTime<Utc>>,
    /// Last successful manual daily claim. Gates the claim cooldown.
    #[getset(get_copy = "pub", set = "pub(crate)")]
    #[serde(default, alias = "last_daily_claim", with = "timestamp")]
    last_daily_claim_at: Option<DateTime<Utc>>,
}

impl Account {
    /**
     * Adds `amount`, stopping at `MAX_BALANCE`.
     */
    pub(crate) fn deposit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount).min(MAX_BALANCE);
    }

    /**
     * Subtracts `amount`, stopping at zero instead of going negative.
     */
    pub(crate) fn withdraw(&mut self, amount: u64) {
        self.balance = self.balance.saturating_sub(amount);
    }
}

struct BalanceVisitor;

impl<'de> Visitor<'de> for BalanceVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer balance")
    }

    // Files written by older versions could hold negative balances (unchecked grants).
    fn visit_i64<E>(self, value: i64) -> Result<u64, E>
    where
        E: serde::de::Error,
    {
        Ok(value.max(0) as u64)
    }

    fn visit_u64<E>(self, value: u64) -> Result<u64, E>
    where
        E: serde::de::Error,
    {
        Ok(value.min(MAX_BALANCE))
    }
}

/**
 * Reads any JSON integer as a balance, clamped to `0..=MAX_BALANCE`.
 */
fn clamped_balance<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_i64(BalanceVisitor)
}

/**
 * (De)serialization of optional timestamps.
 *
 * Timestamps are written as RFC 3339 in UTC. On read, timestamps without an offset (plain ISO-8601
 * local date-times, as older ledger files stored them) are interpreted in the local timezone.
 */
mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        let naive = raw.parse::<NaiveDateTime>().ok()?;
        match Local.from_local_datetime(&naive).earliest() {
            Some(local) => Some(local.with_timezone(&Utc)),
            // Nonexistent local time (DST gap): take the wall clock as UTC.
            None => Some(naive.and_utc()),
        }
    }
}

/**
 * The complete set of accounts, keyed by user id.
 *
 * Besides the map, the ledger remembers the order in which users were first seen. That order is
 * what iteration, persistence and leaderboard tie-breaking use, so it survives save/load cycles.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    accounts: HashMap<String, Account>,
    order: Vec<String>,
}

impl Ledger {
    pub fn new() -> Ledger {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<&Account> {
        self.accounts.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /**
     * Iterates over the accounts in first-seen order.
     */
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Account)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.accounts.get(id).map(|account| (id.as_str(), account)))
    }

    /**
     * Returns the account of a user, creating an empty one (appended to the order) if absent.
     */
    pub(crate) fn account_mut(&mut self, user_id: &str) -> &mut Account {
        if !self.accounts.contains_key(user_id) {
            self.order.push(user_id.to_string());
        }
        self.accounts.entry(user_id.to_string()).or_default()
    }

    /**
     * Puts a user's account back to a previous state. `None` means the account did not exist, so
     * it is removed along with its position in the order.
     */
    pub(crate) fn restore(&mut self, user_id: &str, previous: Option<Account>) {
        match previous {
            Some(account) => {
                self.account_mut(user_id);
                self.accounts.insert(user_id.to_string(), account);
            }
            None => {
                self.accounts.remove(user_id);
                self.order.retain(|id| id != user_id);
            }
        }
    }
}

impl Serialize for Ledger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, account) in self.iter() {
            map.serialize_entry(id, account)?;
        }
        map.end()
    }
}

struct LedgerVisitor;

impl<'de> Visitor<'de> for LedgerVisitor {
    type Value = Ledger;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from user ids to accounts")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Ledger, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut ledger = Ledger::new();
        // Entries are visited in document order, which is the persisted first-seen order.
        while let Some((id, account)) = access.next_entry::<String, Account>()? {
            if ledger.accounts.insert(id.clone(), account).is_none() {
                ledger.order.push(id);
            }
        }
        Ok(ledger)
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D>(deserializer: D) -> Result<Ledger, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(LedgerVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, TimeZone};

    #[test]
    fn test_withdraw_clamps_at_zero() {
        let mut account = Account::default();
        account.deposit(5);
        account.withdraw(100);
        assert_eq!(account.balance(), 0);
    }

    #[test]
    fn test_deposit_caps_at_max_balance() {
        let mut account = Account::default();
        account.deposit(MAX_BALANCE - 1);
        account.deposit(MAX_BALANCE);
        assert_eq!(account.balance(), MAX_BALANCE);
    }

    #[test]
    fn test_oversized_balance_is_clamped_on_load() {
        let json = r#"{"1": {"balance": 18446744073709551614}, "2": {"balance": 9223372036854775807}}"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();

        assert_eq!(ledger.get("1").unwrap().balance(), MAX_BALANCE);
        assert_eq!(ledger.get("2").unwrap().balance(), MAX_BALANCE);
    }

    #[test]
    fn test_iteration_follows_first_seen_order() {
        let mut ledger = Ledger::new();
        for id in ["zed", "amy", "mo"] {
            ledger.account_mut(id).deposit(1);
        }
        // Touching an existing account does not move it.
        ledger.account_mut("zed").deposit(1);

        let ids: Vec<&str> = ledger.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["zed", "amy", "mo"]);
    }

    #[test]
    fn test_restore_removes_created_account() {
        let mut ledger = Ledger::new();
        ledger.account_mut("1").deposit(3);
        ledger.account_mut("2").deposit(4);

        ledger.restore("2", None);
        assert!(ledger.get("2").is_none());
        assert_eq!(ledger.len(), 1);

        let before = ledger.get("1").cloned();
        ledger.account_mut("1").withdraw(3);
        ledger.restore("1", before);
        assert_eq!(ledger.get("1").map(|a| a.balance()), Some(3));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_json_keeps_order() {
        let mut ledger = Ledger::new();
        ledger.account_mut("30").deposit(1);
        ledger.account_mut("4").deposit(2);
        ledger.account_mut("1000").deposit(3);

        let json = serde_json::to_string(&ledger).unwrap();
        let loaded: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, ledger);
        let ids: Vec<&str> = loaded.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["30", "4", "1000"]);
    }

    #[test]
    fn test_reads_legacy_file() {
        let json = r#"{
            "111": {"balance": 12, "last_daily": "2025-03-01T00:00:00.123456"},
            "222": {"balance": -4, "last_daily_claim": "2025-03-02T10:30:00"},
            "333": {"last_daily_claim": null, "nickname": "ignored"}
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();

        let first = ledger.get("111").unwrap();
        assert_eq!(first.balance(), 12);
        let expected = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2025, 3, 1)
                    .unwrap()
                    .and_hms_micro_opt(0, 0, 0, 123456)
                    .unwrap(),
            )
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(first.last_daily_accrual_at(), Some(expected));
        assert_eq!(first.last_daily_claim_at(), None);

        let second = ledger.get("222").unwrap();
        assert_eq!(second.balance(), 0);
        assert!(second.last_daily_claim_at().is_some());
        assert_eq!(second.last_daily_accrual_at(), None);

        let third = ledger.get("333").unwrap();
        assert_eq!(third, &Account::default());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(serde_json::from_str::<Ledger>("[]").is_err());
        assert!(serde_json::from_str::<Ledger>(r#"{"1": {"balance": "lots"}}"#).is_err());
        assert!(serde_json::from_str::<Ledger>(r#"{"1": {"last_daily_claim": "yesterday"}}"#).is_err());
    }

    #[test]
    fn test_timestamps_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut ledger = Ledger::new();
        ledger.account_mut("9").set_last_daily_claim_at(Some(ts));

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("2025-06-01T12:00:00.000000Z"));
        let loaded: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.get("9").unwrap().last_daily_claim_at(), Some(ts));
    }
}
