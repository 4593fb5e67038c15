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

/**
 * The `n` richest users as `(user_id, balance)`, by descending balance.
 *
 * Equal balances keep the ledger's first-seen order (the sort is stable over the ordered
 * iteration).
 */
pub fn top(ledger: &Ledger, n: usize) -> Vec<(String, u64)> {
    let mut ranking: Vec<(&str, u64)> = ledger
        .iter()
        .map(|(id, account)| (id, account.balance()))
        .collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1));

    ranking
        .into_iter()
        .take(n)
        .map(|(id, balance)| (id.to_string(), balance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_of(entries: &[(&str, u64)]) -> Ledger {
        let mut ledger = Ledger::new();
        for (id, balance) in entries {
            ledger.account_mut(id).deposit(*balance);
        }
        ledger
    }

    fn owned(entries: &[(&str, u64)]) -> Vec<(String, u64)> {
        entries.iter().map(|(id, b)| (id.to_string(), *b)).collect()
    }

    #[test]
    fn test_empty_ledger() {
        assert!(top(&Ledger::new(), 10).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let ledger = ledger_of(&[("C", 10), ("A", 30), ("B", 30)]);

        assert_eq!(top(&ledger, 10), owned(&[("A", 30), ("B", 30), ("C", 10)]));
    }

    #[test]
    fn test_ties_follow_first_seen_not_id() {
        let ledger = ledger_of(&[("9", 5), ("1", 5), ("5", 5)]);

        assert_eq!(top(&ledger, 3), owned(&[("9", 5), ("1", 5), ("5", 5)]));
    }

    #[test]
    fn test_truncates_to_n() {
        let entries: Vec<(String, u64)> = (0..15).map(|i| (format!("u{i}"), i)).collect();
        let mut ledger = Ledger::new();
        for (id, balance) in &entries {
            ledger.account_mut(id).deposit(*balance);
        }

        let ranking = top(&ledger, 10);
        assert_eq!(ranking.len(), 10);
        assert_eq!(ranking[0], ("u14".to_string(), 14));
        assert_eq!(ranking[9], ("u5".to_string(), 5));
        assert!(ranking.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn test_zero_balances_are_ranked() {
        let ledger = ledger_of(&[("A", 0), ("B", 2)]);

        assert_eq!(top(&ledger, 10), owned(&[("B", 2), ("A", 0)]));
    }
}
