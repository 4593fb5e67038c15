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
use chrono::TimeDelta;
use std::path::PathBuf;
use thiserror::Error;

/**
 * Errors produced by the credit ledger.
 *
 * None of these are silent: every variant reaches the caller, and the command surface decides how
 * to phrase it for the user.
 */
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A credit, debit or claim amount was zero or negative. Nothing was changed.
    #[error("invalid amount {0}: amounts must be positive")]
    InvalidAmount(i64),

    /// The daily bonus was claimed less than 24 hours ago. Nothing was changed.
    #[error("the daily bonus is on cooldown for another {}", format_remaining(.0))]
    Cooldown(TimeDelta),

    /// The persisted ledger exists but does not have the expected shape.
    #[error("corrupt ledger store at {}: {source}", .path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The ledger could not be written; the mutation that triggered the write was rolled back.
    #[error("could not persist the ledger to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/**
 * Formats a wait time as `Xh Ym`, rounding seconds down.
 */
pub fn format_remaining(remaining: &TimeDelta) -> String {
    let minutes = remaining.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(&TimeDelta::hours(24)), "24h 0m");
        assert_eq!(format_remaining(&TimeDelta::seconds(3 * 3600 + 25 * 60 + 59)), "3h 25m");
        assert_eq!(format_remaining(&TimeDelta::seconds(30)), "0h 0m");
    }

    #[test]
    fn test_cooldown_message() {
        let err = LedgerError::Cooldown(TimeDelta::minutes(90));
        assert_eq!(
            err.to_string(),
            "the daily bonus is on cooldown for another 1h 30m"
        );
    }
}
