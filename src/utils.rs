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
use crate::accrual::AccrualSettings;
use crate::claim::ClaimPolicy;
use serde::{Deserialize, Serialize};
use serenity::all::RoleId;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

/* Data structures: */

/**
 * Data structure encapsulating the configuration of the bot.
 *
 * Every field has a default, so a partial `config.json` only needs the fields it changes.
 */
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// The ID of the heist role. Its members are credited every day at local midnight.
    pub heist_role_id: u64,
    /// Credits given to every heist role member by the daily accrual.
    pub accrual_amount: i64,
    /// Lower bound (inclusive) of the daily bonus.
    pub claim_bonus_min: u64,
    /// Upper bound (inclusive) of the daily bonus.
    pub claim_bonus_max: u64,
    /// How many entries `/leaderboard` shows.
    pub leaderboard_size: usize,
    /// Path of the persisted ledger.
    pub ledger_path: PathBuf,
    /// The "Playing ..." presence text.
    pub status: String,
    /// Prefix for prefix commands (`!sync`).
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            heist_role_id: 1467926741388361860,
            accrual_amount: 5,
            claim_bonus_min: 3,
            claim_bonus_max: 8,
            leaderboard_size: 10,
            ledger_path: PathBuf::from("credits.json"),
            status: String::from("GTA Heists | /help"),
            command_prefix: String::from("!"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl BotConfig {
    /**
     * Checks the values the ledger relies on (positive amounts, a sane bonus range).
     */
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.heist_role_id == 0 {
            return invalid("heist_role_id must be a role ID");
        }
        if self.accrual_amount <= 0 {
            return invalid("accrual_amount must be positive");
        }
        if self.claim_bonus_min == 0 || self.claim_bonus_min > self.claim_bonus_max {
            return invalid("claim bonus bounds must satisfy 1 <= claim_bonus_min <= claim_bonus_max");
        }
        if i64::try_from(self.claim_bonus_max).is_err() {
            return invalid("claim_bonus_max is too large");
        }
        if self.leaderboard_size == 0 {
            return invalid("leaderboard_size must be positive");
        }
        if self.command_prefix.is_empty() {
            return invalid("command_prefix must not be empty");
        }
        Ok(())
    }

    pub fn claim_policy(&self) -> ClaimPolicy {
        ClaimPolicy::new(self.claim_bonus_min..=self.claim_bonus_max)
    }

    pub fn accrual_settings(&self) -> AccrualSettings {
        AccrualSettings {
            role: RoleId::new(self.heist_role_id),
            amount: self.accrual_amount,
        }
    }
}

/**
 * Loads the bot configuration from `path`, falling back to the defaults if the file does not
 * exist. The result is validated.
 */
pub fn load_config(path: &Path) -> Result<BotConfig, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            BotConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    config.validate()?;
    Ok(config)
}

/**
 * Macro for logging the usage of a command. Inserted by `#[heistbot::log_cmd]`.
 */
macro_rules! log_cmd {
    ($ctx:ident, $admin:expr) => {
        tracing::info!(
            command = %$ctx.invocation_string(),
            user = %$ctx.author().id,
            tag = %$ctx.author().tag(),
            admin = $admin,
            "executing command"
        );
    };
}
pub(crate) use log_cmd;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.accrual_amount, 5);
        assert_eq!((config.claim_bonus_min, config.claim_bonus_max), (3, 8));
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.ledger_path, PathBuf::from("credits.json"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"heist_role_id": 1234, "leaderboard_size": 5}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.heist_role_id, 1234);
        assert_eq!(config.leaderboard_size, 5);
        assert_eq!(config.accrual_amount, 5);
        assert_eq!(config.accrual_settings().role, RoleId::new(1234));
        assert_eq!(config.claim_policy().bonus_range(), &(3..=8));
    }

    #[test]
    fn test_rejects_inverted_bonus_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"claim_bonus_min": 9, "claim_bonus_max": 8}"#).unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validate() {
        let mut config = BotConfig::default();
        assert!(config.validate().is_ok());

        config.accrual_amount = 0;
        assert!(config.validate().is_err());

        config = BotConfig {
            leaderboard_size: 0,
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());

        config = BotConfig {
            heist_role_id: 0,
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
