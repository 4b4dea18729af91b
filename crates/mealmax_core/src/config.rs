//! Kitchen configuration loaded from environment variables.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `MEALMAX_DB_PATH` | SQLite file; absent or blank means in-memory |
//! | `MEALMAX_LOSS_POLICY` | `eliminate` (default) or `record_loss` |
//! | `MEALMAX_BATTLE_SEED` | `u64` seed for reproducible battle draws |
//! | `MEALMAX_LOG_LEVEL` | `trace|debug|info|warn|error` |
//! | `MEALMAX_LOG_DIR` | absolute directory; file logging is off when unset |

use crate::logging::default_log_level;
use crate::model::battle::LossPolicy;
use crate::service::random::{RandomSource, SeededRandom, ThreadRandom};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MEALMAX_DB_PATH";
pub const ENV_LOSS_POLICY: &str = "MEALMAX_LOSS_POLICY";
pub const ENV_BATTLE_SEED: &str = "MEALMAX_BATTLE_SEED";
pub const ENV_LOG_LEVEL: &str = "MEALMAX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MEALMAX_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitchenConfig {
    pub db_path: Option<PathBuf>,
    pub loss_policy: LossPolicy,
    pub battle_seed: Option<u64>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            loss_policy: LossPolicy::default(),
            battle_seed: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl KitchenConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        config.db_path = read(ENV_DB_PATH).map(PathBuf::from);

        if let Some(value) = read(ENV_LOSS_POLICY) {
            config.loss_policy = value.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_LOSS_POLICY,
                value: value.clone(),
                reason,
            })?;
        }

        if let Some(value) = read(ENV_BATTLE_SEED) {
            let seed = value
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_BATTLE_SEED,
                    value: value.clone(),
                    reason: err.to_string(),
                })?;
            config.battle_seed = Some(seed);
        }

        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        config.log_dir = read(ENV_LOG_DIR);

        Ok(config)
    }

    /// Random source selected by `battle_seed`.
    pub fn random_source(&self) -> Box<dyn RandomSource + Send> {
        match self.battle_seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        }
    }

    /// Starts file logging when `log_dir` is set.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, String> {
        match self.log_dir.as_deref() {
            Some(dir) => crate::logging::init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}
