//! Runner configuration from environment variables.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SRS_TETRIS_MODE` | `marathon`, `ultra` or `sprint` | `marathon` |
//! | `SRS_TETRIS_SEED` | bag seed (`u32`) | derived from the wall clock |
//! | `SRS_TETRIS_RULES` | JSON file overriding rule constants | built-in rules |
//! | `SRS_TETRIS_LOG` | log file; logging is off without it | none |

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use crate::engine::Rules;
use crate::types::GameMode;

pub const MODE_VAR: &str = "SRS_TETRIS_MODE";
pub const SEED_VAR: &str = "SRS_TETRIS_SEED";
pub const RULES_VAR: &str = "SRS_TETRIS_RULES";
pub const LOG_VAR: &str = "SRS_TETRIS_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mode: GameMode,
    pub seed: u32,
    pub rules: Rules,
    pub log_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match get(MODE_VAR) {
            Some(v) => v.parse::<GameMode>().with_context(|| format!("invalid {MODE_VAR}"))?,
            None => GameMode::Marathon,
        };
        let seed = match get(SEED_VAR) {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid {SEED_VAR}: {v:?}"))?,
            None => clock_seed(),
        };
        let rules = match get(RULES_VAR) {
            Some(path) => Rules::load(&path)?,
            None => Rules::default(),
        };
        let log_path = get(LOG_VAR).map(PathBuf::from);

        Ok(Self {
            mode,
            seed,
            rules,
            log_path,
        })
    }
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}
