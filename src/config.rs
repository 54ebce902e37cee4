//! Ledger configuration

use crate::constants::CUT_OFF_AGE;
use crate::error::{LedgerError, Result};
use crate::types::Natural;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum number of blocks a candidate's parent may lag behind the best height
    pub cut_off_age: Natural,
    /// Drop blocks of abandoned forks once they fall out of the cutoff window
    pub prune_stale_forks: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            cut_off_age: CUT_OFF_AGE,
            prune_stale_forks: true,
        }
    }
}

impl ChainConfig {
    pub fn with_cut_off_age(mut self, cut_off_age: Natural) -> Self {
        self.cut_off_age = cut_off_age;
        self
    }

    pub fn with_pruning(mut self, prune_stale_forks: bool) -> Self {
        self.prune_stale_forks = prune_stale_forks;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Configuration(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}
