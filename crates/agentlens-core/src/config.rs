//! Definition-set loading.
//!
//! Definition files are ordered sequences of metric and assertion entries,
//! authored as YAML (or JSON). Parsing here is purely structural; semantic
//! validation (unknown types, duplicate names, malformed rule chains)
//! happens when the evaluators are constructed, so every configuration
//! problem surfaces before the first record is processed.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{AssertionDefinition, ConfigError, MetricDefinition};

/// A parsed definition file: metrics plus assertions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,

    #[serde(default)]
    pub assertions: Vec<AssertionDefinition>,
}

impl EvalConfig {
    /// Parse a YAML definition document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON definition document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read and parse a definition file, dispatching on extension
    /// (`.json` → JSON, anything else → YAML, which is the common authoring
    /// format).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read definition file {:?}", path))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
        .with_context(|| format!("parse definition file {:?}", path))?;
        Ok(config)
    }

    /// SHA-256 hex digest of the canonical JSON form of this definition set.
    ///
    /// Stamped into report artifacts so a report is traceable to the exact
    /// definitions that produced it.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }
}
