use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::ConfigError;

/// Candidate header values, as stored in `cb-custom-http-headers.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FingerprintPools {
    #[serde(rename = "cb-referer-url", default)]
    pub referers: Vec<String>,
    #[serde(rename = "cb-accepted-lg", default)]
    pub accept_languages: Vec<String>,
    #[serde(rename = "cb-user-agent", default)]
    pub user_agents: Vec<String>,
}

impl FingerprintPools {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let label = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FingerprintFile {
            path: label.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::FingerprintJson { path: label, source })
    }
}

/// The header values presented by every request of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub referer: String,
    pub accept_language: String,
    pub user_agent: String,
}

impl Fingerprint {
    /// One independent uniform pick per pool.
    pub fn randomize<R: Rng + ?Sized>(pools: &FingerprintPools, rng: &mut R) -> Result<Self, ConfigError> {
        Ok(Self {
            referer: pick(&pools.referers, "cb-referer-url", rng)?,
            accept_language: pick(&pools.accept_languages, "cb-accepted-lg", rng)?,
            user_agent: pick(&pools.user_agents, "cb-user-agent", rng)?,
        })
    }
}

fn pick<R: Rng + ?Sized>(pool: &[String], name: &'static str, rng: &mut R) -> Result<String, ConfigError> {
    pool.choose(rng).cloned().ok_or(ConfigError::EmptyPool(name))
}
