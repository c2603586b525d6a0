// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::activity::ActivityConfig;

pub const ENV_CONFIG_PATH: &str = "GEOSENTIENCE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/geosentience.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingest: IngestConfig,
    pub activity: ActivityConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// TTL for the single memoized fetch result.
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub gdelt_url: String,
    pub acled_url: String,
    /// Fixed per-call deadline for upstream requests. No retries.
    pub timeout_secs: u64,
    pub lookback_hours: u32,
    pub max_records: usize,
    /// Serve the fixed hotspot set when every live source is empty.
    pub hotspot_fallback: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            gdelt_url: "https://api.gdeltproject.org/api/v2/events/query".to_string(),
            acled_url: "https://api.acleddata.com/acled/read".to_string(),
            timeout_secs: 15,
            lookback_hours: 72,
            max_records: 100,
            hotspot_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Token for the 3D render layer served to the browser. Decorative as
    /// far as this service is concerned; never sent to event sources.
    pub cesium_ion_token: String,
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $GEOSENTIENCE_CONFIG_PATH (must exist if set)
    /// 2) config/geosentience.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<AppConfig> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("GEOSENTIENCE_CONFIG_PATH points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [ingest]
            max_records = 25
            "#,
        )
        .unwrap();
        assert_eq!(cfg.ingest.max_records, 25);
        assert_eq!(cfg.ingest.timeout_secs, 15);
        assert!(cfg.ingest.hotspot_fallback);
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.activity.samples, 100);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo does not interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);

        // No files in temp CWD -> built-in defaults
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.ingest.lookback_hours, 72);

        // Env path takes precedence
        let p = tmp.path().join("geosentience.toml");
        fs::write(&p, "[server]\nbind = \"0.0.0.0:9000\"\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg2 = AppConfig::load_default().unwrap();
        assert_eq!(cfg2.server.bind, "0.0.0.0:9000");

        // Env pointing nowhere is an error, not a silent fallback
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(AppConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
