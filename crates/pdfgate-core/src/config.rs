use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn, Level};

use crate::error::ScanError;
use crate::policy::DisallowPolicy;
use crate::scan::{ActionScanner, ScanOptions};
use crate::security_log::{SecurityDomain, SecurityEvent};

const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
const MAX_VISITS: usize = 100_000_000;
const MAX_FILE_BYTES: u64 = 4 * 1024 * 1024 * 1024;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub profiles: Option<HashMap<String, Profile>>,
    pub scan: Option<ScanConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Profile {
    pub scan: Option<ScanConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanConfig {
    /// Action kinds to flag, by variant name or raw `/S` tag.
    pub disallow: Option<Vec<String>>,
    pub max_visits: Option<usize>,
    pub max_file_bytes: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if let Ok(meta) = fs::metadata(path) {
            if meta.len() > MAX_CONFIG_BYTES {
                return Err(anyhow::anyhow!(
                    "config {} exceeds {} bytes",
                    path.display(),
                    MAX_CONFIG_BYTES
                ));
            }
        }
        let data = fs::read_to_string(path)?;
        let cfg = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str::<Config>(&data)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str::<Config>(&data)?,
            _ => toml::from_str::<Config>(&data)
                .or_else(|_| serde_yaml::from_str::<Config>(&data))?,
        };
        Ok(cfg)
    }

    pub fn logging_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// Applies the base `[scan]` table, then the named profile on top of it.
    /// Returns the policy override, if any layer set one.
    pub fn apply(
        &self,
        opts: &mut ScanOptions,
        profile: Option<&str>,
    ) -> Result<Option<DisallowPolicy>, ScanError> {
        let mut policy = None;
        if let Some(scan) = &self.scan {
            apply_scan(scan, opts, &mut policy)?;
        }
        if let Some(p) = profile {
            match self.profiles.as_ref().and_then(|profiles| profiles.get(p)) {
                Some(profile_cfg) => {
                    if let Some(scan) = &profile_cfg.scan {
                        apply_scan(scan, opts, &mut policy)?;
                    }
                }
                None => warn!(profile = p, "Unknown config profile"),
            }
        }
        Ok(policy)
    }

    pub fn build_scanner(&self, profile: Option<&str>) -> Result<ActionScanner, ScanError> {
        let mut opts = ScanOptions::default();
        let policy = self.apply(&mut opts, profile)?.unwrap_or_default();
        Ok(ActionScanner::with_options(policy, opts))
    }
}

fn apply_scan(
    scan: &ScanConfig,
    opts: &mut ScanOptions,
    policy: &mut Option<DisallowPolicy>,
) -> Result<(), ScanError> {
    if let Some(names) = &scan.disallow {
        let parsed = DisallowPolicy::from_names(names).map_err(ScanError::Config)?;
        info!(kinds = names.len(), "Config override disallow");
        *policy = Some(parsed);
    }
    if let Some(v) = scan.max_visits {
        if v == 0 || v > MAX_VISITS {
            reject("invalid_max_visits", "Invalid max_visits in config");
            warn!(value = v, limit = MAX_VISITS, "Invalid max_visits in config");
        } else {
            info!(value = v, "Config override max_visits");
            opts.max_visits = Some(v);
        }
    }
    if let Some(v) = scan.max_file_bytes {
        if v == 0 || v > MAX_FILE_BYTES {
            reject("invalid_max_file_bytes", "Invalid max_file_bytes in config");
            warn!(value = v, limit = MAX_FILE_BYTES, "Invalid max_file_bytes in config");
        } else {
            info!(value = v, "Config override max_file_bytes");
            opts.max_file_bytes = v;
        }
    }
    Ok(())
}

fn reject(kind: &str, message: &str) {
    SecurityEvent::new(Level::WARN, SecurityDomain::Config, kind, message).emit();
}
