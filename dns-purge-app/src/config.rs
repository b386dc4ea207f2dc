//! Application configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dns_purge_core::error::{CoreError, CoreResult};
use dns_purge_core::services::{
    DEFAULT_MAX_ATTEMPTS, OrchestratorConfig, ProtectionRules, RetryPolicy,
};

/// JSON configuration document. Every field is optional.
///
/// ```json
/// {
///   "max_attempts": 3,
///   "phase_backoff_ms": 2000,
///   "max_concurrent_accounts": 2,
///   "protection": { "zone_names": ["corp.example.com"] },
///   "report_dir": "reports"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub max_attempts: u32,
    pub rate_limited_max_attempts: u32,
    pub phase_backoff_ms: u64,
    pub max_backoff_secs: u64,
    pub call_timeout_secs: u64,
    pub max_concurrent_accounts: usize,
    pub protection: ProtectionRules,
    /// Directory run reports are written to.
    pub report_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limited_max_attempts: retry.rate_limited_max_attempts,
            phase_backoff_ms: duration_millis(retry.phase_backoff),
            max_backoff_secs: retry.max_backoff.as_secs(),
            call_timeout_secs: retry.call_timeout.as_secs(),
            max_concurrent_accounts: 1,
            protection: ProtectionRules::default(),
            report_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            CoreError::ConfigError(format!("invalid config {}: {e}", path.display()))
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                rate_limited_max_attempts: self.rate_limited_max_attempts,
                phase_backoff: Duration::from_millis(self.phase_backoff_ms),
                max_backoff: Duration::from_secs(self.max_backoff_secs),
                call_timeout: Duration::from_secs(self.call_timeout_secs),
            },
            max_concurrent_accounts: self.max_concurrent_accounts,
            protection: self.protection.clone(),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
