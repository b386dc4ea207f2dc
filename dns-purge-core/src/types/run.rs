//! Run request and mode

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use dns_purge_provider::AccountRef;

/// Sentinel a caller must pass to run in [`RunMode::Execute`].
pub const CONFIRMATION_TOKEN: &str = "DELETE-ALL-DNS-RESOURCES";

/// Whether a run performs real deletions.
///
/// Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Report what would be deleted; no mutating API call is issued.
    Simulate,
    /// Delete for real.
    Execute,
}

impl RunMode {
    pub fn is_simulate(self) -> bool {
        matches!(self, Self::Simulate)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulate => f.write_str("simulate"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// Input of a run, produced by whatever front end selected the accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub accounts: Vec<AccountRef>,
    pub mode: RunMode,
    #[serde(default)]
    pub confirmation_token: Option<String>,
}

impl RunRequest {
    /// A dry run over the given accounts.
    pub fn simulate(accounts: Vec<AccountRef>) -> Self {
        Self {
            accounts,
            mode: RunMode::Simulate,
            confirmation_token: None,
        }
    }

    /// A real run; `confirmation_token` must equal [`CONFIRMATION_TOKEN`].
    pub fn execute(accounts: Vec<AccountRef>, confirmation_token: impl Into<String>) -> Self {
        Self {
            accounts,
            mode: RunMode::Execute,
            confirmation_token: Some(confirmation_token.into()),
        }
    }

    /// Reject requests that must not start.
    pub fn validate(&self) -> CoreResult<()> {
        if self.accounts.is_empty() {
            return Err(CoreError::NoAccountsSelected);
        }
        if self.mode == RunMode::Execute {
            match self.confirmation_token.as_deref() {
                None | Some("") => return Err(CoreError::ConfirmationRequired),
                Some(token) if token != CONFIRMATION_TOKEN => {
                    return Err(CoreError::InvalidConfirmationToken);
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
