//! Plan actions and deletion attempts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dns_purge_provider::{
    ErrorClass, ProviderError, ResourceRecord, ResourceType, ZoneAssociation,
};

/// One side-effecting action the engine may take.
///
/// There is deliberately no action that deletes a VPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// Remove a private zone's link to a VPC.
    Disassociate(ZoneAssociation),
    /// Delete a DNS resource.
    Delete(ResourceRecord),
}

impl PlanAction {
    /// Key all per-resource state is tracked under.
    pub fn key(&self) -> String {
        match self {
            Self::Disassociate(a) => format!("disassociate:{}:{}", a.zone_id, a.vpc_id),
            Self::Delete(r) => format!("delete:{}:{}", r.resource_type.report_key(), r.id),
        }
    }

    /// Resource type of a deletion; `None` for disassociations.
    pub fn resource_type(&self) -> Option<ResourceType> {
        match self {
            Self::Disassociate(_) => None,
            Self::Delete(r) => Some(r.resource_type),
        }
    }

    /// Zone the action belongs to, if any.
    pub fn zone_id(&self) -> Option<&str> {
        match self {
            Self::Disassociate(a) => Some(&a.zone_id),
            Self::Delete(r) => r.zone_id.as_deref(),
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disassociate(a) => {
                write!(f, "disassociate VPC {} from zone {}", a.vpc_id, a.zone_id)
            }
            Self::Delete(r) => write!(f, "delete {} {} ({})", r.resource_type, r.id, r.name),
        }
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    /// Transient failure; retry later in the same run.
    Deferred,
    Failed,
    /// Never dispatched.
    Skipped,
}

/// Why an action was never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The resource (or its zone) is protected.
    Protected,
    /// The run was cancelled before the action was reached.
    Cancelled,
    /// The zone's detail or record sets could not be listed.
    IncompleteScan,
}

/// Error captured on an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptError {
    pub class: ErrorClass,
    pub message: String,
    /// Wait hint from a throttled API, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AttemptError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
            retry_after: None,
        }
    }
}

impl From<&ProviderError> for AttemptError {
    fn from(error: &ProviderError) -> Self {
        Self {
            class: error.class(),
            message: error.to_string(),
            retry_after: error.retry_after(),
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.class, self.message)
    }
}

/// One attempt at one action.
///
/// A resource that gets deferred accumulates several attempts; each carries its
/// 1-based `attempt_count`. When a cancellation closes out a deferred resource,
/// the closing `Failed` attempt takes the next count but no call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionAttempt {
    pub account: String,
    pub target: PlanAction,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AttemptError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    pub attempt_count: u32,
    /// Set when a dry run intercepted the call.
    #[serde(default)]
    pub simulated: bool,
    /// Set when the API reported the resource as already gone.
    #[serde(default)]
    pub already_absent: bool,
    #[serde(with = "crate::utils::datetime")]
    pub timestamp: DateTime<Utc>,
}

impl DeletionAttempt {
    pub fn new(
        account: &str,
        target: PlanAction,
        outcome: AttemptOutcome,
        attempt_count: u32,
    ) -> Self {
        Self {
            account: account.to_string(),
            target,
            outcome,
            error: None,
            skip_reason: None,
            attempt_count,
            simulated: false,
            already_absent: false,
            timestamp: Utc::now(),
        }
    }

    /// An attempt that was never dispatched.
    pub fn skipped(account: &str, target: PlanAction, reason: SkipReason) -> Self {
        let mut attempt = Self::new(account, target, AttemptOutcome::Skipped, 0);
        attempt.skip_reason = Some(reason);
        attempt
    }

    #[must_use]
    pub fn with_error(mut self, error: AttemptError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn key(&self) -> String {
        self.target.key()
    }

    /// No further attempt will follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.outcome,
            AttemptOutcome::Succeeded | AttemptOutcome::Failed | AttemptOutcome::Skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_purge_provider::AccountRef;

    #[test]
    fn keys_distinguish_actions() {
        let account = AccountRef::new("1", "us-east-1");
        let zone = ResourceRecord::new(ResourceType::HostedZone, "Z1", "example.com.", &account);
        let association = ZoneAssociation {
            zone_id: "Z1".into(),
            vpc_id: "vpc-1".into(),
            region: "us-east-1".into(),
        };
        assert_eq!(PlanAction::Delete(zone).key(), "delete:hosted_zones:Z1");
        assert_eq!(
            PlanAction::Disassociate(association).key(),
            "disassociate:Z1:vpc-1"
        );
    }

    #[test]
    fn action_serializes_with_tag() {
        let association = ZoneAssociation {
            zone_id: "Z1".into(),
            vpc_id: "vpc-1".into(),
            region: "us-east-1".into(),
        };
        let json = serde_json::to_value(PlanAction::Disassociate(association)).unwrap();
        assert_eq!(json["action"], "disassociate");
        assert_eq!(json["vpc_id"], "vpc-1");
    }
}
