//! Run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AttemptError, DeletionAttempt, PlanAction, RunMode, ScanError, SkipReason};
use crate::error::{CoreError, CoreResult};
use dns_purge_provider::{ResourceType, ZoneAssociation};

/// Identity of a deleted resource in the report details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

/// A resource whose final outcome is `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDeletion {
    pub account: String,
    pub resource: PlanAction,
    pub error: AttemptError,
    pub attempt_count: u32,
}

/// A planned action that was never dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub account: String,
    pub resource: PlanAction,
    pub reason: SkipReason,
}

/// An account whose processing was aborted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountError {
    pub account: String,
    pub error: String,
}

impl AccountError {
    pub fn new(account: &str, error: &CoreError) -> Self {
        Self {
            account: account.to_string(),
            error: error.to_string(),
        }
    }
}

/// Totals of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_query_logging_configs_deleted: usize,
    pub total_traffic_policy_instances_deleted: usize,
    pub total_traffic_policies_deleted: usize,
    pub total_record_sets_deleted: usize,
    pub total_hosted_zones_deleted: usize,
    pub total_health_checks_deleted: usize,
    pub total_delegation_sets_deleted: usize,
    pub total_vpcs_disassociated: usize,
    pub total_failed_deletions: usize,
    pub total_skipped: usize,
    /// Successes the API reported as already gone; included in the per-type totals.
    pub total_already_absent: usize,
}

impl ReportSummary {
    /// Deleted count for one type.
    pub fn deleted(&self, resource_type: ResourceType) -> usize {
        match resource_type {
            ResourceType::QueryLoggingConfig => self.total_query_logging_configs_deleted,
            ResourceType::TrafficPolicyInstance => self.total_traffic_policy_instances_deleted,
            ResourceType::TrafficPolicy => self.total_traffic_policies_deleted,
            ResourceType::HostedZoneRecordSet => self.total_record_sets_deleted,
            ResourceType::HostedZone => self.total_hosted_zones_deleted,
            ResourceType::HealthCheck => self.total_health_checks_deleted,
            ResourceType::ReusableDelegationSet => self.total_delegation_sets_deleted,
        }
    }

    pub(crate) fn deleted_mut(&mut self, resource_type: ResourceType) -> &mut usize {
        match resource_type {
            ResourceType::QueryLoggingConfig => &mut self.total_query_logging_configs_deleted,
            ResourceType::TrafficPolicyInstance => {
                &mut self.total_traffic_policy_instances_deleted
            }
            ResourceType::TrafficPolicy => &mut self.total_traffic_policies_deleted,
            ResourceType::HostedZoneRecordSet => &mut self.total_record_sets_deleted,
            ResourceType::HostedZone => &mut self.total_hosted_zones_deleted,
            ResourceType::HealthCheck => &mut self.total_health_checks_deleted,
            ResourceType::ReusableDelegationSet => &mut self.total_delegation_sets_deleted,
        }
    }

    /// Sum of all per-type deletions.
    pub fn total_deleted(&self) -> usize {
        ResourceType::ALL.iter().map(|t| self.deleted(*t)).sum()
    }
}

/// Per-resource details of the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub deleted_query_logging_configs: Vec<DeletedResource>,
    pub deleted_traffic_policy_instances: Vec<DeletedResource>,
    pub deleted_traffic_policies: Vec<DeletedResource>,
    pub deleted_record_sets: Vec<DeletedResource>,
    pub deleted_hosted_zones: Vec<DeletedResource>,
    pub deleted_health_checks: Vec<DeletedResource>,
    pub deleted_delegation_sets: Vec<DeletedResource>,
    pub disassociated_vpcs: Vec<ZoneAssociation>,
    pub failed: Vec<FailedDeletion>,
    pub skipped: Vec<SkippedAction>,
}

impl ReportDetails {
    pub fn deleted(&self, resource_type: ResourceType) -> &[DeletedResource] {
        match resource_type {
            ResourceType::QueryLoggingConfig => &self.deleted_query_logging_configs,
            ResourceType::TrafficPolicyInstance => &self.deleted_traffic_policy_instances,
            ResourceType::TrafficPolicy => &self.deleted_traffic_policies,
            ResourceType::HostedZoneRecordSet => &self.deleted_record_sets,
            ResourceType::HostedZone => &self.deleted_hosted_zones,
            ResourceType::HealthCheck => &self.deleted_health_checks,
            ResourceType::ReusableDelegationSet => &self.deleted_delegation_sets,
        }
    }

    pub(crate) fn deleted_mut(&mut self, resource_type: ResourceType) -> &mut Vec<DeletedResource> {
        match resource_type {
            ResourceType::QueryLoggingConfig => &mut self.deleted_query_logging_configs,
            ResourceType::TrafficPolicyInstance => &mut self.deleted_traffic_policy_instances,
            ResourceType::TrafficPolicy => &mut self.deleted_traffic_policies,
            ResourceType::HostedZoneRecordSet => &mut self.deleted_record_sets,
            ResourceType::HostedZone => &mut self.deleted_hosted_zones,
            ResourceType::HealthCheck => &mut self.deleted_health_checks,
            ResourceType::ReusableDelegationSet => &mut self.deleted_delegation_sets,
        }
    }
}

/// Final, immutable outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(with = "crate::utils::datetime")]
    pub execution_timestamp: DateTime<Utc>,
    pub mode: RunMode,
    pub cancelled: bool,
    pub accounts_processed: Vec<String>,
    pub accounts_skipped: Vec<String>,
    pub summary: ReportSummary,
    pub details: ReportDetails,
    pub scan_errors: Vec<ScanError>,
    pub account_errors: Vec<AccountError>,
    pub all_attempts: Vec<DeletionAttempt>,
}

impl RunReport {
    /// No failed deletion and no aborted account.
    ///
    /// A `false` here is a reportable outcome, not an orchestrator error.
    pub fn is_success(&self) -> bool {
        self.summary.total_failed_deletions == 0 && self.account_errors.is_empty()
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::SerializationError(e.to_string()))
    }
}
