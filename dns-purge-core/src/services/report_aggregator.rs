//! Report aggregation

use chrono::Utc;
use uuid::Uuid;

use dns_purge_provider::{AccountRef, ErrorClass};

use crate::error::CoreError;
use crate::types::{
    AccountError, AttemptError, AttemptOutcome, DeletedResource, DeletionAttempt, FailedDeletion,
    PlanAction, ReportDetails, ReportSummary, RunMode, RunReport, ScanError, SkipReason,
    SkippedAction,
};

/// Accumulates attempts into a [`RunReport`].
///
/// VPCs only ever show up in the disassociation counter; there is no VPC
/// deletion counter to increment.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    report: RunReport,
}

impl ReportAggregator {
    pub fn new(mode: RunMode) -> Self {
        Self {
            report: RunReport {
                run_id: Uuid::new_v4(),
                execution_timestamp: Utc::now(),
                mode,
                cancelled: false,
                accounts_processed: Vec::new(),
                accounts_skipped: Vec::new(),
                summary: ReportSummary::default(),
                details: ReportDetails::default(),
                scan_errors: Vec::new(),
                account_errors: Vec::new(),
                all_attempts: Vec::new(),
            },
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.report.run_id
    }

    /// An account whose processing started.
    pub fn record_account(&mut self, account: &AccountRef) {
        self.report.accounts_processed.push(account.to_string());
    }

    /// An account never started because the run was cancelled.
    pub fn record_account_skipped(&mut self, account: &AccountRef) {
        self.report.accounts_skipped.push(account.to_string());
    }

    pub fn record_scan_error(&mut self, error: ScanError) {
        self.report.scan_errors.push(error);
    }

    pub fn record_account_error(&mut self, account: &AccountRef, error: &CoreError) {
        self.report
            .account_errors
            .push(AccountError::new(&account.to_string(), error));
    }

    pub fn mark_cancelled(&mut self) {
        self.report.cancelled = true;
    }

    /// Fold one attempt into the counts and details.
    pub fn record(&mut self, attempt: DeletionAttempt) {
        let summary = &mut self.report.summary;
        let details = &mut self.report.details;

        match attempt.outcome {
            AttemptOutcome::Succeeded => {
                if attempt.already_absent {
                    summary.total_already_absent += 1;
                }
                match &attempt.target {
                    PlanAction::Disassociate(association) => {
                        summary.total_vpcs_disassociated += 1;
                        details.disassociated_vpcs.push(association.clone());
                    }
                    PlanAction::Delete(record) => {
                        *summary.deleted_mut(record.resource_type) += 1;
                        details
                            .deleted_mut(record.resource_type)
                            .push(DeletedResource {
                                id: record.id.clone(),
                                name: record.name.clone(),
                                zone_id: record.zone_id.clone(),
                            });
                    }
                }
            }
            AttemptOutcome::Failed => {
                summary.total_failed_deletions += 1;
                details.failed.push(FailedDeletion {
                    account: attempt.account.clone(),
                    resource: attempt.target.clone(),
                    error: attempt.error.clone().unwrap_or_else(|| {
                        AttemptError::new(ErrorClass::Unexpected, "failed without an error")
                    }),
                    attempt_count: attempt.attempt_count,
                });
            }
            AttemptOutcome::Skipped => {
                summary.total_skipped += 1;
                details.skipped.push(SkippedAction {
                    account: attempt.account.clone(),
                    resource: attempt.target.clone(),
                    reason: attempt.skip_reason.unwrap_or(SkipReason::Cancelled),
                });
            }
            // Only the final outcome of a resource is counted.
            AttemptOutcome::Deferred => {}
        }

        self.report.all_attempts.push(attempt);
    }

    /// Snapshot of the report so far. Calling it twice without recording in
    /// between yields the same report.
    pub fn finalize(&self) -> RunReport {
        self.report.clone()
    }
}
