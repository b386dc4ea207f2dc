//! 类型定义模块

mod attempt;
mod inventory;
mod plan;
mod report;
mod run;

pub use attempt::{AttemptError, AttemptOutcome, DeletionAttempt, PlanAction, SkipReason};
pub use inventory::{Inventory, ScanError};
pub use plan::{DeletionPlan, Phase, PlanStep};
pub use report::{
    AccountError, DeletedResource, FailedDeletion, ReportDetails, ReportSummary, RunReport,
    SkippedAction,
};
pub use run::{CONFIRMATION_TOKEN, RunMode, RunRequest};

// Re-export provider 库的公共类型
pub use dns_purge_provider::{
    AccountRef, ErrorClass, HostedZoneDetail, RecordSet, ResourceRecord, ResourceType,
    ZoneAssociation,
};
