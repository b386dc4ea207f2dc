//! Deletion orchestration
//!
//! Drives every account through scan → plan → phases. Within an account all
//! actions are sequential and phase-ordered; accounts themselves may run with
//! bounded concurrency and never affect each other.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use dns_purge_provider::utils::log_sanitizer::truncate_for_log;
use dns_purge_provider::{AccountRef, CloudResourceApi};

use super::planner::DependencyGraphBuilder;
use super::report_aggregator::ReportAggregator;
use super::retry::{RetryPolicy, RetryScheduler};
use super::scanner::{InventoryScanner, ProtectionRules};
use super::simulator::DryRunSimulator;
use super::state::ResourceState;
use crate::error::{CoreError, CoreResult};
use crate::traits::{ApiRegistry, NoopRunObserver, RunObserver};
use crate::types::{
    AttemptError, AttemptOutcome, DeletionAttempt, DeletionPlan, ErrorClass, Inventory,
    PlanAction, RunMode, RunReport, RunRequest, ScanError, SkipReason,
};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    /// Accounts processed at the same time.
    pub max_concurrent_accounts: usize,
    pub protection: ProtectionRules,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_concurrent_accounts: 1,
            protection: ProtectionRules::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_concurrent_accounts == 0 {
            return Err(CoreError::ConfigError(
                "max_concurrent_accounts must be at least 1".to_string(),
            ));
        }
        self.retry.validate()
    }
}

/// Where an account's inventory comes from.
#[derive(Clone, Copy)]
enum InventorySource<'a> {
    Scan,
    Snapshot(&'a [Inventory]),
}

/// Outcome of one account, folded into the report in request order.
struct AccountRun {
    account: AccountRef,
    started: bool,
    cancelled: bool,
    scan_errors: Vec<ScanError>,
    attempts: Vec<DeletionAttempt>,
    error: Option<CoreError>,
}

impl AccountRun {
    fn new(account: &AccountRef, started: bool) -> Self {
        Self {
            account: account.clone(),
            started,
            cancelled: false,
            scan_errors: Vec::new(),
            attempts: Vec::new(),
            error: None,
        }
    }
}

/// The central controller.
pub struct DeletionOrchestrator {
    registry: Arc<dyn ApiRegistry>,
    observer: Arc<dyn RunObserver>,
    scheduler: RetryScheduler,
    config: OrchestratorConfig,
}

impl DeletionOrchestrator {
    pub fn new(registry: Arc<dyn ApiRegistry>, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            observer: Arc::new(NoopRunObserver),
            scheduler: RetryScheduler::new(config.retry.clone()),
            config,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Scan, plan and execute every requested account.
    ///
    /// Only a request that must not start is an error. Per-resource and
    /// per-account failures end up in the report.
    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> CoreResult<RunReport> {
        request.validate()?;
        self.config.validate()?;
        Ok(self
            .run_accounts(&request.accounts, request.mode, InventorySource::Scan, cancel)
            .await)
    }

    /// Execute previously captured inventories instead of scanning.
    ///
    /// Each requested account is matched to a snapshot by account id and region;
    /// an account without one is aborted with a configuration error.
    pub async fn run_inventory(
        &self,
        request: &RunRequest,
        inventories: &[Inventory],
        cancel: &CancellationToken,
    ) -> CoreResult<RunReport> {
        request.validate()?;
        self.config.validate()?;
        Ok(self
            .run_accounts(
                &request.accounts,
                request.mode,
                InventorySource::Snapshot(inventories),
                cancel,
            )
            .await)
    }

    /// Scan one account without deleting anything.
    pub async fn scan(&self, account: &AccountRef) -> CoreResult<Inventory> {
        let api = self.api_for(account).await?;
        InventoryScanner::new(api.as_ref(), &self.config.protection)
            .scan(account)
            .await
    }

    async fn api_for(&self, account: &AccountRef) -> CoreResult<Arc<dyn CloudResourceApi>> {
        self.registry
            .get(&account.account_id)
            .await
            .ok_or_else(|| CoreError::ApiClientNotFound(account.account_id.clone()))
    }

    async fn run_accounts(
        &self,
        accounts: &[AccountRef],
        mode: RunMode,
        source: InventorySource<'_>,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut aggregator = ReportAggregator::new(mode);
        log::info!(
            "Run {} started: mode={mode}, accounts={}",
            aggregator.run_id(),
            accounts.len()
        );

        let semaphore = Semaphore::new(self.config.max_concurrent_accounts.max(1));
        let runs = join_all(accounts.iter().map(|account| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return AccountRun::new(account, false);
                };
                if cancel.is_cancelled() {
                    log::warn!("[{account}] run cancelled before the account started");
                    return AccountRun::new(account, false);
                }
                self.process_account(account, source, mode, cancel).await
            }
        }))
        .await;

        for run in runs {
            if !run.started {
                aggregator.record_account_skipped(&run.account);
                aggregator.mark_cancelled();
                continue;
            }
            aggregator.record_account(&run.account);
            if run.cancelled {
                aggregator.mark_cancelled();
            }
            for scan_error in run.scan_errors {
                aggregator.record_scan_error(scan_error);
            }
            for attempt in run.attempts {
                aggregator.record(attempt);
            }
            if let Some(error) = &run.error {
                aggregator.record_account_error(&run.account, error);
            }
        }

        let report = aggregator.finalize();
        log::info!(
            "Run {} finished: {} deleted, {} VPC(s) disassociated, {} failed, {} skipped{}",
            report.run_id,
            report.summary.total_deleted(),
            report.summary.total_vpcs_disassociated,
            report.summary.total_failed_deletions,
            report.summary.total_skipped,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }

    async fn process_account(
        &self,
        account: &AccountRef,
        source: InventorySource<'_>,
        mode: RunMode,
        cancel: &CancellationToken,
    ) -> AccountRun {
        let mut run = AccountRun::new(account, true);
        self.observer.on_account_started(account, mode).await;
        log::info!("[{account}] processing account");

        let result = self
            .execute_account(account, source, mode, cancel, &mut run)
            .await;
        if let Err(e) = &result {
            if e.is_expected() {
                log::warn!("[{account}] account aborted: {e}");
            } else {
                log::error!("[{account}] account aborted: {e}");
            }
        }
        self.observer
            .on_account_finished(account, result.as_ref().err())
            .await;
        run.error = result.err();
        run
    }

    async fn execute_account(
        &self,
        account: &AccountRef,
        source: InventorySource<'_>,
        mode: RunMode,
        cancel: &CancellationToken,
        run: &mut AccountRun,
    ) -> CoreResult<()> {
        let api = self.api_for(account).await?;
        let inventory = match source {
            InventorySource::Scan => {
                InventoryScanner::new(api.as_ref(), &self.config.protection)
                    .scan(account)
                    .await?
            }
            InventorySource::Snapshot(inventories) => {
                let mut inventory = inventories
                    .iter()
                    .find(|i| {
                        i.account.account_id == account.account_id
                            && i.account.region == account.region
                    })
                    .cloned()
                    .ok_or_else(|| {
                        CoreError::ConfigError(format!("no inventory captured for {account}"))
                    })?;
                self.config.protection.apply(&mut inventory);
                inventory
            }
        };
        run.scan_errors.clone_from(&inventory.scan_errors);

        let plan = DependencyGraphBuilder::build(&inventory);
        log::info!("[{account}] planned {} action(s)", plan.len());

        let mut execution = PlanExecution {
            label: account.to_string(),
            account,
            api: api.as_ref(),
            scheduler: &self.scheduler,
            simulator: DryRunSimulator::new(mode),
            observer: self.observer.as_ref(),
            entries: plan
                .steps()
                .map(|step| Entry {
                    action: step.action.clone(),
                    hold: step.hold,
                    state: ResourceState::Pending,
                    last_error: None,
                })
                .collect(),
            attempts: Vec::new(),
        };
        run.cancelled = !execution.execute(&plan, cancel).await;
        run.attempts = execution.attempts;
        Ok(())
    }
}

struct Entry {
    action: PlanAction,
    hold: Option<SkipReason>,
    state: ResourceState,
    last_error: Option<AttemptError>,
}

/// Execution of one account's plan.
struct PlanExecution<'a> {
    label: String,
    account: &'a AccountRef,
    api: &'a dyn CloudResourceApi,
    scheduler: &'a RetryScheduler,
    simulator: DryRunSimulator,
    observer: &'a dyn RunObserver,
    /// Plan steps, flattened in execution order.
    entries: Vec<Entry>,
    attempts: Vec<DeletionAttempt>,
}

impl PlanExecution<'_> {
    /// Returns `false` when the run was cancelled part way.
    async fn execute(&mut self, plan: &DeletionPlan, cancel: &CancellationToken) -> bool {
        let mut offset = 0;
        for phase in &plan.phases {
            let range = offset..offset + phase.steps.len();
            offset = range.end;
            if range.is_empty() {
                continue;
            }
            if cancel.is_cancelled() {
                self.cancel_remaining();
                return false;
            }

            log::info!(
                "[{}] phase {} ({}): {} action(s)",
                self.label,
                phase.resource_type.precedence(),
                phase.resource_type,
                range.len()
            );
            self.observer
                .on_phase_started(self.account, phase.resource_type, range.len())
                .await;
            for index in range {
                self.dispatch(index).await;
            }

            if !self.deferred_pass(cancel).await {
                self.cancel_remaining();
                return false;
            }
        }

        while self.entries.iter().any(|e| e.state.is_deferred()) {
            if !self.deferred_pass(cancel).await {
                self.cancel_remaining();
                return false;
            }
        }
        true
    }

    /// Retry every deferred action once, in plan order.
    ///
    /// Returns `false` when cancelled before the pass.
    async fn deferred_pass(&mut self, cancel: &CancellationToken) -> bool {
        let deferred: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state.is_deferred())
            .map(|(i, _)| i)
            .collect();
        if deferred.is_empty() {
            return true;
        }
        if cancel.is_cancelled() {
            return false;
        }

        let delay = self.scheduler.backoff(
            deferred
                .iter()
                .filter_map(|&i| self.entries[i].last_error.as_ref()),
        );
        log::info!(
            "[{}] retrying {} deferred action(s) in {}ms",
            self.label,
            deferred.len(),
            delay.as_millis()
        );
        tokio::select! {
            () = cancel.cancelled() => return false,
            () = tokio::time::sleep(delay) => {}
        }

        for index in deferred {
            self.dispatch(index).await;
        }
        true
    }

    async fn dispatch(&mut self, index: usize) {
        let entry = &self.entries[index];
        let action = entry.action.clone();
        let attempt = if let Some(reason) = entry.hold {
            DeletionAttempt::skipped(&self.label, action, reason)
        } else {
            let attempt_count = entry.state.attempts() + 1;
            log::debug!("[{}] {action} (attempt {attempt_count})", self.label);
            self.scheduler
                .attempt(
                    &self.label,
                    &action,
                    attempt_count,
                    self.simulator.dispatch(self.api, &action),
                )
                .await
        };
        self.record(index, attempt).await;
    }

    async fn record(&mut self, index: usize, attempt: DeletionAttempt) {
        let entry = &mut self.entries[index];
        entry.state = entry.state.transition(attempt.outcome);
        entry.last_error.clone_from(&attempt.error);

        let message = attempt
            .error
            .as_ref()
            .map(|e| truncate_for_log(&e.message))
            .unwrap_or_default();
        match attempt.outcome {
            AttemptOutcome::Succeeded if attempt.already_absent => {
                log::debug!("[{}] {} already gone", self.label, attempt.target);
            }
            AttemptOutcome::Succeeded => {}
            AttemptOutcome::Deferred => log::warn!(
                "[{}] {} deferred after attempt {}: {message}",
                self.label,
                attempt.target,
                attempt.attempt_count
            ),
            AttemptOutcome::Failed => {
                let unexpected = attempt
                    .error
                    .as_ref()
                    .is_some_and(|e| e.class == ErrorClass::Unexpected);
                if unexpected {
                    log::error!("[{}] {} failed: {message}", self.label, attempt.target);
                } else {
                    log::warn!("[{}] {} failed: {message}", self.label, attempt.target);
                }
            }
            AttemptOutcome::Skipped => {
                log::info!(
                    "[{}] {} skipped ({:?})",
                    self.label,
                    attempt.target,
                    attempt.skip_reason
                );
            }
        }

        self.observer.on_attempt(&attempt).await;
        self.attempts.push(attempt);
    }

    /// Close out everything left after a cancellation.
    fn cancel_remaining(&mut self) {
        log::warn!("[{}] run cancelled, finalizing remaining actions", self.label);
        for entry in &mut self.entries {
            let attempt = match entry.state {
                ResourceState::Pending => DeletionAttempt::skipped(
                    &self.label,
                    entry.action.clone(),
                    entry.hold.unwrap_or(SkipReason::Cancelled),
                ),
                ResourceState::Deferred { attempts } => {
                    let class = entry
                        .last_error
                        .as_ref()
                        .map_or(ErrorClass::TransientInUse, |e| e.class);
                    // Takes the count of the retry that never ran; no call is made.
                    DeletionAttempt::new(
                        &self.label,
                        entry.action.clone(),
                        AttemptOutcome::Failed,
                        attempts + 1,
                    )
                    .with_error(AttemptError::new(
                        class,
                        "run cancelled before deferred retry",
                    ))
                }
                _ => continue,
            };
            entry.state = entry.state.transition(attempt.outcome);
            self.attempts.push(attempt);
        }
    }
}
