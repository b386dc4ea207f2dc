//! Platform-agnostic application bootstrap for DNS Purge.
//!
//! Provides `AppConfig` (JSON configuration), `AppState` (orchestrator plus
//! report persistence) and `AppStateBuilder` (collaborator injection). Front
//! ends resolve accounts, register one API client per account and hand a
//! `RunRequest` to [`AppState::run`].

mod config;
mod report_writer;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use dns_purge_core::error::{CoreError, CoreResult};
use dns_purge_core::services::DeletionOrchestrator;
use dns_purge_core::traits::{ApiRegistry, NoopRunObserver, RunObserver};
use dns_purge_core::types::{RunReport, RunRequest};

pub use config::AppConfig;
pub use report_writer::ReportWriter;

/// Result of [`AppState::run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// `None` when the report could not be written; the failure is logged.
    pub report_path: Option<PathBuf>,
}

/// Platform-agnostic application state.
///
/// Every front end constructs this once at startup via `AppStateBuilder`.
pub struct AppState {
    pub config: AppConfig,
    pub api_registry: Arc<dyn ApiRegistry>,
    pub orchestrator: DeletionOrchestrator,
    pub report_writer: ReportWriter,
}

impl AppState {
    /// Run the orchestrator and persist its report.
    ///
    /// A rejected request is returned as an error and writes nothing.
    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> CoreResult<RunOutcome> {
        let report = self.orchestrator.run(request, cancel).await?;

        let report_path = match self.report_writer.write(&report).await {
            Ok(path) => Some(path),
            Err(e) => {
                log::error!("Failed to persist report {}: {e}", report.run_id);
                None
            }
        };
        if !report.is_success() {
            log::warn!(
                "Run {} finished with {} failed deletion(s) and {} account error(s)",
                report.run_id,
                report.summary.total_failed_deletions,
                report.account_errors.len()
            );
        }
        Ok(RunOutcome {
            report,
            report_path,
        })
    }
}

/// Builder for constructing `AppState`.
///
/// # Required
/// - `api_registry`: one API client per account
///
/// # Optional
/// - `config`: defaults to `AppConfig::default()`
/// - `observer`: defaults to `NoopRunObserver`
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    api_registry: Option<Arc<dyn ApiRegistry>>,
    observer: Option<Arc<dyn RunObserver>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            api_registry: None,
            observer: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn api_registry(mut self, registry: Arc<dyn ApiRegistry>) -> Self {
        self.api_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if the registry is missing or the
    /// configuration is invalid.
    pub fn build(self) -> CoreResult<AppState> {
        let api_registry = self
            .api_registry
            .ok_or_else(|| CoreError::ConfigError("api_registry is required".to_string()))?;
        let config = self.config.unwrap_or_default();
        let orchestrator_config = config.to_orchestrator_config();
        orchestrator_config.validate()?;

        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopRunObserver));
        let orchestrator =
            DeletionOrchestrator::new(Arc::clone(&api_registry), orchestrator_config)
                .with_observer(observer);
        let report_writer = ReportWriter::new(config.report_dir.clone());

        Ok(AppState {
            config,
            api_registry,
            orchestrator,
            report_writer,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
