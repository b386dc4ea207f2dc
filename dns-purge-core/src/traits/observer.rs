//! Run event hooks

use dns_purge_provider::{AccountRef, ResourceType};

use crate::error::CoreError;
use crate::types::{DeletionAttempt, RunMode};

/// Structured events emitted while a run progresses.
///
/// Front ends implement this to render progress or forward events to their own
/// sinks. Every method has a no-op default; use [`NoopRunObserver`] when nothing
/// needs to listen. Calls for one account arrive in order; calls for different
/// accounts may interleave when accounts run concurrently.
#[async_trait::async_trait]
pub trait RunObserver: Send + Sync {
    /// Called before an account is scanned.
    async fn on_account_started(&self, _account: &AccountRef, _mode: RunMode) {}

    /// Called before the steps of a phase are dispatched.
    async fn on_phase_started(
        &self,
        _account: &AccountRef,
        _resource_type: ResourceType,
        _steps: usize,
    ) {
    }

    /// Called for every attempt, including skipped ones.
    async fn on_attempt(&self, _attempt: &DeletionAttempt) {}

    /// Called once per started account. `error` is set when the account was aborted.
    async fn on_account_finished(&self, _account: &AccountRef, _error: Option<&CoreError>) {}
}

/// Observer that ignores every event.
pub struct NoopRunObserver;

#[async_trait::async_trait]
impl RunObserver for NoopRunObserver {}
