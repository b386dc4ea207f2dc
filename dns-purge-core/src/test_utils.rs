//! 测试辅助模块
//!
//! 提供预置的内存账户、慢速 API 包装和事件记录器。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use dns_purge_provider::{
    AccountRef, CloudResourceApi, HostedZoneDetail, InMemoryCloudApi, RecordSet, ResourceRecord,
    ResourceType, Result, ZoneAssociation,
};

use crate::error::CoreError;
use crate::services::{OrchestratorConfig, RetryPolicy};
use crate::traits::{ApiRegistry, InMemoryApiRegistry, RunObserver};
use crate::types::{DeletionAttempt, RunMode};

// ===== Fixtures =====

pub fn test_account() -> AccountRef {
    AccountRef::new("111122223333", "us-east-1")
}

/// One private zone `Z1` associated with `vpc-1`, three non-managed records and
/// health check `hc-1` referenced by one of them.
///
/// The health check stays in use for one delete call after its last referencing
/// record is gone.
pub fn private_zone_account(account: AccountRef) -> InMemoryCloudApi {
    let api = InMemoryCloudApi::new(account);
    api.add_private_zone("Z1", "internal.example.", &["vpc-1"]);
    api.add_health_check("hc-1", "web-health");
    api.add_record_set(
        "Z1",
        RecordSet::new("web.internal.example.", "A").with_health_check("hc-1"),
    );
    api.add_record_set("Z1", RecordSet::new("api.internal.example.", "CNAME"));
    api.add_record_set("Z1", RecordSet::new("internal.example.", "TXT"));
    api.set_reference_lag(1);
    api
}

/// Default config without waits between phases.
pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        retry: RetryPolicy {
            phase_backoff: Duration::ZERO,
            call_timeout: Duration::from_secs(5),
            ..RetryPolicy::default()
        },
        ..OrchestratorConfig::default()
    }
}

/// Registry holding each API under its own account id.
pub async fn registry_with(apis: &[Arc<InMemoryCloudApi>]) -> Arc<InMemoryApiRegistry> {
    let registry = Arc::new(InMemoryApiRegistry::new());
    for api in apis {
        registry
            .register(api.account().account_id.clone(), api.clone())
            .await;
    }
    registry
}

// ===== SlowApi =====

/// Delays every mutating call, to exercise the per-call timeout.
pub struct SlowApi {
    inner: InMemoryCloudApi,
    delay: Duration,
}

impl SlowApi {
    pub fn new(inner: InMemoryCloudApi, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl CloudResourceApi for SlowApi {
    fn id(&self) -> &'static str {
        "slow"
    }

    async fn list(
        &self,
        account: &AccountRef,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceRecord>> {
        self.inner.list(account, resource_type).await
    }

    async fn get_hosted_zone(
        &self,
        account: &AccountRef,
        zone_id: &str,
    ) -> Result<HostedZoneDetail> {
        self.inner.get_hosted_zone(account, zone_id).await
    }

    async fn list_record_sets(
        &self,
        account: &AccountRef,
        zone: &ResourceRecord,
    ) -> Result<Vec<RecordSet>> {
        self.inner.list_record_sets(account, zone).await
    }

    async fn delete(&self, record: &ResourceRecord) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(record).await
    }

    async fn disassociate(&self, association: &ZoneAssociation) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.disassociate(association).await
    }
}

// ===== RecordingObserver =====

#[derive(Default)]
enum CancelTrigger {
    #[default]
    Never,
    Phase(ResourceType),
    FirstAttempt,
}

/// Records event names and can fire a cancellation token on a chosen event.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
    trigger: CancelTrigger,
    cancel: Option<CancellationToken>,
}

impl RecordingObserver {
    pub fn cancel_on_phase(resource_type: ResourceType, cancel: CancellationToken) -> Self {
        Self {
            trigger: CancelTrigger::Phase(resource_type),
            cancel: Some(cancel),
            ..Self::default()
        }
    }

    pub fn cancel_on_attempt(cancel: CancellationToken) -> Self {
        Self {
            trigger: CancelTrigger::FirstAttempt,
            cancel: Some(cancel),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: String) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn fire(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }
}

#[async_trait]
impl RunObserver for RecordingObserver {
    async fn on_account_started(&self, _account: &AccountRef, _mode: RunMode) {
        self.push("account_started".to_string());
    }

    async fn on_phase_started(
        &self,
        _account: &AccountRef,
        resource_type: ResourceType,
        steps: usize,
    ) {
        self.push(format!("phase:{}:{steps}", resource_type.report_key()));
        if matches!(self.trigger, CancelTrigger::Phase(t) if t == resource_type) {
            self.fire();
        }
    }

    async fn on_attempt(&self, attempt: &DeletionAttempt) {
        self.push(format!("attempt:{}", attempt.key()));
        if matches!(self.trigger, CancelTrigger::FirstAttempt) {
            self.fire();
        }
    }

    async fn on_account_finished(&self, _account: &AccountRef, _error: Option<&CoreError>) {
        self.push("account_finished".to_string());
    }
}
