#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `AppStateBuilder`, `AppConfig` and report persistence.

use std::path::Path;
use std::sync::Arc;

use dns_purge_app::{AppConfig, AppStateBuilder, ReportWriter};
use dns_purge_core::error::CoreError;
use dns_purge_core::traits::{ApiRegistry, InMemoryApiRegistry};
use dns_purge_core::types::{AccountRef, CONFIRMATION_TOKEN, RunMode, RunReport, RunRequest};
use dns_purge_provider::{InMemoryCloudApi, RecordSet};
use tokio_util::sync::CancellationToken;

fn account() -> AccountRef {
    AccountRef::new("111122223333", "us-east-1")
}

/// Public zone with two records plus a health check used by one of them.
fn seeded_api() -> Arc<InMemoryCloudApi> {
    let api = InMemoryCloudApi::new(account());
    api.add_public_zone("Z1", "example.com.");
    api.add_health_check("hc-1", "www-health");
    api.add_record_set(
        "Z1",
        RecordSet::new("www.example.com.", "A").with_health_check("hc-1"),
    );
    api.add_record_set("Z1", RecordSet::new("mail.example.com.", "MX"));
    Arc::new(api)
}

async fn registry(api: Arc<InMemoryCloudApi>) -> Arc<InMemoryApiRegistry> {
    let registry = Arc::new(InMemoryApiRegistry::new());
    registry.register(account().account_id, api).await;
    registry
}

fn config_in(dir: &Path) -> AppConfig {
    AppConfig {
        phase_backoff_ms: 0,
        report_dir: dir.join("reports"),
        ..AppConfig::default()
    }
}

fn written_reports(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir.join("reports")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

// ===== Builder =====

#[test]
fn build_without_registry_is_a_config_error() {
    let result = AppStateBuilder::new().build();
    assert!(matches!(result, Err(CoreError::ConfigError(_))));
}

#[test]
fn build_rejects_invalid_config() {
    let config = AppConfig {
        max_concurrent_accounts: 0,
        ..AppConfig::default()
    };
    let result = AppStateBuilder::new()
        .config(config)
        .api_registry(Arc::new(InMemoryApiRegistry::new()))
        .build();
    assert!(matches!(result, Err(CoreError::ConfigError(_))));
}

#[test]
fn build_rejects_rate_limit_budget_above_max_attempts() {
    let config = AppConfig {
        max_attempts: 2,
        rate_limited_max_attempts: 4,
        ..AppConfig::default()
    };
    let result = AppStateBuilder::new()
        .config(config)
        .api_registry(Arc::new(InMemoryApiRegistry::new()))
        .build();
    assert!(matches!(result, Err(CoreError::ConfigError(_))));
}

// ===== Config =====

#[test]
fn load_config_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "max_attempts": 4,
            "max_concurrent_accounts": 3,
            "protection": { "zone_names": ["corp.example.com."], "resource_ids": ["hc-9"] },
            "report_dir": "/var/lib/dns-purge"
        }"#,
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.max_attempts, 4);
    assert_eq!(config.rate_limited_max_attempts, 2);

    let orchestrator = config.to_orchestrator_config();
    assert_eq!(orchestrator.retry.max_attempts, 4);
    assert_eq!(orchestrator.max_concurrent_accounts, 3);
    assert!(orchestrator.protection.protects_zone_name("CORP.example.com"));
    assert!(orchestrator.protection.resource_ids.contains("hc-9"));
}

#[test]
fn load_rejects_malformed_json() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, "{ max_attempts: ").unwrap();
    assert!(matches!(
        AppConfig::load(&path),
        Err(CoreError::ConfigError(_))
    ));
}

#[test]
fn load_reports_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let result = AppConfig::load(tmp.path().join("absent.json"));
    assert!(matches!(result, Err(CoreError::ConfigError(_))));
}

// ===== Runs =====

#[tokio::test]
async fn simulate_run_writes_report_and_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let api = seeded_api();
    let state = AppStateBuilder::new()
        .config(config_in(tmp.path()))
        .api_registry(registry(api.clone()).await)
        .build()
        .unwrap();

    let outcome = state
        .run(
            &RunRequest::simulate(vec![account()]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(api.call_counts().delete, 0);
    assert_eq!(outcome.report.summary.total_record_sets_deleted, 2);
    assert_eq!(outcome.report.summary.total_hosted_zones_deleted, 1);
    assert_eq!(outcome.report.summary.total_health_checks_deleted, 1);

    let path = outcome.report_path.expect("report should be written");
    assert_eq!(written_reports(tmp.path()), vec![path.clone()]);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(name, ReportWriter::file_name(&outcome.report));
    assert!(name.starts_with("dns_purge_report_simulate_"));
    assert!(name.ends_with(".json"));

    let persisted: RunReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted.run_id, outcome.report.run_id);
    assert_eq!(persisted.summary, outcome.report.summary);
    assert_eq!(persisted.mode, RunMode::Simulate);
}

#[tokio::test]
async fn execute_run_empties_the_account() {
    let tmp = tempfile::tempdir().unwrap();
    let api = seeded_api();
    let state = AppStateBuilder::new()
        .config(config_in(tmp.path()))
        .api_registry(registry(api.clone()).await)
        .build()
        .unwrap();

    let outcome = state
        .run(
            &RunRequest::execute(vec![account()], CONFIRMATION_TOKEN),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.report.is_success());
    assert_eq!(api.resource_count(), 0);
    let name = outcome.report_path.unwrap();
    assert!(
        name.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dns_purge_report_execute_")
    );
}

#[tokio::test]
async fn rejected_request_writes_no_report() {
    let tmp = tempfile::tempdir().unwrap();
    let api = seeded_api();
    let state = AppStateBuilder::new()
        .config(config_in(tmp.path()))
        .api_registry(registry(api.clone()).await)
        .build()
        .unwrap();

    let result = state
        .run(
            &RunRequest::execute(vec![account()], "please"),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(CoreError::InvalidConfirmationToken)));
    assert!(written_reports(tmp.path()).is_empty());
    assert_eq!(api.resource_count(), 4);
}

#[tokio::test]
async fn protected_zone_from_config_is_left_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let api = seeded_api();
    let mut config = config_in(tmp.path());
    config
        .protection
        .zone_names
        .insert("example.com".to_string());
    let state = AppStateBuilder::new()
        .config(config)
        .api_registry(registry(api.clone()).await)
        .build()
        .unwrap();

    let outcome = state
        .run(
            &RunRequest::execute(vec![account()], CONFIRMATION_TOKEN),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Zone and both records are skipped; the unattached health check still
    // cannot go because a live record references it.
    assert_eq!(outcome.report.summary.total_skipped, 3);
    assert_eq!(outcome.report.summary.total_hosted_zones_deleted, 0);
    assert_eq!(outcome.report.summary.total_failed_deletions, 1);
    assert_eq!(
        outcome.report.details.failed[0].resource.key(),
        "delete:health_checks:hc-1"
    );
    assert_eq!(api.resource_count(), 4);
}
