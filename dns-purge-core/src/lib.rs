//! DNS Purge Core Library
//!
//! Dependency-ordered deletion engine for decommissioning every DNS hosting
//! resource of a cloud account:
//! - Inventory scanning ([`InventoryScanner`](services::InventoryScanner))
//! - Deletion planning by type precedence ([`DependencyGraphBuilder`](services::DependencyGraphBuilder))
//! - Deferred retries for resources still in use ([`RetryScheduler`](services::RetryScheduler))
//! - Dry runs that walk the exact same plan ([`DryRunSimulator`](services::DryRunSimulator))
//! - Run reports ([`RunReport`](types::RunReport))
//!
//! The engine never talks to a cloud directly: API clients are looked up through
//! an [`ApiRegistry`], so any [`CloudResourceApi`](dns_purge_provider::CloudResourceApi)
//! implementation can be plugged in.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dns_purge_core::services::{DeletionOrchestrator, OrchestratorConfig};
//! use dns_purge_core::traits::{ApiRegistry, InMemoryApiRegistry};
//! use dns_purge_core::types::{AccountRef, RunRequest};
//! use dns_purge_provider::InMemoryCloudApi;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> dns_purge_core::CoreResult<()> {
//! let account = AccountRef::new("111122223333", "us-east-1");
//! let registry = Arc::new(InMemoryApiRegistry::new());
//! registry
//!     .register(account.account_id.clone(), Arc::new(InMemoryCloudApi::new(account.clone())))
//!     .await;
//!
//! let orchestrator = DeletionOrchestrator::new(registry, OrchestratorConfig::default());
//! let report = orchestrator
//!     .run(&RunRequest::simulate(vec![account]), &CancellationToken::new())
//!     .await?;
//! println!("{}", report.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{DeletionOrchestrator, OrchestratorConfig};
pub use traits::{ApiRegistry, RunObserver};
