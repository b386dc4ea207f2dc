//! 删除编排服务层
//!
//! Leaves first: [`InventoryScanner`] → [`DependencyGraphBuilder`] →
//! [`RetryScheduler`] / [`DryRunSimulator`] → [`DeletionOrchestrator`] →
//! [`ReportAggregator`].

mod orchestrator;
mod planner;
mod report_aggregator;
mod retry;
mod scanner;
mod simulator;
mod state;

pub use orchestrator::{DeletionOrchestrator, OrchestratorConfig};
pub use planner::DependencyGraphBuilder;
pub use report_aggregator::ReportAggregator;
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy, RetryScheduler};
pub use scanner::{InventoryScanner, ProtectionRules};
pub use simulator::{Dispatch, DryRunSimulator};
pub use state::ResourceState;
