//! Dry-run interception
//!
//! The single choke point through which every side-effecting call passes. In
//! simulate mode nothing reaches the API, so a dry run and a real run walk the
//! same plan through the same scheduler.

use dns_purge_provider::{CloudResourceApi, Result};

use crate::types::{PlanAction, RunMode};

/// Result of routing one action.
#[derive(Debug)]
pub struct Dispatch {
    pub result: Result<()>,
    /// The call was intercepted and never issued.
    pub simulated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DryRunSimulator {
    mode: RunMode,
}

impl DryRunSimulator {
    pub fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Issue the action, or report synthetic success in simulate mode.
    pub async fn dispatch(&self, api: &dyn CloudResourceApi, action: &PlanAction) -> Dispatch {
        if self.mode.is_simulate() {
            log::debug!("[dry-run] would {action}");
            return Dispatch {
                result: Ok(()),
                simulated: true,
            };
        }

        let result = match action {
            PlanAction::Disassociate(association) => api.disassociate(association).await,
            PlanAction::Delete(record) => api.delete(record).await,
        };
        Dispatch {
            result,
            simulated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{private_zone_account, test_account};
    use dns_purge_provider::{ResourceType, ZoneAssociation};

    fn disassociation() -> PlanAction {
        PlanAction::Disassociate(ZoneAssociation {
            zone_id: "Z1".into(),
            vpc_id: "vpc-1".into(),
            region: "us-east-1".into(),
        })
    }

    #[tokio::test]
    async fn simulate_never_reaches_the_api() {
        let api = private_zone_account(test_account());
        let dispatch = DryRunSimulator::new(RunMode::Simulate)
            .dispatch(&api, &disassociation())
            .await;

        assert!(dispatch.simulated);
        assert!(dispatch.result.is_ok());
        assert_eq!(api.call_counts().disassociate, 0);
        assert_eq!(api.association_count(), 1);
    }

    #[tokio::test]
    async fn execute_passes_through() {
        let api = private_zone_account(test_account());
        let dispatch = DryRunSimulator::new(RunMode::Execute)
            .dispatch(&api, &disassociation())
            .await;

        assert!(!dispatch.simulated);
        assert!(dispatch.result.is_ok());
        assert_eq!(api.call_counts().disassociate, 1);
        assert_eq!(api.association_count(), 0);
        assert!(api.contains(ResourceType::HostedZone, "Z1"));
    }
}
