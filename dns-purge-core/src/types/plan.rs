//! Deletion plan

use serde::{Deserialize, Serialize};

use super::{PlanAction, SkipReason};
use dns_purge_provider::{AccountRef, ResourceType};

/// One planned action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub action: PlanAction,
    /// Held steps are recorded as skipped with this reason and never
    /// dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<SkipReason>,
}

impl PlanStep {
    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }
}

/// All actions for one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub resource_type: ResourceType,
    pub steps: Vec<PlanStep>,
}

/// Phases in deletion precedence, one per [`ResourceType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionPlan {
    pub account: AccountRef,
    pub phases: Vec<Phase>,
}

impl DeletionPlan {
    /// Steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.phases.iter().flat_map(|p| p.steps.iter())
    }

    pub fn len(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self, resource_type: ResourceType) -> Option<&Phase> {
        self.phases.iter().find(|p| p.resource_type == resource_type)
    }
}
