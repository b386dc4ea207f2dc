//! Scanned inventory

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use dns_purge_provider::{AccountRef, ErrorClass, ResourceRecord, ResourceType, ZoneAssociation};

/// A listing that failed during scanning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanError {
    pub account: String,
    pub resource_type: ResourceType,
    /// Zone being described when the failure happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub class: ErrorClass,
    pub error: String,
}

/// Everything deletable found in one account/region.
///
/// Unordered; [`DependencyGraphBuilder`](crate::services::DependencyGraphBuilder)
/// turns it into a plan. Can be saved and replayed with
/// [`DeletionOrchestrator::run_inventory`](crate::services::DeletionOrchestrator::run_inventory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub account: AccountRef,
    pub records: Vec<ResourceRecord>,
    pub associations: Vec<ZoneAssociation>,
    #[serde(default)]
    pub scan_errors: Vec<ScanError>,
    /// Zones whose detail or record sets could not be listed. Their
    /// associations or record sets are unknown, so they are never deleted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub incomplete_zones: BTreeSet<String>,
}

impl Inventory {
    pub fn new(account: AccountRef) -> Self {
        Self {
            account,
            records: Vec::new(),
            associations: Vec::new(),
            scan_errors: Vec::new(),
            incomplete_zones: BTreeSet::new(),
        }
    }

    /// At least one listing failed, so the inventory may be incomplete.
    pub fn is_partial(&self) -> bool {
        !self.scan_errors.is_empty()
    }

    pub fn count(&self, resource_type: ResourceType) -> usize {
        self.records
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.associations.is_empty()
    }
}
