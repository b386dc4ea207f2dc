//! Deletion planning
//!
//! Turns an unordered [`Inventory`] into a [`DeletionPlan`]. Pure and
//! deterministic: no I/O, and the same inventory always yields the same plan.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use dns_purge_provider::{ResourceRecord, ResourceType, ZoneAssociation};

use crate::types::{DeletionPlan, Inventory, Phase, PlanAction, PlanStep, SkipReason};

/// Orders an inventory by [`ResourceType`] precedence.
///
/// The per-zone order *disassociate VPCs → delete record sets → delete zone* is
/// laid out across two phases: the record-set phase holds, zone by zone, the
/// zone's disassociations followed by its record sets, and the hosted-zone phase
/// holds the zones themselves. Every type-4 action therefore still precedes
/// every type-5 action.
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    pub fn build(inventory: &Inventory) -> DeletionPlan {
        // Keyed by id so duplicates collapse and iteration is sorted.
        let mut by_type: BTreeMap<ResourceType, BTreeMap<&str, &ResourceRecord>> =
            BTreeMap::new();
        for record in &inventory.records {
            by_type
                .entry(record.resource_type)
                .or_default()
                .insert(record.id.as_str(), record);
        }

        let zones = by_type
            .get(&ResourceType::HostedZone)
            .cloned()
            .unwrap_or_default();
        let holds = Holds {
            protected_zones: zones
                .values()
                .filter(|z| z.is_protected)
                .map(|z| z.id.as_str())
                .collect(),
            incomplete_zones: &inventory.incomplete_zones,
        };

        let phases = ResourceType::ALL
            .into_iter()
            .map(|resource_type| {
                let records = by_type.get(&resource_type).cloned().unwrap_or_default();
                let steps = match resource_type {
                    ResourceType::HostedZoneRecordSet => {
                        zone_teardown_steps(&zones, &records, &inventory.associations, &holds)
                    }
                    _ => records.values().map(|r| holds.delete_step(r)).collect(),
                };
                Phase {
                    resource_type,
                    steps,
                }
            })
            .collect();

        DeletionPlan {
            account: inventory.account.clone(),
            phases,
        }
    }
}

/// Decides which steps are held back instead of dispatched.
///
/// Protection wins over an incomplete scan. An incomplete zone only holds the
/// zone deletion itself; its known associations and record sets still go.
struct Holds<'a> {
    protected_zones: HashSet<&'a str>,
    incomplete_zones: &'a BTreeSet<String>,
}

impl Holds<'_> {
    fn delete_step(&self, record: &ResourceRecord) -> PlanStep {
        let in_protected_zone = record
            .zone_id
            .as_deref()
            .is_some_and(|z| self.protected_zones.contains(z));
        let hold = if record.is_protected || in_protected_zone {
            Some(SkipReason::Protected)
        } else if record.resource_type == ResourceType::HostedZone
            && self.incomplete_zones.contains(&record.id)
        {
            Some(SkipReason::IncompleteScan)
        } else {
            None
        };
        PlanStep {
            action: PlanAction::Delete(record.clone()),
            hold,
        }
    }

    fn disassociate_step(&self, association: &ZoneAssociation) -> PlanStep {
        PlanStep {
            action: PlanAction::Disassociate(association.clone()),
            hold: self
                .protected_zones
                .contains(association.zone_id.as_str())
                .then_some(SkipReason::Protected),
        }
    }
}

/// Record-set phase: per zone, VPC disassociations then record sets.
///
/// Associations and record sets whose zone is not in the inventory come last.
fn zone_teardown_steps(
    zones: &BTreeMap<&str, &ResourceRecord>,
    record_sets: &BTreeMap<&str, &ResourceRecord>,
    associations: &[ZoneAssociation],
    holds: &Holds<'_>,
) -> Vec<PlanStep> {
    let mut sorted_associations: Vec<&ZoneAssociation> = associations.iter().collect();
    sorted_associations.sort_by(|a, b| (&a.zone_id, &a.vpc_id).cmp(&(&b.zone_id, &b.vpc_id)));
    sorted_associations.dedup();

    let mut steps = Vec::with_capacity(sorted_associations.len() + record_sets.len());
    for zone_id in zones.keys() {
        steps.extend(
            sorted_associations
                .iter()
                .filter(|a| a.zone_id == *zone_id)
                .map(|a| holds.disassociate_step(a)),
        );
        steps.extend(
            record_sets
                .values()
                .filter(|r| r.zone_id.as_deref() == Some(*zone_id))
                .map(|r| holds.delete_step(r)),
        );
    }

    let is_orphan = |zone_id: Option<&str>| zone_id.is_none_or(|z| !zones.contains_key(z));
    steps.extend(
        sorted_associations
            .iter()
            .filter(|a| is_orphan(Some(&a.zone_id)))
            .map(|a| holds.disassociate_step(a)),
    );
    let mut orphans: Vec<&ResourceRecord> = record_sets
        .values()
        .copied()
        .filter(|r| is_orphan(r.zone_id.as_deref()))
        .collect();
    orphans.sort_by(|a, b| (&a.zone_id, &a.id).cmp(&(&b.zone_id, &b.id)));
    steps.extend(orphans.into_iter().map(|r| holds.delete_step(r)));

    steps
}
