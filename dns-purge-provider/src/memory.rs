//! In-memory cloud account
//!
//! A dependency-aware stand-in for a real DNS hosting API. It enforces the same
//! "still in use" rules the real service does, so deletion ordering bugs surface
//! as `ResourceInUse` errors rather than silently succeeding:
//!
//! - a hosted zone cannot be deleted while it holds non-managed record sets, VPC
//!   associations, query logging configs or traffic policy instances
//! - a health check cannot be deleted while a live record set references it
//! - a reusable delegation set cannot be deleted while a live zone uses it
//! - a traffic policy cannot be deleted while instances of it exist
//!
//! A *reference lag* keeps health checks and delegation sets reported as in use for
//! a number of further delete calls after their last referrer disappears, mimicking
//! the propagation window of the real service.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ProviderError, Result};
use crate::traits::CloudResourceApi;
use crate::types::{
    AccountRef, HostedZoneDetail, RecordSet, ResourceRecord, ResourceType, ZoneAssociation,
};

const PROVIDER: &str = "memory";

#[derive(Debug, Clone)]
struct ZoneEntry {
    name: String,
    private_zone: bool,
    associations: Vec<ZoneAssociation>,
    record_sets: Vec<RecordSet>,
    delegation_set_id: Option<String>,
}

#[derive(Debug, Clone)]
struct AttachedEntry {
    name: String,
    zone_id: Option<String>,
    parent_id: Option<String>,
}

/// Counters of mutating calls, for asserting that a dry run touched nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub delete: usize,
    pub disassociate: usize,
}

#[derive(Debug, Default)]
struct AccountState {
    zones: BTreeMap<String, ZoneEntry>,
    query_logging_configs: BTreeMap<String, AttachedEntry>,
    traffic_policies: BTreeMap<String, AttachedEntry>,
    traffic_policy_instances: BTreeMap<String, AttachedEntry>,
    health_checks: BTreeMap<String, AttachedEntry>,
    delegation_sets: BTreeMap<String, AttachedEntry>,
    protected_ids: Vec<String>,
    reference_lag: u32,
    lingering: HashMap<String, u32>,
    faults: HashMap<String, ProviderError>,
    transient_faults: HashMap<String, VecDeque<ProviderError>>,
    list_failures: HashMap<ResourceType, ProviderError>,
    describe_failures: HashMap<String, ProviderError>,
    calls: CallCounts,
}

/// In-memory implementation of [`CloudResourceApi`] for a single account.
pub struct InMemoryCloudApi {
    account: AccountRef,
    state: Mutex<AccountState>,
}

impl InMemoryCloudApi {
    pub fn new(account: AccountRef) -> Self {
        Self {
            account,
            state: Mutex::new(AccountState::default()),
        }
    }

    pub fn account(&self) -> &AccountRef {
        &self.account
    }

    fn lock(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Seeding =====

    /// Add a public zone. Apex `NS` and `SOA` record sets are created with it.
    pub fn add_public_zone(&self, zone_id: &str, name: &str) {
        self.insert_zone(zone_id, name, false, &[]);
    }

    /// Add a private zone associated with the given VPC ids.
    pub fn add_private_zone(&self, zone_id: &str, name: &str, vpc_ids: &[&str]) {
        self.insert_zone(zone_id, name, true, vpc_ids);
    }

    fn insert_zone(&self, zone_id: &str, name: &str, private_zone: bool, vpc_ids: &[&str]) {
        let associations = vpc_ids
            .iter()
            .map(|vpc_id| ZoneAssociation {
                zone_id: zone_id.to_string(),
                vpc_id: (*vpc_id).to_string(),
                region: self.account.region.clone(),
            })
            .collect();
        let entry = ZoneEntry {
            name: name.to_string(),
            private_zone,
            associations,
            record_sets: vec![RecordSet::new(name, "NS"), RecordSet::new(name, "SOA")],
            delegation_set_id: None,
        };
        self.lock().zones.insert(zone_id.to_string(), entry);
    }

    /// Add a record set to an existing zone. Unknown zones are ignored.
    pub fn add_record_set(&self, zone_id: &str, record_set: RecordSet) {
        if let Some(zone) = self.lock().zones.get_mut(zone_id) {
            zone.record_sets.push(record_set);
        }
    }

    pub fn add_health_check(&self, id: &str, name: &str) {
        self.lock()
            .health_checks
            .insert(id.to_string(), attached(name, None, None));
    }

    /// Add a delegation set, optionally used by an existing zone.
    pub fn add_delegation_set(&self, id: &str, name: &str, used_by_zone: Option<&str>) {
        let mut state = self.lock();
        state
            .delegation_sets
            .insert(id.to_string(), attached(name, None, None));
        if let Some(zone) = used_by_zone.and_then(|z| state.zones.get_mut(z)) {
            zone.delegation_set_id = Some(id.to_string());
        }
    }

    pub fn add_query_logging_config(&self, id: &str, zone_id: &str) {
        self.lock().query_logging_configs.insert(
            id.to_string(),
            attached(&format!("query-log-{zone_id}"), Some(zone_id), None),
        );
    }

    pub fn add_traffic_policy(&self, id: &str, name: &str) {
        self.lock()
            .traffic_policies
            .insert(id.to_string(), attached(name, None, None));
    }

    pub fn add_traffic_policy_instance(
        &self,
        id: &str,
        name: &str,
        policy_id: &str,
        zone_id: &str,
    ) {
        self.lock().traffic_policy_instances.insert(
            id.to_string(),
            attached(name, Some(zone_id), Some(policy_id)),
        );
    }

    /// Report the resource as protected when listed.
    pub fn mark_protected(&self, id: &str) {
        self.lock().protected_ids.push(id.to_string());
    }

    /// Keep released health checks and delegation sets in use for `lag` more deletes.
    pub fn set_reference_lag(&self, lag: u32) {
        self.lock().reference_lag = lag;
    }

    // ===== Fault injection =====

    /// Every mutating call on `key` fails with `error`.
    ///
    /// `key` is a resource id, or `zone_id/vpc_id` for associations.
    pub fn inject_fault(&self, key: &str, error: ProviderError) {
        self.lock().faults.insert(key.to_string(), error);
    }

    /// The next `times` mutating calls on `key` fail with `error`.
    pub fn inject_transient_fault(&self, key: &str, error: &ProviderError, times: usize) {
        let mut state = self.lock();
        let queue = state.transient_faults.entry(key.to_string()).or_default();
        queue.extend(std::iter::repeat_n(error.clone(), times));
    }

    /// Listing `resource_type` fails with `error`.
    pub fn fail_listing(&self, resource_type: ResourceType, error: ProviderError) {
        self.lock().list_failures.insert(resource_type, error);
    }

    /// Describing zone `zone_id` fails with `error`.
    pub fn fail_describe_zone(&self, zone_id: &str, error: ProviderError) {
        self.lock()
            .describe_failures
            .insert(zone_id.to_string(), error);
    }

    // ===== Inspection =====

    pub fn call_counts(&self) -> CallCounts {
        self.lock().calls
    }

    /// Whether a resource of the given type still exists.
    pub fn contains(&self, resource_type: ResourceType, id: &str) -> bool {
        let state = self.lock();
        match resource_type {
            ResourceType::QueryLoggingConfig => state.query_logging_configs.contains_key(id),
            ResourceType::TrafficPolicyInstance => state.traffic_policy_instances.contains_key(id),
            ResourceType::TrafficPolicy => state.traffic_policies.contains_key(id),
            ResourceType::HostedZoneRecordSet => state.zones.iter().any(|(zone_id, zone)| {
                zone.record_sets
                    .iter()
                    .any(|rs| record_set_id(zone_id, rs) == id)
            }),
            ResourceType::HostedZone => state.zones.contains_key(id),
            ResourceType::HealthCheck => state.health_checks.contains_key(id),
            ResourceType::ReusableDelegationSet => state.delegation_sets.contains_key(id),
        }
    }

    /// Total number of live resources of every type, managed records excluded.
    pub fn resource_count(&self) -> usize {
        let state = self.lock();
        let record_sets: usize = state
            .zones
            .values()
            .map(|zone| {
                zone.record_sets
                    .iter()
                    .filter(|rs| !rs.is_managed(&zone.name))
                    .count()
            })
            .sum();
        state.zones.len()
            + record_sets
            + state.query_logging_configs.len()
            + state.traffic_policies.len()
            + state.traffic_policy_instances.len()
            + state.health_checks.len()
            + state.delegation_sets.len()
    }

    pub fn association_count(&self) -> usize {
        self.lock().zones.values().map(|z| z.associations.len()).sum()
    }
}

fn attached(name: &str, zone_id: Option<&str>, parent_id: Option<&str>) -> AttachedEntry {
    AttachedEntry {
        name: name.to_string(),
        zone_id: zone_id.map(ToString::to_string),
        parent_id: parent_id.map(ToString::to_string),
    }
}

/// Record set ids are `zone_id/name/type[/set_identifier]`.
pub fn record_set_id(zone_id: &str, record_set: &RecordSet) -> String {
    format!("{zone_id}/{}", record_set.identity())
}

fn in_use(resource_id: &str, reason: &str) -> ProviderError {
    ProviderError::ResourceInUse {
        provider: PROVIDER.to_string(),
        resource_id: resource_id.to_string(),
        raw_message: Some(reason.to_string()),
    }
}

fn not_found(resource_id: &str) -> ProviderError {
    ProviderError::NotFound {
        provider: PROVIDER.to_string(),
        resource_id: resource_id.to_string(),
    }
}

impl AccountState {
    fn take_fault(&mut self, key: &str) -> Option<ProviderError> {
        if let Some(queue) = self.transient_faults.get_mut(key)
            && let Some(error) = queue.pop_front()
        {
            return Some(error);
        }
        self.faults.get(key).cloned()
    }

    /// Returns an in-use error while the resource is inside its propagation window.
    fn check_lingering(&mut self, id: &str) -> Result<()> {
        if let Some(remaining) = self.lingering.get_mut(id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(in_use(id, "reference is still propagating"));
        }
        Ok(())
    }

    fn health_check_referenced(&self, id: &str) -> bool {
        self.zones.values().any(|zone| {
            zone.record_sets
                .iter()
                .any(|rs| rs.health_check_id.as_deref() == Some(id))
        })
    }

    fn release(&mut self, id: Option<String>) {
        if let Some(id) = id
            && self.reference_lag > 0
        {
            self.lingering.insert(id, self.reference_lag);
        }
    }

    fn list_records(
        &self,
        account: &AccountRef,
        resource_type: ResourceType,
    ) -> Vec<ResourceRecord> {
        let entries = match resource_type {
            ResourceType::QueryLoggingConfig => &self.query_logging_configs,
            ResourceType::TrafficPolicyInstance => &self.traffic_policy_instances,
            ResourceType::TrafficPolicy => &self.traffic_policies,
            ResourceType::HealthCheck => &self.health_checks,
            ResourceType::ReusableDelegationSet => &self.delegation_sets,
            ResourceType::HostedZone => {
                return self
                    .zones
                    .iter()
                    .map(|(id, zone)| {
                        ResourceRecord::new(resource_type, id, &zone.name, account)
                            .with_zone(id)
                            .with_metadata(json!({
                                "private_zone": zone.private_zone,
                                "delegation_set_id": zone.delegation_set_id,
                            }))
                    })
                    .map(|r| self.flag_protected(r))
                    .collect();
            }
            ResourceType::HostedZoneRecordSet => return Vec::new(),
        };
        entries
            .iter()
            .map(|(id, entry)| {
                let mut record = ResourceRecord::new(resource_type, id, &entry.name, account);
                if let Some(zone_id) = &entry.zone_id {
                    record = record.with_zone(zone_id);
                }
                if let Some(parent_id) = &entry.parent_id {
                    record = record.with_metadata(json!({ "parent_id": parent_id }));
                }
                self.flag_protected(record)
            })
            .collect()
    }

    fn flag_protected(&self, record: ResourceRecord) -> ResourceRecord {
        if self.protected_ids.contains(&record.id) {
            record.protected()
        } else {
            record
        }
    }

    fn delete_zone(&mut self, id: &str) -> Result<()> {
        let zone = self.zones.get(id).ok_or_else(|| not_found(id))?;
        if zone
            .record_sets
            .iter()
            .any(|rs| !rs.is_managed(&zone.name))
        {
            return Err(in_use(id, "hosted zone still contains non-required record sets"));
        }
        if !zone.associations.is_empty() {
            return Err(in_use(id, "hosted zone is still associated with VPCs"));
        }
        let zone_ref = Some(id.to_string());
        if self.query_logging_configs.values().any(|q| q.zone_id == zone_ref) {
            return Err(in_use(id, "hosted zone still has a query logging config"));
        }
        if self
            .traffic_policy_instances
            .values()
            .any(|t| t.zone_id == zone_ref)
        {
            return Err(in_use(id, "hosted zone still has traffic policy instances"));
        }
        let removed = self.zones.remove(id).and_then(|z| z.delegation_set_id);
        let still_used = removed.as_ref().is_some_and(|ds| {
            self.zones
                .values()
                .any(|z| z.delegation_set_id.as_ref() == Some(ds))
        });
        if !still_used {
            self.release(removed);
        }
        Ok(())
    }

    fn delete_record_set(&mut self, record: &ResourceRecord) -> Result<()> {
        let zone_id = record.zone_id.as_deref().ok_or_else(|| ProviderError::ValidationError {
            provider: PROVIDER.to_string(),
            detail: format!("record set '{}' has no zone id", record.id),
        })?;
        let zone = self.zones.get_mut(zone_id).ok_or_else(|| not_found(&record.id))?;
        let index = zone
            .record_sets
            .iter()
            .position(|rs| record_set_id(zone_id, rs) == record.id)
            .ok_or_else(|| not_found(&record.id))?;
        if zone.record_sets[index].is_managed(&zone.name) {
            return Err(ProviderError::ValidationError {
                provider: PROVIDER.to_string(),
                detail: "the apex NS and SOA record sets cannot be deleted".to_string(),
            });
        }
        let removed = zone.record_sets.remove(index);
        if let Some(health_check_id) = removed.health_check_id
            && !self.health_check_referenced(&health_check_id)
        {
            self.release(Some(health_check_id));
        }
        Ok(())
    }

    fn delete(&mut self, record: &ResourceRecord) -> Result<()> {
        let id = record.id.as_str();
        match record.resource_type {
            ResourceType::QueryLoggingConfig => remove_entry(&mut self.query_logging_configs, id),
            ResourceType::TrafficPolicyInstance => {
                remove_entry(&mut self.traffic_policy_instances, id)
            }
            ResourceType::TrafficPolicy => {
                let parent = Some(id.to_string());
                if self
                    .traffic_policy_instances
                    .values()
                    .any(|i| i.parent_id == parent)
                {
                    return Err(in_use(id, "traffic policy still has instances"));
                }
                remove_entry(&mut self.traffic_policies, id)
            }
            ResourceType::HostedZoneRecordSet => self.delete_record_set(record),
            ResourceType::HostedZone => self.delete_zone(id),
            ResourceType::HealthCheck => {
                if !self.health_checks.contains_key(id) {
                    return Err(not_found(id));
                }
                if self.health_check_referenced(id) {
                    return Err(in_use(id, "health check is referenced by a record set"));
                }
                self.check_lingering(id)?;
                remove_entry(&mut self.health_checks, id)
            }
            ResourceType::ReusableDelegationSet => {
                if !self.delegation_sets.contains_key(id) {
                    return Err(not_found(id));
                }
                if self
                    .zones
                    .values()
                    .any(|z| z.delegation_set_id.as_deref() == Some(id))
                {
                    return Err(in_use(id, "delegation set is used by a hosted zone"));
                }
                self.check_lingering(id)?;
                remove_entry(&mut self.delegation_sets, id)
            }
        }
    }
}

fn remove_entry(entries: &mut BTreeMap<String, AttachedEntry>, id: &str) -> Result<()> {
    entries.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
}

#[async_trait]
impl CloudResourceApi for InMemoryCloudApi {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn list(
        &self,
        account: &AccountRef,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceRecord>> {
        let state = self.lock();
        if let Some(error) = state.list_failures.get(&resource_type) {
            return Err(error.clone());
        }
        if resource_type.is_zone_scoped() {
            return Err(ProviderError::ValidationError {
                provider: PROVIDER.to_string(),
                detail: "record sets must be listed per hosted zone".to_string(),
            });
        }
        Ok(state.list_records(account, resource_type))
    }

    async fn get_hosted_zone(
        &self,
        _account: &AccountRef,
        zone_id: &str,
    ) -> Result<HostedZoneDetail> {
        let state = self.lock();
        if let Some(error) = state.describe_failures.get(zone_id) {
            return Err(error.clone());
        }
        let zone = state.zones.get(zone_id).ok_or_else(|| not_found(zone_id))?;
        Ok(HostedZoneDetail {
            zone_id: zone_id.to_string(),
            name: zone.name.clone(),
            private_zone: zone.private_zone,
            associations: zone.associations.clone(),
            delegation_set_id: zone.delegation_set_id.clone(),
        })
    }

    async fn list_record_sets(
        &self,
        _account: &AccountRef,
        zone: &ResourceRecord,
    ) -> Result<Vec<RecordSet>> {
        let state = self.lock();
        if let Some(error) = state.list_failures.get(&ResourceType::HostedZoneRecordSet) {
            return Err(error.clone());
        }
        state
            .zones
            .get(&zone.id)
            .map(|z| z.record_sets.clone())
            .ok_or_else(|| not_found(&zone.id))
    }

    async fn delete(&self, record: &ResourceRecord) -> Result<()> {
        let mut state = self.lock();
        state.calls.delete += 1;
        if let Some(error) = state.take_fault(&record.id) {
            return Err(error);
        }
        log::debug!("[{PROVIDER}] delete {} {}", record.resource_type, record.id);
        state.delete(record)
    }

    async fn disassociate(&self, association: &ZoneAssociation) -> Result<()> {
        let mut state = self.lock();
        state.calls.disassociate += 1;
        let key = format!("{}/{}", association.zone_id, association.vpc_id);
        if let Some(error) = state.take_fault(&key) {
            return Err(error);
        }
        let zone = state
            .zones
            .get_mut(&association.zone_id)
            .ok_or_else(|| not_found(&association.zone_id))?;
        let before = zone.associations.len();
        zone.associations.retain(|a| a.vpc_id != association.vpc_id);
        if zone.associations.len() == before {
            return Err(not_found(&key));
        }
        Ok(())
    }
}
