//! Inventory scanning

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::json;

use dns_purge_provider::utils::log_sanitizer::truncate_for_log;
use dns_purge_provider::{
    AccountRef, CloudResourceApi, ProviderError, RecordSet, ResourceRecord, ResourceType,
    record_set_id, same_dns_name,
};

use crate::error::{CoreError, CoreResult};
use crate::types::{Inventory, ScanError};

/// Resources that must survive a run.
///
/// Protected resources are still planned so the report shows them, but they are
/// never dispatched. Protecting a zone protects everything attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionRules {
    /// Exact resource ids.
    pub resource_ids: BTreeSet<String>,
    /// Hosted zone names, compared case-insensitively without the trailing dot.
    pub zone_names: BTreeSet<String>,
}

impl ProtectionRules {
    pub fn is_empty(&self) -> bool {
        self.resource_ids.is_empty() && self.zone_names.is_empty()
    }

    pub fn protects_zone_name(&self, name: &str) -> bool {
        self.zone_names.iter().any(|n| same_dns_name(n, name))
    }

    /// Flag every protected record of `inventory`.
    pub fn apply(&self, inventory: &mut Inventory) {
        let protected_zones: HashSet<String> = inventory
            .records
            .iter()
            .filter(|r| r.resource_type == ResourceType::HostedZone)
            .filter(|r| {
                r.is_protected
                    || self.resource_ids.contains(&r.id)
                    || self.protects_zone_name(&r.name)
            })
            .map(|r| r.id.clone())
            .collect();

        for record in &mut inventory.records {
            let in_protected_zone = record
                .zone_id
                .as_ref()
                .is_some_and(|z| protected_zones.contains(z));
            if in_protected_zone || self.resource_ids.contains(&record.id) {
                record.is_protected = true;
            }
        }
    }
}

/// Enumerates every deletable resource of one account.
///
/// Read-only: only list and describe calls are issued.
pub struct InventoryScanner<'a> {
    api: &'a dyn CloudResourceApi,
    protection: &'a ProtectionRules,
}

impl<'a> InventoryScanner<'a> {
    pub fn new(api: &'a dyn CloudResourceApi, protection: &'a ProtectionRules) -> Self {
        Self { api, protection }
    }

    /// Scan one account.
    ///
    /// A failed listing becomes a [`ScanError`] and scanning continues with the
    /// next type. A zone whose detail or record sets fail to list is marked
    /// incomplete. Rejected credentials abort the account.
    pub async fn scan(&self, account: &AccountRef) -> CoreResult<Inventory> {
        let mut inventory = Inventory::new(account.clone());

        for resource_type in ResourceType::ALL {
            if resource_type.is_zone_scoped() {
                continue;
            }
            match self.api.list(account, resource_type).await {
                Ok(records) => {
                    log::debug!("[{account}] found {} {resource_type}(s)", records.len());
                    inventory.records.extend(records);
                }
                Err(e) => listing_failed(&mut inventory, resource_type, None, e)?,
            }
        }

        let zones: Vec<ResourceRecord> = inventory
            .records
            .iter()
            .filter(|r| r.resource_type == ResourceType::HostedZone)
            .cloned()
            .collect();
        for zone in &zones {
            self.scan_zone(account, zone, &mut inventory).await?;
        }

        self.protection.apply(&mut inventory);

        log::info!(
            "[{account}] scanned {} resource(s), {} VPC association(s), {} scan error(s)",
            inventory.records.len(),
            inventory.associations.len(),
            inventory.scan_errors.len()
        );
        Ok(inventory)
    }

    async fn scan_zone(
        &self,
        account: &AccountRef,
        zone: &ResourceRecord,
        inventory: &mut Inventory,
    ) -> CoreResult<()> {
        match self.api.get_hosted_zone(account, &zone.id).await {
            Ok(detail) if detail.private_zone => {
                inventory.associations.extend(detail.associations);
            }
            Ok(_) => {}
            Err(e) => {
                listing_failed(inventory, ResourceType::HostedZone, Some(&zone.id), e)?;
                inventory.incomplete_zones.insert(zone.id.clone());
            }
        }

        match self.api.list_record_sets(account, zone).await {
            Ok(record_sets) => {
                let records = record_sets
                    .into_iter()
                    .filter(|rs| !rs.is_managed(&zone.name))
                    .map(|rs| record_set_record(account, zone, rs));
                inventory.records.extend(records);
            }
            Err(e) => {
                listing_failed(
                    inventory,
                    ResourceType::HostedZoneRecordSet,
                    Some(&zone.id),
                    e,
                )?;
                inventory.incomplete_zones.insert(zone.id.clone());
            }
        }
        Ok(())
    }
}

fn listing_failed(
    inventory: &mut Inventory,
    resource_type: ResourceType,
    zone_id: Option<&str>,
    error: ProviderError,
) -> CoreResult<()> {
    let account = inventory.account.to_string();
    if matches!(error, ProviderError::InvalidCredentials { .. }) {
        return Err(CoreError::CredentialFailure {
            account,
            message: error.to_string(),
        });
    }

    let message = truncate_for_log(&error.to_string());
    if error.is_expected() {
        log::warn!("[{account}] listing {resource_type} failed: {message}");
    } else {
        log::error!("[{account}] listing {resource_type} failed: {message}");
    }
    inventory.scan_errors.push(ScanError {
        account,
        resource_type,
        zone_id: zone_id.map(ToString::to_string),
        class: error.class(),
        error: error.to_string(),
    });
    Ok(())
}

fn record_set_record(account: &AccountRef, zone: &ResourceRecord, rs: RecordSet) -> ResourceRecord {
    ResourceRecord::new(
        ResourceType::HostedZoneRecordSet,
        record_set_id(&zone.id, &rs),
        &rs.name,
        account,
    )
    .with_zone(&zone.id)
    .with_metadata(json!({
        "record_type": rs.record_type,
        "set_identifier": rs.set_identifier,
        "health_check_id": rs.health_check_id,
        "raw": rs.raw,
    }))
}
