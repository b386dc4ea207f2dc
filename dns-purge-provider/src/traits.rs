use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AccountRef, HostedZoneDetail, RecordSet, ResourceRecord, ResourceType, ZoneAssociation,
};

/// Cloud DNS resource API for one account.
///
/// Read operations (`list`, `get_hosted_zone`, `list_record_sets`) must be free of
/// side effects. `delete` and `disassociate` are the only mutating calls; a
/// `NotFound` error from them means the resource is already gone.
#[async_trait]
pub trait CloudResourceApi: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// List every resource of a non-zone-scoped type.
    ///
    /// Record sets are listed through [`list_record_sets`](Self::list_record_sets).
    async fn list(
        &self,
        account: &AccountRef,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceRecord>>;

    /// Describe a hosted zone, including its VPC associations when private.
    async fn get_hosted_zone(
        &self,
        account: &AccountRef,
        zone_id: &str,
    ) -> Result<HostedZoneDetail>;

    /// List all record sets of a zone, managed apex records included.
    async fn list_record_sets(
        &self,
        account: &AccountRef,
        zone: &ResourceRecord,
    ) -> Result<Vec<RecordSet>>;

    /// Delete one resource.
    async fn delete(&self, record: &ResourceRecord) -> Result<()>;

    /// Remove a private zone's association with a VPC. Never touches the VPC.
    async fn disassociate(&self, association: &ZoneAssociation) -> Result<()>;
}
