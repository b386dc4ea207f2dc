use std::fmt;

use serde::{Deserialize, Serialize};

// ============ Accounts ============

/// One `(account, region, credential)` target produced by account resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    /// Cloud account identifier.
    pub account_id: String,
    /// Region the API client is bound to.
    pub region: String,
    /// Opaque handle used by the client factory to locate credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_handle: Option<String>,
}

impl AccountRef {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            credential_handle: None,
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.region)
    }
}

// ============ Resource types ============

/// Every deletable DNS resource type, in deletion precedence.
///
/// The discriminant is the precedence: a resource of type *N* is never attempted
/// before every resource of a type below *N* in the same account has been attempted
/// at least once. VPCs are intentionally absent; they can only ever be disassociated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    QueryLoggingConfig = 1,
    TrafficPolicyInstance = 2,
    TrafficPolicy = 3,
    HostedZoneRecordSet = 4,
    HostedZone = 5,
    HealthCheck = 6,
    ReusableDelegationSet = 7,
}

impl ResourceType {
    /// All types in deletion order.
    pub const ALL: [Self; 7] = [
        Self::QueryLoggingConfig,
        Self::TrafficPolicyInstance,
        Self::TrafficPolicy,
        Self::HostedZoneRecordSet,
        Self::HostedZone,
        Self::HealthCheck,
        Self::ReusableDelegationSet,
    ];

    /// Deletion precedence (1 = first).
    #[must_use]
    pub fn precedence(self) -> u8 {
        self as u8
    }

    /// Plural snake-case key used in report field names.
    #[must_use]
    pub fn report_key(self) -> &'static str {
        match self {
            Self::QueryLoggingConfig => "query_logging_configs",
            Self::TrafficPolicyInstance => "traffic_policy_instances",
            Self::TrafficPolicy => "traffic_policies",
            Self::HostedZoneRecordSet => "record_sets",
            Self::HostedZone => "hosted_zones",
            Self::HealthCheck => "health_checks",
            Self::ReusableDelegationSet => "delegation_sets",
        }
    }

    /// Record sets can only be listed through their hosted zone.
    #[must_use]
    pub fn is_zone_scoped(self) -> bool {
        matches!(self, Self::HostedZoneRecordSet)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::QueryLoggingConfig => "query logging config",
            Self::TrafficPolicyInstance => "traffic policy instance",
            Self::TrafficPolicy => "traffic policy",
            Self::HostedZoneRecordSet => "record set",
            Self::HostedZone => "hosted zone",
            Self::HealthCheck => "health check",
            Self::ReusableDelegationSet => "reusable delegation set",
        };
        f.write_str(name)
    }
}

// ============ Resources ============

/// One deletable unit discovered during scanning.
///
/// Records are immutable once scanned; outcomes are tracked separately, keyed by
/// the record's action key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub resource_type: ResourceType,
    pub id: String,
    pub name: String,
    pub account: String,
    pub region: String,
    /// Owning hosted zone, for record sets and zones themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub raw_metadata: serde_json::Value,
}

impl ResourceRecord {
    pub fn new(
        resource_type: ResourceType,
        id: impl Into<String>,
        name: impl Into<String>,
        account: &AccountRef,
    ) -> Self {
        Self {
            resource_type,
            id: id.into(),
            name: name.into(),
            account: account.account_id.clone(),
            region: account.region.clone(),
            zone_id: None,
            is_protected: false,
            raw_metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, raw_metadata: serde_json::Value) -> Self {
        self.raw_metadata = raw_metadata;
        self
    }

    #[must_use]
    pub fn protected(mut self) -> Self {
        self.is_protected = true;
        self
    }
}

/// Link between a private hosted zone and a VPC.
///
/// Removing it is a disassociation; the VPC itself is never a deletion target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneAssociation {
    pub zone_id: String,
    pub vpc_id: String,
    pub region: String,
}

/// Hosted zone details needed to plan its teardown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedZoneDetail {
    pub zone_id: String,
    pub name: String,
    pub private_zone: bool,
    /// VPC associations; always empty for public zones.
    #[serde(default)]
    pub associations: Vec<ZoneAssociation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_set_id: Option<String>,
}

/// A DNS record set as listed inside a hosted zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub name: String,
    /// DNS type (`A`, `CNAME`, `NS`, ...).
    pub record_type: String,
    /// Distinguishes weighted/latency/failover members sharing name and type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_id: Option<String>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl RecordSet {
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            set_identifier: None,
            health_check_id: None,
            raw: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_health_check(mut self, health_check_id: impl Into<String>) -> Self {
        self.health_check_id = Some(health_check_id.into());
        self
    }

    #[must_use]
    pub fn with_set_identifier(mut self, set_identifier: impl Into<String>) -> Self {
        self.set_identifier = Some(set_identifier.into());
        self
    }

    /// Stable identifier within a zone: `name/type[/set_identifier]`.
    pub fn identity(&self) -> String {
        match &self.set_identifier {
            Some(set_id) => format!("{}/{}/{}", self.name, self.record_type, set_id),
            None => format!("{}/{}", self.name, self.record_type),
        }
    }

    /// Apex `NS`/`SOA` records are owned by the zone and go away with it.
    pub fn is_managed(&self, zone_name: &str) -> bool {
        let kind = self.record_type.to_ascii_uppercase();
        (kind == "NS" || kind == "SOA") && same_dns_name(&self.name, zone_name)
    }
}

/// Case-insensitive DNS name comparison that ignores the trailing root dot.
pub fn same_dns_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_follows_declaration_order() {
        let precedences: Vec<u8> = ResourceType::ALL.iter().map(|t| t.precedence()).collect();
        assert_eq!(precedences, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(ResourceType::HostedZoneRecordSet < ResourceType::HostedZone);
        assert!(ResourceType::HostedZone < ResourceType::HealthCheck);
    }

    #[test]
    fn apex_ns_and_soa_are_managed() {
        assert!(RecordSet::new("example.com.", "NS").is_managed("example.com."));
        assert!(RecordSet::new("Example.COM", "soa").is_managed("example.com."));
        assert!(!RecordSet::new("sub.example.com.", "NS").is_managed("example.com."));
        assert!(!RecordSet::new("example.com.", "TXT").is_managed("example.com."));
    }

    #[test]
    fn record_set_identity_includes_set_identifier() {
        let plain = RecordSet::new("www.example.com.", "A");
        assert_eq!(plain.identity(), "www.example.com./A");
        let weighted = plain.with_set_identifier("blue");
        assert_eq!(weighted.identity(), "www.example.com./A/blue");
    }

    #[test]
    fn resource_type_serializes_snake_case() {
        let json = serde_json::to_string(&ResourceType::ReusableDelegationSet).unwrap();
        assert_eq!(json, "\"reusable_delegation_set\"");
    }
}
