//! # dns-purge-provider
//!
//! Resource model and API abstraction for decommissioning the DNS hosting
//! resources of a cloud account.
//!
//! ## Resource Types
//!
//! | Precedence | Type | Notes |
//! |-----------|------|-------|
//! | 1 | Query logging config | Attached to a hosted zone |
//! | 2 | Traffic policy instance | Writes records into a zone |
//! | 3 | Traffic policy | Blocked by its instances |
//! | 4 | Record set | Apex `NS`/`SOA` are managed and never deleted |
//! | 5 | Hosted zone | Private zones are disassociated from VPCs first |
//! | 6 | Health check | May stay referenced briefly after its zone is gone |
//! | 7 | Reusable delegation set | May stay referenced briefly after its zone is gone |
//!
//! VPCs are not a resource type. A private zone's VPC link is a
//! [`ZoneAssociation`], which can only be *disassociated*.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dns_purge_provider::{AccountRef, CloudResourceApi, InMemoryCloudApi, ResourceType};
//!
//! # async fn example() -> dns_purge_provider::Result<()> {
//! let account = AccountRef::new("111122223333", "us-east-1");
//! let api = InMemoryCloudApi::new(account.clone());
//! api.add_public_zone("Z1", "example.com.");
//!
//! for zone in api.list(&account, ResourceType::HostedZone).await? {
//!     let detail = api.get_hosted_zone(&account, &zone.id).await?;
//!     println!("{} private={}", detail.name, detail.private_zone);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError).
//! [`ProviderError::class`] maps every variant to an [`ErrorClass`]:
//!
//! - [`ErrorClass::TransientInUse`]: dependency race or timeout, retry later
//! - [`ErrorClass::RateLimited`]: throttled, retry later
//! - [`ErrorClass::NotFound`]: already gone, treated as success
//! - anything else: terminal

mod error;
mod memory;
mod traits;
mod types;
pub mod utils;

// Re-export error types
pub use error::{ErrorClass, ProviderError, Result};

// Re-export the API trait
pub use traits::CloudResourceApi;

// Re-export the in-memory backend
pub use memory::{CallCounts, InMemoryCloudApi, record_set_id};

// Re-export types
pub use types::{
    AccountRef, HostedZoneDetail, RecordSet, ResourceRecord, ResourceType, ZoneAssociation,
    same_dns_name,
};
