//! API client registry abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use dns_purge_provider::CloudResourceApi;

/// API client registry Trait
///
/// Holds one [`CloudResourceApi`] client per account, indexed by `account_id`.
/// Credential resolution happens before registration; the engine only ever looks
/// clients up. Provides a default memory implementation, `InMemoryApiRegistry`.
#[async_trait]
pub trait ApiRegistry: Send + Sync {
    /// Register the client of an account
    ///
    /// # Arguments
    /// * `account_id` - Account ID
    /// * `api` - API client bound to that account's credentials
    async fn register(&self, account_id: String, api: Arc<dyn CloudResourceApi>);

    /// Remove the client of an account
    async fn unregister(&self, account_id: &str);

    /// Get the client of an account
    async fn get(&self, account_id: &str) -> Option<Arc<dyn CloudResourceApi>>;

    /// List all registered `account_id`
    async fn list_account_ids(&self) -> Vec<String>;
}

/// In-memory API client registry
#[derive(Clone)]
pub struct InMemoryApiRegistry {
    clients: Arc<RwLock<HashMap<String, Arc<dyn CloudResourceApi>>>>,
}

impl InMemoryApiRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiRegistry for InMemoryApiRegistry {
    async fn register(&self, account_id: String, api: Arc<dyn CloudResourceApi>) {
        self.clients.write().await.insert(account_id, api);
    }

    async fn unregister(&self, account_id: &str) {
        self.clients.write().await.remove(account_id);
    }

    async fn get(&self, account_id: &str) -> Option<Arc<dyn CloudResourceApi>> {
        self.clients.read().await.get(account_id).cloned()
    }

    async fn list_account_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clients.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_purge_provider::{AccountRef, InMemoryCloudApi};

    #[tokio::test]
    async fn register_get_unregister() {
        let registry = InMemoryApiRegistry::new();
        let api = Arc::new(InMemoryCloudApi::new(AccountRef::new("222", "us-east-1")));
        registry.register("222".to_string(), api.clone()).await;
        registry.register("111".to_string(), api).await;

        assert!(registry.get("222").await.is_some());
        assert_eq!(registry.list_account_ids().await, vec!["111", "222"]);

        registry.unregister("222").await;
        assert!(registry.get("222").await.is_none());
    }
}
