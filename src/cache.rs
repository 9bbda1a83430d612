use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::api::StorageApi;
use crate::error::{Error, Result};
use crate::resource_id::{ResourceId, ResourceIdError};

/// Process-wide lookup tables for storage account metadata.
///
/// Two tables share one reader/writer lock: account name to owning resource
/// group, and (resource group, account name) to primary access key. Entries
/// are written once and never invalidated; the underlying mappings are
/// immutable for the life of the process, so a cached answer stays
/// authoritative. The lock is held only for the map access itself, never
/// across a network call.
#[derive(Debug, Default)]
pub struct StorageCache {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    resource_groups: HashMap<String, String>,
    account_keys: HashMap<(String, String), String>,
}

impl StorageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resource_group(&self, account_name: &str) -> Option<String> {
        let tables = self.tables.read().await;
        tables.resource_groups.get(account_name).cloned()
    }

    pub async fn put_resource_group(&self, account_name: String, resource_group: String) {
        let mut tables = self.tables.write().await;
        tables.resource_groups.insert(account_name, resource_group);
    }

    pub async fn account_key(&self, resource_group: &str, account_name: &str) -> Option<String> {
        let tables = self.tables.read().await;
        tables
            .account_keys
            .get(&(resource_group.to_string(), account_name.to_string()))
            .cloned()
    }

    pub async fn put_account_key(
        &self,
        resource_group: String,
        account_name: String,
        key: String,
    ) {
        let mut tables = self.tables.write().await;
        tables
            .account_keys
            .insert((resource_group, account_name), key);
    }
}

/// Read-through resolution of storage account metadata.
///
/// Each lookup probes the shared [`StorageCache`] first and only reaches the
/// [`StorageApi`] collaborator on a miss. Clones share the same cache and
/// client, so a value resolved through one handle is a hit on every other.
///
/// Concurrent first-misses on one key are not deduplicated: each caller
/// issues its own listing and the last write wins, which is harmless because
/// the value is deterministic per key.
#[derive(Clone)]
pub struct AccountResolver {
    api: Arc<dyn StorageApi>,
    cache: Arc<StorageCache>,
}

impl AccountResolver {
    pub fn new(api: Arc<dyn StorageApi>, cache: Arc<StorageCache>) -> Self {
        Self { api, cache }
    }

    /// Resolves the resource group that owns `account_name`.
    ///
    /// The match against listed accounts is case-insensitive, and the cache
    /// key is the lowercased name, so differently-cased lookups of one
    /// account share a single entry and a single listing call.
    ///
    /// Returns `Ok(None)` when no visible account matches after a full scan,
    /// including when the listing itself is empty. An unmatched scan is not
    /// cached.
    pub async fn find_resource_group(&self, account_name: &str) -> Result<Option<String>> {
        let cache_key = account_name.to_ascii_lowercase();
        if let Some(hit) = self.cache.resource_group(&cache_key).await {
            debug!(account_name, "resource group cache hit");
            return Ok(Some(hit));
        }

        debug!(account_name, "resource group cache miss, listing accounts");
        let accounts = self
            .api
            .list_accounts()
            .await
            .map_err(|source| Error::ListAccounts {
                account_name: account_name.to_string(),
                source,
            })?;

        let mut resource_group = None;
        for account in &accounts {
            let (name, id) = match (&account.name, &account.id) {
                (Some(name), Some(id)) => (name, id),
                _ => continue,
            };
            if !account_name.eq_ignore_ascii_case(name) {
                continue;
            }

            let parsed = ResourceId::parse(id).map_err(|source| Error::ParseResourceId {
                account_name: account_name.to_string(),
                source,
            })?;
            let group = parsed
                .resource_group
                .ok_or_else(|| Error::ParseResourceId {
                    account_name: account_name.to_string(),
                    source: ResourceIdError::MissingResourceGroup { id: id.clone() },
                })?;

            resource_group = Some(group);
            break;
        }

        if let Some(group) = &resource_group {
            debug!(
                account_name,
                resource_group = group.as_str(),
                "caching resource group"
            );
            self.cache.put_resource_group(cache_key, group.clone()).await;
        }

        Ok(resource_group)
    }

    /// Resolves the primary access key for `account_name` in
    /// `resource_group`.
    ///
    /// The first key in the provider's listing is the primary key. A listing
    /// that succeeds but carries no usable key is a hard [`Error::NoKeys`]
    /// failure, unlike the soft not-found of [`Self::find_resource_group`].
    pub async fn find_account_key(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<String> {
        if let Some(hit) = self.cache.account_key(resource_group, account_name).await {
            debug!(account_name, resource_group, "account key cache hit");
            return Ok(hit);
        }

        debug!(account_name, resource_group, "account key cache miss, listing keys");
        let keys = self
            .api
            .list_keys(resource_group, account_name)
            .await
            .map_err(|source| Error::ListKeys {
                resource_group: resource_group.to_string(),
                account_name: account_name.to_string(),
                source,
            })?;

        let key = keys
            .first()
            .and_then(|key| key.value.clone())
            .ok_or_else(|| Error::NoKeys {
                resource_group: resource_group.to_string(),
                account_name: account_name.to_string(),
            })?;

        self.cache
            .put_account_key(
                resource_group.to_string(),
                account_name.to_string(),
                key.clone(),
            )
            .await;

        Ok(key)
    }
}
