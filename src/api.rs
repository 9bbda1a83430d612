use async_trait::async_trait;
use serde::Deserialize;

/// A storage account entry from the provider's account listing.
///
/// Either field may be absent in the payload; entries missing one are
/// skipped when scanning for a name match.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageAccount {
    pub name: Option<String>,
    pub id: Option<String>,
}

/// One access key from the provider's `listKeys` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountKey {
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

/// The network collaborator behind [`crate::AccountResolver`].
///
/// Implementations own transport, authentication, and any deadline handling;
/// the resolver only ever asks for raw listings and wraps failures with the
/// identifiers it was resolving. [`crate::ArmClient`] is the ARM-backed
/// implementation; tests substitute in-memory stubs.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Lists every storage account visible to the caller, in provider order.
    async fn list_accounts(&self) -> anyhow::Result<Vec<StorageAccount>>;

    /// Lists the access keys for one account, in provider order. The first
    /// entry is treated as the primary key.
    async fn list_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> anyhow::Result<Vec<StorageAccountKey>>;
}
