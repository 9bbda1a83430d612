use thiserror::Error;

use crate::resource_id::ResourceIdError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by [`crate::AccountResolver`].
///
/// A lookup that completes without finding anything is not an error: an
/// unmatched account scan returns `Ok(None)`. An empty key listing, by
/// contrast, is a hard failure (`NoKeys`) because the caller asked for a key
/// on an account it already located.
#[derive(Debug, Error)]
pub enum Error {
    #[error("listing storage accounts to find the resource group for {account_name:?}")]
    ListAccounts {
        account_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("parsing the resource id for storage account {account_name:?}")]
    ParseResourceId {
        account_name: String,
        #[source]
        source: ResourceIdError,
    },

    #[error("listing keys for storage account {account_name:?} (resource group {resource_group:?})")]
    ListKeys {
        resource_group: String,
        account_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no keys returned for storage account {account_name:?} (resource group {resource_group:?})")]
    NoKeys {
        resource_group: String,
        account_name: String,
    },
}
