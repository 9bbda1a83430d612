//! Cached resolution of Azure storage account metadata.
//!
//! Repeatedly asking ARM which resource group owns a storage account, or for
//! an account's access key, wastes a network round trip every time: within a
//! process the answers never change. [`AccountResolver`] remembers every
//! successful answer in a [`StorageCache`] shared across clones and only
//! reaches its [`StorageApi`] collaborator on the first miss per key.
//!
//! [`ArmClient`] is the shipped collaborator; anything implementing
//! [`StorageApi`] works, which is how the tests substitute in-memory stubs.

pub mod api;
pub mod arm;
pub mod cache;
pub mod error;
pub mod resource_id;

pub use api::{StorageAccount, StorageAccountKey, StorageApi};
pub use arm::{ArmClient, ArmConfig};
pub use cache::{AccountResolver, StorageCache};
pub use error::{Error, Result};
pub use resource_id::{ResourceId, ResourceIdError};
