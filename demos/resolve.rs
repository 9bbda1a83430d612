use std::sync::Arc;

use anyhow::{anyhow, Result};

use armcache::{AccountResolver, ArmClient, ArmConfig, StorageCache};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let account = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: resolve <storage-account-name>"))?;

    let client = ArmClient::new(ArmConfig::from_env()?);
    let resolver = AccountResolver::new(Arc::new(client), Arc::new(StorageCache::new()));

    match resolver.find_resource_group(&account).await? {
        Some(resource_group) => {
            println!("resource group: {resource_group}");
            let key = resolver.find_account_key(&resource_group, &account).await?;
            println!("primary key: {key}");
        }
        None => println!("no storage account named {account:?} is visible to this principal"),
    }

    Ok(())
}
