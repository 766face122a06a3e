use anyhow::Result;
use tracing::trace;

use crate::storage::Storage;
use crate::types::{BlockId, DELIMITER, SourceBlock};

/// Every entry at the bucket root names a tenant. A leaf object at the root becomes a
/// tenant without blocks.
pub async fn list_tenants(source: &Storage) -> Result<Vec<String>> {
    trace!("list tenants has started.");

    let tenants = source
        .list_prefix("", false)
        .await?
        .into_iter()
        .map(|entry| trim_delimiter(&entry).to_string())
        .filter(|tenant| !tenant.is_empty())
        .collect::<Vec<_>>();

    trace!(tenants = tenants.len(), "list tenants has been completed.");
    Ok(tenants)
}

/// Entries directly below the tenant that are named by a block ID. Anything else
/// (markers, bucket index, stray files) is skipped. The listed name is kept as is,
/// since the parser also accepts names that do not round-trip.
pub async fn list_blocks_for_tenant(source: &Storage, tenant: &str) -> Result<Vec<SourceBlock>> {
    let blocks = source
        .list_prefix(tenant, false)
        .await?
        .iter()
        .filter_map(|entry| {
            let name = trim_delimiter(entry);
            BlockId::from_string(name).ok().map(|id| SourceBlock {
                id,
                name: name.to_string(),
            })
        })
        .collect::<Vec<_>>();

    trace!(
        tenant = tenant,
        blocks = blocks.len(),
        "list blocks has been completed."
    );
    Ok(blocks)
}

fn trim_delimiter(entry: &str) -> &str {
    entry.strip_suffix(DELIMITER).unwrap_or(entry)
}
