use async_trait::async_trait;
use eyre::Result;

use crate::core::catalog::CatalogUpdate;

/// Trait for discovery collaborators that hand over catalog snapshots.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The current catalog, one entry per service, instances in discovery
    /// order.
    async fn snapshot(&self) -> Result<Vec<CatalogUpdate>>;
}
