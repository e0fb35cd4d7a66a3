use async_trait::async_trait;
use herbarium_core::AppResult;
use herbarium_domain::{AuditEntry, GeoHierarchy, GeoLevel, GeoNode, GeoNodeId, ReferencePoint};

/// Repository port for the geographic hierarchy.
#[async_trait]
pub trait GeographyRepository: Send + Sync {
    /// Loads every node into an index.
    async fn load_hierarchy(&self) -> AppResult<GeoHierarchy>;

    /// Lists nodes of one level, optionally below one parent, ordered by name.
    async fn list_nodes(
        &self,
        level: GeoLevel,
        parent_id: Option<GeoNodeId>,
    ) -> AppResult<Vec<GeoNode>>;

    /// Persists a node with its audit entries. Duplicate names under the
    /// same parent fail with a conflict.
    async fn create_node(&self, node: &GeoNode, audit: &[AuditEntry]) -> AppResult<()>;

    /// Persists a vicinity reference point with its audit entries.
    async fn create_reference_point(
        &self,
        point: &ReferencePoint,
        audit: &[AuditEntry],
    ) -> AppResult<()>;

    /// Lists reference points of a vicinity in creation order.
    async fn list_reference_points(&self, vicinity_id: GeoNodeId)
    -> AppResult<Vec<ReferencePoint>>;
}
