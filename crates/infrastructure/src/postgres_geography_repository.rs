//! PostgreSQL-backed geographic hierarchy.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use herbarium_application::GeographyRepository;
use herbarium_core::{AppError, AppResult, NonEmptyString};
use herbarium_domain::{
    AuditEntry, Coordinate, GeoHierarchy, GeoLevel, GeoNode, GeoNodeId, ReferencePoint,
    ReferencePointId,
};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};

/// PostgreSQL implementation of the geography repository port.
#[derive(Clone)]
pub struct PostgresGeographyRepository {
    pool: PgPool,
}

impl PostgresGeographyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GeoNodeRow {
    id: uuid::Uuid,
    level: String,
    name: String,
    code: Option<String>,
    parent_id: Option<uuid::Uuid>,
}

impl TryFrom<GeoNodeRow> for GeoNode {
    type Error = AppError;

    fn try_from(row: GeoNodeRow) -> AppResult<Self> {
        GeoNode::new(
            GeoNodeId::from_uuid(row.id),
            row.level.parse()?,
            row.name,
            row.code,
            row.parent_id.map(GeoNodeId::from_uuid),
        )
    }
}

#[derive(Debug, FromRow)]
struct ReferencePointRow {
    id: uuid::Uuid,
    vicinity_id: uuid::Uuid,
    name: String,
    kind: String,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    utm: Option<String>,
    description: Option<String>,
}

impl TryFrom<ReferencePointRow> for ReferencePoint {
    type Error = AppError;

    fn try_from(row: ReferencePointRow) -> AppResult<Self> {
        Ok(Self {
            point_id: ReferencePointId::from_uuid(row.id),
            vicinity_id: GeoNodeId::from_uuid(row.vicinity_id),
            name: NonEmptyString::new(row.name)?,
            kind: row.kind.parse()?,
            coordinate: Coordinate::new(row.latitude, row.longitude, row.elevation)?
                .with_details(row.utm, row.description),
        })
    }
}

#[async_trait]
impl GeographyRepository for PostgresGeographyRepository {
    async fn load_hierarchy(&self) -> AppResult<GeoHierarchy> {
        let rows = sqlx::query_as::<_, GeoNodeRow>(
            r#"
            SELECT id, level, name, code, parent_id
            FROM geo_nodes
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load geographic hierarchy: {error}"))
        })?;

        let nodes = rows
            .into_iter()
            .map(GeoNode::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(GeoHierarchy::new(nodes))
    }

    async fn list_nodes(
        &self,
        level: GeoLevel,
        parent_id: Option<GeoNodeId>,
    ) -> AppResult<Vec<GeoNode>> {
        let rows = sqlx::query_as::<_, GeoNodeRow>(
            r#"
            SELECT id, level, name, code, parent_id
            FROM geo_nodes
            WHERE level = $1
                AND ($2::UUID IS NULL OR parent_id = $2)
            ORDER BY name
            "#,
        )
        .bind(level.as_str())
        .bind(parent_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list geographic nodes: {error}"))
        })?;

        rows.into_iter().map(GeoNode::try_from).collect()
    }

    async fn create_node(&self, node: &GeoNode, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO geo_nodes (id, level, name, code, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(node.node_id().as_uuid())
        .bind(node.level().as_str())
        .bind(node.name())
        .bind(node.code())
        .bind(node.parent_id().map(|id| id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "create geographic node", || {
                format!(
                    "{} '{}' already exists under the same parent",
                    node.level().as_str(),
                    node.name()
                )
            })
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn create_reference_point(
        &self,
        point: &ReferencePoint,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO reference_points (
                id,
                vicinity_id,
                name,
                kind,
                latitude,
                longitude,
                elevation,
                utm,
                description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(point.point_id.as_uuid())
        .bind(point.vicinity_id.as_uuid())
        .bind(point.name.as_str())
        .bind(point.kind.as_str())
        .bind(point.coordinate.latitude())
        .bind(point.coordinate.longitude())
        .bind(point.coordinate.elevation())
        .bind(point.coordinate.utm())
        .bind(point.coordinate.description())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create reference point: {error}"))
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn list_reference_points(
        &self,
        vicinity_id: GeoNodeId,
    ) -> AppResult<Vec<ReferencePoint>> {
        let rows = sqlx::query_as::<_, ReferencePointRow>(
            r#"
            SELECT
                id,
                vicinity_id,
                name,
                kind,
                latitude,
                longitude,
                elevation,
                utm,
                description
            FROM reference_points
            WHERE vicinity_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(vicinity_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list reference points: {error}"))
        })?;

        rows.into_iter().map(ReferencePoint::try_from).collect()
    }
}

#[cfg(test)]
mod tests;
