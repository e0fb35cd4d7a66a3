//! PostgreSQL-backed specimen repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use herbarium_application::{ContributionCounts, SpecimenListQuery, SpecimenRepository};
use herbarium_core::{AppError, AppResult};
use herbarium_domain::{
    AuditEntry, CollectionSite, ContributorId, GeoNodeId, HerbariumId, SiteId, Specimen,
    SpecimenCode, SpecimenId, TaxonId,
};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};
use crate::paging::bigint;

mod sites;

const LIST_MAX_LIMIT: usize = 500;

/// PostgreSQL implementation of the specimen repository port.
#[derive(Clone)]
pub struct PostgresSpecimenRepository {
    pool: PgPool,
}

impl PostgresSpecimenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SpecimenRow {
    id: uuid::Uuid,
    code: String,
    sheet_number: Option<String>,
    taxon_id: Option<uuid::Uuid>,
    author_ids: Vec<uuid::Uuid>,
    collector_ids: Vec<uuid::Uuid>,
    determiner_ids: Vec<uuid::Uuid>,
    index_text: Option<String>,
    herbarium_id: Option<uuid::Uuid>,
    description: Option<String>,
    phenology: Option<String>,
    patent_year: Option<i32>,
    vicinity_id: Option<uuid::Uuid>,
    collection_date: Option<NaiveDate>,
    elevation: Option<f64>,
    status: String,
    is_public: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_by: Option<String>,
    updated_at: DateTime<Utc>,
}

fn contributor_ids(values: Vec<uuid::Uuid>) -> Vec<ContributorId> {
    values.into_iter().map(ContributorId::from_uuid).collect()
}

fn contributor_uuids(values: &[ContributorId]) -> Vec<uuid::Uuid> {
    values.iter().map(ContributorId::as_uuid).collect()
}

impl TryFrom<SpecimenRow> for Specimen {
    type Error = AppError;

    fn try_from(row: SpecimenRow) -> AppResult<Self> {
        Ok(Self {
            specimen_id: SpecimenId::from_uuid(row.id),
            code: SpecimenCode::from_stored(row.code),
            sheet_number: row.sheet_number,
            taxon_id: row.taxon_id.map(TaxonId::from_uuid),
            author_ids: contributor_ids(row.author_ids),
            collector_ids: contributor_ids(row.collector_ids),
            determiner_ids: contributor_ids(row.determiner_ids),
            index_text: row.index_text,
            herbarium_id: row.herbarium_id.map(HerbariumId::from_uuid),
            description: row.description,
            phenology: row.phenology,
            patent_year: row.patent_year,
            vicinity_id: row.vicinity_id.map(GeoNodeId::from_uuid),
            collection_date: row.collection_date,
            elevation: row.elevation,
            status: row.status.parse()?,
            is_public: row.is_public,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        })
    }
}

const SPECIMEN_COLUMNS: &str = r#"
    id,
    code,
    sheet_number,
    taxon_id,
    author_ids,
    collector_ids,
    determiner_ids,
    index_text,
    herbarium_id,
    description,
    phenology,
    patent_year,
    vicinity_id,
    collection_date,
    elevation,
    status,
    is_public,
    created_by,
    created_at,
    updated_by,
    updated_at
"#;

#[async_trait]
impl SpecimenRepository for PostgresSpecimenRepository {
    async fn list_codes(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT code FROM specimens")
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list specimen codes: {error}"))
            })
    }

    async fn insert_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO specimens (
                id,
                code,
                sheet_number,
                taxon_id,
                author_ids,
                collector_ids,
                determiner_ids,
                index_text,
                herbarium_id,
                description,
                phenology,
                patent_year,
                vicinity_id,
                collection_date,
                elevation,
                status,
                is_public,
                created_by,
                created_at,
                updated_by,
                updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(specimen.specimen_id.as_uuid())
        .bind(specimen.code.as_str())
        .bind(specimen.sheet_number.as_deref())
        .bind(specimen.taxon_id.map(|id| id.as_uuid()))
        .bind(contributor_uuids(&specimen.author_ids))
        .bind(contributor_uuids(&specimen.collector_ids))
        .bind(contributor_uuids(&specimen.determiner_ids))
        .bind(specimen.index_text.as_deref())
        .bind(specimen.herbarium_id.map(|id| id.as_uuid()))
        .bind(specimen.description.as_deref())
        .bind(specimen.phenology.as_deref())
        .bind(specimen.patent_year)
        .bind(specimen.vicinity_id.map(|id| id.as_uuid()))
        .bind(specimen.collection_date)
        .bind(specimen.elevation)
        .bind(specimen.status.as_str())
        .bind(specimen.is_public)
        .bind(specimen.created_by.as_deref())
        .bind(specimen.created_at)
        .bind(specimen.updated_by.as_deref())
        .bind(specimen.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "insert specimen", || {
                format!("specimen code '{}' is already taken", specimen.code)
            })
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn update_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE specimens
            SET sheet_number = $2,
                taxon_id = $3,
                author_ids = $4,
                collector_ids = $5,
                determiner_ids = $6,
                index_text = $7,
                herbarium_id = $8,
                description = $9,
                phenology = $10,
                patent_year = $11,
                vicinity_id = $12,
                collection_date = $13,
                elevation = $14,
                status = $15,
                is_public = $16,
                updated_by = $17,
                updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(specimen.specimen_id.as_uuid())
        .bind(specimen.sheet_number.as_deref())
        .bind(specimen.taxon_id.map(|id| id.as_uuid()))
        .bind(contributor_uuids(&specimen.author_ids))
        .bind(contributor_uuids(&specimen.collector_ids))
        .bind(contributor_uuids(&specimen.determiner_ids))
        .bind(specimen.index_text.as_deref())
        .bind(specimen.herbarium_id.map(|id| id.as_uuid()))
        .bind(specimen.description.as_deref())
        .bind(specimen.phenology.as_deref())
        .bind(specimen.patent_year)
        .bind(specimen.vicinity_id.map(|id| id.as_uuid()))
        .bind(specimen.collection_date)
        .bind(specimen.elevation)
        .bind(specimen.status.as_str())
        .bind(specimen.is_public)
        .bind(specimen.updated_by.as_deref())
        .bind(specimen.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update specimen: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "specimen '{}' does not exist",
                specimen.specimen_id
            )));
        }

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn delete_specimen(
        &self,
        specimen_id: SpecimenId,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = sqlx::query("DELETE FROM specimens WHERE id = $1")
            .bind(specimen_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete specimen: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "specimen '{specimen_id}' does not exist"
            )));
        }

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn find_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<Specimen>> {
        let sql = format!("SELECT {SPECIMEN_COLUMNS} FROM specimens WHERE id = $1");

        sqlx::query_as::<_, SpecimenRow>(&sql)
            .bind(specimen_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find specimen: {error}")))?
            .map(Specimen::try_from)
            .transpose()
    }

    async fn list_specimens(&self, query: &SpecimenListQuery) -> AppResult<Vec<Specimen>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(|search| format!("%{search}%"));

        let sql = format!(
            r#"
            SELECT {SPECIMEN_COLUMNS}
            FROM specimens
            WHERE ($1::TEXT IS NULL
                    OR code ILIKE $1
                    OR sheet_number ILIKE $1
                    OR index_text ILIKE $1)
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::UUID IS NULL OR taxon_id = $3)
            ORDER BY code
            LIMIT $4
            OFFSET $5
            "#
        );

        sqlx::query_as::<_, SpecimenRow>(&sql)
            .bind(search)
            .bind(query.status.map(|status| status.as_str()))
            .bind(query.taxon_id.map(|id| id.as_uuid()))
            .bind(query.limit.clamp(1, LIST_MAX_LIMIT) as i64)
            .bind(bigint(query.offset, "offset")?)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list specimens: {error}")))?
            .into_iter()
            .map(Specimen::try_from)
            .collect()
    }

    async fn list_sites(&self, specimen_id: SpecimenId) -> AppResult<Vec<CollectionSite>> {
        self.list_sites_impl(specimen_id).await
    }

    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<CollectionSite>> {
        self.find_site_impl(site_id).await
    }

    async fn save_site(&self, site: &CollectionSite, audit: &[AuditEntry]) -> AppResult<()> {
        self.save_site_impl(site, audit).await
    }

    async fn delete_site(&self, site_id: SiteId, audit: &[AuditEntry]) -> AppResult<()> {
        self.delete_site_impl(site_id, audit).await
    }

    async fn count_contributions(&self, subject: &str) -> AppResult<ContributionCounts> {
        let (specimens_created, sites_added) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM specimens WHERE created_by = $1),
                (SELECT COUNT(*) FROM collection_sites WHERE created_by = $1)
            "#,
        )
        .bind(subject)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count user contributions: {error}"))
        })?;

        Ok(ContributionCounts {
            specimens_created,
            sites_added,
        })
    }
}

#[cfg(test)]
mod tests;
