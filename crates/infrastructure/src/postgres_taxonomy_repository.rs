//! PostgreSQL-backed families, taxa, contributors and herbaria.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use herbarium_application::TaxonomyRepository;
use herbarium_core::{AppError, AppResult, NonEmptyString};
use herbarium_domain::{
    AuditEntry, Contributor, ContributorId, ContributorKind, Family, FamilyId, Herbarium,
    HerbariumId, Taxon, TaxonId,
};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};

/// PostgreSQL implementation of the taxonomy repository port.
#[derive(Clone)]
pub struct PostgresTaxonomyRepository {
    pool: PgPool,
}

impl PostgresTaxonomyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct FamilyRow {
    id: uuid::Uuid,
    name: String,
}

impl TryFrom<FamilyRow> for Family {
    type Error = AppError;

    fn try_from(row: FamilyRow) -> AppResult<Self> {
        Ok(Self {
            family_id: FamilyId::from_uuid(row.id),
            name: NonEmptyString::new(row.name)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaxonRow {
    id: uuid::Uuid,
    family_id: uuid::Uuid,
    genus: String,
    species: String,
}

impl TryFrom<TaxonRow> for Taxon {
    type Error = AppError;

    fn try_from(row: TaxonRow) -> AppResult<Self> {
        Taxon::new(
            TaxonId::from_uuid(row.id),
            row.genus,
            row.species,
            FamilyId::from_uuid(row.family_id),
        )
    }
}

#[derive(Debug, FromRow)]
struct ContributorRow {
    id: uuid::Uuid,
    kind: String,
    name: String,
}

impl TryFrom<ContributorRow> for Contributor {
    type Error = AppError;

    fn try_from(row: ContributorRow) -> AppResult<Self> {
        Ok(Self {
            contributor_id: ContributorId::from_uuid(row.id),
            kind: row.kind.parse()?,
            name: NonEmptyString::new(row.name)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct HerbariumRow {
    id: uuid::Uuid,
    name: String,
    acronym: Option<String>,
}

impl TryFrom<HerbariumRow> for Herbarium {
    type Error = AppError;

    fn try_from(row: HerbariumRow) -> AppResult<Self> {
        Ok(Self {
            herbarium_id: HerbariumId::from_uuid(row.id),
            name: NonEmptyString::new(row.name)?,
            acronym: row.acronym,
        })
    }
}

fn internal(operation: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |error| AppError::Internal(format!("failed to {operation}: {error}"))
}

#[async_trait]
impl TaxonomyRepository for PostgresTaxonomyRepository {
    async fn create_family(&self, family: &Family, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query("INSERT INTO families (id, name) VALUES ($1, $2)")
            .bind(family.family_id.as_uuid())
            .bind(family.name.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                conflict_or_internal(error, "create family", || {
                    format!("family '{}' already exists", family.name)
                })
            })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn list_families(&self) -> AppResult<Vec<Family>> {
        sqlx::query_as::<_, FamilyRow>("SELECT id, name FROM families ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(internal("list families"))?
            .into_iter()
            .map(Family::try_from)
            .collect()
    }

    async fn find_family(&self, family_id: FamilyId) -> AppResult<Option<Family>> {
        sqlx::query_as::<_, FamilyRow>("SELECT id, name FROM families WHERE id = $1")
            .bind(family_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal("find family"))?
            .map(Family::try_from)
            .transpose()
    }

    async fn create_taxon(&self, taxon: &Taxon, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO taxa (id, family_id, genus, species)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(taxon.taxon_id().as_uuid())
        .bind(taxon.family_id().as_uuid())
        .bind(taxon.genus())
        .bind(taxon.species())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "create taxon", || {
                format!("taxon '{}' already exists", taxon.scientific_name())
            })
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn list_taxa(&self, family_id: Option<FamilyId>) -> AppResult<Vec<Taxon>> {
        sqlx::query_as::<_, TaxonRow>(
            r#"
            SELECT id, family_id, genus, species
            FROM taxa
            WHERE ($1::UUID IS NULL OR family_id = $1)
            ORDER BY genus, species
            "#,
        )
        .bind(family_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list taxa"))?
        .into_iter()
        .map(Taxon::try_from)
        .collect()
    }

    async fn find_taxon(&self, taxon_id: TaxonId) -> AppResult<Option<Taxon>> {
        sqlx::query_as::<_, TaxonRow>(
            "SELECT id, family_id, genus, species FROM taxa WHERE id = $1",
        )
        .bind(taxon_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find taxon"))?
        .map(Taxon::try_from)
        .transpose()
    }

    async fn create_contributor(
        &self,
        contributor: &Contributor,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query("INSERT INTO contributors (id, kind, name) VALUES ($1, $2, $3)")
            .bind(contributor.contributor_id.as_uuid())
            .bind(contributor.kind.as_str())
            .bind(contributor.name.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                conflict_or_internal(error, "create contributor", || {
                    format!(
                        "{} '{}' already exists",
                        contributor.kind.as_str(),
                        contributor.name
                    )
                })
            })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn list_contributors(
        &self,
        kind: Option<ContributorKind>,
    ) -> AppResult<Vec<Contributor>> {
        sqlx::query_as::<_, ContributorRow>(
            r#"
            SELECT id, kind, name
            FROM contributors
            WHERE ($1::TEXT IS NULL OR kind = $1)
            ORDER BY name, kind
            "#,
        )
        .bind(kind.map(ContributorKind::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list contributors"))?
        .into_iter()
        .map(Contributor::try_from)
        .collect()
    }

    async fn find_contributors(&self, ids: &[ContributorId]) -> AppResult<Vec<Contributor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<uuid::Uuid> = ids.iter().map(ContributorId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ContributorRow>(
            "SELECT id, kind, name FROM contributors WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("find contributors"))?;

        let mut contributors = rows
            .into_iter()
            .map(Contributor::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        // Keep the order in which the specimen lists them.
        contributors.sort_by_key(|contributor| {
            ids.iter()
                .position(|id| *id == contributor.contributor_id)
                .unwrap_or(usize::MAX)
        });

        Ok(contributors)
    }

    async fn create_herbarium(
        &self,
        herbarium: &Herbarium,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query("INSERT INTO herbaria (id, name, acronym) VALUES ($1, $2, $3)")
            .bind(herbarium.herbarium_id.as_uuid())
            .bind(herbarium.name.as_str())
            .bind(herbarium.acronym.as_deref())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                conflict_or_internal(error, "create herbarium", || {
                    format!("herbarium '{}' already exists", herbarium.name)
                })
            })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn list_herbaria(&self) -> AppResult<Vec<Herbarium>> {
        sqlx::query_as::<_, HerbariumRow>("SELECT id, name, acronym FROM herbaria ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(internal("list herbaria"))?
            .into_iter()
            .map(Herbarium::try_from)
            .collect()
    }

    async fn find_herbarium(&self, herbarium_id: HerbariumId) -> AppResult<Option<Herbarium>> {
        sqlx::query_as::<_, HerbariumRow>("SELECT id, name, acronym FROM herbaria WHERE id = $1")
            .bind(herbarium_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal("find herbarium"))?
            .map(Herbarium::try_from)
            .transpose()
    }
}
