//! PostgreSQL read models behind the public catalogue.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use herbarium_application::{
    CatalogStatistics, CatalogSummary, FilterOptions, GalleryItem, PublicCatalogRepository,
    PublicFilterSelection, PublicSearchPage, PublicSearchQuery, PublicSpecimenSummary,
    Suggestion,
};
use herbarium_core::{AppError, AppResult};
use herbarium_domain::{
    ImageId, SpecimenId, TaxonId, location_label, scientific_name, specimen_display_name,
};

use crate::paging::bigint;

mod search;
mod statistics;

/// Predicate over `specimens s` selecting rows the public may see.
const VISIBLE: &str = "s.is_public AND s.status <> 'eliminado'";

/// PostgreSQL implementation of the public catalogue port.
#[derive(Clone)]
pub struct PostgresPublicCatalogRepository {
    pool: PgPool,
}

impl PostgresPublicCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Search row joined with taxon, family, cover image and primary site names.
#[derive(Debug, FromRow)]
struct SummaryRow {
    id: uuid::Uuid,
    code: String,
    taxon_id: Option<uuid::Uuid>,
    genus: Option<String>,
    species: Option<String>,
    family: Option<String>,
    collection_date: Option<NaiveDate>,
    country_name: Option<String>,
    province_name: Option<String>,
    canton_name: Option<String>,
    locality_name: Option<String>,
    vicinity_name: Option<String>,
    primary_image_id: Option<uuid::Uuid>,
}

impl From<SummaryRow> for PublicSpecimenSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            specimen_id: SpecimenId::from_uuid(row.id),
            location_label: location_label([
                row.vicinity_name.as_deref(),
                row.locality_name.as_deref(),
                row.canton_name.as_deref(),
                row.province_name.as_deref(),
                row.country_name.as_deref(),
            ]),
            scientific_name: optional_scientific_name(row.genus.as_deref(), row.species.as_deref()),
            code: row.code,
            taxon_id: row.taxon_id.map(TaxonId::from_uuid),
            family: row.family,
            collection_date: row.collection_date,
            primary_image_id: row.primary_image_id.map(ImageId::from_uuid),
        }
    }
}

fn optional_scientific_name(genus: Option<&str>, species: Option<&str>) -> Option<String> {
    genus.map(|genus| scientific_name(genus, species.unwrap_or_default()))
}

/// Columns and joins producing a [`SummaryRow`] for each `specimens s`.
fn summary_select() -> String {
    r#"
    SELECT
        s.id,
        s.code,
        s.taxon_id,
        t.genus,
        t.species,
        f.name AS family,
        s.collection_date,
        gc.name AS country_name,
        gp.name AS province_name,
        gk.name AS canton_name,
        gl.name AS locality_name,
        gv.name AS vicinity_name,
        cover.id AS primary_image_id
    FROM specimens s
    LEFT JOIN taxa t ON t.id = s.taxon_id
    LEFT JOIN families f ON f.id = t.family_id
    LEFT JOIN LATERAL (
        SELECT country_id, province_id, canton_id, locality_id, vicinity_id
        FROM collection_sites cs
        WHERE cs.specimen_id = s.id
        ORDER BY cs.is_primary DESC, cs.created_at
        LIMIT 1
    ) site ON TRUE
    LEFT JOIN geo_nodes gc ON gc.id = site.country_id
    LEFT JOIN geo_nodes gp ON gp.id = site.province_id
    LEFT JOIN geo_nodes gk ON gk.id = site.canton_id
    LEFT JOIN geo_nodes gl ON gl.id = site.locality_id
    LEFT JOIN geo_nodes gv ON gv.id = site.vicinity_id
    LEFT JOIN LATERAL (
        SELECT i.id
        FROM taxon_images i
        WHERE i.taxon_id = s.taxon_id AND i.deleted_at IS NULL
        ORDER BY i.is_primary DESC, i.display_order, i.uploaded_at
        LIMIT 1
    ) cover ON TRUE
    "#
    .to_owned()
}

fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn internal(operation: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |error| AppError::Internal(format!("failed to {operation}: {error}"))
}

#[derive(Debug, FromRow)]
struct SuggestionRow {
    id: uuid::Uuid,
    code: String,
    genus: Option<String>,
    species: Option<String>,
    collection_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct GalleryRow {
    taxon_id: uuid::Uuid,
    genus: String,
    species: String,
    family: String,
    image_id: uuid::Uuid,
    specimen_count: i64,
}

#[async_trait]
impl PublicCatalogRepository for PostgresPublicCatalogRepository {
    async fn summary(&self) -> AppResult<CatalogSummary> {
        self.summary_impl().await
    }

    async fn statistics(&self, top: usize) -> AppResult<CatalogStatistics> {
        self.statistics_impl(top).await
    }

    async fn search(&self, query: &PublicSearchQuery) -> AppResult<PublicSearchPage> {
        self.search_impl(query).await
    }

    async fn filter_options(&self, selection: &PublicFilterSelection) -> AppResult<FilterOptions> {
        self.filter_options_impl(selection).await
    }

    async fn gallery(&self, limit: usize, offset: usize) -> AppResult<Vec<GalleryItem>> {
        let sql = format!(
            r#"
            SELECT
                t.id AS taxon_id,
                t.genus,
                t.species,
                f.name AS family,
                cover.id AS image_id,
                counts.specimen_count
            FROM (
                SELECT s.taxon_id, COUNT(*) AS specimen_count
                FROM specimens s
                WHERE {VISIBLE} AND s.taxon_id IS NOT NULL
                GROUP BY s.taxon_id
            ) counts
            JOIN taxa t ON t.id = counts.taxon_id
            JOIN families f ON f.id = t.family_id
            JOIN LATERAL (
                SELECT i.id
                FROM taxon_images i
                WHERE i.taxon_id = t.id AND i.deleted_at IS NULL
                ORDER BY i.is_primary DESC, i.display_order, i.uploaded_at
                LIMIT 1
            ) cover ON TRUE
            ORDER BY t.genus, t.species
            LIMIT $1
            OFFSET $2
            "#
        );

        let rows = sqlx::query_as::<_, GalleryRow>(&sql)
            .bind(bigint(limit, "limit")?)
            .bind(bigint(offset, "offset")?)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("load gallery"))?;

        Ok(rows
            .into_iter()
            .map(|row| GalleryItem {
                taxon_id: TaxonId::from_uuid(row.taxon_id),
                scientific_name: scientific_name(&row.genus, &row.species),
                family: row.family,
                image_id: ImageId::from_uuid(row.image_id),
                specimen_count: row.specimen_count,
            })
            .collect())
    }

    async fn suggestions(&self, text: &str, limit: usize) -> AppResult<Vec<Suggestion>> {
        let sql = format!(
            r#"
            SELECT s.id, s.code, t.genus, t.species, s.collection_date
            FROM specimens s
            LEFT JOIN taxa t ON t.id = s.taxon_id
            LEFT JOIN families f ON f.id = t.family_id
            WHERE {VISIBLE}
                AND (s.code ILIKE $1
                    OR t.genus ILIKE $1
                    OR t.species ILIKE $1
                    OR f.name ILIKE $1)
            ORDER BY s.code
            LIMIT $2
            "#
        );

        let rows = sqlx::query_as::<_, SuggestionRow>(&sql)
            .bind(like_pattern(text))
            .bind(bigint(limit, "limit")?)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("load suggestions"))?;

        Ok(rows
            .into_iter()
            .map(|row| Suggestion {
                specimen_id: SpecimenId::from_uuid(row.id),
                label: specimen_display_name(
                    &row.code,
                    optional_scientific_name(row.genus.as_deref(), row.species.as_deref())
                        .as_deref(),
                    row.collection_date,
                ),
            })
            .collect())
    }

    async fn related_specimens(
        &self,
        specimen_id: SpecimenId,
        limit: usize,
    ) -> AppResult<Vec<PublicSpecimenSummary>> {
        let sql = format!(
            r#"
            {select}
            WHERE {VISIBLE}
                AND s.id <> $1
                AND t.family_id = (
                    SELECT rt.family_id
                    FROM specimens rs
                    JOIN taxa rt ON rt.id = rs.taxon_id
                    WHERE rs.id = $1
                )
            ORDER BY s.code
            LIMIT $2
            "#,
            select = summary_select()
        );

        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(specimen_id.as_uuid())
            .bind(bigint(limit, "limit")?)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("load related specimens"))?;

        Ok(rows.into_iter().map(PublicSpecimenSummary::from).collect())
    }
}

#[cfg(test)]
mod tests;
