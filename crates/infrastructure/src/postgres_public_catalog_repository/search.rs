use super::*;

use herbarium_application::FilterOption;

/// Filters over `specimens s` joined with `taxa t` and `families f`, bound
/// as `$1..=$8`.
fn search_filters() -> String {
    format!(
        r#"
        WHERE {VISIBLE}
            AND ($1::TEXT IS NULL
                OR s.code ILIKE $1
                OR t.genus ILIKE $1
                OR t.species ILIKE $1
                OR f.name ILIKE $1)
            AND ($2::UUID IS NULL OR t.family_id = $2)
            AND ($3::TEXT IS NULL OR LOWER(t.genus) = LOWER($3))
            AND ($4::UUID IS NULL OR EXISTS (
                SELECT 1 FROM collection_sites ps
                WHERE ps.specimen_id = s.id AND ps.province_id = $4
            ))
            AND ($5::UUID IS NULL OR EXISTS (
                SELECT 1 FROM collection_sites ks
                WHERE ks.specimen_id = s.id AND ks.canton_id = $5
            ))
            AND ($6::INT IS NULL OR EXTRACT(YEAR FROM s.collection_date) >= $6)
            AND ($7::INT IS NULL OR EXTRACT(YEAR FROM s.collection_date) <= $7)
            AND (NOT $8 OR EXISTS (
                SELECT 1 FROM taxon_images wi
                WHERE wi.taxon_id = s.taxon_id AND wi.deleted_at IS NULL
            ))
        "#
    )
}

#[derive(Debug, FromRow)]
struct OptionRow {
    value: String,
    label: String,
    count: i64,
}

impl From<OptionRow> for FilterOption {
    fn from(row: OptionRow) -> Self {
        Self {
            value: row.value,
            label: row.label,
            count: row.count,
        }
    }
}

impl PostgresPublicCatalogRepository {
    pub(super) async fn search_impl(
        &self,
        query: &PublicSearchQuery,
    ) -> AppResult<PublicSearchPage> {
        let text = query.text.as_deref().map(like_pattern);
        let filters = search_filters();

        let count_sql = format!(
            r#"
            SELECT COUNT(*)
            FROM specimens s
            LEFT JOIN taxa t ON t.id = s.taxon_id
            LEFT JOIN families f ON f.id = t.family_id
            {filters}
            "#
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(text.as_deref())
            .bind(query.family_id.map(|id| id.as_uuid()))
            .bind(query.genus.as_deref())
            .bind(query.province_id.map(|id| id.as_uuid()))
            .bind(query.canton_id.map(|id| id.as_uuid()))
            .bind(query.year_from)
            .bind(query.year_to)
            .bind(query.with_images)
            .fetch_one(&self.pool)
            .await
            .map_err(internal("count search results"))?;

        let page_sql = format!(
            r#"
            {select}
            {filters}
            ORDER BY s.code
            LIMIT $9
            OFFSET $10
            "#,
            select = summary_select()
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&page_sql)
            .bind(text.as_deref())
            .bind(query.family_id.map(|id| id.as_uuid()))
            .bind(query.genus.as_deref())
            .bind(query.province_id.map(|id| id.as_uuid()))
            .bind(query.canton_id.map(|id| id.as_uuid()))
            .bind(query.year_from)
            .bind(query.year_to)
            .bind(query.with_images)
            .bind(bigint(query.limit, "limit")?)
            .bind(bigint(query.offset, "offset")?)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("search specimens"))?;

        Ok(PublicSearchPage {
            items: rows.into_iter().map(PublicSpecimenSummary::from).collect(),
            total,
        })
    }

    pub(super) async fn filter_options_impl(
        &self,
        selection: &PublicFilterSelection,
    ) -> AppResult<FilterOptions> {
        let family_id = selection.family_id.map(|id| id.as_uuid());
        let province_id = selection.province_id.map(|id| id.as_uuid());

        let in_province = r#"
            ($2::UUID IS NULL OR EXISTS (
                SELECT 1 FROM collection_sites ps
                WHERE ps.specimen_id = s.id AND ps.province_id = $2
            ))
        "#;

        let families_sql = format!(
            r#"
            SELECT f.id::TEXT AS value, f.name AS label, COUNT(DISTINCT s.id) AS count
            FROM specimens s
            JOIN taxa t ON t.id = s.taxon_id
            JOIN families f ON f.id = t.family_id
            WHERE {VISIBLE} AND {in_province}
            GROUP BY f.id, f.name
            ORDER BY f.name
            "#
        );
        let genera_sql = format!(
            r#"
            SELECT t.genus AS value, t.genus AS label, COUNT(DISTINCT s.id) AS count
            FROM specimens s
            JOIN taxa t ON t.id = s.taxon_id
            WHERE {VISIBLE} AND ($1::UUID IS NULL OR t.family_id = $1) AND {in_province}
            GROUP BY t.genus
            ORDER BY t.genus
            "#
        );
        let provinces_sql = format!(
            r#"
            SELECT g.id::TEXT AS value, g.name AS label, COUNT(DISTINCT s.id) AS count
            FROM collection_sites cs
            JOIN specimens s ON s.id = cs.specimen_id
            JOIN geo_nodes g ON g.id = cs.province_id
            LEFT JOIN taxa t ON t.id = s.taxon_id
            WHERE {VISIBLE}
                AND ($1::UUID IS NULL OR t.family_id = $1)
            GROUP BY g.id, g.name
            ORDER BY g.name
            "#
        );
        let cantons_sql = format!(
            r#"
            SELECT g.id::TEXT AS value, g.name AS label, COUNT(DISTINCT s.id) AS count
            FROM collection_sites cs
            JOIN specimens s ON s.id = cs.specimen_id
            JOIN geo_nodes g ON g.id = cs.canton_id
            LEFT JOIN taxa t ON t.id = s.taxon_id
            WHERE {VISIBLE}
                AND ($1::UUID IS NULL OR t.family_id = $1)
                AND cs.province_id = $2
            GROUP BY g.id, g.name
            ORDER BY g.name
            "#
        );

        let cantons = match province_id {
            Some(_) => {
                self.load_options(&cantons_sql, family_id, province_id, "list canton filters")
                    .await?
            }
            None => Vec::new(),
        };

        Ok(FilterOptions {
            families: self
                .load_options(&families_sql, family_id, province_id, "list family filters")
                .await?,
            genera: self
                .load_options(&genera_sql, family_id, province_id, "list genus filters")
                .await?,
            provinces: self
                .load_options(&provinces_sql, family_id, province_id, "list province filters")
                .await?,
            cantons,
        })
    }

    /// Runs an option query bound with the family as `$1` and the province
    /// as `$2`; either may be unused by the query.
    async fn load_options(
        &self,
        sql: &str,
        family_id: Option<uuid::Uuid>,
        province_id: Option<uuid::Uuid>,
        operation: &str,
    ) -> AppResult<Vec<FilterOption>> {
        let rows = sqlx::query_as::<_, OptionRow>(sql)
            .bind(family_id)
            .bind(province_id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal(operation))?;

        Ok(rows.into_iter().map(FilterOption::from).collect())
    }
}
