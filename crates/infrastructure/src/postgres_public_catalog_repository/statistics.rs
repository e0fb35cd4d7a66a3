use super::*;

use herbarium_application::{CountBucket, MapPoint};

#[derive(Debug, FromRow)]
struct CountRow {
    specimens: i64,
    families: i64,
    taxa: i64,
    provinces: i64,
}

#[derive(Debug, FromRow)]
struct BucketRow {
    label: String,
    count: i64,
}

impl From<BucketRow> for CountBucket {
    fn from(row: BucketRow) -> Self {
        Self {
            label: row.label,
            count: row.count,
        }
    }
}

#[derive(Debug, FromRow)]
struct MapPointRow {
    id: uuid::Uuid,
    code: String,
    genus: Option<String>,
    species: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl PostgresPublicCatalogRepository {
    pub(super) async fn summary_impl(&self) -> AppResult<CatalogSummary> {
        let sql = format!(
            r#"
            SELECT
                COUNT(*) AS specimens,
                COUNT(DISTINCT t.family_id) AS families,
                COUNT(DISTINCT s.taxon_id) AS taxa,
                (
                    SELECT COUNT(DISTINCT cs.province_id)
                    FROM collection_sites cs
                    JOIN specimens s ON s.id = cs.specimen_id
                    WHERE {VISIBLE}
                ) AS provinces
            FROM specimens s
            LEFT JOIN taxa t ON t.id = s.taxon_id
            WHERE {VISIBLE}
            "#
        );

        let row = sqlx::query_as::<_, CountRow>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(internal("load catalogue summary"))?;

        Ok(CatalogSummary {
            specimens: row.specimens,
            families: row.families,
            taxa: row.taxa,
            provinces: row.provinces,
        })
    }

    pub(super) async fn statistics_impl(&self, top: usize) -> AppResult<CatalogStatistics> {
        let top_families_sql = format!(
            r#"
            SELECT f.name AS label, COUNT(*) AS count
            FROM specimens s
            JOIN taxa t ON t.id = s.taxon_id
            JOIN families f ON f.id = t.family_id
            WHERE {VISIBLE}
            GROUP BY f.name
            ORDER BY count DESC, f.name
            LIMIT $1
            "#
        );
        let top_provinces_sql = format!(
            r#"
            SELECT g.name AS label, COUNT(DISTINCT s.id) AS count
            FROM collection_sites cs
            JOIN specimens s ON s.id = cs.specimen_id
            JOIN geo_nodes g ON g.id = cs.province_id
            WHERE {VISIBLE}
            GROUP BY g.name
            ORDER BY count DESC, g.name
            LIMIT $1
            "#
        );
        let by_year_sql = format!(
            r#"
            SELECT to_char(s.collection_date, 'YYYY') AS label, COUNT(*) AS count
            FROM specimens s
            WHERE {VISIBLE} AND s.collection_date IS NOT NULL
            GROUP BY label
            ORDER BY label
            "#
        );
        let map_points_sql = format!(
            r#"
            SELECT s.id, s.code, t.genus, t.species, cs.latitude, cs.longitude
            FROM collection_sites cs
            JOIN specimens s ON s.id = cs.specimen_id
            LEFT JOIN taxa t ON t.id = s.taxon_id
            WHERE {VISIBLE}
                AND cs.latitude IS NOT NULL
                AND cs.longitude IS NOT NULL
                AND NOT (cs.latitude = 0 AND cs.longitude = 0)
            ORDER BY s.code
            "#
        );

        let top = bigint(top, "ranking size")?;
        let top_families = sqlx::query_as::<_, BucketRow>(&top_families_sql)
            .bind(top)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("rank families"))?;
        let top_provinces = sqlx::query_as::<_, BucketRow>(&top_provinces_sql)
            .bind(top)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("rank provinces"))?;
        let by_year = sqlx::query_as::<_, BucketRow>(&by_year_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("count specimens per year"))?;
        let map_points = sqlx::query_as::<_, MapPointRow>(&map_points_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(internal("load map points"))?;

        Ok(CatalogStatistics {
            top_families: top_families.into_iter().map(CountBucket::from).collect(),
            top_provinces: top_provinces.into_iter().map(CountBucket::from).collect(),
            by_year: by_year.into_iter().map(CountBucket::from).collect(),
            map_points: map_points
                .into_iter()
                .map(|row| MapPoint {
                    specimen_id: SpecimenId::from_uuid(row.id),
                    scientific_name: optional_scientific_name(
                        row.genus.as_deref(),
                        row.species.as_deref(),
                    ),
                    code: row.code,
                    latitude: row.latitude,
                    longitude: row.longitude,
                })
                .collect(),
        })
    }
}
