use super::*;

use herbarium_domain::{Coordinate, LocationSelection};

#[derive(Debug, FromRow)]
struct SiteRow {
    id: uuid::Uuid,
    specimen_id: uuid::Uuid,
    herbarium_id: Option<uuid::Uuid>,
    country_id: Option<uuid::Uuid>,
    province_id: Option<uuid::Uuid>,
    canton_id: Option<uuid::Uuid>,
    locality_id: Option<uuid::Uuid>,
    vicinity_id: Option<uuid::Uuid>,
    collection_number: Option<String>,
    collection_date: Option<NaiveDate>,
    collection_method: Option<String>,
    is_primary: bool,
    habitat: Option<String>,
    field_notes: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
    utm: Option<String>,
    coordinate_description: Option<String>,
    created_by: Option<String>,
}

impl TryFrom<SiteRow> for CollectionSite {
    type Error = AppError;

    fn try_from(row: SiteRow) -> AppResult<Self> {
        let coordinate = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(
                Coordinate::new(latitude, longitude, row.elevation)?
                    .with_details(row.utm, row.coordinate_description),
            ),
            _ => None,
        };

        Ok(Self {
            site_id: SiteId::from_uuid(row.id),
            specimen_id: SpecimenId::from_uuid(row.specimen_id),
            herbarium_id: row.herbarium_id.map(HerbariumId::from_uuid),
            location: LocationSelection {
                country: row.country_id.map(GeoNodeId::from_uuid),
                province: row.province_id.map(GeoNodeId::from_uuid),
                canton: row.canton_id.map(GeoNodeId::from_uuid),
                locality: row.locality_id.map(GeoNodeId::from_uuid),
                vicinity: row.vicinity_id.map(GeoNodeId::from_uuid),
            },
            collection_number: row.collection_number,
            collection_date: row.collection_date,
            collection_method: row.collection_method,
            is_primary: row.is_primary,
            habitat: row.habitat,
            field_notes: row.field_notes,
            coordinate,
            created_by: row.created_by,
        })
    }
}

const SITE_COLUMNS: &str = r#"
    id,
    specimen_id,
    herbarium_id,
    country_id,
    province_id,
    canton_id,
    locality_id,
    vicinity_id,
    collection_number,
    collection_date,
    collection_method,
    is_primary,
    habitat,
    field_notes,
    latitude,
    longitude,
    elevation,
    utm,
    coordinate_description,
    created_by
"#;

fn node_uuid(node_id: Option<GeoNodeId>) -> Option<uuid::Uuid> {
    node_id.map(|id| id.as_uuid())
}

impl PostgresSpecimenRepository {
    pub(super) async fn list_sites_impl(
        &self,
        specimen_id: SpecimenId,
    ) -> AppResult<Vec<CollectionSite>> {
        let sql = format!(
            r#"
            SELECT {SITE_COLUMNS}
            FROM collection_sites
            WHERE specimen_id = $1
            ORDER BY is_primary DESC, created_at, id
            "#
        );

        sqlx::query_as::<_, SiteRow>(&sql)
            .bind(specimen_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list collection sites: {error}"))
            })?
            .into_iter()
            .map(CollectionSite::try_from)
            .collect()
    }

    pub(super) async fn find_site_impl(&self, site_id: SiteId) -> AppResult<Option<CollectionSite>> {
        let sql = format!("SELECT {SITE_COLUMNS} FROM collection_sites WHERE id = $1");

        sqlx::query_as::<_, SiteRow>(&sql)
            .bind(site_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find collection site: {error}"))
            })?
            .map(CollectionSite::try_from)
            .transpose()
    }

    pub(super) async fn save_site_impl(
        &self,
        site: &CollectionSite,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        if site.is_primary {
            sqlx::query(
                r#"
                UPDATE collection_sites
                SET is_primary = FALSE
                WHERE specimen_id = $1 AND id <> $2 AND is_primary
                "#,
            )
            .bind(site.specimen_id.as_uuid())
            .bind(site.site_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to demote primary site: {error}"))
            })?;
        }

        let coordinate = site.coordinate.as_ref();
        sqlx::query(
            r#"
            INSERT INTO collection_sites (
                id,
                specimen_id,
                herbarium_id,
                country_id,
                province_id,
                canton_id,
                locality_id,
                vicinity_id,
                collection_number,
                collection_date,
                collection_method,
                is_primary,
                habitat,
                field_notes,
                latitude,
                longitude,
                elevation,
                utm,
                coordinate_description,
                created_by
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            ON CONFLICT (id) DO UPDATE
            SET herbarium_id = EXCLUDED.herbarium_id,
                country_id = EXCLUDED.country_id,
                province_id = EXCLUDED.province_id,
                canton_id = EXCLUDED.canton_id,
                locality_id = EXCLUDED.locality_id,
                vicinity_id = EXCLUDED.vicinity_id,
                collection_number = EXCLUDED.collection_number,
                collection_date = EXCLUDED.collection_date,
                collection_method = EXCLUDED.collection_method,
                is_primary = EXCLUDED.is_primary,
                habitat = EXCLUDED.habitat,
                field_notes = EXCLUDED.field_notes,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                elevation = EXCLUDED.elevation,
                utm = EXCLUDED.utm,
                coordinate_description = EXCLUDED.coordinate_description
            "#,
        )
        .bind(site.site_id.as_uuid())
        .bind(site.specimen_id.as_uuid())
        .bind(site.herbarium_id.map(|id| id.as_uuid()))
        .bind(node_uuid(site.location.country))
        .bind(node_uuid(site.location.province))
        .bind(node_uuid(site.location.canton))
        .bind(node_uuid(site.location.locality))
        .bind(node_uuid(site.location.vicinity))
        .bind(site.collection_number.as_deref())
        .bind(site.collection_date)
        .bind(site.collection_method.as_deref())
        .bind(site.is_primary)
        .bind(site.habitat.as_deref())
        .bind(site.field_notes.as_deref())
        .bind(coordinate.map(Coordinate::latitude))
        .bind(coordinate.map(Coordinate::longitude))
        .bind(coordinate.and_then(Coordinate::elevation))
        .bind(coordinate.and_then(Coordinate::utm))
        .bind(coordinate.and_then(Coordinate::description))
        .bind(site.created_by.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "save collection site", || {
                "another site of this specimen is already primary".to_owned()
            })
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    pub(super) async fn delete_site_impl(
        &self,
        site_id: SiteId,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = sqlx::query("DELETE FROM collection_sites WHERE id = $1")
            .bind(site_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete collection site: {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "collection site '{site_id}' does not exist"
            )));
        }

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }
}
