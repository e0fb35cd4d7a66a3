use std::sync::Arc;

use herbarium_infrastructure::{
    PostgresAuditRepository, PostgresGeographyRepository, PostgresImageRepository,
    PostgresPublicCatalogRepository, PostgresQrCodeRepository, PostgresSpecimenRepository,
    PostgresTaxonomyRepository, PostgresUserRepository,
};
use sqlx::PgPool;

pub(super) struct RepositorySet {
    pub(super) audit_repository: Arc<PostgresAuditRepository>,
    pub(super) geography_repository: Arc<PostgresGeographyRepository>,
    pub(super) image_repository: Arc<PostgresImageRepository>,
    pub(super) public_catalog_repository: Arc<PostgresPublicCatalogRepository>,
    pub(super) qr_code_repository: Arc<PostgresQrCodeRepository>,
    pub(super) specimen_repository: Arc<PostgresSpecimenRepository>,
    pub(super) taxonomy_repository: Arc<PostgresTaxonomyRepository>,
    pub(super) user_repository: Arc<PostgresUserRepository>,
}

pub(super) fn build_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        geography_repository: Arc::new(PostgresGeographyRepository::new(pool.clone())),
        image_repository: Arc::new(PostgresImageRepository::new(pool.clone())),
        public_catalog_repository: Arc::new(PostgresPublicCatalogRepository::new(pool.clone())),
        qr_code_repository: Arc::new(PostgresQrCodeRepository::new(pool.clone())),
        specimen_repository: Arc::new(PostgresSpecimenRepository::new(pool.clone())),
        taxonomy_repository: Arc::new(PostgresTaxonomyRepository::new(pool.clone())),
        user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
    }
}
