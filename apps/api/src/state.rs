use herbarium_application::{
    AuditLogger, GeographyService, ImageService, PublicCatalogService, QrService,
    SpecimenService, TaxonomyService, UserService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub audit_logger: AuditLogger,
    pub geography_service: GeographyService,
    pub image_service: ImageService,
    pub public_catalog_service: PublicCatalogService,
    pub qr_service: QrService,
    pub specimen_service: SpecimenService,
    pub taxonomy_service: TaxonomyService,
    pub user_service: UserService,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
