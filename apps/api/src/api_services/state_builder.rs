use std::sync::Arc;

use herbarium_application::{
    AuditLogger, AuthorizationService, GeographyService, ImageService, PublicCatalogService,
    QrService, SpecimenService, TaxonomyService, UserService,
};
use herbarium_infrastructure::{Argon2PasswordHasher, QrPngRenderer, RasterImageInspector};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod repositories;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let repositories = repositories::build_repository_set(&pool);

    let authorization_service = AuthorizationService::new(repositories.user_repository.clone());
    let audit_logger = AuditLogger::new(
        repositories.audit_repository.clone(),
        authorization_service.clone(),
    );

    let qr_service = QrService::new(
        repositories.qr_code_repository.clone(),
        repositories.specimen_repository.clone(),
        Arc::new(QrPngRenderer::new()),
        authorization_service.clone(),
        audit_logger.clone(),
        config.public_base_url.clone(),
    );

    AppState {
        geography_service: GeographyService::new(
            repositories.geography_repository.clone(),
            authorization_service.clone(),
            audit_logger.clone(),
        ),
        image_service: ImageService::new(
            repositories.image_repository.clone(),
            repositories.taxonomy_repository.clone(),
            Arc::new(RasterImageInspector::new()),
            authorization_service.clone(),
            audit_logger.clone(),
        ),
        public_catalog_service: PublicCatalogService::new(
            repositories.public_catalog_repository,
            repositories.specimen_repository.clone(),
            repositories.taxonomy_repository.clone(),
            repositories.geography_repository.clone(),
            repositories.image_repository.clone(),
            qr_service.clone(),
        ),
        specimen_service: SpecimenService::new(
            repositories.specimen_repository.clone(),
            repositories.taxonomy_repository.clone(),
            repositories.geography_repository,
            authorization_service.clone(),
            audit_logger.clone(),
            config.code_prefix.clone(),
        ),
        taxonomy_service: TaxonomyService::new(
            repositories.taxonomy_repository,
            authorization_service.clone(),
            audit_logger.clone(),
        ),
        user_service: UserService::new(
            repositories.user_repository,
            Arc::new(Argon2PasswordHasher::new()),
            repositories.specimen_repository,
            repositories.image_repository,
            authorization_service,
            audit_logger.clone(),
            config.user_policy.clone(),
        ),
        qr_service,
        audit_logger,
        postgres_pool: pool,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
