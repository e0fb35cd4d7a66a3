//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod audit_rows;
mod image_inspector;
mod paging;
mod postgres_audit_repository;
mod postgres_geography_repository;
mod postgres_image_repository;
mod postgres_public_catalog_repository;
mod postgres_qr_code_repository;
mod postgres_specimen_repository;
mod postgres_taxonomy_repository;
mod postgres_user_repository;
mod qr_png_renderer;

#[cfg(test)]
mod test_support;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use image_inspector::RasterImageInspector;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_geography_repository::PostgresGeographyRepository;
pub use postgres_image_repository::PostgresImageRepository;
pub use postgres_public_catalog_repository::PostgresPublicCatalogRepository;
pub use postgres_qr_code_repository::PostgresQrCodeRepository;
pub use postgres_specimen_repository::PostgresSpecimenRepository;
pub use postgres_taxonomy_repository::PostgresTaxonomyRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use qr_png_renderer::QrPngRenderer;
