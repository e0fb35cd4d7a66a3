//! Application services and ports of the herbarium registry.

#![forbid(unsafe_code)]

mod audit_logger;
mod authorization_service;
mod catalog_ports;
mod geography_service;
mod image_service;
mod public_catalog_service;
mod qr_service;
mod specimen_service;
mod taxonomy_service;
mod user_ports;
mod user_service;

#[cfg(test)]
mod test_support;

pub use audit_logger::AuditLogger;
pub use authorization_service::AuthorizationService;
pub use catalog_ports::{
    AUDIT_LOG_MAX_LIMIT, AuditLogQuery, AuditRepository, CatalogStatistics, CatalogSummary,
    ContributionCounts, CountBucket, FilterOption, FilterOptions, GalleryItem,
    GeographyRepository, ImageBinaries, ImageInspector, ImageRepository, InspectedImage,
    MapPoint, PublicCatalogRepository, PublicFilterSelection, PublicSearchPage,
    PublicSearchQuery, PublicSpecimenSummary, QrCodeRepository, QrRenderer, SpecimenListQuery,
    SpecimenRepository, Suggestion, TaxonomyRepository,
};
pub use geography_service::{
    CreateGeoNodeInput, CreateReferencePointInput, GeographyService, LocationPreview,
};
pub use image_service::{ImageContent, ImageService, UpdateImageInput, UploadImageInput};
pub use public_catalog_service::{
    PublicCatalogService, PublicImage, PublicSite, PublicSpecimenDetail,
};
pub use qr_service::{QrDownload, QrOptions, QrService};
pub use specimen_service::{
    CollectionSiteInput, SiteView, SpecimenDetail, SpecimenInput, SpecimenService,
};
pub use taxonomy_service::TaxonomyService;
pub use user_ports::{PasswordHasher, UserRecord, UserRepository};
pub use user_service::{AuthOutcome, NewUserInput, UserActivity, UserPolicy, UserService};
