mod audit;
mod geography;
mod media;
mod public;
mod qr;
mod specimens;
mod taxonomy;

pub use audit::{AUDIT_LOG_MAX_LIMIT, AuditLogQuery, AuditRepository};
pub use geography::GeographyRepository;
pub use media::{ImageBinaries, ImageInspector, ImageRepository, InspectedImage};
pub use public::{
    CatalogStatistics, CatalogSummary, CountBucket, FilterOption, FilterOptions, GalleryItem,
    MapPoint, PublicCatalogRepository, PublicFilterSelection, PublicSearchPage,
    PublicSearchQuery, PublicSpecimenSummary, Suggestion,
};
pub use qr::{QrCodeRepository, QrRenderer};
pub use specimens::{ContributionCounts, SpecimenListQuery, SpecimenRepository};
pub use taxonomy::TaxonomyRepository;
