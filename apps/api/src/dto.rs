mod audit;
mod auth;
mod common;
mod geography;
mod media;
mod public;
mod specimens;
mod taxonomy;
mod users;

pub use audit::{AuditEntryResponse, AuditLogQueryParams};
pub use auth::{AuthLoginRequest, AuthLoginResponse, BootstrapRequest};
pub use common::{
    CoordinateResponse, HealthDependencyStatus, HealthResponse, SessionResponse,
    UserIdentityResponse,
};
pub use geography::{
    CoordinatePreviewRequest, CoordinatePreviewResponse, CreateGeoNodeRequest,
    CreateReferencePointRequest, GeoNodeResponse, GeoNodesQuery, LocationPreviewRequest,
    LocationPreviewResponse, ReferencePointResponse,
};
pub use media::{
    ImageResponse, ImageUrls, ImageVariantParams, QrCodeResponse, QrOptionsRequest,
    QrScanResponse, QrScansParams, UpdateImageRequest, UploadImageParams,
};
pub use public::{
    CatalogStatisticsResponse, CatalogSummaryResponse, FilterOptionsResponse,
    FilterSelectionParams, GalleryItemResponse, GalleryParams, PublicSearchParams,
    PublicSearchResponse, PublicSpecimenDetailParams, PublicSpecimenDetailResponse,
    SuggestionParams, SuggestionResponse,
};
pub use specimens::{
    CollectionSiteRequest, NextCodeResponse, SiteResponse, SpecimenDetailResponse,
    SpecimenListParams, SpecimenRequest, SpecimenResponse,
};
pub use taxonomy::{
    ContributorQuery, ContributorResponse, CreateContributorRequest, CreateFamilyRequest,
    CreateHerbariumRequest, CreateTaxonRequest, FamilyResponse, HerbariumResponse, TaxaQuery,
    TaxonResponse,
};
pub use users::{
    AccountPolicyResponse, CreateUserRequest, UpdateUserActiveRequest, UpdateUserRoleRequest,
    UserActivityResponse, UserResponse,
};
