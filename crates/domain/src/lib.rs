//! Domain entities and invariants of the herbarium registry.

#![forbid(unsafe_code)]

mod audit;
mod collection_site;
mod coordinates;
mod geography;
mod ids;
mod media;
mod qr;
mod security;
mod specimen;
mod taxonomy;
mod user;

pub use audit::{
    AuditAction, AuditEntry, AuditTarget, AuditTargetType, EMPTY_REFERENCE_LABEL,
    EMPTY_REFERENCES_LABEL, FieldChange, draft_entries, render_flag, render_reference,
    render_references, render_text,
};
pub use collection_site::{CollectionSite, site_reference};
pub use coordinates::{
    Coordinate, CoordinateInput, ELEVATION_RANGE, LATITUDE_RANGE, LONGITUDE_RANGE,
    format_coordinates, parse_coordinates,
};
pub use geography::{
    GeoHierarchy, GeoLevel, GeoNode, LocationSelection, NO_LOCATION_LABEL, PointKind,
    ReferencePoint, location_label, normalize,
};
pub use ids::{
    AuditEntryId, ContributorId, FamilyId, GeoNodeId, HerbariumId, ImageId, QrCodeId,
    QrScanId, ReferencePointId, SiteId, SpecimenId, TaxonId, UserId,
};
pub use media::{ImageVariant, TaxonImage, default_image_filename, human_file_size};
pub use qr::{
    DEFAULT_QR_BORDER, DEFAULT_QR_BOX_SIZE, QrCode, QrErrorCorrection, QrResolution, QrScan,
    QrStatus, qr_filename, specimen_public_url,
};
pub use security::Permission;
pub use specimen::{
    CODE_DIGITS, CodePrefix, DEFAULT_CODE_PREFIX, PLACEHOLDER_CODE, PROVISIONAL_MARKER,
    Specimen, SpecimenCode, SpecimenSnapshot, SpecimenStatus, next_code, provisional_code,
    specimen_display_name,
};
pub use taxonomy::{
    ContributorKind, Contributor, Family, Herbarium, Taxon, scientific_name, validate_genus,
    validate_species,
};
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, STRONG_PASSWORD_MIN_LENGTH,
    validate_password,
};
