use chrono::{DateTime, NaiveDate, Utc};
use herbarium_domain::{
    ContributorId, CoordinateInput, GeoNodeId, HerbariumId, LocationSelection, SpecimenStatus,
    TaxonId,
};
use serde::{Deserialize, Serialize};

use crate::dto::CoordinateResponse;

/// Incoming payload for specimen creation and update.
#[derive(Debug, Deserialize)]
pub struct SpecimenRequest {
    pub sheet_number: Option<String>,
    pub taxon_id: Option<TaxonId>,
    #[serde(default)]
    pub author_ids: Vec<ContributorId>,
    #[serde(default)]
    pub collector_ids: Vec<ContributorId>,
    #[serde(default)]
    pub determiner_ids: Vec<ContributorId>,
    pub index_text: Option<String>,
    pub herbarium_id: Option<HerbariumId>,
    pub description: Option<String>,
    pub phenology: Option<String>,
    pub patent_year: Option<i32>,
    pub vicinity_id: Option<GeoNodeId>,
    pub collection_date: Option<NaiveDate>,
    pub elevation: Option<f64>,
    #[serde(default)]
    pub status: SpecimenStatus,
    #[serde(default = "visible_by_default")]
    pub is_public: bool,
}

fn visible_by_default() -> bool {
    true
}

/// Filters for the curator specimen list.
#[derive(Debug, Deserialize)]
pub struct SpecimenListParams {
    pub search: Option<String>,
    pub status: Option<SpecimenStatus>,
    pub taxon_id: Option<TaxonId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of a specimen.
#[derive(Debug, Serialize)]
pub struct SpecimenResponse {
    pub specimen_id: String,
    pub code: String,
    pub sheet_number: Option<String>,
    pub taxon_id: Option<String>,
    pub author_ids: Vec<String>,
    pub collector_ids: Vec<String>,
    pub determiner_ids: Vec<String>,
    pub index_text: Option<String>,
    pub herbarium_id: Option<String>,
    pub description: Option<String>,
    pub phenology: Option<String>,
    pub patent_year: Option<i32>,
    pub vicinity_id: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub elevation: Option<f64>,
    pub status: String,
    pub is_public: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Specimen with resolved names and its collection sites.
#[derive(Debug, Serialize)]
pub struct SpecimenDetailResponse {
    pub specimen: SpecimenResponse,
    pub display_name: String,
    pub scientific_name: Option<String>,
    pub herbarium: Option<String>,
    pub authors: Vec<String>,
    pub collectors: Vec<String>,
    pub determiners: Vec<String>,
    pub primary_location_label: String,
    pub sites: Vec<SiteResponse>,
}

/// Code the next specimen would receive.
#[derive(Debug, Serialize)]
pub struct NextCodeResponse {
    pub code: String,
}

/// Incoming payload for a collection site.
#[derive(Debug, Deserialize)]
pub struct CollectionSiteRequest {
    pub herbarium_id: Option<HerbariumId>,
    #[serde(default)]
    pub location: LocationSelection,
    pub collection_number: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub collection_method: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    pub habitat: Option<String>,
    pub field_notes: Option<String>,
    #[serde(default)]
    pub coordinate: CoordinateInput,
}

/// API representation of a collection site.
#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub site_id: String,
    pub specimen_id: String,
    pub herbarium_id: Option<String>,
    pub location: LocationSelection,
    /// Present when the site is listed together with the geography.
    pub location_label: Option<String>,
    pub collection_number: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub collection_method: Option<String>,
    pub is_primary: bool,
    pub habitat: Option<String>,
    pub field_notes: Option<String>,
    pub coordinate: Option<CoordinateResponse>,
}
