use chrono::NaiveDate;
use herbarium_domain::{FamilyId, GeoNodeId};
use serde::{Deserialize, Serialize};

use crate::dto::ImageUrls;

/// Totals shown on the catalogue landing page.
#[derive(Debug, Serialize)]
pub struct CatalogSummaryResponse {
    pub specimens: i64,
    pub families: i64,
    pub taxa: i64,
    pub provinces: i64,
}

/// One labelled count.
#[derive(Debug, Serialize)]
pub struct CountBucketResponse {
    pub label: String,
    pub count: i64,
}

/// Collection point plotted on the public map.
#[derive(Debug, Serialize)]
pub struct MapPointResponse {
    pub specimen_id: String,
    pub code: String,
    pub scientific_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Aggregates of the public catalogue.
#[derive(Debug, Serialize)]
pub struct CatalogStatisticsResponse {
    pub top_families: Vec<CountBucketResponse>,
    pub top_provinces: Vec<CountBucketResponse>,
    pub by_year: Vec<CountBucketResponse>,
    pub map_points: Vec<MapPointResponse>,
}

/// Public search filters. `q` matches code, genus, species or family.
#[derive(Debug, Default, Deserialize)]
pub struct PublicSearchParams {
    pub q: Option<String>,
    pub family_id: Option<FamilyId>,
    pub genus: Option<String>,
    pub province_id: Option<GeoNodeId>,
    pub canton_id: Option<GeoNodeId>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    #[serde(default)]
    pub with_images: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Search result row.
#[derive(Debug, Serialize)]
pub struct PublicSpecimenSummaryResponse {
    pub specimen_id: String,
    pub code: String,
    pub taxon_id: Option<String>,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub location_label: String,
    pub cover_image: Option<ImageUrls>,
}

/// One page of search results.
#[derive(Debug, Serialize)]
pub struct PublicSearchResponse {
    pub items: Vec<PublicSpecimenSummaryResponse>,
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
}

/// Current selection narrowing the filter options.
#[derive(Debug, Default, Deserialize)]
pub struct FilterSelectionParams {
    pub family_id: Option<FamilyId>,
    pub province_id: Option<GeoNodeId>,
}

/// One selectable filter value.
#[derive(Debug, Serialize)]
pub struct FilterOptionResponse {
    pub value: String,
    pub label: String,
    pub count: i64,
}

/// Values available for each search filter.
#[derive(Debug, Serialize)]
pub struct FilterOptionsResponse {
    pub families: Vec<FilterOptionResponse>,
    pub genera: Vec<FilterOptionResponse>,
    pub provinces: Vec<FilterOptionResponse>,
    pub cantons: Vec<FilterOptionResponse>,
}

/// Gallery paging.
#[derive(Debug, Deserialize)]
pub struct GalleryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Cover image of one taxon.
#[derive(Debug, Serialize)]
pub struct GalleryItemResponse {
    pub taxon_id: String,
    pub scientific_name: String,
    pub family: String,
    pub image_id: String,
    pub image: ImageUrls,
    pub specimen_count: i64,
}

/// Autocomplete input.
#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub q: String,
}

/// One autocomplete entry.
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub specimen_id: String,
    pub label: String,
}

/// Detail page flags. `from_qr` is set by printed labels.
#[derive(Debug, Default, Deserialize)]
pub struct PublicSpecimenDetailParams {
    #[serde(default, alias = "qr")]
    pub from_qr: bool,
}

/// Collection site as shown publicly.
#[derive(Debug, Serialize)]
pub struct PublicSiteResponse {
    pub location_label: String,
    pub collection_number: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub habitat: Option<String>,
    pub coordinate_text: Option<String>,
    pub maps_url: Option<String>,
    pub is_primary: bool,
}

/// Image metadata as shown publicly.
#[derive(Debug, Serialize)]
pub struct PublicImageResponse {
    pub image_id: String,
    pub description: Option<String>,
    pub width: i32,
    pub height: i32,
    pub is_primary: bool,
    pub camera: Option<String>,
    pub urls: ImageUrls,
}

/// Public detail page of a specimen.
#[derive(Debug, Serialize)]
pub struct PublicSpecimenDetailResponse {
    pub specimen_id: String,
    pub code: String,
    pub display_name: String,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub collectors: Vec<String>,
    pub collection_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub phenology: Option<String>,
    pub elevation: Option<f64>,
    pub sites: Vec<PublicSiteResponse>,
    pub images: Vec<PublicImageResponse>,
    pub related: Vec<PublicSpecimenSummaryResponse>,
}
