use async_trait::async_trait;
use chrono::NaiveDate;
use herbarium_core::AppResult;
use herbarium_domain::{FamilyId, GeoNodeId, ImageId, SpecimenId, TaxonId};

/// Headline counts of the public catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Visible specimens.
    pub specimens: i64,
    /// Families with visible specimens.
    pub families: i64,
    /// Taxa with visible specimens.
    pub taxa: i64,
    /// Provinces with visible collections.
    pub provinces: i64,
}

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountBucket {
    /// Group label.
    pub label: String,
    /// Number of specimens in the group.
    pub count: i64,
}

/// A plotted collection site.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    /// Specimen collected there.
    pub specimen_id: SpecimenId,
    /// Specimen code.
    pub code: String,
    /// Scientific name of the specimen's taxon.
    pub scientific_name: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Aggregates behind the statistics page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStatistics {
    /// Families with most specimens.
    pub top_families: Vec<CountBucket>,
    /// Provinces with most specimens.
    pub top_provinces: Vec<CountBucket>,
    /// Specimens per collection year, oldest first.
    pub by_year: Vec<CountBucket>,
    /// Sites with non-zero coordinates.
    pub map_points: Vec<MapPoint>,
}

/// Public search filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSearchQuery {
    /// Matches code, genus, species or family name.
    pub text: Option<String>,
    /// Restricts to one family.
    pub family_id: Option<FamilyId>,
    /// Restricts to one genus.
    pub genus: Option<String>,
    /// Restricts to sites in one province.
    pub province_id: Option<GeoNodeId>,
    /// Restricts to sites in one canton.
    pub canton_id: Option<GeoNodeId>,
    /// Earliest collection year.
    pub year_from: Option<i32>,
    /// Latest collection year.
    pub year_to: Option<i32>,
    /// Only taxa with at least one image.
    pub with_images: bool,
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
}

impl Default for PublicSearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            family_id: None,
            genus: None,
            province_id: None,
            canton_id: None,
            year_from: None,
            year_to: None,
            with_images: false,
            limit: 20,
            offset: 0,
        }
    }
}

/// Search result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSpecimenSummary {
    /// Specimen identifier.
    pub specimen_id: SpecimenId,
    /// Specimen code.
    pub code: String,
    /// Taxon identifier.
    pub taxon_id: Option<TaxonId>,
    /// Scientific name.
    pub scientific_name: Option<String>,
    /// Family name.
    pub family: Option<String>,
    /// Collection date.
    pub collection_date: Option<NaiveDate>,
    /// Label of the primary site.
    pub location_label: String,
    /// Cover image of the taxon.
    pub primary_image_id: Option<ImageId>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicSearchPage {
    /// Rows of this page.
    pub items: Vec<PublicSpecimenSummary>,
    /// Rows matching the filters.
    pub total: i64,
}

/// Current selection used to narrow filter options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicFilterSelection {
    /// Selected family.
    pub family_id: Option<FamilyId>,
    /// Selected province.
    pub province_id: Option<GeoNodeId>,
}

/// One selectable filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    /// Value to submit.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Matching specimens.
    pub count: i64,
}

/// Filter values that still match visible specimens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Families.
    pub families: Vec<FilterOption>,
    /// Genera, within the selected family.
    pub genera: Vec<FilterOption>,
    /// Provinces.
    pub provinces: Vec<FilterOption>,
    /// Cantons, within the selected province.
    pub cantons: Vec<FilterOption>,
}

/// Gallery tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    /// Taxon shown.
    pub taxon_id: TaxonId,
    /// Scientific name.
    pub scientific_name: String,
    /// Family name.
    pub family: String,
    /// Cover image.
    pub image_id: ImageId,
    /// Visible specimens of the taxon.
    pub specimen_count: i64,
}

/// Autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Specimen to open.
    pub specimen_id: SpecimenId,
    /// Text shown.
    pub label: String,
}

/// Read-only queries over visible specimens.
///
/// A specimen is visible when it is public and its status is not
/// `eliminado`.
#[async_trait]
pub trait PublicCatalogRepository: Send + Sync {
    /// Headline counts.
    async fn summary(&self) -> AppResult<CatalogSummary>;

    /// Aggregates; `top` bounds the family and province rankings.
    async fn statistics(&self, top: usize) -> AppResult<CatalogStatistics>;

    /// Filtered search ordered by code.
    async fn search(&self, query: &PublicSearchQuery) -> AppResult<PublicSearchPage>;

    /// Filter values narrowed by the current selection.
    async fn filter_options(&self, selection: &PublicFilterSelection) -> AppResult<FilterOptions>;

    /// Cover images of taxa with visible specimens.
    async fn gallery(&self, limit: usize, offset: usize) -> AppResult<Vec<GalleryItem>>;

    /// Specimens matching code, genus, species or family.
    async fn suggestions(&self, text: &str, limit: usize) -> AppResult<Vec<Suggestion>>;

    /// Other visible specimens of the same family.
    async fn related_specimens(
        &self,
        specimen_id: SpecimenId,
        limit: usize,
    ) -> AppResult<Vec<PublicSpecimenSummary>>;
}
