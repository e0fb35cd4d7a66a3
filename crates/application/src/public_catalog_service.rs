use std::sync::Arc;

use chrono::NaiveDate;
use herbarium_core::{AppError, AppResult, RequestMetadata, UserIdentity};
use herbarium_domain::{
    CollectionSite, GeoHierarchy, ImageId, Specimen, SpecimenId, TaxonImage,
    specimen_display_name,
};

use crate::{
    CatalogStatistics, CatalogSummary, FilterOptions, GalleryItem, GeographyRepository,
    ImageRepository, PublicCatalogRepository, PublicFilterSelection, PublicSearchPage,
    PublicSearchQuery, PublicSpecimenSummary, QrService, SpecimenRepository, Suggestion,
    TaxonomyRepository,
};

const SEARCH_MAX_LIMIT: usize = 100;
const GALLERY_MAX_LIMIT: usize = 100;
const MAX_PAGE_OFFSET: usize = 1_000_000;
const STATISTICS_TOP: usize = 10;
const SUGGESTION_LIMIT: usize = 10;
const SUGGESTION_MIN_CHARS: usize = 2;
const RELATED_LIMIT: usize = 6;

/// Collection site as shown to visitors.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicSite {
    /// Location label, most specific level first.
    pub location_label: String,
    /// Collector's field number.
    pub collection_number: Option<String>,
    /// Date of collection.
    pub collection_date: Option<NaiveDate>,
    /// Habitat description.
    pub habitat: Option<String>,
    /// Coordinates in text form.
    pub coordinate_text: Option<String>,
    /// Map link for non-zero coordinates.
    pub maps_url: Option<String>,
    /// Whether this is the primary site.
    pub is_primary: bool,
}

impl PublicSite {
    fn new(site: CollectionSite, hierarchy: &GeoHierarchy) -> Self {
        Self {
            location_label: site.location.full_label(hierarchy),
            coordinate_text: site.coordinate.as_ref().map(|coordinate| coordinate.text()),
            maps_url: site
                .coordinate
                .as_ref()
                .and_then(|coordinate| coordinate.maps_url()),
            collection_number: site.collection_number,
            collection_date: site.collection_date,
            habitat: site.habitat,
            is_primary: site.is_primary,
        }
    }
}

/// Image metadata shown in the public gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicImage {
    /// Image identifier, used to fetch its renditions.
    pub image_id: ImageId,
    /// Caption.
    pub description: Option<String>,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Cover image flag.
    pub is_primary: bool,
    /// Camera make and model.
    pub camera: Option<String>,
}

impl From<TaxonImage> for PublicImage {
    fn from(image: TaxonImage) -> Self {
        Self {
            image_id: image.image_id,
            description: image.description,
            width: image.width,
            height: image.height,
            is_primary: image.is_primary,
            camera: image.camera,
        }
    }
}

/// Public detail page of a specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicSpecimenDetail {
    /// Specimen record.
    pub specimen: Specimen,
    /// `"{code} - {scientific name} ({date})"`.
    pub display_name: String,
    /// Scientific name of the taxon.
    pub scientific_name: Option<String>,
    /// Family of the taxon.
    pub family: Option<String>,
    /// Collector names.
    pub collectors: Vec<String>,
    /// Collection sites, primary first.
    pub sites: Vec<PublicSite>,
    /// Taxon images, cover first.
    pub images: Vec<PublicImage>,
    /// Other visible specimens of the same family.
    pub related: Vec<PublicSpecimenSummary>,
}

/// Read-only catalogue served without a session.
#[derive(Clone)]
pub struct PublicCatalogService {
    public_repository: Arc<dyn PublicCatalogRepository>,
    specimen_repository: Arc<dyn SpecimenRepository>,
    taxonomy_repository: Arc<dyn TaxonomyRepository>,
    geography_repository: Arc<dyn GeographyRepository>,
    image_repository: Arc<dyn ImageRepository>,
    qr_service: QrService,
}

impl PublicCatalogService {
    /// Creates a new public catalogue service.
    #[must_use]
    pub fn new(
        public_repository: Arc<dyn PublicCatalogRepository>,
        specimen_repository: Arc<dyn SpecimenRepository>,
        taxonomy_repository: Arc<dyn TaxonomyRepository>,
        geography_repository: Arc<dyn GeographyRepository>,
        image_repository: Arc<dyn ImageRepository>,
        qr_service: QrService,
    ) -> Self {
        Self {
            public_repository,
            specimen_repository,
            taxonomy_repository,
            geography_repository,
            image_repository,
            qr_service,
        }
    }

    /// Headline counts.
    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        self.public_repository.summary().await
    }

    /// Rankings, yearly counts and map points.
    pub async fn statistics(&self) -> AppResult<CatalogStatistics> {
        self.public_repository.statistics(STATISTICS_TOP).await
    }

    /// Filtered search. Blank text is ignored and the page size is capped.
    pub async fn search(&self, query: PublicSearchQuery) -> AppResult<PublicSearchPage> {
        if let (Some(from), Some(to)) = (query.year_from, query.year_to)
            && from > to
        {
            return Err(AppError::Validation(format!(
                "year range {from}-{to} is reversed"
            )));
        }

        check_offset(query.offset)?;

        let query = PublicSearchQuery {
            text: query
                .text
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            genus: query
                .genus
                .map(|genus| genus.trim().to_owned())
                .filter(|genus| !genus.is_empty()),
            limit: query.limit.clamp(1, SEARCH_MAX_LIMIT),
            ..query
        };

        self.public_repository.search(&query).await
    }

    /// Filter values narrowed by the current selection.
    pub async fn filter_options(
        &self,
        selection: PublicFilterSelection,
    ) -> AppResult<FilterOptions> {
        self.public_repository.filter_options(&selection).await
    }

    /// Cover images of taxa with visible specimens.
    pub async fn gallery(&self, limit: usize, offset: usize) -> AppResult<Vec<GalleryItem>> {
        check_offset(offset)?;
        self.public_repository
            .gallery(limit.clamp(1, GALLERY_MAX_LIMIT), offset)
            .await
    }

    /// Autocomplete suggestions; fewer than two characters yield none.
    pub async fn suggestions(&self, text: &str) -> AppResult<Vec<Suggestion>> {
        let text = text.trim();
        if text.chars().count() < SUGGESTION_MIN_CHARS {
            return Ok(Vec::new());
        }

        self.public_repository
            .suggestions(text, SUGGESTION_LIMIT)
            .await
    }

    /// Detail page of a visible specimen.
    ///
    /// Opening the page from a printed label registers a scan on the
    /// specimen's active QR code.
    pub async fn specimen_detail(
        &self,
        specimen_id: SpecimenId,
        from_qr: bool,
        request: &RequestMetadata,
        viewer: Option<&UserIdentity>,
    ) -> AppResult<PublicSpecimenDetail> {
        let specimen = self
            .specimen_repository
            .find_specimen(specimen_id)
            .await?
            .filter(Specimen::is_publicly_visible)
            .ok_or_else(|| AppError::NotFound(format!("specimen '{specimen_id}' does not exist")))?;

        if from_qr {
            self.qr_service
                .register_scan_for_specimen(specimen_id, request, viewer)
                .await?;
        }

        let taxon = match specimen.taxon_id {
            Some(taxon_id) => self.taxonomy_repository.find_taxon(taxon_id).await?,
            None => None,
        };
        let family = match taxon.as_ref() {
            Some(taxon) => self
                .taxonomy_repository
                .find_family(taxon.family_id())
                .await?
                .map(|family| family.name.to_string()),
            None => None,
        };
        let images = match taxon.as_ref() {
            Some(taxon) => self
                .image_repository
                .list_images(taxon.taxon_id())
                .await?
                .into_iter()
                .map(PublicImage::from)
                .collect(),
            None => Vec::new(),
        };
        let scientific_name = taxon.as_ref().map(|taxon| taxon.scientific_name());

        let collectors = self
            .taxonomy_repository
            .find_contributors(&specimen.collector_ids)
            .await?
            .into_iter()
            .map(|contributor| contributor.name.to_string())
            .collect();

        let sites = self.specimen_repository.list_sites(specimen_id).await?;
        let sites = if sites.is_empty() {
            Vec::new()
        } else {
            let hierarchy = self.geography_repository.load_hierarchy().await?;
            sites
                .into_iter()
                .map(|site| PublicSite::new(site, &hierarchy))
                .collect()
        };

        let related = self
            .public_repository
            .related_specimens(specimen_id, RELATED_LIMIT)
            .await?;

        Ok(PublicSpecimenDetail {
            display_name: specimen_display_name(
                specimen.code.as_str(),
                scientific_name.as_deref(),
                specimen.collection_date,
            ),
            specimen,
            scientific_name,
            family,
            collectors,
            sites,
            images,
            related,
        })
    }
}

fn check_offset(offset: usize) -> AppResult<()> {
    if offset > MAX_PAGE_OFFSET {
        return Err(AppError::Validation(format!(
            "page offset {offset} exceeds {MAX_PAGE_OFFSET}"
        )));
    }
    Ok(())
}
