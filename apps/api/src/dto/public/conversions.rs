use herbarium_application::{
    CatalogStatistics, CatalogSummary, CountBucket, FilterOption, FilterOptions, GalleryItem,
    MapPoint, PublicFilterSelection, PublicImage, PublicSearchQuery, PublicSite,
    PublicSearchPage, PublicSpecimenDetail, PublicSpecimenSummary, Suggestion,
};

use super::types::{
    CatalogStatisticsResponse, CatalogSummaryResponse, CountBucketResponse,
    FilterOptionResponse, FilterOptionsResponse, FilterSelectionParams, GalleryItemResponse,
    MapPointResponse, PublicImageResponse, PublicSearchParams, PublicSiteResponse,
    PublicSearchResponse, PublicSpecimenDetailResponse, PublicSpecimenSummaryResponse,
    SuggestionResponse,
};
use crate::dto::ImageUrls;

impl From<CatalogSummary> for CatalogSummaryResponse {
    fn from(summary: CatalogSummary) -> Self {
        Self {
            specimens: summary.specimens,
            families: summary.families,
            taxa: summary.taxa,
            provinces: summary.provinces,
        }
    }
}

impl From<CountBucket> for CountBucketResponse {
    fn from(bucket: CountBucket) -> Self {
        Self {
            label: bucket.label,
            count: bucket.count,
        }
    }
}

impl From<MapPoint> for MapPointResponse {
    fn from(point: MapPoint) -> Self {
        Self {
            specimen_id: point.specimen_id.to_string(),
            code: point.code,
            scientific_name: point.scientific_name,
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

impl From<CatalogStatistics> for CatalogStatisticsResponse {
    fn from(statistics: CatalogStatistics) -> Self {
        Self {
            top_families: buckets(statistics.top_families),
            top_provinces: buckets(statistics.top_provinces),
            by_year: buckets(statistics.by_year),
            map_points: statistics
                .map_points
                .into_iter()
                .map(MapPointResponse::from)
                .collect(),
        }
    }
}

fn buckets(values: Vec<CountBucket>) -> Vec<CountBucketResponse> {
    values.into_iter().map(CountBucketResponse::from).collect()
}

impl From<PublicSearchParams> for PublicSearchQuery {
    fn from(params: PublicSearchParams) -> Self {
        let defaults = Self::default();
        Self {
            text: params.q,
            family_id: params.family_id,
            genus: params.genus,
            province_id: params.province_id,
            canton_id: params.canton_id,
            year_from: params.year_from,
            year_to: params.year_to,
            with_images: params.with_images,
            limit: params.limit.unwrap_or(defaults.limit),
            offset: params.offset.unwrap_or(defaults.offset),
        }
    }
}

impl From<PublicSpecimenSummary> for PublicSpecimenSummaryResponse {
    fn from(summary: PublicSpecimenSummary) -> Self {
        Self {
            specimen_id: summary.specimen_id.to_string(),
            code: summary.code,
            taxon_id: summary.taxon_id.map(|id| id.to_string()),
            scientific_name: summary.scientific_name,
            family: summary.family,
            collection_date: summary.collection_date,
            location_label: summary.location_label,
            cover_image: summary.primary_image_id.map(ImageUrls::for_image),
        }
    }
}

impl PublicSearchResponse {
    /// Wraps a result page together with the paging that produced it.
    #[must_use]
    pub fn from_page(page: PublicSearchPage, limit: usize, offset: usize) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(PublicSpecimenSummaryResponse::from)
                .collect(),
            total: page.total,
            limit,
            offset,
        }
    }
}

impl From<FilterSelectionParams> for PublicFilterSelection {
    fn from(params: FilterSelectionParams) -> Self {
        Self {
            family_id: params.family_id,
            province_id: params.province_id,
        }
    }
}

impl From<FilterOption> for FilterOptionResponse {
    fn from(option: FilterOption) -> Self {
        Self {
            value: option.value,
            label: option.label,
            count: option.count,
        }
    }
}

impl From<FilterOptions> for FilterOptionsResponse {
    fn from(options: FilterOptions) -> Self {
        let convert = |values: Vec<FilterOption>| {
            values
                .into_iter()
                .map(FilterOptionResponse::from)
                .collect::<Vec<_>>()
        };
        Self {
            families: convert(options.families),
            genera: convert(options.genera),
            provinces: convert(options.provinces),
            cantons: convert(options.cantons),
        }
    }
}

impl From<GalleryItem> for GalleryItemResponse {
    fn from(item: GalleryItem) -> Self {
        Self {
            taxon_id: item.taxon_id.to_string(),
            scientific_name: item.scientific_name,
            family: item.family,
            image_id: item.image_id.to_string(),
            image: ImageUrls::for_image(item.image_id),
            specimen_count: item.specimen_count,
        }
    }
}

impl From<Suggestion> for SuggestionResponse {
    fn from(suggestion: Suggestion) -> Self {
        Self {
            specimen_id: suggestion.specimen_id.to_string(),
            label: suggestion.label,
        }
    }
}

impl From<PublicSite> for PublicSiteResponse {
    fn from(site: PublicSite) -> Self {
        Self {
            location_label: site.location_label,
            collection_number: site.collection_number,
            collection_date: site.collection_date,
            habitat: site.habitat,
            coordinate_text: site.coordinate_text,
            maps_url: site.maps_url,
            is_primary: site.is_primary,
        }
    }
}

impl From<PublicImage> for PublicImageResponse {
    fn from(image: PublicImage) -> Self {
        Self {
            image_id: image.image_id.to_string(),
            urls: ImageUrls::for_image(image.image_id),
            description: image.description,
            width: image.width,
            height: image.height,
            is_primary: image.is_primary,
            camera: image.camera,
        }
    }
}

impl From<PublicSpecimenDetail> for PublicSpecimenDetailResponse {
    fn from(detail: PublicSpecimenDetail) -> Self {
        let specimen = detail.specimen;
        Self {
            specimen_id: specimen.specimen_id.to_string(),
            code: specimen.code.as_str().to_owned(),
            display_name: detail.display_name,
            scientific_name: detail.scientific_name,
            family: detail.family,
            collectors: detail.collectors,
            collection_date: specimen.collection_date,
            description: specimen.description,
            phenology: specimen.phenology,
            elevation: specimen.elevation,
            sites: detail
                .sites
                .into_iter()
                .map(PublicSiteResponse::from)
                .collect(),
            images: detail
                .images
                .into_iter()
                .map(PublicImageResponse::from)
                .collect(),
            related: detail
                .related
                .into_iter()
                .map(PublicSpecimenSummaryResponse::from)
                .collect(),
        }
    }
}
