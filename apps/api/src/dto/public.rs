mod conversions;
mod types;

pub use types::{
    CatalogStatisticsResponse, CatalogSummaryResponse, FilterOptionsResponse,
    FilterSelectionParams, GalleryItemResponse, GalleryParams, PublicSearchParams,
    PublicSearchResponse, PublicSpecimenDetailParams, PublicSpecimenDetailResponse,
    SuggestionParams, SuggestionResponse,
};
