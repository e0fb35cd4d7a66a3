mod conversions;
mod types;

pub use types::{
    CollectionSiteRequest, NextCodeResponse, SiteResponse, SpecimenDetailResponse,
    SpecimenListParams, SpecimenRequest, SpecimenResponse,
};
