use herbarium_application::{CollectionSiteInput, SiteView, SpecimenDetail, SpecimenInput};
use herbarium_domain::{CollectionSite, Specimen};

use super::types::{
    CollectionSiteRequest, SiteResponse, SpecimenDetailResponse, SpecimenRequest,
    SpecimenResponse,
};
use crate::dto::CoordinateResponse;

impl From<SpecimenRequest> for SpecimenInput {
    fn from(request: SpecimenRequest) -> Self {
        Self {
            sheet_number: request.sheet_number,
            taxon_id: request.taxon_id,
            author_ids: request.author_ids,
            collector_ids: request.collector_ids,
            determiner_ids: request.determiner_ids,
            index_text: request.index_text,
            herbarium_id: request.herbarium_id,
            description: request.description,
            phenology: request.phenology,
            patent_year: request.patent_year,
            vicinity_id: request.vicinity_id,
            collection_date: request.collection_date,
            elevation: request.elevation,
            status: request.status,
            is_public: request.is_public,
        }
    }
}

impl From<Specimen> for SpecimenResponse {
    fn from(specimen: Specimen) -> Self {
        Self {
            specimen_id: specimen.specimen_id.to_string(),
            code: specimen.code.as_str().to_owned(),
            sheet_number: specimen.sheet_number,
            taxon_id: specimen.taxon_id.map(|id| id.to_string()),
            author_ids: specimen.author_ids.iter().map(ToString::to_string).collect(),
            collector_ids: specimen
                .collector_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            determiner_ids: specimen
                .determiner_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            index_text: specimen.index_text,
            herbarium_id: specimen.herbarium_id.map(|id| id.to_string()),
            description: specimen.description,
            phenology: specimen.phenology,
            patent_year: specimen.patent_year,
            vicinity_id: specimen.vicinity_id.map(|id| id.to_string()),
            collection_date: specimen.collection_date,
            elevation: specimen.elevation,
            status: specimen.status.as_str().to_owned(),
            is_public: specimen.is_public,
            created_by: specimen.created_by,
            created_at: specimen.created_at,
            updated_by: specimen.updated_by,
            updated_at: specimen.updated_at,
        }
    }
}

impl From<SpecimenDetail> for SpecimenDetailResponse {
    fn from(detail: SpecimenDetail) -> Self {
        Self {
            specimen: SpecimenResponse::from(detail.specimen),
            display_name: detail.display_name,
            scientific_name: detail.scientific_name,
            herbarium: detail.herbarium,
            authors: detail.authors,
            collectors: detail.collectors,
            determiners: detail.determiners,
            primary_location_label: detail.primary_location_label,
            sites: detail.sites.into_iter().map(SiteResponse::from).collect(),
        }
    }
}

impl From<CollectionSiteRequest> for CollectionSiteInput {
    fn from(request: CollectionSiteRequest) -> Self {
        Self {
            herbarium_id: request.herbarium_id,
            location: request.location,
            collection_number: request.collection_number,
            collection_date: request.collection_date,
            collection_method: request.collection_method,
            is_primary: request.is_primary,
            habitat: request.habitat,
            field_notes: request.field_notes,
            coordinate: request.coordinate,
        }
    }
}

impl From<CollectionSite> for SiteResponse {
    fn from(site: CollectionSite) -> Self {
        Self {
            site_id: site.site_id.to_string(),
            specimen_id: site.specimen_id.to_string(),
            herbarium_id: site.herbarium_id.map(|id| id.to_string()),
            location: site.location,
            location_label: None,
            collection_number: site.collection_number,
            collection_date: site.collection_date,
            collection_method: site.collection_method,
            is_primary: site.is_primary,
            habitat: site.habitat,
            field_notes: site.field_notes,
            coordinate: site.coordinate.as_ref().map(CoordinateResponse::from),
        }
    }
}

impl From<SiteView> for SiteResponse {
    fn from(view: SiteView) -> Self {
        Self {
            location_label: Some(view.location_label),
            ..Self::from(view.site)
        }
    }
}
