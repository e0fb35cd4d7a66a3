use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Coordinate, HerbariumId, LocationSelection, SiteId, SpecimenId};

/// Place and circumstances in which a specimen was collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSite {
    /// Site identifier.
    pub site_id: SiteId,
    /// Owning specimen.
    pub specimen_id: SpecimenId,
    /// Herbarium that holds the material from this site.
    pub herbarium_id: Option<HerbariumId>,
    /// Normalized location selectors.
    pub location: LocationSelection,
    /// Collector's field number.
    pub collection_number: Option<String>,
    /// Date of collection.
    pub collection_date: Option<NaiveDate>,
    /// Collection method.
    pub collection_method: Option<String>,
    /// Whether this is the specimen's primary site.
    pub is_primary: bool,
    /// Habitat description.
    pub habitat: Option<String>,
    /// Field notes.
    pub field_notes: Option<String>,
    /// Position, when recorded.
    pub coordinate: Option<Coordinate>,
    /// Subject that added the site.
    pub created_by: Option<String>,
}

/// Short reference used in specimen history, `#<number>` or `#sin número`.
#[must_use]
pub fn site_reference(collection_number: Option<&str>) -> String {
    match collection_number.map(str::trim) {
        Some(number) if !number.is_empty() => format!("#{number}"),
        _ => "#sin número".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::site_reference;

    #[test]
    fn reference_falls_back_when_number_is_missing() {
        assert_eq!(site_reference(Some("JC-102")), "#JC-102");
        assert_eq!(site_reference(Some("  ")), "#sin número");
        assert_eq!(site_reference(None), "#sin número");
    }
}
