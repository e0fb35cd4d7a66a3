use herbarium_domain::{Contributor, ContributorKind, Family, FamilyId, Herbarium, Taxon};
use serde::{Deserialize, Serialize};

/// Incoming payload for family creation.
#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

/// API representation of a family.
#[derive(Debug, Serialize)]
pub struct FamilyResponse {
    pub family_id: String,
    pub name: String,
}

impl From<Family> for FamilyResponse {
    fn from(family: Family) -> Self {
        Self {
            family_id: family.family_id.to_string(),
            name: family.name.into(),
        }
    }
}

/// Incoming payload for taxon creation.
#[derive(Debug, Deserialize)]
pub struct CreateTaxonRequest {
    pub genus: String,
    pub species: String,
    pub family_id: FamilyId,
}

/// Optional family filter for taxa.
#[derive(Debug, Deserialize)]
pub struct TaxaQuery {
    pub family_id: Option<FamilyId>,
}

/// API representation of a taxon.
#[derive(Debug, Serialize)]
pub struct TaxonResponse {
    pub taxon_id: String,
    pub genus: String,
    pub species: String,
    pub family_id: String,
    pub scientific_name: String,
}

impl From<Taxon> for TaxonResponse {
    fn from(taxon: Taxon) -> Self {
        Self {
            taxon_id: taxon.taxon_id().to_string(),
            genus: taxon.genus().to_owned(),
            species: taxon.species().to_owned(),
            family_id: taxon.family_id().to_string(),
            scientific_name: taxon.scientific_name(),
        }
    }
}

/// Incoming payload for author, collector or determiner creation.
#[derive(Debug, Deserialize)]
pub struct CreateContributorRequest {
    pub kind: ContributorKind,
    pub name: String,
}

/// Optional kind filter for contributors.
#[derive(Debug, Deserialize)]
pub struct ContributorQuery {
    pub kind: Option<ContributorKind>,
}

/// API representation of a contributor.
#[derive(Debug, Serialize)]
pub struct ContributorResponse {
    pub contributor_id: String,
    pub kind: String,
    pub name: String,
}

impl From<Contributor> for ContributorResponse {
    fn from(contributor: Contributor) -> Self {
        Self {
            contributor_id: contributor.contributor_id.to_string(),
            kind: contributor.kind.as_str().to_owned(),
            name: contributor.name.into(),
        }
    }
}

/// Incoming payload for herbarium creation.
#[derive(Debug, Deserialize)]
pub struct CreateHerbariumRequest {
    pub name: String,
    pub acronym: Option<String>,
}

/// API representation of a herbarium.
#[derive(Debug, Serialize)]
pub struct HerbariumResponse {
    pub herbarium_id: String,
    pub name: String,
    pub acronym: Option<String>,
}

impl From<Herbarium> for HerbariumResponse {
    fn from(herbarium: Herbarium) -> Self {
        Self {
            herbarium_id: herbarium.herbarium_id.to_string(),
            name: herbarium.name.into(),
            acronym: herbarium.acronym,
        }
    }
}
