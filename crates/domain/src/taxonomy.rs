use std::str::FromStr;

use herbarium_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ContributorId, FamilyId, HerbariumId, TaxonId};

const INDETERMINATE_SPECIES: [&str; 3] = ["indeterminado", "sp", "sp."];

/// Botanical family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Family identifier.
    pub family_id: FamilyId,
    /// Unique family name.
    pub name: NonEmptyString,
}

/// Genus and species within a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    taxon_id: TaxonId,
    genus: String,
    species: String,
    family_id: FamilyId,
}

impl Taxon {
    /// Creates a taxon after validating genus and species spelling.
    pub fn new(
        taxon_id: TaxonId,
        genus: impl Into<String>,
        species: impl Into<String>,
        family_id: FamilyId,
    ) -> AppResult<Self> {
        let genus = genus.into().trim().to_owned();
        let species = species.into().trim().to_owned();
        validate_genus(&genus)?;
        validate_species(&species)?;

        Ok(Self {
            taxon_id,
            genus,
            species,
            family_id,
        })
    }

    /// Returns the taxon identifier.
    #[must_use]
    pub fn taxon_id(&self) -> TaxonId {
        self.taxon_id
    }

    /// Returns the genus.
    #[must_use]
    pub fn genus(&self) -> &str {
        self.genus.as_str()
    }

    /// Returns the species epithet.
    #[must_use]
    pub fn species(&self) -> &str {
        self.species.as_str()
    }

    /// Returns the owning family.
    #[must_use]
    pub fn family_id(&self) -> FamilyId {
        self.family_id
    }

    /// Binomial name, or the genus alone for indeterminate species.
    #[must_use]
    pub fn scientific_name(&self) -> String {
        scientific_name(&self.genus, &self.species)
    }
}

/// Builds the scientific name from genus and species.
#[must_use]
pub fn scientific_name(genus: &str, species: &str) -> String {
    let lowered = species.trim().to_lowercase();
    if lowered.is_empty() || INDETERMINATE_SPECIES.contains(&lowered.as_str()) {
        return genus.to_owned();
    }

    format!("{genus} {species}")
}

/// A genus starts with an uppercase letter and holds only letters and spaces.
pub fn validate_genus(genus: &str) -> AppResult<()> {
    let mut characters = genus.chars();
    let starts_uppercase = characters
        .next()
        .is_some_and(|first| first.is_uppercase());

    if !starts_uppercase
        || !characters.all(|character| character.is_alphabetic() || character == ' ')
    {
        return Err(AppError::Validation(format!(
            "genus '{genus}' must start with an uppercase letter and contain only letters"
        )));
    }

    Ok(())
}

/// A species starts with a lowercase letter and holds only letters, spaces
/// and hyphens; indeterminate markers such as `sp.` are accepted as is.
pub fn validate_species(species: &str) -> AppResult<()> {
    if INDETERMINATE_SPECIES.contains(&species.to_lowercase().as_str()) {
        return Ok(());
    }

    let mut characters = species.chars();
    let starts_lowercase = characters
        .next()
        .is_some_and(|first| first.is_lowercase());

    if !starts_lowercase
        || !characters
            .all(|character| character.is_alphabetic() || character == ' ' || character == '-')
    {
        return Err(AppError::Validation(format!(
            "species '{species}' must start with a lowercase letter and contain only letters"
        )));
    }

    Ok(())
}

/// Role a person plays on a specimen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorKind {
    /// Author of the scientific name.
    Author,
    /// Field collector.
    Collector,
    /// Person who determined the taxon.
    Determiner,
}

impl ContributorKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Collector => "collector",
            Self::Determiner => "determiner",
        }
    }
}

impl FromStr for ContributorKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "author" => Ok(Self::Author),
            "collector" => Ok(Self::Collector),
            "determiner" => Ok(Self::Determiner),
            _ => Err(AppError::Validation(format!(
                "unknown contributor kind '{value}'"
            ))),
        }
    }
}

/// Author, collector or determiner; names are unique per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Contributor identifier.
    pub contributor_id: ContributorId,
    /// Role.
    pub kind: ContributorKind,
    /// Unique name within the kind.
    pub name: NonEmptyString,
}

/// Institution holding specimens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Herbarium {
    /// Herbarium identifier.
    pub herbarium_id: HerbariumId,
    /// Unique name.
    pub name: NonEmptyString,
    /// Index Herbariorum acronym.
    pub acronym: Option<String>,
}
