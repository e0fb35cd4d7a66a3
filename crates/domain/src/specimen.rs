//! Specimen records, sequential catalogue codes and change tracking.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use herbarium_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{
    ContributorId, FieldChange, GeoNodeId, HerbariumId, SpecimenId, TaxonId, render_flag,
    render_reference, render_references, render_text,
};

/// Default catalogue code prefix.
pub const DEFAULT_CODE_PREFIX: &str = "CHEP";

/// Number of digits in a permanent code suffix.
pub const CODE_DIGITS: usize = 7;

/// Marker of a code previewed before the record is saved.
pub const PROVISIONAL_MARKER: &str = "(Provisional)";

/// Placeholder code of a record not yet numbered.
pub const PLACEHOLDER_CODE: &str = "Nuevo";

const MAX_SEQUENCE: u32 = 9_999_999;

/// Validated catalogue code prefix, e.g. `CHEP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodePrefix(String);

impl CodePrefix {
    /// Creates a prefix of uppercase ASCII letters and digits.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty()
            || !value
                .chars()
                .all(|character| character.is_ascii_uppercase() || character.is_ascii_digit())
        {
            return Err(AppError::Validation(format!(
                "code prefix '{value}' must be uppercase letters and digits"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the prefix text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn sequence_of(&self, code: &str) -> Option<u32> {
        if code == PLACEHOLDER_CODE || code.contains(PROVISIONAL_MARKER) {
            return None;
        }

        let suffix = code.strip_prefix(self.0.as_str())?.strip_prefix('-')?;
        if suffix.len() != CODE_DIGITS || !suffix.chars().all(|value| value.is_ascii_digit()) {
            return None;
        }

        suffix.parse().ok()
    }
}

impl Default for CodePrefix {
    fn default() -> Self {
        Self(DEFAULT_CODE_PREFIX.to_owned())
    }
}

/// Permanent catalogue code, `PREFIX-NNNNNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpecimenCode(String);

impl SpecimenCode {
    /// Parses a stored or user supplied code.
    pub fn parse(prefix: &CodePrefix, value: &str) -> AppResult<Self> {
        let value = value.trim();
        prefix
            .sequence_of(value)
            .map(|_| Self(value.to_owned()))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "code '{value}' does not match {}-{}",
                    prefix.as_str(),
                    "0".repeat(CODE_DIGITS)
                ))
            })
    }

    /// Wraps a code read back from storage, where it was validated on insert.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the code for a sequence number.
    pub fn from_sequence(prefix: &CodePrefix, sequence: u32) -> AppResult<Self> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(AppError::Validation(format!(
                "code sequence {sequence} is outside 1..={MAX_SEQUENCE}"
            )));
        }

        Ok(Self(format!(
            "{}-{sequence:0width$}",
            prefix.as_str(),
            width = CODE_DIGITS
        )))
    }

    /// Returns the code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SpecimenCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Computes the code following the highest existing permanent code.
///
/// Placeholders, provisional previews and codes with another prefix or a
/// malformed suffix are ignored. This is a best-effort sequencer: the store
/// must reject duplicate codes.
pub fn next_code<'a>(
    prefix: &CodePrefix,
    existing: impl IntoIterator<Item = &'a str>,
) -> AppResult<SpecimenCode> {
    let highest = existing
        .into_iter()
        .filter_map(|code| prefix.sequence_of(code))
        .max()
        .unwrap_or(0);

    if highest >= MAX_SEQUENCE {
        return Err(AppError::Validation(format!(
            "code sequence for prefix {} is exhausted",
            prefix.as_str()
        )));
    }

    SpecimenCode::from_sequence(prefix, highest + 1)
}

/// Preview of the next code, shown before a record is saved.
pub fn provisional_code<'a>(
    prefix: &CodePrefix,
    existing: impl IntoIterator<Item = &'a str>,
) -> AppResult<String> {
    next_code(prefix, existing).map(|code| format!("{code} {PROVISIONAL_MARKER}"))
}

/// Curation status of a specimen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenStatus {
    /// Being catalogued.
    #[default]
    Borrador,
    /// Awaiting review.
    Revision,
    /// Published in the collection.
    Activo,
    /// Archived.
    Archivado,
    /// Logically removed.
    Eliminado,
}

impl SpecimenStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Borrador => "borrador",
            Self::Revision => "revision",
            Self::Activo => "activo",
            Self::Archivado => "archivado",
            Self::Eliminado => "eliminado",
        }
    }
}

impl FromStr for SpecimenStatus {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "borrador" => Ok(Self::Borrador),
            "revision" => Ok(Self::Revision),
            "activo" => Ok(Self::Activo),
            "archivado" => Ok(Self::Archivado),
            "eliminado" => Ok(Self::Eliminado),
            _ => Err(AppError::Validation(format!(
                "unknown specimen status '{value}'"
            ))),
        }
    }
}

/// A herbarium sheet registered in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    /// Specimen identifier.
    pub specimen_id: SpecimenId,
    /// Unique catalogue code.
    pub code: SpecimenCode,
    /// Sheet number.
    pub sheet_number: Option<String>,
    /// Determined taxon.
    pub taxon_id: Option<TaxonId>,
    /// Authors of the determination.
    pub author_ids: Vec<ContributorId>,
    /// Collectors.
    pub collector_ids: Vec<ContributorId>,
    /// Determiners.
    pub determiner_ids: Vec<ContributorId>,
    /// Index text.
    pub index_text: Option<String>,
    /// Holding herbarium.
    pub herbarium_id: Option<HerbariumId>,
    /// Free description.
    pub description: Option<String>,
    /// Phenology at collection time.
    pub phenology: Option<String>,
    /// Patent year.
    pub patent_year: Option<i32>,
    /// Vicinity recorded on the sheet.
    pub vicinity_id: Option<GeoNodeId>,
    /// Date of collection recorded on the sheet.
    pub collection_date: Option<NaiveDate>,
    /// Elevation in metres recorded on the sheet.
    pub elevation: Option<f64>,
    /// Curation status.
    pub status: SpecimenStatus,
    /// Whether the specimen is shown in the public catalogue.
    pub is_public: bool,
    /// Subject that created the record.
    pub created_by: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Subject of the last update.
    pub updated_by: Option<String>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Specimen {
    /// Whether the public catalogue may show this specimen.
    #[must_use]
    pub fn is_publicly_visible(&self) -> bool {
        self.is_public && self.status != SpecimenStatus::Eliminado
    }
}

/// Display values of the tracked specimen fields, compared on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecimenSnapshot {
    /// Scientific name of the taxon.
    pub taxon: Option<String>,
    /// Sheet number.
    pub sheet_number: Option<String>,
    /// Index text.
    pub index_text: Option<String>,
    /// Herbarium name.
    pub herbarium: Option<String>,
    /// Author names.
    pub authors: Vec<String>,
    /// Collector names.
    pub collectors: Vec<String>,
    /// Determiner names.
    pub determiners: Vec<String>,
    /// Status storage value.
    pub status: String,
    /// Public flag.
    pub is_public: bool,
    /// Description.
    pub description: Option<String>,
    /// Phenology.
    pub phenology: Option<String>,
}

impl SpecimenSnapshot {
    fn rendered(&self) -> [(&'static str, String); 11] {
        [
            ("taxon", render_reference(self.taxon.as_deref())),
            ("sheet_number", render_text(self.sheet_number.as_deref())),
            ("index_text", render_text(self.index_text.as_deref())),
            ("herbarium", render_reference(self.herbarium.as_deref())),
            ("authors", render_references(&self.authors)),
            ("collectors", render_references(&self.collectors)),
            ("determiners", render_references(&self.determiners)),
            ("status", self.status.clone()),
            ("is_public", render_flag(self.is_public)),
            ("description", render_text(self.description.as_deref())),
            ("phenology", render_text(self.phenology.as_deref())),
        ]
    }

    /// Lists the tracked fields whose rendered value differs in `after`.
    #[must_use]
    pub fn diff(&self, after: &Self) -> Vec<FieldChange> {
        self.rendered()
            .into_iter()
            .zip(after.rendered())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| FieldChange::new(field, old, new))
            .collect()
    }
}

/// `"{code} - {scientific name} ({collection date})"`, omitting missing parts.
#[must_use]
pub fn specimen_display_name(
    code: &str,
    scientific_name: Option<&str>,
    collection_date: Option<NaiveDate>,
) -> String {
    let mut name = code.to_owned();
    if let Some(scientific_name) = scientific_name {
        name.push_str(" - ");
        name.push_str(scientific_name);
    }
    if let Some(date) = collection_date {
        name.push_str(&format!(" ({date})"));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> CodePrefix {
        CodePrefix::default()
    }

    #[test]
    fn first_code_starts_at_one() {
        let code = next_code(&prefix(), Vec::<&str>::new()).unwrap_or_else(|_| unreachable!());
        assert_eq!(code.as_str(), "CHEP-0000001");
    }

    #[test]
    fn next_code_increments_highest_sequence() {
        let first = next_code(&prefix(), Vec::<&str>::new()).unwrap_or_else(|_| unreachable!());
        let second = next_code(&prefix(), [first.as_str()]).unwrap_or_else(|_| unreachable!());
        assert_eq!(second.as_str(), "CHEP-0000002");

        let code = next_code(&prefix(), ["CHEP-0000007", "CHEP-0000003"])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(code.as_str(), "CHEP-0000008");
    }

    #[test]
    fn placeholders_and_foreign_codes_are_ignored() {
        let code = next_code(
            &prefix(),
            [
                "Nuevo",
                "CHEP-0000090 (Provisional)",
                "QCA-0000500",
                "CHEP-12",
                "CHEP-00000AB",
                "CHEP-0000004",
            ],
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(code.as_str(), "CHEP-0000005");
    }

    #[test]
    fn exhausted_sequence_is_rejected() {
        assert!(next_code(&prefix(), ["CHEP-9999999"]).is_err());
    }

    #[test]
    fn provisional_preview_is_marked() {
        let preview = provisional_code(&prefix(), ["CHEP-0000001"]).unwrap_or_else(|_| unreachable!());
        assert_eq!(preview, "CHEP-0000002 (Provisional)");
    }

    #[test]
    fn malformed_code_lookup_is_a_validation_error() {
        assert!(SpecimenCode::parse(&prefix(), "CHEP-0000012").is_ok());
        assert!(matches!(
            SpecimenCode::parse(&prefix(), "CHEP-12"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn prefix_must_be_uppercase() {
        assert!(CodePrefix::new("QCA").is_ok());
        assert!(CodePrefix::new("chep").is_err());
        assert!(CodePrefix::new("").is_err());
    }

    #[test]
    fn display_name_omits_missing_parts() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(
            specimen_display_name("CHEP-0000001", Some("Espeletia pycnophylla"), date),
            "CHEP-0000001 - Espeletia pycnophylla (2024-03-15)"
        );
        assert_eq!(specimen_display_name("CHEP-0000002", None, None), "CHEP-0000002");
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let before = SpecimenSnapshot {
            taxon: None,
            collectors: vec!["Ana Paredes".to_owned()],
            status: "borrador".to_owned(),
            is_public: true,
            ..SpecimenSnapshot::default()
        };
        let after = SpecimenSnapshot {
            taxon: Some("Polylepis incana".to_owned()),
            collectors: vec!["Ana Paredes".to_owned(), "Luis Vargas".to_owned()],
            ..before.clone()
        };

        let changes = before.diff(&after);

        assert_eq!(
            changes,
            vec![
                FieldChange::new("taxon", "No asignado", "Polylepis incana"),
                FieldChange::new("collectors", "Ana Paredes", "Ana Paredes, Luis Vargas"),
            ]
        );
    }

    #[test]
    fn identical_snapshots_have_no_diff() {
        let snapshot = SpecimenSnapshot {
            status: "activo".to_owned(),
            ..SpecimenSnapshot::default()
        };
        assert!(snapshot.diff(&snapshot.clone()).is_empty());
    }

    #[test]
    fn emptied_multi_reference_renders_placeholder() {
        let before = SpecimenSnapshot {
            determiners: vec!["C. Cerón".to_owned()],
            ..SpecimenSnapshot::default()
        };
        let changes = before.diff(&SpecimenSnapshot::default());
        assert_eq!(
            changes,
            vec![FieldChange::new("determiners", "C. Cerón", "Vacío")]
        );
    }
}
