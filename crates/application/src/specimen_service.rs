//! Specimen cataloguing: sequential codes, tracked edits and collection sites.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use herbarium_core::{AppError, AppResult, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditEntry, AuditTarget, AuditTargetType, CodePrefix, ContributorId,
    ContributorKind, ELEVATION_RANGE, GeoLevel, GeoNodeId, HerbariumId, NO_LOCATION_LABEL,
    Permission, Specimen, SpecimenId, SpecimenSnapshot, SpecimenStatus, TaxonId, next_code,
    provisional_code, specimen_display_name,
};

use crate::{
    AUDIT_LOG_MAX_LIMIT, AuditLogQuery, AuditLogger, AuthorizationService, GeographyRepository,
    SpecimenListQuery, SpecimenRepository, TaxonomyRepository,
};

mod sites;

pub use sites::{CollectionSiteInput, SiteView};

/// Editable fields of a specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenInput {
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
    /// Phenology.
    pub phenology: Option<String>,
    /// Patent year.
    pub patent_year: Option<i32>,
    /// Vicinity recorded on the sheet.
    pub vicinity_id: Option<GeoNodeId>,
    /// Collection date recorded on the sheet.
    pub collection_date: Option<NaiveDate>,
    /// Elevation in metres.
    pub elevation: Option<f64>,
    /// Curation status.
    pub status: SpecimenStatus,
    /// Public catalogue flag.
    pub is_public: bool,
}

impl Default for SpecimenInput {
    fn default() -> Self {
        Self {
            sheet_number: None,
            taxon_id: None,
            author_ids: Vec::new(),
            collector_ids: Vec::new(),
            determiner_ids: Vec::new(),
            index_text: None,
            herbarium_id: None,
            description: None,
            phenology: None,
            patent_year: None,
            vicinity_id: None,
            collection_date: None,
            elevation: None,
            status: SpecimenStatus::default(),
            is_public: true,
        }
    }
}

/// A specimen with its references resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenDetail {
    /// Stored record.
    pub specimen: Specimen,
    /// `"{code} - {scientific name} ({date})"`.
    pub display_name: String,
    /// Scientific name of the taxon.
    pub scientific_name: Option<String>,
    /// Herbarium name.
    pub herbarium: Option<String>,
    /// Author names.
    pub authors: Vec<String>,
    /// Collector names.
    pub collectors: Vec<String>,
    /// Determiner names.
    pub determiners: Vec<String>,
    /// Label of the primary collection site.
    pub primary_location_label: String,
    /// Collection sites, primary first.
    pub sites: Vec<SiteView>,
}

/// Application service for specimens and their collection sites.
#[derive(Clone)]
pub struct SpecimenService {
    specimen_repository: Arc<dyn SpecimenRepository>,
    taxonomy_repository: Arc<dyn TaxonomyRepository>,
    geography_repository: Arc<dyn GeographyRepository>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
    code_prefix: CodePrefix,
}

impl SpecimenService {
    /// Creates a new specimen service issuing codes under `code_prefix`.
    #[must_use]
    pub fn new(
        specimen_repository: Arc<dyn SpecimenRepository>,
        taxonomy_repository: Arc<dyn TaxonomyRepository>,
        geography_repository: Arc<dyn GeographyRepository>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
        code_prefix: CodePrefix,
    ) -> Self {
        Self {
            specimen_repository,
            taxonomy_repository,
            geography_repository,
            authorization_service,
            audit_logger,
            code_prefix,
        }
    }

    /// Code the next saved specimen would receive, marked provisional.
    pub async fn next_code_preview(&self, actor: &UserIdentity) -> AppResult<String> {
        self.require(actor, Permission::CatalogWrite).await?;

        let codes = self.specimen_repository.list_codes().await?;
        provisional_code(&self.code_prefix, codes.iter().map(String::as_str))
    }

    /// Registers a specimen under the next sequential code.
    ///
    /// Two concurrent creations may compute the same code; the store rejects
    /// the second with a conflict.
    pub async fn create_specimen(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        input: SpecimenInput,
    ) -> AppResult<Specimen> {
        self.require(actor, Permission::CatalogWrite).await?;
        self.validate_input(&input).await?;

        let codes = self.specimen_repository.list_codes().await?;
        let code = next_code(&self.code_prefix, codes.iter().map(String::as_str))?;

        let now = Utc::now();
        let mut specimen = Specimen {
            specimen_id: SpecimenId::new(),
            code,
            sheet_number: None,
            taxon_id: None,
            author_ids: Vec::new(),
            collector_ids: Vec::new(),
            determiner_ids: Vec::new(),
            index_text: None,
            herbarium_id: None,
            description: None,
            phenology: None,
            patent_year: None,
            vicinity_id: None,
            collection_date: None,
            elevation: None,
            status: SpecimenStatus::default(),
            is_public: true,
            created_by: Some(actor.subject().to_owned()),
            created_at: now,
            updated_by: Some(actor.subject().to_owned()),
            updated_at: now,
        };
        apply_input(&mut specimen, input);

        let audit = self.audit_logger.draft(
            &specimen_target(specimen.specimen_id),
            AuditAction::Created,
            &format!("specimen {} created", specimen.code),
            None,
            actor,
            request,
        );
        self.specimen_repository
            .insert_specimen(&specimen, &audit)
            .await?;

        Ok(specimen)
    }

    /// Applies an edit, recording one audit entry per changed tracked field.
    pub async fn update_specimen(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        specimen_id: SpecimenId,
        input: SpecimenInput,
    ) -> AppResult<Specimen> {
        self.require(actor, Permission::CatalogWrite).await?;
        self.validate_input(&input).await?;

        let before = self.require_specimen(specimen_id).await?;
        let before_snapshot = self.snapshot(&before).await?;

        let mut after = before.clone();
        apply_input(&mut after, input);
        after.updated_by = Some(actor.subject().to_owned());
        after.updated_at = Utc::now();

        let changes = before_snapshot.diff(&self.snapshot(&after).await?);
        let audit: Vec<AuditEntry> = if changes.is_empty() {
            Vec::new()
        } else {
            self.audit_logger.draft(
                &specimen_target(specimen_id),
                AuditAction::Updated,
                &format!("specimen {} updated", after.code),
                Some(&changes),
                actor,
                request,
            )
        };
        self.specimen_repository
            .update_specimen(&after, &audit)
            .await?;

        Ok(after)
    }

    /// Deletes a specimen with its collection sites and QR codes.
    pub async fn delete_specimen(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        specimen_id: SpecimenId,
    ) -> AppResult<()> {
        self.require(actor, Permission::CatalogWrite).await?;
        let specimen = self.require_specimen(specimen_id).await?;

        let audit = self.audit_logger.draft(
            &specimen_target(specimen_id),
            AuditAction::Deleted,
            &format!("specimen {} deleted", specimen.code),
            None,
            actor,
            request,
        );
        self.specimen_repository
            .delete_specimen(specimen_id, &audit)
            .await
    }

    /// Returns a specimen with resolved names and its sites.
    pub async fn get_specimen(
        &self,
        actor: &UserIdentity,
        specimen_id: SpecimenId,
    ) -> AppResult<SpecimenDetail> {
        self.require(actor, Permission::CatalogRead).await?;

        let specimen = self.require_specimen(specimen_id).await?;
        let snapshot = self.snapshot(&specimen).await?;
        let sites = self.site_views(specimen_id).await?;

        let primary_location_label = sites
            .iter()
            .find(|view| view.site.is_primary)
            .or_else(|| sites.first())
            .map_or_else(
                || NO_LOCATION_LABEL.to_owned(),
                |view| view.location_label.clone(),
            );

        Ok(SpecimenDetail {
            display_name: specimen_display_name(
                specimen.code.as_str(),
                snapshot.taxon.as_deref(),
                specimen.collection_date,
            ),
            scientific_name: snapshot.taxon,
            herbarium: snapshot.herbarium,
            authors: snapshot.authors,
            collectors: snapshot.collectors,
            determiners: snapshot.determiners,
            primary_location_label,
            sites,
            specimen,
        })
    }

    /// Lists specimens ordered by code.
    pub async fn list_specimens(
        &self,
        actor: &UserIdentity,
        query: SpecimenListQuery,
    ) -> AppResult<Vec<Specimen>> {
        self.require(actor, Permission::CatalogRead).await?;

        let query = SpecimenListQuery {
            limit: query.limit.clamp(1, 200),
            ..query
        };
        self.specimen_repository.list_specimens(&query).await
    }

    /// Audit trail of a specimen, newest first.
    pub async fn history(
        &self,
        actor: &UserIdentity,
        specimen_id: SpecimenId,
    ) -> AppResult<Vec<AuditEntry>> {
        self.audit_logger
            .list_entries(
                actor,
                AuditLogQuery {
                    target_type: Some(AuditTargetType::Specimen),
                    target_id: Some(specimen_id.to_string()),
                    limit: AUDIT_LOG_MAX_LIMIT,
                    ..AuditLogQuery::default()
                },
            )
            .await
    }

    async fn require(&self, actor: &UserIdentity, permission: Permission) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, permission)
            .await
    }

    async fn require_specimen(&self, specimen_id: SpecimenId) -> AppResult<Specimen> {
        self.specimen_repository
            .find_specimen(specimen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("specimen '{specimen_id}' does not exist")))
    }

    async fn validate_input(&self, input: &SpecimenInput) -> AppResult<()> {
        if let Some(elevation) = input.elevation
            && !ELEVATION_RANGE.contains(&elevation)
        {
            return Err(AppError::Validation(format!(
                "elevation {elevation} m must be between -500 and 9000"
            )));
        }

        if let Some(taxon_id) = input.taxon_id
            && self.taxonomy_repository.find_taxon(taxon_id).await?.is_none()
        {
            return Err(AppError::Validation(format!("unknown taxon '{taxon_id}'")));
        }

        if let Some(herbarium_id) = input.herbarium_id
            && self
                .taxonomy_repository
                .find_herbarium(herbarium_id)
                .await?
                .is_none()
        {
            return Err(AppError::Validation(format!(
                "unknown herbarium '{herbarium_id}'"
            )));
        }

        for (ids, kind) in [
            (&input.author_ids, ContributorKind::Author),
            (&input.collector_ids, ContributorKind::Collector),
            (&input.determiner_ids, ContributorKind::Determiner),
        ] {
            let found = self.taxonomy_repository.find_contributors(ids).await?;
            if let Some(missing) = ids.iter().find(|id| {
                !found
                    .iter()
                    .any(|contributor| contributor.contributor_id == **id && contributor.kind == kind)
            }) {
                return Err(AppError::Validation(format!(
                    "unknown {} '{missing}'",
                    kind.as_str()
                )));
            }
        }

        if let Some(vicinity_id) = input.vicinity_id {
            self.geography_repository
                .load_hierarchy()
                .await?
                .require_level(vicinity_id, GeoLevel::Vicinity)?;
        }

        Ok(())
    }

    async fn snapshot(&self, specimen: &Specimen) -> AppResult<SpecimenSnapshot> {
        let taxon = match specimen.taxon_id {
            Some(taxon_id) => self
                .taxonomy_repository
                .find_taxon(taxon_id)
                .await?
                .map(|taxon| taxon.scientific_name()),
            None => None,
        };
        let herbarium = match specimen.herbarium_id {
            Some(herbarium_id) => self
                .taxonomy_repository
                .find_herbarium(herbarium_id)
                .await?
                .map(|herbarium| herbarium.name.as_str().to_owned()),
            None => None,
        };

        Ok(SpecimenSnapshot {
            taxon,
            sheet_number: specimen.sheet_number.clone(),
            index_text: specimen.index_text.clone(),
            herbarium,
            authors: self.contributor_names(&specimen.author_ids).await?,
            collectors: self.contributor_names(&specimen.collector_ids).await?,
            determiners: self.contributor_names(&specimen.determiner_ids).await?,
            status: specimen.status.as_str().to_owned(),
            is_public: specimen.is_public,
            description: specimen.description.clone(),
            phenology: specimen.phenology.clone(),
        })
    }

    async fn contributor_names(&self, ids: &[ContributorId]) -> AppResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let contributors = self.taxonomy_repository.find_contributors(ids).await?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                contributors
                    .iter()
                    .find(|contributor| contributor.contributor_id == *id)
                    .map(|contributor| contributor.name.as_str().to_owned())
            })
            .collect())
    }
}

fn specimen_target(specimen_id: SpecimenId) -> AuditTarget {
    AuditTarget::new(AuditTargetType::Specimen, specimen_id)
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn apply_input(specimen: &mut Specimen, input: SpecimenInput) {
    specimen.sheet_number = clean_text(input.sheet_number);
    specimen.taxon_id = input.taxon_id;
    specimen.author_ids = input.author_ids;
    specimen.collector_ids = input.collector_ids;
    specimen.determiner_ids = input.determiner_ids;
    specimen.index_text = clean_text(input.index_text);
    specimen.herbarium_id = input.herbarium_id;
    specimen.description = clean_text(input.description);
    specimen.phenology = clean_text(input.phenology);
    specimen.patent_year = input.patent_year;
    specimen.vicinity_id = input.vicinity_id;
    specimen.collection_date = input.collection_date;
    specimen.elevation = input.elevation;
    specimen.status = input.status;
    specimen.is_public = input.is_public;
}
