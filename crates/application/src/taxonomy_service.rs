use std::sync::Arc;

use herbarium_core::{AppError, AppResult, NonEmptyString, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditTarget, AuditTargetType, Contributor, ContributorId, ContributorKind,
    Family, FamilyId, Herbarium, HerbariumId, Permission, Taxon, TaxonId,
};

use crate::{AuditLogger, AuthorizationService, TaxonomyRepository};

/// Application service for families, taxa, contributors and herbaria.
#[derive(Clone)]
pub struct TaxonomyService {
    repository: Arc<dyn TaxonomyRepository>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
}

impl TaxonomyService {
    /// Creates a new taxonomy service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn TaxonomyRepository>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            audit_logger,
        }
    }

    /// Creates a family with a unique name.
    pub async fn create_family(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        name: &str,
    ) -> AppResult<Family> {
        self.require_write(actor).await?;

        let family = Family {
            family_id: FamilyId::new(),
            name: NonEmptyString::for_field("family name", name)?,
        };
        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::Family, family.family_id),
            AuditAction::Created,
            &format!("family '{}' created", family.name),
            None,
            actor,
            request,
        );
        self.repository.create_family(&family, &audit).await?;

        Ok(family)
    }

    /// Lists families.
    pub async fn list_families(&self, actor: &UserIdentity) -> AppResult<Vec<Family>> {
        self.require_read(actor).await?;
        self.repository.list_families().await
    }

    /// Creates a taxon within an existing family.
    pub async fn create_taxon(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        genus: &str,
        species: &str,
        family_id: FamilyId,
    ) -> AppResult<Taxon> {
        self.require_write(actor).await?;

        let family = self
            .repository
            .find_family(family_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("unknown family '{family_id}'")))?;

        let taxon = Taxon::new(TaxonId::new(), genus, species, family.family_id)?;
        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::Taxon, taxon.taxon_id()),
            AuditAction::Created,
            &format!(
                "taxon '{}' created in family '{}'",
                taxon.scientific_name(),
                family.name
            ),
            None,
            actor,
            request,
        );
        self.repository.create_taxon(&taxon, &audit).await?;

        Ok(taxon)
    }

    /// Lists taxa, optionally within one family.
    pub async fn list_taxa(
        &self,
        actor: &UserIdentity,
        family_id: Option<FamilyId>,
    ) -> AppResult<Vec<Taxon>> {
        self.require_read(actor).await?;
        self.repository.list_taxa(family_id).await
    }

    /// Finds a taxon.
    pub async fn get_taxon(&self, actor: &UserIdentity, taxon_id: TaxonId) -> AppResult<Taxon> {
        self.require_read(actor).await?;
        self.repository
            .find_taxon(taxon_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("taxon '{taxon_id}' does not exist")))
    }

    /// Creates an author, collector or determiner.
    pub async fn create_contributor(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        kind: ContributorKind,
        name: &str,
    ) -> AppResult<Contributor> {
        self.require_write(actor).await?;

        let contributor = Contributor {
            contributor_id: ContributorId::new(),
            kind,
            name: NonEmptyString::for_field("name", name)?,
        };
        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::Contributor, contributor.contributor_id),
            AuditAction::Created,
            &format!("{} '{}' created", kind.as_str(), contributor.name),
            None,
            actor,
            request,
        );
        self.repository
            .create_contributor(&contributor, &audit)
            .await?;

        Ok(contributor)
    }

    /// Lists contributors, optionally of one kind.
    pub async fn list_contributors(
        &self,
        actor: &UserIdentity,
        kind: Option<ContributorKind>,
    ) -> AppResult<Vec<Contributor>> {
        self.require_read(actor).await?;
        self.repository.list_contributors(kind).await
    }

    /// Creates a herbarium.
    pub async fn create_herbarium(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        name: &str,
        acronym: Option<String>,
    ) -> AppResult<Herbarium> {
        self.require_write(actor).await?;

        let herbarium = Herbarium {
            herbarium_id: HerbariumId::new(),
            name: NonEmptyString::for_field("herbarium name", name)?,
            acronym: acronym
                .map(|value| value.trim().to_uppercase())
                .filter(|value| !value.is_empty()),
        };
        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::Herbarium, herbarium.herbarium_id),
            AuditAction::Created,
            &format!("herbarium '{}' created", herbarium.name),
            None,
            actor,
            request,
        );
        self.repository.create_herbarium(&herbarium, &audit).await?;

        Ok(herbarium)
    }

    /// Lists herbaria.
    pub async fn list_herbaria(&self, actor: &UserIdentity) -> AppResult<Vec<Herbarium>> {
        self.require_read(actor).await?;
        self.repository.list_herbaria().await
    }

    async fn require_read(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogRead)
            .await
    }

    async fn require_write(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await
    }
}
