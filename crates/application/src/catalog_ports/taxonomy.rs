use async_trait::async_trait;
use herbarium_core::AppResult;
use herbarium_domain::{
    AuditEntry, Contributor, ContributorId, ContributorKind, Family, FamilyId, Herbarium,
    HerbariumId, Taxon, TaxonId,
};

/// Repository port for families, taxa, contributors and herbaria.
///
/// Every create method persists the record together with its audit entries
/// and fails with a conflict when the unique name is taken.
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// Persists a family.
    async fn create_family(&self, family: &Family, audit: &[AuditEntry]) -> AppResult<()>;

    /// Lists families ordered by name.
    async fn list_families(&self) -> AppResult<Vec<Family>>;

    /// Finds a family.
    async fn find_family(&self, family_id: FamilyId) -> AppResult<Option<Family>>;

    /// Persists a taxon.
    async fn create_taxon(&self, taxon: &Taxon, audit: &[AuditEntry]) -> AppResult<()>;

    /// Lists taxa, optionally within one family, ordered by genus and species.
    async fn list_taxa(&self, family_id: Option<FamilyId>) -> AppResult<Vec<Taxon>>;

    /// Finds a taxon.
    async fn find_taxon(&self, taxon_id: TaxonId) -> AppResult<Option<Taxon>>;

    /// Persists a contributor.
    async fn create_contributor(
        &self,
        contributor: &Contributor,
        audit: &[AuditEntry],
    ) -> AppResult<()>;

    /// Lists contributors, optionally of one kind, ordered by name.
    async fn list_contributors(&self, kind: Option<ContributorKind>)
    -> AppResult<Vec<Contributor>>;

    /// Finds the contributors with the given ids; unknown ids are skipped.
    async fn find_contributors(&self, ids: &[ContributorId]) -> AppResult<Vec<Contributor>>;

    /// Persists a herbarium.
    async fn create_herbarium(&self, herbarium: &Herbarium, audit: &[AuditEntry])
    -> AppResult<()>;

    /// Lists herbaria ordered by name.
    async fn list_herbaria(&self) -> AppResult<Vec<Herbarium>>;

    /// Finds a herbarium.
    async fn find_herbarium(&self, herbarium_id: HerbariumId) -> AppResult<Option<Herbarium>>;
}
