use async_trait::async_trait;
use herbarium_core::AppResult;
use herbarium_domain::{
    AuditEntry, CollectionSite, SiteId, Specimen, SpecimenId, SpecimenStatus, TaxonId,
};

/// Filters for the curator specimen listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecimenListQuery {
    /// Matches code, sheet number or index text.
    pub search: Option<String>,
    /// Restricts to one status.
    pub status: Option<SpecimenStatus>,
    /// Restricts to one taxon.
    pub taxon_id: Option<TaxonId>,
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
}

impl Default for SpecimenListQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            taxon_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Records created by one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContributionCounts {
    /// Specimens created.
    pub specimens_created: i64,
    /// Collection sites added.
    pub sites_added: i64,
}

/// Repository port for specimens and their collection sites.
///
/// Every write persists the change and the given audit entries atomically:
/// when the audit rows cannot be stored the change is rolled back.
#[async_trait]
pub trait SpecimenRepository: Send + Sync {
    /// Lists every stored specimen code.
    async fn list_codes(&self) -> AppResult<Vec<String>>;

    /// Inserts a specimen. A duplicate code fails with a conflict and is
    /// never overwritten.
    async fn insert_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()>;

    /// Replaces a stored specimen.
    async fn update_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()>;

    /// Deletes a specimen with its collection sites and QR codes.
    async fn delete_specimen(&self, specimen_id: SpecimenId, audit: &[AuditEntry])
    -> AppResult<()>;

    /// Finds a specimen.
    async fn find_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<Specimen>>;

    /// Lists specimens ordered by code.
    async fn list_specimens(&self, query: &SpecimenListQuery) -> AppResult<Vec<Specimen>>;

    /// Lists the sites of a specimen, primary first.
    async fn list_sites(&self, specimen_id: SpecimenId) -> AppResult<Vec<CollectionSite>>;

    /// Finds a site.
    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<CollectionSite>>;

    /// Inserts or replaces a site. When the site is primary every other site
    /// of the same specimen is demoted in the same transaction.
    async fn save_site(&self, site: &CollectionSite, audit: &[AuditEntry]) -> AppResult<()>;

    /// Deletes a site.
    async fn delete_site(&self, site_id: SiteId, audit: &[AuditEntry]) -> AppResult<()>;

    /// Counts specimens and sites created by a subject.
    async fn count_contributions(&self, subject: &str) -> AppResult<ContributionCounts>;
}
