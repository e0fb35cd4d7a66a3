//! In-memory fakes shared by the service tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use herbarium_core::{
    AppError, AppResult, NonEmptyString, RequestMetadata, UserIdentity, UserRole,
};
use herbarium_domain::{
    AuditEntry, CodePrefix, CollectionSite, Contributor, ContributorId, ContributorKind, Family,
    FamilyId, GeoHierarchy, GeoLevel, GeoNode, GeoNodeId, Herbarium, HerbariumId, ImageId,
    ImageVariant, NO_LOCATION_LABEL, QrCode, QrCodeId, QrErrorCorrection, QrResolution, QrScan,
    QrStatus, ReferencePoint, SiteId, Specimen, SpecimenCode, SpecimenId, SpecimenStatus, Taxon,
    TaxonId, TaxonImage, UserId,
};

use crate::{
    AuditLogQuery, AuditLogger, AuditRepository, AuthorizationService, CatalogStatistics,
    CatalogSummary, ContributionCounts, FilterOptions, GalleryItem, GeographyRepository,
    ImageBinaries, ImageInspector, ImageRepository, InspectedImage, PasswordHasher,
    PublicCatalogRepository, PublicFilterSelection, PublicSearchPage, PublicSearchQuery,
    PublicSpecimenSummary, QrCodeRepository, QrRenderer, SpecimenListQuery, SpecimenRepository,
    Suggestion, TaxonomyRepository, UserRecord, UserRepository,
};

#[derive(Default)]
struct StoreState {
    audit: Vec<AuditEntry>,
    nodes: Vec<GeoNode>,
    points: Vec<ReferencePoint>,
    families: Vec<Family>,
    taxa: Vec<Taxon>,
    contributors: Vec<Contributor>,
    herbaria: Vec<Herbarium>,
    specimens: Vec<Specimen>,
    sites: Vec<CollectionSite>,
    images: Vec<(TaxonImage, ImageBinaries)>,
    qr_codes: Vec<(QrCode, Vec<u8>)>,
    scans: Vec<QrScan>,
    users: Vec<UserRecord>,
    last_public_search: Option<PublicSearchQuery>,
}

/// Single in-memory store implementing every repository port.
///
/// Each write checks the audit failure switch before touching state, so a
/// failed audit write leaves the store unchanged.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<StoreState>,
    fail_audit_writes: AtomicBool,
}

impl FakeStore {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_audit_writes(&self) {
        self.fail_audit_writes.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit.clone()
    }

    pub(crate) async fn specimens(&self) -> Vec<Specimen> {
        self.state.lock().await.specimens.clone()
    }

    pub(crate) async fn sites(&self) -> Vec<CollectionSite> {
        self.state.lock().await.sites.clone()
    }

    pub(crate) async fn last_public_search(&self) -> Option<PublicSearchQuery> {
        self.state.lock().await.last_public_search.clone()
    }

    pub(crate) async fn seed_user(&self, role: UserRole) -> UserIdentity {
        let mut state = self.state.lock().await;
        let user_id = UserId::new();
        let record = UserRecord {
            user_id,
            email: format!("{}@espoch.edu.ec", user_id.as_uuid().simple()),
            display_name: format!("{} user", role.as_str()),
            password_hash: FakeHasher::hash("Correct-Horse-9"),
            role,
            is_active: true,
            failed_login_count: 0,
            created_at: Utc::now(),
        };
        let identity = record.identity();
        state.users.push(record);
        identity
    }

    pub(crate) async fn seed_node(
        &self,
        level: GeoLevel,
        name: &str,
        parent_id: Option<GeoNodeId>,
    ) -> GeoNodeId {
        let node = GeoNode::new(GeoNodeId::new(), level, name, None, parent_id)
            .unwrap_or_else(|_| unreachable!());
        let node_id = node.node_id();
        self.state.lock().await.nodes.push(node);
        node_id
    }

    pub(crate) async fn seed_taxon(&self, family: &str, genus: &str, species: &str) -> Taxon {
        let family = Family {
            family_id: FamilyId::new(),
            name: NonEmptyString::new(family).unwrap_or_else(|_| unreachable!()),
        };
        let taxon = Taxon::new(TaxonId::new(), genus, species, family.family_id)
            .unwrap_or_else(|_| unreachable!());
        let mut state = self.state.lock().await;
        state.families.push(family);
        state.taxa.push(taxon.clone());
        taxon
    }

    pub(crate) async fn seed_contributor(&self, kind: ContributorKind, name: &str) -> ContributorId {
        let contributor = Contributor {
            contributor_id: ContributorId::new(),
            kind,
            name: NonEmptyString::new(name).unwrap_or_else(|_| unreachable!()),
        };
        let contributor_id = contributor.contributor_id;
        self.state.lock().await.contributors.push(contributor);
        contributor_id
    }

    pub(crate) async fn seed_specimen(&self, taxon_id: Option<TaxonId>, is_public: bool) -> Specimen {
        let mut state = self.state.lock().await;
        let sequence = u32::try_from(state.specimens.len() + 1).unwrap_or(u32::MAX);
        let now = Utc::now();
        let specimen = Specimen {
            specimen_id: SpecimenId::new(),
            code: SpecimenCode::from_sequence(&CodePrefix::default(), sequence)
                .unwrap_or_else(|_| unreachable!()),
            sheet_number: None,
            taxon_id,
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
            is_public,
            created_by: None,
            created_at: now,
            updated_by: None,
            updated_at: now,
        };
        state.specimens.push(specimen.clone());
        specimen
    }

    fn check_audit(&self) -> AppResult<()> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }
        Ok(())
    }
}

/// Authorization service and audit logger wired to `store`.
pub(crate) fn wire(store: &Arc<FakeStore>) -> (AuthorizationService, AuditLogger) {
    let authorization_service = AuthorizationService::new(store.clone());
    let audit_logger = AuditLogger::new(store.clone(), authorization_service.clone());
    (authorization_service, audit_logger)
}

pub(crate) fn request() -> RequestMetadata {
    RequestMetadata {
        ip_address: Some("10.0.0.8".to_owned()),
        user_agent: Some("test-agent".to_owned()),
    }
}

fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_entries(&self, entries: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        self.state.lock().await.audit.extend_from_slice(entries);
        Ok(())
    }

    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<Vec<AuditEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<AuditEntry> = state
            .audit
            .iter()
            .filter(|entry| {
                query
                    .target_type
                    .is_none_or(|target_type| entry.target.target_type == target_type)
                    && query
                        .target_id
                        .as_deref()
                        .is_none_or(|target_id| entry.target.target_id == target_id)
                    && query.action.is_none_or(|action| entry.action == action)
                    && query
                        .actor_subject
                        .as_deref()
                        .is_none_or(|subject| entry.actor_subject == subject)
            })
            .cloned()
            .collect();
        entries.reverse();
        Ok(page(&entries, query.offset, query.limit))
    }
}

#[async_trait]
impl GeographyRepository for FakeStore {
    async fn load_hierarchy(&self) -> AppResult<GeoHierarchy> {
        Ok(GeoHierarchy::new(self.state.lock().await.nodes.clone()))
    }

    async fn list_nodes(
        &self,
        level: GeoLevel,
        parent_id: Option<GeoNodeId>,
    ) -> AppResult<Vec<GeoNode>> {
        Ok(self
            .state
            .lock()
            .await
            .nodes
            .iter()
            .filter(|node| node.level() == level)
            .filter(|node| parent_id.is_none() || node.parent_id() == parent_id)
            .cloned()
            .collect())
    }

    async fn create_node(&self, node: &GeoNode, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state.nodes.iter().any(|existing| {
            existing.level() == node.level()
                && existing.parent_id() == node.parent_id()
                && existing.name() == node.name()
        }) {
            return Err(AppError::Conflict(format!(
                "{} '{}' already exists",
                node.level().as_str(),
                node.name()
            )));
        }
        state.nodes.push(node.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn create_reference_point(
        &self,
        point: &ReferencePoint,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state.points.push(point.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn list_reference_points(
        &self,
        vicinity_id: GeoNodeId,
    ) -> AppResult<Vec<ReferencePoint>> {
        Ok(self
            .state
            .lock()
            .await
            .points
            .iter()
            .filter(|point| point.vicinity_id == vicinity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaxonomyRepository for FakeStore {
    async fn create_family(&self, family: &Family, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state
            .families
            .iter()
            .any(|existing| existing.name.as_str() == family.name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "family '{}' already exists",
                family.name
            )));
        }
        state.families.push(family.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn list_families(&self) -> AppResult<Vec<Family>> {
        Ok(self.state.lock().await.families.clone())
    }

    async fn find_family(&self, family_id: FamilyId) -> AppResult<Option<Family>> {
        Ok(self
            .state
            .lock()
            .await
            .families
            .iter()
            .find(|family| family.family_id == family_id)
            .cloned())
    }

    async fn create_taxon(&self, taxon: &Taxon, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state.taxa.iter().any(|existing| {
            existing.genus() == taxon.genus() && existing.species() == taxon.species()
        }) {
            return Err(AppError::Conflict(format!(
                "taxon '{}' already exists",
                taxon.scientific_name()
            )));
        }
        state.taxa.push(taxon.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn list_taxa(&self, family_id: Option<FamilyId>) -> AppResult<Vec<Taxon>> {
        Ok(self
            .state
            .lock()
            .await
            .taxa
            .iter()
            .filter(|taxon| family_id.is_none_or(|family_id| taxon.family_id() == family_id))
            .cloned()
            .collect())
    }

    async fn find_taxon(&self, taxon_id: TaxonId) -> AppResult<Option<Taxon>> {
        Ok(self
            .state
            .lock()
            .await
            .taxa
            .iter()
            .find(|taxon| taxon.taxon_id() == taxon_id)
            .cloned())
    }

    async fn create_contributor(
        &self,
        contributor: &Contributor,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state.contributors.push(contributor.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn list_contributors(
        &self,
        kind: Option<ContributorKind>,
    ) -> AppResult<Vec<Contributor>> {
        Ok(self
            .state
            .lock()
            .await
            .contributors
            .iter()
            .filter(|contributor| kind.is_none_or(|kind| contributor.kind == kind))
            .cloned()
            .collect())
    }

    async fn find_contributors(&self, ids: &[ContributorId]) -> AppResult<Vec<Contributor>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| {
                state
                    .contributors
                    .iter()
                    .find(|contributor| contributor.contributor_id == *id)
                    .cloned()
            })
            .collect())
    }

    async fn create_herbarium(
        &self,
        herbarium: &Herbarium,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state.herbaria.push(herbarium.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn list_herbaria(&self) -> AppResult<Vec<Herbarium>> {
        Ok(self.state.lock().await.herbaria.clone())
    }

    async fn find_herbarium(&self, herbarium_id: HerbariumId) -> AppResult<Option<Herbarium>> {
        Ok(self
            .state
            .lock()
            .await
            .herbaria
            .iter()
            .find(|herbarium| herbarium.herbarium_id == herbarium_id)
            .cloned())
    }
}

#[async_trait]
impl SpecimenRepository for FakeStore {
    async fn list_codes(&self) -> AppResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .await
            .specimens
            .iter()
            .map(|specimen| specimen.code.as_str().to_owned())
            .collect())
    }

    async fn insert_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state
            .specimens
            .iter()
            .any(|existing| existing.code == specimen.code)
        {
            return Err(AppError::Conflict(format!(
                "specimen code '{}' is already taken",
                specimen.code
            )));
        }
        state.specimens.push(specimen.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn update_specimen(&self, specimen: &Specimen, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        let Some(existing) = state
            .specimens
            .iter_mut()
            .find(|existing| existing.specimen_id == specimen.specimen_id)
        else {
            return Err(AppError::NotFound(format!(
                "specimen '{}' does not exist",
                specimen.specimen_id
            )));
        };
        *existing = specimen.clone();
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn delete_specimen(
        &self,
        specimen_id: SpecimenId,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state
            .specimens
            .retain(|specimen| specimen.specimen_id != specimen_id);
        state.sites.retain(|site| site.specimen_id != specimen_id);
        state.qr_codes.retain(|(qr, _)| qr.specimen_id != specimen_id);
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn find_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<Specimen>> {
        Ok(self
            .state
            .lock()
            .await
            .specimens
            .iter()
            .find(|specimen| specimen.specimen_id == specimen_id)
            .cloned())
    }

    async fn list_specimens(&self, query: &SpecimenListQuery) -> AppResult<Vec<Specimen>> {
        let state = self.state.lock().await;
        let mut specimens: Vec<Specimen> = state
            .specimens
            .iter()
            .filter(|specimen| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|search| specimen.code.as_str().contains(search))
                    && query.status.is_none_or(|status| specimen.status == status)
                    && query
                        .taxon_id
                        .is_none_or(|taxon_id| specimen.taxon_id == Some(taxon_id))
            })
            .cloned()
            .collect();
        specimens.sort_by(|left, right| left.code.as_str().cmp(right.code.as_str()));
        Ok(page(&specimens, query.offset, query.limit))
    }

    async fn list_sites(&self, specimen_id: SpecimenId) -> AppResult<Vec<CollectionSite>> {
        let mut sites: Vec<CollectionSite> = self
            .state
            .lock()
            .await
            .sites
            .iter()
            .filter(|site| site.specimen_id == specimen_id)
            .cloned()
            .collect();
        sites.sort_by_key(|site| !site.is_primary);
        Ok(sites)
    }

    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<CollectionSite>> {
        Ok(self
            .state
            .lock()
            .await
            .sites
            .iter()
            .find(|site| site.site_id == site_id)
            .cloned())
    }

    async fn save_site(&self, site: &CollectionSite, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if site.is_primary {
            for other in state
                .sites
                .iter_mut()
                .filter(|other| other.specimen_id == site.specimen_id)
            {
                other.is_primary = false;
            }
        }
        match state
            .sites
            .iter()
            .position(|existing| existing.site_id == site.site_id)
        {
            Some(index) => state.sites[index] = site.clone(),
            None => state.sites.push(site.clone()),
        }
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn delete_site(&self, site_id: SiteId, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state.sites.retain(|site| site.site_id != site_id);
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn count_contributions(&self, subject: &str) -> AppResult<ContributionCounts> {
        let state = self.state.lock().await;
        let specimens_created = state
            .specimens
            .iter()
            .filter(|specimen| specimen.created_by.as_deref() == Some(subject))
            .count();
        let sites_added = state
            .sites
            .iter()
            .filter(|site| site.created_by.as_deref() == Some(subject))
            .count();
        Ok(ContributionCounts {
            specimens_created: i64::try_from(specimens_created).unwrap_or_default(),
            sites_added: i64::try_from(sites_added).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ImageRepository for FakeStore {
    async fn insert_image(
        &self,
        image: &TaxonImage,
        binaries: &ImageBinaries,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state.images.iter().any(|(existing, _)| {
            existing.taxon_id == image.taxon_id
                && existing.file_hash == image.file_hash
                && existing.deleted_at.is_none()
        }) {
            return Err(AppError::Conflict(
                "this image is already attached to the taxon".to_owned(),
            ));
        }
        if image.is_primary {
            for (other, _) in state
                .images
                .iter_mut()
                .filter(|(other, _)| other.taxon_id == image.taxon_id)
            {
                other.is_primary = false;
            }
        }
        state.images.push((image.clone(), binaries.clone()));
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn update_image(&self, image: &TaxonImage, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if image.is_primary {
            for (other, _) in state
                .images
                .iter_mut()
                .filter(|(other, _)| other.taxon_id == image.taxon_id)
            {
                other.is_primary = false;
            }
        }
        if let Some((existing, _)) = state
            .images
            .iter_mut()
            .find(|(existing, _)| existing.image_id == image.image_id)
        {
            *existing = image.clone();
        }
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn find_image(&self, image_id: ImageId) -> AppResult<Option<TaxonImage>> {
        Ok(self
            .state
            .lock()
            .await
            .images
            .iter()
            .find(|(image, _)| image.image_id == image_id)
            .map(|(image, _)| image.clone()))
    }

    async fn list_images(&self, taxon_id: TaxonId) -> AppResult<Vec<TaxonImage>> {
        let mut images: Vec<TaxonImage> = self
            .state
            .lock()
            .await
            .images
            .iter()
            .filter(|(image, _)| image.taxon_id == taxon_id && image.deleted_at.is_none())
            .map(|(image, _)| image.clone())
            .collect();
        images.sort_by_key(|image| (!image.is_primary, image.display_order));
        Ok(images)
    }

    async fn find_by_hash(
        &self,
        taxon_id: TaxonId,
        file_hash: &str,
    ) -> AppResult<Option<TaxonImage>> {
        Ok(self
            .state
            .lock()
            .await
            .images
            .iter()
            .find(|(image, _)| {
                image.taxon_id == taxon_id
                    && image.file_hash == file_hash
                    && image.deleted_at.is_none()
            })
            .map(|(image, _)| image.clone()))
    }

    async fn load_content(
        &self,
        image_id: ImageId,
        variant: ImageVariant,
    ) -> AppResult<Option<Vec<u8>>> {
        Ok(self
            .state
            .lock()
            .await
            .images
            .iter()
            .find(|(image, _)| image.image_id == image_id && image.deleted_at.is_none())
            .map(|(_, binaries)| match variant {
                ImageVariant::Original => binaries.original.clone(),
                ImageVariant::Small => binaries.small.clone(),
                ImageVariant::Medium => binaries.medium.clone(),
            }))
    }

    async fn count_uploaded_by(&self, subject: &str) -> AppResult<i64> {
        let count = self
            .state
            .lock()
            .await
            .images
            .iter()
            .filter(|(image, _)| image.uploaded_by.as_deref() == Some(subject))
            .count();
        Ok(i64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl QrCodeRepository for FakeStore {
    async fn insert_qr(&self, qr: &QrCode, image: &[u8], audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        state.qr_codes.push((qr.clone(), image.to_vec()));
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn update_qr(&self, qr: &QrCode, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if qr.status == QrStatus::Active
            && state.qr_codes.iter().any(|(other, _)| {
                other.specimen_id == qr.specimen_id
                    && other.qr_id != qr.qr_id
                    && other.status == QrStatus::Active
            })
        {
            return Err(AppError::Conflict(
                "specimen already has an active QR code".to_owned(),
            ));
        }
        if let Some((existing, _)) = state
            .qr_codes
            .iter_mut()
            .find(|(existing, _)| existing.qr_id == qr.qr_id)
        {
            *existing = qr.clone();
        }
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn replace_qr(
        &self,
        superseded: &QrCode,
        replacement: &QrCode,
        image: &[u8],
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if let Some((existing, _)) = state
            .qr_codes
            .iter_mut()
            .find(|(existing, _)| existing.qr_id == superseded.qr_id)
        {
            *existing = superseded.clone();
        }
        state.qr_codes.push((replacement.clone(), image.to_vec()));
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn find_qr(&self, qr_id: QrCodeId) -> AppResult<Option<QrCode>> {
        Ok(self
            .state
            .lock()
            .await
            .qr_codes
            .iter()
            .find(|(qr, _)| qr.qr_id == qr_id)
            .map(|(qr, _)| qr.clone()))
    }

    async fn find_active_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<QrCode>> {
        Ok(self
            .state
            .lock()
            .await
            .qr_codes
            .iter()
            .find(|(qr, _)| qr.specimen_id == specimen_id && qr.status == QrStatus::Active)
            .map(|(qr, _)| qr.clone()))
    }

    async fn list_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Vec<QrCode>> {
        let mut codes: Vec<QrCode> = self
            .state
            .lock()
            .await
            .qr_codes
            .iter()
            .filter(|(qr, _)| qr.specimen_id == specimen_id)
            .map(|(qr, _)| qr.clone())
            .collect();
        codes.sort_by_key(|qr| std::cmp::Reverse(qr.version));
        Ok(codes)
    }

    async fn load_image(&self, qr_id: QrCodeId) -> AppResult<Option<Vec<u8>>> {
        Ok(self
            .state
            .lock()
            .await
            .qr_codes
            .iter()
            .find(|(qr, _)| qr.qr_id == qr_id)
            .map(|(_, image)| image.clone()))
    }

    async fn record_download(
        &self,
        qr_id: QrCodeId,
        downloaded_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some((qr, _)) = state.qr_codes.iter_mut().find(|(qr, _)| qr.qr_id == qr_id) {
            qr.download_count += 1;
            qr.last_downloaded_at = Some(downloaded_at);
        }
        Ok(())
    }

    async fn record_scan(&self, scan: &QrScan) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some((qr, _)) = state
            .qr_codes
            .iter_mut()
            .find(|(qr, _)| qr.qr_id == scan.qr_id)
        {
            qr.scan_count += 1;
            qr.last_scanned_at = Some(scan.scanned_at);
        }
        state.scans.push(scan.clone());
        Ok(())
    }

    async fn list_scans(&self, qr_id: QrCodeId, limit: usize) -> AppResult<Vec<QrScan>> {
        let state = self.state.lock().await;
        Ok(state
            .scans
            .iter()
            .rev()
            .filter(|scan| scan.qr_id == qr_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn count_users(&self) -> AppResult<i64> {
        Ok(i64::try_from(self.state.lock().await.users.len()).unwrap_or_default())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.state.lock().await.users.clone())
    }

    async fn create_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict(format!(
                "user '{}' already exists",
                user.email
            )));
        }
        state.users.push(user.clone());
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn update_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()> {
        self.check_audit()?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .users
            .iter_mut()
            .find(|existing| existing.user_id == user.user_id)
        {
            *existing = user.clone();
        }
        state.audit.extend_from_slice(audit);
        Ok(())
    }

    async fn count_active_with_role(&self, role: UserRole) -> AppResult<i64> {
        let count = self
            .state
            .lock()
            .await
            .users
            .iter()
            .filter(|user| user.is_active && user.role == role)
            .count();
        Ok(i64::try_from(count).unwrap_or_default())
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        lock_threshold: i32,
        lock_audit: &[AuditEntry],
    ) -> AppResult<i32> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|user| user.user_id == user_id) else {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        };
        let failures = user.failed_login_count + 1;
        let locks = failures == lock_threshold;
        if locks {
            self.check_audit()?;
        }
        user.failed_login_count = failures;
        if locks {
            state.audit.extend_from_slice(lock_audit);
        }
        Ok(failures)
    }

    async fn reset_failed_logins(&self, user_id: UserId, audit: &[AuditEntry]) -> AppResult<()> {
        if !audit.is_empty() {
            self.check_audit()?;
        }
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|user| user.user_id == user_id) {
            user.failed_login_count = 0;
        }
        state.audit.extend_from_slice(audit);
        Ok(())
    }
}

#[async_trait]
impl PublicCatalogRepository for FakeStore {
    async fn summary(&self) -> AppResult<CatalogSummary> {
        let state = self.state.lock().await;
        let specimens = state
            .specimens
            .iter()
            .filter(|specimen| specimen.is_publicly_visible())
            .count();
        Ok(CatalogSummary {
            specimens: i64::try_from(specimens).unwrap_or_default(),
            ..CatalogSummary::default()
        })
    }

    async fn statistics(&self, _top: usize) -> AppResult<CatalogStatistics> {
        Ok(CatalogStatistics::default())
    }

    async fn search(&self, query: &PublicSearchQuery) -> AppResult<PublicSearchPage> {
        let mut state = self.state.lock().await;
        state.last_public_search = Some(query.clone());
        let matching: Vec<PublicSpecimenSummary> = state
            .specimens
            .iter()
            .filter(|specimen| specimen.is_publicly_visible())
            .filter(|specimen| {
                query
                    .text
                    .as_deref()
                    .is_none_or(|text| specimen.code.as_str().contains(text))
            })
            .map(|specimen| PublicSpecimenSummary {
                specimen_id: specimen.specimen_id,
                code: specimen.code.as_str().to_owned(),
                taxon_id: specimen.taxon_id,
                scientific_name: None,
                family: None,
                collection_date: specimen.collection_date,
                location_label: NO_LOCATION_LABEL.to_owned(),
                primary_image_id: None,
            })
            .collect();
        Ok(PublicSearchPage {
            total: i64::try_from(matching.len()).unwrap_or_default(),
            items: page(&matching, query.offset, query.limit),
        })
    }

    async fn filter_options(
        &self,
        _selection: &PublicFilterSelection,
    ) -> AppResult<FilterOptions> {
        Ok(FilterOptions::default())
    }

    async fn gallery(&self, _limit: usize, _offset: usize) -> AppResult<Vec<GalleryItem>> {
        Ok(Vec::new())
    }

    async fn suggestions(&self, text: &str, limit: usize) -> AppResult<Vec<Suggestion>> {
        let state = self.state.lock().await;
        Ok(state
            .specimens
            .iter()
            .filter(|specimen| {
                specimen.is_publicly_visible() && specimen.code.as_str().contains(text)
            })
            .take(limit)
            .map(|specimen| Suggestion {
                specimen_id: specimen.specimen_id,
                label: specimen.code.as_str().to_owned(),
            })
            .collect())
    }

    async fn related_specimens(
        &self,
        _specimen_id: SpecimenId,
        _limit: usize,
    ) -> AppResult<Vec<PublicSpecimenSummary>> {
        Ok(Vec::new())
    }
}

/// Reversible stand-in for a password hash.
pub(crate) struct FakeHasher;

impl FakeHasher {
    pub(crate) fn hash(password: &str) -> String {
        format!("hashed:{password}")
    }
}

impl PasswordHasher for FakeHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(Self::hash(password))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(Self::hash(password) == hash)
    }
}

/// Accepts any bytes not starting with `bad`.
pub(crate) struct FakeInspector;

impl ImageInspector for FakeInspector {
    fn inspect(&self, bytes: &[u8]) -> AppResult<InspectedImage> {
        if bytes.is_empty() || bytes.starts_with(b"bad") {
            return Err(AppError::Validation("unsupported image format".to_owned()));
        }

        Ok(InspectedImage {
            width: 640,
            height: 480,
            mime_type: "image/png".to_owned(),
            extension: "png".to_owned(),
            thumbnail_small: b"small".to_vec(),
            thumbnail_medium: b"medium".to_vec(),
            camera: Some("Canon EOS 80D".to_owned()),
            captured_at: None,
        })
    }
}

/// Encodes the payload and options as the "image".
pub(crate) struct FakeRenderer;

impl QrRenderer for FakeRenderer {
    fn render(
        &self,
        payload: &str,
        error_correction: QrErrorCorrection,
        resolution: QrResolution,
        border: i32,
    ) -> AppResult<Vec<u8>> {
        Ok(format!(
            "png:{payload}:{}:{}:{border}",
            error_correction.as_str(),
            resolution.pixels()
        )
        .into_bytes())
    }
}
