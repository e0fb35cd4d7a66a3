use chrono::NaiveDate;
use herbarium_domain::{
    CollectionSite, CoordinateInput, FieldChange, GeoHierarchy, LocationSelection, SiteId,
    normalize, render_flag, render_text, site_reference,
};

use super::*;

/// Editable fields of a collection site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSiteInput {
    /// Herbarium holding material from this site.
    pub herbarium_id: Option<HerbariumId>,
    /// Submitted location selectors, normalized before storage.
    pub location: LocationSelection,
    /// Collector's field number.
    pub collection_number: Option<String>,
    /// Date of collection.
    pub collection_date: Option<NaiveDate>,
    /// Collection method.
    pub collection_method: Option<String>,
    /// Request to make this the primary site.
    pub is_primary: bool,
    /// Habitat description.
    pub habitat: Option<String>,
    /// Field notes.
    pub field_notes: Option<String>,
    /// Raw coordinate fields.
    pub coordinate: CoordinateInput,
}

/// A collection site with its derived display values.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteView {
    /// Stored site.
    pub site: CollectionSite,
    /// Location label, most specific level first.
    pub location_label: String,
    /// Coordinates in text form.
    pub coordinate_text: Option<String>,
    /// Map link for non-zero coordinates.
    pub maps_url: Option<String>,
}

impl SiteView {
    fn new(site: CollectionSite, hierarchy: &GeoHierarchy) -> Self {
        let coordinate_text = site.coordinate.as_ref().map(|coordinate| coordinate.text());
        let maps_url = site
            .coordinate
            .as_ref()
            .and_then(|coordinate| coordinate.maps_url());

        Self {
            location_label: site.location.full_label(hierarchy),
            coordinate_text,
            maps_url,
            site,
        }
    }
}

impl SpecimenService {
    /// Lists the collection sites of a specimen, primary first.
    pub async fn list_sites(
        &self,
        actor: &UserIdentity,
        specimen_id: SpecimenId,
    ) -> AppResult<Vec<SiteView>> {
        self.require(actor, Permission::CatalogRead).await?;
        self.require_specimen(specimen_id).await?;

        self.site_views(specimen_id).await
    }

    /// Adds a collection site. The first site of a specimen becomes primary.
    pub async fn add_site(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        specimen_id: SpecimenId,
        input: CollectionSiteInput,
    ) -> AppResult<CollectionSite> {
        self.require(actor, Permission::CatalogWrite).await?;
        self.require_specimen(specimen_id).await?;

        let hierarchy = self.geography_repository.load_hierarchy().await?;
        let location = normalize(&LocationSelection::default(), &input.location, &hierarchy)?;
        let has_sites = !self
            .specimen_repository
            .list_sites(specimen_id)
            .await?
            .is_empty();

        let site = CollectionSite {
            site_id: SiteId::new(),
            specimen_id,
            herbarium_id: input.herbarium_id,
            location,
            collection_number: clean_text(input.collection_number),
            collection_date: input.collection_date,
            collection_method: clean_text(input.collection_method),
            is_primary: input.is_primary || !has_sites,
            habitat: clean_text(input.habitat),
            field_notes: clean_text(input.field_notes),
            coordinate: input.coordinate.resolve()?,
            created_by: Some(actor.subject().to_owned()),
        };

        let audit = self.audit_logger.draft(
            &specimen_target(specimen_id),
            AuditAction::Updated,
            &format!(
                "added collection site {}",
                site_reference(site.collection_number.as_deref())
            ),
            None,
            actor,
            request,
        );
        self.specimen_repository.save_site(&site, &audit).await?;

        Ok(site)
    }

    /// Edits a collection site.
    ///
    /// The location is normalized against the stored selection, so only the
    /// levels the caller actually changed drive the correction.
    pub async fn update_site(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        site_id: SiteId,
        input: CollectionSiteInput,
    ) -> AppResult<CollectionSite> {
        self.require(actor, Permission::CatalogWrite).await?;
        let before = self.require_site(site_id).await?;

        let hierarchy = self.geography_repository.load_hierarchy().await?;
        let location = normalize(&before.location, &input.location, &hierarchy)?;

        let after = CollectionSite {
            herbarium_id: input.herbarium_id,
            location,
            collection_number: clean_text(input.collection_number),
            collection_date: input.collection_date,
            collection_method: clean_text(input.collection_method),
            is_primary: input.is_primary,
            habitat: clean_text(input.habitat),
            field_notes: clean_text(input.field_notes),
            coordinate: input.coordinate.resolve()?,
            ..before.clone()
        };

        let changes = site_changes(&before, &after, &hierarchy);
        let audit = if changes.is_empty() {
            Vec::new()
        } else {
            self.audit_logger.draft(
                &specimen_target(after.specimen_id),
                AuditAction::Updated,
                &format!(
                    "updated collection site {}",
                    site_reference(after.collection_number.as_deref())
                ),
                Some(&changes),
                actor,
                request,
            )
        };
        self.specimen_repository.save_site(&after, &audit).await?;

        Ok(after)
    }

    /// Removes a collection site.
    pub async fn remove_site(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        site_id: SiteId,
    ) -> AppResult<()> {
        self.require(actor, Permission::CatalogWrite).await?;
        let site = self.require_site(site_id).await?;

        let audit = self.audit_logger.draft(
            &specimen_target(site.specimen_id),
            AuditAction::Updated,
            &format!(
                "removed collection site {}",
                site_reference(site.collection_number.as_deref())
            ),
            None,
            actor,
            request,
        );
        self.specimen_repository.delete_site(site_id, &audit).await
    }

    /// Makes a site primary, demoting the specimen's previous primary site.
    pub async fn set_primary_site(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        site_id: SiteId,
    ) -> AppResult<CollectionSite> {
        self.require(actor, Permission::CatalogWrite).await?;
        let mut site = self.require_site(site_id).await?;
        if site.is_primary {
            return Ok(site);
        }

        site.is_primary = true;
        let audit = self.audit_logger.draft(
            &specimen_target(site.specimen_id),
            AuditAction::Updated,
            &format!(
                "collection site {} set as primary",
                site_reference(site.collection_number.as_deref())
            ),
            None,
            actor,
            request,
        );
        self.specimen_repository.save_site(&site, &audit).await?;

        Ok(site)
    }

    /// Copies the first reference point of the site's vicinity into its
    /// coordinates.
    pub async fn copy_coordinates_from_vicinity(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        site_id: SiteId,
    ) -> AppResult<CollectionSite> {
        self.require(actor, Permission::CatalogWrite).await?;
        let before = self.require_site(site_id).await?;

        let Some(vicinity_id) = before.location.vicinity else {
            return Err(AppError::Validation(
                "select a vicinity before copying its coordinates".to_owned(),
            ));
        };

        let points = self
            .geography_repository
            .list_reference_points(vicinity_id)
            .await?;
        let Some(point) = points.first() else {
            return Err(AppError::Validation(
                "the selected vicinity has no reference points".to_owned(),
            ));
        };

        let after = CollectionSite {
            coordinate: Some(point.coordinate.clone()),
            ..before.clone()
        };
        let hierarchy = self.geography_repository.load_hierarchy().await?;
        let changes = site_changes(&before, &after, &hierarchy);
        let audit = self.audit_logger.draft(
            &specimen_target(after.specimen_id),
            AuditAction::Updated,
            &format!(
                "copied coordinates of '{}' to collection site {}",
                point.name,
                site_reference(after.collection_number.as_deref())
            ),
            Some(&changes),
            actor,
            request,
        );
        self.specimen_repository.save_site(&after, &audit).await?;

        Ok(after)
    }

    pub(super) async fn site_views(&self, specimen_id: SpecimenId) -> AppResult<Vec<SiteView>> {
        let sites = self.specimen_repository.list_sites(specimen_id).await?;
        if sites.is_empty() {
            return Ok(Vec::new());
        }

        let hierarchy = self.geography_repository.load_hierarchy().await?;
        Ok(sites
            .into_iter()
            .map(|site| SiteView::new(site, &hierarchy))
            .collect())
    }

    async fn require_site(&self, site_id: SiteId) -> AppResult<CollectionSite> {
        self.specimen_repository
            .find_site(site_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("collection site '{site_id}' does not exist")))
    }
}

fn rendered_site(site: &CollectionSite, hierarchy: &GeoHierarchy) -> [(&'static str, String); 8] {
    let coordinate = site.coordinate.as_ref();
    [
        ("location", site.location.full_label(hierarchy)),
        (
            "collection_number",
            render_text(site.collection_number.as_deref()),
        ),
        (
            "collection_date",
            site.collection_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
        ),
        (
            "collection_method",
            render_text(site.collection_method.as_deref()),
        ),
        ("habitat", render_text(site.habitat.as_deref())),
        ("field_notes", render_text(site.field_notes.as_deref())),
        (
            "coordinates",
            coordinate.map(|value| value.text()).unwrap_or_default(),
        ),
        ("is_primary", render_flag(site.is_primary)),
    ]
}

fn site_changes(
    before: &CollectionSite,
    after: &CollectionSite,
    hierarchy: &GeoHierarchy,
) -> Vec<FieldChange> {
    rendered_site(before, hierarchy)
        .into_iter()
        .zip(rendered_site(after, hierarchy))
        .filter(|((_, old), (_, new))| old != new)
        .map(|((field, old), (_, new))| FieldChange::new(field, old, new))
        .collect()
}
