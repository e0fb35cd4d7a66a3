use chrono::{NaiveDate, Utc};
use herbarium_application::{
    ImageBinaries, ImageRepository, PublicCatalogRepository, PublicFilterSelection,
    PublicSearchQuery, SpecimenRepository, TaxonomyRepository,
};
use herbarium_core::NonEmptyString;
use herbarium_domain::{
    CollectionSite, Coordinate, Family, FamilyId, ImageId, LocationSelection, SiteId, Specimen,
    SpecimenStatus, Taxon, TaxonId, TaxonImage,
};
use sqlx::PgPool;

use super::PostgresPublicCatalogRepository;
use crate::test_support::{insert_chain, specimen, test_pool, unique, unique_code};
use crate::{PostgresImageRepository, PostgresSpecimenRepository, PostgresTaxonomyRepository};

/// One family with a single taxon, so results can be scoped by family.
struct Fixture {
    family_id: FamilyId,
    taxon_id: TaxonId,
    genus: String,
    location: LocationSelection,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let taxonomy = PostgresTaxonomyRepository::new(pool.clone());
    let family = Family {
        family_id: FamilyId::new(),
        name: NonEmptyString::new(unique("Gentianaceae")).unwrap_or_else(|_| unreachable!()),
    };
    assert!(taxonomy.create_family(&family, &[]).await.is_ok());

    // Genera hold letters only, so the unique suffix is spelled with a..p.
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(10)
        .filter_map(|digit| digit.to_digit(16))
        .filter_map(|value| char::from_u32('a' as u32 + value))
        .collect();
    let genus = format!("Gentianella{suffix}");
    let taxon = Taxon::new(TaxonId::new(), genus.as_str(), "cerastioides", family.family_id)
        .unwrap_or_else(|_| unreachable!());
    assert!(taxonomy.create_taxon(&taxon, &[]).await.is_ok());

    Fixture {
        family_id: family.family_id,
        taxon_id: taxon.taxon_id(),
        genus,
        location: insert_chain(pool).await,
    }
}

async fn insert_specimen(
    pool: &PgPool,
    fixture: &Fixture,
    configure: impl FnOnce(&mut Specimen),
    coordinate: Option<(f64, f64)>,
) -> Specimen {
    let specimens = PostgresSpecimenRepository::new(pool.clone());
    let mut created = specimen(unique_code(), "tester");
    created.taxon_id = Some(fixture.taxon_id);
    created.status = SpecimenStatus::Activo;
    created.collection_date = NaiveDate::from_ymd_opt(2019, 3, 14);
    configure(&mut created);
    assert!(specimens.insert_specimen(&created, &[]).await.is_ok());

    let site = CollectionSite {
        site_id: SiteId::new(),
        specimen_id: created.specimen_id,
        herbarium_id: None,
        location: fixture.location,
        collection_number: None,
        collection_date: created.collection_date,
        collection_method: None,
        is_primary: true,
        habitat: None,
        field_notes: None,
        coordinate: coordinate.map(|(latitude, longitude)| {
            Coordinate::new(latitude, longitude, None).unwrap_or_else(|_| unreachable!())
        }),
        created_by: Some("tester".to_owned()),
    };
    assert!(specimens.save_site(&site, &[]).await.is_ok());

    created
}

fn scoped(fixture: &Fixture) -> PublicSearchQuery {
    PublicSearchQuery {
        family_id: Some(fixture.family_id),
        ..PublicSearchQuery::default()
    }
}

#[tokio::test]
async fn hidden_and_removed_specimens_never_surface() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let fixture = fixture(&pool).await;
    let visible = insert_specimen(&pool, &fixture, |_| {}, Some((-1.2, -78.5))).await;
    insert_specimen(&pool, &fixture, |s| s.is_public = false, None).await;
    insert_specimen(&pool, &fixture, |s| s.status = SpecimenStatus::Eliminado, None).await;

    let catalogue = PostgresPublicCatalogRepository::new(pool);
    let page = catalogue
        .search(&scoped(&fixture))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(page.total, 1);
    assert_eq!(page.items.len(), 1);
    let summary = &page.items[0];
    assert_eq!(summary.specimen_id, visible.specimen_id);
    assert_eq!(
        summary.scientific_name.as_deref(),
        Some(format!("{} cerastioides", fixture.genus).as_str())
    );
    assert!(summary.location_label.contains("canton"));

    let related = catalogue
        .related_specimens(visible.specimen_id, 10)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(related.is_empty());
}

#[tokio::test]
async fn search_filters_combine() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let fixture = fixture(&pool).await;
    let older = insert_specimen(&pool, &fixture, |_| {}, None).await;
    let newer = insert_specimen(
        &pool,
        &fixture,
        |s| s.collection_date = NaiveDate::from_ymd_opt(2023, 8, 2),
        None,
    )
    .await;

    let catalogue = PostgresPublicCatalogRepository::new(pool);

    let recent = catalogue
        .search(&PublicSearchQuery {
            year_from: Some(2020),
            province_id: fixture.location.province,
            genus: Some(fixture.genus.to_lowercase()),
            ..scoped(&fixture)
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        recent.items.iter().map(|item| item.specimen_id).collect::<Vec<_>>(),
        vec![newer.specimen_id]
    );

    let by_code = catalogue
        .search(&PublicSearchQuery {
            text: Some(older.code.as_str().to_owned()),
            ..PublicSearchQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(by_code.total, 1);

    let wildcard = catalogue
        .search(&PublicSearchQuery {
            text: Some("%".to_owned()),
            ..scoped(&fixture)
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(wildcard.total, 0);

    let with_images = catalogue
        .search(&PublicSearchQuery {
            with_images: true,
            ..scoped(&fixture)
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(with_images.total, 0);
}

#[tokio::test]
async fn gallery_and_cover_follow_the_primary_image() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let fixture = fixture(&pool).await;
    let created = insert_specimen(&pool, &fixture, |_| {}, None).await;

    let image = TaxonImage {
        image_id: ImageId::new(),
        taxon_id: fixture.taxon_id,
        original_filename: "hoja.png".to_owned(),
        stored_filename: "hoja.png".to_owned(),
        file_size: 4,
        width: 1,
        height: 1,
        mime_type: "image/png".to_owned(),
        file_hash: uuid::Uuid::new_v4().simple().to_string(),
        camera: None,
        captured_at: None,
        description: None,
        is_primary: true,
        display_order: 0,
        uploaded_by: Some("tester".to_owned()),
        uploaded_at: Utc::now(),
        deleted_at: None,
    };
    let binaries = ImageBinaries {
        original: vec![1, 2, 3, 4],
        small: vec![1],
        medium: vec![1, 2],
    };
    let images = PostgresImageRepository::new(pool.clone());
    assert!(images.insert_image(&image, &binaries, &[]).await.is_ok());

    let catalogue = PostgresPublicCatalogRepository::new(pool);
    let page = catalogue
        .search(&PublicSearchQuery {
            with_images: true,
            ..scoped(&fixture)
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].specimen_id, created.specimen_id);
    assert_eq!(page.items[0].primary_image_id, Some(image.image_id));

    let gallery = catalogue
        .gallery(500, 0)
        .await
        .unwrap_or_else(|_| unreachable!());
    let entry = gallery
        .iter()
        .find(|item| item.taxon_id == fixture.taxon_id)
        .unwrap_or_else(|| unreachable!());
    assert_eq!(entry.image_id, image.image_id);
    assert_eq!(entry.specimen_count, 1);
}

#[tokio::test]
async fn filter_options_narrow_by_selection() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let fixture = fixture(&pool).await;
    insert_specimen(&pool, &fixture, |_| {}, None).await;

    let catalogue = PostgresPublicCatalogRepository::new(pool);

    let unselected = catalogue
        .filter_options(&PublicFilterSelection::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(unselected.cantons.is_empty());
    assert!(
        unselected
            .families
            .iter()
            .any(|option| option.value == fixture.family_id.to_string() && option.count == 1)
    );

    let selected = catalogue
        .filter_options(&PublicFilterSelection {
            family_id: Some(fixture.family_id),
            province_id: fixture.location.province,
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(selected.genera.len(), 1);
    assert_eq!(selected.genera[0].value, fixture.genus);
    assert_eq!(selected.cantons.len(), 1);
    assert_eq!(
        selected.cantons[0].value,
        fixture
            .location
            .canton
            .map(|id| id.to_string())
            .unwrap_or_default()
    );
}

#[tokio::test]
async fn map_points_skip_origin_coordinates() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let fixture = fixture(&pool).await;
    let placed = insert_specimen(&pool, &fixture, |_| {}, Some((-0.1807, -78.4678))).await;
    let origin = insert_specimen(&pool, &fixture, |_| {}, Some((0.0, 0.0))).await;

    let statistics = PostgresPublicCatalogRepository::new(pool)
        .statistics(5)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(
        statistics
            .map_points
            .iter()
            .any(|point| point.specimen_id == placed.specimen_id)
    );
    assert!(
        statistics
            .map_points
            .iter()
            .all(|point| point.specimen_id != origin.specimen_id)
    );
    assert!(statistics.by_year.iter().any(|bucket| bucket.label == "2019"));
}
