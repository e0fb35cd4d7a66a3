use herbarium_application::{SpecimenListQuery, SpecimenRepository};
use herbarium_core::AppError;
use herbarium_domain::{
    AuditAction, AuditTargetType, CollectionSite, Coordinate, LocationSelection, SiteId,
    SpecimenId, SpecimenStatus,
};

use super::PostgresSpecimenRepository;
use crate::test_support::{actor, audit_for, insert_chain, specimen, test_pool, unique_code};

fn site(
    specimen_id: SpecimenId,
    location: LocationSelection,
    number: &str,
    is_primary: bool,
) -> CollectionSite {
    CollectionSite {
        site_id: SiteId::new(),
        specimen_id,
        herbarium_id: None,
        location,
        collection_number: Some(number.to_owned()),
        collection_date: None,
        collection_method: None,
        is_primary,
        habitat: Some("Páramo herbáceo".to_owned()),
        field_notes: None,
        coordinate: Some(
            Coordinate::new(-1.4682, -78.8167, Some(3900.0)).unwrap_or_else(|_| unreachable!()),
        ),
        created_by: Some("tester".to_owned()),
    }
}

#[tokio::test]
async fn concurrent_inserts_of_one_code_leave_a_single_row() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSpecimenRepository::new(pool);
    let code = unique_code();
    let first = specimen(code.clone(), "tester");
    let second = specimen(code.clone(), "tester");

    let (first_result, second_result) = tokio::join!(
        repository.insert_specimen(&first, &[]),
        repository.insert_specimen(&second, &[]),
    );

    let outcomes = [first_result, second_result];
    assert_eq!(outcomes.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|result| matches!(result, Err(AppError::Conflict(_))))
    );

    let codes = repository
        .list_codes()
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        codes.iter().filter(|stored| *stored == code.as_str()).count(),
        1
    );
}

#[tokio::test]
async fn failed_audit_write_rolls_back_the_specimen() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSpecimenRepository::new(pool);
    let created = specimen(unique_code(), "tester");
    let entry = audit_for(
        &actor(),
        AuditTargetType::Specimen,
        created.specimen_id,
        AuditAction::Created,
    )
    .remove(0);

    let result = repository
        .insert_specimen(&created, &[entry.clone(), entry])
        .await;
    assert!(result.is_err());

    let found = repository
        .find_specimen(created.specimen_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(found.is_none());
}

#[tokio::test]
async fn updates_are_persisted_and_missing_rows_are_reported() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSpecimenRepository::new(pool);
    let mut created = specimen(unique_code(), "tester");
    assert!(repository.insert_specimen(&created, &[]).await.is_ok());

    created.status = SpecimenStatus::Activo;
    created.index_text = Some("Gentianella cerastioides".to_owned());
    assert!(repository.update_specimen(&created, &[]).await.is_ok());

    let listed = repository
        .list_specimens(&SpecimenListQuery {
            search: Some(created.code.as_str().to_owned()),
            status: Some(SpecimenStatus::Activo),
            ..SpecimenListQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].index_text.as_deref(), Some("Gentianella cerastioides"));

    let missing = specimen(unique_code(), "tester");
    assert!(matches!(
        repository.update_specimen(&missing, &[]).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repository.delete_specimen(missing.specimen_id, &[]).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn saving_a_primary_site_demotes_the_previous_one() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSpecimenRepository::new(pool.clone());
    let created = specimen(unique_code(), "tester");
    assert!(repository.insert_specimen(&created, &[]).await.is_ok());
    let location = insert_chain(&pool).await;

    let first = site(created.specimen_id, location, "JC-1", true);
    assert!(repository.save_site(&first, &[]).await.is_ok());
    let second = site(created.specimen_id, location, "JC-2", true);
    assert!(repository.save_site(&second, &[]).await.is_ok());

    let sites = repository
        .list_sites(created.specimen_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].site_id, second.site_id);
    assert!(sites[0].is_primary);
    assert!(!sites[1].is_primary);
    assert_eq!(sites[0].location, location);
    assert_eq!(
        sites[0].coordinate.as_ref().map(Coordinate::latitude),
        Some(-1.4682)
    );

    assert!(repository.delete_site(second.site_id, &[]).await.is_ok());
    let remaining = repository
        .find_site(first.site_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(remaining.is_some_and(|site| !site.is_primary));
}

#[tokio::test]
async fn contributions_count_specimens_and_sites_by_creator() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSpecimenRepository::new(pool.clone());
    let subject = uuid::Uuid::new_v4().to_string();
    let created = specimen(unique_code(), &subject);
    assert!(repository.insert_specimen(&created, &[]).await.is_ok());

    let mut added = site(
        created.specimen_id,
        LocationSelection::default(),
        "JC-3",
        true,
    );
    added.created_by = Some(subject.clone());
    assert!(repository.save_site(&added, &[]).await.is_ok());

    let counts = repository
        .count_contributions(&subject)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(counts.specimens_created, 1);
    assert_eq!(counts.sites_added, 1);
}
