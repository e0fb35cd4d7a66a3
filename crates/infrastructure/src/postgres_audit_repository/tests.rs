use chrono::Utc;
use herbarium_application::{AuditLogQuery, AuditRepository};
use herbarium_core::RequestMetadata;
use herbarium_domain::{AuditAction, AuditTarget, AuditTargetType, FieldChange, draft_entries};

use super::PostgresAuditRepository;
use crate::test_support::{actor, audit_for, test_pool};

#[tokio::test]
async fn field_diffs_round_trip_with_actor_and_request_metadata() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuditRepository::new(pool);
    let actor = actor();
    let target_id = uuid::Uuid::new_v4();
    let changes = [
        FieldChange::new("status", "borrador", "activo"),
        FieldChange::new("is_public", "No", "Sí"),
    ];
    let entries = draft_entries(
        &AuditTarget::new(AuditTargetType::Specimen, target_id),
        AuditAction::Updated,
        "Espécimen actualizado",
        Some(&changes),
        &actor,
        &RequestMetadata {
            ip_address: Some("198.51.100.4".to_owned()),
            user_agent: Some("Mozilla/5.0".to_owned()),
        },
        Utc::now(),
    );

    assert!(repository.append_entries(&entries).await.is_ok());

    let listed = repository
        .list_entries(&AuditLogQuery {
            target_type: Some(AuditTargetType::Specimen),
            target_id: Some(target_id.to_string()),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(listed.len(), 2);
    let mut fields: Vec<_> = listed
        .iter()
        .filter_map(|entry| entry.field_name.clone())
        .collect();
    fields.sort();
    assert_eq!(fields, vec!["is_public".to_owned(), "status".to_owned()]);
    assert!(listed.iter().all(|entry| {
        entry.actor_subject == actor.subject()
            && entry.ip_address.as_deref() == Some("198.51.100.4")
            && entry.user_agent.as_deref() == Some("Mozilla/5.0")
    }));
}

#[tokio::test]
async fn listing_filters_by_action_and_actor() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuditRepository::new(pool);
    let actor = actor();
    let target_id = uuid::Uuid::new_v4();

    let mut entries = audit_for(&actor, AuditTargetType::Taxon, target_id, AuditAction::Created);
    entries.extend(audit_for(
        &actor,
        AuditTargetType::Taxon,
        target_id,
        AuditAction::Deleted,
    ));
    assert!(repository.append_entries(&entries).await.is_ok());

    let deleted = repository
        .list_entries(&AuditLogQuery {
            action: Some(AuditAction::Deleted),
            actor_subject: Some(actor.subject().to_owned()),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].target.target_id, target_id.to_string());
}

#[tokio::test]
async fn duplicate_entry_ids_write_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuditRepository::new(pool);
    let actor = actor();
    let target_id = uuid::Uuid::new_v4();
    let entry = audit_for(&actor, AuditTargetType::Family, target_id, AuditAction::Created)
        .remove(0);

    let result = repository
        .append_entries(&[entry.clone(), entry])
        .await;
    assert!(result.is_err());

    let listed = repository
        .list_entries(&AuditLogQuery {
            target_id: Some(target_id.to_string()),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(listed.is_empty());
}
