use herbarium_application::{AuditLogQuery, AuditRepository, GeographyRepository};
use herbarium_core::{AppError, NonEmptyString};
use herbarium_domain::{
    AuditAction, AuditTargetType, Coordinate, GeoLevel, GeoNode, GeoNodeId, PointKind,
    ReferencePoint, ReferencePointId,
};

use super::PostgresGeographyRepository;
use crate::PostgresAuditRepository;
use crate::test_support::{actor, audit_for, test_pool, unique};

fn node(level: GeoLevel, name: &str, parent: Option<GeoNodeId>) -> GeoNode {
    GeoNode::new(GeoNodeId::new(), level, name, None, parent).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn nodes_are_created_with_audit_and_listed_under_their_parent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGeographyRepository::new(pool.clone());
    let actor = actor();
    let country = node(GeoLevel::Country, &unique("Ecuador"), None);
    let province = node(
        GeoLevel::Province,
        &unique("Chimborazo"),
        Some(country.node_id()),
    );

    for created in [&country, &province] {
        let audit = audit_for(
            &actor,
            AuditTargetType::GeoNode,
            created.node_id(),
            AuditAction::Created,
        );
        assert!(repository.create_node(created, &audit).await.is_ok());
    }

    let provinces = repository
        .list_nodes(GeoLevel::Province, Some(country.node_id()))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(provinces.len(), 1);
    assert_eq!(provinces[0].name(), province.name());

    let hierarchy = repository
        .load_hierarchy()
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        hierarchy.node(province.node_id()).and_then(GeoNode::parent_id),
        Some(country.node_id())
    );

    let audit = PostgresAuditRepository::new(pool)
        .list_entries(&AuditLogQuery {
            target_type: Some(AuditTargetType::GeoNode),
            target_id: Some(province.node_id().to_string()),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(audit.len(), 1);
}

#[tokio::test]
async fn sibling_names_are_unique_per_parent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGeographyRepository::new(pool);
    let first_country = node(GeoLevel::Country, &unique("País A"), None);
    let second_country = node(GeoLevel::Country, &unique("País B"), None);
    assert!(repository.create_node(&first_country, &[]).await.is_ok());
    assert!(repository.create_node(&second_country, &[]).await.is_ok());

    let name = unique("Pichincha");
    let original = node(GeoLevel::Province, &name, Some(first_country.node_id()));
    assert!(repository.create_node(&original, &[]).await.is_ok());

    let duplicate = node(GeoLevel::Province, &name, Some(first_country.node_id()));
    let result = repository.create_node(&duplicate, &[]).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let elsewhere = node(GeoLevel::Province, &name, Some(second_country.node_id()));
    assert!(repository.create_node(&elsewhere, &[]).await.is_ok());
}

#[tokio::test]
async fn reference_points_keep_their_coordinates() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGeographyRepository::new(pool);
    let mut parent = None;
    for level in GeoLevel::ALL {
        let created = node(level, &unique(level.as_str()), parent);
        assert!(repository.create_node(&created, &[]).await.is_ok());
        parent = Some(created.node_id());
    }
    let Some(vicinity_id) = parent else {
        unreachable!();
    };

    let point = ReferencePoint {
        point_id: ReferencePointId::new(),
        vicinity_id,
        name: NonEmptyString::new("Entrada al bosque").unwrap_or_else(|_| unreachable!()),
        kind: PointKind::Entrada,
        coordinate: Coordinate::new(-1.6647, -78.6547, Some(2754.0))
            .unwrap_or_else(|_| unreachable!())
            .with_details(Some("17M 758000 9815900".to_owned()), None),
    };
    assert!(repository.create_reference_point(&point, &[]).await.is_ok());

    let points = repository
        .list_reference_points(vicinity_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(points, vec![point]);
}
