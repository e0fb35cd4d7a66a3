//! Pool and fixtures shared by the PostgreSQL repository tests.

use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use herbarium_core::{RequestMetadata, UserIdentity, UserRole};
use herbarium_domain::{
    AuditAction, AuditEntry, AuditTarget, AuditTargetType, GeoLevel, GeoNode, GeoNodeId,
    LocationSelection, Specimen, SpecimenCode, SpecimenId, SpecimenStatus, draft_entries,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and migrates, or returns `None` when unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for herbarium repository tests: {error}");
    }

    Some(pool)
}

pub(crate) fn actor() -> UserIdentity {
    UserIdentity::new(
        uuid::Uuid::new_v4().to_string(),
        "Curadora de prueba",
        Some("curadora@herbario.test".to_owned()),
        UserRole::Curator,
    )
}

pub(crate) fn audit_for(
    actor: &UserIdentity,
    target_type: AuditTargetType,
    target_id: impl ToString,
    action: AuditAction,
) -> Vec<AuditEntry> {
    draft_entries(
        &AuditTarget::new(target_type, target_id),
        action,
        "test change",
        None,
        actor,
        &RequestMetadata {
            ip_address: Some("203.0.113.7".to_owned()),
            user_agent: Some("repository-tests".to_owned()),
        },
        Utc::now(),
    )
}

/// Suffix keeping fixture names unique across concurrently running tests.
pub(crate) fn unique(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4().simple())
}

/// Code unlikely to collide with other tests sharing the database.
pub(crate) fn unique_code() -> SpecimenCode {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    SpecimenCode::from_stored(format!("TEST-{}", &suffix[..12]))
}

pub(crate) fn specimen(code: SpecimenCode, created_by: &str) -> Specimen {
    let now = Utc::now();
    Specimen {
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
        status: SpecimenStatus::Borrador,
        is_public: true,
        created_by: Some(created_by.to_owned()),
        created_at: now,
        updated_by: Some(created_by.to_owned()),
        updated_at: now,
    }
}

/// Inserts a country → province → canton chain and returns its selection.
pub(crate) async fn insert_chain(pool: &PgPool) -> LocationSelection {
    let mut parent: Option<GeoNodeId> = None;
    let mut selection = LocationSelection::default();

    for level in [GeoLevel::Country, GeoLevel::Province, GeoLevel::Canton] {
        let node = GeoNode::new(GeoNodeId::new(), level, unique(level.as_str()), None, parent)
            .unwrap_or_else(|_| unreachable!());
        let insert = sqlx::query(
            r#"
            INSERT INTO geo_nodes (id, level, name, code, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(node.node_id().as_uuid())
        .bind(level.as_str())
        .bind(node.name())
        .bind(node.code())
        .bind(parent.map(|id| id.as_uuid()))
        .execute(pool)
        .await;
        assert!(insert.is_ok());

        match level {
            GeoLevel::Country => selection.country = Some(node.node_id()),
            GeoLevel::Province => selection.province = Some(node.node_id()),
            _ => selection.canton = Some(node.node_id()),
        }
        parent = Some(node.node_id());
    }

    selection
}
