use std::sync::Arc;

use herbarium_core::{AppError, AppResult, NonEmptyString, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditTarget, AuditTargetType, CoordinateInput, GeoLevel, GeoNode, GeoNodeId,
    LocationSelection, Permission, PointKind, ReferencePoint, ReferencePointId, normalize,
};

use crate::{AuditLogger, AuthorizationService, GeographyRepository};

/// Input for creating a hierarchy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGeoNodeInput {
    /// Level of the new node.
    pub level: GeoLevel,
    /// Display name.
    pub name: String,
    /// Two-letter code, countries only.
    pub code: Option<String>,
    /// Parent one level above; none for countries.
    pub parent_id: Option<GeoNodeId>,
}

/// Input for attaching a reference point to a vicinity.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReferencePointInput {
    /// Display name.
    pub name: String,
    /// Point kind.
    pub kind: PointKind,
    /// Raw coordinate fields.
    pub coordinate: CoordinateInput,
}

/// Normalized selection returned to editing clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPreview {
    /// Consistent selection.
    pub selection: LocationSelection,
    /// Label of the selection.
    pub label: String,
}

/// Application service for the geographic hierarchy.
#[derive(Clone)]
pub struct GeographyService {
    repository: Arc<dyn GeographyRepository>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
}

impl GeographyService {
    /// Creates a new geography service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn GeographyRepository>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            audit_logger,
        }
    }

    /// Lists nodes of one level, optionally below one parent.
    pub async fn list_nodes(
        &self,
        actor: &UserIdentity,
        level: GeoLevel,
        parent_id: Option<GeoNodeId>,
    ) -> AppResult<Vec<GeoNode>> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogRead)
            .await?;

        self.repository.list_nodes(level, parent_id).await
    }

    /// Creates a node below an existing parent of the level above.
    pub async fn create_node(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        input: CreateGeoNodeInput,
    ) -> AppResult<GeoNode> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await?;

        let node = GeoNode::new(
            GeoNodeId::new(),
            input.level,
            input.name,
            input.code,
            input.parent_id,
        )?;
        self.repository
            .load_hierarchy()
            .await?
            .validate_parent(&node)?;

        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::GeoNode, node.node_id()),
            AuditAction::Created,
            &format!("{} '{}' created", node.level().as_str(), node.name()),
            None,
            actor,
            request,
        );
        self.repository.create_node(&node, &audit).await?;

        Ok(node)
    }

    /// Attaches a named coordinate to a vicinity.
    pub async fn create_reference_point(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        vicinity_id: GeoNodeId,
        input: CreateReferencePointInput,
    ) -> AppResult<ReferencePoint> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await?;

        let hierarchy = self.repository.load_hierarchy().await?;
        let vicinity = hierarchy.require_level(vicinity_id, GeoLevel::Vicinity)?;

        let coordinate = input.coordinate.resolve()?.ok_or_else(|| {
            AppError::Validation("a reference point requires coordinates".to_owned())
        })?;
        let point = ReferencePoint {
            point_id: ReferencePointId::new(),
            vicinity_id,
            name: NonEmptyString::for_field("name", input.name)?,
            kind: input.kind,
            coordinate,
        };

        let audit = self.audit_logger.draft(
            &AuditTarget::new(AuditTargetType::GeoNode, vicinity_id),
            AuditAction::Updated,
            &format!(
                "reference point '{}' added to vicinity '{}'",
                point.name,
                vicinity.name()
            ),
            None,
            actor,
            request,
        );
        self.repository
            .create_reference_point(&point, &audit)
            .await?;

        Ok(point)
    }

    /// Lists the reference points of a vicinity.
    pub async fn list_reference_points(
        &self,
        actor: &UserIdentity,
        vicinity_id: GeoNodeId,
    ) -> AppResult<Vec<ReferencePoint>> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogRead)
            .await?;

        self.repository.list_reference_points(vicinity_id).await
    }

    /// Normalizes an edited selection without storing anything.
    pub async fn preview_location(
        &self,
        actor: &UserIdentity,
        previous: &LocationSelection,
        submitted: &LocationSelection,
    ) -> AppResult<LocationPreview> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogRead)
            .await?;

        let hierarchy = self.repository.load_hierarchy().await?;
        let selection = normalize(previous, submitted, &hierarchy)?;

        Ok(LocationPreview {
            label: selection.full_label(&hierarchy),
            selection,
        })
    }
}
