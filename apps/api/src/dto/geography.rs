use herbarium_application::LocationPreview;
use herbarium_domain::{
    CoordinateInput, GeoLevel, GeoNode, GeoNodeId, LocationSelection, PointKind, ReferencePoint,
};
use serde::{Deserialize, Serialize};

use super::CoordinateResponse;

/// Level and optional parent of the nodes to list.
#[derive(Debug, Deserialize)]
pub struct GeoNodesQuery {
    pub level: GeoLevel,
    pub parent_id: Option<GeoNodeId>,
}

/// Incoming payload for a country, province, canton, locality or vicinity.
#[derive(Debug, Deserialize)]
pub struct CreateGeoNodeRequest {
    pub level: GeoLevel,
    pub name: String,
    pub code: Option<String>,
    pub parent_id: Option<GeoNodeId>,
}

/// API representation of a geographic node.
#[derive(Debug, Serialize)]
pub struct GeoNodeResponse {
    pub node_id: String,
    pub level: String,
    pub name: String,
    pub code: Option<String>,
    pub parent_id: Option<String>,
}

impl From<GeoNode> for GeoNodeResponse {
    fn from(node: GeoNode) -> Self {
        Self {
            node_id: node.node_id().to_string(),
            level: node.level().as_str().to_owned(),
            name: node.name().to_owned(),
            code: node.code().map(ToOwned::to_owned),
            parent_id: node.parent_id().map(|parent_id| parent_id.to_string()),
        }
    }
}

/// Incoming payload for a reference point within a vicinity.
#[derive(Debug, Deserialize)]
pub struct CreateReferencePointRequest {
    pub name: String,
    pub kind: PointKind,
    #[serde(default)]
    pub coordinate: CoordinateInput,
}

/// API representation of a reference point.
#[derive(Debug, Serialize)]
pub struct ReferencePointResponse {
    pub point_id: String,
    pub vicinity_id: String,
    pub name: String,
    pub kind: String,
    pub coordinate: CoordinateResponse,
}

impl From<ReferencePoint> for ReferencePointResponse {
    fn from(point: ReferencePoint) -> Self {
        Self {
            point_id: point.point_id.to_string(),
            vicinity_id: point.vicinity_id.to_string(),
            kind: point.kind.as_str().to_owned(),
            coordinate: CoordinateResponse::from(&point.coordinate),
            name: point.name.into(),
        }
    }
}

/// Stored and edited selections of a location form.
#[derive(Debug, Deserialize)]
pub struct LocationPreviewRequest {
    #[serde(default)]
    pub previous: LocationSelection,
    pub submitted: LocationSelection,
}

/// Normalized selection with its label.
#[derive(Debug, Serialize)]
pub struct LocationPreviewResponse {
    pub selection: LocationSelection,
    pub label: String,
}

impl From<LocationPreview> for LocationPreviewResponse {
    fn from(preview: LocationPreview) -> Self {
        Self {
            selection: preview.selection,
            label: preview.label,
        }
    }
}

/// Free coordinate text to interpret.
#[derive(Debug, Deserialize)]
pub struct CoordinatePreviewRequest {
    #[serde(default)]
    pub coordinate: CoordinateInput,
}

/// Resolved coordinate, absent when nothing was entered.
#[derive(Debug, Serialize)]
pub struct CoordinatePreviewResponse {
    pub coordinate: Option<CoordinateResponse>,
}
