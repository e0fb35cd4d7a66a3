//! Five-level geographic hierarchy and selection normalization.

use std::collections::HashMap;
use std::str::FromStr;

use herbarium_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{Coordinate, GeoNodeId, ReferencePointId};

/// Label used when a selection has no level set.
pub const NO_LOCATION_LABEL: &str = "Sin ubicación registrada";

/// Levels of the geographic hierarchy, top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    /// Top level.
    Country,
    /// Child of a country.
    Province,
    /// Child of a province.
    Canton,
    /// Child of a canton.
    Locality,
    /// Child of a locality.
    Vicinity,
}

impl GeoLevel {
    /// All levels, top-down.
    pub const ALL: [Self; 5] = [
        Self::Country,
        Self::Province,
        Self::Canton,
        Self::Locality,
        Self::Vicinity,
    ];

    /// Returns a stable storage value for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Province => "province",
            Self::Canton => "canton",
            Self::Locality => "locality",
            Self::Vicinity => "vicinity",
        }
    }

    /// Level directly above, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Country => None,
            Self::Province => Some(Self::Country),
            Self::Canton => Some(Self::Province),
            Self::Locality => Some(Self::Canton),
            Self::Vicinity => Some(Self::Locality),
        }
    }

    /// Level directly below, if any.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Country => Some(Self::Province),
            Self::Province => Some(Self::Canton),
            Self::Canton => Some(Self::Locality),
            Self::Locality => Some(Self::Vicinity),
            Self::Vicinity => None,
        }
    }
}

impl FromStr for GeoLevel {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "country" => Ok(Self::Country),
            "province" => Ok(Self::Province),
            "canton" => Ok(Self::Canton),
            "locality" => Ok(Self::Locality),
            "vicinity" => Ok(Self::Vicinity),
            _ => Err(AppError::Validation(format!(
                "unknown geographic level '{value}'"
            ))),
        }
    }
}

/// One node of the geographic hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoNode {
    node_id: GeoNodeId,
    level: GeoLevel,
    name: NonEmptyString,
    code: Option<String>,
    parent_id: Option<GeoNodeId>,
}

impl GeoNode {
    /// Creates a node, validating the shape rules that do not need the rest
    /// of the hierarchy.
    ///
    /// Countries have no parent and may carry a two-letter code; every other
    /// level requires a parent and carries no code.
    pub fn new(
        node_id: GeoNodeId,
        level: GeoLevel,
        name: impl Into<String>,
        code: Option<String>,
        parent_id: Option<GeoNodeId>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::for_field("name", name)?;
        let code = code
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|value| !value.is_empty());

        match (level, parent_id) {
            (GeoLevel::Country, Some(_)) => {
                return Err(AppError::Validation(
                    "a country cannot have a parent".to_owned(),
                ));
            }
            (GeoLevel::Country, None) => {}
            (level, None) => {
                return Err(AppError::Validation(format!(
                    "a {} requires a parent",
                    level.as_str()
                )));
            }
            (_, Some(_)) => {}
        }

        if let Some(code) = code.as_deref() {
            if level != GeoLevel::Country {
                return Err(AppError::Validation(
                    "only countries carry a code".to_owned(),
                ));
            }
            if code.len() != 2 || !code.chars().all(|value| value.is_ascii_alphabetic()) {
                return Err(AppError::Validation(format!(
                    "country code '{code}' must be two letters"
                )));
            }
        }

        Ok(Self {
            node_id,
            level,
            name,
            code,
            parent_id,
        })
    }

    /// Returns the node identifier.
    #[must_use]
    pub fn node_id(&self) -> GeoNodeId {
        self.node_id
    }

    /// Returns the level of the node.
    #[must_use]
    pub fn level(&self) -> GeoLevel {
        self.level
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the country code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the parent node, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<GeoNodeId> {
        self.parent_id
    }
}

/// Read-only index over all hierarchy nodes.
#[derive(Debug, Clone, Default)]
pub struct GeoHierarchy {
    nodes: HashMap<GeoNodeId, GeoNode>,
}

impl GeoHierarchy {
    /// Indexes the given nodes.
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = GeoNode>) -> Self {
        Self {
            nodes: nodes
                .into_iter()
                .map(|node| (node.node_id(), node))
                .collect(),
        }
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, node_id: GeoNodeId) -> Option<&GeoNode> {
        self.nodes.get(&node_id)
    }

    /// True parent of a node.
    #[must_use]
    pub fn parent_of(&self, node_id: GeoNodeId) -> Option<GeoNodeId> {
        self.node(node_id).and_then(GeoNode::parent_id)
    }

    /// Name of a node.
    #[must_use]
    pub fn name_of(&self, node_id: GeoNodeId) -> Option<&str> {
        self.node(node_id).map(GeoNode::name)
    }

    /// Fails unless `node_id` exists at `level`.
    pub fn require_level(&self, node_id: GeoNodeId, level: GeoLevel) -> AppResult<&GeoNode> {
        let node = self.node(node_id).ok_or_else(|| {
            AppError::Validation(format!("unknown {} '{node_id}'", level.as_str()))
        })?;

        if node.level() != level {
            return Err(AppError::Validation(format!(
                "'{}' is a {}, expected a {}",
                node.name(),
                node.level().as_str(),
                level.as_str()
            )));
        }

        Ok(node)
    }

    /// Checks that a new node's parent exists one level above it.
    pub fn validate_parent(&self, node: &GeoNode) -> AppResult<()> {
        match (node.level().parent(), node.parent_id()) {
            (Some(parent_level), Some(parent_id)) => {
                self.require_level(parent_id, parent_level).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

/// The five location selectors of a collection site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelection {
    /// Selected country.
    pub country: Option<GeoNodeId>,
    /// Selected province.
    pub province: Option<GeoNodeId>,
    /// Selected canton.
    pub canton: Option<GeoNodeId>,
    /// Selected locality.
    pub locality: Option<GeoNodeId>,
    /// Selected vicinity.
    pub vicinity: Option<GeoNodeId>,
}

impl LocationSelection {
    /// Returns the selector for `level`.
    #[must_use]
    pub fn get(&self, level: GeoLevel) -> Option<GeoNodeId> {
        match level {
            GeoLevel::Country => self.country,
            GeoLevel::Province => self.province,
            GeoLevel::Canton => self.canton,
            GeoLevel::Locality => self.locality,
            GeoLevel::Vicinity => self.vicinity,
        }
    }

    /// Replaces the selector for `level`.
    pub fn set(&mut self, level: GeoLevel, value: Option<GeoNodeId>) {
        let slot = match level {
            GeoLevel::Country => &mut self.country,
            GeoLevel::Province => &mut self.province,
            GeoLevel::Canton => &mut self.canton,
            GeoLevel::Locality => &mut self.locality,
            GeoLevel::Vicinity => &mut self.vicinity,
        };
        *slot = value;
    }

    /// Clears `level` and every level below it.
    pub fn clear_from(&mut self, level: GeoLevel) {
        let mut current = Some(level);
        while let Some(level) = current {
            self.set(level, None);
            current = level.child();
        }
    }

    /// Whether no level is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        GeoLevel::ALL.iter().all(|level| self.get(*level).is_none())
    }

    /// Human readable label, most specific level first.
    #[must_use]
    pub fn full_label(&self, hierarchy: &GeoHierarchy) -> String {
        location_label(
            GeoLevel::ALL
                .iter()
                .rev()
                .map(|level| self.get(*level).and_then(|id| hierarchy.name_of(id))),
        )
    }
}

/// Joins location names, most specific first, skipping empty levels.
#[must_use]
pub fn location_label<'a>(names: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let parts: Vec<&str> = names
        .into_iter()
        .flatten()
        .filter(|name| !name.trim().is_empty())
        .collect();

    if parts.is_empty() {
        return NO_LOCATION_LABEL.to_owned();
    }

    parts.join(", ")
}

/// Reconciles a submitted selection with the hierarchy after an edit.
///
/// Every level that differs from `previous` is processed deepest first. A
/// changed level rewrites its ancestors to the chain implied by the selected
/// node and clears any descendant whose true parent no longer matches. A
/// level already rewritten by a deeper change is skipped, so lower-level
/// selections win over conflicting higher-level ones.
pub fn normalize(
    previous: &LocationSelection,
    submitted: &LocationSelection,
    hierarchy: &GeoHierarchy,
) -> AppResult<LocationSelection> {
    for level in GeoLevel::ALL {
        if let Some(node_id) = submitted.get(level) {
            hierarchy.require_level(node_id, level)?;
        }
    }

    let mut normalized = *submitted;
    let changed = GeoLevel::ALL
        .into_iter()
        .rev()
        .filter(|level| previous.get(*level) != submitted.get(*level));

    for level in changed {
        if normalized.get(level) != submitted.get(level) {
            continue;
        }

        correct_upward(&mut normalized, level, hierarchy);
        clear_inconsistent_descendants(&mut normalized, level, hierarchy);
    }

    if let Some(deepest) = GeoLevel::ALL
        .into_iter()
        .rev()
        .find(|level| normalized.get(*level).is_some())
    {
        correct_upward(&mut normalized, deepest, hierarchy);
    }

    Ok(normalized)
}

fn correct_upward(selection: &mut LocationSelection, level: GeoLevel, hierarchy: &GeoHierarchy) {
    let mut current_level = level;
    let mut current = selection.get(level);

    while let (Some(node_id), Some(parent_level)) = (current, current_level.parent()) {
        let parent = hierarchy.parent_of(node_id);
        selection.set(parent_level, parent);
        current_level = parent_level;
        current = parent;
    }
}

fn clear_inconsistent_descendants(
    selection: &mut LocationSelection,
    level: GeoLevel,
    hierarchy: &GeoHierarchy,
) {
    let mut parent_level = level;

    while let Some(child_level) = parent_level.child() {
        if let Some(child) = selection.get(child_level)
            && hierarchy.parent_of(child) != selection.get(parent_level)
        {
            selection.clear_from(child_level);
            return;
        }
        parent_level = child_level;
    }
}

/// Kind of a vicinity reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// Centre of the vicinity.
    Centro,
    /// Entrance.
    Entrada,
    /// Boundary marker.
    Limite,
    /// Generic landmark.
    Referencia,
    /// Anything else.
    Otro,
}

impl PointKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Centro => "centro",
            Self::Entrada => "entrada",
            Self::Limite => "limite",
            Self::Referencia => "referencia",
            Self::Otro => "otro",
        }
    }
}

impl FromStr for PointKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "centro" => Ok(Self::Centro),
            "entrada" => Ok(Self::Entrada),
            "limite" => Ok(Self::Limite),
            "referencia" => Ok(Self::Referencia),
            "otro" => Ok(Self::Otro),
            _ => Err(AppError::Validation(format!(
                "unknown reference point kind '{value}'"
            ))),
        }
    }
}

/// Named coordinate attached to a vicinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Point identifier.
    pub point_id: ReferencePointId,
    /// Owning vicinity.
    pub vicinity_id: GeoNodeId,
    /// Display name.
    pub name: NonEmptyString,
    /// Point kind.
    pub kind: PointKind,
    /// Position.
    pub coordinate: Coordinate,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        hierarchy: GeoHierarchy,
        ecuador: GeoNodeId,
        peru: GeoNodeId,
        chimborazo: GeoNodeId,
        pichincha: GeoNodeId,
        lima: GeoNodeId,
        riobamba: GeoNodeId,
        guano: GeoNodeId,
        quito: GeoNodeId,
        lican: GeoNodeId,
        yaruquies: GeoNodeId,
        san_gerardo: GeoNodeId,
        vicinity: GeoNodeId,
    }

    fn node(level: GeoLevel, name: &str, parent: Option<GeoNodeId>) -> GeoNode {
        GeoNode::new(GeoNodeId::new(), level, name, None, parent)
            .unwrap_or_else(|_| unreachable!())
    }

    fn fixture() -> Fixture {
        let ecuador = node(GeoLevel::Country, "Ecuador", None);
        let peru = node(GeoLevel::Country, "Perú", None);
        let chimborazo = node(GeoLevel::Province, "Chimborazo", Some(ecuador.node_id()));
        let pichincha = node(GeoLevel::Province, "Pichincha", Some(ecuador.node_id()));
        let lima = node(GeoLevel::Province, "Lima", Some(peru.node_id()));
        let riobamba = node(GeoLevel::Canton, "Riobamba", Some(chimborazo.node_id()));
        let guano = node(GeoLevel::Canton, "Guano", Some(chimborazo.node_id()));
        let quito = node(GeoLevel::Canton, "Quito", Some(pichincha.node_id()));
        let lican = node(GeoLevel::Locality, "Licán", Some(riobamba.node_id()));
        let yaruquies = node(GeoLevel::Locality, "Yaruquíes", Some(riobamba.node_id()));
        let san_gerardo = node(GeoLevel::Locality, "San Gerardo", Some(guano.node_id()));
        let vicinity = node(GeoLevel::Vicinity, "Macají", Some(lican.node_id()));

        let ids = Fixture {
            hierarchy: GeoHierarchy::default(),
            ecuador: ecuador.node_id(),
            peru: peru.node_id(),
            chimborazo: chimborazo.node_id(),
            pichincha: pichincha.node_id(),
            lima: lima.node_id(),
            riobamba: riobamba.node_id(),
            guano: guano.node_id(),
            quito: quito.node_id(),
            lican: lican.node_id(),
            yaruquies: yaruquies.node_id(),
            san_gerardo: san_gerardo.node_id(),
            vicinity: vicinity.node_id(),
        };

        Fixture {
            hierarchy: GeoHierarchy::new([
                ecuador,
                peru,
                chimborazo,
                pichincha,
                lima,
                riobamba,
                guano,
                quito,
                lican,
                yaruquies,
                san_gerardo,
                vicinity,
            ]),
            ..ids
        }
    }

    fn full_chain(fixture: &Fixture) -> LocationSelection {
        LocationSelection {
            country: Some(fixture.ecuador),
            province: Some(fixture.chimborazo),
            canton: Some(fixture.riobamba),
            locality: Some(fixture.lican),
            vicinity: Some(fixture.vicinity),
        }
    }

    #[test]
    fn inconsistent_province_clears_canton_and_below() {
        let fixture = fixture();
        let previous = full_chain(&fixture);
        let submitted = LocationSelection {
            province: Some(fixture.pichincha),
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.country, Some(fixture.ecuador));
        assert_eq!(normalized.province, Some(fixture.pichincha));
        assert_eq!(normalized.canton, None);
        assert_eq!(normalized.locality, None);
        assert_eq!(normalized.vicinity, None);
    }

    #[test]
    fn province_from_another_country_corrects_country_upward() {
        let fixture = fixture();
        let previous = full_chain(&fixture);
        let submitted = LocationSelection {
            province: Some(fixture.lima),
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.country, Some(fixture.peru));
        assert_eq!(normalized.province, Some(fixture.lima));
        assert!(normalized.canton.is_none());
    }

    #[test]
    fn selecting_a_vicinity_fills_every_ancestor() {
        let fixture = fixture();
        let submitted = LocationSelection {
            vicinity: Some(fixture.vicinity),
            ..LocationSelection::default()
        };

        let normalized = normalize(
            &LocationSelection::default(),
            &submitted,
            &fixture.hierarchy,
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized, full_chain(&fixture));
    }

    #[test]
    fn changing_country_clears_foreign_province() {
        let fixture = fixture();
        let previous = full_chain(&fixture);
        let submitted = LocationSelection {
            country: Some(fixture.peru),
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            normalized,
            LocationSelection {
                country: Some(fixture.peru),
                ..LocationSelection::default()
            }
        );
    }

    #[test]
    fn sibling_locality_keeps_ancestors_and_clears_vicinity() {
        let fixture = fixture();
        let previous = full_chain(&fixture);
        let submitted = LocationSelection {
            locality: Some(fixture.yaruquies),
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.canton, Some(fixture.riobamba));
        assert_eq!(normalized.locality, Some(fixture.yaruquies));
        assert_eq!(normalized.vicinity, None);
    }

    #[test]
    fn locality_in_other_canton_corrects_canton_upward() {
        let fixture = fixture();
        let previous = LocationSelection {
            vicinity: None,
            ..full_chain(&fixture)
        };
        let submitted = LocationSelection {
            locality: Some(fixture.san_gerardo),
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.canton, Some(fixture.guano));
        assert_eq!(normalized.province, Some(fixture.chimborazo));
        assert_eq!(normalized.locality, Some(fixture.san_gerardo));
    }

    #[test]
    fn deeper_selection_wins_over_conflicting_parent_edit() {
        let fixture = fixture();
        let previous = LocationSelection::default();
        let submitted = LocationSelection {
            province: Some(fixture.pichincha),
            canton: Some(fixture.riobamba),
            ..LocationSelection::default()
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.province, Some(fixture.chimborazo));
        assert_eq!(normalized.canton, Some(fixture.riobamba));
        assert_eq!(normalized.country, Some(fixture.ecuador));
    }

    #[test]
    fn clearing_a_level_clears_everything_below() {
        let fixture = fixture();
        let previous = full_chain(&fixture);
        let submitted = LocationSelection {
            canton: None,
            ..previous
        };

        let normalized = normalize(&previous, &submitted, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(normalized.province, Some(fixture.chimborazo));
        assert!(normalized.canton.is_none());
        assert!(normalized.locality.is_none());
        assert!(normalized.vicinity.is_none());
    }

    #[test]
    fn unchanged_consistent_selection_is_kept() {
        let fixture = fixture();
        let selection = full_chain(&fixture);
        let normalized = normalize(&selection, &selection, &fixture.hierarchy)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(normalized, selection);
    }

    #[test]
    fn unknown_or_misplaced_nodes_are_rejected() {
        let fixture = fixture();
        let unknown = LocationSelection {
            canton: Some(GeoNodeId::new()),
            ..LocationSelection::default()
        };
        assert!(normalize(&LocationSelection::default(), &unknown, &fixture.hierarchy).is_err());

        let misplaced = LocationSelection {
            canton: Some(fixture.quito),
            province: Some(fixture.quito),
            ..LocationSelection::default()
        };
        assert!(
            normalize(&LocationSelection::default(), &misplaced, &fixture.hierarchy).is_err()
        );
    }

    #[test]
    fn label_lists_most_specific_level_first() {
        let fixture = fixture();
        assert_eq!(
            full_chain(&fixture).full_label(&fixture.hierarchy),
            "Macají, Licán, Riobamba, Chimborazo, Ecuador"
        );
        assert_eq!(
            LocationSelection::default().full_label(&fixture.hierarchy),
            NO_LOCATION_LABEL
        );
    }

    #[test]
    fn node_shape_rules_are_enforced() {
        let country = GeoNodeId::new();
        assert!(GeoNode::new(country, GeoLevel::Country, "Ecuador", Some("ec".to_owned()), None).is_ok());
        assert!(GeoNode::new(country, GeoLevel::Country, "Ecuador", Some("ECU".to_owned()), None).is_err());
        assert!(GeoNode::new(GeoNodeId::new(), GeoLevel::Province, "Chimborazo", None, None).is_err());
        assert!(
            GeoNode::new(GeoNodeId::new(), GeoLevel::Country, "Ecuador", None, Some(country)).is_err()
        );
        assert!(GeoNode::new(GeoNodeId::new(), GeoLevel::Country, " ", None, None).is_err());
    }

    #[test]
    fn parent_must_sit_one_level_above() {
        let fixture = fixture();
        let misplaced = node(GeoLevel::Locality, "Cajabamba", Some(fixture.chimborazo));
        assert!(fixture.hierarchy.validate_parent(&misplaced).is_err());

        let placed = node(GeoLevel::Locality, "Cajabamba", Some(fixture.riobamba));
        assert!(fixture.hierarchy.validate_parent(&placed).is_ok());
    }
}
