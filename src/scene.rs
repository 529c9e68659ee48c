//! Geometry derived from a built hierarchy.
//!
//! Every stage is a pure function of the tree and the model. [`Snapshot`]
//! runs them all, in order, and returns one owned value for the rendering
//! surface.

use std::collections::HashSet;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{
    Config, ConstraintKind, FeatureKind, FeatureModel, HierarchyBuilder, HierarchyError, Omission,
    search,
};

mod highlight;
pub use highlight::{Emphasis, Highlight, expand};

mod layout;
pub use layout::{BoundingBox, Layout, LayoutConfig, Link, PositionedNode, Spacing, layout};

mod overlay;
pub use overlay::{ConstraintCurve, End, EndpointMarker, OverlayConfig, compute_overlay};

mod viewport;
pub use viewport::{Viewport, ViewportConfig, ViewportSize, ViewportState};

/// A positioned node ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    /// Feature id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Feature kind.
    pub kind: FeatureKind,
    /// Distance from the root.
    pub depth: usize,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Search emphasis.
    pub emphasis: Emphasis,
}

/// A tree edge ready for drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneLink {
    /// Parent id.
    pub source: String,
    /// Child id.
    pub target: String,
    /// Whether both ends are in the highlight closure.
    pub related: bool,
}

/// A constraint curve ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneConstraint {
    /// Id of the `a` feature.
    pub from: String,
    /// Id of the `b` feature.
    pub to: String,
    /// Constraint kind.
    pub kind: ConstraintKind,
    /// Start, control and end points.
    pub points: [[f64; 2]; 3],
    /// SVG path data.
    pub path: String,
}

/// Bounding box in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneBounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl From<BoundingBox> for SceneBounds {
    fn from(bounds: BoundingBox) -> Self {
        Self {
            x: bounds.x(),
            y: bounds.y(),
            width: bounds.width(),
            height: bounds.height(),
        }
    }
}

/// Everything the rendering surface needs for one model and query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Nodes in pre-order.
    pub nodes: Vec<SceneNode>,
    /// Tree edges.
    pub links: Vec<SceneLink>,
    /// Constraint curves in model order.
    pub constraints: Vec<SceneConstraint>,
    /// Content bounds.
    pub bounds: SceneBounds,
    /// The fitted viewport transform.
    pub viewport: ViewportState,
    /// Ids matching the query, in model order.
    pub matches: Vec<String>,
    /// Features left out of the tree.
    pub omitted: Vec<Omission>,
}

impl Snapshot {
    /// Runs hierarchy, layout, overlay, search, highlight and fit for `model`.
    ///
    /// # Errors
    ///
    /// Fails only when the configured root policy rejects the model.
    #[instrument(level = "debug", skip(model, config), fields(features = model.features.len()))]
    pub fn compute(
        model: &FeatureModel,
        query: &str,
        size: ViewportSize,
        config: &Config,
    ) -> Result<Self, HierarchyError> {
        let hierarchy = HierarchyBuilder::new(config.root_policy()).build(&model.features)?;
        let root = hierarchy.as_ref().map(|hierarchy| &hierarchy.root);

        let layout = layout(root, config.layout());
        let positioned = layout.by_id();
        let curves = compute_overlay(&model.constraints, &positioned, config.overlay());

        let matches = search(&model.features, query);
        let highlight = match root {
            Some(root) => expand(&matches.iter().copied().collect::<HashSet<_>>(), root),
            None => Highlight::default(),
        };

        let viewport = ViewportState::fit(&layout.bounds, size, config.viewport().fit_shrink);

        let nodes = layout
            .nodes
            .iter()
            .map(|node| SceneNode {
                id: node.id().to_string(),
                label: node.node.label().to_string(),
                kind: node.node.feature.kind.clone(),
                depth: node.depth,
                x: node.position.x,
                y: node.position.y,
                emphasis: highlight.emphasis(node.id()),
            })
            .collect();

        let links = layout
            .links
            .iter()
            .map(|link| SceneLink {
                source: link.source.to_string(),
                target: link.target.to_string(),
                related: highlight.is_link_related(link),
            })
            .collect();

        let constraints = curves
            .iter()
            .map(|curve| SceneConstraint {
                from: curve.from.to_string(),
                to: curve.to.to_string(),
                kind: curve.kind,
                points: [curve.curve.p0, curve.curve.p1, curve.curve.p2].map(|p| [p.x, p.y]),
                path: curve.path_data(),
            })
            .collect();

        Ok(Self {
            nodes,
            links,
            constraints,
            bounds: layout.bounds.into(),
            viewport,
            matches: matches.into_iter().map(str::to_string).collect(),
            omitted: hierarchy
                .as_ref()
                .map(|hierarchy| hierarchy.omitted.clone())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, Feature, RootPolicy};

    fn model() -> FeatureModel {
        FeatureModel {
            features: vec![
                Feature::new("root").with_label("Car"),
                Feature::new("a").with_parent("root").with_label("Engine"),
                Feature::new("b").with_parent("root").with_label("Radio"),
                Feature::new("a1").with_parent("a").with_label("Electric"),
                Feature::new("stray"),
            ],
            constraints: vec![
                Constraint::excludes("a", "b"),
                Constraint::requires("a1", "stray"),
            ],
        }
    }

    #[test]
    fn snapshot_without_query_is_unhighlighted() {
        let snapshot = Snapshot::compute(
            &model(),
            "",
            ViewportSize::new(800.0, 600.0),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(snapshot.nodes.len(), 4);
        assert!(snapshot.nodes.iter().all(|node| node.emphasis == Emphasis::Normal));
        assert!(snapshot.links.iter().all(|link| !link.related));
        assert!(snapshot.matches.is_empty());
    }

    #[test]
    fn snapshot_skips_constraints_to_omitted_features() {
        let snapshot = Snapshot::compute(
            &model(),
            "",
            ViewportSize::new(800.0, 600.0),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(snapshot.constraints.len(), 1);
        assert_eq!(snapshot.constraints[0].kind, ConstraintKind::Excludes);
        assert_eq!(snapshot.omitted.len(), 1);
        assert_eq!(snapshot.omitted[0].id, "stray");
    }

    #[test]
    fn snapshot_highlights_query_closure() {
        let snapshot = Snapshot::compute(
            &model(),
            "engine",
            ViewportSize::new(800.0, 600.0),
            &Config::default(),
        )
        .unwrap();

        let emphasis = |id: &str| {
            snapshot
                .nodes
                .iter()
                .find(|node| node.id == id)
                .map(|node| node.emphasis)
        };
        assert_eq!(snapshot.matches, ["a"]);
        assert_eq!(emphasis("a"), Some(Emphasis::Match));
        assert_eq!(emphasis("root"), Some(Emphasis::Related));
        assert_eq!(emphasis("a1"), Some(Emphasis::Related));
        assert_eq!(emphasis("b"), Some(Emphasis::Dimmed));

        let related: Vec<_> = snapshot
            .links
            .iter()
            .filter(|link| link.related)
            .map(|link| (link.source.as_str(), link.target.as_str()))
            .collect();
        assert_eq!(related, [("root", "a"), ("a", "a1")]);
    }

    #[test]
    fn strict_policy_surfaces_error() {
        let config = Config::default().with_root_policy(RootPolicy::RejectMultipleRoots);

        let error =
            Snapshot::compute(&model(), "", ViewportSize::new(800.0, 600.0), &config).unwrap_err();

        assert!(matches!(error, HierarchyError::MultipleRoots { .. }));
    }

    #[test]
    fn empty_model_gives_empty_snapshot() {
        let snapshot = Snapshot::compute(
            &FeatureModel::default(),
            "anything",
            ViewportSize::new(800.0, 600.0),
            &Config::default(),
        )
        .unwrap();

        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.viewport.scale, 1.0);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = Snapshot::compute(
            &model(),
            "radio",
            ViewportSize::new(800.0, 600.0),
            &Config::default(),
        )
        .unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["nodes"][0]["id"], "root");
        assert_eq!(json["nodes"][3]["id"], "b");
        assert_eq!(json["nodes"][3]["emphasis"], "match");
        assert_eq!(json["constraints"][0]["kind"], "excludes");
        assert!(json["viewport"]["scale"].is_number());
        assert_eq!(json["omitted"][0]["reason"], "extra-root");
    }

    #[test]
    fn demo_model_lays_out_every_feature() {
        let model = FeatureModel::from_json(include_str!("../demos/car.json")).unwrap();

        let snapshot = Snapshot::compute(
            &model,
            "assist",
            ViewportSize::default(),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(snapshot.nodes.len(), model.features.len());
        assert!(snapshot.omitted.is_empty());
        assert_eq!(snapshot.constraints.len(), model.constraints.len());
        assert_eq!(snapshot.matches, ["trailer-assist"]);
        let kinds: HashSet<_> = snapshot.nodes.iter().map(|node| node.kind.clone()).collect();
        assert!(kinds.contains(&FeatureKind::Other("or".to_string())));
    }

    #[test]
    fn broken_demo_reports_omissions() {
        let model = FeatureModel::from_json(include_str!("../demos/broken.json")).unwrap();

        let snapshot = Snapshot::compute(
            &model,
            "",
            ViewportSize::default(),
            &Config::default(),
        )
        .unwrap();

        let ids: Vec<_> = snapshot.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, ["root", "a"]);
        assert_eq!(snapshot.omitted.len(), 5);
        assert!(snapshot.constraints.is_empty());
    }
}
