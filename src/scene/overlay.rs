//! Curved edges for cross-tree constraints.

use std::collections::HashMap;

use kurbo::{BezPath, Point, QuadBez, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    domain::{Constraint, ConstraintKind},
    scene::PositionedNode,
};

/// Curve shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Smallest distance between the chord midpoint and the control point.
    pub min_offset: f64,
    /// The control point moves away from the chord by `|Δy| / offset_divisor`
    /// when that exceeds `min_offset`.
    pub offset_divisor: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_offset: 80.0,
            offset_divisor: 3.0,
        }
    }
}

/// Which end of a constraint a marker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum End {
    /// The `a` feature.
    Source,
    /// The `b` feature.
    Target,
}

/// A marker drawn where a constraint curve meets a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointMarker<'a> {
    /// Which end this is.
    pub end: End,
    /// Marker position (the node position).
    pub position: Point,
    /// Id of the constraint's `a` feature.
    pub from: &'a str,
    /// Id of the constraint's `b` feature.
    pub to: &'a str,
    /// The constraint kind.
    pub kind: ConstraintKind,
}

/// A drawable constraint edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintCurve<'a> {
    /// Id of the `a` feature.
    pub from: &'a str,
    /// Id of the `b` feature.
    pub to: &'a str,
    /// The constraint kind, for stroke styling.
    pub kind: ConstraintKind,
    /// The curve from `from` to `to`.
    pub curve: QuadBez,
    /// Markers at the source and target ends.
    pub endpoints: [EndpointMarker<'a>; 2],
}

impl ConstraintCurve<'_> {
    /// SVG path data for the curve.
    #[must_use]
    pub fn path_data(&self) -> String {
        let mut path = BezPath::new();
        path.move_to(self.curve.p0);
        path.quad_to(self.curve.p1, self.curve.p2);
        path.to_svg()
    }
}

/// Computes a curve for every constraint whose endpoints are both positioned.
///
/// Constraints naming a feature missing from `positioned` are skipped. Output
/// order follows input order.
#[must_use]
#[instrument(level = "debug", skip_all, fields(constraints = constraints.len()))]
pub fn compute_overlay<'a>(
    constraints: &'a [Constraint],
    positioned: &HashMap<&str, PositionedNode<'_>>,
    config: &OverlayConfig,
) -> Vec<ConstraintCurve<'a>> {
    constraints
        .iter()
        .filter_map(|constraint| {
            let (Some(from), Some(to)) = (
                positioned.get(constraint.a.as_str()),
                positioned.get(constraint.b.as_str()),
            ) else {
                debug!(a = %constraint.a, b = %constraint.b, "skipping constraint with unplaced endpoint");
                return None;
            };
            Some(curve_between(constraint, from.position, to.position, config))
        })
        .collect()
}

fn curve_between<'a>(
    constraint: &'a Constraint,
    from: Point,
    to: Point,
    config: &OverlayConfig,
) -> ConstraintCurve<'a> {
    let chord = to - from;
    let length = chord.hypot();
    let normal = if length > 0.0 {
        Vec2::new(-chord.y, chord.x) / length
    } else {
        Vec2::new(0.0, -1.0)
    };

    let offset = if config.offset_divisor > 0.0 {
        config
            .min_offset
            .max(chord.y.abs() / config.offset_divisor)
    } else {
        config.min_offset
    };
    let control = from.midpoint(to) + normal * offset;

    let marker = |end, position| EndpointMarker {
        end,
        position,
        from: &constraint.a,
        to: &constraint.b,
        kind: constraint.kind,
    };

    ConstraintCurve {
        from: &constraint.a,
        to: &constraint.b,
        kind: constraint.kind,
        curve: QuadBez::new(from, control, to),
        endpoints: [marker(End::Source, from), marker(End::Target, to)],
    }
}

#[cfg(test)]
mod tests {
    use kurbo::ParamCurve;

    use super::*;
    use crate::{
        domain::{Feature, HierarchyNode, build},
        scene::{LayoutConfig, layout},
    };

    fn siblings() -> HierarchyNode {
        build(&[
            Feature::new("root"),
            Feature::new("a").with_parent("root"),
            Feature::new("b").with_parent("root"),
        ])
        .unwrap()
    }

    #[test]
    fn excludes_curve_between_siblings() {
        let root = siblings();
        let layout = layout(Some(&root), &LayoutConfig::with_spacing(100.0, 50.0));
        let constraints = [Constraint::excludes("a", "b")];

        let overlay = compute_overlay(&constraints, &layout.by_id(), &OverlayConfig::default());

        assert_eq!(overlay.len(), 1);
        let curve = &overlay[0];
        assert_eq!(curve.kind, ConstraintKind::Excludes);
        assert_eq!((curve.from, curve.to), ("a", "b"));
        assert_eq!(curve.curve.p0, Point::new(-50.0, 50.0));
        assert_eq!(curve.curve.p2, Point::new(50.0, 50.0));
        // Horizontal chord: the control point sits min_offset below the midpoint.
        assert_eq!(curve.curve.p1, Point::new(0.0, 130.0));
    }

    #[test]
    fn endpoints_carry_pair_and_kind() {
        let root = siblings();
        let layout = layout(Some(&root), &LayoutConfig::with_spacing(100.0, 50.0));
        let constraints = [Constraint::requires("b", "root")];

        let overlay = compute_overlay(&constraints, &layout.by_id(), &OverlayConfig::default());

        let [source, target] = overlay[0].endpoints;
        assert_eq!(source.end, End::Source);
        assert_eq!(source.position, Point::new(50.0, 50.0));
        assert_eq!(target.end, End::Target);
        assert_eq!(target.position, Point::ORIGIN);
        for marker in [source, target] {
            assert_eq!((marker.from, marker.to), ("b", "root"));
            assert_eq!(marker.kind, ConstraintKind::Requires);
        }
    }

    #[test]
    fn offset_grows_with_vertical_distance() {
        let constraint = Constraint::requires("x", "y");
        let config = OverlayConfig::default();

        let curve = curve_between(&constraint, Point::ORIGIN, Point::new(0.0, 600.0), &config);

        // Vertical chord of 600: offset 200 along the perpendicular (-1, 0).
        assert_eq!(curve.curve.p1, Point::new(-200.0, 300.0));
    }

    #[test]
    fn short_edges_keep_minimum_offset() {
        let constraint = Constraint::requires("x", "y");
        let config = OverlayConfig::default();

        let curve = curve_between(&constraint, Point::ORIGIN, Point::new(0.0, 30.0), &config);

        let midpoint = Point::new(0.0, 15.0);
        assert!((curve.curve.p1.distance(midpoint) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn self_constraint_bends_upwards() {
        let constraint = Constraint::requires("x", "x");
        let config = OverlayConfig::default();

        let curve = curve_between(&constraint, Point::new(10.0, 10.0), Point::new(10.0, 10.0), &config);

        assert_eq!(curve.curve.p1, Point::new(10.0, -70.0));
        assert!(curve.curve.eval(0.5).y < 10.0);
    }

    #[test]
    fn dangling_constraints_are_skipped() {
        let root = siblings();
        let layout = layout(Some(&root), &LayoutConfig::default());
        let constraints = [
            Constraint::requires("a", "ghost"),
            Constraint::excludes("phantom", "b"),
            Constraint::requires("b", "a"),
        ];

        let overlay = compute_overlay(&constraints, &layout.by_id(), &OverlayConfig::default());

        assert_eq!(overlay.len(), 1);
        assert_eq!((overlay[0].from, overlay[0].to), ("b", "a"));
    }

    #[test]
    fn output_follows_input_order() {
        let root = siblings();
        let layout = layout(Some(&root), &LayoutConfig::default());
        let constraints = [
            Constraint::requires("b", "a"),
            Constraint::excludes("a", "root"),
            Constraint::requires("root", "b"),
        ];

        let overlay = compute_overlay(&constraints, &layout.by_id(), &OverlayConfig::default());

        let pairs: Vec<_> = overlay.iter().map(|curve| (curve.from, curve.to)).collect();
        assert_eq!(pairs, [("b", "a"), ("a", "root"), ("root", "b")]);
    }

    #[test]
    fn path_data_is_a_quadratic() {
        let constraint = Constraint::requires("x", "y");
        let curve = curve_between(
            &constraint,
            Point::ORIGIN,
            Point::new(100.0, 0.0),
            &OverlayConfig::default(),
        );

        let path = curve.path_data();
        assert!(path.starts_with('M'));
        assert!(path.contains('Q'));
    }
}
