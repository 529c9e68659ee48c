//! Tidy tree layout.
//!
//! Nodes are placed bottom-up: each subtree keeps a contour (leftmost and
//! rightmost offset per depth, relative to the subtree root) and sibling
//! subtrees are pushed right until their contours no longer come closer than
//! the configured separation. Parents are centred over their first and last
//! child. Every walk is iterative so pathological depths cannot exhaust the
//! stack.

use std::collections::HashMap;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::HierarchyNode;

/// Distance between neighbouring nodes along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    /// Minimum horizontal distance between siblings.
    pub x: f64,
    /// Vertical distance between depths.
    pub y: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self { x: 200.0, y: 120.0 }
    }
}

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Space added around the node positions on every side of the bounding
    /// box.
    pub margin: f64,

    /// Separation between nodes of neighbouring subtrees that are not
    /// siblings, as a multiple of `node_spacing.x`. Values below 1 are
    /// treated as 1.
    pub cousin_separation: f64,

    /// Node spacing.
    pub node_spacing: Spacing,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: Spacing::default(),
            margin: 40.0,
            cousin_separation: 2.0,
        }
    }
}

impl LayoutConfig {
    /// A config with the given spacing, no margin and unit cousin separation.
    #[must_use]
    pub const fn with_spacing(x: f64, y: f64) -> Self {
        Self {
            node_spacing: Spacing { x, y },
            margin: 0.0,
            cousin_separation: 1.0,
        }
    }
}

/// A tree node with its assigned position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedNode<'a> {
    /// The underlying tree node.
    pub node: &'a HierarchyNode,
    /// Id of the parent node, `None` for the root.
    pub parent: Option<&'a str>,
    /// Distance from the root.
    pub depth: usize,
    /// Assigned position. `x` is relative to the root, which sits at 0.
    pub position: Point,
}

impl<'a> PositionedNode<'a> {
    /// The node id.
    #[must_use]
    pub fn id(&self) -> &'a str {
        self.node.id()
    }
}

/// A parent → child tree edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Link<'a> {
    /// Parent id.
    pub source: &'a str,
    /// Child id.
    pub target: &'a str,
}

/// Axis-aligned box around the node positions, grown by the layout margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox(pub Rect);

impl BoundingBox {
    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.0.x0
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.0.y0
    }

    /// Width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.0.width()
    }

    /// Height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.0.height()
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        self.0.center()
    }

    /// Whether either extent is zero.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// The output of [`layout`].
#[derive(Debug, Clone, Default)]
pub struct Layout<'a> {
    /// Every node of the tree, in pre-order.
    pub nodes: Vec<PositionedNode<'a>>,
    /// Every tree edge, in pre-order of the child.
    pub links: Vec<Link<'a>>,
    /// Bounding box of `nodes`.
    pub bounds: BoundingBox,
}

impl<'a> Layout<'a> {
    /// Whether the layout has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Positioned nodes keyed by id.
    #[must_use]
    pub fn by_id(&self) -> HashMap<&'a str, PositionedNode<'a>> {
        self.nodes.iter().map(|node| (node.id(), *node)).collect()
    }
}

/// Per-depth extents of a subtree relative to its root.
///
/// Levels are stored deepest first so that adding a new root level is a push,
/// and `offset` is added lazily so that shifting a whole subtree is O(1).
#[derive(Debug, Default)]
struct Contour {
    levels: Vec<(f64, f64)>,
    offset: f64,
}

impl Contour {
    fn depth(&self) -> usize {
        self.levels.len()
    }

    fn slot(&self, depth: usize) -> usize {
        self.levels.len() - 1 - depth
    }

    fn left(&self, depth: usize) -> f64 {
        self.levels[self.slot(depth)].0 + self.offset
    }

    fn right(&self, depth: usize) -> f64 {
        self.levels[self.slot(depth)].1 + self.offset
    }

    fn set_left(&mut self, depth: usize, x: f64) {
        let slot = self.slot(depth);
        self.levels[slot].0 = x - self.offset;
    }

    fn set_right(&mut self, depth: usize, x: f64) {
        let slot = self.slot(depth);
        self.levels[slot].1 = x - self.offset;
    }

    fn shift(&mut self, by: f64) {
        self.offset += by;
    }

    /// Adds a level above the current top for a root at x = 0.
    fn push_root(&mut self) {
        self.levels.push((-self.offset, -self.offset));
    }

    /// Merges `right` into `self`, keeping the left extents of `self` and the
    /// right extents of `right` on every shared level. Costs O(shared levels).
    fn merge(mut self, mut right: Self) -> Self {
        if right.depth() > self.depth() {
            for depth in 0..self.depth() {
                right.set_left(depth, self.left(depth));
            }
            right
        } else {
            for depth in 0..right.depth() {
                self.set_right(depth, right.right(depth));
            }
            self
        }
    }
}

/// A node flattened into pre-order.
struct Slot<'a> {
    node: &'a HierarchyNode,
    parent: Option<usize>,
    depth: usize,
    children: Vec<usize>,
}

/// Assigns coordinates to every node under `root`.
///
/// Returns an empty layout for `None`. Identical trees (same ids, same order)
/// always produce identical coordinates.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn layout<'a>(root: Option<&'a HierarchyNode>, config: &LayoutConfig) -> Layout<'a> {
    let Some(root) = root else {
        return Layout::default();
    };

    let slots = flatten(root);
    let offsets = relative_offsets(&slots, config);

    let mut nodes: Vec<PositionedNode<'a>> = Vec::with_capacity(slots.len());
    let mut links = Vec::with_capacity(slots.len().saturating_sub(1));
    let mut xs = vec![0.0; slots.len()];

    // Pre-order: parents are always placed before their children.
    for (idx, slot) in slots.iter().enumerate() {
        let parent_x = slot.parent.map_or(0.0, |parent| xs[parent]);
        xs[idx] = parent_x + offsets[idx];

        let parent = slot.parent.map(|parent| slots[parent].node.id());
        if let Some(source) = parent {
            links.push(Link {
                source,
                target: slot.node.id(),
            });
        }
        nodes.push(PositionedNode {
            node: slot.node,
            parent,
            depth: slot.depth,
            position: Point::new(xs[idx], depth_to_y(slot.depth, config.node_spacing.y)),
        });
    }

    let bounds = bounding_box(&nodes, config.margin);
    tracing::debug!(
        nodes = nodes.len(),
        width = bounds.width(),
        height = bounds.height(),
        "layout complete"
    );

    Layout {
        nodes,
        links,
        bounds,
    }
}

#[allow(clippy::cast_precision_loss)]
fn depth_to_y(depth: usize, spacing: f64) -> f64 {
    depth as f64 * spacing
}

fn flatten(root: &HierarchyNode) -> Vec<Slot<'_>> {
    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut stack = vec![(root, None::<usize>, 0)];

    while let Some((node, parent, depth)) = stack.pop() {
        let idx = slots.len();
        if let Some(parent) = parent {
            slots[parent].children.push(idx);
        }
        slots.push(Slot {
            node,
            parent,
            depth,
            children: Vec::with_capacity(node.children.len()),
        });
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, Some(idx), depth + 1)),
        );
    }

    slots
}

/// Horizontal offset of every slot relative to its parent.
fn relative_offsets(slots: &[Slot<'_>], config: &LayoutConfig) -> Vec<f64> {
    let sibling_gap = config.node_spacing.x;
    let cousin_gap = config.node_spacing.x * config.cousin_separation.max(1.0);

    let mut offsets = vec![0.0; slots.len()];
    let mut contours: Vec<Option<Contour>> = (0..slots.len()).map(|_| None).collect();

    // Reverse pre-order visits every child before its parent.
    for idx in (0..slots.len()).rev() {
        let children = &slots[idx].children;
        let mut positions = Vec::with_capacity(children.len());
        let mut merged: Option<Contour> = None;

        for &child in children {
            let mut contour = contours[child].take().unwrap_or_default();
            let position = merged.as_ref().map_or(0.0, |merged| {
                let shared = merged.depth().min(contour.depth());
                (0..shared).fold(f64::NEG_INFINITY, |position, depth| {
                    let gap = if depth == 0 { sibling_gap } else { cousin_gap };
                    position.max(merged.right(depth) + gap - contour.left(depth))
                })
            });
            contour.shift(position);
            positions.push(position);
            merged = Some(match merged {
                Some(merged) => merged.merge(contour),
                None => contour,
            });
        }

        let first = positions.first().copied().unwrap_or_default();
        let last = positions.last().copied().unwrap_or_default();
        let centre = (first + last) / 2.0;
        for (&child, position) in children.iter().zip(positions) {
            offsets[child] = position - centre;
        }

        let mut contour = merged.unwrap_or_default();
        contour.shift(-centre);
        contour.push_root();
        contours[idx] = Some(contour);
    }

    offsets
}

fn bounding_box(nodes: &[PositionedNode<'_>], margin: f64) -> BoundingBox {
    let mut points = nodes.iter().map(|node| node.position);
    let Some(first) = points.next() else {
        return BoundingBox::default();
    };
    let rect = points.fold(Rect::from_points(first, first), |rect, point| {
        rect.union_pt(point)
    });
    BoundingBox(rect.inflate(margin, margin))
}
