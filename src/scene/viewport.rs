//! Pan and zoom state for the drawing surface.
//!
//! A [`ViewportState`] maps content coordinates to screen coordinates:
//! `screen = content * scale + translate`. States are plain values; every
//! operation on a [`Viewport`] computes a new state and replaces the current
//! one wholesale. None of them touch the hierarchy or the layout.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::scene::BoundingBox;

/// Size of the drawing surface in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ViewportSize {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre of the surface.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// A pan/zoom transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    /// Horizontal translation in screen units.
    pub translate_x: f64,
    /// Vertical translation in screen units.
    pub translate_y: f64,
    /// Zoom factor.
    pub scale: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportState {
    /// No translation, unit scale.
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    /// The state that fits `bounds` into `size`, shrunk by `shrink` to leave a
    /// border, and centred.
    ///
    /// An axis with zero extent does not constrain the scale; if both do, the
    /// scale is 1. A surface without area gives [`ViewportState::IDENTITY`].
    #[must_use]
    pub fn fit(bounds: &BoundingBox, size: ViewportSize, shrink: f64) -> Self {
        if !size.is_positive() {
            return Self::IDENTITY;
        }

        let fit_x = (bounds.width() > 0.0).then(|| size.width / bounds.width());
        let fit_y = (bounds.height() > 0.0).then(|| size.height / bounds.height());
        let scale = match (fit_x, fit_y) {
            (Some(x), Some(y)) => x.min(y) * shrink,
            (Some(only), None) | (None, Some(only)) => only * shrink,
            (None, None) => 1.0,
        };

        Self::centered(bounds, size, scale)
    }

    /// The state at `scale` that puts the centre of `bounds` at the centre of
    /// the surface.
    #[must_use]
    pub fn centered(bounds: &BoundingBox, size: ViewportSize, scale: f64) -> Self {
        Self::anchored(bounds.center(), size.center(), scale)
    }

    /// The state at `scale` that maps `content` onto `screen`.
    #[must_use]
    pub fn anchored(content: Point, screen: Point, scale: f64) -> Self {
        Self {
            translate_x: content.x.mul_add(-scale, screen.x),
            translate_y: content.y.mul_add(-scale, screen.y),
            scale,
        }
    }

    /// The transform as an affine map from content to screen.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.translate_x, self.translate_y)) * Affine::scale(self.scale)
    }

    /// Maps a content point to the screen.
    #[must_use]
    pub fn to_screen(&self, content: Point) -> Point {
        self.to_affine() * content
    }

    /// Maps a screen point back to content coordinates.
    #[must_use]
    pub fn to_content(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translate_x) / self.scale,
            (screen.y - self.translate_y) / self.scale,
        )
    }

    /// Whether two states agree within `tolerance` on every component.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.translate_x - other.translate_x).abs() <= tolerance
            && (self.translate_y - other.translate_y).abs() <= tolerance
            && (self.scale - other.scale).abs() <= tolerance
    }
}

/// Viewport behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Fraction of the surface the fitted content may occupy.
    pub fit_shrink: f64,
    /// Smallest scale reachable by gestures.
    pub min_scale: f64,
    /// Largest scale reachable by gestures.
    pub max_scale: f64,
    /// Exponential zoom rate per unit of wheel delta.
    pub wheel_sensitivity: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_shrink: 0.8,
            min_scale: 0.1,
            max_scale: 8.0,
            wheel_sensitivity: 0.002,
        }
    }
}

impl ViewportConfig {
    fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale.min(self.max_scale), self.max_scale.max(self.min_scale))
    }
}

/// Pan/zoom state machine over one laid-out model.
///
/// Holds the fitted transform computed once from the layout bounds, and the
/// current transform that gestures replace.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    bounds: BoundingBox,
    size: ViewportSize,
    config: ViewportConfig,
    fit: ViewportState,
    current: ViewportState,
}

impl Viewport {
    /// Starts a viewport at the fitted transform for `bounds`.
    #[must_use]
    pub fn new(bounds: BoundingBox, size: ViewportSize, config: ViewportConfig) -> Self {
        let fit = ViewportState::fit(&bounds, size, config.fit_shrink);
        Self {
            bounds,
            size,
            config,
            fit,
            current: fit,
        }
    }

    /// The current transform.
    #[must_use]
    pub const fn current(&self) -> ViewportState {
        self.current
    }

    /// The fitted transform.
    #[must_use]
    pub const fn fitted(&self) -> ViewportState {
        self.fit
    }

    /// The surface size.
    #[must_use]
    pub const fn size(&self) -> ViewportSize {
        self.size
    }

    /// Replaces the current transform, for example with a state restored by
    /// the caller.
    pub fn set_current(&mut self, state: ViewportState) -> ViewportState {
        self.replace(state)
    }

    /// Returns to the fitted transform.
    pub fn fit_to_view(&mut self) -> ViewportState {
        self.replace(self.fit)
    }

    /// Centres the content at the current scale.
    pub fn align_center(&mut self) -> ViewportState {
        self.replace(ViewportState::centered(
            &self.bounds,
            self.size,
            self.current.scale,
        ))
    }

    /// Restores the fitted scale, keeping the content point at the centre of
    /// the surface where it is.
    pub fn reset_zoom(&mut self) -> ViewportState {
        let screen = self.size.center();
        let content = self.current.to_content(screen);
        self.replace(ViewportState::anchored(content, screen, self.fit.scale))
    }

    /// Moves the content by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) -> ViewportState {
        let delta = Vec2::new(dx, dy);
        self.replace(ViewportState {
            translate_x: self.current.translate_x + delta.x,
            translate_y: self.current.translate_y + delta.y,
            ..self.current
        })
    }

    /// Multiplies the scale by `factor` about a screen-space `anchor`.
    pub fn pinch(&mut self, factor: f64, anchor: Point) -> ViewportState {
        self.zoom_about(self.current.scale * factor, anchor)
    }

    /// Applies a wheel event.
    ///
    /// Plain wheel scrolling is left to the page: the scale only changes when
    /// `modifier` is held. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f64, anchor: Point, modifier: bool) -> ViewportState {
        if !modifier {
            trace!("ignoring wheel without modifier");
            return self.current;
        }
        let factor = (-delta_y * self.config.wheel_sensitivity).exp2();
        self.zoom_about(self.current.scale * factor, anchor)
    }

    fn zoom_about(&mut self, scale: f64, anchor: Point) -> ViewportState {
        let content = self.current.to_content(anchor);
        let scale = self.config.clamp(scale);
        self.replace(ViewportState::anchored(content, anchor, scale))
    }

    fn replace(&mut self, state: ViewportState) -> ViewportState {
        self.current = state;
        state
    }
}
