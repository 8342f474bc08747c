//! One rectangular selection region and its persisted state.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::options::Options;
use crate::transform::Transform;

/// Unique region identifier.
pub type RegionId = Uuid;

/// A selection in logical image coordinates: corners normalized
/// (`x1 <= x2`, `y1 <= y2`) and rounded to whole pixels.
///
/// Width and height are recomputed from the rounded corners, never carried
/// separately, so they cannot drift from the corner values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub width: i32,
    pub height: i32,
    /// Z-order index reported for the owning region's box.
    pub z_index: i32,
}

impl Selection {
    /// Whether the selection covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Everything needed to restore a region's interaction state, captured before
/// a gesture begins or another region takes over the interaction context.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    pub rect: Rect,
    pub visible: bool,
    pub options: Options,
}

/// One selection rectangle with its per-region option overrides.
///
/// The rectangle is persisted as a normalized `Rect` in displayed-image
/// pixels; viewport and logical renditions are derived through the current
/// [`Transform`] so a moved or rescaled image never invalidates stored state.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    /// Normalized selection in displayed-image coordinates.
    rect: Rect,
    active: bool,
    visible: bool,
    z_index: i32,
    options: Options,
}

impl Region {
    /// Create a zero-area region with the given options and box z-index.
    pub fn new(options: Options, z_index: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            rect: Rect::ZERO,
            active: false,
            visible: false,
            z_index,
            options,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// The stored rectangle in displayed-image coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// The stored rectangle in viewport coordinates.
    pub fn rect_view(&self, transform: &Transform) -> Rect {
        transform.image_rect_to_viewport(self.rect)
    }

    /// Whether the stored rectangle covers any area.
    pub fn has_area(&self) -> bool {
        self.rect.width() > 0.0 && self.rect.height() > 0.0
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    /// The selection in logical image coordinates (or displayed-image
    /// coordinates when `unscaled`), rounded at the corners.
    pub fn selection(&self, transform: &Transform, unscaled: bool) -> Selection {
        let (sx, sy) = if unscaled { (1.0, 1.0) } else { transform.scale() };
        let x1 = (self.rect.x0 / sx).round() as i32;
        let y1 = (self.rect.y0 / sy).round() as i32;
        let x2 = (self.rect.x1 / sx).round() as i32;
        let y2 = (self.rect.y1 / sy).round() as i32;
        Selection {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
            z_index: self.z_index - 2,
        }
    }

    /// Store a selection given in logical image coordinates (or
    /// displayed-image coordinates when `unscaled`). Corners are normalized;
    /// no render side effects.
    pub fn set_selection(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        transform: &Transform,
        unscaled: bool,
    ) {
        let (sx, sy) = if unscaled { (1.0, 1.0) } else { transform.scale() };
        let p1 = Point::new((x1 * sx).round(), (y1 * sy).round());
        let p2 = Point::new((x2 * sx).round(), (y2 * sy).round());
        self.rect = Rect::from_points(p1, p2);
    }

    /// Capture the state a later [`Region::restore`] needs.
    pub fn snapshot(&self) -> RegionSnapshot {
        RegionSnapshot {
            rect: self.rect,
            visible: self.visible,
            options: self.options.clone(),
        }
    }

    /// Restore previously captured state, discarding any partial mutation.
    pub fn restore(&mut self, snapshot: RegionSnapshot) {
        self.rect = snapshot.rect;
        self.visible = snapshot.visible;
        self.options = snapshot.options;
    }
}
