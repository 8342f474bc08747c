//! Coordinate transforms between document, viewport, image, and logical spaces.

use kurbo::{Point, Rect, Size, Vec2};

use crate::surface::Measure;

/// Maps between the four coordinate spaces the selection core works in.
///
/// *Document* coordinates are what the input source reports. *Viewport*
/// coordinates are relative to the positioned container the overlay elements
/// live in. *Image* coordinates are displayed-image pixels (viewport minus the
/// image offset). *Logical* coordinates are the image's declared natural size,
/// which may differ from the displayed size by the scale factors.
///
/// Offsets and scale factors are snapshots of measured geometry. The container
/// or image may move, scroll, or resize at any time, so [`Transform::adjust`]
/// must run before a conversion is trusted; stale offsets are the dominant
/// source of drift bugs.
#[derive(Debug, Clone)]
pub struct Transform {
    /// Container offset in document coordinates (scroll already folded in).
    container_offset: Vec2,
    /// Image content-box offset in document coordinates.
    image_offset: Vec2,
    /// Displayed image size.
    image_size: Size,
    /// Displayed-to-logical scale factors (`displayed / logical`).
    scale_x: f64,
    scale_y: f64,
    /// False until `adjust` has seen a measurable image.
    valid: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            container_offset: Vec2::ZERO,
            image_offset: Vec2::ZERO,
            image_size: Size::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
            valid: false,
        }
    }
}

impl Transform {
    /// Create a transform with no measured geometry yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute offsets, displayed size, and scale factors from fresh
    /// measurements.
    ///
    /// Returns false and marks the transform invalid when the image cannot be
    /// measured or has a zero displayed size (e.g. a hidden ancestor); all
    /// dependent operations are expected to no-op until geometry recovers.
    pub fn adjust(
        &mut self,
        image: Option<Measure>,
        container: Option<Measure>,
        logical_width: Option<f64>,
        logical_height: Option<f64>,
    ) -> bool {
        let Some(image) = image.filter(|m| m.size.width > 0.0 && m.size.height > 0.0) else {
            log::debug!("transform adjust skipped: image not measurable");
            self.valid = false;
            return false;
        };

        // Measured offsets are floats; round them like element positions.
        self.image_offset = Vec2::new(image.offset.x.round(), image.offset.y.round());
        self.image_size = image.size;
        self.container_offset = container
            .map(|c| Vec2::new(c.offset.x.round(), c.offset.y.round()))
            .unwrap_or(Vec2::ZERO);

        self.scale_x = match logical_width {
            Some(w) if w > 0.0 => self.image_size.width / w,
            _ => 1.0,
        };
        self.scale_y = match logical_height {
            Some(h) if h > 0.0 => self.image_size.height / h,
            _ => 1.0,
        };

        self.valid = true;
        true
    }

    /// Whether the last `adjust` produced usable geometry.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Displayed-to-logical scale factors.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Displayed image size.
    pub fn image_size(&self) -> Size {
        self.image_size
    }

    /// Image origin in viewport coordinates.
    pub fn image_origin(&self) -> Point {
        (self.image_offset - self.container_offset).to_point()
    }

    /// Image bounds in viewport coordinates.
    pub fn image_rect_view(&self) -> Rect {
        Rect::from_origin_size(self.image_origin(), self.image_size)
    }

    /// Document point to viewport coordinates.
    pub fn doc_to_viewport(&self, p: Point) -> Point {
        p - self.container_offset
    }

    /// Viewport point to document coordinates.
    pub fn viewport_to_doc(&self, p: Point) -> Point {
        p + self.container_offset
    }

    /// Viewport point to displayed-image coordinates.
    pub fn viewport_to_image(&self, p: Point) -> Point {
        (p - self.image_origin()).to_point()
    }

    /// Displayed-image point to viewport coordinates.
    pub fn image_to_viewport(&self, p: Point) -> Point {
        p + self.image_origin().to_vec2()
    }

    /// Displayed-image point to logical coordinates, rounded to the nearest
    /// integer at the final step.
    pub fn image_to_logical(&self, p: Point) -> Point {
        Point::new((p.x / self.scale_x).round(), (p.y / self.scale_y).round())
    }

    /// Logical point to displayed-image coordinates, rounded.
    pub fn logical_to_image(&self, p: Point) -> Point {
        Point::new((p.x * self.scale_x).round(), (p.y * self.scale_y).round())
    }

    /// Viewport rectangle translated into displayed-image coordinates.
    pub fn viewport_rect_to_image(&self, r: Rect) -> Rect {
        let o = self.image_origin();
        Rect::new(r.x0 - o.x, r.y0 - o.y, r.x1 - o.x, r.y1 - o.y)
    }

    /// Displayed-image rectangle translated into viewport coordinates.
    pub fn image_rect_to_viewport(&self, r: Rect) -> Rect {
        let o = self.image_origin();
        Rect::new(r.x0 + o.x, r.y0 + o.y, r.x1 + o.x, r.y1 + o.y)
    }
}
