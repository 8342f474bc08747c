//! Constrained rectangle resolution.

use std::fmt;
use std::str::FromStr;

use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::options::Options;
use crate::transform::Transform;

/// Error produced when an aspect-ratio string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid aspect ratio {0:?} (expected \"W:H\" with positive sides)")]
pub struct ParseAspectRatioError(pub String);

/// An aspect ratio expressed as `W:H`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    pub w: f64,
    pub h: f64,
}

impl AspectRatio {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Width-over-height factor.
    pub fn ratio(&self) -> f64 {
        self.w / self.h
    }
}

impl FromStr for AspectRatio {
    type Err = ParseAspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAspectRatioError(s.to_string());
        let (w, h) = s.split_once(':').ok_or_else(err)?;
        let w: f64 = w.trim().parse().map_err(|_| err())?;
        let h: f64 = h.trim().parse().map_err(|_| err())?;
        if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
            return Err(err());
        }
        Ok(Self { w, h })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.w, self.h)
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Limits applied to a candidate rectangle, all in viewport pixels.
///
/// Built per gesture frame from the active region's options and the current
/// transform, so min/max sizes (declared in logical pixels) are already
/// converted to displayed pixels and the bounds reflect the measured image.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
    /// Width-over-height factor; `None` disables the aspect fixup.
    pub aspect_ratio: Option<f64>,
    /// Image bounds in viewport coordinates.
    pub bounds: Rect,
}

impl Constraints {
    /// Derive viewport-space constraints from options and measured geometry.
    ///
    /// A `max` dimension of zero means unbounded; max dimensions are clamped
    /// to the displayed image size. Inconsistent configurations (e.g.
    /// `max_width < min_width`) are not validated here; the resolution order
    /// in [`resolve`] gives min-size enforcement priority.
    pub fn from_options(options: &Options, transform: &Transform) -> Self {
        let (sx, sy) = transform.scale();
        let bounds = transform.image_rect_view();

        let max_width = if options.max_width > 0.0 {
            (options.max_width * sx).min(bounds.width()).round()
        } else {
            bounds.width()
        };
        let max_height = if options.max_height > 0.0 {
            (options.max_height * sy).min(bounds.height()).round()
        } else {
            bounds.height()
        };

        Self {
            min_width: (options.min_width * sx).round(),
            min_height: (options.min_height * sy).round(),
            max_width,
            max_height,
            aspect_ratio: options
                .aspect_ratio
                .map(|ar| ar.ratio())
                .filter(|r| r.is_finite() && *r > 0.0),
            bounds,
        }
    }
}

/// Resolve a candidate rectangle, anchored at `p1` with dragged corner `p2`,
/// into the nearest rectangle satisfying `constraints`.
///
/// The corner pair keeps its orientation (the result may still be inverted,
/// `x1 > x2`), so a live gesture can continue from the returned anchor.
/// Resolution order: clamp the anchor, enforce min sizes (extending the
/// dragged edge outward, or pushing the anchor inward at the image boundary),
/// clamp the dragged corner, fix the aspect ratio, then enforce max sizes
/// with aspect re-fixups.
pub fn resolve(p1: Point, p2: Point, c: &Constraints) -> (Point, Point) {
    let left = c.bounds.x0;
    let top = c.bounds.y0;
    let right = c.bounds.x1;
    let bottom = c.bounds.y1;

    let mut x1 = p1.x.clamp(left, right);
    let mut y1 = p1.y.clamp(top, bottom);
    let mut x2 = p2.x;
    let mut y2 = p2.y;

    if (x2 - x1).abs() < c.min_width {
        // Extend the dragged edge away from the anchor to meet the minimum;
        // if that leaves the image, push the anchor inward instead.
        x2 = if x2 < x1 { x1 - c.min_width } else { x1 + c.min_width };
        if x2 < left {
            x1 = left + c.min_width;
        } else if x2 > right {
            x1 = right - c.min_width;
        }
    }

    if (y2 - y1).abs() < c.min_height {
        y2 = if y2 < y1 { y1 - c.min_height } else { y1 + c.min_height };
        if y2 < top {
            y1 = top + c.min_height;
        } else if y2 > bottom {
            y1 = bottom - c.min_height;
        }
    }

    x2 = x2.clamp(left, right);
    y2 = y2.clamp(top, bottom);

    if let Some(ratio) = c.aspect_ratio {
        // Recompute the axis orthogonal to the dominant drag direction first:
        // a candidate taller than the ratio allows derives width from height.
        let x_first = (x2 - x1).abs() < (y2 - y1).abs() * ratio;
        fix_aspect(x1, y1, &mut x2, &mut y2, ratio, c.bounds, x_first);
    }

    if (x2 - x1).abs() > c.max_width {
        x2 = if x2 < x1 { x1 - c.max_width } else { x1 + c.max_width };
        if let Some(ratio) = c.aspect_ratio {
            fix_aspect(x1, y1, &mut x2, &mut y2, ratio, c.bounds, false);
        }
    }

    if (y2 - y1).abs() > c.max_height {
        y2 = if y2 < y1 { y1 - c.max_height } else { y1 + c.max_height };
        if let Some(ratio) = c.aspect_ratio {
            fix_aspect(x1, y1, &mut x2, &mut y2, ratio, c.bounds, true);
        }
    }

    (Point::new(x1, y1), Point::new(x2, y2))
}

/// Adjust the dragged corner to maintain `ratio`, clamped into `bounds`.
///
/// `x_first` recomputes x from the current height before deriving y from the
/// (possibly clamped) width; otherwise y is recomputed first. Corner values
/// round to whole pixels here, which is where the ±1 integer tolerance of the
/// ratio comes from.
fn fix_aspect(x1: f64, y1: f64, x2: &mut f64, y2: &mut f64, ratio: f64, bounds: Rect, x_first: bool) {
    let sign_x = if *x2 > x1 { 1.0 } else { -1.0 };
    let sign_y = if *y2 > y1 { 1.0 } else { -1.0 };

    if x_first {
        *x2 = (x1 + (*y2 - y1).abs() * ratio * sign_x).clamp(bounds.x0, bounds.x1);
        *y2 = (y1 + (*x2 - x1).abs() / ratio * sign_y)
            .clamp(bounds.y0, bounds.y1)
            .round();
        *x2 = x2.round();
    } else {
        *y2 = (y1 + (*x2 - x1).abs() / ratio * sign_y).clamp(bounds.y0, bounds.y1);
        *x2 = (x1 + (*y2 - y1).abs() * ratio * sign_x)
            .clamp(bounds.x0, bounds.x1)
            .round();
        *y2 = y2.round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(bounds: Rect) -> Constraints {
        Constraints {
            min_width: 0.0,
            min_height: 0.0,
            max_width: bounds.width(),
            max_height: bounds.height(),
            aspect_ratio: None,
            bounds,
        }
    }

    #[test]
    fn test_aspect_ratio_parse() {
        let ar: AspectRatio = "2:1".parse().unwrap();
        assert!((ar.ratio() - 2.0).abs() < f64::EPSILON);

        let ar: AspectRatio = "16:9".parse().unwrap();
        assert!((ar.ratio() - 16.0 / 9.0).abs() < f64::EPSILON);

        assert!("".parse::<AspectRatio>().is_err());
        assert!("4".parse::<AspectRatio>().is_err());
        assert!("0:5".parse::<AspectRatio>().is_err());
        assert!("a:b".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_aspect_ratio_display_roundtrip() {
        let ar: AspectRatio = "2:1".parse().unwrap();
        assert_eq!(ar.to_string(), "2:1");
        assert_eq!(ar.to_string().parse::<AspectRatio>().unwrap(), ar);
    }

    #[test]
    fn test_unconstrained_passthrough() {
        let c = constraints(Rect::new(0.0, 0.0, 200.0, 150.0));
        let (p1, p2) = resolve(Point::new(20.0, 20.0), Point::new(80.0, 70.0), &c);
        assert_eq!(p1, Point::new(20.0, 20.0));
        assert_eq!(p2, Point::new(80.0, 70.0));
    }

    #[test]
    fn test_min_size_extends_dragged_edge() {
        let mut c = constraints(Rect::new(0.0, 0.0, 200.0, 200.0));
        c.min_width = 50.0;
        c.min_height = 50.0;

        let (p1, p2) = resolve(Point::new(0.0, 0.0), Point::new(10.0, 10.0), &c);
        assert_eq!(p1, Point::new(0.0, 0.0));
        assert_eq!(p2, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_min_size_inverted_drag() {
        let mut c = constraints(Rect::new(0.0, 0.0, 200.0, 200.0));
        c.min_width = 50.0;

        // Dragging leftwards from x=100; the dragged edge extends left.
        let (p1, p2) = resolve(Point::new(100.0, 0.0), Point::new(90.0, 80.0), &c);
        assert_eq!(p1.x, 100.0);
        assert_eq!(p2.x, 50.0);
    }

    #[test]
    fn test_min_size_pushes_anchor_at_boundary() {
        let mut c = constraints(Rect::new(0.0, 0.0, 200.0, 200.0));
        c.min_width = 50.0;

        // Anchor sits near the right edge and the drag goes further right:
        // the dragged edge would leave the image, so the anchor moves inward.
        let (p1, p2) = resolve(Point::new(190.0, 0.0), Point::new(195.0, 80.0), &c);
        assert_eq!(p1.x, 150.0);
        assert_eq!(p2.x, 200.0);
        assert!((p2.x - p1.x).abs() >= 50.0);
    }

    #[test]
    fn test_dragged_corner_clamped_to_bounds() {
        let c = constraints(Rect::new(0.0, 0.0, 200.0, 150.0));
        let (_, p2) = resolve(Point::new(20.0, 20.0), Point::new(500.0, -40.0), &c);
        assert_eq!(p2, Point::new(200.0, 0.0));
    }

    #[test]
    fn test_max_size_shrinks_toward_anchor() {
        let mut c = constraints(Rect::new(0.0, 0.0, 200.0, 200.0));
        c.max_width = 60.0;
        c.max_height = 40.0;

        let (p1, p2) = resolve(Point::new(10.0, 10.0), Point::new(150.0, 180.0), &c);
        assert_eq!(p1, Point::new(10.0, 10.0));
        assert_eq!(p2, Point::new(70.0, 50.0));
    }

    #[test]
    fn test_min_takes_priority_over_max() {
        let mut c = constraints(Rect::new(0.0, 0.0, 200.0, 200.0));
        c.min_width = 50.0;
        c.max_width = 30.0; // pathological: max < min

        let (p1, p2) = resolve(Point::new(0.0, 0.0), Point::new(10.0, 100.0), &c);
        assert!((p2.x - p1.x).abs() >= 50.0);
    }

    #[test]
    fn test_aspect_ratio_resize() {
        let mut c = constraints(Rect::new(0.0, 0.0, 400.0, 400.0));
        c.aspect_ratio = Some(2.0);

        // Horizontal drag dominates: height derives from width.
        let (p1, p2) = resolve(Point::new(0.0, 0.0), Point::new(100.0, 40.0), &c);
        let w = (p2.x - p1.x).abs();
        let h = (p2.y - p1.y).abs();
        assert!((w - 100.0).abs() < f64::EPSILON);
        assert!((w / h - 2.0).abs() <= 1.0 / h);
    }

    #[test]
    fn test_aspect_ratio_vertical_drag() {
        let mut c = constraints(Rect::new(0.0, 0.0, 400.0, 400.0));
        c.aspect_ratio = Some(2.0);

        // Vertical drag dominates: width derives from height.
        let (p1, p2) = resolve(Point::new(0.0, 0.0), Point::new(30.0, 100.0), &c);
        let w = (p2.x - p1.x).abs();
        let h = (p2.y - p1.y).abs();
        assert!((h - 100.0).abs() <= 1.0);
        assert!((w / h - 2.0).abs() <= 2.0 / h);
    }

    #[test]
    fn test_aspect_ratio_with_max_width() {
        let mut c = constraints(Rect::new(0.0, 0.0, 400.0, 400.0));
        c.aspect_ratio = Some(2.0);
        c.max_width = 80.0;

        let (p1, p2) = resolve(Point::new(0.0, 0.0), Point::new(300.0, 100.0), &c);
        let w = (p2.x - p1.x).abs();
        let h = (p2.y - p1.y).abs();
        assert!(w <= 80.0 + f64::EPSILON);
        assert!((w / h - 2.0).abs() <= 2.0 / h);
    }

    #[test]
    fn test_result_stays_in_bounds() {
        let mut c = constraints(Rect::new(10.0, 10.0, 210.0, 160.0));
        c.min_width = 40.0;
        c.min_height = 40.0;
        c.aspect_ratio = Some(1.5);

        for &(ax, ay, dx, dy) in &[
            (10.0, 10.0, 500.0, 500.0),
            (200.0, 150.0, -500.0, -500.0),
            (100.0, 80.0, 0.0, 0.0),
            (15.0, 155.0, 400.0, -400.0),
        ] {
            let (p1, p2) = resolve(Point::new(ax, ay), Point::new(ax + dx, ay + dy), &c);
            for p in [p1, p2] {
                assert!(p.x >= c.bounds.x0 - f64::EPSILON && p.x <= c.bounds.x1 + f64::EPSILON);
                assert!(p.y >= c.bounds.y0 - f64::EPSILON && p.y <= c.bounds.y1 + f64::EPSILON);
            }
        }
    }
}
