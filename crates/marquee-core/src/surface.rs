//! Render surface abstraction.
//!
//! The core never styles or lays out elements itself; it issues geometry,
//! visibility, and style commands to a [`RenderSurface`] and reads element
//! geometry back through [`RenderSurface::measure`].

use kurbo::{Rect, Size, Vec2};

use crate::handles::EdgeSet;
use crate::region::RegionId;

/// Geometry of a measured element, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    /// Element offset; for the container this must already account for its
    /// scroll position.
    pub offset: Vec2,
    pub size: Size,
}

/// Overlay elements the core addresses on the render surface.
///
/// Region boxes are addressed by region id; the surface is expected to
/// materialize a box lazily on its first geometry command and drop it when a
/// region is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// The image the selection overlay is attached to.
    Image,
    /// The positioned ancestor the overlay elements live in.
    Container,
    /// The backdrop covering the image while any selection is visible.
    Overlay,
    /// One region's selection box.
    Box(RegionId),
}

/// Cursor affordance hints pushed while the pointer hovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Over the image background where a drag would start a selection.
    Crosshair,
    /// Over the active region's body when it can be moved.
    Move,
    /// Over an inactive region, or an active one that cannot be moved.
    Pointer,
    /// Inside the resize margin; the set names the affected edges.
    Resize(EdgeSet),
}

/// Style updates the core pushes to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StyleProps {
    pub cursor: Option<CursorStyle>,
    pub z_index: Option<i32>,
}

/// Rendering backend contract.
///
/// Commands must be applied before the next query: after `set_rectangle` or a
/// visibility call returns, a subsequent `measure` reflects it.
pub trait RenderSurface {
    /// Position and size an element. Rectangles are in viewport coordinates.
    fn set_rectangle(&mut self, element: ElementRef, rect: Rect);

    /// Apply style properties to an element.
    fn set_style(&mut self, element: ElementRef, props: StyleProps);

    fn show(&mut self, element: ElementRef);

    fn hide(&mut self, element: ElementRef);

    /// Current geometry of an element; `None` while it cannot be measured
    /// (e.g. a hidden ancestor).
    fn measure(&self, element: ElementRef) -> Option<Measure>;

    /// Highest z-index beneath the overlay stack, sampled at initialization.
    fn z_baseline(&self) -> i32 {
        0
    }
}
