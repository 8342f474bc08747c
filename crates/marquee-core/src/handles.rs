//! Resize-edge flags and edge hit detection.

use std::fmt;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// One edge of a selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    North,
    South,
    East,
    West,
}

impl Edge {
    const fn bit(self) -> u8 {
        match self {
            Edge::North => 1,
            Edge::South => 2,
            Edge::West => 4,
            Edge::East => 8,
        }
    }
}

/// A combinable set of [`Edge`] flags identifying which edges a gesture drags.
///
/// All resize logic (anchor corner selection, per-axis gating, aspect fixup
/// direction) depends on flag membership, so edges are kept as a small bitset
/// rather than a direction string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EdgeSet(u8);

impl EdgeSet {
    /// No edges; a gesture with an empty set drags both free corners.
    pub const EMPTY: EdgeSet = EdgeSet(0);

    /// Add an edge to the set.
    pub fn insert(&mut self, edge: Edge) {
        self.0 |= edge.bit();
    }

    /// Check edge membership.
    pub fn contains(self, edge: Edge) -> bool {
        self.0 & edge.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the set drags the x axis.
    pub fn has_horizontal(self) -> bool {
        self.contains(Edge::East) || self.contains(Edge::West)
    }

    /// Whether the set drags the y axis.
    pub fn has_vertical(self) -> bool {
        self.contains(Edge::North) || self.contains(Edge::South)
    }

    /// Detect which edges of `rect` lie within `margin` of `point`.
    ///
    /// Each axis is checked independently, so corners yield two flags.
    /// `point` is expected to be inside `rect`.
    pub fn detect(point: Point, rect: Rect, margin: f64) -> EdgeSet {
        let x = point.x - rect.x0;
        let y = point.y - rect.y0;
        let mut edges = EdgeSet::EMPTY;

        if y <= margin {
            edges.insert(Edge::North);
        } else if y >= rect.height() - margin {
            edges.insert(Edge::South);
        }
        if x <= margin {
            edges.insert(Edge::West);
        } else if x >= rect.width() - margin {
            edges.insert(Edge::East);
        }

        edges
    }

    /// The corner of `rect` that stays fixed while these edges are dragged.
    ///
    /// Dragging a west or north edge anchors the opposite (east/south) side;
    /// an axis with no flag anchors at the rectangle's min corner.
    pub fn anchor_for(self, rect: Rect) -> Point {
        Point::new(
            if self.contains(Edge::West) { rect.x1 } else { rect.x0 },
            if self.contains(Edge::North) { rect.y1 } else { rect.y0 },
        )
    }

    /// The corner of `rect` that moves while these edges are dragged
    /// (the opposite of [`EdgeSet::anchor_for`]).
    pub fn dragged_for(self, rect: Rect) -> Point {
        Point::new(
            if self.contains(Edge::West) { rect.x0 } else { rect.x1 },
            if self.contains(Edge::North) { rect.y0 } else { rect.y1 },
        )
    }
}

impl From<Edge> for EdgeSet {
    fn from(edge: Edge) -> Self {
        EdgeSet(edge.bit())
    }
}

impl fmt::Display for EdgeSet {
    /// Compass-style name ("n", "se", ...), matching cursor naming.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Edge::North) {
            write!(f, "n")?;
        } else if self.contains(Edge::South) {
            write!(f, "s")?;
        }
        if self.contains(Edge::West) {
            write!(f, "w")?;
        } else if self.contains(Edge::East) {
            write!(f, "e")?;
        }
        Ok(())
    }
}
