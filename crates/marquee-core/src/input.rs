//! Input source event types.
//!
//! The input source delivers pointer positions already expressed in document
//! coordinates and guarantees in-order delivery within a gesture.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Move { position: Point },
    Up { position: Point, button: MouseButton },
}

impl PointerEvent {
    /// The event's pointer position.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. } => position,
        }
    }
}

/// Keys the selection core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Delete,
}

impl Key {
    /// Whether this is one of the four arrow keys.
    pub fn is_arrow(self) -> bool {
        !matches!(self, Key::Delete)
    }
}

/// Keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_position() {
        let p = Point::new(12.0, 34.0);
        assert_eq!(PointerEvent::Move { position: p }.position(), p);
        assert_eq!(
            PointerEvent::Down {
                position: p,
                button: MouseButton::Left
            }
            .position(),
            p
        );
    }

    #[test]
    fn test_arrow_keys() {
        assert!(Key::ArrowLeft.is_arrow());
        assert!(Key::ArrowDown.is_arrow());
        assert!(!Key::Delete.is_arrow());
    }
}
