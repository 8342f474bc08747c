//! Marquee core library
//!
//! Platform-agnostic selection geometry and interaction logic for rectangular
//! image area selection: coordinate transforms, constrained resize/move, and
//! multi-region bookkeeping, behind render-surface and input-source
//! abstractions.

pub mod constraint;
pub mod events;
pub mod handles;
pub mod input;
pub mod interaction;
pub mod marquee;
pub mod options;
pub mod region;
pub mod region_set;
pub mod surface;
pub mod transform;

pub use constraint::{AspectRatio, Constraints, ParseAspectRatioError};
pub use events::{EventHandler, Notification, dispatch};
pub use handles::{Edge, EdgeSet};
pub use input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{InteractionSession, Machine, Mode};
pub use marquee::Marquee;
pub use options::{HandleMode, KeyBinding, KeyConfig, Options, OptionsError};
pub use region::{Region, RegionId, RegionSnapshot, Selection};
pub use region_set::RegionSet;
pub use surface::{CursorStyle, ElementRef, Measure, RenderSurface, StyleProps};
pub use transform::Transform;
