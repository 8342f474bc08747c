//! Pointer and keyboard gesture state machine.
//!
//! Four modes: idle, drawing a new selection, resizing, and moving. All state
//! scoped to one continuous pointer gesture lives in an explicit
//! [`InteractionSession`] value, created on pointer-down and discarded on
//! pointer-up, so instances never share interaction state. Every pointer-move
//! recomputes geometry from the absolute pointer position; deltas are never
//! accumulated across events.

use kurbo::{Point, Rect};

use crate::constraint::{self, Constraints};
use crate::events::Notification;
use crate::handles::EdgeSet;
use crate::input::{Key, KeyEvent};
use crate::options::{DEFAULT_KEY_STEP, KeyBinding, Options};
use crate::region::{RegionId, RegionSnapshot};
use crate::region_set::RegionSet;
use crate::surface::CursorStyle;
use crate::transform::Transform;

/// Gesture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Drawing a new selection from an anchor point.
    Drawing,
    /// Resizing the current region by the flagged edges.
    Resizing(EdgeSet),
    /// Moving the current region without changing its size.
    Moving,
}

/// State scoped to one continuous pointer gesture.
///
/// Exists only between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub struct InteractionSession {
    /// The region the gesture operates on.
    pub region: RegionId,
    pub mode: Mode,
    /// Viewport coordinates. Drawing/resizing: the fixed corner. Moving: the
    /// offset from the pointer to the region's top-left at gesture start.
    pub anchor: Point,
    /// Last dragged corner in viewport coordinates (raw; may invert past the
    /// anchor mid-drag).
    pub dragged: Point,
    /// Whether any pointer movement occurred since the gesture began.
    pub moved: bool,
    /// Region state at gesture start, restored on external cancellation.
    pub saved: RegionSnapshot,
}

/// What one input event produced: notifications to queue, a cursor hint, and
/// whether geometry changed enough to warrant a render pass.
#[derive(Debug, Default)]
pub(crate) struct EventOutcome {
    pub notes: Vec<Notification>,
    pub cursor: Option<CursorStyle>,
    pub render: bool,
}

/// The interaction state machine. Holds at most one session at a time; a
/// pointer-down while a session is active is rejected, never interleaved.
#[derive(Debug, Default)]
pub struct Machine {
    session: Option<InteractionSession>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    /// Abort any in-progress gesture, returning the session so the caller
    /// can restore the saved region state.
    pub fn cancel(&mut self) -> Option<InteractionSession> {
        self.session.take()
    }

    pub(crate) fn pointer_down(
        &mut self,
        position: Point,
        transform: &Transform,
        regions: &mut RegionSet,
        defaults: &Options,
    ) -> EventOutcome {
        let mut out = EventOutcome::default();
        if !transform.is_valid() {
            return out;
        }
        if self.session.is_some() {
            log::warn!("pointer down ignored: a gesture is already active");
            return out;
        }
        if !regions.current().options().enabled {
            return out;
        }

        let view = transform.doc_to_viewport(position);

        if let Some(hit) = regions.hit_test(view, transform) {
            // A press on an inactive region swaps activation before the
            // gesture itself is interpreted.
            if hit != regions.current_index() || !regions.current().is_active() {
                if let Some(swap) = regions.activate(hit) {
                    if swap.fire_swap {
                        out.notes.push(Notification::SelectSwap {
                            index: swap.index,
                            previous: swap.previous,
                        });
                    }
                    out.render = true;
                }
            }

            let options = regions.current().options().clone();
            let rect_view = regions.current().rect_view(transform);
            let edges = if options.resizable {
                EdgeSet::detect(view, rect_view, options.resize_margin)
            } else {
                EdgeSet::EMPTY
            };

            if !edges.is_empty() {
                out.cursor = Some(CursorStyle::Resize(edges));
                self.session = Some(InteractionSession {
                    region: regions.current().id(),
                    mode: Mode::Resizing(edges),
                    anchor: edges.anchor_for(rect_view),
                    dragged: edges.dragged_for(rect_view),
                    moved: false,
                    saved: regions.current().snapshot(),
                });
            } else if options.movable {
                out.cursor = Some(CursorStyle::Move);
                self.session = Some(InteractionSession {
                    region: regions.current().id(),
                    mode: Mode::Moving,
                    anchor: Point::new(rect_view.x0 - view.x, rect_view.y0 - view.y),
                    dragged: view,
                    moved: false,
                    saved: regions.current().snapshot(),
                });
            } else if !options.auto_add && !options.persistent {
                // Neither resizable here nor movable: the press falls
                // through to drawing a new selection.
                self.begin_drawing(view, transform, regions, defaults, &mut out);
            }
            return out;
        }

        // Background press: only meaningful inside the image area.
        if !transform.image_rect_view().contains(view) {
            return out;
        }
        if regions.current().options().persistent {
            return out;
        }
        self.begin_drawing(view, transform, regions, defaults, &mut out);
        out
    }

    fn begin_drawing(
        &mut self,
        view: Point,
        transform: &Transform,
        regions: &mut RegionSet,
        defaults: &Options,
        out: &mut EventOutcome,
    ) {
        if regions.current().options().auto_add {
            let added = regions.add(defaults.clone());
            if added.previous_had_area {
                out.notes.push(Notification::SelectAdd {
                    index: added.index,
                    selection: regions.current().selection(transform, false),
                });
                out.render = true;
            }
        }
        // The region stays hidden until the pointer actually moves; a plain
        // click cancels without producing a phantom selection.
        self.session = Some(InteractionSession {
            region: regions.current().id(),
            mode: Mode::Drawing,
            anchor: view,
            dragged: view,
            moved: false,
            saved: regions.current().snapshot(),
        });
        out.cursor = Some(CursorStyle::Crosshair);
    }

    pub(crate) fn pointer_move(
        &mut self,
        position: Point,
        transform: &Transform,
        regions: &mut RegionSet,
    ) -> EventOutcome {
        let mut out = EventOutcome::default();
        if !transform.is_valid() {
            return out;
        }

        let view = transform.doc_to_viewport(position);

        let Some(session) = self.session.as_mut() else {
            out.cursor = Some(hover_cursor(view, transform, regions));
            return out;
        };

        // The gesture's region may have been removed or swapped away by a
        // callback between events; drop the session rather than mutate a
        // different region.
        if regions.current().id() != session.region {
            log::debug!("gesture target vanished; discarding interaction session");
            self.session = None;
            return out;
        }

        match session.mode {
            Mode::Drawing | Mode::Resizing(_) => {
                let options = regions.current().options().clone();
                let constraints = Constraints::from_options(&options, transform);
                let aspect = constraints.aspect_ratio.is_some();

                let mut dragged = view;
                if let Mode::Resizing(edges) = session.mode {
                    // A single-edge drag pins the orthogonal axis to the
                    // stored rectangle unless an aspect ratio couples them.
                    let rect_view = regions.current().rect_view(transform);
                    if !edges.has_horizontal() && !aspect {
                        dragged.x = edges.dragged_for(rect_view).x;
                    }
                    if !edges.has_vertical() && !aspect {
                        dragged.y = edges.dragged_for(rect_view).y;
                    }
                }

                let first_move = !session.moved;
                session.moved = true;

                let (anchor, dragged) = constraint::resolve(session.anchor, dragged, &constraints);
                session.anchor = anchor;
                session.dragged = dragged;

                let rect = transform.viewport_rect_to_image(Rect::from_points(anchor, dragged));
                regions.current_mut().set_rect(rect);

                if first_move && session.mode == Mode::Drawing {
                    regions.current_mut().set_visible(true);
                    out.notes.push(Notification::SelectStart {
                        selection: regions.current().selection(transform, false),
                    });
                }
                out.notes.push(Notification::SelectChange {
                    index: regions.current_index(),
                    selection: regions.current().selection(transform, false),
                });
                out.render = true;
            }
            Mode::Moving => {
                session.moved = true;
                let bounds = transform.image_rect_view();
                let rect_view = regions.current().rect_view(transform);
                let w = rect_view.width();
                let h = rect_view.height();
                // Moving never resizes: clamp the new top-left into the
                // image bounds shrunk by the selection size.
                let x = (session.anchor.x + view.x).clamp(bounds.x0, (bounds.x1 - w).max(bounds.x0));
                let y = (session.anchor.y + view.y).clamp(bounds.y0, (bounds.y1 - h).max(bounds.y0));
                let moved = Rect::new(x, y, x + w, y + h);
                regions
                    .current_mut()
                    .set_rect(transform.viewport_rect_to_image(moved));

                out.notes.push(Notification::SelectChange {
                    index: regions.current_index(),
                    selection: regions.current().selection(transform, false),
                });
                out.render = true;
            }
        }
        out
    }

    pub(crate) fn pointer_up(
        &mut self,
        transform: &Transform,
        regions: &mut RegionSet,
    ) -> EventOutcome {
        let mut out = EventOutcome::default();
        let Some(session) = self.session.take() else {
            return out;
        };
        if regions.current().id() != session.region {
            return out;
        }

        if session.mode == Mode::Drawing && !session.moved {
            // A click with no movement must not create a phantom region:
            // zero the selection at the anchor, hide it, and skip the end
            // notification.
            let anchor = transform.viewport_to_image(session.anchor);
            regions
                .current_mut()
                .set_rect(Rect::new(anchor.x, anchor.y, anchor.x, anchor.y));
            regions.current_mut().set_visible(false);
            out.render = true;
            return out;
        }

        if regions.current().options().auto_hide {
            regions.current_mut().set_visible(false);
        }
        out.notes.push(Notification::SelectEnd {
            index: regions.current_index(),
            selection: regions.current().selection(transform, false),
        });
        out.render = true;
        out
    }

    pub(crate) fn key_down(
        &mut self,
        event: KeyEvent,
        transform: &Transform,
        regions: &mut RegionSet,
    ) -> EventOutcome {
        let mut out = EventOutcome::default();
        if !transform.is_valid() {
            return out;
        }
        if self.session.is_some() {
            // Keyboard input is ignored while a pointer gesture runs.
            return out;
        }
        let options = regions.current().options().clone();
        if !options.enabled || !regions.current().is_active() {
            return out;
        }
        let Some(keys) = options.keys else {
            return out;
        };

        if event.key == Key::Delete {
            if options.key_delete {
                if let Some(outcome) = regions.remove(None) {
                    if let Some(swap) = outcome.swap {
                        if swap.fire_swap {
                            out.notes.push(Notification::SelectSwap {
                                index: swap.index,
                                previous: swap.previous,
                            });
                        }
                    }
                    if let Some(index) = outcome.removed_index {
                        out.notes.push(Notification::SelectRemove { index });
                    }
                    out.render = true;
                }
            }
            return out;
        }

        // The step comes from the first numeric binding whose modifier is
        // held; any held Resize binding switches arrows to resizing.
        let m = event.modifiers;
        let slots = [
            (m.alt, keys.alt),
            (m.ctrl, keys.ctrl),
            (m.shift, keys.shift),
            (true, keys.arrows),
        ];
        let step = slots
            .iter()
            .find_map(|&(held, binding)| match binding {
                Some(KeyBinding::Step(v)) if held => Some(v),
                _ => None,
            })
            .unwrap_or(DEFAULT_KEY_STEP);
        let resize_mode = slots
            .iter()
            .any(|&(held, binding)| held && matches!(binding, Some(KeyBinding::Resize)));

        let rect_view = regions.current().rect_view(transform);

        if resize_mode {
            // Arrows drag the max corner; the min corner anchors.
            let anchor = Point::new(rect_view.x0, rect_view.y0);
            let mut dragged = Point::new(rect_view.x1, rect_view.y1);
            match event.key {
                Key::ArrowLeft => dragged.x = (rect_view.x1 - step).max(anchor.x),
                Key::ArrowRight => dragged.x = rect_view.x1 + step,
                Key::ArrowUp => dragged.y = (rect_view.y1 - step).max(anchor.y),
                Key::ArrowDown => dragged.y = rect_view.y1 + step,
                Key::Delete => return out,
            }
            let constraints = Constraints::from_options(&options, transform);
            let (p1, p2) = constraint::resolve(anchor, dragged, &constraints);
            regions
                .current_mut()
                .set_rect(transform.viewport_rect_to_image(Rect::from_points(p1, p2)));
        } else {
            let bounds = transform.image_rect_view();
            let w = rect_view.width();
            let h = rect_view.height();
            let (mut x, mut y) = (rect_view.x0, rect_view.y0);
            match event.key {
                Key::ArrowLeft => x -= step,
                Key::ArrowRight => x += step,
                Key::ArrowUp => y -= step,
                Key::ArrowDown => y += step,
                Key::Delete => return out,
            }
            x = x.clamp(bounds.x0, (bounds.x1 - w).max(bounds.x0));
            y = y.clamp(bounds.y0, (bounds.y1 - h).max(bounds.y0));
            regions
                .current_mut()
                .set_rect(transform.viewport_rect_to_image(Rect::new(x, y, x + w, y + h)));
        }

        out.notes.push(Notification::SelectChange {
            index: regions.current_index(),
            selection: regions.current().selection(transform, false),
        });
        out.render = true;
        out
    }
}

/// Cursor affordance for an idle pointer position.
fn hover_cursor(view: Point, transform: &Transform, regions: &RegionSet) -> CursorStyle {
    let options = regions.current().options();
    if !options.enabled {
        return CursorStyle::Default;
    }
    match regions.hit_test(view, transform) {
        Some(index) if index == regions.current_index() && regions.current().is_active() => {
            let rect_view = regions.current().rect_view(transform);
            let edges = if options.resizable {
                EdgeSet::detect(view, rect_view, options.resize_margin)
            } else {
                EdgeSet::EMPTY
            };
            if !edges.is_empty() {
                CursorStyle::Resize(edges)
            } else if options.movable {
                CursorStyle::Move
            } else {
                CursorStyle::Pointer
            }
        }
        Some(_) => CursorStyle::Pointer,
        None => {
            if transform.image_rect_view().contains(view) && !options.persistent {
                CursorStyle::Crosshair
            } else {
                CursorStyle::Default
            }
        }
    }
}
