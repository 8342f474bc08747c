//! Top-level image area selection instance.

use kurbo::{Point, Rect};

use crate::constraint::{self, Constraints};
use crate::events::Notification;
use crate::input::{KeyEvent, MouseButton, PointerEvent};
use crate::interaction::{EventOutcome, Machine};
use crate::options::Options;
use crate::region::{RegionId, Selection};
use crate::region_set::RegionSet;
use crate::surface::{ElementRef, RenderSurface, StyleProps};
use crate::transform::Transform;

/// A selection mutation requested before geometry was first measurable,
/// applied on the first valid update.
#[derive(Debug, Clone, Copy)]
struct PendingSelection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    unscaled: bool,
}

/// One image's selection overlay: the region set, the coordinate transform,
/// and the interaction state machine, wired to a render surface.
///
/// Instances are fully isolated from each other; the only shared input is the
/// surface's z baseline sampled at construction.
///
/// Mutating calls queue [`Notification`]s instead of invoking callbacks;
/// drain them with [`Marquee::drain_events`] once a call returns, optionally
/// fanning them out through [`crate::events::dispatch`].
#[derive(Debug)]
pub struct Marquee<S: RenderSurface> {
    surface: S,
    transform: Transform,
    regions: RegionSet,
    machine: Machine,
    /// Construction-time options snapshot used to seed new regions.
    defaults: Options,
    events: Vec<Notification>,
    /// Whether `Init` has fired.
    initialized: bool,
    pending_selection: Option<PendingSelection>,
    /// Region boxes last pushed to the surface, so removed regions' boxes
    /// get hidden on the next render.
    known_boxes: Vec<RegionId>,
}

impl<S: RenderSurface> Marquee<S> {
    /// Create an instance and attempt the first geometry computation.
    ///
    /// `Init` is queued once the first `update` sees measurable geometry,
    /// which may be immediately or on a later call.
    pub fn new(surface: S, options: Options) -> Self {
        let z_baseline = surface.z_baseline();
        let defaults = options.clone();
        let show = options.show;
        let mut instance = Self {
            transform: Transform::new(),
            regions: RegionSet::new(options, z_baseline),
            machine: Machine::new(),
            defaults,
            events: Vec::new(),
            initialized: false,
            pending_selection: None,
            known_boxes: Vec::new(),
            surface,
        };
        if show {
            instance.regions.current_mut().set_visible(true);
        }
        instance.update();
        instance
    }

    /// The render surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Number of regions in the set.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_gesture_active(&self) -> bool {
        self.machine.is_active()
    }

    /// Take all queued notifications, in emission order.
    pub fn drain_events(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }

    /// Feed one input source pointer event through the state machine.
    pub fn pointer_event(&mut self, event: PointerEvent) {
        self.adjust();
        let outcome = match event {
            PointerEvent::Down { position, button } => {
                if button != MouseButton::Left {
                    return;
                }
                self.machine
                    .pointer_down(position, &self.transform, &mut self.regions, &self.defaults)
            }
            PointerEvent::Move { position } => {
                self.machine
                    .pointer_move(position, &self.transform, &mut self.regions)
            }
            PointerEvent::Up { button, .. } => {
                if button != MouseButton::Left {
                    return;
                }
                self.machine.pointer_up(&self.transform, &mut self.regions)
            }
        };
        self.apply(outcome);
    }

    /// Feed one input source key event through the state machine.
    pub fn key_event(&mut self, event: KeyEvent) {
        self.adjust();
        let outcome = self
            .machine
            .key_down(event, &self.transform, &mut self.regions);
        self.apply(outcome);
    }

    /// The current region's selection, in logical image coordinates unless
    /// `unscaled`.
    pub fn get_selection(&self, unscaled: bool) -> Selection {
        self.regions.current().selection(&self.transform, unscaled)
    }

    /// All regions' selections in creation order.
    pub fn get_selections(&self, unscaled: bool) -> Vec<Selection> {
        self.regions.selections(&self.transform, unscaled)
    }

    /// Store a selection for the current region, given in logical image
    /// coordinates unless `unscaled`. Rendering happens on the next
    /// [`Marquee::update`]. Before geometry is first valid the request is
    /// queued and applied when it becomes so.
    pub fn set_selection(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, unscaled: bool) {
        if !self.initialized || !self.transform.is_valid() {
            self.pending_selection = Some(PendingSelection {
                x1,
                y1,
                x2,
                y2,
                unscaled,
            });
            return;
        }
        self.apply_selection(PendingSelection {
            x1,
            y1,
            x2,
            y2,
            unscaled,
        });
    }

    /// Cancel the in-progress gesture, restoring the region state captured
    /// when it began; with no gesture active, zero the current selection at
    /// its own corner and hide it. Neither path emits notifications.
    pub fn cancel_selection(&mut self) {
        if let Some(session) = self.machine.cancel() {
            if self.regions.current().id() == session.region {
                self.regions.current_mut().restore(session.saved);
            }
        } else {
            let rect = self.regions.current().rect();
            self.regions
                .current_mut()
                .set_rect(Rect::new(rect.x0, rect.y0, rect.x0, rect.y0));
            self.regions.current_mut().set_visible(false);
        }
        self.render();
    }

    /// Add a region seeded from the construction defaults (or `options`) and
    /// make it current. The previous region's state is persisted first.
    pub fn add_selection(&mut self, options: Option<Options>) -> RegionId {
        let options = options.unwrap_or_else(|| self.defaults.clone());
        let outcome = self.regions.add(options);
        self.render();
        outcome.id
    }

    /// Remove the region at `index` (default: the current one). Returns
    /// false for an out-of-range index. The last remaining region is zeroed
    /// and hidden rather than destroyed.
    pub fn remove_selection(&mut self, index: Option<usize>) -> bool {
        let Some(outcome) = self.regions.remove(index) else {
            return false;
        };
        if let Some(swap) = outcome.swap {
            if swap.fire_swap {
                self.events.push(Notification::SelectSwap {
                    index: swap.index,
                    previous: swap.previous,
                });
            }
        }
        if let Some(removed) = outcome.removed_index {
            self.events.push(Notification::SelectRemove { index: removed });
        }
        self.update();
        true
    }

    /// Swap activation to the region at `index`, persisting the outgoing
    /// region's state first. Returns false for an out-of-range index.
    /// Geometry is recomputed and rendered before returning.
    pub fn activate_selection(&mut self, index: usize) -> bool {
        let Some(swap) = self.regions.activate(index) else {
            return false;
        };
        if swap.fire_swap {
            self.events.push(Notification::SelectSwap {
                index: swap.index,
                previous: swap.previous,
            });
        }
        self.update();
        true
    }

    /// Clear the current region's active flag; a later pointer-down on it
    /// (or `activate_selection`) re-activates.
    pub fn deactivate_selection(&mut self) {
        self.regions.deactivate_current();
    }

    /// Raise the current region's box one z step.
    pub fn move_to_front(&mut self) {
        self.regions.move_to_front();
        self.push_current_z();
    }

    /// Lower the current region's box one z step, never below the baseline
    /// floor.
    pub fn move_to_back(&mut self) {
        self.regions.move_to_back();
        self.push_current_z();
    }

    /// Replace the current region's options. `show: true` also reveals the
    /// box. Triggers a full geometry recompute.
    pub fn set_options(&mut self, options: Options) {
        let show = options.show;
        self.regions.current_mut().set_options(options);
        if show {
            self.regions.current_mut().set_visible(true);
        }
        self.update();
    }

    /// The current region's options.
    pub fn get_options(&self) -> &Options {
        self.regions.current().options()
    }

    /// Force a geometry recompute and render: re-measure offsets and scale
    /// factors, re-clamp the selection if the image shrank, and push element
    /// geometry to the surface. Idempotent; a no-op while the image cannot
    /// be measured.
    pub fn update(&mut self) {
        if !self.adjust() {
            return;
        }
        if let Some(pending) = self.pending_selection.take() {
            self.apply_selection(pending);
        }
        self.reclamp();
        self.render();
        if !self.initialized {
            self.initialized = true;
            self.events.push(Notification::Init {
                selection: self.get_selection(false),
            });
        }
    }

    fn apply_selection(&mut self, p: PendingSelection) {
        self.regions
            .current_mut()
            .set_selection(p.x1, p.y1, p.x2, p.y2, &self.transform, p.unscaled);
        let visible = self.regions.current().has_area();
        self.regions.current_mut().set_visible(visible);
    }

    /// Re-measure the image and container and refresh the transform.
    fn adjust(&mut self) -> bool {
        let image = self.surface.measure(ElementRef::Image);
        let container = self.surface.measure(ElementRef::Container);
        let options = self.regions.current().options();
        let (lw, lh) = (options.image_width, options.image_height);
        self.transform.adjust(image, container, lw, lh)
    }

    /// Pull the current selection back inside the image if a geometry change
    /// left it out of bounds.
    fn reclamp(&mut self) {
        let size = self.transform.image_size();
        let rect = self.regions.current().rect();
        if rect.x1 <= size.width && rect.y1 <= size.height {
            return;
        }
        let options = self.regions.current().options().clone();
        let constraints = Constraints::from_options(&options, &self.transform);
        let anchor = self
            .transform
            .image_to_viewport(Point::new(rect.x0, rect.y0));
        let dragged = self
            .transform
            .image_to_viewport(Point::new(rect.x1, rect.y1));
        let (p1, p2) = constraint::resolve(anchor, dragged, &constraints);
        let clamped = self
            .transform
            .viewport_rect_to_image(Rect::from_points(p1, p2));
        if clamped != rect {
            self.regions.current_mut().set_rect(clamped);
            self.events.push(Notification::SelectChange {
                index: self.regions.current_index(),
                selection: self.regions.current().selection(&self.transform, false),
            });
        }
    }

    /// Push all element geometry, stacking, and visibility to the surface.
    fn render(&mut self) {
        if !self.transform.is_valid() {
            return;
        }
        let image_rect = self.transform.image_rect_view();
        self.surface.set_rectangle(ElementRef::Overlay, image_rect);

        let current_ids: Vec<RegionId> = self.regions.iter().map(|r| r.id()).collect();
        for id in self.known_boxes.iter().copied() {
            if !current_ids.contains(&id) {
                self.surface.hide(ElementRef::Box(id));
            }
        }
        self.known_boxes = current_ids;

        for region in self.regions.iter() {
            let element = ElementRef::Box(region.id());
            self.surface
                .set_rectangle(element, region.rect_view(&self.transform));
            self.surface.set_style(
                element,
                StyleProps {
                    cursor: None,
                    z_index: Some(region.z_index()),
                },
            );
            if region.is_visible() {
                self.surface.show(element);
            } else {
                self.surface.hide(element);
            }
        }

        // The backdrop stays up while any region shows a nonzero selection.
        if self.regions.any_visible_area() {
            self.surface.show(ElementRef::Overlay);
        } else {
            self.surface.hide(ElementRef::Overlay);
        }
    }

    fn push_current_z(&mut self) {
        let element = ElementRef::Box(self.regions.current().id());
        let z = self.regions.current().z_index();
        self.surface.set_style(
            element,
            StyleProps {
                cursor: None,
                z_index: Some(z),
            },
        );
    }

    fn apply(&mut self, outcome: EventOutcome) {
        if let Some(cursor) = outcome.cursor {
            self.surface.set_style(
                ElementRef::Container,
                StyleProps {
                    cursor: Some(cursor),
                    z_index: None,
                },
            );
        }
        self.events.extend(outcome.notes);
        if outcome.render {
            self.render();
        }
    }
}
