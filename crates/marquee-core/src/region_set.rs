//! Ordered collection of regions with one current member.

use kurbo::{Point, Rect};

use crate::options::Options;
use crate::region::{Region, RegionId, Selection};
use crate::transform::Transform;

/// Result of adding a region.
#[derive(Debug, Clone, Copy)]
pub struct AddOutcome {
    pub id: RegionId,
    pub index: usize,
    /// False when the zero-area current region was reused instead of a new
    /// region being appended.
    pub previous_had_area: bool,
}

/// Result of an activation swap.
#[derive(Debug, Clone, Copy)]
pub struct SwapOutcome {
    pub previous: usize,
    pub index: usize,
    /// Swaps between zero-area regions stay silent.
    pub fire_swap: bool,
}

/// Result of a removal.
#[derive(Debug, Clone, Copy)]
pub struct RemoveOutcome {
    /// Activation swap performed before removing the current region.
    pub swap: Option<SwapOutcome>,
    /// Index removed from the set; `None` when the last region was zeroed
    /// and hidden instead of destroyed.
    pub removed_index: Option<usize>,
}

/// The ordered sequence of regions for one image instance.
///
/// Insertion order is creation order; visual stacking is governed by each
/// region's z-index. The set is never empty once initialized, and `current`
/// always points at a member (whose `active` flag may be cleared by an
/// explicit deactivation).
#[derive(Debug, Clone)]
pub struct RegionSet {
    regions: Vec<Region>,
    current: usize,
    z_baseline: i32,
}

impl RegionSet {
    /// Create a set with one active zero-area region.
    pub fn new(options: Options, z_baseline: i32) -> Self {
        let mut first = Region::new(options, z_baseline + 3);
        first.activate();
        Self {
            regions: vec![first],
            current: 0,
            z_baseline,
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Region {
        &self.regions[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Region {
        &mut self.regions[self.current]
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Whether any region is showing a nonzero selection; drives the overlay
    /// backdrop visibility.
    pub fn any_visible_area(&self) -> bool {
        self.regions.iter().any(|r| r.is_visible() && r.has_area())
    }

    /// Topmost visible region under `point` (viewport coordinates).
    pub fn hit_test(&self, point: Point, transform: &Transform) -> Option<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_visible() && r.rect_view(transform).contains(point))
            .max_by_key(|(_, r)| r.z_index())
            .map(|(i, _)| i)
    }

    /// Add a region seeded with `options` and make it current.
    ///
    /// A nonzero current region keeps its state and is deactivated first — an
    /// in-progress selection is never silently discarded. A zero-area current
    /// region is reused instead of stacking an empty one.
    pub fn add(&mut self, options: Options) -> AddOutcome {
        if self.regions[self.current].has_area() {
            self.regions[self.current].deactivate();
            let mut region = Region::new(options, self.z_baseline + 3);
            region.activate();
            let id = region.id();
            self.regions.push(region);
            self.current = self.regions.len() - 1;
            AddOutcome {
                id,
                index: self.current,
                previous_had_area: true,
            }
        } else {
            let region = &mut self.regions[self.current];
            region.set_options(options);
            region.activate();
            AddOutcome {
                id: region.id(),
                index: self.current,
                previous_had_area: false,
            }
        }
    }

    /// Swap activation to the region at `index`.
    ///
    /// The outgoing region is persisted and deactivated when it has area; a
    /// zero-area outgoing region is dropped from the set entirely. Returns
    /// `None` for an out-of-range index.
    pub fn activate(&mut self, index: usize) -> Option<SwapOutcome> {
        if index >= self.regions.len() {
            return None;
        }

        let previous = self.current;
        if index == previous {
            // Reactivation of the current region (e.g. after an explicit
            // deactivation) is not a swap.
            let was_active = self.regions[index].is_active();
            self.regions[index].activate();
            return Some(SwapOutcome {
                previous,
                index,
                fire_swap: !was_active && self.regions[index].has_area(),
            });
        }

        let previous_had_area = self.regions[previous].has_area();
        let index = if previous_had_area {
            self.regions[previous].deactivate();
            index
        } else {
            self.regions.remove(previous);
            if index > previous { index - 1 } else { index }
        };

        self.regions[index].activate();
        self.current = index;
        let fire_swap = previous_had_area || self.regions[index].has_area();
        Some(SwapOutcome {
            previous,
            index,
            fire_swap,
        })
    }

    /// Remove the region at `index` (default: the current one).
    ///
    /// Removing the current region first swaps activation to a neighbor so a
    /// region is always current while any exist. The last remaining region is
    /// zeroed and hidden rather than destroyed. Returns `None` for an
    /// out-of-range index.
    pub fn remove(&mut self, index: Option<usize>) -> Option<RemoveOutcome> {
        let current = self.current;
        let index = index.unwrap_or(current);
        if index >= self.regions.len() {
            return None;
        }

        if self.regions.len() > 1 {
            let mut swap = None;
            if index == current {
                let target = if index == 0 { 1 } else { index - 1 };
                let had_area = self.regions[current].has_area();
                swap = self.activate(target);
                if had_area {
                    // activate() persisted the outgoing region; drop it now.
                    self.regions.remove(index);
                    if self.current > index {
                        self.current -= 1;
                    }
                }
                // A zero-area outgoing region was already dropped by activate().
            } else {
                self.regions.remove(index);
                if self.current > index {
                    self.current -= 1;
                }
            }
            Some(RemoveOutcome {
                swap,
                removed_index: Some(index),
            })
        } else {
            let region = &mut self.regions[0];
            region.set_rect(Rect::ZERO);
            region.set_visible(false);
            Some(RemoveOutcome {
                swap: None,
                removed_index: None,
            })
        }
    }

    /// Clear the current region's active flag without choosing a successor.
    pub fn deactivate_current(&mut self) {
        self.regions[self.current].deactivate();
    }

    /// Raise the current region's box one step.
    pub fn move_to_front(&mut self) {
        let z = self.regions[self.current].z_index();
        self.regions[self.current].set_z_index(z + 1);
    }

    /// Lower the current region's box one step, never below the baseline
    /// floor that keeps it above unrelated content.
    pub fn move_to_back(&mut self) {
        let floor = self.z_baseline + 2;
        let z = self.regions[self.current].z_index() - 1;
        self.regions[self.current].set_z_index(z.max(floor));
    }

    /// All regions' selections in creation order.
    pub fn selections(&self, transform: &Transform, unscaled: bool) -> Vec<Selection> {
        self.regions
            .iter()
            .map(|r| r.selection(transform, unscaled))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Measure;
    use kurbo::{Size, Vec2};

    fn transform() -> Transform {
        let mut t = Transform::new();
        t.adjust(
            Some(Measure {
                offset: Vec2::ZERO,
                size: Size::new(200.0, 150.0),
            }),
            None,
            None,
            None,
        );
        t
    }

    fn set_with_area(rect: Rect) -> RegionSet {
        let mut set = RegionSet::new(Options::default(), 0);
        set.current_mut().set_rect(rect);
        set.current_mut().set_visible(true);
        set
    }

    #[test]
    fn test_initial_set_has_one_active_region() {
        let set = RegionSet::new(Options::default(), 0);
        assert_eq!(set.len(), 1);
        assert!(set.current().is_active());
        assert!(!set.current().has_area());
    }

    #[test]
    fn test_add_persists_previous_region() {
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        let first_id = set.current().id();

        let outcome = set.add(Options::default());
        assert!(outcome.previous_had_area);
        assert_eq!(set.len(), 2);
        assert_eq!(set.current_index(), 1);
        assert!(set.current().is_active());
        assert!(!set.current().has_area());

        // The first region kept its rectangle and lost activation.
        let first = set.get(0).unwrap();
        assert_eq!(first.id(), first_id);
        assert!(!first.is_active());
        assert_eq!(first.rect(), Rect::new(10.0, 10.0, 60.0, 60.0));
    }

    #[test]
    fn test_add_reuses_zero_area_region() {
        let mut set = RegionSet::new(Options::default(), 0);
        let id = set.current().id();

        let outcome = set.add(Options::default());
        assert!(!outcome.previous_had_area);
        assert_eq!(outcome.id, id);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_activate_swaps_and_persists() {
        let t = transform();
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        set.add(Options::default());
        set.current_mut().set_rect(Rect::new(80.0, 80.0, 120.0, 120.0));
        set.current_mut().set_visible(true);

        let outcome = set.activate(0).unwrap();
        assert_eq!(outcome.previous, 1);
        assert_eq!(outcome.index, 0);
        assert!(outcome.fire_swap);

        let s = set.current().selection(&t, false);
        assert_eq!((s.x1, s.y1, s.x2, s.y2), (10, 10, 60, 60));
        // The other region's state is untouched.
        let other = set.selections(&t, false)[1];
        assert_eq!((other.x1, other.y1), (80, 80));
    }

    #[test]
    fn test_activate_drops_unused_region() {
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        set.add(Options::default());
        assert_eq!(set.len(), 2);

        // Current region is zero-area; swapping away discards it.
        let outcome = set.activate(0).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(outcome.index, 0);
        assert_eq!(set.current_index(), 0);
    }

    #[test]
    fn test_activate_out_of_range() {
        let mut set = RegionSet::new(Options::default(), 0);
        assert!(set.activate(3).is_none());
    }

    #[test]
    fn test_remove_swaps_to_neighbor() {
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        set.add(Options::default());
        set.current_mut().set_rect(Rect::new(80.0, 80.0, 120.0, 120.0));
        set.add(Options::default());
        set.current_mut().set_rect(Rect::new(130.0, 10.0, 170.0, 50.0));
        assert_eq!(set.len(), 3);
        assert_eq!(set.current_index(), 2);

        let outcome = set.remove(None).unwrap();
        assert_eq!(outcome.removed_index, Some(2));
        assert_eq!(set.len(), 2);
        // Activation moved to the neighbor below.
        assert_eq!(set.current_index(), 1);
        assert!(set.current().is_active());
    }

    #[test]
    fn test_remove_index_zero_swaps_to_one() {
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        set.add(Options::default());
        set.current_mut().set_rect(Rect::new(80.0, 80.0, 120.0, 120.0));
        set.activate(0).unwrap();

        let outcome = set.remove(Some(0)).unwrap();
        assert_eq!(outcome.removed_index, Some(0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.current_index(), 0);
        assert_eq!(set.current().rect(), Rect::new(80.0, 80.0, 120.0, 120.0));
    }

    #[test]
    fn test_remove_last_region_is_cleared_not_destroyed() {
        let mut set = set_with_area(Rect::new(10.0, 10.0, 60.0, 60.0));
        let outcome = set.remove(None).unwrap();
        assert_eq!(outcome.removed_index, None);
        assert_eq!(set.len(), 1);
        assert!(!set.current().has_area());
        assert!(!set.current().is_visible());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut set = RegionSet::new(Options::default(), 0);
        assert!(set.remove(Some(5)).is_none());
    }

    #[test]
    fn test_overlay_aggregation() {
        let mut set = RegionSet::new(Options::default(), 0);
        assert!(!set.any_visible_area());

        set.current_mut().set_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        set.current_mut().set_visible(true);
        assert!(set.any_visible_area());

        set.add(Options::default());
        // The new zero-area region does not clear the aggregate.
        assert!(set.any_visible_area());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let t = transform();
        let mut set = set_with_area(Rect::new(0.0, 0.0, 100.0, 100.0));
        set.add(Options::default());
        set.current_mut().set_rect(Rect::new(50.0, 50.0, 150.0, 150.0));
        set.current_mut().set_visible(true);
        set.move_to_front();

        let hit = set.hit_test(Point::new(75.0, 75.0), &t);
        assert_eq!(hit, Some(1));

        let hit = set.hit_test(Point::new(10.0, 10.0), &t);
        assert_eq!(hit, Some(0));

        assert_eq!(set.hit_test(Point::new(400.0, 400.0), &t), None);
    }

    #[test]
    fn test_move_to_back_floor() {
        let mut set = RegionSet::new(Options::default(), 10);
        assert_eq!(set.current().z_index(), 13);

        set.move_to_back();
        assert_eq!(set.current().z_index(), 12);
        set.move_to_back();
        // Never drops below baseline + 2.
        assert_eq!(set.current().z_index(), 12);

        set.move_to_front();
        assert_eq!(set.current().z_index(), 13);
    }
}
