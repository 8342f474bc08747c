//! Notifications emitted by state transitions.
//!
//! Transitions return notification lists instead of invoking caller-supplied
//! functions mid-mutation; the caller dispatches them once internal state is
//! fully consistent, so a handler can never observe a half-applied gesture.

use serde::{Deserialize, Serialize};

use crate::region::Selection;

/// A notification produced by a completed state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// First geometry computation completed; fired once per instance.
    Init { selection: Selection },
    /// A drawing gesture produced a visible selection.
    SelectStart { selection: Selection },
    /// The current selection changed (pointer, keyboard, or re-clamp).
    SelectChange { index: usize, selection: Selection },
    /// A gesture finished.
    SelectEnd { index: usize, selection: Selection },
    /// A gesture added a region.
    SelectAdd { index: usize, selection: Selection },
    /// A region was removed from the set.
    SelectRemove { index: usize },
    /// Activation moved between regions.
    SelectSwap { index: usize, previous: usize },
}

/// Receiver interface mirroring the notification variants.
///
/// All methods default to no-ops, so implementors override only what they
/// observe.
pub trait EventHandler {
    fn on_init(&mut self, _selection: Selection) {}
    fn on_select_start(&mut self, _selection: Selection) {}
    fn on_select_change(&mut self, _index: usize, _selection: Selection) {}
    fn on_select_end(&mut self, _index: usize, _selection: Selection) {}
    fn on_select_add(&mut self, _index: usize, _selection: Selection) {}
    fn on_select_remove(&mut self, _index: usize) {}
    fn on_select_swap(&mut self, _index: usize, _previous: usize) {}
}

/// Fan a batch of notifications out to a handler, in order.
pub fn dispatch(handler: &mut dyn EventHandler, notifications: &[Notification]) {
    for notification in notifications {
        match *notification {
            Notification::Init { selection } => handler.on_init(selection),
            Notification::SelectStart { selection } => handler.on_select_start(selection),
            Notification::SelectChange { index, selection } => {
                handler.on_select_change(index, selection);
            }
            Notification::SelectEnd { index, selection } => {
                handler.on_select_end(index, selection);
            }
            Notification::SelectAdd { index, selection } => {
                handler.on_select_add(index, selection);
            }
            Notification::SelectRemove { index } => handler.on_select_remove(index),
            Notification::SelectSwap { index, previous } => {
                handler.on_select_swap(index, previous);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl EventHandler for Recorder {
        fn on_select_start(&mut self, _selection: Selection) {
            self.log.push("start".into());
        }

        fn on_select_change(&mut self, index: usize, _selection: Selection) {
            self.log.push(format!("change {index}"));
        }

        fn on_select_remove(&mut self, index: usize) {
            self.log.push(format!("remove {index}"));
        }
    }

    fn selection() -> Selection {
        Selection {
            x1: 0,
            y1: 0,
            x2: 10,
            y2: 10,
            width: 10,
            height: 10,
            z_index: 1,
        }
    }

    #[test]
    fn test_dispatch_order_and_defaults() {
        let mut recorder = Recorder::default();
        dispatch(
            &mut recorder,
            &[
                Notification::SelectStart {
                    selection: selection(),
                },
                Notification::SelectChange {
                    index: 0,
                    selection: selection(),
                },
                // Default no-op handler.
                Notification::SelectSwap {
                    index: 1,
                    previous: 0,
                },
                Notification::SelectRemove { index: 1 },
            ],
        );

        assert_eq!(recorder.log, vec!["start", "change 0", "remove 1"]);
    }
}
