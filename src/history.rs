//! The set of gestures recognized during a session.

use crate::gesture::Gesture;

/// Distinct gestures in order of first appearance, with the most recently emitted one marked as
/// active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureHistory {
    seen: Vec<Gesture>,
    active: Option<Gesture>,
}

impl GestureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an emitted gesture and marks it as active.
    pub fn record(&mut self, gesture: Gesture) {
        if !self.seen.contains(&gesture) {
            self.seen.push(gesture);
        }
        self.active = Some(gesture);
    }

    pub fn active(&self) -> Option<Gesture> {
        self.active
    }

    /// Yields every recorded gesture together with whether it is the active one.
    pub fn iter(&self) -> impl Iterator<Item = (Gesture, bool)> + '_ {
        self.seen
            .iter()
            .map(move |&g| (g, self.active == Some(g)))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
