//! Scroll direction tracking for the primary document scroll area.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

/// Classifies each scroll notification as up or down.
///
/// The tracker is the only writer of the direction; everything else reads
/// it through a [`DirectionHandle`].
#[derive(Debug, Default)]
pub struct ScrollDirectionTracker {
    last_offset: Option<f32>,
    direction: Rc<Cell<ScrollDirection>>,
}

impl ScrollDirectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a known offset so the first notification already has a
    /// baseline to compare against.
    pub fn with_offset(offset: f32) -> Self {
        Self {
            last_offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn observe(&mut self, offset: f32) -> ScrollDirection {
        if let Some(last) = self.last_offset {
            if offset > last {
                self.direction.set(ScrollDirection::Down);
            } else if offset < last {
                self.direction.set(ScrollDirection::Up);
            }
        }
        self.last_offset = Some(offset);
        self.direction.get()
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction.get()
    }

    pub fn last_offset(&self) -> Option<f32> {
        self.last_offset
    }

    pub fn handle(&self) -> DirectionHandle {
        DirectionHandle(Rc::clone(&self.direction))
    }
}

/// Read-only view of the tracker's current direction.
#[derive(Clone, Debug)]
pub struct DirectionHandle(Rc<Cell<ScrollDirection>>);

impl DirectionHandle {
    pub fn get(&self) -> ScrollDirection {
        self.0.get()
    }
}
