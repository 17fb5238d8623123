//! Decides which heading the reader is currently on.

use crate::direction::{DirectionHandle, ScrollDirection};
use crate::visibility::{FocalRegion, VisibilitySource};

/// How headings are matched against the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Headings intersecting a thin band near the top of the viewport are
    /// candidates; ties are broken by scroll direction.
    FocalStrip(FocalRegion),
    /// The last heading whose top has passed twice the fixed header height
    /// wins. The final heading also wins once its predecessor has left the
    /// top of the viewport.
    Threshold { header_offset: f32 },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::FocalStrip(FocalRegion::default())
    }
}

pub struct ActiveSectionDetector {
    strategy: Strategy,
    direction: DirectionHandle,
    ids: Vec<String>,
    active: Option<String>,
    degraded: bool,
}

impl ActiveSectionDetector {
    pub fn new(strategy: Strategy, direction: DirectionHandle) -> Self {
        Self {
            strategy,
            direction,
            ids: Vec::new(),
            active: None,
            degraded: false,
        }
    }

    /// Replaces the tracked ids and starts observing them.
    ///
    /// If the source cannot observe, the detector stays inert until the
    /// next successful `set_ids`.
    pub fn set_ids(&mut self, ids: &[String], source: &mut dyn VisibilitySource) {
        self.release(source);
        self.ids = ids.to_vec();
        self.active = None;
        self.degraded = false;

        if self.ids.is_empty() {
            return;
        }
        if let Err(e) = source.observe(&self.ids) {
            log::warn!("Active section tracking disabled: {}", e);
            self.degraded = true;
        } else {
            log::debug!("Tracking {} headings", self.ids.len());
        }
    }

    /// Stops observing and forgets all state.
    pub fn teardown(&mut self, source: &mut dyn VisibilitySource) {
        self.release(source);
        self.ids.clear();
        self.active = None;
        self.degraded = false;
    }

    fn release(&mut self, source: &mut dyn VisibilitySource) {
        if !self.ids.is_empty() && !self.degraded {
            source.unobserve(&self.ids);
        }
    }

    /// Re-evaluates the active id. Returns true if it changed.
    pub fn recompute(&mut self, source: &dyn VisibilitySource) -> bool {
        let next = if self.is_inert() {
            None
        } else {
            match self.strategy {
                Strategy::FocalStrip(region) => self.focal_candidate(region, source),
                Strategy::Threshold { header_offset } => {
                    self.threshold_candidate(header_offset, source)
                }
            }
        };

        if next == self.active {
            return false;
        }
        log::debug!("Active section: {:?} -> {:?}", self.active, next);
        self.active = next;
        true
    }

    fn focal_candidate(&self, region: FocalRegion, source: &dyn VisibilitySource) -> Option<String> {
        let viewport_height = source.viewport_height();
        let mut candidates = self.ids.iter().filter(|id| {
            source
                .heading_bounds(id)
                .is_some_and(|bounds| region.intersects(bounds, viewport_height))
        });

        // Candidates come out in document order.
        let picked = match self.direction.get() {
            ScrollDirection::Down => candidates.last(),
            ScrollDirection::Up => candidates.next(),
        };
        picked.cloned().or_else(|| self.active.clone())
    }

    fn threshold_candidate(&self, header_offset: f32, source: &dyn VisibilitySource) -> Option<String> {
        let limit = header_offset + header_offset;
        let last = self.ids.len() - 1;
        let mut current: Option<&String> = None;

        for (i, id) in self.ids.iter().enumerate() {
            let Some(bounds) = source.heading_bounds(id) else {
                continue;
            };

            if bounds.top <= limit {
                current = Some(id);
            } else if i == last && i > 0 {
                let prev = &self.ids[i - 1];
                let prev_left_viewport = current == Some(prev)
                    && source.heading_bounds(prev).is_some_and(|b| b.top < 0.0);
                if prev_left_viewport {
                    current = Some(id);
                }
            }
        }

        current.cloned()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// True when no id can ever become active.
    pub fn is_inert(&self) -> bool {
        self.ids.is_empty() || self.degraded
    }
}
