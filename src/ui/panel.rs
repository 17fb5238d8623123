//! The outline side panel as seen by the panel synchronizer.

use std::collections::HashMap;

use crate::panel::{LinkBounds, TocPanel};

/// Fraction of the remaining distance covered per frame.
const EASE_FACTOR: f32 = 0.25;
/// Distance below which the animation snaps to its target.
const SNAP_DISTANCE: f32 = 0.5;
/// Drift between the applied and observed offset that means the reader
/// took over the panel's scroll.
const TAKEOVER_DISTANCE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct SmoothScroll {
    current: f32,
    target: f32,
}

/// Link geometry and scroll state captured while drawing the outline.
#[derive(Default)]
pub struct OutlinePanel {
    links: HashMap<String, LinkBounds>,
    scroll_top: f32,
    client_height: f32,
    animation: Option<SmoothScroll>,
}

impl OutlinePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets last frame's links before the outline is drawn again.
    pub fn begin_frame(&mut self) {
        self.links.clear();
    }

    /// Drops links and any running animation while the outline is not shown.
    pub fn hide(&mut self) {
        self.links.clear();
        self.animation = None;
    }

    pub fn record_link(&mut self, id: &str, bounds: LinkBounds) {
        self.links.insert(id.to_string(), bounds);
    }

    /// Stores the scroll area's state after it was shown.
    pub fn record_viewport(&mut self, scroll_top: f32, client_height: f32) {
        if let Some(animation) = self.animation {
            if (scroll_top - animation.current).abs() > TAKEOVER_DISTANCE {
                log::trace!("Outline scroll taken over at {}", scroll_top);
                self.animation = None;
            }
        }
        self.scroll_top = scroll_top;
        self.client_height = client_height;
    }

    /// Advances the animation and returns the offset to force on the scroll
    /// area this frame.
    pub fn next_offset(&mut self) -> Option<f32> {
        let animation = self.animation.as_mut()?;
        let remaining = animation.target - animation.current;
        if remaining.abs() <= SNAP_DISTANCE {
            let target = animation.target;
            self.animation = None;
            return Some(target);
        }
        animation.current += remaining * EASE_FACTOR;
        Some(animation.current)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }
}

impl TocPanel for OutlinePanel {
    fn link_bounds(&self, id: &str) -> Option<LinkBounds> {
        self.links.get(id).copied()
    }

    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn client_height(&self) -> f32 {
        self.client_height
    }

    fn smooth_scroll_to(&mut self, top: f32) {
        self.animation = Some(SmoothScroll {
            current: self.scroll_top,
            target: top,
        });
    }
}
