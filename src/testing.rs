//! In-memory stand-ins for the host's document and TOC panel.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SyncError};
use crate::panel::{LinkBounds, TocPanel};
use crate::visibility::{HeadingBounds, VisibilitySource};

pub const HEADING_HEIGHT: f32 = 30.0;

/// Headings at fixed content offsets inside a scrollable viewport.
pub struct FakeDocument {
    headings: HashMap<String, f32>,
    observed: HashSet<String>,
    pub scroll: f32,
    pub viewport: f32,
    pub fail_observe: bool,
    pub observe_calls: usize,
}

impl FakeDocument {
    pub fn new(viewport: f32) -> Self {
        Self {
            headings: HashMap::new(),
            observed: HashSet::new(),
            scroll: 0.0,
            viewport,
            fail_observe: false,
            observe_calls: 0,
        }
    }

    pub fn heading(mut self, id: &str, content_top: f32) -> Self {
        self.headings.insert(id.to_string(), content_top);
        self
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.observed.contains(id)
    }
}

impl VisibilitySource for FakeDocument {
    fn observe(&mut self, ids: &[String]) -> Result<()> {
        self.observe_calls += 1;
        if self.fail_observe {
            return Err(SyncError::ObserverUnavailable("test host".to_string()));
        }
        self.observed.extend(ids.iter().cloned());
        Ok(())
    }

    fn unobserve(&mut self, ids: &[String]) {
        for id in ids {
            self.observed.remove(id);
        }
    }

    fn heading_bounds(&self, id: &str) -> Option<HeadingBounds> {
        if !self.observed.contains(id) {
            return None;
        }
        self.headings
            .get(id)
            .map(|top| HeadingBounds::new(top - self.scroll, HEADING_HEIGHT))
    }

    fn viewport_height(&self) -> f32 {
        self.viewport
    }
}

/// A TOC panel with evenly spaced links that records scroll commands.
pub struct FakePanel {
    links: HashMap<String, LinkBounds>,
    pub scroll_top: f32,
    pub client_height: f32,
    pub scrolls: Vec<f32>,
}

impl FakePanel {
    pub fn new(client_height: f32) -> Self {
        Self {
            links: HashMap::new(),
            scroll_top: 0.0,
            client_height,
            scrolls: Vec::new(),
        }
    }

    pub fn link(mut self, id: &str, top: f32, height: f32) -> Self {
        self.links.insert(id.to_string(), LinkBounds { top, height });
        self
    }

    pub fn remove_link(&mut self, id: &str) {
        self.links.remove(id);
    }
}

impl TocPanel for FakePanel {
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
        self.scrolls.push(top);
    }
}
