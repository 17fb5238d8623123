//! Heading geometry for the rendered markdown document.
//!
//! The markdown renderer does not report where headings end up, so their
//! positions are estimated from source line numbers scaled to the measured
//! content height.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::outline::Outline;
use crate::visibility::{HeadingBounds, VisibilitySource};

const DEFAULT_HEADING_HEIGHT: f32 = 28.0;

/// What changed in the last [`DocumentLayout::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutChange {
    pub scrolled: bool,
    pub resized: bool,
}

pub struct DocumentLayout {
    heading_lines: HashMap<String, usize>,
    observed: HashSet<String>,
    content_lines: usize,
    content_height: f32,
    viewport_height: f32,
    scroll_offset: f32,
    heading_height: f32,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            heading_lines: HashMap::new(),
            observed: HashSet::new(),
            content_lines: 0,
            content_height: 0.0,
            viewport_height: 0.0,
            scroll_offset: 0.0,
            heading_height: DEFAULT_HEADING_HEIGHT,
        }
    }
}

impl DocumentLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to a new document. The content height is unknown until the
    /// next frame measures it.
    pub fn set_document(&mut self, outline: &Outline, content_lines: usize) {
        self.heading_lines = outline
            .headings
            .iter()
            .filter_map(|h| h.id.clone().map(|id| (id, h.line_number)))
            .collect();
        self.content_lines = content_lines;
        self.content_height = 0.0;
    }

    pub fn set_heading_height(&mut self, height: f32) {
        if height > 0.0 {
            self.heading_height = height;
        }
    }

    /// Stores this frame's measurements.
    pub fn update(&mut self, scroll_offset: f32, viewport_height: f32, content_height: f32) -> LayoutChange {
        let change = LayoutChange {
            scrolled: scroll_offset != self.scroll_offset,
            resized: viewport_height != self.viewport_height || content_height != self.content_height,
        };
        self.scroll_offset = scroll_offset;
        self.viewport_height = viewport_height;
        self.content_height = content_height;
        change
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Estimated offset of a heading from the top of the content.
    pub fn content_offset(&self, id: &str) -> Option<f32> {
        if self.content_lines == 0 || self.content_height <= 0.0 {
            return None;
        }
        let line = *self.heading_lines.get(id)?;
        // Approximate position based on line number ratio
        Some(line as f32 * self.content_height / self.content_lines as f32)
    }
}

impl VisibilitySource for DocumentLayout {
    fn observe(&mut self, ids: &[String]) -> Result<()> {
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
        let top = self.content_offset(id)? - self.scroll_offset;
        Some(HeadingBounds::new(top, self.heading_height))
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height
    }
}
