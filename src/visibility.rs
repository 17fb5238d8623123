//! Heading geometry as seen from the document viewport.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Vertical extent of a rendered heading, relative to the viewport top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingBounds {
    pub top: f32,
    pub bottom: f32,
}

impl HeadingBounds {
    pub fn new(top: f32, height: f32) -> Self {
        Self {
            top,
            bottom: top + height,
        }
    }
}

/// Horizontal band of the viewport, in fractions of its height, that decides
/// which headings count as "being read".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FocalRegion {
    pub top: f32,
    pub bottom: f32,
}

impl Default for FocalRegion {
    fn default() -> Self {
        Self {
            top: 0.0,
            bottom: 0.2,
        }
    }
}

impl FocalRegion {
    pub fn validate(&self) -> Result<()> {
        let in_range = |f: f32| (0.0..=1.0).contains(&f);
        if !in_range(self.top) || !in_range(self.bottom) || self.top >= self.bottom {
            return Err(SyncError::InvalidConfig(format!(
                "focal region {}..{} must satisfy 0 <= top < bottom <= 1",
                self.top, self.bottom
            )));
        }
        Ok(())
    }

    /// Pixel band for a viewport of the given height.
    pub fn band(&self, viewport_height: f32) -> (f32, f32) {
        (self.top * viewport_height, self.bottom * viewport_height)
    }

    pub fn intersects(&self, bounds: HeadingBounds, viewport_height: f32) -> bool {
        let (top, bottom) = self.band(viewport_height);
        bounds.bottom > top && bounds.top < bottom
    }
}

/// Where headings are, as far as the host's renderer knows.
///
/// `observe` registers interest in a set of ids and may fail when the host
/// cannot report geometry at all. Unobserved or unrendered ids yield `None`.
pub trait VisibilitySource {
    fn observe(&mut self, ids: &[String]) -> Result<()>;
    fn unobserve(&mut self, ids: &[String]);
    fn heading_bounds(&self, id: &str) -> Option<HeadingBounds>;
    fn viewport_height(&self) -> f32;
}
