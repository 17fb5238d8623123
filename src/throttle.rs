//! Frame-granular throttling of detection work.

/// Coalesces bursts of notifications into a single unit of work per frame.
#[derive(Debug, Default)]
pub struct FrameThrottle {
    scheduled: bool,
}

impl FrameThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks work as pending. Returns true only for the request that
    /// scheduled the frame; later requests in the same frame are absorbed.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.scheduled, true)
    }

    /// Consumes the pending flag at the start of a frame.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.scheduled)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}
