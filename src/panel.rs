//! Keeps the active TOC link visible inside the scrollable side panel.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::direction::ScrollDirection;

/// Position of a link inside the panel's scrollable content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkBounds {
    pub top: f32,
    pub height: f32,
}

impl LinkBounds {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// The independently scrollable panel that lists TOC links.
pub trait TocPanel {
    fn link_bounds(&self, id: &str) -> Option<LinkBounds>;
    fn scroll_top(&self) -> f32;
    fn client_height(&self) -> f32;
    /// Starts an animated scroll to the given content offset.
    fn smooth_scroll_to(&mut self, top: f32);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PanelPolicy {
    /// Center the active link whenever it is not fully visible
    #[default]
    Center,
    /// Reveal the active link only when it lies beyond the edge the reader
    /// is scrolling toward
    DirectionGated,
}

/// Where to scroll the panel so `link` becomes visible, or `None` if no
/// scroll is needed or allowed.
pub fn scroll_target(
    policy: PanelPolicy,
    link: LinkBounds,
    scroll_top: f32,
    client_height: f32,
    direction: ScrollDirection,
    padding: f32,
) -> Option<f32> {
    let window_bottom = scroll_top + client_height;
    if link.top >= scroll_top && link.bottom() <= window_bottom {
        return None;
    }

    match policy {
        PanelPolicy::Center => {
            let centered = link.top + link.height / 2.0 - client_height / 2.0;
            Some(centered.max(0.0))
        }
        PanelPolicy::DirectionGated => {
            if link.top > window_bottom && direction == ScrollDirection::Down {
                Some((link.top - padding).max(0.0))
            } else if link.bottom() < scroll_top && direction == ScrollDirection::Up {
                Some((link.bottom() - client_height + padding).max(0.0))
            } else {
                None
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct PendingScroll {
    id: String,
    due: Instant,
    direction: ScrollDirection,
}

/// Debounced, cancellable auto-scroll of the TOC panel.
#[derive(Debug)]
pub struct PanelSynchronizer {
    policy: PanelPolicy,
    debounce: Duration,
    padding: f32,
    pending: Option<PendingScroll>,
}

impl PanelSynchronizer {
    pub fn new(policy: PanelPolicy, debounce: Duration, padding: f32) -> Self {
        Self {
            policy,
            debounce,
            padding,
            pending: None,
        }
    }

    /// Replaces any pending scroll with one targeting `active`.
    pub fn schedule(&mut self, active: Option<&str>, direction: ScrollDirection, now: Instant) {
        if let Some(previous) = self.pending.take() {
            log::trace!("Cancelled panel scroll to {}", previous.id);
        }
        self.pending = active.map(|id| PendingScroll {
            id: id.to_string(),
            due: now + self.debounce,
            direction,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending scroll fires.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.due.saturating_duration_since(now))
    }

    /// Fires the pending scroll if it is due. Returns the issued target.
    pub fn poll(&mut self, now: Instant, panel: &mut dyn TocPanel) -> Option<f32> {
        if self.pending.as_ref().map_or(true, |pending| pending.due > now) {
            return None;
        }
        let pending = self.pending.take()?;

        let Some(link) = panel.link_bounds(&pending.id) else {
            log::debug!("Panel link for {} is gone, skipping scroll", pending.id);
            return None;
        };

        let target = scroll_target(
            self.policy,
            link,
            panel.scroll_top(),
            panel.client_height(),
            pending.direction,
            self.padding,
        )?;
        log::trace!("Scrolling panel to {} for {}", target, pending.id);
        panel.smooth_scroll_to(target);
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePanel;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn panel() -> FakePanel {
        FakePanel::new(200.0)
            .link("a", 0.0, 20.0)
            .link("b", 180.0, 20.0)
            .link("c", 400.0, 20.0)
            .link("d", 800.0, 20.0)
    }

    #[test]
    fn visible_link_issues_no_scroll() {
        let mut panel = panel();
        let mut sync = PanelSynchronizer::new(PanelPolicy::Center, DEBOUNCE, 0.0);
        let start = Instant::now();

        sync.schedule(Some("b"), ScrollDirection::Down, start);
        assert_eq!(sync.poll(start + DEBOUNCE, &mut panel), None);
        assert!(panel.scrolls.is_empty());
        assert!(!sync.is_pending());
    }

    #[test]
    fn waits_for_debounce() {
        let mut panel = panel();
        let mut sync = PanelSynchronizer::new(PanelPolicy::Center, DEBOUNCE, 0.0);
        let start = Instant::now();

        sync.schedule(Some("c"), ScrollDirection::Down, start);
        assert_eq!(sync.poll(start + Duration::from_millis(50), &mut panel), None);
        assert_eq!(sync.remaining(start + Duration::from_millis(50)), Some(Duration::from_millis(50)));
        assert_eq!(sync.poll(start + DEBOUNCE, &mut panel), Some(310.0));
        assert_eq!(panel.scrolls, vec![310.0]);
    }

    #[test]
    fn rapid_changes_coalesce_into_one_scroll() {
        let mut panel = panel();
        let mut sync = PanelSynchronizer::new(PanelPolicy::Center, DEBOUNCE, 0.0);
        let start = Instant::now();

        for (ms, id) in [(0, "b"), (30, "c"), (60, "d")] {
            let now = start + Duration::from_millis(ms);
            sync.schedule(Some(id), ScrollDirection::Down, now);
            sync.poll(now, &mut panel);
        }
        sync.poll(start + Duration::from_millis(160), &mut panel);
        sync.poll(start + Duration::from_millis(500), &mut panel);

        // Centered on "d": 800 + 10 - 100
        assert_eq!(panel.scrolls, vec![710.0]);
    }

    #[test]
    fn clearing_the_active_id_cancels_the_scroll() {
        let mut panel = panel();
        let mut sync = PanelSynchronizer::new(PanelPolicy::Center, DEBOUNCE, 0.0);
        let start = Instant::now();

        sync.schedule(Some("d"), ScrollDirection::Down, start);
        sync.schedule(None, ScrollDirection::Down, start);
        assert_eq!(sync.poll(start + DEBOUNCE, &mut panel), None);
        assert!(panel.scrolls.is_empty());
    }

    #[test]
    fn stale_target_is_a_silent_no_op() {
        let mut panel = panel();
        let mut sync = PanelSynchronizer::new(PanelPolicy::Center, DEBOUNCE, 0.0);
        let start = Instant::now();

        sync.schedule(Some("d"), ScrollDirection::Down, start);
        panel.remove_link("d");
        assert_eq!(sync.poll(start + DEBOUNCE, &mut panel), None);
        assert!(panel.scrolls.is_empty());
        assert!(!sync.is_pending());
    }

    #[test]
    fn centering_clamps_at_top() {
        let link = LinkBounds { top: 20.0, height: 20.0 };
        let target = scroll_target(PanelPolicy::Center, link, 300.0, 200.0, ScrollDirection::Up, 0.0);
        assert_eq!(target, Some(0.0));
    }

    #[test]
    fn direction_gated_follows_travel_direction() {
        let below = LinkBounds { top: 400.0, height: 20.0 };
        let above = LinkBounds { top: 20.0, height: 20.0 };
        let gated = PanelPolicy::DirectionGated;

        assert_eq!(
            scroll_target(gated, below, 100.0, 200.0, ScrollDirection::Down, 8.0),
            Some(392.0)
        );
        assert_eq!(scroll_target(gated, below, 100.0, 200.0, ScrollDirection::Up, 8.0), None);

        assert_eq!(scroll_target(gated, above, 100.0, 200.0, ScrollDirection::Down, 8.0), None);
        assert_eq!(
            scroll_target(gated, above, 100.0, 200.0, ScrollDirection::Up, 8.0),
            Some(0.0)
        );
        let above_far = LinkBounds { top: 500.0, height: 20.0 };
        assert_eq!(
            scroll_target(gated, above_far, 900.0, 200.0, ScrollDirection::Up, 8.0),
            Some(328.0)
        );
    }

    #[test]
    fn direction_gated_ignores_partially_visible_links() {
        let straddling = LinkBounds { top: 290.0, height: 20.0 };
        assert_eq!(
            scroll_target(PanelPolicy::DirectionGated, straddling, 100.0, 200.0, ScrollDirection::Down, 0.0),
            None
        );
    }
}
