//! Drives direction tracking, section detection and panel sync together.

use std::time::{Duration, Instant};

use crate::collapse::{CollapseView, Subscription};
use crate::config::SyncConfig;
use crate::detector::ActiveSectionDetector;
use crate::direction::{ScrollDirection, ScrollDirectionTracker};
use crate::panel::{PanelSynchronizer, TocPanel};
use crate::throttle::FrameThrottle;
use crate::toc::TocTree;
use crate::visibility::VisibilitySource;

/// Live TOC state for one document view.
///
/// The host feeds scroll offsets through [`TocSync::on_scroll`] as they
/// arrive and calls [`TocSync::on_frame`] once per rendered frame.
pub struct TocSync {
    tracker: ScrollDirectionTracker,
    throttle: FrameThrottle,
    detector: ActiveSectionDetector,
    panel: PanelSynchronizer,
    collapse: CollapseView,
    panel_hidden: bool,
}

impl TocSync {
    pub fn new(config: &SyncConfig, collapse: CollapseView) -> Self {
        let tracker = ScrollDirectionTracker::new();
        let detector = ActiveSectionDetector::new(config.strategy(), tracker.handle());
        Self {
            tracker,
            throttle: FrameThrottle::new(),
            detector,
            panel: PanelSynchronizer::new(config.panel_policy, config.debounce(), config.panel_padding),
            collapse,
            panel_hidden: false,
        }
    }

    /// Switches to a new document's headings.
    pub fn set_toc(&mut self, tree: &TocTree, source: &mut dyn VisibilitySource) {
        self.panel.cancel();
        self.detector.set_ids(tree.ids(), source);
        self.throttle.request();
    }

    /// Records the new scroll offset. Direction is updated immediately;
    /// detection waits for the next frame.
    pub fn on_scroll(&mut self, offset: f32) -> ScrollDirection {
        let direction = self.tracker.observe(offset);
        self.throttle.request();
        direction
    }

    /// Heading visibility changed for a reason other than scrolling, such
    /// as a resize or relayout. Recomputes right away.
    pub fn on_visibility_change(&mut self, source: &dyn VisibilitySource, now: Instant) -> bool {
        self.recompute(source, now)
    }

    /// Runs the throttled detection and fires a due panel scroll.
    /// Returns true if the active id changed.
    ///
    /// While the panel is collapsed detection keeps running but the panel is
    /// left alone. Expanding it schedules a scroll to the current entry.
    pub fn on_frame(
        &mut self,
        now: Instant,
        source: &dyn VisibilitySource,
        panel: &mut dyn TocPanel,
    ) -> bool {
        let changed = self.throttle.take() && self.recompute(source, now);
        if self.collapse.get() {
            if !self.panel_hidden {
                log::debug!("TOC panel hidden, pausing auto-scroll");
                self.panel_hidden = true;
            }
            self.panel.cancel();
            return changed;
        }
        if std::mem::take(&mut self.panel_hidden) {
            self.panel
                .schedule(self.detector.active_id(), self.tracker.direction(), now);
        }
        self.panel.poll(now, panel);
        changed
    }

    fn recompute(&mut self, source: &dyn VisibilitySource, now: Instant) -> bool {
        if !self.detector.recompute(source) {
            return false;
        }
        self.panel
            .schedule(self.detector.active_id(), self.tracker.direction(), now);
        true
    }

    /// Unregisters from the visibility source and drops pending work.
    pub fn teardown(&mut self, source: &mut dyn VisibilitySource) {
        self.panel.cancel();
        self.throttle.take();
        self.detector.teardown(source);
    }

    pub fn active_id(&self) -> Option<&str> {
        self.detector.active_id()
    }

    pub fn direction(&self) -> ScrollDirection {
        self.tracker.direction()
    }

    /// Whether another frame is needed soon, and how soon.
    pub fn next_frame_in(&self, now: Instant) -> Option<Duration> {
        if self.throttle.is_scheduled() {
            return Some(Duration::ZERO);
        }
        self.panel.remaining(now)
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapse.get()
    }

    pub fn subscribe_collapsed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.collapse.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::collapse::CollapseStore;
    use crate::panel::LinkBounds;
    use crate::testing::{FakeDocument, FakePanel};
    use crate::toc::TocEntry;
    use crate::ui::OutlinePanel;

    fn tree() -> TocTree {
        TocTree::new(vec![
            TocEntry::new("h1", "One", 1),
            TocEntry::new("h2", "Two", 1),
            TocEntry::new("h3", "Three", 1),
        ])
        .unwrap()
    }

    fn document() -> FakeDocument {
        FakeDocument::new(1000.0)
            .heading("h1", 300.0)
            .heading("h2", 1300.0)
            .heading("h3", 2300.0)
    }

    fn panel() -> FakePanel {
        FakePanel::new(40.0)
            .link("h1", 0.0, 20.0)
            .link("h2", 20.0, 20.0)
            .link("h3", 40.0, 20.0)
    }

    fn engine(store: &Arc<CollapseStore>) -> TocSync {
        let config = SyncConfig {
            debounce_ms: 0,
            ..SyncConfig::default()
        };
        TocSync::new(&config, store.view())
    }

    #[test]
    fn scroll_bursts_recompute_once_per_frame() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = document();
        let mut panel = panel();
        let now = Instant::now();
        sync.set_toc(&tree(), &mut doc);

        for offset in [100.0, 120.0, 150.0] {
            sync.on_scroll(offset);
        }
        doc.scroll = 150.0;
        assert_eq!(sync.next_frame_in(now), Some(Duration::ZERO));
        assert!(sync.on_frame(now, &doc, &mut panel));
        assert_eq!(sync.active_id(), Some("h1"));

        // Nothing pending: the frame does no detection work.
        doc.scroll = 1150.0;
        assert!(!sync.on_frame(now, &doc, &mut panel));
        assert_eq!(sync.active_id(), Some("h1"));
    }

    #[test]
    fn direction_is_captured_before_detection() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = FakeDocument::new(1000.0)
            .heading("h2", 1000.0)
            .heading("h3", 1080.0);
        let mut panel = panel();
        let tree = TocTree::new(vec![
            TocEntry::new("h2", "Two", 1),
            TocEntry::new("h3", "Three", 1),
        ])
        .unwrap();
        sync.set_toc(&tree, &mut doc);

        sync.on_scroll(2000.0);
        sync.on_scroll(950.0);
        doc.scroll = 950.0;
        assert_eq!(sync.direction(), ScrollDirection::Up);
        sync.on_frame(Instant::now(), &doc, &mut panel);
        assert_eq!(sync.active_id(), Some("h2"));
    }

    #[test]
    fn active_change_scrolls_panel_once() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = document();
        let mut panel = panel();
        let now = Instant::now();
        sync.set_toc(&tree(), &mut doc);

        sync.on_scroll(2150.0);
        doc.scroll = 2150.0;
        sync.on_frame(now, &doc, &mut panel);
        sync.on_frame(now, &doc, &mut panel);

        assert_eq!(sync.active_id(), Some("h3"));
        assert_eq!(panel.scrolls, vec![30.0]);
    }

    #[test]
    fn visibility_change_recomputes_immediately() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = document();
        sync.set_toc(&tree(), &mut doc);

        doc.scroll = 1200.0;
        assert!(sync.on_visibility_change(&doc, Instant::now()));
        assert_eq!(sync.active_id(), Some("h2"));
    }

    #[test]
    fn teardown_releases_observation_and_pending_scroll() {
        let store = Arc::new(CollapseStore::new(false));
        let config = SyncConfig::default();
        let mut sync = TocSync::new(&config, store.view());
        let mut doc = document();
        let mut panel = panel();
        let now = Instant::now();
        sync.set_toc(&tree(), &mut doc);

        doc.scroll = 2150.0;
        sync.on_scroll(2150.0);
        sync.on_frame(now, &doc, &mut panel);
        assert!(sync.next_frame_in(now).is_some());

        sync.teardown(&mut doc);
        assert!(!doc.is_observed("h1"));
        assert_eq!(sync.active_id(), None);
        assert_eq!(sync.next_frame_in(now), None);

        sync.on_frame(now + Duration::from_secs(1), &doc, &mut panel);
        assert!(panel.scrolls.is_empty());
    }

    #[test]
    fn new_toc_resets_active_id() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = document();
        let mut panel = panel();
        sync.set_toc(&tree(), &mut doc);
        doc.scroll = 150.0;
        sync.on_frame(Instant::now(), &doc, &mut panel);
        assert_eq!(sync.active_id(), Some("h1"));

        sync.set_toc(&TocTree::default(), &mut doc);
        assert_eq!(sync.active_id(), None);
        sync.on_frame(Instant::now(), &doc, &mut panel);
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn exposes_collapse_state_without_owning_it() {
        let store = Arc::new(CollapseStore::new(false));
        let sync = engine(&store);
        let flag = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&flag);
        let _sub = sync.subscribe_collapsed(move |v| sink.store(v, Ordering::SeqCst));

        store.set(true);
        assert!(sync.is_collapsed());
        assert!(flag.load(Ordering::SeqCst));
    }

    fn record_outline(panel: &mut OutlinePanel) {
        panel.begin_frame();
        panel.record_link("h1", LinkBounds { top: 0.0, height: 20.0 });
        panel.record_link("h2", LinkBounds { top: 20.0, height: 20.0 });
        panel.record_link("h3", LinkBounds { top: 40.0, height: 20.0 });
        panel.record_viewport(0.0, 40.0);
    }

    #[test]
    fn collapsed_panel_is_not_scrolled() {
        let store = Arc::new(CollapseStore::new(false));
        let mut sync = engine(&store);
        let mut doc = document();
        let mut outline = OutlinePanel::new();
        let now = Instant::now();
        sync.set_toc(&tree(), &mut doc);
        record_outline(&mut outline);
        sync.on_frame(now, &doc, &mut outline);

        // The outline is no longer drawn, so its links go stale.
        store.set(true);
        sync.on_scroll(2150.0);
        doc.scroll = 2150.0;
        for frame in 1..=300 {
            sync.on_frame(now + Duration::from_millis(16 * frame), &doc, &mut outline);
            assert!(!outline.is_animating());
        }
        assert_eq!(sync.active_id(), Some("h3"));
        assert_eq!(outline.next_offset(), None);
        assert_eq!(sync.next_frame_in(now + Duration::from_secs(5)), None);

        // Expanding brings the current entry back into view.
        store.set(false);
        record_outline(&mut outline);
        sync.on_frame(now + Duration::from_secs(6), &doc, &mut outline);
        assert!(outline.is_animating());
        assert_eq!(outline.next_offset(), Some(7.5));
    }
}
