use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tocview::{
    flatten_ids, CollapseStore, HeadingBounds, LinkBounds, Result, SyncConfig, TocEntry, TocPanel,
    TocSync, TocTree, VisibilitySource,
};

struct Page {
    tops: HashMap<String, f32>,
    scroll: f32,
    viewport: f32,
}

impl VisibilitySource for Page {
    fn observe(&mut self, _ids: &[String]) -> Result<()> {
        Ok(())
    }

    fn unobserve(&mut self, _ids: &[String]) {}

    fn heading_bounds(&self, id: &str) -> Option<HeadingBounds> {
        self.tops
            .get(id)
            .map(|top| HeadingBounds::new(top - self.scroll, 32.0))
    }

    fn viewport_height(&self) -> f32 {
        self.viewport
    }
}

#[derive(Default)]
struct Sidebar {
    links: HashMap<String, LinkBounds>,
    scroll_top: f32,
    client_height: f32,
    smooth_scrolls: Vec<f32>,
}

impl TocPanel for Sidebar {
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
        self.smooth_scrolls.push(top);
    }
}

fn guide() -> Vec<TocEntry> {
    serde_json::from_str(
        r#"[
            {"id": "intro", "text": "Intro", "depth": 1, "children": []},
            {"id": "setup", "text": "Setup", "depth": 1, "children": [
                {"id": "install", "text": "Install", "depth": 2}
            ]}
        ]"#,
    )
    .unwrap()
}

#[test]
fn scrolling_to_install_activates_it_and_scrolls_panel_once() {
    let entries = guide();
    assert_eq!(flatten_ids(&entries), vec!["intro", "setup", "install"]);
    let tree = TocTree::new(entries).unwrap();

    let mut page = Page {
        tops: HashMap::from([
            ("intro".to_string(), 0.0),
            ("setup".to_string(), 900.0),
            ("install".to_string(), 1700.0),
        ]),
        scroll: 0.0,
        viewport: 800.0,
    };
    let mut sidebar = Sidebar {
        links: HashMap::from([
            ("intro".to_string(), LinkBounds { top: 0.0, height: 24.0 }),
            ("setup".to_string(), LinkBounds { top: 24.0, height: 24.0 }),
            ("install".to_string(), LinkBounds { top: 48.0, height: 24.0 }),
        ]),
        scroll_top: 0.0,
        client_height: 48.0,
        smooth_scrolls: Vec::new(),
    };

    let store = Arc::new(CollapseStore::new(false));
    let mut sync = TocSync::new(&SyncConfig::default(), store.view());
    sync.set_toc(&tree, &mut page);

    let start = Instant::now();
    sync.on_scroll(0.0);
    sync.on_frame(start, &page, &mut sidebar);
    assert_eq!(sync.active_id(), Some("intro"));

    // Install's heading lands inside the top fifth of the viewport.
    page.scroll = 1650.0;
    sync.on_scroll(1650.0);
    let tick = start + Duration::from_millis(16);
    sync.on_frame(tick, &page, &mut sidebar);
    assert_eq!(sync.active_id(), Some("install"));

    for ms in [32, 120, 200, 400] {
        sync.on_frame(start + Duration::from_millis(ms), &page, &mut sidebar);
    }
    assert!(sidebar.smooth_scrolls.len() <= 1);
    assert_eq!(sidebar.smooth_scrolls, vec![36.0]);
    assert_eq!(sync.next_frame_in(start + Duration::from_millis(400)), None);
}

#[test]
fn collapse_store_is_shared_across_independent_lookups() {
    let sidebar_fragment = CollapseStore::shared();
    let toolbar_fragment = CollapseStore::shared();
    assert!(Arc::ptr_eq(&sidebar_fragment, &toolbar_fragment));

    toolbar_fragment.set(true);
    assert!(sidebar_fragment.get());
    sidebar_fragment.set(false);
    assert!(!toolbar_fragment.get());
}
