#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use notify::RecommendedWatcher;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use serde::{Deserialize, Serialize};

use tocview::outline::{parse_outline, Outline};
use tocview::ui::{show_outline, DocumentLayout, OutlinePanel};
use tocview::{CollapseStore, Subscription, SyncArgs, SyncConfig, TocSync};

const APP_KEY: &str = "tocview-state";
const MAX_WATCHER_RETRIES: u32 = 3;

/// Persisted state saved between sessions
#[derive(Serialize, Deserialize, Default)]
struct PersistedState {
    dark_mode: Option<bool>,
    last_file: Option<PathBuf>,
    toc_collapsed: Option<bool>,
}

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "tocview")]
#[command(about = "A markdown viewer with a live table of contents", long_about = None)]
struct Args {
    /// Markdown file to open
    file: Option<PathBuf>,

    /// Enable live reload (watch for file changes)
    #[arg(short, long)]
    watch: bool,

    #[command(flatten)]
    sync: SyncArgs,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.sync.to_config().unwrap_or_else(|e| {
        log::error!("{}; using default settings", e);
        SyncConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("tocview")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "tocview",
        options,
        Box::new(move |cc| Ok(Box::new(MarkdownApp::new(cc, args.file, args.watch, config)))),
    )
}

struct MarkdownApp {
    cache: CommonMarkCache,
    content: String,
    current_file: Option<PathBuf>,
    dark_mode: bool,
    watch_enabled: bool,
    error_message: Option<String>,
    is_dragging: bool,
    // File watcher state
    watcher: Option<Debouncer<RecommendedWatcher>>,
    watcher_rx: Option<Receiver<Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>>,
    watcher_retry_count: u32,
    content_lines: usize,
    // Table of contents state
    config: SyncConfig,
    outline: Outline,
    layout: DocumentLayout,
    outline_panel: OutlinePanel,
    toc_sync: TocSync,
    collapse: Arc<CollapseStore>,
    _collapse_repaint: Subscription,
    pending_scroll_offset: Option<f32>,
}

impl MarkdownApp {
    fn new(cc: &eframe::CreationContext<'_>, file: Option<PathBuf>, watch: bool, config: SyncConfig) -> Self {
        // Load persisted state
        let persisted: PersistedState = cc
            .storage
            .and_then(|s| eframe::get_value(s, APP_KEY))
            .unwrap_or_default();

        // Use persisted dark_mode, or fall back to system default
        let dark_mode = persisted.dark_mode.unwrap_or_else(|| cc.egui_ctx.style().visuals.dark_mode);

        let collapse = CollapseStore::shared();
        if let Some(collapsed) = persisted.toc_collapsed {
            collapse.set(collapsed);
        }
        // Every collapse change needs a fresh frame, wherever it came from
        let ctx = cc.egui_ctx.clone();
        let collapse_repaint = collapse.subscribe(move |collapsed| {
            log::trace!("Repainting for collapsed={}", collapsed);
            ctx.request_repaint();
        });

        let mut app = Self {
            cache: CommonMarkCache::default(),
            content: String::new(),
            current_file: None,
            dark_mode,
            watch_enabled: watch,
            error_message: None,
            is_dragging: false,
            watcher: None,
            watcher_rx: None,
            watcher_retry_count: 0,
            content_lines: 0,
            toc_sync: TocSync::new(&config, collapse.view()),
            config,
            outline: Outline::default(),
            layout: DocumentLayout::new(),
            outline_panel: OutlinePanel::new(),
            collapse,
            _collapse_repaint: collapse_repaint,
            pending_scroll_offset: None,
        };
        app.set_content(SAMPLE_MARKDOWN.to_string());

        // Determine which file to load: CLI argument takes priority, then persisted last file
        let file_to_load = file.or(persisted.last_file);

        if let Some(path) = file_to_load {
            app.load_file(&path);
            if watch {
                app.start_watching();
            }
        }

        app
    }

    /// Replaces the document and rebuilds everything derived from it.
    fn set_content(&mut self, content: String) {
        self.content_lines = content.lines().count();
        self.content = content;
        self.cache = CommonMarkCache::default();
        self.outline = parse_outline(&self.content, self.config.number_sections);
        self.layout.set_document(&self.outline, self.content_lines);
        self.toc_sync.set_toc(&self.outline.tree, &mut self.layout);
        self.pending_scroll_offset = Some(0.0);

        // Anchor links inside the document scroll to their heading
        for id in self.outline.tree.ids() {
            self.cache.add_link_hook(format!("#{}", id));
        }
    }

    fn load_file(&mut self, path: &Path) {
        // Remember if we were watching
        let was_watching = self.watcher.is_some();

        // Stop current watcher before loading new file
        self.stop_watching();

        // First check if file exists
        if !path.exists() {
            self.error_message = Some(format!("File not found: {}", path.display()));
            log::error!("File not found: {:?}", path);
            return;
        }

        // Read file as bytes to handle invalid UTF-8 gracefully
        match fs::read(path) {
            Ok(bytes) => {
                // Convert to string with lossy UTF-8 conversion
                let content = String::from_utf8_lossy(&bytes);
                let had_invalid_utf8 = content.contains('\u{FFFD}');

                let reloading = self.current_file.as_deref() == Some(path);
                let scroll = self.layout.scroll_offset();
                self.set_content(content.into_owned());
                self.current_file = Some(path.to_path_buf());
                if reloading {
                    // Live reload keeps the reader where they were
                    self.pending_scroll_offset = Some(scroll);
                }

                if had_invalid_utf8 {
                    self.error_message = Some("Warning: File contains invalid UTF-8 characters (replaced with �)".to_string());
                    log::warn!("File {:?} contains invalid UTF-8", path);
                } else {
                    self.error_message = None;
                }

                // Restart watching if it was enabled
                if was_watching || self.watch_enabled {
                    self.start_watching();
                }
            }
            Err(e) => {
                let error_msg = match e.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        format!("Permission denied: {}", path.display())
                    }
                    std::io::ErrorKind::NotFound => {
                        format!("File not found: {}", path.display())
                    }
                    _ => format!("Failed to load file: {}", e),
                };
                self.error_message = Some(error_msg);
                log::error!("Failed to load file {:?}: {}", path, e);
            }
        }
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", &["md", "markdown"])
            .add_filter("Text", &["txt"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_file(&path);
        }
    }

    fn window_title(&self) -> String {
        let name = self
            .current_file
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|n| n.to_string_lossy().to_string());

        // Prefer the section being read, then the file name
        match (self.toc_sync.active_id().and_then(|id| self.outline.tree.find(id)), name) {
            (Some(entry), Some(name)) => format!("{} · {} - tocview", entry.text, name),
            (None, Some(name)) => format!("{} - tocview", name),
            _ => "tocview".to_string(),
        }
    }

    fn is_markdown_file(path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                ext == "md" || ext == "markdown" || ext == "txt"
            })
            .unwrap_or(false)
    }

    fn start_watching(&mut self) {
        // Stop any existing watcher first
        self.stop_watching();

        let Some(file_path) = &self.current_file else {
            log::warn!("Cannot start watching: no file loaded");
            return;
        };

        let (tx, rx) = mpsc::channel();

        match new_debouncer(Duration::from_millis(200), tx) {
            Ok(mut debouncer) => {
                if let Err(e) = debouncer.watcher().watch(file_path, notify::RecursiveMode::NonRecursive) {
                    log::error!("Failed to watch file {:?}: {}", file_path, e);
                    self.error_message = Some(format!("Failed to watch file: {}", e));
                    return;
                }

                log::info!("Started watching file: {:?}", file_path);
                self.watcher = Some(debouncer);
                self.watcher_rx = Some(rx);
                self.watch_enabled = true;
                self.watcher_retry_count = 0;
            }
            Err(e) => {
                log::error!("Failed to create file watcher: {}", e);
                self.error_message = Some(format!("Failed to create file watcher: {}", e));
            }
        }
    }

    fn toggle_watching(&mut self) {
        if self.watcher.is_some() {
            self.stop_watching();
            self.watch_enabled = false;
        } else {
            self.start_watching();
        }
    }

    fn stop_watching(&mut self) {
        if self.watcher.is_some() {
            log::info!("Stopped watching file");
        }
        self.watcher = None;
        self.watcher_rx = None;
    }

    fn check_file_changes(&mut self) -> bool {
        let Some(rx) = &self.watcher_rx else {
            // If watching was enabled but watcher is gone, try to recover
            if self.watch_enabled && self.current_file.is_some() && self.watcher_retry_count < MAX_WATCHER_RETRIES {
                log::info!("Attempting to recover file watcher (attempt {})", self.watcher_retry_count + 1);
                self.watcher_retry_count += 1;
                self.start_watching();
            }
            return false;
        };

        let mut needs_reload = false;

        // Non-blocking check for file change events
        while let Ok(result) = rx.try_recv() {
            match result {
                Ok(events) => {
                    self.watcher_retry_count = 0;
                    for event in events {
                        if event.kind == DebouncedEventKind::Any {
                            log::debug!("File change detected: {:?}", event.path);
                            needs_reload = true;
                        }
                    }
                }
                Err(e) => {
                    log::error!("File watcher error: {}", e);
                    self.watcher = None;
                    self.watcher_rx = None;

                    // Attempt recovery if under retry limit
                    if self.watcher_retry_count < MAX_WATCHER_RETRIES {
                        self.watcher_retry_count += 1;
                        log::info!("Attempting watcher recovery (attempt {})", self.watcher_retry_count);
                        self.start_watching();
                        if self.watcher.is_some() {
                            self.error_message = Some("File watcher recovered after error".to_string());
                        } else {
                            self.error_message = Some(format!("File watcher error (retry {}): {}", self.watcher_retry_count, e));
                        }
                    } else {
                        self.error_message = Some(format!("File watcher failed after {} retries: {}", MAX_WATCHER_RETRIES, e));
                        self.watch_enabled = false;
                    }
                    return false;
                }
            }
        }

        needs_reload
    }

    fn reload_current_file(&mut self) {
        if let Some(path) = self.current_file.clone() {
            log::info!("Reloading file: {:?}", path);
            self.load_file(&path);
        }
    }

    /// Scrolls the document to a heading, if its position is known yet.
    fn jump_to_heading(&mut self, id: &str) {
        match self.layout.content_offset(id) {
            Some(offset) => self.pending_scroll_offset = Some(offset),
            None => log::debug!("No position for heading {} yet", id),
        }
    }

    /// Returns the anchor of a clicked in-document `#id` link
    fn check_anchor_hooks(&self) -> Option<String> {
        self.outline
            .tree
            .ids()
            .iter()
            .find(|id| self.cache.get_link_hook(&format!("#{}", id)) == Some(true))
            .cloned()
    }
}

impl Drop for MarkdownApp {
    fn drop(&mut self) {
        self.toc_sync.teardown(&mut self.layout);
    }
}

impl eframe::App for MarkdownApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let state = PersistedState {
            dark_mode: Some(self.dark_mode),
            last_file: self.current_file.clone(),
            toc_collapsed: Some(self.collapse.get()),
        };
        eframe::set_value(storage, APP_KEY, &state);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Check for file changes and reload if needed
        if self.check_file_changes() {
            self.reload_current_file();
        }

        // Request periodic repaints when watching is enabled
        if self.watcher.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));

        // Handle keyboard shortcuts
        let mut open_dialog = false;
        let mut toggle_watch = false;
        let mut toggle_dark = false;
        let mut toggle_outline = false;
        let mut quit_app = false;

        ctx.input(|i| {
            // Ctrl+O: Open file
            if i.modifiers.ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::O) {
                open_dialog = true;
            }
            // Ctrl+Shift+O: Collapse or expand the outline
            if i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(egui::Key::O) {
                toggle_outline = true;
            }
            // Ctrl+W: Toggle watch
            if i.modifiers.ctrl && i.key_pressed(egui::Key::W) {
                toggle_watch = true;
            }
            // Ctrl+D: Toggle dark mode
            if i.modifiers.ctrl && i.key_pressed(egui::Key::D) {
                toggle_dark = true;
            }
            // Ctrl+Q: Quit
            if i.modifiers.ctrl && i.key_pressed(egui::Key::Q) {
                quit_app = true;
            }
        });

        if open_dialog {
            self.open_file_dialog();
        }
        if toggle_watch && self.current_file.is_some() {
            self.toggle_watching();
        }
        if toggle_dark {
            self.dark_mode = !self.dark_mode;
        }
        if toggle_outline {
            self.collapse.toggle();
        }
        if quit_app {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Handle drag and drop
        self.is_dragging = false;
        let mut dropped: Option<PathBuf> = None;
        ctx.input(|i| {
            if !i.raw.hovered_files.is_empty() {
                self.is_dragging = true;
            }
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    dropped = Some(path.clone());
                }
            }
        });
        if let Some(path) = dropped {
            if Self::is_markdown_file(&path) {
                self.load_file(&path);
            } else {
                self.error_message =
                    Some("Unsupported file type. Please drop a markdown file (.md, .markdown, .txt)".to_string());
            }
        }

        // Menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("Open...").shortcut_text("Ctrl+O")).clicked() {
                        self.open_file_dialog();
                        ui.close();
                    }

                    ui.separator();

                    let is_watching = self.watcher.is_some();
                    let watch_text = if is_watching { "✓ Watch File" } else { "Watch File" };
                    let watch_enabled = self.current_file.is_some();
                    if ui.add_enabled(watch_enabled, egui::Button::new(watch_text).shortcut_text("Ctrl+W")).clicked() {
                        self.toggle_watching();
                        ui.close();
                    }

                    ui.separator();

                    if ui.add(egui::Button::new("Quit").shortcut_text("Ctrl+Q")).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    let theme_text = if self.dark_mode { "☀ Light Mode" } else { "🌙 Dark Mode" };
                    if ui.add(egui::Button::new(theme_text).shortcut_text("Ctrl+D")).clicked() {
                        self.dark_mode = !self.dark_mode;
                        ui.close();
                    }

                    let outline_text = if self.collapse.get() { "Show Outline" } else { "✓ Show Outline" };
                    if ui.add(egui::Button::new(outline_text).shortcut_text("Ctrl+Shift+O")).clicked() {
                        self.collapse.toggle();
                        ui.close();
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.watcher.is_some() {
                        ui.label(egui::RichText::new("● LIVE").color(egui::Color32::from_rgb(100, 200, 100)));
                        ui.separator();
                    }

                    if let Some(path) = &self.current_file {
                        ui.label(
                            egui::RichText::new(path.display().to_string())
                                .small()
                                .color(ui.visuals().weak_text_color())
                        );
                    }
                });
            });
        });

        // Outline sidebar (left side)
        let has_outline = !self.outline.tree.is_empty();
        let collapsed = self.toc_sync.is_collapsed();
        let mut clicked_heading: Option<String> = None;
        if has_outline && !collapsed {
            // Use document title if available, otherwise "Contents"
            let sidebar_title = self.outline.document_title.as_deref().unwrap_or("Contents");

            egui::SidePanel::left("outline")
                .resizable(true)
                .default_width(220.0)
                .min_width(120.0)
                .max_width(400.0)
                .show(ctx, |ui| {
                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        if ui.small_button("⏴").on_hover_text("Collapse outline").clicked() {
                            self.collapse.set(true);
                        }
                        ui.add(egui::Label::new(egui::RichText::new(sidebar_title).heading()).truncate());
                    });
                    ui.separator();
                    clicked_heading = show_outline(
                        ui,
                        self.outline.tree.entries(),
                        self.toc_sync.active_id(),
                        &mut self.outline_panel,
                    );
                });
        } else {
            self.outline_panel.hide();
        }
        if has_outline && collapsed {
            // Restore button floats above the document while collapsed
            egui::Area::new(egui::Id::new("outline_restore"))
                .order(egui::Order::Foreground)
                .anchor(egui::Align2::LEFT_TOP, [8.0, 32.0])
                .show(ctx, |ui| {
                    if ui.button("☰").on_hover_text("Expand outline").clicked() {
                        self.collapse.set(false);
                    }
                });
        }

        if let Some(id) = clicked_heading {
            self.jump_to_heading(&id);
        }

        // Main content panel
        let mut clear_error = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            // Show error message if any
            if let Some(error) = &self.error_message {
                let error_text = error.clone();
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("⚠").color(egui::Color32::from_rgb(255, 200, 100)));
                    ui.label(egui::RichText::new(&error_text).color(egui::Color32::from_rgb(255, 200, 100)));
                    if ui.small_button("✕").clicked() {
                        clear_error = true;
                    }
                });
                ui.separator();
            }

            self.layout.set_heading_height(ui.text_style_height(&egui::TextStyle::Heading));

            let mut scroll_area = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .scroll_source(egui::scroll_area::ScrollSource::SCROLL_BAR | egui::scroll_area::ScrollSource::MOUSE_WHEEL);

            // Apply pending scroll offset if set
            if let Some(offset) = self.pending_scroll_offset.take() {
                scroll_area = scroll_area.vertical_scroll_offset(offset);
            }

            let mut scroll_offset = 0.0;
            let scroll_output = scroll_area.show_viewport(ui, |ui, viewport| {
                scroll_offset = viewport.min.y;

                CommonMarkViewer::new()
                    .max_image_width(Some(800))
                    .indentation_spaces(2)
                    .show_alt_text_on_hover(true)
                    .syntax_theme_dark("base16-ocean.dark")
                    .syntax_theme_light("base16-ocean.light")
                    .line_height(1.5)
                    .paragraph_spacing(1.5)
                    .heading_spacing_above(2.0)
                    .heading_spacing_below(0.5)
                    .show(ui, &mut self.cache, &self.content);
            });

            let change = self.layout.update(
                scroll_offset,
                scroll_output.inner_rect.height(),
                scroll_output.content_size.y,
            );
            if change.scrolled {
                self.toc_sync.on_scroll(scroll_offset);
            }
            if change.resized {
                self.toc_sync.on_visibility_change(&self.layout, now);
            }
        });
        if clear_error {
            self.error_message = None;
        }

        if let Some(id) = self.check_anchor_hooks() {
            self.jump_to_heading(&id);
        }

        self.toc_sync.on_frame(now, &self.layout, &mut self.outline_panel);

        if !self.toc_sync.is_collapsed() && self.outline_panel.is_animating() {
            ctx.request_repaint();
        } else if let Some(delay) = self.toc_sync.next_frame_in(now) {
            ctx.request_repaint_after(delay);
        }

        // Drag and drop overlay
        if self.is_dragging {
            let screen_rect = ctx.available_rect();
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("drop_overlay"),
            ));

            painter.rect_filled(
                screen_rect,
                0.0,
                egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180),
            );

            painter.text(
                screen_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Drop markdown file here",
                egui::FontId::proportional(24.0),
                egui::Color32::WHITE,
            );
        }
    }
}

const SAMPLE_MARKDOWN: &str = r#"# tocview

A markdown viewer whose outline follows you through the document.
Open a file with **Ctrl+O** or drop one onto the window.

## Reading

Scroll the document and watch the outline on the left: the section you
are reading is highlighted, and the outline scrolls itself so that the
highlighted entry stays in view.

### Jumping around

Click an entry in the outline to jump to that section. Links such as
[back to Reading](#reading) work the same way.

### Collapsing the outline

Press **Ctrl+Shift+O**, use the ⏴ button, or pick *View → Show Outline*
to hide the outline. The ☰ button brings it back.

## Live reload

Start with `--watch` or press **Ctrl+W** to reload the file whenever it
changes on disk. Your scroll position is kept.

## Tuning

```sh
tocview notes.md --detection threshold --header-offset 64
tocview notes.md --panel-policy direction-gated --debounce-ms 0
tocview notes.md --focal-top 0.0 --focal-bottom 0.3 --number-sections
```

Set `RUST_LOG=tocview=debug` to see section changes as they happen.

## Shortcuts

| Keys | Action |
|:-----|:-------|
| Ctrl+O | Open file |
| Ctrl+Shift+O | Collapse or expand the outline |
| Ctrl+W | Toggle live reload |
| Ctrl+D | Toggle dark mode |
| Ctrl+Q | Quit |
"#;
