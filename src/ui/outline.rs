use eframe::egui;

use crate::panel::LinkBounds;
use crate::toc::TocEntry;
use crate::ui::panel::OutlinePanel;

const MAX_LABEL_CHARS: usize = 40;
const INDENT_PER_LEVEL: f32 = 12.0;

/// Draws the TOC tree inside its own scroll area, highlighting `active`.
/// Returns the id of a clicked entry.
pub fn show_outline(
    ui: &mut egui::Ui,
    entries: &[TocEntry],
    active: Option<&str>,
    panel: &mut OutlinePanel,
) -> Option<String> {
    panel.begin_frame();

    let mut scroll_area = egui::ScrollArea::vertical()
        .id_salt("outline_scroll")
        .auto_shrink([false, false])
        .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden)
        .scroll_source(egui::scroll_area::ScrollSource::SCROLL_BAR | egui::scroll_area::ScrollSource::MOUSE_WHEEL);

    if let Some(offset) = panel.next_offset() {
        scroll_area = scroll_area.vertical_scroll_offset(offset);
    }

    let output = scroll_area.show(ui, |ui| {
        let origin = ui.cursor().top();
        let mut clicked = None;
        for entry in entries {
            show_entry(ui, entry, active, origin, panel, &mut clicked);
        }
        clicked
    });

    panel.record_viewport(output.state.offset.y, output.inner_rect.height());
    output.inner
}

fn show_entry(
    ui: &mut egui::Ui,
    entry: &TocEntry,
    active: Option<&str>,
    origin: f32,
    panel: &mut OutlinePanel,
    clicked: &mut Option<String>,
) {
    // h2 = no indent, h3 = one level, etc.
    let indent = entry.depth.saturating_sub(2) as f32 * INDENT_PER_LEVEL;
    let is_active = entry.anchor().is_some() && entry.anchor() == active;

    let response = ui
        .horizontal(|ui| {
            ui.add_space(indent);
            ui.selectable_label(is_active, label_text(entry))
        })
        .inner;

    if let Some(id) = entry.anchor() {
        panel.record_link(
            id,
            LinkBounds {
                top: response.rect.top() - origin,
                height: response.rect.height(),
            },
        );
        if response.on_hover_text(entry.href()).clicked() {
            *clicked = Some(id.to_string());
        }
    }

    for child in &entry.children {
        show_entry(ui, child, active, origin, panel, clicked);
    }
}

fn label_text(entry: &TocEntry) -> String {
    let title: String = if entry.text.chars().count() > MAX_LABEL_CHARS {
        let mut short: String = entry.text.chars().take(MAX_LABEL_CHARS - 3).collect();
        short.push_str("...");
        short
    } else {
        entry.text.clone()
    };

    match &entry.number {
        Some(number) => format!("{} {}", number, title),
        None => title,
    }
}
