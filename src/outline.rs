//! Builds the TOC tree from markdown source.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::toc::{TocEntry, TocTree};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("heading pattern is valid"));

/// A markdown ATX heading
#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub title: String,
    pub line_number: usize,
    pub id: Option<String>,
}

/// Result of parsing markdown headings
#[derive(Debug, Default)]
pub struct Outline {
    /// Document title (first h1, if any)
    pub document_title: Option<String>,
    /// Outline headings in document order (excludes the first h1)
    pub headings: Vec<Heading>,
    pub tree: TocTree,
}

/// Parse markdown headings from content, skipping code blocks.
/// Extracts the first h1 as document title and nests the rest by level.
pub fn parse_outline(content: &str, number_sections: bool) -> Outline {
    let mut all_headings = Vec::new();
    let mut in_code_block = false;

    for (line_number, line) in content.lines().enumerate() {
        // Toggle code block state on fence lines
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            all_headings.push(Heading {
                level: caps[1].len() as u8,
                title: caps[2].trim().to_string(),
                line_number,
                id: None,
            });
        }
    }

    // Extract first h1 as document title, keep rest for outline
    let first_h1_idx = all_headings.iter().position(|h| h.level == 1);
    let document_title = first_h1_idx.map(|idx| all_headings[idx].title.clone());

    let mut used = HashSet::new();
    let headings: Vec<Heading> = all_headings
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != first_h1_idx)
        .map(|(_, mut h)| {
            h.id = unique_slug(&h.title, &mut used);
            h
        })
        .collect();

    let mut entries = Vec::new();
    for heading in &headings {
        insert_entry(
            &mut entries,
            TocEntry {
                id: heading.id.clone(),
                text: heading.title.clone(),
                depth: heading.level,
                number: None,
                children: Vec::new(),
            },
        );
    }
    if number_sections {
        assign_numbers(&mut entries, "");
    }

    let tree = TocTree::new(entries).unwrap_or_else(|e| {
        log::error!("Discarding outline: {}", e);
        TocTree::default()
    });

    Outline {
        document_title,
        headings,
        tree,
    }
}

/// Appends `entry` under the deepest trailing entry with a smaller depth.
fn insert_entry(entries: &mut Vec<TocEntry>, entry: TocEntry) {
    match entries.last_mut() {
        Some(last) if last.depth < entry.depth => insert_entry(&mut last.children, entry),
        _ => entries.push(entry),
    }
}

fn assign_numbers(entries: &mut [TocEntry], prefix: &str) {
    for (i, entry) in entries.iter_mut().enumerate() {
        let number = format!("{}{}", prefix, i + 1);
        assign_numbers(&mut entry.children, &format!("{}.", number));
        entry.number = Some(number);
    }
}

/// GitHub-style anchor slug: lowercase alphanumerics, `-` and `_` kept,
/// whitespace turned into `-`, everything else dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if ch == '-' || ch == '_' {
            slug.push(ch);
        } else if ch.is_whitespace() {
            slug.push('-');
        }
    }
    slug
}

fn unique_slug(title: &str, used: &mut HashSet<String>) -> Option<String> {
    let base = slugify(title);
    if base.is_empty() {
        return None;
    }
    let mut candidate = base.clone();
    let mut suffix = 1;
    while used.contains(&candidate) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    used.insert(candidate.clone());
    Some(candidate)
}
