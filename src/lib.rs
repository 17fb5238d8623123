//! # tocview
//!
//! A table of contents that follows the reader. Given a document's heading
//! tree, the sync engine works out which heading is currently being read,
//! highlights it, and keeps it visible in a separately scrolled side panel.
//!
//! ```text
//! markdown ─► outline ─► TocTree ─► ids ─► detector ─► active id ─┬─► panel sync (auto-scroll)
//!                                           ▲   ▲                 └─► renderer (highlight)
//!                             scroll offsets │   │ heading geometry
//!                      (direction, throttled)    (VisibilitySource)
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`toc`] | TOC tree model and the flattened id sequence |
//! | [`outline`] | Heading extraction from markdown into a TOC tree |
//! | [`direction`] | Up/down classification of scroll offsets |
//! | [`throttle`] | One detection pass per frame |
//! | [`visibility`] | Heading geometry trait and focal region |
//! | [`detector`] | Active section detection strategies |
//! | [`panel`] | Debounced smooth auto-scroll of the TOC panel |
//! | [`engine`] | [`TocSync`], which wires the above together |
//! | [`collapse`] | Process-wide collapsed/expanded panel state |
//! | [`config`] | Tunables, validation and CLI flags |
//! | [`ui`] | egui implementations of the engine's collaborators |
//!
//! Everything except [`collapse`] runs on the UI thread and is driven by
//! the host: scroll offsets through [`TocSync::on_scroll`], frame ticks
//! through [`TocSync::on_frame`]. Timers are deadlines checked against the
//! `Instant` passed in, so there is nothing to spawn or cancel from outside.

pub mod collapse;
pub mod config;
pub mod detector;
pub mod direction;
pub mod engine;
pub mod error;
pub mod outline;
pub mod panel;
pub mod registry;
pub mod throttle;
pub mod toc;
pub mod ui;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use collapse::{CollapseStore, CollapseView, Subscription};
pub use config::{DetectionMode, SyncArgs, SyncConfig};
pub use detector::{ActiveSectionDetector, Strategy};
pub use direction::{DirectionHandle, ScrollDirection, ScrollDirectionTracker};
pub use engine::TocSync;
pub use error::{Result, SyncError};
pub use panel::{LinkBounds, PanelPolicy, PanelSynchronizer, TocPanel};
pub use toc::{flatten_ids, TocEntry, TocTree};
pub use visibility::{FocalRegion, HeadingBounds, VisibilitySource};
