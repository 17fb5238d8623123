//! egui-side collaborators of the sync engine.

pub mod layout;
pub mod outline;
pub mod panel;

pub use layout::{DocumentLayout, LayoutChange};
pub use outline::show_outline;
pub use panel::OutlinePanel;
