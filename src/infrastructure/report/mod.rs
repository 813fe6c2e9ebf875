//! Health report persistence and rendering.

pub mod render;
pub mod store;

pub use render::render_report;
pub use store::ReportStore;
