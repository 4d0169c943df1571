//! egui rendering of the uploader window: input row, toggle, and activity log.

pub mod app;
pub mod widgets;

pub use app::UploaderApp;
