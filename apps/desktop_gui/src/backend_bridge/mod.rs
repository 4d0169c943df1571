//! Bridge between the view and the uploader host: command queue, worker runtime, native picker.

pub mod commands;
pub mod picker;
pub mod runtime;
