//! CLI command implementations.

pub mod batch;
pub mod common;
pub mod devices;
pub mod info;
pub mod presets;
pub mod process;
pub mod realtime;
