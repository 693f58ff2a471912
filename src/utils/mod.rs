// src/utils/mod.rs
pub mod formatter;

pub use formatter::{format_elapsed, format_size, format_time};
