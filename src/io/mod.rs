//! Input/output helpers.
//!
//! - comparison exports (CSV) (`export`)
//! - result JSON read/write (`json`)

pub mod export;
pub mod json;

pub use export::*;
pub use json::*;
