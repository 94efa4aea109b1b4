//! Input/output helpers.
//!
//! - resumable CSV salary table (`table`)

pub mod table;

pub use table::*;
