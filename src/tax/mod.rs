//! Local income tax computation.

pub mod brackets;

pub use brackets::*;
