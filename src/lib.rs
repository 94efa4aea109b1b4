//! `supernet-curves` library crate.
//!
//! The binary (`supernet`) is a thin wrapper around this library so that:
//!
//! - the fetch loop and chart derivations are testable without spawning processes
//! - the remote transport and sleeps can be swapped for fakes in tests

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tax;
