//! `crop-yield` library crate.
//!
//! The binary (`cropyield`) is a thin wrapper around this library so that:
//!
//! - fitting and ranking are testable without spawning processes
//! - the HTTP router can be driven in-process by integration tests
//! - the CLI and the server share one dataset workflow

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
pub mod server;
