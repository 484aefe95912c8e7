//! Input helpers.
//!
//! - CSV ingest + validation + crop grouping (`ingest`)

pub mod ingest;

pub use ingest::*;
