//! External data sources.
//!
//! - Open-Meteo hourly forecast, averaged (`weather`)

pub mod weather;

pub use weather::*;
