pub mod config;
pub mod error;
pub mod google;
pub mod sorting;
pub mod telemetry;
