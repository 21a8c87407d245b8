// Market Research Assistant - API Core
//
// HTTP surface and CLI around the market-research pipeline.
// Report generation itself lives in the market-research crate.

pub mod config;
pub mod server;

pub use config::*;
