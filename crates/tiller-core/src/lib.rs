pub mod config;
pub mod types;

pub use config::TillerConfig;
pub use types::*;
