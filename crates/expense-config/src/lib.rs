//! expense-config
//!
//! Engine configuration model: tolerance, remainder policy, per-category
//! rules and display locale, plus JSON persistence of that configuration.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{CategoryRules, EngineConfig};
