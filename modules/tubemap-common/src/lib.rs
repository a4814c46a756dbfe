pub mod config;
pub mod error;
pub mod rules;
pub mod text;
pub mod types;

pub use config::AppConfig;
pub use error::{CatalogError, ConfigError};
pub use rules::CurationRules;
pub use types::*;
