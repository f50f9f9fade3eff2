pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{load_config, load_config_sync};
pub use models::*;
pub use validation::{ProviderConfigValidator, ValidationError, ValidationResult};
