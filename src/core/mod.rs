pub mod backend;
pub mod builder;
pub mod catalog;
pub mod compat;
pub mod frontend;
pub mod labels;
pub mod naming;
pub mod tags;
pub mod template;
pub mod types;

pub use builder::{BuildOutput, ConfigurationBuilder, Diagnostic};
pub use catalog::{CatalogUpdate, Instance, Node, ServiceUpdate};
pub use frontend::SynthError;
pub use labels::Labels;
pub use template::TemplateError;
pub use types::Configuration;
