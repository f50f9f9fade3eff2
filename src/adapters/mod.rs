pub mod file_catalog;

pub use file_catalog::{CatalogSnapshot, FileCatalogSource};
