//! Catalog Synth - routing configuration from service-discovery labels.
//!
//! Given a snapshot of a service catalog (services with their attribute tags,
//! and the instances discovered for each), the crate produces the frontends
//! and backends consumed by a reverse-proxy router. Attribute keys live under
//! a configurable prefix (`traefik` by default):
//!
//! - `backend.*` keys shape the server pool policy (load balancing,
//!   health check, circuit breaker, max connections, buffering),
//! - `frontend.*` keys shape the default frontend (rule, auth, headers,
//!   TLS client certificates, whitelist, rate limit, error pages, redirect),
//! - `frontends.<name>.*` keys add further frontends sharing the backend.
//!
//! # Quick Example
//! ```no_run
//! use catalog_synth::{
//!     config::ProviderConfig,
//!     core::{CatalogUpdate, ConfigurationBuilder, Instance, ServiceUpdate},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let builder = ConfigurationBuilder::new(ProviderConfig::default())?;
//! let snapshot = vec![CatalogUpdate::new(
//!     ServiceUpdate::new("api", vec!["traefik.frontend.rule=Host:api.example.com".into()]),
//!     vec![Instance::new("10.0.0.1", 8080, vec![])],
//! )];
//! let output = builder.build(&snapshot);
//! assert!(output.configuration.frontends.contains_key("frontend-api"));
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The pure engine lives in `core`. The discovery collaborator is modeled by
//! the [`ports::CatalogSource`] trait; `adapters` holds a file-backed
//! implementation used by the binary.
//!
//! # Error Handling
//! Engine errors are typed (`TemplateError`, `SynthError`). A build never
//! fails as a whole: frontends whose rule cannot be evaluated are reported as
//! diagnostics next to the configuration. Application code uses
//! `eyre::Result` with context attached through `WrapErr`.
pub mod config;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::FileCatalogSource,
    config::ProviderConfig,
    core::{BuildOutput, ConfigurationBuilder, Diagnostic},
    ports::CatalogSource,
};
