//! Configuration builder: lowers a catalog snapshot into a [`Configuration`].
//!
//! A build pass is a pure function of the snapshot and the provider settings
//! captured at construction. A problem confined to one frontend is recorded as
//! a [`Diagnostic`]; it never aborts the other frontends or services.
use std::fmt;

use super::{
    backend,
    catalog::CatalogUpdate,
    frontend::{self, RuleResolver, SynthError},
    labels::{Labels, keys, parse_bool},
    naming,
    template::TemplateError,
    types::{Backend, Configuration, Frontend},
};
use crate::config::ProviderConfig;

/// A frontend that could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub service: String,
    pub frontend: String,
    pub error: SynthError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service {} frontend {}: {}", self.service, self.frontend, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub configuration: Configuration,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles the default rule once and reuses it for every build.
///
/// The builder holds no mutable state, so one instance can serve concurrent
/// builds from several threads.
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    config: ProviderConfig,
    rules: RuleResolver,
}

impl ConfigurationBuilder {
    /// Fails when the default rule template does not compile.
    pub fn new(config: ProviderConfig) -> Result<Self, TemplateError> {
        let rules = RuleResolver::new(&config)?;
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn build(&self, catalog: &[CatalogUpdate]) -> BuildOutput {
        let mut output = BuildOutput::default();

        for update in catalog {
            let span = tracing::info_span!("service", name = update.service.name.as_str());
            let _enter = span.enter();
            self.build_service(update, &mut output);
        }

        tracing::debug!(
            frontends = output.configuration.frontends.len(),
            backends = output.configuration.backends.len(),
            diagnostics = output.diagnostics.len(),
            "Configuration built"
        );
        output
    }

    fn build_service(&self, update: &CatalogUpdate, output: &mut BuildOutput) {
        let service = update.service.name.as_str();
        let labels = Labels::from_tags(&update.service.attributes, &self.config.prefix);

        if !self.is_enabled(&labels) {
            tracing::debug!("Service disabled, skipping");
            return;
        }

        let Some((backend_name, backend)) =
            backend::synthesize(update, &labels, &self.config.prefix)
        else {
            return;
        };

        for definition in frontend::definitions(service, &labels) {
            let frontend_name = naming::frontend_name(&definition.name);
            match self.rules.resolve(&definition, &update.service.attributes) {
                Ok(rule) => {
                    let mut frontend = frontend::synthesize(
                        &definition,
                        rule,
                        &backend_name,
                        self.config.pass_host_header,
                    );
                    resolve_references(&mut frontend);
                    if output
                        .configuration
                        .frontends
                        .insert(frontend_name.clone(), frontend)
                        .is_some()
                    {
                        tracing::warn!(frontend = frontend_name.as_str(), "Duplicate frontend name, keeping the last one");
                    }
                }
                Err(error) => {
                    tracing::error!(frontend = frontend_name.as_str(), error = %error, "Unable to build frontend rule, skipping frontend");
                    output.diagnostics.push(Diagnostic {
                        service: service.to_string(),
                        frontend: frontend_name,
                        error,
                    });
                }
            }
        }

        match output.configuration.backends.get_mut(&backend_name) {
            Some(existing) => merge_backend(existing, backend),
            None => {
                output.configuration.backends.insert(backend_name, backend);
            }
        }
    }

    /// An unparsable `enable` attribute falls back to `exposed_by_default`.
    fn is_enabled(&self, labels: &Labels) -> bool {
        match labels.get(keys::ENABLE) {
            None | Some("") => self.config.exposed_by_default,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                tracing::warn!(value = raw, "Invalid enable attribute, using exposed_by_default");
                self.config.exposed_by_default
            }),
        }
    }
}

/// Error-page backends name a service; point them at its backend.
fn resolve_references(frontend: &mut Frontend) {
    if let Some(errors) = frontend.errors.as_mut() {
        for page in errors.values_mut() {
            if !page.backend.is_empty() {
                page.backend = backend::reference(&page.backend);
            }
        }
    }
}

/// Services sharing a backend through the `backend` override pool their
/// servers. Policy groups already set are kept.
fn merge_backend(existing: &mut Backend, other: Backend) {
    existing.servers.extend(other.servers);
    existing.circuit_breaker = existing.circuit_breaker.take().or(other.circuit_breaker);
    existing.load_balancer = existing.load_balancer.take().or(other.load_balancer);
    existing.max_conn = existing.max_conn.take().or(other.max_conn);
    existing.health_check = existing.health_check.take().or(other.health_check);
    existing.buffering = existing.buffering.take().or(other.buffering);
    existing.response_forwarding = existing
        .response_forwarding
        .take()
        .or(other.response_forwarding);
}
