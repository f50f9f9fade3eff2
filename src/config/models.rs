//! Provider settings.
//!
//! These map directly to TOML (also JSON / YAML) configuration files and
//! default every field, so an empty file is a valid configuration.
use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFIX: &str = "traefik";
pub const DEFAULT_FRONTEND_RULE: &str = "Host:{{.ServiceName}}.{{.Domain}}";

/// Process-level settings shared by every build pass.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Attribute namespace; `""` reads unprefixed `key=value` tags.
    pub prefix: String,
    /// Made available to rule templates as `.Domain`.
    pub domain: String,
    /// Whether services without an `enable` attribute are published.
    pub exposed_by_default: bool,
    /// Rule template used when a frontend carries no `frontend.rule`.
    pub frontend_rule: String,
    /// Value of `passHostHeader` when the attribute is unset.
    pub pass_host_header: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            domain: String::new(),
            exposed_by_default: true,
            frontend_rule: DEFAULT_FRONTEND_RULE.to_string(),
            pass_host_header: true,
        }
    }
}

impl ProviderConfig {
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }
}

/// Builder for [`ProviderConfig`].
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
    prefix: Option<String>,
    domain: Option<String>,
    exposed_by_default: Option<bool>,
    frontend_rule: Option<String>,
    pass_host_header: Option<bool>,
}

impl ProviderConfigBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn exposed_by_default(mut self, exposed: bool) -> Self {
        self.exposed_by_default = Some(exposed);
        self
    }

    pub fn frontend_rule(mut self, rule: impl Into<String>) -> Self {
        self.frontend_rule = Some(rule.into());
        self
    }

    pub fn pass_host_header(mut self, pass: bool) -> Self {
        self.pass_host_header = Some(pass);
        self
    }

    /// Build the final ProviderConfig
    pub fn build(self) -> Result<ProviderConfig, String> {
        let defaults = ProviderConfig::default();
        let frontend_rule = self.frontend_rule.unwrap_or(defaults.frontend_rule);
        if frontend_rule.trim().is_empty() {
            return Err("frontend_rule cannot be empty".to_string());
        }

        Ok(ProviderConfig {
            prefix: self.prefix.unwrap_or(defaults.prefix),
            domain: self.domain.unwrap_or(defaults.domain),
            exposed_by_default: self.exposed_by_default.unwrap_or(defaults.exposed_by_default),
            frontend_rule,
            pass_host_header: self.pass_host_header.unwrap_or(defaults.pass_host_header),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.prefix, "traefik");
        assert_eq!(config.domain, "");
        assert!(config.exposed_by_default);
        assert_eq!(config.frontend_rule, "Host:{{.ServiceName}}.{{.Domain}}");
        assert!(config.pass_host_header);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ProviderConfig::builder()
            .prefix("")
            .domain("localhost")
            .exposed_by_default(false)
            .build()
            .unwrap();
        assert_eq!(config.prefix, "");
        assert_eq!(config.domain, "localhost");
        assert!(!config.exposed_by_default);
        assert_eq!(config.frontend_rule, DEFAULT_FRONTEND_RULE);
    }

    #[test]
    fn builder_rejects_blank_rule() {
        assert!(ProviderConfig::builder().frontend_rule("  ").build().is_err());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: ProviderConfig = serde_json::from_str(r#"{"domain": "example.com"}"#).unwrap();
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.prefix, DEFAULT_PREFIX);
        assert!(config.exposed_by_default);
    }
}
