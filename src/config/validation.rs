use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::models::ProviderConfig,
    core::frontend::RuleResolver,
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

static HOSTNAME_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$")
});

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid frontend rule template: {message}")]
    InvalidTemplate { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Provider configuration validator
pub struct ProviderConfigValidator;

impl ProviderConfigValidator {
    /// Validate the entire provider configuration
    pub fn validate(config: &ProviderConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_prefix(&config.prefix) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_domain(&config.domain) {
            errors.push(e);
        }

        if let Err(e) = RuleResolver::new(config) {
            errors.push(ValidationError::InvalidTemplate {
                message: e.to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_prefix(prefix: &str) -> ValidationResult<()> {
        if prefix.contains('=') || prefix.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidField {
                field: "prefix".to_string(),
                message: format!("Prefix '{prefix}' must not contain '=' or whitespace"),
            });
        }
        if prefix.ends_with('.') {
            return Err(ValidationError::InvalidField {
                field: "prefix".to_string(),
                message: "Prefix must not end with '.' (the separator is added automatically)"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// An empty domain is allowed; rules then end in a trimmed `.`.
    fn validate_domain(domain: &str) -> ValidationResult<()> {
        if domain.is_empty() {
            return Ok(());
        }

        if domain.contains("://") {
            return Err(ValidationError::InvalidField {
                field: "domain".to_string(),
                message: "Domain should not contain protocol (e.g., use 'example.com' not 'http://example.com')".to_string(),
            });
        }

        let hostname_regex = HOSTNAME_REGEX
            .as_ref()
            .map_err(|e| ValidationError::ValidationFailed {
                message: format!("hostname pattern failed to compile: {e}"),
            })?;

        if !hostname_regex.is_match(domain) {
            return Err(ValidationError::InvalidField {
                field: "domain".to_string(),
                message: format!("Invalid hostname format: '{domain}'"),
            });
        }

        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
