//! Frontend synthesis: one frontend per rule definition of a service.
//!
//! A service always yields its default frontend. Every `frontends.<name>.*`
//! group yields an additional frontend named `<service>-<name>`, which reuses
//! the service's frontend policy and overrides it with its own keys. The rule
//! itself is never inherited.
use std::collections::BTreeMap;

use thiserror::Error;

use super::{
    compat,
    labels::{Labels, keys, split_and_trim},
    naming,
    tags,
    template::{FuncMap, Template, TemplateContext, TemplateError, Value, args},
    types::{
        Auth, Basic, ClientTls, Digest, ErrorPage, Forward, Frontend, Headers, IpStrategy,
        RateLimit, Rate, Redirect, Route, TlsClientCertificateInfos,
        TlsClientCertificateSubjectInfos, TlsClientHeaders, WhiteList,
    },
};
use crate::config::ProviderConfig;

pub const DEFAULT_PRIORITY: i32 = 0;
pub const DEFAULT_RULE_TEMPLATE_NAME: &str = "default frontend rule";
pub const CUSTOM_RULE_TEMPLATE_NAME: &str = "custom frontend rule";

/// Reasons a frontend could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("rule evaluated to an empty string")]
    EmptyRule,
}

/// One frontend to build: its name (without the `frontend-` prefix) and the
/// labels it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendDefinition {
    pub name: String,
    pub labels: Labels,
}

/// Default definition first, then one per `frontends.<name>` group in name
/// order.
pub fn definitions(service: &str, labels: &Labels) -> Vec<FrontendDefinition> {
    let base = labels.without(keys::FRONTENDS);
    let inherited = base.without(keys::FRONTEND_RULE);

    let mut definitions = vec![FrontendDefinition {
        name: service.to_string(),
        labels: base,
    }];

    for (segment, segment_labels) in labels.segments(keys::FRONTENDS) {
        let overrides: Labels = segment_labels
            .iter()
            .map(|(key, value)| (format!("{}.{key}", keys::FRONTEND_PREFIX), value))
            .collect();
        definitions.push(FrontendDefinition {
            name: format!("{service}-{segment}"),
            labels: inherited.merged(&overrides),
        });
    }
    definitions
}

/// Fields visible to rule templates.
pub struct RuleContext<'a> {
    pub service_name: &'a str,
    pub domain: &'a str,
    pub attributes: &'a [String],
}

impl TemplateContext for RuleContext<'_> {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ServiceName" => Some(Value::Str(self.service_name.to_string())),
            "Domain" => Some(Value::Str(self.domain.to_string())),
            "Attributes" => Some(Value::List(self.attributes.to_vec())),
            _ => None,
        }
    }
}

/// Functions callable from rule templates: `getTag`, `hasTag` and the
/// prefix-scoped `getAttribute`.
pub fn rule_functions(prefix: &str) -> FuncMap {
    let prefix = prefix.to_string();
    FuncMap::new()
        .register("getTag", |a: &[Value]| {
            args::expect_arity(a, 3)?;
            Ok(Value::Str(tags::get_tag(
                args::string(a, 0)?,
                args::list(a, 1)?,
                args::string(a, 2)?,
            )))
        })
        .register("hasTag", |a: &[Value]| {
            args::expect_arity(a, 2)?;
            Ok(Value::Bool(tags::has_tag(args::string(a, 0)?, args::list(a, 1)?)))
        })
        .register("getAttribute", move |a: &[Value]| {
            args::expect_arity(a, 3)?;
            Ok(Value::Str(tags::get_attribute(
                &prefix,
                args::string(a, 0)?,
                args::list(a, 1)?,
                args::string(a, 2)?,
            )))
        })
}

/// Resolves the routing rule of a frontend definition.
///
/// The default template is compiled once; a `frontend.rule` attribute is
/// compiled on each evaluation since it differs per service.
#[derive(Debug, Clone)]
pub struct RuleResolver {
    funcs: FuncMap,
    default_rule: Template,
    domain: String,
}

impl RuleResolver {
    pub fn new(config: &ProviderConfig) -> Result<Self, TemplateError> {
        let funcs = rule_functions(&config.prefix);
        let default_rule =
            Template::compile(DEFAULT_RULE_TEMPLATE_NAME, &config.frontend_rule, &funcs)?;
        Ok(Self {
            funcs,
            default_rule,
            domain: config.domain.clone(),
        })
    }

    /// Evaluated rule with one trailing `.` removed.
    pub fn resolve(
        &self,
        definition: &FrontendDefinition,
        attributes: &[String],
    ) -> Result<String, SynthError> {
        let ctx = RuleContext {
            service_name: &definition.name,
            domain: &self.domain,
            attributes,
        };

        let rendered = match definition
            .labels
            .get(keys::FRONTEND_RULE)
            .filter(|rule| !rule.is_empty())
        {
            Some(custom) => Template::compile(CUSTOM_RULE_TEMPLATE_NAME, custom, &self.funcs)?
                .execute(&ctx)?,
            None => self.default_rule.execute(&ctx)?,
        };

        let rule = rendered.strip_suffix('.').unwrap_or(&rendered);
        if rule.is_empty() {
            return Err(SynthError::EmptyRule);
        }
        Ok(rule.to_string())
    }
}

/// Assembles the frontend for `definition`. Error-page backends are left as
/// written in the attributes.
pub fn synthesize(
    definition: &FrontendDefinition,
    rule: String,
    backend: &str,
    pass_host_header_default: bool,
) -> Frontend {
    let labels = &definition.labels;
    Frontend {
        entry_points: labels.get_slice(keys::FRONTEND_ENTRY_POINTS).unwrap_or_default(),
        backend: backend.to_string(),
        routes: BTreeMap::from([(naming::route_name(&definition.name), Route { rule })]),
        pass_host_header: labels.get_bool(keys::FRONTEND_PASS_HOST_HEADER, pass_host_header_default),
        pass_tls_cert: labels.get_bool(keys::FRONTEND_PASS_TLS_CERT, false),
        pass_tls_client_cert: tls_client_headers(labels),
        priority: labels.get_int(keys::FRONTEND_PRIORITY, DEFAULT_PRIORITY),
        white_list: white_list(labels),
        headers: headers(labels),
        errors: error_pages(labels),
        rate_limit: rate_limit(labels),
        redirect: redirect(labels),
        auth: auth(labels),
    }
}

/// Basic, Digest and Forward are tried in that order; the first group
/// present wins.
pub fn auth(labels: &Labels) -> Option<Auth> {
    if !labels.has_prefix(keys::FRONTEND_AUTH) {
        return None;
    }

    let mut auth = Auth {
        header_field: labels.get_string(keys::FRONTEND_AUTH_HEADER_FIELD, ""),
        ..Auth::default()
    };

    if compat::BASIC_USERS.is_present(labels) || labels.has_prefix(keys::FRONTEND_AUTH_BASIC) {
        auth.basic = Some(Basic {
            users: compat::BASIC_USERS.get_slice(labels).unwrap_or_default(),
            users_file: labels.get_string(keys::FRONTEND_AUTH_BASIC_USERS_FILE, ""),
            remove_header: labels.get_bool(keys::FRONTEND_AUTH_BASIC_REMOVE_HEADER, false),
        });
    } else if labels.has_prefix(keys::FRONTEND_AUTH_DIGEST) {
        auth.digest = Some(Digest {
            users: labels.get_slice(keys::FRONTEND_AUTH_DIGEST_USERS).unwrap_or_default(),
            users_file: labels.get_string(keys::FRONTEND_AUTH_DIGEST_USERS_FILE, ""),
            remove_header: labels.get_bool(keys::FRONTEND_AUTH_DIGEST_REMOVE_HEADER, false),
        });
    } else if labels.has_prefix(keys::FRONTEND_AUTH_FORWARD) {
        auth.forward = Some(forward(labels));
    }

    Some(auth)
}

fn forward(labels: &Labels) -> Forward {
    let tls = labels
        .has_prefix(keys::FRONTEND_AUTH_FORWARD_TLS)
        .then(|| ClientTls {
            ca: labels.get_string(keys::FRONTEND_AUTH_FORWARD_TLS_CA, ""),
            ca_optional: labels.get_bool(keys::FRONTEND_AUTH_FORWARD_TLS_CA_OPTIONAL, false),
            cert: labels.get_string(keys::FRONTEND_AUTH_FORWARD_TLS_CERT, ""),
            key: labels.get_string(keys::FRONTEND_AUTH_FORWARD_TLS_KEY, ""),
            insecure_skip_verify: labels
                .get_bool(keys::FRONTEND_AUTH_FORWARD_TLS_INSECURE_SKIP_VERIFY, false),
        });

    Forward {
        address: labels.get_string(keys::FRONTEND_AUTH_FORWARD_ADDRESS, ""),
        tls,
        trust_forward_header: labels
            .get_bool(keys::FRONTEND_AUTH_FORWARD_TRUST_FORWARD_HEADER, false),
        auth_response_headers: labels
            .get_slice(keys::FRONTEND_AUTH_FORWARD_AUTH_RESPONSE_HEADERS)
            .unwrap_or_default(),
    }
}

pub fn tls_client_headers(labels: &Labels) -> Option<TlsClientHeaders> {
    if !labels.has_prefix(keys::FRONTEND_PASS_TLS_CLIENT_CERT) {
        return None;
    }

    let infos = labels
        .has_prefix(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS)
        .then(|| {
            let subject = labels
                .has_prefix(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT)
                .then(|| TlsClientCertificateSubjectInfos {
                    common_name: labels
                        .get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_COMMON_NAME, false),
                    country: labels
                        .get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_COUNTRY, false),
                    locality: labels
                        .get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_LOCALITY, false),
                    organization: labels.get_bool(
                        keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_ORGANIZATION,
                        false,
                    ),
                    province: labels
                        .get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_PROVINCE, false),
                    serial_number: labels.get_bool(
                        keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_SERIAL_NUMBER,
                        false,
                    ),
                });

            TlsClientCertificateInfos {
                not_after: labels.get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_NOT_AFTER, false),
                not_before: labels
                    .get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_NOT_BEFORE, false),
                sans: labels.get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SANS, false),
                subject,
            }
        });

    Some(TlsClientHeaders {
        pem: labels.get_bool(keys::FRONTEND_PASS_TLS_CLIENT_CERT_PEM, false),
        infos,
    })
}

pub fn white_list(labels: &Labels) -> Option<WhiteList> {
    let source_range = compat::WHITELIST_SOURCE_RANGE
        .get_slice(labels)
        .filter(|ranges| !ranges.is_empty())?;

    let depth = labels.get_int(keys::FRONTEND_WHITELIST_IP_STRATEGY_DEPTH, 0);
    let excluded_ips = labels
        .get_slice(keys::FRONTEND_WHITELIST_IP_STRATEGY_EXCLUDED_IPS)
        .unwrap_or_default();
    let enabled = labels.get_bool(keys::FRONTEND_WHITELIST_IP_STRATEGY, false);

    let ip_strategy = (depth != 0 || !excluded_ips.is_empty() || enabled).then_some(IpStrategy {
        depth,
        excluded_ips,
    });

    Some(WhiteList {
        source_range,
        ip_strategy,
    })
}

pub fn headers(labels: &Labels) -> Option<Headers> {
    if !labels.has_prefix(keys::FRONTEND_HEADERS) {
        return None;
    }

    let headers = Headers {
        custom_request_headers: labels.get_map(keys::FRONTEND_REQUEST_HEADERS),
        custom_response_headers: labels.get_map(keys::FRONTEND_RESPONSE_HEADERS),
        allowed_hosts: labels.get_slice(keys::FRONTEND_ALLOWED_HOSTS),
        hosts_proxy_headers: labels.get_slice(keys::FRONTEND_HOSTS_PROXY_HEADERS),
        ssl_redirect: labels.get_bool(keys::FRONTEND_SSL_REDIRECT, false),
        ssl_temporary_redirect: labels.get_bool(keys::FRONTEND_SSL_TEMPORARY_REDIRECT, false),
        ssl_host: labels.get_string(keys::FRONTEND_SSL_HOST, ""),
        ssl_force_host: labels.get_bool(keys::FRONTEND_SSL_FORCE_HOST, false),
        ssl_proxy_headers: labels.get_map(keys::FRONTEND_SSL_PROXY_HEADERS),
        sts_seconds: labels.get_i64(keys::FRONTEND_STS_SECONDS, 0),
        sts_include_subdomains: labels.get_bool(keys::FRONTEND_STS_INCLUDE_SUBDOMAINS, false),
        sts_preload: labels.get_bool(keys::FRONTEND_STS_PRELOAD, false),
        force_sts_header: labels.get_bool(keys::FRONTEND_FORCE_STS_HEADER, false),
        frame_deny: labels.get_bool(keys::FRONTEND_FRAME_DENY, false),
        custom_frame_options_value: labels.get_string(keys::FRONTEND_CUSTOM_FRAME_OPTIONS_VALUE, ""),
        content_type_nosniff: labels.get_bool(keys::FRONTEND_CONTENT_TYPE_NOSNIFF, false),
        browser_xss_filter: labels.get_bool(keys::FRONTEND_BROWSER_XSS_FILTER, false),
        custom_browser_xss_value: labels.get_string(keys::FRONTEND_CUSTOM_BROWSER_XSS_VALUE, ""),
        content_security_policy: labels.get_string(keys::FRONTEND_CONTENT_SECURITY_POLICY, ""),
        public_key: labels.get_string(keys::FRONTEND_PUBLIC_KEY, ""),
        referrer_policy: labels.get_string(keys::FRONTEND_REFERRER_POLICY, ""),
        is_development: labels.get_bool(keys::FRONTEND_IS_DEVELOPMENT, false),
    };

    (headers.has_secure_headers_defined() || headers.has_custom_headers_defined()).then_some(headers)
}

/// Error pages keyed by page name. `backend` holds the bare service name.
pub fn error_pages(labels: &Labels) -> Option<BTreeMap<String, ErrorPage>> {
    let segments = labels.segments(keys::FRONTEND_ERRORS);
    if segments.is_empty() {
        return None;
    }

    let mut pages = BTreeMap::new();
    for (name, page_labels) in segments {
        let mut page = ErrorPage::default();
        for (suffix, value) in page_labels.iter() {
            match suffix {
                keys::ERROR_PAGE_STATUS => page.status = split_and_trim(value, ","),
                keys::ERROR_PAGE_QUERY => page.query = value.to_string(),
                keys::ERROR_PAGE_BACKEND => page.backend = value.to_string(),
                other => tracing::warn!(page = name.as_str(), suffix = other, "Invalid error page attribute"),
            }
        }
        pages.insert(name, page);
    }
    Some(pages)
}

/// Present only when an extractor function is set.
pub fn rate_limit(labels: &Labels) -> Option<RateLimit> {
    let extractor_func = labels
        .get(keys::FRONTEND_RATE_LIMIT_EXTRACTOR_FUNC)
        .filter(|f| !f.is_empty())?;

    let mut rate_set = BTreeMap::new();
    for (name, rate_labels) in labels.segments(keys::FRONTEND_RATE_LIMIT_RATE_SET) {
        for (suffix, _) in rate_labels.iter() {
            if ![keys::RATE_LIMIT_PERIOD, keys::RATE_LIMIT_AVERAGE, keys::RATE_LIMIT_BURST].contains(&suffix) {
                tracing::warn!(rate = name.as_str(), suffix, "Invalid rate limit attribute");
            }
        }
        let rate = Rate {
            period: rate_labels
                .get_duration(keys::RATE_LIMIT_PERIOD)
                .unwrap_or_default(),
            average: rate_labels.get_i64(keys::RATE_LIMIT_AVERAGE, 0),
            burst: rate_labels.get_i64(keys::RATE_LIMIT_BURST, 0),
        };
        rate_set.insert(name, rate);
    }

    Some(RateLimit {
        rate_set,
        extractor_func: extractor_func.to_string(),
    })
}

/// An entry point redirect wins over a regex redirect; the regex form needs
/// both regex and replacement.
pub fn redirect(labels: &Labels) -> Option<Redirect> {
    let permanent = labels.get_bool(keys::FRONTEND_REDIRECT_PERMANENT, false);

    if let Some(entry_point) = labels.get(keys::FRONTEND_REDIRECT_ENTRY_POINT) {
        return Some(Redirect {
            entry_point: entry_point.to_string(),
            permanent,
            ..Redirect::default()
        });
    }

    match (
        labels.get(keys::FRONTEND_REDIRECT_REGEX),
        labels.get(keys::FRONTEND_REDIRECT_REPLACEMENT),
    ) {
        (Some(regex), Some(replacement)) => Some(Redirect {
            regex: regex.to_string(),
            replacement: replacement.to_string(),
            permanent,
            ..Redirect::default()
        }),
        _ => None,
    }
}
