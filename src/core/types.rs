//! Routing configuration produced by a build pass.
//!
//! Field names serialize in the camelCase form the consuming router reads.
//! All maps are `BTreeMap` so that identical input serializes to identical
//! bytes.
use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

/// The full artifact of one build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub backends: BTreeMap<String, Backend>,
    #[serde(default)]
    pub frontends: BTreeMap<String, Frontend>,
}

impl Configuration {
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty() && self.frontends.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    #[serde(default)]
    pub servers: BTreeMap<String, Server>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreaker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_conn: Option<MaxConn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffering: Option<Buffering>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_forwarding: Option<ResponseForwarding>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    pub weight: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<Stickiness>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stickiness {
    #[serde(default)]
    pub cookie_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxConn {
    pub amount: i64,
    pub extractor_func: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub scheme: String,
    pub path: String,
    #[serde(default)]
    pub port: i32,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffering {
    #[serde(default)]
    pub max_request_body_bytes: i64,
    #[serde(default)]
    pub mem_request_body_bytes: i64,
    #[serde(default)]
    pub max_response_body_bytes: i64,
    #[serde(default)]
    pub mem_response_body_bytes: i64,
    #[serde(default)]
    pub retry_expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseForwarding {
    pub flush_interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontend {
    /// Always serialized, even when empty.
    #[serde(default)]
    pub entry_points: Vec<String>,
    pub backend: String,
    #[serde(default)]
    pub routes: BTreeMap<String, Route>,
    #[serde(default)]
    pub pass_host_header: bool,
    #[serde(default, rename = "passTLSCert")]
    pub pass_tls_cert: bool,
    #[serde(
        default,
        rename = "passTLSClientCert",
        skip_serializing_if = "Option::is_none"
    )]
    pub pass_tls_client_cert: Option<TlsClientHeaders>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_list: Option<WhiteList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, ErrorPage>>,
    #[serde(default, rename = "ratelimit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub rule: String,
}

/// Authentication policy. At most one of `basic`, `digest`, `forward` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<Basic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<Forward>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub header_field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basic {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub users_file: String,
    #[serde(default)]
    pub remove_header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub users_file: String,
    #[serde(default)]
    pub remove_header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forward {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTls>,
    #[serde(default)]
    pub trust_forward_header: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_response_headers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTls {
    #[serde(default)]
    pub ca: String,
    #[serde(default)]
    pub ca_optional: bool,
    #[serde(default)]
    pub cert: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsClientHeaders {
    #[serde(default)]
    pub pem: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infos: Option<TlsClientCertificateInfos>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsClientCertificateInfos {
    #[serde(default)]
    pub not_after: bool,
    #[serde(default)]
    pub not_before: bool,
    #[serde(default)]
    pub sans: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<TlsClientCertificateSubjectInfos>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsClientCertificateSubjectInfos {
    #[serde(default)]
    pub common_name: bool,
    #[serde(default)]
    pub country: bool,
    #[serde(default)]
    pub locality: bool,
    #[serde(default)]
    pub organization: bool,
    #[serde(default)]
    pub province: bool,
    #[serde(default)]
    pub serial_number: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteList {
    pub source_range: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_strategy: Option<IpStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpStrategy {
    #[serde(default)]
    pub depth: i32,
    #[serde(default, rename = "excludedIPs")]
    pub excluded_ips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_request_headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_response_headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts_proxy_headers: Option<Vec<String>>,
    #[serde(default, rename = "sslRedirect")]
    pub ssl_redirect: bool,
    #[serde(default, rename = "sslTemporaryRedirect")]
    pub ssl_temporary_redirect: bool,
    #[serde(default, rename = "sslHost", skip_serializing_if = "String::is_empty")]
    pub ssl_host: String,
    #[serde(default, rename = "sslForceHost")]
    pub ssl_force_host: bool,
    #[serde(
        default,
        rename = "sslProxyHeaders",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssl_proxy_headers: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "stsSeconds")]
    pub sts_seconds: i64,
    #[serde(default, rename = "stsIncludeSubdomains")]
    pub sts_include_subdomains: bool,
    #[serde(default, rename = "stsPreload")]
    pub sts_preload: bool,
    #[serde(default, rename = "forceSTSHeader")]
    pub force_sts_header: bool,
    #[serde(default)]
    pub frame_deny: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub custom_frame_options_value: String,
    #[serde(default)]
    pub content_type_nosniff: bool,
    #[serde(default, rename = "browserXSSFilter")]
    pub browser_xss_filter: bool,
    #[serde(
        default,
        rename = "customBrowserXSSValue",
        skip_serializing_if = "String::is_empty"
    )]
    pub custom_browser_xss_value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_security_policy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referrer_policy: String,
    #[serde(default)]
    pub is_development: bool,
}

impl Headers {
    /// Whether any custom request/response header is configured.
    pub fn has_custom_headers_defined(&self) -> bool {
        self.custom_request_headers
            .as_ref()
            .is_some_and(|h| !h.is_empty())
            || self
                .custom_response_headers
                .as_ref()
                .is_some_and(|h| !h.is_empty())
    }

    /// Whether any security-related header option is configured.
    pub fn has_secure_headers_defined(&self) -> bool {
        self.allowed_hosts.as_ref().is_some_and(|h| !h.is_empty())
            || self
                .hosts_proxy_headers
                .as_ref()
                .is_some_and(|h| !h.is_empty())
            || self.ssl_redirect
            || self.ssl_temporary_redirect
            || self.ssl_force_host
            || !self.ssl_host.is_empty()
            || self.ssl_proxy_headers.as_ref().is_some_and(|h| !h.is_empty())
            || self.sts_seconds != 0
            || self.sts_include_subdomains
            || self.sts_preload
            || self.force_sts_header
            || self.frame_deny
            || !self.custom_frame_options_value.is_empty()
            || self.content_type_nosniff
            || self.browser_xss_filter
            || !self.custom_browser_xss_value.is_empty()
            || !self.content_security_policy.is_empty()
            || !self.public_key.is_empty()
            || !self.referrer_policy.is_empty()
            || self.is_development
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPage {
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    #[serde(default, rename = "rateset")]
    pub rate_set: BTreeMap<String, Rate>,
    pub extractor_func: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(with = "duration_format", default)]
    pub period: Duration,
    #[serde(default)]
    pub average: i64,
    #[serde(default)]
    pub burst: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub replacement: String,
    #[serde(default)]
    pub permanent: bool,
}

/// Durations serialize as humantime strings (`"6s"`, `"1m 30s"`).
mod duration_format {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}
