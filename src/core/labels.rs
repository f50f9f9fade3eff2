//! Typed view over prefix-scoped attributes.
//!
//! [`Labels`] keeps only `<prefix>.<key>=<value>` tags, stores them under the
//! unprefixed key, and exposes typed getters. Getters never fail: a value
//! that does not parse is logged and the caller's default is returned.
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

/// Unprefixed attribute keys understood by the synthesizers.
pub mod keys {
    pub const BACKEND: &str = "backend";
    pub const ENABLE: &str = "enable";
    pub const PROTOCOL: &str = "protocol";
    pub const WEIGHT: &str = "weight";

    pub const BACKEND_PREFIX: &str = "backend";
    pub const BACKEND_CIRCUIT_BREAKER_EXPRESSION: &str = "backend.circuitbreaker.expression";
    pub const BACKEND_HEALTH_CHECK_SCHEME: &str = "backend.healthcheck.scheme";
    pub const BACKEND_HEALTH_CHECK_PATH: &str = "backend.healthcheck.path";
    pub const BACKEND_HEALTH_CHECK_PORT: &str = "backend.healthcheck.port";
    pub const BACKEND_HEALTH_CHECK_INTERVAL: &str = "backend.healthcheck.interval";
    pub const BACKEND_HEALTH_CHECK_TIMEOUT: &str = "backend.healthcheck.timeout";
    pub const BACKEND_HEALTH_CHECK_HOSTNAME: &str = "backend.healthcheck.hostname";
    pub const BACKEND_HEALTH_CHECK_HEADERS: &str = "backend.healthcheck.headers";
    pub const BACKEND_LOAD_BALANCER: &str = "backend.loadbalancer";
    pub const BACKEND_LOAD_BALANCER_METHOD: &str = "backend.loadbalancer.method";
    pub const BACKEND_LOAD_BALANCER_STICKY: &str = "backend.loadbalancer.sticky";
    pub const BACKEND_LOAD_BALANCER_STICKINESS: &str = "backend.loadbalancer.stickiness";
    pub const BACKEND_LOAD_BALANCER_STICKINESS_COOKIE_NAME: &str =
        "backend.loadbalancer.stickiness.cookieName";
    pub const BACKEND_MAX_CONN_AMOUNT: &str = "backend.maxconn.amount";
    pub const BACKEND_MAX_CONN_EXTRACTOR_FUNC: &str = "backend.maxconn.extractorfunc";
    pub const BACKEND_BUFFERING: &str = "backend.buffering";
    pub const BACKEND_BUFFERING_MAX_REQUEST_BODY_BYTES: &str =
        "backend.buffering.maxRequestBodyBytes";
    pub const BACKEND_BUFFERING_MEM_REQUEST_BODY_BYTES: &str =
        "backend.buffering.memRequestBodyBytes";
    pub const BACKEND_BUFFERING_MAX_RESPONSE_BODY_BYTES: &str =
        "backend.buffering.maxResponseBodyBytes";
    pub const BACKEND_BUFFERING_MEM_RESPONSE_BODY_BYTES: &str =
        "backend.buffering.memResponseBodyBytes";
    pub const BACKEND_BUFFERING_RETRY_EXPRESSION: &str = "backend.buffering.retryExpression";
    pub const BACKEND_RESPONSE_FORWARDING_FLUSH_INTERVAL: &str =
        "backend.responseForwarding.flushInterval";

    pub const FRONTEND_PREFIX: &str = "frontend";
    pub const FRONTENDS: &str = "frontends";
    pub const FRONTEND_RULE: &str = "frontend.rule";
    pub const FRONTEND_ENTRY_POINTS: &str = "frontend.entryPoints";
    pub const FRONTEND_PRIORITY: &str = "frontend.priority";
    pub const FRONTEND_PASS_HOST_HEADER: &str = "frontend.passHostHeader";
    pub const FRONTEND_PASS_TLS_CERT: &str = "frontend.passTLSCert";

    pub const FRONTEND_AUTH: &str = "frontend.auth";
    pub const FRONTEND_AUTH_HEADER_FIELD: &str = "frontend.auth.headerField";
    pub const FRONTEND_AUTH_BASIC: &str = "frontend.auth.basic";
    pub const FRONTEND_AUTH_BASIC_REMOVE_HEADER: &str = "frontend.auth.basic.removeHeader";
    pub const FRONTEND_AUTH_BASIC_USERS: &str = "frontend.auth.basic.users";
    pub const FRONTEND_AUTH_BASIC_USERS_FILE: &str = "frontend.auth.basic.usersFile";
    pub const FRONTEND_AUTH_DIGEST: &str = "frontend.auth.digest";
    pub const FRONTEND_AUTH_DIGEST_REMOVE_HEADER: &str = "frontend.auth.digest.removeHeader";
    pub const FRONTEND_AUTH_DIGEST_USERS: &str = "frontend.auth.digest.users";
    pub const FRONTEND_AUTH_DIGEST_USERS_FILE: &str = "frontend.auth.digest.usersFile";
    pub const FRONTEND_AUTH_FORWARD: &str = "frontend.auth.forward";
    pub const FRONTEND_AUTH_FORWARD_ADDRESS: &str = "frontend.auth.forward.address";
    pub const FRONTEND_AUTH_FORWARD_AUTH_RESPONSE_HEADERS: &str =
        "frontend.auth.forward.authResponseHeaders";
    pub const FRONTEND_AUTH_FORWARD_TRUST_FORWARD_HEADER: &str =
        "frontend.auth.forward.trustForwardHeader";
    pub const FRONTEND_AUTH_FORWARD_TLS: &str = "frontend.auth.forward.tls";
    pub const FRONTEND_AUTH_FORWARD_TLS_CA: &str = "frontend.auth.forward.tls.ca";
    pub const FRONTEND_AUTH_FORWARD_TLS_CA_OPTIONAL: &str = "frontend.auth.forward.tls.caOptional";
    pub const FRONTEND_AUTH_FORWARD_TLS_CERT: &str = "frontend.auth.forward.tls.cert";
    pub const FRONTEND_AUTH_FORWARD_TLS_KEY: &str = "frontend.auth.forward.tls.key";
    pub const FRONTEND_AUTH_FORWARD_TLS_INSECURE_SKIP_VERIFY: &str =
        "frontend.auth.forward.tls.insecureSkipVerify";

    pub const FRONTEND_HEADERS: &str = "frontend.headers";
    pub const FRONTEND_REQUEST_HEADERS: &str = "frontend.headers.customRequestHeaders";
    pub const FRONTEND_RESPONSE_HEADERS: &str = "frontend.headers.customResponseHeaders";
    pub const FRONTEND_ALLOWED_HOSTS: &str = "frontend.headers.allowedHosts";
    pub const FRONTEND_HOSTS_PROXY_HEADERS: &str = "frontend.headers.hostsProxyHeaders";
    pub const FRONTEND_SSL_FORCE_HOST: &str = "frontend.headers.SSLForceHost";
    pub const FRONTEND_SSL_REDIRECT: &str = "frontend.headers.SSLRedirect";
    pub const FRONTEND_SSL_TEMPORARY_REDIRECT: &str = "frontend.headers.SSLTemporaryRedirect";
    pub const FRONTEND_SSL_HOST: &str = "frontend.headers.SSLHost";
    pub const FRONTEND_SSL_PROXY_HEADERS: &str = "frontend.headers.SSLProxyHeaders";
    pub const FRONTEND_STS_SECONDS: &str = "frontend.headers.STSSeconds";
    pub const FRONTEND_STS_INCLUDE_SUBDOMAINS: &str = "frontend.headers.STSIncludeSubdomains";
    pub const FRONTEND_STS_PRELOAD: &str = "frontend.headers.STSPreload";
    pub const FRONTEND_FORCE_STS_HEADER: &str = "frontend.headers.forceSTSHeader";
    pub const FRONTEND_FRAME_DENY: &str = "frontend.headers.frameDeny";
    pub const FRONTEND_CUSTOM_FRAME_OPTIONS_VALUE: &str = "frontend.headers.customFrameOptionsValue";
    pub const FRONTEND_CONTENT_TYPE_NOSNIFF: &str = "frontend.headers.contentTypeNosniff";
    pub const FRONTEND_BROWSER_XSS_FILTER: &str = "frontend.headers.browserXSSFilter";
    pub const FRONTEND_CUSTOM_BROWSER_XSS_VALUE: &str = "frontend.headers.customBrowserXSSValue";
    pub const FRONTEND_CONTENT_SECURITY_POLICY: &str = "frontend.headers.contentSecurityPolicy";
    pub const FRONTEND_PUBLIC_KEY: &str = "frontend.headers.publicKey";
    pub const FRONTEND_REFERRER_POLICY: &str = "frontend.headers.referrerPolicy";
    pub const FRONTEND_IS_DEVELOPMENT: &str = "frontend.headers.isDevelopment";

    pub const FRONTEND_PASS_TLS_CLIENT_CERT: &str = "frontend.passTLSClientCert";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_PEM: &str = "frontend.passTLSClientCert.pem";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS: &str = "frontend.passTLSClientCert.infos";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_NOT_AFTER: &str =
        "frontend.passTLSClientCert.infos.notAfter";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_NOT_BEFORE: &str =
        "frontend.passTLSClientCert.infos.notBefore";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SANS: &str =
        "frontend.passTLSClientCert.infos.sans";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT: &str =
        "frontend.passTLSClientCert.infos.subject";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_COMMON_NAME: &str =
        "frontend.passTLSClientCert.infos.subject.commonName";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_COUNTRY: &str =
        "frontend.passTLSClientCert.infos.subject.country";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_LOCALITY: &str =
        "frontend.passTLSClientCert.infos.subject.locality";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_ORGANIZATION: &str =
        "frontend.passTLSClientCert.infos.subject.organization";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_PROVINCE: &str =
        "frontend.passTLSClientCert.infos.subject.province";
    pub const FRONTEND_PASS_TLS_CLIENT_CERT_INFOS_SUBJECT_SERIAL_NUMBER: &str =
        "frontend.passTLSClientCert.infos.subject.serialNumber";

    pub const FRONTEND_WHITELIST_SOURCE_RANGE_LEGACY: &str = "frontend.whitelistSourceRange";
    pub const FRONTEND_WHITELIST_SOURCE_RANGE: &str = "frontend.whiteList.sourceRange";
    pub const FRONTEND_WHITELIST_IP_STRATEGY: &str = "frontend.whiteList.ipStrategy";
    pub const FRONTEND_WHITELIST_IP_STRATEGY_DEPTH: &str = "frontend.whiteList.ipStrategy.depth";
    pub const FRONTEND_WHITELIST_IP_STRATEGY_EXCLUDED_IPS: &str =
        "frontend.whiteList.ipStrategy.excludedIPs";

    pub const FRONTEND_REDIRECT_ENTRY_POINT: &str = "frontend.redirect.entryPoint";
    pub const FRONTEND_REDIRECT_REGEX: &str = "frontend.redirect.regex";
    pub const FRONTEND_REDIRECT_REPLACEMENT: &str = "frontend.redirect.replacement";
    pub const FRONTEND_REDIRECT_PERMANENT: &str = "frontend.redirect.permanent";

    pub const FRONTEND_ERRORS: &str = "frontend.errors";
    pub const ERROR_PAGE_STATUS: &str = "status";
    pub const ERROR_PAGE_BACKEND: &str = "backend";
    pub const ERROR_PAGE_QUERY: &str = "query";

    pub const FRONTEND_RATE_LIMIT_EXTRACTOR_FUNC: &str = "frontend.rateLimit.extractorFunc";
    pub const FRONTEND_RATE_LIMIT_RATE_SET: &str = "frontend.rateLimit.rateSet";
    pub const RATE_LIMIT_PERIOD: &str = "period";
    pub const RATE_LIMIT_AVERAGE: &str = "average";
    pub const RATE_LIMIT_BURST: &str = "burst";
}

/// Prefix-stripped attribute map. Later duplicates override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    entries: BTreeMap<String, String>,
}

impl Labels {
    /// Keeps the `key=value` tags that live under `prefix` and strips the
    /// prefix. With an empty prefix every `key=value` tag is kept.
    pub fn from_tags(tags: &[String], prefix: &str) -> Self {
        let mut entries = BTreeMap::new();
        for tag in tags {
            let Some((key, value)) = tag.split_once('=') else {
                continue;
            };
            let key = if prefix.is_empty() {
                key
            } else {
                match key
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    Some(stripped) => stripped,
                    None => continue,
                }
            };
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.to_string());
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` or any key nested under `key.` is present.
    pub fn has_prefix(&self, key: &str) -> bool {
        self.entries
            .keys()
            .any(|k| k == key || is_nested_under(k, key))
    }

    pub fn get_string(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value).to_string()
    }

    pub fn get_bool(&self, key: &str, default_value: bool) -> bool {
        match self.get(key) {
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                tracing::warn!(key, value = raw, "Unable to parse boolean attribute, using default");
                default_value
            }),
            None => default_value,
        }
    }

    pub fn get_int(&self, key: &str, default_value: i32) -> i32 {
        self.parse_or(key, default_value)
    }

    pub fn get_i64(&self, key: &str, default_value: i64) -> i64 {
        self.parse_or(key, default_value)
    }

    /// Parses the value as an `i64`, or `None` if absent or malformed.
    pub fn get_opt_i64(&self, key: &str) -> Option<i64> {
        let raw = self.get(key)?;
        match raw.trim().parse::<i64>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, value = raw, error = %e, "Unable to parse integer attribute");
                None
            }
        }
    }

    /// Comma-separated list; `None` when the key is absent.
    pub fn get_slice(&self, key: &str) -> Option<Vec<String>> {
        let values = split_and_trim(self.get(key)?, ",");
        if values.is_empty() {
            tracing::debug!(key, "Could not load list attribute");
        }
        Some(values)
    }

    /// `||`-separated `Key:Value` pairs with header-canonical keys. Pairs
    /// without a colon are skipped; an empty result is `None`.
    pub fn get_map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        let raw = self.get(key)?;
        if raw.is_empty() {
            tracing::warn!(key, "Missing value for map attribute, skipping");
            return None;
        }

        let mut map = BTreeMap::new();
        for part in raw.split("||") {
            match part.split_once(':') {
                Some((name, value)) => {
                    map.insert(canonical_header_key(name.trim()), value.trim().to_string());
                }
                None => {
                    tracing::warn!(key, pair = part, "Could not load header pair, skipping");
                }
            }
        }

        if map.is_empty() {
            tracing::warn!(key, value = raw, "No valid pair in map attribute, skipping");
            return None;
        }
        Some(map)
    }

    /// A bare integer counts as seconds; anything else goes through
    /// humantime (`"1m30s"`, `"250ms"`).
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        let raw = self.get(key)?;
        match parse_duration(raw) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!(key, value = raw, error = %e, "Unable to parse duration attribute");
                None
            }
        }
    }

    /// Groups keys of the form `<path>.<name>.<rest>` by `name`, each group
    /// holding its `<rest>` keys.
    pub fn segments(&self, path: &str) -> BTreeMap<String, Labels> {
        let mut segments: BTreeMap<String, Labels> = BTreeMap::new();
        for (key, value) in &self.entries {
            let Some(rest) = key
                .strip_prefix(path)
                .and_then(|rest| rest.strip_prefix('.'))
            else {
                continue;
            };
            match rest.split_once('.') {
                Some((name, sub)) if !name.is_empty() && !sub.is_empty() => {
                    segments
                        .entry(name.to_string())
                        .or_default()
                        .insert(sub, value.clone());
                }
                _ => tracing::warn!(key = key.as_str(), "Invalid segment attribute, skipping"),
            }
        }
        segments
    }

    /// Segment names found under `path`.
    pub fn segment_names(&self, path: &str) -> BTreeSet<String> {
        self.segments(path).into_keys().collect()
    }

    /// Copy without `key` and every key nested under it.
    pub fn without(&self, key: &str) -> Labels {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key && !is_nested_under(k, key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Labels { entries }
    }

    /// Copy of `self` with every key of `overrides` applied on top.
    pub fn merged(&self, overrides: &Labels) -> Labels {
        let mut entries = self.entries.clone();
        entries.extend(overrides.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        Labels { entries }
    }

    fn parse_or<T>(&self, key: &str, default_value: T) -> T
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|e| {
                tracing::warn!(key, value = raw, error = %e, "Unable to parse integer attribute, using default");
                default_value
            }),
            None => default_value,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Labels {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn is_nested_under(key: &str, parent: &str) -> bool {
    key.strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Accepts the usual spellings: `1 t T TRUE true True` and their false
/// counterparts.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration, humantime::DurationError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw)
}

/// Splits on `sep`, trims each part and drops empty ones.
pub fn split_and_trim(raw: &str, sep: &str) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical MIME header form: first letter and every letter after a hyphen
/// upper-cased, the rest lower-cased. Names with characters outside the
/// header token set are returned unchanged.
pub fn canonical_header_key(name: &str) -> String {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_tags_strips_prefix_and_skips_foreign_tags() {
        let labels = Labels::from_tags(
            &tags(&[
                "random.foo=bar",
                "traefik.weight=42",
                "traefikfoo=1",
                "traefik.marker",
                "traefik.frontend.rule=Host:a=b",
            ]),
            "traefik",
        );
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("weight"), Some("42"));
        assert_eq!(labels.get("frontend.rule"), Some("Host:a=b"));
    }

    #[test]
    fn from_tags_with_empty_prefix_keeps_every_pair() {
        let labels = Labels::from_tags(&tags(&["a=1", "b.c=2", "marker"]), "");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("b.c"), Some("2"));
    }

    #[test]
    fn later_duplicates_override() {
        let labels = Labels::from_tags(&tags(&["traefik.weight=1", "traefik.weight=2"]), "traefik");
        assert_eq!(labels.get_int(keys::WEIGHT, 0), 2);
    }

    #[test]
    fn typed_getters_fall_back_on_parse_errors() {
        let labels: Labels = [("a", "nope"), ("b", "yes"), ("c", "TRUE")].into_iter().collect();
        assert_eq!(labels.get_int("a", 7), 7);
        assert_eq!(labels.get_i64("a", -1), -1);
        assert!(labels.get_bool("b", true));
        assert!(!labels.get_bool("b", false));
        assert!(labels.get_bool("c", false));
        assert_eq!(labels.get_opt_i64("a"), None);
        assert_eq!(labels.get_string("missing", "dflt"), "dflt");
    }

    #[test]
    fn has_prefix_respects_segment_boundaries() {
        let labels: Labels = [("frontend.auth.basicx", "1")].into_iter().collect();
        assert!(!labels.has_prefix(keys::FRONTEND_AUTH_BASIC));
        assert!(labels.has_prefix(keys::FRONTEND_AUTH));
    }

    #[test]
    fn get_map_splits_on_first_colon_and_canonicalizes() {
        let labels: Labels = [(
            "h",
            "Access-Control-Allow-Methods:POST,GET,OPTIONS || content-type: application/json; charset=utf-8 || broken",
        )]
        .into_iter()
        .collect();
        let map = labels.get_map("h").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["Access-Control-Allow-Methods"], "POST,GET,OPTIONS");
        assert_eq!(map["Content-Type"], "application/json; charset=utf-8");
    }

    #[test]
    fn get_map_keeps_colons_in_values() {
        let labels: Labels = [("h", "X-Url: http://a:80/x")].into_iter().collect();
        assert_eq!(labels.get_map("h").unwrap()["X-Url"], "http://a:80/x");
    }

    #[test]
    fn get_map_without_valid_pairs_is_none() {
        let labels: Labels = [("h", "nothing here"), ("e", "")].into_iter().collect();
        assert_eq!(labels.get_map("h"), None);
        assert_eq!(labels.get_map("e"), None);
        assert_eq!(labels.get_map("absent"), None);
    }

    #[test]
    fn get_slice_trims_and_drops_empty() {
        let labels: Labels = [("l", " http, ,https ")].into_iter().collect();
        assert_eq!(labels.get_slice("l").unwrap(), vec!["http", "https"]);
        assert_eq!(labels.get_slice("absent"), None);
    }

    #[test]
    fn durations_accept_bare_seconds_and_humantime() {
        let labels: Labels = [("a", "6"), ("b", "1m30s"), ("c", "soon")].into_iter().collect();
        assert_eq!(labels.get_duration("a"), Some(Duration::from_secs(6)));
        assert_eq!(labels.get_duration("b"), Some(Duration::from_secs(90)));
        assert_eq!(labels.get_duration("c"), None);
    }

    #[test]
    fn segments_group_by_name() {
        let labels: Labels = [
            ("frontend.errors.foo.status", "404"),
            ("frontend.errors.foo.backend", "foobar"),
            ("frontend.errors.bar.query", "q"),
            ("frontend.errors.lonely", "x"),
            ("frontend.rule", "Host:a"),
        ]
        .into_iter()
        .collect();
        let segments = labels.segments(keys::FRONTEND_ERRORS);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments["foo"].get("status"), Some("404"));
        assert_eq!(segments["foo"].get("backend"), Some("foobar"));
        assert_eq!(segments["bar"].get("query"), Some("q"));
    }

    #[test]
    fn without_and_merged() {
        let base: Labels = [("frontends.x.rule", "B"), ("frontend.rule", "A"), ("weight", "2")]
            .into_iter()
            .collect();
        let stripped = base.without(keys::FRONTENDS);
        assert!(!stripped.has("frontends.x.rule"));
        let overrides: Labels = [("frontend.rule", "C")].into_iter().collect();
        let merged = stripped.merged(&overrides);
        assert_eq!(merged.get("frontend.rule"), Some("C"));
        assert_eq!(merged.get("weight"), Some("2"));
    }

    #[test]
    fn canonical_header_keys() {
        assert_eq!(canonical_header_key("content-type"), "Content-Type");
        assert_eq!(canonical_header_key("X-FORWARDED-FOR"), "X-Forwarded-For");
        assert_eq!(canonical_header_key("foo"), "Foo");
        assert_eq!(canonical_header_key("has space"), "has space");
    }
}
