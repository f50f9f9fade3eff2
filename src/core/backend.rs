//! Backend synthesis: a service's instances become a server pool, and its
//! service-level attributes become pool-wide policy.
use std::collections::BTreeMap;

use super::{
    catalog::{CatalogUpdate, Instance},
    compat,
    labels::{Labels, keys},
    naming,
    types::{
        Backend, Buffering, CircuitBreaker, HealthCheck, LoadBalancer, MaxConn,
        ResponseForwarding, Server, Stickiness,
    },
};

pub const DEFAULT_PROTOCOL: &str = "http";
pub const DEFAULT_WEIGHT: i32 = 1;
pub const DEFAULT_LOAD_BALANCER_METHOD: &str = "wrr";
pub const DEFAULT_MAX_CONN_EXTRACTOR_FUNC: &str = "request.host";

/// `backend-<name>`, where `<name>` is the `backend` attribute when set and
/// the service name otherwise.
pub fn backend_name(service: &str, labels: &Labels) -> String {
    let name = labels
        .get(keys::BACKEND)
        .filter(|v| !v.is_empty())
        .unwrap_or(service);
    reference(name)
}

/// Backend name for a service or override name, lower-cased. Every
/// reference to a backend goes through here so names always agree.
pub fn reference(name: &str) -> String {
    naming::backend_name(&name.to_lowercase())
}

/// Builds the backend for `update`.
///
/// Returns `None` when no instance is eligible and the service declares no
/// backend-level attribute.
pub fn synthesize(update: &CatalogUpdate, labels: &Labels, prefix: &str) -> Option<(String, Backend)> {
    let name = backend_name(&update.service.name, labels);
    let servers = servers(update, labels, prefix);

    if servers.is_empty() && !labels.has_prefix(keys::BACKEND_PREFIX) {
        tracing::debug!(service = update.service.name.as_str(), "No server and no backend attribute, skipping backend");
        return None;
    }

    let backend = Backend {
        servers,
        circuit_breaker: circuit_breaker(labels),
        load_balancer: load_balancer(labels),
        max_conn: max_conn(labels),
        health_check: health_check(labels),
        buffering: buffering(labels),
        response_forwarding: response_forwarding(labels),
    };
    Some((name, backend))
}

/// Server pool keyed by generated server id. Instances tagged
/// `enable=false` are left out but still consume their ordinal.
pub fn servers(update: &CatalogUpdate, labels: &Labels, prefix: &str) -> BTreeMap<String, Server> {
    let service = update.service.name.as_str();
    let mut servers = BTreeMap::new();

    for (index, instance) in update.instances.iter().enumerate() {
        let instance_labels = Labels::from_tags(&instance.tags, prefix);
        if !instance_labels.get_bool(keys::ENABLE, true) {
            tracing::debug!(service, address = instance.backend_address(), "Filtering disabled instance");
            continue;
        }

        let id = naming::server_name(service, instance, index);
        servers.insert(id, server(instance, &instance_labels, labels));
    }
    servers
}

/// Protocol and weight come from the instance tags first, then from the
/// service attributes. Within one scope the last tag wins.
fn server(instance: &Instance, instance_labels: &Labels, service_labels: &Labels) -> Server {
    let protocol = protocol(instance_labels)
        .or_else(|| protocol(service_labels))
        .unwrap_or(DEFAULT_PROTOCOL);

    let weight = weight(instance_labels)
        .or_else(|| weight(service_labels))
        .unwrap_or(DEFAULT_WEIGHT);

    Server {
        url: format!(
            "{protocol}://{}",
            join_host_port(instance.backend_address(), instance.port)
        ),
        weight,
    }
}

fn protocol(labels: &Labels) -> Option<&str> {
    labels.get(keys::PROTOCOL).filter(|v| !v.is_empty())
}

fn weight(labels: &Labels) -> Option<i32> {
    let raw = labels.get(keys::WEIGHT)?;
    match raw.trim().parse::<i32>() {
        Ok(weight) if weight > 0 => Some(weight),
        Ok(weight) => {
            tracing::warn!(weight, "Non-positive weight, using default");
            None
        }
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Unable to parse weight, using default");
            None
        }
    }
}

/// `host:port`, with IPv6 literals bracketed.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

pub fn circuit_breaker(labels: &Labels) -> Option<CircuitBreaker> {
    let expression = labels.get(keys::BACKEND_CIRCUIT_BREAKER_EXPRESSION)?;
    if expression.is_empty() {
        return None;
    }
    Some(CircuitBreaker {
        expression: expression.to_string(),
    })
}

pub fn load_balancer(labels: &Labels) -> Option<LoadBalancer> {
    if !labels.has_prefix(keys::BACKEND_LOAD_BALANCER) {
        return None;
    }

    let stickiness = compat::LOAD_BALANCER_STICKINESS
        .get_bool(labels, false)
        .then(|| Stickiness {
            cookie_name: labels.get_string(keys::BACKEND_LOAD_BALANCER_STICKINESS_COOKIE_NAME, ""),
        });

    Some(LoadBalancer {
        method: labels.get_string(keys::BACKEND_LOAD_BALANCER_METHOD, DEFAULT_LOAD_BALANCER_METHOD),
        stickiness,
    })
}

pub fn max_conn(labels: &Labels) -> Option<MaxConn> {
    let amount = labels.get_opt_i64(keys::BACKEND_MAX_CONN_AMOUNT)?;
    let extractor_func =
        labels.get_string(keys::BACKEND_MAX_CONN_EXTRACTOR_FUNC, DEFAULT_MAX_CONN_EXTRACTOR_FUNC);
    if extractor_func.is_empty() {
        return None;
    }
    Some(MaxConn {
        amount,
        extractor_func,
    })
}

pub fn health_check(labels: &Labels) -> Option<HealthCheck> {
    let path = labels.get(keys::BACKEND_HEALTH_CHECK_PATH).filter(|p| !p.is_empty())?;
    Some(HealthCheck {
        scheme: labels.get_string(keys::BACKEND_HEALTH_CHECK_SCHEME, ""),
        path: path.to_string(),
        port: labels.get_int(keys::BACKEND_HEALTH_CHECK_PORT, 0),
        interval: labels.get_string(keys::BACKEND_HEALTH_CHECK_INTERVAL, ""),
        timeout: labels.get_string(keys::BACKEND_HEALTH_CHECK_TIMEOUT, ""),
        hostname: labels.get_string(keys::BACKEND_HEALTH_CHECK_HOSTNAME, ""),
        headers: labels.get_map(keys::BACKEND_HEALTH_CHECK_HEADERS),
    })
}

pub fn buffering(labels: &Labels) -> Option<Buffering> {
    if !labels.has_prefix(keys::BACKEND_BUFFERING) {
        return None;
    }
    Some(Buffering {
        max_request_body_bytes: labels.get_i64(keys::BACKEND_BUFFERING_MAX_REQUEST_BODY_BYTES, 0),
        mem_request_body_bytes: labels.get_i64(keys::BACKEND_BUFFERING_MEM_REQUEST_BODY_BYTES, 0),
        max_response_body_bytes: labels.get_i64(keys::BACKEND_BUFFERING_MAX_RESPONSE_BODY_BYTES, 0),
        mem_response_body_bytes: labels.get_i64(keys::BACKEND_BUFFERING_MEM_RESPONSE_BODY_BYTES, 0),
        retry_expression: labels.get_string(keys::BACKEND_BUFFERING_RETRY_EXPRESSION, ""),
    })
}

pub fn response_forwarding(labels: &Labels) -> Option<ResponseForwarding> {
    let flush_interval = labels
        .get(keys::BACKEND_RESPONSE_FORWARDING_FLUSH_INTERVAL)
        .filter(|v| !v.is_empty())?;
    Some(ResponseForwarding {
        flush_interval: flush_interval.to_string(),
    })
}
