//! Deterministic identifiers for generated objects.
use base64::{Engine, engine::general_purpose::URL_SAFE};
use sha1::{Digest, Sha1};

use super::catalog::Instance;

/// Collapses every run of non-alphanumeric characters into a single `-` and
/// drops leading and trailing separators.
pub fn normalize(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// URL-safe base64 of the SHA-1 over service name, raw instance address,
/// port and the instance tags concatenated in the order given.
pub fn fingerprint(service: &str, instance: &Instance) -> String {
    let mut hasher = Sha1::new();
    hasher.update(service.as_bytes());
    hasher.update(instance.address.as_bytes());
    hasher.update(instance.port.to_string().as_bytes());
    for tag in &instance.tags {
        hasher.update(tag.as_bytes());
    }
    URL_SAFE.encode(hasher.finalize())
}

/// `<service>-<index>-<fingerprint>`, normalized.
pub fn server_name(service: &str, instance: &Instance, index: usize) -> String {
    normalize(&format!(
        "{service}-{index}-{}",
        fingerprint(service, instance)
    ))
}

pub fn backend_name(name: &str) -> String {
    format!("backend-{name}")
}

pub fn frontend_name(name: &str) -> String {
    format!("frontend-{name}")
}

pub fn route_name(name: &str) -> String {
    format!("route-host-{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(tags: &[&str]) -> Instance {
        Instance::new(
            "10.0.0.1",
            80,
            tags.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn server_name_without_tags() {
        assert_eq!(
            server_name("api", &instance(&[]), 0),
            "api-0-eUSiqD6uNvvh6zxsY-OeRi8ZbaE"
        );
    }

    #[test]
    fn server_name_with_multiple_tags() {
        assert_eq!(
            server_name("api", &instance(&["traefik.weight=42", "traefik.enable=true"]), 1),
            "api-1-eJ8MR2JxjXyZgs1bhurVa0-9OI8"
        );
    }

    #[test]
    fn server_name_with_spaced_tag() {
        assert_eq!(
            server_name("api", &instance(&["a funny looking tag"]), 2),
            "api-2-lMCDCsG7sh0SCXOHo4oBOQB-9D4"
        );
    }

    #[test]
    fn server_name_is_stable() {
        let a = instance(&["x=1"]);
        assert_eq!(server_name("api", &a, 3), server_name("api", &a.clone(), 3));
    }

    #[test]
    fn tag_order_changes_fingerprint() {
        let a = instance(&["a=1", "b=2"]);
        let b = instance(&["b=2", "a=1"]);
        assert_ne!(fingerprint("api", &a), fingerprint("api", &b));
    }

    #[test]
    fn ordinal_disambiguates_identical_instances() {
        let a = instance(&["x=1"]);
        assert_ne!(server_name("api", &a, 0), server_name("api", &a, 1));
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("a--b__c=="), "a-b-c");
        assert_eq!(normalize("-x-"), "x");
        assert_eq!(normalize(""), "");
    }
}
