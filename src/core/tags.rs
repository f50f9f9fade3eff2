//! Flat tag-list lookups.
//!
//! Discovery tags are either `key=value` pairs or bare markers. Lookups here
//! are total: an absent key always yields the caller's default.

/// Returns the value of the first tag whose key is exactly `name`.
///
/// A bare marker tag matching `name` yields the marker itself.
pub fn get_tag(name: &str, tags: &[String], default_value: &str) -> String {
    for tag in tags {
        match tag.split_once('=') {
            Some((key, value)) if key == name => return value.to_string(),
            None if tag == name => return tag.clone(),
            _ => {}
        }
    }
    default_value.to_string()
}

/// Whether any tag equals `name` or starts with `name=`.
pub fn has_tag(name: &str, tags: &[String]) -> bool {
    tags.iter().any(|tag| {
        tag == name
            || tag
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('='))
    })
}

/// Joins `prefix` and `name` with a dot. An empty name stays empty and an
/// empty prefix leaves the name untouched.
pub fn prefixed_name(prefix: &str, name: &str) -> String {
    if !prefix.is_empty() && !name.is_empty() {
        format!("{prefix}.{name}")
    } else {
        name.to_string()
    }
}

/// [`get_tag`] scoped under `prefix`.
pub fn get_attribute(prefix: &str, name: &str, tags: &[String], default_value: &str) -> String {
    get_tag(&prefixed_name(prefix, name), tags, default_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn get_tag_returns_value_of_matching_key() {
        let tags = tags(&["foo.bar=random", "traefik.backend.weight=42", "management"]);
        assert_eq!(get_tag("foo.bar", &tags, "0"), "random");
    }

    #[test]
    fn get_tag_returns_default_for_nonexistent_key() {
        let tags = tags(&["foo.bar.foo.bar=random", "traefik.backend.weight=42", "management"]);
        assert_eq!(get_tag("foo.bar", &tags, "0"), "0");
    }

    #[test]
    fn get_tag_returns_bare_marker() {
        let tags = tags(&["management"]);
        assert_eq!(get_tag("management", &tags, ""), "management");
    }

    #[test]
    fn get_tag_splits_on_first_equals_only() {
        let tags = tags(&["rule=Query:a=b"]);
        assert_eq!(get_tag("rule", &tags, ""), "Query:a=b");
    }

    #[test]
    fn get_tag_first_match_wins() {
        let tags = tags(&["k=1", "k=2"]);
        assert_eq!(get_tag("k", &tags, ""), "1");
    }

    #[test]
    fn get_tag_is_case_sensitive() {
        let tags = tags(&["Foo=bar"]);
        assert_eq!(get_tag("foo", &tags, "none"), "none");
    }

    #[test]
    fn has_tag_matches_marker_and_pair() {
        assert!(has_tag("foo", &tags(&["foo"])));
        assert!(has_tag("foo", &tags(&["foo=true"])));
        assert!(!has_tag("foo", &tags(&["foobar=true"])));
    }

    #[test]
    fn prefixed_name_cases() {
        assert_eq!(prefixed_name("foo", ""), "");
        assert_eq!(prefixed_name("", ""), "");
        assert_eq!(prefixed_name("foo", "bar"), "foo.bar");
        assert_eq!(prefixed_name("", "bar"), "bar");
    }

    #[test]
    fn get_attribute_with_prefix() {
        let tags = tags(&["foo.bar=ramdom", "traefik.backend.weight=42"]);
        assert_eq!(get_attribute("traefik", "backend.weight", &tags, "0"), "42");

        let tags = vec!["traefik.backend.wei=42".to_string()];
        assert_eq!(get_attribute("traefik", "backend.weight", &tags, "0"), "0");
    }

    #[test]
    fn get_attribute_without_prefix() {
        let tags = tags(&["foo.bar=ramdom", "backend.weight=42"]);
        assert_eq!(get_attribute("", "backend.weight", &tags, "0"), "42");
        assert_eq!(get_attribute("", "foo.bar", &tags, "random"), "ramdom");

        let tags = vec!["backend.wei=42".to_string()];
        assert_eq!(get_attribute("", "backend.weight", &tags, "0"), "0");
    }
}
