//! Legacy attribute aliases.
//!
//! Each [`Alias`] lists, in application order, every key that feeds one
//! output field. Deprecated keys are applied after the namespaced key, so the
//! last present key wins; consuming a deprecated key is logged.
use super::labels::{Labels, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alias {
    /// Output field fed by this alias, for diagnostics.
    pub field: &'static str,
    /// The namespaced key.
    pub current: &'static str,
    /// Deprecated flat keys, applied after `current` in this order.
    pub legacy: &'static [&'static str],
}

/// `auth.basic.users`: the flat `frontend.auth.basic=<users>` form predates
/// the method-namespaced key.
pub const BASIC_USERS: Alias = Alias {
    field: "auth.basic.users",
    current: keys::FRONTEND_AUTH_BASIC_USERS,
    legacy: &[keys::FRONTEND_AUTH_BASIC],
};

/// `whiteList.sourceRange`.
pub const WHITELIST_SOURCE_RANGE: Alias = Alias {
    field: "whiteList.sourceRange",
    current: keys::FRONTEND_WHITELIST_SOURCE_RANGE,
    legacy: &[keys::FRONTEND_WHITELIST_SOURCE_RANGE_LEGACY],
};

/// `loadBalancer.stickiness`: `sticky=true` enables stickiness with the
/// default cookie name.
pub const LOAD_BALANCER_STICKINESS: Alias = Alias {
    field: "loadBalancer.stickiness",
    current: keys::BACKEND_LOAD_BALANCER_STICKINESS,
    legacy: &[keys::BACKEND_LOAD_BALANCER_STICKY],
};

pub const ALIASES: &[Alias] = &[BASIC_USERS, WHITELIST_SOURCE_RANGE, LOAD_BALANCER_STICKINESS];

impl Alias {
    /// All keys in application order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.current).chain(self.legacy.iter().copied())
    }

    /// The last key of this alias present in `labels`.
    pub fn resolve_key(&self, labels: &Labels) -> Option<&'static str> {
        let key = self.keys().filter(|key| labels.has(key)).last()?;
        if key != self.current {
            tracing::warn!(
                deprecated = key,
                replacement = self.current,
                field = self.field,
                "Deprecated configuration found"
            );
        }
        Some(key)
    }

    /// Whether any key of this alias (or anything nested under one) is set.
    pub fn is_present(&self, labels: &Labels) -> bool {
        self.keys().any(|key| labels.has_prefix(key))
    }

    pub fn get_slice(&self, labels: &Labels) -> Option<Vec<String>> {
        labels.get_slice(self.resolve_key(labels)?)
    }

    pub fn get_bool(&self, labels: &Labels, default_value: bool) -> bool {
        match self.resolve_key(labels) {
            Some(key) => labels.get_bool(key, default_value),
            None => default_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_key_is_applied_last() {
        let labels: Labels = [
            (keys::FRONTEND_AUTH_BASIC_USERS, "new:1"),
            (keys::FRONTEND_AUTH_BASIC, "legacy:2"),
        ]
        .into_iter()
        .collect();
        assert_eq!(BASIC_USERS.get_slice(&labels).unwrap(), vec!["legacy:2"]);
        assert_eq!(BASIC_USERS.resolve_key(&labels), Some(keys::FRONTEND_AUTH_BASIC));
    }

    #[test]
    fn current_key_alone_is_used() {
        let labels: Labels = [(keys::FRONTEND_AUTH_BASIC_USERS, "new:1")].into_iter().collect();
        assert_eq!(BASIC_USERS.resolve_key(&labels), Some(keys::FRONTEND_AUTH_BASIC_USERS));
    }

    #[test]
    fn legacy_key_alone_feeds_the_same_field() {
        let legacy: Labels = [(keys::FRONTEND_AUTH_BASIC, "a:1,b:2")].into_iter().collect();
        let current: Labels = [(keys::FRONTEND_AUTH_BASIC_USERS, "a:1,b:2")].into_iter().collect();
        assert_eq!(BASIC_USERS.get_slice(&legacy), BASIC_USERS.get_slice(&current));
    }

    #[test]
    fn legacy_sticky_enables_stickiness() {
        let labels: Labels = [(keys::BACKEND_LOAD_BALANCER_STICKY, "true")].into_iter().collect();
        assert!(LOAD_BALANCER_STICKINESS.get_bool(&labels, false));
        assert!(!LOAD_BALANCER_STICKINESS.get_bool(&Labels::default(), false));
    }

    #[test]
    fn every_alias_lists_distinct_keys() {
        for alias in ALIASES {
            let keys: Vec<_> = alias.keys().collect();
            let mut unique = keys.clone();
            unique.dedup();
            assert_eq!(keys, unique, "{}", alias.field);
            assert!(!alias.legacy.is_empty());
        }
    }
}
