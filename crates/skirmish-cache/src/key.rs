//! Cache keys - resource path plus canonicalized query parameters

use std::fmt;

/// Composite cache key: resource path and an order-independent
/// serialization of its query parameters. Two lookups for the same path
/// with the same parameters in any order produce the same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a path and query parameters. Parameters are sorted
    /// by name then value before serialization.
    pub fn new(path: &str, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return CacheKey(path.to_string());
        }

        let mut sorted: Vec<(&str, &str)> = params.to_vec();
        sorted.sort_unstable();

        let mut key = String::with_capacity(path.len() + 16 * sorted.len());
        key.push_str(path);
        for (i, (name, value)) in sorted.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        CacheKey(key)
    }

    /// Build a key from a bare path with no parameters.
    pub fn bare(path: &str) -> Self {
        CacheKey(path.to_string())
    }

    /// Whether this key falls under a path prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_independent() {
        let a = CacheKey::new("/characters", &[("page", "2"), ("sort", "name")]);
        let b = CacheKey::new("/characters", &[("sort", "name"), ("page", "2")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bare_equals_empty_params() {
        assert_eq!(CacheKey::bare("/fights/3"), CacheKey::new("/fights/3", &[]));
    }

    #[test]
    fn test_different_params_differ() {
        let a = CacheKey::new("/characters", &[("page", "1")]);
        let b = CacheKey::new("/characters", &[("page", "2")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefix_covers_parameterized_keys() {
        let key = CacheKey::new("/characters/42", &[("expand", "weapons")]);
        assert!(key.has_prefix("/characters"));
        assert!(!key.has_prefix("/fights"));
    }
}
