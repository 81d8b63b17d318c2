//! Store key derivation for cache entries and access counters.

use crate::config::CacheSettings;

/// Maps a URL to its cache key and its counter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    cache_prefix: String,
    count_prefix: String,
}

impl KeyScheme {
    pub fn new(cache_prefix: impl Into<String>, count_prefix: impl Into<String>) -> Self {
        Self {
            cache_prefix: cache_prefix.into(),
            count_prefix: count_prefix.into(),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.cache_prefix.clone(), settings.count_prefix.clone())
    }

    /// Key holding the cached page for `url`.
    pub fn cache_key(&self, url: &str) -> String {
        format!("{}{}", self.cache_prefix, url)
    }

    /// Key holding the access counter for `url`.
    pub fn count_key(&self, url: &str) -> String {
        format!("{}{}", self.count_prefix, url)
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let keys = KeyScheme::default();
        assert_eq!(keys.cache_key("http://example.com"), "cache:http://example.com");
        assert_eq!(keys.count_key("http://example.com"), "count:http://example.com");
    }

    #[test]
    fn test_keys_deterministic() {
        let keys = KeyScheme::default();
        assert_eq!(keys.cache_key("http://a.test"), keys.cache_key("http://a.test"));
        assert_eq!(keys.count_key("http://a.test"), keys.count_key("http://a.test"));
    }

    #[test]
    fn test_cache_and_count_keys_never_collide() {
        let keys = KeyScheme::default();
        let urls = [
            "http://example.com",
            "http://example.com/",
            "https://example.com",
            "cache:http://example.com",
            "count:http://example.com",
            "",
        ];
        for a in urls {
            assert_ne!(keys.cache_key(a), keys.count_key(a));
            for b in urls {
                assert_ne!(keys.cache_key(a), keys.count_key(b), "{a:?} vs {b:?}");
                if a != b {
                    assert_ne!(keys.cache_key(a), keys.cache_key(b));
                    assert_ne!(keys.count_key(a), keys.count_key(b));
                }
            }
        }
    }

    #[test]
    fn test_custom_prefixes() {
        let keys = KeyScheme::new("page:", "hits:");
        assert_eq!(keys.cache_key("u"), "page:u");
        assert_eq!(keys.count_key("u"), "hits:u");
    }
}
