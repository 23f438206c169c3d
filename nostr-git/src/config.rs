// Distributed under the MIT software license

//! Engine configuration (§6): the environment surface the distilled spec
//! names abstractly, modeled as a plain struct with fluent setters rather
//! than ambient globals, in the style of `nostr-relay-pool`'s `*Options`.

use std::env;
use std::time::Duration;

use nostr_git_cache::CacheMode;

const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;

/// Engine-wide configuration (§6 environment surface).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    validate_events: bool,
    cache_mode: CacheMode,
    cache_ttl: Duration,
    cors_proxy: Option<String>,
    libgit_compat: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_events: true,
            cache_mode: CacheMode::default(),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            cors_proxy: None,
            libgit_compat: false,
        }
    }
}

impl EngineConfig {
    /// New [`EngineConfig`] with the defaults above.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment, falling back to defaults for
    /// any variable that is unset or fails to parse (§6).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = env::var("VALIDATE_EVENTS") {
            config.validate_events = parse_bool(&v, config.validate_events);
        }
        if let Ok(v) = env::var("CACHE_MODE") {
            config.cache_mode = match v.as_str() {
                "off" => CacheMode::Off,
                "per-session" => CacheMode::PerSession,
                "per-repo-batch" => CacheMode::PerRepoBatch,
                _ => config.cache_mode,
            };
        }
        if let Ok(v) = env::var("CACHE_TTL_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                config.cache_ttl = Duration::from_millis(ms);
            }
        }
        if let Ok(v) = env::var("DEFAULT_CORS_PROXY") {
            config.cors_proxy = if v == "none" { None } else { Some(v) };
        }
        if let Ok(v) = env::var("LIBGIT_COMPAT") {
            config.libgit_compat = parse_bool(&v, config.libgit_compat);
        }

        config
    }

    /// Whether incoming events are validated against their NIP-34 schema
    /// before being handed to the reconciler (§4.A).
    pub fn validate_events(&self) -> bool {
        self.validate_events
    }

    /// When buffered [`nostr_git_cache::RepoCache`] writes flush.
    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    /// How long a cached repo record stays fresh before the safe-push
    /// gate treats it as stale (§4.K `needsUpdate`).
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// CORS proxy to prepend to vendor/Git HTTP requests, if any.
    pub fn cors_proxy(&self) -> Option<&str> {
        self.cors_proxy.as_deref()
    }

    /// Whether to mirror `isomorphic-git`-incompatible quirks (loose
    /// refspec matching, legacy shallow markers) for interop with plain
    /// `libgit2`/CLI clones of the same working tree.
    pub fn libgit_compat(&self) -> bool {
        self.libgit_compat
    }

    /// Set whether events are validated (builder-style).
    pub fn with_validate_events(mut self, validate: bool) -> Self {
        self.validate_events = validate;
        self
    }

    /// Set the cache flush mode (builder-style).
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Set the cache freshness TTL (builder-style).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the CORS proxy (builder-style); `None` disables proxying.
    pub fn with_cors_proxy(mut self, proxy: Option<String>) -> Self {
        self.cors_proxy = proxy;
        self
    }

    /// Set `libgit2`/CLI compatibility mode (builder-style).
    pub fn with_libgit_compat(mut self, compat: bool) -> Self {
        self.libgit_compat = compat;
        self
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_events_and_use_off_cache_mode() {
        let config = EngineConfig::default();
        assert!(config.validate_events());
        assert_eq!(config.cache_mode(), CacheMode::Off);
        assert_eq!(config.cache_ttl(), Duration::from_millis(DEFAULT_CACHE_TTL_MS));
        assert_eq!(config.cors_proxy(), None);
        assert!(!config.libgit_compat());
    }

    #[test]
    fn builder_setters_override_defaults() {
        let config = EngineConfig::new()
            .with_validate_events(false)
            .with_cache_mode(CacheMode::PerRepoBatch)
            .with_cors_proxy(Some("https://proxy.example.com".to_string()))
            .with_libgit_compat(true);
        assert!(!config.validate_events());
        assert_eq!(config.cache_mode(), CacheMode::PerRepoBatch);
        assert_eq!(config.cors_proxy(), Some("https://proxy.example.com"));
        assert!(config.libgit_compat());
    }

    #[test]
    fn parse_bool_falls_back_to_default_on_garbage() {
        assert!(parse_bool("maybe", true));
        assert!(!parse_bool("maybe", false));
        assert!(!parse_bool("0", true));
        assert!(parse_bool("yes", false));
    }
}
