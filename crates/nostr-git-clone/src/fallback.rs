// Distributed under the MIT software license

//! URL Fallback Runner (§4.E): try an ordered list of mirror URLs with
//! per-URL timeouts, remember the winner per repo, and treat CORS/
//! network-class failures as recoverable rather than fatal.

use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Bound on how many repos' "last successful URL" this process remembers
/// at once (§5 "process-wide and survives across operations" doesn't mean
/// unbounded — a long-lived process cloning thousands of distinct repos
/// should not grow this map forever).
const PREFERRED_URL_CAPACITY: usize = 4096;

/// Default per-URL timeout for an ordinary fetch (§4.E, §5).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Default per-URL timeout for an initial clone (§4.E, §5).
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(30);
/// Ceiling applied above any single network operation regardless of kind (§5).
pub const CATASTROPHIC_TIMEOUT: Duration = Duration::from_secs(60);

/// Message substrings that mark a failure as CORS/network-class and
/// therefore recoverable (§4.E, §7 `NetworkRecoverable`).
const RECOVERABLE_SUBSTRINGS: &[&str] =
    &["CORS", "NetworkError", "Failed to fetch", "Access-Control", "NoRefspecError", "refspec"];

/// Whether an error message matches the CORS/network-class failure
/// pattern the spec detects by substring (§4.E).
pub fn is_recoverable_message(message: &str) -> bool {
    RECOVERABLE_SUBSTRINGS.iter().any(|needle| message.contains(needle))
}

/// Outcome of a single URL attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// URL tried.
    pub url: String,
    /// Whether it succeeded.
    pub ok: bool,
    /// Error detail, if it failed.
    pub error: Option<String>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u64,
    /// Whether a failure was CORS/network-class (never set for timeouts).
    pub recoverable: bool,
}

/// Outcome of [`with_url_fallback`].
#[derive(Debug, Clone)]
pub struct FallbackOutcome<T> {
    /// Whether any URL succeeded.
    pub success: bool,
    /// The URL that succeeded, if any.
    pub used_url: Option<String>,
    /// The operation's return value, if it succeeded.
    pub value: Option<T>,
    /// Every attempt made, in order.
    pub attempts: Vec<Attempt>,
}

impl<T> FallbackOutcome<T> {
    /// §4.E: "callers that hit an all-CORS failure continue with local
    /// data and surface a warning, instead of failing."
    pub fn is_all_cors_failure(&self) -> bool {
        !self.success && !self.attempts.is_empty() && self.attempts.iter().all(|a| a.recoverable)
    }
}

/// Process-wide "last successful URL per repo" map (§4.E, §5: "survives
/// across operations"), capacity-bounded so it can't grow forever.
pub struct PreferredUrlMap {
    inner: Mutex<LruCache<String, String>>,
}

impl Default for PreferredUrlMap {
    fn default() -> Self {
        Self {
            inner: Mutex::new(LruCache::new(NonZeroUsize::new(PREFERRED_URL_CAPACITY).unwrap())),
        }
    }
}

impl PreferredUrlMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url` as the winner for `repo_id`.
    pub fn remember(&self, repo_id: &str, url: &str) {
        self.inner.lock().unwrap().put(repo_id.to_string(), url.to_string());
    }

    /// The remembered winner for `repo_id`, if any.
    pub fn get(&self, repo_id: &str) -> Option<String> {
        self.inner.lock().unwrap().get(repo_id).cloned()
    }

    /// Reorder `urls` with the remembered winner first, caller's order
    /// otherwise preserved (§4.E).
    pub fn reorder(&self, repo_id: &str, urls: &[String]) -> Vec<String> {
        let preferred = self.get(repo_id);
        let mut out = Vec::with_capacity(urls.len());
        if let Some(p) = preferred.as_ref() {
            if urls.iter().any(|u| u == p) {
                out.push(p.clone());
            }
        }
        for u in urls {
            if Some(u) != preferred.as_ref() {
                out.push(u.clone());
            }
        }
        out
    }
}

/// Try `op` against each of `urls`, in fallback order, racing each
/// attempt against `per_url_timeout`. Malformed URLs are filtered out
/// before the run starts. On first success the winner is remembered in
/// `preferred` and returned immediately; otherwise every attempt is
/// collected and returned with `success: false` (§4.E, §8 scenario S5).
pub async fn with_url_fallback<T, E, F, Fut>(
    preferred: &PreferredUrlMap,
    repo_id: &str,
    urls: &[String],
    per_url_timeout: Duration,
    mut op: F,
) -> FallbackOutcome<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let candidates: Vec<String> = urls.iter().filter(|u| url::Url::parse(u).is_ok()).cloned().collect();
    let ordered = preferred.reorder(repo_id, &candidates);

    let mut attempts = Vec::with_capacity(ordered.len());
    for candidate in ordered {
        let started = Instant::now();
        let outcome = timeout(per_url_timeout, op(candidate.clone())).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(value)) => {
                attempts.push(Attempt {
                    url: candidate.clone(),
                    ok: true,
                    error: None,
                    duration_ms,
                    recoverable: false,
                });
                preferred.remember(repo_id, &candidate);
                debug!(repo_id, url = %candidate, duration_ms, "url fallback succeeded");
                return FallbackOutcome {
                    success: true,
                    used_url: Some(candidate),
                    value: Some(value),
                    attempts,
                };
            }
            Ok(Err(err)) => {
                let message = err.to_string();
                let recoverable = is_recoverable_message(&message);
                warn!(repo_id, url = %candidate, %message, recoverable, "url attempt failed");
                attempts.push(Attempt {
                    url: candidate,
                    ok: false,
                    error: Some(message),
                    duration_ms,
                    recoverable,
                });
            }
            Err(_) => {
                warn!(repo_id, url = %candidate, timeout_ms = per_url_timeout.as_millis() as u64, "url attempt timed out");
                attempts.push(Attempt {
                    url: candidate,
                    ok: false,
                    error: Some("timed out".to_string()),
                    duration_ms,
                    recoverable: false,
                });
            }
        }
    }

    FallbackOutcome {
        success: false,
        used_url: None,
        value: None,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[derive(Debug)]
    struct FakeError(String);

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[tokio::test]
    async fn s5_first_url_times_out_second_succeeds() {
        let preferred = PreferredUrlMap::new();
        let urls = vec!["https://u1.example".to_string(), "https://u2.example".to_string()];

        let outcome = with_url_fallback(&preferred, "repo1", &urls, StdDuration::from_millis(20), |url| async move {
            if url.contains("u1") {
                tokio::time::sleep(StdDuration::from_millis(200)).await;
                Ok::<_, FakeError>(())
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(outcome.used_url.as_deref(), Some("https://u2.example"));
        assert_eq!(outcome.attempts.len(), 2);
        assert!(!outcome.attempts[0].ok);
        assert!(outcome.attempts[1].ok);

        // Subsequent call with the same repo id places u2 first (§8 S5).
        let calls = AtomicUsize::new(0);
        let outcome2 = with_url_fallback(&preferred, "repo1", &urls, StdDuration::from_millis(20), |url| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { if calls.load(Ordering::SeqCst) == 1 { assert_eq!(url, "https://u2.example"); } Ok::<_, FakeError>(()) }
        })
        .await;
        assert_eq!(outcome2.used_url.as_deref(), Some("https://u2.example"));
        assert_eq!(outcome2.attempts.len(), 1);
    }

    #[tokio::test]
    async fn malformed_urls_are_filtered_out() {
        let preferred = PreferredUrlMap::new();
        let urls = vec!["not a url".to_string(), "https://good.example".to_string()];
        let outcome = with_url_fallback(&preferred, "repo2", &urls, StdDuration::from_millis(20), |_url| async {
            Ok::<_, FakeError>(42)
        })
        .await;
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.value, Some(42));
    }

    #[tokio::test]
    async fn all_cors_failures_are_flagged_recoverable() {
        let preferred = PreferredUrlMap::new();
        let urls = vec!["https://u1.example".to_string(), "https://u2.example".to_string()];
        let outcome = with_url_fallback(&preferred, "repo3", &urls, StdDuration::from_millis(20), |_url| async {
            Err::<(), _>(FakeError("CORS request blocked".to_string()))
        })
        .await;
        assert!(!outcome.success);
        assert!(outcome.is_all_cors_failure());
    }

    #[test]
    fn recoverable_message_matches_known_substrings() {
        assert!(is_recoverable_message("TypeError: Failed to fetch"));
        assert!(is_recoverable_message("fatal: NoRefspecError: no refspec"));
        assert!(!is_recoverable_message("fatal: repository not found"));
    }
}
