//! Navigation interception across priority-ordered handlers.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error};
use wvbridge_common::NavigationDecision;
use wvbridge_config::EvaluationPolicy;

use crate::progress::same_listener;

/// Priority used when the caller does not pick one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Decides whether the engine may navigate to a URL.
///
/// Runs on the engine's callback thread. Handlers may observe every
/// attempt; whether they still run after an earlier handler denied depends
/// on the dispatcher's [`EvaluationPolicy`].
///
/// The same reentrancy rule as for
/// [`ProgressListener`](crate::ProgressListener) applies: never call
/// `load_url` or `close` on the widget from inside a handler.
pub trait NavigationHandler: Send + Sync {
    fn handle_navigation(&self, url: &str) -> NavigationDecision;
}

impl<F> NavigationHandler for F
where
    F: Fn(&str) -> NavigationDecision + Send + Sync,
{
    fn handle_navigation(&self, url: &str) -> NavigationDecision {
        self(url)
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

type Buckets = BTreeMap<i32, Vec<Arc<dyn NavigationHandler>>>;

/// Handlers grouped by integer priority.
///
/// Lower priorities run first; within one priority, handlers run in
/// registration order. A priority with no handlers left is removed.
pub struct NavigationDispatcher {
    buckets: RwLock<Buckets>,
    policy: EvaluationPolicy,
}

impl NavigationDispatcher {
    pub fn new(policy: EvaluationPolicy) -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Returns `false` if this exact handler is already registered at
    /// `priority`.
    pub fn add(&self, priority: i32, handler: Arc<dyn NavigationHandler>) -> bool {
        let mut buckets = self.write();
        let bucket = buckets.entry(priority).or_default();
        if bucket.iter().any(|h| same_listener(h, &handler)) {
            return false;
        }
        bucket.push(handler);
        true
    }

    pub fn remove(&self, priority: i32, handler: &Arc<dyn NavigationHandler>) -> bool {
        let mut buckets = self.write();
        let Some(bucket) = buckets.get_mut(&priority) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|h| !same_listener(h, handler));
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            buckets.remove(&priority);
        }
        removed
    }

    pub fn contains(&self, priority: i32, handler: &Arc<dyn NavigationHandler>) -> bool {
        self.read()
            .get(&priority)
            .is_some_and(|bucket| bucket.iter().any(|h| same_listener(h, handler)))
    }

    /// Priorities that currently hold handlers, ascending.
    pub fn priorities(&self) -> Vec<i32> {
        self.read().keys().copied().collect()
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Resolve a navigation attempt.
    ///
    /// No handlers means [`NavigationDecision::Allowed`]. Otherwise the
    /// result is `Denied` iff some handler denies. A handler that panics
    /// counts as allowing.
    pub fn decide(&self, url: &str) -> NavigationDecision {
        let ordered: Vec<Arc<dyn NavigationHandler>> =
            self.read().values().flatten().cloned().collect();
        if ordered.is_empty() {
            return NavigationDecision::Allowed;
        }

        let mut decision = NavigationDecision::Allowed;
        for handler in &ordered {
            let verdict = catch_unwind(AssertUnwindSafe(|| handler.handle_navigation(url)))
                .unwrap_or_else(|_| {
                    error!(url, "navigation handler panicked");
                    NavigationDecision::Allowed
                });
            if verdict == NavigationDecision::Denied {
                decision = NavigationDecision::Denied;
                if self.policy == EvaluationPolicy::ShortCircuit {
                    break;
                }
            }
        }

        debug!(url, ?decision, handlers = ordered.len(), "navigation decided");
        decision
    }

    fn read(&self) -> RwLockReadGuard<'_, Buckets> {
        self.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.buckets.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NavigationDispatcher {
    fn default() -> Self {
        Self::new(EvaluationPolicy::default())
    }
}

/// Handler that only allows URLs starting with one of a set of prefixes.
#[derive(Debug, Clone)]
// =============================================================================
// PREFIX ALLOWLIST
// =============================================================================

pub struct PrefixAllowlist {
    prefixes: Vec<String>,
}

impl PrefixAllowlist {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
    }
}

impl NavigationHandler for PrefixAllowlist {
    fn handle_navigation(&self, url: &str) -> NavigationDecision {
        NavigationDecision::from(self.is_allowed(url))
    }
}

// =============================================================================
// TESTS
// =============================================================================
