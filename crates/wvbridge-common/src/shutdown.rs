//! Process shutdown hooks.
//!
//! Rust has no exit-time callbacks for statics, so teardown that must run
//! when the host application terminates is registered here and executed by
//! [`ShutdownHooks::run`], usually through a [`ShutdownGuard`] held in `main`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing::{debug, error};

type HookFn = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

struct Hook {
    id: HookId,
    name: &'static str,
    run: HookFn,
}

/// Pending hooks plus whether [`ShutdownHooks::run`] has started. Both live
/// under one lock so a registration either lands before the drain or sees
/// `ran` and executes on the spot.
#[derive(Default)]
struct Registry {
    hooks: Vec<Hook>,
    ran: bool,
}

pub struct ShutdownHooks {
    next_id: AtomicU64,
    registry: Mutex<Registry>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ShutdownHooks {
        static GLOBAL: OnceLock<ShutdownHooks> = OnceLock::new();
        GLOBAL.get_or_init(ShutdownHooks::new)
    }

    /// Register a hook. Hooks registered after [`run`](Self::run) has
    /// started are executed immediately.
    pub fn register<F>(&self, name: &'static str, hook: F) -> HookId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.lock();
        if registry.ran {
            drop(registry);
            debug!(hook = name, "shutdown already running, executing hook now");
            run_hook(name, Box::new(hook));
            return id;
        }
        registry.hooks.push(Hook {
            id,
            name,
            run: Box::new(hook),
        });
        id
    }

    /// Drop a hook without running it. Returns whether it was registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut registry = self.lock();
        let before = registry.hooks.len();
        registry.hooks.retain(|h| h.id != id);
        registry.hooks.len() != before
    }

    /// Run every registered hook once, in registration order.
    ///
    /// The registry lock is released before hooks execute, so a hook may
    /// register or unregister hooks. Returns the number of hooks run.
    pub fn run(&self) -> usize {
        let hooks = {
            let mut registry = self.lock();
            registry.ran = true;
            std::mem::take(&mut registry.hooks)
        };
        let count = hooks.len();
        for hook in hooks {
            run_hook(hook.name, hook.run);
        }
        if count > 0 {
            debug!(count, "shutdown hooks complete");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Guard that runs the hooks when dropped.
    pub fn guard(&self) -> ShutdownGuard<'_> {
        ShutdownGuard { hooks: self }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A hook never runs while the lock is held, so poisoning only means a
        // panic in Vec bookkeeping; the data is still usable.
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ShutdownHooks {
    fn default() -> Self {
        Self::new()
    }
}

fn run_hook(name: &'static str, hook: HookFn) {
    if catch_unwind(AssertUnwindSafe(hook)).is_err() {
        error!(hook = name, "shutdown hook panicked");
    }
}

pub struct ShutdownGuard<'a> {
    hooks: &'a ShutdownHooks,
}

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        self.hooks.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn run_executes_hooks_in_order_once() {
        let hooks = ShutdownHooks::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let log = Arc::clone(&log);
            hooks.register("order", move || log.lock().unwrap().push(n));
        }

        assert_eq!(hooks.run(), 3);
        assert_eq!(hooks.run(), 0);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn unregistered_hook_never_runs() {
        let hooks = ShutdownHooks::new();
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        let id = hooks.register("skip", move || f.store(true, Ordering::SeqCst));

        assert!(hooks.unregister(id));
        assert!(!hooks.unregister(id));
        hooks.run();
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn registration_after_run_executes_immediately() {
        let hooks = ShutdownHooks::new();
        hooks.run();

        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        hooks.register("late", move || f.store(true, Ordering::SeqCst));
        assert!(fired.load(Ordering::SeqCst));
        assert!(hooks.is_empty());
    }

    #[test]
    fn panicking_hook_does_not_stop_the_rest() {
        let hooks = ShutdownHooks::new();
        let fired = Arc::new(AtomicBool::new(false));
        hooks.register("boom", || panic!("hook failure"));
        let f = Arc::clone(&fired);
        hooks.register("after", move || f.store(true, Ordering::SeqCst));

        assert_eq!(hooks.run(), 2);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn guard_runs_on_drop() {
        let hooks = ShutdownHooks::new();
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        hooks.register("guarded", move || f.store(true, Ordering::SeqCst));

        {
            let _guard = hooks.guard();
        }
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn hook_may_unregister_another_hook() {
        let hooks = Arc::new(ShutdownHooks::new());
        let h = Arc::clone(&hooks);
        let second = Arc::new(Mutex::new(None));
        let s = Arc::clone(&second);
        hooks.register("first", move || {
            if let Some(id) = s.lock().unwrap().take() {
                h.unregister(id);
            }
        });
        *second.lock().unwrap() = Some(hooks.register("second", || {}));

        assert_eq!(hooks.run(), 2);
    }

    #[test]
    fn registrations_racing_run_all_execute() {
        for _ in 0..50 {
            let hooks = Arc::new(ShutdownHooks::new());
            let fired = Arc::new(AtomicUsize::new(0));

            let registrars: Vec<_> = (0..4)
                .map(|_| {
                    let hooks = Arc::clone(&hooks);
                    let fired = Arc::clone(&fired);
                    thread::spawn(move || {
                        for _ in 0..25 {
                            let fired = Arc::clone(&fired);
                            hooks.register("racing", move || {
                                fired.fetch_add(1, Ordering::SeqCst);
                            });
                        }
                    })
                })
                .collect();
            let runner = {
                let hooks = Arc::clone(&hooks);
                thread::spawn(move || hooks.run())
            };

            for t in registrars {
                t.join().unwrap();
            }
            runner.join().unwrap();

            assert_eq!(fired.load(Ordering::SeqCst), 100);
            assert!(hooks.is_empty());
        }
    }
}
