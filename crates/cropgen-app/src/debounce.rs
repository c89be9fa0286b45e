//! Debounced, single-flight execution of expensive work.
//!
//! Every [`schedule`](DebounceScheduler::schedule) call replaces the
//! pending request: its snapshot is held for the quiet period and the
//! work runs only if no newer request arrives in the meantime. Executions
//! are serialized, so a request that becomes due while an earlier one is
//! still running waits for it to finish.
//!
//! Delayed requests are spawned onto the current Tokio runtime and the work
//! itself runs on the blocking pool. Without a runtime there is no timer,
//! and `schedule` runs the work immediately instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default delay between the last request and execution.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Identifies one scheduled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceToken(u64);

struct Pending {
    token: DebounceToken,
    handle: JoinHandle<()>,
}

type Work<T> = Arc<dyn Fn(T) + Send + Sync>;

/// State shared between the scheduler and its spawned requests.
struct Shared<T> {
    work: Work<T>,
    // Token of the most recent request; 0 once cancelled
    latest: AtomicU64,
    running: Mutex<()>,
}

impl<T> Shared<T> {
    fn lock_running(&self) -> MutexGuard<'_, ()> {
        match self.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("debounce run lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Run `work` for `token` unless a newer request has replaced it.
    ///
    /// The token is checked while holding `running`, so a request that lost
    /// the race never overwrites a newer result.
    fn run_if_latest(&self, token: DebounceToken, snapshot: T) -> bool {
        let _running = self.lock_running();
        if self.latest.load(Ordering::SeqCst) != token.0 {
            return false;
        }
        (self.work)(snapshot);
        true
    }
}

pub struct DebounceScheduler<T> {
    quiet_period: Duration,
    shared: Arc<Shared<T>>,
    pending: Mutex<Option<Pending>>,
    next_token: AtomicU64,
}

impl<T> fmt::Debug for DebounceScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebounceScheduler")
            .field("quiet_period", &self.quiet_period)
            .field("latest", &self.shared.latest.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T: Send + 'static> DebounceScheduler<T> {
    /// Create a scheduler that runs `work` once requests go quiet.
    pub fn new<F>(quiet_period: Duration, work: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            quiet_period,
            shared: Arc::new(Shared {
                work: Arc::new(work),
                latest: AtomicU64::new(0),
                running: Mutex::new(()),
            }),
            pending: Mutex::new(None),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Claim a new token and drop the pending request, if any.
    fn supersede(&self) -> DebounceToken {
        let token = DebounceToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.shared.latest.store(token.0, Ordering::SeqCst);
        if let Some(previous) = self.pending().take() {
            previous.handle.abort();
            log::trace!("debounce request {:?} superseded by {:?}", previous.token, token);
        }
        token
    }

    /// Request execution with `snapshot`, superseding any pending request.
    ///
    /// Outside a Tokio runtime the work runs before this returns.
    pub fn schedule(&self, snapshot: T) -> DebounceToken {
        let token = self.supersede();
        let Ok(runtime) = Handle::try_current() else {
            log::debug!("no async runtime, running debounced work immediately");
            self.shared.run_if_latest(token, snapshot);
            return token;
        };

        let shared = Arc::clone(&self.shared);
        let quiet_period = self.quiet_period;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let ran = tokio::task::spawn_blocking(move || shared.run_if_latest(token, snapshot)).await;
            if let Err(e) = ran {
                log::warn!("debounced work for {token:?} did not finish: {e}");
            }
        });

        *self.pending() = Some(Pending { token, handle });
        token
    }

    /// Run `f` on the calling thread in place of any pending request.
    ///
    /// Waits for an execution that is already under way, so `f` never
    /// overlaps the scheduled work and its effects land last.
    pub fn run_exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        self.supersede();
        let _running = self.shared.lock_running();
        f()
    }

    /// Run the work with `snapshot` now, superseding any pending request.
    pub fn run_now(&self, snapshot: T) {
        self.run_exclusive(|| (self.shared.work)(snapshot))
    }

    /// Cancel the request identified by `token` if it has not run yet.
    ///
    /// Returns `false` if `token` is no longer the pending request.
    pub fn cancel(&self, token: DebounceToken) -> bool {
        let mut pending = self.pending();
        match pending.as_ref() {
            Some(p) if p.token == token => {
                self.shared.latest.store(0, Ordering::SeqCst);
                if let Some(p) = pending.take() {
                    p.handle.abort();
                }
                true
            }
            _ => false,
        }
    }

    /// Cancel whatever request is pending.
    pub fn cancel_all(&self) {
        self.shared.latest.store(0, Ordering::SeqCst);
        if let Some(p) = self.pending().take() {
            p.handle.abort();
        }
    }

    /// Whether a request is waiting for its quiet period or running.
    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl<T> DebounceScheduler<T> {
    fn pending(&self) -> MutexGuard<'_, Option<Pending>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("debounce lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl<T> Drop for DebounceScheduler<T> {
    fn drop(&mut self) {
        if let Some(p) = self.pending().take() {
            p.handle.abort();
        }
    }
}
