//! Loading flag shared with presentation code.
//!
//! The flag is true exactly while a generation request is outstanding.
//! Setting it is tied to an [`InFlight`] guard, so every path out of a
//! submission (success, error, or a dropped future) clears it once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Inner {
    value: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
}

/// Observable "request in flight" flag.
#[derive(Clone, Default)]
pub struct LoadingFlag {
    inner: Arc<Inner>,
}

impl fmt::Debug for LoadingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingFlag")
            .field("value", &self.get())
            .finish()
    }
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.inner.value.load(Ordering::SeqCst)
    }

    /// Call `listener` with the new value on every transition.
    ///
    /// Listeners run outside the listener lock and may subscribe others;
    /// those hear from the next transition on.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.listeners().push(Arc::new(listener));
    }

    /// Raise the flag.
    ///
    /// Returns `None` if it is already raised; otherwise the returned guard
    /// lowers it again when dropped.
    pub fn begin(&self) -> Option<InFlight> {
        self.inner
            .value
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.notify(true);
        Some(InFlight { flag: self.clone() })
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        match self.inner.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("loading flag listener lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn notify(&self, value: bool) {
        let listeners = self.listeners().clone();
        for listener in &listeners {
            listener(value);
        }
    }
}

/// Keeps a [`LoadingFlag`] raised until dropped.
#[must_use = "the loading flag is lowered as soon as the guard is dropped"]
pub struct InFlight {
    flag: LoadingFlag,
}

impl fmt::Debug for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InFlight")
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.inner.value.store(false, Ordering::SeqCst);
        self.flag.notify(false);
    }
}
