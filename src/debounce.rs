use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Cancellable scheduled task: scheduling a new future replaces (aborts) any
/// pending one, so rapid-fire callers coalesce into the last invocation.
#[derive(Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Debouncer::default()
    }

    /// Runs `task` after a quiet interval, unless superseded by a newer
    /// `schedule` (or `cancel`) first.
    pub fn schedule<F>(&self, quiet: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            task.await;
        });
        self.replace(Some(handle));
    }

    /// Aborts the pending task, if any.
    pub fn cancel(&self) {
        self.replace(None);
    }

    fn replace(&self, handle: Option<JoinHandle<()>>) {
        let previous = match self.pending.lock() {
            Ok(mut pending) => std::mem::replace(&mut *pending, handle),
            Err(_) => None,
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
