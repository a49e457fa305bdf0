use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    drained: Notify,
}

/// Counter of outstanding crawl tasks that a caller can wait on.
#[derive(Clone, Debug, Default)]
pub struct CompletionTracker {
    inner: Arc<Outstanding>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.inner.count.fetch_add(n, Ordering::AcqRel);
    }

    /// Releases one unit of work, waking waiters when the count hits zero.
    pub fn done(&self) {
        let released =
            self.inner
                .count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match released {
            Ok(1) => self.inner.drained.notify_waiters(),
            Ok(_) => (),
            Err(_) => log::error!("Completion tracker released more work than was added"),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Adds one unit of work and returns a guard that releases it on drop.
    pub fn register(&self) -> WorkGuard {
        self.add(1);
        WorkGuard {
            tracker: self.clone(),
        }
    }

    /// Resolves once no work is outstanding.
    pub async fn wait(&self) {
        loop {
            // Created before the check so a release in between is not missed.
            let drained = self.inner.drained.notified();
            if self.outstanding() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// One registered unit of work. Dropping it calls [`CompletionTracker::done`].
#[derive(Debug)]
pub struct WorkGuard {
    tracker: CompletionTracker,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.tracker.done();
    }
}

/// Group of detached tokio tasks whose completion is tracked as a whole.
///
/// `spawn` registers the task before handing it to the runtime, so `wait`
/// can never observe zero while a child is about to be launched.
#[derive(Clone, Debug, Default)]
pub struct TaskGroup {
    tracker: CompletionTracker,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.tracker.register();
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    pub async fn wait(&self) {
        self.tracker.wait().await
    }
}
