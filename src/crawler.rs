use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use flume::{Receiver, Sender};
use futures::{future::BoxFuture, FutureExt};

use crate::{CrawlEvent, CrawlReport, Emission, Fetcher, TaskGroup, VisitedRegistry};

struct Shared<F> {
    fetcher: Arc<F>,
    visited: VisitedRegistry,
    group: TaskGroup,
    fetches: AtomicUsize,
    cancelled: AtomicBool,
    event_tx: Sender<CrawlEvent>,
    event_rx: Receiver<CrawlEvent>,
}

/// Concurrent depth-bounded crawl over a [`Fetcher`].
///
/// One `Crawler` is one crawl invocation: it owns the visited registry, the
/// group of spawned traversals and the cumulative fetch counter. Clones share
/// all of it.
pub struct Crawler<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for Crawler<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: Fetcher + 'static> Crawler<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_registry(fetcher, VisitedRegistry::new())
    }

    /// Crawler whose claims go into `visited`, which may already hold claims
    /// from an earlier crawl. Those identifiers are never fetched again.
    pub fn with_registry(fetcher: Arc<F>, visited: VisitedRegistry) -> Self {
        let (event_tx, event_rx) = flume::unbounded();
        Self {
            shared: Arc::new(Shared {
                fetcher,
                visited,
                group: TaskGroup::new(),
                fetches: AtomicUsize::new(0),
                cancelled: AtomicBool::new(false),
                event_tx,
                event_rx,
            }),
        }
    }

    /// Receiver for every event this crawler emits.
    ///
    /// The crawler holds a receiver of its own, so the channel stays open and
    /// unreceived events, page bodies included, are buffered until they are
    /// drained or the crawler is dropped. [`Crawler::run`] drains them.
    pub fn events(&self) -> Receiver<CrawlEvent> {
        self.shared.event_rx.clone()
    }

    pub fn visited(&self) -> &VisitedRegistry {
        &self.shared.visited
    }

    /// Number of fetches performed so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.shared.fetches.load(Ordering::Acquire)
    }

    /// Traversals launched but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.shared.group.outstanding()
    }

    /// Stops launching new traversals. Fetches already in flight finish.
    pub fn cancel(&self) {
        log::info!("Crawl cancelled");
        self.shared.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Fetches `id` and launches a tracked traversal for every link on it.
    ///
    /// Returns once `id` itself is handled; the traversals it launched may
    /// still be running. Use [`Crawler::wait_for_completion`] to wait for
    /// them.
    pub async fn crawl(&self, id: impl Into<String>, depth: i64) {
        self.traverse(id.into(), depth).await
    }

    /// Launches `crawl(id, depth)` as a tracked task.
    pub fn spawn(&self, id: impl Into<String>, depth: i64) {
        self.shared.group.spawn(self.traverse(id.into(), depth));
    }

    /// Resolves once every traversal launched by this crawler has finished.
    pub async fn wait_for_completion(&self) {
        self.shared.group.wait().await
    }

    /// Crawls from `id` to `depth`, waits for the whole tree and collects the
    /// events that have not been received elsewhere.
    pub async fn run(&self, id: impl Into<String>, depth: i64) -> CrawlReport {
        self.spawn(id, depth);
        self.wait_for_completion().await;

        let mut report = CrawlReport::default();
        report.extend(self.shared.event_rx.try_iter());
        report
    }

    fn traverse(&self, id: String, depth: i64) -> BoxFuture<'static, ()> {
        let this = self.clone();
        async move {
            if depth <= 0 {
                return;
            }
            if this.is_cancelled() {
                log::debug!("Skipping {} after cancellation", id);
                return;
            }
            if !this.shared.visited.try_claim(&id).await {
                log::trace!("Already claimed {}", id);
                return;
            }

            let fetched = this.shared.fetcher.fetch(&id).await;
            let count = this.shared.fetches.fetch_add(1, Ordering::AcqRel) + 1;
            let page = match fetched {
                Ok(page) => page,
                Err(failure) => {
                    log::warn!("{}", failure);
                    this.emit(CrawlEvent::Failed(failure));
                    return;
                }
            };

            log::info!("Visited {} at depth {} (count: {})", id, depth, count);
            this.emit(CrawlEvent::Fetched(Emission {
                id,
                body: page.body,
                count,
            }));

            if this.is_cancelled() {
                return;
            }
            for url in page.urls {
                this.shared.group.spawn(this.traverse(url, depth - 1));
            }
        }
        .boxed()
    }

    fn emit(&self, event: CrawlEvent) {
        if self.shared.event_tx.send(event).is_err() {
            log::error!("Event channel closed");
        }
    }
}
