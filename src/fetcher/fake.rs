use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;

use super::{FetchFailure, Fetcher, Page};

/// Fetcher that answers from a fixed table of pages.
///
/// Every call is counted per identifier, so tests can check how often a page
/// was requested. An optional delay before each answer widens the window in
/// which concurrent traversals interleave.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Page>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new(pages: HashMap<String, Page>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The golang.org tour table. `https://golang.org/cmd/` is linked but
    /// missing, so crawling it exercises the failure path.
    pub fn go_tour() -> Self {
        Self::from_iter([
            (
                "https://golang.org/",
                Page::new(
                    "The Go Programming Language",
                    ["https://golang.org/pkg/", "https://golang.org/cmd/"],
                ),
            ),
            (
                "https://golang.org/pkg/",
                Page::new(
                    "Packages",
                    [
                        "https://golang.org/",
                        "https://golang.org/cmd/",
                        "https://golang.org/pkg/fmt/",
                        "https://golang.org/pkg/os/",
                    ],
                ),
            ),
            (
                "https://golang.org/pkg/fmt/",
                Page::new(
                    "Package fmt",
                    ["https://golang.org/", "https://golang.org/pkg/"],
                ),
            ),
            (
                "https://golang.org/pkg/os/",
                Page::new(
                    "Package os",
                    ["https://golang.org/", "https://golang.org/pkg/"],
                ),
            ),
        ])
    }

    pub fn calls(&self, id: &str) -> usize {
        self.lock_calls().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    /// Identifiers fetched more than once.
    pub fn repeated(&self) -> Vec<String> {
        self.lock_calls()
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Into<String>> FromIterator<(K, Page)> for FakeFetcher {
    fn from_iter<I: IntoIterator<Item = (K, Page)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(id, page)| (id.into(), page)).collect())
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, id: &str) -> Result<Page, FetchFailure> {
        *self.lock_calls().entry(id.to_owned()).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchFailure::not_found(id))
    }
}
