use std::fmt;

use crate::FetchFailure;

/// A page fetched during a crawl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emission {
    pub id: String,
    pub body: String,
    /// Fetches performed by the whole crawl up to and including this one.
    pub count: usize,
}

impl fmt::Display for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "found: {} {:?} (count: {})", self.id, self.body, self.count)
    }
}

/// What a single traversal step reports.
#[derive(Debug)]
pub enum CrawlEvent {
    Fetched(Emission),
    Failed(FetchFailure),
}

impl CrawlEvent {
    pub fn id(&self) -> &str {
        match self {
            CrawlEvent::Fetched(emission) => &emission.id,
            CrawlEvent::Failed(failure) => &failure.id,
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlEvent::Fetched(emission) => emission.fmt(f),
            CrawlEvent::Failed(failure) => failure.fmt(f),
        }
    }
}

/// Everything a finished crawl emitted.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub fetched: Vec<Emission>,
    pub failed: Vec<FetchFailure>,
}

impl CrawlReport {
    pub fn fetch_count(&self) -> usize {
        self.fetched.len() + self.failed.len()
    }

    pub fn fetched_ids(&self) -> Vec<&str> {
        self.fetched.iter().map(|e| e.id.as_str()).collect()
    }

    pub(crate) fn record(&mut self, event: CrawlEvent) {
        match event {
            CrawlEvent::Fetched(emission) => self.fetched.push(emission),
            CrawlEvent::Failed(failure) => self.failed.push(failure),
        }
    }
}

impl Extend<CrawlEvent> for CrawlReport {
    fn extend<I: IntoIterator<Item = CrawlEvent>>(&mut self, iter: I) {
        for event in iter {
            self.record(event);
        }
    }
}
