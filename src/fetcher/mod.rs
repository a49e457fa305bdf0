use async_trait::async_trait;
use thiserror::Error;

mod fake;
mod http;

pub use fake::FakeFetcher;
pub use http::HttpFetcher;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A successfully fetched page: its body and the identifiers it links to,
/// in the order they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    pub urls: Vec<String>,
}

impl Page {
    pub fn new(body: impl Into<String>, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            body: body.into(),
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }
}

/// Fetching `id` failed. Local to the traversal that hit it.
#[derive(Debug, Error)]
#[error("{cause}: {id}")]
pub struct FetchFailure {
    pub id: String,
    #[source]
    pub cause: BoxError,
}

impl FetchFailure {
    pub fn new(id: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            id: id.into(),
            cause: cause.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::new(id, "not found")
    }
}

/// Capability to fetch a page by identifier.
///
/// Called concurrently from many crawl tasks with different identifiers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Page, FetchFailure>;
}
