use std::{collections::HashSet, sync::Arc};
use tokio::sync::RwLock;

mod crawler;
mod event;
pub mod fetcher;
mod tracker;
mod visited;

pub use crawler::*;
pub use event::*;
pub use fetcher::{FakeFetcher, FetchFailure, Fetcher, HttpFetcher, Page};
pub use tracker::*;
pub use visited::*;

pub type Result<T> = eyre::Result<T>;
pub type AtomicSet = Arc<RwLock<HashSet<String>>>;
