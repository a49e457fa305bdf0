use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use super::{FetchFailure, Fetcher, Page};
use crate::Result;

const SKIPPED_SCHEMES: [&str; 3] = ["mailto:", "javascript:", "tel:"];

/// Fetches pages over HTTP and extracts the `<a href>` links of each body.
pub struct HttpFetcher {
    client: reqwest::Client,
    scope: Option<String>,
    anchor_selector: Selector,
    noscript_selector: Selector,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            scope: None,
            anchor_selector: parse_selector("a")?,
            noscript_selector: parse_selector("noscript")?,
        })
    }

    /// Only report links whose host is `host`.
    pub fn scoped_to(mut self, host: impl Into<String>) -> Self {
        self.scope = Some(host.into());
        self
    }

    /// Absolute links of `html`, resolved against `base`, deduplicated in
    /// order of first appearance.
    pub fn parse_urls(&self, html: &str, base: &Url) -> Vec<String> {
        let mut documents = Vec::new();
        let document = Html::parse_document(html);

        // noscript content comes back as raw text, so it is parsed again
        for noscript in document.select(&self.noscript_selector) {
            let document = Html::parse_document(&noscript.text().collect::<Vec<_>>().join(""));
            documents.push(document);
        }
        documents.push(document);

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for document in documents {
            for link in document.select(&self.anchor_selector) {
                let href = match link.value().attr("href") {
                    Some(href) => href,
                    None => {
                        log::debug!("Found <a> without href: {:?}", link.value());
                        continue;
                    }
                };
                if let Some(url) = self.resolve(base, href) {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
            }
        }
        urls
    }

    fn resolve(&self, base: &Url, href: &str) -> Option<String> {
        if href.starts_with('#') || SKIPPED_SCHEMES.iter().any(|s| href.starts_with(s)) {
            return None;
        }
        let mut url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("Found Error with href {} : {:?}", href, e);
                return None;
            }
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        if let Some(scope) = &self.scope {
            if url.host_str() != Some(scope.as_str()) {
                return None;
            }
        }
        url.set_fragment(None);
        Some(url.into())
    }
}

fn parse_selector(selector: &'static str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| eyre::eyre!("invalid selector {}: {:?}", selector, e))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> std::result::Result<Page, FetchFailure> {
        let url = Url::parse(id).map_err(|e| FetchFailure::new(id, e))?;
        log::debug!("Requesting {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| FetchFailure::new(id, e.without_url()))?;
        let base = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::new(id, e.without_url()))?;

        let urls = self.parse_urls(&body, &base);
        Ok(Page { body, urls })
    }
}
