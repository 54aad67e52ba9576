//! Marketplace search: build the search URL for a phrase, fetch the results
//! page, and pull listing cards out of it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::info;
use url::form_urlencoded;

use giftfinder_config::MarketplaceConfig;

mod extract;

use extract::parse_listings;

/// One search-result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub href: String,
    pub id: Option<String>,
    pub position: Option<String>,
    pub thumbnail: Option<String>,
}

/// Fetches a page body.  [`HttpFetcher`] in production; tests swap in fakes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("request timed out: {url}")
                } else if e.is_connect() {
                    anyhow::anyhow!("connection failed: {e}")
                } else {
                    anyhow::anyhow!("request error: {e}")
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            bail!("marketplace returned HTTP {status} for {url}");
        }

        Ok(resp.text().await?)
    }
}

/// Form-encode `phrase` (spaces become `+`) into `template`'s `{query}` slot.
pub fn search_url(template: &str, phrase: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(phrase.as_bytes()).collect();
    template.replace("{query}", &encoded)
}

#[derive(Clone)]
pub struct Marketplace {
    fetcher: Arc<dyn PageFetcher>,
    search_url: String,
}

impl Marketplace {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &MarketplaceConfig) -> Self {
        Self {
            fetcher,
            search_url: config.search_url.clone(),
        }
    }

    pub fn search_url(&self, phrase: &str) -> String {
        search_url(&self.search_url, phrase)
    }

    /// Up to `limit` listings for `phrase`, in page order.  The page is
    /// fetched even when `limit` is zero.
    pub async fn search(&self, phrase: &str, limit: usize) -> Result<Vec<Listing>> {
        let url = self.search_url(phrase);
        let body = self.fetcher.fetch(&url).await?;
        let listings = parse_listings(&body, limit);
        for listing in &listings {
            info!(phrase, ?listing, "listing");
        }
        Ok(listings)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
