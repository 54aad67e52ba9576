//! Per-request orchestration: query → suggestion phrases → listings per phrase.

use anyhow::Result;
use tracing::info;

use giftfinder_config::ServerConfig;
use giftfinder_llm::SuggestionGenerator;
use giftfinder_marketplace::{Listing, Marketplace};

/// Query used when the request carries none.
pub const DEFAULT_QUERY: &str = "a nephew who loves pokemon";

/// Canned suggestions for [`DEFAULT_QUERY`], so the landing page costs no
/// completion call.
pub const DEFAULT_SUGGESTIONS: [&str; 5] = [
    "Pokemon Plush Toy",
    "Pokemon Collectors Pin Badge Set",
    "Personalized Pokemon Birthday Card",
    "Pokemon-Themed Art Print",
    "Pokemon-Themed T-Shirt",
];

/// Listings found for one suggestion phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResults {
    pub phrase: String,
    pub search_url: String,
    pub listings: Vec<Listing>,
}

/// Everything the page renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPage {
    pub query: String,
    pub title: String,
    pub groups: Vec<SuggestionResults>,
    pub num_ideas: usize,
    pub num_results: usize,
}

#[derive(Clone)]
pub struct GiftFinder {
    generator: SuggestionGenerator,
    marketplace: Marketplace,
    num_ideas: usize,
    num_results: usize,
}

impl GiftFinder {
    pub fn new(generator: SuggestionGenerator, marketplace: Marketplace, server: &ServerConfig) -> Self {
        Self {
            generator,
            marketplace,
            num_ideas: server.num_ideas,
            num_results: server.num_results,
        }
    }

    /// The query a request is answered for.  Missing or blank input falls
    /// back to [`DEFAULT_QUERY`].
    pub fn effective_query(query: Option<&str>) -> &str {
        match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => DEFAULT_QUERY,
        }
    }

    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>> {
        if query == DEFAULT_QUERY {
            return Ok(DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect());
        }
        self.generator.generate(query, self.num_ideas).await
    }

    /// Build the full results page.  Phrases are searched one after another;
    /// the first failure aborts the whole page.
    pub async fn find(&self, query: Option<&str>) -> Result<ResultsPage> {
        let query = Self::effective_query(query);
        let phrases = self.suggestions(query).await?;
        info!(query, phrases = phrases.len(), "searching marketplace");

        let mut groups = Vec::with_capacity(phrases.len());
        for phrase in phrases {
            let listings = self.marketplace.search(&phrase, self.num_results).await?;
            groups.push(SuggestionResults {
                search_url: self.marketplace.search_url(&phrase),
                phrase,
                listings,
            });
        }

        Ok(ResultsPage {
            query: query.to_string(),
            title: format!("Perfect Etsy results for {query}"),
            groups,
            num_ideas: self.num_ideas,
            num_results: self.num_results,
        })
    }
}
