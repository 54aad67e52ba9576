//! Gift-idea suggestions: prompt construction and reply parsing.

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::CompletionClient;

/// Matches the `"3. "` row numbers the model puts in front of each idea,
/// including stacked ones such as `"1. 2. "`.
static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9]+\.\s+)+").expect("enumeration regex is valid"));

/// Lines at the top of a reply that precede the enumerated ideas: the
/// opening blank line and a lead-in line.
const PREAMBLE_LINES: usize = 2;

/// A reply opening with exactly this many empty lines (`"\n\n"`) carries
/// them as its single opening blank line.
const OPENING_BLANK_PAIR: usize = 2;

fn build_prompt(query: &str, count: usize) -> String {
    format!("{count} good ideas for queries for gifts to find on Etsy for {query} are")
}

/// Remove every leading `"<n>. "` marker and any trailing whitespace.
///
/// Applying this to an already-stripped phrase leaves it unchanged.
fn strip_enumeration(line: &str) -> String {
    let line = line.trim_end();
    match ENUMERATION.find(line) {
        Some(m) => line[m.end()..].to_string(),
        None => line.to_string(),
    }
}

/// Turn a raw completion into one phrase per remaining non-empty line.
///
/// The reply opens with a blank line and a lead-in line; both are dropped.
/// Exactly two empty lines at the top count as that one opening blank line,
/// so `"\n\n1. Idea One\n2. Idea Two\n"` yields `["Idea Two"]`.  Any other
/// opening drops just the first two lines; further blank lines are filtered
/// out with the rest, so `"\n\n\n1. A\n2. B\n"` yields `["A", "B"]`.
fn parse_suggestions(raw: &str) -> Vec<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let leading_blank = lines.iter().take_while(|line| line.trim().is_empty()).count();
    let preamble = if leading_blank == OPENING_BLANK_PAIR {
        PREAMBLE_LINES + 1
    } else {
        PREAMBLE_LINES
    };

    lines
        .into_iter()
        .skip(preamble)
        .map(strip_enumeration)
        .filter(|phrase| !phrase.trim().is_empty())
        .collect()
}

/// Asks the completion service for `count` shopping-query ideas.
#[derive(Clone)]
pub struct SuggestionGenerator {
    client: Arc<dyn CompletionClient>,
}

impl SuggestionGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// The returned list is in reply order.  Its length follows whatever the
    /// service produced, not `count`.
    pub async fn generate(&self, query: &str, count: usize) -> Result<Vec<String>> {
        let prompt = build_prompt(query, count);
        let reply = self.client.complete(&prompt).await?;
        let ideas = parse_suggestions(&reply);
        debug!(query, requested = count, received = ideas.len(), "suggestions parsed");
        Ok(ideas)
    }
}
