use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use giftfinder_config::AppConfig;
use giftfinder_llm::{OpenAiClient, SuggestionGenerator};
use giftfinder_marketplace::{HttpFetcher, Marketplace};
use giftfinder_server::{GiftFinder, run_server};

#[derive(Debug, Parser)]
#[command(
    name = "giftfinder",
    version,
    about = "An app to find the perfect gift at Etsy"
)]
struct Cli {
    /// OpenAI API key (required; falls back to OPENAI_API_KEY).
    #[arg(long)]
    api_key: Option<String>,
    /// Host IP address. Default is localhost (127.0.0.1).
    #[arg(long)]
    host: Option<String>,
    /// Host port. Default is 8888.
    #[arg(long)]
    port: Option<u16>,
    /// Number of results to render per query. Default is 5. Max is 6.
    #[arg(long)]
    num_results: Option<usize>,
    /// Number of rows/ideas to visualize. Default is 5. Max is 10.
    #[arg(long)]
    num_ideas: Option<usize>,
    /// Optional TOML config file; flags take precedence over it.
    #[arg(long, default_value = "config/default.toml")]
    config: String,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(key) = &self.api_key {
            config.llm.api_key = key.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(num_results) = self.num_results {
            config.server.num_results = num_results;
        }
        if let Some(num_ideas) = self.num_ideas {
            config.server.num_ideas = num_ideas;
        }
    }
}

fn build_finder(config: &AppConfig) -> Result<GiftFinder> {
    let completion = OpenAiClient::new(&config.llm)?;
    let fetcher = HttpFetcher::new(&config.marketplace)?;
    Ok(GiftFinder::new(
        SuggestionGenerator::new(Arc::new(completion)),
        Marketplace::new(Arc::new(fetcher), &config.marketplace),
        &config.server,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    info!(
        model = %config.llm.model,
        num_ideas = config.server.num_ideas,
        num_results = config.server.num_results,
        "configuration loaded"
    );

    let finder = build_finder(&config)?;
    run_server(finder, &config.server.bind_addr()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use giftfinder_config::ConfigError;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "giftfinder",
            "--api-key", "sk-flag",
            "--host", "0.0.0.0",
            "--port", "9000",
            "--num-results", "6",
            "--num-ideas", "10",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.llm.api_key, "sk-flag");
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.server.num_results, 6);
        assert_eq!(config.server.num_ideas, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::parse_from(["giftfinder"]);
        let mut config = AppConfig::default();
        config.server.port = 7000;
        cli.apply(&mut config);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(cli.config, "config/default.toml");
    }

    #[test]
    fn out_of_range_flag_fails_validation() {
        let cli = Cli::parse_from(["giftfinder", "--api-key", "sk", "--num-results", "7"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.validate(), Err(ConfigError::NumResultsOutOfRange(7)));
    }

    #[test]
    fn negative_count_is_rejected_by_parser() {
        let parsed = Cli::try_parse_from(["giftfinder", "--num-ideas", "-1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn finder_builds_from_valid_config() {
        let mut config = AppConfig::default();
        config.llm.api_key = "sk-test".to_string();
        assert!(build_finder(&config).is_ok());
    }
}
