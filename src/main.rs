use anyhow::Context;
use clap::{Parser, Subcommand};
use newsbot::api::{
    BrokerGateway, DryRunGateway, NewsApiClient, NewsSource, RestBrokerGateway, StaticNewsSource,
};
use newsbot::config::{AlertConfig, DEFAULT_CALL_TIMEOUT};
use newsbot::logging::setup_logging;
use newsbot::notify::notifier_for;
use newsbot::sentiment::{KeywordScorer, SentimentScorer};
use newsbot::{report_startup_failure, BotConfig, Coordinator};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "newsbot")]
#[command(about = "Trade a symbol on news sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once
    Run {
        /// Log orders instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Override the configured SYMBOL
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the sentiment score of each text
    Score {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Load and validate configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { dry_run, symbol } => run(dry_run, symbol).await,
        Commands::Score { texts } => {
            let scorer = KeywordScorer::new();
            for text in texts {
                println!("{:+}\t{}", scorer.score(&text).value(), text);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckConfig => {
            let config = BotConfig::from_env().context("invalid configuration")?;
            println!("{:#?}", config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(dry_run: bool, symbol: Option<String>) -> anyhow::Result<ExitCode> {
    let alerts = AlertConfig::from_env();
    setup_logging(alerts.log_file.as_deref())?;
    let notifier = notifier_for(alerts.email.as_ref());

    let config = match load_config(symbol) {
        Ok(config) => config,
        Err(e) => {
            report_startup_failure(notifier.as_ref(), &e, DEFAULT_CALL_TIMEOUT).await;
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!(
        symbol = %config.trading.symbol,
        timeframe = %config.trading.timeframe,
        volume = config.trading.volume,
        risk_pct = config.trading.risk_percentage,
        tp_pct = config.trading.take_profit_percent,
        discount_pct = config.trading.entry_discount_percent,
        threshold = config.trading.decision_threshold,
        "🚀 Trade bot starting"
    );

    let rest = RestBrokerGateway::new(config.broker.url.clone(), config.call_timeout)?;
    let gateway: Arc<dyn BrokerGateway> = if dry_run {
        tracing::warn!("Running in DRY RUN mode - no orders will be sent");
        Arc::new(DryRunGateway::new(rest))
    } else {
        Arc::new(rest)
    };

    let news: Arc<dyn NewsSource> = match &config.news.api_key {
        Some(key) => Arc::new(NewsApiClient::new(
            config.news.base_url.clone(),
            key.clone(),
            config.news.page_size,
            config.call_timeout,
        )?),
        None => {
            tracing::warn!("NEWS_API_KEY not set, using placeholder headlines");
            Arc::new(StaticNewsSource::new())
        }
    };

    let coordinator = Coordinator::new(&config, gateway, news);
    let outcome = coordinator.run_and_notify(notifier.as_ref()).await;

    Ok(if outcome.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn load_config(symbol: Option<String>) -> newsbot::Result<BotConfig> {
    let mut config = BotConfig::from_env()?;
    if let Some(symbol) = symbol {
        config.trading.symbol = symbol.trim().to_uppercase();
        config.trading.validate()?;
    }
    Ok(config)
}
