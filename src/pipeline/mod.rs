// One bounded run: login -> news -> decision -> plan -> order
use crate::api::{stock_query, with_timeout, BrokerGateway, NewsSource};
use crate::config::{BotConfig, BrokerConfig, TradingConfig};
use crate::execution::{OrderExecutor, PricePlanner};
use crate::models::{OrderResult, PriceLevels, TradeDecision};
use crate::notify::{Notifier, ERROR_SUBJECT};
use crate::sentiment::{KeywordScorer, SentimentScorer};
use crate::strategy::{DecisionEngine, SentimentTally};
use crate::{BotError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Initialized,
    Scored,
    Decided,
    Planned,
    Submitted,
    SkippedHold,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a run that reached `Done` did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub symbol: String,
    pub tally: SentimentTally,
    pub decision: TradeDecision,
    pub current_price: Option<f64>,
    pub levels: Option<PriceLevels>,
    pub order: Option<OrderResult>,
    pub transitions: Vec<PipelineState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn final_state(&self) -> PipelineState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }
}

/// A run that ended in `Failed`
#[derive(Debug)]
pub struct RunFailure {
    pub run_id: Uuid,
    pub symbol: String,
    /// Last state reached before the fault
    pub failed_after: PipelineState,
    pub error: BotError,
    pub transitions: Vec<PipelineState>,
}

impl RunFailure {
    /// Notification body
    pub fn summary(&self) -> String {
        format!(
            "{}\n\nrun: {}\nsymbol: {}\nfailed after: {}\nkind: {}",
            self.error,
            self.run_id,
            self.symbol,
            self.failed_after,
            self.error.kind()
        )
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }

    pub fn final_state(&self) -> PipelineState {
        match self {
            RunOutcome::Completed(report) => report.final_state(),
            RunOutcome::Failed(_) => PipelineState::Failed,
        }
    }
}

// Mutable bookkeeping for a run in progress
struct RunProgress {
    run_id: Uuid,
    symbol: String,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    tally: SentimentTally,
    decision: TradeDecision,
    current_price: Option<f64>,
    levels: Option<PriceLevels>,
    order: Option<OrderResult>,
    started_at: DateTime<Utc>,
}

impl RunProgress {
    fn new(symbol: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            tally: SentimentTally::default(),
            decision: TradeDecision::Hold,
            current_price: None,
            levels: None,
            order: None,
            started_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::info!(from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
        self.transitions.push(next);
    }

    fn into_report(self) -> RunReport {
        RunReport {
            run_id: self.run_id,
            symbol: self.symbol,
            tally: self.tally,
            decision: self.decision,
            current_price: self.current_price,
            levels: self.levels,
            order: self.order,
            transitions: self.transitions,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    fn into_failure(mut self, error: BotError) -> RunFailure {
        let failed_after = self.state;
        self.transition(PipelineState::Failed);
        RunFailure {
            run_id: self.run_id,
            symbol: self.symbol,
            failed_after,
            error,
            transitions: self.transitions,
        }
    }
}

// Best-effort: a delivery fault is logged and dropped
async fn send_alert(notifier: &dyn Notifier, body: &str, timeout: Duration) {
    let sent = with_timeout("notify", timeout, notifier.notify(ERROR_SUBJECT, body)).await;
    if let Err(e) = sent {
        tracing::error!("Failed to send notification via {}: {}", notifier.name(), e);
    }
}

/// Log a fault raised before a run could start and send exactly one notification
pub async fn report_startup_failure(
    notifier: &dyn Notifier,
    error: &BotError,
    timeout: Duration,
) {
    tracing::error!(kind = error.kind(), "Error in startup: {}", error);
    let body = format!("{}\n\nfailed during: startup\nkind: {}", error, error.kind());
    send_alert(notifier, &body, timeout).await;
}

/// Sequences the pipeline once per invocation
///
/// Owns its gateway session for the duration of a run. Faults from any step
/// come back unmodified inside [`RunFailure`]; nothing is retried.
pub struct Coordinator {
    broker: BrokerConfig,
    trading: TradingConfig,
    call_timeout: Duration,
    gateway: Arc<dyn BrokerGateway>,
    news: Arc<dyn NewsSource>,
    engine: DecisionEngine,
    planner: PricePlanner,
    executor: OrderExecutor,
}

impl Coordinator {
    pub fn new(
        config: &BotConfig,
        gateway: Arc<dyn BrokerGateway>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        let trading = config.trading.clone();
        Self {
            broker: config.broker.clone(),
            engine: DecisionEngine::new(Box::new(KeywordScorer::new()), trading.decision_threshold),
            planner: PricePlanner::new(trading.entry_discount_percent, trading.take_profit_percent),
            executor: OrderExecutor::new(gateway.clone(), config.call_timeout),
            call_timeout: config.call_timeout,
            trading,
            gateway,
            news,
        }
    }

    /// Replace the default keyword scorer
    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.engine = DecisionEngine::new(scorer, self.trading.decision_threshold);
        self
    }

    pub fn trading(&self) -> &TradingConfig {
        &self.trading
    }

    /// Execute one run
    pub async fn run(&self) -> std::result::Result<RunReport, RunFailure> {
        let mut progress = RunProgress::new(&self.trading.symbol);
        let span = tracing::info_span!(
            "run",
            run_id = %progress.run_id,
            symbol = %self.trading.symbol
        );

        async move {
            match self.advance(&mut progress).await {
                Ok(()) => Ok(progress.into_report()),
                Err(error) => Err(progress.into_failure(error)),
            }
        }
        .instrument(span)
        .await
    }

    /// Execute one run; on failure log it and send exactly one notification
    pub async fn run_and_notify(&self, notifier: &dyn Notifier) -> RunOutcome {
        match self.run().await {
            Ok(report) => {
                tracing::info!(
                    run_id = %report.run_id,
                    decision = %report.decision,
                    "Run finished in {}",
                    report.final_state()
                );
                RunOutcome::Completed(report)
            }
            Err(failure) => {
                tracing::error!(
                    run_id = %failure.run_id,
                    kind = failure.error.kind(),
                    "Error in main execution: {}",
                    failure.error
                );

                send_alert(notifier, &failure.summary(), self.call_timeout).await;
                RunOutcome::Failed(failure)
            }
        }
    }

    async fn advance(&self, progress: &mut RunProgress) -> Result<()> {
        let symbol = self.trading.symbol.as_str();

        // Idle -> Initialized
        with_timeout(
            "login",
            self.call_timeout,
            self.gateway.login(
                self.broker.account_id,
                &self.broker.password,
                &self.broker.server,
            ),
        )
        .await?;
        progress.transition(PipelineState::Initialized);

        // Initialized -> Scored
        let query = stock_query(symbol);
        let articles = with_timeout("news_fetch", self.call_timeout, self.news.fetch(&query)).await?;
        progress.tally = self.engine.tally(&articles);
        tracing::info!(
            source = self.news.name(),
            scorer = self.engine.scorer_name(),
            articles = articles.len(),
            positive = progress.tally.positive,
            negative = progress.tally.negative,
            "Scored news for '{}'",
            query
        );
        progress.transition(PipelineState::Scored);

        // Scored -> Decided
        progress.decision = self.engine.decide_from_tally(&progress.tally);
        progress.transition(PipelineState::Decided);

        let Some(side) = progress.decision.side() else {
            tracing::info!("No trade action needed.");
            progress.transition(PipelineState::SkippedHold);
            progress.transition(PipelineState::Done);
            return Ok(());
        };

        // Decided -> Planned
        let price = self
            .executor
            .latest_price(symbol, self.trading.timeframe)
            .await?;
        progress.current_price = Some(price);
        let levels = self.planner.plan(side, price)?;
        progress.levels = Some(levels);
        progress.transition(PipelineState::Planned);

        // Planned -> Submitted
        let result = self
            .executor
            .execute(side, symbol, levels, self.trading.volume)
            .await?;
        progress.order = Some(result);
        progress.transition(PipelineState::Submitted);

        progress.transition(PipelineState::Done);
        Ok(())
    }
}
