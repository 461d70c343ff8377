use async_trait::async_trait;
use newsbot::api::{BrokerGateway, NewsSource};
use newsbot::models::{
    Article, OrderRequest, OrderSide, OutcomeCode, Polarity, Timeframe, TradeDecision,
};
use newsbot::config::AlertConfig;
use newsbot::notify::{Notifier, ERROR_SUBJECT};
use newsbot::pipeline::{PipelineState, RunOutcome};
use newsbot::sentiment::SentimentScorer;
use newsbot::{report_startup_failure, BotConfig, BotError, Coordinator, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::assert_ok;

// ============================================================================
// Fakes
// ============================================================================

struct FakeGateway {
    login_ok: bool,
    price: Option<f64>,
    code: OutcomeCode,
    logins: AtomicUsize,
    quotes: AtomicUsize,
    orders: Mutex<Vec<OrderRequest>>,
}

impl FakeGateway {
    fn new(price: Option<f64>, code: OutcomeCode) -> Self {
        Self {
            login_ok: true,
            price,
            code,
            logins: AtomicUsize::new(0),
            quotes: AtomicUsize::new(0),
            orders: Mutex::new(Vec::new()),
        }
    }

    fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerGateway for FakeGateway {
    async fn login(&self, account_id: u64, _password: &str, server: &str) -> Result<()> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        assert_eq!(account_id, 5012345);
        assert_eq!(server, "Broker-Demo");
        if self.login_ok {
            Ok(())
        } else {
            Err(BotError::GatewayInit("invalid credentials".into()))
        }
    }

    async fn latest_price(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<f64>> {
        self.quotes.fetch_add(1, Ordering::SeqCst);
        assert_eq!(symbol, "AAPL");
        assert_eq!(timeframe, Timeframe::M1);
        Ok(self.price)
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OutcomeCode> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(self.code)
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

struct FakeNews {
    titles: Vec<&'static str>,
    delay: Duration,
    queries: Mutex<Vec<String>>,
}

impl FakeNews {
    fn new(titles: &[&'static str]) -> Self {
        Self {
            titles: titles.to_vec(),
            delay: Duration::ZERO,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NewsSource for FakeNews {
    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        tokio::time::sleep(self.delay).await;
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.titles.iter().map(|t| Article::new(*t)).collect())
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        if self.fail {
            Err(BotError::Notify("smtp down".into()))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn config() -> BotConfig {
    let vars = [
        ("ACCOUNT_NUMBER", "5012345"),
        ("PASSWORD", "secret"),
        ("SERVER", "Broker-Demo"),
        ("SYMBOL", "AAPL"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    BotConfig::from_vars(vars).unwrap()
}

fn coordinator(gateway: &Arc<FakeGateway>, news: &Arc<FakeNews>) -> Coordinator {
    Coordinator::new(&config(), gateway.clone(), news.clone())
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_neutral_news_holds_without_order() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock is performing well"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    let RunOutcome::Completed(report) = outcome else {
        panic!("run should complete");
    };
    assert_eq!(report.decision, TradeDecision::Hold);
    assert_eq!(report.tally.polarity(), 0);
    assert!(report.order.is_none());
    assert_eq!(
        report.transitions,
        vec![
            PipelineState::Idle,
            PipelineState::Initialized,
            PipelineState::Scored,
            PipelineState::Decided,
            PipelineState::SkippedHold,
            PipelineState::Done,
        ]
    );
    assert_eq!(gateway.quotes.load(Ordering::SeqCst), 0);
    assert!(gateway.orders().is_empty());
    assert_eq!(notifier.count(), 0);
    assert_eq!(*news.queries.lock().unwrap(), vec!["AAPL stock".to_string()]);
}

#[tokio::test]
async fn test_positive_news_buys_at_planned_levels() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    let RunOutcome::Completed(report) = outcome else {
        panic!("run should complete");
    };
    assert_eq!(report.decision, TradeDecision::Buy);
    assert_eq!(report.current_price, Some(100.0));
    assert_eq!(report.final_state(), PipelineState::Done);
    assert!(report.transitions.contains(&PipelineState::Planned));
    assert!(report.transitions.contains(&PipelineState::Submitted));
    assert!(report.order.unwrap().success);

    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, "AAPL");
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].volume, 0.1);
    assert!(approx(orders[0].entry_price, 98.0));
    assert!(approx(orders[0].take_profit, 110.0));
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_missing_quote_fails_run_and_notifies_once() {
    let gateway = Arc::new(FakeGateway::new(None, OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    assert_eq!(outcome.final_state(), PipelineState::Failed);
    let RunOutcome::Failed(failure) = outcome else {
        panic!("run should fail");
    };
    assert!(matches!(failure.error, BotError::MarketDataUnavailable { .. }));
    assert_eq!(failure.failed_after, PipelineState::Decided);
    assert!(gateway.orders().is_empty());

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Trade Bot Error");
    assert!(sent[0].1.contains("no market data available for AAPL"));
}

#[tokio::test]
async fn test_rejected_order_completes_without_notification() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::REJECT));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    assert!(!outcome.is_failed());
    assert_eq!(outcome.final_state(), PipelineState::Done);
    let RunOutcome::Completed(report) = outcome else {
        panic!("run should complete");
    };
    let order = report.order.unwrap();
    assert!(!order.success);
    assert_eq!(order.code, OutcomeCode::REJECT);
    assert_eq!(gateway.orders().len(), 1);
    assert_eq!(notifier.count(), 0);
}

// ============================================================================
// Other paths
// ============================================================================

#[tokio::test]
async fn test_negative_news_sells_with_same_formulas() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["Bearish call on AAPL", "AAPL loss widens", "Quiet day"]));

    let report = assert_ok!(coordinator(&gateway, &news).run().await.map_err(|f| f.error));

    assert_eq!(report.decision, TradeDecision::Sell);
    let orders = gateway.orders();
    assert_eq!(orders[0].side, OrderSide::Sell);
    assert!(approx(orders[0].entry_price, 98.0));
    assert!(approx(orders[0].take_profit, 110.0));
}

#[tokio::test]
async fn test_no_articles_holds() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&[]));

    let report = assert_ok!(coordinator(&gateway, &news).run().await.map_err(|f| f.error));

    assert_eq!(report.decision, TradeDecision::Hold);
    assert_eq!(report.tally.total(), 0);
    assert!(gateway.orders().is_empty());
}

#[tokio::test]
async fn test_login_failure_aborts_before_news() {
    let mut fake = FakeGateway::new(Some(100.0), OutcomeCode::DONE);
    fake.login_ok = false;
    let gateway = Arc::new(fake);
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    let RunOutcome::Failed(failure) = outcome else {
        panic!("run should fail");
    };
    assert!(matches!(failure.error, BotError::GatewayInit(_)));
    assert_eq!(failure.failed_after, PipelineState::Idle);
    assert!(news.queries.lock().unwrap().is_empty());
    assert!(gateway.orders().is_empty());
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn test_invalid_quote_fails_run() {
    let gateway = Arc::new(FakeGateway::new(Some(0.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    let RunOutcome::Failed(failure) = outcome else {
        panic!("run should fail");
    };
    assert!(matches!(failure.error, BotError::InvalidPrice { .. }));
    assert!(gateway.orders().is_empty());
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn test_notifier_failure_is_swallowed() {
    let gateway = Arc::new(FakeGateway::new(None, OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    assert!(outcome.is_failed());
    assert_eq!(notifier.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_news_times_out() {
    let gateway = Arc::new(FakeGateway::new(Some(100.0), OutcomeCode::DONE));
    let mut slow = FakeNews::new(&["AAPL stock gain strongly"]);
    slow.delay = Duration::from_secs(120);
    let news = Arc::new(slow);
    let notifier = RecordingNotifier::default();

    let outcome = coordinator(&gateway, &news).run_and_notify(&notifier).await;

    let RunOutcome::Failed(failure) = outcome else {
        panic!("run should fail");
    };
    assert!(matches!(
        failure.error,
        BotError::Timeout {
            operation: "news_fetch",
            ..
        }
    ));
    assert_eq!(failure.failed_after, PipelineState::Initialized);
    assert_eq!(notifier.count(), 1);
}

struct AlwaysNegative;

impl SentimentScorer for AlwaysNegative {
    fn score(&self, _text: &str) -> Polarity {
        Polarity::Negative
    }

    fn name(&self) -> &str {
        "AlwaysNegative"
    }
}

#[tokio::test]
async fn test_scorer_is_pluggable() {
    let gateway = Arc::new(FakeGateway::new(Some(50.0), OutcomeCode::DONE));
    let news = Arc::new(FakeNews::new(&["AAPL stock gain strongly"]));

    let coordinator = coordinator(&gateway, &news).with_scorer(Box::new(AlwaysNegative));
    let report = assert_ok!(coordinator.run().await.map_err(|f| f.error));

    assert_eq!(report.decision, TradeDecision::Sell);
    assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Startup faults
// ============================================================================

fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_missing_account_is_reported_once() {
    let vars = env(&[
        ("PASSWORD", "secret"),
        ("SERVER", "Broker-Demo"),
        ("EMAIL_ADDRESS", "bot@example.com"),
        ("EMAIL_PASSWORD", "pw"),
        ("RECIPIENT_EMAIL", "ops@example.com"),
    ]);

    let alerts = AlertConfig::from_vars(vars.clone());
    assert!(alerts.email.is_some());

    let err = BotConfig::from_vars(vars).unwrap_err();
    let notifier = RecordingNotifier::default();
    report_startup_failure(&notifier, &err, Duration::from_secs(5)).await;

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ERROR_SUBJECT);
    assert!(sent[0].1.contains("ACCOUNT_NUMBER is required"));
    assert!(sent[0].1.contains("kind: config"));
}

#[tokio::test]
async fn test_startup_notify_failure_is_swallowed() {
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let err = BotError::Config("VOLUME must be positive, got 0".into());

    report_startup_failure(&notifier, &err, Duration::from_secs(5)).await;

    assert_eq!(notifier.count(), 1);
}
