use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task;
use tracing::{error, info, warn};

use super::change_evaluator;
use super::rule_store::RuleStore;
use super::state_store::StateStore;
use crate::browser::{BrowserLauncher, BrowserSession};
use crate::fetcher::PageFetcher;
use crate::models::{PriceObservation, PriceState, ProductRule};
use crate::plugins::NotificationDispatcher;
use crate::utils::error::AppError;
use crate::utils::format::format_price;

#[derive(Debug)]
pub enum RuleOutcome {
    /// The price was read and saved. `notified` is true when a message was
    /// produced, whether or not a channel accepted it.
    Updated { price: f64, notified: bool },
    /// The rule was skipped for this cycle and its state left as it was.
    Failed(AppError),
}

#[derive(Debug)]
pub struct RuleReport {
    pub rule: String,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub rules: Vec<RuleReport>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Updated { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.rules.len() - self.succeeded()
    }

    pub fn notified(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Updated { notified: true, .. }))
            .count()
    }

    /// One human-readable line per rule, in rule order.
    pub fn status_lines(&self) -> Vec<String> {
        if self.rules.is_empty() {
            return vec!["No products configured; nothing to check.".to_string()];
        }

        self.rules
            .iter()
            .map(|report| match &report.outcome {
                RuleOutcome::Updated { price, .. } => {
                    format!("[OK] {}: {}", report.rule, format_price(*price))
                }
                RuleOutcome::Failed(e) => format!("[ERROR] {}: {}", report.rule, e),
            })
            .collect()
    }
}

/// Something that can run one watch cycle on request.
#[async_trait]
pub trait CycleTrigger: Send + Sync {
    async fn run_cycle(&self) -> Result<CycleReport, AppError>;
}

/// Runs one watch cycle: load, fetch every rule in one browser session,
/// notify, save.
pub struct CycleRunner<L: BrowserLauncher> {
    rules: RuleStore,
    state: StateStore,
    fetcher: PageFetcher,
    dispatcher: Arc<NotificationDispatcher>,
    launcher: Arc<L>,
}

impl<L: BrowserLauncher + 'static> CycleRunner<L> {
    pub fn new(
        rules: RuleStore,
        state: StateStore,
        fetcher: PageFetcher,
        dispatcher: NotificationDispatcher,
        launcher: L,
    ) -> Self {
        Self {
            rules,
            state,
            fetcher,
            dispatcher: Arc::new(dispatcher),
            launcher: Arc::new(launcher),
        }
    }

    /// Fatal errors (unreadable rules or state, browser launch) return early
    /// and leave the state file untouched. Per-rule errors end up in the report.
    ///
    /// The browser session lives on the blocking pool; webhook calls are
    /// driven from there through the runtime handle.
    pub async fn run_once(&self) -> Result<CycleReport, AppError> {
        let rules = self.rules.load_rules()?;
        let state = self.state.load_state()?;

        if rules.is_empty() {
            warn!(path = %self.rules.path().display(), "No products configured");
            return Ok(CycleReport::default());
        }

        info!(products = rules.len(), "Starting watch cycle");
        let checker = RuleChecker {
            fetcher: self.fetcher.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            runtime: Handle::current(),
        };
        let launcher = Arc::clone(&self.launcher);

        let (report, state) = task::spawn_blocking(move || checker.check_all(&*launcher, &rules, state))
            .await
            .map_err(|e| AppError::Browser(format!("Watch cycle task failed: {}", e)))??;

        self.state.save_state(&state)?;
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            notified = report.notified(),
            "Watch cycle finished"
        );
        Ok(report)
    }
}

/// The per-rule half of a cycle, moved onto a blocking thread.
struct RuleChecker {
    fetcher: PageFetcher,
    dispatcher: Arc<NotificationDispatcher>,
    runtime: Handle,
}

impl RuleChecker {
    fn check_all<L: BrowserLauncher>(
        &self,
        launcher: &L,
        rules: &[ProductRule],
        mut state: PriceState,
    ) -> Result<(CycleReport, PriceState), AppError> {
        let session = launcher.launch()?;
        let mut report = CycleReport::default();
        for rule in rules {
            let outcome = self.check_rule(rule, &session, &mut state);
            report.rules.push(RuleReport {
                rule: rule.name.clone(),
                outcome,
            });
        }
        drop(session);
        Ok((report, state))
    }

    fn check_rule(
        &self,
        rule: &ProductRule,
        session: &dyn BrowserSession,
        state: &mut PriceState,
    ) -> RuleOutcome {
        let price = match self.fetcher.fetch_price(rule, session) {
            Ok(price) => price,
            Err(e) => {
                error!(product = %rule.name, error = %e, "Price check failed");
                return RuleOutcome::Failed(e);
            }
        };

        let previous = state.get(&rule.name).map(|o| o.last_price);
        let message = match change_evaluator::evaluate(rule, previous, price) {
            Ok(message) => message,
            Err(e) => {
                error!(product = %rule.name, error = %e, "Could not build notification");
                return RuleOutcome::Failed(e);
            }
        };

        let notified = match message {
            Some(message) => {
                let delivery = self.runtime.block_on(self.dispatcher.dispatch(&message));
                if delivery.attempted() > 0 && !delivery.any_delivered() {
                    warn!(product = %rule.name, "No channel accepted the notification");
                }
                true
            }
            None => false,
        };

        info!(product = %rule.name, price, previous = ?previous, notified, "Price checked");
        state.insert(
            rule.name.clone(),
            PriceObservation::observed_now(price, rule.url.clone()),
        );
        RuleOutcome::Updated { price, notified }
    }
}

#[async_trait]
impl<L> CycleTrigger for CycleRunner<L>
where
    L: BrowserLauncher + 'static,
{
    async fn run_cycle(&self) -> Result<CycleReport, AppError> {
        self.run_once().await
    }
}
