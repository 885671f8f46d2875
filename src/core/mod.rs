pub mod change_evaluator;
pub mod orchestrator;
pub mod price_extractor;
pub mod rule_store;
pub mod state_store;

pub use orchestrator::{CycleReport, CycleRunner, CycleTrigger, RuleOutcome, RuleReport};
pub use price_extractor::extract_price;
pub use rule_store::RuleStore;
pub use state_store::StateStore;
