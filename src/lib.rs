pub mod browser;
pub mod cli;
pub mod config;
pub mod core;
pub mod fetcher;
pub mod models;
pub mod plugins;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use crate::core::{CycleReport, CycleRunner, CycleTrigger, RuleStore, StateStore};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
