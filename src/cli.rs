use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::browser::ChromeLauncher;
use crate::config::AppConfig;
use crate::core::{CycleRunner, RuleStore, StateStore};
use crate::fetcher::PageFetcher;
use crate::models::{PriceState, ProductRule};
use crate::plugins::NotificationDispatcher;
use crate::utils::error::AppError;
use crate::utils::format::format_price;
use crate::web::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "price-watcher")]
#[command(version, about = "Watches product pages and posts price drops to Slack/Discord", long_about = None)]
pub struct Cli {
    /// Configuration file, read after config/default
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every product once, then exit
    Run,
    /// Start the dashboard
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Inspect the product rules file
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
    /// Inspect or clean up the price state file
    State {
        #[command(subcommand)]
        action: StateCommand,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesCommand {
    /// Print every rule
    List,
    /// Check every rule's required fields and URL
    Validate,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    /// Print the last observed prices
    Show,
    /// Drop entries for products that no longer have a rule
    Prune,
}

pub fn rule_store(config: &AppConfig) -> RuleStore {
    RuleStore::new(&config.paths.products_file)
}

pub fn state_store(config: &AppConfig) -> StateStore {
    StateStore::new(&config.paths.state_file)
}

pub fn build_runner(config: &AppConfig) -> Result<CycleRunner<ChromeLauncher>, AppError> {
    Ok(CycleRunner::new(
        rule_store(config),
        state_store(config),
        PageFetcher::new(&config.scraper),
        NotificationDispatcher::from_config(&config.notifications)?,
        ChromeLauncher::new(config.scraper.clone()),
    ))
}

/// One cycle. Status lines go to stdout; everything else is logged.
pub async fn run_once(config: &AppConfig) -> Result<()> {
    let runner = build_runner(config)?;
    let report = runner.run_once().await?;
    for line in report.status_lines() {
        println!("{}", line);
    }
    Ok(())
}

pub async fn serve(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let runner = Arc::new(build_runner(config)?);
    let state = AppState::new(rule_store(config), state_store(config), runner);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!(address = %listener.local_addr()?, "Dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;
    Ok(())
}

pub fn rules(config: &AppConfig, action: RulesCommand) -> Result<()> {
    let rules = rule_store(config).load_rules()?;
    match action {
        RulesCommand::List => {
            for line in rule_lines(&rules) {
                println!("{}", line);
            }
            Ok(())
        }
        RulesCommand::Validate => {
            let invalid = validation_lines(&rules);
            if invalid.is_empty() {
                println!("✅ {} rule(s) valid", rules.len());
                return Ok(());
            }
            for line in &invalid {
                eprintln!("{}", line);
            }
            anyhow::bail!("{} rule(s) failed validation", invalid.len());
        }
    }
}

pub fn state(config: &AppConfig, action: StateCommand) -> Result<()> {
    let store = state_store(config);
    match action {
        StateCommand::Show => {
            for line in state_lines(&store.load_state()?) {
                println!("{}", line);
            }
        }
        StateCommand::Prune => {
            let rules = rule_store(config).load_rules()?;
            let removed = store.prune(&rules)?;
            if removed.is_empty() {
                println!("Nothing to prune");
            }
            for name in removed {
                println!("Removed {}", name);
            }
        }
    }
    Ok(())
}

pub fn rule_lines(rules: &[ProductRule]) -> Vec<String> {
    if rules.is_empty() {
        return vec!["No products configured".to_string()];
    }
    rules
        .iter()
        .map(|rule| match rule.target_price {
            Some(target) => format!(
                "{}  {}  [{}]  target {}",
                rule.name,
                rule.url,
                rule.selector,
                format_price(target)
            ),
            None => format!("{}  {}  [{}]", rule.name, rule.url, rule.selector),
        })
        .collect()
}

/// One line per invalid rule; empty when all are valid.
pub fn validation_lines(rules: &[ProductRule]) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| {
            rule.validate()
                .err()
                .map(|e| format!("❌ {}: {}", rule.name, e))
        })
        .collect()
}

pub fn state_lines(state: &PriceState) -> Vec<String> {
    if state.is_empty() {
        return vec!["No prices recorded yet".to_string()];
    }
    state
        .iter()
        .map(|(name, observation)| {
            let updated = observation
                .updated_at_local()
                .map(|t| t.format("%Y/%m/%d %H:%M").to_string())
                .unwrap_or_else(|| observation.updated_at.to_string());
            format!(
                "{}  {}  {}  {}",
                name,
                format_price(observation.last_price),
                updated,
                observation.url
            )
        })
        .collect()
}
