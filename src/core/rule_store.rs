use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::{ProductRule, RulesFile};
use crate::utils::error::AppError;

/// Reads and writes the product rules file (`{"products": [...]}`).
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The example file users copy to create their rules file:
    /// `products.json` → `products.example.json`.
    pub fn template_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "products".to_string());
        let file_name = match self.path.extension() {
            Some(ext) => format!("{}.example.{}", stem, ext.to_string_lossy()),
            None => format!("{}.example", stem),
        };
        self.path.with_file_name(file_name)
    }

    /// Loads every rule in file order.
    ///
    /// A missing file is [`AppError::MissingConfiguration`]. Duplicate names
    /// are rejected since state is keyed by name.
    pub fn load_rules(&self) -> Result<Vec<ProductRule>, AppError> {
        if !self.path.exists() {
            return Err(AppError::MissingConfiguration {
                path: self.path.display().to_string(),
                template: self.template_path().display().to_string(),
            });
        }

        let content = fs::read_to_string(&self.path)?;
        let file: RulesFile = serde_json::from_str(&content).map_err(|source| AppError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut seen = HashSet::new();
        for rule in &file.products {
            if !seen.insert(rule.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate product name '{}' in {}",
                    rule.name,
                    self.path.display()
                )));
            }
        }

        debug!(path = %self.path.display(), count = file.products.len(), "Loaded product rules");
        Ok(file.products)
    }

    /// Like [`load_rules`](Self::load_rules), but a missing file is an empty list.
    pub fn load_or_empty(&self) -> Result<Vec<ProductRule>, AppError> {
        match self.load_rules() {
            Err(AppError::MissingConfiguration { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    pub fn save_rules(&self, rules: &[ProductRule]) -> Result<(), AppError> {
        let file = RulesFile {
            products: rules.to_vec(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), count = rules.len(), "Saved product rules");
        Ok(())
    }

    /// Adds a rule, or replaces the one named `original_name` in place.
    ///
    /// Renaming onto another existing rule's name is rejected.
    pub fn upsert(&self, original_name: Option<&str>, rule: ProductRule) -> Result<(), AppError> {
        rule.validate()?;
        let mut rules = self.load_or_empty()?;

        let existing = original_name
            .filter(|name| !name.is_empty())
            .and_then(|name| rules.iter().position(|r| r.name == name));

        let collides = rules
            .iter()
            .enumerate()
            .any(|(i, r)| r.name == rule.name && Some(i) != existing);
        if collides {
            return Err(AppError::DuplicateName(rule.name));
        }

        match existing {
            Some(index) => {
                info!(product = %rule.name, "Updated product rule");
                rules[index] = rule;
            }
            None => {
                info!(product = %rule.name, "Added product rule");
                rules.push(rule);
            }
        }
        self.save_rules(&rules)
    }

    /// Removes the named rule. Returns whether anything was removed.
    ///
    /// The rule's state entry is left alone; see [`StateStore::prune`](super::StateStore::prune).
    pub fn remove(&self, name: &str) -> Result<bool, AppError> {
        let mut rules = self.load_or_empty()?;
        let before = rules.len();
        rules.retain(|r| r.name != name);
        if rules.len() == before {
            return Ok(false);
        }
        self.save_rules(&rules)?;
        info!(product = %name, "Removed product rule");
        Ok(true)
    }
}
