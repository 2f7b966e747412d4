//! Article category taxonomy kept in local storage

use crate::error::{Result, SdkError};
use crate::local::LocalStorage;
use std::sync::Arc;

/// Local storage key holding the JSON list of labels
pub const CATEGORIES_KEY: &str = "1aix_categories";

/// Labels offered when nothing has been saved yet
pub const DEFAULT_CATEGORIES: &[&str] = &["Berita", "Review", "Tips", "Rumor", "Perbandingan"];

/// Editable list of article category labels
pub struct CategoryStore {
    storage: Arc<dyn LocalStorage>,
    labels: Vec<String>,
}

impl CategoryStore {
    /// Load the saved labels, falling back to the defaults
    pub fn load(storage: Arc<dyn LocalStorage>) -> Result<Self> {
        let labels = match storage.get(CATEGORIES_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unreadable category list, using defaults");
                defaults()
            }),
            None => defaults(),
        };
        Ok(Self { storage, labels })
    }

    pub fn list(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Add a label; returns `false` if an equal label (ignoring case) exists
    pub fn add(&mut self, label: &str) -> Result<bool> {
        let label = normalize(label)?;
        if self.contains(&label) {
            return Ok(false);
        }
        self.labels.push(label);
        self.persist()?;
        Ok(true)
    }

    /// Remove a label; returns `false` if it was not present
    pub fn remove(&mut self, label: &str) -> Result<bool> {
        let Some(index) = self.position(label) else {
            return Ok(false);
        };
        self.labels.remove(index);
        self.persist()?;
        Ok(true)
    }

    /// Rename in place, keeping the label's position
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let new = normalize(new)?;
        let index = self
            .position(old)
            .ok_or_else(|| SdkError::NotFound(format!("category {}", old.trim())))?;
        if let Some(existing) = self.position(&new) {
            if existing != index {
                return Err(SdkError::Validation(format!("category {} already exists", new)));
            }
        }
        self.labels[index] = new;
        self.persist()
    }

    fn position(&self, label: &str) -> Option<usize> {
        let needle = label.trim().to_lowercase();
        self.labels.iter().position(|l| l.to_lowercase() == needle)
    }

    fn persist(&self) -> Result<()> {
        self.storage.set(CATEGORIES_KEY, &serde_json::to_string(&self.labels)?)
    }
}

fn defaults() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn normalize(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(SdkError::Validation("category label is empty".to_string()));
    }
    Ok(label.to_string())
}
