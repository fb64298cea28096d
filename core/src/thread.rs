//! Chat thread context
//! Holds the selected category and stamps it into outbound chat metadata.

use serde::{Deserialize, Serialize};

use crate::category::CategoryConfig;

/// Metadata attached to every outbound chat request as `forwardedProps.threadMetadata`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThreadMetadata {
    pub category: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown category '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct ThreadContext {
    config: CategoryConfig,
    selected: String,
}

impl ThreadContext {
    pub fn new(config: CategoryConfig) -> Self {
        let selected = config.default_category.clone();
        Self { config, selected }
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Switch category. Unknown values leave the selection untouched.
    pub fn select(&mut self, value: &str) -> Result<(), CategoryError> {
        if !self.config.contains(value) {
            return Err(CategoryError::Unknown(value.to_string()));
        }
        if self.selected != value {
            tracing::debug!("Category changed: {} -> {}", self.selected, value);
            self.selected = value.to_string();
        }
        Ok(())
    }

    /// Fresh metadata for the next outbound message
    pub fn metadata(&self) -> ChatThreadMetadata {
        ChatThreadMetadata {
            category: self.selected.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// `forwardedProps` payload as the agent runtime expects it
    pub fn forwarded_props(&self) -> serde_json::Value {
        serde_json::json!({ "threadMetadata": self.metadata() })
    }
}
