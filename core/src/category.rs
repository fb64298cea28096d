//! Category resolution
//! Turns the raw category settings into a validated list plus a default that is always a member of it.

use serde::{Deserialize, Serialize};

use crate::config::CategoriesConfig;

pub const FALLBACK_DEFAULT_CATEGORY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CategoryEntry")]
pub struct Category {
    pub value: String,
    pub label: String,
}

/// Configured form; the label may be left out and then reads as the value
#[derive(Deserialize)]
struct CategoryEntry {
    value: String,
    #[serde(default)]
    label: Option<String>,
}

impl From<CategoryEntry> for Category {
    fn from(entry: CategoryEntry) -> Self {
        let label = entry
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| entry.value.clone());
        Self { value: entry.value, label }
    }
}

impl Category {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub categories: Vec<Category>,
    pub default_category: String,
}

impl CategoryConfig {
    pub fn contains(&self, value: &str) -> bool {
        self.categories.iter().any(|c| c.value == value)
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.label.as_str())
    }
}

/// Why the configured categories were (partly) replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryWarning {
    InvalidJson(String),
    NotAList,
    MalformedEntry { index: usize, reason: String },
    EmptyList,
    DefaultNotFound { declared: String, substituted: String },
}

impl std::fmt::Display for CategoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "category options are not valid JSON ({}); using fallback categories", e),
            Self::NotAList => write!(f, "category options are not a JSON list; using fallback categories"),
            Self::MalformedEntry { index, reason } => write!(
                f,
                "category option #{} is malformed ({}); using fallback categories",
                index, reason
            ),
            Self::EmptyList => write!(f, "category options are empty; using fallback categories"),
            Self::DefaultNotFound { declared, substituted } => write!(
                f,
                "default category '{}' is not among the configured categories; using '{}'",
                declared, substituted
            ),
        }
    }
}

pub fn fallback_categories() -> Vec<Category> {
    vec![Category::new(FALLBACK_DEFAULT_CATEGORY, "All Categories")]
}

/// Resolve the category configuration. Never fails: every problem degrades to a
/// fallback and is logged as a warning.
pub fn get_category_config(raw_options: Option<&str>, declared_default: Option<&str>) -> CategoryConfig {
    let (config, warnings) = resolve_category_config(raw_options, declared_default);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    config
}

/// Convenience wrapper over the `[categories]` config section
pub fn from_settings(settings: &CategoriesConfig) -> CategoryConfig {
    get_category_config(settings.options.as_deref(), settings.default.as_deref())
}

/// Pure resolution step, returning the warnings instead of logging them
pub fn resolve_category_config(
    raw_options: Option<&str>,
    declared_default: Option<&str>,
) -> (CategoryConfig, Vec<CategoryWarning>) {
    let mut warnings = Vec::new();

    let categories = match raw_options.map(str::trim).filter(|s| !s.is_empty()) {
        None => fallback_categories(),
        Some(raw) => match parse_options(raw) {
            Ok(list) if list.is_empty() => {
                warnings.push(CategoryWarning::EmptyList);
                fallback_categories()
            }
            Ok(list) => list,
            Err(warning) => {
                warnings.push(warning);
                fallback_categories()
            }
        },
    };

    let declared = declared_default
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_DEFAULT_CATEGORY);

    let default_category = if categories.iter().any(|c| c.value == declared) {
        declared.to_string()
    } else {
        // categories is never empty here
        let substituted = categories
            .first()
            .map(|c| c.value.clone())
            .unwrap_or_else(|| FALLBACK_DEFAULT_CATEGORY.to_string());
        warnings.push(CategoryWarning::DefaultNotFound {
            declared: declared.to_string(),
            substituted: substituted.clone(),
        });
        substituted
    };

    (
        CategoryConfig {
            categories,
            default_category,
        },
        warnings,
    )
}

fn parse_options(raw: &str) -> Result<Vec<Category>, CategoryWarning> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| CategoryWarning::InvalidJson(e.to_string()))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(CategoryWarning::NotAList);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<Category>(entry).map_err(|e| CategoryWarning::MalformedEntry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
