use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for secondary panel grouping and level option sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Class-scoped partition
    pub class: PartitionConfig,

    /// Ancestry-scoped partition
    pub ancestry: PartitionConfig,

    /// Bucket name for records without a group
    pub other_group: String,

    /// Ordered spell/feature level labels offered in the panel
    pub levels: LevelsConfig,
}

/// One category-scoped partition of the secondary panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionConfig {
    /// Category value that places a record in this partition
    pub category: String,

    /// Groups listed first, in this order, when present
    #[serde(default)]
    pub group_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelsConfig {
    pub spell: Vec<String>,
    pub feature: Vec<String>,
}

fn odd_levels() -> Vec<String> {
    ["1st", "3rd", "5th", "7th", "9th"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            spell: odd_levels(),
            feature: odd_levels(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            class: PartitionConfig {
                category: "Class".to_string(),
                group_order: ["Feature", "Talent", "Multiclass", "Spell"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            ancestry: PartitionConfig {
                category: "Ancestry".to_string(),
                group_order: ["Racial Power", "Racial Feat", "Feat"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            other_group: "Other".to_string(),
            levels: LevelsConfig::default(),
        }
    }
}

impl FilterConfig {
    /// Parse a JSON or TOML document; JSON is tried first.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = match serde_json::from_slice(bytes) {
            Ok(config) => config,
            Err(json_err) => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|err| FilterError::ConfigParse(format!("{json_err}; {err}")))?;
                toml::from_str(text).map_err(|toml_err| {
                    FilterError::ConfigParse(format!(
                        "config is not valid JSON ({json_err}) or TOML: {toml_err}"
                    ))
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            FilterError::ConfigParse(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_slice(&bytes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.class.category.trim().is_empty() || self.ancestry.category.trim().is_empty() {
            return Err(FilterError::invalid_config(
                "partition categories must not be empty",
            ));
        }
        if self.class.category == self.ancestry.category {
            return Err(FilterError::invalid_config(format!(
                "class and ancestry partitions share category {:?}",
                self.class.category
            )));
        }
        if self.other_group.trim().is_empty() {
            return Err(FilterError::invalid_config("other_group must not be empty"));
        }

        validate_labels("class.group_order", &self.class.group_order)?;
        validate_labels("ancestry.group_order", &self.ancestry.group_order)?;
        validate_labels("levels.spell", &self.levels.spell)?;
        validate_labels("levels.feature", &self.levels.feature)?;
        Ok(())
    }
}

fn validate_labels(path: &str, labels: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(FilterError::invalid_config(format!(
                "{path} contains an empty label"
            )));
        }
        if !seen.insert(label.trim()) {
            return Err(FilterError::invalid_config(format!(
                "{path} lists {label:?} more than once"
            )));
        }
    }
    Ok(())
}
