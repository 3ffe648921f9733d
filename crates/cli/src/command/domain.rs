use anyhow::Result;
use feats_catalog::{Facet, FacetIndex};
use feats_filter::{AdvancedFacet, Control, ControlChange, FilterState, Indicator};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::render::{Card, OptionsView};

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    /// Partial filter config merged over the resolved one
    #[serde(default)]
    pub config: Option<Value>,
    /// Catalog path overriding `--catalog` / `FEATS_CATALOG`
    #[serde(default)]
    pub catalog: Option<String>,
}

fn empty_payload() -> Value {
    Value::Object(Map::default())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Facets,
    Filter,
    Options,
    Panel,
}

impl CommandAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandAction::Facets => "facets",
            CommandAction::Filter => "filter",
            CommandAction::Options => "options",
            CommandAction::Panel => "panel",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: ResponseMeta,
}

impl CommandResponse {
    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }

    /// Error response for failures that happen before an action runs
    pub fn from_error(message: String, meta: ResponseMeta) -> Self {
        let classification = classify_error(&message);
        Self {
            status: CommandStatus::Error,
            error: Some(ErrorEnvelope {
                code: classification.code,
                message: message.clone(),
                hint: classification.hint,
            }),
            message: Some(message),
            hints: classification.hints,
            data: Value::Null,
            meta,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Hint {
    #[serde(rename = "type")]
    pub kind: HintKind,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Info,
    Action,
    Warn,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

pub struct CommandOutcome {
    pub data: Value,
    pub hints: Vec<Hint>,
}

impl CommandOutcome {
    pub fn from_value<T: Serialize>(value: T) -> Result<Self> {
        Ok(Self {
            data: serde_json::to_value(value)?,
            hints: Vec::new(),
        })
    }

    pub fn with_hint(mut self, kind: HintKind, text: impl Into<String>) -> Self {
        self.hints.push(Hint {
            kind,
            text: text.into(),
        });
        self
    }
}

pub fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|err| anyhow::anyhow!("Invalid payload: {err}"))
}

/// Deep-merge `overrides` into `base`; objects merge key by key, everything
/// else is replaced.
pub fn merge_json(base: &mut Value, overlay: &Value) {
    if let Value::Object(overlay_map) = overlay {
        if !base.is_object() {
            *base = Value::Object(Map::new());
        }
        if let Value::Object(base_map) = base {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        return;
    }
    *base = overlay.clone();
}

/// Selected values, shared by `filter`, `options` and `panel`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionPayload {
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub ancestry: Vec<String>,
    pub class: Vec<String>,
    pub tier: Vec<String>,
    pub parent: Vec<String>,
    pub feat: Vec<String>,
    pub spell_level: Vec<String>,
    pub feature_level: Vec<String>,
}

impl SelectionPayload {
    pub fn to_state(&self) -> FilterState {
        let mut state = FilterState::new();
        let primary = [
            (Facet::Type, &self.types),
            (Facet::Ancestry, &self.ancestry),
            (Facet::Class, &self.class),
            (Facet::Tier, &self.tier),
        ];
        for (facet, values) in primary {
            for value in values {
                state.primary.select(facet, value);
            }
        }
        let advanced = [
            (AdvancedFacet::ParentTrait, &self.parent),
            (AdvancedFacet::Record, &self.feat),
            (AdvancedFacet::SpellLevel, &self.spell_level),
            (AdvancedFacet::FeatureLevel, &self.feature_level),
        ];
        for (facet, values) in advanced {
            for value in values {
                state.advanced.select(facet, value);
            }
        }
        state
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FilterPayload {
    pub selection: SelectionPayload,
    /// Show only tier descriptions matching the Tier selection
    pub only_selected_tiers: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsPayload {
    pub selection: SelectionPayload,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PanelPayload {
    pub selection: SelectionPayload,
    /// Controls toggled in order after the panel opens
    pub toggles: Vec<Control>,
    /// Uncheck everything before applying toggles
    pub clear: bool,
    /// Commit into the advanced selection; otherwise the panel is discarded
    pub commit: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct FacetsOutput {
    pub records: usize,
    pub facets: FacetIndex,
}

#[derive(Debug, Serialize, Clone)]
pub struct FilterOutput {
    pub total: usize,
    pub primary_subset: usize,
    pub results: Vec<Card>,
    pub indicators: Vec<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PanelOutput {
    /// Invalidated controls, one list per toggle
    pub changes: Vec<Vec<ControlChange>>,
    pub committed: bool,
    pub options: OptionsView,
    pub filter: FilterOutput,
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub code: String,
    pub hint: Option<String>,
    pub hints: Vec<Hint>,
}

pub fn classify_error(message: &str) -> ErrorClassification {
    let mut hints = Vec::new();
    let mut code = "internal".to_string();
    let mut hint = None;

    if message.to_lowercase().contains("config") {
        code = "config_error".to_string();
        hints.push(Hint {
            kind: HintKind::Warn,
            text: "Config issue detected: check --config, FEATS_CONFIG or the request's config object."
                .to_string(),
        });
    }

    if message.contains("No data") || message.contains("Failed to load catalog") {
        code = "catalog_missing".to_string();
        hint = Some(
            "Catalog unavailable: pass --catalog, set FEATS_CATALOG, or set \"catalog\" in the request."
                .to_string(),
        );
    }

    if message.contains("must be a JSON array") || message.contains("Catalog parse error") {
        code = "catalog_invalid".to_string();
        hint = Some("The catalog must be a JSON array of feat records.".to_string());
    }

    if message.contains("Invalid payload") || message.contains("Unknown panel control") {
        code = "invalid_request".to_string();
        hint = Some("Check the payload field names and values for this action.".to_string());
    }

    if let Some(text) = &hint {
        hints.push(Hint {
            kind: HintKind::Action,
            text: text.clone(),
        });
    }

    ErrorClassification { code, hint, hints }
}
