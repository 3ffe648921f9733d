use crate::error::{CatalogError, Result};
use crate::field::{text_atoms, MultiValue};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Stable record identifier. JSON integers and strings both normalize to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Self(text.trim().to_string())),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid record id {value}")))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Power tier of a feat entry. Ordering is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Adventurer,
    Champion,
    Epic,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Adventurer, Tier::Champion, Tier::Epic];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Adventurer => "Adventurer",
            Tier::Champion => "Champion",
            Tier::Epic => "Epic",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == trimmed)
            .ok_or_else(|| CatalogError::UnknownTier(trimmed.to_string()))
    }
}

/// One tier-specific description of a feat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierEntry {
    pub tier: Tier,
    pub description: String,
}

impl TierEntry {
    pub fn new(tier: Tier, description: impl Into<String>) -> Self {
        Self {
            tier,
            description: description.into(),
        }
    }

    /// Description with one surrounding double quote stripped from each end.
    #[must_use]
    pub fn display_description(&self) -> &str {
        let text = self.description.as_str();
        let text = text.strip_prefix('"').unwrap_or(text);
        let text = text.strip_suffix('"').unwrap_or(text);
        text.trim()
    }
}

/// A catalog member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,

    pub name: String,

    /// Closed-set category such as "General", "Ancestry" or "Class"
    pub category: String,

    #[serde(skip_serializing_if = "MultiValue::is_absent")]
    pub ancestry: MultiValue,

    #[serde(skip_serializing_if = "MultiValue::is_absent")]
    pub class: MultiValue,

    /// Sub-classification, meaningful together with `category`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Name of the parent cluster this record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_trait: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spell_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_level: Option<String>,

    /// Display-only tier label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_tier: Option<String>,

    /// Comma-joined display tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(rename = "feats")]
    pub tiers: Vec<TierEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    category: Value,
    #[serde(default)]
    ancestry: Value,
    #[serde(default)]
    class: Value,
    #[serde(default)]
    group: Value,
    #[serde(default)]
    parent_trait: Value,
    #[serde(default)]
    spell_level: Value,
    #[serde(default)]
    feature_level: Value,
    #[serde(default)]
    feature_tier: Value,
    #[serde(default)]
    tag: Value,
    #[serde(default)]
    feats: Value,
}

#[derive(Debug, Deserialize)]
struct RawTierEntry {
    #[serde(default)]
    tier: Value,
    #[serde(default)]
    description: Value,
}

impl Record {
    /// Create a record with only the required fields set
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            ancestry: MultiValue::Absent,
            class: MultiValue::Absent,
            group: None,
            parent_trait: None,
            spell_level: None,
            feature_level: None,
            feature_tier: None,
            tag: None,
            tiers: Vec::new(),
        }
    }

    /// Builder: set category
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: set ancestry field
    #[must_use]
    pub fn ancestry(mut self, ancestry: impl Into<MultiValue>) -> Self {
        self.ancestry = ancestry.into();
        self
    }

    /// Builder: set class field
    #[must_use]
    pub fn class(mut self, class: impl Into<MultiValue>) -> Self {
        self.class = class.into();
        self
    }

    /// Builder: set group
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Builder: set parent trait
    #[must_use]
    pub fn parent_trait(mut self, parent: impl Into<String>) -> Self {
        self.parent_trait = Some(parent.into());
        self
    }

    /// Builder: set spell level
    #[must_use]
    pub fn spell_level(mut self, level: impl Into<String>) -> Self {
        self.spell_level = Some(level.into());
        self
    }

    /// Builder: set feature level
    #[must_use]
    pub fn feature_level(mut self, level: impl Into<String>) -> Self {
        self.feature_level = Some(level.into());
        self
    }

    /// Builder: set feature tier label
    #[must_use]
    pub fn feature_tier(mut self, tier: impl Into<String>) -> Self {
        self.feature_tier = Some(tier.into());
        self
    }

    /// Builder: set tags
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builder: append a tier entry
    #[must_use]
    pub fn tier(mut self, tier: Tier, description: impl Into<String>) -> Self {
        self.tiers.push(TierEntry::new(tier, description));
        self
    }

    /// Decode one catalog element. Malformed optional fields are dropped with a
    /// warning; only a missing id or a non-object element is an error.
    pub fn from_value(index: usize, value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CatalogError::invalid_record(index, "not a JSON object"));
        }
        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|err| CatalogError::invalid_record(index, err.to_string()))?;

        let id = RecordId::from_value(&raw.id)
            .ok_or_else(|| CatalogError::invalid_record(index, "missing or empty id"))?;
        let name = label(raw.name, &id, "name").unwrap_or_default();
        let category = label(raw.category, &id, "category").unwrap_or_default();

        let ancestry = multi_value(raw.ancestry, &id, "ancestry");
        let class = multi_value(raw.class, &id, "class");

        Ok(Self {
            name,
            category,
            ancestry,
            class,
            group: label(raw.group, &id, "group"),
            parent_trait: label(raw.parent_trait, &id, "parentTrait"),
            spell_level: label(raw.spell_level, &id, "spellLevel"),
            feature_level: label(raw.feature_level, &id, "featureLevel"),
            feature_tier: label(raw.feature_tier, &id, "featureTier"),
            tag: label(raw.tag, &id, "tag"),
            tiers: tier_entries(raw.feats, &id),
            id,
        })
    }

    /// Category comparison used by the Type facet
    #[must_use]
    pub fn category_is(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        !wanted.is_empty() && self.category.trim() == wanted
    }

    /// Atomic category values (comma-joined categories decompose like any
    /// other multi-value field)
    #[must_use]
    pub fn category_atoms(&self) -> Vec<&str> {
        text_atoms(&self.category)
    }

    /// Whether any tier entry carries one of `selected` tier names
    #[must_use]
    pub fn has_any_tier<'a, I>(&self, selected: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: Clone,
    {
        let selected = selected.into_iter();
        self.tiers.iter().any(|entry| {
            selected
                .clone()
                .any(|wanted| entry.tier.as_str() == wanted.trim())
        })
    }

    /// Tier entries in canonical order (stable for equal tiers)
    #[must_use]
    pub fn tiers_canonical(&self) -> Vec<&TierEntry> {
        let mut entries: Vec<&TierEntry> = self.tiers.iter().collect();
        entries.sort_by_key(|entry| entry.tier);
        entries
    }

    /// Display tags, trimmed, empties dropped
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.tag
            .as_deref()
            .map(|tag| {
                tag.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn label(value: Value, id: &RecordId, field: &str) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        other => {
            log::warn!("record {id}: ignoring malformed {field} value {other}");
            None
        }
    }
}

fn multi_value(value: Value, id: &RecordId, field: &str) -> MultiValue {
    let decoded = MultiValue::from(value);
    if let MultiValue::Malformed(raw) = &decoded {
        log::warn!("record {id}: {field} has unexpected shape {raw}; it will never match");
    }
    decoded
}

fn tier_entries(value: Value, id: &RecordId) -> Vec<TierEntry> {
    let items = match value {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        other => {
            log::warn!("record {id}: ignoring malformed feats value {other}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let raw: RawTierEntry = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(err) => {
                    log::warn!("record {id}: skipping tier entry: {err}");
                    return None;
                }
            };
            let tier = match raw.tier.as_str().map(Tier::from_str) {
                Some(Ok(tier)) => tier,
                _ => {
                    log::warn!("record {id}: skipping tier entry with tier {}", raw.tier);
                    return None;
                }
            };
            let description = match raw.description {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Some(TierEntry { tier, description })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_full_record() {
        let value = json!({
            "id": 7,
            "name": "Cleave",
            "category": "Class",
            "class": "Fighter, Barbarian",
            "group": "Talent",
            "parentTrait": "Heavy Warrior",
            "featureLevel": "3rd",
            "featureTier": "Champion",
            "tag": "melee, attack",
            "feats": [
                {"tier": "Epic", "description": "\"Big.\""},
                {"tier": "Adventurer", "description": "Small."}
            ]
        });
        let record = Record::from_value(0, value).expect("record");
        assert_eq!(record.id, RecordId::new("7"));
        assert_eq!(record.class, MultiValue::text("Fighter, Barbarian"));
        assert_eq!(record.parent_trait.as_deref(), Some("Heavy Warrior"));
        assert_eq!(record.tags(), vec!["melee", "attack"]);

        let ordered: Vec<Tier> = record.tiers_canonical().iter().map(|e| e.tier).collect();
        assert_eq!(ordered, vec![Tier::Adventurer, Tier::Epic]);
        assert_eq!(record.tiers[0].display_description(), "Big.");
    }

    #[test]
    fn missing_id_is_invalid() {
        let err = Record::from_value(3, json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRecord { index: 3, .. }));
        assert!(Record::from_value(0, json!("nope")).is_err());
    }

    #[test]
    fn malformed_fields_degrade_to_no_match() {
        let record = Record::from_value(
            0,
            json!({
                "id": "a",
                "ancestry": {"oops": true},
                "parentTrait": ["x"],
                "feats": [{"tier": "Legendary"}, {"tier": "Champion", "description": "ok"}]
            }),
        )
        .expect("record");
        assert!(record.ancestry.is_malformed());
        assert!(record.parent_trait.is_none());
        assert_eq!(record.tiers.len(), 1);
        assert_eq!(record.tiers[0].tier, Tier::Champion);
    }

    #[test]
    fn blank_labels_normalize_to_none() {
        let record =
            Record::from_value(0, json!({"id": "b", "group": "  ", "spellLevel": " 5th "}))
                .expect("record");
        assert_eq!(record.group, None);
        assert_eq!(record.spell_level.as_deref(), Some("5th"));
    }

    #[test]
    fn tier_selection_matches_any_entry() {
        let record = Record::new("1", "x")
            .tier(Tier::Adventurer, "a")
            .tier(Tier::Epic, "e");
        assert!(record.has_any_tier(["Epic"]));
        assert!(record.has_any_tier(["Champion", "Adventurer"]));
        assert!(!record.has_any_tier(["Champion"]));
        assert!(!Record::new("2", "y").has_any_tier(["Epic"]));
    }

    #[test]
    fn record_ids_accept_numbers_and_strings() {
        let ids: Vec<RecordId> = serde_json::from_value(json!([12, " a7 "])).expect("ids");
        assert_eq!(ids, vec![RecordId::from(12), RecordId::new("a7")]);
        assert!(serde_json::from_value::<RecordId>(json!(null)).is_err());
    }

    #[test]
    fn tier_names_match_exactly() {
        assert_eq!(" Epic".parse::<Tier>().unwrap(), Tier::Epic);
        assert!("epic".parse::<Tier>().is_err());
        assert!("mythic".parse::<Tier>().is_err());

        let record = Record::from_value(
            0,
            json!({"id": "t", "feats": [
                {"tier": "epic", "description": "skipped"},
                {"tier": "Epic", "description": "kept"}
            ]}),
        )
        .expect("record");
        assert_eq!(record.tiers.len(), 1);
        assert_eq!(record.tiers[0].description, "kept");
    }
}
