use feats_catalog::{Facet, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User choices in the Type/Ancestry/Class/Tier facets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimarySelection {
    pub types: BTreeSet<String>,
    pub ancestries: BTreeSet<String>,
    pub classes: BTreeSet<String>,
    pub tiers: BTreeSet<String>,
}

impl PrimarySelection {
    #[must_use]
    pub fn values(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Type => &self.types,
            Facet::Ancestry => &self.ancestries,
            Facet::Class => &self.classes,
            Facet::Tier => &self.tiers,
        }
    }

    fn values_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::Type => &mut self.types,
            Facet::Ancestry => &mut self.ancestries,
            Facet::Class => &mut self.classes,
            Facet::Tier => &mut self.tiers,
        }
    }

    /// Add a value; blank values are ignored. Returns whether the set changed.
    pub fn select(&mut self, facet: Facet, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.values_mut(facet).insert(value.to_string())
    }

    /// Remove a value. Returns whether the set changed.
    pub fn deselect(&mut self, facet: Facet, value: &str) -> bool {
        self.values_mut(facet).remove(value.trim())
    }

    /// Flip a value and return its new selected state
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        if self.deselect(facet, value) {
            false
        } else {
            self.select(facet, value)
        }
    }

    /// Whether any facet taking part in the union stage has a selection
    #[must_use]
    pub fn has_union_selection(&self) -> bool {
        !(self.types.is_empty() && self.ancestries.is_empty() && self.classes.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_union_selection() && self.tiers.is_empty()
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.ancestries.clear();
        self.classes.clear();
        self.tiers.clear();
    }
}

/// Secondary panel criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedFacet {
    ParentTrait,
    Record,
    SpellLevel,
    FeatureLevel,
}

/// Committed secondary (advanced) selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSelection {
    pub parent_traits: BTreeSet<String>,
    pub record_ids: BTreeSet<RecordId>,
    pub spell_levels: BTreeSet<String>,
    pub feature_levels: BTreeSet<String>,
}

impl AdvancedSelection {
    /// Add a criterion; blank values are ignored. Returns whether the selection changed.
    pub fn select(&mut self, facet: AdvancedFacet, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        match facet {
            AdvancedFacet::ParentTrait => self.parent_traits.insert(value.to_string()),
            AdvancedFacet::Record => self.record_ids.insert(RecordId::new(value)),
            AdvancedFacet::SpellLevel => self.spell_levels.insert(value.to_string()),
            AdvancedFacet::FeatureLevel => self.feature_levels.insert(value.to_string()),
        }
    }

    /// Remove a criterion. Returns whether the selection changed.
    pub fn deselect(&mut self, facet: AdvancedFacet, value: &str) -> bool {
        let value = value.trim();
        match facet {
            AdvancedFacet::ParentTrait => self.parent_traits.remove(value),
            AdvancedFacet::Record => self.record_ids.remove(&RecordId::new(value)),
            AdvancedFacet::SpellLevel => self.spell_levels.remove(value),
            AdvancedFacet::FeatureLevel => self.feature_levels.remove(value),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent_traits.is_empty()
            && self.record_ids.is_empty()
            && self.spell_levels.is_empty()
            && self.feature_levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.parent_traits.clear();
        self.record_ids.clear();
        self.spell_levels.clear();
        self.feature_levels.clear();
    }
}

/// The single live selection of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub primary: PrimarySelection,
    pub advanced: AdvancedSelection,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear primary and advanced selections
    pub fn reset(&mut self) {
        self.primary.clear();
        self.advanced.clear();
    }

    /// Clear only the advanced selection
    pub fn clear_advanced(&mut self) {
        self.advanced.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.advanced.is_empty()
    }
}
