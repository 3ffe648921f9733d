//! Active filter indicators: one removable chip per selected value.

use crate::state::FilterState;
use feats_catalog::{Catalog, Facet, RecordId};
use serde::{Deserialize, Serialize};

/// Identifies exactly one selected value in a [`FilterState`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorKey {
    Primary { facet: Facet, value: String },
    ParentTrait { value: String },
    Record { id: RecordId },
    SpellLevel { value: String },
    FeatureLevel { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub key: IndicatorKey,
    pub label: String,
}

/// Indicators for every selected value, primary facets first.
///
/// Record indicators show the record name when `catalog` knows the id and
/// fall back to the raw id otherwise.
#[must_use]
pub fn active_indicators(state: &FilterState, catalog: Option<&Catalog>) -> Vec<Indicator> {
    let mut indicators = Vec::new();

    for facet in Facet::ALL {
        for value in state.primary.values(facet) {
            indicators.push(Indicator {
                label: format!("{}: {value}", facet.as_str()),
                key: IndicatorKey::Primary {
                    facet,
                    value: value.clone(),
                },
            });
        }
    }

    let advanced = &state.advanced;
    for value in &advanced.parent_traits {
        indicators.push(Indicator {
            label: format!("Parent: {value}"),
            key: IndicatorKey::ParentTrait {
                value: value.clone(),
            },
        });
    }
    for id in &advanced.record_ids {
        let name = catalog
            .and_then(|c| c.get(id))
            .map_or_else(|| id.to_string(), |record| record.name.clone());
        indicators.push(Indicator {
            label: format!("Feat: {name}"),
            key: IndicatorKey::Record { id: id.clone() },
        });
    }
    for value in &advanced.spell_levels {
        indicators.push(Indicator {
            label: format!("Spell Lvl: {value}"),
            key: IndicatorKey::SpellLevel {
                value: value.clone(),
            },
        });
    }
    for value in &advanced.feature_levels {
        indicators.push(Indicator {
            label: format!("Req Lvl: {value}"),
            key: IndicatorKey::FeatureLevel {
                value: value.clone(),
            },
        });
    }

    indicators
}

impl FilterState {
    /// Remove the value behind one indicator. Returns whether anything changed.
    pub fn remove(&mut self, key: &IndicatorKey) -> bool {
        match key {
            IndicatorKey::Primary { facet, value } => self.primary.deselect(*facet, value),
            IndicatorKey::ParentTrait { value } => self.advanced.parent_traits.remove(value),
            IndicatorKey::Record { id } => self.advanced.record_ids.remove(id),
            IndicatorKey::SpellLevel { value } => self.advanced.spell_levels.remove(value),
            IndicatorKey::FeatureLevel { value } => self.advanced.feature_levels.remove(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AdvancedFacet;
    use feats_catalog::Record;
    use pretty_assertions::assert_eq;

    fn labels(indicators: &[Indicator]) -> Vec<&str> {
        indicators.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn one_indicator_per_selected_value() {
        let catalog = Catalog::new(vec![Record::new("12", "Cleave")]);
        let mut state = FilterState::new();
        state.primary.select(Facet::Class, "Fighter");
        state.primary.select(Facet::Tier, "Epic");
        state.primary.select(Facet::Type, "Class");
        state.advanced.select(AdvancedFacet::Record, "12");
        state.advanced.select(AdvancedFacet::Record, "99");
        state.advanced.select(AdvancedFacet::ParentTrait, "Songs");
        state.advanced.select(AdvancedFacet::SpellLevel, "3rd");
        state.advanced.select(AdvancedFacet::FeatureLevel, "5th");

        let indicators = active_indicators(&state, Some(&catalog));
        assert_eq!(
            labels(&indicators),
            vec![
                "Type: Class",
                "Tier: Epic",
                "Class: Fighter",
                "Parent: Songs",
                "Feat: Cleave",
                "Feat: 99",
                "Spell Lvl: 3rd",
                "Req Lvl: 5th",
            ]
        );
    }

    #[test]
    fn removing_an_indicator_touches_only_its_value() {
        let mut state = FilterState::new();
        state.primary.select(Facet::Ancestry, "Dwarf");
        state.primary.select(Facet::Ancestry, "Elf");
        state.advanced.select(AdvancedFacet::SpellLevel, "1st");

        let indicators = active_indicators(&state, None);
        let dwarf = indicators
            .iter()
            .find(|i| i.label == "Ancestry: Dwarf")
            .expect("dwarf indicator");
        assert!(state.remove(&dwarf.key));
        assert!(!state.remove(&dwarf.key));

        assert_eq!(
            labels(&active_indicators(&state, None)),
            vec!["Ancestry: Elf", "Spell Lvl: 1st"]
        );
    }

    #[test]
    fn empty_state_has_no_indicators() {
        assert!(active_indicators(&FilterState::new(), None).is_empty());
    }

    #[test]
    fn keys_serialize_with_kind_tag() {
        let key = IndicatorKey::Primary {
            facet: Facet::Tier,
            value: "Epic".to_string(),
        };
        let json = serde_json::to_value(&key).expect("json");
        assert_eq!(
            json,
            serde_json::json!({"kind": "primary", "facet": "Tier", "value": "Epic"})
        );
        let back: IndicatorKey = serde_json::from_value(json).expect("key");
        assert_eq!(back, key);
    }
}
