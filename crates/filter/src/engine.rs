//! Filter composition.
//!
//! Three reductions run in sequence, each over the previous output:
//!
//! ```text
//! catalog ──> primary (OR across Type/Ancestry/Class) ──> tier (AND) ──> advanced (OR) ──> results
//!                    │
//!                    └──> primary subset (scope for secondary panel options)
//! ```

use crate::state::{AdvancedSelection, FilterState, PrimarySelection};
use feats_catalog::{Catalog, Facet, Record};
use std::collections::BTreeSet;

/// Output of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<'c> {
    /// Stage 1 output, independent of tier and advanced criteria
    pub primary_subset: Vec<&'c Record>,
    /// Final result set in catalog order
    pub results: Vec<&'c Record>,
}

impl FilterOutcome<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Stage 1 predicate: any selected Type, Ancestry or Class value matches.
/// With no union selection every record passes.
#[must_use]
pub fn passes_primary(record: &Record, selection: &PrimarySelection) -> bool {
    if !selection.has_union_selection() {
        return true;
    }
    [Facet::Type, Facet::Ancestry, Facet::Class]
        .into_iter()
        .any(|facet| {
            selection
                .values(facet)
                .iter()
                .any(|wanted| facet.matches(record, wanted))
        })
}

/// Stage 2 predicate: some tier entry is in `tiers`, or no tier is selected.
#[must_use]
pub fn passes_tier(record: &Record, tiers: &BTreeSet<String>) -> bool {
    tiers.is_empty() || record.has_any_tier(tiers.iter().map(String::as_str))
}

/// Stage 3 predicate: any committed advanced criterion matches, or none is set.
#[must_use]
pub fn passes_advanced(record: &Record, advanced: &AdvancedSelection) -> bool {
    if advanced.is_empty() {
        return true;
    }
    if advanced.record_ids.contains(&record.id) {
        return true;
    }
    let label_in = |label: &Option<String>, set: &BTreeSet<String>| {
        label.as_ref().is_some_and(|value| set.contains(value))
    };
    label_in(&record.parent_trait, &advanced.parent_traits)
        || label_in(&record.spell_level, &advanced.spell_levels)
        || label_in(&record.feature_level, &advanced.feature_levels)
}

pub fn primary_stage<'c, I>(records: I, selection: &PrimarySelection) -> Vec<&'c Record>
where
    I: IntoIterator<Item = &'c Record>,
{
    records
        .into_iter()
        .filter(|record| passes_primary(record, selection))
        .collect()
}

#[must_use]
pub fn tier_stage<'c>(candidates: &[&'c Record], tiers: &BTreeSet<String>) -> Vec<&'c Record> {
    if tiers.is_empty() {
        return candidates.to_vec();
    }
    candidates
        .iter()
        .copied()
        .filter(|record| passes_tier(record, tiers))
        .collect()
}

#[must_use]
pub fn advanced_stage<'c>(
    candidates: &[&'c Record],
    advanced: &AdvancedSelection,
) -> Vec<&'c Record> {
    if advanced.is_empty() {
        return candidates.to_vec();
    }
    candidates
        .iter()
        .copied()
        .filter(|record| passes_advanced(record, advanced))
        .collect()
}

/// Run all three stages over `catalog`
#[must_use]
pub fn compute<'c>(catalog: &'c Catalog, state: &FilterState) -> FilterOutcome<'c> {
    let primary_subset = primary_stage(catalog, &state.primary);
    let after_tier = tier_stage(&primary_subset, &state.primary.tiers);
    let results = advanced_stage(&after_tier, &state.advanced);

    log::debug!(
        "filter stages: catalog={} primary={} tier={} advanced={}",
        catalog.len(),
        primary_subset.len(),
        after_tier.len(),
        results.len()
    );

    FilterOutcome {
        primary_subset,
        results,
    }
}

/// Final result set only
#[must_use]
pub fn compute_result_set<'c>(catalog: &'c Catalog, state: &FilterState) -> Vec<&'c Record> {
    compute(catalog, state).results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AdvancedFacet;
    use feats_catalog::{MultiValue, RecordId, Tier};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Record::new("1", "Cleave")
                .category("Class")
                .class("Fighter")
                .group("Talent")
                .tier(Tier::Epic, "X"),
            Record::new("2", "Stone Skin")
                .category("Ancestry")
                .ancestry("Dwarf")
                .tier(Tier::Adventurer, "Y"),
            Record::new("3", "Toughness")
                .category("General")
                .tier(Tier::Adventurer, "a")
                .tier(Tier::Champion, "c"),
            Record::new("4", "Fireball")
                .category("Class")
                .class(MultiValue::list(["Wizard", "Sorcerer"]))
                .group("Spell")
                .spell_level("3rd")
                .tier(Tier::Champion, "boom"),
            Record::new("5", "Song of Valor")
                .category("Class")
                .class("Bard, Skald")
                .parent_trait("Battle Songs"),
            Record::new("6", "Song of Rest")
                .category("Class")
                .class("Bard")
                .parent_trait("Battle Songs")
                .feature_level("5th"),
        ])
    }

    #[test]
    fn empty_state_returns_catalog_in_order() {
        let catalog = catalog();
        let outcome = compute(&catalog, &FilterState::new());
        assert_eq!(ids(&outcome.results), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(outcome.primary_subset.len(), 6);
    }

    #[test]
    fn primary_stage_is_a_union_across_facets() {
        let catalog = catalog();
        let mut state = FilterState::new();
        state.primary.select(Facet::Class, "Fighter");
        state.primary.select(Facet::Ancestry, "Dwarf");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["1", "2"]);

        state.primary.select(Facet::Type, "General");
        state.primary.select(Facet::Class, "Skald");
        assert_eq!(
            ids(&compute_result_set(&catalog, &state)),
            vec!["1", "2", "3", "5"]
        );
    }

    #[test]
    fn tier_stage_narrows_and_drops_tierless_records() {
        let catalog = catalog();
        let mut state = FilterState::new();
        state.primary.select(Facet::Tier, "Champion");
        let outcome = compute(&catalog, &state);
        assert_eq!(ids(&outcome.results), vec!["3", "4"]);
        assert_eq!(outcome.primary_subset.len(), 6);
    }

    #[test]
    fn advanced_stage_is_a_union_of_criteria() {
        let catalog = catalog();
        let mut state = FilterState::new();
        state.advanced.select(AdvancedFacet::Record, "1");
        state.advanced.select(AdvancedFacet::SpellLevel, "3rd");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["1", "4"]);

        state.advanced.clear();
        state.advanced.select(AdvancedFacet::ParentTrait, "Battle Songs");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["5", "6"]);

        state.advanced.clear();
        state.advanced.select(AdvancedFacet::FeatureLevel, "5th");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["6"]);
    }

    #[test]
    fn advanced_stage_refines_prior_stages() {
        let catalog = catalog();
        let mut state = FilterState::new();
        state.primary.select(Facet::Class, "Bard");
        state.advanced.select(AdvancedFacet::Record, "1");
        assert!(compute_result_set(&catalog, &state).is_empty());

        state.advanced.select(AdvancedFacet::Record, "6");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["6"]);
    }

    #[test]
    fn single_record_id_passes_advanced_stage() {
        let catalog = catalog();
        let mut advanced = AdvancedSelection::default();
        advanced.record_ids.insert(RecordId::new("3"));
        let all: Vec<&Record> = catalog.iter().collect();
        assert_eq!(ids(&advanced_stage(&all, &advanced)), vec!["3"]);
    }

    #[test]
    fn selecting_unknown_value_yields_fewer_results_not_an_error() {
        let catalog = catalog();
        let mut state = FilterState::new();
        state.primary.select(Facet::Class, "Necromancer");
        let outcome = compute(&catalog, &state);
        assert!(outcome.is_empty());
        assert!(outcome.primary_subset.is_empty());
    }

    #[test]
    fn empty_catalog_yields_empty_result() {
        let catalog = Catalog::default();
        let mut state = FilterState::new();
        state.primary.select(Facet::Tier, "Epic");
        assert!(compute(&catalog, &state).is_empty());
    }

    #[test]
    fn fighter_epic_scenario() {
        let catalog = Catalog::new(vec![
            Record::new("1", "A")
                .category("Class")
                .class("Fighter")
                .tier(Tier::Epic, "X"),
            Record::new("2", "B")
                .category("Ancestry")
                .ancestry("Dwarf")
                .tier(Tier::Adventurer, "Y"),
        ]);
        let mut state = FilterState::new();
        state.primary.select(Facet::Class, "Fighter");
        state.primary.select(Facet::Tier, "Epic");
        assert_eq!(ids(&compute_result_set(&catalog, &state)), vec!["1"]);

        state.primary.select(Facet::Ancestry, "Dwarf");
        let outcome = compute(&catalog, &state);
        // Record 2 joins the primary subset but fails the Tier stage.
        assert_eq!(ids(&outcome.primary_subset), vec!["1", "2"]);
        assert_eq!(ids(&outcome.results), vec!["1"]);
    }

    fn facet_strategy() -> impl Strategy<Value = Facet> {
        prop_oneof![Just(Facet::Type), Just(Facet::Ancestry), Just(Facet::Class)]
    }

    fn value_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Class"),
            Just("Ancestry"),
            Just("General"),
            Just("Fighter"),
            Just("Dwarf"),
            Just("Bard"),
            Just("Wizard"),
            Just("Skald"),
            Just("Nobody"),
        ]
        .prop_map(str::to_string)
    }

    proptest! {
        #[test]
        fn proptest_primary_stage_only_grows(
            picks in proptest::collection::vec((facet_strategy(), value_strategy()), 0..6),
            extra in (facet_strategy(), value_strategy()),
        ) {
            let catalog = catalog();
            let mut selection = PrimarySelection::default();
            for (facet, value) in &picks {
                selection.select(*facet, value);
            }
            prop_assume!(selection.has_union_selection());
            let before = ids(&primary_stage(&catalog, &selection));
            selection.select(extra.0, &extra.1);
            let after = ids(&primary_stage(&catalog, &selection));
            for id in before {
                prop_assert!(after.contains(&id));
            }
        }

        #[test]
        fn proptest_tier_stage_only_shrinks(
            tiers in proptest::collection::btree_set(
                prop_oneof![Just("Adventurer"), Just("Champion"), Just("Epic")].prop_map(str::to_string),
                0..4,
            ),
            extra in prop_oneof![Just("Adventurer"), Just("Champion"), Just("Epic")],
        ) {
            let catalog = catalog();
            let all: Vec<&Record> = catalog.iter().collect();
            let before = tier_stage(&all, &tiers);
            prop_assert!(before.len() <= all.len());

            let mut widened = tiers.clone();
            widened.insert(extra.to_string());
            let after = tier_stage(&all, &widened);
            prop_assert!(after.len() <= all.len());
            for record in &after {
                prop_assert!(all.contains(record));
            }
        }
    }
}
