//! Secondary panel option builder.
//!
//! Builds the grouped structure the secondary panel offers from the
//! primary-filtered subset:
//!
//! ```text
//! scope
//!   ├─ Class partition ──> groups (canonical order, then discovery order)
//!   │                        ├─ standalone records (no parent trait)
//!   │                        └─ clusters keyed by parent trait
//!   ├─ Ancestry partition ──> (same shape)
//!   └─ level presence (spell / feature)
//! ```
//!
//! The builder only reads its input; rebuilding from the same scope yields the
//! same structure.

use crate::config::{FilterConfig, PartitionConfig};
use feats_catalog::{Catalog, Record};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Class,
    Ancestry,
}

/// Records sharing one parent trait within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster<'c> {
    pub parent_trait: String,
    pub members: Vec<&'c Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionGroup<'c> {
    pub name: String,
    /// Records without a parent trait, catalog order
    pub standalone: Vec<&'c Record>,
    /// Parent-grouped records, clusters in discovery order
    pub clusters: Vec<Cluster<'c>>,
}

impl<'c> OptionGroup<'c> {
    fn new(name: String) -> Self {
        Self {
            name,
            standalone: Vec::new(),
            clusters: Vec::new(),
        }
    }

    fn push(&mut self, record: &'c Record) {
        let Some(parent) = record.parent_trait.as_deref() else {
            self.standalone.push(record);
            return;
        };
        match self.clusters.iter_mut().find(|c| c.parent_trait == parent) {
            Some(cluster) => cluster.members.push(record),
            None => self.clusters.push(Cluster {
                parent_trait: parent.to_string(),
                members: vec![record],
            }),
        }
    }

    /// Every record offered by this group
    pub fn records(&self) -> impl Iterator<Item = &'c Record> + '_ {
        self.standalone
            .iter()
            .copied()
            .chain(self.clusters.iter().flat_map(|c| c.members.iter().copied()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition<'c> {
    pub kind: PartitionKind,
    pub category: String,
    pub groups: Vec<OptionGroup<'c>>,
}

impl<'c> Partition<'c> {
    fn build(
        kind: PartitionKind,
        config: &PartitionConfig,
        other: &str,
        scope: &[&'c Record],
    ) -> Self {
        let mut discovered: Vec<OptionGroup<'c>> = Vec::new();
        for record in scope.iter().copied() {
            if !record.category_is(&config.category) {
                continue;
            }
            let name = record
                .group
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .unwrap_or(other);
            let idx = match discovered.iter().position(|g| g.name == name) {
                Some(idx) => idx,
                None => {
                    discovered.push(OptionGroup::new(name.to_string()));
                    discovered.len() - 1
                }
            };
            discovered[idx].push(record);
        }

        let mut groups = Vec::with_capacity(discovered.len());
        for canonical in &config.group_order {
            if let Some(idx) = discovered.iter().position(|g| &g.name == canonical) {
                groups.push(discovered.remove(idx));
            }
        }
        groups.extend(discovered);

        Self {
            kind,
            category: config.category.clone(),
            groups,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One selectable level label and whether the scope contains it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelOption {
    pub label: String,
    pub present: bool,
}

/// Everything the secondary panel needs to draw its controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryOptions<'c> {
    pub partitions: Vec<Partition<'c>>,
    pub spell_levels: Vec<LevelOption>,
    pub feature_levels: Vec<LevelOption>,
    /// Number of records the options were derived from
    pub scope_size: usize,
}

impl<'c> SecondaryOptions<'c> {
    /// Build options from exactly `scope`
    #[must_use]
    pub fn build(scope: &[&'c Record], config: &FilterConfig) -> Self {
        let partitions = vec![
            Partition::build(PartitionKind::Class, &config.class, &config.other_group, scope),
            Partition::build(
                PartitionKind::Ancestry,
                &config.ancestry,
                &config.other_group,
                scope,
            ),
        ];

        Self {
            partitions,
            spell_levels: level_presence(scope, &config.levels.spell, |r| r.spell_level.as_deref()),
            feature_levels: level_presence(scope, &config.levels.feature, |r| {
                r.feature_level.as_deref()
            }),
            scope_size: scope.len(),
        }
    }

    /// Build options from the primary-filtered subset, falling back to the
    /// whole catalog when that subset is empty.
    #[must_use]
    pub fn for_primary_subset(
        primary_subset: &[&'c Record],
        catalog: &'c Catalog,
        config: &FilterConfig,
    ) -> Self {
        if primary_subset.is_empty() {
            let all: Vec<&'c Record> = catalog.iter().collect();
            return Self::build(&all, config);
        }
        Self::build(primary_subset, config)
    }

    #[must_use]
    pub fn partition(&self, kind: PartitionKind) -> Option<&Partition<'c>> {
        self.partitions.iter().find(|p| p.kind == kind)
    }

    /// Every cluster across partitions and groups
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster<'c>> + '_ {
        self.partitions
            .iter()
            .flat_map(|p| p.groups.iter())
            .flat_map(|g| g.clusters.iter())
    }

    /// Every standalone record across partitions and groups
    pub fn standalone(&self) -> impl Iterator<Item = &'c Record> + '_ {
        self.partitions
            .iter()
            .flat_map(|p| p.groups.iter())
            .flat_map(|g| g.standalone.iter().copied())
    }
}

/// Presence of each level label in `scope`. Configured labels come first in
/// configured order; labels found in the scope but not configured follow in
/// discovery order.
fn level_presence<'c, F>(scope: &[&'c Record], configured: &[String], level: F) -> Vec<LevelOption>
where
    F: Fn(&'c Record) -> Option<&'c str>,
{
    let found: Vec<&str> = scope.iter().copied().filter_map(&level).collect();
    let mut options: Vec<LevelOption> = configured
        .iter()
        .map(|label| LevelOption {
            label: label.clone(),
            present: found.contains(&label.as_str()),
        })
        .collect();

    for label in found {
        if !options.iter().any(|o| o.label == label) {
            options.push(LevelOption {
                label: label.to_string(),
                present: true,
            });
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use feats_catalog::Tier;
    use pretty_assertions::assert_eq;

    fn names(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Record::new("1", "Spell Focus").category("Class").class("Wizard").group("Spell").spell_level("1st"),
            Record::new("2", "Extra Tough").category("Class").class("Fighter").group("Talent"),
            Record::new("3", "Song A").category("Class").class("Bard").group("Talent").parent_trait("Songs"),
            Record::new("4", "Odd One").category("Class").class("Bard"),
            Record::new("5", "Song B").category("Class").class("Bard").group("Talent").parent_trait("Songs"),
            Record::new("6", "Stone Skin").category("Ancestry").ancestry("Dwarf").group("Racial Power"),
            Record::new("7", "Toughness").category("General").tier(Tier::Epic, "x").feature_level("5th"),
            Record::new("8", "Arcane Trick").category("Class").class("Wizard").group("Cantrip").spell_level("3rd"),
            Record::new("9", "Lore").category("Ancestry").ancestry("Elf").group("Heritage").spell_level("2nd"),
        ])
    }

    #[test]
    fn groups_follow_canonical_then_discovery_order() {
        let catalog = catalog();
        let scope: Vec<&Record> = catalog.iter().collect();
        let options = SecondaryOptions::build(&scope, &FilterConfig::default());

        let class = options.partition(PartitionKind::Class).expect("class");
        let group_names: Vec<&str> = class.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(group_names, vec!["Talent", "Spell", "Other", "Cantrip"]);

        let ancestry = options.partition(PartitionKind::Ancestry).expect("ancestry");
        let group_names: Vec<&str> = ancestry.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(group_names, vec!["Racial Power", "Heritage"]);
    }

    #[test]
    fn clusters_separate_parent_grouped_records() {
        let catalog = catalog();
        let scope: Vec<&Record> = catalog.iter().collect();
        let options = SecondaryOptions::build(&scope, &FilterConfig::default());
        let talent = &options.partition(PartitionKind::Class).unwrap().groups[0];

        assert_eq!(names(&talent.standalone), vec!["Extra Tough"]);
        assert_eq!(talent.clusters.len(), 1);
        assert_eq!(talent.clusters[0].parent_trait, "Songs");
        assert_eq!(names(&talent.clusters[0].members), vec!["Song A", "Song B"]);
        assert_eq!(talent.records().count(), 3);
    }

    #[test]
    fn general_records_are_not_partitioned() {
        let catalog = catalog();
        let scope: Vec<&Record> = catalog.iter().collect();
        let options = SecondaryOptions::build(&scope, &FilterConfig::default());
        assert!(options.standalone().all(|r| r.category != "General"));
        assert_eq!(options.clusters().count(), 1);
    }

    #[test]
    fn level_presence_is_membership_over_scope() {
        let catalog = catalog();
        let scope: Vec<&Record> = catalog.iter().collect();
        let options = SecondaryOptions::build(&scope, &FilterConfig::default());

        let present: Vec<(&str, bool)> = options
            .spell_levels
            .iter()
            .map(|o| (o.label.as_str(), o.present))
            .collect();
        assert_eq!(
            present,
            vec![
                ("1st", true),
                ("3rd", true),
                ("5th", false),
                ("7th", false),
                ("9th", false),
                ("2nd", true),
            ]
        );
        assert!(options
            .feature_levels
            .iter()
            .any(|o| o.label == "5th" && o.present));
    }

    #[test]
    fn rebuilding_is_pure() {
        let catalog = catalog();
        let scope: Vec<&Record> = catalog.iter().collect();
        let config = FilterConfig::default();
        let first = SecondaryOptions::build(&scope, &config);
        let second = SecondaryOptions::build(&scope, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_primary_subset_falls_back_to_catalog() {
        let catalog = catalog();
        let config = FilterConfig::default();
        let options = SecondaryOptions::for_primary_subset(&[], &catalog, &config);
        assert_eq!(options.scope_size, catalog.len());

        let narrowed: Vec<&Record> = catalog.iter().filter(|r| r.class.matches("Wizard")).collect();
        let options = SecondaryOptions::for_primary_subset(&narrowed, &catalog, &config);
        assert_eq!(options.scope_size, 2);
        assert!(options.partition(PartitionKind::Ancestry).unwrap().is_empty());
        assert!(!options.spell_levels.iter().any(|o| o.label == "2nd"));
    }
}
