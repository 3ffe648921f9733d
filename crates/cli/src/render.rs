//! Presentation: result cards, indicators, facet and panel listings.

use feats_catalog::{Facet, FacetIndex, Record, Tier};
use feats_filter::{
    Cluster, Control, Indicator, OptionGroup, PanelState, PartitionKind, SecondaryOptions,
};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub const NO_MATCHES: &str = "No feats match your current filters.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTier {
    pub tier: Tier,
    pub description: String,
}

/// One rendered record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub meta: String,
    pub tiers: Vec<CardTier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Card {
    /// Build a card. With `only_tiers` set, tier entries outside that set are
    /// hidden; an empty set hides nothing.
    pub fn from_record(record: &Record, only_tiers: Option<&BTreeSet<String>>) -> Self {
        let tiers = record
            .tiers_canonical()
            .into_iter()
            .filter(|entry| match only_tiers {
                Some(selected) if !selected.is_empty() => selected.contains(entry.tier.as_str()),
                _ => true,
            })
            .map(|entry| CardTier {
                tier: entry.tier,
                description: entry.display_description().to_string(),
            })
            .collect();

        Self {
            id: record.id.to_string(),
            name: record.name.clone(),
            meta: meta_line(record),
            tiers,
            tags: record.tags().into_iter().map(str::to_string).collect(),
        }
    }
}

/// `"<scope> | <parent> | <tier> Tier | Req Level: <lvl> | <lvl> Level"`
pub fn meta_line(record: &Record) -> String {
    let group = record.group.as_deref().unwrap_or("");
    let scope = match record.category.as_str() {
        "Ancestry" => scoped(&record.ancestry.atoms().join(", "), group),
        "Class" => scoped(&record.class.atoms().join(", "), group),
        other => other.trim().to_string(),
    };

    let mut parts = Vec::new();
    if !scope.is_empty() {
        parts.push(scope);
    }
    if let Some(parent) = &record.parent_trait {
        parts.push(parent.clone());
    }
    if let Some(tier) = &record.feature_tier {
        parts.push(format!("{tier} Tier"));
    }
    if let Some(level) = &record.feature_level {
        parts.push(format!("Req Level: {level}"));
    }
    if let Some(level) = &record.spell_level {
        parts.push(format!("{level} Level"));
    }
    parts.join(" | ")
}

fn scoped(owner: &str, group: &str) -> String {
    [owner.trim(), group.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .join(" ")
}

pub fn render_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return format!("{NO_MATCHES}\n");
    }
    let mut out = String::new();
    for card in cards {
        let _ = writeln!(out, "{} [{}]", card.name, card.id);
        if !card.meta.is_empty() {
            let _ = writeln!(out, "  {}", card.meta);
        }
        for tier in &card.tiers {
            let _ = writeln!(out, "  {}: {}", tier.tier, tier.description);
        }
        if !card.tags.is_empty() {
            let _ = writeln!(out, "  tags: {}", card.tags.iter().join(", "));
        }
        out.push('\n');
    }
    out
}

pub fn render_indicators(indicators: &[Indicator]) -> String {
    if indicators.is_empty() {
        return String::new();
    }
    format!(
        "Active filters: {}\n",
        indicators.iter().map(|i| format!("[{}]", i.label)).join(" ")
    )
}

pub fn render_facets(facets: &FacetIndex) -> String {
    let mut out = String::new();
    for facet in [Facet::Type, Facet::Ancestry, Facet::Class, Facet::Tier] {
        let _ = writeln!(
            out,
            "{}: {}",
            facet.as_str(),
            facets.values(facet).iter().join(", ")
        );
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionEntry {
    pub id: String,
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterView {
    pub parent_trait: String,
    pub checked: bool,
    pub members: Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub name: String,
    pub standalone: Vec<OptionEntry>,
    pub clusters: Vec<ClusterView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionView {
    pub kind: PartitionKind,
    pub category: String,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelView {
    pub label: String,
    pub present: bool,
    pub checked: bool,
}

/// Secondary panel listing with each control's checked state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsView {
    pub scope_size: usize,
    pub partitions: Vec<PartitionView>,
    pub spell_levels: Vec<LevelView>,
    pub feature_levels: Vec<LevelView>,
}

impl OptionsView {
    pub fn build(options: &SecondaryOptions<'_>, panel: &PanelState) -> Self {
        let entry = |record: &Record| OptionEntry {
            id: record.id.to_string(),
            name: record.name.clone(),
            checked: panel.is_checked(&Control::Record(record.id.clone())),
        };
        let cluster = |cluster: &Cluster<'_>| ClusterView {
            parent_trait: cluster.parent_trait.clone(),
            checked: panel.is_checked(&Control::Parent(cluster.parent_trait.clone())),
            members: cluster.members.iter().copied().map(&entry).collect(),
        };
        let group = |group: &OptionGroup<'_>| GroupView {
            name: group.name.clone(),
            standalone: group.standalone.iter().copied().map(&entry).collect(),
            clusters: group.clusters.iter().map(&cluster).collect(),
        };

        Self {
            scope_size: options.scope_size,
            partitions: options
                .partitions
                .iter()
                .map(|p| PartitionView {
                    kind: p.kind,
                    category: p.category.clone(),
                    groups: p.groups.iter().map(&group).collect(),
                })
                .collect(),
            spell_levels: options
                .spell_levels
                .iter()
                .map(|o| LevelView {
                    label: o.label.clone(),
                    present: o.present,
                    checked: panel.is_checked(&Control::SpellLevel(o.label.clone())),
                })
                .collect(),
            feature_levels: options
                .feature_levels
                .iter()
                .map(|o| LevelView {
                    label: o.label.clone(),
                    present: o.present,
                    checked: panel.is_checked(&Control::FeatureLevel(o.label.clone())),
                })
                .collect(),
        }
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn render_options(view: &OptionsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Options from {} feats", view.scope_size);
    for partition in &view.partitions {
        if partition.groups.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", partition.category);
        for group in &partition.groups {
            let _ = writeln!(out, "  {}", group.name);
            for entry in &group.standalone {
                let _ = writeln!(
                    out,
                    "    {} {} [{}]",
                    checkbox(entry.checked),
                    entry.name,
                    entry.id
                );
            }
            for cluster in &group.clusters {
                let _ = writeln!(
                    out,
                    "    {} {}",
                    checkbox(cluster.checked),
                    cluster.parent_trait
                );
                for entry in &cluster.members {
                    let _ = writeln!(
                        out,
                        "      {} {} [{}]",
                        checkbox(entry.checked),
                        entry.name,
                        entry.id
                    );
                }
            }
        }
    }

    for (title, levels) in [
        ("Spell Level", &view.spell_levels),
        ("Feature Level", &view.feature_levels),
    ] {
        let present = levels
            .iter()
            .filter(|l| l.present)
            .map(|l| format!("{} {}", checkbox(l.checked), l.label))
            .join("  ");
        let _ = writeln!(out, "\n{title}: {present}");
    }
    out
}
