//! Uncommitted secondary panel state.
//!
//! Each parent-trait cluster is a small state machine: toggling the parent
//! fans out to every child, toggling a child fans in to the parent (checked iff
//! all children are checked). Every action returns the controls whose state
//! changed so the caller can redraw exactly those.

use crate::error::{FilterError, Result};
use crate::options::SecondaryOptions;
use crate::state::AdvancedSelection;
use feats_catalog::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One checkbox in the panel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Control {
    Parent(String),
    Record(RecordId),
    SpellLevel(String),
    FeatureLevel(String),
}

/// A control whose checked state changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlChange {
    pub control: Control,
    pub checked: bool,
}

#[derive(Debug, Clone, Default)]
struct ClusterState {
    parent_checked: bool,
    children: Vec<(RecordId, bool)>,
}

impl ClusterState {
    fn all_children_checked(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(|(_, checked)| *checked)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelState {
    clusters: BTreeMap<String, ClusterState>,
    /// Child record id -> owning parent trait
    child_parent: HashMap<RecordId, String>,
    standalone: BTreeMap<RecordId, bool>,
    spell_levels: Vec<(String, bool)>,
    feature_levels: Vec<(String, bool)>,
}

impl PanelState {
    /// Build controls for `options`, pre-checked from the committed selection.
    ///
    /// Children are checked from the committed record ids and each parent is
    /// then fanned in from its children, so a committed parent trait alone
    /// does not check its control.
    ///
    /// Clusters sharing a parent trait across groups merge into one cluster.
    #[must_use]
    pub fn from_options(options: &SecondaryOptions<'_>, committed: &AdvancedSelection) -> Self {
        let mut panel = Self::default();

        for cluster in options.clusters() {
            let state = panel
                .clusters
                .entry(cluster.parent_trait.clone())
                .or_default();
            for member in &cluster.members {
                if panel.child_parent.contains_key(&member.id) {
                    continue;
                }
                let checked = committed.record_ids.contains(&member.id);
                state.children.push((member.id.clone(), checked));
                panel
                    .child_parent
                    .insert(member.id.clone(), cluster.parent_trait.clone());
            }
        }
        for state in panel.clusters.values_mut() {
            state.parent_checked = state.all_children_checked();
        }

        for record in options.standalone() {
            let checked = committed.record_ids.contains(&record.id);
            panel.standalone.insert(record.id.clone(), checked);
        }

        panel.spell_levels = options
            .spell_levels
            .iter()
            .map(|o| (o.label.clone(), committed.spell_levels.contains(&o.label)))
            .collect();
        panel.feature_levels = options
            .feature_levels
            .iter()
            .map(|o| (o.label.clone(), committed.feature_levels.contains(&o.label)))
            .collect();

        panel
    }

    #[must_use]
    pub fn is_checked(&self, control: &Control) -> bool {
        match control {
            Control::Parent(name) => self.clusters.get(name).is_some_and(|c| c.parent_checked),
            Control::Record(id) => self.record_checked(id).unwrap_or(false),
            Control::SpellLevel(label) => level_checked(&self.spell_levels, label),
            Control::FeatureLevel(label) => level_checked(&self.feature_levels, label),
        }
    }

    fn record_checked(&self, id: &RecordId) -> Option<bool> {
        if let Some(parent) = self.child_parent.get(id) {
            return self
                .clusters
                .get(parent)
                .and_then(|c| c.children.iter().find(|(child, _)| child == id))
                .map(|(_, checked)| *checked);
        }
        self.standalone.get(id).copied()
    }

    /// Flip any control
    pub fn toggle(&mut self, control: &Control) -> Result<Vec<ControlChange>> {
        let checked = !self.is_checked(control);
        self.set(control, checked)
    }

    /// Set any control to `checked`, applying fan-out / fan-in
    pub fn set(&mut self, control: &Control, checked: bool) -> Result<Vec<ControlChange>> {
        match control {
            Control::Parent(name) => self.set_parent(name, checked),
            Control::Record(id) => self.set_record(id, checked),
            Control::SpellLevel(label) => {
                set_level(&mut self.spell_levels, label, checked, Control::SpellLevel)
            }
            Control::FeatureLevel(label) => {
                set_level(&mut self.feature_levels, label, checked, Control::FeatureLevel)
            }
        }
    }

    /// Fan-out: the parent's new state is copied to every child
    pub fn set_parent(&mut self, parent: &str, checked: bool) -> Result<Vec<ControlChange>> {
        let cluster = self
            .clusters
            .get_mut(parent)
            .ok_or_else(|| FilterError::unknown_control(format!("parent {parent}")))?;

        let mut changes = Vec::new();
        if cluster.parent_checked != checked {
            cluster.parent_checked = checked;
            changes.push(ControlChange {
                control: Control::Parent(parent.to_string()),
                checked,
            });
        }
        for (id, child_checked) in &mut cluster.children {
            if *child_checked != checked {
                *child_checked = checked;
                changes.push(ControlChange {
                    control: Control::Record(id.clone()),
                    checked,
                });
            }
        }
        Ok(changes)
    }

    /// Set a record control. Cluster children fan in to their parent.
    pub fn set_record(&mut self, id: &RecordId, checked: bool) -> Result<Vec<ControlChange>> {
        let mut changes = Vec::new();

        let Some(parent) = self.child_parent.get(id).cloned() else {
            let slot = self
                .standalone
                .get_mut(id)
                .ok_or_else(|| FilterError::unknown_control(format!("record {id}")))?;
            if *slot != checked {
                *slot = checked;
                changes.push(ControlChange {
                    control: Control::Record(id.clone()),
                    checked,
                });
            }
            return Ok(changes);
        };

        let cluster = self
            .clusters
            .get_mut(&parent)
            .ok_or_else(|| FilterError::unknown_control(format!("parent {parent}")))?;
        if let Some((_, child_checked)) = cluster.children.iter_mut().find(|(c, _)| c == id) {
            if *child_checked != checked {
                *child_checked = checked;
                changes.push(ControlChange {
                    control: Control::Record(id.clone()),
                    checked,
                });
            }
        }

        let parent_checked = cluster.all_children_checked();
        if cluster.parent_checked != parent_checked {
            cluster.parent_checked = parent_checked;
            changes.push(ControlChange {
                control: Control::Parent(parent),
                checked: parent_checked,
            });
        }
        Ok(changes)
    }

    /// Uncheck every control. The committed selection is untouched.
    pub fn clear(&mut self) -> Vec<ControlChange> {
        let checked: Vec<Control> = self
            .controls()
            .into_iter()
            .filter(|c| self.is_checked(c))
            .collect();

        for cluster in self.clusters.values_mut() {
            cluster.parent_checked = false;
            for (_, child) in &mut cluster.children {
                *child = false;
            }
        }
        for slot in self.standalone.values_mut() {
            *slot = false;
        }
        for (_, slot) in self.spell_levels.iter_mut().chain(self.feature_levels.iter_mut()) {
            *slot = false;
        }

        checked
            .into_iter()
            .map(|control| ControlChange {
                control,
                checked: false,
            })
            .collect()
    }

    /// Every control the panel offers
    #[must_use]
    pub fn controls(&self) -> Vec<Control> {
        let mut controls = Vec::new();
        for (parent, cluster) in &self.clusters {
            controls.push(Control::Parent(parent.clone()));
            controls.extend(cluster.children.iter().map(|(id, _)| Control::Record(id.clone())));
        }
        controls.extend(self.standalone.keys().cloned().map(Control::Record));
        controls.extend(self.spell_levels.iter().map(|(l, _)| Control::SpellLevel(l.clone())));
        controls.extend(
            self.feature_levels
                .iter()
                .map(|(l, _)| Control::FeatureLevel(l.clone())),
        );
        controls
    }

    /// Current checked state as an advanced selection. Checked parents and
    /// checked children are both kept; neither is derived from the other.
    #[must_use]
    pub fn selection(&self) -> AdvancedSelection {
        let mut selection = AdvancedSelection::default();
        for (parent, cluster) in &self.clusters {
            if cluster.parent_checked {
                selection.parent_traits.insert(parent.clone());
            }
            selection.record_ids.extend(
                cluster
                    .children
                    .iter()
                    .filter(|(_, checked)| *checked)
                    .map(|(id, _)| id.clone()),
            );
        }
        selection.record_ids.extend(
            self.standalone
                .iter()
                .filter(|(_, checked)| **checked)
                .map(|(id, _)| id.clone()),
        );
        selection.spell_levels = checked_labels(&self.spell_levels);
        selection.feature_levels = checked_labels(&self.feature_levels);
        selection
    }

    /// Replace `target` wholesale with the panel's checked state
    pub fn commit(&self, target: &mut AdvancedSelection) {
        *target = self.selection();
    }
}

fn level_checked(levels: &[(String, bool)], label: &str) -> bool {
    levels.iter().any(|(l, checked)| l == label && *checked)
}

fn set_level(
    levels: &mut [(String, bool)],
    label: &str,
    checked: bool,
    control: fn(String) -> Control,
) -> Result<Vec<ControlChange>> {
    let (_, slot) = levels
        .iter_mut()
        .find(|(l, _)| l == label)
        .ok_or_else(|| FilterError::unknown_control(format!("level {label}")))?;
    if *slot == checked {
        return Ok(Vec::new());
    }
    *slot = checked;
    Ok(vec![ControlChange {
        control: control(label.to_string()),
        checked,
    }])
}

fn checked_labels(levels: &[(String, bool)]) -> BTreeSet<String> {
    levels
        .iter()
        .filter(|(_, checked)| *checked)
        .map(|(label, _)| label.clone())
        .collect()
}
