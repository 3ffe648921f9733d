//! Session: the single owner of the loaded catalog and the live selection.
//!
//! Every action mutates the [`FilterState`] and then refreshes the cached
//! primary-filtered subset. Before a catalog is loaded each action returns
//! [`FilterError::CatalogNotLoaded`] and leaves the state untouched.

use crate::config::FilterConfig;
use crate::engine;
use crate::error::{FilterError, Result};
use crate::indicators::{active_indicators, Indicator, IndicatorKey};
use crate::options::SecondaryOptions;
use crate::panel::{Control, ControlChange, PanelState};
use crate::state::FilterState;
use feats_catalog::{Catalog, Facet, FacetIndex, Record};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Snapshot of what the presentation layer draws after an action
#[derive(Debug, Clone, Serialize)]
pub struct View<'s> {
    /// Result set in catalog order
    pub results: Vec<&'s Record>,
    pub primary_subset_len: usize,
    pub indicators: Vec<Indicator>,
    /// Selected tiers, so cards may show only the matching descriptions
    pub selected_tiers: BTreeSet<String>,
    /// True when the result set is empty; distinct from an error
    pub is_empty: bool,
}

#[derive(Debug, Default)]
pub struct Session {
    config: FilterConfig,
    catalog: Option<Catalog>,
    facets: FacetIndex,
    state: FilterState,
    /// Catalog positions of the primary-filtered subset
    primary_subset: Vec<usize>,
    panel: Option<PanelState>,
}

impl Session {
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Install a catalog and reset the selection
    pub fn load(&mut self, catalog: Catalog) {
        log::info!("catalog loaded: {} records", catalog.len());
        self.facets = FacetIndex::from_records(&catalog);
        self.catalog = Some(catalog);
        self.state.reset();
        self.panel = None;
        self.refresh();
    }

    /// Read the catalog file. On failure the session stays unloaded.
    pub async fn load_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match Catalog::load(path).await {
            Ok(catalog) => {
                self.load(catalog);
                Ok(())
            }
            Err(err) => {
                log::error!("failed to load catalog {}: {err}", path.display());
                self.catalog = None;
                self.facets = FacetIndex::default();
                self.primary_subset.clear();
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.catalog.is_some()
    }

    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Primary facet options over the whole catalog
    pub fn facets(&self) -> Result<&FacetIndex> {
        self.loaded()?;
        Ok(&self.facets)
    }

    #[must_use]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    fn loaded(&self) -> Result<&Catalog> {
        self.catalog.as_ref().ok_or(FilterError::CatalogNotLoaded)
    }

    fn refresh(&mut self) {
        let Some(catalog) = self.catalog.as_ref() else {
            self.primary_subset.clear();
            return;
        };
        self.primary_subset = engine::primary_stage(catalog, &self.state.primary)
            .into_iter()
            .filter_map(|record| catalog.position(&record.id))
            .collect();
    }

    /// Apply `change` to the state, then recompute
    fn mutate<T>(&mut self, change: impl FnOnce(&mut FilterState) -> T) -> Result<T> {
        self.loaded()?;
        let out = change(&mut self.state);
        self.refresh();
        Ok(out)
    }

    /// Flip a primary value; returns its new selected state
    pub fn toggle(&mut self, facet: Facet, value: &str) -> Result<bool> {
        self.mutate(|state| state.primary.toggle(facet, value))
    }

    pub fn select(&mut self, facet: Facet, value: &str) -> Result<bool> {
        self.mutate(|state| state.primary.select(facet, value))
    }

    pub fn deselect(&mut self, facet: Facet, value: &str) -> Result<bool> {
        self.mutate(|state| state.primary.deselect(facet, value))
    }

    /// Replace the whole selection, e.g. from a command request
    pub fn replace_state(&mut self, state: FilterState) -> Result<()> {
        self.mutate(|current| *current = state)
    }

    pub fn remove_indicator(&mut self, key: &IndicatorKey) -> Result<bool> {
        self.mutate(|state| state.remove(key))
    }

    /// Clear primary and advanced selections
    pub fn reset(&mut self) -> Result<()> {
        self.mutate(FilterState::reset)
    }

    pub fn clear_advanced(&mut self) -> Result<()> {
        self.mutate(FilterState::clear_advanced)
    }

    /// Primary-filtered subset in catalog order
    pub fn primary_subset(&self) -> Result<Vec<&Record>> {
        let catalog = self.loaded()?;
        Ok(self
            .primary_subset
            .iter()
            .map(|&idx| &catalog.records()[idx])
            .collect())
    }

    /// Secondary panel options for the current primary subset
    pub fn secondary_options(&self) -> Result<SecondaryOptions<'_>> {
        let catalog = self.loaded()?;
        let subset = self.primary_subset()?;
        Ok(SecondaryOptions::for_primary_subset(
            &subset,
            catalog,
            &self.config,
        ))
    }

    /// Open the secondary panel, pre-checked from the committed selection
    pub fn open_panel(&mut self) -> Result<&PanelState> {
        let panel = {
            let options = self.secondary_options()?;
            PanelState::from_options(&options, &self.state.advanced)
        };
        Ok(self.panel.insert(panel))
    }

    #[must_use]
    pub fn panel(&self) -> Option<&PanelState> {
        self.panel.as_ref()
    }

    pub fn toggle_panel_control(&mut self, control: &Control) -> Result<Vec<ControlChange>> {
        self.panel_mut()?.toggle(control)
    }

    /// Uncheck every panel control; the committed selection is kept
    pub fn clear_panel(&mut self) -> Result<Vec<ControlChange>> {
        Ok(self.panel_mut()?.clear())
    }

    /// Commit the panel into the advanced selection and close it
    pub fn commit_panel(&mut self) -> Result<()> {
        self.loaded()?;
        let panel = self.panel.take().ok_or(FilterError::PanelClosed)?;
        panel.commit(&mut self.state.advanced);
        self.refresh();
        Ok(())
    }

    /// Discard uncommitted panel state
    pub fn close_panel(&mut self) {
        self.panel = None;
    }

    fn panel_mut(&mut self) -> Result<&mut PanelState> {
        self.loaded()?;
        self.panel.as_mut().ok_or(FilterError::PanelClosed)
    }

    /// Recompute the result set and indicators
    pub fn view(&self) -> Result<View<'_>> {
        let catalog = self.loaded()?;
        let results = engine::compute_result_set(catalog, &self.state);
        Ok(View {
            is_empty: results.is_empty(),
            results,
            primary_subset_len: self.primary_subset.len(),
            indicators: active_indicators(&self.state, Some(catalog)),
            selected_tiers: self.state.primary.tiers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feats_catalog::{RecordId, Tier};
    use pretty_assertions::assert_eq;
    use std::io::Write;

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
                .group("Racial Power")
                .tier(Tier::Adventurer, "Y"),
            Record::new("3", "Song A")
                .category("Class")
                .class("Bard")
                .group("Talent")
                .parent_trait("Songs"),
            Record::new("4", "Song B")
                .category("Class")
                .class("Bard")
                .group("Talent")
                .parent_trait("Songs"),
        ])
    }

    fn loaded() -> Session {
        let mut session = Session::new(FilterConfig::default());
        session.load(catalog());
        session
    }

    #[test]
    fn unloaded_session_reports_no_data_without_mutating() {
        let mut session = Session::default();
        let err = session.toggle(Facet::Class, "Fighter").unwrap_err();
        assert!(matches!(err, FilterError::CatalogNotLoaded));
        assert_eq!(err.to_string(), "No data: catalog is not loaded");
        assert!(session.state().is_empty());
        assert!(session.view().is_err());
        assert!(session.open_panel().is_err());
        assert!(session.reset().is_err());
    }

    #[test]
    fn toggling_recomputes_view() {
        let mut session = loaded();
        assert_eq!(session.view().unwrap().results.len(), 4);

        assert!(session.toggle(Facet::Class, "Fighter").unwrap());
        assert!(session.toggle(Facet::Tier, "Epic").unwrap());
        let view = session.view().unwrap();
        assert_eq!(ids(&view.results), vec!["1"]);
        assert_eq!(view.primary_subset_len, 1);
        assert!(view.selected_tiers.contains("Epic"));

        session.select(Facet::Ancestry, "Dwarf").unwrap();
        let view = session.view().unwrap();
        assert_eq!(ids(&view.results), vec!["1"]);
        assert_eq!(view.primary_subset_len, 2);
    }

    #[test]
    fn empty_result_is_a_state_not_an_error() {
        let mut session = loaded();
        session.select(Facet::Class, "Necromancer").unwrap();
        let view = session.view().unwrap();
        assert!(view.is_empty);
        assert_eq!(view.indicators.len(), 1);
    }

    #[test]
    fn panel_round_trip_commits_wholesale() {
        let mut session = loaded();
        session.select(Facet::Class, "Bard").unwrap();

        let panel = session.open_panel().unwrap();
        assert!(!panel.is_checked(&Control::Parent("Songs".to_string())));

        let changes = session
            .toggle_panel_control(&Control::Parent("Songs".to_string()))
            .unwrap();
        assert_eq!(changes.len(), 3);
        session.commit_panel().unwrap();
        assert!(session.panel().is_none());

        let advanced = &session.state().advanced;
        assert!(advanced.parent_traits.contains("Songs"));
        assert!(advanced.record_ids.contains(&RecordId::new("3")));
        assert_eq!(ids(&session.view().unwrap().results), vec!["3", "4"]);

        // Reopening pre-checks from the committed selection
        let panel = session.open_panel().unwrap();
        assert!(panel.is_checked(&Control::Record(RecordId::new("4"))));
        session.clear_panel().unwrap();
        assert!(!session.state().advanced.is_empty());
        session.commit_panel().unwrap();
        assert!(session.state().advanced.is_empty());
    }

    #[test]
    fn clear_advanced_keeps_primary_selection() {
        let mut session = loaded();
        session.select(Facet::Class, "Bard").unwrap();
        session.select(Facet::Class, "Fighter").unwrap();
        session.open_panel().unwrap();
        session
            .toggle_panel_control(&Control::Record(RecordId::new("3")))
            .unwrap();
        session.commit_panel().unwrap();
        assert_eq!(ids(&session.view().unwrap().results), vec!["3"]);

        session.clear_advanced().unwrap();
        assert!(session.state().advanced.is_empty());
        assert!(session.state().primary.values(Facet::Class).contains("Bard"));
        let view = session.view().unwrap();
        assert_eq!(ids(&view.results), vec!["1", "3", "4"]);
        assert_eq!(view.primary_subset_len, 3);
    }

    #[test]
    fn panel_actions_require_an_open_panel() {
        let mut session = loaded();
        assert!(matches!(
            session.commit_panel(),
            Err(FilterError::PanelClosed)
        ));
        session.open_panel().unwrap();
        session.close_panel();
        assert!(session.clear_panel().is_err());
    }

    #[test]
    fn options_fall_back_to_catalog_when_subset_empty() {
        let mut session = loaded();
        session.select(Facet::Class, "Necromancer").unwrap();
        let options = session.secondary_options().unwrap();
        assert_eq!(options.scope_size, 4);
    }

    #[test]
    fn indicator_removal_and_reset() {
        let mut session = loaded();
        session.select(Facet::Class, "Fighter").unwrap();
        session.select(Facet::Type, "Ancestry").unwrap();

        let key = session.view().unwrap().indicators[0].key.clone();
        assert!(session.remove_indicator(&key).unwrap());
        assert_eq!(ids(&session.view().unwrap().results), vec!["1"]);

        session.reset().unwrap();
        assert!(session.state().is_empty());
        assert_eq!(session.primary_subset().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn load_from_file_and_failure_leaves_session_unloaded() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"[{{"id": 1, "name": "Cleave", "category": "Class", "class": "Fighter"}}]"#
        )
        .expect("write");

        let mut session = Session::default();
        session.load_from(file.path()).await.expect("load");
        assert!(session.is_loaded());
        assert_eq!(session.facets().unwrap().values(Facet::Class), ["Fighter"]);

        let mut broken = tempfile::NamedTempFile::new().expect("tempfile");
        write!(broken, r#"{{"id": 1}}"#).expect("write");
        let mut session = Session::default();
        assert!(session.load_from(broken.path()).await.is_err());
        assert!(!session.is_loaded());
        assert!(matches!(
            session.select(Facet::Type, "General"),
            Err(FilterError::CatalogNotLoaded)
        ));
    }
}
