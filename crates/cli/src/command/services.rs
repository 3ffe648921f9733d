use anyhow::{Context, Result};
use feats_filter::{FilterConfig, Session};
use std::path::Path;

use super::domain::{
    FacetsOutput, FilterOutput, FilterPayload, OptionsPayload, PanelOutput, PanelPayload,
    SelectionPayload,
};
use crate::render::{Card, OptionsView, NO_MATCHES};

pub async fn open_session(catalog: &Path, config: FilterConfig) -> Result<Session> {
    let mut session = Session::new(config);
    session
        .load_from(catalog)
        .await
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?;
    Ok(session)
}

pub fn facets(session: &Session) -> Result<FacetsOutput> {
    let records = session.catalog().map_or(0, |c| c.len());
    Ok(FacetsOutput {
        records,
        facets: session.facets()?.clone(),
    })
}

fn apply_selection(session: &mut Session, selection: &SelectionPayload) -> Result<()> {
    session.replace_state(selection.to_state())?;
    Ok(())
}

fn filter_output(session: &Session, only_selected_tiers: bool) -> Result<FilterOutput> {
    let view = session.view()?;
    let only = only_selected_tiers.then_some(&view.selected_tiers);
    let results: Vec<Card> = view
        .results
        .iter()
        .map(|record| Card::from_record(record, only))
        .collect();

    Ok(FilterOutput {
        total: results.len(),
        primary_subset: view.primary_subset_len,
        empty_message: view.is_empty.then(|| NO_MATCHES.to_string()),
        results,
        indicators: view.indicators,
    })
}

pub fn filter(session: &mut Session, payload: &FilterPayload) -> Result<FilterOutput> {
    apply_selection(session, &payload.selection)?;
    filter_output(session, payload.only_selected_tiers)
}

pub fn options(session: &mut Session, payload: &OptionsPayload) -> Result<OptionsView> {
    apply_selection(session, &payload.selection)?;
    session.open_panel()?;
    let view = {
        let options = session.secondary_options()?;
        let panel = session
            .panel()
            .context("Secondary panel is not open")?;
        OptionsView::build(&options, panel)
    };
    session.close_panel();
    Ok(view)
}

/// Open the panel over the selection, replay toggles, then commit or discard
pub fn panel(session: &mut Session, payload: &PanelPayload) -> Result<PanelOutput> {
    apply_selection(session, &payload.selection)?;
    session.open_panel()?;

    let mut changes = Vec::new();
    if payload.clear {
        changes.push(session.clear_panel()?);
    }
    for control in &payload.toggles {
        changes.push(session.toggle_panel_control(control)?);
    }

    let options = {
        let options = session.secondary_options()?;
        let panel = session
            .panel()
            .context("Secondary panel is not open")?;
        OptionsView::build(&options, panel)
    };

    if payload.commit {
        session.commit_panel()?;
    } else {
        session.close_panel();
    }

    Ok(PanelOutput {
        changes,
        committed: payload.commit,
        options,
        filter: filter_output(session, false)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feats_catalog::{Catalog, Record, RecordId, Tier};
    use feats_filter::Control;

    fn session() -> Session {
        let mut session = Session::new(FilterConfig::default());
        session.load(Catalog::new(vec![
            Record::new("1", "Cleave")
                .category("Class")
                .class("Fighter")
                .tier(Tier::Adventurer, "a")
                .tier(Tier::Epic, "e"),
            Record::new("3", "Song A")
                .category("Class")
                .class("Bard")
                .parent_trait("Songs"),
            Record::new("4", "Song B")
                .category("Class")
                .class("Bard")
                .parent_trait("Songs"),
        ]));
        session
    }

    #[test]
    fn filter_hides_unselected_tiers_on_request() {
        let mut session = session();
        let mut payload = FilterPayload::default();
        payload.selection.tier = vec!["Epic".to_string()];
        payload.only_selected_tiers = true;

        let output = filter(&mut session, &payload).unwrap();
        assert_eq!(output.total, 1);
        assert_eq!(output.results[0].tiers.len(), 1);
        assert!(output.empty_message.is_none());

        payload.selection.class = vec!["Wizard".to_string()];
        let output = filter(&mut session, &payload).unwrap();
        assert_eq!(output.empty_message.as_deref(), Some(NO_MATCHES));
    }

    #[test]
    fn panel_commit_feeds_the_advanced_stage() {
        let mut session = session();
        let payload = PanelPayload {
            toggles: vec![
                Control::Parent("Songs".to_string()),
                Control::Record(RecordId::new("4")),
            ],
            commit: true,
            ..PanelPayload::default()
        };

        let output = panel(&mut session, &payload).unwrap();
        assert_eq!(output.changes[0].len(), 3);
        assert_eq!(output.changes[1].len(), 2);
        let ids: Vec<&str> = output.filter.results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
        assert!(session.panel().is_none());
    }

    #[test]
    fn options_are_scoped_to_primary_subset() {
        let mut session = session();
        let mut payload = OptionsPayload::default();
        payload.selection.class = vec!["Fighter".to_string()];
        let view = options(&mut session, &payload).unwrap();
        assert_eq!(view.scope_size, 1);
        assert!(session.panel().is_none());
    }
}
