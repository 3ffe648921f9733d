//! # Feats Filter
//!
//! Composes user selections over a [`feats_catalog::Catalog`] into a result
//! set, derives the secondary panel from the primary-filtered subset and keeps
//! parent/child checkboxes in sync.
//!
//! ## Architecture
//!
//! ```text
//! Session (owns Catalog + FilterState + cached primary subset)
//!     │
//!     ├──> engine::compute
//!     │      ├─ primary stage  (OR across Type/Ancestry/Class)
//!     │      ├─ tier stage     (AND)
//!     │      └─ advanced stage (OR across parent/record/spell/feature)
//!     │
//!     ├──> SecondaryOptions (partitions → groups → clusters, level presence)
//!     │      └─> PanelState (fan-out / fan-in, commit replaces wholesale)
//!     │
//!     └──> active_indicators (one removable key per selected value)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use feats_catalog::{Catalog, Facet};
//! use feats_filter::{FilterConfig, Session};
//!
//! let catalog = Catalog::from_json_str(
//!     r#"[
//!         {"id": 1, "name": "Cleave", "category": "Class", "class": "Fighter",
//!          "feats": [{"tier": "Epic", "description": "X"}]},
//!         {"id": 2, "name": "Stone Skin", "category": "Ancestry", "ancestry": "Dwarf",
//!          "feats": [{"tier": "Adventurer", "description": "Y"}]}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let mut session = Session::new(FilterConfig::default());
//! session.load(catalog);
//! session.toggle(Facet::Class, "Fighter").unwrap();
//! session.toggle(Facet::Tier, "Epic").unwrap();
//!
//! let view = session.view().unwrap();
//! assert_eq!(view.results.len(), 1);
//! assert_eq!(view.results[0].name, "Cleave");
//! ```

pub mod config;
pub mod engine;
mod error;
pub mod indicators;
pub mod options;
pub mod panel;
pub mod session;
pub mod state;

pub use config::{FilterConfig, LevelsConfig, PartitionConfig};
pub use engine::{compute, compute_result_set, FilterOutcome};
pub use error::{FilterError, Result};
pub use indicators::{active_indicators, Indicator, IndicatorKey};
pub use options::{Cluster, LevelOption, OptionGroup, Partition, PartitionKind, SecondaryOptions};
pub use panel::{Control, ControlChange, PanelState};
pub use session::{Session, View};
pub use state::{AdvancedFacet, AdvancedSelection, FilterState, PrimarySelection};
