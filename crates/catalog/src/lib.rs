//! # Feats Catalog
//!
//! The immutable record set the filter engine works on, plus the matching
//! primitive every facet comparison goes through.
//!
//! ## Architecture
//!
//! ```text
//! feats.json
//!     │
//!     ├──> Catalog loader (JSON array → Record[])
//!     │      ├─ Skip undecodable entries (warn)
//!     │      ├─ Degrade malformed fields to "never matches"
//!     │      └─ Drop repeated ids (first wins)
//!     │
//!     ├──> MultiValue (string | comma-joined string | list)
//!     │      ├─ matches(wanted)  → facet comparisons
//!     │      └─ atoms()          → option extraction
//!     │
//!     └──> FacetIndex (distinct values per primary facet)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use feats_catalog::{Catalog, Facet, FacetIndex};
//!
//! let catalog = Catalog::from_json_str(
//!     r#"[{"id": 1, "name": "Cleave", "category": "Class", "class": "Fighter, Barbarian"}]"#,
//! )
//! .unwrap();
//! let index = FacetIndex::from_records(&catalog);
//! assert_eq!(index.values(Facet::Class), ["Barbarian", "Fighter"]);
//! assert!(catalog.records()[0].class.matches("Fighter "));
//! ```

mod catalog;
mod error;
mod facets;
mod field;
mod record;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use facets::{distinct_values, Facet, FacetIndex};
pub use field::{text_atoms, text_matches, MultiValue};
pub use record::{Record, RecordId, Tier, TierEntry};
