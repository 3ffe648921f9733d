use crate::error::{CatalogError, Result};
use crate::record::{Record, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Primary filtering dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facet {
    /// Matches `category` exactly
    Type,
    Ancestry,
    Class,
    Tier,
}

impl Facet {
    /// Facets in indicator display order
    pub const ALL: [Facet; 4] = [Facet::Type, Facet::Tier, Facet::Ancestry, Facet::Class];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Facet::Type => "Type",
            Facet::Ancestry => "Ancestry",
            Facet::Class => "Class",
            Facet::Tier => "Tier",
        }
    }

    /// Whether a record carries `wanted` in this facet
    #[must_use]
    pub fn matches(self, record: &Record, wanted: &str) -> bool {
        match self {
            Facet::Type => record.category_is(wanted),
            Facet::Ancestry => record.ancestry.matches(wanted),
            Facet::Class => record.class.matches(wanted),
            Facet::Tier => record.has_any_tier([wanted]),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "type" | "category" => Ok(Facet::Type),
            "ancestry" => Ok(Facet::Ancestry),
            "class" => Ok(Facet::Class),
            "tier" => Ok(Facet::Tier),
            other => Err(CatalogError::UnknownFacet(other.to_string())),
        }
    }
}

/// Sorted distinct atomic values of `facet` across `records`.
///
/// Tier values are ordered canonically rather than alphabetically.
pub fn distinct_values<'a, I>(records: I, facet: Facet) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    match facet {
        Facet::Type => atom_values(records, Record::category_atoms),
        Facet::Ancestry => atom_values(records, |record| record.ancestry.atoms()),
        Facet::Class => atom_values(records, |record| record.class.atoms()),
        Facet::Tier => {
            let tiers: BTreeSet<Tier> = records
                .into_iter()
                .flat_map(|record| record.tiers.iter().map(|entry| entry.tier))
                .collect();
            tiers.into_iter().map(|t| t.as_str().to_string()).collect()
        }
    }
}

fn atom_values<'a, I, F>(records: I, atoms: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&'a Record) -> Vec<&'a str>,
{
    let values: BTreeSet<&str> = records.into_iter().flat_map(atoms).collect();
    values.into_iter().map(str::to_string).collect()
}

/// Read-only lookup of the options each primary facet offers over a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetIndex {
    types: Vec<String>,
    ancestries: Vec<String>,
    classes: Vec<String>,
    tiers: Vec<String>,
}

impl FacetIndex {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        Self {
            types: distinct_values(records.clone(), Facet::Type),
            ancestries: distinct_values(records.clone(), Facet::Ancestry),
            classes: distinct_values(records.clone(), Facet::Class),
            tiers: distinct_values(records, Facet::Tier),
        }
    }

    #[must_use]
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Type => &self.types,
            Facet::Ancestry => &self.ancestries,
            Facet::Class => &self.classes,
            Facet::Tier => &self.tiers,
        }
    }

    #[must_use]
    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        let value = value.trim();
        self.values(facet).iter().any(|v| v == value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Facet::ALL.iter().all(|f| self.values(*f).is_empty())
    }
}
