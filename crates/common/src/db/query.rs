//! Read-side query types shared by every store

use crate::db::models::Publication;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default page size for publication listings
pub const DEFAULT_LIST_LIMIT: u64 = 50;

/// Largest page a caller may request
pub const MAX_LIST_LIMIT: u64 = 200;

/// Search and filter criteria for the publication listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationQuery {
    /// Case-insensitive substring matched against title or abstract
    pub search: Option<String>,
    /// Inclusive lower bound on year
    pub year_from: Option<i32>,
    /// Inclusive upper bound on year
    pub year_to: Option<i32>,
    /// Match publications studying any of these organisms
    pub organisms: Vec<String>,
    /// Match publications in any of these research areas
    pub research_areas: Vec<String>,
    pub limit: u64,
}

impl Default for PublicationQuery {
    fn default() -> Self {
        Self {
            search: None,
            year_from: None,
            year_to: None,
            organisms: Vec::new(),
            research_areas: Vec::new(),
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl PublicationQuery {
    /// `ILIKE` pattern for the search term, with wildcards escaped
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// In-process evaluation of the same predicate the SQL store applies
    pub fn matches(&self, publication: &Publication) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let in_title = publication.title.to_lowercase().contains(&term);
            let in_abstract = publication
                .abstract_text
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(&term));
            if !in_title && !in_abstract {
                return false;
            }
        }

        if let Some(from) = self.year_from {
            if !publication.year.is_some_and(|y| y >= from) {
                return false;
            }
        }

        if let Some(to) = self.year_to {
            if !publication.year.is_some_and(|y| y <= to) {
                return false;
            }
        }

        if !self.organisms.is_empty()
            && !publication.organisms.iter().any(|o| self.organisms.contains(o))
        {
            return false;
        }

        if !self.research_areas.is_empty()
            && !publication
                .research_area
                .as_ref()
                .is_some_and(|area| self.research_areas.contains(area))
        {
            return false;
        }

        true
    }
}

/// Distinct values available to the listing filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub organisms: Vec<String>,
    pub research_areas: Vec<String>,
    pub experiment_types: Vec<String>,
}

impl FilterOptions {
    /// Collect sorted distinct non-empty values from `(organisms, research_area, experiment_type)` rows
    pub fn collect<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Vec<String>, Option<String>, Option<String>)>,
    {
        let mut organisms = BTreeSet::new();
        let mut research_areas = BTreeSet::new();
        let mut experiment_types = BTreeSet::new();

        for (row_organisms, area, experiment) in rows {
            organisms.extend(row_organisms.into_iter().filter(|o| !o.is_empty()));
            research_areas.extend(area.filter(|a| !a.is_empty()));
            experiment_types.extend(experiment.filter(|e| !e.is_empty()));
        }

        Self {
            organisms: organisms.into_iter().collect(),
            research_areas: research_areas.into_iter().collect(),
            experiment_types: experiment_types.into_iter().collect(),
        }
    }
}
