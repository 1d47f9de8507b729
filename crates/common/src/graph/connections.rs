//! Connection deriver
//!
//! Compares every publication with the neighbors that follow it in store
//! order and emits one edge per matching heuristic. The neighbor window
//! bounds the work to O(n * window); pairs further apart are never compared.

use crate::db::models::{ConnectionType, PublicationConnection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Records compared per publication, counting the publication itself
pub const DEFAULT_WINDOW: usize = 20;

/// Shared keyword count at which keyword strength reaches 1.0
pub const KEYWORD_SATURATION: f64 = 5.0;

/// Strength of a shared-organism edge, independent of overlap size
pub const ORGANISM_STRENGTH: f64 = 0.8;

/// Strength of a same-research-area edge
pub const RESEARCH_AREA_STRENGTH: f64 = 0.5;

/// The slice of a publication the deriver looks at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInput {
    pub id: Uuid,
    pub keywords: Vec<String>,
    pub organisms: Vec<String>,
    pub research_area: Option<String>,
}

/// Edge produced by the deriver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedConnection {
    pub source_publication_id: Uuid,
    pub target_publication_id: Uuid,
    pub connection_type: ConnectionType,
    pub strength: f64,
}

impl DerivedConnection {
    fn new(source: Uuid, target: Uuid, connection_type: ConnectionType, strength: f64) -> Self {
        Self {
            source_publication_id: source,
            target_publication_id: target,
            connection_type,
            strength: clamp_strength(strength),
        }
    }

    /// Materialize the stored row with a fresh id
    pub fn into_model(self, now: chrono::DateTime<chrono::Utc>) -> PublicationConnection {
        PublicationConnection {
            id: Uuid::now_v7(),
            source_publication_id: self.source_publication_id,
            target_publication_id: self.target_publication_id,
            connection_type: self.connection_type.into(),
            strength: self.strength,
            created_at: now.into(),
        }
    }
}

/// Clamp a heuristic score into [0, 1]. NaN collapses to 0.
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    }
}

/// Derive connections for `records` in their given order.
///
/// Record `i` is paired with every `j` such that `i < j < i + window`.
/// Per pair, in this order:
/// - `shared_keywords` when at least one keyword of `i` appears in `j`,
///   strength `min(shared / 5, 1)`
/// - `shared_organism` when any organism overlaps, strength 0.8
/// - `same_research_area` when both areas are present and equal, strength 0.5
pub fn derive_connections(records: &[ConnectionInput], window: usize) -> Vec<DerivedConnection> {
    let keyword_sets: Vec<HashSet<&str>> = records
        .iter()
        .map(|r| r.keywords.iter().map(String::as_str).collect())
        .collect();
    let organism_sets: Vec<HashSet<&str>> = records
        .iter()
        .map(|r| r.organisms.iter().map(String::as_str).collect())
        .collect();

    let mut connections = Vec::new();

    for (i, source) in records.iter().enumerate() {
        let end = records.len().min(i.saturating_add(window));

        for j in (i + 1)..end {
            let target = &records[j];

            // Counted from the source side, so duplicate source keywords count twice
            let shared_keywords = source
                .keywords
                .iter()
                .filter(|k| keyword_sets[j].contains(k.as_str()))
                .count();

            if shared_keywords > 0 {
                connections.push(DerivedConnection::new(
                    source.id,
                    target.id,
                    ConnectionType::SharedKeywords,
                    shared_keywords as f64 / KEYWORD_SATURATION,
                ));
            }

            if !organism_sets[i].is_disjoint(&organism_sets[j]) {
                connections.push(DerivedConnection::new(
                    source.id,
                    target.id,
                    ConnectionType::SharedOrganism,
                    ORGANISM_STRENGTH,
                ));
            }

            let same_area = matches!(
                (source.research_area.as_deref(), target.research_area.as_deref()),
                (Some(a), Some(b)) if !a.is_empty() && a == b
            );
            if same_area {
                connections.push(DerivedConnection::new(
                    source.id,
                    target.id,
                    ConnectionType::SameResearchArea,
                    RESEARCH_AREA_STRENGTH,
                ));
            }
        }
    }

    connections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(keywords: &[&str], organisms: &[&str], area: Option<&str>) -> ConnectionInput {
        ConnectionInput {
            id: Uuid::now_v7(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            organisms: organisms.iter().map(|s| s.to_string()).collect(),
            research_area: area.map(str::to_string),
        }
    }

    #[test]
    fn test_three_shared_keywords() {
        let records = vec![
            record(&["bone", "muscle", "radiation", "iss"], &[], None),
            record(&["radiation", "muscle", "bone", "plants"], &[], None),
        ];

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].connection_type, ConnectionType::SharedKeywords);
        assert!((edges[0].strength - 0.6).abs() < 1e-9);
        assert_eq!(edges[0].source_publication_id, records[0].id);
        assert_eq!(edges[0].target_publication_id, records[1].id);
    }

    #[test]
    fn test_keyword_strength_saturates() {
        let shared = ["a", "b", "c", "d", "e", "f", "g"];
        let records = vec![record(&shared, &[], None), record(&shared, &[], None)];

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].strength, 1.0);
    }

    #[test]
    fn test_organism_strength_ignores_overlap_size() {
        let records = vec![
            record(&[], &["Mus musculus", "Arabidopsis thaliana"], None),
            record(&[], &["Mus musculus", "Arabidopsis thaliana"], None),
            record(&[], &["Mus musculus"], None),
        ];

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert_eq!(edges.len(), 3);
        assert!(edges
            .iter()
            .all(|e| e.connection_type == ConnectionType::SharedOrganism && e.strength == 0.8));
    }

    #[test]
    fn test_same_research_area_only() {
        let records = vec![
            record(&["x"], &["Homo sapiens"], Some("Plant Biology")),
            record(&["y"], &["Danio rerio"], Some("Plant Biology")),
        ];

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].connection_type, ConnectionType::SameResearchArea);
        assert_eq!(edges[0].strength, 0.5);
    }

    #[test]
    fn test_empty_research_area_does_not_match() {
        let records = vec![
            record(&[], &[], Some("")),
            record(&[], &[], Some("")),
            record(&[], &[], None),
            record(&[], &[], None),
        ];

        assert!(derive_connections(&records, DEFAULT_WINDOW).is_empty());
    }

    #[test]
    fn test_edge_types_coexist_in_order() {
        let records = vec![
            record(&["microgravity"], &["Mus musculus"], Some("Human Health")),
            record(&["microgravity"], &["Mus musculus"], Some("Human Health")),
        ];

        let kinds: Vec<_> = derive_connections(&records, DEFAULT_WINDOW)
            .into_iter()
            .map(|e| e.connection_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ConnectionType::SharedKeywords,
                ConnectionType::SharedOrganism,
                ConnectionType::SameResearchArea,
            ]
        );
    }

    #[test]
    fn test_window_limits_reach() {
        // 21 records with one shared area: record 0 reaches records 1..=19 only
        let records: Vec<_> = (0..21).map(|_| record(&[], &[], Some("Genomics"))).collect();

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        let from_first = edges
            .iter()
            .filter(|e| e.source_publication_id == records[0].id)
            .count();
        assert_eq!(from_first, 19);
        assert!(!edges.iter().any(|e| {
            e.source_publication_id == records[0].id && e.target_publication_id == records[20].id
        }));
    }

    #[test]
    fn test_no_self_loops_and_strength_bounds() {
        let records: Vec<_> = (0..30)
            .map(|i| {
                let kw = format!("k{}", i % 3);
                record(&[kw.as_str(), "shared", "shared"], &["Mus musculus"], Some("Area"))
            })
            .collect();

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert!(!edges.is_empty());
        for edge in &edges {
            assert_ne!(edge.source_publication_id, edge.target_publication_id);
            assert!((0.0..=1.0).contains(&edge.strength));
        }
    }

    #[test]
    fn test_duplicate_source_keywords_count_twice() {
        let records = vec![
            record(&["bone", "bone"], &[], None),
            record(&["bone"], &[], None),
        ];

        let edges = derive_connections(&records, DEFAULT_WINDOW);
        assert!((edges[0].strength - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_windows() {
        let records = vec![record(&["a"], &[], None), record(&["a"], &[], None)];
        assert!(derive_connections(&records, 0).is_empty());
        assert!(derive_connections(&records, 1).is_empty());
        assert_eq!(derive_connections(&records, 2).len(), 1);
        assert!(derive_connections(&[], DEFAULT_WINDOW).is_empty());
    }

    #[test]
    fn test_clamp_strength() {
        assert_eq!(clamp_strength(1.4), 1.0);
        assert_eq!(clamp_strength(-0.2), 0.0);
        assert_eq!(clamp_strength(f64::NAN), 0.0);
        assert_eq!(clamp_strength(0.25), 0.25);
    }
}
