//! Typo-tolerant entity lookup.
//!
//! Transcripts routinely mangle names, so lookups accept an exact id, an exact
//! name, or anything within a normalized edit distance of either.

use super::entity::Identity;
use crate::error::{ProtokollError, Result};
use std::cmp::Ordering;
use tracing::debug;

/// Default minimum similarity for a fuzzy match.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// How a candidate matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    ExactName,
    FuzzyId,
    FuzzyName,
}

#[derive(Debug)]
struct Candidate<'a, T> {
    entity: &'a T,
    score: f64,
    match_type: MatchType,
}

/// Levenshtein edit distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Case-insensitive normalized similarity in `[0, 1]`.
///
/// `1 - distance / max(len)`; two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Find the entity best matching `query` using the default threshold.
pub fn find<'a, T: Identity>(entities: &'a [T], query: &str) -> Result<&'a T> {
    find_with_threshold(entities, query, DEFAULT_THRESHOLD)
}

/// Find the entity best matching `query`.
///
/// An exact id match returns at once. Otherwise exact name matches rank
/// above fuzzy ones, then higher similarity wins, then the smaller id.
pub fn find_with_threshold<'a, T: Identity>(
    entities: &'a [T],
    query: &str,
    threshold: f64,
) -> Result<&'a T> {
    let needle = query.trim().to_lowercase();
    let mut candidates: Vec<Candidate<'a, T>> = Vec::new();

    for entity in entities {
        let id = entity.id().to_lowercase();
        let name = entity.name().to_lowercase();

        if needle == id {
            debug!("Exact id match for '{}'", query);
            return Ok(entity);
        }

        if needle == name {
            candidates.push(Candidate {
                entity,
                score: 1.0,
                match_type: MatchType::ExactName,
            });
        }

        let id_score = similarity(&needle, &id);
        if id_score >= threshold {
            candidates.push(Candidate {
                entity,
                score: id_score,
                match_type: MatchType::FuzzyId,
            });
        }

        let name_score = similarity(&needle, &name);
        if name_score >= threshold {
            candidates.push(Candidate {
                entity,
                score: name_score,
                match_type: MatchType::FuzzyName,
            });
        }
    }

    candidates.sort_by(|a, b| {
        let a_exact = a.match_type == MatchType::ExactName;
        let b_exact = b.match_type == MatchType::ExactName;
        b_exact
            .cmp(&a_exact)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
            .then_with(|| a.entity.id().cmp(b.entity.id()))
    });

    match candidates.first() {
        Some(best) => {
            debug!(
                "Resolved '{}' to '{}' ({:?}, {:.2})",
                query,
                best.entity.id(),
                best.match_type,
                best.score
            );
            Ok(best.entity)
        }
        None => Err(ProtokollError::EntityNotFound {
            query: query.to_string(),
            candidates: entities
                .iter()
                .map(|e| (e.id().to_string(), e.name().to_string()))
                .collect(),
        }),
    }
}
