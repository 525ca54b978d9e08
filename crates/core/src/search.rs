//! In-memory gene ranking.
//!
//! Every gene falls into at most one tier: exact (id or name equals the
//! query), prefix (id or name starts with it) or contains. Comparison is
//! case-insensitive. Results are emitted tier by tier, keeping index order
//! within a tier.

use crate::gene::Gene;

/// Maximum number of options a search returns.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Match tier, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Prefix,
    Contains,
}

/// Classify one gene against an already lower-cased query.
pub fn classify(gene: &Gene, query: &str) -> Option<MatchTier> {
    let id = gene.gene_id.to_lowercase();
    let name = gene.gene_name.to_lowercase();

    if id == query || name == query {
        Some(MatchTier::Exact)
    } else if id.starts_with(query) || name.starts_with(query) {
        Some(MatchTier::Prefix)
    } else if id.contains(query) || name.contains(query) {
        Some(MatchTier::Contains)
    } else {
        None
    }
}

/// Normalise a raw query. Returns `None` when nothing is left to search for.
pub fn normalize_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Rank `genes` against `query`, returning at most `limit` entries.
///
/// The scan stops early once `limit` exact matches have been collected.
pub fn rank_genes<'a>(genes: &'a [Gene], query: &str, limit: usize) -> Vec<&'a Gene> {
    let Some(query) = normalize_query(query) else {
        return Vec::new();
    };
    if limit == 0 {
        return Vec::new();
    }

    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    let mut contains = Vec::new();

    for gene in genes {
        match classify(gene, &query) {
            Some(MatchTier::Exact) => exact.push(gene),
            Some(MatchTier::Prefix) => prefix.push(gene),
            Some(MatchTier::Contains) => contains.push(gene),
            None => {}
        }
        if exact.len() >= limit {
            break;
        }
    }

    exact
        .into_iter()
        .chain(prefix)
        .chain(contains)
        .take(limit)
        .collect()
}
