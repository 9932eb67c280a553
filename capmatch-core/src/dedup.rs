//! Collapsing of candidates that describe the same caption
//!
//! Candidates sharing `(kind, number_key)` whose source blocks lie within
//! `max_distance` positions of each other form one cluster. Clustering is
//! chained in document order: a candidate joins the open cluster of its key
//! when it is within `max_distance` of the cluster's last member. A run of
//! repeats one block apart therefore collapses into a single cluster even if
//! its ends lie further apart than `max_distance`. Each cluster keeps a
//! single winner, and any two winners of one key are more than
//! `max_distance` blocks apart.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{CaptionCandidate, Kind};

/// Default block distance within which equal captions are merged
pub const DEFAULT_DEDUP_DISTANCE: usize = 1;

/// Rank two candidates of one cluster; `Greater` means `a` wins.
///
/// Higher specificity first, then the longer label, then the earlier
/// occurrence.
pub fn compare_candidates(a: &CaptionCandidate, b: &CaptionCandidate) -> Ordering {
    a.specificity
        .total_cmp(&b.specificity)
        .then_with(|| a.label_chars().cmp(&b.label_chars()))
        .then_with(|| {
            (b.position(), b.span.start).cmp(&(a.position(), a.span.start))
        })
}

struct Cluster {
    winner: CaptionCandidate,
    last_position: usize,
}

/// Removes duplicate caption candidates
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    max_distance: usize,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_DISTANCE)
    }
}

impl Deduplicator {
    /// Merge candidates whose blocks are at most `max_distance` apart
    pub fn new(max_distance: usize) -> Self {
        Self { max_distance }
    }

    /// Configured merge distance
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Keep one winner per cluster, returned in document order
    pub fn dedup(&self, mut candidates: Vec<CaptionCandidate>) -> Vec<CaptionCandidate> {
        candidates.sort_by_key(|c| (c.position(), c.span.start));

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut open: HashMap<(Kind, String), usize> = HashMap::new();

        for candidate in candidates {
            let key = (candidate.kind, candidate.number_key());
            let position = candidate.position();

            match open.get(&key).copied() {
                Some(id) if position - clusters[id].last_position <= self.max_distance => {
                    let cluster = &mut clusters[id];
                    cluster.last_position = position;
                    if compare_candidates(&candidate, &cluster.winner) == Ordering::Greater {
                        log::trace!(
                            "dedup: {} {} at block {} replaces block {}",
                            candidate.kind,
                            candidate.number,
                            position,
                            cluster.winner.position()
                        );
                        cluster.winner = candidate;
                    }
                }
                _ => {
                    open.insert(key, clusters.len());
                    clusters.push(Cluster {
                        winner: candidate,
                        last_position: position,
                    });
                }
            }
        }

        let mut winners: Vec<CaptionCandidate> = clusters.into_iter().map(|c| c.winner).collect();
        winners.sort_by_key(|c| (c.position(), c.span.start));
        winners
    }
}
