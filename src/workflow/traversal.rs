//! Depth-first walk over the ticket graph.
//!
//! Each key is marked visited before it is fetched, so a ticket reachable
//! through several paths (or through a cycle) is processed once and
//! attributed to whichever ticket reached it first. A failed fetch prunes
//! that branch and the walk carries on elsewhere.

use std::collections::HashSet;

use serde::Serialize;

use crate::cache::CachedFetcher;
use crate::domain::fields::FieldNormalizer;
use crate::domain::hierarchy::HierarchyMap;
use crate::domain::relations::resolve_relations;
use crate::domain::ticket::{TicketDescription, TicketKey};

#[derive(Debug, Clone, Copy)]
pub struct TraversalOptions {
    /// Ask the tracker for tickets whose parent link names the current one.
    pub parent_search: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            parent_search: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TraversalReport {
    pub root: TicketKey,
    pub hierarchy: HierarchyMap,
    /// In visit order.
    #[serde(rename = "tickets")]
    pub descriptions: Vec<TicketDescription>,
    /// Keys dropped because their fetch failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<TicketKey>,
    #[serde(skip)]
    pub fetches: usize,
}

impl TraversalReport {
    #[cfg(test)]
    pub fn description(&self, key: &TicketKey) -> Option<&TicketDescription> {
        self.descriptions.iter().find(|description| &description.key == key)
    }
}

/// State for a single walk. Dropped when the walk ends.
pub struct TraversalSession<'a> {
    fetcher: CachedFetcher<'a>,
    normalizer: FieldNormalizer,
    options: TraversalOptions,
    visited: HashSet<TicketKey>,
    descriptions: Vec<TicketDescription>,
    hierarchy: HierarchyMap,
    pruned: Vec<TicketKey>,
}

impl<'a> TraversalSession<'a> {
    pub fn new(
        fetcher: CachedFetcher<'a>,
        normalizer: FieldNormalizer,
        options: TraversalOptions,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            options,
            visited: HashSet::new(),
            descriptions: Vec::new(),
            hierarchy: HierarchyMap::new(),
            pruned: Vec::new(),
        }
    }

    pub async fn run(mut self, root: TicketKey) -> TraversalReport {
        // Pre-order with an explicit stack: neighbours are pushed in reverse
        // so the first one is explored first, and the visited check happens
        // on pop, which matches the recursive formulation exactly.
        let mut pending: Vec<(TicketKey, Option<TicketKey>)> = vec![(root.clone(), None)];

        while let Some((key, caller)) = pending.pop() {
            if !self.visited.insert(key.clone()) {
                tracing::trace!(ticket = %key, "already visited");
                continue;
            }

            let Some(related) = self.visit(&key, caller.as_ref()).await else {
                continue;
            };

            pending.extend(
                related
                    .into_iter()
                    .rev()
                    .filter(|next| !self.visited.contains(next))
                    .map(|next| (next, Some(key.clone()))),
            );
        }

        tracing::debug!(
            visited = self.visited.len(),
            described = self.descriptions.len(),
            pruned = self.pruned.len(),
            fetches = self.fetcher.fetches(),
            "traversal finished"
        );

        TraversalReport {
            root,
            hierarchy: self.hierarchy,
            descriptions: self.descriptions,
            pruned: self.pruned,
            fetches: self.fetcher.fetches(),
        }
    }

    /// Describes one ticket and returns the neighbours to explore, or `None`
    /// when the ticket could not be read.
    async fn visit(&mut self, key: &TicketKey, caller: Option<&TicketKey>) -> Option<Vec<TicketKey>> {
        let Some(record) = self.fetcher.fetch(key).await else {
            self.pruned.push(key.clone());
            return None;
        };

        let mut description = self.normalizer.describe(key, &record);

        let searched = if self.options.parent_search {
            self.fetcher.search_children(key).await
        } else {
            Vec::new()
        };
        let relations = resolve_relations(&record, key, caller, &searched);
        tracing::debug!(
            ticket = %key,
            parent = ?relations.parent,
            related = relations.related.len(),
            "visited ticket"
        );

        description.parent = relations.parent;
        self.descriptions.push(description);
        self.hierarchy.record(caller, key.clone());

        Some(relations.related)
    }
}
