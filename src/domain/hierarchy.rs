use std::collections::{HashMap, HashSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::ticket::TicketKey;

/// Key used for the "no parent" bucket when the map is serialized.
pub const ROOT_SENTINEL: &str = "(root)";

/// Parent to ordered children, in first-recorded order. A child is placed
/// under at most one parent; later placements are ignored.
#[derive(Debug, Clone, Default)]
pub struct HierarchyMap {
    entries: Vec<(Option<TicketKey>, Vec<TicketKey>)>,
    index: HashMap<Option<TicketKey>, usize>,
    placed: HashSet<TicketKey>,
}

impl HierarchyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `child` under `parent` (`None` for the root bucket). Returns
    /// `false` when the child already has a place.
    pub fn record(&mut self, parent: Option<&TicketKey>, child: TicketKey) -> bool {
        if !self.placed.insert(child.clone()) {
            return false;
        }

        let parent = parent.cloned();
        let position = match self.index.get(&parent) {
            Some(position) => *position,
            None => {
                self.entries.push((parent.clone(), Vec::new()));
                self.index.insert(parent, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[position].1.push(child);
        true
    }

    pub fn children(&self, parent: Option<&TicketKey>) -> &[TicketKey] {
        self.index
            .get(&parent.cloned())
            .map(|position| self.entries[*position].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[TicketKey] {
        self.children(None)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &TicketKey) -> bool {
        self.placed.contains(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (Option<&TicketKey>, &[TicketKey])> {
        self.entries
            .iter()
            .map(|(parent, children)| (parent.as_ref(), children.as_slice()))
    }

    /// Number of parent buckets.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for HierarchyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (parent, children) in self.entries() {
            let key = parent.map(TicketKey::as_str).unwrap_or(ROOT_SENTINEL);
            map.serialize_entry(key, children)?;
        }
        map.end()
    }
}
