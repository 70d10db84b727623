//! Connection-reference sets.
//!
//! A [`ConnectionRefs`] lists which slots of one registry are currently part of
//! a connection. It owns no slots, only their ids, so removing an entry never
//! destroys a slot. Counts are O(1) and independent of how many slots are
//! declared.

use crate::slot::SlotId;

/// Ids of the connected slots of one registry, in connection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRefs {
    ids: Vec<SlotId>,
}

impl ConnectionRefs {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as connected. Returns `false` if it already was.
    pub fn add(&mut self, id: SlotId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Forget `id`. Returns `false` if it was not recorded.
    pub fn remove(&mut self, id: SlotId) -> bool {
        match self.ids.iter().position(|&x| x == id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns true if `id` is recorded as connected.
    pub fn contains(&self, id: SlotId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of connected slots.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no slot is connected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Connected slot ids, oldest connection first.
    pub fn ids(&self) -> &[SlotId] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_duplicates() {
        let mut refs = ConnectionRefs::new();
        assert!(refs.add(SlotId(1)));
        assert!(!refs.add(SlotId(1)));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn remove_rejects_absent() {
        let mut refs = ConnectionRefs::new();
        assert!(!refs.remove(SlotId(3)));
        refs.add(SlotId(3));
        assert!(refs.remove(SlotId(3)));
        assert!(refs.is_empty());
    }

    #[test]
    fn keeps_connection_order() {
        let mut refs = ConnectionRefs::new();
        for id in [4, 2, 7] {
            refs.add(SlotId(id));
        }
        refs.remove(SlotId(2));
        assert_eq!(refs.ids(), &[SlotId(4), SlotId(7)]);
        assert!(refs.contains(SlotId(7)));
        assert!(!refs.contains(SlotId(2)));
    }
}
