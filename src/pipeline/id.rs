//! Identity types for the pipeline system.
//!
//! `NodeId` is a newtype over `u32` that serves as a direct index into the
//! registry's slot vector. Re-registering a name keeps its slot, so an id stays
//! valid for the pipeline's lifetime.

use std::fmt;

/// Index into `NodeRegistry::nodes`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        NodeId(index as u32)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::from_index(42), id);
    }

    #[test]
    fn test_node_id_ordering_follows_slots() {
        assert!(NodeId::from_index(1) < NodeId::from_index(2));
        assert_eq!(format!("{}", NodeId(3)), "NodeId(3)");
    }
}
