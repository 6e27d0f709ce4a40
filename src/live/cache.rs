//! Per-tree cache of materialized live nodes.

use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, PoisonError};

use super::{LiveNode, TypeRegistry};
use crate::error::Result;
use crate::stub::{NodeId, StubRef};

/// One slot per stub node plus a lock scoped to the owning tree.
///
/// Slots go from empty to populated exactly once. Reads of a populated slot
/// never take the lock.
pub struct MaterializationCache {
    slots: Box<[OnceCell<Arc<LiveNode>>]>,
    lock: Mutex<()>,
}

impl MaterializationCache {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceCell::new()).collect(),
            lock: Mutex::new(()),
        }
    }

    pub fn cached(&self, id: NodeId) -> Option<Arc<LiveNode>> {
        self.slots.get(id.index())?.get().cloned()
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// Return the slot's live node, running the registry factory if the slot
    /// is empty.
    ///
    /// The factory runs while this tree's lock is held, so it must not
    /// materialize other nodes of the same tree.
    pub(crate) fn get_or_materialize(
        &self,
        stub: StubRef<'_>,
        registry: &TypeRegistry,
    ) -> Result<Arc<LiveNode>> {
        let slot = &self.slots[stub.id().index()];
        if let Some(live) = slot.get() {
            return Ok(Arc::clone(live));
        }

        // A panicking factory leaves its slot empty, so the guarded state is
        // still consistent after poisoning.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(live) = slot.get() {
            return Ok(Arc::clone(live));
        }

        let live = Arc::new(registry.materialize(stub)?);
        tracing::trace!(id = %stub.id(), kind = %stub.kind(), "materialized stub");
        Ok(Arc::clone(slot.get_or_init(|| live)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::Element;
    use crate::stub::{Payload, StubEntry, StubKind, StubTree};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tree() -> StubTree {
        StubTree::build(&[
            StubEntry::new(StubKind::File, Payload::new("a.go"), 0),
            StubEntry::new(StubKind::Function, Payload::new("main"), 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = TypeRegistry::builder()
            .register(StubKind::Function, move |stub| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Element::Callable {
                    name: stub.name().to_string(),
                    receiver: None,
                    visibility: None,
                })
            })
            .build();

        let tree = tree();
        let id = tree.nodes_of_type(StubKind::Function)[0];
        assert!(tree.cached_live(id).is_none());

        let first = tree.get_live(id, &registry).unwrap();
        let second = tree.get_live(id, &registry).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tree.materialized_count(), 1);
        assert!(Arc::ptr_eq(&tree.cached_live(id).unwrap(), &first));
    }

    #[test]
    fn test_failed_factory_leaves_slot_empty() {
        let registry = TypeRegistry::builder()
            .register(StubKind::Function, |_| anyhow::bail!("unreadable payload"))
            .build();

        let tree = tree();
        let id = tree.nodes_of_type(StubKind::Function)[0];
        assert!(tree.get_live(id, &registry).is_err());
        assert!(tree.cached_live(id).is_none());

        // A correct registry can still populate the slot afterwards.
        assert!(tree.get_live(id, TypeRegistry::standard()).is_ok());
        assert!(tree.cached_live(id).is_some());
    }
}
