//! Fixed-capacity sync set pool.
//!
//! An arena of slots with occupancy tags and index handles. Checked index
//! lookup replaces raw-pointer bounds validation: a stale handle either
//! misses the occupancy check or falls outside the arena, never aliasing a
//! reused context silently.

use crate::set::SyncSet;

/// Index handle into the sync set pool.
pub type SyncHandle = u16;

#[derive(Debug, Default)]
struct Slot {
    occupied: bool,
    set: SyncSet,
}

/// Fixed-capacity pool of sync set contexts.
#[derive(Debug)]
pub struct SyncPool {
    slots: Vec<Slot>,
}

impl SyncPool {
    /// Create a pool with all slots free. Allocates once; the slots are
    /// reused for the lifetime of the controller.
    #[must_use]
    pub fn new(capacity: u16) -> Self {
        let mut slots = Vec::with_capacity(usize::from(capacity));
        slots.resize_with(usize::from(capacity), Slot::default);
        Self { slots }
    }

    /// Pool capacity.
    #[must_use]
    pub fn capacity(&self) -> u16 {
        u16::try_from(self.slots.len()).unwrap_or(u16::MAX)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied(&self) -> u16 {
        let n = self.slots.iter().filter(|s| s.occupied).count();
        u16::try_from(n).unwrap_or(u16::MAX)
    }

    /// Acquire a free slot, returning its handle.
    pub fn acquire(&mut self) -> Option<SyncHandle> {
        let (idx, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| !s.occupied)?;
        slot.occupied = true;
        u16::try_from(idx).ok()
    }

    /// Return a slot to the free list. The caller must already have released
    /// every resource the context holds. Returns `false` for an unknown or
    /// already-free handle.
    pub fn release(&mut self, handle: SyncHandle) -> bool {
        match self.slots.get_mut(usize::from(handle)) {
            Some(slot) if slot.occupied => {
                slot.occupied = false;
                true
            }
            _ => false,
        }
    }

    /// Checked lookup of an occupied slot.
    #[must_use]
    pub fn get(&self, handle: SyncHandle) -> Option<&SyncSet> {
        self.slots
            .get(usize::from(handle))
            .filter(|s| s.occupied)
            .map(|s| &s.set)
    }

    /// Checked mutable lookup of an occupied slot.
    pub fn get_mut(&mut self, handle: SyncHandle) -> Option<&mut SyncSet> {
        self.slots
            .get_mut(usize::from(handle))
            .filter(|s| s.occupied)
            .map(|s| &mut s.set)
    }

    /// Lookup that additionally requires the context to be established.
    #[must_use]
    pub fn established(&self, handle: SyncHandle) -> Option<&SyncSet> {
        self.get(handle).filter(|s| s.is_established())
    }

    /// Mutable lookup that additionally requires the context to be
    /// established.
    pub fn established_mut(&mut self, handle: SyncHandle) -> Option<&mut SyncSet> {
        self.get_mut(handle).filter(|s| s.is_established())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_exhausted() {
        let mut pool = SyncPool::new(2);
        assert_eq!(pool.capacity(), 2);

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.occupied(), 2);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_release_and_reuse() {
        let mut pool = SyncPool::new(1);
        let h = pool.acquire().unwrap();
        assert!(pool.release(h));
        assert_eq!(pool.occupied(), 0);

        // Double release is rejected
        assert!(!pool.release(h));

        let h2 = pool.acquire().unwrap();
        assert_eq!(h, h2);
    }

    #[test]
    fn test_checked_lookup() {
        let mut pool = SyncPool::new(2);
        let h = pool.acquire().unwrap();

        assert!(pool.get(h).is_some());
        assert!(pool.get(99).is_none());

        pool.release(h);
        assert!(pool.get(h).is_none());
    }

    #[test]
    fn test_established_filter() {
        let mut pool = SyncPool::new(1);
        let h = pool.acquire().unwrap();
        assert!(pool.established(h).is_none());

        pool.get(h).unwrap().mark_established(4);
        assert!(pool.established(h).is_some());
        assert!(pool.established_mut(h).is_some());
    }
}
