//! Reuse-before-allocate storage for high-churn entities
//!
//! Slots are addressed by generational handles: releasing a slot bumps its
//! generation, so a handle held past release never resolves again.

use std::fmt::Debug;

/// An entity that can live in a [`Pool`]
pub trait Poolable {
    /// Instances are only reused for acquisitions of the same kind
    type Kind: Copy + Eq + Debug;
    /// Per-acquisition initial values
    type Params;

    fn create(kind: Self::Kind, params: Self::Params) -> Self;
    fn kind(&self) -> Self::Kind;
    /// Restore every mutable field from `params`
    fn reset(&mut self, params: Self::Params);
    /// Free anything the instance owns; called exactly once per instance
    fn dispose(&mut self) {}
}

/// Stable reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

/// Lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Active,
    /// Parked on the free list, ready for reuse
    Pooled,
    /// Instance dropped, slot storage may be recycled
    Disposed,
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: u64,
    pub reused: u64,
    pub disposed: u64,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    state: SlotState,
    item: Option<T>,
}

#[derive(Debug)]
pub struct Pool<T: Poolable> {
    slots: Vec<Slot<T>>,
    /// Pooled slots holding a reusable instance
    free: Vec<u32>,
    /// Disposed slots whose storage can take a new instance
    vacant: Vec<u32>,
    max_retained: usize,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    /// Pool retaining at most `max_retained` inactive instances
    pub fn new(max_retained: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::with_capacity(max_retained),
            vacant: Vec::new(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Take an inactive instance of `kind` or build a new one
    pub fn acquire(&mut self, kind: T::Kind, params: T::Params) -> Handle {
        let reusable = self.free.iter().rposition(|&i| {
            self.slots[i as usize]
                .item
                .as_ref()
                .is_some_and(|item| item.kind() == kind)
        });

        if let Some(pos) = reusable {
            let index = self.free.remove(pos);
            let slot = &mut self.slots[index as usize];
            if let Some(item) = slot.item.as_mut() {
                item.reset(params);
            }
            slot.state = SlotState::Active;
            self.stats.reused += 1;
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let item = T::create(kind, params);
        self.stats.allocated += 1;

        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.item = Some(item);
            slot.state = SlotState::Active;
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            state: SlotState::Active,
            item: Some(item),
        });
        Handle { index, generation: 0 }
    }

    /// Deactivate a live handle. Returns false for stale or unknown handles.
    pub fn release(&mut self, handle: Handle) -> bool {
        let retain = self.free.len() < self.max_retained;
        let Some(slot) = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.state == SlotState::Active)
        else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);

        if retain {
            slot.state = SlotState::Pooled;
            self.free.push(handle.index);
        } else {
            if let Some(mut item) = slot.item.take() {
                item.dispose();
            }
            slot.state = SlotState::Disposed;
            self.vacant.push(handle.index);
            self.stats.disposed += 1;
        }
        true
    }

    fn live_slot_mut(&mut self, handle: Handle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.state == SlotState::Active)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.state == SlotState::Active)
            .and_then(|s| s.item.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.live_slot_mut(handle).and_then(|s| s.item.as_mut())
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// State of the slot a handle points at (regardless of generation)
    pub fn slot_state(&self, handle: Handle) -> Option<SlotState> {
        self.slots.get(handle.index as usize).map(|s| s.state)
    }

    /// Live handles in slot order
    pub fn active_handles(&self) -> Vec<Handle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Live instances in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match (&s.state, &s.item) {
            (SlotState::Active, Some(item)) => Some((
                Handle {
                    index: i as u32,
                    generation: s.generation,
                },
                item,
            )),
            _ => None,
        })
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state == SlotState::Active).count()
    }

    /// Inactive instances waiting for reuse
    pub fn retained_count(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Dispose every instance, live or pooled. Outstanding handles go stale.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(mut item) = slot.item.take() {
                item.dispose();
                self.stats.disposed += 1;
            }
            if slot.state != SlotState::Disposed {
                slot.generation = slot.generation.wrapping_add(1);
                slot.state = SlotState::Disposed;
                self.vacant.push(i as u32);
            }
        }
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Test entity that counts its own disposals
    #[derive(Debug)]
    struct Probe {
        kind: u8,
        value: u32,
        disposals: Rc<Cell<u32>>,
    }

    impl Poolable for Probe {
        type Kind = u8;
        type Params = (u32, Rc<Cell<u32>>);

        fn create(kind: u8, (value, disposals): Self::Params) -> Self {
            Self { kind, value, disposals }
        }

        fn kind(&self) -> u8 {
            self.kind
        }

        fn reset(&mut self, (value, disposals): Self::Params) {
            self.value = value;
            self.disposals = disposals;
        }

        fn dispose(&mut self) {
            self.disposals.set(self.disposals.get() + 1);
        }
    }

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn test_acquire_reuses_released_instance() {
        let mut pool: Pool<Probe> = Pool::new(4);
        let a = pool.acquire(1, (10, counter()));
        assert!(pool.release(a));
        assert_eq!(pool.retained_count(), 1);

        let b = pool.acquire(1, (20, counter()));
        assert_eq!(pool.stats().allocated, 1);
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.get(b).map(|p| p.value), Some(20));
        // The old handle no longer resolves to the reused instance
        assert!(pool.get(a).is_none());
    }

    #[test]
    fn test_kind_mismatch_allocates() {
        let mut pool: Pool<Probe> = Pool::new(4);
        let a = pool.acquire(1, (0, counter()));
        pool.release(a);
        pool.acquire(2, (0, counter()));
        assert_eq!(pool.stats().allocated, 2);
        assert_eq!(pool.retained_count(), 1);
    }

    #[test]
    fn test_release_beyond_capacity_disposes() {
        let disposals = counter();
        let mut pool: Pool<Probe> = Pool::new(1);
        let a = pool.acquire(1, (0, disposals.clone()));
        let b = pool.acquire(1, (0, disposals.clone()));

        assert!(pool.release(a));
        assert_eq!(pool.slot_state(a), Some(SlotState::Pooled));
        assert!(pool.release(b));
        assert_eq!(pool.slot_state(b), Some(SlotState::Disposed));
        assert_eq!(disposals.get(), 1);

        // Double release is a no-op
        assert!(!pool.release(b));
        assert_eq!(disposals.get(), 1);
    }

    #[test]
    fn test_clear_disposes_everything_once() {
        let disposals = counter();
        let mut pool: Pool<Probe> = Pool::new(2);
        let a = pool.acquire(1, (0, disposals.clone()));
        let _b = pool.acquire(1, (0, disposals.clone()));
        pool.release(a);

        pool.clear();
        assert_eq!(disposals.get(), 2);
        assert_eq!(pool.active_count(), 0);
        pool.clear();
        assert_eq!(disposals.get(), 2);
    }

    #[test]
    fn test_iteration_in_slot_order() {
        let mut pool: Pool<Probe> = Pool::new(4);
        let handles: Vec<_> = (0..3).map(|v| pool.acquire(1, (v, counter()))).collect();
        pool.release(handles[1]);
        let values: Vec<u32> = pool.iter().map(|(_, p)| p.value).collect();
        assert_eq!(values, vec![0, 2]);
        assert_eq!(pool.active_handles(), vec![handles[0], handles[2]]);
    }

    proptest! {
        /// Random acquire/release sequences: reuse whenever possible, dispose
        /// each instance at most once, and never exceed the retention cap.
        #[test]
        fn prop_pool_lifecycle(ops in prop::collection::vec((any::<bool>(), 0u8..2), 1..200)) {
            let disposals = counter();
            let mut pool: Pool<Probe> = Pool::new(3);
            let mut live: Vec<Handle> = Vec::new();

            for (acquire, kind) in ops {
                if acquire || live.is_empty() {
                    let before = pool.stats();
                    let had_same_kind = pool
                        .free
                        .iter()
                        .any(|&i| pool.slots[i as usize].item.as_ref().is_some_and(|p| p.kind == kind));
                    live.push(pool.acquire(kind, (0, disposals.clone())));
                    let after = pool.stats();
                    if had_same_kind {
                        prop_assert_eq!(after.allocated, before.allocated);
                    } else {
                        prop_assert_eq!(after.allocated, before.allocated + 1);
                    }
                } else {
                    let handle = live.remove(0);
                    prop_assert!(pool.release(handle));
                    prop_assert!(!pool.release(handle));
                }
                prop_assert!(pool.retained_count() <= 3);
                prop_assert_eq!(pool.active_count(), live.len());
            }

            let stats = pool.stats();
            prop_assert_eq!(u64::from(disposals.get()), stats.disposed);
            prop_assert!(stats.disposed <= stats.allocated);
        }
    }
}
