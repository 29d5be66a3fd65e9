//! # Group Arena
//!
//! Growable slot allocator for spatial groups. Groups reference each other
//! (parent, children) by [`GroupId`] instead of pointers.
//!
//! A slot carries a generation that bumps on every free, so a handle kept
//! across a prune resolves to `None` instead of to whichever group reused
//! the slot.
//!
//! # Thread Safety
//!
//! NOT thread-safe. Owned by a single partition on the main thread.

use std::fmt;

/// Handle to a group in an arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId {
    index: u32,
    generation: u32,
}

impl GroupId {
    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot allocator with a free list.
#[derive(Debug)]
pub struct GroupArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    allocated_count: usize,
}

impl<T> GroupArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new(), free_list: Vec::new(), allocated_count: 0 }
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.allocated_count
    }

    /// True when nothing is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Stores a value built from its own handle.
    ///
    /// Reuses a freed slot when one is available. O(1) amortized.
    pub fn allocate_with<F>(&mut self, build: F) -> GroupId
    where
        F: FnOnce(GroupId) -> T,
    {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot { generation: 0, value: None });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = GroupId { index, generation: slot.generation };
        slot.value = Some(build(id));
        self.allocated_count += 1;
        id
    }

    /// Frees a value. Returns it, or `None` for a stale handle.
    pub fn free(&mut self, id: GroupId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.allocated_count -= 1;
        Some(value)
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// True if the handle refers to a live value.
    #[must_use]
    pub fn contains(&self, id: GroupId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates live values with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (GroupId { index: i as u32, generation: slot.generation }, v))
        })
    }

    /// Iterates live values mutably, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (GroupId, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(move |v| (GroupId { index: i as u32, generation }, v))
        })
    }
}

impl<T> Default for GroupArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free() {
        let mut arena: GroupArena<u32> = GroupArena::new();
        let a = arena.allocate_with(|_| 1);
        let b = arena.allocate_with(|_| 2);

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&1));
        assert_eq!(arena.free(a), Some(1));
        assert_eq!(arena.free(a), None);
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn test_debug_shows_live_values() {
        let mut arena: GroupArena<u32> = GroupArena::new();
        arena.allocate_with(|_| 7);
        let printed = format!("{arena:?}");
        assert!(printed.contains("GroupArena"));
        assert!(printed.contains('7'));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena: GroupArena<&str> = GroupArena::new();
        let old = arena.allocate_with(|_| "old");
        arena.free(old);
        let new = arena.allocate_with(|_| "new");

        // Same slot, different generation.
        assert_eq!(old.index(), new.index());
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&"new"));
    }

    #[test]
    fn test_builder_sees_own_id() {
        let mut arena: GroupArena<GroupId> = GroupArena::new();
        let id = arena.allocate_with(|id| id);
        assert_eq!(arena.get(id), Some(&id));
    }
}
