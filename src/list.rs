//! Arena-backed doubly linked recency list.
//!
//! Entries live in a slab of slots addressed by index; `prev`/`next` are slot
//! indices rather than pointers, and freed slots are recycled through a free
//! list. A [`Handle`] pairs a slot index with the generation the slot had
//! when the value was inserted, so a handle to a removed entry can be
//! detected cheaply: removal bumps the slot generation, and every operation
//! on a stale handle is a no-op. This is what makes deletion idempotent when
//! the background sweep races a foreground removal of the same node.

use core::fmt;

/// Index value used for absent links (empty head/tail, list endpoints).
const NIL: u32 = u32::MAX;

/// A stable reference to a list entry.
///
/// Valid until the entry it names is removed; after that every list
/// operation taking the handle returns `None`/`false`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Handle {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
    prev: u32,
    next: u32,
}

/// Doubly linked list ordered from most- to least-recently touched.
///
/// `push_front` and `move_to_front` maintain the recency order; `tail` is
/// always the coldest live entry.
pub(crate) struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    len: usize,
}

impl<T> RecencyList<T> {
    pub(crate) fn new() -> Self {
        RecencyList {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, handle: Handle) -> Option<&Slot<T>> {
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation && slot.value.is_some()).then_some(slot)
    }

    /// Returns true if `handle` still names a live entry.
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.slot(handle).is_some()
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle)?.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    fn handle_at(&self, index: u32) -> Option<Handle> {
        if index == NIL {
            return None;
        }
        let slot = self.slots.get(index as usize)?;
        slot.value.as_ref()?;
        Some(Handle {
            index,
            generation: slot.generation,
        })
    }

    /// Most recently touched entry.
    pub(crate) fn head(&self) -> Option<Handle> {
        self.handle_at(self.head)
    }

    /// Least recently touched entry.
    pub(crate) fn tail(&self) -> Option<Handle> {
        self.handle_at(self.tail)
    }

    /// Neighbor toward the head, or `None` for the head itself or a stale
    /// handle.
    pub(crate) fn prev(&self, handle: Handle) -> Option<Handle> {
        let slot = self.slot(handle)?;
        self.handle_at(slot.prev)
    }

    /// Neighbor toward the tail, or `None` for the tail itself or a stale
    /// handle.
    pub(crate) fn next(&self, handle: Handle) -> Option<Handle> {
        let slot = self.slot(handle)?;
        self.handle_at(slot.next)
    }

    fn link_front(&mut self, index: u32) {
        let old_head = self.head;
        {
            let slot = &mut self.slots[index as usize];
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head == NIL {
            self.tail = index;
        } else {
            self.slots[old_head as usize].prev = index;
        }
        self.head = index;
    }

    fn unlink(&mut self, index: u32) {
        let (prev, next) = {
            let slot = &self.slots[index as usize];
            (slot.prev, slot.next)
        };
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next as usize].prev = prev;
        }
        let slot = &mut self.slots[index as usize];
        slot.prev = NIL;
        slot.next = NIL;
    }

    /// Inserts `value` at the head and returns its handle.
    pub(crate) fn push_front(&mut self, value: T) -> Handle {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            }
            None => {
                debug_assert!(self.slots.len() < NIL as usize);
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                    prev: NIL,
                    next: NIL,
                });
                #[allow(clippy::cast_possible_truncation)]
                let index = (self.slots.len() - 1) as u32;
                index
            }
        };
        self.link_front(index);
        self.len += 1;
        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Moves a live entry to the head. Returns false for a stale handle.
    pub(crate) fn move_to_front(&mut self, handle: Handle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        if self.head == handle.index {
            return true;
        }
        self.unlink(handle.index);
        self.link_front(handle.index);
        true
    }

    /// Unlinks and returns the entry, or `None` if the handle is stale.
    ///
    /// The slot generation is bumped here, invalidating every outstanding
    /// handle to this entry; removing the same logical entry twice is safe.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
        self.slot(handle)?;
        self.unlink(handle.index);
        let slot = &mut self.slots[handle.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        let value = slot.value.take();
        self.free.push(handle.index);
        self.len -= 1;
        value
    }

    /// Iterates values from head (most recent) to tail.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for RecencyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyList")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Head-to-tail iterator over list values.
pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: u32,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 || self.cursor == NIL {
            return None;
        }
        let slot = self.list.slots.get(self.cursor as usize)?;
        self.cursor = slot.next;
        self.remaining -= 1;
        slot.value.as_ref()
    }
}
