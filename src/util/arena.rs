use alloc::vec::Vec;
use core::num::NonZeroUsize;

/// Error value indicating that every slot of the arena is occupied.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ArenaFull;

/// An occupied arena slot.
#[derive(Debug)]
pub struct Entry<T> {
    pub value: T,
    id: NonZeroUsize,
    generation: usize,
    live: bool,
}

impl<T> Entry<T> {
    /// Whether the entry has not been retired yet.
    #[cfg(test)]
    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// Fixed-capacity arena handing out dense, generation-tagged ids.
///
/// Slot `idx` on its `gen`-th use is assigned id `gen * capacity + idx + 1`,
/// so an id maps back to its slot with a single modulo, and ids are never
/// reused. Retired entries stay in place (and stay queryable) until their slot
/// is claimed again.
///
/// Slots are claimed round-robin starting after the most recently claimed
/// slot.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Option<Entry<T>>>,
    cursor: usize,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Arena { slots, cursor: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot holds a live entry.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|e| matches!(e, Some(e) if e.live))
    }

    /// Claim a free (never used or retired) slot for `value`.
    pub fn insert(&mut self, value: T) -> Result<NonZeroUsize, ArenaFull> {
        let capacity = self.capacity();
        let idx = (0..capacity)
            .map(|i| (self.cursor + i) % capacity)
            .find(|&idx| !matches!(&self.slots[idx], Some(e) if e.live))
            .ok_or(ArenaFull)?;

        let generation = match &self.slots[idx] {
            Some(e) => e.generation + 1,
            None => 0,
        };
        let id = generation
            .checked_mul(capacity)
            .and_then(|n| n.checked_add(idx + 1))
            .and_then(NonZeroUsize::new)
            .ok_or(ArenaFull)?;

        self.slots[idx] = Some(Entry {
            value,
            id,
            generation,
            live: true,
        });
        self.cursor = (idx + 1) % capacity;
        Ok(id)
    }

    fn index_of(&self, id: NonZeroUsize) -> Option<usize> {
        match self.capacity() {
            0 => None,
            capacity => Some((id.get() - 1) % capacity),
        }
    }

    /// Look up an entry (live or retired) by id.
    pub fn entry(&self, id: NonZeroUsize) -> Option<&Entry<T>> {
        let idx = self.index_of(id)?;
        self.slots[idx].as_ref().filter(|e| e.id == id)
    }

    /// Look up a live entry by id.
    pub fn get(&self, id: NonZeroUsize) -> Option<&T> {
        self.entry(id).filter(|e| e.live).map(|e| &e.value)
    }

    /// Look up a live entry by id.
    pub fn get_mut(&mut self, id: NonZeroUsize) -> Option<&mut T> {
        let idx = self.index_of(id)?;
        self.slots[idx]
            .as_mut()
            .filter(|e| e.id == id && e.live)
            .map(|e| &mut e.value)
    }

    /// Retire a live entry, making its slot claimable. Returns `false` if `id`
    /// does not refer to a live entry.
    pub fn retire(&mut self, id: NonZeroUsize) -> bool {
        let idx = match self.index_of(id) {
            Some(idx) => idx,
            None => return false,
        };
        match &mut self.slots[idx] {
            Some(e) if e.id == id && e.live => {
                e.live = false;
                true
            }
            _ => false,
        }
    }

    /// Iterate over live entries, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NonZeroUsize, &T)> {
        self.slots
            .iter()
            .flatten()
            .filter(|e| e.live)
            .map(|e| (e.id, &e.value))
    }

    /// Iterate over live entries, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NonZeroUsize, &mut T)> {
        self.slots
            .iter_mut()
            .flatten()
            .filter(|e| e.live)
            .map(|e| (e.id, &mut e.value))
    }
}
