/// Stable handle into an [`Arena`].
///
/// The generation makes a handle to a removed entry stay dead even after its slot is
/// reused by a later insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

#[derive(Debug)]
struct Entry<T> {
    seq: u64,
    value: T,
}

/// Slot arena with free-list reuse.
///
/// Every insert is stamped with a monotonically increasing sequence number so callers can
/// iterate in insertion order regardless of which slot an entry landed in.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    next_seq: u64,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            next_seq: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, value: T) -> SlotId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;

        let entry = Some(Entry { seq, value });
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            return SlotId {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entry,
        });
        SlotId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(entry.value)
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&T> {
        self.entry(id).map(|e| &e.value)
    }

    pub(crate) fn contains(&self, id: SlotId) -> bool {
        self.entry(id).is_some()
    }

    /// Insertion sequence number of a live entry.
    pub(crate) fn seq(&self, id: SlotId) -> Option<u64> {
        self.entry(id).map(|e| e.seq)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live entries in insertion order.
    pub(crate) fn iter_ordered(&self) -> impl Iterator<Item = (SlotId, &T)> {
        let mut live: Vec<(u64, SlotId, &T)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.entry.as_ref().map(|e| {
                    let id = SlotId {
                        index: index as u32,
                        generation: slot.generation,
                    };
                    (e.seq, id, &e.value)
                })
            })
            .collect();
        live.sort_by_key(|(seq, _, _)| *seq);
        live.into_iter().map(|(_, id, v)| (id, v))
    }

    fn entry(&self, id: SlotId) -> Option<&Entry<T>> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/arena.rs"]
mod tests;
