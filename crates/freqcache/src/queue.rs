//! Frequency-ordered priority queue
//!
//! Binary min-heap over access weight. Entries live in a slot arena so the
//! entry table can hold a stable handle, while each entry records its
//! current heap position for O(log n) removal and re-weighting.

/// One cached item
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Accounted size: value estimate plus per-entry overhead
    pub(crate) size: usize,
    /// Position in `Queue::heap`, rewritten on every swap
    index: usize,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, size: usize) -> Self {
        Self {
            key,
            value,
            size,
            index: 0,
        }
    }
}

/// Heap node: slot handle plus the weight it is ordered by
#[derive(Clone, Copy)]
struct Node {
    slot: usize,
    weight: u64,
}

/// Min-heap of entries ordered by weight
pub(crate) struct Queue<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    free_list: Vec<usize>,
    heap: Vec<Node>,
}

impl<K, V> Queue<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            heap: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&Entry<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Current heap position of a slot
    pub(crate) fn index_of(&self, slot: usize) -> Option<usize> {
        self.get(slot).map(|entry| entry.index)
    }

    /// Current weight of a slot
    pub(crate) fn weight(&self, slot: usize) -> Option<u64> {
        self.index_of(slot).map(|index| self.heap[index].weight)
    }

    /// Entry with the smallest weight
    pub(crate) fn peek_min(&self) -> Option<&Entry<K, V>> {
        self.heap.first().and_then(|node| self.get(node.slot))
    }

    /// Add an entry with weight 0, returning its slot handle
    pub(crate) fn insert(&mut self, mut entry: Entry<K, V>) -> usize {
        let index = self.heap.len();
        entry.index = index;

        let slot = self.alloc_slot();
        self.slots[slot] = Some(entry);
        self.heap.push(Node { slot, weight: 0 });
        self.sift_up(index);

        slot
    }

    /// Remove the entry with the smallest weight
    pub(crate) fn remove_min(&mut self) -> Option<Entry<K, V>> {
        if self.is_empty() {
            return None;
        }
        self.remove_at(0)
    }

    /// Remove the entry at a heap position
    ///
    /// The position must come from `index_of` for a live slot.
    pub(crate) fn remove_at(&mut self, index: usize) -> Option<Entry<K, V>> {
        let last = self.heap.len().checked_sub(1)?;
        if index > last {
            return None;
        }

        self.swap(index, last);
        let node = self.heap.pop()?;
        if index < self.heap.len() {
            self.fix(index);
        }

        let entry = self.slots[node.slot].take();
        self.free_list.push(node.slot);
        entry
    }

    /// Set a slot's weight and restore heap order around it
    pub(crate) fn update_weight(&mut self, slot: usize, weight: u64) {
        if let Some(index) = self.index_of(slot) {
            self.heap[index].weight = weight;
            self.fix(index);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.heap.clear();
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(slot) = self.free_list.pop() {
            slot
        } else {
            self.slots.push(None);
            self.slots.len() - 1
        }
    }

    fn fix(&mut self, index: usize) {
        if !self.sift_down(index) {
            self.sift_up(index);
        }
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].weight >= self.heap[parent].weight {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    /// Returns true if the node moved
    fn sift_down(&mut self, start: usize) -> bool {
        let len = self.heap.len();
        let mut index = start;

        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }

            let mut child = left;
            let right = left + 1;
            if right < len && self.heap[right].weight < self.heap[left].weight {
                child = right;
            }
            if self.heap[child].weight >= self.heap[index].weight {
                break;
            }

            self.swap(index, child);
            index = child;
        }

        index > start
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.set_index(i);
        self.set_index(j);
    }

    fn set_index(&mut self, index: usize) {
        let slot = self.heap[index].slot;
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.index = index;
        }
    }

    /// Heap order holds and every entry knows its true position
    #[cfg(test)]
    pub(crate) fn is_heap(&self) -> bool {
        let ordered = (1..self.heap.len())
            .all(|i| self.heap[(i - 1) / 2].weight <= self.heap[i].weight);
        let indexed = self
            .heap
            .iter()
            .enumerate()
            .all(|(i, node)| self.index_of(node.slot) == Some(i));
        let live = self.slots.iter().filter(|slot| slot.is_some()).count();

        ordered && indexed && live == self.heap.len()
    }
}
