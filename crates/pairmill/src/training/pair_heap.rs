//! # Indexed Pair Heap
//!
//! Array-backed binary max-heap over pair-entry indices, ordered by the
//! entries' occurrence counts. Counts move in both directions during
//! training, so every entry caches its current slot (`heap_index`) and an
//! update sifts whichever way the count moved.

use crate::training::pair_table::PairTable;
use crate::types::NIL;

/// Max-heap of pair-entry indices keyed by `table[entry].count`.
#[derive(Debug, Default)]
pub(crate) struct PairHeap {
    slots: Vec<u32>,
}

impl PairHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The entry index at the root, without removing it.
    pub fn peek(&self) -> Option<u32> {
        self.slots.first().copied()
    }

    /// Push an entry not currently in the heap.
    pub fn push(
        &mut self,
        table: &mut PairTable,
        entry: u32,
    ) {
        debug_assert_eq!(table[entry].heap_index, NIL);
        let slot = self.slots.len();
        self.slots.push(entry);
        table[entry].heap_index = slot as u32;
        self.sift_up(table, slot);
    }

    /// Remove and return the entry with the maximum count.
    pub fn pop_max(
        &mut self,
        table: &mut PairTable,
    ) -> Option<u32> {
        if self.slots.is_empty() {
            return None;
        }
        let top = self.slots[0];
        self.remove_at(table, 0);
        Some(top)
    }

    /// Re-establish heap order for `entry` after its count changed.
    ///
    /// Entries whose count reached zero leave the heap; entries not yet
    /// resident are pushed.
    pub fn update(
        &mut self,
        table: &mut PairTable,
        entry: u32,
    ) {
        let slot = table[entry].heap_index;

        if table[entry].count == 0 {
            if slot != NIL {
                self.remove_at(table, slot as usize);
            }
            return;
        }

        if slot == NIL {
            self.push(table, entry);
        } else {
            let slot = slot as usize;
            self.sift_up(table, slot);
            self.sift_down(table, slot);
        }
    }

    fn remove_at(
        &mut self,
        table: &mut PairTable,
        slot: usize,
    ) {
        let last = self.slots.len() - 1;
        let removed = self.slots[slot];
        self.slots.swap(slot, last);
        self.slots.pop();
        table[removed].heap_index = NIL;

        if slot < self.slots.len() {
            table[self.slots[slot]].heap_index = slot as u32;
            self.sift_down(table, slot);
            self.sift_up(table, slot);
        }
    }

    fn sift_up(
        &mut self,
        table: &mut PairTable,
        mut slot: usize,
    ) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if table[self.slots[slot]].count <= table[self.slots[parent]].count {
                break;
            }
            self.swap_slots(table, slot, parent);
            slot = parent;
        }
    }

    fn sift_down(
        &mut self,
        table: &mut PairTable,
        mut slot: usize,
    ) {
        loop {
            let left = slot * 2 + 1;
            let right = left + 1;
            let mut largest = slot;

            if left < self.slots.len()
                && table[self.slots[left]].count > table[self.slots[largest]].count
            {
                largest = left;
            }
            if right < self.slots.len()
                && table[self.slots[right]].count > table[self.slots[largest]].count
            {
                largest = right;
            }
            if largest == slot {
                break;
            }
            self.swap_slots(table, slot, largest);
            slot = largest;
        }
    }

    fn swap_slots(
        &mut self,
        table: &mut PairTable,
        a: usize,
        b: usize,
    ) {
        self.slots.swap(a, b);
        table[self.slots[a]].heap_index = a as u32;
        table[self.slots[b]].heap_index = b as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_counts(counts: &[u32]) -> (PairTable, Vec<u32>) {
        let mut table = PairTable::with_capacity(counts.len());
        let entries: Vec<u32> = counts
            .iter()
            .map(|&count| {
                let e = table.acquire();
                table[e].count = count;
                e
            })
            .collect();
        (table, entries)
    }

    #[test]
    fn test_pop_order() {
        let (mut table, entries) = table_with_counts(&[3, 9, 1, 7, 5]);
        let mut heap = PairHeap::with_capacity(entries.len());
        for &e in &entries {
            heap.push(&mut table, e);
        }

        let mut popped = Vec::new();
        while let Some(e) = heap.pop_max(&mut table) {
            popped.push(table[e].count);
        }
        assert_eq!(popped, vec![9, 7, 5, 3, 1]);
    }

    #[test]
    fn test_heap_index_tracking() {
        let (mut table, entries) = table_with_counts(&[4, 2, 6]);
        let mut heap = PairHeap::with_capacity(3);
        for &e in &entries {
            heap.push(&mut table, e);
        }

        for slot in 0..heap.len() {
            let entry = heap.slots[slot];
            assert_eq!(table[entry].heap_index, slot as u32);
        }
    }

    #[test]
    fn test_update_increase_key() {
        let (mut table, entries) = table_with_counts(&[4, 2, 6]);
        let mut heap = PairHeap::with_capacity(3);
        for &e in &entries {
            heap.push(&mut table, e);
        }

        table[entries[1]].count = 10;
        heap.update(&mut table, entries[1]);
        assert_eq!(heap.peek(), Some(entries[1]));
    }

    #[test]
    fn test_update_decrease_key() {
        let (mut table, entries) = table_with_counts(&[4, 2, 6]);
        let mut heap = PairHeap::with_capacity(3);
        for &e in &entries {
            heap.push(&mut table, e);
        }

        table[entries[2]].count = 1;
        heap.update(&mut table, entries[2]);
        assert_eq!(heap.peek(), Some(entries[0]));
    }

    #[test]
    fn test_update_zero_count_removes() {
        let (mut table, entries) = table_with_counts(&[4, 2]);
        let mut heap = PairHeap::with_capacity(2);
        for &e in &entries {
            heap.push(&mut table, e);
        }

        table[entries[0]].count = 0;
        heap.update(&mut table, entries[0]);
        assert_eq!(heap.len(), 1);
        assert_eq!(table[entries[0]].heap_index, NIL);

        // A later update with a fresh count re-inserts it.
        table[entries[0]].count = 3;
        heap.update(&mut table, entries[0]);
        assert_eq!(heap.peek(), Some(entries[0]));
    }

    #[test]
    fn test_update_absent_zero_is_noop() {
        let (mut table, entries) = table_with_counts(&[0]);
        let mut heap = PairHeap::with_capacity(1);
        heap.update(&mut table, entries[0]);
        assert_eq!(heap.len(), 0);
    }
}
