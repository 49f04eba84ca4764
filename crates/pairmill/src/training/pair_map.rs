//! # Pair Map
//!
//! Open-addressing hash map from packed `(left, right)` keys to pair-entry
//! indices. Linear probing over a power-of-two table, doubling growth below
//! a 0.75 load factor, and backward-shift deletion so probe chains stay
//! intact without tombstones.
//!
//! The hash is a fixed 64-bit avalanche (the murmur3 finalizer), so probe
//! order and therefore training output are reproducible across runs.

use crate::types::NIL;

const INITIAL_CAPACITY: usize = 16;

#[inline]
fn hash64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

/// Open-addressed `u64 -> u32` map. An empty slot is marked by `NIL` in
/// `values`.
#[derive(Debug)]
pub(crate) struct PairMap {
    keys: Vec<u64>,
    values: Vec<u32>,
    len: usize,
}

impl PairMap {
    pub fn with_capacity(capacity_hint: usize) -> Self {
        let capacity = capacity_hint.max(INITIAL_CAPACITY).next_power_of_two();
        Self {
            keys: vec![0; capacity],
            values: vec![NIL; capacity],
            len: 0,
        }
    }

    /// The number of resident keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Slot holding `key`, or the empty slot where it would go.
    fn find_slot(
        &self,
        key: u64,
    ) -> usize {
        let mask = self.keys.len() - 1;
        let mut idx = (hash64(key) as usize) & mask;
        while self.values[idx] != NIL && self.keys[idx] != key {
            idx = (idx + 1) & mask;
        }
        idx
    }

    /// Insert or overwrite `key -> value`.
    pub fn insert(
        &mut self,
        key: u64,
        value: u32,
    ) {
        // Keep the load factor below 3/4 so probe chains stay short.
        if (self.len + 1) * 4 >= self.keys.len() * 3 {
            self.grow();
        }

        let idx = self.find_slot(key);
        if self.values[idx] == NIL {
            self.len += 1;
        }
        self.keys[idx] = key;
        self.values[idx] = value;
    }

    /// Look up `key`.
    pub fn get(
        &self,
        key: u64,
    ) -> Option<u32> {
        let idx = self.find_slot(key);
        match self.values[idx] {
            NIL => None,
            value => Some(value),
        }
    }

    /// Remove `key` if present, backward-shifting the probe chain behind it.
    pub fn remove(
        &mut self,
        key: u64,
    ) {
        let idx = self.find_slot(key);
        if self.values[idx] == NIL {
            return;
        }

        self.values[idx] = NIL;
        self.len -= 1;

        // Re-seat everything in the contiguous run after the hole; any of
        // it may have probed past the removed slot.
        let mask = self.keys.len() - 1;
        let mut next = (idx + 1) & mask;
        while self.values[next] != NIL {
            let rekey = self.keys[next];
            let value = self.values[next];
            self.values[next] = NIL;

            let mut slot = (hash64(rekey) as usize) & mask;
            while self.values[slot] != NIL {
                slot = (slot + 1) & mask;
            }
            self.keys[slot] = rekey;
            self.values[slot] = value;

            next = (next + 1) & mask;
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.keys.len() * 2;
        let old_keys = std::mem::replace(&mut self.keys, vec![0; new_capacity]);
        let old_values = std::mem::replace(&mut self.values, vec![NIL; new_capacity]);
        self.len = 0;

        for (key, value) in old_keys.into_iter().zip(old_values) {
            if value != NIL {
                let idx = self.find_slot(key);
                self.keys[idx] = key;
                self.values[idx] = value;
                self.len += 1;
            }
        }
    }
}
