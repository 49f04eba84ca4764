//! # Vocabulary Training
//!
//! Incremental byte-pair-encoding training. The entry point is [`train`];
//! the supporting structures (node list, occurrence pool, pair table, pair
//! map, indexed heap) are internal.
//!
//! Cost model: building the index is linear in the input; each merge then
//! costs time proportional to the occurrences of the merged pair, not to
//! the whole stream. Memory is linear in the input for the node arena and
//! occurrence pool, and linear in the number of distinct live pairs for
//! the table, map, and heap.
//!
//! Training is single-threaded and deterministic, except that pairs with
//! equal counts may be merged in any order (the heap is not stabilized
//! with a secondary key).

mod occurrence_pool;
mod pair_heap;
mod pair_map;
mod pair_table;
mod trainer;

#[doc(inline)]
pub use trainer::{TrainReport, train};
