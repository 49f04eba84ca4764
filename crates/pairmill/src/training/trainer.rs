//! # Incremental Merge Trainer
//!
//! The training engine proper. The token stream lives in an intrusive
//! doubly-linked list over a fixed node arena; every adjacent pair of live
//! nodes is tracked by an occurrence record threaded into its pair entry's
//! occurrence list. A merge therefore touches only the occurrences of the
//! merged pair and their immediate neighbors, instead of rescanning the
//! whole stream per step.
//!
//! Between steps the structures agree as follows:
//! * every adjacent pair of active nodes `(a, b)` is covered by exactly one
//!   active occurrence anchored at `a`;
//! * each in-use pair entry's `count` equals the length of its occurrence
//!   list, and `count > 0` iff the entry sits in the heap;
//! * the map holds exactly the in-use entries (zero-count entries may stay
//!   resident until released);
//! * the heap root has the maximum count.

use crate::errors::PmResult;
use crate::merges::MergeRules;
use crate::sequence::TokenSequence;
use crate::training::occurrence_pool::OccurrencePool;
use crate::training::pair_heap::PairHeap;
use crate::training::pair_map::PairMap;
use crate::training::pair_table::PairTable;
use crate::types::{NIL, TokenId, pair_key};
use crate::vocab::Vocabulary;

/// Summary of a completed training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainReport {
    /// Token count of the input sequence.
    pub initial_len: usize,
    /// Token count after all merges were applied.
    pub final_len: usize,
    /// Number of merge rules learned.
    pub merges: usize,
}

impl TrainReport {
    /// Input tokens per output token; `0.0` for a collapsed sequence.
    pub fn compression_ratio(&self) -> f64 {
        if self.final_len > 0 {
            self.initial_len as f64 / self.final_len as f64
        } else {
            0.0
        }
    }

    /// How many tokens the input shrank by.
    pub fn tokens_reduced(&self) -> usize {
        self.initial_len - self.final_len
    }
}

/// Node of the intrusive token list. Inactive nodes are never reused.
#[derive(Debug, Clone, Copy)]
struct SeqNode {
    token_id: TokenId,
    prev: u32,
    next: u32,
    /// The occurrence anchored at this node as its left position, or `NIL`.
    occ_index: u32,
    active: bool,
}

struct TrainerState {
    nodes: Vec<SeqNode>,
    head: u32,
    live_count: usize,

    occ_pool: OccurrencePool,
    pairs: PairTable,
    map: PairMap,
    heap: PairHeap,
}

impl TrainerState {
    fn from_sequence(seq: &TokenSequence) -> Self {
        let n = seq.len();
        let mut nodes = Vec::with_capacity(n);
        for (i, &token_id) in seq.tokens().iter().enumerate() {
            nodes.push(SeqNode {
                token_id,
                prev: if i == 0 { NIL } else { (i - 1) as u32 },
                next: if i + 1 == n { NIL } else { (i + 1) as u32 },
                occ_index: NIL,
                active: true,
            });
        }

        let mut state = Self {
            nodes,
            head: if n > 0 { 0 } else { NIL },
            live_count: n,
            occ_pool: OccurrencePool::with_capacity(n),
            pairs: PairTable::with_capacity(1024),
            map: PairMap::with_capacity(1024),
            heap: PairHeap::with_capacity(1024),
        };

        // Seed the index back to front: occurrences push onto their list
        // head, so this leaves every pair's occurrence list in position
        // order and the merge walk consumes overlapping runs left to
        // right.
        for idx in (0..n as u32).rev() {
            state.add_pair_at(idx);
        }
        state
    }

    /// Track the pair starting at `node_index`, creating its entry on first
    /// sight and replacing any stale occurrence still anchored there.
    fn add_pair_at(
        &mut self,
        node_index: u32,
    ) {
        if node_index == NIL {
            return;
        }
        let node = self.nodes[node_index as usize];
        if !node.active {
            self.nodes[node_index as usize].occ_index = NIL;
            return;
        }
        let right_index = node.next;
        if right_index == NIL {
            self.nodes[node_index as usize].occ_index = NIL;
            return;
        }
        let right = self.nodes[right_index as usize];
        if !right.active {
            self.nodes[node_index as usize].occ_index = NIL;
            return;
        }

        let key = pair_key(node.token_id, right.token_id);
        let pair_index = match self.map.get(key) {
            Some(index) => index,
            None => {
                let index = self.pairs.acquire();
                self.pairs[index].left = node.token_id;
                self.pairs[index].right = right.token_id;
                self.map.insert(key, index);
                index
            }
        };

        let stale = self.nodes[node_index as usize].occ_index;
        if stale != NIL {
            self.remove_occurrence(stale, true);
        }

        let occ_index = self.occ_pool.acquire();
        let old_head = self.pairs[pair_index].occ_head;
        {
            let occ = &mut self.occ_pool[occ_index];
            occ.pair_index = pair_index;
            occ.left_node = node_index;
            occ.prev_occ = NIL;
            occ.next_occ = old_head;
        }
        if old_head != NIL {
            self.occ_pool[old_head].prev_occ = occ_index;
        }
        self.pairs[pair_index].occ_head = occ_index;
        self.pairs[pair_index].count += 1;
        self.nodes[node_index as usize].occ_index = occ_index;

        self.heap.update(&mut self.pairs, pair_index);
    }

    /// Unlink an occurrence from its entry and recycle the slot.
    ///
    /// `update_heap` is false only while draining the occurrence list of a
    /// pair that is about to be discarded.
    fn remove_occurrence(
        &mut self,
        occ_index: u32,
        update_heap: bool,
    ) {
        let occ = self.occ_pool[occ_index];
        if !occ.active {
            return;
        }
        let pair_index = occ.pair_index;

        if occ.prev_occ != NIL {
            self.occ_pool[occ.prev_occ].next_occ = occ.next_occ;
        } else {
            self.pairs[pair_index].occ_head = occ.next_occ;
        }
        if occ.next_occ != NIL {
            self.occ_pool[occ.next_occ].prev_occ = occ.prev_occ;
        }

        if self.nodes[occ.left_node as usize].occ_index == occ_index {
            self.nodes[occ.left_node as usize].occ_index = NIL;
        }

        let entry = &mut self.pairs[pair_index];
        entry.count = entry.count.saturating_sub(1);

        self.occ_pool.release(occ_index);

        if update_heap {
            self.heap.update(&mut self.pairs, pair_index);
        }
    }

    /// Remove the occurrence anchored at `node_index`, if any.
    fn detach_occurrence_at(
        &mut self,
        node_index: u32,
    ) {
        if node_index == NIL {
            return;
        }
        let node = self.nodes[node_index as usize];
        if !node.active {
            return;
        }
        if node.occ_index != NIL {
            self.remove_occurrence(node.occ_index, true);
        }
    }

    /// Rewrite every occurrence of the popped pair to `new_id`.
    ///
    /// Walks the entry's occurrence list front to back, which yields
    /// non-overlapping greedy merges: in a run like `XXX`, merging at one
    /// position detaches the overlapping occurrence (its anchor node is
    /// consumed), and the re-validation below rejects anything left over.
    fn merge_pair(
        &mut self,
        pair_index: u32,
        new_id: TokenId,
    ) {
        let right_token = self.pairs[pair_index].right;

        loop {
            let occ_index = self.pairs[pair_index].occ_head;
            if occ_index == NIL {
                break;
            }
            let occ = self.occ_pool[occ_index];

            // The entry is discarded after this walk, so its own heap
            // position does not need maintenance.
            self.remove_occurrence(occ_index, false);

            let left_index = occ.left_node;
            if !self.nodes[left_index as usize].active {
                continue;
            }
            let right_index = self.nodes[left_index as usize].next;
            if right_index == NIL {
                continue;
            }
            let right = self.nodes[right_index as usize];
            if !right.active || right.token_id != right_token {
                continue;
            }

            let prev_index = self.nodes[left_index as usize].prev;
            let next_index = right.next;

            // Neighboring pairs change identity; drop their occurrences
            // before relinking.
            if prev_index != NIL {
                self.detach_occurrence_at(prev_index);
            }
            self.detach_occurrence_at(right_index);

            {
                let left = &mut self.nodes[left_index as usize];
                left.token_id = new_id;
                left.next = next_index;
            }
            if next_index != NIL {
                self.nodes[next_index as usize].prev = left_index;
            }

            {
                let right = &mut self.nodes[right_index as usize];
                right.active = false;
                right.prev = NIL;
                right.next = NIL;
                right.occ_index = NIL;
            }
            self.live_count -= 1;

            if prev_index != NIL {
                self.add_pair_at(prev_index);
            }
            self.add_pair_at(left_index);
        }

        // Detaching a neighbor occurrence of this same pair above may have
        // lazily re-inserted the entry into the heap; its count is zero
        // now, so this pulls it back out before the entry is released.
        self.heap.update(&mut self.pairs, pair_index);
    }

    /// Collect the surviving tokens back into dense form.
    fn collect_into(
        &self,
        seq: &mut TokenSequence,
    ) {
        let mut tokens = Vec::with_capacity(self.live_count);
        let mut idx = self.head;
        while idx != NIL {
            let node = self.nodes[idx as usize];
            if node.active {
                tokens.push(node.token_id);
            }
            idx = node.next;
        }
        seq.replace(tokens);
    }

    /// Exhaustive structural audit, run between merge steps in debug
    /// builds.
    fn check_invariants(&self) {
        let mut adjacent_pairs = 0usize;
        let mut live = 0usize;
        let mut idx = self.head;
        while idx != NIL {
            let node = self.nodes[idx as usize];
            assert!(node.active, "list walk reached an inactive node");
            live += 1;

            if node.next != NIL {
                let next = self.nodes[node.next as usize];
                assert!(next.active);
                assert_eq!(next.prev, idx);
                adjacent_pairs += 1;

                // Exactly one active occurrence covers this position.
                assert_ne!(node.occ_index, NIL, "adjacent pair with no occurrence");
                let occ = self.occ_pool[node.occ_index];
                assert!(occ.active);
                assert_eq!(occ.left_node, idx);
                let entry = self.pairs[occ.pair_index];
                assert!(entry.in_use);
                assert_eq!((entry.left, entry.right), (node.token_id, next.token_id));
            }
            idx = node.next;
        }
        assert_eq!(live, self.live_count);

        let mut total_count = 0usize;
        let mut max_count = 0u32;
        let mut heap_resident = 0usize;
        let mut in_use = 0usize;
        for (index, entry) in self.pairs.in_use() {
            in_use += 1;
            total_count += entry.count as usize;
            max_count = max_count.max(entry.count);
            if entry.count > 0 {
                heap_resident += 1;
            }
            assert_eq!(
                entry.count > 0,
                entry.heap_index != NIL,
                "heap residency must track a positive count"
            );
            assert_eq!(
                self.map.get(pair_key(entry.left, entry.right)),
                Some(index),
                "map must resolve every in-use entry"
            );
        }
        assert_eq!(total_count, adjacent_pairs);
        assert_eq!(heap_resident, self.heap.len());
        assert_eq!(in_use, self.map.len(), "map keys must mirror in-use entries");

        if let Some(root) = self.heap.peek() {
            assert_eq!(self.pairs[root].count, max_count);
        } else {
            assert_eq!(max_count, 0);
        }
    }
}

/// Learn merges until `vocab` reaches `target_vocab_size` or the sequence
/// admits no further pair.
///
/// On return `seq` holds the merged token stream, `vocab` the merged
/// byte strings, and `rules` the replacements in application order.
///
/// ## Errors
/// [`crate::PairmillError::CapacityExceeded`] if `vocab` or `rules` cannot
/// hold the next merge.
pub fn train(
    vocab: &mut Vocabulary,
    rules: &mut MergeRules,
    seq: &mut TokenSequence,
    target_vocab_size: usize,
) -> PmResult<TrainReport> {
    let initial_len = seq.len();
    log::info!(
        "training: vocab {} -> {}, input {} tokens",
        vocab.len(),
        target_vocab_size,
        initial_len
    );

    let mut state = TrainerState::from_sequence(seq);
    let mut merges = 0usize;

    while vocab.len() < target_vocab_size {
        if cfg!(debug_assertions) {
            state.check_invariants();
        }

        if state.live_count < 2 {
            log::info!("no more pairs to merge");
            break;
        }
        let Some(pair_index) = state.heap.pop_max(&mut state.pairs) else {
            log::info!("no more pairs to merge");
            break;
        };

        let entry = state.pairs[pair_index];
        if !entry.in_use {
            continue;
        }
        if entry.count == 0 {
            // Went stale between heap updates; drop it for real.
            state.map.remove(pair_key(entry.left, entry.right));
            state.pairs.release(pair_index);
            continue;
        }

        let left_bytes = vocab
            .token(entry.left)
            .expect("merged pair tokens are in the vocabulary");
        let right_bytes = vocab
            .token(entry.right)
            .expect("merged pair tokens are in the vocabulary");
        let mut merged = Vec::with_capacity(left_bytes.len() + right_bytes.len());
        merged.extend_from_slice(left_bytes);
        merged.extend_from_slice(right_bytes);

        let new_id = vocab.add(merged)?;
        rules.push(entry.left, entry.right, new_id)?;

        log::debug!(
            "merge {merges}: {} + {} -> {} (count {})",
            vocab.display(entry.left),
            vocab.display(entry.right),
            vocab.display(new_id),
            entry.count
        );

        state.merge_pair(pair_index, new_id);
        state.map.remove(pair_key(entry.left, entry.right));
        state.pairs.release(pair_index);
        merges += 1;
    }

    state.collect_into(seq);

    let report = TrainReport {
        initial_len,
        final_len: seq.len(),
        merges,
    };
    log::info!(
        "training complete: {} merges, {} -> {} tokens ({:.2}x)",
        report.merges,
        report.initial_len,
        report.final_len,
        report.compression_ratio()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::BASE_TOKENS;

    fn train_corpus(
        corpus: &[u8],
        target: usize,
    ) -> (Vocabulary, MergeRules, TokenSequence, TrainReport) {
        let mut vocab = Vocabulary::base(target);
        let mut rules = MergeRules::with_capacity(target.saturating_sub(BASE_TOKENS));
        let mut seq = TokenSequence::from_bytes(corpus);
        let report = train(&mut vocab, &mut rules, &mut seq, target).unwrap();
        (vocab, rules, seq, report)
    }

    #[test]
    fn test_single_merge() {
        let (vocab, rules, seq, report) = train_corpus(b"ab", 257);

        assert_eq!(vocab.len(), 257);
        assert_eq!(rules.len(), 1);
        let rule = rules.as_slice()[0];
        assert_eq!((rule.left, rule.right, rule.result), (97, 98, 256));
        assert_eq!(seq.tokens(), &[256]);
        assert_eq!(vocab.token(256), Some(&b"ab"[..]));
        assert_eq!(report.merges, 1);
        assert_eq!(report.final_len, 1);
    }

    #[test]
    fn test_repeated_pair_merges_twice() {
        // "aaaa": (a, a) covers two positions, then the two new tokens
        // merge again.
        let (vocab, rules, seq, _) = train_corpus(b"aaaa", 258);

        let rules: Vec<_> = rules
            .iter()
            .map(|r| (r.left, r.right, r.result))
            .collect();
        assert_eq!(rules, vec![(97, 97, 256), (256, 256, 257)]);
        assert_eq!(seq.tokens(), &[257]);
        assert_eq!(vocab.token(257), Some(&b"aaaa"[..]));
    }

    #[test]
    fn test_overlapping_run_merges_once() {
        // "aaa": (a, a) appears at positions 0 and 1, but the greedy walk
        // consumes position 0 and invalidates position 1.
        let (_, rules, seq, report) = train_corpus(b"aaa", 257);

        assert_eq!(rules.len(), 1);
        assert_eq!(seq.tokens(), &[256, 97]);
        assert_eq!(report.final_len, 2);
    }

    #[test]
    fn test_most_frequent_pair_wins() {
        // "abab": (a, b) has count 2, (b, a) count 1.
        let (vocab, rules, seq, _) = train_corpus(b"abab", 257);

        let rule = rules.as_slice()[0];
        assert_eq!((rule.left, rule.right, rule.result), (97, 98, 256));
        assert_eq!(seq.tokens(), &[256, 256]);
        assert_eq!(vocab.len(), 257);
    }

    #[test]
    fn test_empty_corpus() {
        let (vocab, rules, seq, report) = train_corpus(b"", 512);
        assert_eq!(vocab.len(), BASE_TOKENS);
        assert!(rules.is_empty());
        assert!(seq.is_empty());
        assert_eq!(report.merges, 0);
    }

    #[test]
    fn test_single_byte_corpus() {
        let (vocab, rules, seq, _) = train_corpus(b"a", 512);
        assert_eq!(vocab.len(), BASE_TOKENS);
        assert!(rules.is_empty());
        assert_eq!(seq.tokens(), &[97]);
    }

    #[test]
    fn test_target_equal_to_base_is_a_noop() {
        let (vocab, rules, seq, _) = train_corpus(b"hello world", 256);
        assert_eq!(vocab.len(), BASE_TOKENS);
        assert!(rules.is_empty());
        assert_eq!(seq.len(), 11);
    }

    #[test]
    fn test_unreachable_target_stops_early() {
        // Eight identical bytes collapse to a single token after three
        // merges; a larger target cannot be reached.
        let (vocab, rules, seq, report) = train_corpus(b"aaaaaaaa", 1024);

        assert_eq!(seq.len(), 1);
        assert_eq!(rules.len(), 3);
        assert_eq!(vocab.len(), BASE_TOKENS + 3);
        assert_eq!(report.final_len, 1);
    }

    #[test]
    fn test_rule_ids_are_sequential() {
        let corpus = b"the quick brown fox jumps over the lazy dog; the end.";
        let (_, rules, _, _) = train_corpus(corpus, 280);

        for (i, rule) in rules.iter().enumerate() {
            assert_eq!(rule.result, (BASE_TOKENS + i) as u32);
            assert!(rule.left < rule.result);
            assert!(rule.right < rule.result);
        }
    }

    #[test]
    fn test_output_never_longer_than_input() {
        let corpus = b"mississippi mississippi mississippi";
        let (_, _, seq, report) = train_corpus(corpus, 300);
        assert!(seq.len() <= corpus.len());
        assert_eq!(report.tokens_reduced(), corpus.len() - seq.len());
    }

    #[test]
    fn test_merged_tokens_reconstruct_corpus() {
        let corpus = b"abcabcababc";
        let (vocab, _, seq, _) = train_corpus(corpus, 300);

        let mut reconstructed = Vec::new();
        for &id in seq.tokens() {
            reconstructed.extend_from_slice(vocab.token(id).unwrap());
        }
        assert_eq!(reconstructed, corpus);
    }
}
