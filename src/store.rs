//! Transposition store over strategic-equivalence classes
//!
//! Positions are bucketed by (tricks remaining, leader) and then by a
//! packed suit-length signature looked up in a small binary search tree.
//! Under each signature hangs a chain of equivalence entries. An entry
//! describes a whole class of positions: `order_set` fixes who holds the
//! cards that mattered (the trick-winning ranks and everything above them)
//! while `win_mask` marks which relative card slots it constrains at all.
//! A position belongs to the class when masking its own full ownership
//! vector with the entry's `win_mask` reproduces the entry's `order_set`.
//!
//! Each entry owns one bound record: lower and upper bounds on the tricks
//! the searching engine's maximizing pair takes from here, counted relative
//! to the tricks remaining, plus the move that proved the bound and the
//! per-suit count of top cards that did the winning. Bounds only ever
//! tighten.
//!
//! Everything lives in flat arenas indexed by `u32` with a `NIL` sentinel.
//! When an arena fills up the store silently stops accepting new entries;
//! lookups keep working, the search just degrades.

use crate::types::*;

pub const NIL: u32 = u32::MAX;

/// Trick bounds for one equivalence class, relative to tricks remaining.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundRecord {
    pub lbound: i8,
    pub ubound: i8,
    pub best_suit: u8,
    /// One-based rank of the remembered best move; 0 when none.
    pub best_rank: u8,
    pub least_win: [u8; NUM_SUITS],
}

#[derive(Clone, Copy)]
struct EquivalenceEntry {
    order_set: [u32; NUM_SUITS],
    win_mask: [u32; NUM_SUITS],
    record: u32,
    next: u32,
}

#[derive(Clone, Copy)]
struct SignatureNode {
    key: u64,
    chain: u32,
    left: u32,
    right: u32,
}

/// Arena capacities. The defaults keep the store around 8 MB.
#[derive(Clone, Copy, Debug)]
pub struct MemoConfig {
    pub max_records: usize,
    pub max_entries: usize,
    pub max_signatures: usize,
}

impl Default for MemoConfig {
    fn default() -> Self {
        MemoConfig { max_records: 200_000, max_entries: 200_000, max_signatures: 50_000 }
    }
}

/// Outcome of a probe: either the stored bounds decide the current target,
/// or at best a remembered move to try first.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeResult {
    pub decided: Option<(bool, [u8; NUM_SUITS])>,
    pub hint: Option<(Suit, Rank)>,
}

pub struct MemoStore {
    records: Vec<BoundRecord>,
    entries: Vec<EquivalenceEntry>,
    signatures: Vec<SignatureNode>,
    roots: [[u32; NUM_SEATS]; TOTAL_TRICKS + 1],
    config: MemoConfig,
    enabled: bool,
}

impl MemoStore {
    pub fn new(config: MemoConfig) -> Self {
        MemoStore {
            records: Vec::new(),
            entries: Vec::new(),
            signatures: Vec::new(),
            roots: [[NIL; NUM_SEATS]; TOTAL_TRICKS + 1],
            config,
            enabled: true,
        }
    }

    /// Drop everything for a new deal. Capacity is kept.
    pub fn reset(&mut self) {
        self.records.clear();
        self.entries.clear();
        self.signatures.clear();
        self.roots = [[NIL; NUM_SEATS]; TOTAL_TRICKS + 1];
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// (records, entries, signatures) currently allocated.
    pub fn stats(&self) -> (usize, usize, usize) {
        (self.records.len(), self.entries.len(), self.signatures.len())
    }

    fn find_signature(&self, tricks: usize, leader: Seat, key: u64) -> u32 {
        let mut idx = self.roots[tricks][leader];
        while idx != NIL {
            let node = &self.signatures[idx as usize];
            if key == node.key {
                return idx;
            }
            idx = if key < node.key { node.left } else { node.right };
        }
        NIL
    }

    /// Find the signature node for `key`, inserting a fresh one when
    /// missing. `None` once the signature arena is full.
    fn find_or_insert_signature(&mut self, tricks: usize, leader: Seat, key: u64) -> Option<u32> {
        let mut parent = NIL;
        let mut go_left = false;
        let mut idx = self.roots[tricks][leader];
        while idx != NIL {
            let node = &self.signatures[idx as usize];
            if key == node.key {
                return Some(idx);
            }
            parent = idx;
            go_left = key < node.key;
            idx = if go_left { node.left } else { node.right };
        }
        if self.signatures.len() >= self.config.max_signatures {
            return None;
        }
        let fresh = self.signatures.len() as u32;
        self.signatures.push(SignatureNode { key, chain: NIL, left: NIL, right: NIL });
        if parent == NIL {
            self.roots[tricks][leader] = fresh;
        } else if go_left {
            self.signatures[parent as usize].left = fresh;
        } else {
            self.signatures[parent as usize].right = fresh;
        }
        Some(fresh)
    }

    #[inline]
    fn matches(entry: &EquivalenceEntry, order_set: &[u32; NUM_SUITS]) -> bool {
        (0..NUM_SUITS).all(|s| entry.win_mask[s] & order_set[s] == entry.order_set[s])
    }

    /// Look for a class containing the position described by `order_set`.
    /// `rel_target` is the target minus the tricks already banked.
    pub fn probe(
        &self,
        tricks: usize,
        leader: Seat,
        key: u64,
        order_set: &[u32; NUM_SUITS],
        rel_target: i32,
    ) -> ProbeResult {
        let mut result = ProbeResult::default();
        let sig = self.find_signature(tricks, leader, key);
        if sig == NIL {
            return result;
        }
        let mut idx = self.signatures[sig as usize].chain;
        while idx != NIL {
            let entry = &self.entries[idx as usize];
            if Self::matches(entry, order_set) {
                let record = &self.records[entry.record as usize];
                if record.lbound as i32 >= rel_target {
                    result.decided = Some((true, record.least_win));
                    return result;
                }
                if (record.ubound as i32) < rel_target {
                    result.decided = Some((false, record.least_win));
                    return result;
                }
                if result.hint.is_none() && record.best_rank != 0 {
                    result.hint =
                        Some((record.best_suit as Suit, record.best_rank as Rank - 1));
                }
            }
            idx = entry.next;
        }
        result
    }

    /// Record bounds for the class keyed by `win_order_set`/`win_mask`.
    /// Re-storing an identical class tightens its bounds in place; a new
    /// class goes to the head of its signature chain.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        tricks: usize,
        leader: Seat,
        key: u64,
        win_order_set: &[u32; NUM_SUITS],
        win_mask: &[u32; NUM_SUITS],
        lbound: i8,
        ubound: i8,
        best: Option<(Suit, Rank)>,
        least_win: [u8; NUM_SUITS],
    ) {
        if !self.enabled {
            return;
        }
        let sig = match self.find_or_insert_signature(tricks, leader, key) {
            Some(sig) => sig,
            None => {
                self.enabled = false;
                return;
            }
        };

        let mut idx = self.signatures[sig as usize].chain;
        while idx != NIL {
            let entry = &self.entries[idx as usize];
            if entry.order_set == *win_order_set && entry.win_mask == *win_mask {
                let record = &mut self.records[entry.record as usize];
                let tightened_l = lbound > record.lbound;
                let tightened_u = ubound < record.ubound;
                if tightened_l {
                    record.lbound = lbound;
                }
                if tightened_u {
                    record.ubound = ubound;
                }
                debug_assert!(record.lbound <= record.ubound);
                if tightened_l || tightened_u {
                    if let Some((suit, rank)) = best {
                        record.best_suit = suit as u8;
                        record.best_rank = rank as u8 + 1;
                    }
                }
                return;
            }
            idx = entry.next;
        }

        if self.records.len() >= self.config.max_records
            || self.entries.len() >= self.config.max_entries
        {
            self.enabled = false;
            return;
        }
        let record = self.records.len() as u32;
        self.records.push(BoundRecord {
            lbound,
            ubound,
            best_suit: best.map_or(0, |(suit, _)| suit as u8),
            best_rank: best.map_or(0, |(_, rank)| rank as u8 + 1),
            least_win,
        });
        let fresh = self.entries.len() as u32;
        let head = self.signatures[sig as usize].chain;
        self.entries.push(EquivalenceEntry {
            order_set: *win_order_set,
            win_mask: *win_mask,
            record,
            next: head,
        });
        self.signatures[sig as usize].chain = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: u64 = 0x2222_1111_0000_0000;

    fn full_mask() -> [u32; NUM_SUITS] {
        [0b11_11 << 22, 0, 0, 0]
    }

    fn order(a: u32) -> [u32; NUM_SUITS] {
        [a << 22, 0, 0, 0]
    }

    #[test]
    fn test_miss_then_hit() {
        let mut store = MemoStore::new(MemoConfig::default());
        let probe = store.probe(5, WEST, KEY, &order(0b01_10), 2);
        assert!(probe.decided.is_none());
        assert!(probe.hint.is_none());

        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 2, 5, Some((SPADE, ACE)), [1, 0, 0, 0]);

        // Decided when the target is at or below the lower bound
        let probe = store.probe(5, WEST, KEY, &order(0b01_10), 2);
        assert_eq!(probe.decided, Some((true, [1, 0, 0, 0])));

        // Refuted when the target is above the upper bound
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 2, 3, None, [1, 0, 0, 0]);
        let probe = store.probe(5, WEST, KEY, &order(0b01_10), 4);
        assert_eq!(probe.decided, Some((false, [1, 0, 0, 0])));

        // In between: only the remembered best move comes back
        let probe = store.probe(5, WEST, KEY, &order(0b01_10), 3);
        assert!(probe.decided.is_none());
        assert_eq!(probe.hint, Some((SPADE, ACE)));
    }

    #[test]
    fn test_masked_class_membership() {
        let mut store = MemoStore::new(MemoConfig::default());
        // Class fixes only the top two card slots
        store.store(4, NORTH, KEY, &order(0b01_10), &full_mask(), 3, 4, None, [2, 0, 0, 0]);

        // A position with extra irrelevant low-slot detail still matches
        let mut order_set = order(0b01_10);
        order_set[0] |= 0b11_01 << 18;
        let probe = store.probe(4, NORTH, KEY, &order_set, 3);
        assert_eq!(probe.decided, Some((true, [2, 0, 0, 0])));

        // Different ownership of a constrained slot does not match
        let probe = store.probe(4, NORTH, KEY, &order(0b01_11), 3);
        assert!(probe.decided.is_none());
    }

    #[test]
    fn test_buckets_are_separate() {
        let mut store = MemoStore::new(MemoConfig::default());
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 2, 5, None, [0; 4]);
        assert!(store.probe(6, WEST, KEY, &order(0b01_10), 2).decided.is_none());
        assert!(store.probe(5, EAST, KEY, &order(0b01_10), 2).decided.is_none());
        assert!(store.probe(5, WEST, KEY ^ 1, &order(0b01_10), 2).decided.is_none());
    }

    #[test]
    fn test_refine_tightens_only() {
        let mut store = MemoStore::new(MemoConfig::default());
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 1, 4, None, [0; 4]);
        // Looser bounds must not widen the record
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 0, 5, None, [0; 4]);
        assert!(store.probe(5, WEST, KEY, &order(0b01_10), 1).decided == Some((true, [0; 4])));
        assert!(store.probe(5, WEST, KEY, &order(0b01_10), 5).decided == Some((false, [0; 4])));
        // Tighter bounds stick
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 3, 4, None, [0; 4]);
        assert!(store.probe(5, WEST, KEY, &order(0b01_10), 3).decided == Some((true, [0; 4])));
        let (records, entries, signatures) = store.stats();
        assert_eq!((records, entries, signatures), (1, 1, 1));
    }

    #[test]
    fn test_exhaustion_disables_quietly() {
        let mut store = MemoStore::new(MemoConfig {
            max_records: 1,
            max_entries: 1,
            max_signatures: 1,
        });
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 2, 5, None, [0; 4]);
        assert!(store.is_enabled());
        // Second distinct class overflows the arenas
        store.store(5, WEST, KEY, &order(0b01_11), &full_mask(), 2, 5, None, [0; 4]);
        assert!(!store.is_enabled());
        // Earlier data still answers
        let probe = store.probe(5, WEST, KEY, &order(0b01_10), 2);
        assert_eq!(probe.decided, Some((true, [0; 4])));
    }

    #[test]
    fn test_reset_clears() {
        let mut store = MemoStore::new(MemoConfig::default());
        store.store(5, WEST, KEY, &order(0b01_10), &full_mask(), 2, 5, None, [0; 4]);
        store.reset();
        assert!(store.probe(5, WEST, KEY, &order(0b01_10), 2).decided.is_none());
        assert_eq!(store.stats(), (0, 0, 0));
    }
}
