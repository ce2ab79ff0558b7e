//! Precomputed per-holding lookup tables
//!
//! All 8192 possible 13-bit holdings are tabulated once so the hot search
//! loop can answer cardinality, highest-rank and top-N-cards queries with a
//! single indexed load.

use crate::holding::Holding;
use crate::types::*;

const TABLE_SIZE: usize = 1 << NUM_RANKS;

/// Immutable rank-set lookup tables, shared by reference between solves.
pub struct LookupTables {
    count_ones: Box<[u8]>,
    highest_rank: Box<[u8]>,
    // top_cards[h * 14 + n] = the n highest set bits of h
    top_cards: Box<[u16]>,
}

impl LookupTables {
    pub fn new() -> Self {
        let mut count_ones = vec![0u8; TABLE_SIZE];
        let mut highest_rank = vec![0u8; TABLE_SIZE];
        let mut top_cards = vec![0u16; TABLE_SIZE * (NUM_RANKS + 1)];

        for h in 1..TABLE_SIZE {
            count_ones[h] = count_ones[h >> 1] + (h & 1) as u8;
            highest_rank[h] = (15 - (h as u16).leading_zeros()) as u8;

            let row = h * (NUM_RANKS + 1);
            let mut rest = h as u16;
            let mut kept = 0u16;
            for n in 1..=NUM_RANKS {
                if rest != 0 {
                    let top = 15 - rest.leading_zeros();
                    kept |= 1 << top;
                    rest &= !(1 << top);
                }
                top_cards[row + n] = kept;
            }
        }

        LookupTables {
            count_ones: count_ones.into_boxed_slice(),
            highest_rank: highest_rank.into_boxed_slice(),
            top_cards: top_cards.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn count_ones(&self, h: Holding) -> usize {
        self.count_ones[h.bits() as usize] as usize
    }

    /// Highest rank of `h`, or `None` when the holding is empty.
    #[inline]
    pub fn highest_rank(&self, h: Holding) -> Option<Rank> {
        if h.is_empty() {
            None
        } else {
            Some(self.highest_rank[h.bits() as usize] as usize)
        }
    }

    /// The `n` highest cards of `h` (all of `h` when it has fewer).
    #[inline]
    pub fn top_cards(&self, h: Holding, n: usize) -> Holding {
        Holding::from_bits(self.top_cards[h.bits() as usize * (NUM_RANKS + 1) + n])
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        LookupTables::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ones() {
        let tables = LookupTables::new();
        assert_eq!(tables.count_ones(Holding::empty()), 0);
        assert_eq!(tables.count_ones(Holding::all()), NUM_RANKS);
        assert_eq!(tables.count_ones(Holding::from_bits(0b1010_0001)), 3);
    }

    #[test]
    fn test_highest_rank() {
        let tables = LookupTables::new();
        assert_eq!(tables.highest_rank(Holding::empty()), None);
        assert_eq!(tables.highest_rank(Holding::all()), Some(ACE));
        let mut h = Holding::empty();
        h.add(FOUR);
        h.add(JACK);
        assert_eq!(tables.highest_rank(h), Some(JACK));
    }

    #[test]
    fn test_top_cards() {
        let tables = LookupTables::new();
        let mut h = Holding::empty();
        h.add(ACE);
        h.add(QUEEN);
        h.add(SEVEN);
        h.add(TWO);
        assert!(tables.top_cards(h, 0).is_empty());

        let top2 = tables.top_cards(h, 2);
        assert_eq!(top2.size(), 2);
        assert!(top2.has(ACE) && top2.has(QUEEN));

        // More than the holding has just returns the holding
        assert_eq!(tables.top_cards(h, 9), h);
    }
}
