//! Relative-rank finder
//!
//! For every possible 13-bit subset of a suit, tabulates which seat owns
//! each card when the subset's cards are renumbered by rank order, top
//! first. Two bits per card slot: `aggr_ranks` holds the owning seat, with
//! the highest card at bits 24-25 and each lower card two bits further
//! down; `win_mask` holds `0b11` in every filled slot.
//!
//! The table depends only on which seat holds each card of the original
//! deal, so it is built once per deal and rebuilt only when the deal
//! changes. The build is an incremental doubling: the entry for a subset is
//! the entry for the subset without its top card, shifted down one slot,
//! with the top card's owner patched into the top slot.

use crate::holding::Holding;
use crate::types::*;

const TABLE_SIZE: usize = 1 << NUM_RANKS;

/// Seat ownership of one suit subset, renumbered by rank.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct RelRanks {
    pub aggr_ranks: u32,
    pub win_mask: u32,
}

/// Per-deal relative-rank tables for all four suits.
pub struct RelativeRanks {
    table: Box<[[RelRanks; NUM_SUITS]]>,
    snapshot: [[Holding; NUM_SEATS]; NUM_SUITS],
    built: bool,
}

impl RelativeRanks {
    pub fn new() -> Self {
        RelativeRanks {
            table: vec![[RelRanks::default(); NUM_SUITS]; TABLE_SIZE].into_boxed_slice(),
            snapshot: [[Holding::empty(); NUM_SEATS]; NUM_SUITS],
            built: false,
        }
    }

    /// Build the tables for `diagram`. A no-op when the per-seat suit
    /// holdings match the previous build.
    pub fn initialize(&mut self, diagram: &crate::holding::Diagram) {
        let mut changed = !self.built;
        for suit in 0..NUM_SUITS {
            for seat in 0..NUM_SEATS {
                let h = diagram.holding(seat, suit);
                if h != self.snapshot[suit][seat] {
                    self.snapshot[suit][seat] = h;
                    changed = true;
                }
            }
        }
        if !changed {
            return;
        }
        self.built = true;

        self.table[0] = [RelRanks::default(); NUM_SUITS];
        let mut top_bit: u16 = 1;
        for ind in 1..TABLE_SIZE {
            if ind & ((top_bit as usize) << 1) != 0 {
                top_bit <<= 1;
            }
            let mut entry = self.table[ind ^ top_bit as usize];
            for (suit, slot) in entry.iter_mut().enumerate() {
                for seat in 0..NUM_SEATS {
                    if self.snapshot[suit][seat].bits() & top_bit != 0 {
                        slot.aggr_ranks = (slot.aggr_ranks >> 2) | ((seat as u32) << 24);
                        slot.win_mask = (slot.win_mask >> 2) | (0b11 << 24);
                        break;
                    }
                }
            }
            self.table[ind] = entry;
        }
    }

    #[inline]
    pub fn lookup(&self, suit: Suit, holding: Holding) -> RelRanks {
        self.table[holding.bits() as usize][suit]
    }
}

impl Default for RelativeRanks {
    fn default() -> Self {
        RelativeRanks::new()
    }
}

/// Number of top-card slots down to the lowest filled pair of `mask`,
/// 1 for the top slot alone, 13 for a full suit. Zero for an empty mask.
#[inline]
pub fn inv_win_mask(mask: u32) -> usize {
    if mask == 0 {
        0
    } else {
        (24 - mask.trailing_zeros() as usize) / 2 + 1
    }
}
