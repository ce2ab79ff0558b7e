//! Mutable position state for the search
//!
//! One `Position` is threaded through the whole search and edited in place:
//! playing a card toggles single bits and unplaying restores them, so no
//! per-node copies are made. Alongside the remaining diagram it keeps the
//! per-suit aggregates, suit lengths, outstanding winner and second-best
//! cards, the running trick count for the maximizing side, and a stack of
//! per-ply trick frames recording what was played and which ranks turned
//! out to win tricks in the subtree below.

use crate::holding::{Diagram, Holding};
use crate::moves::Move;
use crate::rel::{inv_win_mask, RelativeRanks};
use crate::tables::LookupTables;
use crate::types::*;

/// Deepest play index: four plies per trick.
pub const MAX_PLIES: usize = NUM_SEATS * TOTAL_TRICKS;

/// Highest outstanding card of a suit and its owner.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct HighCard {
    pub rank: Rank,
    pub seat: Seat,
    pub present: bool,
}

/// Per-ply record of the trick in progress.
#[derive(Clone, Copy, Default)]
pub struct TrickFrame {
    pub leader: Seat,
    pub seat: Seat,
    pub play: Move,
    pub high: Move,
    pub high_seat: Seat,
    /// Ranks that won tricks by rank anywhere in the subtree below this ply.
    pub win_ranks: [Holding; NUM_SUITS],
}

pub struct Position {
    pub diagram: Diagram,
    /// Complement of the aggregate per suit; toggled in step with plays.
    pub removed: [Holding; NUM_SUITS],
    pub aggregate: [Holding; NUM_SUITS],
    pub lengths: [[u8; NUM_SUITS]; NUM_SEATS],
    pub winner: [HighCard; NUM_SUITS],
    pub second_best: [HighCard; NUM_SUITS],
    /// Tricks already banked by the maximizing side.
    pub tricks_max: i32,
    pub stack: [TrickFrame; MAX_PLIES + 1],
    // Scratch results of compute_order_set / compute_win_data
    pub order_set: [u32; NUM_SUITS],
    pub win_order_set: [u32; NUM_SUITS],
    pub win_mask: [u32; NUM_SUITS],
    pub least_win: [usize; NUM_SUITS],
}

impl Position {
    pub fn new(diagram: Diagram, tables: &LookupTables) -> Self {
        let mut pos = Position {
            diagram,
            removed: [Holding::empty(); NUM_SUITS],
            aggregate: [Holding::empty(); NUM_SUITS],
            lengths: [[0; NUM_SUITS]; NUM_SEATS],
            winner: [HighCard::default(); NUM_SUITS],
            second_best: [HighCard::default(); NUM_SUITS],
            tricks_max: 0,
            stack: [TrickFrame::default(); MAX_PLIES + 1],
            order_set: [0; NUM_SUITS],
            win_order_set: [0; NUM_SUITS],
            win_mask: [0; NUM_SUITS],
            least_win: [0; NUM_SUITS],
        };
        for suit in 0..NUM_SUITS {
            pos.aggregate[suit] = diagram.suit_aggregate(suit);
            pos.removed[suit] = !pos.aggregate[suit];
            for seat in 0..NUM_SEATS {
                pos.lengths[seat][suit] = diagram.holding(seat, suit).size() as u8;
            }
            pos.update_high_cards(tables, suit);
        }
        pos
    }

    #[inline]
    pub fn holding(&self, seat: Seat, suit: Suit) -> Holding {
        self.diagram.holding(seat, suit)
    }

    /// Take `rank` of `suit` out of `seat`'s hand and the aggregate.
    #[inline]
    pub fn remove_rank(&mut self, seat: Seat, suit: Suit, rank: Rank) {
        self.diagram.holding_mut(seat, suit).remove(rank);
        self.aggregate[suit].remove(rank);
        self.removed[suit].add(rank);
        self.lengths[seat][suit] -= 1;
    }

    /// Reverse of `remove_rank`.
    #[inline]
    pub fn restore_rank(&mut self, seat: Seat, suit: Suit, rank: Rank) {
        self.diagram.holding_mut(seat, suit).add(rank);
        self.aggregate[suit].add(rank);
        self.removed[suit].remove(rank);
        self.lengths[seat][suit] += 1;
    }

    /// Recompute the outstanding winner and second-best card of `suit`.
    pub fn update_high_cards(&mut self, tables: &LookupTables, suit: Suit) {
        self.winner[suit] = self.find_high(tables, suit, self.aggregate[suit]);
        let mut rest = self.aggregate[suit];
        if self.winner[suit].present {
            rest.remove(self.winner[suit].rank);
        }
        self.second_best[suit] = self.find_high(tables, suit, rest);
    }

    fn find_high(&self, tables: &LookupTables, suit: Suit, cards: Holding) -> HighCard {
        match tables.highest_rank(cards) {
            None => HighCard::default(),
            Some(rank) => {
                let mut seat = 0;
                for s in 0..NUM_SEATS {
                    if self.diagram.holding(s, suit).has(rank) {
                        seat = s;
                        break;
                    }
                }
                HighCard { rank, seat, present: true }
            }
        }
    }

    /// Position signature: suit lengths of all four seats, taken relative
    /// to `rel_seat`, packed 4 bits each.
    pub fn suit_lengths(&self, rel_seat: Seat) -> u64 {
        let mut key = 0u64;
        for suit in 0..NUM_SUITS {
            for i in 0..NUM_SEATS {
                key = (key << 4) | self.lengths[(rel_seat + i) % NUM_SEATS][suit] as u64;
            }
        }
        key
    }

    /// Relative seat ownership of every suit's full aggregate.
    pub fn compute_order_set(&mut self, rel: &RelativeRanks) {
        for suit in 0..NUM_SUITS {
            self.order_set[suit] = rel.lookup(suit, self.aggregate[suit]).aggr_ranks;
        }
    }

    /// Ownership and winner count of the cards at or above the lowest
    /// trick-winning rank of `suit`. With no winners the suit matches any
    /// distribution.
    pub fn compute_win_data(&mut self, rel: &RelativeRanks, suit: Suit, winners: Holding) {
        if winners.is_empty() {
            self.win_order_set[suit] = 0;
            self.win_mask[suit] = 0;
            self.least_win[suit] = 0;
            return;
        }
        let aggr = self.aggregate[suit].at_or_above(winners.bottom());
        let rr = rel.lookup(suit, aggr);
        self.win_order_set[suit] = rr.aggr_ranks;
        self.win_mask[suit] = rr.win_mask;
        self.least_win[suit] = inv_win_mask(rr.win_mask & rr.win_mask.wrapping_neg());
    }

    /// Adopt a stored equivalence class's winners as this ply's win ranks.
    pub fn win_adapt(&mut self, tables: &LookupTables, depth: usize, least_win: &[u8; NUM_SUITS]) {
        for suit in 0..NUM_SUITS {
            self.stack[depth].win_ranks[suit] =
                tables.top_cards(self.aggregate[suit], least_win[suit] as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (LookupTables, Position) {
        let tables = LookupTables::new();
        let diagram =
            Diagram::from_pbn("N:AQ.2.. KJ.3.. T9.4.. 87.5..").unwrap();
        let pos = Position::new(diagram, &tables);
        (tables, pos)
    }

    #[test]
    fn test_initial_state() {
        let (_, pos) = sample();
        assert_eq!(pos.aggregate[SPADE].size(), 8);
        assert_eq!(pos.lengths[NORTH][SPADE], 2);
        assert_eq!(pos.lengths[NORTH][HEART], 1);
        assert!(pos.removed[SPADE].has(SIX));
        assert!(!pos.removed[SPADE].has(ACE));
        assert_eq!(pos.winner[SPADE], HighCard { rank: ACE, seat: NORTH, present: true });
        assert_eq!(pos.second_best[SPADE], HighCard { rank: KING, seat: EAST, present: true });
        assert_eq!(pos.winner[HEART], HighCard { rank: FIVE, seat: WEST, present: true });
        assert!(!pos.winner[DIAMOND].present);
    }

    #[test]
    fn test_remove_restore_roundtrip() {
        let (tables, mut pos) = sample();
        let before_diagram = pos.diagram;
        let before_aggregate = pos.aggregate;
        let before_removed = pos.removed;
        let before_lengths = pos.lengths;

        pos.remove_rank(NORTH, SPADE, ACE);
        pos.update_high_cards(&tables, SPADE);
        assert_eq!(pos.winner[SPADE], HighCard { rank: KING, seat: EAST, present: true });
        assert_eq!(pos.second_best[SPADE], HighCard { rank: QUEEN, seat: NORTH, present: true });

        pos.restore_rank(NORTH, SPADE, ACE);
        pos.update_high_cards(&tables, SPADE);
        assert_eq!(pos.diagram, before_diagram);
        assert_eq!(pos.aggregate, before_aggregate);
        assert_eq!(pos.removed, before_removed);
        assert_eq!(pos.lengths, before_lengths);
        assert_eq!(pos.winner[SPADE].rank, ACE);
    }

    #[test]
    fn test_suit_lengths_relative() {
        let tables = LookupTables::new();
        let diagram = Diagram::from_pbn("N:AQ3... KJ... T9... 87...").unwrap();
        let pos = Position::new(diagram, &tables);

        // Spade lengths: West 2, North 3, East 2, South 2, other suits void
        let from_west = pos.suit_lengths(WEST);
        assert_eq!(from_west >> 48, 0x2322);
        assert_eq!(from_west & 0xffff_ffff_ffff, 0);

        // Keyed from another seat the lengths rotate
        let from_north = pos.suit_lengths(NORTH);
        assert_eq!(from_north >> 48, 0x3222);
        assert_ne!(from_west, from_north);
    }

    #[test]
    fn test_win_data_empty_winners() {
        let (_, mut pos) = sample();
        let rel = {
            let mut rel = RelativeRanks::new();
            rel.initialize(&pos.diagram);
            rel
        };
        pos.compute_win_data(&rel, SPADE, Holding::empty());
        assert_eq!(pos.win_mask[SPADE], 0);
        assert_eq!(pos.win_order_set[SPADE], 0);
        assert_eq!(pos.least_win[SPADE], 0);
    }

    #[test]
    fn test_win_data_counts_slots() {
        let (_, mut pos) = sample();
        let mut rel = RelativeRanks::new();
        rel.initialize(&pos.diagram);

        // Winner set {Q}: cards at or above the queen are A, K, Q
        let mut winners = Holding::empty();
        winners.add(QUEEN);
        pos.compute_win_data(&rel, SPADE, winners);
        assert_eq!(pos.least_win[SPADE], 3);
        assert_eq!(pos.win_mask[SPADE], 0b11_11_11 << 20);
    }
}
