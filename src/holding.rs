//! Per-suit card holdings and the four-hand remaining-cards diagram

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::types::*;

/// All 13 ranks of one suit
pub const ALL_RANKS: u16 = 0x1fff;

/// A set of ranks within one suit, bit `1 << rank` for TWO=0 .. ACE=12.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Holding(u16);

impl Holding {
    #[inline]
    pub const fn empty() -> Self {
        Holding(0)
    }

    #[inline]
    pub const fn all() -> Self {
        Holding(ALL_RANKS)
    }

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Holding(bits & ALL_RANKS)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn size(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn has(self, rank: Rank) -> bool {
        self.0 & (1 << rank) != 0
    }

    #[inline]
    pub fn add(&mut self, rank: Rank) {
        self.0 |= 1 << rank;
    }

    #[inline]
    pub fn remove(&mut self, rank: Rank) {
        self.0 &= !(1 << rank);
    }

    /// Highest rank in the holding. Must not be called on an empty holding.
    #[inline]
    pub fn top(self) -> Rank {
        debug_assert!(self.0 != 0);
        15 - self.0.leading_zeros() as usize
    }

    /// Lowest rank in the holding. Must not be called on an empty holding.
    #[inline]
    pub fn bottom(self) -> Rank {
        debug_assert!(self.0 != 0);
        self.0.trailing_zeros() as usize
    }

    /// Ranks at or above `rank`.
    #[inline]
    pub fn at_or_above(self, rank: Rank) -> Holding {
        Holding(self.0 & !((1u16 << rank) - 1))
    }

    /// Iterate ranks from highest to lowest.
    #[inline]
    pub fn iter(self) -> RankIter {
        RankIter(self.0)
    }
}

impl BitOr for Holding {
    type Output = Holding;
    #[inline]
    fn bitor(self, rhs: Holding) -> Holding {
        Holding(self.0 | rhs.0)
    }
}

impl BitAnd for Holding {
    type Output = Holding;
    #[inline]
    fn bitand(self, rhs: Holding) -> Holding {
        Holding(self.0 & rhs.0)
    }
}

impl Not for Holding {
    type Output = Holding;
    #[inline]
    fn not(self) -> Holding {
        Holding(!self.0 & ALL_RANKS)
    }
}

/// Descending rank iterator
pub struct RankIter(u16);

impl Iterator for RankIter {
    type Item = Rank;

    #[inline]
    fn next(&mut self) -> Option<Rank> {
        if self.0 == 0 {
            None
        } else {
            let rank = 15 - self.0.leading_zeros() as usize;
            self.0 &= !(1 << rank);
            Some(rank)
        }
    }
}

impl IntoIterator for Holding {
    type Item = Rank;
    type IntoIter = RankIter;

    fn into_iter(self) -> RankIter {
        self.iter()
    }
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for rank in self.iter() {
            write!(f, "{}", rank_name(rank))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Holding({})", self)
    }
}

/// The remaining cards of all four hands, one holding per seat and suit.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagram {
    cards: [[Holding; NUM_SUITS]; NUM_SEATS],
}

impl Diagram {
    pub fn new() -> Self {
        Diagram::default()
    }

    #[inline]
    pub fn holding(&self, seat: Seat, suit: Suit) -> Holding {
        self.cards[seat][suit]
    }

    #[inline]
    pub fn holding_mut(&mut self, seat: Seat, suit: Suit) -> &mut Holding {
        &mut self.cards[seat][suit]
    }

    /// All cards of one suit across the four seats.
    pub fn suit_aggregate(&self, suit: Suit) -> Holding {
        let mut agg = Holding::empty();
        for seat in 0..NUM_SEATS {
            agg = agg | self.cards[seat][suit];
        }
        agg
    }

    pub fn hand_size(&self, seat: Seat) -> usize {
        (0..NUM_SUITS).map(|suit| self.cards[seat][suit].size()).sum()
    }

    pub fn total_cards(&self) -> usize {
        (0..NUM_SEATS).map(|seat| self.hand_size(seat)).sum()
    }

    /// Parse a PBN deal string, e.g.
    /// "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72"
    ///
    /// The leading letter gives the seat of the first hand; the other hands
    /// follow clockwise. Within a hand the suits are S.H.D.C and "-" (or an
    /// empty field) is a void.
    pub fn from_pbn(pbn: &str) -> Option<Self> {
        let pbn = pbn.trim();
        let (first, rest) = match pbn.split_once(':') {
            Some((seat_str, rest)) => {
                let seat_char = seat_str.trim().chars().next()?;
                (char_to_seat(seat_char)?, rest)
            }
            None => (NORTH, pbn),
        };

        let mut diagram = Diagram::new();
        let mut seat = first;
        let mut hands = 0;
        for hand in rest.split_whitespace() {
            if hands == NUM_SEATS {
                return None;
            }
            let mut suit = 0;
            for field in hand.split('.') {
                if suit == NUM_SUITS {
                    return None;
                }
                let mut holding = Holding::empty();
                for c in field.chars() {
                    if c == '-' {
                        continue;
                    }
                    let rank = char_to_rank(c)?;
                    if holding.has(rank) {
                        return None;
                    }
                    holding.add(rank);
                }
                diagram.cards[seat][suit] = holding;
                suit += 1;
            }
            if suit != NUM_SUITS {
                return None;
            }
            seat = next_seat(seat);
            hands += 1;
        }
        if hands != NUM_SEATS {
            return None;
        }
        Some(diagram)
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seat in [NORTH, EAST, SOUTH, WEST] {
            write!(f, "{:5} ", seat_name(seat))?;
            for suit in 0..NUM_SUITS {
                write!(f, " {}:{}", suit_letter(suit), self.cards[seat][suit])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_basics() {
        let mut h = Holding::empty();
        assert!(h.is_empty());
        h.add(ACE);
        h.add(TEN);
        h.add(TWO);
        assert_eq!(h.size(), 3);
        assert_eq!(h.top(), ACE);
        assert_eq!(h.bottom(), TWO);
        assert!(h.has(TEN));
        h.remove(TEN);
        assert!(!h.has(TEN));
        assert_eq!(h.size(), 2);
    }

    #[test]
    fn test_at_or_above() {
        let mut h = Holding::empty();
        h.add(ACE);
        h.add(JACK);
        h.add(FIVE);
        let top = h.at_or_above(JACK);
        assert_eq!(top.size(), 2);
        assert!(top.has(ACE));
        assert!(top.has(JACK));
        assert!(!top.has(FIVE));
    }

    #[test]
    fn test_iter_descending() {
        let mut h = Holding::empty();
        h.add(THREE);
        h.add(KING);
        h.add(NINE);
        let ranks: Vec<Rank> = h.iter().collect();
        assert_eq!(ranks, vec![KING, NINE, THREE]);
    }

    #[test]
    fn test_display() {
        let mut h = Holding::empty();
        h.add(ACE);
        h.add(KING);
        h.add(TEN);
        h.add(EIGHT);
        assert_eq!(h.to_string(), "AKT8");
        assert_eq!(Holding::empty().to_string(), "-");
    }

    #[test]
    fn test_from_pbn() {
        let diagram = Diagram::from_pbn(
            "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72",
        )
        .unwrap();
        assert_eq!(diagram.holding(NORTH, SPADE).to_string(), "AKQT3");
        assert_eq!(diagram.holding(EAST, HEART).to_string(), "AK42");
        assert_eq!(diagram.holding(SOUTH, DIAMOND).to_string(), "T");
        assert_eq!(diagram.holding(WEST, CLUB).to_string(), "QJ72");
        assert_eq!(diagram.total_cards(), TOTAL_CARDS);
        for suit in 0..NUM_SUITS {
            assert_eq!(diagram.suit_aggregate(suit), Holding::all());
        }
    }

    #[test]
    fn test_from_pbn_voids_and_subdeals() {
        let diagram = Diagram::from_pbn("N:AKQJ... .5432.. ..5432. ...5432").unwrap();
        assert_eq!(diagram.holding(NORTH, SPADE).size(), 4);
        assert!(diagram.holding(NORTH, HEART).is_empty());
        assert_eq!(diagram.holding(WEST, CLUB).size(), 4);
        assert_eq!(diagram.total_cards(), 16);
    }

    #[test]
    fn test_from_pbn_rejects_garbage() {
        assert!(Diagram::from_pbn("N:AKQJ...").is_none());
        assert!(Diagram::from_pbn("N:AA.. .. .. ..").is_none());
        assert!(Diagram::from_pbn("X:A... K... Q... J...").is_none());
    }
}
