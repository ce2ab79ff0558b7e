//! Suits, ranks and seats as plain indices, with the letter codes used by
//! deal notation.

pub type Suit = usize;
pub const SPADE: Suit = 0;
pub const HEART: Suit = 1;
pub const DIAMOND: Suit = 2;
pub const CLUB: Suit = 3;
pub const NUM_SUITS: usize = 4;
/// Strain index one past the suits.
pub const NOTRUMP: usize = NUM_SUITS;

/// Ranks run bottom-up so that a rank doubles as its holding bit.
pub type Rank = usize;
pub const TWO: Rank = 0;
pub const THREE: Rank = 1;
pub const FOUR: Rank = 2;
pub const FIVE: Rank = 3;
pub const SIX: Rank = 4;
pub const SEVEN: Rank = 5;
pub const EIGHT: Rank = 6;
pub const NINE: Rank = 7;
pub const TEN: Rank = 8;
pub const JACK: Rank = 9;
pub const QUEEN: Rank = 10;
pub const KING: Rank = 11;
pub const ACE: Rank = 12;
pub const NUM_RANKS: usize = 13;

/// Seats in rotation order.
pub type Seat = usize;
pub const WEST: Seat = 0;
pub const NORTH: Seat = 1;
pub const EAST: Seat = 2;
pub const SOUTH: Seat = 3;
pub const NUM_SEATS: usize = 4;

pub const TOTAL_TRICKS: usize = NUM_RANKS;
pub const TOTAL_CARDS: usize = NUM_RANKS * NUM_SUITS;

// Letter codes, indexed by the constants above.
const SUIT_LETTERS: &str = "SHDCN";
const RANK_LETTERS: &str = "23456789TJQKA";
const SEAT_LETTERS: &str = "WNES";

const SUIT_NAMES: [&str; NUM_SUITS + 1] = ["Spade", "Heart", "Diamond", "Club", "NoTrump"];
const SEAT_NAMES: [&str; NUM_SEATS] = ["West", "North", "East", "South"];

#[inline]
pub fn partner(seat: Seat) -> Seat {
    (seat + 2) % NUM_SEATS
}

#[inline]
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % NUM_SEATS
}

#[inline]
pub fn left_hand_opp(seat: Seat) -> Seat {
    next_seat(seat)
}

#[inline]
pub fn right_hand_opp(seat: Seat) -> Seat {
    (seat + NUM_SEATS - 1) % NUM_SEATS
}

pub fn suit_name(suit: Suit) -> &'static str {
    SUIT_NAMES[suit]
}

pub fn seat_name(seat: Seat) -> &'static str {
    SEAT_NAMES[seat]
}

pub fn suit_letter(suit: Suit) -> char {
    SUIT_LETTERS.as_bytes()[suit] as char
}

pub fn rank_name(rank: Rank) -> char {
    RANK_LETTERS.as_bytes()[rank] as char
}

pub fn seat_letter(seat: Seat) -> char {
    SEAT_LETTERS.as_bytes()[seat] as char
}

pub fn char_to_suit(c: char) -> Option<Suit> {
    SUIT_LETTERS.find(c.to_ascii_uppercase())
}

pub fn char_to_rank(c: char) -> Option<Rank> {
    RANK_LETTERS.find(c.to_ascii_uppercase())
}

pub fn char_to_seat(c: char) -> Option<Seat> {
    SEAT_LETTERS.find(c.to_ascii_uppercase())
}
