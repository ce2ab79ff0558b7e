//! Legal move generation with equivalence collapsing
//!
//! Cards a seat holds that are consecutive among the cards still in play
//! for their suit are interchangeable: playing any of them leads to the
//! same number of tricks. Only the top card of each such run is generated;
//! the lower members are carried in the move's `sequence` so callers can
//! expand them when reporting.
//!
//! Cards lying in the current, unfinished trick still count as in play: a
//! rank on the table splits a run, because beating it and ducking under it
//! are different plays.

use crate::holding::Holding;
use crate::position::Position;
use crate::types::*;

/// One generated play. `sequence` holds the equivalent lower cards of the
/// same run.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Move {
    pub suit: Suit,
    pub rank: Rank,
    pub sequence: Holding,
    pub weight: i32,
}

/// At most one move per rank of one suit, plus one spare for a full suit.
pub const MAX_MOVES: usize = NUM_RANKS + 1;

/// The ordered moves of one ply.
#[derive(Clone, Copy)]
pub struct MovePly {
    pub moves: [Move; MAX_MOVES],
    pub count: usize,
}

impl MovePly {
    pub fn new() -> Self {
        MovePly { moves: [Move::default(); MAX_MOVES], count: 0 }
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.count]
    }
}

impl Default for MovePly {
    fn default() -> Self {
        MovePly::new()
    }
}

/// Does `mv` beat `high` given the trump suit? Higher rank in the same
/// suit, or any trump against a non-trump.
#[inline]
pub fn wins_over(trump: usize, mv: &Move, high: &Move) -> bool {
    if mv.suit == high.suit {
        mv.rank > high.rank
    } else {
        trump < NOTRUMP && mv.suit == trump
    }
}

/// Generate the legal moves for `seat` at `depth` into `ply`, collapsed to
/// equivalence-run representatives, weighted and sorted best first. `hint`
/// is a remembered best move from a matching stored position; it (or the
/// representative covering it) is tried first.
pub fn generate(
    pos: &Position,
    trump: usize,
    depth: usize,
    seat: Seat,
    hint: Option<(Suit, Rank)>,
    ply: &mut MovePly,
) {
    ply.count = 0;
    let cards_in_trick = depth % NUM_SEATS;

    if cards_in_trick == 0 {
        for suit in 0..NUM_SUITS {
            generate_suit(pos, seat, suit, Holding::empty(), ply);
        }
        for i in 0..ply.count {
            ply.moves[i].weight = lead_weight(pos, trump, seat, &ply.moves[i]);
        }
    } else {
        let trick_start = depth - cards_in_trick;
        let lead = pos.stack[trick_start].play.suit;
        let mut on_table = [Holding::empty(); NUM_SUITS];
        for d in trick_start..depth {
            let play = pos.stack[d].play;
            on_table[play.suit].add(play.rank);
        }
        if !pos.holding(seat, lead).is_empty() {
            generate_suit(pos, seat, lead, on_table[lead], ply);
        } else {
            for suit in 0..NUM_SUITS {
                generate_suit(pos, seat, suit, on_table[suit], ply);
            }
        }
        let high = pos.stack[depth - 1].high;
        let high_seat = pos.stack[depth - 1].high_seat;
        let trick_ending = cards_in_trick == NUM_SEATS - 1;
        for i in 0..ply.count {
            ply.moves[i].weight = follow_weight(
                pos,
                trump,
                lead,
                &high,
                high_seat,
                seat,
                trick_ending,
                &ply.moves[i],
            );
        }
    }

    if let Some((hsuit, hrank)) = hint {
        for i in 0..ply.count {
            let m = &mut ply.moves[i];
            if m.suit == hsuit && (m.rank == hrank || m.sequence.has(hrank)) {
                m.weight += 256;
                break;
            }
        }
    }

    insertion_sort(ply);
}

/// Walk the suit's in-play cards top-down; each maximal run of the mover's
/// cards becomes one move. `on_table` re-joins the ranks already played to
/// the current trick so they break runs like any other card.
fn generate_suit(pos: &Position, seat: Seat, suit: Suit, on_table: Holding, ply: &mut MovePly) {
    let own = pos.holding(seat, suit);
    if own.is_empty() {
        return;
    }
    let mut prev_mine = false;
    let mut last = 0;
    for rank in (pos.aggregate[suit] | on_table).iter() {
        if own.has(rank) {
            if prev_mine {
                ply.moves[last].sequence.add(rank);
            } else {
                last = ply.count;
                ply.moves[last] =
                    Move { suit, rank, sequence: Holding::empty(), weight: 0 };
                ply.count += 1;
            }
            prev_mine = true;
        } else {
            prev_mine = false;
        }
    }
}

/// Leads. The suit's outstanding winner comes first, then the second-best
/// card when partner holds the winner. Suits a defender can ruff are
/// marked down.
fn lead_weight(pos: &Position, trump: usize, seat: Seat, m: &Move) -> i32 {
    let mut weight = m.rank as i32;
    let winner = pos.winner[m.suit];
    if winner.present && m.rank == winner.rank {
        weight += 64;
    } else {
        let second = pos.second_best[m.suit];
        if second.present
            && m.rank == second.rank
            && winner.present
            && winner.seat == partner(seat)
        {
            weight += 48;
        }
    }
    if trump < NOTRUMP && m.suit != trump {
        for opp in [left_hand_opp(seat), right_hand_opp(seat)] {
            if pos.holding(opp, m.suit).is_empty() && !pos.holding(opp, trump).is_empty() {
                weight -= 16;
            }
        }
    }
    weight
}

/// Follows. A card that cannot win goes low first, and so does any card
/// under a partner whose play already holds the trick. Winners are tried
/// cheapest first when they settle the trick outright, high to low when
/// the left-hand opponent can still beat them. Ruffs get a bonus.
#[allow(clippy::too_many_arguments)]
fn follow_weight(
    pos: &Position,
    trump: usize,
    lead: Suit,
    high: &Move,
    high_seat: Seat,
    seat: Seat,
    trick_ending: bool,
    m: &Move,
) -> i32 {
    let low_first = (NUM_RANKS - 1 - m.rank) as i32;
    if !wins_over(trump, m, high) {
        return low_first;
    }

    let lho = left_hand_opp(seat);
    let lho_lead = pos.holding(lho, lead);
    if high_seat == partner(seat)
        && (trick_ending
            || lho_lead.is_empty()
            || high.suit != lead
            || high.rank > lho_lead.top())
    {
        return low_first;
    }

    let ruffing = trump < NOTRUMP && m.suit == trump && lead != trump;
    let settles = trick_ending
        || if ruffing {
            let lho_trumps = pos.holding(lho, trump);
            !lho_lead.is_empty() || lho_trumps.is_empty() || m.rank > lho_trumps.top()
        } else {
            lho_lead.is_empty() || m.rank > lho_lead.top()
        };
    let mut weight = if settles { 80 + low_first } else { 64 + m.rank as i32 };
    if ruffing {
        weight += 32;
    }
    weight
}

/// Stable sort, highest weight first.
fn insertion_sort(ply: &mut MovePly) {
    for i in 1..ply.count {
        let m = ply.moves[i];
        let mut j = i;
        while j > 0 && ply.moves[j - 1].weight < m.weight {
            ply.moves[j] = ply.moves[j - 1];
            j -= 1;
        }
        ply.moves[j] = m;
    }
}
