//! Boolean alpha-beta search
//!
//! The engine answers one question per call: does the maximizing side take
//! at least `target` of the remaining tricks? Both sides play perfectly
//! with all four hands visible. The maximizing side is the pair of the
//! seat to move at the root, so a proved `target` means that pair has a
//! strategy reaching it against any defense.
//!
//! The search runs on a single reversible `Position`. At every trick
//! boundary it tries, in order: settled outcomes from the banked trick
//! count, the last-trick shortcut, a conservative quick-trick count, and a
//! transposition probe. Only then does it expand moves. On the way back up
//! each node unions the ranks that actually won tricks below it into its
//! own frame; at the boundary those ranks define the equivalence class
//! under which the proved or refuted bound is stored.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::holding::Holding;
use crate::moves::{self, Move, MovePly};
use crate::position::{Position, MAX_PLIES};
use crate::rel::RelativeRanks;
use crate::store::MemoStore;
use crate::tables::LookupTables;
use crate::types::*;

/// Shared cancellation flag, checked every few thousand nodes.
#[derive(Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub const fn new() -> Self {
        CancelFlag(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The search was cancelled before finishing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

pub struct SearchEngine<'a> {
    tables: &'a LookupTables,
    rel: &'a RelativeRanks,
    store: &'a mut MemoStore,
    pub pos: Position,
    moves: [MovePly; MAX_PLIES],
    trump: usize,
    maximizing: [bool; NUM_SEATS],
    total_tricks: usize,
    root_depth: usize,
    nodes: u64,
    cancel: Option<&'a CancelFlag>,
    check_interval: u64,
}

impl<'a> SearchEngine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tables: &'a LookupTables,
        rel: &'a RelativeRanks,
        store: &'a mut MemoStore,
        pos: Position,
        trump: usize,
        total_tricks: usize,
        root_depth: usize,
        root_side: Seat,
        cancel: Option<&'a CancelFlag>,
        check_interval: u64,
    ) -> Self {
        let mut maximizing = [false; NUM_SEATS];
        maximizing[root_side] = true;
        maximizing[partner(root_side)] = true;
        SearchEngine {
            tables,
            rel,
            store,
            pos,
            moves: [MovePly::new(); MAX_PLIES],
            trump,
            maximizing,
            total_tricks,
            root_depth,
            nodes: 0,
            cancel,
            check_interval: check_interval.max(1),
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// The seat to move at `depth`.
    pub fn seat_to_play(&self, depth: usize) -> Seat {
        if depth % NUM_SEATS == 0 {
            self.pos.stack[depth].leader
        } else {
            next_seat(self.pos.stack[depth - 1].seat)
        }
    }

    /// Can the maximizing side take at least `target` tricks?
    pub fn prove(&mut self, target: i32) -> Result<bool, Cancelled> {
        self.search(self.root_depth, target)
    }

    /// Like `prove`, with the root seat's first card forced to `mv`.
    pub fn prove_with_first(&mut self, mv: Move, target: i32) -> Result<bool, Cancelled> {
        let depth = self.root_depth;
        let seat = self.seat_to_play(depth);
        self.make(depth, mv, seat);
        let result = self.search(depth + 1, target);
        self.unmake(depth, mv, seat);
        result
    }

    /// Exact trick count for the maximizing side, by binary search over
    /// targets. `seed` is probed first when it is informative.
    pub fn exact_score(&mut self, seed: usize) -> Result<i32, Cancelled> {
        let remaining = (self.total_tricks - self.root_depth / NUM_SEATS) as i32;
        let mut lo = 0;
        let mut hi = remaining;
        let seed = seed as i32;
        if seed >= 1 && seed <= remaining {
            if self.prove(seed)? {
                lo = seed;
            } else {
                hi = seed - 1;
            }
        }
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.prove(mid)? {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(lo)
    }

    /// Exact trick count after the root seat plays `mv`.
    pub fn score_with_first(&mut self, mv: Move, seed: usize) -> Result<i32, Cancelled> {
        let remaining = (self.total_tricks - self.root_depth / NUM_SEATS) as i32;
        let mut lo = 0;
        let mut hi = remaining;
        let seed = seed as i32;
        if seed >= 1 && seed <= remaining {
            if self.prove_with_first(mv, seed)? {
                lo = seed;
            } else {
                hi = seed - 1;
            }
        }
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.prove_with_first(mv, mid)? {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(lo)
    }

    /// The moves open to the seat on play at the root.
    pub fn root_moves(&self) -> MovePly {
        let depth = self.root_depth;
        let seat = self.seat_to_play(depth);
        let mut ply = MovePly::new();
        moves::generate(&self.pos, self.trump, depth, seat, None, &mut ply);
        ply
    }

    fn tick(&mut self) -> Result<(), Cancelled> {
        self.nodes += 1;
        if let Some(flag) = self.cancel {
            if self.nodes % self.check_interval == 0 && flag.is_cancelled() {
                return Err(Cancelled);
            }
        }
        Ok(())
    }

    fn search(&mut self, depth: usize, target: i32) -> Result<bool, Cancelled> {
        self.tick()?;
        let cards_in_trick = depth % NUM_SEATS;
        let seat = self.seat_to_play(depth);
        self.pos.stack[depth].win_ranks = [Holding::empty(); NUM_SUITS];

        let remaining = (self.total_tricks - depth / NUM_SEATS) as i32;
        let mut hint = None;
        if cards_in_trick == 0 {
            if self.pos.tricks_max >= target {
                return Ok(true);
            }
            if self.pos.tricks_max + remaining < target {
                return Ok(false);
            }
            if remaining == 1 {
                return Ok(self.last_trick(depth, seat, target));
            }
            #[cfg(not(feature = "no_quick_tricks"))]
            if let Some((settled, sure)) = self.quick_tricks(depth, seat, target) {
                // Cashable tricks bound the class for every target, so the
                // decision is worth remembering.
                if self.store.is_enabled() {
                    let (lbound, ubound) =
                        if settled { (sure, remaining) } else { (0, remaining - sure) };
                    self.store_bounds(depth, seat, remaining, lbound as i8, ubound as i8, None);
                }
                return Ok(settled);
            }

            self.pos.compute_order_set(self.rel);
            let key = self.pos.suit_lengths(seat);
            let rel_target = target - self.pos.tricks_max;
            let probe = self.store.probe(
                remaining as usize,
                seat,
                key,
                &self.pos.order_set,
                rel_target,
            );
            if let Some((value, least_win)) = probe.decided {
                self.pos.win_adapt(self.tables, depth, &least_win);
                #[cfg(feature = "debug_search")]
                eprintln!("memo hit depth={depth} target={target} value={value}");
                return Ok(value);
            }
            hint = probe.hint;
        }

        let (value, best) = self.expand(depth, seat, target, hint)?;

        if cards_in_trick == 0 && self.store.is_enabled() {
            let rel_target = target - self.pos.tricks_max;
            let (lbound, ubound) = if value {
                (rel_target as i8, remaining as i8)
            } else {
                (0, (rel_target - 1) as i8)
            };
            self.store_bounds(depth, seat, remaining, lbound, ubound, best);
        }
        Ok(value)
    }

    fn expand(
        &mut self,
        depth: usize,
        seat: Seat,
        target: i32,
        hint: Option<(Suit, Rank)>,
    ) -> Result<(bool, Option<Move>), Cancelled> {
        moves::generate(&self.pos, self.trump, depth, seat, hint, &mut self.moves[depth]);
        let count = self.moves[depth].count;
        debug_assert!(count > 0);

        let maximizing = self.maximizing[seat];
        let mut value = !maximizing;
        let mut best = None;
        for i in 0..count {
            let mv = self.moves[depth].moves[i];
            self.make(depth, mv, seat);
            let child = self.search(depth + 1, target);
            self.unmake(depth, mv, seat);
            let child = child?;

            self.absorb_child_winners(depth);

            if child == maximizing {
                value = child;
                best = Some(mv);
                break;
            }
        }
        Ok((value, best))
    }

    /// Union the child frame's winning ranks into this frame. When this
    /// ply closed a trick that was decided on rank (some other card of the
    /// winning suit was played to it), the winning rank joins too.
    fn absorb_child_winners(&mut self, depth: usize) {
        let mut contrib = self.pos.stack[depth + 1].win_ranks;
        if depth % NUM_SEATS == NUM_SEATS - 1 {
            let high = self.pos.stack[depth].high;
            let trick_start = depth + 1 - NUM_SEATS;
            let mut same_suit = 0;
            for d in trick_start..=depth {
                if self.pos.stack[d].play.suit == high.suit {
                    same_suit += 1;
                }
            }
            if same_suit >= 2 {
                contrib[high.suit].add(high.rank);
            }
        }
        for suit in 0..NUM_SUITS {
            self.pos.stack[depth].win_ranks[suit] =
                self.pos.stack[depth].win_ranks[suit] | contrib[suit];
        }
    }

    fn make(&mut self, depth: usize, mv: Move, seat: Seat) {
        self.pos.remove_rank(seat, mv.suit, mv.rank);
        self.pos.update_high_cards(self.tables, mv.suit);

        let cards_in_trick = depth % NUM_SEATS;
        if cards_in_trick == 0 {
            let frame = &mut self.pos.stack[depth];
            frame.play = mv;
            frame.seat = seat;
            frame.high = mv;
            frame.high_seat = seat;
        } else {
            let leader = self.pos.stack[depth - 1].leader;
            let prev_high = self.pos.stack[depth - 1].high;
            let prev_high_seat = self.pos.stack[depth - 1].high_seat;
            let beats = moves::wins_over(self.trump, &mv, &prev_high);
            let frame = &mut self.pos.stack[depth];
            frame.leader = leader;
            frame.play = mv;
            frame.seat = seat;
            if beats {
                frame.high = mv;
                frame.high_seat = seat;
            } else {
                frame.high = prev_high;
                frame.high_seat = prev_high_seat;
            }
        }

        if cards_in_trick == NUM_SEATS - 1 {
            let winner = self.pos.stack[depth].high_seat;
            if self.maximizing[winner] {
                self.pos.tricks_max += 1;
            }
            self.pos.stack[depth + 1].leader = winner;
        }
    }

    fn unmake(&mut self, depth: usize, mv: Move, seat: Seat) {
        if depth % NUM_SEATS == NUM_SEATS - 1 && self.maximizing[self.pos.stack[depth].high_seat]
        {
            self.pos.tricks_max -= 1;
        }
        self.pos.restore_rank(seat, mv.suit, mv.rank);
        self.pos.update_high_cards(self.tables, mv.suit);
    }

    /// Resolve the final trick directly: every hand is down to one card.
    fn last_trick(&mut self, depth: usize, leader: Seat, target: i32) -> bool {
        let mut high = Move::default();
        let mut high_seat = leader;
        let mut suits = [0; NUM_SEATS];
        for i in 0..NUM_SEATS {
            let seat = (leader + i) % NUM_SEATS;
            let mut played = Move::default();
            for suit in 0..NUM_SUITS {
                let h = self.pos.holding(seat, suit);
                if !h.is_empty() {
                    played = Move { suit, rank: h.top(), ..Move::default() };
                    break;
                }
            }
            suits[i] = played.suit;
            if i == 0 || moves::wins_over(self.trump, &played, &high) {
                high = played;
                high_seat = seat;
            }
        }
        let by_rank = suits.iter().filter(|&&s| s == high.suit).count() >= 2;
        if by_rank {
            self.pos.stack[depth].win_ranks[high.suit].add(high.rank);
        }
        let tricks = self.pos.tricks_max + i32::from(self.maximizing[high_seat]);
        tricks >= target
    }

    /// Tricks the leader can bank immediately by cashing top cards. Side
    /// suits only count when neither defender holds a trump and partner
    /// cannot be forced to ruff. Proves for a maximizing leader, refutes
    /// for a minimizing one; the settled decision comes back with the
    /// cashable count, `None` when nothing is settled.
    fn quick_tricks(&mut self, depth: usize, leader: Seat, target: i32) -> Option<(bool, i32)> {
        let remaining = (self.total_tricks - depth / NUM_SEATS) as i32;
        let trumping = self.trump < NOTRUMP;
        let defenders_trumpless = !trumping
            || (self.pos.holding(left_hand_opp(leader), self.trump).is_empty()
                && self.pos.holding(right_hand_opp(leader), self.trump).is_empty());
        let pard = partner(leader);
        let pard_only_trumps = trumping
            && (0..NUM_SUITS)
                .filter(|&suit| suit != self.trump)
                .all(|suit| self.pos.holding(pard, suit).is_empty())
            && !self.pos.holding(pard, self.trump).is_empty();

        let mut sure = 0;
        let mut won = [Holding::empty(); NUM_SUITS];
        for suit in 0..NUM_SUITS {
            let side_suit = !trumping || suit != self.trump;
            if side_suit && trumping && !defenders_trumpless {
                continue;
            }
            let own = self.pos.holding(leader, suit);
            if own.is_empty() {
                continue;
            }
            // Partner forced to ruff partner's winner would break the run
            if side_suit && pard_only_trumps && self.pos.holding(pard, suit).is_empty() {
                continue;
            }
            let mut run = Holding::empty();
            for rank in self.pos.aggregate[suit].iter() {
                if !own.has(rank) {
                    break;
                }
                run.add(rank);
                sure += 1;
            }
            won[suit] = run;
        }
        if sure == 0 {
            return None;
        }
        let sure = sure.min(remaining);

        if self.maximizing[leader] {
            if self.pos.tricks_max + sure >= target {
                for suit in 0..NUM_SUITS {
                    self.pos.stack[depth].win_ranks[suit] = won[suit];
                }
                return Some((true, sure));
            }
        } else if self.pos.tricks_max + remaining - sure < target {
            for suit in 0..NUM_SUITS {
                self.pos.stack[depth].win_ranks[suit] = won[suit];
            }
            return Some((false, sure));
        }
        None
    }

    /// Store proved bounds under this position's class.
    fn store_bounds(
        &mut self,
        depth: usize,
        seat: Seat,
        remaining: i32,
        lbound: i8,
        ubound: i8,
        best: Option<Move>,
    ) {
        self.pos.compute_order_set(self.rel);
        let key = self.pos.suit_lengths(seat);
        debug_assert!(0 <= lbound && lbound <= ubound && i32::from(ubound) <= remaining);

        let mut least_win = [0u8; NUM_SUITS];
        for suit in 0..NUM_SUITS {
            let winners = self.pos.stack[depth].win_ranks[suit];
            self.pos.compute_win_data(self.rel, suit, winners);
            least_win[suit] = self.pos.least_win[suit] as u8;
        }
        let win_order_set = self.pos.win_order_set;
        let win_mask = self.pos.win_mask;
        self.store.store(
            remaining as usize,
            seat,
            key,
            &win_order_set,
            &win_mask,
            lbound,
            ubound,
            best.map(|m| (m.suit, m.rank)),
            least_win,
        );
    }
}
