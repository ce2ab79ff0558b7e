//! Deal-level solving on top of the boolean search
//!
//! `Solver::solve_board` takes a deal (optionally mid-trick), validates it,
//! and answers according to the requested mode: prove a fixed target, or
//! find the exact makeable trick count by binary search over targets. All
//! targets of one deal share the transposition store since stored bounds
//! are relative to the tricks remaining, not to any target.
//!
//! Scores are always counted for the pair of the seat on play at the root.

use std::error::Error;
use std::fmt;

use crate::holding::{Diagram, Holding};
use crate::moves::{wins_over, Move, MovePly};
use crate::position::Position;
use crate::rel::RelativeRanks;
use crate::search::{CancelFlag, Cancelled, SearchEngine};
use crate::store::{MemoConfig, MemoStore};
use crate::tables::LookupTables;
use crate::types::*;

/// One card: suit and rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

/// How many of the root seat's cards to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solutions {
    /// One card achieving the result.
    BestOnly,
    /// Every card achieving the best result.
    AllOptimal,
    /// Every legal card with its own score.
    AllScores,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Only decide whether `target` is reachable.
    ProveTarget,
    /// Find the exact makeable trick count; `target` seeds the search.
    Exact,
}

/// A board to solve. `current_trick` holds up to three cards already
/// played to the trick in progress, in play order starting with the
/// leader; those cards must not appear in the diagram.
#[derive(Clone, Debug)]
pub struct SolveRequest {
    pub diagram: Diagram,
    pub trump: usize,
    pub leader: Seat,
    pub current_trick: Vec<Card>,
    pub target: usize,
    pub solutions: Solutions,
    pub mode: SearchMode,
}

impl SolveRequest {
    pub fn new(diagram: Diagram, trump: usize, leader: Seat) -> Self {
        SolveRequest {
            diagram,
            trump,
            leader,
            current_trick: Vec::new(),
            target: 1,
            solutions: Solutions::BestOnly,
            mode: SearchMode::Exact,
        }
    }
}

/// One reported card of the root seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardScore {
    pub suit: Suit,
    pub rank: Rank,
    /// True for a lower member of the previous card's equivalence run.
    pub equals: bool,
    /// Tricks the root pair takes when this card is played.
    pub score: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveResult {
    pub nodes: u64,
    pub target_reached: bool,
    pub cards: Vec<CardScore>,
}

impl SolveResult {
    /// Best score over the reported cards.
    pub fn max_score(&self) -> i32 {
        self.cards.iter().map(|c| c.score).max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(SolveResult),
    Cancelled,
}

impl SolveOutcome {
    pub fn solved(self) -> Option<SolveResult> {
        match self {
            SolveOutcome::Solved(result) => Some(result),
            SolveOutcome::Cancelled => None,
        }
    }
}

/// A rejected board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputError {
    BadTrump(usize),
    BadLeader(usize),
    BadCard { suit: usize, rank: usize },
    TargetOutOfRange(usize),
    TrickTooLong(usize),
    DuplicateTrickCard { suit: Suit, rank: Rank },
    TrickCardInDiagram { suit: Suit, rank: Rank },
    OverlappingHoldings { suit: Suit },
    WrongSuitCount { suit: Suit, count: usize },
    UnbalancedHands,
    EmptyDeal,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InputError::BadTrump(trump) => write!(f, "invalid trump {}", trump),
            InputError::BadLeader(leader) => write!(f, "invalid leader {}", leader),
            InputError::BadCard { suit, rank } => {
                write!(f, "invalid card suit={} rank={}", suit, rank)
            }
            InputError::TargetOutOfRange(target) => {
                write!(f, "target {} exceeds {} tricks", target, TOTAL_TRICKS)
            }
            InputError::TrickTooLong(cards) => {
                write!(f, "{} cards in the current trick, at most 3 allowed", cards)
            }
            InputError::DuplicateTrickCard { suit, rank } => {
                write!(f, "duplicate trick card {}{}", suit_letter(suit), rank_name(rank))
            }
            InputError::TrickCardInDiagram { suit, rank } => write!(
                f,
                "trick card {}{} still present in the diagram",
                suit_letter(suit),
                rank_name(rank)
            ),
            InputError::OverlappingHoldings { suit } => {
                write!(f, "{}s held by more than one seat", suit_name(suit))
            }
            InputError::WrongSuitCount { suit, count } => {
                write!(f, "{} {}s in a 52-card deal", count, suit_name(suit))
            }
            InputError::UnbalancedHands => write!(f, "hand sizes do not match the trick state"),
            InputError::EmptyDeal => write!(f, "no cards to play"),
        }
    }
}

impl Error for InputError {}

#[derive(Clone, Copy, Debug, Default)]
pub struct SolveConfig {
    pub memo: MemoConfig,
    pub cancel_check_interval: u64,
}

impl SolveConfig {
    fn interval(&self) -> u64 {
        if self.cancel_check_interval == 0 {
            4096
        } else {
            self.cancel_check_interval
        }
    }
}

/// Reusable solver: owns the per-deal relative-rank tables and the
/// transposition store, borrows the global lookup tables.
pub struct Solver<'a> {
    tables: &'a LookupTables,
    rel: RelativeRanks,
    store: MemoStore,
    config: SolveConfig,
}

impl<'a> Solver<'a> {
    pub fn new(tables: &'a LookupTables) -> Self {
        Solver::with_config(tables, SolveConfig::default())
    }

    pub fn with_config(tables: &'a LookupTables, config: SolveConfig) -> Self {
        Solver { tables, rel: RelativeRanks::new(), store: MemoStore::new(config.memo), config }
    }

    /// Solve one board. Returns `Ok(SolveOutcome::Cancelled)` when `cancel`
    /// fires mid-search; invalid boards fail with an `InputError` before
    /// any searching happens.
    pub fn solve_board(
        &mut self,
        req: &SolveRequest,
        cancel: Option<&CancelFlag>,
    ) -> Result<SolveOutcome, InputError> {
        let total_tricks = validate(req)?;
        self.rel.initialize(&req.diagram);
        self.store.reset();

        let mut pos = Position::new(req.diagram, self.tables);
        pos.stack[0].leader = req.leader;
        let mut seat = req.leader;
        for (i, card) in req.current_trick.iter().enumerate() {
            let mv = Move { suit: card.suit, rank: card.rank, ..Move::default() };
            let frame = &mut pos.stack[i];
            frame.leader = req.leader;
            frame.play = mv;
            frame.seat = seat;
            if i == 0 {
                frame.high = mv;
                frame.high_seat = seat;
            } else {
                let prev_high = pos.stack[i - 1].high;
                let prev_high_seat = pos.stack[i - 1].high_seat;
                let frame = &mut pos.stack[i];
                if wins_over(req.trump, &mv, &prev_high) {
                    frame.high = mv;
                    frame.high_seat = seat;
                } else {
                    frame.high = prev_high;
                    frame.high_seat = prev_high_seat;
                }
            }
            seat = next_seat(seat);
        }
        let root_depth = req.current_trick.len();
        let root_side = seat;

        let mut engine = SearchEngine::new(
            self.tables,
            &self.rel,
            &mut self.store,
            pos,
            req.trump,
            total_tricks,
            root_depth,
            root_side,
            cancel,
            self.config.interval(),
        );

        let outcome = match req.mode {
            SearchMode::ProveTarget => run_prove(&mut engine, req),
            SearchMode::Exact => run_exact(&mut engine, req, total_tricks),
        };
        match outcome {
            Ok(result) => Ok(SolveOutcome::Solved(result)),
            Err(Cancelled) => Ok(SolveOutcome::Cancelled),
        }
    }
}

/// Root candidates in reporting order: suit index first, rank descending.
fn candidates(ply: &MovePly) -> Vec<Move> {
    let mut moves: Vec<Move> = ply.as_slice().to_vec();
    moves.sort_by(|a, b| a.suit.cmp(&b.suit).then(b.rank.cmp(&a.rank)));
    moves
}

fn push_with_equals(rows: &mut Vec<CardScore>, mv: &Move, score: i32) {
    rows.push(CardScore { suit: mv.suit, rank: mv.rank, equals: false, score });
    for rank in mv.sequence.iter() {
        rows.push(CardScore { suit: mv.suit, rank, equals: true, score });
    }
}

fn sort_rows(rows: &mut [CardScore]) {
    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.suit.cmp(&b.suit))
            .then(b.rank.cmp(&a.rank))
    });
}

fn run_prove(engine: &mut SearchEngine, req: &SolveRequest) -> Result<SolveResult, Cancelled> {
    let target = req.target as i32;
    let reached = engine.prove(target)?;
    let mut rows = Vec::new();
    if reached {
        for mv in candidates(&engine.root_moves()) {
            if engine.prove_with_first(mv, target)? {
                push_with_equals(&mut rows, &mv, target);
                if req.solutions == Solutions::BestOnly {
                    break;
                }
            }
        }
        sort_rows(&mut rows);
    }
    Ok(SolveResult { nodes: engine.nodes(), target_reached: reached, cards: rows })
}

fn run_exact(
    engine: &mut SearchEngine,
    req: &SolveRequest,
    total_tricks: usize,
) -> Result<SolveResult, Cancelled> {
    let mut rows = Vec::new();
    let best;
    match req.solutions {
        Solutions::AllScores => {
            let mut seed = req.target.min(total_tricks);
            let mut top = 0;
            for mv in candidates(&engine.root_moves()) {
                let score = engine.score_with_first(mv, seed)?;
                push_with_equals(&mut rows, &mv, score);
                top = top.max(score);
                seed = score as usize;
            }
            best = top;
            sort_rows(&mut rows);
        }
        Solutions::BestOnly | Solutions::AllOptimal => {
            let exact = engine.exact_score(req.target.min(total_tricks))?;
            for mv in candidates(&engine.root_moves()) {
                if engine.prove_with_first(mv, exact)? {
                    push_with_equals(&mut rows, &mv, exact);
                    if req.solutions == Solutions::BestOnly {
                        break;
                    }
                }
            }
            best = exact;
            sort_rows(&mut rows);
        }
    }
    Ok(SolveResult {
        nodes: engine.nodes(),
        target_reached: best >= req.target as i32,
        cards: rows,
    })
}

fn validate(req: &SolveRequest) -> Result<usize, InputError> {
    if req.trump > NOTRUMP {
        return Err(InputError::BadTrump(req.trump));
    }
    if req.leader >= NUM_SEATS {
        return Err(InputError::BadLeader(req.leader));
    }
    if req.target > TOTAL_TRICKS {
        return Err(InputError::TargetOutOfRange(req.target));
    }
    if req.current_trick.len() > NUM_SEATS - 1 {
        return Err(InputError::TrickTooLong(req.current_trick.len()));
    }

    let mut trick_cards = [Holding::empty(); NUM_SUITS];
    for card in &req.current_trick {
        if card.suit >= NUM_SUITS || card.rank >= NUM_RANKS {
            return Err(InputError::BadCard { suit: card.suit, rank: card.rank });
        }
        if trick_cards[card.suit].has(card.rank) {
            return Err(InputError::DuplicateTrickCard { suit: card.suit, rank: card.rank });
        }
        trick_cards[card.suit].add(card.rank);
        if req.diagram.suit_aggregate(card.suit).has(card.rank) {
            return Err(InputError::TrickCardInDiagram { suit: card.suit, rank: card.rank });
        }
    }

    for suit in 0..NUM_SUITS {
        let mut seen = Holding::empty();
        for seat in 0..NUM_SEATS {
            let h = req.diagram.holding(seat, suit);
            if !(seen & h).is_empty() {
                return Err(InputError::OverlappingHoldings { suit });
            }
            seen = seen | h;
        }
    }

    // Full 52-card boards must have 13 cards per suit; sub-deals skip this.
    if req.diagram.total_cards() + req.current_trick.len() == TOTAL_CARDS {
        for suit in 0..NUM_SUITS {
            let count = req.diagram.suit_aggregate(suit).size() + trick_cards[suit].size();
            if count != NUM_RANKS {
                return Err(InputError::WrongSuitCount { suit, count });
            }
        }
    }

    // Seats that already played to the trick hold one card fewer.
    let played = req.current_trick.len();
    let tricks = req.diagram.hand_size((req.leader + played) % NUM_SEATS);
    if tricks == 0 {
        return Err(InputError::EmptyDeal);
    }
    for i in 0..NUM_SEATS {
        let seat = (req.leader + i) % NUM_SEATS;
        let want = if i < played { tricks - 1 } else { tricks };
        if req.diagram.hand_size(seat) != want {
            return Err(InputError::UnbalancedHands);
        }
    }
    Ok(tricks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> SolveRequest {
        let diagram = Diagram::from_pbn("N:AKQJ... .5432.. ..5432. ...5432").unwrap();
        SolveRequest::new(diagram, NOTRUMP, NORTH)
    }

    #[test]
    fn test_validate_accepts_subdeal() {
        assert_eq!(validate(&base_request()), Ok(4));
    }

    #[test]
    fn test_validate_bad_trump_and_leader() {
        let mut req = base_request();
        req.trump = 7;
        assert_eq!(validate(&req), Err(InputError::BadTrump(7)));
        let mut req = base_request();
        req.leader = 9;
        assert_eq!(validate(&req), Err(InputError::BadLeader(9)));
    }

    #[test]
    fn test_validate_target_range() {
        let mut req = base_request();
        req.target = TOTAL_TRICKS + 1;
        assert!(matches!(validate(&req), Err(InputError::TargetOutOfRange(_))));
    }

    #[test]
    fn test_validate_overlap() {
        let mut req = base_request();
        // The spade ace in two hands at once
        req.diagram.holding_mut(EAST, SPADE).add(ACE);
        assert_eq!(validate(&req), Err(InputError::OverlappingHoldings { suit: SPADE }));
    }

    #[test]
    fn test_validate_unbalanced() {
        let mut req = base_request();
        req.diagram.holding_mut(EAST, HEART).remove(FIVE);
        assert_eq!(validate(&req), Err(InputError::UnbalancedHands));
    }

    #[test]
    fn test_validate_trick_card_must_leave_diagram() {
        let mut req = base_request();
        req.leader = WEST;
        // West "led" the club five but it is still in the diagram
        req.current_trick = vec![Card { suit: CLUB, rank: FIVE }];
        assert_eq!(
            validate(&req),
            Err(InputError::TrickCardInDiagram { suit: CLUB, rank: FIVE })
        );
    }

    #[test]
    fn test_validate_partial_trick_sizes() {
        let diagram = Diagram::from_pbn("N:AKQJ... .543.. ..543. ...543").unwrap();
        let mut req = SolveRequest::new(diagram, NOTRUMP, EAST);
        // East led a heart, South and West have played; North is on play
        // with four cards, the others with three.
        req.current_trick = vec![
            Card { suit: HEART, rank: SIX },
            Card { suit: DIAMOND, rank: TWO },
            Card { suit: CLUB, rank: TWO },
        ];
        assert_eq!(validate(&req), Ok(4));
    }

    #[test]
    fn test_validate_full_board() {
        let diagram = Diagram::from_pbn(
            "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 J74.QT95.T.AK863 98.873.9653.QJ72",
        )
        .unwrap();
        let mut req = SolveRequest::new(diagram, NOTRUMP, WEST);
        assert_eq!(validate(&req), Ok(13));

        // Removing a single card leaves a sub-deal with uneven hands
        req.diagram.holding_mut(WEST, SPADE).remove(NINE);
        assert_eq!(validate(&req), Err(InputError::UnbalancedHands));
    }

    #[test]
    fn test_validate_empty_deal() {
        let req = SolveRequest::new(Diagram::new(), NOTRUMP, WEST);
        assert_eq!(validate(&req), Err(InputError::EmptyDeal));
    }
}
