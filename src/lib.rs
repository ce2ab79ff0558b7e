//! Double-dummy bridge solver kernel
//!
//! Computes, for a deal with all four hands visible, how many of the
//! remaining tricks the side on play can take against perfect defense.
//!
//! The kernel works with:
//! - 13-bit per-suit holdings and a per-deal relative-rank table that
//!   renumbers surviving cards as low ones disappear
//! - Move generation collapsing equivalent touching cards to one
//!   representative
//! - A transposition store keyed by suit-length signatures and matched by
//!   strategic-equivalence classes over the trick-winning ranks
//! - A boolean alpha-beta search proving trick targets, with exact scores
//!   found by binary search over targets
//!
//! # Example
//!
//! ```
//! use double_dummy::{Diagram, LookupTables, SolveOutcome, SolveRequest, Solver, NORTH, NOTRUMP};
//!
//! let tables = LookupTables::new();
//! let diagram = Diagram::from_pbn("N:AKQJ... .5432.. ..5432. ...5432").unwrap();
//!
//! let mut solver = Solver::new(&tables);
//! let req = SolveRequest::new(diagram, NOTRUMP, NORTH);
//! match solver.solve_board(&req, None).unwrap() {
//!     SolveOutcome::Solved(result) => assert_eq!(result.max_score(), 4),
//!     SolveOutcome::Cancelled => unreachable!(),
//! }
//! ```

mod holding;
mod moves;
mod position;
mod rel;
mod search;
mod solve;
mod store;
mod tables;
pub mod types;

pub use holding::{Diagram, Holding};
pub use moves::{Move, MovePly};
pub use position::Position;
pub use rel::RelativeRanks;
pub use search::{CancelFlag, Cancelled, SearchEngine};
pub use solve::{
    Card, CardScore, InputError, SearchMode, Solutions, SolveConfig, SolveOutcome, SolveRequest,
    SolveResult, Solver,
};
pub use store::{MemoConfig, MemoStore};
pub use tables::LookupTables;
pub use types::{Rank, Seat, Suit, NOTRUMP, NUM_RANKS, NUM_SEATS, NUM_SUITS, TOTAL_CARDS, TOTAL_TRICKS};
pub use types::{CLUB, DIAMOND, HEART, SPADE};
pub use types::{EAST, NORTH, SOUTH, WEST};
