//! Command-line front end: solve one board given as a PBN deal

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use double_dummy::types::{
    char_to_rank, char_to_seat, char_to_suit, rank_name, seat_name, suit_letter, suit_name,
    NOTRUMP, NUM_SEATS,
};
use double_dummy::{
    Card, Diagram, LookupTables, SearchMode, Solutions, SolveOutcome, SolveRequest, SolveResult,
    Solver,
};

#[derive(Parser)]
#[command(name = "double-dummy", version, about = "Double-dummy bridge solver")]
struct Args {
    /// PBN deal, e.g. "N:AKQT3.J6.KJ42.95 652.AK42.AQ87.T4 ..."
    deal: String,

    /// Trump suit: S, H, D, C or N
    #[arg(short, long, default_value = "N")]
    trump: char,

    /// Seat that leads to the first open trick: W, N, E or S
    #[arg(short, long, default_value = "W")]
    leader: char,

    /// Prove this target instead of solving for the exact trick count
    #[arg(long)]
    target: Option<usize>,

    /// Report every legal card with its own score
    #[arg(long)]
    all_scores: bool,

    /// Cards already played to the current trick, e.g. "DA H2"
    #[arg(long)]
    played: Option<String>,

    /// Print node count and timing
    #[arg(short, long)]
    verbose: bool,
}

fn parse_card(text: &str) -> Option<Card> {
    let mut chars = text.chars();
    let suit = char_to_suit(chars.next()?)?;
    if suit == NOTRUMP {
        return None;
    }
    let rank = char_to_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Card { suit, rank })
}

fn print_result(result: &SolveResult, verbose: bool, elapsed_ms: u128) {
    println!("score: {}", result.max_score());
    for card in &result.cards {
        let marker = if card.equals { "=" } else { " " };
        println!(
            "  {}{} {} {}",
            suit_letter(card.suit),
            rank_name(card.rank),
            marker,
            card.score
        );
    }
    if verbose {
        println!("nodes: {}  time: {} ms", result.nodes, elapsed_ms);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let diagram = Diagram::from_pbn(&args.deal)
        .ok_or_else(|| format!("cannot parse PBN deal: {}", args.deal))?;
    let trump =
        char_to_suit(args.trump).ok_or_else(|| format!("bad trump: {}", args.trump))?;
    let leader =
        char_to_seat(args.leader).ok_or_else(|| format!("bad leader: {}", args.leader))?;

    let mut current_trick = Vec::new();
    if let Some(played) = &args.played {
        for text in played.split_whitespace() {
            let card =
                parse_card(text).ok_or_else(|| format!("bad played card: {}", text))?;
            current_trick.push(card);
        }
    }

    let mut req = SolveRequest::new(diagram, trump, leader);
    req.current_trick = current_trick;
    if let Some(target) = args.target {
        req.mode = SearchMode::ProveTarget;
        req.target = target;
    }
    if args.all_scores {
        req.solutions = Solutions::AllScores;
    }

    if args.verbose {
        print!("{}", req.diagram);
        println!(
            "contract: {}, {} on play",
            suit_name(trump),
            seat_name((leader + req.current_trick.len()) % NUM_SEATS)
        );
    }

    let tables = LookupTables::new();
    let mut solver = Solver::new(&tables);
    let start = Instant::now();
    let outcome = solver.solve_board(&req, None).map_err(|e| e.to_string())?;
    let elapsed_ms = start.elapsed().as_millis();
    match outcome {
        SolveOutcome::Solved(result) => {
            if req.mode == SearchMode::ProveTarget {
                println!(
                    "target {}: {}",
                    req.target,
                    if result.target_reached { "made" } else { "refuted" }
                );
            }
            print_result(&result, args.verbose, elapsed_ms);
            Ok(())
        }
        SolveOutcome::Cancelled => Err("cancelled".to_string()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
