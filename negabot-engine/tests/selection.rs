//! Move selection
//!
//! Tests the full path through the engine: book short-circuit, root dispatch,
//! deadline handling and agreement with a direct one ply evaluation.

use std::fs::File;
use std::io::Write;
use std::time::{Duration, Instant};

use negabot_engine::book::BookEntry;
use negabot_engine::evaluation::static_evaluate;
use negabot_engine::search::MoveSource;
use negabot_engine::*;

const START_KEY: u64 = 0x463b_9618_1691_fc9c;

fn builder() -> EngineBuilder {
    EngineBuilder::new().book(None).max_time(None)
}

#[test]
fn start_position_depth_one_is_legal() {
    let engine = builder().depth(1).workers(4).build().unwrap();
    let position = Position::start_position();

    let result = engine.best_move(&position);
    let best_move = result.best_move.clone().unwrap();
    assert!(position.legal_moves().contains(&best_move));
    assert_eq!(result.source, MoveSource::Search);
    assert_eq!(result.dispatched, 20);
    assert_eq!(result.completed, 20);
    assert_eq!(result.nodes, 20);
    assert!(!result.stopped);
}

#[test]
fn depth_one_matches_direct_evaluation() {
    let fens = [
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        "4k3/8/8/3q4/8/8/8/3QK3 b - - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ];
    // One worker runs root moves in legal move order, so ties resolve like a scan.
    let engine = builder().depth(1).workers(1).build().unwrap();

    for fen in fens {
        let position = Position::parse_fen(fen).unwrap();
        let mut expected: Option<(String, Score)> = None;
        for legal_move in &position.legal_moves() {
            let mut child = position.clone();
            child.do_move(legal_move);
            let score = -static_evaluate(&child);
            if expected.as_ref().map_or(true, |(_, best)| score > *best) {
                expected = Some((position::uci(legal_move), score));
            }
        }
        let (expected_move, expected_score) = expected.unwrap();

        let result = engine.best_move(&position);
        assert_eq!(result.uci(), expected_move, "{fen}");
        assert_eq!(result.score, expected_score, "{fen}");
    }
}

#[test]
fn search_does_not_modify_position() {
    let engine = builder().depth(2).workers(3).build().unwrap();
    let position =
        Position::parse_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
            .unwrap();
    let before = position.to_fen();

    engine.best_move(&position);
    assert_eq!(position.to_fen(), before);
    assert_eq!(position.ply_count(), 0);
}

#[test]
fn deadline_is_respected() {
    let budget = Duration::from_millis(200);
    let engine = builder()
        .depth(6)
        .workers(2)
        .max_time(Some(budget))
        .build()
        .unwrap();

    let start = Instant::now();
    let result = engine.best_move(&Position::start_position());
    let elapsed = start.elapsed();

    assert!(elapsed < budget + Duration::from_secs(1), "took {elapsed:?}");
    assert!(result.stopped);
    assert!(result.completed < result.dispatched);
}

#[test]
fn zero_budget_returns_null_move() {
    let engine = builder()
        .depth(6)
        .workers(2)
        .max_time(Some(Duration::ZERO))
        .build()
        .unwrap();

    let result = engine.best_move(&Position::start_position());
    assert!(result.is_null());
    assert!(result.stopped);
    assert_eq!(result.score, Score::NEG_INFINITY);
}

fn write_book(entries: &[BookEntry]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for entry in entries {
        file.write_all(&entry.to_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn book_move_short_circuits_search() {
    // e2e4: from e2 (square 12) in bits 6-11, to e4 (square 28) in bits 0-5.
    let e2e4 = (12 << 6) | 28;
    let d2d4 = (11 << 6) | 27;
    let book = write_book(&[
        BookEntry { key: START_KEY, raw_move: d2d4, weight: 10, learn: 0 },
        BookEntry { key: START_KEY, raw_move: e2e4, weight: 40, learn: 0 },
    ]);

    let engine = builder()
        .book(Some(book.path().to_path_buf()))
        .depth(1)
        .workers(2)
        .build()
        .unwrap();

    let mut position = Position::start_position();
    let result = engine.best_move(&position);
    assert_eq!(result.source, MoveSource::Book);
    assert_eq!(result.uci(), "e2e4");
    assert_eq!(result.dispatched, 0);

    // Out of book after the first move.
    position.do_uci("e2e4").unwrap();
    let result = engine.best_move(&position);
    assert_eq!(result.source, MoveSource::Search);
    assert!(!result.is_null());
}

#[test]
fn malformed_book_falls_through_to_search() {
    let file = tempfile::NamedTempFile::new().unwrap();
    File::create(file.path()).unwrap().write_all(&[0u8; 20]).unwrap();

    let engine = builder()
        .book(Some(file.path().to_path_buf()))
        .depth(1)
        .workers(2)
        .build()
        .unwrap();

    let result = engine.best_move(&Position::start_position());
    assert_eq!(result.source, MoveSource::Search);
    assert!(!result.is_null());
}

#[test]
fn config_file_drives_engine() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "depth = 1\nworkers = 2\nbook = \"\"\nmax_time = 10.0").unwrap();

    let config = EngineConfig::from_toml_file(file.path()).unwrap();
    let engine = EngineBuilder::from_config(config).build().unwrap();
    assert_eq!(engine.num_workers(), 2);

    let result = engine.best_move(&Position::start_position());
    assert_eq!(result.depth, 1);
    assert_eq!(result.completed, 20);
}
