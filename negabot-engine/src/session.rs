//! Per-game driver: keeps the game replayed from the server's move list and
//! asks the engine for a move when it is our turn.

use log::{debug, info};
use shakmaty::{Color, Move};

use crate::engine::Engine;
use crate::error;
use crate::position::{uci, Game};

/// One game played as `our_color`.
#[derive(Debug, Clone)]
pub struct Session {
    our_color: Color,
    game: Game,
}

impl Session {
    /// A session for a new game from the standard start position.
    pub fn new(our_color: Color) -> Self {
        Self {
            our_color,
            game: Game::start_position(),
        }
    }

    pub fn our_color(&self) -> Color {
        self.our_color
    }

    /// The game as last replayed.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Replace the game with the one described by a space separated list of UCI
    /// moves played from the start position, and return true if it is our turn.
    ///
    /// On error the previous game is kept.
    pub fn on_moves(&mut self, uci_moves: &str) -> error::Result<bool> {
        self.game = Game::from_uci_moves(uci_moves)?;
        debug!(
            "session replayed {} moves, {:?} to move",
            self.game.moves.len(),
            self.game.position.side_to_move()
        );
        Ok(self.is_our_turn())
    }

    /// True when the current position has us to move.
    pub fn is_our_turn(&self) -> bool {
        self.game.position.side_to_move() == self.our_color
    }

    /// Ask `engine` for our move. None means there is nothing to play,
    /// either because the game is over or because no move was found in time.
    pub fn play(&self, engine: &Engine) -> Option<Move> {
        let result = engine.best_move(&self.game.position);
        info!(
            "{:?} plays {} ({:?}, score {})",
            self.our_color,
            result.uci(),
            result.source,
            result.score
        );
        result.best_move
    }

    /// Ask for our move and apply it to the game.
    /// Fails, leaving the game unchanged, once the game is too long to record another move.
    pub fn play_and_record(&mut self, engine: &Engine) -> error::Result<Option<Move>> {
        let Some(best_move) = self.play(engine) else {
            return Ok(None);
        };
        self.game.position.try_do_move(&best_move)?;
        debug!("recording {}", uci(&best_move));
        self.game.moves.push(best_move.clone());
        Ok(Some(best_move))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineBuilder;
    use crate::error::ErrorKind;
    use crate::history::MAX_HISTORY;

    #[test]
    fn turn_follows_move_count() {
        let mut white = Session::new(Color::White);
        let mut black = Session::new(Color::Black);
        assert!(white.is_our_turn());

        assert!(!white.on_moves("e2e4").unwrap());
        assert!(black.on_moves("e2e4").unwrap());
        assert!(white.on_moves("e2e4 e7e5").unwrap());
        assert_eq!(white.game().moves.len(), 2);
    }

    #[test]
    fn illegal_move_keeps_previous_game() {
        let mut session = Session::new(Color::White);
        session.on_moves("e2e4 e7e5").unwrap();

        let err = session.on_moves("e2e4 e7e5 e1e3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GameIllegalMove);
        assert_eq!(session.game().moves.len(), 2);
    }

    #[test]
    fn finished_game_plays_nothing() {
        let engine = EngineBuilder::new()
            .book(None)
            .depth(2)
            .workers(2)
            .build()
            .unwrap();
        let mut session = Session::new(Color::White);

        // Fool's mate, White is mated.
        assert!(session.on_moves("f2f3 e7e5 g2g4 d8h4").unwrap());
        assert_eq!(session.play(&engine), None);
    }

    #[test]
    fn play_and_record_advances_game() {
        let engine = EngineBuilder::new()
            .book(None)
            .depth(1)
            .workers(2)
            .build()
            .unwrap();
        let mut session = Session::new(Color::Black);
        session.on_moves("e2e4").unwrap();

        let played = session.play_and_record(&engine).unwrap().unwrap();
        assert_eq!(session.game().moves.last(), Some(&played));
        assert!(!session.is_our_turn());
    }

    #[test]
    fn full_game_is_not_recorded_past_history_limit() {
        let engine = EngineBuilder::new()
            .book(None)
            .max_time(None)
            .depth(1)
            .workers(2)
            .build()
            .unwrap();
        let mut session = Session::new(Color::White);
        let shuffle = "g1f3 g8f6 f3g1 f6g8 ".repeat(MAX_HISTORY / 4);
        assert!(session.on_moves(&shuffle).unwrap());

        let err = session.play_and_record(&engine).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MoveHistoryExceeded);
        assert_eq!(session.game().moves.len(), MAX_HISTORY);
        assert_eq!(session.game().position.ply_count(), MAX_HISTORY);
    }
}
