//! Holds Position, the rules-facing data structure searched by the engine,
//! and Game, a base position with the moves played from it.
//!
//! Board representation and move generation come from `shakmaty`. Position
//! adds what the search needs on top: in-place `do_move`/`undo_move` and a
//! repetition history.

use std::fmt::{self, Display};

use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Bitboard, Board, CastlingMode, CastlingSide, Chess, Color, EnPassantMode};
use shakmaty::{Move, MoveList, Outcome, Position as _, Square};

use crate::error::{self, ErrorKind};
use crate::history::{History, MAX_HISTORY};

/// Type of a position's structural hash.
/// Keys are Polyglot compatible, so the same hash indexes opening books.
pub type HashKind = u64;

/// Halfmove clock value at which the 75-move rule ends the game.
const SEVENTY_FIVE_MOVES: u32 = 150;

/// A chess position, plus the information about how it was reached that
/// is needed to recognize repetitions and to undo moves.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
    history: History,
    undo_stack: Vec<Chess>,
}

impl Position {
    /// Standard chess start position.
    pub fn start_position() -> Self {
        Self::from(Chess::default())
    }

    /// Parse a position from a FEN string. The position has no history.
    pub fn parse_fen(fen_str: &str) -> error::Result<Self> {
        let fen: Fen = fen_str.trim().parse()?;
        let chess: Chess = fen.into_position(CastlingMode::Standard)?;
        Ok(Self::from(chess))
    }

    /// Serialize to FEN. History is not part of the output.
    pub fn to_fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Const getters.
    pub fn board(&self) -> &Board {
        self.chess.board()
    }
    pub fn side_to_move(&self) -> Color {
        self.chess.turn()
    }
    pub fn halfmoves(&self) -> u32 {
        self.chess.halfmoves()
    }

    /// Zobrist hash of the position, independent of how it was reached.
    pub fn hash(&self) -> HashKind {
        let Zobrist64(hash) = self.chess.zobrist_hash(EnPassantMode::Legal);
        hash
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> MoveList {
        self.chess.legal_moves()
    }

    /// Apply a legal move to self, in place.
    /// The move is assumed legal; use `do_uci` for untrusted input.
    ///
    /// # Panics
    ///
    /// Panics if the repetition history is full.
    pub fn do_move(&mut self, move_: &Move) {
        self.history.push(self.hash(), move_.is_zeroing());
        self.undo_stack.push(self.chess.clone());
        self.chess.play_unchecked(move_);
    }

    /// Undo the most recent `do_move`. Does nothing if no move was made.
    pub fn undo_move(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            self.chess = previous;
            self.history.pop();
        }
    }

    /// Apply a legal move to self, in place, unless the repetition history is full.
    pub fn try_do_move(&mut self, move_: &Move) -> error::Result<()> {
        if self.history.is_full() {
            return Err(ErrorKind::MoveHistoryExceeded.into());
        }
        self.do_move(move_);
        Ok(())
    }

    /// Parse a move in UCI notation, check its legality and apply it.
    pub fn do_uci(&mut self, uci_str: &str) -> error::Result<Move> {
        let move_ = self.parse_uci(uci_str)?;
        self.try_do_move(&move_)?;
        Ok(move_)
    }

    /// Find the legal move written as `uci_str` in standard UCI notation.
    pub fn parse_uci(&self, uci_str: &str) -> error::Result<Move> {
        let uci_str = uci_str.trim();
        self.legal_moves()
            .into_iter()
            .find(|legal_move| uci(legal_move) == uci_str)
            .ok_or_else(|| (ErrorKind::IllegalMove, format!("{uci_str} in {self}")).into())
    }

    /// Number of plies that can be undone.
    pub fn ply_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_checkmate(&self) -> bool {
        self.chess.is_checkmate()
    }
    pub fn is_stalemate(&self) -> bool {
        self.chess.is_stalemate()
    }
    pub fn is_insufficient_material(&self) -> bool {
        self.chess.is_insufficient_material()
    }
    /// The game is drawn once 75 moves by each side pass without a capture or pawn move,
    /// unless the last move delivered checkmate.
    pub fn is_seventyfive_moves(&self) -> bool {
        self.halfmoves() >= SEVENTY_FIVE_MOVES && !self.chess.legal_moves().is_empty()
    }
    pub fn is_fivefold_repetition(&self) -> bool {
        self.history.is_fivefold_repetition(self.hash())
    }
    pub fn is_variant_draw(&self) -> bool {
        matches!(self.chess.variant_outcome(), Some(Outcome::Draw))
    }
    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Returns true if the game has ended for any reason.
    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw() || self.chess.is_variant_end()
    }

    /// Returns true for every drawn terminal state.
    pub fn is_draw(&self) -> bool {
        self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_seventyfive_moves()
            || self.is_fivefold_repetition()
            || self.is_variant_draw()
    }

    /// Returns true if `color` may still castle to either side.
    pub fn has_castling_rights(&self, color: Color) -> bool {
        let castles = self.chess.castles();
        castles.has(color, CastlingSide::KingSide) || castles.has(color, CastlingSide::QueenSide)
    }

    /// Squares attacked by the piece on `square`, empty if there is none.
    pub fn attacks(&self, square: Square) -> Bitboard {
        self.chess.board().attacks_from(square)
    }

    /// Returns true if any piece of `color` attacks `square`.
    pub fn is_attacked_by(&self, color: Color, square: Square) -> bool {
        let board = self.chess.board();
        board.attacks_to(square, color, board.occupied()).any()
    }
}

impl From<Chess> for Position {
    fn from(chess: Chess) -> Self {
        Self {
            chess,
            history: History::new(),
            undo_stack: Vec::new(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start_position()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

/// Render a move in standard UCI notation.
pub fn uci(move_: &Move) -> String {
    move_.to_uci(CastlingMode::Standard).to_string()
}

/// Game contains information for an in progress game:
/// The base position the game started from, the sequence of moves that were
/// played, and the current position.
#[derive(Debug, Clone)]
pub struct Game {
    pub base_position: Position,
    pub moves: Vec<Move>,
    pub position: Position,
}

impl Game {
    /// Create a new game from a base position and a sequence of legal moves.
    /// Returns an error if any move is not legal in the position it is played from.
    pub fn new<'a, I>(base_position: Position, uci_moves: I) -> error::Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut position = base_position.clone();
        let mut moves = Vec::new();

        for uci_move in uci_moves {
            if moves.len() >= MAX_HISTORY {
                return Err(ErrorKind::MoveHistoryExceeded.into());
            }
            let move_ = position
                .do_uci(uci_move)
                .map_err(|err| (ErrorKind::GameIllegalMove, format!("{uci_move}: {err}")))?;
            moves.push(move_);
        }

        Ok(Self {
            base_position,
            moves,
            position,
        })
    }

    /// Create a game from the standard start position and a space separated UCI move list.
    pub fn from_uci_moves(uci_moves: &str) -> error::Result<Self> {
        Self::new(Position::start_position(), uci_moves.split_whitespace())
    }

    /// Create a new Game from the standard chess start position.
    pub fn start_position() -> Self {
        Self::from(Position::start_position())
    }
}

impl From<Position> for Game {
    fn from(position: Position) -> Self {
        Self {
            base_position: position.clone(),
            moves: Vec::new(),
            position,
        }
    }
}
