//! Static evaluation of a position, returning a Score.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::ops::Neg;

use shakmaty::{Color, Role};

use crate::position::Position;

/// Score of a position, in pawns scaled by 1000 internal units.
/// Infinite values mark checkmate. Scores never hold NaN, so comparisons
/// between scores are total in practice.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Score(pub f64);

// Type alias to make changing type easy if needed.
type ScoreKind = f64;

impl Score {
    pub const INFINITY: Score = Self(ScoreKind::INFINITY);
    pub const NEG_INFINITY: Score = Self(ScoreKind::NEG_INFINITY);
    pub const DRAW: Score = Self(0.0);

    /// Returns true if this score is a forced checkmate for either side.
    pub fn is_mate(&self) -> bool {
        self.0.is_infinite()
    }

    /// Larger of two scores. Equal scores keep `self`.
    pub fn max(self, other: Self) -> Self {
        match other.0.partial_cmp(&self.0) {
            Some(Ordering::Greater) => other,
            _ => self,
        }
    }
}

impl Neg for Score {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == ScoreKind::INFINITY {
            write!(f, "+inf")
        } else if self.0 == ScoreKind::NEG_INFINITY {
            write!(f, "-inf")
        } else {
            write!(f, "{:.3}", self.0)
        }
    }
}

/// Color independent value per piece, in internal units.
const fn role_value(role: Role) -> i64 {
    match role {
        Role::Pawn => 1000,
        Role::Knight => 3200,
        Role::Bishop => 3300,
        Role::Rook => 5000,
        Role::Queen => 9000,
        Role::King => 30000,
    }
}

// Evaluation Constants
const CHECK_PENALTY: i64 = 500;
const CASTLING_BONUS: i64 = 200;
const MOBILITY_PER_SQUARE: i64 = 10;
const UNITS_PER_PAWN: ScoreKind = 1000.0;

/// Returns +1 for White, -1 for Black.
const fn white_sign(color: Color) -> i64 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

// Evaluation Functions

/// Primary evaluate function for engine.
///
/// Material and check are relative to the side to move, checkmate is a loss
/// for the side to move, and castling and mobility are relative to White.
pub fn static_evaluate(position: &Position) -> Score {
    if let Some(terminal) = terminal(position) {
        return terminal;
    }

    let units = material(position) + check(position) + castling(position) + mobility(position);
    Score(units as ScoreKind / UNITS_PER_PAWN)
}

/// Score for a finished game, or None if the game continues.
/// A checkmated side to move scores negative infinity, every draw scores zero.
pub fn terminal(position: &Position) -> Option<Score> {
    if position.is_checkmate() {
        Some(Score::NEG_INFINITY)
    } else if position.is_draw() {
        Some(Score::DRAW)
    } else {
        None
    }
}

/// Sum of piece values, positive for the side to move's pieces and
/// negative for the opponent's.
pub fn material(position: &Position) -> i64 {
    let board = position.board();
    let player = position.side_to_move();

    board
        .occupied()
        .into_iter()
        .filter_map(|square| board.piece_at(square))
        .map(|piece| {
            let value = role_value(piece.role);
            if piece.color == player {
                value
            } else {
                -value
            }
        })
        .sum()
}

/// Penalty for the side to move being in check.
pub fn check(position: &Position) -> i64 {
    if position.is_check() {
        -CHECK_PENALTY
    } else {
        0
    }
}

/// Bonus for each side retaining any castling right, White positive.
pub fn castling(position: &Position) -> i64 {
    [Color::White, Color::Black]
        .into_iter()
        .filter(|&color| position.has_castling_rights(color))
        .map(|color| CASTLING_BONUS * white_sign(color))
        .sum()
}

/// Mobility of bishops and rooks, White positive.
///
/// Each square on a slider's attack lines counts until the line meets a piece.
/// The blocker's square counts only if the blocker is an enemy piece that its
/// own side does not defend.
///
/// A blocker ends only its own line; the slider's other lines are still scanned.
pub fn mobility(position: &Position) -> i64 {
    let board = position.board();
    let sliders = board.bishops() | board.rooks();

    sliders
        .into_iter()
        .filter_map(|square| board.piece_at(square).map(|piece| (square, piece)))
        .map(|(square, piece)| {
            let reachable = position
                .attacks(square)
                .into_iter()
                .filter(|&target| match board.piece_at(target) {
                    None => true,
                    Some(blocker) => {
                        blocker.color != piece.color
                            && !position.is_attacked_by(blocker.color, target)
                    }
                })
                .count() as i64;
            reachable * MOBILITY_PER_SQUARE * white_sign(piece.color)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fen(fen: &str) -> Score {
        static_evaluate(&Position::parse_fen(fen).unwrap())
    }

    #[test]
    fn start_position_is_balanced() {
        // Material cancels, both sides keep castling rights, sliders are boxed in.
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(eval_fen(start), Score(0.0));
    }

    #[test]
    fn component_terms() {
        let position = Position::parse_fen("4k3/8/8/8/8/8/3B4/R3K3 w Q - 0 1").unwrap();
        assert_eq!(material(&position), 8300);
        assert_eq!(check(&position), 0);
        assert_eq!(castling(&position), 200);
        // Rook: a2-a8 and b1-d1. Bishop: c1, c3-a5, e3-h6.
        assert_eq!(mobility(&position), 180);
        assert_eq!(static_evaluate(&position), Score(8.68));
    }

    #[test]
    fn colour_mirror_negates() {
        let white = eval_fen("4k3/8/8/8/8/8/3B4/R3K3 w Q - 0 1");
        let black = eval_fen("r3k3/3b4/8/8/8/8/8/4K3 w q - 0 1");
        assert_eq!(white, -black);
    }

    #[test]
    fn material_follows_side_to_move() {
        let white_to_move = eval_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
        let black_to_move = eval_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1");
        assert!(white_to_move.0 > 0.0);
        assert!(black_to_move.0 < 0.0);
    }

    #[test]
    fn defended_blocker_is_not_counted() {
        // White rook on a1 sees a black knight on a5.
        // Undefended, the knight's square counts; defended by a pawn on b6, it does not.
        let hanging = Position::parse_fen("4k3/8/8/n7/8/8/8/R5K1 w - - 0 1").unwrap();
        let defended = Position::parse_fen("4k3/8/1p6/n7/8/8/8/R5K1 w - - 0 1").unwrap();
        // a2-a4, a5, b1-f1.
        assert_eq!(mobility(&hanging), 90);
        assert_eq!(mobility(&defended), 80);
    }

    #[test]
    fn check_penalty_applies() {
        let position = Position::parse_fen("4k3/8/8/8/8/8/8/4RK2 b - - 0 1").unwrap();
        assert_eq!(check(&position), -500);
    }

    #[test]
    fn checkmate_and_draws() {
        // Fool's mate, White to move and mated.
        let mated = eval_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(mated, Score::NEG_INFINITY);
        let stalemate = eval_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(stalemate, Score::DRAW);
        let bare_kings = eval_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1");
        assert_eq!(bare_kings, Score::DRAW);
    }

    #[test]
    fn infinity_negates_without_nan() {
        assert_eq!(-Score::INFINITY, Score::NEG_INFINITY);
        assert_eq!(-Score::NEG_INFINITY, Score::INFINITY);
        assert_eq!(Score::NEG_INFINITY.max(Score(-1e9)), Score(-1e9));
        assert!(!(-Score::NEG_INFINITY).0.is_nan());
    }
}
