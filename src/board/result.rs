/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use tracing::debug;

use crate::{Color, PieceKind, Position, Variant};

/// Number of reversible plies after which the game is drawn.
pub const FIFTY_MOVE_PLIES: usize = 100;

/// Number of earlier occurrences of a position after which the game is drawn.
pub const REPETITION_LIMIT: usize = 5;

/// How a game was won.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WinReason {
    Checkmate,
    /// In Xiangqi, a player without legal moves loses even when not in check.
    Stalemate,
}

/// How a game was drawn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoves,
    Repetition,
}

/// The outcome of a finished game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameResult {
    Win { winner: Color, reason: WinReason },
    Draw(DrawReason),
}

impl GameResult {
    /// The winning side, if the game was not drawn.
    #[inline(always)]
    pub const fn winner(&self) -> Option<Color> {
        match self {
            Self::Win { winner, .. } => Some(*winner),
            Self::Draw(_) => None,
        }
    }

    /// The result as it would appear in a PGN tag: `1-0`, `0-1`, or `1/2-1/2`.
    #[inline(always)]
    pub const fn score(&self) -> &'static str {
        match self {
            Self::Win {
                winner: Color::White,
                ..
            } => "1-0",
            Self::Win {
                winner: Color::Black,
                ..
            } => "0-1",
            Self::Draw(_) => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win { winner, reason } => {
                let winner = if winner.is_white() { "White" } else { "Black" };
                match reason {
                    WinReason::Checkmate => write!(f, "{winner} mates"),
                    WinReason::Stalemate => write!(f, "{winner} wins by stalemate"),
                }
            }
            Self::Draw(DrawReason::InsufficientMaterial) => write!(f, "Draw by insufficient mating material"),
            Self::Draw(DrawReason::FiftyMoves) => write!(f, "Draw by fifty moves rule"),
            Self::Draw(DrawReason::Repetition) => write!(f, "Draw by {REPETITION_LIMIT}-fold repetition"),
        }
    }
}

impl<V: Variant> Position<V> {
    /// Decides whether the game is over, and how.
    ///
    /// Returns `None` while the game is still going.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Color, GameResult, Position, WinReason, Xiangqi};
    /// let mut pos: Position<Xiangqi> = "R2k5/R8/9/9/9/9/9/9/9/4K4 b - - 0 1".parse().unwrap();
    /// assert_eq!(
    ///     pos.result(),
    ///     Some(GameResult::Win { winner: Color::White, reason: WinReason::Checkmate })
    /// );
    /// assert_eq!(Position::<Xiangqi>::default().result(), None);
    /// ```
    pub fn result(&mut self) -> Option<GameResult> {
        let result = self.evaluate_result();
        if let Some(result) = result {
            debug!(key = %self.key, "game over: {result}");
        }
        result
    }

    fn evaluate_result(&mut self) -> Option<GameResult> {
        if !self.can_move() {
            let reason = if self.in_check(self.side_to_move) {
                WinReason::Checkmate
            } else {
                WinReason::Stalemate
            };

            return Some(GameResult::Win {
                winner: self.side_to_move.opponent(),
                reason,
            });
        }

        if self.has_insufficient_material() {
            return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
        }

        if self.reversible_moves >= FIFTY_MOVE_PLIES {
            return Some(GameResult::Draw(DrawReason::FiftyMoves));
        }

        if self.repeat_count() >= REPETITION_LIMIT {
            return Some(GameResult::Draw(DrawReason::Repetition));
        }

        None
    }

    /// Number of earlier positions in the history, with the same side to move, that match the current one.
    pub fn repeat_count(&self) -> usize {
        self.history
            .iter()
            .rev()
            .skip(1)
            .step_by(2)
            .filter(|data| data.key == self.key)
            .count()
    }

    /// Returns `true` if neither side has enough material left to force mate.
    ///
    /// Pieces are weighed as follows: advisors count 1 each, and every other piece except Kings counts 2.
    /// Bishops count 1 for each square color that has a bishop on it, regardless of side.
    /// A total of 1 or less is a draw.
    pub fn has_insufficient_material(&self) -> bool {
        let geo = V::GEOMETRY;
        let mut material = 0;
        let mut bishop_colors = [false; 2];

        for index in geo.indices() {
            let piece = self.squares[index];
            match piece.kind() {
                None | Some(PieceKind::King) => {}
                Some(PieceKind::Advisor) => material += 1,
                Some(PieceKind::Bishop) => {
                    if let Some(square) = geo.square(index) {
                        bishop_colors[square.color_class()] = true;
                    }
                }
                Some(_) => material += 2,
            }

            if material > 1 {
                return false;
            }
        }

        material += bishop_colors.iter().filter(|seen| **seen).count();
        material <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Xiangqi};

    fn pos(fen: &str) -> Position<Xiangqi> {
        fen.parse().unwrap()
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mut p = pos("R2k5/R8/9/9/9/9/9/9/9/4K4 b - - 0 1");
        let result = p.result().unwrap();
        assert_eq!(result.winner(), Some(Color::White));
        assert_eq!(result.score(), "1-0");
        assert_eq!(result.to_string(), "White mates");

        // Black's King is boxed in by the White King and a rook, but not attacked
        let mut p = pos("3k5/R8/9/9/9/9/9/9/9/4K4 b - - 0 1");
        assert!(!p.in_check(Color::Black));
        assert_eq!(
            p.result(),
            Some(GameResult::Win {
                winner: Color::White,
                reason: WinReason::Stalemate
            })
        );
    }

    #[test]
    fn test_insufficient_material() {
        // Bare Kings
        let mut p = pos("3k5/9/9/9/9/9/9/9/9/4K4 w - - 0 1");
        assert_eq!(p.result(), Some(GameResult::Draw(DrawReason::InsufficientMaterial)));

        // A single advisor is not enough
        assert!(pos("3k5/9/9/9/9/9/9/9/4A4/4K4 w - - 0 1").has_insufficient_material());

        // Two advisors are
        assert!(!pos("3k5/9/9/9/9/9/9/9/4A4/3AK4 w - - 0 1").has_insufficient_material());

        // Any pawn is
        assert!(!pos("3k5/9/9/9/9/9/P8/9/9/4K4 w - - 0 1").has_insufficient_material());
    }

    #[test]
    fn test_bishops_counted_by_square_color() {
        // Both of White's bishops stand on the same square color, so they count once
        assert!(pos("3k5/9/9/9/9/9/9/4B4/9/2B1K4 w - - 0 1").has_insufficient_material());

        // White's and Black's bishops always stand on different square colors
        assert!(!pos("2bk5/9/9/9/9/9/9/9/9/2B1K4 w - - 0 1").has_insufficient_material());
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut p = pos("3k5/9/9/9/9/9/9/9/9/R3K4 w - - 99 60");
        assert_eq!(p.result(), None);

        let mv = p.parse_move("Ra2").unwrap();
        p.make_move(mv);
        assert_eq!(p.reversible_moves(), 100);
        assert_eq!(p.result(), Some(GameResult::Draw(DrawReason::FiftyMoves)));

        p.undo_move();
        assert_eq!(p.result(), None);
    }

    #[test]
    fn test_repetition() {
        let mut p = Position::<Xiangqi>::default();
        let shuffle = ["Nh1g3", "Nh10g8", "Ng3h1", "Ng8h10"];

        for _ in 0..4 {
            for san in shuffle {
                let mv = p.parse_move(san).unwrap();
                p.make_move(mv);
            }
            assert_eq!(p.result(), None);
        }
        assert_eq!(p.repeat_count(), 4);

        for san in shuffle {
            let mv: Move = p.parse_move(san).unwrap();
            p.make_move(mv);
        }
        assert_eq!(p.repeat_count(), 5);
        assert_eq!(p.result(), Some(GameResult::Draw(DrawReason::Repetition)));
    }
}
