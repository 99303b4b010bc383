/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::geometry::step;
use crate::{Color, Move, MoveList, Piece, PieceKind, Position, Variant};

/// Represents the side of the board a King castles towards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum CastlingSide {
    /// Towards the lower files ("long" castling, `O-O-O`).
    QueenSide,
    /// Towards the higher files ("short" castling, `O-O`).
    KingSide,
}

impl CastlingSide {
    /// Number of castling sides.
    pub const COUNT: usize = 2;

    /// Both sides, queenside first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::QueenSide, Self::KingSide]
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Direction from the King towards this side's Rook, in mailbox steps.
    #[inline(always)]
    pub const fn direction(&self) -> isize {
        match self {
            Self::QueenSide => -1,
            Self::KingSide => 1,
        }
    }

    /// The SAN notation for castling to this side.
    #[inline(always)]
    pub const fn notation(&self) -> &'static str {
        match self {
            Self::QueenSide => "O-O-O",
            Self::KingSide => "O-O",
        }
    }
}

impl fmt::Display for CastlingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueenSide => write!(f, "queenside"),
            Self::KingSide => write!(f, "kingside"),
        }
    }
}

/// Castling rights of both players, stored as the starting square of each castling Rook.
///
/// A square of `0` (a wall) means the right is gone.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct CastlingRights {
    rook_squares: [[usize; CastlingSide::COUNT]; Color::COUNT],
}

impl CastlingRights {
    /// The square of `color`'s castling Rook on `side`, if that right still exists.
    #[inline(always)]
    pub const fn get(&self, color: Color, side: CastlingSide) -> Option<usize> {
        match self.rook_squares[color.index()][side.index()] {
            0 => None,
            square => Some(square),
        }
    }

    /// Returns `true` if neither player can castle.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.rook_squares.iter().flatten().all(|square| *square == 0)
    }

    #[inline(always)]
    const fn raw(&self, color: Color, side: CastlingSide) -> usize {
        self.rook_squares[color.index()][side.index()]
    }
}

impl<V: Variant> Position<V> {
    /// Index of the square `color`'s King lands on when castling to `side`.
    #[inline(always)]
    pub fn castle_target(&self, color: Color, side: CastlingSide) -> usize {
        V::GEOMETRY.back_rank(color, V::castling_file(side))
    }

    /// Returns `true` if `color` still has the right to castle to `side`.
    #[inline(always)]
    pub fn has_castling_right(&self, color: Color, side: CastlingSide) -> bool {
        self.castling_rights.get(color, side).is_some()
    }

    /// Sets `color`'s castling Rook on `side` to `square` (`0` to remove the right), keeping the key in sync.
    pub(crate) fn set_castling_square(&mut self, color: Color, side: CastlingSide, square: usize) {
        let old = self.castling_rights.raw(color, side);
        if old == square {
            return;
        }

        if old != 0 {
            self.key.hash_castling(color, old);
        }
        if square != 0 {
            self.key.hash_castling(color, square);
        }
        self.castling_rights.rook_squares[color.index()][side.index()] = square;
    }

    /// Removes every castling right of `color`.
    pub(crate) fn remove_castling_rights_for(&mut self, color: Color) {
        for side in CastlingSide::all() {
            self.set_castling_square(color, side, 0);
        }
    }

    /// Removes the castling right tied to a Rook on `square`, if there is one.
    ///
    /// Called when a piece on `square` is captured.
    pub(crate) fn remove_castling_rights_at(&mut self, square: usize) {
        let Some(color) = self.squares[square].color() else {
            return;
        };
        if !self.squares[square].is_kind(PieceKind::Rook) {
            return;
        }

        for side in CastlingSide::all() {
            if self.castling_rights.raw(color, side) == square {
                self.set_castling_square(color, side, 0);
            }
        }
    }

    /// If `mv` is a castling move for the side to move, returns the side it castles to.
    #[inline(always)]
    pub fn castling_side(&self, mv: Move) -> Option<CastlingSide> {
        CastlingSide::all()
            .into_iter()
            .find(|side| self.castling_rights.get(self.side_to_move, *side) == Some(mv.target()))
    }

    /// Returns `true` if the side to move has the right to castle to `side` and nothing stands in the way.
    ///
    /// Whether the King passes through check is decided later, by legality testing.
    pub fn can_castle(&self, side: CastlingSide) -> bool {
        let color = self.side_to_move;
        let (Some(rook), Some(king)) = (self.castling_rights.get(color, side), self.king_square(color)) else {
            return false;
        };

        let target = self.castle_target(color, side);
        let (left, right) = match side {
            CastlingSide::QueenSide => (target.min(rook), (target + 1).max(king)),
            CastlingSide::KingSide => ((target - 1).min(king), target.max(rook)),
        };

        (left..=right).all(|index| index == king || index == rook || self.squares[index].is_empty())
    }

    /// Appends every unobstructed castling move of the side to move to `moves`.
    ///
    /// Castling moves are written as the King capturing its own Rook.
    pub(crate) fn generate_castling_moves(&self, moves: &mut MoveList) {
        if !V::HAS_CASTLING {
            return;
        }
        let color = self.side_to_move;
        let Some(king) = self.king_square(color) else {
            return;
        };

        for side in CastlingSide::all() {
            if let Some(rook) = self.castling_rights.get(color, side) {
                if self.can_castle(side) {
                    moves.push(Move::new(king, rook));
                }
            }
        }
    }

    /// Formats the castling rights field of a FEN string.
    ///
    /// Rights are written `K`/`Q` (uppercase for White) unless another of the player's Rooks stands further
    /// out on the same side, or the variant is randomized, in which case the Rook's file letter is used.
    pub fn castling_rights_string(&self) -> String {
        let mut rights = String::new();

        for color in Color::all() {
            for side in [CastlingSide::KingSide, CastlingSide::QueenSide] {
                let Some(rook) = self.castling_rights.get(color, side) else {
                    continue;
                };

                let rook_piece = Piece::new(color, PieceKind::Rook);
                let mut index = step(rook, side.direction());
                let mut ambiguous = false;
                while !self.squares[index].is_wall() {
                    if self.squares[index] == rook_piece {
                        ambiguous = true;
                        break;
                    }
                    index = step(index, side.direction());
                }

                let c = if ambiguous || V::IS_RANDOM {
                    match V::GEOMETRY.square(rook) {
                        Some(square) => square.file_char(),
                        None => continue,
                    }
                } else {
                    match side {
                        CastlingSide::KingSide => 'k',
                        CastlingSide::QueenSide => 'q',
                    }
                };

                rights.push(if color.is_white() { c.to_ascii_uppercase() } else { c });
            }
        }

        if rights.is_empty() {
            rights.push('-');
        }
        rights
    }

    /// Parses a single character of a FEN castling rights field, and grants that right.
    ///
    /// `K`/`Q` select the outermost Rook on that side of the King; a file letter selects the Rook on that
    /// file of the back rank. Uppercase is White.
    pub(crate) fn parse_castling_rights(&mut self, c: char) -> Result<()> {
        if !V::HAS_CASTLING {
            bail!("Invalid castling rights: {} has no castling", V::name());
        }

        let geo = V::GEOMETRY;
        let color = Color::from_case(c);
        let Some(king) = self.king_square(color) else {
            bail!("Invalid castling rights: {} has no King", color.name());
        };
        let rook_piece = Piece::new(color, PieceKind::Rook);

        match c.to_ascii_lowercase() {
            'k' | 'q' => {
                let side = if c.eq_ignore_ascii_case(&'k') {
                    CastlingSide::KingSide
                } else {
                    CastlingSide::QueenSide
                };

                let mut rook = None;
                let mut index = step(king, side.direction());
                while !self.squares[index].is_wall() {
                    if self.squares[index] == rook_piece {
                        rook = Some(index);
                    }
                    index = step(index, side.direction());
                }

                let Some(rook) = rook else {
                    bail!("Invalid castling rights: No {} Rook for {c:?}", color.name());
                };
                self.set_castling_square(color, side, rook);
            }

            file @ 'a'..='z' => {
                let file = (file as u8 - b'a') as usize;
                if file >= geo.width() {
                    bail!("Invalid castling rights: File {c:?} is off the board");
                }

                let rook = geo.back_rank(color, file);
                if king.abs_diff(rook) >= geo.width() {
                    bail!("Invalid castling rights: {} King is not on its back rank", color.name());
                }
                if self.squares[rook] != rook_piece {
                    bail!("Invalid castling rights: No {} Rook on file {c:?}", color.name());
                }

                let side = if rook > king {
                    CastlingSide::KingSide
                } else {
                    CastlingSide::QueenSide
                };
                self.set_castling_square(color, side, rook);
            }

            _ => bail!("Invalid castling rights: Unrecognized character {c:?}"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    /// A Xiangqi board where Kings may castle, for exercising castling rules.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    struct CastlingXiangqi;

    impl Variant for CastlingXiangqi {
        const HAS_CASTLING: bool = true;

        fn name() -> &'static str {
            "Castling Xiangqi"
        }

        fn fen_startpos() -> &'static str {
            "r3k3r/9/9/4p4/9/9/4P4/9/9/R3K3R w KQkq - 0 1"
        }
    }

    fn index(file: u8, rank: u8) -> usize {
        CastlingXiangqi::GEOMETRY.index(Square::new(file, rank))
    }

    #[test]
    fn test_castling_rights_from_fen() {
        let pos = Position::<CastlingXiangqi>::default();
        assert_eq!(pos.castling_rights().get(Color::White, CastlingSide::QueenSide), Some(index(0, 0)));
        assert_eq!(pos.castling_rights().get(Color::White, CastlingSide::KingSide), Some(index(8, 0)));
        assert_eq!(pos.castling_rights().get(Color::Black, CastlingSide::KingSide), Some(index(8, 9)));
        assert_eq!(pos.castling_rights_string(), "KQkq");
    }

    #[test]
    fn test_castling_rights_with_file_letters() {
        let pos: Position<CastlingXiangqi> = "r3k3r/9/9/4p4/9/9/4P4/9/9/R3K3R w Ai - 0 1".parse().unwrap();
        assert!(pos.has_castling_right(Color::White, CastlingSide::QueenSide));
        assert!(!pos.has_castling_right(Color::White, CastlingSide::KingSide));
        assert!(pos.has_castling_right(Color::Black, CastlingSide::KingSide));
        assert_eq!(pos.castling_rights_string(), "Qk");
    }

    #[test]
    fn test_ambiguous_rights_use_file_letters() {
        // Two white rooks on the kingside; the inner one keeps the right
        let pos: Position<CastlingXiangqi> = "4k4/9/9/4p4/9/9/4P4/9/9/R3K2RR w H - 0 1".parse().unwrap();
        assert_eq!(pos.castling_rights().get(Color::White, CastlingSide::KingSide), Some(index(7, 0)));
        assert_eq!(pos.castling_rights_string(), "H");
    }

    #[test]
    fn test_invalid_castling_rights() {
        assert!("r3k3r/9/9/4p4/9/9/4P4/9/9/R3K4 w K - 0 1".parse::<Position<CastlingXiangqi>>().is_err());
        assert!("r3k3r/9/9/4p4/9/9/4P4/9/9/R3K3R w C - 0 1".parse::<Position<CastlingXiangqi>>().is_err());
        assert!("r3k3r/9/9/4p4/9/9/4P4/9/9/R3K3R w Z - 0 1".parse::<Position<CastlingXiangqi>>().is_err());
        assert!("r3k3r/9/9/4p4/9/9/4P4/9/9/R3K3R w K1 - 0 1".parse::<Position<CastlingXiangqi>>().is_err());
    }

    #[test]
    fn test_castling_moves() {
        let mut pos = Position::<CastlingXiangqi>::default();
        let king = index(4, 0);

        assert!(pos.can_castle(CastlingSide::QueenSide));
        assert!(pos.can_castle(CastlingSide::KingSide));
        let moves = pos.legal_moves();
        assert!(moves.contains(&Move::new(king, index(0, 0))));
        assert!(moves.contains(&Move::new(king, index(8, 0))));

        let castle = Move::new(king, index(8, 0));
        assert_eq!(pos.castling_side(castle), Some(CastlingSide::KingSide));
        let key = pos.key();
        pos.make_move(castle);
        assert_eq!(pos.piece_on(Square::new(7, 0)), Piece::WHITE_KING);
        assert_eq!(pos.piece_on(Square::new(6, 0)), Piece::WHITE_ROOK);
        assert!(pos.piece_on(Square::new(8, 0)).is_empty());
        assert!(pos.piece_on(Square::new(4, 0)).is_empty());
        assert_eq!(pos.king_square(Color::White), Some(index(7, 0)));
        assert!(!pos.has_castling_right(Color::White, CastlingSide::QueenSide));
        assert_eq!(pos.castling_rights_string(), "kq");

        pos.undo_move();
        assert_eq!(pos, Position::<CastlingXiangqi>::default());
        assert_eq!(pos.key(), key);
    }

    #[test]
    fn test_blocked_castling() {
        let pos: Position<CastlingXiangqi> = "r3k3r/9/9/4p4/9/9/4P4/9/9/RN2K3R w KQkq - 0 1".parse().unwrap();
        assert!(!pos.can_castle(CastlingSide::QueenSide));
        assert!(pos.can_castle(CastlingSide::KingSide));
    }

    #[test]
    fn test_castling_through_attack_is_illegal() {
        // Black rook on g10 covers g1, which the King crosses when castling kingside
        let mut pos: Position<CastlingXiangqi> = "4k1r2/9/9/4p4/9/9/4P4/9/9/4K3R w K - 0 1".parse().unwrap();
        assert!(pos.can_castle(CastlingSide::KingSide));
        assert!(!pos.is_legal_move(Move::new(index(4, 0), index(8, 0))));
    }

    #[test]
    fn test_castling_in_place_out_of_check_is_illegal() {
        // The King already stands on h1, so only the Rook moves; the a1 rook gives check along the rank
        let mut pos: Position<CastlingXiangqi> = "4k4/9/9/9/9/9/9/9/9/r6KR w K - 0 1".parse().unwrap();
        let castle = Move::new(index(7, 0), index(8, 0));
        assert!(pos.in_check(Color::White));
        assert!(pos.can_castle(CastlingSide::KingSide));
        assert!(!pos.is_legal_move(castle));
        assert!(!pos.legal_moves().contains(&castle));

        let mut pos: Position<CastlingXiangqi> = "4k4/9/9/9/9/9/9/9/9/7KR w K - 0 1".parse().unwrap();
        assert!(pos.is_legal_move(castle));
        pos.make_move(castle);
        assert_eq!(pos.piece_on(Square::new(7, 0)), Piece::WHITE_KING);
        assert_eq!(pos.piece_on(Square::new(6, 0)), Piece::WHITE_ROOK);
        assert!(pos.piece_on(Square::new(8, 0)).is_empty());
    }

    #[test]
    fn test_rook_move_and_capture_remove_rights() {
        let mut pos = Position::<CastlingXiangqi>::default();
        pos.make_move(Move::new(index(0, 0), index(0, 5)));
        assert!(!pos.has_castling_right(Color::White, CastlingSide::QueenSide));
        assert!(pos.has_castling_right(Color::White, CastlingSide::KingSide));
        assert_eq!(pos.reversible_moves(), 0);

        pos.make_move(Move::new(index(8, 9), index(8, 0)));
        assert!(!pos.has_castling_right(Color::White, CastlingSide::KingSide));
        assert!(!pos.has_castling_right(Color::Black, CastlingSide::KingSide));
        assert_eq!(pos.castling_rights_string(), "q");

        pos.undo_move();
        pos.undo_move();
        assert_eq!(pos.castling_rights_string(), "KQkq");
    }

    #[test]
    fn test_king_move_removes_rights() {
        let mut pos = Position::<CastlingXiangqi>::default();
        pos.make_move(Move::new(index(4, 0), index(4, 1)));
        assert_eq!(pos.castling_rights_string(), "kq");
        assert_eq!(pos.reversible_moves(), 1);
    }
}
