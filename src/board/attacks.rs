/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::geometry::step;
use crate::{Color, Movement, Piece, PieceKind, Position, Variant};

impl<V: Variant> Position<V> {
    /// Returns `true` if `piece` belongs to `color` and moves (at least partly) like `movement`.
    #[inline(always)]
    fn is_attacker(&self, piece: Piece, color: Color, movement: Movement) -> bool {
        piece.is_color(color) && piece.kind().is_some_and(|kind| V::movement(kind).contains(movement))
    }

    /// Returns `true` if `color`'s King is attacked.
    ///
    /// A side without a King is never in check.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Color, Position, Xiangqi};
    /// let pos: Position<Xiangqi> = "4k4/9/9/9/9/9/9/9/4C4/3K5 b - - 0 1".parse().unwrap();
    /// assert!(!pos.in_check(Color::Black));
    /// let pos: Position<Xiangqi> = "4k4/9/9/9/9/4p4/9/9/4C4/3K5 b - - 0 1".parse().unwrap();
    /// assert!(pos.in_check(Color::Black));
    /// ```
    pub fn in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|square| self.in_check_at(color, square))
    }

    /// Returns `true` if `color`'s opponent attacks the cell at `square`.
    ///
    /// Used both for check detection and for the squares a castling King passes through.
    pub fn in_check_at(&self, color: Color, square: usize) -> bool {
        let geo = V::GEOMETRY;
        let opponent = color.opponent();

        // Cannons: the second piece along a line, jumping over the first
        for &offset in geo.orthogonal() {
            let mut target = step(square, offset);
            let mut screened = false;
            loop {
                let piece = self.squares[target];
                if piece.is_wall() {
                    break;
                }
                if !piece.is_empty() {
                    if screened {
                        if self.is_attacker(piece, opponent, Movement::CANNON) {
                            return true;
                        }
                        break;
                    }
                    screened = true;
                }
                target = step(target, offset);
            }
        }

        // Knights, whose legs next to their own square must be clear
        for &offset in geo.knight_offsets() {
            let origin = step(square, offset);
            if self.is_attacker(self.squares[origin], opponent, Movement::KNIGHT)
                && self.knight_reaches(origin, square)
            {
                return true;
            }
        }

        // Rooks, and an adjacent King where Kings can capture
        let enemy_king = Piece::new(opponent, PieceKind::King);
        for &offset in geo.orthogonal() {
            let mut target = step(square, offset);
            if V::KING_CAN_CAPTURE && self.squares[target] == enemy_king {
                return true;
            }

            while self.squares[target].is_empty() {
                target = step(target, offset);
            }
            if self.is_attacker(self.squares[target], opponent, Movement::ROOK) {
                return true;
            }
        }

        // Pawns attack forward and sideways
        for offset in [geo.forward(color)].into_iter().chain(geo.lateral()) {
            if self.is_attacker(self.squares[step(square, offset)], opponent, Movement::PAWN) {
                return true;
            }
        }

        // Flying general: Kings may not face each other on an open file
        for &offset in geo.vertical() {
            let mut target = step(square, offset);
            while self.squares[target].is_empty() {
                target = step(target, offset);
            }
            if self.squares[target] == enemy_king {
                return true;
            }
        }

        false
    }

    /// Returns `true` if a knight on `origin` has an unblocked leap onto `target`.
    fn knight_reaches(&self, origin: usize, target: usize) -> bool {
        let geo = V::GEOMETRY;
        let offsets = geo.knight_offsets();

        geo.knight_obstacles().iter().enumerate().any(|(i, &obstacle)| {
            self.squares[step(origin, obstacle)].is_empty()
                && (step(origin, offsets[2 * i]) == target || step(origin, offsets[2 * i + 1]) == target)
        })
    }

    /// Returns `true` if the side that just moved did not leave its King attacked.
    ///
    /// If the last move was castling, the King must also not have castled out of, or through, an attacked square.
    /// A King that castles without moving must not be exposed along its rank.
    pub fn is_legal_position(&self) -> bool {
        let mover = self.side_to_move.opponent();
        if self.in_check(mover) {
            return false;
        }

        let Some(data) = self.history.last() else {
            return true;
        };
        let Some(castling_side) = data.castling_side else {
            return true;
        };

        let source = data.mv.source();
        let target = self.castle_target(mover, castling_side);

        if source == target {
            let offset = castling_side.direction();
            let mut index = step(target, -2 * offset);
            loop {
                let piece = self.squares[index];
                if piece.is_wall() || piece.is_color(mover) {
                    return true;
                }
                if self.is_attacker(piece, mover.opponent(), Movement::ROOK) {
                    return false;
                }
                index = step(index, -offset);
            }
        }

        let offset = if source <= target { 1 } else { -1 };
        let mut index = source;
        while index != target {
            if self.in_check_at(mover, index) {
                return false;
            }
            index = step(index, offset);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{Color, Move, Position, Square, Variant, Xiangqi};

    fn pos(fen: &str) -> Position<Xiangqi> {
        fen.parse().unwrap()
    }

    #[test]
    fn test_startpos_not_in_check() {
        let pos = Position::<Xiangqi>::default();
        assert!(!pos.in_check(Color::White));
        assert!(!pos.in_check(Color::Black));
    }

    #[test]
    fn test_flying_general() {
        // Kings face each other with Black to move: White is "in check", so the position is illegal
        assert!("4k4/9/9/9/9/9/9/9/9/4K4 b - - 0 1".parse::<Position<Xiangqi>>().is_err());

        // Any piece between them blocks
        let p = pos("4k4/9/9/9/4n4/9/9/9/9/4K4 w - - 0 1");
        assert!(!p.in_check(Color::White));
        assert!(!p.in_check(Color::Black));

        // Moving the only blocker off the file leaves both Kings attacked
        let mut p = pos("4k4/9/9/9/9/4N4/9/9/9/4K4 w - - 0 1");
        let geo = Xiangqi::GEOMETRY;
        let knight = Move::new(geo.index(Square::new(4, 4)), geo.index(Square::new(2, 5)));
        p.make_move(knight);
        assert!(p.in_check(Color::White));
        assert!(p.in_check(Color::Black));
        assert!(!p.is_legal_position());

        p.undo_move();
        assert!(!p.in_check(Color::White));
        assert!(!p.in_check(Color::Black));
        assert!(!p.is_legal_move(knight));
    }

    #[test]
    fn test_cannon_needs_exactly_one_screen() {
        let p = pos("4k4/9/9/9/4c4/9/9/4P4/9/4K4 w - - 0 1");
        assert!(p.in_check(Color::White));

        let p = pos("4k4/9/9/9/4c4/9/9/9/9/3K5 w - - 0 1");
        assert!(!p.in_check(Color::White));

        let p = pos("4k4/9/9/9/4c4/4p4/9/4P4/9/4K4 w - - 0 1");
        assert!(!p.in_check(Color::White));
    }

    #[test]
    fn test_knight_leg() {
        // Knight on d3 attacks e1 through its d2 leg
        let p = pos("4k4/9/9/4p4/9/9/9/3n5/9/4K4 w - - 0 1");
        assert!(p.in_check(Color::White));

        // Blocking the leg next to the knight removes the attack
        let p = pos("4k4/9/9/4p4/9/9/9/3n5/3P5/4K4 w - - 0 1");
        assert!(!p.in_check(Color::White));

        // A piece next to the King, not the knight, does not block
        let p = pos("4k4/9/9/4p4/9/9/9/3n5/4A4/4K4 w - - 0 1");
        assert!(p.in_check(Color::White));
    }

    #[test]
    fn test_rook_and_pawn_attacks() {
        let p = pos("4k4/9/9/9/9/9/9/9/9/r2K5 w - - 0 1");
        assert!(p.in_check(Color::White));

        let p = pos("4k4/9/9/9/9/9/9/9/9/rN1K5 w - - 0 1");
        assert!(!p.in_check(Color::White));

        // Black pawns attack downwards and sideways, never upwards
        let p = pos("4k4/9/9/9/9/9/9/9/3p5/3K5 w - - 0 1");
        assert!(p.in_check(Color::White));
        let p = pos("4k4/9/9/9/9/9/9/9/9/2pK5 w - - 0 1");
        assert!(p.in_check(Color::White));
        let p = pos("4k4/9/9/9/9/9/9/9/3K5/3p5 w - - 0 1");
        assert!(!p.in_check(Color::White));
    }
}
