/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::geometry::step;
use crate::{Move, MoveList, Movement, PieceKind, Position, Variant};

impl<V: Variant> Position<V> {
    /// Generates all pseudo-legal moves of the side to move, optionally only for pieces of `kind`.
    ///
    /// Castling moves are included whenever King moves are. Pseudo-legal moves may leave the mover's King attacked;
    /// see [`Position::legal_moves`].
    pub fn generate_moves(&self, moves: &mut MoveList, kind: Option<PieceKind>) {
        let side = self.side_to_move;

        for index in V::GEOMETRY.indices() {
            let piece = self.squares[index];
            if !piece.is_color(side) {
                continue;
            }
            let Some(piece_kind) = piece.kind() else {
                continue;
            };

            if kind.map_or(true, |kind| kind == piece_kind) {
                self.generate_moves_for_piece(moves, piece_kind, index);
            }
        }
    }

    /// Generates the pseudo-legal moves of a piece of `kind` standing on `source`, for the side to move.
    pub fn generate_moves_for_piece(&self, moves: &mut MoveList, kind: PieceKind, source: usize) {
        let geo = V::GEOMETRY;
        let side = self.side_to_move;
        let movement = V::movement(kind);

        if movement.contains(Movement::PAWN) {
            let forward = geo.forward(side);
            let crossed_river = geo
                .square(source)
                .is_some_and(|square| !geo.is_own_half(side, square.rank() as usize));

            self.generate_hopping_moves(moves, source, [forward]);
            if crossed_river {
                self.generate_hopping_moves(moves, source, geo.lateral());
            }
        }

        if movement.contains(Movement::KING) {
            let targets = geo
                .orthogonal()
                .iter()
                .copied()
                .filter(|offset| geo.in_fort(step(source, *offset)));
            self.generate_hopping_moves(moves, source, targets);

            if kind == PieceKind::King && self.king_square(side) == Some(source) {
                self.generate_castling_moves(moves);
            }
        }

        if movement.contains(Movement::ADVISOR) {
            let targets = geo
                .diagonal()
                .iter()
                .copied()
                .filter(|offset| geo.in_fort(step(source, *offset)));
            self.generate_hopping_moves(moves, source, targets);
        }

        if movement.contains(Movement::KNIGHT) {
            let offsets = geo.knight_offsets();
            for (i, &obstacle) in geo.knight_obstacles().iter().enumerate() {
                if self.squares[step(source, obstacle)].is_empty() {
                    self.generate_hopping_moves(moves, source, [offsets[2 * i], offsets[2 * i + 1]]);
                }
            }
        }

        if movement.contains(Movement::BISHOP) {
            for (&eye, &offset) in geo.bishop_obstacles().iter().zip(geo.bishop_offsets()) {
                if !self.squares[step(source, eye)].is_empty() {
                    continue;
                }

                let target = step(source, offset);
                if geo
                    .square(target)
                    .is_some_and(|square| geo.is_own_half(side, square.rank() as usize))
                {
                    self.generate_hopping_moves(moves, source, [offset]);
                }
            }
        }

        if movement.contains(Movement::ROOK) {
            self.generate_sliding_moves(moves, source);
        }

        if movement.contains(Movement::CANNON) {
            self.generate_cannon_moves(moves, source);
        }
    }

    /// Appends a move to every `offset` from `source` that lands on an empty or opposing cell.
    fn generate_hopping_moves(
        &self,
        moves: &mut MoveList,
        source: usize,
        offsets: impl IntoIterator<Item = isize>,
    ) {
        let opponent = self.side_to_move.opponent();

        for offset in offsets {
            let target = step(source, offset);
            let piece = self.squares[target];
            if piece.is_empty() || piece.is_color(opponent) {
                moves.push(Move::new(source, target));
            }
        }
    }

    /// Appends moves along every orthogonal ray from `source`, up to and including the first opposing piece.
    fn generate_sliding_moves(&self, moves: &mut MoveList, source: usize) {
        let opponent = self.side_to_move.opponent();

        for &offset in V::GEOMETRY.orthogonal() {
            let mut target = step(source, offset);
            while self.squares[target].is_empty() {
                moves.push(Move::new(source, target));
                target = step(target, offset);
            }
            if self.squares[target].is_color(opponent) {
                moves.push(Move::new(source, target));
            }
        }
    }

    /// Appends cannon moves from `source`: quiet moves up to the first piece on each ray,
    /// and a capture of the piece after it.
    fn generate_cannon_moves(&self, moves: &mut MoveList, source: usize) {
        let opponent = self.side_to_move.opponent();

        for &offset in V::GEOMETRY.orthogonal() {
            let mut target = step(source, offset);
            while self.squares[target].is_empty() {
                moves.push(Move::new(source, target));
                target = step(target, offset);
            }
            if self.squares[target].is_wall() {
                continue;
            }

            // Jump the screen, then capture the next piece if it is an enemy
            target = step(target, offset);
            while self.squares[target].is_empty() {
                target = step(target, offset);
            }
            if self.squares[target].is_color(opponent) {
                moves.push(Move::new(source, target));
            }
        }
    }

    /// Returns `true` if making `mv` would not leave the mover's King attacked.
    ///
    /// `mv` must be pseudo-legal. The position is restored before returning.
    pub fn is_legal_trial(&mut self, mv: Move) -> bool {
        if !V::KING_CAN_CAPTURE
            && self.king_square(self.side_to_move) == Some(mv.source())
            && self.squares[mv.target()].is_color(self.side_to_move.opponent())
        {
            return false;
        }

        self.make_move(mv);
        let legal = self.is_legal_position();
        self.undo_move();
        legal
    }

    /// Returns `true` if `mv` is a legal move for the side to move.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Move, Position, Square, Variant, Xiangqi};
    /// let mut pos = Position::<Xiangqi>::default();
    /// let index = |s: &str| Xiangqi::GEOMETRY.index(s.parse::<Square>().unwrap());
    /// assert!(pos.is_legal_move(Move::new(index("b3"), index("e3"))));
    /// assert!(!pos.is_legal_move(Move::new(index("e1"), index("e3"))));
    /// ```
    pub fn is_legal_move(&mut self, mv: Move) -> bool {
        let geo = V::GEOMETRY;
        let side = self.side_to_move;

        if mv.is_null() || !geo.is_valid(mv.target()) {
            return false;
        }

        if mv.is_drop() {
            let Some(kind) = mv.promotion() else {
                return false;
            };
            if kind == PieceKind::King || !self.squares[mv.target()].is_empty() {
                return false;
            }
            return self.is_legal_trial(mv);
        }

        let piece = self.piece_at(mv.source());
        let Some(kind) = piece.kind().filter(|_| piece.is_color(side)) else {
            return false;
        };

        let mut moves = MoveList::new();
        self.generate_moves_for_piece(&mut moves, kind, mv.source());

        moves.contains(&mv) && self.is_legal_trial(mv)
    }

    /// Generates all legal moves of the side to move.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Xiangqi};
    /// let mut pos = Position::<Xiangqi>::default();
    /// assert_eq!(pos.legal_moves().len(), 44);
    /// ```
    pub fn legal_moves(&mut self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate_moves(&mut moves, None);
        moves.retain(|mv| self.is_legal_trial(*mv));
        moves
    }

    /// Returns `true` if the side to move has at least one legal move.
    pub fn can_move(&mut self) -> bool {
        let mut moves = MoveList::new();
        self.generate_moves(&mut moves, None);
        moves.into_iter().any(|mv| self.is_legal_trial(mv))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Move, MoveList, PieceKind, Position, Square, Variant, Xiangqi};

    fn index(square: &str) -> usize {
        Xiangqi::GEOMETRY.index(square.parse::<Square>().unwrap())
    }

    fn targets_from(pos: &mut Position<Xiangqi>, source: &str) -> Vec<String> {
        let source = index(source);
        let mut targets = pos
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.source() == source)
            .filter_map(|mv| Xiangqi::GEOMETRY.square(mv.target()))
            .map(|square| square.to_uci())
            .collect::<Vec<_>>();
        targets.sort();
        targets
    }

    #[test]
    fn test_startpos_moves() {
        let mut pos = Position::<Xiangqi>::default();
        assert_eq!(pos.legal_moves().len(), 44);

        let mut moves = MoveList::new();
        pos.generate_moves(&mut moves, Some(PieceKind::Cannon));
        assert_eq!(moves.len(), 24);
        pos.generate_moves(&mut moves, Some(PieceKind::Pawn));
        assert_eq!(moves.len(), 29);
    }

    #[test]
    fn test_pawn_moves_sideways_after_river() {
        let mut pos: Position<Xiangqi> = "3k5/9/9/9/4P4/9/9/9/9/4K4 w - - 0 1".parse().unwrap();
        assert_eq!(targets_from(&mut pos, "e6"), ["d6", "e7", "f6"]);

        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/4P4/9/9/9/4K4 w - - 0 1".parse().unwrap();
        assert_eq!(targets_from(&mut pos, "e5"), ["e6"]);

        // Black pawns advance downwards
        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/4p4/9/9/9/4K4 b - - 0 1".parse().unwrap();
        assert_eq!(targets_from(&mut pos, "e5"), ["d5", "e4", "f5"]);
    }

    #[test]
    fn test_king_and_advisor_stay_in_fort() {
        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/9/9/9/9/3AK4 w - - 0 1".parse().unwrap();
        assert_eq!(targets_from(&mut pos, "e1"), ["e2", "f1"]);
        assert_eq!(targets_from(&mut pos, "d1"), ["e2"]);
    }

    #[test]
    fn test_knight_and_bishop_blocking() {
        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/9/9/9/2P6/2BNK4 w - - 0 1".parse().unwrap();

        // The bishop and King block two of the knight's legs, leaving only d2
        assert_eq!(targets_from(&mut pos, "d1"), ["c3", "e3"]);

        // The bishop's d2 eye is free, but it may not cross the river
        assert_eq!(targets_from(&mut pos, "c1"), ["a3", "e3"]);

        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/2B6/9/9/9/4K4 w - - 0 1".parse().unwrap();
        assert_eq!(targets_from(&mut pos, "c5"), ["a3", "e3"]);
    }

    #[test]
    fn test_cannon_jumps_to_capture() {
        let mut pos: Position<Xiangqi> = "3k5/9/9/4n4/9/4P4/9/4C4/9/5K3 w - - 0 1".parse().unwrap();
        let targets = targets_from(&mut pos, "e3");
        assert!(targets.contains(&String::from("e4")));
        assert!(targets.contains(&String::from("e7")));
        assert!(!targets.contains(&String::from("e5")));
        assert!(!targets.contains(&String::from("e6")));
    }

    #[test]
    fn test_moves_must_not_expose_king() {
        // The e2 cannon is pinned against the Rook on e10
        let mut pos: Position<Xiangqi> = "3kr4/9/9/9/9/9/9/9/4C4/4K4 w - - 0 1".parse().unwrap();
        assert!(targets_from(&mut pos, "e2").iter().all(|t| t.starts_with('e')));
        assert!(!pos.is_legal_move(Move::new(index("e2"), index("d2"))));
    }

    #[test]
    fn test_drops() {
        let mut pos: Position<Xiangqi> = "3k5/9/9/9/9/9/9/9/9/4K4 w - - 0 1".parse().unwrap();
        assert!(pos.is_legal_move(Move::drop(PieceKind::Rook, index("a5"))));
        assert!(!pos.is_legal_move(Move::drop(PieceKind::Rook, index("e1"))));
        assert!(!pos.is_legal_move(Move::drop(PieceKind::King, index("a5"))));
    }

    #[test]
    fn test_can_move() {
        let mut pos = Position::<Xiangqi>::default();
        assert!(pos.can_move());

        // Rooks on the two back ranks, and the open e-file is covered by White's King
        let mut pos: Position<Xiangqi> = "R2k5/R8/9/9/9/9/9/9/9/4K4 b - - 0 1".parse().unwrap();
        assert!(pos.in_check(crate::Color::Black));
        assert!(!pos.can_move());
        assert!(pos.legal_moves().is_empty());
    }
}
