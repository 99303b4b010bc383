/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, marker::PhantomData, str::FromStr};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::{
    CastlingRights, CastlingSide, Color, Move, Piece, PieceKind, Square, Variant, Xiangqi,
    ZobristKey,
};

/// Everything needed to take back a move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MoveData {
    /// The move that was made.
    pub mv: Move,

    /// Hash key of the position before the move.
    pub key: ZobristKey,

    /// Contents of the move's target square before the move.
    pub capture: Piece,

    /// Castling rights before the move.
    pub castling_rights: CastlingRights,

    /// If the move was castling, the side castled to.
    pub castling_side: Option<CastlingSide>,

    /// Reversible move counter before the move.
    pub reversible_moves: usize,
}

/// Represents the full state of a game of an eastern chess variant.
///
/// The board is a mailbox array with a border of walls (see [`crate::Geometry`]).
/// Moves are applied in place with [`Position::make_move`] and taken back with [`Position::undo_move`],
/// and every applied move is kept in the position's history.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Position<V: Variant = Xiangqi> {
    /// Contents of every cell of the mailbox array, walls included.
    pub(crate) squares: Vec<Piece>,

    /// The player whose turn it is.
    pub(crate) side_to_move: Color,

    /// Index of each side's King, or `0` if that side has none.
    pub(crate) king_squares: [usize; Color::COUNT],

    pub(crate) castling_rights: CastlingRights,

    /// Number of plies since the last irreversible move.
    pub(crate) reversible_moves: usize,

    /// Plies played before this position was loaded, as implied by its FEN full-move number.
    ply_offset: usize,

    /// Every move made since the position was loaded, oldest first.
    pub(crate) history: Vec<MoveData>,

    /// Hash key of the current position.
    pub(crate) key: ZobristKey,

    _variant: PhantomData<V>,
}

impl<V: Variant> Position<V> {
    /// Creates a board with no pieces on it, White to move.
    fn empty() -> Self {
        let geo = V::GEOMETRY;
        let squares = (0..geo.array_size())
            .map(|index| {
                if geo.is_valid(index) {
                    Piece::EMPTY
                } else {
                    Piece::WALL
                }
            })
            .collect();

        Self {
            squares,
            side_to_move: Color::White,
            king_squares: [0; Color::COUNT],
            castling_rights: CastlingRights::default(),
            reversible_moves: 0,
            ply_offset: 0,
            history: Vec::with_capacity(256),
            key: ZobristKey::default(),
            _variant: PhantomData,
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Besides the full six-field format, a "short" format of piece placements, side to move, reversible move count,
    /// and full-move number is accepted in variants without castling.
    ///
    /// The position must be legal: the side that is not to move may not be in check.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Xiangqi};
    /// let pos = Position::<Xiangqi>::from_fen("4k4/9/9/9/9/4R4/9/9/9/3K5 b - - 0 12").unwrap();
    /// assert_eq!(pos.fullmove_number(), 12);
    /// assert!(Position::<Xiangqi>::from_fen("4k4/9/9/9/9/9/9/9/9/4K4 b - - 0 1").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::empty();
        let geo = V::GEOMETRY;
        let tokens = fen.split_ascii_whitespace().collect::<Vec<_>>();

        if tokens.len() < 2 {
            bail!("FEN string must have at least piece placements and a side to move. Got {fen:?}");
        }

        // Placements
        let rows = tokens[0].split('/').collect::<Vec<_>>();
        if rows.len() != geo.height() {
            bail!(
                "FEN string must have {} ranks of piece placements. Got {}",
                geo.height(),
                rows.len()
            );
        }

        for (row, placements) in rows.iter().enumerate() {
            let rank = geo.height() - 1 - row;
            let mut file = 0usize;
            let mut chars = placements.char_indices().peekable();

            while let Some((start, c)) = chars.next() {
                if c == '0' {
                    bail!("Invalid FEN: Empty square count starting with 0 on rank {}", rank + 1);
                } else if c.is_ascii_digit() {
                    let mut end = start + 1;
                    while let Some(&(i, d)) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        end = i + 1;
                        chars.next();
                    }

                    let empty = placements[start..end]
                        .parse::<usize>()
                        .with_context(|| format!("Invalid FEN: Bad empty square count on rank {}", rank + 1))?;
                    file = file.saturating_add(empty);
                } else {
                    let piece = Piece::from_uci(c)
                        .with_context(|| format!("Invalid FEN: Bad piece placement on rank {}", rank + 1))?;
                    if file >= geo.width() {
                        bail!("Invalid FEN: Too many squares on rank {}", rank + 1);
                    }

                    let index = geo.index(Square::new(file as u8, rank as u8));
                    pos.set_square(index, piece);
                    if piece.is_kind(PieceKind::King) {
                        if let Some(color) = piece.color() {
                            pos.king_squares[color] = index;
                        }
                    }
                    file += 1;
                }
            }

            if file != geo.width() {
                bail!(
                    "Invalid FEN: Rank {} has {file} squares, but the board has {} files",
                    rank + 1,
                    geo.width()
                );
            }
        }

        let count_kings = |color| {
            pos.squares
                .iter()
                .filter(|piece| **piece == Piece::new(color, PieceKind::King))
                .count()
        };
        if !V::kings_count_assertion(count_kings(Color::White), count_kings(Color::Black)) {
            bail!("Invalid FEN: Wrong number of Kings for {}", V::name());
        }

        // Side to move
        let side = tokens[1]
            .parse::<Color>()
            .context("Invalid FEN: Bad side to move")?;
        pos.side_to_move = side;

        let mut fullmove: usize = 1;

        // Short format: placements, side to move, and the two counters
        let is_short = tokens.len() <= 4 && tokens.get(2).is_some_and(|t| t.parse::<usize>().is_ok());
        if is_short && V::HAS_CASTLING {
            bail!("Invalid FEN: {} positions need castling rights", V::name());
        }

        let counters = if is_short {
            2
        } else {
            if let Some(rights) = tokens.get(2).filter(|rights| **rights != "-") {
                for c in rights.chars() {
                    pos.parse_castling_rights(c)?;
                }
            }

            // The next field holds an en passant square in chess, which these variants have no use for.
            4
        };

        if let Some(token) = tokens.get(counters) {
            pos.reversible_moves = token
                .parse()
                .with_context(|| format!("Invalid FEN: Bad reversible move count {token:?}"))?;
        }
        if let Some(token) = tokens.get(counters + 1) {
            fullmove = token
                .parse()
                .with_context(|| format!("Invalid FEN: Bad full-move number {token:?}"))?;
        }

        if fullmove < 1 {
            bail!("Invalid FEN: Full-move number must be at least 1");
        }
        pos.ply_offset = (fullmove - 1)
            .checked_mul(2)
            .and_then(|plies| plies.checked_add(side.index()))
            .with_context(|| format!("Invalid FEN: Full-move number {fullmove} is too large"))?;

        pos.key.hash_side_to_move(side);

        if !pos.is_legal_position() {
            bail!("Invalid FEN: {} is in check, but it is {}'s turn", side.opponent().name(), side.name());
        }

        debug!(fen, key = %pos.key, "loaded {} position", V::name());
        Ok(pos)
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Xiangqi};
    /// let pos = Position::<Xiangqi>::default();
    /// assert_eq!(pos.to_fen(), "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1");
    /// ```
    pub fn to_fen(&self) -> String {
        let geo = V::GEOMETRY;
        let mut placements = String::new();

        for rank in (0..geo.height()).rev() {
            let mut empty = 0;
            for file in 0..geo.width() {
                let piece = self.piece_on(Square::new(file as u8, rank as u8));
                if piece.is_piece() {
                    if empty > 0 {
                        placements += &empty.to_string();
                        empty = 0;
                    }
                    placements.push(piece.to_uci());
                } else {
                    empty += 1;
                }
            }

            if empty > 0 {
                placements += &empty.to_string();
            }
            if rank > 0 {
                placements.push('/');
            }
        }

        format!(
            "{placements} {} {} - {} {}",
            self.side_to_move,
            self.castling_rights_string(),
            self.reversible_moves,
            self.fullmove_number()
        )
    }

    /// Contents of the mailbox cell at `index`.
    #[inline(always)]
    pub fn piece_at(&self, index: usize) -> Piece {
        self.squares.get(index).copied().unwrap_or(Piece::WALL)
    }

    /// Contents of `square`, or [`Piece::WALL`] if it is not on the board.
    #[inline(always)]
    pub fn piece_on(&self, square: Square) -> Piece {
        let geo = V::GEOMETRY;
        if geo.contains(square) {
            self.squares[geo.index(square)]
        } else {
            Piece::WALL
        }
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Index of `color`'s King, if it has one.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Option<usize> {
        match self.king_squares[color.index()] {
            0 => None,
            index => Some(index),
        }
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> &CastlingRights {
        &self.castling_rights
    }

    /// Number of plies since the last capture, pawn move, promotion, drop, or loss of castling rights.
    #[inline(always)]
    pub const fn reversible_moves(&self) -> usize {
        self.reversible_moves
    }

    /// The full-move number, which starts at 1 and increases after every Black move.
    #[inline(always)]
    pub fn fullmove_number(&self) -> usize {
        self.history.len().saturating_add(self.ply_offset) / 2 + 1
    }

    /// Number of plies played since this position was loaded.
    #[inline(always)]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Every move made since this position was loaded, oldest first.
    #[inline(always)]
    pub fn history(&self) -> &[MoveData] {
        &self.history
    }

    /// The most recently made move, if any.
    #[inline(always)]
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|data| data.mv)
    }

    /// Places `piece` on the cell at `index`, keeping the key in sync.
    #[inline(always)]
    pub(crate) fn set_square(&mut self, index: usize, piece: Piece) {
        self.key.hash_piece(index, self.squares[index]);
        self.key.hash_piece(index, piece);
        self.squares[index] = piece;
    }

    /// Applies `mv` to this position.
    ///
    /// A drop that names no kind places a Pawn.
    ///
    /// `mv` is assumed to be legal. Illegal moves leave the position in an unspecified, though still undoable, state.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Square, Xiangqi};
    /// let mut pos = Position::<Xiangqi>::default();
    /// let mv = pos.parse_move("Che3").unwrap();
    /// pos.make_move(mv);
    /// assert_eq!(pos.piece_on(Square::from_uci("e3").unwrap()).to_uci(), 'C');
    /// assert_eq!(pos.undo_move(), Some(mv));
    /// assert_eq!(pos, Position::default());
    /// ```
    pub fn make_move(&mut self, mv: Move) {
        let side = self.side_to_move;
        let source = mv.source();
        let mut target = mv.target();
        let captured = self.squares[target];

        let mut data = MoveData {
            mv,
            key: self.key,
            capture: captured,
            castling_rights: self.castling_rights,
            castling_side: None,
            reversible_moves: self.reversible_moves,
        };

        let mut piece = if mv.is_drop() {
            Piece::new(side, mv.promotion().unwrap_or(PieceKind::Pawn))
        } else {
            self.squares[source]
        };
        let mut clear_source = !mv.is_drop() && source != target;
        let mut is_reversible = !mv.is_drop();

        match piece.kind() {
            Some(PieceKind::King) => {
                if let Some(castling_side) = self.castling_side(mv) {
                    data.castling_side = Some(castling_side);

                    let rook_source = target;
                    target = self.castle_target(side, castling_side);
                    let rook_target = match castling_side {
                        CastlingSide::QueenSide => target + 1,
                        CastlingSide::KingSide => target - 1,
                    };

                    if rook_target == source || target == source {
                        clear_source = false;
                    }

                    self.set_square(rook_source, Piece::EMPTY);
                    self.set_square(rook_target, Piece::new(side, PieceKind::Rook));
                }

                self.king_squares[side] = target;
                self.remove_castling_rights_for(side);
            }

            Some(PieceKind::Rook) => {
                for castling_side in CastlingSide::all() {
                    if self.castling_rights.get(side, castling_side) == Some(source) {
                        self.set_castling_square(side, castling_side, 0);
                        is_reversible = false;
                    }
                }
            }

            Some(PieceKind::Pawn) => is_reversible = false,

            _ => {}
        }

        if data.castling_side.is_none() && captured.is_color(side.opponent()) {
            self.remove_castling_rights_at(target);
            is_reversible = false;
        }

        if !mv.is_drop() {
            if let Some(promotion) = mv.promotion() {
                piece = Piece::new(side, promotion);
                is_reversible = false;
            }
        }

        self.set_square(target, piece);
        if clear_source {
            self.set_square(source, Piece::EMPTY);
        }

        self.reversible_moves = if is_reversible {
            self.reversible_moves.saturating_add(1)
        } else {
            0
        };

        self.history.push(data);

        self.key.hash_side_to_move(side);
        self.side_to_move = side.opponent();
        self.key.hash_side_to_move(self.side_to_move);
    }

    /// Takes back the most recently made move, returning it.
    ///
    /// Returns `None` if no moves have been made since this position was loaded.
    pub fn undo_move(&mut self) -> Option<Move> {
        let data = self.history.pop()?;
        let mv = data.mv;
        let source = mv.source();
        let target = mv.target();

        self.side_to_move = self.side_to_move.opponent();
        let side = self.side_to_move;
        self.castling_rights = data.castling_rights;
        self.reversible_moves = data.reversible_moves;

        if let Some(castling_side) = data.castling_side {
            let king_target = self.castle_target(side, castling_side);
            let rook_target = match castling_side {
                CastlingSide::QueenSide => king_target + 1,
                CastlingSide::KingSide => king_target - 1,
            };

            self.king_squares[side] = source;
            self.set_square(king_target, Piece::EMPTY);
            self.set_square(rook_target, Piece::EMPTY);
            self.set_square(target, Piece::new(side, PieceKind::Rook));
            self.set_square(source, Piece::new(side, PieceKind::King));
        } else {
            if target == self.king_squares[side] {
                self.king_squares[side] = source;
            }

            // A drop has no source square to restore
            if !mv.is_drop() {
                let moved = if mv.promotion().is_some() {
                    Piece::new(side, PieceKind::Pawn)
                } else {
                    self.squares[target]
                };
                self.set_square(source, moved);
            }
            self.set_square(target, data.capture);
        }

        self.key = data.key;
        Some(mv)
    }
}

impl<V: Variant> Default for Position<V> {
    /// The starting position of the variant.
    fn default() -> Self {
        // Safety: The FEN for startpos is always valid
        Self::from_fen(V::fen_startpos()).unwrap()
    }
}

impl<V: Variant> FromStr for Position<V> {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl<V: Variant> fmt::Display for Position<V> {
    /// Draws the board, with some information about the position beside it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geo = V::GEOMETRY;
        let last_move = self
            .last_move()
            .map(|mv| format!("{mv:?}"))
            .unwrap_or_else(|| String::from("-"));

        let info = [
            format!("    FEN: {}", self.to_fen()),
            format!("    Key: {}", self.key),
            format!("   Side: {}", self.side_to_move.name()),
            format!("   Last: {last_move}"),
        ];

        for rank in (0..geo.height()).rev() {
            write!(f, "{:>2}|", rank + 1)?;
            for file in 0..geo.width() {
                write!(f, " {}", self.piece_on(Square::new(file as u8, rank as u8)))?;
            }

            let row = geo.height() - 1 - rank;
            if let Some(line) = info.get(row) {
                write!(f, "{line}")?;
            }
            writeln!(f)?;
        }

        write!(f, "  +")?;
        for _ in 0..geo.width() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in 0..geo.width() {
            write!(f, " {}", (b'a' + file as u8) as char)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_startpos() {
        let pos = Position::<Xiangqi>::default();
        assert_eq!(pos.to_fen(), FEN_STARTPOS);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.piece_on(Square::new(4, 0)), Piece::WHITE_KING);
        assert_eq!(pos.piece_on(Square::new(7, 7)), Piece::BLACK_CANNON);
        assert_eq!(pos.king_square(Color::Black), Some(Xiangqi::GEOMETRY.index(Square::new(4, 9))));
        assert!(pos.castling_rights().is_empty());
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            FEN_STARTPOS,
            "3k5/4a4/4b4/9/2b6/9/9/4B4/4A4/3AK4 b - - 17 40",
            "r1bakab1r/9/1cn4c1/p1p1p1p1p/9/9/P1P1P1P1P/1C2C1N2/9/RNBAKAB1R b - - 3 3",
            "4k4/9/9/9/4p4/4P4/9/9/9/3K5 w - - 0 1",
        ];

        for fen in fens {
            let pos: Position<Xiangqi> = fen.parse().unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_short_fen() {
        let pos: Position<Xiangqi> = "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b 3 7".parse().unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.fullmove_number(), 7);
        assert_eq!(pos.reversible_moves(), 3);
        assert_eq!(pos.to_fen(), "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b - - 3 7");

        let pos: Position<Xiangqi> = "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b 5".parse().unwrap();
        assert_eq!(pos.reversible_moves(), 5);
        assert_eq!(pos.fullmove_number(), 1);

        let pos: Position<Xiangqi> = "4k4/9/9/9/4p4/4P4/9/9/9/3K5 w".parse().unwrap();
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_invalid_fens() {
        let fens = [
            "",
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR",
            // Too few ranks
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/RNBAKABNR w - - 0 1",
            // Too many files
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C2/9/RNBAKABNR w - - 0 1",
            // Too few files
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C/9/RNBAKABNR w - - 0 1",
            // Unknown piece
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5Z1/9/RNBAKABNR w - - 0 1",
            // Zero empty squares
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/01C5C1/9/RNBAKABNR w - - 0 1",
            // Leading zeros in an empty square count
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/09/RNBAKABNR w - - 0 1",
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/009/RNBAKABNR w - - 0 1",
            // Empty square count too large for the board
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/99999999999999999999999/RNBAKABNR w - - 0 1",
            // Bad side to move
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR x - - 0 1",
            // Missing a King
            "rnba1abnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1",
            // No castling in Xiangqi
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w K - 0 1",
            // Negative counters
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - -1 1",
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 0",
            // Full-move number too large to count plies from
            "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b - - 0 18446744073709551615",
            "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b 0 18446744073709551615",
            // Black is in check with White to move
            "4k4/9/9/9/9/4R4/9/9/9/3K5 w - - 0 1",
        ];

        for fen in fens {
            assert!(fen.parse::<Position<Xiangqi>>().is_err(), "{fen:?} should not parse");
        }
    }

    #[test]
    fn test_fullmove_number_advances() {
        let mut pos = Position::<Xiangqi>::default();
        let first = pos.legal_moves()[0];
        pos.make_move(first);
        assert_eq!(pos.fullmove_number(), 1);

        let reply = pos.legal_moves()[0];
        pos.make_move(reply);
        assert_eq!(pos.fullmove_number(), 2);
        assert!(pos.to_fen().ends_with(" 2"));

        let mut pos: Position<Xiangqi> = "4k4/9/9/9/4p4/4P4/9/9/9/3K5 b - - 0 5".parse().unwrap();
        let mv = pos.legal_moves()[0];
        pos.make_move(mv);
        assert_eq!(pos.fullmove_number(), 6);
    }

    #[test]
    fn test_counters_at_their_limits() {
        let fen = format!("4k4/9/9/9/4p4/4P4/9/9/9/3K5 b - - 0 {}", usize::MAX / 2);
        let mut pos: Position<Xiangqi> = fen.parse().unwrap();
        assert_eq!(pos.fullmove_number(), usize::MAX / 2);
        let mv = pos.legal_moves()[0];
        pos.make_move(mv);
        assert_eq!(pos.fullmove_number(), usize::MAX / 2 + 1);

        let fen = format!("4k4/9/9/9/4p4/4P4/9/9/9/3K5 w - - {} 1", usize::MAX);
        let mut pos: Position<Xiangqi> = fen.parse().unwrap();
        let original = pos.clone();
        let mv = pos.parse_move("Kd2").unwrap();
        pos.make_move(mv);
        assert_eq!(pos.reversible_moves(), usize::MAX);
        pos.undo_move();
        assert_eq!(pos, original);
    }

    #[test]
    fn test_make_undo_restores_everything() {
        let fens = [
            FEN_STARTPOS,
            "r1bakab1r/9/1cn4c1/p1p1p1p1p/9/9/P1P1P1P1P/1C2C1N2/9/RNBAKAB1R b - - 3 3",
            "3k5/4P4/9/9/9/9/9/9/9/4K4 w - - 0 1",
        ];

        for fen in fens {
            let mut pos: Position<Xiangqi> = fen.parse().unwrap();
            let original = pos.clone();

            for mv in pos.legal_moves() {
                pos.make_move(mv);
                assert_ne!(pos.key(), original.key(), "{mv:?} did not change the key");
                assert_eq!(pos.undo_move(), Some(mv));
                assert_eq!(pos, original, "{mv:?} was not undone");
            }
        }
    }

    #[test]
    fn test_incremental_key_matches_fresh_key() {
        let mut pos = Position::<Xiangqi>::default();
        for san in ["Che3", "Nh10g8", "Nh1g3", "Ri10h10", "Ri1h1"] {
            let mv = pos.parse_move(san).unwrap();
            pos.make_move(mv);
            let fresh: Position<Xiangqi> = pos.to_fen().parse().unwrap();
            assert_eq!(pos.key(), fresh.key(), "key diverged after {san}");
        }
    }

    fn play(pos: &mut Position<Xiangqi>, san: &str) {
        let mv = pos.parse_move(san).unwrap();
        pos.make_move(mv);
    }

    #[test]
    fn test_reversible_counter() {
        let mut pos = Position::<Xiangqi>::default();

        play(&mut pos, "Nh1g3");
        assert_eq!(pos.reversible_moves(), 1);
        play(&mut pos, "Nh10g8");
        assert_eq!(pos.reversible_moves(), 2);

        // Pawn moves are irreversible
        play(&mut pos, "e5");
        assert_eq!(pos.reversible_moves(), 0);

        // So are captures
        play(&mut pos, "Cb8xb1");
        assert_eq!(pos.reversible_moves(), 0);

        pos.undo_move();
        assert_eq!(pos.reversible_moves(), 0);
        pos.undo_move();
        assert_eq!(pos.reversible_moves(), 2);
    }

    #[test]
    fn test_promotion_and_drop() {
        let geo = Xiangqi::GEOMETRY;
        let mut pos: Position<Xiangqi> = "3k5/9/4P4/9/9/9/9/9/9/4K4 w - - 5 1".parse().unwrap();
        let original = pos.clone();

        let e8 = geo.index(Square::new(4, 7));
        let e9 = geo.index(Square::new(4, 8));
        let promotion = Move::with_promotion(e8, e9, PieceKind::Rook);
        pos.make_move(promotion);
        assert_eq!(pos.piece_at(e9), Piece::WHITE_ROOK);
        assert!(pos.piece_at(e8).is_empty());
        assert_eq!(pos.reversible_moves(), 0);
        pos.undo_move();
        assert_eq!(pos, original);

        let a5 = geo.index(Square::new(0, 4));
        pos.make_move(Move::drop(PieceKind::Cannon, a5));
        assert_eq!(pos.piece_at(a5), Piece::WHITE_CANNON);
        assert_eq!(pos.reversible_moves(), 0);
        pos.undo_move();
        assert_eq!(pos, original);

        // A drop that names no kind places a Pawn, and undoing it leaves the border alone
        pos.make_move(Move::new(0, a5));
        assert_eq!(pos.piece_at(a5), Piece::WHITE_PAWN);
        pos.undo_move();
        assert_eq!(pos.piece_at(0), Piece::WALL);
        assert!(pos.piece_at(a5).is_empty());
        assert_eq!(pos, original);
    }

    #[test]
    fn test_null_move_in_place() {
        let geo = Xiangqi::GEOMETRY;
        let mut pos = Position::<Xiangqi>::default();
        let original = pos.clone();

        let a1 = geo.index(Square::new(0, 0));
        pos.make_move(Move::new(a1, a1));
        assert_eq!(pos.piece_at(a1), Piece::WHITE_ROOK);
        assert_eq!(pos.side_to_move(), Color::Black);

        pos.undo_move();
        assert_eq!(pos, original);
        assert_eq!(pos.undo_move(), None);
    }

    #[test]
    fn test_display_draws_board() {
        let pos = Position::<Xiangqi>::default();
        let drawn = pos.to_string();
        assert!(drawn.starts_with("10| r n b a k a b n r"));
        assert!(drawn.contains(FEN_STARTPOS));
        assert!(drawn.ends_with("a b c d e f g h i"));
    }
}
