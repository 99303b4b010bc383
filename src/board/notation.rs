/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{anyhow, bail, Context, Result};
use tracing::trace;

use crate::{CastlingSide, Move, MoveList, Piece, PieceKind, Position, Square, Variant};

impl<V: Variant> Position<V> {
    /// Name of the square at mailbox `index`, or `-` for a wall.
    fn square_name(&self, index: usize) -> String {
        V::GEOMETRY
            .square(index)
            .map(Square::to_uci)
            .unwrap_or_else(|| String::from("-"))
    }

    /// Parses a square name, which must lie on the board.
    fn parse_square(&self, s: &str) -> Result<usize> {
        let square = Square::from_uci(s)?;
        if !V::GEOMETRY.contains(square) {
            bail!("Square {square} is not on the board");
        }
        Ok(V::GEOMETRY.index(square))
    }

    /// `+` if `mv` gives check, `#` if it gives mate, and nothing otherwise.
    fn check_suffix(&mut self, mv: Move) -> &'static str {
        self.make_move(mv);
        let suffix = if !self.in_check(self.side_to_move) {
            ""
        } else if self.can_move() {
            "+"
        } else {
            "#"
        };
        self.undo_move();
        suffix
    }

    /// Formats `mv` in long algebraic notation, such as `h3e3`, `e9e10r`, or `R@e5`.
    ///
    /// Castling is written as the King's move to its destination, except in randomized variants,
    /// where it is written as the King capturing its own Rook.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Move, Position, Square, Variant, Xiangqi};
    /// let pos = Position::<Xiangqi>::default();
    /// let index = |s: &str| Xiangqi::GEOMETRY.index(s.parse::<Square>().unwrap());
    /// assert_eq!(pos.to_lan(Move::new(index("h3"), index("h10"))), "h3h10");
    /// ```
    pub fn to_lan(&self, mv: Move) -> String {
        if mv.is_drop() {
            let kind = mv.promotion().map_or('?', |kind| kind.to_uci().to_ascii_uppercase());
            return format!("{kind}@{}", self.square_name(mv.target()));
        }

        let source = mv.source();
        let mut target = mv.target();
        if !V::IS_RANDOM && self.king_square(self.side_to_move) == Some(source) {
            if let Some(side) = self.castling_side(mv) {
                target = self.castle_target(self.side_to_move, side);
            }
        }

        let mut lan = self.square_name(source) + &self.square_name(target);
        if let Some(promotion) = mv.promotion() {
            lan.push(promotion.to_uci());
        }
        lan
    }

    /// Parses a move written in long algebraic notation.
    ///
    /// Capture and check markers are ignored. A King moving onto its castling destination is read as castling
    /// whenever that castling right exists. The move is not checked for legality.
    pub fn parse_lan(&self, lan: &str) -> Result<Move> {
        let cleaned = lan
            .chars()
            .filter(|c| !matches!(c, 'x' | '=' | '+' | '#' | '!' | '?'))
            .collect::<String>();

        if let Some((kind, square)) = cleaned.split_once('@') {
            let kind = kind
                .parse::<PieceKind>()
                .with_context(|| format!("Invalid drop {lan:?}"))?;
            return Ok(Move::drop(kind, self.parse_square(square)?));
        }

        let (from, consumed) =
            Square::parse_prefix(&cleaned, usize::MAX).ok_or_else(|| anyhow!("Invalid move {lan:?}: No source square"))?;
        let rest = &cleaned[consumed..];
        let (to, consumed) =
            Square::parse_prefix(rest, usize::MAX).ok_or_else(|| anyhow!("Invalid move {lan:?}: No target square"))?;
        let rest = &rest[consumed..];

        let geo = V::GEOMETRY;
        if !geo.contains(from) || !geo.contains(to) {
            bail!("Invalid move {lan:?}: Square is not on the board");
        }
        let source = geo.index(from);
        let target = geo.index(to);

        let promotion = match rest.len() {
            0 => None,
            _ => Some(rest.parse::<PieceKind>().with_context(|| format!("Invalid promotion in {lan:?}"))?),
        };

        let side = self.side_to_move;
        if self.king_square(side) == Some(source) && source.abs_diff(target) != 1 {
            for castling_side in CastlingSide::all() {
                if target != self.castle_target(side, castling_side) {
                    continue;
                }
                if let Some(rook) = self.castling_rights.get(side, castling_side) {
                    return Ok(Move::new(source, rook));
                }
            }
        }

        Ok(match promotion {
            Some(promotion) => Move::with_promotion(source, target, promotion),
            None => Move::new(source, target),
        })
    }

    /// Formats `mv` in standard algebraic notation, such as `Che3`, `Nh10g8`, `e5`, `Rxa10+`, or `O-O`.
    ///
    /// `mv` must be legal. The position is left unchanged.
    ///
    /// Piece moves name the source file, or else the source rank, when another piece of the same kind could also
    /// legally reach the target. Pawn moves are never disambiguated, so two pawns able to step onto the same square
    /// produce a string that does not name a unique move.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Xiangqi};
    /// let mut pos = Position::<Xiangqi>::default();
    /// let mv = pos.parse_move("h3e3").unwrap();
    /// assert_eq!(pos.to_san(mv), "Che3");
    /// ```
    pub fn to_san(&mut self, mv: Move) -> String {
        let suffix = self.check_suffix(mv);
        if mv.is_drop() {
            return self.to_lan(mv) + suffix;
        }

        let geo = V::GEOMETRY;
        let source = mv.source();
        let target = mv.target();
        let piece = self.piece_at(source);
        let capture = source != target && self.piece_at(target).is_piece();

        let (Some(kind), Some(from)) = (piece.kind(), geo.square(source)) else {
            return self.to_lan(mv) + suffix;
        };

        let mut need_file = false;
        let mut need_rank = false;
        let mut san = String::new();

        if kind == PieceKind::Pawn {
            need_file = capture;
        } else {
            if kind == PieceKind::King {
                if let Some(side) = self.castling_side(mv) {
                    return String::from(side.notation()) + suffix;
                }
            }

            san.push(kind.to_uci().to_ascii_uppercase());

            let mut moves = MoveList::new();
            self.generate_moves(&mut moves, Some(kind));
            for other in moves {
                if other.source() == source || other.target() != target || other.is_drop() {
                    continue;
                }
                if !self.is_legal_trial(other) {
                    continue;
                }
                let Some(other_from) = geo.square(other.source()) else {
                    continue;
                };

                if other_from.file() != from.file() {
                    need_file = true;
                } else if other_from.rank() != from.rank() {
                    need_rank = true;
                }
            }
        }

        if need_file {
            san.push(from.file_char());
        }
        if need_rank {
            san += &(from.rank() as usize + 1).to_string();
        }
        if capture {
            san.push('x');
        }
        san += &self.square_name(target);

        if let Some(promotion) = mv.promotion() {
            san.push('=');
            san.push(promotion.to_uci().to_ascii_uppercase());
        }

        san + suffix
    }

    /// Parses a move written in standard algebraic notation, which must be legal.
    ///
    /// Trailing `+`, `#`, `!`, and `?` are ignored. A capture marker must be present exactly when the move captures.
    pub fn parse_san(&mut self, san: &str) -> Result<Move> {
        let result = self.parse_san_inner(san);
        if let Err(err) = &result {
            trace!(san, "rejected SAN move: {err:#}");
        }
        result
    }

    fn parse_san_inner(&mut self, san: &str) -> Result<Move> {
        let geo = V::GEOMETRY;
        let side = self.side_to_move;

        let s = san.trim_end_matches(['+', '#', '!', '?']);
        if s.len() < 2 || !s.is_ascii() {
            bail!("Invalid SAN {san:?}");
        }

        if s.starts_with("O-O") {
            let castling_side = match s {
                "O-O" => CastlingSide::KingSide,
                "O-O-O" => CastlingSide::QueenSide,
                _ => bail!("Invalid castling move {san:?}"),
            };
            let (Some(king), Some(rook)) = (self.king_square(side), self.castling_rights.get(side, castling_side))
            else {
                bail!("{} cannot castle {castling_side}", side.name());
            };

            let mv = Move::new(king, rook);
            if !self.is_legal_move(mv) {
                bail!("Illegal castling move {san:?}");
            }
            return Ok(mv);
        }

        // Longest run of digits in the string bounds how many digits a rank may use
        let digits = if geo.multi_digit() {
            s.split(|c: char| !c.is_ascii_digit()).map(str::len).max().unwrap_or(0).max(1)
        } else {
            1
        };

        let bytes = s.as_bytes();
        let mut it = 0;

        if bytes[0] == b'x' {
            bail!("Invalid SAN {san:?}: Cannot start with a capture");
        }
        if bytes[0] == b'P' {
            it += 1;
        }

        let mut target = None;
        let symbol = bytes.get(it).filter(|c| c.is_ascii_uppercase());
        let kind = match symbol.map(|c| PieceKind::from_uci(*c as char)) {
            Some(Ok(kind)) => {
                it += 1;
                kind
            }
            _ => PieceKind::Pawn,
        };

        if kind == PieceKind::Pawn && it == 0 {
            if let Some((square, consumed)) = Square::parse_prefix(s, digits) {
                if geo.contains(square) {
                    target = Some(square);
                    it = consumed;
                }
            }
        }

        // Drops
        if kind != PieceKind::Pawn && bytes.get(it) == Some(&b'@') {
            let target = self.parse_square(&s[it + 1..])?;
            let mv = Move::drop(kind, target);
            if !self.is_legal_move(mv) {
                bail!("Illegal drop {san:?}");
            }
            return Ok(mv);
        }

        let mut source_file = None;
        let mut source_rank = None;
        let mut capture = false;

        if target.is_none() {
            if let Some(&c) = bytes.get(it).filter(|c| c.is_ascii_lowercase()) {
                let file = c - b'a';
                if (file as usize) < geo.width() {
                    source_file = Some(file);
                    it += 1;
                    if it == bytes.len() {
                        bail!("Invalid SAN {san:?}: Unexpected end after source file");
                    }
                }
            }

            let run = bytes[it..]
                .iter()
                .take(digits)
                .take_while(|b| b.is_ascii_digit())
                .count();
            if run > 0 {
                let rank = s[it..it + run].parse::<usize>()?;
                if rank == 0 || rank > geo.height() {
                    bail!("Invalid SAN {san:?}: Rank {rank} is off the board");
                }
                source_rank = Some((rank - 1) as u8);
                it += run;
            }

            if it == bytes.len() {
                // What looked like the source square was the target
                let (Some(file), Some(rank)) = (source_file.take(), source_rank.take()) else {
                    bail!("Invalid SAN {san:?}: No target square");
                };
                target = Some(Square::new(file, rank));
            } else if bytes[it] == b'x' {
                it += 1;
                if it == bytes.len() {
                    bail!("Invalid SAN {san:?}: Unexpected end after capture");
                }
                capture = true;
            }

            if target.is_none() {
                let (square, consumed) = Square::parse_prefix(&s[it..], digits)
                    .ok_or_else(|| anyhow!("Invalid SAN {san:?}: No target square"))?;
                if !geo.contains(square) {
                    bail!("Invalid SAN {san:?}: Square {square} is not on the board");
                }
                target = Some(square);
                it += consumed;
            }
        }

        let Some(target) = target.map(|square| geo.index(square)) else {
            bail!("Invalid SAN {san:?}: No target square");
        };

        if self.squares[target].is_color(side.opponent()) != capture {
            bail!("Invalid SAN {san:?}: Capture marker does not match the board");
        }

        let mut promotion = None;
        if it < bytes.len() {
            if matches!(bytes[it], b'=' | b'(') {
                it += 1;
            }
            let Some(&symbol) = bytes.get(it) else {
                bail!("Invalid SAN {san:?}: Missing promotion piece");
            };
            promotion = Some(PieceKind::from_uci(symbol as char)?);
        }

        let mut moves = MoveList::new();
        self.generate_moves(&mut moves, Some(kind));

        let mut found = None;
        for mv in moves {
            if mv.is_drop() || mv.target() != target || mv.promotion() != promotion {
                continue;
            }
            let Some(from) = geo.square(mv.source()) else {
                continue;
            };
            if source_file.is_some_and(|file| file != from.file())
                || source_rank.is_some_and(|rank| rank != from.rank())
            {
                continue;
            }
            // Castling is only written as O-O or O-O-O
            if self.squares[target] == Piece::new(side, PieceKind::Rook) {
                continue;
            }
            if !self.is_legal_trial(mv) {
                continue;
            }

            if found.is_some() {
                bail!("Ambiguous SAN {san:?}");
            }
            found = Some(mv);
        }

        found.ok_or_else(|| anyhow!("Illegal SAN {san:?}"))
    }

    /// Parses a legal move in either standard or long algebraic notation.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Position, Xiangqi};
    /// let mut pos = Position::<Xiangqi>::default();
    /// assert_eq!(pos.parse_move("Che3").unwrap(), pos.parse_move("h3e3").unwrap());
    /// assert!(pos.parse_move("h3h4").is_ok());
    /// assert!(pos.parse_move("e1e3").is_err());
    /// ```
    pub fn parse_move(&mut self, s: &str) -> Result<Move> {
        if let Ok(mv) = self.parse_san(s) {
            return Ok(mv);
        }

        let mv = self.parse_lan(s)?;
        if !self.is_legal_move(mv) {
            bail!("Illegal move {s:?}");
        }
        Ok(mv)
    }
}
