/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, hash::Hash};

use crate::{CastlingSide, Geometry, Movement, PieceKind};

/// FEN string for the starting position of Xiangqi.
pub const FEN_STARTPOS: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// Rules of an eastern chess variant.
///
/// Every rule that differs between variants is configured here, at compile time.
/// A [`crate::Position`] is generic over its variant, so a position for one variant cannot be
/// confused with a position for another.
pub trait Variant
where
    Self: Copy + Default + fmt::Debug + PartialEq + Eq + Hash + Send + Sync + 'static,
{
    /// Number of files on the board.
    const WIDTH: usize = 9;

    /// Number of ranks on the board.
    const HEIGHT: usize = 10;

    /// Offset tables for this variant's board.
    const GEOMETRY: Geometry = Geometry::new(Self::WIDTH, Self::HEIGHT);

    /// Whether castling exists in this variant.
    const HAS_CASTLING: bool = false;

    /// Whether a King may capture (and therefore attack) an adjacent opposing King.
    const KING_CAN_CAPTURE: bool = true;

    /// Whether this variant uses randomized starting positions.
    ///
    /// Castling moves in such variants are written as "King takes own Rook" in long algebraic notation,
    /// and castling rights are always written with file letters.
    const IS_RANDOM: bool = false;

    /// Human-readable name of this variant.
    fn name() -> &'static str;

    /// Fetch the FEN string of the starting position of this variant.
    fn fen_startpos() -> &'static str;

    /// Movement rules of a piece kind in this variant.
    #[inline(always)]
    fn movement(kind: PieceKind) -> Movement {
        kind.movement()
    }

    /// Checks the number of Kings each side has when loading a position.
    #[inline(always)]
    fn kings_count_assertion(white_kings: usize, black_kings: usize) -> bool {
        white_kings == 1 && black_kings == 1
    }

    /// The file a King lands on when castling to `side`.
    #[inline(always)]
    fn castling_file(side: CastlingSide) -> usize {
        match side {
            CastlingSide::QueenSide => 2,
            CastlingSide::KingSide => Self::WIDTH - 2,
        }
    }
}

/// Standard Xiangqi (Chinese chess).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xiangqi;

impl Variant for Xiangqi {
    #[inline(always)]
    fn name() -> &'static str {
        "Xiangqi"
    }

    #[inline(always)]
    fn fen_startpos() -> &'static str {
        FEN_STARTPOS
    }
}
