/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::PieceKind;

/// Maximum number of pseudo-legal moves a [`MoveList`] can hold.
///
/// A Xiangqi position has well under 150 pseudo-legal moves; the extra room is for variants with compound pieces.
pub const MAX_NUM_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Represents a move made on the board.
///
/// Squares are mailbox array indices (see [`crate::Geometry`]), so a [`Move`] is only meaningful
/// alongside the position it was generated for.
///
/// Internally encoded using the following bit pattern:
/// ```text
///     0000 0000 0000 0000 0000 0000 0000 0000
///               |  | |         | |         |
///               |  | |         | +---------+-- Source square (index 0 for drops).
///               |  | +---------+-- Target square.
///               +--+-- Promotion (or dropped) PieceKind, plus one. 0 for none.
/// ```
///
/// Special encodings:
/// - A *drop* has source `0`, and its promotion field holds the kind of piece being dropped.
/// - *Castling* is encoded as the King capturing its own Rook: the target is the castling Rook's square.
/// - A move with `source == target` changes nothing on the board besides the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Move(u32);

impl Move {
    /// Mask for the source ("from") bits.
    const SRC_MASK: u32 = 0x0000_00FF;
    /// Mask for the target ("to") bits.
    const DST_MASK: u32 = 0x0000_FF00;
    /// Mask for the promotion bits.
    const PRM_MASK: u32 = 0x000F_0000;
    /// Start index of target bits.
    const DST_BITS: u32 = 8;
    /// Start index of promotion bits.
    const PRM_BITS: u32 = 16;

    /// Creates a new [`Move`] from `source` to `target`.
    ///
    /// # Example
    /// ```
    /// # use eastern::Move;
    /// let mv = Move::new(47, 36);
    /// assert_eq!(mv.source(), 47);
    /// assert_eq!(mv.target(), 36);
    /// assert_eq!(mv.promotion(), None);
    /// ```
    #[inline(always)]
    pub const fn new(source: usize, target: usize) -> Self {
        debug_assert!(source <= 0xFF && target <= 0xFF, "Square index out of range");
        debug_assert!(target != 0, "Moves must have a target square");
        Self((source as u32) | ((target as u32) << Self::DST_BITS))
    }

    /// Creates a new [`Move`] from `source` to `target` that promotes the moving piece to `promotion`.
    #[inline(always)]
    pub const fn with_promotion(source: usize, target: usize, promotion: PieceKind) -> Self {
        let mv = Self::new(source, target);
        Self(mv.0 | ((promotion.bits() as u32 + 1) << Self::PRM_BITS))
    }

    /// Creates a new [`Move`] that drops a piece of `kind` onto `target`.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Move, PieceKind};
    /// let drop = Move::drop(PieceKind::Rook, 36);
    /// assert!(drop.is_drop());
    /// assert_eq!(drop.source(), 0);
    /// assert_eq!(drop.promotion(), Some(PieceKind::Rook));
    /// ```
    #[inline(always)]
    pub const fn drop(kind: PieceKind, target: usize) -> Self {
        Self::with_promotion(0, target, kind)
    }

    /// Fetches the source (or "from") square of this [`Move`].
    #[inline(always)]
    pub const fn source(&self) -> usize {
        (self.0 & Self::SRC_MASK) as usize
    }

    /// Fetches the target (or "to") square of this [`Move`].
    #[inline(always)]
    pub const fn target(&self) -> usize {
        ((self.0 & Self::DST_MASK) >> Self::DST_BITS) as usize
    }

    /// Fetches the promotion (or dropped) kind of this [`Move`], if any.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        let bits = ((self.0 & Self::PRM_MASK) >> Self::PRM_BITS) as u8;
        if bits == 0 {
            None
        } else {
            Some(PieceKind::from_bits_unchecked(bits - 1))
        }
    }

    /// Returns `true` if this [`Move`] places a piece from off the board.
    #[inline(always)]
    pub const fn is_drop(&self) -> bool {
        self.source() == 0
    }

    /// Returns `true` if this [`Move`] has no target, which no real move lacks.
    ///
    /// # Example
    /// ```
    /// # use eastern::Move;
    /// assert!(Move::default().is_null());
    /// assert!(!Move::new(1, 2).is_null());
    /// ```
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.target() == 0
    }
}

impl fmt::Debug for Move {
    /// Displays the raw array indices of this [`Move`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source(), self.target())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "={}", promotion.to_uci())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_fields() {
        for kind in PieceKind::all() {
            let mv = Move::with_promotion(200, 13, kind);
            assert_eq!(mv.source(), 200);
            assert_eq!(mv.target(), 13);
            assert_eq!(mv.promotion(), Some(kind));
            assert!(!mv.is_drop());
        }

        let mv = Move::new(255, 254);
        assert_eq!(mv.source(), 255);
        assert_eq!(mv.target(), 254);
        assert_eq!(mv.promotion(), None);
    }

    #[test]
    fn test_promotions_distinguish_moves() {
        let plain = Move::new(40, 29);
        let promoted = Move::with_promotion(40, 29, PieceKind::Rook);
        assert_ne!(plain, promoted);
        assert_eq!(format!("{promoted:?}"), "40->29=r");
    }
}
