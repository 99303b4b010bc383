/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Color, Square, ZobristKey};

/// Number of wall columns on each side of the playable area.
const SIDE_WALLS: usize = 1;

/// Number of wall rows above and below the playable area.
///
/// Two rows are needed so that a two-rank leap from any playable square still lands inside the array.
const END_WALLS: usize = 2;

/// Precomputed offsets and coordinate conversions for a board of a given size.
///
/// The board is stored as a flat "mailbox" array with a border of wall squares around the playable area:
///
/// ```text
///     # # # # # # # # # # #      <- index 0 is a wall, and doubles as "no square"
///     # # # # # # # # # # #
///     # r n b a k a b n r #      <- rank 10 (Black's back rank)
///     # . . . . . . . . . #
///     ...
///     # R N B A K A B N R #      <- rank 1 (White's back rank)
///     # # # # # # # # # # #
///     # # # # # # # # # # #
/// ```
///
/// Moving "up" the board (towards Black) subtracts [`Geometry::arwidth`] from an index.
/// All offsets are relative to a square's index in this array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Geometry {
    width: usize,
    height: usize,
    arwidth: usize,

    /// One step up, left, right, and down.
    orthogonal: [isize; 4],

    /// One step along each diagonal.
    diagonal: [isize; 4],

    /// The knight's "legs": one orthogonal step in each direction.
    knight_obstacles: [isize; 4],

    /// Knight destinations. Obstacle `i` gates destinations `2i` and `2i + 1`.
    knight_offsets: [isize; 8],

    /// The bishop's "eyes": one diagonal step in each direction.
    bishop_obstacles: [isize; 4],

    /// Bishop destinations. Obstacle `i` gates destination `i`.
    bishop_offsets: [isize; 4],

    /// Straight up and straight down, for the flying general rule.
    vertical: [isize; 2],
}

impl Geometry {
    /// Builds the offset tables for a board of `width` files and `height` ranks.
    ///
    /// # Panics
    /// If the board is too small to hold palaces, if it has more files than there are letters,
    /// or if its mailbox array exceeds [`ZobristKey::MAX_SQUARES`].
    pub const fn new(width: usize, height: usize) -> Self {
        assert!(width >= 3 && height >= 6, "Board is too small");
        assert!(width <= Square::MAX_FILES, "Board has too many files");

        let arwidth = width + 2 * SIDE_WALLS;
        assert!(
            arwidth * (height + 2 * END_WALLS) <= ZobristKey::MAX_SQUARES,
            "Board is too large"
        );

        let w = arwidth as isize;

        Self {
            width,
            height,
            arwidth,
            orthogonal: [-w, -1, 1, w],
            diagonal: [-w - 1, -w + 1, w - 1, w + 1],
            knight_obstacles: [-w, -1, 1, w],
            knight_offsets: [
                -2 * w - 1,
                -2 * w + 1,
                -w - 2,
                w - 2,
                -w + 2,
                w + 2,
                2 * w - 1,
                2 * w + 1,
            ],
            bishop_obstacles: [-w - 1, -w + 1, w - 1, w + 1],
            bishop_offsets: [-2 * w - 2, -2 * w + 2, 2 * w - 2, 2 * w + 2],
            vertical: [-w, w],
        }
    }

    /// Number of files on the board.
    #[inline(always)]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of ranks on the board.
    #[inline(always)]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Width of a row of the mailbox array, walls included.
    #[inline(always)]
    pub const fn arwidth(&self) -> usize {
        self.arwidth
    }

    /// Total number of cells in the mailbox array, walls included.
    #[inline(always)]
    pub const fn array_size(&self) -> usize {
        self.arwidth * (self.height + 2 * END_WALLS)
    }

    /// Whether square strings on this board can need more than one rank digit.
    #[inline(always)]
    pub const fn multi_digit(&self) -> bool {
        self.height > 9
    }

    /// Returns `true` if `square` lies on the playable area of this board.
    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        (square.file() as usize) < self.width && (square.rank() as usize) < self.height
    }

    /// Converts `square` into its index in the mailbox array.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Geometry, Square};
    /// let geo = Geometry::new(9, 10);
    /// let a10 = Square::new(0, 9);
    /// assert_eq!(geo.index(a10), 2 * 11 + 1);
    /// assert_eq!(geo.square(geo.index(a10)), Some(a10));
    /// ```
    #[inline(always)]
    pub const fn index(&self, square: Square) -> usize {
        let row = self.height - 1 - square.rank() as usize + END_WALLS;
        row * self.arwidth + SIDE_WALLS + square.file() as usize
    }

    /// Converts a mailbox index back into a [`Square`], or `None` if it is a wall.
    ///
    /// # Example
    /// ```
    /// # use eastern::Geometry;
    /// let geo = Geometry::new(9, 10);
    /// assert_eq!(geo.square(0), None);
    /// assert_eq!(geo.square(geo.array_size() - 1), None);
    /// ```
    #[inline(always)]
    pub const fn square(&self, index: usize) -> Option<Square> {
        let row = index / self.arwidth;
        let col = index % self.arwidth;

        if col < SIDE_WALLS
            || col >= self.width + SIDE_WALLS
            || row < END_WALLS
            || row >= self.height + END_WALLS
        {
            return None;
        }

        let file = col - SIDE_WALLS;
        let rank = self.height - 1 - (row - END_WALLS);
        Some(Square::new(file as u8, rank as u8))
    }

    /// Returns `true` if `index` is on the playable area.
    #[inline(always)]
    pub const fn is_valid(&self, index: usize) -> bool {
        self.square(index).is_some()
    }

    /// Iterates over the indices of every playable square, from the top-left to the bottom-right.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.array_size()).filter(move |index| self.is_valid(*index))
    }

    /// Returns `true` if `index` is inside one of the two palaces ("forts").
    ///
    /// The palaces span the middle three files and the three ranks nearest each side's edge.
    #[inline(always)]
    pub const fn in_fort(&self, index: usize) -> bool {
        let Some(square) = self.square(index) else {
            return false;
        };

        let file = square.file() as usize;
        let rank = square.rank() as usize;
        let middle = self.width / 2;

        file + 1 >= middle && file <= middle + 1 && (rank < 3 || rank >= self.height - 3)
    }

    /// Returns `true` if `rank` is on `color`'s side of the river.
    #[inline(always)]
    pub const fn is_own_half(&self, color: Color, rank: usize) -> bool {
        match color {
            Color::White => rank < self.height / 2,
            Color::Black => rank >= self.height / 2,
        }
    }

    /// Index of `color`'s back-rank square on `file`.
    #[inline(always)]
    pub const fn back_rank(&self, color: Color, file: usize) -> usize {
        let rank = match color {
            Color::White => 0,
            Color::Black => self.height - 1,
        };
        self.index(Square::new(file as u8, rank as u8))
    }

    /// One pawn step forward for `color`.
    #[inline(always)]
    pub const fn forward(&self, color: Color) -> isize {
        -color.sign() * self.arwidth as isize
    }

    /// One step left and one step right.
    #[inline(always)]
    pub const fn lateral(&self) -> [isize; 2] {
        [-1, 1]
    }

    #[inline(always)]
    pub const fn orthogonal(&self) -> &[isize; 4] {
        &self.orthogonal
    }

    #[inline(always)]
    pub const fn diagonal(&self) -> &[isize; 4] {
        &self.diagonal
    }

    #[inline(always)]
    pub const fn knight_obstacles(&self) -> &[isize; 4] {
        &self.knight_obstacles
    }

    #[inline(always)]
    pub const fn knight_offsets(&self) -> &[isize; 8] {
        &self.knight_offsets
    }

    #[inline(always)]
    pub const fn bishop_obstacles(&self) -> &[isize; 4] {
        &self.bishop_obstacles
    }

    #[inline(always)]
    pub const fn bishop_offsets(&self) -> &[isize; 4] {
        &self.bishop_offsets
    }

    #[inline(always)]
    pub const fn vertical(&self) -> &[isize; 2] {
        &self.vertical
    }
}

/// Applies a signed `offset` to a mailbox `index`.
///
/// Offsets from playable squares never leave the array, thanks to the wall border.
#[inline(always)]
pub(crate) const fn step(index: usize, offset: isize) -> usize {
    index.wrapping_add_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        let geo = Geometry::new(9, 10);
        let mut count = 0;
        for index in 0..geo.array_size() {
            if let Some(square) = geo.square(index) {
                assert_eq!(geo.index(square), index);
                count += 1;
            }
        }
        assert_eq!(count, 90);
        assert_eq!(geo.indices().count(), 90);
    }

    #[test]
    fn test_leaps_stay_in_bounds() {
        let geo = Geometry::new(9, 10);
        for index in geo.indices() {
            for offset in geo.knight_offsets() {
                let target = step(index, *offset);
                assert!(target < geo.array_size(), "{index} + {offset} left the array");
            }

            // Bishop leaps are only taken through an eye that is on the board
            for (eye, offset) in geo.bishop_obstacles().iter().zip(geo.bishop_offsets()) {
                if geo.is_valid(step(index, *eye)) {
                    let target = step(index, *offset);
                    assert!(target < geo.array_size(), "{index} + {offset} left the array");
                }
            }
        }
    }

    #[test]
    fn test_forts() {
        let geo = Geometry::new(9, 10);
        let forts = geo.indices().filter(|i| geo.in_fort(*i)).count();
        assert_eq!(forts, 18);

        assert!(geo.in_fort(geo.index(Square::new(3, 0))));
        assert!(geo.in_fort(geo.index(Square::new(5, 2))));
        assert!(geo.in_fort(geo.index(Square::new(4, 7))));
        assert!(!geo.in_fort(geo.index(Square::new(2, 0))));
        assert!(!geo.in_fort(geo.index(Square::new(4, 3))));
        assert!(!geo.in_fort(geo.index(Square::new(4, 6))));
        assert!(!geo.in_fort(0));
    }

    #[test]
    fn test_river() {
        let geo = Geometry::new(9, 10);
        assert!(geo.is_own_half(Color::White, 4));
        assert!(!geo.is_own_half(Color::White, 5));
        assert!(geo.is_own_half(Color::Black, 5));
        assert!(!geo.is_own_half(Color::Black, 4));
    }

    #[test]
    fn test_forward_direction() {
        let geo = Geometry::new(9, 10);
        let e4 = geo.index(Square::new(4, 3));
        assert_eq!(geo.square(step(e4, geo.forward(Color::White))), Some(Square::new(4, 4)));
        assert_eq!(geo.square(step(e4, geo.forward(Color::Black))), Some(Square::new(4, 2)));
    }
}
