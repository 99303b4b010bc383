/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, Piece};

/// Stores Zobrist hash keys, for hashing positions.
///
/// Built at compile time from a fixed seed, so keys remain constant between compilations.
static ZOBRIST_TABLE: ZobristHashTable = ZobristHashTable::new();

/// Represents a key generated from a Zobrist Hash.
///
/// Keys are indexed by mailbox array index rather than by [`crate::Square`], so a single table serves every board size
/// up to [`ZobristKey::MAX_SQUARES`] cells.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Largest mailbox array (walls included) that has hash keys.
    pub const MAX_SQUARES: usize = 256;

    /// Return the inner `u64` of this key.
    ///
    /// # Example
    /// ```
    /// # use eastern::ZobristKey;
    /// assert_eq!(ZobristKey::default().inner(), 0);
    /// ```
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds/removes `hash_key` to this [`ZobristKey`].
    ///
    /// This is done internally with the XOR operator, so hashing the same value twice is a no-op.
    ///
    /// # Example
    /// ```
    /// # use eastern::ZobristKey;
    /// let mut key = ZobristKey::default();
    /// key.hash(42);
    /// assert_ne!(key.inner(), 0);
    /// key.hash(42);
    /// assert_eq!(key.inner(), 0);
    /// ```
    #[inline(always)]
    pub fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes the hash for `piece` at mailbox `index`.
    ///
    /// Empty and wall cells have no hash.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Piece, ZobristKey};
    /// let mut key = ZobristKey::default();
    /// key.hash_piece(40, Piece::EMPTY);
    /// assert_eq!(key, ZobristKey::default());
    ///
    /// key.hash_piece(40, Piece::BLACK_CANNON);
    /// let mut other = ZobristKey::default();
    /// other.hash_piece(41, Piece::BLACK_CANNON);
    /// assert_ne!(key, other);
    /// ```
    #[inline(always)]
    pub fn hash_piece(&mut self, index: usize, piece: Piece) {
        if piece.is_piece() {
            self.hash(ZOBRIST_TABLE.piece_keys[index][piece.index()]);
        }
    }

    /// Adds/removes the hash for `color` holding a castling right with the rook on `index`.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Color, ZobristKey};
    /// let mut white = ZobristKey::default();
    /// white.hash_castling(Color::White, 100);
    /// let mut black = ZobristKey::default();
    /// black.hash_castling(Color::Black, 100);
    /// assert_ne!(white, black);
    /// ```
    #[inline(always)]
    pub fn hash_castling(&mut self, color: Color, index: usize) {
        self.hash(ZOBRIST_TABLE.castling_keys[color][index]);
    }

    /// Adds/removes the hash for the side-to-move.
    ///
    /// Only Black affects the key, as White's key is 0.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        self.hash(ZOBRIST_TABLE.color_key[color]);
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Encapsulates the logic of Zobrist hashing.
struct ZobristHashTable {
    /// One unique key for every possible piece on every possible mailbox cell.
    piece_keys: [[u64; Piece::COUNT]; ZobristKey::MAX_SQUARES],

    /// One key per side for every cell a castling rook can start on.
    castling_keys: [[u64; ZobristKey::MAX_SQUARES]; Color::COUNT],

    /// One key for the side-to-move (only Black has one).
    color_key: [u64; Color::COUNT],
}

impl ZobristHashTable {
    /// Initialize this table, generating keys via [`XoShiRo`].
    const fn new() -> Self {
        let mut piece_keys = [[0; Piece::COUNT]; ZobristKey::MAX_SQUARES];
        let mut castling_keys = [[0; ZobristKey::MAX_SQUARES]; Color::COUNT];
        let mut color_key = [0; Color::COUNT];

        let mut prng = XoShiRo::new();

        let mut i = 0;
        while i < ZobristKey::MAX_SQUARES {
            let mut j = 0;
            while j < Piece::COUNT {
                let key;
                (key, prng) = prng.next_const();
                piece_keys[i][j] = key;
                j += 1;
            }

            let mut c = 0;
            while c < Color::COUNT {
                let key;
                (key, prng) = prng.next_const();
                castling_keys[c][i] = key;
                c += 1;
            }

            i += 1;
        }

        let (key, _) = prng.next_const();
        color_key[Color::Black.index()] = key;

        Self {
            piece_keys,
            castling_keys,
            color_key,
        }
    }
}

/// Seeds for the key generator.
const SEEDS: [u64; 4] = [
    0x9E37_79B9_7F4A_7C15,
    0xD1B5_4A32_D192_ED03,
    0x2545_F491_4F6C_DD1D,
    0x5851_F42D_4C95_7F2D,
];

/// A `const` pseudo-random number generator using the xoshiro256** algorithm.
///
/// See <https://prng.di.unimi.it/xoshiro256starstar.c>
struct XoShiRo([u64; 4]);

impl XoShiRo {
    #[inline(always)]
    const fn new() -> Self {
        Self(SEEDS)
    }

    /// Returns the next number in the sequence, along with the advanced generator.
    const fn next_const(self) -> (u64, Self) {
        let mut s = self.0;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        (result, Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let mut keys = Vec::new();
        for index in [0, 23, 57, 119, 255] {
            keys.extend_from_slice(&ZOBRIST_TABLE.piece_keys[index]);
            keys.push(ZOBRIST_TABLE.castling_keys[0][index]);
            keys.push(ZOBRIST_TABLE.castling_keys[1][index]);
        }
        keys.push(ZOBRIST_TABLE.color_key[1]);

        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count);
        assert!(keys.iter().all(|k| *k != 0));
    }

    #[test]
    fn test_white_has_no_side_key() {
        let mut key = ZobristKey::default();
        key.hash_side_to_move(Color::White);
        assert_eq!(key.inner(), 0);
        key.hash_side_to_move(Color::Black);
        assert_ne!(key.inner(), 0);
    }
}
