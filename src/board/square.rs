/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};

/// Represents a single square on the board, as a `(file, rank)` coordinate.
///
/// Files are lettered from `a` and ranks are numbered from `1`, with rank 1 being White's back rank.
/// A [`Square`] carries no board dimensions, so whether it lies on a particular board is decided by
/// [`crate::Geometry::contains`]. Its position in the board's mailbox array is given by [`crate::Geometry::index`].
///
/// Ranks may be written with more than one digit (`a10`), since Xiangqi has ten ranks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Largest number of files a [`Square`] can name: one per lowercase letter.
    pub const MAX_FILES: usize = 26;

    /// Creates a new [`Square`] from a zero-based file and rank.
    ///
    /// # Example
    /// ```
    /// # use eastern::Square;
    /// let e10 = Square::new(4, 9);
    /// assert_eq!(e10.to_uci(), "e10");
    /// ```
    #[inline(always)]
    pub const fn new(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    /// Zero-based file of this [`Square`].
    #[inline(always)]
    pub const fn file(&self) -> u8 {
        self.file
    }

    /// Zero-based rank of this [`Square`].
    #[inline(always)]
    pub const fn rank(&self) -> u8 {
        self.rank
    }

    /// The letter of this [`Square`]'s file.
    #[inline(always)]
    pub const fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    /// Which of the two checkerboard colors this [`Square`] has, as `0` or `1`.
    ///
    /// # Example
    /// ```
    /// # use eastern::Square;
    /// assert_eq!(Square::new(2, 0).color_class(), Square::new(4, 2).color_class());
    /// assert_ne!(Square::new(2, 0).color_class(), Square::new(2, 9).color_class());
    /// ```
    #[inline(always)]
    pub const fn color_class(&self) -> usize {
        ((self.file + self.rank) % 2) as usize
    }

    /// Creates a [`Square`] from a string like `e4` or `b10`.
    ///
    /// # Example
    /// ```
    /// # use eastern::Square;
    /// assert_eq!(Square::from_uci("i10").unwrap(), Square::new(8, 9));
    /// assert!(Square::from_uci("e0").is_err());
    /// assert!(Square::from_uci("e4x").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let (parsed, consumed) = Self::parse_prefix(square, usize::MAX)
            .ok_or_else(|| anyhow!("Invalid Square string: Expected a file letter and a rank number. Got {square:?}"))?;

        if consumed != square.len() {
            bail!("Invalid Square string: Unexpected trailing characters in {square:?}");
        }

        Ok(parsed)
    }

    /// Parses a [`Square`] from the start of `s`, returning it and the number of bytes consumed.
    ///
    /// At most `max_digits` rank digits are read. Returns `None` if `s` does not start with a square.
    ///
    /// # Example
    /// ```
    /// # use eastern::Square;
    /// assert_eq!(Square::parse_prefix("a10b9", 2), Some((Square::new(0, 9), 3)));
    /// assert_eq!(Square::parse_prefix("a10b9", 1), Some((Square::new(0, 0), 2)));
    /// assert_eq!(Square::parse_prefix("x", 2), None);
    /// ```
    pub fn parse_prefix(s: &str, max_digits: usize) -> Option<(Self, usize)> {
        let bytes = s.as_bytes();
        let file = *bytes.first()?;
        if !file.is_ascii_lowercase() {
            return None;
        }

        let digits = bytes[1..]
            .iter()
            .take(max_digits)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }

        let rank = s[1..1 + digits].parse::<usize>().ok()?;
        if rank == 0 || rank > u8::MAX as usize {
            return None;
        }

        Some((Self::new(file - b'a', (rank - 1) as u8), 1 + digits))
    }

    /// Converts this [`Square`] to a string like `e4` or `b10`.
    #[inline(always)]
    pub fn to_uci(self) -> String {
        format!("{}{}", self.file_char(), self.rank as usize + 1)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    /// Wrapper for [`Square::from_uci`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_uci())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.to_uci(), self.file, self.rank)
    }
}
