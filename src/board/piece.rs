/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{BitOr, Index, IndexMut},
    str::FromStr,
};

use anyhow::{bail, Result};

/// Represents the side of a player or piece.
///
/// Red moves first in Xiangqi. Following the usual position-string convention, the side that moves first
/// is called White and is written as `w`, and [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// An array of both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Creates a new [`Color`] from a `bool`, where `false = White`.
    ///
    /// # Example
    /// ```
    /// # use eastern::Color;
    /// assert_eq!(Color::from_bool(false), Color::White);
    /// assert_eq!(Color::from_bool(true), Color::Black);
    /// ```
    #[inline(always)]
    pub const fn from_bool(color: bool) -> Self {
        if color {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Returns `true` if this [`Color`] is Black.
    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// Returns the direction this side's pawns advance in, as a sign.
    ///
    /// White sits at the bottom of the board and moves "up" (towards lower array indices).
    ///
    /// # Example
    /// ```
    /// # use eastern::Color;
    /// assert_eq!(Color::White.sign(), 1);
    /// assert_eq!(Color::Black.sign(), -1);
    /// ```
    #[inline(always)]
    pub const fn sign(&self) -> isize {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Returns this [`Color`]'s opponent.
    ///
    /// # Example
    /// ```
    /// # use eastern::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns this [`Color`] as a `usize`, for indexing into lists.
    ///
    /// Will be `0` for White, `1` for Black.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns this [`Color`] as a `u8`.
    #[inline(always)]
    pub const fn bits(&self) -> u8 {
        *self as u8
    }

    /// Creates a [`Color`] from the side-to-move field of a position string.
    ///
    /// # Example
    /// ```
    /// # use eastern::Color;
    /// assert_eq!(Color::from_uci('b').unwrap(), Color::Black);
    /// assert!(Color::from_uci('B').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(color: char) -> Result<Self> {
        match color {
            'w' => Ok(Self::White),
            'b' => Ok(Self::Black),
            _ => bail!("Color must be either 'w' or 'b'. Found {color:?}"),
        }
    }

    /// Creates a [`Color`] from the ASCII case of a piece symbol: uppercase is White, lowercase is Black.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        if c.is_ascii_lowercase() {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Converts this [`Color`] to its position-string character.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Alias for [`Color::to_uci`], as a `str`.
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::White => "w",
            Self::Black => "b",
        }
    }

    /// Fetches a human-readable name for this [`Color`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

/// A set of movement rules that a piece kind follows.
///
/// Most pieces have exactly one rule, but a variant may give a piece several
/// (a Rook + Knight compound, for instance), in which case move generation and
/// attack detection run every rule the piece has.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct Movement(u8);

impl Movement {
    pub const NONE: Self = Self(0);
    pub const KING: Self = Self(1 << 0);
    pub const ADVISOR: Self = Self(1 << 1);
    pub const BISHOP: Self = Self(1 << 2);
    pub const KNIGHT: Self = Self(1 << 3);
    pub const ROOK: Self = Self(1 << 4);
    pub const CANNON: Self = Self(1 << 5);
    pub const PAWN: Self = Self(1 << 6);

    /// Returns `true` if every rule in `other` is also in `self`.
    ///
    /// # Example
    /// ```
    /// # use eastern::Movement;
    /// let chancellor = Movement::ROOK | Movement::KNIGHT;
    /// assert!(chancellor.contains(Movement::KNIGHT));
    /// assert!(!chancellor.contains(Movement::CANNON));
    /// ```
    #[inline(always)]
    pub const fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Returns the union of two movement sets.
    #[inline(always)]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for Movement {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.with(rhs)
    }
}

/// Represents the kind (or "role") of a piece.
///
/// These have no [`Color`] associated with them. See [`Piece`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    King,
    Advisor,
    Bishop,
    Knight,
    Rook,
    Cannon,
    Pawn,
}

impl PieceKind {
    /// Number of piece variants.
    pub const COUNT: usize = 7;

    /// An array of all 7 [`PieceKind`]s.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        use PieceKind::*;
        [King, Advisor, Bishop, Knight, Rook, Cannon, Pawn]
    }

    /// Creates a new [`PieceKind`] from a set of bits, ignoring safety checks.
    ///
    /// # Panics
    /// If `bits` is greater than `6` when debug assertions are enabled.
    #[inline(always)]
    pub const fn from_bits_unchecked(bits: u8) -> Self {
        debug_assert!(
            bits <= 6,
            "Invalid bits for PieceKind: Bits must be between [0,6]"
        );

        // Safety: Since `PieceKind` is a `repr(u8)` enum, we can cast safely here.
        unsafe { std::mem::transmute(bits) }
    }

    /// Fetches the internal bit value of this [`PieceKind`].
    #[inline(always)]
    pub const fn bits(&self) -> u8 {
        *self as u8
    }

    /// Returns this [`PieceKind`] as a `usize`, for indexing into lists.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The movement rules this kind of piece follows in standard Xiangqi.
    ///
    /// Variants may override this through [`crate::Variant::movement`].
    #[inline(always)]
    pub const fn movement(&self) -> Movement {
        match self {
            Self::King => Movement::KING,
            Self::Advisor => Movement::ADVISOR,
            Self::Bishop => Movement::BISHOP,
            Self::Knight => Movement::KNIGHT,
            Self::Rook => Movement::ROOK,
            Self::Cannon => Movement::CANNON,
            Self::Pawn => Movement::PAWN,
        }
    }

    /// Creates a new [`PieceKind`] from its symbol (case-insensitive).
    ///
    /// The elephant symbol `E` is accepted as an alias for the bishop.
    ///
    /// # Example
    /// ```
    /// # use eastern::PieceKind;
    /// assert_eq!(PieceKind::from_uci('C').unwrap(), PieceKind::Cannon);
    /// assert_eq!(PieceKind::from_uci('e').unwrap(), PieceKind::Bishop);
    /// assert!(PieceKind::from_uci('q').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind {
            'K' | 'k' => Ok(Self::King),
            'A' | 'a' => Ok(Self::Advisor),
            'B' | 'b' | 'E' | 'e' => Ok(Self::Bishop),
            'N' | 'n' => Ok(Self::Knight),
            'R' | 'r' => Ok(Self::Rook),
            'C' | 'c' => Ok(Self::Cannon),
            'P' | 'p' => Ok(Self::Pawn),
            _ => bail!("Invalid char for PieceKind: Got {kind:?}."),
        }
    }

    /// Fetches a human-readable name for this [`PieceKind`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::King => "king",
            Self::Advisor => "advisor",
            Self::Bishop => "bishop",
            Self::Knight => "knight",
            Self::Rook => "rook",
            Self::Cannon => "cannon",
            Self::Pawn => "pawn",
        }
    }

    /// Converts this [`PieceKind`] to its symbol. Always lowercase.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::King => 'k',
            Self::Advisor => 'a',
            Self::Bishop => 'b',
            Self::Knight => 'n',
            Self::Rook => 'r',
            Self::Cannon => 'c',
            Self::Pawn => 'p',
        }
    }

    /// Converts this [`PieceKind`] to its symbol as a `str`. Always lowercase.
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::King => "k",
            Self::Advisor => "a",
            Self::Bishop => "b",
            Self::Knight => "n",
            Self::Rook => "r",
            Self::Cannon => "c",
            Self::Pawn => "p",
        }
    }
}

/// The contents of a single cell of the board: a piece, an empty square, or a wall.
///
/// Internally, this is represented as a `u8` with the following bit pattern:
///
/// ```text
///     00 0 0 0 000
///      |  | | |  |
///      |  | | |  +- The PieceKind.
///      |  | | +- The Color. `0` for White, `1` for Black.
///      |  | +- Set for an empty square.
///      |  +- Set for a wall square.
///      +- Unused.
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece(u8);

impl Piece {
    /// An empty, passable square.
    pub const EMPTY: Self = Self(1 << 4);

    /// A sentinel square outside of the playable area.
    pub const WALL: Self = Self(1 << 5);

    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);
    pub const WHITE_ADVISOR: Self = Self::new(Color::White, PieceKind::Advisor);
    pub const WHITE_BISHOP: Self = Self::new(Color::White, PieceKind::Bishop);
    pub const WHITE_KNIGHT: Self = Self::new(Color::White, PieceKind::Knight);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const WHITE_CANNON: Self = Self::new(Color::White, PieceKind::Cannon);
    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);

    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);
    pub const BLACK_ADVISOR: Self = Self::new(Color::Black, PieceKind::Advisor);
    pub const BLACK_BISHOP: Self = Self::new(Color::Black, PieceKind::Bishop);
    pub const BLACK_KNIGHT: Self = Self::new(Color::Black, PieceKind::Knight);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const BLACK_CANNON: Self = Self::new(Color::Black, PieceKind::Cannon);
    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);

    /// Number of unique (colored) piece variants.
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    /// Mask for the kind bits.
    const KIND_MASK: u8 = 0b0000_0111;
    /// Start index of color bits.
    const COLOR_BITS: u8 = 3;

    /// Creates a new [`Piece`] from the given [`Color`] and [`PieceKind`].
    ///
    /// # Example
    /// ```
    /// # use eastern::{Piece, Color, PieceKind};
    /// let black_cannon = Piece::new(Color::Black, PieceKind::Cannon);
    /// assert_eq!(black_cannon.to_string(), "c");
    /// ```
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self(color.bits() << Self::COLOR_BITS | kind.bits())
    }

    /// Returns `true` if this cell holds an actual piece (not empty, not a wall).
    #[inline(always)]
    pub const fn is_piece(&self) -> bool {
        self.0 & (Self::EMPTY.0 | Self::WALL.0) == 0
    }

    /// Returns `true` if this cell is empty.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Returns `true` if this cell is a wall.
    #[inline(always)]
    pub const fn is_wall(&self) -> bool {
        self.0 == Self::WALL.0
    }

    /// Fetches the [`Color`] of this [`Piece`], if it is a piece.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Piece, Color};
    /// assert_eq!(Piece::BLACK_PAWN.color(), Some(Color::Black));
    /// assert_eq!(Piece::EMPTY.color(), None);
    /// assert_eq!(Piece::WALL.color(), None);
    /// ```
    #[inline(always)]
    pub const fn color(&self) -> Option<Color> {
        if self.is_piece() {
            Some(Color::from_bool(self.0 >> Self::COLOR_BITS != 0))
        } else {
            None
        }
    }

    /// Fetches the [`PieceKind`] of this [`Piece`], if it is a piece.
    #[inline(always)]
    pub const fn kind(&self) -> Option<PieceKind> {
        if self.is_piece() {
            Some(PieceKind::from_bits_unchecked(self.0 & Self::KIND_MASK))
        } else {
            None
        }
    }

    /// Returns `true` if this is a piece belonging to `color`.
    #[inline(always)]
    pub const fn is_color(&self, color: Color) -> bool {
        self.is_piece() && (self.0 >> Self::COLOR_BITS) == color.bits()
    }

    /// Returns `true` if this is a piece of the given `kind`, of either color.
    #[inline(always)]
    pub const fn is_kind(&self, kind: PieceKind) -> bool {
        self.is_piece() && (self.0 & Self::KIND_MASK) == kind.bits()
    }

    /// Returns the index value of this [`Piece`], in `[0, 14)`.
    ///
    /// Only meaningful for actual pieces.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        debug_assert!(self.is_piece(), "Only pieces have an index");
        ((self.0 >> Self::COLOR_BITS) as usize) * PieceKind::COUNT
            + (self.0 & Self::KIND_MASK) as usize
    }

    /// Creates a new [`Piece`] from its symbol. Uppercase is White, lowercase is Black.
    ///
    /// # Example
    /// ```
    /// # use eastern::{Piece, Color, PieceKind};
    /// let horse = Piece::from_uci('N').unwrap();
    /// assert_eq!(horse.color(), Some(Color::White));
    /// assert_eq!(horse.kind(), Some(PieceKind::Knight));
    /// ```
    #[inline(always)]
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        let color = Color::from_case(piece);
        Ok(Self::new(color, kind))
    }

    /// Converts this cell into a character.
    ///
    /// Pieces use their symbol (uppercase for White), empty squares are `.`, and walls are `#`.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match (self.color(), self.kind()) {
            (Some(Color::White), Some(kind)) => kind.to_uci().to_ascii_uppercase(),
            (Some(Color::Black), Some(kind)) => kind.to_uci(),
            _ if self.is_wall() => '#',
            _ => '.',
        }
    }

    /// Fetches a human-readable name for this cell.
    #[inline(always)]
    pub fn name(&self) -> String {
        match (self.color(), self.kind()) {
            (Some(color), Some(kind)) => format!("{} {}", color.name(), kind.name()),
            _ if self.is_wall() => String::from("wall"),
            _ => String::from("empty"),
        }
    }
}

impl Default for Piece {
    /// Cells default to [`Piece::EMPTY`].
    #[inline(always)]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_uci(c),
            _ => bail!("Invalid str for Piece: Must be a str of len 1. Got {s:?}"),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.name(), self.to_uci())
    }
}

macro_rules! impl_common_traits {
    ($type:ty) => {
        impl<T> Index<$type> for [T; <$type>::COUNT] {
            type Output = T;
            #[inline(always)]
            fn index(&self, index: $type) -> &Self::Output {
                &self[index.index()]
            }
        }

        impl<T> IndexMut<$type> for [T; <$type>::COUNT] {
            #[inline(always)]
            fn index_mut(&mut self, index: $type) -> &mut Self::Output {
                &mut self[index.index()]
            }
        }

        impl FromStr for $type {
            type Err = anyhow::Error;
            /// Does the same as [`Self::from_uci`], but only if `s` is one character in length.
            #[inline(always)]
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_uci(c),
                    _ => bail!("Invalid str: Must be a str of len 1. Got {s:?}"),
                }
            }
        }

        impl AsRef<str> for $type {
            #[inline(always)]
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_uci())
            }
        }

        impl fmt::Debug for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"{}\" ({})", self.name(), self.index())
            }
        }
    };
}

impl_common_traits!(PieceKind);
impl_common_traits!(Color);
