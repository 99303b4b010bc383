/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Check and attack detection, and position legality.
mod attacks;

/// Castling rights, their FEN form, and castling move generation.
mod castling;

/// Board dimensions, wall border, and the offset tables pieces move by.
mod geometry;

/// Pseudo-legal and legal move generation.
mod movegen;

/// The move encoding.
mod moves;

/// Standard and long algebraic move notation.
mod notation;

/// Performance testing of move generation.
mod perft;

/// Colors, piece kinds, and board cells.
mod piece;

/// The game state, FEN parsing, and making and taking back moves.
mod position;

/// Detecting the end of the game.
mod result;

/// Board coordinates.
mod square;

/// Rule sets.
mod variant;

/// Zobrist hashing of positions.
mod zobrist;

pub use castling::*;
pub use geometry::Geometry;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use result::*;
pub use square::*;
pub use variant::*;
pub use zobrist::*;
