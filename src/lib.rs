/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move generation, notation, and game results.
mod board;

/// Commands accepted by the interactive session.
mod cli;

/// The interactive session and its input handling.
mod engine;

pub use board::*;
pub use cli::*;
pub use engine::*;
