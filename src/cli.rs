/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;

/// A command to be sent to the session.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<COMMAND> [ARGS]")
)]
pub enum SessionCommand {
    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Quit the session.
    #[command(alias = "quit")]
    Exit,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Apply the provided moves to the current position, in order.
    ///
    /// Moves may be given in SAN or LAN. Illegal moves are rejected, and no moves after them are applied.
    #[command(alias = "mv")]
    Move {
        #[arg(required = true)]
        moves: Vec<String>,
    },

    /// Shows all legal moves in the current position.
    Moves {
        /// If set, moves will be printed in SAN instead of LAN.
        #[arg(long, default_value = "false")]
        san: bool,

        /// If set, moves will be sorted in alphabetical order.
        ///
        /// By default, moves are printed in generation order.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Set up a new position.
    ///
    /// Usage: `position startpos [moves ...]` or `position fen <FEN> [moves ...]`.
    /// A bare FEN without the `fen` keyword is also accepted.
    Position {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },

    /// Print whether the game has ended, and how.
    Result,

    /// Performs a split perft on the current position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Take back the last move.
    #[command(alias = "takeback")]
    Undo,
}

impl FromStr for SessionCommand {
    type Err = clap::Error;

    /// Attempt to parse a [`SessionCommand`] from a single line of input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}

/// The pieces of a `position` command: an optional FEN (`None` for the start position) and the moves to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionArgs {
    pub fen: Option<String>,
    pub moves: Vec<String>,
}

impl PositionArgs {
    /// Splits the arguments of a `position` command at the `moves` keyword.
    pub fn new(args: &[String]) -> Self {
        let split = args
            .iter()
            .position(|arg| arg == "moves")
            .unwrap_or(args.len());
        let (setup, moves) = args.split_at(split);

        let setup = match setup.first().map(String::as_str) {
            Some("startpos") => &[][..],
            Some("fen") => &setup[1..],
            _ => setup,
        };

        let fen = (!setup.is_empty()).then(|| setup.join(" "));
        let moves = moves.iter().skip(1).cloned().collect();

        Self { fen, moves }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(s: &str) -> Vec<String> {
        s.split_ascii_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("d".parse::<SessionCommand>().unwrap(), SessionCommand::Display);
        assert_eq!("quit".parse::<SessionCommand>().unwrap(), SessionCommand::Exit);
        assert_eq!(
            "perft 3".parse::<SessionCommand>().unwrap(),
            SessionCommand::Perft { depth: 3 }
        );
        assert_eq!(
            "moves --san -s".parse::<SessionCommand>().unwrap(),
            SessionCommand::Moves {
                san: true,
                sort: true
            }
        );
        assert_eq!(
            "move Che3 h10g8".parse::<SessionCommand>().unwrap(),
            SessionCommand::Move {
                moves: strings("Che3 h10g8")
            }
        );

        assert!("move".parse::<SessionCommand>().is_err());
        assert!("perft deep".parse::<SessionCommand>().is_err());
        assert!("frobnicate".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn test_position_args() {
        let cmd = "position fen 3k5/9/9/9/9/9/9/9/9/4K4 w - - 0 1 moves Kd1"
            .parse::<SessionCommand>()
            .unwrap();
        let SessionCommand::Position { args } = cmd else {
            panic!("expected a position command");
        };

        let args = PositionArgs::new(&args);
        assert_eq!(args.fen.as_deref(), Some("3k5/9/9/9/9/9/9/9/9/4K4 w - - 0 1"));
        assert_eq!(args.moves, strings("Kd1"));

        let args = PositionArgs::new(&strings("startpos moves h1g3 h10g8"));
        assert_eq!(args.fen, None);
        assert_eq!(args.moves, strings("h1g3 h10g8"));

        let args = PositionArgs::new(&strings("startpos"));
        assert_eq!(args.fen, None);
        assert!(args.moves.is_empty());

        let args = PositionArgs::new(&strings("3k5/9/9/9/9/9/9/9/9/4K4 b 0 1"));
        assert_eq!(args.fen.as_deref(), Some("3k5/9/9/9/9/9/9/9/9/4K4 b 0 1"));
    }
}
