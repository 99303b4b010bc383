/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{error::ErrorKind, Parser};
use tracing::{debug, error, warn};

use crate::{perft, splitperft, Position, PositionArgs, SessionCommand, Xiangqi};

/// An interactive session over a single Xiangqi game.
#[derive(Debug)]
pub struct Session {
    /// The current state of the board.
    ///
    /// This is modified whenever moves are played, taken back, or new positions are given.
    position: Position<Xiangqi>,

    /// One half of a channel, responsible for sending commands to the session to execute.
    sender: Sender<SessionCommand>,

    /// One half of a channel, responsible for receiving commands for the session to execute.
    receiver: Receiver<SessionCommand>,
}

impl Session {
    /// Constructs a new [`Session`] on the start position, to be executed with [`Session::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Position::default(),
            sender,
            receiver,
        }
    }

    /// Returns a string of the program's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// The position this session is currently on.
    pub fn position(&self) -> &Position<Xiangqi> {
        &self.position
    }

    /// Sends a [`SessionCommand`] to the session to be executed.
    pub fn send_command(&self, command: SessionCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to queue command for the session")
    }

    /// Execute the main event loop for the session.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    pub fn run(&mut self) -> Result<()> {
        debug!("starting {}", self.name());

        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                debug!("input handler thread stopping: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            if cmd == SessionCommand::Exit {
                break;
            }

            // Keep running, even on error
            if let Err(err) = self.execute(cmd) {
                eprintln!("Error: {err:#}");
            }
        }

        Ok(())
    }

    /// Handle the execution of a single [`SessionCommand`].
    pub fn execute(&mut self, cmd: SessionCommand) -> Result<()> {
        match cmd {
            SessionCommand::Display => println!("{}", self.position),

            SessionCommand::Exit => {}

            SessionCommand::Fen => println!("{}", self.position.to_fen()),

            SessionCommand::Move { moves } => self.make_moves(&moves)?,

            SessionCommand::Moves { san, sort } => self.moves(san, sort),

            SessionCommand::Perft { depth } => self.perft(depth, false),

            SessionCommand::Position { args } => self.set_position(PositionArgs::new(&args))?,

            SessionCommand::Result => match self.position.result() {
                Some(result) => println!("{} {{{result}}}", result.score()),
                None => println!("*"),
            },

            SessionCommand::Splitperft { depth } => self.perft(depth, true),

            SessionCommand::Undo => {
                if self.position.undo_move().is_none() {
                    bail!("No moves to take back");
                }
            }
        }

        Ok(())
    }

    /// Parses and applies each of `moves` in order, stopping at the first one that fails.
    fn make_moves<T: AsRef<str>>(&mut self, moves: &[T]) -> Result<()> {
        apply_moves(&mut self.position, moves)
    }

    /// Executes the `position` command.
    ///
    /// The current position is only replaced if the FEN and every move are valid.
    fn set_position(&mut self, args: PositionArgs) -> Result<()> {
        let mut position = match args.fen {
            Some(fen) => Position::from_fen(&fen)?,
            None => Position::default(),
        };

        apply_moves(&mut position, &args.moves)?;
        self.position = position;

        Ok(())
    }

    /// Executes the `moves` command, printing every legal move on one line.
    fn moves(&mut self, san: bool, sort: bool) {
        let moves = self.position.legal_moves();

        let mut strings = moves
            .into_iter()
            .map(|mv| {
                if san {
                    self.position.to_san(mv)
                } else {
                    self.position.to_lan(mv)
                }
            })
            .collect::<Vec<_>>();

        if sort {
            strings.sort();
        }

        // If there are none, print "(none)"
        if strings.is_empty() {
            println!("(none)");
        } else {
            println!("{}", strings.join(", "));
        }
    }

    /// Executes the `perft` and `splitperft` commands.
    fn perft(&mut self, depth: usize, split: bool) {
        let now = Instant::now();
        let nodes = if split {
            splitperft(&mut self.position, depth)
        } else {
            perft(&mut self.position, depth)
        };
        let elapsed = now.elapsed();

        let nps = (nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64;
        if split {
            println!();
        }
        println!("{nodes} nodes in {}ms ({nps} nps)", elapsed.as_millis());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses and applies each of `moves` to `position`, in order.
fn apply_moves<T: AsRef<str>>(position: &mut Position<Xiangqi>, moves: &[T]) -> Result<()> {
    for mv_str in moves {
        let mv_str = mv_str.as_ref();
        let mv = position
            .parse_move(mv_str)
            .with_context(|| format!("Failed to apply move {mv_str:?}"))?;
        position.make_move(mv);
    }

    Ok(())
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<SessionCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line from stdin")?;

        // For ctrl + d
        if 0 == bytes {
            sender
                .send(SessionCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Session received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        match buf.parse::<SessionCommand>() {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to session")?,

            // `--help` is reported as an error by clap, but it is not one
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{err}")
            }

            Err(err) => {
                warn!(input = %buf, "unrecognized command");
                eprintln!("{err}");
            }
        }
    }
}

/// Parses command-line arguments into commands, queueing each one on `session`.
///
/// Arguments are consumed greedily: the longest prefix that parses as a command is taken,
/// and parsing resumes after it.
pub fn queue_args(session: &Session, args: &[String]) -> Result<()> {
    let mut arg_idx = args.len();
    let mut parsed_idx = 0;

    while parsed_idx < args.len() {
        let slice = &args[parsed_idx..arg_idx];

        match SessionCommand::try_parse_from(slice) {
            Ok(cmd) => {
                session.send_command(cmd)?;
                parsed_idx = arg_idx;
                arg_idx = args.len();
            }

            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{err}");
                parsed_idx = arg_idx;
                arg_idx = args.len();
            }

            Err(err) => {
                arg_idx -= 1;

                // Nothing starting at `parsed_idx` is a command
                if arg_idx == parsed_idx {
                    error!(arg = %args[parsed_idx], "could not parse command-line arguments");
                    bail!("{err}");
                }
            }
        }
    }

    Ok(())
}
