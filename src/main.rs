/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use eastern::{queue_args, Session};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so that command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::new();

    // Skip the executable name
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if let Err(e) = queue_args(&session, &args) {
        eprintln!("{e}");
    }

    if let Err(e) = session.run() {
        eprintln!("{} encountered an error: {e}", env!("CARGO_PKG_NAME"));
    }
}
