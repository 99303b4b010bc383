/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Position, Variant};

/// Perform a perft at the specified depth, collecting only data about the number of possible positions (nodes).
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves,
/// rather than making them, recursing again, and returning 1 for each terminal case.
/// If you do *not* want to use bulk counting, use [`perft_generic`].
///
/// The position is restored before returning.
#[inline(always)]
pub fn perft<V: Variant>(pos: &mut Position<V>, depth: usize) -> u64 {
    perft_generic::<true, false, V>(pos, depth)
}

/// Perform a splitperft at the specified depth, printing the number of nodes reachable after each root move.
///
/// Root moves are printed in long algebraic notation.
#[inline(always)]
pub fn splitperft<V: Variant>(pos: &mut Position<V>, depth: usize) -> u64 {
    perft_generic::<true, true, V>(pos, depth)
}

/// Generic version of `perft` that allows you to specify whether to perform bulk counting and splitperft.
///
/// If `BULK` is set to `true`, this will perform bulk counting.
/// If `SPLIT` is set to `true`, this will perform a splitperft.
pub fn perft_generic<const BULK: bool, const SPLIT: bool, V: Variant>(
    pos: &mut Position<V>,
    depth: usize,
) -> u64 {
    // Bulk counting; no need to recurse again just to apply a singular move and return 1.
    if BULK && !SPLIT && depth == 1 {
        return pos.legal_moves().len() as u64;
    }
    // Recursion limit; return 1, since we're fathoming this node.
    else if depth == 0 {
        return 1;
    }

    pos.legal_moves().into_iter().fold(0, |nodes, mv| {
        let lan = if SPLIT { pos.to_lan(mv) } else { String::new() };

        pos.make_move(mv);
        let new_nodes = perft_generic::<BULK, false, V>(pos, depth - 1);
        pos.undo_move();

        if SPLIT {
            println!("{lan}\t{new_nodes}");
        }

        nodes + new_nodes
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Xiangqi;

    #[test]
    fn test_bulk_and_full_counts_agree() {
        let mut pos = Position::<Xiangqi>::default();
        for depth in 0..=2 {
            let bulk = perft_generic::<true, false, Xiangqi>(&mut pos, depth);
            let full = perft_generic::<false, false, Xiangqi>(&mut pos, depth);
            assert_eq!(bulk, full, "depth {depth}");
        }
        assert_eq!(pos, Position::default());
    }
}
