//! Relocation of a whole horizontal run of tiles.
//!
//! Used by every "set" operation (board→board, rack→rack, rack→board).
//! Planning is pure: [`plan_set_move`] inspects the grids and returns the
//! single-tile steps in a safe order, and the caller replays each step
//! with its own single-tile move so history and swap rules still apply.

use crate::{Coordinate, Grid};

/// An ordered list of single-tile moves that relocates one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMove {
    steps: Vec<(Coordinate, Coordinate)>,
}

impl SetMove {
    pub fn steps(&self) -> &[(Coordinate, Coordinate)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl IntoIterator for SetMove {
    type Item = (Coordinate, Coordinate);
    type IntoIter = std::vec::IntoIter<(Coordinate, Coordinate)>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// Plans moving the run that contains `src` on `source` so that the tile
/// at `src` lands on (or as near as the grid allows to) `dst` on `target`.
///
/// `same_grid` must be `true` when `source` and `target` are the same
/// grid; cells the run already covers are then allowed to overlap the
/// destination.
///
/// Returns `None` without side effects when there is no tile at `src`,
/// the destination row is off the grid, the run does not fit, or the
/// destination overlaps tiles the run does not own.
pub fn plan_set_move(
    source: &Grid,
    target: &Grid,
    same_grid: bool,
    src: Coordinate,
    dst: Coordinate,
) -> Option<SetMove> {
    if !source.contains(src) {
        return None;
    }
    if !(0..target.height()).contains(&dst.row) {
        return None;
    }

    let first = source.first_of_run(src);
    let len = source.run_length(first);
    let width = target.width();
    if len as i32 > width {
        return None;
    }

    // Keep the grabbed tile's offset inside the run, then pull the run
    // back onto the grid if it would hang over either edge.
    let trg_col = (dst.col + first.col - src.col).clamp(0, width - len as i32);
    let trg_first = Coordinate::new(trg_col, dst.row);

    if !is_target_free(target, same_grid, first, trg_first, len) {
        return None;
    }

    let step = |i: usize| (first.shifted(i as i32), trg_first.shifted(i as i32));
    // Moving right: start with the rightmost tile so no tile lands on a
    // neighbour that has not moved yet. Moving left: the mirror image.
    let steps = if trg_first.col > first.col {
        (0..len).rev().map(step).collect()
    } else {
        (0..len).map(step).collect()
    };

    Some(SetMove { steps })
}

/// Checks that the `len` cells starting at `trg_first` are empty.
///
/// Within one row of one grid the run may slide over itself: only the
/// cells it does not already cover have to be free.
fn is_target_free(
    target: &Grid,
    same_grid: bool,
    src_first: Coordinate,
    trg_first: Coordinate,
    len: usize,
) -> bool {
    let len = len as i32;
    let (check_from, check_len) = if same_grid && src_first.row == trg_first.row {
        let shift = (src_first.col - trg_first.col).abs().min(len);
        if trg_first.col > src_first.col {
            (trg_first.shifted(len - shift), shift)
        } else {
            (trg_first, shift)
        }
    } else {
        (trg_first, len)
    };

    (0..check_len).all(|i| !target.contains(check_from.shifted(i)))
}
