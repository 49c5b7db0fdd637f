use ndarray::{Array2, Zip};

use crate::{
    grid::{OccupancyGrid, changed_squares},
    oracle::RulesOracle,
    scoring::{score_all, sort_ascending},
    types::CandidateMove,
};

/// Extra cost of a mismatch on a square that changed between frames.
pub const CHANGED_SQUARE_WEIGHT: f64 = 1.0;
/// Extra cost of a mismatch where both sides see a piece but disagree on
/// its colour.
pub const COLOR_CONFUSION_WEIGHT: f64 = 0.5;

/// Rank every legal move by how well the position after it explains
/// `curr`. Lower is better; ties keep move-generation order.
pub fn score_moves<P: RulesOracle>(
    position: &P,
    prev: &OccupancyGrid,
    curr: &OccupancyGrid,
) -> Vec<CandidateMove<P::Move>> {
    score_moves_with(position, prev, curr, true)
}

pub fn score_moves_with<P: RulesOracle>(
    position: &P,
    prev: &OccupancyGrid,
    curr: &OccupancyGrid,
    parallel: bool,
) -> Vec<CandidateMove<P::Move>> {
    let changed = changed_squares(prev, curr);
    let mut candidates = score_all(position, parallel, |m| {
        let expected = position.after(m).occupancy();
        weighted_distance(&expected, curr, &changed)
    });
    sort_ascending(&mut candidates);
    candidates
}

/// One point per mismatched square, plus [`CHANGED_SQUARE_WEIGHT`] if the
/// square changed between frames and [`COLOR_CONFUSION_WEIGHT`] if the
/// mismatch is light against dark.
pub fn weighted_distance(
    expected: &OccupancyGrid,
    observed: &OccupancyGrid,
    changed: &Array2<bool>,
) -> f64 {
    Zip::from(expected.cells())
        .and(observed.cells())
        .and(changed)
        .fold(0.0, |acc, &e, &o, &c| {
            if e == o {
                return acc;
            }
            let mut cost = 1.0;
            if c {
                cost += CHANGED_SQUARE_WEIGHT;
            }
            if e.is_color_confusion(o) {
                cost += COLOR_CONFUSION_WEIGHT;
            }
            acc + cost
        })
}
