use rayon::prelude::*;

use crate::{oracle::RulesOracle, types::CandidateMove};

/// Score every legal move of `position`. The result keeps generation
/// order regardless of `parallel`, so a stable sort afterwards breaks
/// ties the same way on every run.
pub(crate) fn score_all<P, F>(position: &P, parallel: bool, score: F) -> Vec<CandidateMove<P::Move>>
where
    P: RulesOracle,
    F: Fn(&P::Move) -> f64 + Sync,
{
    let moves = position.enumerate_moves();
    let scores: Vec<f64> = if parallel {
        moves.par_iter().map(&score).collect()
    } else {
        moves.iter().map(&score).collect()
    };

    moves
        .into_iter()
        .zip(scores)
        .map(|(mv, score)| CandidateMove { mv, score })
        .collect()
}

/// Lowest score first. Stable.
pub(crate) fn sort_ascending<M>(candidates: &mut [CandidateMove<M>]) {
    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
}

/// Highest score first. Stable.
pub(crate) fn sort_descending<M>(candidates: &mut [CandidateMove<M>]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}
