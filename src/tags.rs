use shakmaty::{CastlingSide, Color, Square};

use crate::{
    grid::IdGrid,
    idmap::IdMap,
    oracle::{MoveSquares, RulesOracle},
    scoring::{score_all, sort_descending},
    types::CandidateMove,
};

pub const VACATED_SOURCE: f64 = 10.0;
pub const UNCHANGED_SOURCE: f64 = -50.0;
pub const ID_CARRIED: f64 = 100.0;
pub const DESTINATION_UNSEEN: f64 = -10.0;
pub const FOREIGN_ID: f64 = -50.0;
pub const TYPE_MATCH: f64 = 50.0;
pub const TYPE_MISMATCH: f64 = -20.0;
pub const ROOK_CARRIED: f64 = 50.0;

/// Rank every legal move by tag continuity between `prev` and `curr`.
/// Higher is better; ties keep move-generation order.
pub fn score_moves<P: RulesOracle>(
    position: &P,
    prev: &IdGrid,
    curr: &IdGrid,
    id_map: &IdMap,
) -> Vec<CandidateMove<P::Move>> {
    score_moves_with(position, prev, curr, id_map, true)
}

pub fn score_moves_with<P: RulesOracle>(
    position: &P,
    prev: &IdGrid,
    curr: &IdGrid,
    id_map: &IdMap,
    parallel: bool,
) -> Vec<CandidateMove<P::Move>> {
    let mut candidates = score_all(position, parallel, |m| {
        continuity(&position.move_squares(m), prev, curr, id_map)
    });
    sort_descending(&mut candidates);
    candidates
}

/// Evidence that the piece described by `squares` moved between the two
/// frames. Exact id carry outweighs a type match, which outweighs a bare
/// vacancy; contradictions are penalised.
pub fn continuity(squares: &MoveSquares, prev: &IdGrid, curr: &IdGrid, id_map: &IdMap) -> f64 {
    let MoveSquares { from, to, piece, castle } = *squares;
    let mut score = 0.0;

    // A square reading 0 in both frames counts as vacated, not unchanged.
    if curr[from] == 0 {
        score += VACATED_SOURCE;
    } else if curr[from] == prev[from] {
        score += UNCHANGED_SOURCE;
    }

    let moving_id = prev[from];
    if moving_id != 0 {
        score += match curr[to] {
            id if id == moving_id => ID_CARRIED,
            0 => DESTINATION_UNSEEN,
            _ => FOREIGN_ID,
        };
    } else if id_map.get(curr[to]) == Some(piece) {
        score += TYPE_MATCH;
    } else {
        score += TYPE_MISMATCH;
    }

    if let Some(side) = castle {
        let (rook_from, rook_to) = rook_squares(piece.color, side);
        let rook_id = prev[rook_from];
        if rook_id != 0 && curr[rook_to] == rook_id {
            score += ROOK_CARRIED;
        }
    }

    score
}

/// Origin and destination of the rook taking part in a castling move.
pub fn rook_squares(color: Color, side: CastlingSide) -> (Square, Square) {
    match (color, side) {
        (Color::White, CastlingSide::KingSide) => (Square::H1, Square::F1),
        (Color::White, CastlingSide::QueenSide) => (Square::A1, Square::D1),
        (Color::Black, CastlingSide::KingSide) => (Square::H8, Square::F8),
        (Color::Black, CastlingSide::QueenSide) => (Square::A8, Square::D8),
    }
}
