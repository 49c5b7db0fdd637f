use std::fmt;

use shakmaty::{
    CastlingMode, CastlingSide, Chess, EnPassantMode, Piece, Position, Setup, Square,
    fen::Fen,
    san::SanPlus,
};

use crate::{
    error::DecodeError,
    grid::{Occupancy, OccupancyGrid},
};

/// Squares touched by a move, as seen by the scorers.
///
/// For castling `to` is the king's destination (g1, c1, g8, c8), not the
/// rook square some move encodings use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSquares {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub castle: Option<CastlingSide>,
}

/// Legality oracle consumed by the decoder.
///
/// Implementations own a legal position. The decoder only ever mutates it
/// through [`RulesOracle::commit`]; scoring works on copies from
/// [`RulesOracle::after`].
pub trait RulesOracle: Clone + Send + Sync {
    type Move: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Legal moves in generation order. The order is the tie-break for
    /// equally scored candidates.
    fn enumerate_moves(&self) -> Vec<Self::Move>;

    /// Copy of the position with `m` applied.
    fn after(&self, m: &Self::Move) -> Self;

    /// Apply `m` in place and return its SAN relative to the position
    /// before the move.
    fn commit(&mut self, m: &Self::Move) -> String;

    fn san(&self, m: &Self::Move) -> String;

    fn uci(&self, m: &Self::Move) -> String;

    fn piece_on(&self, sq: Square) -> Option<Piece>;

    fn move_squares(&self, m: &Self::Move) -> MoveSquares;

    fn to_fen(&self) -> String;

    /// Project the position onto the observation grid: white pieces read
    /// as light, black pieces as dark.
    fn occupancy(&self) -> OccupancyGrid {
        let mut grid = OccupancyGrid::empty();
        for sq in Square::ALL {
            if let Some(piece) = self.piece_on(sq) {
                grid[sq] = if piece.color.is_white() {
                    Occupancy::Light
                } else {
                    Occupancy::Dark
                };
            }
        }
        grid
    }
}

impl RulesOracle for Chess {
    type Move = shakmaty::Move;

    fn enumerate_moves(&self) -> Vec<Self::Move> {
        self.legal_moves().into_iter().collect()
    }

    fn after(&self, m: &Self::Move) -> Self {
        let mut next = self.clone();
        next.play_unchecked(m.clone());
        next
    }

    fn commit(&mut self, m: &Self::Move) -> String {
        SanPlus::from_move_and_play_unchecked(self, m.clone()).to_string()
    }

    fn san(&self, m: &Self::Move) -> String {
        let mut scratch = self.clone();
        SanPlus::from_move_and_play_unchecked(&mut scratch, m.clone()).to_string()
    }

    fn uci(&self, m: &Self::Move) -> String {
        m.to_uci(CastlingMode::Standard).to_string()
    }

    fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board().piece_at(sq)
    }

    fn move_squares(&self, m: &Self::Move) -> MoveSquares {
        let color = self.turn();
        let castle = m.castling_side();
        let to = match castle {
            Some(side) => side.king_to(color),
            None => m.to(),
        };
        MoveSquares {
            // Every standard chess move has an origin square; only drops lack one.
            from: m.from().unwrap_or(to),
            to,
            piece: Piece {
                color,
                role: m.role(),
            },
            castle,
        }
    }

    fn to_fen(&self) -> String {
        Fen::from_position(self, EnPassantMode::Legal).to_string()
    }
}

/// Build the starting position: the standard start, or the arrangement
/// described by `fen`.
pub fn position_from_fen(fen: Option<&str>) -> Result<Chess, DecodeError> {
    let Some(fen) = fen else {
        return Ok(Chess::default());
    };
    let fen: Fen = fen.parse()?;
    let setup: Setup = fen.into();
    Ok(setup.position(CastlingMode::Standard)?)
}
