//! Reconstruct a chess game from noisy board observations.
//!
//!
//! This crate takes the per-frame board states produced by a vision
//! pipeline and turns them into a sequence of legal moves. Each
//! transition between frames is explained by ranking every legal move
//! of the current position against the new observation and committing
//! the best one, so an illegal move is never emitted.
//!
//! Two kinds of observation are supported, one per run:
//! occupancy grids (empty / light / dark per square), scored by a
//! weighted mismatch distance, and tag-id grids, scored by how well the
//! tag ids carry over from one frame to the next.
//!
//! The principal type is [`Decoder`]. Results are returned as a
//! [`DecodeRun`] holding per-step notation, scores, ranked candidates,
//! and explicit uncertain / unresolved markers for human review.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod artifacts;
mod config;
mod decoder;
mod error;
mod grid;
mod idmap;
mod oracle;
mod scoring;
mod types;

pub mod occupancy;
pub mod tags;

/// Main decoding state machine.
pub use decoder::{Decoder, decode};

/// Error type produced by library operations.
pub use error::DecodeError;

/// Run configuration.
pub use config::DecodeConfig;

/// Observation grids and input parsing.
pub use grid::{
    DecodeMode, IdGrid, Observations, Occupancy, OccupancyGrid, RawFrame, cell_of,
    changed_squares, square_at,
};

/// Tag id to piece binding.
pub use idmap::{IdMap, infer_mapping};

/// Legality oracle abstraction.
pub use oracle::{MoveSquares, RulesOracle, position_from_fen};

/// Optional debug renderings.
pub use artifacts::{ArtifactSink, DirectorySink};

/// Output data structures returned by a run.
pub use types::{
    CandidateMove, DecodeRun, RankedCandidate, StepResult, UNRESOLVED_SAN, UncertainStep,
    UnresolvedReason,
};

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
