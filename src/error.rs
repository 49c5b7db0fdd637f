//! Error types for the board-observation decoder.
//!
//! Only contract violations and configuration problems are errors.
//! Steps that cannot be resolved, or that resolve with low confidence,
//! are reported inside the [`DecodeRun`](crate::DecodeRun) instead, so a
//! caller always gets partial output unless the input itself is broken.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// Fewer than two frames were supplied; there is no transition to decode.
    #[error("Insufficient data: {frames} frame(s) supplied, at least 2 required")]
    InsufficientData { frames: usize },

    /// A frame is not a well-formed 8x8 grid or holds out-of-domain values.
    #[error("Malformed frame {frame}: {reason}")]
    MalformedFrame { frame: usize, reason: String },

    /// A frame carries a different observation kind than frame 0.
    #[error("Frame {frame} mixes observation modes within a single run")]
    MixedModes { frame: usize },

    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// The run was aborted between steps.
    #[error("Decoding cancelled before step {step}")]
    Cancelled { step: usize },

    /// Wraps an error from reading JSON frames, maps, or configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub(crate) fn malformed(frame: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedFrame {
            frame,
            reason: reason.into(),
        }
    }
}
