use serde::{Deserialize, Serialize};

use crate::{grid::DecodeMode, idmap::IdMap};

/// Notation recorded for a step no legal move could be matched to.
pub const UNRESOLVED_SAN: &str = "??";

/// A legal move paired with its mode-specific score.
///
/// Occupancy scores are distances (lower wins); tag scores are
/// heuristic evidence (higher wins).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMove<M> {
    pub mv: M,
    pub score: f64,
}

/// A candidate as reported to downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "move")]
    pub san: String,
    pub uci: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NoLegalMoves,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Index of the frame this step explains (1 for the first transition).
    pub step: usize,
    /// SAN of the committed move, or [`UNRESOLVED_SAN`].
    #[serde(rename = "move")]
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uci: Option<String>,
    pub uncertain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Best candidates, best first.
    pub candidates: Vec<RankedCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnresolvedReason>,
}

impl StepResult {
    pub fn unresolved(step: usize, reason: UnresolvedReason) -> Self {
        StepResult {
            step,
            san: UNRESOLVED_SAN.to_owned(),
            uci: None,
            uncertain: true,
            score: None,
            candidates: Vec::new(),
            reason: Some(reason),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.reason.is_none()
    }
}

/// A low-confidence step collected for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertainStep {
    pub step: usize,
    #[serde(rename = "move")]
    pub san: String,
    pub score: f64,
    pub candidates: Vec<RankedCandidate>,
}

/// Output of one decode run. Created once and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeRun {
    pub mode: DecodeMode,
    pub steps: Vec<StepResult>,
    pub uncertain: Vec<UncertainStep>,
    /// Position after the last committed move.
    pub final_fen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_map: Option<IdMap>,
}

impl DecodeRun {
    /// The move list, including unresolved sentinels, ready for PGN output.
    pub fn san_moves(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.san.as_str()).collect()
    }

    /// Steps flagged uncertain, unresolved ones included.
    pub fn uncertain_count(&self) -> usize {
        self.steps.iter().filter(|s| s.uncertain).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_resolved()).count()
    }
}
