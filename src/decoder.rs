use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::{debug, info, warn};
use shakmaty::Chess;

use crate::{
    artifacts::ArtifactSink,
    config::DecodeConfig,
    error::DecodeError,
    grid::{DecodeMode, IdGrid, Observations, OccupancyGrid},
    idmap::{IdMap, infer_mapping},
    occupancy,
    oracle::{RulesOracle, position_from_fen},
    tags,
    types::{
        CandidateMove, DecodeRun, RankedCandidate, StepResult, UncertainStep, UnresolvedReason,
    },
};

/// Scorer selected once per run from the observation kind.
enum Scorer<'a> {
    Occupancy(&'a [OccupancyGrid]),
    Tags(&'a [IdGrid], IdMap),
}

impl Scorer<'_> {
    fn rank<P: RulesOracle>(
        &self,
        position: &P,
        prev: usize,
        curr: usize,
        parallel: bool,
    ) -> Vec<CandidateMove<P::Move>> {
        match self {
            Scorer::Occupancy(grids) => {
                occupancy::score_moves_with(position, &grids[prev], &grids[curr], parallel)
            }
            Scorer::Tags(grids, id_map) => {
                tags::score_moves_with(position, &grids[prev], &grids[curr], id_map, parallel)
            }
        }
    }

    fn mode(&self) -> DecodeMode {
        match self {
            Scorer::Occupancy(_) => DecodeMode::Occupancy,
            Scorer::Tags(..) => DecodeMode::Tags,
        }
    }
}

/// Turns an observation sequence into a move list.
///
/// The decoder owns the only copy of the position for the run. Each step
/// ranks every legal move against the next frame, commits the winner and
/// never revisits it.
pub struct Decoder<P: RulesOracle = Chess> {
    position: P,
    config: DecodeConfig,
    id_map: Option<IdMap>,
    artifacts: Option<Box<dyn ArtifactSink>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Decoder<Chess> {
    /// Start from `config.initial_fen`, or the standard position.
    pub fn new(config: DecodeConfig) -> Result<Self, DecodeError> {
        let position = position_from_fen(config.initial_fen.as_deref())?;
        Ok(Self::with_position(position, config))
    }
}

impl<P: RulesOracle> Decoder<P> {
    pub fn with_position(position: P, config: DecodeConfig) -> Self {
        Decoder {
            position,
            config,
            id_map: None,
            artifacts: None,
            cancel: None,
        }
    }

    /// Use a known tag table instead of inferring one from the first frame.
    pub fn with_id_map(mut self, id_map: IdMap) -> Self {
        self.id_map = Some(id_map);
        self
    }

    pub fn with_artifacts(mut self, sink: Box<dyn ArtifactSink>) -> Self {
        self.artifacts = Some(sink);
        self
    }

    /// Abort the run before the next step once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn decode(mut self, observations: &Observations) -> Result<DecodeRun, DecodeError> {
        let frames = observations.len();
        if frames < 2 {
            return Err(DecodeError::InsufficientData { frames });
        }

        let scorer = match observations {
            Observations::Occupancy(grids) => Scorer::Occupancy(grids),
            Observations::Tags(grids) => {
                let id_map = match self.id_map.take() {
                    Some(map) => map,
                    None => infer_mapping(&grids[0], &self.position),
                };
                if id_map.is_empty() {
                    warn!("tag map is empty; scoring falls back to vacancy evidence only");
                }
                Scorer::Tags(grids, id_map)
            }
        };
        info!(
            "decoding {} transitions in {:?} mode",
            frames - 1,
            scorer.mode()
        );

        if let Observations::Occupancy(grids) = observations {
            self.record(|sink| sink.record_frame(0, &grids[0]));
        }

        let mut steps = Vec::with_capacity(frames - 1);
        let mut uncertain = Vec::new();
        // Only advanced once a move explains the frame.
        let mut prev = 0;

        for step in 1..frames {
            if self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed)) {
                return Err(DecodeError::Cancelled { step });
            }

            // 1. Rank every legal move; an empty ranking means there are none
            let ranked = scorer.rank(&self.position, prev, step, self.config.parallel);
            let Some(best) = ranked.first() else {
                warn!("step {step}: no legal moves from {}", self.position.to_fen());
                steps.push(StepResult::unresolved(step, UnresolvedReason::NoLegalMoves));
                continue;
            };

            // 2. Report candidates relative to the position before the move
            let limit = self
                .config
                .candidate_limit
                .max(self.config.uncertain_candidate_limit);
            let reported: Vec<RankedCandidate> = ranked
                .iter()
                .take(limit)
                .map(|c| RankedCandidate {
                    san: self.position.san(&c.mv),
                    uci: self.position.uci(&c.mv),
                    score: c.score,
                })
                .collect();
            let is_uncertain = self.classify(scorer.mode(), &ranked);

            // 3. Commit the winner
            let uci = self.position.uci(&best.mv);
            let san = self.position.commit(&best.mv);
            let score = best.score;
            debug!("step {step}: {san} ({uci}) score {score}");

            if is_uncertain {
                warn!(
                    "step {step}: {san} is uncertain (score {score}, runner-up {:?})",
                    ranked.get(1).map(|c| c.score)
                );
                uncertain.push(UncertainStep {
                    step,
                    san: san.clone(),
                    score,
                    candidates: reported
                        .iter()
                        .take(self.config.uncertain_candidate_limit)
                        .cloned()
                        .collect(),
                });
            }

            if let Observations::Occupancy(grids) = observations {
                self.record(|sink| sink.record_frame(step, &grids[step]));
                self.record(|sink| sink.record_diff(step, &grids[prev], &grids[step]));
            }

            steps.push(StepResult {
                step,
                san,
                uci: Some(uci),
                uncertain: is_uncertain,
                score: Some(score),
                candidates: reported
                    .into_iter()
                    .take(self.config.candidate_limit)
                    .collect(),
                reason: None,
            });
            prev = step;
        }

        let run = DecodeRun {
            mode: scorer.mode(),
            steps,
            uncertain,
            final_fen: self.position.to_fen(),
            id_map: match scorer {
                Scorer::Tags(_, id_map) => Some(id_map),
                Scorer::Occupancy(_) => None,
            },
        };
        info!(
            "decoded {} moves: {} uncertain, {} unresolved",
            run.steps.len(),
            run.uncertain_count(),
            run.unresolved_count()
        );
        Ok(run)
    }

    /// Occupancy steps are uncertain when the winner is barely ahead or
    /// explains the frame poorly. Tag steps are never flagged once a move
    /// is found.
    fn classify<M>(&self, mode: DecodeMode, ranked: &[CandidateMove<M>]) -> bool {
        match mode {
            DecodeMode::Tags => false,
            DecodeMode::Occupancy => {
                let Some(best) = ranked.first() else {
                    return true;
                };
                let close_runner_up = ranked
                    .get(1)
                    .is_some_and(|second| second.score - best.score < self.config.uncertain_threshold);
                close_runner_up || best.score > self.config.dist_threshold
            }
        }
    }

    fn record(&self, write: impl FnOnce(&dyn ArtifactSink) -> std::io::Result<()>) {
        if let Some(sink) = &self.artifacts {
            if let Err(e) = write(sink.as_ref()) {
                warn!("failed to write debug artifact: {e}");
            }
        }
    }
}

/// Decode with a fresh [`Decoder`] built from `config`.
pub fn decode(observations: &Observations, config: DecodeConfig) -> Result<DecodeRun, DecodeError> {
    Decoder::new(config)?.decode(observations)
}
