// src/metrics/coherence.rs

//! Meltdown detection.
//!
//! An agent in a meltdown loop keeps issuing the same ineffective decision.
//! How to spot that is a judgement call, so scoring sits behind
//! [`CoherenceScorer`] and the run picks a strategy.

use crate::model::decision::DecisionResult;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoherenceReport {
    pub scorer: String,
    /// 1.0 means no meltdown signal at all, 0.0 means every turn was flagged.
    pub score: f64,
    pub scored_turns: u32,
    pub flagged_turns: Vec<u32>,
}

impl CoherenceReport {
    fn from_flags(scorer: &str, scored_turns: u32, flagged_turns: Vec<u32>) -> Self {
        let score = if scored_turns == 0 {
            1.0
        } else {
            1.0 - flagged_turns.len() as f64 / scored_turns as f64
        };
        Self {
            scorer: scorer.to_string(),
            score: score.clamp(0.0, 1.0),
            scored_turns,
            flagged_turns,
        }
    }
}

pub trait CoherenceScorer: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Scores the full decision history of a run, in turn order.
    fn score(&self, history: &[DecisionResult]) -> CoherenceReport;
}

/// Flags a turn when the same decision already occurred `prior_repeats` times
/// within the last `window` turns, or when it repeats the immediately previous
/// decision and that one was rejected.
///
/// No-ops are not scored; waiting is never a meltdown on its own.
#[derive(Debug, Clone)]
pub struct RepetitionScorer {
    pub window: usize,
    pub prior_repeats: usize,
}

impl Default for RepetitionScorer {
    fn default() -> Self {
        Self {
            window: 10,
            prior_repeats: 2,
        }
    }
}

impl CoherenceScorer for RepetitionScorer {
    fn name(&self) -> &str {
        "repetition"
    }

    fn score(&self, history: &[DecisionResult]) -> CoherenceReport {
        let mut scored = 0;
        let mut flagged = Vec::new();

        for (i, current) in history.iter().enumerate() {
            if current.decision.is_noop() {
                continue;
            }
            scored += 1;

            let previous = &history[i.saturating_sub(self.window)..i];
            let repeats = previous
                .iter()
                .filter(|p| p.decision == current.decision)
                .count();
            let retried_rejection = previous
                .last()
                .is_some_and(|p| !p.accepted && p.decision == current.decision);

            if repeats >= self.prior_repeats || retried_rejection {
                flagged.push(current.turn);
            }
        }
        CoherenceReport::from_flags(self.name(), scored, flagged)
    }
}

/// Flags every turn that belongs to a run of at least `streak` consecutive
/// rejected decisions.
#[derive(Debug, Clone)]
pub struct RejectionStreakScorer {
    pub streak: usize,
}

impl Default for RejectionStreakScorer {
    fn default() -> Self {
        Self { streak: 3 }
    }
}

impl CoherenceScorer for RejectionStreakScorer {
    fn name(&self) -> &str {
        "rejection-streak"
    }

    fn score(&self, history: &[DecisionResult]) -> CoherenceReport {
        let mut flagged = Vec::new();
        let mut run: Vec<u32> = Vec::new();

        for result in history {
            if result.accepted {
                if run.len() >= self.streak {
                    flagged.append(&mut run);
                }
                run.clear();
            } else {
                run.push(result.turn);
            }
        }
        if run.len() >= self.streak {
            flagged.append(&mut run);
        }
        CoherenceReport::from_flags(self.name(), history.len() as u32, flagged)
    }
}
