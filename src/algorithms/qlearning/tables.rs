//! Free/queued value tables and their optional upper bounds.

use crate::index::StationIdx;

use super::table::QTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a round of targets is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EvaluationMode {
    /// Use the learned estimate (averaged with the upper bound in interval mode).
    Exploit,
    /// Prefer the targets whose upper bound is furthest above the estimate.
    ExploreTrue,
    /// Like `ExploreTrue`, restricted to targets not dominated by another
    /// target's pessimistic value.
    ExploreActionElimination,
}

/// Optimistic tables; they start at the geometric-series bound and never increase.
#[derive(Debug, Clone, PartialEq)]
pub struct UpperBounds {
    pub free: QTable,
    pub queued: QTable,
}

/// The learned "free" and "queued" tables of one owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTables {
    pub free: QTable,
    pub queued: QTable,
    pub upper: Option<UpperBounds>,
}

impl ValueTables {
    /// Zero-initialised tables without upper bounds.
    pub fn new(size: usize) -> Self {
        Self {
            free: QTable::new(size),
            queued: QTable::new(size),
            upper: None,
        }
    }

    /// Zero-initialised tables with upper bounds set by `init(source, target)`.
    pub fn with_upper_bounds(size: usize, init: impl Fn(StationIdx, StationIdx) -> f64) -> Self {
        let mut upper = QTable::new(size);
        for s in 0..size {
            for t in 0..size {
                upper.set(StationIdx(s), StationIdx(t), init(StationIdx(s), StationIdx(t)));
            }
        }
        Self {
            free: QTable::new(size),
            queued: QTable::new(size),
            upper: Some(UpperBounds {
                free: upper.clone(),
                queued: upper,
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.free.size()
    }

    /// `(1 - q) * free + q * queued` for queue scale `q`.
    pub fn blend(&self, source: StationIdx, target: StationIdx, queue_scale: f64) -> f64 {
        (1.0 - queue_scale) * self.free.get(source, target)
            + queue_scale * self.queued.get(source, target)
    }

    /// Same blend over the upper-bound tables.
    pub fn upper_blend(&self, source: StationIdx, target: StationIdx, queue_scale: f64) -> Option<f64> {
        self.upper.as_ref().map(|u| {
            (1.0 - queue_scale) * u.free.get(source, target) + queue_scale * u.queued.get(source, target)
        })
    }

    /// Plain learned value used by the simulator, without any forecast of its own.
    pub fn evaluate_without_prediction(
        &self,
        source: StationIdx,
        target: StationIdx,
        queue_scale: f64,
    ) -> f64 {
        self.blend(source, target, queue_scale)
    }

    /// Remaining uncertainty `((uf - f) + (uq - q)) / 2`, or zero without upper bounds.
    pub fn uncertainty(&self, source: StationIdx, target: StationIdx) -> f64 {
        match &self.upper {
            Some(u) => {
                ((u.free.get(source, target) - self.free.get(source, target))
                    + (u.queued.get(source, target) - self.queued.get(source, target)))
                    / 2.0
            }
            None => 0.0,
        }
    }

    /// Scores every target from `source`; `queue_scales[t]` is the predicted
    /// pressure at target `t` when the agent would get there.
    pub fn score_row(&self, source: StationIdx, mode: EvaluationMode, queue_scales: &[f64]) -> Vec<f64> {
        let n = self.size();
        let scale = |t: usize| queue_scales.get(t).copied().unwrap_or(0.0);

        if self.upper.is_none() {
            return (0..n)
                .map(|t| self.blend(source, StationIdx(t), scale(t)))
                .collect();
        }

        match mode {
            EvaluationMode::Exploit => (0..n)
                .map(|t| {
                    let target = StationIdx(t);
                    let base = self.blend(source, target, scale(t));
                    let upper = self.upper_blend(source, target, scale(t)).unwrap_or(base);
                    (base + upper) / 2.0
                })
                .collect(),
            EvaluationMode::ExploreTrue => (0..n)
                .map(|t| self.uncertainty(source, StationIdx(t)))
                .collect(),
            EvaluationMode::ExploreActionElimination => {
                let lower: Vec<f64> = (0..n)
                    .map(|t| self.blend(source, StationIdx(t), scale(t)))
                    .collect();
                let upper: Vec<f64> = (0..n)
                    .map(|t| {
                        self.upper_blend(source, StationIdx(t), scale(t))
                            .unwrap_or(lower[t])
                    })
                    .collect();

                (0..n)
                    .map(|t| {
                        let dominated = (0..n).any(|o| o != t && lower[o] > upper[t]);
                        if dominated {
                            -1.0
                        } else {
                            self.uncertainty(source, StationIdx(t))
                        }
                    })
                    .collect()
            }
        }
    }

    /// Bootstrapped update of the free or queued table, and of the matching
    /// upper bound in interval mode.
    ///
    /// The upper bound is only ever lowered.
    pub fn update(
        &mut self,
        source: StationIdx,
        target: StationIdx,
        queued: bool,
        reward: f64,
        alpha: f64,
        gamma: f64,
    ) {
        let table = if queued {
            &mut self.queued
        } else {
            &mut self.free
        };
        bootstrap(table, source, target, reward, alpha, gamma);

        if let Some(upper) = self.upper.as_mut() {
            let table = if queued {
                &mut upper.queued
            } else {
                &mut upper.free
            };
            let old = table.get(source, target);
            bootstrap(table, source, target, reward, alpha, gamma);
            if table.get(source, target) > old {
                table.set(source, target, old);
            }
        }
    }
}

/// `q[s][t] = (1 - α) q[s][t] + α (r + γ max q[t])`
fn bootstrap(
    table: &mut QTable,
    source: StationIdx,
    target: StationIdx,
    reward: f64,
    alpha: f64,
    gamma: f64,
) {
    let next = table.row_max(target);
    let old = table.get(source, target);
    table.set(source, target, (1.0 - alpha) * old + alpha * (reward + gamma * next));
}
