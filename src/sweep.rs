//! Running-minimum tracking across disparity sweeps.
//!
//! The disparity range is visited in sweeps of `lane_width` candidates. For
//! every output column a [`MatchState`] carries the best candidate so far,
//! the costs of its two neighbours and the cheapest candidate that is not
//! adjacent to it (the uniqueness competitor) from one sweep to the next.
//!
//! Ties always resolve to the smaller disparity: inside a sweep the reduction
//! prefers the lower lane, and a later sweep only displaces the incumbent
//! with a strictly smaller cost.
//!
//! The competitor bookkeeping is exact for any lane width. When a new best
//! lands on lane 0, the last candidate of the previous sweep becomes its left
//! neighbour, so the state keeps that candidate (`tail_cost`) apart from the
//! minimum over everything older (`head_min`).

use crate::util::math::uniqueness_threshold;

/// Minimum over valid lanes by balanced pairwise reduction.
///
/// Returns `(lane, cost)`; equal costs resolve to the lower lane.
pub fn min_lane(costs: &[u32], valid: &[bool]) -> Option<(usize, u32)> {
    debug_assert_eq!(costs.len(), valid.len());
    reduce(costs, valid, 0)
}

fn reduce(costs: &[u32], valid: &[bool], offset: usize) -> Option<(usize, u32)> {
    match costs.len() {
        0 => None,
        1 => valid[0].then_some((offset, costs[0])),
        n => {
            let mid = n / 2;
            let lo = reduce(&costs[..mid], &valid[..mid], offset);
            let hi = reduce(&costs[mid..], &valid[mid..], offset + mid);
            match (lo, hi) {
                (Some(a), Some(b)) => Some(if b.1 < a.1 { b } else { a }),
                (a, b) => a.or(b),
            }
        }
    }
}

/// Best candidate of a finished column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BestMatch {
    /// Integer disparity of the minimum.
    pub disparity: usize,
    /// SAD at the minimum.
    pub cost: u32,
    /// SAD at `disparity - 1`, if that candidate exists and is valid.
    pub prev_cost: Option<u32>,
    /// SAD at `disparity + 1`, if that candidate exists and is valid.
    pub next_cost: Option<u32>,
    /// Set when a non-adjacent candidate is within the uniqueness margin.
    pub ambiguous: bool,
}

/// Per-column state persisted across sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchState {
    best: Option<(usize, u32)>,
    prev_cost: Option<u32>,
    next_cost: Option<u32>,
    skip: bool,
    skip_cost: u32,
    tail_cost: Option<u32>,
    head_min: u32,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            best: None,
            prev_cost: None,
            next_cost: None,
            skip: false,
            skip_cost: u32::MAX,
            tail_cost: None,
            head_min: u32::MAX,
        }
    }
}

impl MatchState {
    /// Folds one sweep's lane costs into the state.
    ///
    /// `first_disparity` is the disparity of lane 0. Sweep 0 must start from
    /// a default state; the engine resets the state before it.
    pub fn absorb(&mut self, first_disparity: usize, costs: &[u32], valid: &[bool], ratio: u32) {
        let lanes = costs.len();
        let lane_cost = |d: usize| valid[d].then(|| costs[d]);

        match min_lane(costs, valid) {
            Some((lane, cost)) if self.best.map_or(true, |(_, best)| cost < best) => {
                // Everything seen before this sweep is at least two below the
                // new best, except the previous tail when the best is lane 0.
                let mut competitor = if lane == 0 {
                    self.head_min
                } else {
                    self.head_min.min(self.tail_cost.unwrap_or(u32::MAX))
                };
                for d in (0..lanes).filter(|&d| valid[d] && d.abs_diff(lane) > 1) {
                    competitor = competitor.min(costs[d]);
                }

                self.best = Some((first_disparity + lane, cost));
                self.prev_cost = if lane == 0 {
                    self.tail_cost
                } else {
                    lane_cost(lane - 1)
                };
                self.next_cost = if lane + 1 < lanes {
                    lane_cost(lane + 1)
                } else {
                    None
                };
                self.skip_cost = competitor;
            }
            _ => {
                if let Some((best, _)) = self.best {
                    for d in (0..lanes).filter(|&d| valid[d]) {
                        if first_disparity + d == best + 1 {
                            self.next_cost = Some(costs[d]);
                        } else {
                            self.skip_cost = self.skip_cost.min(costs[d]);
                        }
                    }
                }
            }
        }

        let mut head = self.head_min.min(self.tail_cost.unwrap_or(u32::MAX));
        for d in (0..lanes.saturating_sub(1)).filter(|&d| valid[d]) {
            head = head.min(costs[d]);
        }
        self.head_min = head;
        self.tail_cost = lanes.checked_sub(1).and_then(lane_cost);

        self.skip = match self.best {
            Some((_, best)) if ratio > 0 => {
                (self.skip_cost as u64) <= uniqueness_threshold(best, ratio)
            }
            _ => false,
        };
    }

    /// Best disparity and cost so far.
    pub fn best(&self) -> Option<(usize, u32)> {
        self.best
    }

    /// Whether the current best is ambiguous.
    pub fn skip(&self) -> bool {
        self.skip
    }

    /// Cheapest candidate not adjacent to the best, `u32::MAX` if none.
    pub fn skip_cost(&self) -> u32 {
        self.skip_cost
    }

    /// Final result after the last sweep.
    pub fn finish(&self) -> Option<BestMatch> {
        self.best.map(|(disparity, cost)| BestMatch {
            disparity,
            cost,
            prev_cost: self.prev_cost,
            next_cost: self.next_cost,
            ambiguous: self.skip,
        })
    }
}

/// Drives the sweeps of one row and owns the per-column states.
#[derive(Clone, Debug)]
pub struct SweepController {
    lane_width: usize,
    sweeps: usize,
    ratio: u32,
    states: Vec<MatchState>,
}

impl SweepController {
    /// Creates states for `columns` output columns.
    pub fn new(columns: usize, lane_width: usize, num_disparities: usize, ratio: u32) -> Self {
        Self {
            lane_width,
            sweeps: num_disparities.div_ceil(lane_width),
            ratio,
            states: vec![MatchState::default(); columns],
        }
    }

    /// Number of sweeps per row.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Disparity of lane 0 in `sweep`.
    pub fn first_disparity(&self, sweep: usize) -> usize {
        sweep * self.lane_width
    }

    /// Whether `sweep` is the one that finalizes each column.
    pub fn is_final(&self, sweep: usize) -> bool {
        sweep + 1 == self.sweeps
    }

    /// Folds lane costs of `sweep` into column `x`; sweep 0 starts a fresh state.
    pub fn update(&mut self, x: usize, sweep: usize, costs: &[u32], valid: &[bool]) {
        let state = &mut self.states[x];
        if sweep == 0 {
            *state = MatchState::default();
        }
        state.absorb(sweep * self.lane_width, costs, valid, self.ratio);
    }

    /// State of column `x`.
    pub fn state(&self, x: usize) -> &MatchState {
        &self.states[x]
    }
}
