//! The tableau-engine seam and the default exact simplex engine.
//!
//! The LP evaluation layer only ever talks to the row-reduction machinery
//! through [`TableauEngine`]; alternative engines (or instrumented wrappers)
//! plug in behind it.

use rug::{Integer, Rational};
use tallyho_core::IntVec;
use tracing::trace;

use crate::region::ConvexRegion;
use crate::LpError;

/// Outcome of minimizing an objective over one convex region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    /// The minimum is attained; `den > 0` and the fraction is normalized.
    /// When the caller does not track denominators the value is rounded up
    /// to the nearest integer and `den == 1`.
    Optimal { num: Integer, den: Integer },
    /// The objective is unbounded below on the region.
    Unbounded,
    /// The region has no feasible point.
    Empty,
}

/// Contract with the machinery that solves a single convex region.
///
/// `minimize` hands back an opaque `State` retained just long enough to
/// extract a sample point; callers drop it when no sample is wanted.
pub trait TableauEngine {
    type State;

    /// Cheap simplification pass applied before solving; never fails the
    /// overall call and may be a no-op.
    fn prepare(&self, region: ConvexRegion) -> ConvexRegion {
        region
    }

    /// Minimizes `(objective · [1, x]) / denom` over the region.
    ///
    /// `objective` must cover at least `1 + region.total_dim()` elements
    /// (constant term first); surplus entries are ignored.
    fn minimize(
        &mut self,
        region: &ConvexRegion,
        objective: &[Integer],
        denom: &Integer,
        track_denominator: bool,
    ) -> Result<(EngineStatus, Self::State), LpError>;

    /// Extracts a feasible sample point from solver state, in the
    /// rational-point convention `[denominator, numerators..]`.
    fn sample(&self, state: Self::State) -> Result<IntVec, LpError>;
}

/// Solver state of [`SimplexEngine`]; holds the optimal vertex when the
/// solve produced one.
#[derive(Clone, Debug, Default)]
pub struct SimplexState {
    point: Option<Vec<Rational>>,
}

/// Two-phase primal simplex over exact rationals, with Bland's rule.
///
/// Free variables are split into differences of nonnegative pairs; Bland's
/// rule rules out cycling, so no iteration limit is needed.
#[derive(Clone, Debug, Default)]
pub struct SimplexEngine {
    pivots: u64,
}

impl SimplexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total pivot count across all solves, for diagnostics.
    pub fn pivots(&self) -> u64 {
        self.pivots
    }
}

impl TableauEngine for SimplexEngine {
    type State = SimplexState;

    /// Gcd-normalizes every constraint row.
    fn prepare(&self, region: ConvexRegion) -> ConvexRegion {
        region.normalize_rows()
    }

    fn minimize(
        &mut self,
        region: &ConvexRegion,
        objective: &[Integer],
        denom: &Integer,
        track_denominator: bool,
    ) -> Result<(EngineStatus, Self::State), LpError> {
        let cols = region.cols();
        if objective.len() < cols {
            return Err(LpError::WidthMismatch {
                got: objective.len(),
                expected: cols,
            });
        }
        if *denom <= 0 {
            return Err(LpError::NonPositiveDenominator);
        }

        let mut tableau = Tableau::assemble(region);
        match tableau.run_phase_one() {
            PhaseOutcome::Feasible => {}
            PhaseOutcome::Infeasible => {
                self.pivots += tableau.pivots;
                return Ok((EngineStatus::Empty, SimplexState::default()));
            }
        }

        if !tableau.run_phase_two(&objective[1..cols]) {
            self.pivots += tableau.pivots;
            return Ok((EngineStatus::Unbounded, SimplexState::default()));
        }
        self.pivots += tableau.pivots;
        trace!(pivots = tableau.pivots, "simplex solve finished");

        let point = tableau.vertex();
        let mut value = tableau.objective_value();
        value += Rational::from(objective[0].clone());
        value /= Rational::from(denom.clone());

        let (num, den) = if track_denominator {
            value.into_numer_denom()
        } else {
            let (n, d) = value.into_numer_denom();
            let (q, _) = n.div_rem_ceil(d);
            (q, Integer::from(1))
        };
        Ok((
            EngineStatus::Optimal { num, den },
            SimplexState { point: Some(point) },
        ))
    }

    fn sample(&self, state: Self::State) -> Result<IntVec, LpError> {
        let point = state.point.ok_or(LpError::SampleUnavailable)?;
        let mut shared_den = Integer::from(1);
        for coord in &point {
            shared_den.lcm_mut(coord.denom());
        }
        let mut elements = Vec::with_capacity(1 + point.len());
        elements.push(shared_den.clone());
        for coord in &point {
            let mut scale = shared_den.clone();
            scale.div_exact_mut(coord.denom());
            elements.push(Integer::from(coord.numer() * &scale));
        }
        Ok(IntVec::from_elements(elements))
    }
}

/// Dense tableau for the two-phase solve. Row layout: structural columns
/// (`u` block then `v` block), slack columns, artificial columns, rhs.
struct Tableau {
    rows: Vec<Vec<Rational>>,
    cost: Vec<Rational>,
    basis: Vec<usize>,
    ncols: usize,
    structural: usize,
    art_start: usize,
    pivots: u64,
}

enum PhaseOutcome {
    Feasible,
    Infeasible,
}

impl Tableau {
    /// Builds constraint rows with every right-hand side nonnegative; rows
    /// that start without an identity column get an artificial variable.
    fn assemble(region: &ConvexRegion) -> Self {
        let n = region.total_dim();
        let structural = 2 * n;
        let ineq_count = region.inequalities().len();

        // Column counting first: one surplus per inequality, one artificial
        // per equality or per inequality with nonnegative rhs.
        let mut artificial_count = region.equalities().len();
        for row in region.inequalities() {
            if row.elements()[0] <= 0 {
                artificial_count += 1;
            }
        }
        let slack_start = structural;
        let art_start = slack_start + ineq_count;
        let ncols = art_start + artificial_count;

        let mut rows: Vec<Vec<Rational>> = Vec::with_capacity(ineq_count + region.equalities().len());
        let mut basis = Vec::with_capacity(rows.capacity());
        let mut next_slack = slack_start;
        let mut next_art = art_start;

        let mut push_row = |coeffs: &IntVec, is_eq: bool| {
            let mut row = vec![Rational::new(); ncols + 1];
            // b = -a0; split x_i into u_i - v_i.
            let a = coeffs.elements();
            let mut b = -Rational::from(a[0].clone());
            for i in 0..n {
                if a[1 + i] == 0 {
                    continue;
                }
                row[i] = Rational::from(a[1 + i].clone());
                row[n + i] = -Rational::from(a[1 + i].clone());
            }
            let negate = b < 0;
            if negate {
                for el in row.iter_mut() {
                    *el = -std::mem::take(el);
                }
                b = -b;
            }
            row[ncols] = b;

            if is_eq {
                row[next_art] = Rational::from(1);
                basis.push(next_art);
                next_art += 1;
            } else {
                // Surplus for `>= b`; after negation it acts as a slack.
                row[next_slack] = Rational::from(if negate { 1 } else { -1 });
                if negate {
                    basis.push(next_slack);
                } else {
                    row[next_art] = Rational::from(1);
                    basis.push(next_art);
                    next_art += 1;
                }
                next_slack += 1;
            }
            rows.push(row);
        };

        for coeffs in region.equalities() {
            push_row(coeffs, true);
        }
        for coeffs in region.inequalities() {
            push_row(coeffs, false);
        }
        debug_assert_eq!(next_art, ncols, "artificial column accounting");

        Self {
            rows,
            cost: vec![Rational::new(); ncols + 1],
            basis,
            ncols,
            structural,
            art_start,
            pivots: 0,
        }
    }

    /// Installs raw costs and prices out the current basis, leaving reduced
    /// costs in `cost` and the negated objective value in its last slot.
    fn install_costs(&mut self, raw: &[Rational]) {
        debug_assert_eq!(raw.len(), self.ncols);
        self.cost = raw.to_vec();
        self.cost.push(Rational::new());
        for (r, row) in self.rows.iter().enumerate() {
            let cb = raw[self.basis[r]].clone();
            if cb == 0 {
                continue;
            }
            for (el, t) in self.cost.iter_mut().zip(row) {
                *el -= Rational::from(&cb * t);
            }
        }
    }

    /// `-cost[rhs]`, the current objective value.
    fn objective_value(&self) -> Rational {
        -self.cost[self.ncols].clone()
    }

    fn pivot(&mut self, r: usize, j: usize) {
        self.pivots += 1;
        let pivot = self.rows[r][j].clone();
        debug_assert!(pivot != 0, "pivot on zero entry");
        for el in self.rows[r].iter_mut() {
            *el /= &pivot;
        }
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let factor = row[j].clone();
            if factor == 0 {
                continue;
            }
            for (el, p) in row.iter_mut().zip(&pivot_row) {
                *el -= Rational::from(&factor * p);
            }
        }
        let factor = self.cost[j].clone();
        if factor != 0 {
            for (el, p) in self.cost.iter_mut().zip(&pivot_row) {
                *el -= Rational::from(&factor * p);
            }
        }
        self.basis[r] = j;
    }

    /// Minimizes the installed costs with Bland's rule. Returns false when
    /// the objective is unbounded below.
    fn optimize(&mut self) -> bool {
        loop {
            let entering = (0..self.ncols).find(|&j| self.cost[j] < 0);
            let Some(j) = entering else {
                return true;
            };
            let mut leaving: Option<(usize, Rational)> = None;
            for (r, row) in self.rows.iter().enumerate() {
                if row[j] <= 0 {
                    continue;
                }
                let ratio = Rational::from(&row[self.ncols] / &row[j]);
                let better = match &leaving {
                    None => true,
                    Some((best_r, best)) => {
                        ratio < *best || (ratio == *best && self.basis[r] < self.basis[*best_r])
                    }
                };
                if better {
                    leaving = Some((r, ratio));
                }
            }
            let Some((r, _)) = leaving else {
                return false;
            };
            self.pivot(r, j);
        }
    }

    /// Phase one: minimize the sum of artificials, then eliminate them.
    fn run_phase_one(&mut self) -> PhaseOutcome {
        if self.art_start < self.ncols {
            let mut raw = vec![Rational::new(); self.ncols];
            for slot in raw.iter_mut().skip(self.art_start) {
                *slot = Rational::from(1);
            }
            self.install_costs(&raw);
            let bounded = self.optimize();
            debug_assert!(bounded, "phase-one objective is bounded below by zero");
            if self.objective_value() != 0 {
                return PhaseOutcome::Infeasible;
            }
            self.evict_artificials();
        }
        PhaseOutcome::Feasible
    }

    /// Pivots residual basic artificials out (degenerate pivots at rhs 0),
    /// drops redundant rows, then deletes the artificial columns.
    fn evict_artificials(&mut self) {
        for r in 0..self.rows.len() {
            if self.basis[r] < self.art_start {
                continue;
            }
            let candidate = (0..self.art_start).find(|&j| self.rows[r][j] != 0);
            if let Some(j) = candidate {
                self.pivot(r, j);
            }
        }
        let art_start = self.art_start;
        let rhs_ix = self.ncols;
        let mut rows = Vec::with_capacity(self.rows.len());
        let mut basis = Vec::with_capacity(self.basis.len());
        let old_rows = std::mem::take(&mut self.rows);
        let old_basis = std::mem::take(&mut self.basis);
        for (mut row, b) in old_rows.into_iter().zip(old_basis) {
            if b < art_start {
                row.drain(art_start..rhs_ix);
                rows.push(row);
                basis.push(b);
            } else {
                debug_assert!(
                    row[rhs_ix] == 0,
                    "redundant rows carry zero rhs after a feasible phase one"
                );
            }
        }
        self.rows = rows;
        self.basis = basis;
        self.ncols = art_start;
    }

    /// Phase two: minimize `f · x` over the feasible tableau. Returns false
    /// when unbounded.
    fn run_phase_two(&mut self, f: &[Integer]) -> bool {
        let n = self.structural / 2;
        debug_assert_eq!(f.len(), n, "objective width matches region");
        let mut raw = vec![Rational::new(); self.ncols];
        for (i, coeff) in f.iter().enumerate() {
            if *coeff == 0 {
                continue;
            }
            raw[i] = Rational::from(coeff.clone());
            raw[n + i] = -Rational::from(coeff.clone());
        }
        self.install_costs(&raw);
        self.optimize()
    }

    /// The current basic solution, mapped back to the region's variables.
    fn vertex(&self) -> Vec<Rational> {
        let n = self.structural / 2;
        let mut split = vec![Rational::new(); self.structural];
        for (r, &b) in self.basis.iter().enumerate() {
            if b < self.structural {
                split[b] = self.rows[r][self.ncols].clone();
            }
        }
        let mut point = Vec::with_capacity(n);
        for i in 0..n {
            point.push(Rational::from(&split[i] - &split[n + i]));
        }
        point
    }
}
