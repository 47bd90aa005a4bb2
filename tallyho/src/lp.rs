//! LP evaluation over convex regions, unions of regions and affine
//! objectives.

use rug::Integer;
use tallyho_core::IntVec;
use tracing::debug;

use crate::aff::AffExpr;
use crate::region::{merge_divs, ConvexRegion, RegionUnion};
use crate::space::align_params;
use crate::tab::{EngineStatus, SimplexEngine, TableauEngine};
use crate::value::RatValue;
use crate::LpError;

/// Direction of optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Knobs for a single solve.
#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    track_denominator: bool,
    want_sample: bool,
}

impl SolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, the optimum is rounded to the nearest integer inside
    /// the feasible direction (up for a minimum, down for a maximum) and
    /// reported with denominator one.
    pub fn track_denominator(mut self, track: bool) -> Self {
        self.track_denominator = track;
        self
    }

    /// Request a feasible point attaining the optimum.
    pub fn want_sample(mut self, want: bool) -> Self {
        self.want_sample = want;
        self
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            track_denominator: true,
            want_sample: false,
        }
    }
}

/// An attained optimum: the normalized fraction `value / denom`, plus a
/// sample point (in `[denominator, numerators..]` form) when one was asked
/// for. For a union the sample comes from the first disjunct attaining the
/// optimum and is expressed over that disjunct's own columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LpOptimum {
    pub value: Integer,
    pub denom: Integer,
    pub sample: Option<IntVec>,
}

/// Outcome of optimizing a linear objective over a region or union.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LpResult {
    Optimal(LpOptimum),
    /// The objective is unbounded in the requested direction on some
    /// disjunct.
    Unbounded,
    /// No disjunct has a feasible point.
    Empty,
}

/// Optimizes linear and affine objectives over convex regions.
///
/// Generic over the [`TableauEngine`] doing the per-region work; the default
/// is [`SimplexEngine`].
#[derive(Clone, Debug, Default)]
pub struct LpEvaluator<E = SimplexEngine> {
    engine: E,
}

impl LpEvaluator<SimplexEngine> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: TableauEngine> LpEvaluator<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Optimizes `(objective · [1, x]) / denom` over one region.
    ///
    /// `objective` is laid out `[constant, params.., dims.., divs..]` and
    /// must cover the region's columns.
    pub fn solve_region(
        &mut self,
        region: &ConvexRegion,
        objective: &IntVec,
        denom: &Integer,
        sense: Sense,
        options: SolveOptions,
    ) -> Result<LpResult, LpError> {
        if objective.size() != region.cols() {
            return Err(LpError::WidthMismatch {
                got: objective.size(),
                expected: region.cols(),
            });
        }
        // A maximum is the negated minimum of the negated objective; with
        // rounding enabled the ceil of the negated minimum lands on the
        // floor of the maximum, as it should.
        let objective = match sense {
            Sense::Minimize => objective.clone(),
            Sense::Maximize => objective.clone().neg(),
        };

        let prepared = self.engine.prepare(region.clone());
        let (status, state) =
            self.engine
                .minimize(&prepared, objective.elements(), denom, options.track_denominator)?;
        match status {
            EngineStatus::Empty => Ok(LpResult::Empty),
            EngineStatus::Unbounded => Ok(LpResult::Unbounded),
            EngineStatus::Optimal { num, den } => {
                let sample = if options.want_sample {
                    Some(self.engine.sample(state)?)
                } else {
                    None
                };
                Ok(LpResult::Optimal(LpOptimum {
                    value: restore_sign(num, sense),
                    denom: den,
                    sample,
                }))
            }
        }
    }

    /// Optimizes `(objective · [1, x]) / denom` over a union of regions.
    ///
    /// `objective` covers the constant, parameter and set-dimension columns
    /// and optionally some div columns; it is zero-padded per disjunct, so
    /// divs the objective does not mention do not contribute. Empty
    /// disjuncts are skipped; a single unbounded disjunct decides the whole
    /// result and stops the scan.
    pub fn solve_region_union(
        &mut self,
        union: &RegionUnion,
        objective: &IntVec,
        denom: &Integer,
        sense: Sense,
        options: SolveOptions,
    ) -> Result<LpResult, LpError> {
        let Some(first) = union.disjuncts().first() else {
            return Ok(LpResult::Empty);
        };
        let declared = first.space().declared_dim();
        let width = 1 + declared + union.max_div_count();
        if objective.size() < 1 + declared || objective.size() > width {
            return Err(LpError::WidthMismatch {
                got: objective.size(),
                expected: 1 + declared,
            });
        }
        let padded = match sense {
            Sense::Minimize => objective.clone().zero_extend(width),
            Sense::Maximize => objective.clone().neg().zero_extend(width),
        };

        let mut best: Option<(Integer, Integer, Option<E::State>)> = None;
        for (idx, region) in union.disjuncts().iter().enumerate() {
            let prepared = self.engine.prepare(region.clone());
            let (status, state) = self.engine.minimize(
                &prepared,
                padded.elements(),
                denom,
                options.track_denominator,
            )?;
            match status {
                EngineStatus::Empty => {
                    debug!(disjunct = idx, "skipping empty disjunct");
                }
                EngineStatus::Unbounded => {
                    debug!(disjunct = idx, "unbounded disjunct decides the union");
                    return Ok(LpResult::Unbounded);
                }
                EngineStatus::Optimal { num, den } => {
                    // Strictly better only, so the first disjunct attaining
                    // the optimum keeps the sample. Denominators are
                    // positive, so cross-multiplication preserves order.
                    let better = match &best {
                        None => true,
                        Some((best_num, best_den, _)) => {
                            let t = Integer::from(&num * best_den) - Integer::from(best_num * &den);
                            t < 0
                        }
                    };
                    if better {
                        let state = options.want_sample.then_some(state);
                        best = Some((num, den, state));
                    }
                }
            }
        }

        match best {
            None => Ok(LpResult::Empty),
            Some((num, den, state)) => {
                let sample = match state {
                    Some(state) => Some(self.engine.sample(state)?),
                    None => None,
                };
                Ok(LpResult::Optimal(LpOptimum {
                    value: restore_sign(num, sense),
                    denom: den,
                    sample,
                }))
            }
        }
    }

    /// The exact optimum of an affine expression over a union, as a
    /// [`RatValue`].
    ///
    /// An empty (or everywhere-infeasible) union yields NaN; an unbounded
    /// one yields the signed infinity matching `sense`. Parameter lists are
    /// aligned by name first, and div lists are unified per disjunct, so the
    /// expression and the union may each carry divs the other does not know.
    pub fn optimal_rational_value(
        &mut self,
        union: &RegionUnion,
        objective: &AffExpr,
        sense: Sense,
    ) -> Result<RatValue, LpError> {
        let Some(first) = union.disjuncts().first() else {
            return Ok(RatValue::NaN);
        };

        // Re-express both sides over a shared parameter list when needed.
        let mut regions: Vec<ConvexRegion>;
        let objective = if first.space().params_match(objective.space()) {
            if !first.space().is_equal(objective.space()) {
                return Err(LpError::SpaceMismatch);
            }
            regions = union.disjuncts().to_vec();
            objective.clone()
        } else {
            let alignment = align_params(first.space(), objective.space())?;
            regions = Vec::with_capacity(union.len());
            for region in union.disjuncts() {
                regions.push(region.align_params(&alignment, alignment.left_inserts())?);
            }
            objective.align_params(&alignment, alignment.right_inserts())?
        };
        let declared = objective.space().declared_dim();

        let mut best: Option<(Integer, Integer)> = None;
        for region in &regions {
            // Unify div lists so the objective's coefficients line up with
            // the region's columns.
            let (region, objective) = if objective.div_count() == 0 && region.div_count() == 0 {
                (region.clone(), objective.clone())
            } else {
                let (merged, exp_region, exp_obj) =
                    merge_divs(region.divs(), objective.divs(), declared)?;
                (
                    region.expand_divs(&merged, &exp_region)?,
                    objective.expand_divs(&merged, &exp_obj)?,
                )
            };

            let mut linear = IntVec::from_elements(objective.linear_coeffs().to_vec());
            if sense == Sense::Maximize {
                linear = linear.neg();
            }
            let denom = objective.denominator().clone();

            let prepared = self.engine.prepare(region);
            let (status, _) =
                self.engine
                    .minimize(&prepared, linear.elements(), &denom, true)?;
            match status {
                EngineStatus::Empty => {}
                EngineStatus::Unbounded => {
                    return Ok(match sense {
                        Sense::Minimize => RatValue::NegInfinity,
                        Sense::Maximize => RatValue::Infinity,
                    });
                }
                EngineStatus::Optimal { num, den } => {
                    let better = match &best {
                        None => true,
                        Some((best_num, best_den)) => {
                            Integer::from(&num * best_den) < Integer::from(best_num * &den)
                        }
                    };
                    if better {
                        best = Some((num, den));
                    }
                }
            }
        }

        Ok(match best {
            None => RatValue::NaN,
            Some((num, den)) => RatValue::from_frac(restore_sign(num, sense), den),
        })
    }

    /// Exact minimum of an affine expression over a union.
    pub fn min_rational_value(
        &mut self,
        union: &RegionUnion,
        objective: &AffExpr,
    ) -> Result<RatValue, LpError> {
        self.optimal_rational_value(union, objective, Sense::Minimize)
    }

    /// Exact maximum of an affine expression over a union.
    pub fn max_rational_value(
        &mut self,
        union: &RegionUnion,
        objective: &AffExpr,
    ) -> Result<RatValue, LpError> {
        self.optimal_rational_value(union, objective, Sense::Maximize)
    }
}

#[inline]
fn restore_sign(num: Integer, sense: Sense) -> Integer {
    match sense {
        Sense::Minimize => num,
        Sense::Maximize => -num,
    }
}
