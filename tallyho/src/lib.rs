//! Exact-arithmetic linear-program evaluation over convex integer regions.
//!
//! The entry point is [`LpEvaluator`]: it optimizes a linear objective over a
//! single [`ConvexRegion`], extends that to unions of regions
//! ([`RegionUnion`]), and produces rational optimum values ([`RatValue`],
//! with infinity and NaN as ordinary outcomes) for affine objectives
//! ([`AffExpr`]). The row-reduction machinery that solves one convex region
//! sits behind the [`TableauEngine`] seam; [`SimplexEngine`] is the default
//! implementation.
//!
//! All arithmetic is exact (`rug`); vector-valued quantities flow through the
//! copy-on-write [`IntVec`] from `tallyho-core`.

pub mod aff;
pub mod lp;
pub mod region;
pub mod space;
pub mod tab;
pub mod value;

pub use aff::AffExpr;
pub use lp::{LpEvaluator, LpOptimum, LpResult, Sense, SolveOptions};
pub use region::{ConvexRegion, RegionUnion};
pub use space::Space;
pub use tab::{EngineStatus, SimplexEngine, TableauEngine};
pub use value::RatValue;

pub use tallyho_core::{IntVec, VecError};

/// Errors reported by the LP evaluation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LpError {
    /// Region and objective live in genuinely different spaces.
    #[error("spaces don't match")]
    SpaceMismatch,
    /// A coefficient row or objective has the wrong width for its space.
    #[error("coefficient vector has {got} elements, expected {expected}")]
    WidthMismatch { got: usize, expected: usize },
    /// An affine objective carried a denominator that is not positive.
    #[error("objective denominator must be positive")]
    NonPositiveDenominator,
    /// The tableau engine produced an optimum but no sample point.
    #[error("sample point unavailable")]
    SampleUnavailable,
    /// The tableau engine reported an internal failure.
    #[error("tableau engine failure: {0}")]
    Engine(String),
    #[error(transparent)]
    Vec(#[from] VecError),
}
