//! Exact-integer sequence and vector primitives for polyhedral computations.
//!
//! This crate exposes the two layers everything vector-valued in the solver
//! crates is built on:
//! - elementwise helpers over raw runs of `rug::Integer` (`seq`)
//! - a reference-counted, copy-on-write integer vector (`vec`)

pub mod seq;
pub mod vec;

pub use vec::{IntVec, VecError};
