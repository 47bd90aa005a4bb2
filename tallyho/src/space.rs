//! Parameter spaces and name-based parameter alignment.
//!
//! Every coefficient row in this crate uses the column layout
//! `[constant, params.., set dims.., divs..]`; a `Space` fixes the first two
//! blocks. Existential (div) columns are tracked by the owning region or
//! affine expression, not by the space.

use smallvec::SmallVec;

use crate::LpError;

/// Positions produced by [`align_params`]; small in practice.
pub type InsertPositions = SmallVec<[usize; 4]>;

/// An ordered list of named parameters plus a count of set dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Space {
    params: Vec<String>,
    dim: usize,
}

impl Space {
    /// A space with `dim` set dimensions and no parameters.
    pub fn new(dim: usize) -> Self {
        Self {
            params: Vec::new(),
            dim,
        }
    }

    pub fn with_params<S: Into<String>>(params: Vec<S>, dim: usize) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            dim,
        }
    }

    #[inline]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Parameter and set dimensions together (divs are counted elsewhere).
    #[inline]
    pub fn declared_dim(&self) -> usize {
        self.params.len() + self.dim
    }

    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub fn is_equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Whether both spaces declare the same parameters in the same order.
    pub fn params_match(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

/// Result of aligning the parameter lists of two spaces.
///
/// `left_inserts`/`right_inserts` are the indices, in the unified parameter
/// list, where the respective side lacks a parameter and must insert a zero
/// column. Indices are ascending and expressed in final-layout terms, so
/// applying them in order with `insert_zero_elements` is correct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamAlignment {
    space: Space,
    left_inserts: InsertPositions,
    right_inserts: InsertPositions,
}

impl ParamAlignment {
    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn left_inserts(&self) -> &[usize] {
        &self.left_inserts
    }

    pub fn right_inserts(&self) -> &[usize] {
        &self.right_inserts
    }
}

/// Unifies the parameter lists of two spaces over the same set dimensions.
///
/// Parameters are matched by name. The unified list interleaves both sides
/// so that each side's own order is preserved; the shared parameters must
/// appear in the same relative order on both sides, otherwise the spaces
/// genuinely conflict and the call fails.
pub fn align_params(left: &Space, right: &Space) -> Result<ParamAlignment, LpError> {
    if left.dim != right.dim {
        return Err(LpError::SpaceMismatch);
    }

    // Merge the two name lists, preserving each side's relative order. A
    // shared parameter whose match on the right has already been passed over
    // means the orders conflict.
    let mut unified: Vec<String> = Vec::with_capacity(left.params.len() + right.params.len());
    let mut next_right = 0;
    for name in &left.params {
        if let Some(found) = right.params[next_right..].iter().position(|r| r == name) {
            for novel in &right.params[next_right..next_right + found] {
                if left.params.contains(novel) {
                    return Err(LpError::SpaceMismatch);
                }
                unified.push(novel.clone());
            }
            next_right += found + 1;
        }
        unified.push(name.clone());
    }
    for novel in &right.params[next_right..] {
        if left.params.contains(novel) {
            return Err(LpError::SpaceMismatch);
        }
        unified.push(novel.clone());
    }

    let left_inserts = insert_positions(&unified, &left.params)?;
    let right_inserts = insert_positions(&unified, &right.params)?;

    Ok(ParamAlignment {
        space: Space {
            params: unified,
            dim: left.dim,
        },
        left_inserts,
        right_inserts,
    })
}

/// Unified-list indices at which `own` is missing a parameter.
///
/// Fails when `own` is not an in-order subsequence of `unified`.
fn insert_positions(unified: &[String], own: &[String]) -> Result<InsertPositions, LpError> {
    let mut inserts = InsertPositions::new();
    let mut next = 0;
    for (idx, name) in unified.iter().enumerate() {
        if next < own.len() && own[next] == *name {
            next += 1;
        } else {
            inserts.push(idx);
        }
    }
    if next != own.len() {
        // A parameter of `own` appears out of order relative to the union.
        return Err(LpError::SpaceMismatch);
    }
    Ok(inserts)
}
