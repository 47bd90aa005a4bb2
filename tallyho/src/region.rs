//! Convex regions (basic sets) and ordered unions of regions.

use rug::Integer;
use smallvec::SmallVec;
use tallyho_core::IntVec;

use crate::space::{ParamAlignment, Space};
use crate::LpError;

/// Expansion map from a region's (or objective's) own div list into a merged
/// div list, as produced by [`merge_divs`].
pub type DivExpansion = SmallVec<[usize; 8]>;

/// A convex region: linear equality/inequality constraints over the columns
/// `[constant, params.., dims.., divs..]`.
///
/// An inequality row `a` constrains `a · [1, x] ≥ 0`, an equality row
/// `a · [1, x] = 0`. Existential (div) variables are appended after the
/// declared dimensions; each div definition row reads
/// `[denom, constant, coeffs..]` and, for positive `denom`, pins the div to
/// `floor((constant + coeffs · x) / denom)`. A zero denominator marks an
/// unknown div, constrained by nothing but the region's own rows.
///
/// Emptiness is not decided syntactically; it is an outcome of optimization.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ConvexRegion {
    space: Space,
    divs: Vec<IntVec>,
    eqs: Vec<IntVec>,
    ineqs: Vec<IntVec>,
}

impl ConvexRegion {
    pub fn new(space: Space) -> Self {
        Self {
            space,
            divs: Vec::new(),
            eqs: Vec::new(),
            ineqs: Vec::new(),
        }
    }

    #[inline]
    pub fn space(&self) -> &Space {
        &self.space
    }

    #[inline]
    pub fn div_count(&self) -> usize {
        self.divs.len()
    }

    /// Parameters, set dimensions and divs together.
    #[inline]
    pub fn total_dim(&self) -> usize {
        self.space.declared_dim() + self.divs.len()
    }

    /// Width of every constraint row: one constant column plus the total
    /// dimension count.
    #[inline]
    pub fn cols(&self) -> usize {
        1 + self.total_dim()
    }

    pub fn divs(&self) -> &[IntVec] {
        &self.divs
    }

    pub fn equalities(&self) -> &[IntVec] {
        &self.eqs
    }

    pub fn inequalities(&self) -> &[IntVec] {
        &self.ineqs
    }

    pub fn push_equality(&mut self, row: IntVec) -> Result<(), LpError> {
        self.check_row(&row)?;
        self.eqs.push(row);
        Ok(())
    }

    pub fn push_inequality(&mut self, row: IntVec) -> Result<(), LpError> {
        self.check_row(&row)?;
        self.ineqs.push(row);
        Ok(())
    }

    fn check_row(&self, row: &IntVec) -> Result<(), LpError> {
        if row.size() != self.cols() {
            return Err(LpError::WidthMismatch {
                got: row.size(),
                expected: self.cols(),
            });
        }
        Ok(())
    }

    /// Appends an existential variable and returns its column index.
    ///
    /// `def` must read `[denom, constant, coeffs..]` over the region's
    /// current columns (it cannot reference the div being added). All
    /// existing rows and div definitions gain a zero column for the new div.
    pub fn add_div(&mut self, def: IntVec) -> Result<usize, LpError> {
        if def.size() != 1 + self.cols() {
            return Err(LpError::WidthMismatch {
                got: def.size(),
                expected: 1 + self.cols(),
            });
        }
        let new_cols = self.cols() + 1;
        for row in self.eqs.iter_mut().chain(self.ineqs.iter_mut()) {
            *row = std::mem::take(row).zero_extend(new_cols);
        }
        for div in self.divs.iter_mut() {
            *div = std::mem::take(div).zero_extend(1 + new_cols);
        }
        self.divs.push(def.zero_extend(1 + new_cols));
        Ok(self.cols() - 1)
    }

    /// Divides every constraint row by its content gcd. The feasible set is
    /// unchanged; rows stay integral.
    pub fn normalize_rows(mut self) -> Self {
        for row in self.eqs.iter_mut().chain(self.ineqs.iter_mut()) {
            *row = std::mem::take(row).normalize();
        }
        self
    }

    /// Re-expresses the region over a unified parameter list by inserting
    /// zero columns at the given parameter positions.
    pub fn align_params(&self, alignment: &ParamAlignment, own_inserts: &[usize]) -> Result<Self, LpError> {
        let mut out = Self::new(alignment.space().clone());
        for row in &self.eqs {
            out.eqs.push(insert_param_cols(row.clone(), own_inserts, 1)?);
        }
        for row in &self.ineqs {
            out.ineqs
                .push(insert_param_cols(row.clone(), own_inserts, 1)?);
        }
        for div in &self.divs {
            out.divs.push(insert_param_cols(div.clone(), own_inserts, 2)?);
        }
        Ok(out)
    }

    /// Re-expresses the region over a merged div list.
    ///
    /// `merged` holds the definitions over the widened columns and `exp`
    /// maps each of this region's divs to its merged index. Divs new to this
    /// region gain the two floor-definition inequalities when their
    /// definition is known.
    pub fn expand_divs(&self, merged: &[IntVec], exp: &DivExpansion) -> Result<Self, LpError> {
        debug_assert_eq!(exp.len(), self.divs.len(), "expansion map width mismatch");
        let declared = self.space.declared_dim();
        let old_cols = self.cols();
        let new_cols = 1 + declared + merged.len();

        let widen = |row: &IntVec| -> Result<IntVec, LpError> {
            let mut out = IntVec::zeros(new_cols);
            for col in 0..=declared {
                out = out.set_element(col, row.get_element(col)?.clone())?;
            }
            for (old_div, &new_div) in exp.iter().enumerate() {
                let coeff = row.get_element(1 + declared + old_div)?.clone();
                out = out.set_element(1 + declared + new_div, coeff)?;
            }
            Ok(out)
        };

        let mut out = Self::new(self.space.clone());
        out.divs = merged.to_vec();
        for row in &self.eqs {
            debug_assert_eq!(row.size(), old_cols);
            out.eqs.push(widen(row)?);
        }
        for row in &self.ineqs {
            out.ineqs.push(widen(row)?);
        }

        let known: Vec<bool> = (0..merged.len())
            .map(|idx| exp.contains(&idx))
            .collect();
        for (idx, def) in merged.iter().enumerate() {
            if known[idx] {
                continue;
            }
            for row in div_constraints(def, idx, declared, new_cols)? {
                out.ineqs.push(row);
            }
        }
        Ok(out)
    }
}

/// Inserts zero columns for novel parameters; `offset` is the column of the
/// first parameter (1 for constraint rows, 2 for div definitions).
fn insert_param_cols(row: IntVec, inserts: &[usize], offset: usize) -> Result<IntVec, LpError> {
    let mut row = row;
    for &pos in inserts {
        row = row.insert_zero_elements(offset + pos, 1)?;
    }
    Ok(row)
}

/// The two inequalities pinning div `idx` to its floor definition:
/// `e(x) - d·q ≥ 0` and `d·q + d - 1 - e(x) ≥ 0`. Unknown divs (zero
/// denominator) produce no constraints.
fn div_constraints(
    def: &IntVec,
    idx: usize,
    declared: usize,
    cols: usize,
) -> Result<Vec<IntVec>, LpError> {
    let denom = def.get_element(0)?.clone();
    if denom == 0 {
        return Ok(Vec::new());
    }
    debug_assert!(denom > 0, "div denominators are positive by construction");

    let div_col = 1 + declared + idx;
    let mut lower = IntVec::zeros(cols);
    for col in 0..cols {
        lower = lower.set_element(col, def.get_element(1 + col)?.clone())?;
    }
    let mut upper = lower.clone().neg();
    lower = lower.set_element(div_col, -denom.clone())?;

    let upper_div = Integer::from(upper.get_element(div_col)? + &denom);
    upper = upper.set_element(div_col, upper_div)?;
    let upper_cst = Integer::from(upper.get_element(0)? + &denom) - 1;
    upper = upper.set_element(0, upper_cst)?;
    Ok(vec![lower, upper])
}

/// Merges two div-definition lists into a common list.
///
/// Definitions are unified by structural equality; only self-contained
/// definitions (no coefficients on other divs) unify, and unknown divs
/// (zero denominator) never do. Returns the merged definitions over the
/// widened columns plus the expansion map for each side.
pub fn merge_divs(
    left: &[IntVec],
    right: &[IntVec],
    declared: usize,
) -> Result<(Vec<IntVec>, DivExpansion, DivExpansion), LpError> {
    let merged_count = left.len() + right.len();
    let merged_cols = 2 + declared + merged_count;
    let head = 2 + declared;

    // [denom, constant, params+dims..] prefix, or None when the definition
    // is unknown or references other divs and cannot be compared
    // structurally.
    let prefix = |def: &IntVec| -> Option<Vec<Integer>> {
        if *def.get_element(0).ok()? == 0 {
            return None;
        }
        if def.elements()[head.min(def.size())..].iter().any(|c| *c != 0) {
            return None;
        }
        Some(def.elements()[..head.min(def.size())].to_vec())
    };

    let mut merged: Vec<IntVec> = Vec::with_capacity(merged_count);
    let mut exp_left = DivExpansion::new();
    let mut exp_right = DivExpansion::new();

    // Left divs keep their positions, so zero-extension preserves the
    // meaning of their div-coefficient columns.
    for def in left {
        exp_left.push(merged.len());
        merged.push(def.clone().zero_extend(merged_cols));
    }
    let left_prefixes: Vec<Option<Vec<Integer>>> = left.iter().map(&prefix).collect();

    for def in right {
        let candidate = prefix(def);
        let matched = candidate
            .as_ref()
            .and_then(|c| left_prefixes.iter().position(|p| p.as_ref() == Some(c)));
        match matched {
            Some(idx) => exp_right.push(idx),
            None => {
                // Div coefficients move to the columns of the divs they now
                // refer to; definitions never reference later divs.
                let mut remapped = IntVec::zeros(merged_cols);
                for col in 0..head.min(def.size()) {
                    remapped = remapped.set_element(col, def.get_element(col)?.clone())?;
                }
                for (ref_div, &new_idx) in exp_right.iter().enumerate() {
                    let col = head + ref_div;
                    if col < def.size() {
                        remapped =
                            remapped.set_element(head + new_idx, def.get_element(col)?.clone())?;
                    }
                }
                exp_right.push(merged.len());
                merged.push(remapped);
            }
        }
    }

    // Trim to the width implied by the final merged count.
    let final_cols = 2 + declared + merged.len();
    if final_cols < merged_cols {
        let surplus = merged_cols - final_cols;
        for def in merged.iter_mut() {
            *def = std::mem::take(def).drop_elements(final_cols, surplus)?;
        }
    }
    Ok((merged, exp_left, exp_right))
}

/// An ordered union of convex regions over a single space.
///
/// Order carries no meaning for the optimum itself but is preserved for
/// result selection: fold-style aggregation keeps the first disjunct that
/// attains the running best value.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegionUnion {
    disjuncts: Vec<ConvexRegion>,
}

impl RegionUnion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_disjuncts(disjuncts: Vec<ConvexRegion>) -> Result<Self, LpError> {
        let mut union = Self::new();
        for region in disjuncts {
            union.push(region)?;
        }
        Ok(union)
    }

    /// Appends a disjunct; all disjuncts must share one space.
    pub fn push(&mut self, region: ConvexRegion) -> Result<(), LpError> {
        if let Some(first) = self.disjuncts.first() {
            if !first.space().is_equal(region.space()) {
                return Err(LpError::SpaceMismatch);
            }
        }
        self.disjuncts.push(region);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.disjuncts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.disjuncts.is_empty()
    }

    pub fn disjuncts(&self) -> &[ConvexRegion] {
        &self.disjuncts
    }

    /// The largest div count over all disjuncts; zero for an empty union.
    pub fn max_div_count(&self) -> usize {
        self.disjuncts
            .iter()
            .map(ConvexRegion::div_count)
            .max()
            .unwrap_or(0)
    }
}
