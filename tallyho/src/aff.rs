//! Affine objectives over a parameter space.

use rug::Integer;
use tallyho_core::IntVec;

use crate::region::DivExpansion;
use crate::space::{ParamAlignment, Space};
use crate::LpError;

/// An affine expression `(coeffs · [1, x]) / denominator`.
///
/// The coefficient vector is laid out
/// `[denominator, constant, params.., dims.., divs..]`; the denominator is
/// always positive. Existential (div) variables mirror the region-side
/// convention: definitions read `[denom, constant, coeffs..]` over the
/// expression's own columns.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AffExpr {
    space: Space,
    divs: Vec<IntVec>,
    coeffs: IntVec,
}

impl AffExpr {
    /// Builds an expression without divs; `coeffs` must be
    /// `[denominator, constant, params.., dims..]`.
    pub fn new(space: Space, coeffs: IntVec) -> Result<Self, LpError> {
        let expected = 2 + space.declared_dim();
        if coeffs.size() != expected {
            return Err(LpError::WidthMismatch {
                got: coeffs.size(),
                expected,
            });
        }
        if *coeffs.get_element(0)? <= 0 {
            return Err(LpError::NonPositiveDenominator);
        }
        Ok(Self {
            space,
            divs: Vec::new(),
            coeffs,
        })
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

    pub fn divs(&self) -> &[IntVec] {
        &self.divs
    }

    pub fn denominator(&self) -> &Integer {
        &self.coeffs.elements()[0]
    }

    /// The `[constant, params.., dims.., divs..]` coefficient run the LP
    /// layer consumes.
    pub fn linear_coeffs(&self) -> &[Integer] {
        &self.coeffs.elements()[1..]
    }

    pub fn coeffs(&self) -> &IntVec {
        &self.coeffs
    }

    /// Appends an existential variable with coefficient `coeff`; `def` must
    /// read `[denom, constant, coeffs..]` over the current columns.
    pub fn add_div(&mut self, def: IntVec, coeff: Integer) -> Result<usize, LpError> {
        let expected = self.coeffs.size();
        if def.size() != expected {
            return Err(LpError::WidthMismatch {
                got: def.size(),
                expected,
            });
        }
        let new_width = self.coeffs.size() + 1;
        for div in self.divs.iter_mut() {
            *div = std::mem::take(div).zero_extend(new_width);
        }
        self.divs.push(def.zero_extend(new_width));
        self.coeffs = std::mem::take(&mut self.coeffs)
            .zero_extend(new_width)
            .set_element(new_width - 1, coeff)?;
        Ok(self.divs.len() - 1)
    }

    /// Re-expresses the objective over a unified parameter list.
    pub fn align_params(
        &self,
        alignment: &ParamAlignment,
        own_inserts: &[usize],
    ) -> Result<Self, LpError> {
        let mut coeffs = self.coeffs.clone();
        for &pos in own_inserts {
            coeffs = coeffs.insert_zero_elements(2 + pos, 1)?;
        }
        let mut divs = Vec::with_capacity(self.divs.len());
        for div in &self.divs {
            let mut widened = div.clone();
            for &pos in own_inserts {
                widened = widened.insert_zero_elements(2 + pos, 1)?;
            }
            divs.push(widened);
        }
        Ok(Self {
            space: alignment.space().clone(),
            divs,
            coeffs,
        })
    }

    /// Re-expresses the objective over a merged div list, inserting zero
    /// coefficients for divs it did not originally mention.
    pub fn expand_divs(&self, merged: &[IntVec], exp: &DivExpansion) -> Result<Self, LpError> {
        debug_assert_eq!(exp.len(), self.divs.len(), "expansion map width mismatch");
        let head = 2 + self.space.declared_dim();
        let mut coeffs = IntVec::zeros(head + merged.len());
        for col in 0..head {
            coeffs = coeffs.set_element(col, self.coeffs.get_element(col)?.clone())?;
        }
        for (old_div, &new_div) in exp.iter().enumerate() {
            let coeff = self.coeffs.get_element(head + old_div)?.clone();
            coeffs = coeffs.set_element(head + new_div, coeff)?;
        }
        Ok(Self {
            space: self.space.clone(),
            divs: merged.to_vec(),
            coeffs,
        })
    }
}
