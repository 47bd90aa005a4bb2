//! A reference-counted, copy-on-write vector of exact integers.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use rug::Integer;

use crate::seq;

/// Errors reported by the bounds-checked [`IntVec`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VecError {
    #[error("position {pos} out of range for vector of size {size}")]
    PositionOutOfRange { pos: usize, size: usize },
    #[error("range {pos}..{pos}+{n} out of bounds for vector of size {size}")]
    RangeOutOfBounds { pos: usize, n: usize, size: usize },
    #[error("vector sizes {left} and {right} do not match")]
    SizeMismatch { left: usize, right: usize },
    #[error("vector has no usable denominator at position 0")]
    MissingDenominator,
}

/// An ordered sequence of exact integers with shared, copy-on-write storage.
///
/// Cloning an `IntVec` shares the backing store and is O(1); the first
/// mutation through any handle privatizes the storage for that handle, so
/// aliases never observe each other's writes. A handle that is the sole
/// owner mutates in place.
///
/// Mutating operations consume their handle and return the updated one, so
/// aliasing mistakes surface as move errors rather than runtime surprises.
///
/// Several operations use the rational-point convention: element 0 is a
/// shared denominator and elements `1..size` are numerators.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct IntVec {
    store: Rc<Vec<Integer>>,
}

impl IntVec {
    /// Creates a vector of `size` zeros.
    pub fn zeros(size: usize) -> Self {
        Self {
            store: Rc::new(vec![Integer::new(); size]),
        }
    }

    /// Creates a vector owning the given elements.
    pub fn from_elements(elements: Vec<Integer>) -> Self {
        Self {
            store: Rc::new(elements),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The elements as a slice. There is no storage beyond the logical size.
    #[inline]
    pub fn elements(&self) -> &[Integer] {
        &self.store
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Integer> {
        self.store.iter()
    }

    /// Whether this handle is the sole owner of its backing store.
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.store) == 1
    }

    /// Whether two handles alias the same backing store.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }

    /// A deep copy with independent storage, regardless of sharing.
    pub fn duplicate(&self) -> Self {
        Self {
            store: Rc::new((*self.store).clone()),
        }
    }

    /// Copy-on-write: returns the privately owned element storage.
    ///
    /// In place when unique, otherwise duplicates first. Every mutating
    /// operation funnels through here.
    fn make_unique(&mut self) -> &mut Vec<Integer> {
        Rc::make_mut(&mut self.store)
    }

    /// Grows the vector to `new_size` if larger; otherwise returns it as is.
    ///
    /// Grown elements are contractually unspecified (currently zero); use
    /// [`IntVec::zero_extend`] when the tail must be zero.
    pub fn extend(mut self, new_size: usize) -> Self {
        if new_size <= self.size() {
            return self;
        }
        self.make_unique().resize(new_size, Integer::new());
        self
    }

    /// Grows the vector to `new_size` if larger, with a guaranteed zero tail.
    pub fn zero_extend(self, new_size: usize) -> Self {
        self.extend(new_size)
    }

    /// Concatenation. A zero-length operand short-circuits: the other
    /// operand's handle is returned unchanged, without copying.
    pub fn concat(mut self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        self.make_unique().extend_from_slice(other.elements());
        self
    }

    pub fn get_element(&self, pos: usize) -> Result<&Integer, VecError> {
        self.store.get(pos).ok_or(VecError::PositionOutOfRange {
            pos,
            size: self.size(),
        })
    }

    pub fn set_element(mut self, pos: usize, value: Integer) -> Result<Self, VecError> {
        if pos >= self.size() {
            return Err(VecError::PositionOutOfRange {
                pos,
                size: self.size(),
            });
        }
        self.make_unique()[pos] = value;
        Ok(self)
    }

    /// Compares the elements of `self` and `other` at `pos`.
    pub fn cmp_element(&self, other: &Self, pos: usize) -> Result<Ordering, VecError> {
        Ok(self.get_element(pos)?.cmp(other.get_element(pos)?))
    }

    /// Least common multiple of all elements (one for an empty vector).
    pub fn lcm(&self) -> Integer {
        seq::lcm(self.elements())
    }

    /// Rounds a rational point up to integers.
    ///
    /// Element 0 is taken as the denominator; every numerator is replaced by
    /// its ceiling quotient and the denominator is reset to one. Fails when
    /// there is no usable denominator (empty vector, or zero at position 0).
    pub fn ceil(mut self) -> Result<Self, VecError> {
        if self.first_element_is_unusable_denominator() {
            return Err(VecError::MissingDenominator);
        }
        let els = self.make_unique();
        let denom = els[0].clone();
        seq::cdiv_q(&mut els[1..], &denom);
        els[0] = Integer::from(1);
        Ok(self)
    }

    fn first_element_is_unusable_denominator(&self) -> bool {
        match self.store.first() {
            None => true,
            Some(d) => *d == 0,
        }
    }

    /// Divides all elements through by their common gcd.
    pub fn normalize(mut self) -> Self {
        if seq::gcd(self.elements()) > 1 {
            seq::normalize(self.make_unique());
        }
        self
    }

    /// Negates every element.
    pub fn neg(mut self) -> Self {
        if seq::first_non_zero(self.elements()).is_some() {
            seq::neg(self.make_unique());
        }
        self
    }

    /// Multiplies every element by `m`.
    pub fn scale(mut self, m: &Integer) -> Self {
        if *m == 1 {
            return self;
        }
        seq::scale(self.make_unique(), m);
        self
    }

    /// Reduces every element modulo `m` (floor convention).
    pub fn fdiv_r(mut self, m: &Integer) -> Self {
        seq::fdiv_r(self.make_unique(), m);
        self
    }

    /// Elementwise sum; the operands must have equal size.
    pub fn add(mut self, other: &Self) -> Result<Self, VecError> {
        if self.size() != other.size() {
            return Err(VecError::SizeMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        let els = self.make_unique();
        for (x, y) in els.iter_mut().zip(other.iter()) {
            *x += y;
        }
        Ok(self)
    }

    /// Sorts the elements by numeric value.
    pub fn sort(mut self) -> Self {
        self.make_unique().sort();
        self
    }

    /// Replaces every element by `v`.
    pub fn set_all(mut self, v: &Integer) -> Self {
        seq::set(self.make_unique(), v);
        self
    }

    /// Replaces every element by zero.
    pub fn clear(mut self) -> Self {
        seq::clear(self.make_unique());
        self
    }

    /// Removes the `n` elements starting at `pos`, shifting the tail left.
    ///
    /// `n == 0` is a no-op that returns the handle unchanged, without copying.
    pub fn drop_elements(mut self, pos: usize, n: usize) -> Result<Self, VecError> {
        if n == 0 {
            return Ok(self);
        }
        if pos + n > self.size() {
            return Err(VecError::RangeOutOfBounds {
                pos,
                n,
                size: self.size(),
            });
        }
        self.make_unique().drain(pos..pos + n);
        Ok(self)
    }

    /// Inserts `n` elements at `pos`, shifting the tail right.
    ///
    /// The gap is zero-filled (the contents are contractually unspecified;
    /// use [`IntVec::insert_zero_elements`] when zeros are required).
    /// `n == 0` is a no-op that returns the handle unchanged, without copying.
    pub fn insert_elements(mut self, pos: usize, n: usize) -> Result<Self, VecError> {
        if n == 0 {
            return Ok(self);
        }
        if pos > self.size() {
            return Err(VecError::PositionOutOfRange {
                pos,
                size: self.size(),
            });
        }
        self.make_unique()
            .splice(pos..pos, std::iter::repeat_with(Integer::new).take(n));
        Ok(self)
    }

    /// Inserts `n` zero elements at `pos`, shifting the tail right.
    pub fn insert_zero_elements(self, pos: usize, n: usize) -> Result<Self, VecError> {
        self.insert_elements(pos, n)
    }
}

impl Default for IntVec {
    /// The empty vector.
    fn default() -> Self {
        Self::zeros(0)
    }
}

impl From<&[i64]> for IntVec {
    fn from(vals: &[i64]) -> Self {
        Self::from_elements(vals.iter().map(|&v| Integer::from(v)).collect())
    }
}

impl<const N: usize> From<[i64; N]> for IntVec {
    fn from(vals: [i64; N]) -> Self {
        Self::from(&vals[..])
    }
}

impl FromIterator<Integer> for IntVec {
    fn from_iter<I: IntoIterator<Item = Integer>>(iter: I) -> Self {
        Self::from_elements(iter.into_iter().collect())
    }
}

impl fmt::Debug for IntVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for IntVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_size() {
        let v = IntVec::zeros(4);
        assert_eq!(v.size(), 4);
        assert!(v.iter().all(|x| *x == 0));
    }

    #[test]
    fn clone_shares_and_mutation_privatizes() {
        let v = IntVec::from([1, 2, 3]);
        let shared = v.clone();
        assert!(v.shares_storage(&shared));
        assert!(!v.is_unique());

        let mutated = shared.set_element(1, Integer::from(9)).unwrap();
        assert!(!v.shares_storage(&mutated));
        assert_eq!(v, IntVec::from([1, 2, 3]));
        assert_eq!(mutated, IntVec::from([1, 9, 3]));
    }

    #[test]
    fn sole_owner_mutates_in_place() {
        let v = IntVec::from([1, 2]);
        assert!(v.is_unique());
        let before = v.elements().as_ptr();
        let v = v.set_element(0, Integer::from(5)).unwrap();
        assert_eq!(v.elements().as_ptr(), before);
    }

    #[test]
    fn concat_short_circuits_empty_operands() {
        let v = IntVec::from([1, 2]);
        let kept = v.clone().concat(IntVec::zeros(0));
        assert!(kept.shares_storage(&v));

        let kept = IntVec::zeros(0).concat(v.clone());
        assert!(kept.shares_storage(&v));

        let joined = IntVec::from([1, 2]).concat(IntVec::from([3]));
        assert_eq!(joined, IntVec::from([1, 2, 3]));
    }

    #[test]
    fn get_and_set_are_bounds_checked() {
        let v = IntVec::from([1]);
        assert_eq!(
            v.get_element(1),
            Err(VecError::PositionOutOfRange { pos: 1, size: 1 })
        );
        assert_eq!(
            v.set_element(3, Integer::from(0)),
            Err(VecError::PositionOutOfRange { pos: 3, size: 1 })
        );
    }

    #[test]
    fn cmp_element_compares_one_position() {
        let a = IntVec::from([1, 5]);
        let b = IntVec::from([1, 3]);
        assert_eq!(a.cmp_element(&b, 0).unwrap(), Ordering::Equal);
        assert_eq!(a.cmp_element(&b, 1).unwrap(), Ordering::Greater);
        assert!(a.cmp_element(&b, 2).is_err());
    }

    #[test]
    fn equality_requires_matching_sizes() {
        assert_ne!(IntVec::from([1, 2]), IntVec::from([1, 2, 0]));
        assert_eq!(IntVec::from([1, 2]), IntVec::from([1, 2]));
    }

    #[test]
    fn ceil_rounds_numerators_and_resets_denominator() {
        // 7/2 and -7/2 round up to 4 and -3.
        let v = IntVec::from([2, 7, -7]).ceil().unwrap();
        assert_eq!(v, IntVec::from([1, 4, -3]));

        assert_eq!(IntVec::zeros(0).ceil(), Err(VecError::MissingDenominator));
        assert_eq!(
            IntVec::from([0, 1]).ceil(),
            Err(VecError::MissingDenominator)
        );
    }

    #[test]
    fn normalize_and_scale_round_trip() {
        let v = IntVec::from([2, -4, 6]).normalize();
        assert_eq!(v, IntVec::from([1, -2, 3]));
        let v = v.scale(&Integer::from(3));
        assert_eq!(v, IntVec::from([3, -6, 9]));
    }

    #[test]
    fn scale_by_one_keeps_sharing() {
        let v = IntVec::from([1, 2]);
        let alias = v.clone();
        let scaled = alias.scale(&Integer::from(1));
        assert!(scaled.shares_storage(&v));
    }

    #[test]
    fn add_requires_equal_sizes() {
        let sum = IntVec::from([1, 2]).add(&IntVec::from([3, 4])).unwrap();
        assert_eq!(sum, IntVec::from([4, 6]));
        assert_eq!(
            IntVec::from([1]).add(&IntVec::from([1, 2])),
            Err(VecError::SizeMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn drop_and_insert_are_bounds_checked() {
        let v = IntVec::from([1, 2, 3, 4]);
        let dropped = v.clone().drop_elements(1, 2).unwrap();
        assert_eq!(dropped, IntVec::from([1, 4]));
        assert!(v.clone().drop_elements(2, 3).is_err());
        assert!(v.clone().insert_elements(5, 1).is_err());

        let inserted = v.clone().insert_zero_elements(2, 2).unwrap();
        assert_eq!(inserted, IntVec::from([1, 2, 0, 0, 3, 4]));
    }

    #[test]
    fn zero_count_splices_do_not_copy() {
        let v = IntVec::from([1, 2]);
        let alias = v.clone();
        let kept = alias.drop_elements(1, 0).unwrap();
        assert!(kept.shares_storage(&v));
        let kept = kept.insert_elements(0, 0).unwrap();
        assert!(kept.shares_storage(&v));
    }

    #[test]
    fn sort_orders_by_numeric_value() {
        let v = IntVec::from([3, -1, 2]).sort();
        assert_eq!(v, IntVec::from([-1, 2, 3]));
    }

    #[test]
    fn fdiv_r_reduces_into_canonical_range() {
        let v = IntVec::from([7, -7, 3]).fdiv_r(&Integer::from(3));
        assert_eq!(v, IntVec::from([1, 2, 0]));
    }

    #[test]
    fn display_is_bracketed() {
        assert_eq!(IntVec::from([1, -2]).to_string(), "[1,-2]");
        assert_eq!(IntVec::zeros(0).to_string(), "[]");
    }
}
