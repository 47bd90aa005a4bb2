//! Elementwise helpers over raw runs of exact integers.
//!
//! These operate on plain slices so they can be shared between the vector
//! type and matrix-like row storage without forcing either representation.
//! Length agreement between operands is a caller obligation, checked with
//! `debug_assert`.

use std::cmp::Ordering;

use rug::Integer;

/// Sets every element of `xs` to zero.
pub fn clear(xs: &mut [Integer]) {
    for x in xs {
        *x = Integer::new();
    }
}

/// Sets every element of `xs` to `v`.
pub fn set(xs: &mut [Integer], v: &Integer) {
    for x in xs {
        *x = v.clone();
    }
}

/// Copies `src` into `dst`.
pub fn copy(dst: &mut [Integer], src: &[Integer]) {
    debug_assert_eq!(dst.len(), src.len(), "sequence length mismatch");
    dst.clone_from_slice(src);
}

/// Negates every element of `xs` in place.
pub fn neg(xs: &mut [Integer]) {
    for x in xs {
        // `-` consumes, so go through a temporary take.
        *x = -std::mem::take(x);
    }
}

/// Multiplies every element of `xs` by `m`.
pub fn scale(xs: &mut [Integer], m: &Integer) {
    if *m == 1 {
        return;
    }
    for x in xs {
        *x *= m;
    }
}

/// Computes `dst = m1 * a + m2 * b` elementwise.
pub fn combine(dst: &mut [Integer], m1: &Integer, a: &[Integer], m2: &Integer, b: &[Integer]) {
    debug_assert_eq!(dst.len(), a.len(), "sequence length mismatch");
    debug_assert_eq!(dst.len(), b.len(), "sequence length mismatch");
    for (d, (x, y)) in dst.iter_mut().zip(a.iter().zip(b)) {
        let mut t = Integer::from(m1 * x);
        t += Integer::from(m2 * y);
        *d = t;
    }
}

/// Returns the inner product of `a` and `b`.
pub fn inner_product(a: &[Integer], b: &[Integer]) -> Integer {
    debug_assert_eq!(a.len(), b.len(), "sequence length mismatch");
    let mut acc = Integer::new();
    for (x, y) in a.iter().zip(b) {
        acc += Integer::from(x * y);
    }
    acc
}

/// Returns the (nonnegative) gcd of all elements; zero for an empty run.
pub fn gcd(xs: &[Integer]) -> Integer {
    let mut g = Integer::new();
    for x in xs {
        g.gcd_mut(x);
        if g == 1 {
            break;
        }
    }
    g
}

/// Returns the (nonnegative) lcm of all elements; one for an empty run.
pub fn lcm(xs: &[Integer]) -> Integer {
    let mut l = Integer::from(1);
    for x in xs {
        l.lcm_mut(x);
    }
    l
}

/// Divides all elements through by their common gcd.
///
/// A no-op when the gcd is zero or one.
pub fn normalize(xs: &mut [Integer]) {
    let g = gcd(xs);
    if g <= 1 {
        return;
    }
    for x in xs {
        x.div_exact_mut(&g);
    }
}

/// Replaces every element by its quotient under floor division by `d`.
pub fn fdiv_q(xs: &mut [Integer], d: &Integer) {
    for x in xs {
        let (q, _) = std::mem::take(x).div_rem_floor(d.clone());
        *x = q;
    }
}

/// Replaces every element by its quotient under ceiling division by `d`.
pub fn cdiv_q(xs: &mut [Integer], d: &Integer) {
    for x in xs {
        let (q, _) = std::mem::take(x).div_rem_ceil(d.clone());
        *x = q;
    }
}

/// Replaces every element by its remainder under floor division by `d`.
///
/// The result lies in `[0, d)` for positive `d`.
pub fn fdiv_r(xs: &mut [Integer], d: &Integer) {
    for x in xs {
        let (_, r) = std::mem::take(x).div_rem_floor(d.clone());
        *x = r;
    }
}

/// Structural equality of two equal-length runs.
pub fn eq(a: &[Integer], b: &[Integer]) -> bool {
    a == b
}

/// Lexicographic comparison of two equal-length runs.
pub fn cmp(a: &[Integer], b: &[Integer]) -> Ordering {
    debug_assert_eq!(a.len(), b.len(), "sequence length mismatch");
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Index of the first nonzero element, if any.
pub fn first_non_zero(xs: &[Integer]) -> Option<usize> {
    xs.iter().position(|x| *x != 0)
}
