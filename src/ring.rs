//! Arithmetic in the quotient ring `R_q = Z_q[X]/(X^N+1)`.
//!
//! This module provides [`Polynomial`] and [`PolyVec`], the value types every
//! higher layer (Dilithium, Shamir, the threshold protocol) is built on.
//! Polynomials and vectors are immutable value objects: every operation
//! below returns a fresh value rather than mutating its receiver, the same
//! way `oprf-core` treats its curve points and scalars (`Affine`,
//! `ScalarField`) as `Copy`/immutable throughout.
//!
//! Coefficients are kept normalized to `[0, Q)` at rest; signed
//! representatives in `(-Q/2, Q/2]` are only materialized where a norm is
//! computed.

use rand::Rng;
use zeroize::Zeroize;

use crate::error::RingError;

/// The Dilithium scalar modulus, `q = 8380417`.
pub const Q: i64 = 8_380_417;

/// The polynomial degree / ring dimension.
pub const N: usize = 256;

pub(crate) fn reduce_mod_q(x: i64) -> i64 {
    let r = x % Q;
    if r < 0 { r + Q } else { r }
}

/// Returns the signed representative of `c` in `(-Q/2, Q/2]`.
pub(crate) fn signed_rep(c: i64) -> i64 {
    if c > Q / 2 { c - Q } else { c }
}

/// A single element of `R_q`: `N` coefficients in `[0, Q)`, ordered from the
/// constant term to the degree-`(N-1)` term.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct Polynomial {
    coeffs: [i64; N],
}

impl Polynomial {
    /// The additive identity.
    pub fn zero() -> Self {
        Self { coeffs: [0; N] }
    }

    /// The multiplicative identity (`1` at the constant term).
    pub fn one() -> Self {
        let mut coeffs = [0; N];
        coeffs[0] = 1;
        Self { coeffs }
    }

    /// Builds a polynomial from a coefficient sequence of arbitrary length.
    ///
    /// A sequence longer than `N` is folded back via the negacyclic relation
    /// `X^N = -1`: the coefficient at position `i >= N` is added, with sign
    /// `(-1)^floor(i/N)`, to position `i mod N`. A shorter sequence is
    /// zero-padded.
    pub fn from_coeffs(values: &[i64]) -> Self {
        let mut acc = [0i64; N];
        for (i, &v) in values.iter().enumerate() {
            let fold = i / N;
            let pos = i % N;
            let sign: i64 = if fold % 2 == 0 { 1 } else { -1 };
            acc[pos] += sign * v;
        }
        let mut coeffs = [0i64; N];
        for (dst, src) in coeffs.iter_mut().zip(acc.iter()) {
            *dst = reduce_mod_q(*src);
        }
        Self { coeffs }
    }

    /// Builds a polynomial from wide (`i128`) coefficients, rejecting any
    /// value that does not fit in the `i64` accumulator [`Self::from_coeffs`]
    /// reduces with.
    ///
    /// # Errors
    /// Returns [`RingError::InvalidCoefficient`] if any value is outside
    /// `i64::MIN..=i64::MAX`.
    pub fn try_from_wide_coeffs(values: &[i128]) -> Result<Self, RingError> {
        let mut narrow = Vec::with_capacity(values.len());
        for &v in values {
            let v: i64 = v.try_into().map_err(|_| RingError::InvalidCoefficient)?;
            narrow.push(v);
        }
        Ok(Self::from_coeffs(&narrow))
    }

    /// Draws `N` coefficients independently and uniformly from `[0, bound)`.
    ///
    /// # Panics
    /// Panics if `bound <= 0` or `bound > Q`.
    pub fn random_uniform(bound: i64, rng: &mut impl Rng) -> Self {
        assert!(bound > 0 && bound <= Q, "bound must lie in (0, Q]");
        let mut coeffs = [0i64; N];
        for c in coeffs.iter_mut() {
            *c = rng.gen_range(0..bound);
        }
        Self { coeffs }
    }

    /// Draws `N` coefficients independently and uniformly from the signed
    /// range `[-bound, bound]`, stored in their `[0, Q)` representative.
    pub fn random_signed_uniform(bound: i64, rng: &mut impl Rng) -> Self {
        assert!(bound > 0, "bound must be positive");
        let mut coeffs = [0i64; N];
        for c in coeffs.iter_mut() {
            let v = rng.gen_range(-bound..=bound);
            *c = reduce_mod_q(v);
        }
        Self { coeffs }
    }

    /// Read-only view of the `[0, Q)` coefficients, constant term first.
    pub fn coeffs(&self) -> &[i64; N] {
        &self.coeffs
    }

    /// Signed representatives in `(-Q/2, Q/2]`, constant term first.
    pub fn signed_coeffs(&self) -> [i64; N] {
        let mut out = [0i64; N];
        for (dst, &src) in out.iter_mut().zip(self.coeffs.iter()) {
            *dst = signed_rep(src);
        }
        out
    }

    /// `true` iff every coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Index of the highest-order non-zero coefficient, or `0` for the zero
    /// polynomial.
    pub fn degree(&self) -> usize {
        self.coeffs
            .iter()
            .rposition(|&c| c != 0)
            .unwrap_or(0)
    }

    /// Hamming weight: the number of non-zero coefficients.
    pub fn hamming_weight(&self) -> usize {
        self.coeffs.iter().filter(|&&c| c != 0).count()
    }

    /// Component-wise addition.
    pub fn add(&self, other: &Self) -> Self {
        let mut coeffs = [0i64; N];
        for i in 0..N {
            coeffs[i] = reduce_mod_q(self.coeffs[i] + other.coeffs[i]);
        }
        Self { coeffs }
    }

    /// Component-wise subtraction.
    pub fn sub(&self, other: &Self) -> Self {
        let mut coeffs = [0i64; N];
        for i in 0..N {
            coeffs[i] = reduce_mod_q(self.coeffs[i] - other.coeffs[i]);
        }
        Self { coeffs }
    }

    /// Additive inverse.
    pub fn neg(&self) -> Self {
        let mut coeffs = [0i64; N];
        for i in 0..N {
            coeffs[i] = reduce_mod_q(-self.coeffs[i]);
        }
        Self { coeffs }
    }

    /// Multiplication by an integer scalar.
    pub fn scalar_mul(&self, scalar: i64) -> Self {
        let mut coeffs = [0i64; N];
        for i in 0..N {
            coeffs[i] = reduce_mod_q(self.coeffs[i] * scalar);
        }
        Self { coeffs }
    }

    /// Ring multiplication: schoolbook convolution into a length-`2N-1`
    /// accumulator, folded back via `X^N = -1`. NTT-based
    /// multiplication is a permitted drop-in optimization that does not
    /// change this contract.
    pub fn mul(&self, other: &Self) -> Self {
        let mut wide = [0i64; 2 * N - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in other.coeffs.iter().enumerate() {
                wide[i + j] += a * b;
            }
        }
        let mut folded = [0i64; N];
        for (idx, &v) in wide.iter().enumerate() {
            if idx < N {
                folded[idx] += v;
            } else {
                folded[idx - N] -= v;
            }
        }
        let mut coeffs = [0i64; N];
        for i in 0..N {
            coeffs[i] = reduce_mod_q(folded[i]);
        }
        Self { coeffs }
    }

    /// Infinity norm over signed representatives: `max |c'|` with
    /// `c' = c` if `c <= Q/2` else `c - Q`.
    pub fn norm_infinity(&self) -> i64 {
        self.coeffs
            .iter()
            .map(|&c| signed_rep(c).abs())
            .max()
            .unwrap_or(0)
    }

    /// Squared L2 norm over signed representatives: `sum(c'^2)`. Kept as an
    /// integer (no square root) since every caller only needs it for
    /// relative bound comparisons.
    pub fn norm_l2(&self) -> i64 {
        self.coeffs
            .iter()
            .map(|&c| {
                let s = signed_rep(c);
                s * s
            })
            .sum()
    }
}

impl std::ops::Add for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: Self) -> Polynomial {
        Polynomial::add(self, rhs)
    }
}

impl std::ops::Sub for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Self) -> Polynomial {
        Polynomial::sub(self, rhs)
    }
}

impl std::ops::Neg for &Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        Polynomial::neg(self)
    }
}

impl std::ops::Mul for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Self) -> Polynomial {
        Polynomial::mul(self, rhs)
    }
}

/// A finite, fixed-length sequence of [`Polynomial`]s — a vector over `R_q`.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct PolyVec {
    components: Vec<Polynomial>,
}

impl PolyVec {
    /// Builds a vector from its components.
    pub fn new(components: Vec<Polynomial>) -> Self {
        Self { components }
    }

    /// The all-zero vector of the given length.
    pub fn zero(len: usize) -> Self {
        Self {
            components: (0..len).map(|_| Polynomial::zero()).collect(),
        }
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// `true` iff the vector has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Read-only access to the components.
    pub fn components(&self) -> &[Polynomial] {
        &self.components
    }

    fn require_same_len(&self, other: &Self) -> Result<(), RingError> {
        if self.len() != other.len() {
            return Err(RingError::ShapeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok(())
    }

    /// Component-wise addition.
    ///
    /// # Errors
    /// [`RingError::ShapeMismatch`] if the vectors have different lengths.
    pub fn add(&self, other: &Self) -> Result<Self, RingError> {
        self.require_same_len(other)?;
        Ok(Self {
            components: self
                .components
                .iter()
                .zip(other.components.iter())
                .map(|(a, b)| a.add(b))
                .collect(),
        })
    }

    /// Component-wise subtraction.
    ///
    /// # Errors
    /// [`RingError::ShapeMismatch`] if the vectors have different lengths.
    pub fn sub(&self, other: &Self) -> Result<Self, RingError> {
        self.require_same_len(other)?;
        Ok(Self {
            components: self
                .components
                .iter()
                .zip(other.components.iter())
                .map(|(a, b)| a.sub(b))
                .collect(),
        })
    }

    /// Component-wise multiplication of every component by the same
    /// polynomial (used for e.g. `c * s1`).
    pub fn scale_by_poly(&self, p: &Polynomial) -> Self {
        Self {
            components: self.components.iter().map(|c| c.mul(p)).collect(),
        }
    }

    /// Multiplication by an integer scalar, component-wise.
    pub fn scalar_mul(&self, scalar: i64) -> Self {
        Self {
            components: self.components.iter().map(|c| c.scalar_mul(scalar)).collect(),
        }
    }

    /// Infinity norm: the max over components of each polynomial's infinity
    /// norm.
    pub fn norm_infinity(&self) -> i64 {
        self.components
            .iter()
            .map(|c| c.norm_infinity())
            .max()
            .unwrap_or(0)
    }

    /// `true` iff every component is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.components.iter().all(Polynomial::is_zero)
    }

    /// Squared L2 norm: the sum, over components, of each polynomial's
    /// squared L2 norm.
    pub fn norm_l2(&self) -> i64 {
        self.components.iter().map(Polynomial::norm_l2).sum()
    }
}

/// A `rows x cols` matrix of [`Polynomial`]s over `R_q`, used for the
/// Dilithium public matrix `A`.
#[derive(Clone, Debug)]
pub struct PolyMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<Polynomial>>,
}

impl PolyMatrix {
    /// Builds a matrix from row-major data.
    pub fn new(data: Vec<Vec<Polynomial>>) -> Self {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        Self { rows, cols, data }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> &Polynomial {
        &self.data[row][col]
    }

    /// Matrix-vector product `A * v`, yielding a vector of length
    /// [`Self::rows`].
    ///
    /// # Errors
    /// [`RingError::ShapeMismatch`] if `v.len() != self.cols()`.
    pub fn mul_vec(&self, v: &PolyVec) -> Result<PolyVec, RingError> {
        if v.len() != self.cols {
            return Err(RingError::ShapeMismatch {
                expected: self.cols,
                actual: v.len(),
            });
        }
        let mut out = Vec::with_capacity(self.rows);
        for row in &self.data {
            let mut acc = Polynomial::zero();
            for (a, b) in row.iter().zip(v.components().iter()) {
                acc = acc.add(&a.mul(b));
            }
            out.push(acc);
        }
        Ok(PolyVec::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn constructed_polynomial_has_n_coeffs_in_range() {
        let p = Polynomial::random_uniform(Q, &mut rng());
        assert_eq!(p.coeffs().len(), N);
        assert!(p.coeffs().iter().all(|&c| (0..Q).contains(&c)));
    }

    #[test]
    fn add_neg_is_zero() {
        let p = Polynomial::random_uniform(Q, &mut rng());
        let z = p.add(&p.neg());
        assert!(z.is_zero());
    }

    #[test]
    fn add_zero_is_identity() {
        let p = Polynomial::random_uniform(Q, &mut rng());
        assert_eq!(p.add(&Polynomial::zero()), p);
    }

    #[test]
    fn mul_one_is_identity() {
        let p = Polynomial::random_uniform(Q, &mut rng());
        assert_eq!(p.mul(&Polynomial::one()), p);
    }

    #[test]
    fn norm_infinity_nonnegative_and_zero_for_zero_vector() {
        let v = PolyVec::zero(3);
        assert_eq!(v.norm_infinity(), 0);
        let mut rng = rng();
        let v2 = PolyVec::new((0..3).map(|_| Polynomial::random_uniform(Q, &mut rng)).collect());
        assert!(v2.norm_infinity() >= 0);
    }

    #[test]
    fn norm_l2_nonnegative_and_zero_for_zero_vector() {
        let v = PolyVec::zero(3);
        assert_eq!(v.norm_l2(), 0);
        let mut rng = rng();
        let v2 = PolyVec::new((0..3).map(|_| Polynomial::random_uniform(Q, &mut rng)).collect());
        assert!(v2.norm_l2() >= 0);
    }

    #[test]
    fn norm_l2_matches_manual_sum_of_squares() {
        let p = Polynomial::from_coeffs(&[3, -4, 0, 5]);
        assert_eq!(p.norm_l2(), 3 * 3 + 4 * 4 + 5 * 5);
    }

    #[test]
    fn negacyclic_reduction_matches_manual_fold() {
        // coefficient at position N should fold to position 0 with a sign flip.
        let mut values = vec![0i64; N + 1];
        values[0] = 5;
        values[N] = 7;
        let p = Polynomial::from_coeffs(&values);
        assert_eq!(p.coeffs()[0], reduce_mod_q(5 - 7));
    }

    #[test]
    fn shape_mismatch_on_unequal_length_vectors() {
        let a = PolyVec::zero(2);
        let b = PolyVec::zero(3);
        assert_eq!(
            a.add(&b).unwrap_err(),
            RingError::ShapeMismatch { expected: 2, actual: 3 }
        );
    }

    #[test]
    fn try_from_wide_coeffs_rejects_overflow() {
        let values = vec![i128::MAX];
        assert_eq!(
            Polynomial::try_from_wide_coeffs(&values).unwrap_err(),
            RingError::InvalidCoefficient
        );
    }
}
