//! Adapted (coordinate-wise) Shamir secret sharing over `Z_q`.
//!
//! Rather than sharing a single secret, [`AdaptedShamir`] shares a whole
//! [`PolyVec`] by running one independent degree-`(t-1)` Shamir polynomial
//! over *each scalar coefficient of each component polynomial*. This mirrors
//! the shape of `oprf-core`'s own Shamir/Lagrange helpers
//! (`keygen.rs` and `ddlog_equality/shamir.rs`: `evaluate_poly`,
//! `lagrange_from_coeff`, `single_lagrange_from_coeff`), generalized from a
//! single scalar field element to a whole lattice secret vector.

use std::collections::HashSet;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use zeroize::ZeroizeOnDrop;

use crate::error::ShamirError;
use crate::ring::{N, PolyVec, Polynomial, Q, reduce_mod_q};

/// Largest number of participants a scheme may be configured with.
pub const MAX_PARTICIPANTS: u8 = 255;

/// Smallest threshold a scheme may be configured with.
pub const MIN_THRESHOLD: u8 = 2;

/// Evaluates a polynomial (constant term first) at `x` mod `q`, via
/// Horner's rule.
pub(crate) fn evaluate_poly(coeffs: &[i64], x: i64) -> i64 {
    let mut acc = 0i64;
    for &c in coeffs.iter().rev() {
        acc = reduce_mod_q(acc * x + c);
    }
    acc
}

fn mod_inverse(a: i64, m: i64) -> Option<i64> {
    let (mut old_r, mut r) = (a.rem_euclid(m), m);
    let (mut old_s, mut s) = (1i64, 0i64);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 { None } else { Some(old_s.rem_euclid(m)) }
}

/// Lagrange coefficients `L_i(0)` for every `x_i` in `xs`, i.e. the weights
/// that reconstruct `f(0)` from `{(x_i, f(x_i))}`.
///
/// # Errors
/// [`ShamirError::NoModularInverse`] if two evaluation points collide mod
/// `q` (unreachable for the distinct small integers this crate uses as
/// participant ids).
pub(crate) fn lagrange_from_coeff(xs: &[i64]) -> Result<Vec<i64>, ShamirError> {
    xs.iter()
        .map(|&xi| single_lagrange_from_coeff(xi, xs))
        .collect()
}

/// Lagrange coefficient `L_i(0)` for a single `xi` given the full set of
/// participating evaluation points.
pub(crate) fn single_lagrange_from_coeff(xi: i64, xs: &[i64]) -> Result<i64, ShamirError> {
    lagrange_weight_at(xi, xs, 0)
}

/// Lagrange weight `L_i(target)` for a single `xi`, generalizing
/// [`single_lagrange_from_coeff`] (which fixes `target = 0`) to an
/// arbitrary evaluation point. Used in tests to check interpolation against
/// known points.
fn lagrange_weight_at(xi: i64, xs: &[i64], target: i64) -> Result<i64, ShamirError> {
    let mut num = 1i64;
    let mut den = 1i64;
    for &xj in xs {
        if xj == xi {
            continue;
        }
        num = reduce_mod_q(num * reduce_mod_q(target - xj));
        den = reduce_mod_q(den * reduce_mod_q(xi - xj));
    }
    let inv = mod_inverse(den, Q).ok_or(ShamirError::NoModularInverse)?;
    Ok(reduce_mod_q(num * inv))
}

/// Lagrange-combines `points` — pairs of `(x_i, vector_i)` — at `x = 0`,
/// restricted to `indices` (or every component if `None`).
///
/// This is the reconstruction arithmetic [`AdaptedShamir::reconstruct`] runs
/// against `ShamirShare`s; [`crate::threshold`] reuses it directly against
/// the `z_partial` vectors carried by `PartialSignature`, since a Dilithium
/// partial response interpolates by exactly the same linear combination as a
/// secret share does.
///
/// # Errors
/// [`ShamirError::ShapeMismatch`] if the vectors disagree in length.
pub(crate) fn lagrange_combine(
    points: &[(i64, &PolyVec)],
    indices: Option<&[usize]>,
) -> Result<PolyVec, ShamirError> {
    let l = points[0].1.len();
    for &(_, v) in points.iter().skip(1) {
        if v.len() != l {
            return Err(crate::error::RingError::ShapeMismatch {
                expected: l,
                actual: v.len(),
            }
            .into());
        }
    }

    let xs: Vec<i64> = points.iter().map(|&(x, _)| x).collect();
    let lagrange = lagrange_from_coeff(&xs)?;

    let poly_indices: Vec<usize> = match indices {
        Some(idx) => idx.to_vec(),
        None => (0..l).collect(),
    };

    let mut components = Vec::with_capacity(poly_indices.len());
    for &p in &poly_indices {
        let mut out = [0i64; N];
        for c in 0..N {
            let mut acc = 0i64;
            for (&(_, v), &coeff) in points.iter().zip(lagrange.iter()) {
                let y = v.components()[p].coeffs()[c];
                acc = reduce_mod_q(acc + y * coeff);
            }
            out[c] = acc;
        }
        components.push(Polynomial::from_coeffs(&out));
    }
    Ok(PolyVec::new(components))
}

/// One participant's share of a secret [`PolyVec`].
///
/// Not `Clone`/`Debug` outside tests: `vector` is a literal share of a
/// Dilithium secret component, zeroized on drop.
#[derive(ZeroizeOnDrop, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct ShamirShare {
    #[zeroize(skip)]
    participant_id: u8,
    vector: PolyVec,
}

impl ShamirShare {
    /// The Shamir evaluation point `x_i` (1-based, unique per participant).
    pub fn participant_id(&self) -> u8 {
        self.participant_id
    }

    /// The share's polynomial vector.
    pub fn vector(&self) -> &PolyVec {
        &self.vector
    }
}

/// A `(t, n)` adapted-Shamir scheme instance.
///
/// `coeff_bound`, when set, restricts the non-constant coefficients of each
/// per-coordinate sharing polynomial to a narrow signed range instead of
/// full `Z_q`, keeping threshold-signature partial responses within the
/// Dilithium rejection bound. `None` is the information-theoretically
/// correct construction.
#[derive(Debug, Clone, Copy)]
pub struct AdaptedShamir {
    t: u8,
    n: u8,
    coeff_bound: Option<(i64, i64)>,
}

impl AdaptedShamir {
    /// Builds a scheme with full-`Z_q` non-constant coefficients.
    ///
    /// # Errors
    /// [`ShamirError::InvalidConfig`] unless `2 <= t <= n <= 255`.
    pub fn new(t: u8, n: u8) -> Result<Self, ShamirError> {
        Self::with_coeff_bound(t, n, None)
    }

    /// Builds a scheme whose non-constant coefficients are drawn from
    /// `[low, high]` (magnitude) with a random sign, approximately
    /// `[50, gamma1/32]`. Used by [`crate::threshold::ThresholdScheme`]
    /// when sharing the Dilithium secret vectors.
    pub fn with_bounded_coefficients(t: u8, n: u8, low: i64, high: i64) -> Result<Self, ShamirError> {
        Self::with_coeff_bound(t, n, Some((low, high)))
    }

    fn with_coeff_bound(t: u8, n: u8, coeff_bound: Option<(i64, i64)>) -> Result<Self, ShamirError> {
        if t < MIN_THRESHOLD || t > n || n > MAX_PARTICIPANTS {
            return Err(ShamirError::InvalidConfig { t, n });
        }
        Ok(Self { t, n, coeff_bound })
    }

    /// The reconstruction threshold.
    pub fn threshold(&self) -> u8 {
        self.t
    }

    /// The number of participants.
    pub fn participants(&self) -> u8 {
        self.n
    }

    fn sample_nonconstant_coeff(&self, rng: &mut impl Rng) -> i64 {
        match self.coeff_bound {
            None => rng.gen_range(0..Q),
            Some((low, high)) => {
                let magnitude = rng.gen_range(low..=high);
                let sign: i64 = if rng.gen_bool(0.5) { 1 } else { -1 };
                reduce_mod_q(sign * magnitude)
            }
        }
    }

    fn deterministic_nonconstant_coeff(&self, seed: &[u8; 32], p: usize, c: usize, j: usize) -> i64 {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update((p as u32).to_le_bytes());
        hasher.update((c as u32).to_le_bytes());
        hasher.update((j as u32).to_le_bytes());
        let digest = hasher.finalize();
        let mut rng = ChaCha20Rng::from_seed(digest.into());
        match self.coeff_bound {
            None => rng.gen_range(0..Q),
            Some((low, high)) => {
                let magnitude = rng.gen_range(low..=high);
                let sign: i64 = if rng.next_u32() & 1 == 0 { 1 } else { -1 };
                reduce_mod_q(sign * magnitude)
            }
        }
    }

    /// Splits `secret` into `n` shares using freshly-drawn randomness.
    pub fn split(&self, secret: &PolyVec, rng: &mut impl Rng) -> Vec<ShamirShare> {
        tracing::debug!(t = self.t, n = self.n, "splitting secret into shares");
        let shares = self.split_with(
            secret,
            |_p, _c, _j, rng| self.sample_nonconstant_coeff(rng),
            rng,
        );
        tracing::trace!(shares = shares.len(), "split complete");
        shares
    }

    /// Splits `secret` into `n` shares deterministically from `seed`:
    /// coefficient `j` of the `(p, c)` sharing polynomial is drawn from
    /// `SHA-256(seed ‖ p ‖ c ‖ j)`.
    pub fn split_deterministic(&self, secret: &PolyVec, seed: &[u8; 32]) -> Vec<ShamirShare> {
        tracing::debug!(t = self.t, n = self.n, "splitting secret into shares deterministically");
        let mut unused_rng = rand_chacha::ChaCha20Rng::from_seed([0u8; 32]);
        let shares = self.split_with(
            secret,
            |p, c, j, _rng| self.deterministic_nonconstant_coeff(seed, p, c, j),
            &mut unused_rng,
        );
        tracing::trace!(shares = shares.len(), "deterministic split complete");
        shares
    }

    fn split_with(
        &self,
        secret: &PolyVec,
        mut nonconstant_coeff: impl FnMut(usize, usize, usize, &mut dyn RngCore) -> i64,
        rng: &mut impl Rng,
    ) -> Vec<ShamirShare> {
        let l = secret.len();
        let degree = (self.t - 1) as usize;
        // share_coeffs[i][p] holds the N coefficients participant i receives
        // for polynomial component p.
        let mut share_coeffs: Vec<Vec<[i64; N]>> =
            vec![vec![[0i64; N]; l]; self.n as usize];

        for (p, poly) in secret.components().iter().enumerate() {
            let secret_coeffs = poly.coeffs();
            for c in 0..N {
                let mut f = Vec::with_capacity(degree + 1);
                f.push(secret_coeffs[c]);
                for j in 1..=degree {
                    f.push(nonconstant_coeff(p, c, j, rng));
                }
                for (idx, share) in share_coeffs.iter_mut().enumerate() {
                    let x = (idx + 1) as i64;
                    share[p][c] = evaluate_poly(&f, x);
                }
            }
        }

        share_coeffs
            .into_iter()
            .enumerate()
            .map(|(idx, per_poly)| ShamirShare {
                participant_id: (idx + 1) as u8,
                vector: PolyVec::new(
                    per_poly.iter().map(|c| Polynomial::from_coeffs(c)).collect(),
                ),
            })
            .collect()
    }

    /// Reconstructs the full secret from `>= t` shares.
    ///
    /// # Errors
    /// [`ShamirError::InsufficientShares`] if fewer than `t` shares are
    /// given; [`ShamirError::ShapeMismatch`] if the shares disagree in
    /// vector length.
    pub fn reconstruct(&self, shares: &[ShamirShare]) -> Result<PolyVec, ShamirError> {
        tracing::debug!(shares = shares.len(), "reconstructing secret from shares");
        let secret = self.reconstruct_indices(shares, None)?;
        tracing::trace!("reconstruction complete");
        Ok(secret)
    }

    /// Reconstructs only the polynomial components at `indices`.
    pub fn partial_reconstruct(
        &self,
        shares: &[ShamirShare],
        indices: &[usize],
    ) -> Result<PolyVec, ShamirError> {
        tracing::debug!(
            shares = shares.len(),
            indices = indices.len(),
            "partially reconstructing secret from shares"
        );
        let secret = self.reconstruct_indices(shares, Some(indices))?;
        tracing::trace!("partial reconstruction complete");
        Ok(secret)
    }

    fn reconstruct_indices(
        &self,
        shares: &[ShamirShare],
        indices: Option<&[usize]>,
    ) -> Result<PolyVec, ShamirError> {
        if shares.len() < self.t as usize {
            return Err(ShamirError::InsufficientShares {
                needed: self.t as usize,
                got: shares.len(),
            });
        }
        let used = &shares[0..self.t as usize];
        let points: Vec<(i64, &PolyVec)> = used
            .iter()
            .map(|s| (s.participant_id as i64, &s.vector))
            .collect();
        lagrange_combine(&points, indices)
    }

    /// Checks share consistency:
    /// pairwise-distinct ids in `[1, n]`, equal vector length, and at
    /// least two shares present.
    pub fn verify_shares(&self, shares: &[ShamirShare]) -> bool {
        if shares.len() < 2 {
            return false;
        }
        let mut ids = HashSet::new();
        for share in shares {
            if share.participant_id == 0 || share.participant_id > self.n {
                return false;
            }
            if !ids.insert(share.participant_id) {
                return false;
            }
        }
        let expected_len = shares[0].vector.len();
        shares.iter().all(|s| s.vector.len() == expected_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::SeedableRng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(1)
    }

    fn secret_vector(values: &[&[i64]]) -> PolyVec {
        PolyVec::new(values.iter().map(|v| Polynomial::from_coeffs(v)).collect())
    }

    fn roundtrip(t: u8, n: u8, secret: &PolyVec) {
        let shamir = AdaptedShamir::new(t, n).unwrap();
        let mut rng = rng();
        let shares = shamir.split(secret, &mut rng);
        assert_eq!(shares.len(), n as usize);

        // every subset of size t reconstructs the original secret
        for subset in (1..=n).combinations(t as usize) {
            let picked: Vec<_> = subset
                .iter()
                .map(|id| shares[*id as usize - 1].clone())
                .collect();
            let reconstructed = shamir.reconstruct(&picked).unwrap();
            assert_eq!(&reconstructed, secret);
        }
    }

    #[test]
    fn round_trip_small_vector() {
        let secret = secret_vector(&[&[1, 2, 3, 4, 5], &[10, 20, 30, 40, 50]]);
        roundtrip(2, 2, &secret);
    }

    #[test]
    fn round_trip_various_t_n() {
        for (t, n) in [(2u8, 3u8), (3, 5), (2, 5), (4, 7)] {
            let secret = secret_vector(&[&[7, 8, 9]]);
            roundtrip(t, n, &secret);
        }
    }

    #[test]
    fn round_trip_zero_vector() {
        let shamir = AdaptedShamir::new(3, 5).unwrap();
        let secret = PolyVec::zero(2);
        let mut rng = rng();
        let shares = shamir.split(&secret, &mut rng);
        let reconstructed = shamir.reconstruct(&shares[0..3]).unwrap();
        assert!(reconstructed.is_zero());
    }

    #[test]
    fn partial_reconstruct_matches_full() {
        let shamir = AdaptedShamir::new(3, 5).unwrap();
        let secret = secret_vector(&[&[1, 2], &[3, 4], &[5, 6]]);
        let mut rng = rng();
        let shares = shamir.split(&secret, &mut rng);
        let partial = shamir.partial_reconstruct(&shares[0..3], &[0, 2]).unwrap();
        assert_eq!(partial.components()[0], secret.components()[0]);
        assert_eq!(partial.components()[1], secret.components()[2]);
    }

    #[test]
    fn insufficient_shares_errors() {
        let shamir = AdaptedShamir::new(3, 5).unwrap();
        let secret = secret_vector(&[&[1, 2, 3]]);
        let mut rng = rng();
        let shares = shamir.split(&secret, &mut rng);
        let err = shamir.reconstruct(&shares[0..2]).unwrap_err();
        assert_eq!(err, ShamirError::InsufficientShares { needed: 3, got: 2 });
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(AdaptedShamir::new(1, 5).is_err());
        assert!(AdaptedShamir::new(6, 5).is_err());
        assert!(AdaptedShamir::new(2, 0).is_err());
    }

    #[test]
    fn lagrange_sanity_matches_known_points() {
        // (1,5), (2,7), (3,9): f(x) = 2x + 3, f(0) = 3, f(4) = 11.
        let xs = [1i64, 2, 3];
        let ys = [5i64, 7, 9];
        let lagrange = lagrange_from_coeff(&xs).unwrap();
        let at_zero: i64 = ys
            .iter()
            .zip(lagrange.iter())
            .map(|(&y, &l)| reduce_mod_q(y * l))
            .fold(0, |acc, v| reduce_mod_q(acc + v));
        assert_eq!(at_zero, 3);

        let weights_at_four: Vec<i64> = xs
            .iter()
            .map(|&xi| lagrange_weight_at(xi, &xs, 4).unwrap())
            .collect();
        let at_four: i64 = ys
            .iter()
            .zip(weights_at_four.iter())
            .map(|(&y, &l)| reduce_mod_q(y * l))
            .fold(0, |acc, v| reduce_mod_q(acc + v));
        assert_eq!(at_four, 11);
    }

    #[test]
    fn deterministic_split_is_reproducible() {
        let shamir = AdaptedShamir::new(2, 3).unwrap();
        let secret = secret_vector(&[&[42, 43]]);
        let seed = [9u8; 32];
        let shares1 = shamir.split_deterministic(&secret, &seed);
        let shares2 = shamir.split_deterministic(&secret, &seed);
        assert_eq!(shares1, shares2);
        let reconstructed = shamir.reconstruct(&shares1[0..2]).unwrap();
        assert_eq!(&reconstructed, &secret);
    }

    #[test]
    fn verify_shares_rejects_duplicate_ids() {
        let shamir = AdaptedShamir::new(2, 3).unwrap();
        let secret = secret_vector(&[&[1]]);
        let mut rng = rng();
        let mut shares = shamir.split(&secret, &mut rng);
        shares[1] = shares[0].clone();
        assert!(!shamir.verify_shares(&shares));
    }
}
