//! The Dilithium key generation / sign / verify state machine.
//!
//! This is the non-threshold baseline every threshold signature in
//! [`crate::threshold`] must verify under: a single party holds the whole
//! private key and runs the rejection-sampling signing loop directly. The
//! threshold protocol never calls [`Dilithium::sign`] itself — it calls
//! [`Dilithium::verify`] on the signature [`crate::threshold::ThresholdScheme::combine`]
//! produces.

pub(crate) mod sampling;

use rand::{CryptoRng, Rng};
use zeroize::ZeroizeOnDrop;

use crate::error::DilithiumError;
use crate::ring::{PolyMatrix, PolyVec, Polynomial};

/// Maximum number of rejection-sampling attempts before
/// [`DilithiumError::SigningExhausted`].
const MAX_SIGN_ATTEMPTS: u32 = 1000;

/// The closed Dilithium security levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityLevel {
    /// NIST level 2.
    Two,
    /// NIST level 3.
    Three,
    /// NIST level 5.
    Five,
}

/// The parameter set selected by a [`SecurityLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DilithiumParams {
    /// Rows of the public matrix / length of `s2`, `t1`, `h`.
    pub k: usize,
    /// Columns of the public matrix / length of `s1`, `z`.
    pub l: usize,
    /// Bound on secret-key coefficients.
    pub eta: i64,
    /// Hamming weight of the challenge polynomial.
    pub tau: usize,
    /// Signature-rejection margin.
    pub beta: i64,
    /// Mask coefficient bound.
    pub gamma1: i64,
    /// High-bits rounding granularity.
    pub gamma2: i64,
    /// `t1` truncation bit-count.
    pub d: u32,
    /// Maximum allowed Hamming weight of the hint vector, using the
    /// standard ML-DSA `omega` values for the matching level (see
    /// `DESIGN.md`).
    pub omega: usize,
}

impl SecurityLevel {
    /// Returns the parameter set for this level.
    pub fn params(self) -> DilithiumParams {
        const Q: i64 = crate::ring::Q;
        match self {
            SecurityLevel::Two => DilithiumParams {
                k: 4,
                l: 4,
                eta: 2,
                tau: 39,
                beta: 78,
                gamma1: (Q - 1) / 88,
                gamma2: (Q - 1) / 32,
                d: 13,
                omega: 80,
            },
            SecurityLevel::Three => DilithiumParams {
                k: 6,
                l: 5,
                eta: 4,
                tau: 49,
                beta: 196,
                gamma1: (Q - 1) / 32,
                gamma2: (Q - 1) / 32,
                d: 13,
                omega: 55,
            },
            SecurityLevel::Five => DilithiumParams {
                k: 8,
                l: 7,
                eta: 2,
                tau: 60,
                beta: 120,
                gamma1: (Q - 1) / 32,
                gamma2: (Q - 1) / 32,
                d: 13,
                omega: 75,
            },
        }
    }
}

/// A Dilithium public key: the expanded matrix `A`, the rounded public
/// vector `t1`, and the security level they were generated under.
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub(crate) a: PolyMatrix,
    pub(crate) t1: PolyVec,
    pub(crate) level: SecurityLevel,
}

impl PublicKey {
    /// The security level this key was generated under.
    pub fn level(&self) -> SecurityLevel {
        self.level
    }
}

/// A Dilithium private key: the short-coefficient secret vectors `s1`, `s2`.
///
/// Zeroized on drop; deliberately not `Clone`/`Debug` so a stray `{:?}` or
/// an accidental duplicate never leaks the secret vectors, matching how
/// `oprf-core`'s `KeyGenPoly`/`DLogEqualitySession` treat their own secret
/// state.
#[derive(ZeroizeOnDrop)]
pub struct PrivateKey {
    pub(crate) s1: PolyVec,
    pub(crate) s2: PolyVec,
    #[zeroize(skip)]
    pub(crate) level: SecurityLevel,
}

/// A Dilithium signature: the response vector `z`, the hint vector `h`, and
/// the challenge polynomial `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub z: PolyVec,
    pub h: PolyVec,
    pub c: Polynomial,
}

/// The non-threshold Dilithium scheme for a fixed [`SecurityLevel`].
#[derive(Debug, Clone, Copy)]
pub struct Dilithium {
    level: SecurityLevel,
}

impl Dilithium {
    /// Builds a scheme instance for the given security level.
    pub fn new(level: SecurityLevel) -> Self {
        Self { level }
    }

    /// Runs key generation from a caller-supplied 32-byte seed.
    pub fn keygen(&self, seed: &[u8; 32]) -> (PublicKey, PrivateKey) {
        let params = self.level.params();
        let (rho, rho_prime, _k) = sampling::expand_seed(seed);

        tracing::trace!(level = ?self.level, "expanding public matrix");
        let a = sampling::expand_matrix(&rho, params.k, params.l);
        let s1 = sampling::sample_noise_vector(&rho_prime, b"s1", params.l, params.eta);
        let s2 = sampling::sample_noise_vector(&rho_prime, b"s2", params.k, params.eta);

        let t = a.mul_vec(&s1).expect("A has l columns, s1 has l components");
        let t = t.add(&s2).expect("t and s2 both have k components");
        let t1 = sampling::high_bits_vec(&t, params.gamma2);

        tracing::debug!(level = ?self.level, "keygen complete");
        (
            PublicKey { a, t1, level: self.level },
            PrivateKey { s1, s2, level: self.level },
        )
    }

    /// Computes the "commitment-equivalent" value the verifier will later
    /// derive from `(z, c, pk)`, namely `A*z - c*t1*2^d`, then its high
    /// bits. Shared between the signer (to compute the hint) and the
    /// verifier (to recover `w1` and re-derive the challenge).
    pub(crate) fn recompute_w1(pk: &PublicKey, z: &PolyVec, c: &Polynomial) -> Result<PolyVec, DilithiumError> {
        let params = pk.level.params();
        let scale = 1i64 << params.d;
        let t1_scaled = pk.t1.scalar_mul(scale);
        let c_t1 = t1_scaled.scale_by_poly(c);
        let az = pk.a.mul_vec(z)?;
        let w_prime = az.sub(&c_t1)?;
        Ok(sampling::high_bits_vec(&w_prime, params.gamma2))
    }

    /// Signs `message` under `sk`, using `rand` as the per-attempt mask
    /// seed. `rand` SHOULD be fresh randomness; it is not the same seed
    /// used for key generation.
    pub fn sign(
        &self,
        message: &[u8],
        sk: &PrivateKey,
        pk: &PublicKey,
        rand: &[u8; 32],
    ) -> Result<Signature, DilithiumError> {
        let params = self.level.params();
        let mu = sampling::hash_message(message);

        for kappa in 0..MAX_SIGN_ATTEMPTS {
            let y = sampling::sample_mask_vector(rand, kappa, params.l, params.gamma1);
            let w = pk.a.mul_vec(&y)?;
            let w1 = sampling::high_bits_vec(&w, params.gamma2);
            let c = sampling::derive_challenge(&mu, &w1, params.tau);

            let z = y.add(&sk.s1.scale_by_poly(&c))?;
            if z.norm_infinity() >= params.gamma1 - params.beta {
                tracing::trace!(kappa, "rejecting: z norm too large");
                continue;
            }

            let w1_prime = Self::recompute_w1(pk, &z, &c)?;
            let Some(h) = Self::compute_hint(&w1, &w1_prime, params.omega) else {
                tracing::trace!(kappa, "rejecting: hint out of bounds");
                continue;
            };

            tracing::debug!(kappa, "signature found");
            return Ok(Signature { z, h, c });
        }

        Err(DilithiumError::SigningExhausted {
            attempts: MAX_SIGN_ATTEMPTS,
        })
    }

    /// Computes `h = w1 - w1_prime`, rejecting (returning `None`) if any
    /// coefficient correction falls outside `{-1, 0, 1}` or the total
    /// non-zero count exceeds `omega`.
    fn compute_hint(w1: &PolyVec, w1_prime: &PolyVec, omega: usize) -> Option<PolyVec> {
        let diff = w1.sub(w1_prime).ok()?;
        let mut weight = 0usize;
        for p in diff.components() {
            for c in p.signed_coeffs() {
                if c.abs() > 1 {
                    return None;
                }
                if c != 0 {
                    weight += 1;
                }
            }
        }
        if weight > omega {
            return None;
        }
        Some(diff)
    }

    /// Verifies `sig` over `message` under `pk`. Never raises: a malformed
    /// signature simply returns `false`.
    pub fn verify(&self, message: &[u8], sig: &Signature, pk: &PublicKey) -> bool {
        let params = self.level.params();

        if sig.z.len() != params.l || sig.h.len() != params.k {
            return false;
        }
        if sig.z.norm_infinity() >= params.gamma1 - params.beta {
            return false;
        }
        if sig.c.hamming_weight() > params.tau || sig.c.norm_infinity() > 1 {
            return false;
        }

        let mu = sampling::hash_message(message);
        let Ok(w1_prime) = Self::recompute_w1(pk, &sig.z, &sig.c) else {
            return false;
        };
        let Ok(w1_recovered) = w1_prime.add(&sig.h) else {
            return false;
        };
        let c_prime = sampling::derive_challenge(&mu, &w1_recovered, params.tau);
        c_prime == sig.c
    }
}

/// Samples a fresh random 32-byte seed, e.g. for [`Dilithium::keygen`] or as
/// the per-signature `rand` argument to [`Dilithium::sign`].
pub fn random_seed(rng: &mut (impl Rng + CryptoRng)) -> [u8; 32] {
    let mut seed = [0u8; 32];
    rng.fill(&mut seed);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(level: SecurityLevel, message: &[u8]) -> (Dilithium, PublicKey, Signature) {
        let dil = Dilithium::new(level);
        let seed = [11u8; 32];
        let (pk, sk) = dil.keygen(&seed);
        let rand = [22u8; 32];
        let sig = dil.sign(message, &sk, &pk, &rand).expect("signing succeeds");
        (dil, pk, sig)
    }

    #[test]
    fn sign_then_verify_accepts() {
        let (dil, pk, sig) = roundtrip(SecurityLevel::Two, b"hello dilithium");
        assert!(dil.verify(b"hello dilithium", &sig, &pk));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let (dil, pk, sig) = roundtrip(SecurityLevel::Two, b"hello dilithium");
        assert!(!dil.verify(b"goodbye dilithium", &sig, &pk));
    }

    #[test]
    fn verify_rejects_corrupted_challenge() {
        let (dil, pk, sig) = roundtrip(SecurityLevel::Two, b"hello dilithium");
        let mut bad = sig.clone();
        let mut coeffs = *bad.c.coeffs();
        coeffs[0] = (coeffs[0] + 1) % crate::ring::Q;
        bad.c = Polynomial::from_coeffs(&coeffs);
        assert!(!dil.verify(b"hello dilithium", &bad, &pk));
    }

    #[test]
    fn verify_rejects_corrupted_z() {
        let (dil, pk, sig) = roundtrip(SecurityLevel::Two, b"hello dilithium");
        let mut bad = sig.clone();
        let mut comps = bad.z.components().to_vec();
        let mut coeffs = *comps[0].coeffs();
        coeffs[0] = (coeffs[0] + 1) % crate::ring::Q;
        comps[0] = Polynomial::from_coeffs(&coeffs);
        bad.z = PolyVec::new(comps);
        assert!(!dil.verify(b"hello dilithium", &bad, &pk));
    }

    #[test]
    fn signature_bound_holds_for_level_two() {
        let (_dil, _pk, sig) = roundtrip(SecurityLevel::Two, b"bounded message");
        let params = SecurityLevel::Two.params();
        assert!(sig.z.norm_infinity() < params.gamma1 - params.beta);
    }

    #[test]
    fn keygen_is_deterministic_in_seed() {
        let dil = Dilithium::new(SecurityLevel::Two);
        let seed = [5u8; 32];
        let (pk1, _sk1) = dil.keygen(&seed);
        let (pk2, _sk2) = dil.keygen(&seed);
        assert_eq!(pk1.t1, pk2.t1);
    }
}
