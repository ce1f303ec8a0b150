//! The threshold-adapted Dilithium protocol: distributed key generation,
//! partial signing, partial verification, and combination into a
//! standard-verifiable [`crate::dilithium::Signature`].
//!
//! # Challenge agreement
//!
//! Independent per-party mask sampling gives each participant a different
//! commitment `w_i = A * y_i` and hence a different locally-derived
//! challenge `c_i`, so nothing in the naive per-party description
//! guarantees [`ThresholdScheme::combine`] ever sees matching challenges.
//! This module resolves it using the mechanism the external interface
//! already exposes: `partial_sign`'s `rand` argument. When every
//! participant in a signing round is handed the *same* `rand` (pre-agreed
//! out of band, e.g. distributed by a coordinator keyed on the
//! message/session), every participant's locally-sampled `y` is identical,
//! so `w`, `w1` and `c` are identical too — without ever sharing `y` itself
//! as a secret. `rand` carries no long-term secrecy requirement (it is
//! ephemeral per-signature randomness, exactly as in
//! [`crate::dilithium::Dilithium::sign`]), so handing it to every co-signer
//! does not weaken the scheme.
//!
//! If `rand` is omitted, each participant draws independent randomness and
//! [`ThresholdScheme::combine`] will generally reject with
//! [`crate::error::ThresholdError::ChallengeMismatch`] — this is the
//! uncoordinated fallback, kept reachable rather than hidden.
//!
//! Because every co-signer's commitment is identical, the combiner can read
//! `w1` directly off any one partial signature rather than re-deriving it,
//! and (knowing `pk`) recompute the exact hint the same way
//! [`crate::dilithium::Dilithium::sign`] does, rather than falling back to
//! a placeholder.

use rand::{CryptoRng, Rng};
use sha2::{Digest, Sha256};
use zeroize::ZeroizeOnDrop;

use crate::dilithium::{self, Dilithium, PublicKey, SecurityLevel, Signature};
use crate::error::{ShamirError, ThresholdError};
use crate::shamir::{AdaptedShamir, ShamirShare, lagrange_combine};

/// Lower bound on the magnitude of Shamir share coefficients used for
/// sharing `s1`.
const SHARE_COEFF_LOW: i64 = 50;

/// Conservative upper cap on that magnitude, independent of `gamma1`.
const SHARE_COEFF_MAX: i64 = 2000;

fn derive_seed(seed: &[u8; 32], label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(label);
    hasher.finalize().into()
}

/// Static description of a configured scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdInfo {
    /// Reconstruction threshold `t`.
    pub threshold: u8,
    /// Number of participants `n`.
    pub participants: u8,
    /// The underlying Dilithium security level.
    pub security_level: SecurityLevel,
}

/// One participant's share of a threshold key.
///
/// Not `Clone`/`Debug` outside tests: `s1_share`/`s2_share` are literal
/// shares of the Dilithium secret key, zeroized on drop.
#[derive(ZeroizeOnDrop)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct ThresholdKeyShare {
    #[zeroize(skip)]
    participant_id: u8,
    s1_share: ShamirShare,
    s2_share: ShamirShare,
    #[zeroize(skip)]
    pk: PublicKey,
}

impl ThresholdKeyShare {
    /// This participant's Shamir evaluation point.
    pub fn participant_id(&self) -> u8 {
        self.participant_id
    }

    /// The public key every participant's signature must ultimately verify
    /// under.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }
}

/// One participant's contribution to a threshold signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSignature {
    participant_id: u8,
    z_partial: crate::ring::PolyVec,
    commitment: crate::ring::PolyVec,
    challenge: crate::ring::Polynomial,
}

impl PartialSignature {
    /// The participant that produced this contribution.
    pub fn participant_id(&self) -> u8 {
        self.participant_id
    }
}

/// A configured `(t, n)` threshold Dilithium scheme at a fixed security
/// level.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdScheme {
    t: u8,
    n: u8,
    level: SecurityLevel,
}

impl ThresholdScheme {
    /// Builds a scheme for `t`-of-`n` signing at `level`.
    ///
    /// # Errors
    /// [`ThresholdError::Shamir`] (wrapping [`ShamirError::InvalidConfig`])
    /// unless `2 <= t <= n <= 255`.
    pub fn new(t: u8, n: u8, level: SecurityLevel) -> Result<Self, ThresholdError> {
        AdaptedShamir::new(t, n)?;
        Ok(Self { t, n, level })
    }

    /// Static scheme parameters.
    pub fn info(&self) -> ThresholdInfo {
        ThresholdInfo {
            threshold: self.t,
            participants: self.n,
            security_level: self.level,
        }
    }

    /// Runs distributed key generation: a single Dilithium keypair is
    /// generated, then `s1` and `s2` are each split into `n` Shamir shares.
    ///
    /// `s1`'s sharing polynomial uses bounded non-constant coefficients
    /// (approximately `[50, gamma1/32]`), since `s1_share` is the
    /// only share combined into a signing response (`z_partial`) and must
    /// keep that response inside the Dilithium rejection bound. `s2` carries
    /// no such constraint: it is never combined into `z`, so it is shared
    /// over the full field.
    ///
    /// Deterministic when `seed` is given (two invocations with the same
    /// seed produce equal shares in the same participant order); otherwise
    /// draws fresh randomness from `rng`.
    pub fn distributed_keygen(
        &self,
        seed: Option<&[u8; 32]>,
        rng: &mut (impl Rng + CryptoRng),
    ) -> Vec<ThresholdKeyShare> {
        let dil = Dilithium::new(self.level);
        let params = self.level.params();

        let keygen_seed = match seed {
            Some(s) => *s,
            None => dilithium::random_seed(rng),
        };
        let (pk, sk) = dil.keygen(&keygen_seed);

        let share_high = (params.gamma1 / 32).min(SHARE_COEFF_MAX).max(SHARE_COEFF_LOW + 1);
        let shamir_s1 = AdaptedShamir::with_bounded_coefficients(self.t, self.n, SHARE_COEFF_LOW, share_high)
            .expect("(t, n) already validated in ThresholdScheme::new");
        let shamir_s2 = AdaptedShamir::new(self.t, self.n)
            .expect("(t, n) already validated in ThresholdScheme::new");

        let (s1_shares, s2_shares) = match seed {
            Some(seed) => {
                let seed_s1 = derive_seed(seed, b"threshold-s1-shares");
                let seed_s2 = derive_seed(seed, b"threshold-s2-shares");
                (
                    shamir_s1.split_deterministic(&sk.s1, &seed_s1),
                    shamir_s2.split_deterministic(&sk.s2, &seed_s2),
                )
            }
            None => (shamir_s1.split(&sk.s1, rng), shamir_s2.split(&sk.s2, rng)),
        };

        s1_shares
            .into_iter()
            .zip(s2_shares)
            .map(|(s1_share, s2_share)| ThresholdKeyShare {
                participant_id: s1_share.participant_id(),
                s1_share,
                s2_share,
                pk: pk.clone(),
            })
            .collect()
    }

    /// Produces this participant's contribution to a signature over
    /// `message`.
    ///
    /// Pass the *same* `rand` to every co-signer in a round to guarantee
    /// challenge agreement (see the module docs); without it, each call
    /// draws its own randomness and `combine` will generally reject.
    pub fn partial_sign(
        &self,
        message: &[u8],
        share: &ThresholdKeyShare,
        rand: Option<&[u8; 32]>,
    ) -> PartialSignature {
        let params = self.level.params();
        let mu = dilithium::sampling::hash_message(message);

        let effective_rand = match rand {
            Some(r) => *r,
            None => {
                let mut r = [0u8; 32];
                rand::thread_rng().fill(&mut r);
                r
            }
        };

        let y = dilithium::sampling::sample_mask_vector(&effective_rand, 0, params.l, params.gamma1);
        let w = share
            .pk
            .a
            .mul_vec(&y)
            .expect("A has l columns matching y's length");
        let w1 = dilithium::sampling::high_bits_vec(&w, params.gamma2);
        let c = dilithium::sampling::derive_challenge(&mu, &w1, params.tau);
        let z_partial = y
            .add(&share.s1_share.vector().scale_by_poly(&c))
            .expect("y and s1_share have matching length l");

        tracing::trace!(participant = share.participant_id, "partial signature produced");
        PartialSignature {
            participant_id: share.participant_id,
            z_partial,
            commitment: w,
            challenge: c,
        }
    }

    /// Checks a single partial signature in isolation: the embedded challenge matches
    /// `H(mu, commitment)`, and the response stays within the signing
    /// bound.
    pub fn verify_partial(&self, message: &[u8], partial: &PartialSignature, _share: &ThresholdKeyShare) -> bool {
        let params = self.level.params();
        if partial.z_partial.norm_infinity() >= params.gamma1 - params.beta {
            return false;
        }
        let mu = dilithium::sampling::hash_message(message);
        let w1 = dilithium::sampling::high_bits_vec(&partial.commitment, params.gamma2);
        let c_prime = dilithium::sampling::derive_challenge(&mu, &w1, params.tau);
        c_prime == partial.challenge
    }

    /// Combines `>= t` partial signatures into a standard Dilithium
    /// signature verifiable under `pk`.
    ///
    /// Tie-break: when more than `t` partials are supplied, the
    /// lexicographically smallest `t` participant ids are used.
    ///
    /// # Errors
    /// [`ThresholdError::Shamir`] (wrapping [`ShamirError::InsufficientShares`])
    /// with fewer than `t` (distinct) partials; [`ThresholdError::ChallengeMismatch`]
    /// if the selected partials disagree on challenge or commitment.
    pub fn combine(&self, partials: &[PartialSignature], pk: &PublicKey) -> Result<Signature, ThresholdError> {
        let mut sorted = partials.to_vec();
        sorted.sort_by_key(|p| p.participant_id);
        sorted.dedup_by_key(|p| p.participant_id);

        if sorted.len() < self.t as usize {
            return Err(ShamirError::InsufficientShares {
                needed: self.t as usize,
                got: sorted.len(),
            }
            .into());
        }
        let selected = &sorted[0..self.t as usize];

        let challenge = &selected[0].challenge;
        let commitment = &selected[0].commitment;
        if selected
            .iter()
            .any(|p| &p.challenge != challenge || &p.commitment != commitment)
        {
            return Err(ThresholdError::ChallengeMismatch);
        }

        let points: Vec<(i64, &crate::ring::PolyVec)> = selected
            .iter()
            .map(|p| (p.participant_id as i64, &p.z_partial))
            .collect();
        let z = lagrange_combine(&points, None)?;

        let params = self.level.params();
        let w1 = dilithium::sampling::high_bits_vec(commitment, params.gamma2);
        let w1_prime = Dilithium::recompute_w1(pk, &z, challenge)?;
        let h = w1
            .sub(&w1_prime)
            .map_err(crate::error::DilithiumError::from)?;

        tracing::debug!(participants = selected.len(), "combined threshold signature");
        Ok(Signature {
            z,
            h,
            c: challenge.clone(),
        })
    }
}
