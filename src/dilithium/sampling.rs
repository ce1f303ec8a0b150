//! SHAKE256-driven sampling: matrix expansion, bounded noise/mask
//! coefficients, and the high-bits/hint helpers used by the sign/verify
//! state machine.
//!
//! Every sampler here is a pure function of its seed bytes: there is no
//! module-global RNG, matching how `oprf-core`'s `mappings`/`keygen` helpers
//! take their randomness (or deterministic seed material) as an explicit
//! argument rather than reaching for a global.

use sha3::{
    Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::ring::{N, PolyMatrix, PolyVec, Polynomial, Q};

/// Squeezes `out_len` bytes of SHAKE256 output from the concatenation of
/// `parts`.
pub(crate) fn shake256(parts: &[&[u8]], out_len: usize) -> Vec<u8> {
    let mut hasher = Shake256::default();
    for part in parts {
        Update::update(&mut hasher, part);
    }
    let mut reader = hasher.finalize_xof();
    let mut out = vec![0u8; out_len];
    reader.read(&mut out);
    out
}

/// Expands a 32-byte seed into `(rho, rho_prime, key)`, each 32 bytes, via
/// `SHAKE256(seed, 96)`.
pub(crate) fn expand_seed(seed: &[u8; 32]) -> ([u8; 32], [u8; 32], [u8; 32]) {
    let out = shake256(&[seed.as_slice()], 96);
    let mut rho = [0u8; 32];
    let mut rho_prime = [0u8; 32];
    let mut key = [0u8; 32];
    rho.copy_from_slice(&out[0..32]);
    rho_prime.copy_from_slice(&out[32..64]);
    key.copy_from_slice(&out[64..96]);
    (rho, rho_prime, key)
}

/// Hashes a message to `mu = SHAKE256(m, 64)`.
pub(crate) fn hash_message(message: &[u8]) -> [u8; 64] {
    let out = shake256(&[message], 64);
    let mut mu = [0u8; 64];
    mu.copy_from_slice(&out);
    mu
}

/// Fills `N` coefficients uniformly in `[0, Q)` from `seed`'s SHAKE256
/// output, interpreted as little-endian `u32`s reduced mod `q`, with no
/// rejection step.
fn sample_uniform_poly(seed: &[u8]) -> Polynomial {
    let out = shake256(&[seed], N * 4);
    let mut coeffs = [0i64; N];
    for (i, chunk) in out.chunks_exact(4).enumerate() {
        let v = u32::from_le_bytes(chunk.try_into().expect("chunk is 4 bytes"));
        coeffs[i] = (v as i64) % Q;
    }
    Polynomial::from_coeffs(&coeffs)
}

/// Fills `N` coefficients uniformly in `[-bound, bound]` from `seed`'s
/// SHAKE256 output.
fn sample_bounded_poly(seed: &[u8], bound: i64) -> Polynomial {
    let out = shake256(&[seed], N * 4);
    let range = 2 * bound + 1;
    let mut coeffs = [0i64; N];
    for (i, chunk) in out.chunks_exact(4).enumerate() {
        let v = u32::from_le_bytes(chunk.try_into().expect("chunk is 4 bytes"));
        coeffs[i] = (v as i64) % range - bound;
    }
    Polynomial::from_coeffs(&coeffs)
}

/// Expands the public matrix `A` (`k x l`) from `rho`.
pub(crate) fn expand_matrix(rho: &[u8; 32], k: usize, l: usize) -> PolyMatrix {
    let mut rows = Vec::with_capacity(k);
    for i in 0..k {
        let mut row = Vec::with_capacity(l);
        for j in 0..l {
            let seed = [rho.as_slice(), &[i as u8], &[j as u8]].concat();
            row.push(sample_uniform_poly(&seed));
        }
        rows.push(row);
    }
    PolyMatrix::new(rows)
}

/// Samples a length-`count` noise vector from `rho_prime`, each coefficient
/// uniform in `[-eta, eta]`. `domain` separates the `s1`/`s2` sub-streams.
pub(crate) fn sample_noise_vector(
    rho_prime: &[u8; 32],
    domain: &[u8],
    count: usize,
    eta: i64,
) -> PolyVec {
    let components = (0..count)
        .map(|j| {
            let seed = [rho_prime.as_slice(), domain, &(j as u16).to_le_bytes()].concat();
            sample_bounded_poly(&seed, eta)
        })
        .collect();
    PolyVec::new(components)
}

/// Samples the length-`l` signing mask `y` from `rand`, `kappa` (the
/// rejection-sampling attempt counter) and the component index.
pub(crate) fn sample_mask_vector(rand: &[u8; 32], kappa: u32, count: usize, gamma1: i64) -> PolyVec {
    let components = (0..count)
        .map(|j| {
            let seed = [
                rand.as_slice(),
                &kappa.to_le_bytes(),
                &(j as u16).to_le_bytes(),
            ]
            .concat();
            sample_bounded_poly(&seed, gamma1)
        })
        .collect();
    PolyVec::new(components)
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q }
}

/// Coordinate-wise "high bits" of a single polynomial:
/// `floor((c' + gamma2) / (2*gamma2))` on the signed representative `c'`.
fn high_bits_poly(p: &Polynomial, gamma2: i64) -> Polynomial {
    let signed = p.signed_coeffs();
    let mut out = [0i64; N];
    for (dst, &c) in out.iter_mut().zip(signed.iter()) {
        *dst = floor_div(c + gamma2, 2 * gamma2);
    }
    Polynomial::from_coeffs(&out)
}

/// Coordinate-wise "high bits" of every component of `v`.
pub(crate) fn high_bits_vec(v: &PolyVec, gamma2: i64) -> PolyVec {
    PolyVec::new(
        v.components()
            .iter()
            .map(|p| high_bits_poly(p, gamma2))
            .collect(),
    )
}

/// Derives the sparse ternary challenge `c = H(mu, w1)`: draws `tau`
/// distinct positions in `[0, N)` from a SHAKE256 stream seeded with
/// `mu ‖ w1_bytes` and assigns each a random `+-1` sign; remaining
/// positions stay `0`.
pub(crate) fn derive_challenge(mu: &[u8; 64], w1: &PolyVec, tau: usize) -> Polynomial {
    let w1_bytes: Vec<u8> = w1
        .components()
        .iter()
        .flat_map(|p| p.coeffs().iter().flat_map(|&c| (c as u32).to_le_bytes()))
        .collect();

    let mut hasher = Shake256::default();
    Update::update(&mut hasher, mu.as_slice());
    Update::update(&mut hasher, &w1_bytes);
    let mut reader = hasher.finalize_xof();

    let mut coeffs = [0i64; N];
    let mut chosen = std::collections::HashSet::new();
    let mut buf = [0u8; 3];
    // tau is bounded well below N for every parameter set in the table, so
    // this loop terminates quickly in practice; bound it defensively anyway.
    let mut guard = 0usize;
    while chosen.len() < tau && guard < 1_000_000 {
        reader.read(&mut buf);
        guard += 1;
        let pos = (u16::from_le_bytes([buf[0], buf[1]]) as usize) % N;
        if !chosen.insert(pos) {
            continue;
        }
        coeffs[pos] = if buf[2] & 1 == 0 { 1 } else { -1 };
    }
    Polynomial::from_coeffs(&coeffs)
}
