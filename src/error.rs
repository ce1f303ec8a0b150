//! Flat error taxonomy for the four protocol layers.
//!
//! Mirrors the shape of `oprf-client`'s and `oprf-service`'s `thiserror::Error`
//! enums: one error per layer, `#[error("...")]` messages describing the
//! rejection in user terms, and `#[from]` conversions where a higher layer's
//! error is just a wrapped lower-layer one. Arithmetic/validation errors
//! propagate unchanged to the caller; verification itself never raises (it
//! returns `bool`, see [`crate::dilithium`]).

use thiserror::Error;

/// Errors raised by ring arithmetic (L1: [`crate::ring`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// Two vectors (or a vector and a matrix row) were combined but did not
    /// have matching lengths.
    #[error("shape mismatch: expected length {expected}, got {actual}")]
    ShapeMismatch {
        /// The length the operation required.
        expected: usize,
        /// The length that was actually supplied.
        actual: usize,
    },
    /// An arithmetic operation was attempted against an operand type it does
    /// not support. Unreachable from this crate's typed public API; kept for
    /// parity with the reference taxonomy.
    #[error("unsupported operand for this operation")]
    UnsupportedOperand,
    /// A coefficient supplied to a polynomial constructor does not fit the
    /// scalar domain (e.g. overflows the signed 64-bit accumulator used for
    /// reduction).
    #[error("coefficient out of representable range")]
    InvalidCoefficient,
}

/// Errors raised by the Dilithium state machine (L2: [`crate::dilithium`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DilithiumError {
    /// The signing loop exhausted its retry budget without producing a
    /// signature that satisfies the rejection-sampling bounds.
    #[error("signing exhausted after {attempts} attempts without a valid (z, h) pair")]
    SigningExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// Propagated from ring arithmetic (e.g. a malformed parameter table
    /// producing shape-mismatched matrix/vector operands).
    #[error(transparent)]
    Ring(#[from] RingError),
}

/// Errors raised by adapted Shamir sharing (L3: [`crate::shamir`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShamirError {
    /// The `(t, n)` configuration violates `2 <= t <= n <= 255`.
    #[error("invalid threshold configuration: t={t}, n={n}")]
    InvalidConfig {
        /// The requested threshold.
        t: u8,
        /// The requested number of participants.
        n: u8,
    },
    /// Reconstruction (or partial reconstruction) was invoked with fewer
    /// than `t` shares.
    #[error("insufficient shares: need {needed}, got {got}")]
    InsufficientShares {
        /// Shares required.
        needed: usize,
        /// Shares supplied.
        got: usize,
    },
    /// Supplied shares disagree in vector length, or disagree with the
    /// expected secret length.
    #[error(transparent)]
    ShapeMismatch(#[from] RingError),
    /// A Lagrange denominator had no modular inverse. Unreachable for prime
    /// `q` and pairwise-distinct evaluation points; named and rejected
    /// rather than panicking.
    #[error("no modular inverse for denominator (should be unreachable for prime q)")]
    NoModularInverse,
}

/// Errors raised by the threshold protocol (L4: [`crate::threshold`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdError {
    /// Propagated from the underlying Shamir scheme (bad `(t, n)`,
    /// insufficient shares, shape mismatches).
    #[error(transparent)]
    Shamir(#[from] ShamirError),
    /// Propagated from Dilithium arithmetic.
    #[error(transparent)]
    Dilithium(#[from] DilithiumError),
    /// `combine` was called with partial signatures whose challenge
    /// polynomials are not byte-identical.
    #[error("challenge mismatch across partial signatures")]
    ChallengeMismatch,
}
