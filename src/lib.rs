//! A threshold-adapted CRYSTALS-Dilithium signature scheme.
//!
//! Four layers, each built on the one below:
//!
//! - [`ring`] (L1): arithmetic in `R_q = Z_q[X]/(X^N+1)`.
//! - [`dilithium`] (L2): the non-threshold Dilithium key generation / sign /
//!   verify state machine.
//! - [`shamir`] (L3): Shamir secret sharing adapted to polynomial vectors,
//!   shared coordinate-wise.
//! - [`threshold`] (L4): distributed key generation, partial signing, and
//!   combination into a standard Dilithium signature.
//!
//! A signature produced by [`threshold::ThresholdScheme::combine`] verifies
//! under the plain [`dilithium::Dilithium::verify`] — the scheme introduces
//! no new verification algorithm, only a new way of producing the same
//! signature shape collaboratively.
//!
//! ```
//! use dilithium_threshold_core::dilithium::SecurityLevel;
//! use dilithium_threshold_core::threshold::ThresholdScheme;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let ts = ThresholdScheme::new(3, 5, SecurityLevel::Two).unwrap();
//! let mut rng = ChaCha20Rng::seed_from_u64(1);
//! let shares = ts.distributed_keygen(None, &mut rng);
//! let pk = shares[0].public_key().clone();
//!
//! let message = b"sign me";
//! let shared_rand = [7u8; 32];
//! let partials: Vec<_> = shares[0..3]
//!     .iter()
//!     .map(|s| ts.partial_sign(message, s, Some(&shared_rand)))
//!     .collect();
//!
//! let sig = ts.combine(&partials, &pk).unwrap();
//! assert!(dilithium_threshold_core::dilithium::Dilithium::new(SecurityLevel::Two).verify(message, &sig, &pk));
//! ```

pub mod dilithium;
pub mod error;
pub mod ring;
pub mod shamir;
pub mod threshold;

pub use error::{DilithiumError, RingError, ShamirError, ThresholdError};
