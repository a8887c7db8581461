//! Distributed key generation primitives: secret-sharing polynomials,
//! encrypted shares with their commitments, discrete-log equality proofs and
//! the Reed-Solomon consistency check over commitment rows.

mod consistency;
mod dleq;
mod polynomial;
mod secret_share;

pub use consistency::verify_row_consistency;
pub use dleq::{DleqProof, VectorDleqProof};
pub use polynomial::{share_abscissa, Polynomial};
pub use secret_share::{EncryptedShare, SecretShare, ShareCommitment};
