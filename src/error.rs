use crate::utils::String;

/// Errors that may happen while generating, validating or storing random
/// beacon and slot-leader protocol messages.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Serialization error
    SerializationError,
    /// Deserialization error
    DeserializationError,
    /// Stored bytes decode to a different epoch/index than requested
    DecodeMismatch,
    /// The 4-byte method selector does not name a known entry point
    UnknownMethodId,
    /// A scalar input is zero or otherwise unusable
    InvalidScalar,
    /// Submission is outside its valid stage window
    StageRange,
    /// The sender address is not in the required committee
    UnauthorizedSender,
    /// This index already submitted for this epoch and stage
    AlreadySubmitted(u32),
    /// A stage-2 style message arrived without its stage-1 predecessor
    MissingPriorMessage,
    /// A per-recipient list does not match the committee size
    LengthMismatch(usize, usize),
    /// Cross-stage values for the same index disagree
    ValueInconsistent,
    /// A cryptographic proof or consistency check failed
    ProofInvalid,
    /// Fewer valid shares than the reconstruction threshold
    InsufficientShares(usize, u32),
    /// The aggregate pairing equality does not hold
    PairingMismatch,
    /// Custom error
    Custom(String),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::SerializationError => {
                write!(f, "An error happened while serializing.")
            }
            Error::DeserializationError => {
                write!(f, "An error happened while deserializing.")
            }
            Error::DecodeMismatch => {
                write!(
                    f,
                    "Stored payload does not match the requested epoch and index."
                )
            }
            Error::UnknownMethodId => {
                write!(f, "Unknown 4-byte method selector.")
            }
            Error::InvalidScalar => {
                write!(f, "The scalar is zero or not usable as a secret.")
            }
            Error::StageRange => {
                write!(f, "The submission is outside its valid stage window.")
            }
            Error::UnauthorizedSender => {
                write!(f, "The sender is not a member of the required committee.")
            }
            Error::AlreadySubmitted(index) => {
                write!(
                    f,
                    "Index {} already submitted a message for this epoch and stage.",
                    index
                )
            }
            Error::MissingPriorMessage => {
                write!(
                    f,
                    "No prior-stage message is stored for this epoch and index."
                )
            }
            Error::LengthMismatch(got, expected) => {
                write!(
                    f,
                    "Per-recipient list has {} entries but the committee has {}.",
                    got, expected
                )
            }
            Error::ValueInconsistent => {
                write!(f, "Cross-stage values for the same index disagree.")
            }
            Error::ProofInvalid => {
                write!(f, "A cryptographic proof or consistency check failed.")
            }
            Error::InsufficientShares(got, threshold) => {
                write!(
                    f,
                    "Got {} valid shares but the threshold is {}.",
                    got, threshold
                )
            }
            Error::PairingMismatch => {
                write!(f, "The aggregate signature pairing equality does not hold.")
            }
            Error::Custom(string) => {
                write!(f, "{:?}", string)
            }
        }
    }
}

pub type BeaconResult<T> = Result<T, Error>;
