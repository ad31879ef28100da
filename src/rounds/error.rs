use alloc::{collections::BTreeSet, string::String};

use crate::entities::{ConfigError, PartyId};

/// The kinds of faults that can be attributed to a remote party (or, for aggregation failures, to the local one).
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum KeygenErrorKind {
    /// Malformed message: {0}
    Structural(String),
    /// The echoed commitments do not match the ones received by this party
    Echo,
    /// The revealed data does not match the commitment
    Commitment,
    /// Invalid public parameters: {0}
    InvalidParams(String),
    /// Failed to decrypt the share, or the plaintext is not a canonical scalar
    Decrypt,
    /// The share does not match the committed polynomial
    Vss,
    /// The proof of a well-formed Paillier modulus failed
    ZkMod,
    /// The proof of well-formed ring-Pedersen parameters failed
    ZkPrm,
    /// The proof of knowledge of the key share failed
    Schnorr,
    /// The proof of an encrypted nonce in range failed
    ZkEnc,
    /// The proof of a well-formed multiplicative-to-additive conversion failed
    ZkAffG,
    /// The proof of a nonce commitment matching its encryption failed
    ZkLogStar,
    /// The signature share does not match the committed values
    SignatureShare,
    /// Failed to aggregate the contributions: {0}
    Aggregation(String),
    /// Messages from {0:?} have not been received yet
    MissingMessages(BTreeSet<PartyId>),
}

/// An error attributed to a specific party.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
/// Party {party}: {kind}
pub struct KeygenError {
    /// The party at fault.
    pub party: PartyId,
    /// What exactly went wrong.
    pub kind: KeygenErrorKind,
}

impl KeygenError {
    pub(crate) fn new(party: &PartyId, kind: KeygenErrorKind) -> Self {
        Self {
            party: party.clone(),
            kind,
        }
    }
}

/// An error caused by the local party's own actions or environment.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum LocalError {
    /// Failed to serialize a message: {0}
    Serialization(String),
}

/// Errors during the creation of a session.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// At least two parties are required
    TooFewParties,
    /// Party {0} is listed more than once
    DuplicateParty(PartyId),
    /// Party id {0} cannot be used as an evaluation point
    InvalidPartyId(PartyId),
    /// Party ids {0} and {1} map to the same evaluation point
    ShareIdCollision(PartyId, PartyId),
    /// The own id {0} is not among the parties
    UnknownOwnId(PartyId),
    /// The threshold {0} must be smaller than the number of parties
    InvalidThreshold(u32),
    /// The previous config is invalid: {0}
    InvalidConfig(ConfigError),
    /// Signer {0} is not among the parties of the config
    UnknownSigner(PartyId),
    /// {0} signers cannot produce a signature, more than the threshold are required
    TooFewSigners(usize),
}

/// Errors during finalizing a round.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    /// {0}
    Local(LocalError),
    /// {0}
    Keygen(KeygenError),
}

impl From<LocalError> for RoundError {
    fn from(error: LocalError) -> Self {
        Self::Local(error)
    }
}

impl From<KeygenError> for RoundError {
    fn from(error: KeygenError) -> Self {
        Self::Keygen(error)
    }
}
