//! Party identifiers and the key share configuration produced by the protocol.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
};
use core::fmt::{self, Display};

use ecdsa::VerifyingKey;
use k256::Secp256k1;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{Point, Scalar},
    paillier::{RPParams, SecretPrimes},
    params::SchemeParams,
    tools::{
        sss::{shamir_join_points, ShareId},
        Rid, Secret,
    },
};

/// The maximum length of a party identifier in bytes.
pub(crate) const MAX_PARTY_ID_BYTES: usize = 32;

/// An identifier of a participant.
///
/// Identifiers are ordered lexicographically; this order is the canonical order of the parties
/// everywhere the protocol needs one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Creates a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The point at which this party's shares are evaluated:
    /// the big-endian integer of the identifier's bytes, as a scalar.
    ///
    /// Returns `None` if the identifier is too long, or if the resulting scalar is zero.
    pub(crate) fn share_id(&self) -> Option<ShareId> {
        if self.0.len() > MAX_PARTY_ID_BYTES {
            return None;
        }
        let scalar = Scalar::from_be_bytes_reduced(self.0.as_bytes())?;
        if scalar.is_zero() {
            return None;
        }
        Some(ShareId::new(scalar))
    }
}

impl Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Public data of a single party, replicated identically in every party's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct PublicData<P: SchemeParams> {
    pub(crate) ecdsa: Point,
    pub(crate) rp_params: RPParams<P::Paillier>,
}

impl<P: SchemeParams> PublicData<P> {
    /// The party's public key share.
    pub fn public_share(&self) -> &Point {
        &self.ecdsa
    }

    /// The party's ring-Pedersen parameters (their modulus is also the party's Paillier public key).
    pub fn rp_params(&self) -> &RPParams<P::Paillier> {
        &self.rp_params
    }
}

/// The part of a [`Config`] that is identical for all the parties.
///
/// The party ids are guaranteed to map to distinct evaluation points,
/// and the threshold to be smaller than the number of parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicPartWire<P>", bound(serialize = "", deserialize = ""))]
pub struct PublicPart<P: SchemeParams> {
    pub(crate) threshold: u32,
    pub(crate) rid: Rid,
    pub(crate) public: BTreeMap<PartyId, PublicData<P>>,
}

/// Unchecked [`PublicPart`] as it comes from storage.
#[derive(Deserialize)]
#[serde(rename = "PublicPart", bound(deserialize = ""))]
struct PublicPartWire<P: SchemeParams> {
    threshold: u32,
    rid: Rid,
    public: BTreeMap<PartyId, PublicData<P>>,
}

impl<P: SchemeParams> TryFrom<PublicPartWire<P>> for PublicPart<P> {
    type Error = ConfigError;

    fn try_from(wire: PublicPartWire<P>) -> Result<Self, Self::Error> {
        let part = Self {
            threshold: wire.threshold,
            rid: wire.rid,
            public: wire.public,
        };
        part.check_ids()?;
        Ok(part)
    }
}

impl<P: SchemeParams> PublicPart<P> {
    /// The degree of the sharing polynomial: any `threshold + 1` shares determine the key.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The combined randomness identifier.
    pub fn rid(&self) -> &Rid {
        &self.rid
    }

    /// Public data of every party.
    pub fn public_data(&self) -> &BTreeMap<PartyId, PublicData<P>> {
        &self.public
    }

    /// The ids of all the parties.
    pub fn ids(&self) -> BTreeSet<PartyId> {
        self.public.keys().cloned().collect()
    }

    /// The public key shares of all the parties.
    pub fn public_shares(&self) -> BTreeMap<PartyId, Point> {
        self.public.iter().map(|(id, data)| (id.clone(), data.ecdsa)).collect()
    }

    /// The shared public key, interpolated from the public key shares.
    pub fn public_key(&self) -> Point {
        // Every id has a distinct share id, see `check_ids()`.
        let points = self
            .public
            .iter()
            .filter_map(|(id, data)| Some((id.share_id()?, data.ecdsa)))
            .collect::<BTreeMap<_, _>>();
        shamir_join_points(&points)
    }

    fn check_ids(&self) -> Result<(), ConfigError> {
        let mut share_ids = BTreeSet::new();
        for id in self.public.keys() {
            let share_id = id.share_id().ok_or(ConfigError::InvalidPartyId)?;
            if !share_ids.insert(share_id) {
                return Err(ConfigError::ShareIdCollision);
            }
        }

        if self.threshold as usize >= self.public.len() {
            return Err(ConfigError::InvalidThreshold);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct SecretData<P: SchemeParams> {
    pub(crate) id: PartyId,
    pub(crate) ecdsa: Secret<Scalar>,
    pub(crate) paillier_primes: SecretPrimes<P::Paillier>,
}

/// Reasons for a [`Config`] to be inconsistent.
#[derive(displaydoc::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The owner of the config is not among the parties
    UnknownOwner,
    /// The public key share does not correspond to the secret share
    SecretShareMismatch,
    /// The Paillier modulus does not correspond to the secret primes
    PaillierMismatch,
    /// A party identifier cannot be used as an evaluation point
    InvalidPartyId,
    /// Two party identifiers map to the same evaluation point
    ShareIdCollision,
    /// The threshold is too large for the number of parties
    InvalidThreshold,
}

/// The result of a key generation or a key refresh for a single party.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Config<P: SchemeParams> {
    pub(crate) secret: SecretData<P>,
    pub(crate) public: PublicPart<P>,
}

impl<P: SchemeParams> Config<P> {
    /// The id of the party owning this config.
    pub fn id(&self) -> &PartyId {
        &self.secret.id
    }

    /// The ids of all the parties.
    pub fn ids(&self) -> BTreeSet<PartyId> {
        self.public.ids()
    }

    /// The degree of the sharing polynomial: any `threshold + 1` shares determine the key.
    pub fn threshold(&self) -> u32 {
        self.public.threshold
    }

    /// The combined randomness identifier.
    pub fn rid(&self) -> &Rid {
        &self.public.rid
    }

    /// The part of the config that is identical for all the parties.
    pub fn public_part(&self) -> &PublicPart<P> {
        &self.public
    }

    /// The shared public key.
    pub fn public_key(&self) -> Point {
        self.public.public_key()
    }

    /// The shared public key as an ECDSA verifying key.
    ///
    /// Returns `None` if the public key is the point at infinity.
    pub fn verifying_key(&self) -> Option<VerifyingKey<Secp256k1>> {
        self.public_key().to_verifying_key()
    }

    pub(crate) fn secret_share(&self) -> &Secret<Scalar> {
        &self.secret.ecdsa
    }

    /// Checks the internal consistency of the config: the owner's public data must match its secret data,
    /// all party identifiers must be usable, and the threshold must not exceed the number of parties.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let own_data = self.public.public.get(self.id()).ok_or(ConfigError::UnknownOwner)?;

        if self.secret.ecdsa.expose_secret().mul_by_generator() != own_data.ecdsa {
            return Err(ConfigError::SecretShareMismatch);
        }

        if &self.secret.paillier_primes.modulus() != own_data.rp_params.modulus() {
            return Err(ConfigError::PaillierMismatch);
        }

        self.public.check_ids()
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;
    use serde::Serialize;
    use serde_assert::{Serializer, Token};

    use super::{ConfigError, PartyId, PublicPart};
    use crate::dev::{make_configs, TestParams};

    fn encode(part: &PublicPart<TestParams>) -> Vec<u8> {
        bincode::serde::encode_to_vec(part, bincode::config::standard()).unwrap()
    }

    fn decode(bytes: &[u8]) -> Result<PublicPart<TestParams>, bincode::error::DecodeError> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map(|(part, _)| part)
    }

    #[test]
    fn share_ids() {
        assert!(PartyId::new("alice").share_id().is_some());
        assert_ne!(PartyId::new("alice").share_id(), PartyId::new("bob").share_id());

        // The empty id and all-zero ids map to zero.
        assert!(PartyId::new("").share_id().is_none());
        assert!(PartyId::new("\0\0").share_id().is_none());

        // Leading zero bytes do not change the integer.
        assert_eq!(PartyId::new("\0a").share_id(), PartyId::new("a").share_id());

        assert!(PartyId::new("a".repeat(32)).share_id().is_some());
        assert!(PartyId::new("a".repeat(33)).share_id().is_none());
    }

    #[test]
    fn serializes_as_string() {
        let id = PartyId::new("alice");
        let serializer = Serializer::builder().build();
        assert_eq!(id.serialize(&serializer).unwrap(), [Token::Str("alice".into())]);
    }

    #[test]
    fn decoding_checks_party_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ids = [PartyId::new("alice"), PartyId::new("bob")];
        let configs = make_configs::<TestParams>(&mut rng, &ids, 1, None).unwrap();
        let part = configs[&ids[0]].public_part().clone();

        let decoded = decode(&encode(&part)).unwrap();
        assert_eq!(decoded, part);
        assert_eq!(decoded.public_key(), part.public_key());

        // An id that is not an evaluation point.
        let mut invalid = part.clone();
        let data = invalid.public.remove(&ids[1]).unwrap();
        invalid.public.insert(PartyId::new(""), data.clone());
        assert_eq!(invalid.check_ids(), Err(ConfigError::InvalidPartyId));
        assert!(decode(&encode(&invalid)).is_err());

        // An id that collides with another one once leading zeros are dropped.
        let mut colliding = part.clone();
        colliding.public.insert(PartyId::new("\0alice"), data);
        colliding.threshold = 1;
        assert_eq!(colliding.check_ids(), Err(ConfigError::ShareIdCollision));
        assert!(decode(&encode(&colliding)).is_err());
        // Still does not panic.
        let _ = colliding.public_key();

        // A threshold that leaves no room for the rest of the parties.
        let mut degenerate = part.clone();
        degenerate.threshold = 2;
        assert_eq!(degenerate.check_ids(), Err(ConfigError::InvalidThreshold));
        assert!(decode(&encode(&degenerate)).is_err());
    }
}
