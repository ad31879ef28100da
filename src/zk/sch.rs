//! Schnorr proof of knowledge ($\Pi^{sch}$, Section C.1, Fig. 22).
//!
//! Publish $X$ and prove that we know a secret $x$ such that $g^x = X$,
//! where $g$ is a EC generator.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{Point, Scalar},
    params::SchemeParams,
    tools::{
        hashing::{Chain, Hashable, Hasher},
        Secret,
    },
};

const HASH_TAG: &[u8] = b"P_sch";

/// Secret data the proof is based on ($\alpha$).
#[derive(Debug, Clone)]
pub(crate) struct SchSecret(Secret<Scalar>);

impl SchSecret {
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(Secret::init_with(|| Scalar::random_nonzero(rng)))
    }
}

/// Public data for the proof ($A = g^\alpha$).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchCommitment(Point);

impl SchCommitment {
    pub fn new(secret: &SchSecret) -> Self {
        Self(secret.0.expose_secret().mul_by_generator())
    }

    #[cfg(test)]
    pub fn from_point(point: Point) -> Self {
        Self(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SchChallenge(Scalar);

impl SchChallenge {
    fn new<P: SchemeParams>(public: &Point, commitment: &SchCommitment, aux: &impl Hashable) -> Self {
        let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
            .chain(aux)
            .chain(public)
            .chain(commitment)
            .finalize_to_reader();
        Self(Scalar::from_xof_reader(&mut reader))
    }
}

/// Schnorr PoK of a secret scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchProof {
    challenge: SchChallenge,
    proof: Scalar,
}

impl SchProof {
    /// Create a proof that we know the `secret`.
    pub fn new<P: SchemeParams>(
        proof_secret: &SchSecret,
        secret: &Secret<Scalar>,
        commitment: &SchCommitment,
        public: &Point,
        aux: &impl Hashable,
    ) -> Self {
        let challenge = SchChallenge::new::<P>(public, commitment, aux);
        let proof = *proof_secret.0.expose_secret() + challenge.0 * *secret.expose_secret();
        Self { challenge, proof }
    }

    /// Verify that the proof is correct for a secret corresponding to the given `public`.
    pub fn verify<P: SchemeParams>(&self, commitment: &SchCommitment, public: &Point, aux: &impl Hashable) -> bool {
        let challenge = SchChallenge::new::<P>(public, commitment, aux);
        challenge == self.challenge && self.proof.mul_by_generator() == commitment.0 + *public * challenge.0
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{SchCommitment, SchProof, SchSecret};
    use crate::{curve::Scalar, dev::TestParams, tools::Secret};

    #[test]
    fn prove_and_verify() {
        let secret = Secret::init_with(|| Scalar::random(&mut OsRng));
        let public = secret.expose_secret().mul_by_generator();
        let aux: &[u8] = b"abcde";

        let proof_secret = SchSecret::random(&mut OsRng);
        let commitment = SchCommitment::new(&proof_secret);
        let proof = SchProof::new::<TestParams>(&proof_secret, &secret, &commitment, &public, &aux);
        assert!(proof.verify::<TestParams>(&commitment, &public, &aux));

        // Bound to the auxiliary data, the public key and the commitment.
        assert!(!proof.verify::<TestParams>(&commitment, &public, &b"abcdf"));
        let other_public = Scalar::random(&mut OsRng).mul_by_generator();
        assert!(!proof.verify::<TestParams>(&commitment, &other_public, &aux));
        let other_commitment = SchCommitment::from_point(Scalar::random(&mut OsRng).mul_by_generator());
        assert!(!proof.verify::<TestParams>(&other_commitment, &public, &aux));
    }
}
