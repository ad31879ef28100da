//! Pedersen Parameters ZK ($\Pi^{prm}$, Section 5.3, Fig. 13).
//!
//! Publish $(N, s, t)$ and prove that we know a secret $\lambda$ such that
//! $s = t^\lambda \mod N$.

use alloc::vec::Vec;

use crypto_bigint::{modular::Retrieve, PowBoundedExp, WrappingAdd, WrappingSub};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    paillier::{PaillierParams, RPParams, RPSecret, SecretKeyPaillier},
    params::SchemeParams,
    tools::{
        bitvec::BitVec,
        hashing::{Chain, Hashable, Hasher},
        Secret,
    },
};

const HASH_TAG: &[u8] = b"P_prm";

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;

/// Secret data the proof is based on ($a_i$).
#[derive(Debug, Clone)]
struct PrmSecret<P: SchemeParams>(Vec<Secret<Uint<P>>>);

impl<P: SchemeParams> PrmSecret<P> {
    fn random(rng: &mut impl CryptoRngCore, sk: &SecretKeyPaillier<P::Paillier>) -> Self {
        Self(
            (0..P::SECURITY_BITS)
                .map(|_| sk.random_residue_mod_totient(rng))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
struct PrmCommitment<P: SchemeParams>(Vec<Uint<P>>);

impl<P: SchemeParams> PrmCommitment<P> {
    fn new(secret: &PrmSecret<P>, setup: &RPParams<P::Paillier>) -> Self {
        Self(
            secret
                .0
                .iter()
                .map(|a| {
                    setup
                        .base_randomizer_mod()
                        .pow_bounded_exp(a.expose_secret(), P::Paillier::MODULUS_BITS)
                        .retrieve()
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PrmChallenge(BitVec);

impl PrmChallenge {
    fn new<P: SchemeParams>(commitment: &PrmCommitment<P>, setup: &RPParams<P::Paillier>, aux: &impl Hashable) -> Self {
        let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
            .chain(commitment)
            .chain(&setup.to_wire())
            .chain(aux)
            .finalize_to_reader();
        Self(BitVec::from_xof_reader(&mut reader, P::SECURITY_BITS))
    }
}

/// Pedersen Parameters ZK proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct PrmProof<P: SchemeParams> {
    commitment: PrmCommitment<P>,
    challenge: PrmChallenge,
    proof: Vec<Uint<P>>,
}

impl<P: SchemeParams> PrmProof<P> {
    /// Create a proof that we know the `secret`
    /// (i.e. lambda, the power that was used to create RP parameters).
    pub fn new(
        rng: &mut impl CryptoRngCore,
        sk: &SecretKeyPaillier<P::Paillier>,
        secret: &RPSecret<P::Paillier>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        debug_assert!(sk.public_key().modulus() == setup.modulus());
        let proof_secret = PrmSecret::<P>::random(rng, sk);
        let commitment = PrmCommitment::new(&proof_secret, setup);
        let challenge = PrmChallenge::new(&commitment, setup, aux);

        let totient = sk.totient().expose_secret();
        let lambda = secret.lambda().expose_secret();
        // `a + lambda mod phi`, given that both are in `[0, phi)`
        let threshold = totient.wrapping_sub(lambda);

        let proof = proof_secret
            .0
            .iter()
            .zip(challenge.0.bits().iter())
            .map(|(a, e)| {
                let a = a.expose_secret();
                if !*e {
                    *a
                } else if a >= &threshold {
                    a.wrapping_sub(&threshold)
                } else {
                    a.wrapping_add(lambda)
                }
            })
            .collect();

        Self {
            commitment,
            challenge,
            proof,
        }
    }

    /// Verify that the proof is correct for a secret corresponding to the given RP parameters.
    pub fn verify(&self, setup: &RPParams<P::Paillier>, aux: &impl Hashable) -> bool {
        if self.commitment.0.len() != P::SECURITY_BITS || self.proof.len() != P::SECURITY_BITS {
            return false;
        }

        let challenge = PrmChallenge::new(&self.commitment, setup, aux);
        if challenge != self.challenge {
            return false;
        }

        let public_key = setup.public_key();
        for ((e, z), a) in challenge
            .0
            .bits()
            .iter()
            .zip(self.proof.iter())
            .zip(self.commitment.0.iter())
        {
            if a >= setup.modulus() {
                return false;
            }
            let a = public_key.to_montgomery(a);
            let pwr = setup
                .base_randomizer_mod()
                .pow_bounded_exp(z, P::Paillier::MODULUS_BITS);
            let test = if *e {
                pwr == a * *setup.base_value_mod()
            } else {
                pwr == a
            };
            if !test {
                return false;
            }
        }
        true
    }

    /// Returns a copy of the proof with the lowest bit of the first response flipped.
    #[cfg(test)]
    pub fn with_flipped_bit(&self) -> Self {
        let mut proof = self.clone();
        if let Some(z) = proof.proof.first_mut() {
            *z = *z ^ <Uint<P> as crypto_bigint::Integer>::one();
        }
        proof
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::PrmProof;
    use crate::{
        dev::TestParams,
        paillier::{RPParams, RPSecret, SecretKeyPaillier},
    };

    #[test]
    fn prove_and_verify() {
        type Params = TestParams;

        let sk = SecretKeyPaillier::random(&mut OsRng);
        let secret = RPSecret::random(&mut OsRng, &sk);
        let setup = RPParams::random_with_secret(&mut OsRng, &sk, &secret);

        let aux: &[u8] = b"abcde";

        let proof = PrmProof::<Params>::new(&mut OsRng, &sk, &secret, &setup, &aux);

        // Serialization roundtrip
        let serialized = bincode::serde::encode_to_vec(&proof, bincode::config::standard()).unwrap();
        let (proof, _) =
            bincode::serde::decode_from_slice::<PrmProof<Params>, _>(&serialized, bincode::config::standard()).unwrap();

        assert!(proof.verify(&setup, &aux));
        assert!(!proof.verify(&setup, &b"abcdf"));

        // A proof for different parameters does not verify.
        let other_sk = SecretKeyPaillier::random(&mut OsRng);
        let other_secret = RPSecret::random(&mut OsRng, &other_sk);
        let other_setup = RPParams::random_with_secret(&mut OsRng, &other_sk, &other_secret);
        assert!(!proof.verify(&other_setup, &aux));
    }
}
