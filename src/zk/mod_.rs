//! Paillier-Blum modulus ZK ($\Pi^{mod}$, Section 6.3, Fig. 16).
//!
//! Publish $N$ and prove that it is a product of two primes equal to $3 \mod 4$
//! and that $\gcd(N, \phi(N)) = 1$.

use alloc::vec::Vec;

use crypto_bigint::{modular::Retrieve, PowBoundedExp};
use crypto_primes::is_prime_with_rng;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    paillier::{PaillierParams, PublicKeyPaillier, SecretKeyPaillier},
    params::SchemeParams,
    tools::hashing::{Chain, Hashable, Hasher},
    uint::FromXofReader,
};

const HASH_TAG: &[u8] = b"P_mod";

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;
type UintMod<P> = <<P as SchemeParams>::Paillier as PaillierParams>::UintMod;

/// A random $w \in \mathbb{Z}_N^*$ with the Jacobi symbol $-1$.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
struct ModCommitment<P: SchemeParams>(Uint<P>);

impl<P: SchemeParams> ModCommitment<P> {
    fn random(rng: &mut impl CryptoRngCore, sk: &SecretKeyPaillier<P::Paillier>) -> Self {
        loop {
            let w = sk.public_key().random_invertible_residue(rng).retrieve();
            if sk.primes().is_jacobi_minus_one(&sk.primes().rns_split(&w)) {
                return Self(w);
            }
        }
    }
}

/// Challenges $y_i \in \mathbb{Z}_N$ derived from the modulus and the commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModChallenge<P: SchemeParams>(Vec<Uint<P>>);

impl<P: SchemeParams> ModChallenge<P> {
    fn new(pk: &PublicKeyPaillier<P::Paillier>, commitment: &ModCommitment<P>, aux: &impl Hashable) -> Self {
        let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
            .chain(pk.modulus())
            .chain(commitment)
            .chain(aux)
            .finalize_to_reader();

        let ys = (0..P::SECURITY_BITS)
            .map(|_| loop {
                let y = Uint::<P>::from_xof_reader(&mut reader, P::Paillier::MODULUS_BITS);
                if &y < pk.modulus() {
                    break y;
                }
            })
            .collect();
        Self(ys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
struct ModProofElem<P: SchemeParams> {
    /// A fourth root of $(-1)^a w^b y$.
    x: Uint<P>,
    a: bool,
    b: bool,
    /// $y^{N^{-1} \mod \phi(N)}$
    z: Uint<P>,
}

/// Paillier-Blum modulus ZK proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct ModProof<P: SchemeParams> {
    commitment: ModCommitment<P>,
    proof: Vec<ModProofElem<P>>,
}

impl<P: SchemeParams> ModProof<P> {
    pub fn new(rng: &mut impl CryptoRngCore, sk: &SecretKeyPaillier<P::Paillier>, aux: &impl Hashable) -> Self {
        let pk = sk.public_key();
        let primes = sk.primes();
        let commitment = ModCommitment::<P>::random(rng, sk);
        let challenge = ModChallenge::new(pk, &commitment, aux);

        let w = primes.rns_split(&commitment.0);
        let inv_modulus = sk.inv_modulus();

        let proof = challenge
            .0
            .iter()
            .map(|y| {
                let y_rns = primes.rns_split(y);

                // Exactly one of $\pm y$, $\pm w y$ is a quadratic residue modulo both primes.
                let (a, b, residue) = [(false, false), (false, true), (true, false), (true, true)]
                    .into_iter()
                    .map(|(a, b)| {
                        let (mut v_p, mut v_q) = y_rns;
                        if a {
                            v_p = -v_p;
                            v_q = -v_q;
                        }
                        if b {
                            v_p = v_p * w.0;
                            v_q = v_q * w.1;
                        }
                        (a, b, (v_p, v_q))
                    })
                    .find(|(_a, _b, v)| primes.is_residue(v))
                    .expect("`w` has the Jacobi symbol -1 and `p`, `q` are 3 mod 4");

                let x = primes.rns_join(&primes.fourth_root(&residue));
                let z = pk
                    .to_montgomery(y)
                    .pow_bounded_exp(inv_modulus.expose_secret(), P::Paillier::MODULUS_BITS)
                    .retrieve();

                ModProofElem { x, a, b, z }
            })
            .collect();

        Self { commitment, proof }
    }

    /// Verify that the proof is correct for the given Paillier modulus.
    ///
    /// Takes an RNG to run a primality test on the modulus.
    pub fn verify(
        &self,
        rng: &mut impl CryptoRngCore,
        pk: &PublicKeyPaillier<P::Paillier>,
        aux: &impl Hashable,
    ) -> bool {
        let modulus = pk.modulus();
        if self.proof.len() != P::SECURITY_BITS || &self.commitment.0 >= modulus {
            return false;
        }

        // The modulus is odd by construction of the public key.
        if is_prime_with_rng(rng, modulus) {
            return false;
        }

        let challenge = ModChallenge::new(pk, &self.commitment, aux);
        let w: UintMod<P> = pk.to_montgomery(&self.commitment.0);

        for (elem, y) in self.proof.iter().zip(challenge.0.iter()) {
            if &elem.x >= modulus || &elem.z >= modulus {
                return false;
            }

            let y = pk.to_montgomery(y);
            let z = pk.to_montgomery(&elem.z);
            if z.pow_bounded_exp(modulus, P::Paillier::MODULUS_BITS) != y {
                return false;
            }

            let mut v = y;
            if elem.a {
                v = -v;
            }
            if elem.b {
                v = v * w;
            }
            let x = pk.to_montgomery(&elem.x);
            let x_sq = x * x;
            if x_sq * x_sq != v {
                return false;
            }
        }
        true
    }

    /// Returns a copy of the proof with one bit of the first element flipped.
    #[cfg(test)]
    pub fn with_flipped_bit(&self) -> Self {
        let mut proof = self.clone();
        if let Some(elem) = proof.proof.first_mut() {
            elem.a = !elem.a;
        }
        proof
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::ModProof;
    use crate::{
        dev::{PaillierTest, TestParams},
        paillier::{PaillierParams, PublicKeyPaillier, SecretKeyPaillier},
    };

    #[test]
    fn prove_and_verify() {
        type Params = TestParams;

        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();
        let aux: &[u8] = b"abcde";

        let proof = ModProof::<Params>::new(&mut OsRng, &sk, &aux);

        // Serialization roundtrip
        let serialized = bincode::serde::encode_to_vec(&proof, bincode::config::standard()).unwrap();
        let (proof, _) =
            bincode::serde::decode_from_slice::<ModProof<Params>, _>(&serialized, bincode::config::standard()).unwrap();

        assert!(proof.verify(&mut OsRng, pk, &aux));
        assert!(!proof.verify(&mut OsRng, pk, &b"abcdf"));

        let other_sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        assert!(!proof.verify(&mut OsRng, other_sk.public_key(), &aux));
    }

    #[test]
    fn prime_modulus_is_rejected() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let aux: &[u8] = b"abcde";
        let proof = ModProof::<TestParams>::new(&mut OsRng, &sk, &aux);

        // A prime is odd and forms a valid public key, but must not pass.
        let prime = crypto_primes::generate_prime_with_rng::<<PaillierTest as PaillierParams>::Uint>(
            &mut OsRng,
            PaillierTest::MODULUS_BITS,
        );
        let pk = PublicKeyPaillier::<PaillierTest>::new(&prime).unwrap();
        assert!(!proof.verify(&mut OsRng, &pk, &aux));
    }
}
