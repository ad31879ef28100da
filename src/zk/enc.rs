//! Paillier encryption in range ($\Pi^{enc}$, Section 6.1, Fig. 14).
//!
//! Publish a ciphertext $K = enc_0(k, \rho)$ and prove that $k \in \pm 2^\ell$.

use crypto_bigint::modular::Retrieve;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    paillier::{Ciphertext, PaillierParams, PublicKeyPaillier, RPParams},
    params::{curve_order, SchemeParams},
    tools::hashing::{Chain, Hashable, Hasher},
    uint::{pow_signed_vartime, Signed},
};

const HASH_TAG: &[u8] = b"P_enc";

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;
type WideUint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::WideUint;

pub(crate) struct EncSecretInputs<'a, P: SchemeParams> {
    /// $k \in \pm 2^\ell$.
    pub k: &'a Signed<Uint<P>>,
    /// $\rho$, a Paillier randomizer for the public key $N_0$.
    pub rho: &'a Uint<P>,
}

#[derive(Clone, Copy)]
pub(crate) struct EncPublicInputs<'a, P: SchemeParams> {
    /// Paillier public key $N_0$.
    pub pk0: &'a PublicKeyPaillier<P::Paillier>,
    /// Paillier ciphertext $K = enc_0(k, \rho)$.
    pub cap_k: &'a Ciphertext<P::Paillier>,
}

/// ZK proof: Paillier encryption in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct EncProof<P: SchemeParams> {
    e: Signed<Uint<P>>,
    cap_s: Uint<P>,
    cap_a: Ciphertext<P::Paillier>,
    cap_c: Uint<P>,
    z1: Signed<Uint<P>>,
    z2: Uint<P>,
    z3: Signed<WideUint<P>>,
}

fn challenge<P: SchemeParams>(
    cap_s: &Uint<P>,
    cap_a: &Ciphertext<P::Paillier>,
    cap_c: &Uint<P>,
    public: EncPublicInputs<'_, P>,
    setup: &RPParams<P::Paillier>,
    aux: &impl Hashable,
) -> Signed<Uint<P>> {
    let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
        // commitments
        .chain(cap_s)
        .chain(cap_a)
        .chain(cap_c)
        // public parameters
        .chain(public.pk0.modulus())
        .chain(public.cap_k)
        .chain(&setup.to_wire())
        .chain(aux)
        .finalize_to_reader();
    Signed::from_xof_reader_bounded(&mut reader, &curve_order::<P>())
}

impl<P: SchemeParams> EncProof<P> {
    pub fn new(
        rng: &mut impl CryptoRngCore,
        secret: EncSecretInputs<'_, P>,
        public: EncPublicInputs<'_, P>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let hat_cap_n = setup.modulus(); // $\hat{N}$

        let alpha = Signed::random_in_range_bits(rng, P::L_BOUND + P::EPS_BOUND);
        let mu = Signed::random_in_range_scaled(rng, P::L_BOUND, hat_cap_n);
        let r = public.pk0.random_invertible_residue(rng);
        let gamma = Signed::random_in_range_scaled(rng, P::L_BOUND + P::EPS_BOUND, hat_cap_n);

        let cap_s = setup.commit(secret.k, &mu).retrieve();
        let cap_a = Ciphertext::new_with_randomizer_signed(public.pk0, &alpha, &r.retrieve());
        let cap_c = setup.commit(&alpha, &gamma).retrieve();

        let e = challenge(&cap_s, &cap_a, &cap_c, public, setup, aux);

        let rho = public.pk0.to_montgomery(secret.rho);
        let z1 = alpha + *secret.k * e;
        let z2 = (r * pow_signed_vartime(&rho, &e).expect("the randomizer is invertible")).retrieve();
        let z3 = gamma + mu * e.to_wide();

        Self {
            e,
            cap_s,
            cap_a,
            cap_c,
            z1,
            z2,
            z3,
        }
    }

    pub fn verify(&self, public: EncPublicInputs<'_, P>, setup: &RPParams<P::Paillier>, aux: &impl Hashable) -> bool {
        let e = challenge(&self.cap_s, &self.cap_a, &self.cap_c, public, setup, aux);
        if e != self.e {
            return false;
        }

        // z_1 \in \pm 2^{\ell + \eps}
        if !self.z1.in_range_bits(P::L_BOUND + P::EPS_BOUND) {
            return false;
        }

        // The ciphertext will be used in homomorphic operations later.
        let pk0 = public.pk0;
        if !public.cap_k.is_valid(pk0) {
            return false;
        }

        // enc_0(z_1, z_2) == A (+) K (*) e
        let Some(cap_k_e) = public.cap_k.homomorphic_mul(pk0, &e) else {
            return false;
        };
        if Ciphertext::new_with_randomizer_signed(pk0, &self.z1, &self.z2) != self.cap_a.homomorphic_add(pk0, &cap_k_e) {
            return false;
        }

        // s^{z_1} t^{z_3} == C S^e \mod \hat{N}
        let cap_c = setup.public_key().to_montgomery(&self.cap_c);
        let cap_s = setup.public_key().to_montgomery(&self.cap_s);
        let Some(cap_s_e) = pow_signed_vartime(&cap_s, &e) else {
            return false;
        };
        if setup.commit(&self.z1, &self.z3) != cap_c * cap_s_e {
            return false;
        }

        true
    }

    /// Returns a copy of the proof with a modified response.
    #[cfg(test)]
    pub fn with_shifted_response(&self) -> Self {
        let mut proof = self.clone();
        proof.z1 = proof.z1 + Signed::new_positive(<Uint<P> as crypto_bigint::Integer>::one()).unwrap();
        proof
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::modular::Retrieve;
    use rand_core::OsRng;

    use super::{EncProof, EncPublicInputs, EncSecretInputs};
    use crate::{
        dev::TestParams,
        paillier::{Ciphertext, PaillierParams, RPParams, RPSecret, SecretKeyPaillier},
        params::SchemeParams,
        uint::Signed,
    };

    type Params = TestParams;
    type Paillier = <Params as SchemeParams>::Paillier;
    type Uint = <Paillier as PaillierParams>::Uint;

    fn random_setup() -> RPParams<Paillier> {
        let sk = SecretKeyPaillier::random(&mut OsRng);
        let secret = RPSecret::random(&mut OsRng, &sk);
        RPParams::random_with_secret(&mut OsRng, &sk, &secret)
    }

    #[test]
    fn prove_and_verify() {
        let sk = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk = sk.public_key();
        let setup = random_setup();
        let aux: &[u8] = b"abcde";

        let k = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::L_BOUND);
        let rho = pk.random_invertible_residue(&mut OsRng).retrieve();
        let cap_k = Ciphertext::new_with_randomizer_signed(pk, &k, &rho);
        let public = EncPublicInputs::<Params> { pk0: pk, cap_k: &cap_k };

        let proof = EncProof::<Params>::new(&mut OsRng, EncSecretInputs { k: &k, rho: &rho }, public, &setup, &aux);

        // Serialization roundtrip
        let serialized = bincode::serde::encode_to_vec(&proof, bincode::config::standard()).unwrap();
        let (proof, _) =
            bincode::serde::decode_from_slice::<EncProof<Params>, _>(&serialized, bincode::config::standard()).unwrap();

        assert!(proof.verify(public, &setup, &aux));
        assert!(!proof.verify(public, &setup, &b"abcdf"));
        assert!(!proof.with_shifted_response().verify(public, &setup, &aux));

        // Bound to the ciphertext and the setup.
        let other_rho = pk.random_invertible_residue(&mut OsRng).retrieve();
        let other_cap_k = Ciphertext::new_with_randomizer_signed(pk, &k, &other_rho);
        assert!(!proof.verify(
            EncPublicInputs {
                pk0: pk,
                cap_k: &other_cap_k
            },
            &setup,
            &aux
        ));
        assert!(!proof.verify(public, &random_setup(), &aux));
    }

    #[test]
    fn out_of_range_secret_fails() {
        let sk = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk = sk.public_key();
        let setup = random_setup();
        let aux: &[u8] = b"abcde";

        // Far outside of the range, so that the response cannot fit the slack.
        let k = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::L_BOUND + Params::EPS_BOUND + 64);
        let rho = pk.random_invertible_residue(&mut OsRng).retrieve();
        let cap_k = Ciphertext::new_with_randomizer_signed(pk, &k, &rho);
        let public = EncPublicInputs::<Params> { pk0: pk, cap_k: &cap_k };

        let secret = EncSecretInputs { k: &k, rho: &rho };
        let proof = EncProof::<Params>::new(&mut OsRng, secret, public, &setup, &aux);
        assert!(!proof.verify(public, &setup, &aux));
    }
}
