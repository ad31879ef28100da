//! Knowledge of Exponent vs Paillier Encryption ($\Pi^{log*}$, Section C.2, Fig. 25).
//!
//! Publish $C = enc_0(x, \rho)$ and $X = g^x$ for some point $g$,
//! and prove that the same $x \in \pm 2^\ell$ is behind both.

use crypto_bigint::modular::Retrieve;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    curve::Point,
    paillier::{Ciphertext, PaillierParams, PublicKeyPaillier, RPParams},
    params::{curve_order, scalar_from_signed, SchemeParams},
    tools::hashing::{Chain, Hashable, Hasher},
    uint::{pow_signed_vartime, Signed},
};

const HASH_TAG: &[u8] = b"P_log*";

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;
type WideUint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::WideUint;

pub(crate) struct LogStarSecretInputs<'a, P: SchemeParams> {
    /// $x \in \pm 2^\ell$.
    pub x: &'a Signed<Uint<P>>,
    /// $\rho$, a Paillier randomizer for the public key $N_0$.
    pub rho: &'a Uint<P>,
}

#[derive(Clone, Copy)]
pub(crate) struct LogStarPublicInputs<'a, P: SchemeParams> {
    /// Paillier public key $N_0$.
    pub pk0: &'a PublicKeyPaillier<P::Paillier>,
    /// Paillier ciphertext $C = enc_0(x, \rho)$.
    pub cap_c: &'a Ciphertext<P::Paillier>,
    /// Point $g$.
    pub g: &'a Point,
    /// Point $X = g * x$.
    pub cap_x: &'a Point,
}

/// ZK proof: Knowledge of Exponent vs Paillier Encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct LogStarProof<P: SchemeParams> {
    e: Signed<Uint<P>>,
    cap_s: Uint<P>,
    cap_a: Ciphertext<P::Paillier>,
    cap_y: Point,
    cap_d: Uint<P>,
    z1: Signed<Uint<P>>,
    z2: Uint<P>,
    z3: Signed<WideUint<P>>,
}

fn challenge<P: SchemeParams>(
    cap_s: &Uint<P>,
    cap_a: &Ciphertext<P::Paillier>,
    cap_y: &Point,
    cap_d: &Uint<P>,
    public: LogStarPublicInputs<'_, P>,
    setup: &RPParams<P::Paillier>,
    aux: &impl Hashable,
) -> Signed<Uint<P>> {
    let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
        // commitments
        .chain(cap_s)
        .chain(cap_a)
        .chain(cap_y)
        .chain(cap_d)
        // public parameters
        .chain(public.pk0.modulus())
        .chain(public.cap_c)
        .chain(public.g)
        .chain(public.cap_x)
        .chain(&setup.to_wire())
        .chain(aux)
        .finalize_to_reader();
    Signed::from_xof_reader_bounded(&mut reader, &curve_order::<P>())
}

impl<P: SchemeParams> LogStarProof<P> {
    pub fn new(
        rng: &mut impl CryptoRngCore,
        secret: LogStarSecretInputs<'_, P>,
        public: LogStarPublicInputs<'_, P>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let hat_cap_n = setup.modulus(); // $\hat{N}$

        let alpha = Signed::random_in_range_bits(rng, P::L_BOUND + P::EPS_BOUND);
        let mu = Signed::random_in_range_scaled(rng, P::L_BOUND, hat_cap_n);
        let r = public.pk0.random_invertible_residue(rng);
        let gamma = Signed::random_in_range_scaled(rng, P::L_BOUND + P::EPS_BOUND, hat_cap_n);

        let cap_s = setup.commit(secret.x, &mu).retrieve();
        let cap_a = Ciphertext::new_with_randomizer_signed(public.pk0, &alpha, &r.retrieve());
        let cap_y = *public.g * scalar_from_signed::<P>(&alpha);
        let cap_d = setup.commit(&alpha, &gamma).retrieve();

        let e = challenge(&cap_s, &cap_a, &cap_y, &cap_d, public, setup, aux);

        let rho = public.pk0.to_montgomery(secret.rho);
        let z1 = alpha + *secret.x * e;
        let z2 = (r * pow_signed_vartime(&rho, &e).expect("the randomizer is invertible")).retrieve();
        let z3 = gamma + mu * e.to_wide();

        Self {
            e,
            cap_s,
            cap_a,
            cap_y,
            cap_d,
            z1,
            z2,
            z3,
        }
    }

    pub fn verify(
        &self,
        public: LogStarPublicInputs<'_, P>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> bool {
        let e = challenge(&self.cap_s, &self.cap_a, &self.cap_y, &self.cap_d, public, setup, aux);
        if e != self.e {
            return false;
        }

        // Range check
        if !self.z1.in_range_bits(P::L_BOUND + P::EPS_BOUND) {
            return false;
        }

        // enc_0(z_1, z_2) == A (+) C (*) e
        let pk0 = public.pk0;
        let Some(cap_c_e) = public.cap_c.homomorphic_mul(pk0, &e) else {
            return false;
        };
        if Ciphertext::new_with_randomizer_signed(pk0, &self.z1, &self.z2) != self.cap_a.homomorphic_add(pk0, &cap_c_e) {
            return false;
        }

        // g^{z_1} == Y X^e
        if *public.g * scalar_from_signed::<P>(&self.z1) != self.cap_y + *public.cap_x * scalar_from_signed::<P>(&e) {
            return false;
        }

        // s^{z_1} t^{z_3} == D S^e \mod \hat{N}
        let cap_d = setup.public_key().to_montgomery(&self.cap_d);
        let cap_s = setup.public_key().to_montgomery(&self.cap_s);
        let Some(cap_s_e) = pow_signed_vartime(&cap_s, &e) else {
            return false;
        };
        if setup.commit(&self.z1, &self.z3) != cap_d * cap_s_e {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::modular::Retrieve;
    use rand_core::OsRng;

    use super::{LogStarProof, LogStarPublicInputs, LogStarSecretInputs};
    use crate::{
        curve::Scalar,
        dev::TestParams,
        paillier::{Ciphertext, PaillierParams, RPParams, RPSecret, SecretKeyPaillier},
        params::{scalar_from_signed, SchemeParams},
        uint::Signed,
    };

    #[test]
    fn prove_and_verify() {
        type Params = TestParams;
        type Paillier = <Params as SchemeParams>::Paillier;
        type Uint = <Paillier as PaillierParams>::Uint;

        let sk = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk = sk.public_key();

        let setup_sk = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let setup_secret = RPSecret::random(&mut OsRng, &setup_sk);
        let setup = RPParams::random_with_secret(&mut OsRng, &setup_sk, &setup_secret);

        let aux: &[u8] = b"abcde";

        let g = Scalar::random_nonzero(&mut OsRng).mul_by_generator();
        let x = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::L_BOUND);
        let rho = pk.random_invertible_residue(&mut OsRng).retrieve();
        let cap_c = Ciphertext::new_with_randomizer_signed(pk, &x, &rho);
        let cap_x = g * scalar_from_signed::<Params>(&x);

        let public = LogStarPublicInputs::<Params> {
            pk0: pk,
            cap_c: &cap_c,
            g: &g,
            cap_x: &cap_x,
        };
        let proof = LogStarProof::<Params>::new(&mut OsRng, LogStarSecretInputs { x: &x, rho: &rho }, public, &setup, &aux);
        assert!(proof.verify(public, &setup, &aux));

        // A different exponent behind the point
        let other_x = g * Scalar::random_nonzero(&mut OsRng);
        assert!(!proof.verify(
            LogStarPublicInputs {
                cap_x: &other_x,
                ..public
            },
            &setup,
            &aux
        ));

        // A different base point
        let other_g = Scalar::random_nonzero(&mut OsRng).mul_by_generator();
        assert!(!proof.verify(LogStarPublicInputs { g: &other_g, ..public }, &setup, &aux));
    }
}
