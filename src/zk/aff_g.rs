//! Paillier Affine Operation with Group Commitment in Range ($\Pi^{aff-g}$, Section 6.2, Fig. 15).
//!
//! Publish $D = C^x enc_0(y, \rho)$, $Y = enc_1(y, \rho_y)$ and $X = g^x$,
//! and prove that $x \in \pm 2^\ell$ and $y \in \pm 2^{\ell^\prime}$.

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

const HASH_TAG: &[u8] = b"P_aff_g";

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;
type WideUint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::WideUint;

pub(crate) struct AffGSecretInputs<'a, P: SchemeParams> {
    /// $x \in \pm 2^\ell$.
    pub x: &'a Signed<Uint<P>>,
    /// $y \in \pm 2^{\ell^\prime}$.
    pub y: &'a Signed<Uint<P>>,
    /// $\rho$, a Paillier randomizer for the public key $N_0$.
    pub rho: &'a Uint<P>,
    /// $\rho_y$, a Paillier randomizer for the public key $N_1$.
    pub rho_y: &'a Uint<P>,
}

#[derive(Clone, Copy)]
pub(crate) struct AffGPublicInputs<'a, P: SchemeParams> {
    /// Paillier public key $N_0$.
    pub pk0: &'a PublicKeyPaillier<P::Paillier>,
    /// Paillier public key $N_1$.
    pub pk1: &'a PublicKeyPaillier<P::Paillier>,
    /// Paillier ciphertext $C$ encrypted with $N_0$.
    pub cap_c: &'a Ciphertext<P::Paillier>,
    /// $D = C (*) x (+) enc_0(y, \rho)$.
    pub cap_d: &'a Ciphertext<P::Paillier>,
    /// $Y = enc_1(y, \rho_y)$.
    pub cap_y: &'a Ciphertext<P::Paillier>,
    /// $X = g * x$, where $g$ is the curve generator.
    pub cap_x: &'a Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
struct AffGCommitments<P: SchemeParams> {
    cap_a: Ciphertext<P::Paillier>,
    cap_b_x: Point,
    cap_b_y: Ciphertext<P::Paillier>,
    cap_e: Uint<P>,
    cap_s: Uint<P>,
    cap_f: Uint<P>,
    cap_t: Uint<P>,
}

impl<P: SchemeParams> AffGCommitments<P> {
    fn challenge(
        &self,
        public: AffGPublicInputs<'_, P>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> Signed<Uint<P>> {
        let mut reader = Hasher::<P>::new_with_dst(HASH_TAG)
            // commitments
            .chain(self)
            // public parameters
            .chain(public.pk0.modulus())
            .chain(public.pk1.modulus())
            .chain(public.cap_c)
            .chain(public.cap_d)
            .chain(public.cap_y)
            .chain(public.cap_x)
            .chain(&setup.to_wire())
            .chain(aux)
            .finalize_to_reader();
        Signed::from_xof_reader_bounded(&mut reader, &curve_order::<P>())
    }
}

/// ZK proof: Paillier Affine Operation with Group Commitment in Range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct AffGProof<P: SchemeParams> {
    e: Signed<Uint<P>>,
    commitments: AffGCommitments<P>,
    z1: Signed<Uint<P>>,
    z2: Signed<Uint<P>>,
    z3: Signed<WideUint<P>>,
    z4: Signed<WideUint<P>>,
    omega: Uint<P>,
    omega_y: Uint<P>,
}

impl<P: SchemeParams> AffGProof<P> {
    pub fn new(
        rng: &mut impl CryptoRngCore,
        secret: AffGSecretInputs<'_, P>,
        public: AffGPublicInputs<'_, P>,
        setup: &RPParams<P::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let hat_cap_n = setup.modulus(); // $\hat{N}$

        let alpha = Signed::random_in_range_bits(rng, P::L_BOUND + P::EPS_BOUND);
        let beta = Signed::random_in_range_bits(rng, P::LP_BOUND + P::EPS_BOUND);

        let r = public.pk0.random_invertible_residue(rng);
        let r_y = public.pk1.random_invertible_residue(rng);

        let gamma = Signed::random_in_range_scaled(rng, P::L_BOUND + P::EPS_BOUND, hat_cap_n);
        let m = Signed::random_in_range_scaled(rng, P::L_BOUND, hat_cap_n);
        let delta = Signed::random_in_range_scaled(rng, P::L_BOUND + P::EPS_BOUND, hat_cap_n);
        let mu = Signed::random_in_range_scaled(rng, P::L_BOUND, hat_cap_n);

        // A = C (*) \alpha (+) enc_0(\beta, r)
        let cap_a = public
            .cap_c
            .homomorphic_mul(public.pk0, &alpha)
            .expect("`C` is a valid ciphertext")
            .homomorphic_add(
                public.pk0,
                &Ciphertext::new_with_randomizer_signed(public.pk0, &beta, &r.retrieve()),
            );

        let commitments = AffGCommitments {
            cap_a,
            // B_x = g^\alpha
            cap_b_x: scalar_from_signed::<P>(&alpha).mul_by_generator(),
            // B_y = enc_1(\beta, r_y)
            cap_b_y: Ciphertext::new_with_randomizer_signed(public.pk1, &beta, &r_y.retrieve()),
            // E = s^\alpha t^\gamma
            cap_e: setup.commit(&alpha, &gamma).retrieve(),
            // S = s^x t^m
            cap_s: setup.commit(secret.x, &m).retrieve(),
            // F = s^\beta t^\delta
            cap_f: setup.commit(&beta, &delta).retrieve(),
            // T = s^y t^\mu
            cap_t: setup.commit(secret.y, &mu).retrieve(),
        };

        let e = commitments.challenge(public, setup, aux);
        let e_wide = e.to_wide();

        let z1 = alpha + *secret.x * e;
        let z2 = beta + *secret.y * e;
        let z3 = gamma + m * e_wide;
        let z4 = delta + mu * e_wide;

        // \omega = r \rho^e \mod N_0
        let rho = public.pk0.to_montgomery(secret.rho);
        let omega = (r * pow_signed_vartime(&rho, &e).expect("the randomizer is invertible")).retrieve();

        // \omega_y = r_y \rho_y^e \mod N_1
        let rho_y = public.pk1.to_montgomery(secret.rho_y);
        let omega_y = (r_y * pow_signed_vartime(&rho_y, &e).expect("the randomizer is invertible")).retrieve();

        Self {
            e,
            commitments,
            z1,
            z2,
            z3,
            z4,
            omega,
            omega_y,
        }
    }

    pub fn verify(&self, public: AffGPublicInputs<'_, P>, setup: &RPParams<P::Paillier>, aux: &impl Hashable) -> bool {
        let e = self.commitments.challenge(public, setup, aux);
        if e != self.e {
            return false;
        }

        // z_1 \in \pm 2^{\ell + \eps}
        if !self.z1.in_range_bits(P::L_BOUND + P::EPS_BOUND) {
            return false;
        }

        // z_2 \in \pm 2^{\ell^\prime + \eps}
        if !self.z2.in_range_bits(P::LP_BOUND + P::EPS_BOUND) {
            return false;
        }

        let (pk0, pk1) = (public.pk0, public.pk1);
        let c = &self.commitments;

        // C^{z_1} enc_0(z_2, \omega) == A D^e \mod N_0^2
        let Some(cap_c_z1) = public.cap_c.homomorphic_mul(pk0, &self.z1) else {
            return false;
        };
        let Some(cap_d_e) = public.cap_d.homomorphic_mul(pk0, &e) else {
            return false;
        };
        let lhs = cap_c_z1.homomorphic_add(pk0, &Ciphertext::new_with_randomizer_signed(pk0, &self.z2, &self.omega));
        if lhs != c.cap_a.homomorphic_add(pk0, &cap_d_e) {
            return false;
        }

        // g^{z_1} == B_x X^e
        if scalar_from_signed::<P>(&self.z1).mul_by_generator()
            != c.cap_b_x + *public.cap_x * scalar_from_signed::<P>(&e)
        {
            return false;
        }

        // enc_1(z_2, \omega_y) == B_y Y^e \mod N_1^2
        let Some(cap_y_e) = public.cap_y.homomorphic_mul(pk1, &e) else {
            return false;
        };
        if Ciphertext::new_with_randomizer_signed(pk1, &self.z2, &self.omega_y) != c.cap_b_y.homomorphic_add(pk1, &cap_y_e)
        {
            return false;
        }

        let setup_pk = setup.public_key();

        // s^{z_1} t^{z_3} == E S^e \mod \hat{N}
        let Some(cap_s_e) = pow_signed_vartime(&setup_pk.to_montgomery(&c.cap_s), &e) else {
            return false;
        };
        if setup.commit(&self.z1, &self.z3) != setup_pk.to_montgomery(&c.cap_e) * cap_s_e {
            return false;
        }

        // s^{z_2} t^{z_4} == F T^e \mod \hat{N}
        let Some(cap_t_e) = pow_signed_vartime(&setup_pk.to_montgomery(&c.cap_t), &e) else {
            return false;
        };
        if setup.commit(&self.z2, &self.z4) != setup_pk.to_montgomery(&c.cap_f) * cap_t_e {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::modular::Retrieve;
    use rand_core::OsRng;

    use super::{AffGProof, AffGPublicInputs, AffGSecretInputs};
    use crate::{
        dev::TestParams,
        paillier::{Ciphertext, PaillierParams, RPParams, RPSecret, SecretKeyPaillier},
        params::{scalar_from_signed, SchemeParams},
        uint::Signed,
    };

    type Params = TestParams;
    type Paillier = <Params as SchemeParams>::Paillier;
    type Uint = <Paillier as PaillierParams>::Uint;

    #[test]
    fn prove_and_verify() {
        let sk0 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk0 = sk0.public_key();

        let sk1 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk1 = sk1.public_key();

        let setup_sk = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let setup_secret = RPSecret::random(&mut OsRng, &setup_sk);
        let setup = RPParams::random_with_secret(&mut OsRng, &setup_sk, &setup_secret);

        let aux: &[u8] = b"abcde";

        let x = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::L_BOUND);
        let y = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::LP_BOUND);

        let secret = Signed::<Uint>::random_in_range_bits(&mut OsRng, Params::L_BOUND);
        let rho_c = pk0.random_invertible_residue(&mut OsRng).retrieve();
        let cap_c = Ciphertext::new_with_randomizer_signed(pk0, &secret, &rho_c);

        let rho = pk0.random_invertible_residue(&mut OsRng).retrieve();
        let rho_y = pk1.random_invertible_residue(&mut OsRng).retrieve();

        let cap_d = cap_c
            .homomorphic_mul(pk0, &x)
            .unwrap()
            .homomorphic_add(pk0, &Ciphertext::new_with_randomizer_signed(pk0, &y, &rho));
        let cap_y = Ciphertext::new_with_randomizer_signed(pk1, &y, &rho_y);
        let cap_x = scalar_from_signed::<Params>(&x).mul_by_generator();

        // The plaintext of `D` is the expected affine combination.
        assert_eq!(cap_d.decrypt_signed(&sk0), Some(secret * x + y));

        let public = AffGPublicInputs::<Params> {
            pk0,
            pk1,
            cap_c: &cap_c,
            cap_d: &cap_d,
            cap_y: &cap_y,
            cap_x: &cap_x,
        };

        let proof = AffGProof::<Params>::new(
            &mut OsRng,
            AffGSecretInputs {
                x: &x,
                y: &y,
                rho: &rho,
                rho_y: &rho_y,
            },
            public,
            &setup,
            &aux,
        );

        // Serialization roundtrip
        let serialized = bincode::serde::encode_to_vec(&proof, bincode::config::standard()).unwrap();
        let (proof, _) =
            bincode::serde::decode_from_slice::<AffGProof<Params>, _>(&serialized, bincode::config::standard()).unwrap();

        assert!(proof.verify(public, &setup, &aux));
        assert!(!proof.verify(public, &setup, &b"abcdf"));

        // `Y` encrypting something else than the additive part of `D`
        let other_y = Ciphertext::new_with_randomizer_signed(pk1, &(y + y), &rho_y);
        assert!(!proof.verify(
            AffGPublicInputs {
                cap_y: &other_y,
                ..public
            },
            &setup,
            &aux
        ));

        // Swapped keys
        assert!(!proof.verify(AffGPublicInputs { pk0: pk1, pk1: pk0, ..public }, &setup, &aux));
    }
}
