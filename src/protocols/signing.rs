//! Interactive threshold ECDSA signing (CGGMP'21 Fig. 7 and Fig. 8, with the presigning merged in).
//!
//! Any subset of more than `threshold` parties of a [`Config`](crate::Config) can run it.
//! Each signer works with its additive share of the key, obtained by multiplying its Shamir share
//! by the Lagrange coefficient for the signer set.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};

use crypto_bigint::modular::Retrieve;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{Point, RecoverableSignature, Scalar},
    entities::PartyId,
    paillier::{Ciphertext, PaillierParams, PublicKeyPaillier, RPParams, SecretKeyPaillier},
    params::{scalar_from_signed, signed_from_scalar, SchemeParams},
    rounds::{KeygenError, KeygenErrorKind, Message, Round, RoundError},
    tools::{hashing::HashOutput, transcript::Transcript, Secret},
    uint::Signed,
    zk::{
        AffGProof, AffGPublicInputs, AffGSecretInputs, EncProof, EncPublicInputs, EncSecretInputs, LogStarProof,
        LogStarPublicInputs, LogStarSecretInputs,
    },
};

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;

/// Session parameters shared by all the rounds.
#[derive(Debug, Clone)]
pub(crate) struct Context<P: SchemeParams> {
    pub(crate) my_id: PartyId,
    pub(crate) ssid: HashOutput,
    /// The prehashed message as a scalar.
    pub(crate) message: Scalar,
    /// The additive share of the key, $x_i \lambda_i$.
    pub(crate) key_share: Secret<Scalar>,
    /// The additive public shares of all the signers (including this one).
    pub(crate) public_shares: BTreeMap<PartyId, Point>,
    pub(crate) public_key: Point,
    pub(crate) paillier_sk: SecretKeyPaillier<P::Paillier>,
    /// The ring-Pedersen parameters of all the signers; their moduli are the signers' Paillier keys.
    pub(crate) rp_params: BTreeMap<PartyId, RPParams<P::Paillier>>,
}

impl<P: SchemeParams> Context<P> {
    fn other_ids(&self) -> BTreeSet<PartyId> {
        self.public_shares.keys().filter(|id| *id != &self.my_id).cloned().collect()
    }

    fn own_pk(&self) -> &PublicKeyPaillier<P::Paillier> {
        self.paillier_sk.public_key()
    }

    fn own_setup(&self) -> &RPParams<P::Paillier> {
        self.setup(&self.my_id)
    }

    fn setup(&self, id: &PartyId) -> &RPParams<P::Paillier> {
        self.rp_params.get(id).expect("all signers are validated at session start")
    }

    fn public_share(&self, id: &PartyId) -> &Point {
        self.public_shares.get(id).expect("all signers are validated at session start")
    }

    fn local_error(&self, kind: KeygenErrorKind) -> RoundError {
        KeygenError::new(&self.my_id, kind).into()
    }
}

/// The encrypted nonces $K_i$ and $G_i$, with the proof that $K_i$ encrypts a value in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Signing2<P: SchemeParams> {
    pub(crate) cap_k: Ciphertext<P::Paillier>,
    pub(crate) cap_g: Ciphertext<P::Paillier>,
    pub(crate) psi0: EncProof<P>,
}

/// The multiplicative-to-additive conversions of $k_j \gamma_i$ and $k_j x_i$ for the recipient $j$.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Signing3<P: SchemeParams> {
    pub(crate) gamma: Point,
    pub(crate) cap_d: Ciphertext<P::Paillier>,
    pub(crate) cap_f: Ciphertext<P::Paillier>,
    pub(crate) cap_d_hat: Ciphertext<P::Paillier>,
    pub(crate) cap_f_hat: Ciphertext<P::Paillier>,
    pub(crate) psi: AffGProof<P>,
    pub(crate) psi_hat: AffGProof<P>,
    pub(crate) psi_prime: LogStarProof<P>,
}

/// The additive share of $k \gamma$, and the commitments needed to check the signature share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Signing4<P: SchemeParams> {
    pub(crate) delta: Scalar,
    pub(crate) cap_delta: Point,
    pub(crate) cap_s: Point,
    pub(crate) psi: LogStarProof<P>,
}

/// The signature share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Signing5 {
    pub(crate) sigma: Scalar,
}

/// The nonce ciphertexts of another signer.
#[derive(Debug, Clone)]
pub(crate) struct Nonces<P: SchemeParams> {
    cap_k: Ciphertext<P::Paillier>,
    cap_g: Ciphertext<P::Paillier>,
}

/// Own nonces: $k_i$, $\gamma_i$, and the randomizers of their encryptions.
#[derive(Debug, Clone)]
struct OwnNonces<P: SchemeParams> {
    k: Secret<Scalar>,
    gamma: Secret<Scalar>,
    rho: Uint<P>,
    nu: Uint<P>,
    cap_k: Ciphertext<P::Paillier>,
    cap_g: Ciphertext<P::Paillier>,
}

/// Samples and encrypts the nonces.
#[derive(Debug)]
pub(crate) struct Round1<P: SchemeParams> {
    context: Context<P>,
}

impl<P: SchemeParams> Round1<P> {
    pub fn new(context: Context<P>) -> Self {
        Self { context }
    }
}

impl<P: SchemeParams> Round for Round1<P> {
    const ROUND_NUM: u8 = 1;
    type Content = ();
    type Payload = ();
    type Outcome = Round2<P>;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        BTreeSet::new()
    }

    fn verify_message(
        &self,
        _rng: &mut impl CryptoRngCore,
        _from: &PartyId,
        _content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        Ok(())
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        _payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;
        let pk = context.own_pk();

        let k = Secret::init_with(|| Scalar::random_nonzero(rng));
        let gamma = Secret::init_with(|| Scalar::random_nonzero(rng));
        let rho = pk.random_invertible_residue(rng).retrieve();
        let nu = pk.random_invertible_residue(rng).retrieve();

        let k_signed = signed_from_scalar::<P>(k.expose_secret());
        let cap_k = Ciphertext::new_with_randomizer_signed(pk, &k_signed, &rho);
        let cap_g = Ciphertext::new_with_randomizer_signed(pk, &signed_from_scalar::<P>(gamma.expose_secret()), &nu);

        let transcript = Transcript::<P>::new(&context.ssid);
        let aux = transcript.for_party(&context.my_id).digest();

        for id in context.other_ids() {
            let psi0 = EncProof::<P>::new(
                rng,
                EncSecretInputs {
                    k: &k_signed,
                    rho: &rho,
                },
                EncPublicInputs { pk0: pk, cap_k: &cap_k },
                context.setup(&id),
                &aux,
            );
            let content = Signing2 {
                cap_k: cap_k.clone(),
                cap_g: cap_g.clone(),
                psi0,
            };
            out.push(Message::direct(&context.my_id, &id, Round2::<P>::ROUND_NUM, &content)?);
        }

        Ok(Round2 {
            context,
            transcript,
            nonces: OwnNonces {
                k,
                gamma,
                rho,
                nu,
                cap_k,
                cap_g,
            },
        })
    }
}

/// Checks the encrypted nonces and runs the multiplicative-to-additive conversions.
#[derive(Debug)]
pub(crate) struct Round2<P: SchemeParams> {
    context: Context<P>,
    transcript: Transcript<P>,
    nonces: OwnNonces<P>,
}

impl<P: SchemeParams> Round for Round2<P> {
    const ROUND_NUM: u8 = 2;
    type Content = Signing2<P>;
    type Payload = Nonces<P>;
    type Outcome = Round3<P>;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        self.context.other_ids()
    }

    fn verify_message(
        &self,
        _rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        let public = EncPublicInputs {
            pk0: self.context.setup(from).public_key(),
            cap_k: &content.cap_k,
        };
        let aux = self.transcript.for_party(from).digest();
        if !content.psi0.verify(public, self.context.own_setup(), &aux) {
            return Err(KeygenErrorKind::ZkEnc);
        }

        Ok(Nonces {
            cap_k: content.cap_k,
            cap_g: content.cap_g,
        })
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;
        let nonces = self.nonces;
        let pk = context.own_pk();

        let gamma_signed = signed_from_scalar::<P>(nonces.gamma.expose_secret());
        let key_share_signed = signed_from_scalar::<P>(context.key_share.expose_secret());
        let cap_gamma = nonces.gamma.expose_secret().mul_by_generator();
        let own_public_share = *context.public_share(&context.my_id);

        let aux = self.transcript.for_party(&context.my_id).digest();

        // The sums of the masks $\beta_{i,j}$ and $\hat{\beta}_{i,j}$ over $j$.
        let mut beta_sum = Secret::init_with(|| Scalar::ZERO);
        let mut beta_hat_sum = Secret::init_with(|| Scalar::ZERO);

        for (id, other) in payloads.iter() {
            let target_pk = context.setup(id).public_key();

            let beta = Signed::random_in_range_bits(rng, P::LP_BOUND);
            let s = target_pk.random_invertible_residue(rng).retrieve();
            let r = pk.random_invertible_residue(rng).retrieve();
            let (cap_d, cap_f) = mta::<P>(target_pk, pk, &other.cap_k, &gamma_signed, &beta, &s, &r);
            let psi = AffGProof::<P>::new(
                rng,
                AffGSecretInputs {
                    x: &gamma_signed,
                    y: &beta,
                    rho: &s,
                    rho_y: &r,
                },
                AffGPublicInputs {
                    pk0: target_pk,
                    pk1: pk,
                    cap_c: &other.cap_k,
                    cap_d: &cap_d,
                    cap_y: &cap_f,
                    cap_x: &cap_gamma,
                },
                context.setup(id),
                &aux,
            );

            let beta_hat = Signed::random_in_range_bits(rng, P::LP_BOUND);
            let s_hat = target_pk.random_invertible_residue(rng).retrieve();
            let r_hat = pk.random_invertible_residue(rng).retrieve();
            let (cap_d_hat, cap_f_hat) = mta::<P>(
                target_pk,
                pk,
                &other.cap_k,
                &key_share_signed,
                &beta_hat,
                &s_hat,
                &r_hat,
            );
            let psi_hat = AffGProof::new(
                rng,
                AffGSecretInputs {
                    x: &key_share_signed,
                    y: &beta_hat,
                    rho: &s_hat,
                    rho_y: &r_hat,
                },
                AffGPublicInputs {
                    pk0: target_pk,
                    pk1: pk,
                    cap_c: &other.cap_k,
                    cap_d: &cap_d_hat,
                    cap_y: &cap_f_hat,
                    cap_x: &own_public_share,
                },
                context.setup(id),
                &aux,
            );

            let psi_prime = LogStarProof::new(
                rng,
                LogStarSecretInputs {
                    x: &gamma_signed,
                    rho: &nonces.nu,
                },
                LogStarPublicInputs {
                    pk0: pk,
                    cap_c: &nonces.cap_g,
                    g: &Point::GENERATOR,
                    cap_x: &cap_gamma,
                },
                context.setup(id),
                &aux,
            );

            beta_sum += &scalar_from_signed::<P>(&beta);
            beta_hat_sum += &scalar_from_signed::<P>(&beta_hat);

            let content = Signing3 {
                gamma: cap_gamma,
                cap_d,
                cap_f,
                cap_d_hat,
                cap_f_hat,
                psi,
                psi_hat,
                psi_prime,
            };
            out.push(Message::direct(&context.my_id, id, Round3::<P>::ROUND_NUM, &content)?);
        }

        Ok(Round3 {
            context,
            transcript: self.transcript,
            nonces,
            cap_gamma,
            beta_sum,
            beta_hat_sum,
            others: payloads,
        })
    }
}

/// Returns $D = (x \odot C) \oplus enc_{target}(\beta, s)$ and $F = enc_{own}(\beta, r)$:
/// the recipient decrypts $D$ to its additive share of $x c$, and $\beta$ is the sender's.
fn mta<P: SchemeParams>(
    target_pk: &PublicKeyPaillier<P::Paillier>,
    own_pk: &PublicKeyPaillier<P::Paillier>,
    cap_c: &Ciphertext<P::Paillier>,
    x: &Signed<Uint<P>>,
    beta: &Signed<Uint<P>>,
    s: &Uint<P>,
    r: &Uint<P>,
) -> (Ciphertext<P::Paillier>, Ciphertext<P::Paillier>) {
    let cap_d = cap_c
        .homomorphic_mul(target_pk, x)
        .expect("`C` was checked to be valid")
        .homomorphic_add(target_pk, &Ciphertext::new_with_randomizer_signed(target_pk, beta, s));
    let cap_f = Ciphertext::new_with_randomizer_signed(own_pk, beta, r);
    (cap_d, cap_f)
}

/// The decrypted conversions from another signer.
#[derive(Debug, Clone)]
pub(crate) struct Conversions {
    cap_gamma: Point,
    alpha: Secret<Scalar>,
    alpha_hat: Secret<Scalar>,
}

/// Checks and decrypts the conversions, and publishes the share of $k \gamma$.
#[derive(Debug)]
pub(crate) struct Round3<P: SchemeParams> {
    context: Context<P>,
    transcript: Transcript<P>,
    nonces: OwnNonces<P>,
    cap_gamma: Point,
    beta_sum: Secret<Scalar>,
    beta_hat_sum: Secret<Scalar>,
    others: BTreeMap<PartyId, Nonces<P>>,
}

impl<P: SchemeParams> Round for Round3<P> {
    const ROUND_NUM: u8 = 3;
    type Content = Signing3<P>;
    type Payload = Conversions;
    type Outcome = Round4<P>;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        self.context.other_ids()
    }

    fn verify_message(
        &self,
        _rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        let others = self
            .others
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no nonces from the sender".into()))?;
        let sender_pk = self.context.setup(from).public_key();
        let own_pk = self.context.own_pk();
        let setup = self.context.own_setup();
        let aux = self.transcript.for_party(from).digest();

        let public = AffGPublicInputs {
            pk0: own_pk,
            pk1: sender_pk,
            cap_c: &self.nonces.cap_k,
            cap_d: &content.cap_d,
            cap_y: &content.cap_f,
            cap_x: &content.gamma,
        };
        if !content.psi.verify(public, setup, &aux) {
            return Err(KeygenErrorKind::ZkAffG);
        }

        let public = AffGPublicInputs {
            pk0: own_pk,
            pk1: sender_pk,
            cap_c: &self.nonces.cap_k,
            cap_d: &content.cap_d_hat,
            cap_y: &content.cap_f_hat,
            cap_x: self.context.public_share(from),
        };
        if !content.psi_hat.verify(public, setup, &aux) {
            return Err(KeygenErrorKind::ZkAffG);
        }

        let public = LogStarPublicInputs {
            pk0: sender_pk,
            cap_c: &others.cap_g,
            g: &Point::GENERATOR,
            cap_x: &content.gamma,
        };
        if !content.psi_prime.verify(public, setup, &aux) {
            return Err(KeygenErrorKind::ZkLogStar);
        }

        let alpha = content
            .cap_d
            .decrypt_signed(&self.context.paillier_sk)
            .ok_or(KeygenErrorKind::Decrypt)?;
        let alpha_hat = content
            .cap_d_hat
            .decrypt_signed(&self.context.paillier_sk)
            .ok_or(KeygenErrorKind::Decrypt)?;

        Ok(Conversions {
            cap_gamma: content.gamma,
            alpha: Secret::init_with(|| scalar_from_signed::<P>(&alpha)),
            alpha_hat: Secret::init_with(|| scalar_from_signed::<P>(&alpha_hat)),
        })
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;
        let nonces = self.nonces;
        let k = *nonces.k.expose_secret();

        let cap_gamma = payloads
            .values()
            .map(|conversions| conversions.cap_gamma)
            .chain([self.cap_gamma])
            .sum::<Point>();
        let cap_delta = cap_gamma * k;

        // $\delta_i = \gamma_i k_i + \sum_j (\alpha_{i,j} - \beta_{i,j})$
        let mut delta = Secret::init_with(|| *nonces.gamma.expose_secret() * k);
        // $\chi_i = x_i k_i + \sum_j (\hat{\alpha}_{i,j} - \hat{\beta}_{i,j})$
        let mut chi = Secret::init_with(|| *context.key_share.expose_secret() * k);
        for conversions in payloads.values() {
            delta += &conversions.alpha;
            chi += &conversions.alpha_hat;
        }
        let delta = *delta.expose_secret() - *self.beta_sum.expose_secret();
        let chi = Secret::init_with(|| *chi.expose_secret() - *self.beta_hat_sum.expose_secret());
        let cap_s = cap_gamma * chi.expose_secret();

        let aux = self.transcript.for_party(&context.my_id).digest();
        let k_signed = signed_from_scalar::<P>(&k);
        for id in context.other_ids() {
            let psi = LogStarProof::<P>::new(
                rng,
                LogStarSecretInputs {
                    x: &k_signed,
                    rho: &nonces.rho,
                },
                LogStarPublicInputs {
                    pk0: context.own_pk(),
                    cap_c: &nonces.cap_k,
                    g: &cap_gamma,
                    cap_x: &cap_delta,
                },
                context.setup(&id),
                &aux,
            );
            let content = Signing4 {
                delta,
                cap_delta,
                cap_s,
                psi,
            };
            out.push(Message::direct(&context.my_id, &id, Round4::<P>::ROUND_NUM, &content)?);
        }

        Ok(Round4 {
            context,
            transcript: self.transcript,
            k: nonces.k,
            chi,
            cap_gamma,
            own_shares: Shares {
                delta,
                cap_delta,
                cap_s,
            },
            others: self.others,
        })
    }
}

/// The published values of a signer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shares {
    delta: Scalar,
    cap_delta: Point,
    cap_s: Point,
}

/// Combines the shares of $k \gamma$ into the signature nonce and publishes the signature share.
#[derive(Debug)]
pub(crate) struct Round4<P: SchemeParams> {
    context: Context<P>,
    transcript: Transcript<P>,
    k: Secret<Scalar>,
    chi: Secret<Scalar>,
    cap_gamma: Point,
    own_shares: Shares,
    others: BTreeMap<PartyId, Nonces<P>>,
}

impl<P: SchemeParams> Round for Round4<P> {
    const ROUND_NUM: u8 = 4;
    type Content = Signing4<P>;
    type Payload = Shares;
    type Outcome = Output<P>;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        self.context.other_ids()
    }

    fn verify_message(
        &self,
        _rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        let others = self
            .others
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no nonces from the sender".into()))?;

        let public = LogStarPublicInputs {
            pk0: self.context.setup(from).public_key(),
            cap_c: &others.cap_k,
            g: &self.cap_gamma,
            cap_x: &content.cap_delta,
        };
        let aux = self.transcript.for_party(from).digest();
        if !content.psi.verify(public, self.context.own_setup(), &aux) {
            return Err(KeygenErrorKind::ZkLogStar);
        }

        Ok(Shares {
            delta: content.delta,
            cap_delta: content.cap_delta,
            cap_s: content.cap_s,
        })
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;

        let mut shares = payloads;
        shares.insert(context.my_id.clone(), self.own_shares);

        let delta = shares.values().map(|shares| shares.delta).sum::<Scalar>();
        let cap_delta = shares.values().map(|shares| shares.cap_delta).sum::<Point>();
        if delta.mul_by_generator() != cap_delta {
            return Err(context.local_error(KeygenErrorKind::Aggregation(
                "the shares of the nonce product do not match their commitments".into(),
            )));
        }

        let delta_inv = Option::<Scalar>::from(delta.invert())
            .ok_or_else(|| context.local_error(KeygenErrorKind::Aggregation("the nonce product is zero".into())))?;
        let nonce = self.cap_gamma * delta_inv;
        let r = nonce.x_coordinate();
        if r.is_zero() {
            return Err(context.local_error(KeygenErrorKind::Aggregation(
                "the signature nonce has a zero x-coordinate".into(),
            )));
        }

        let sigma = *self.k.expose_secret() * context.message + r * self.chi.expose_secret();
        out.push(Message::broadcast(
            &context.my_id,
            Output::<P>::ROUND_NUM,
            &Signing5 { sigma },
        )?);

        Ok(Output {
            context,
            cap_gamma: self.cap_gamma,
            r,
            sigma,
            shares,
        })
    }
}

/// Checks the signature shares and assembles the signature.
#[derive(Debug)]
pub(crate) struct Output<P: SchemeParams> {
    context: Context<P>,
    cap_gamma: Point,
    r: Scalar,
    sigma: Scalar,
    shares: BTreeMap<PartyId, Shares>,
}

impl<P: SchemeParams> Round for Output<P> {
    const ROUND_NUM: u8 = 5;
    type Content = Signing5;
    type Payload = Scalar;
    type Outcome = RecoverableSignature;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        self.context.other_ids()
    }

    fn verify_message(
        &self,
        _rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        let shares = self
            .shares
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no nonce shares from the sender".into()))?;

        // $\sigma_j \Gamma = m \Delta_j + r S_j$
        if self.cap_gamma * content.sigma != shares.cap_delta * self.context.message + shares.cap_s * self.r {
            return Err(KeygenErrorKind::SignatureShare);
        }
        Ok(content.sigma)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        _out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;
        let sigma = payloads.values().copied().chain([self.sigma]).sum::<Scalar>();

        let signature = RecoverableSignature::from_scalars(&self.r, &sigma, &context.public_key, &context.message)
            .ok_or_else(|| {
                context.local_error(KeygenErrorKind::Aggregation(
                    "the signature does not verify for the shared public key".into(),
                ))
            })?;

        tracing::debug!("{}: signing finished", context.my_id);
        Ok(signature)
    }
}
