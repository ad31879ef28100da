//! Key generation and key refresh (CGGMP'21 Fig. 5 and Fig. 6, with the auxiliary info of Fig. 6 merged in).
//!
//! Both variants go through the same chain of rounds. Key refresh shares zero instead of a random secret,
//! and adds the result to the previous shares, so that the shared public key stays the same.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    format,
    vec::Vec,
};
use core::marker::PhantomData;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use serde_encoded_bytes::{ArrayLike, Hex};

use super::ProtocolKind;
use crate::{
    curve::{Point, Scalar},
    entities::{Config, PartyId, PublicData, PublicPart, SecretData},
    paillier::{Ciphertext, RPParams, RPParamsWire, RPSecret, SecretKeyPaillier},
    params::SchemeParams,
    rounds::{KeygenError, KeygenErrorKind, Message, Round, RoundError},
    tools::{
        hashing::{Chain, HashOutput, Hasher},
        sss::{Polynomial, PublicPolynomial, ShareId},
        transcript::Transcript,
        Rid, Secret,
    },
    zk::{ModProof, PrmProof, SchCommitment, SchProof, SchSecret},
};

const NONCE_BYTES: usize = 32;

/// The data a refresh builds upon.
#[derive(Debug, Clone)]
pub(crate) struct Previous {
    pub(crate) secret: Secret<Scalar>,
    pub(crate) public_shares: BTreeMap<PartyId, Point>,
}

/// Session parameters shared by all the rounds.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub(crate) kind: ProtocolKind,
    pub(crate) my_id: PartyId,
    pub(crate) share_ids: BTreeMap<PartyId, ShareId>,
    pub(crate) threshold: u32,
    pub(crate) ssid: HashOutput,
    pub(crate) previous: Option<Previous>,
}

impl Context {
    fn other_ids(&self) -> BTreeSet<PartyId> {
        self.share_ids.keys().filter(|id| *id != &self.my_id).cloned().collect()
    }

    fn share_id(&self, id: &PartyId) -> &ShareId {
        self.share_ids.get(id).expect("all party ids are validated at session start")
    }

    fn my_share_id(&self) -> &ShareId {
        self.share_id(&self.my_id)
    }

    fn local_error(&self, kind: KeygenErrorKind) -> RoundError {
        KeygenError::new(&self.my_id, kind).into()
    }
}

/// A random value blinding the commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Nonce(#[serde(with = "ArrayLike::<Hex>")] [u8; NONCE_BYTES]);

impl Nonce {
    fn random(rng: &mut impl CryptoRngCore) -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

/// The commitment to the public data, $V_i$.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Keygen2 {
    pub(crate) commitment: HashOutput,
}

/// The hash of all the commitments, to check that everyone received the same ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Keygen3 {
    pub(crate) echo: HashOutput,
}

/// The decommitment: public data of the party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Keygen4<P: SchemeParams> {
    pub(crate) rid: Rid,
    pub(crate) polynomial: PublicPolynomial,
    pub(crate) schnorr_commitment: SchCommitment,
    pub(crate) rp_params: RPParamsWire<P::Paillier>,
    decommitment: Nonce,
}

impl<P: SchemeParams> Keygen4<P> {
    fn commitment_hash(&self, ssid: &HashOutput, id: &PartyId) -> HashOutput {
        Hasher::<P>::new_with_dst(b"KeygenCommitment")
            .chain(ssid)
            .chain(id)
            .chain(self)
            .finalize()
    }
}

/// The share for the recipient, encrypted with the recipient's key, and the proofs of the sender's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Keygen5<P: SchemeParams> {
    pub(crate) share: Ciphertext<P::Paillier>,
    pub(crate) mod_proof: ModProof<P>,
    pub(crate) prm_proof: PrmProof<P>,
}

/// The proof of knowledge of the new secret share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KeygenOutput {
    pub(crate) schnorr_response: SchProof,
}

#[derive(Debug, Clone)]
struct OwnSecrets<P: SchemeParams> {
    paillier_sk: SecretKeyPaillier<P::Paillier>,
    rp_secret: RPSecret<P::Paillier>,
    rp_params: RPParams<P::Paillier>,
    polynomial: Polynomial,
    sch_secret: SchSecret,
}

/// Verified public data of a party.
#[derive(Debug, Clone)]
pub(crate) struct PartyData<P: SchemeParams> {
    rid: Rid,
    polynomial: PublicPolynomial,
    schnorr_commitment: SchCommitment,
    rp_params: RPParams<P::Paillier>,
}

/// Samples the keys and commits to the public data.
#[derive(Debug)]
pub(crate) struct Round1<P: SchemeParams> {
    context: Context,
    phantom: PhantomData<P>,
}

impl<P: SchemeParams> Round1<P> {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            phantom: PhantomData,
        }
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

        let paillier_sk = SecretKeyPaillier::random(rng);
        let rp_secret = RPSecret::random(rng, &paillier_sk);
        let rp_params = RPParams::random_with_secret(rng, &paillier_sk, &rp_secret);

        // A refresh shares zero, so that the sum of the shared secrets does not change.
        let coeff0 = match context.previous {
            None => Secret::init_with(|| Scalar::random_nonzero(rng)),
            Some(_) => Secret::init_with(|| Scalar::ZERO),
        };
        let polynomial = Polynomial::random(rng, coeff0, context.threshold as usize);
        let sch_secret = SchSecret::random(rng);

        let public = Keygen4 {
            rid: Rid::random(rng),
            polynomial: polynomial.public(),
            schnorr_commitment: SchCommitment::new(&sch_secret),
            rp_params: rp_params.to_wire(),
            decommitment: Nonce::random(rng),
        };
        let commitment = public.commitment_hash(&context.ssid, &context.my_id);

        out.push(Message::broadcast(
            &context.my_id,
            Round2::<P>::ROUND_NUM,
            &Keygen2 {
                commitment: commitment.clone(),
            },
        )?);

        Ok(Round2 {
            context,
            secrets: OwnSecrets {
                paillier_sk,
                rp_secret,
                rp_params,
                polynomial,
                sch_secret,
            },
            public,
            commitment,
        })
    }
}

/// Collects the commitments.
#[derive(Debug)]
pub(crate) struct Round2<P: SchemeParams> {
    context: Context,
    secrets: OwnSecrets<P>,
    public: Keygen4<P>,
    commitment: HashOutput,
}

impl<P: SchemeParams> Round for Round2<P> {
    const ROUND_NUM: u8 = 2;
    type Content = Keygen2;
    type Payload = HashOutput;
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
        _from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        Ok(content.commitment)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let mut commitments = payloads;
        commitments.insert(self.context.my_id.clone(), self.commitment);

        let echo = Hasher::<P>::new_with_dst(b"KeygenEcho").chain(&commitments).finalize();
        out.push(Message::broadcast(
            &self.context.my_id,
            Round3::<P>::ROUND_NUM,
            &Keygen3 { echo: echo.clone() },
        )?);

        Ok(Round3 {
            context: self.context,
            secrets: self.secrets,
            public: self.public,
            commitments,
            echo,
        })
    }
}

/// Checks that everyone received the same commitments.
#[derive(Debug)]
pub(crate) struct Round3<P: SchemeParams> {
    context: Context,
    secrets: OwnSecrets<P>,
    public: Keygen4<P>,
    commitments: BTreeMap<PartyId, HashOutput>,
    echo: HashOutput,
}

impl<P: SchemeParams> Round for Round3<P> {
    const ROUND_NUM: u8 = 3;
    type Content = Keygen3;
    type Payload = ();
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
        _from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        if content.echo != self.echo {
            return Err(KeygenErrorKind::Echo);
        }
        Ok(())
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        _payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        out.push(Message::broadcast(
            &self.context.my_id,
            Round4::<P>::ROUND_NUM,
            &self.public,
        )?);

        Ok(Round4 {
            context: self.context,
            secrets: self.secrets,
            public: self.public,
            commitments: self.commitments,
        })
    }
}

/// Checks the decommitments and the public parameters, then distributes the encrypted shares.
#[derive(Debug)]
pub(crate) struct Round4<P: SchemeParams> {
    context: Context,
    secrets: OwnSecrets<P>,
    public: Keygen4<P>,
    commitments: BTreeMap<PartyId, HashOutput>,
}

impl<P: SchemeParams> Round for Round4<P> {
    const ROUND_NUM: u8 = 4;
    type Content = Keygen4<P>;
    type Payload = PartyData<P>;
    type Outcome = Round5<P>;

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
        let commitment = self
            .commitments
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no commitment from the sender".into()))?;
        if &content.commitment_hash(&self.context.ssid, from) != commitment {
            return Err(KeygenErrorKind::Commitment);
        }

        let rp_params = content
            .rp_params
            .validate()
            .map_err(|err| KeygenErrorKind::InvalidParams(format!("{err}")))?;

        if content.polynomial.len() != self.context.threshold as usize + 1 {
            return Err(KeygenErrorKind::Aggregation(
                "the polynomial does not have the expected degree".into(),
            ));
        }

        // A keygen contribution must be non-trivial, a refresh one must keep the shared secret.
        let coeff0_is_identity = content.polynomial.coeff0().map(Point::is_identity).unwrap_or(false);
        let expected_identity = self.context.kind == ProtocolKind::Refresh;
        if coeff0_is_identity != expected_identity {
            return Err(KeygenErrorKind::Vss);
        }

        Ok(PartyData {
            rid: content.rid,
            polynomial: content.polynomial,
            schnorr_commitment: content.schnorr_commitment,
            rp_params,
        })
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;
        let secrets = self.secrets;

        let rid = Rid::combine(payloads.values().map(|data| &data.rid).chain([&self.public.rid]));
        let mut transcript = Transcript::new(&context.ssid);
        transcript.write(&rid);

        let aux = transcript.for_party(&context.my_id).digest();
        let mod_proof = ModProof::<P>::new(rng, &secrets.paillier_sk, &aux);
        let prm_proof = PrmProof::<P>::new(
            rng,
            &secrets.paillier_sk,
            &secrets.rp_secret,
            &secrets.rp_params,
            &aux,
        );

        for (id, data) in payloads.iter() {
            let share = secrets.polynomial.evaluate(context.share_id(id));
            let content = Keygen5 {
                share: Ciphertext::new_scalar(rng, data.rp_params.public_key(), share.expose_secret()),
                mod_proof: mod_proof.clone(),
                prm_proof: prm_proof.clone(),
            };
            out.push(Message::direct(&context.my_id, id, Round5::<P>::ROUND_NUM, &content)?);
        }

        let own_share = secrets.polynomial.evaluate(context.my_share_id());
        let own_data = PartyData {
            rid: self.public.rid,
            polynomial: self.public.polynomial,
            schnorr_commitment: self.public.schnorr_commitment,
            rp_params: secrets.rp_params,
        };

        Ok(Round5 {
            context,
            paillier_sk: secrets.paillier_sk,
            sch_secret: secrets.sch_secret,
            rid,
            transcript,
            own_data,
            own_share,
            others_data: payloads,
        })
    }
}

/// Decrypts and verifies the shares, and assembles the new config.
#[derive(Debug)]
pub(crate) struct Round5<P: SchemeParams> {
    context: Context,
    paillier_sk: SecretKeyPaillier<P::Paillier>,
    sch_secret: SchSecret,
    rid: Rid,
    transcript: Transcript<P>,
    own_data: PartyData<P>,
    own_share: Secret<Scalar>,
    others_data: BTreeMap<PartyId, PartyData<P>>,
}

impl<P: SchemeParams> Round for Round5<P> {
    const ROUND_NUM: u8 = 5;
    type Content = Keygen5<P>;
    type Payload = Secret<Scalar>;
    type Outcome = Output<P>;

    fn own_id(&self) -> &PartyId {
        &self.context.my_id
    }

    fn expecting_messages_from(&self) -> BTreeSet<PartyId> {
        self.context.other_ids()
    }

    fn verify_message(
        &self,
        rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind> {
        let data = self
            .others_data
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no public data from the sender".into()))?;

        // The plaintext must be exactly the share, not merely congruent to it.
        let share = content
            .share
            .decrypt_scalar(&self.paillier_sk)
            .ok_or(KeygenErrorKind::Decrypt)?;

        if share.mul_by_generator() != data.polynomial.evaluate(self.context.my_share_id()) {
            return Err(KeygenErrorKind::Vss);
        }

        let aux = self.transcript.for_party(from).digest();
        if !content.mod_proof.verify(rng, data.rp_params.public_key(), &aux) {
            return Err(KeygenErrorKind::ZkMod);
        }
        if !content.prm_proof.verify(&data.rp_params, &aux) {
            return Err(KeygenErrorKind::ZkPrm);
        }

        Ok(Secret::init_with(|| share))
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        let context = self.context;

        if payloads.len() != self.others_data.len() {
            return Err(context.local_error(KeygenErrorKind::Aggregation("missing shares".into())));
        }

        let mut secret = match &context.previous {
            Some(previous) => previous.secret.clone(),
            None => Secret::init_with(|| Scalar::ZERO),
        };
        secret += &self.own_share;
        for share in payloads.values() {
            secret += share;
        }

        let polynomial = PublicPolynomial::sum(
            self.others_data
                .values()
                .map(|data| &data.polynomial)
                .chain([&self.own_data.polynomial]),
        )
        .map_err(|err| context.local_error(KeygenErrorKind::Aggregation(format!("{err}"))))?;

        let mut all_data = self.others_data;
        all_data.insert(context.my_id.clone(), self.own_data);

        let public = all_data
            .iter()
            .map(|(id, data)| {
                let previous_share = context.previous.as_ref().map_or(Point::IDENTITY, |previous| {
                    *previous
                        .public_shares
                        .get(id)
                        .expect("the party set of a refresh is the one of the previous config")
                });
                let public_data = PublicData {
                    ecdsa: polynomial.evaluate(context.share_id(id)) + previous_share,
                    rp_params: data.rp_params.clone(),
                };
                (id.clone(), public_data)
            })
            .collect::<BTreeMap<_, _>>();

        let config = Config {
            secret: SecretData {
                id: context.my_id.clone(),
                ecdsa: secret,
                paillier_primes: self.paillier_sk.primes().clone(),
            },
            public: PublicPart {
                threshold: context.threshold,
                rid: self.rid,
                public,
            },
        };

        let own_public_share = config
            .public_part()
            .public_data()
            .get(&context.my_id)
            .expect("the own id is among the parties")
            .ecdsa;
        debug_assert!(config.secret_share().expose_secret().mul_by_generator() == own_public_share);

        // Bind the proof to the exact resulting config.
        let mut transcript = self.transcript;
        transcript.write(config.public_part());
        let aux = transcript.for_party(&context.my_id).digest();

        let own_commitment = &all_data
            .get(&context.my_id)
            .expect("the own id is among the parties")
            .schnorr_commitment;
        let schnorr_response = SchProof::new::<P>(
            &self.sch_secret,
            config.secret_share(),
            own_commitment,
            &own_public_share,
            &aux,
        );
        out.push(Message::broadcast(
            &context.my_id,
            Output::<P>::ROUND_NUM,
            &KeygenOutput { schnorr_response },
        )?);

        let schnorr_commitments = all_data
            .into_iter()
            .map(|(id, data)| (id, data.schnorr_commitment))
            .collect();

        Ok(Output {
            context,
            config,
            transcript,
            schnorr_commitments,
        })
    }
}

/// Checks that every party knows its new secret share.
#[derive(Debug)]
pub(crate) struct Output<P: SchemeParams> {
    context: Context,
    config: Config<P>,
    transcript: Transcript<P>,
    schnorr_commitments: BTreeMap<PartyId, SchCommitment>,
}

impl<P: SchemeParams> Round for Output<P> {
    const ROUND_NUM: u8 = 6;
    type Content = KeygenOutput;
    type Payload = ();
    type Outcome = Config<P>;

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
        let commitment = self
            .schnorr_commitments
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no Schnorr commitment from the sender".into()))?;
        let public_share = self
            .config
            .public_part()
            .public_data()
            .get(from)
            .ok_or_else(|| KeygenErrorKind::Structural("no public share for the sender".into()))?
            .ecdsa;

        let aux = self.transcript.for_party(from).digest();
        if !content
            .schnorr_response
            .verify::<P>(commitment, &public_share, &aux)
        {
            return Err(KeygenErrorKind::Schnorr);
        }
        Ok(())
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        _payloads: BTreeMap<PartyId, Self::Payload>,
        _out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError> {
        tracing::debug!(
            "{}: {:?} finished, public key {:?}",
            self.context.my_id,
            self.context.kind,
            self.config.public_key()
        );
        Ok(self.config)
    }
}
