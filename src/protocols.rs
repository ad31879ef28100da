//! Session construction and the public state machine of a single party.

mod keygen;
mod signing;


use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
use core::fmt;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use self::keygen::{Context, Output, Previous, Round1, Round2, Round3, Round4, Round5};
use crate::{
    curve::{Curve, Point, RecoverableSignature, Scalar},
    entities::{Config, PartyId, PublicPart},
    paillier::SecretKeyPaillier,
    params::{chain_scheme_params, SchemeParams},
    rounds::{FinalizeError, FinalizeOutcome, InitError, KeygenError, Message, RoundState, Session},
    tools::{
        hashing::{Chain, HashOutput, Hasher},
        sss::{interpolation_coeff, ShareId},
        Secret,
    },
};

/// The variant of the protocol being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolKind {
    /// Generates a fresh shared key.
    Keygen,
    /// Re-randomizes the shares of an existing key, keeping the key itself.
    Refresh,
}

enum PhaseInner<P: SchemeParams> {
    Round1(RoundState<Round1<P>>),
    Round2(RoundState<Round2<P>>),
    Round3(RoundState<Round3<P>>),
    Round4(RoundState<Round4<P>>),
    Round5(RoundState<Round5<P>>),
    Output(RoundState<Output<P>>),
}

enum SigningPhaseInner<P: SchemeParams> {
    Round1(RoundState<signing::Round1<P>>),
    Round2(RoundState<signing::Round2<P>>),
    Round3(RoundState<signing::Round3<P>>),
    Round4(RoundState<signing::Round4<P>>),
    Output(RoundState<signing::Output<P>>),
}

macro_rules! dispatch {
    ($enum:ident { $($variant:ident),+ }, $inner:expr, $state:ident => $body:expr) => {
        match $inner {
            $($enum::$variant($state) => $body,)+
        }
    };
}

macro_rules! dispatch_keygen {
    ($inner:expr, $state:ident => $body:expr) => {
        dispatch!(PhaseInner { Round1, Round2, Round3, Round4, Round5, Output }, $inner, $state => $body)
    };
}

macro_rules! dispatch_signing {
    ($inner:expr, $state:ident => $body:expr) => {
        dispatch!(SigningPhaseInner { Round1, Round2, Round3, Round4, Output }, $inner, $state => $body)
    };
}

/// The state of one party in a keygen or refresh session.
pub struct Phase<P: SchemeParams>(PhaseInner<P>);

impl<P: SchemeParams> Session for Phase<P> {
    type Output = Config<P>;

    fn id(&self) -> &PartyId {
        dispatch_keygen!(&self.0, state => state.own_id())
    }

    fn expected_round(&self) -> u8 {
        dispatch_keygen!(&self.0, state => state.round_num())
    }

    fn process_message(&mut self, rng: &mut impl CryptoRngCore, message: &Message) -> Result<(), KeygenError> {
        dispatch_keygen!(&mut self.0, state => state.process_message(rng, message))
    }

    fn missing_messages(&self) -> BTreeSet<PartyId> {
        dispatch_keygen!(&self.0, state => state.missing_messages())
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        out: &mut Vec<Message>,
    ) -> Result<FinalizeOutcome<Self>, FinalizeError<Self>> {
        let missing = self.missing_messages();
        if !missing.is_empty() {
            return Err(FinalizeError::NotReady { session: self, missing });
        }

        let next = match self.0 {
            PhaseInner::Round1(state) => PhaseInner::Round2(RoundState::new(state.finalize(rng, out)?)),
            PhaseInner::Round2(state) => PhaseInner::Round3(RoundState::new(state.finalize(rng, out)?)),
            PhaseInner::Round3(state) => PhaseInner::Round4(RoundState::new(state.finalize(rng, out)?)),
            PhaseInner::Round4(state) => PhaseInner::Round5(RoundState::new(state.finalize(rng, out)?)),
            PhaseInner::Round5(state) => PhaseInner::Output(RoundState::new(state.finalize(rng, out)?)),
            PhaseInner::Output(state) => return Ok(FinalizeOutcome::Success(state.finalize(rng, out)?)),
        };
        Ok(FinalizeOutcome::AnotherRound(Phase(next)))
    }
}

impl<P: SchemeParams> fmt::Debug for Phase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("id", self.id())
            .field("round", &self.expected_round())
            .finish()
    }
}

/// The state of one party in a signing session.
pub struct SigningPhase<P: SchemeParams>(SigningPhaseInner<P>);

impl<P: SchemeParams> Session for SigningPhase<P> {
    type Output = RecoverableSignature;

    fn id(&self) -> &PartyId {
        dispatch_signing!(&self.0, state => state.own_id())
    }

    fn expected_round(&self) -> u8 {
        dispatch_signing!(&self.0, state => state.round_num())
    }

    fn process_message(&mut self, rng: &mut impl CryptoRngCore, message: &Message) -> Result<(), KeygenError> {
        dispatch_signing!(&mut self.0, state => state.process_message(rng, message))
    }

    fn missing_messages(&self) -> BTreeSet<PartyId> {
        dispatch_signing!(&self.0, state => state.missing_messages())
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        out: &mut Vec<Message>,
    ) -> Result<FinalizeOutcome<Self>, FinalizeError<Self>> {
        let missing = self.missing_messages();
        if !missing.is_empty() {
            return Err(FinalizeError::NotReady { session: self, missing });
        }

        let next = match self.0 {
            SigningPhaseInner::Round1(state) => SigningPhaseInner::Round2(RoundState::new(state.finalize(rng, out)?)),
            SigningPhaseInner::Round2(state) => SigningPhaseInner::Round3(RoundState::new(state.finalize(rng, out)?)),
            SigningPhaseInner::Round3(state) => SigningPhaseInner::Round4(RoundState::new(state.finalize(rng, out)?)),
            SigningPhaseInner::Round4(state) => SigningPhaseInner::Output(RoundState::new(state.finalize(rng, out)?)),
            SigningPhaseInner::Output(state) => return Ok(FinalizeOutcome::Success(state.finalize(rng, out)?)),
        };
        Ok(FinalizeOutcome::AnotherRound(SigningPhase(next)))
    }
}

impl<P: SchemeParams> fmt::Debug for SigningPhase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningPhase")
            .field("id", self.id())
            .field("round", &self.expected_round())
            .finish()
    }
}

/// Assigns evaluation points to the parties, checking that the set is usable.
fn share_ids(ids: &[PartyId], own_id: &PartyId) -> Result<BTreeMap<PartyId, ShareId>, InitError> {
    if ids.len() < 2 {
        return Err(InitError::TooFewParties);
    }

    let mut share_ids = BTreeMap::new();
    let mut owners = BTreeMap::<ShareId, &PartyId>::new();
    for id in ids {
        let share_id = id.share_id().ok_or_else(|| InitError::InvalidPartyId(id.clone()))?;
        if share_ids.insert(id.clone(), share_id).is_some() {
            return Err(InitError::DuplicateParty(id.clone()));
        }
        if let Some(other) = owners.insert(share_id, id) {
            return Err(InitError::ShareIdCollision(other.clone(), id.clone()));
        }
    }

    if !share_ids.contains_key(own_id) {
        return Err(InitError::UnknownOwnId(own_id.clone()));
    }

    Ok(share_ids)
}

/// Derives the session id all the parties must agree on.
fn session_id<P: SchemeParams>(
    kind: ProtocolKind,
    shared_randomness: &[u8],
    share_ids: &BTreeMap<PartyId, ShareId>,
    threshold: u32,
    previous: Option<&PublicPart<P>>,
) -> HashOutput {
    let ids = share_ids.keys().collect::<BTreeSet<_>>();
    let hasher = chain_scheme_params::<P, _>(Hasher::<P>::new_with_dst(b"SessionId").chain(&kind))
        .chain_type::<Curve>()
        .chain(&threshold)
        .chain(&ids)
        .chain_bytes(shared_randomness);
    match previous {
        Some(public) => hasher.chain(public),
        None => hasher,
    }
    .finalize()
}

/// Starts a key generation session for the party `own_id` out of `ids`.
///
/// `threshold` is the degree of the sharing polynomial: any `threshold + 1` parties can
/// reconstruct the key. `shared_randomness` must be the same for all the parties and
/// must not have been used in another session.
pub fn make_keygen_session<P: SchemeParams>(
    shared_randomness: &[u8],
    ids: &[PartyId],
    own_id: &PartyId,
    threshold: u32,
) -> Result<Phase<P>, InitError> {
    let share_ids = share_ids(ids, own_id)?;
    if threshold as usize >= share_ids.len() {
        return Err(InitError::InvalidThreshold(threshold));
    }

    let kind = ProtocolKind::Keygen;
    let ssid = session_id::<P>(kind, shared_randomness, &share_ids, threshold, None);
    tracing::debug!("{own_id}: starting {kind:?} with {} parties", share_ids.len());

    let context = Context {
        kind,
        my_id: own_id.clone(),
        share_ids,
        threshold,
        ssid,
        previous: None,
    };
    Ok(Phase(PhaseInner::Round1(RoundState::new(Round1::new(context)))))
}

/// Starts a key refresh session for the owner of `config`.
///
/// The parties and the threshold are those of the config; the resulting configs
/// share the same public key, while all the secret shares and Paillier keys are new.
pub fn make_refresh_session<P: SchemeParams>(
    shared_randomness: &[u8],
    config: Config<P>,
) -> Result<Phase<P>, InitError> {
    config.validate().map_err(InitError::InvalidConfig)?;

    let ids = config.ids().into_iter().collect::<Vec<_>>();
    let share_ids = share_ids(&ids, config.id())?;
    let threshold = config.threshold();
    if threshold as usize >= share_ids.len() {
        return Err(InitError::InvalidThreshold(threshold));
    }

    let kind = ProtocolKind::Refresh;
    let ssid = session_id(kind, shared_randomness, &share_ids, threshold, Some(config.public_part()));
    tracing::debug!("{}: starting {kind:?} with {} parties", config.id(), share_ids.len());

    let context = Context {
        kind,
        my_id: config.id().clone(),
        share_ids,
        threshold,
        ssid,
        previous: Some(Previous {
            secret: config.secret_share().clone(),
            public_shares: config.public_part().public_shares(),
        }),
    };
    Ok(Phase(PhaseInner::Round1(RoundState::new(Round1::new(context)))))
}

/// Starts a signing session for the owner of `config`, signing `prehashed_message` together with `signers`.
///
/// `signers` must be a subset of the config's parties of more than `threshold` parties, including the owner.
/// `shared_randomness` must be the same for all the signers and must not have been used in another session.
pub fn make_signing_session<P: SchemeParams>(
    shared_randomness: &[u8],
    config: &Config<P>,
    signers: &[PartyId],
    prehashed_message: &[u8; 32],
) -> Result<SigningPhase<P>, InitError> {
    config.validate().map_err(InitError::InvalidConfig)?;

    let public_data = config.public_part().public_data();
    let mut signer_ids = BTreeSet::new();
    for id in signers {
        if !public_data.contains_key(id) {
            return Err(InitError::UnknownSigner(id.clone()));
        }
        if !signer_ids.insert(id.clone()) {
            return Err(InitError::DuplicateParty(id.clone()));
        }
    }
    if !signer_ids.contains(config.id()) {
        return Err(InitError::UnknownOwnId(config.id().clone()));
    }
    if signer_ids.len() <= config.threshold() as usize {
        return Err(InitError::TooFewSigners(signer_ids.len()));
    }

    // Both are checked by `Config::validate()`.
    let share_ids = signer_ids
        .iter()
        .map(|id| {
            let share_id = id.share_id().ok_or_else(|| InitError::InvalidPartyId(id.clone()))?;
            Ok((id.clone(), share_id))
        })
        .collect::<Result<BTreeMap<_, _>, InitError>>()?;

    // Turn the Shamir shares into additive ones for this set of signers.
    let mut public_shares = BTreeMap::new();
    let mut rp_params = BTreeMap::new();
    for (id, share_id) in share_ids.iter() {
        let data = public_data.get(id).ok_or_else(|| InitError::UnknownSigner(id.clone()))?;
        let coeff = interpolation_coeff(share_ids.values(), share_id);
        public_shares.insert(id.clone(), data.public_share() * &coeff);
        rp_params.insert(id.clone(), data.rp_params().clone());
    }
    let own_coeff = interpolation_coeff(
        share_ids.values(),
        share_ids
            .get(config.id())
            .ok_or_else(|| InitError::UnknownOwnId(config.id().clone()))?,
    );
    let key_share = Secret::init_with(|| *config.secret_share().expose_secret() * own_coeff);
    let public_key = public_shares.values().sum::<Point>();

    let ssid = chain_scheme_params::<P, _>(Hasher::<P>::new_with_dst(b"SigningSessionId"))
        .chain_type::<Curve>()
        .chain(&signer_ids)
        .chain(config.public_part())
        .chain_bytes(prehashed_message)
        .chain_bytes(shared_randomness)
        .finalize();
    tracing::debug!("{}: starting signing with {} signers", config.id(), signer_ids.len());

    let context = signing::Context {
        my_id: config.id().clone(),
        ssid,
        message: Scalar::from_prehash(prehashed_message),
        key_share,
        public_shares,
        public_key,
        paillier_sk: SecretKeyPaillier::from_primes(config.secret.paillier_primes.clone()),
        rp_params,
    };
    Ok(SigningPhase(SigningPhaseInner::Round1(RoundState::new(
        signing::Round1::new(context),
    ))))
}
