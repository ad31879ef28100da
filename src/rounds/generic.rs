use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};

use rand_core::CryptoRngCore;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    error::{KeygenError, KeygenErrorKind, RoundError},
    message::Message,
};
use crate::entities::PartyId;

/// A single round of the protocol, as seen by one party.
pub(crate) trait Round: Sized {
    /// The number of this round; messages tagged with it are processed here.
    const ROUND_NUM: u8;

    /// The content of the messages this round processes.
    type Content: Serialize + DeserializeOwned;

    /// The verified data extracted from a message.
    type Payload;

    /// What finalizing the round produces.
    type Outcome;

    fn own_id(&self) -> &PartyId;

    /// The parties this round expects a message from.
    fn expecting_messages_from(&self) -> BTreeSet<PartyId>;

    /// Checks the content received from `from`.
    ///
    /// Does not record anything; that is done by [`RoundState`] on success.
    fn verify_message(
        &self,
        rng: &mut impl CryptoRngCore,
        from: &PartyId,
        content: Self::Content,
    ) -> Result<Self::Payload, KeygenErrorKind>;

    /// Aggregates the payloads (one from every expected sender) into the outcome,
    /// placing the messages for the next round into `out`.
    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        payloads: BTreeMap<PartyId, Self::Payload>,
        out: &mut Vec<Message>,
    ) -> Result<Self::Outcome, RoundError>;
}

/// A round together with the payloads accepted so far.
pub(crate) struct RoundState<R: Round> {
    round: R,
    payloads: BTreeMap<PartyId, R::Payload>,
}

impl<R: Round> RoundState<R> {
    pub fn new(round: R) -> Self {
        Self {
            round,
            payloads: BTreeMap::new(),
        }
    }

    pub fn own_id(&self) -> &PartyId {
        self.round.own_id()
    }

    pub fn round_num(&self) -> u8 {
        R::ROUND_NUM
    }

    pub fn process_message(&mut self, rng: &mut impl CryptoRngCore, message: &Message) -> Result<(), KeygenError> {
        let from = message.from();
        let structural = |reason: &str| KeygenError::new(from, KeygenErrorKind::Structural(reason.into()));

        if message.round() != R::ROUND_NUM {
            return Err(structural("unexpected round number"));
        }
        if from == self.round.own_id() {
            return Err(structural("a message from self"));
        }
        if !self.round.expecting_messages_from().contains(from) {
            return Err(structural("the sender is not expected to send messages in this round"));
        }
        if !message.is_addressed_to(self.round.own_id()) {
            return Err(structural("the message is not addressed to this party"));
        }
        if self.payloads.contains_key(from) {
            return Err(structural("a message from this sender has already been processed"));
        }

        let content = message
            .decode_content::<R::Content>()
            .map_err(|err| KeygenError::new(from, KeygenErrorKind::Structural(err)))?;

        let payload = self.round.verify_message(rng, from, content).map_err(|kind| {
            tracing::debug!(
                "{}: round {} message from {} rejected: {}",
                self.round.own_id(),
                R::ROUND_NUM,
                from,
                kind
            );
            KeygenError::new(from, kind)
        })?;

        tracing::trace!(
            "{}: round {} message from {} accepted",
            self.round.own_id(),
            R::ROUND_NUM,
            from
        );
        self.payloads.insert(from.clone(), payload);
        Ok(())
    }

    /// The parties whose messages have not been processed yet.
    pub fn missing_messages(&self) -> BTreeSet<PartyId> {
        self.round
            .expecting_messages_from()
            .into_iter()
            .filter(|id| !self.payloads.contains_key(id))
            .collect()
    }

    pub fn can_finalize(&self) -> bool {
        self.missing_messages().is_empty()
    }

    pub fn finalize(self, rng: &mut impl CryptoRngCore, out: &mut Vec<Message>) -> Result<R::Outcome, RoundError> {
        let missing = self.missing_messages();
        if let Some(first) = missing.first() {
            return Err(KeygenError::new(first, KeygenErrorKind::MissingMessages(missing.clone())).into());
        }

        tracing::debug!("{}: finalizing round {}", self.round.own_id(), R::ROUND_NUM);
        self.round.finalize(rng, self.payloads, out)
    }
}
