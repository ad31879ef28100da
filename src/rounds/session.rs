use alloc::{collections::BTreeSet, vec::Vec};

use derive_where::derive_where;
use rand_core::CryptoRngCore;

use super::{
    error::{KeygenError, KeygenErrorKind, RoundError},
    message::Message,
};
use crate::entities::PartyId;

/// The state of one party in a multi-round session.
///
/// Messages for the current round are fed with [`Session::process_message`];
/// once [`Session::can_finalize`] returns `true`, [`Session::finalize`] moves the party to the next round.
pub trait Session: Sized {
    /// What the session produces on success.
    type Output;

    /// The id of the party this state belongs to.
    fn id(&self) -> &PartyId;

    /// The round number of the messages this state accepts.
    fn expected_round(&self) -> u8;

    /// Verifies a message addressed to this party and records its result.
    ///
    /// On error the message is discarded and the state is left unchanged,
    /// so the caller may keep processing messages from other parties.
    fn process_message(&mut self, rng: &mut impl CryptoRngCore, message: &Message) -> Result<(), KeygenError>;

    /// The parties this state still expects a message from.
    fn missing_messages(&self) -> BTreeSet<PartyId>;

    /// Returns `true` if messages from all the expected parties have been processed.
    fn can_finalize(&self) -> bool {
        self.missing_messages().is_empty()
    }

    /// Finishes the current round, placing the messages for the other parties into `out`.
    ///
    /// If some messages are still missing, nothing is sent, and the state is returned intact
    /// in [`FinalizeError::NotReady`].
    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        out: &mut Vec<Message>,
    ) -> Result<FinalizeOutcome<Self>, FinalizeError<Self>>;
}

/// The result of finalizing a round.
#[derive_where(Debug; S, S::Output)]
#[allow(clippy::large_enum_variant)]
pub enum FinalizeOutcome<S: Session> {
    /// The session continues.
    AnotherRound(S),
    /// The session is complete.
    Success(S::Output),
}

/// Errors when finalizing a round.
#[derive(Debug)]
pub enum FinalizeError<S> {
    /// Some of the expected messages have not been processed yet.
    NotReady {
        /// The unchanged state.
        session: S,
        /// The parties whose messages are missing.
        missing: BTreeSet<PartyId>,
    },
    /// The round failed.
    Round(RoundError),
}

impl<S> From<RoundError> for FinalizeError<S> {
    fn from(error: RoundError) -> Self {
        Self::Round(error)
    }
}

impl<S: Session> From<FinalizeError<S>> for RoundError {
    fn from(error: FinalizeError<S>) -> Self {
        match error {
            FinalizeError::NotReady { session, missing } => {
                let party = missing.first().unwrap_or(session.id());
                KeygenError::new(party, KeygenErrorKind::MissingMessages(missing.clone())).into()
            }
            FinalizeError::Round(error) => error,
        }
    }
}
