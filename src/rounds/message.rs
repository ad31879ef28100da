use alloc::{boxed::Box, collections::BTreeMap, format, string::String, vec::Vec};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_encoded_bytes::{Base64, SliceLike};

use super::error::LocalError;
use crate::entities::PartyId;

/// A message produced by a party when finalizing a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    from: PartyId,
    to: Vec<PartyId>,
    round: u8,
    #[serde(with = "SliceLike::<Base64>")]
    content: Box<[u8]>,
}

impl Message {
    pub(crate) fn new(from: &PartyId, to: Vec<PartyId>, round: u8, content: &impl Serialize) -> Result<Self, LocalError> {
        let content = bincode::serde::encode_to_vec(content, bincode::config::standard())
            .map_err(|err| LocalError::Serialization(format!("{err}")))?;
        Ok(Self {
            from: from.clone(),
            to,
            round,
            content: content.into(),
        })
    }

    pub(crate) fn broadcast(from: &PartyId, round: u8, content: &impl Serialize) -> Result<Self, LocalError> {
        Self::new(from, Vec::new(), round, content)
    }

    pub(crate) fn direct(from: &PartyId, to: &PartyId, round: u8, content: &impl Serialize) -> Result<Self, LocalError> {
        Self::new(from, [to.clone()].into(), round, content)
    }

    pub(crate) fn decode_content<T: DeserializeOwned>(&self) -> Result<T, String> {
        let (content, length) = bincode::serde::decode_from_slice(&self.content, bincode::config::standard())
            .map_err(|err| format!("{err}"))?;
        if length != self.content.len() {
            return Err("Trailing bytes after the message content".into());
        }
        Ok(content)
    }

    /// The sender.
    pub fn from(&self) -> &PartyId {
        &self.from
    }

    /// The recipients; empty for a broadcast.
    pub fn to(&self) -> &[PartyId] {
        &self.to
    }

    /// Returns `true` if this is a broadcast.
    pub fn is_broadcast(&self) -> bool {
        self.to.is_empty()
    }

    /// The number of the round that must process this message.
    pub fn round(&self) -> u8 {
        self.round
    }

    /// Returns `true` if this message was addressed to `id`, either explicitly or by a broadcast.
    /// This does not take the sender into account.
    pub fn is_addressed_to(&self, id: &PartyId) -> bool {
        self.is_broadcast() || self.to.contains(id)
    }

    /// Returns `true` if `id` should process this message:
    /// it is addressed to `id`, and `id` is not the sender.
    pub fn is_for(&self, id: &PartyId) -> bool {
        &self.from != id && self.is_addressed_to(id)
    }

    #[cfg(test)]
    pub(crate) fn with_round(self, round: u8) -> Self {
        Self { round, ..self }
    }

    #[cfg(test)]
    pub(crate) fn with_raw_content(self, content: Box<[u8]>) -> Self {
        Self { content, ..self }
    }

    #[cfg(test)]
    pub(crate) fn raw_content(&self) -> &[u8] {
        &self.content
    }
}

/// Distributes messages into per-party inboxes.
///
/// A broadcast is delivered to every party but its sender, a direct message to each of its recipients.
/// A message is never delivered to its own sender, and recipients outside of `ids` are ignored.
pub fn route<'a>(
    messages: impl IntoIterator<Item = Message>,
    ids: impl IntoIterator<Item = &'a PartyId>,
) -> BTreeMap<PartyId, Vec<Message>> {
    let mut inboxes = ids
        .into_iter()
        .map(|id| (id.clone(), Vec::new()))
        .collect::<BTreeMap<_, _>>();
    for message in messages {
        for (id, inbox) in inboxes.iter_mut() {
            if message.is_for(id) {
                inbox.push(message.clone());
            }
        }
    }
    inboxes
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{route, Message};
    use crate::entities::PartyId;

    fn ids() -> [PartyId; 3] {
        [PartyId::new("a"), PartyId::new("b"), PartyId::new("c")]
    }

    #[test]
    fn broadcast_skips_sender() {
        let [a, b, c] = ids();
        let message = Message::broadcast(&a, 1, &42u32).unwrap();
        assert!(!message.is_for(&a));
        assert!(message.is_for(&b));

        let inboxes = route([message], &ids());
        assert!(inboxes[&a].is_empty());
        assert_eq!(inboxes[&b].len(), 1);
        assert_eq!(inboxes[&c].len(), 1);
    }

    #[test]
    fn direct_reaches_recipients_only() {
        let [a, b, c] = ids();
        let message = Message::direct(&a, &b, 1, &42u32).unwrap();
        // Even a message explicitly addressed to the sender is not delivered back.
        let to_self = Message::new(&a, vec![a.clone(), c.clone()], 1, &1u8).unwrap();

        let inboxes = route([message, to_self], &ids());
        assert!(inboxes[&a].is_empty());
        assert_eq!(inboxes[&b].len(), 1);
        assert_eq!(inboxes[&c].len(), 1);
        assert_eq!(inboxes[&c][0].decode_content::<u8>(), Ok(1));
    }

    #[test]
    fn content_decoding() {
        let [a, ..] = ids();
        let message = Message::broadcast(&a, 2, &(1u32, 2u64)).unwrap();
        assert_eq!(message.decode_content::<(u32, u64)>(), Ok((1, 2)));
        assert!(message.decode_content::<(u32, u64, u8)>().is_err());
        assert!(message.decode_content::<u32>().is_err());
    }
}
