//! A running hash state binding proof challenges to a session.

use derive_where::derive_where;

use super::hashing::{Chain, HashOutput, Hashable, Hasher};
use crate::{entities::PartyId, params::SchemeParams};

const TRANSCRIPT_DST: &[u8] = b"Transcript";

/// An evolving hash state seeded with a session identifier.
///
/// Values written into it are appended to the state; the state itself is never finalized,
/// so a snapshot of it can be taken at any point with [`Transcript::digest`].
#[derive_where(Clone)]
pub(crate) struct Transcript<P: SchemeParams> {
    hasher: Hasher<P>,
}

impl<P: SchemeParams> Transcript<P> {
    pub fn new(ssid: &HashOutput) -> Self {
        Self {
            hasher: Hasher::new_with_dst(TRANSCRIPT_DST).chain(ssid),
        }
    }

    /// Appends `value` to the state.
    pub fn write(&mut self, value: &impl Hashable) {
        let hasher = self.hasher.clone();
        self.hasher = hasher.chain(value);
    }

    /// Returns a copy of the state with `id` appended, to bind a proof to its prover.
    pub fn for_party(&self, id: &PartyId) -> Self {
        let mut transcript = self.clone();
        transcript.write(id);
        transcript
    }

    /// Returns the output of the current state, leaving the state intact.
    pub fn digest(&self) -> HashOutput {
        self.hasher.clone().finalize()
    }
}

impl<P: SchemeParams> core::fmt::Debug for Transcript<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Transcript({:?})", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::Transcript;
    use crate::{dev::TestParams, entities::PartyId, tools::hashing::Hasher};

    fn transcript() -> Transcript<TestParams> {
        let ssid = Hasher::<TestParams>::new_with_dst(b"SSID").finalize();
        Transcript::new(&ssid)
    }

    #[test]
    fn for_party_binds_identity() {
        let transcript = transcript();
        let alice = PartyId::new("alice");
        let bob = PartyId::new("bob");

        assert_ne!(
            transcript.for_party(&alice).digest(),
            transcript.for_party(&bob).digest()
        );
        // Taking a per-party snapshot does not advance the state.
        assert_eq!(transcript.digest(), transcript.clone().digest());
        assert_eq!(
            transcript.for_party(&alice).digest(),
            transcript.for_party(&alice).digest()
        );
    }

    #[test]
    fn writes_are_order_sensitive() {
        let mut t1 = transcript();
        t1.write(&1u8);
        t1.write(&2u8);

        let mut t2 = transcript();
        t2.write(&2u8);
        t2.write(&1u8);

        assert_ne!(t1.digest(), t2.digest());
    }

    #[test]
    fn streaming_writes_commute_with_snapshots() {
        // Writing a value and then binding an identity gives the same state
        // regardless of whether the prover or the verifier does it.
        let mut prover = transcript();
        let mut verifier = transcript();
        prover.write(b"config");
        verifier.write(b"config");

        let alice = PartyId::new("alice");
        assert_eq!(prover.for_party(&alice).digest(), verifier.for_party(&alice).digest());
    }
}
