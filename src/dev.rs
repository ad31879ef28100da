//! Utilities for testing and experimenting: non-secure parameters, a centralized dealer,
//! and an in-memory driver.
//!
//! **Nothing here is suitable for production use.**

use alloc::{collections::BTreeMap, vec::Vec};

use k256::ecdsa::SigningKey;
use rand_core::CryptoRngCore;

use crate::{
    curve::Scalar,
    entities::{Config, PartyId, PublicData, PublicPart, SecretData},
    paillier::{RPParams, RPSecret, SecretKeyPaillier},
    params::SchemeParams,
    rounds::{route, FinalizeOutcome, InitError, RoundError, Session},
    tools::{
        sss::{Polynomial, ShareId},
        Rid, Secret,
    },
};

pub use crate::params::dev::{PaillierTest, TestParams};

/// Runs a session for all the given parties in lockstep, delivering every message instantly.
///
/// Each party's state is finalized, the produced messages are routed to their recipients,
/// and each recipient processes its inbox, until every party has produced its output.
/// Returns the first error encountered.
pub fn run_sync<S: Session>(
    rng: &mut impl CryptoRngCore,
    sessions: BTreeMap<PartyId, S>,
) -> Result<BTreeMap<PartyId, S::Output>, RoundError> {
    let mut sessions = sessions;
    let mut outputs = BTreeMap::new();

    loop {
        let mut messages = Vec::new();
        let mut next = BTreeMap::new();
        for (id, session) in sessions {
            match session.finalize(rng, &mut messages)? {
                FinalizeOutcome::AnotherRound(session) => {
                    next.insert(id, session);
                }
                FinalizeOutcome::Success(output) => {
                    outputs.insert(id, output);
                }
            }
        }

        if next.is_empty() {
            return Ok(outputs);
        }

        let mut inboxes = route(messages, next.keys());
        for (id, session) in next.iter_mut() {
            for message in inboxes.remove(id).unwrap_or_default() {
                session.process_message(rng, &message)?;
            }
        }
        sessions = next;
    }
}

/// Returns a set of self-consistent configs for the parties `ids`,
/// as if they had run a key generation with the given `threshold`.
///
/// If `signing_key` is given, the configs share it; otherwise a random key is used.
/// The dealer knows the whole key, so this is only useful for tests and benchmarks.
pub fn make_configs<P: SchemeParams>(
    rng: &mut impl CryptoRngCore,
    ids: &[PartyId],
    threshold: u32,
    signing_key: Option<&SigningKey>,
) -> Result<BTreeMap<PartyId, Config<P>>, InitError> {
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
    if share_ids.len() < 2 {
        return Err(InitError::TooFewParties);
    }
    if threshold as usize >= share_ids.len() {
        return Err(InitError::InvalidThreshold(threshold));
    }

    let secret = match signing_key {
        None => Scalar::random(rng),
        Some(sk) => Scalar::from(sk.as_nonzero_scalar()),
    };
    let polynomial = Polynomial::random(rng, Secret::init_with(|| secret), threshold as usize);

    let mut secrets = BTreeMap::new();
    let mut public = BTreeMap::new();
    for (id, share_id) in share_ids.iter() {
        let paillier_sk = SecretKeyPaillier::<P::Paillier>::random(rng);
        let rp_secret = RPSecret::random(rng, &paillier_sk);
        let rp_params = RPParams::random_with_secret(rng, &paillier_sk, &rp_secret);
        let share = polynomial.evaluate(share_id);

        public.insert(
            id.clone(),
            PublicData {
                ecdsa: share.expose_secret().mul_by_generator(),
                rp_params,
            },
        );
        secrets.insert(id.clone(), (share, paillier_sk));
    }

    let public = PublicPart {
        threshold,
        rid: Rid::random(rng),
        public,
    };

    Ok(secrets
        .into_iter()
        .map(|(id, (share, paillier_sk))| {
            let config = Config {
                secret: SecretData {
                    id: id.clone(),
                    ecdsa: share,
                    paillier_primes: paillier_sk.primes().clone(),
                },
                public: public.clone(),
            };
            (id, config)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use k256::ecdsa::SigningKey;
    use rand_core::OsRng;

    use super::{make_configs, TestParams};
    use crate::{entities::PartyId, rounds::InitError};

    fn ids() -> Vec<PartyId> {
        ["alice", "bob", "carol"].into_iter().map(PartyId::from).collect()
    }

    #[test]
    fn make_configs_for_signing_key() {
        let sk = SigningKey::random(&mut OsRng);
        let configs = make_configs::<TestParams>(&mut OsRng, &ids(), 1, Some(&sk)).unwrap();
        assert_eq!(configs.len(), 3);
        for config in configs.values() {
            config.validate().unwrap();
            assert_eq!(config.verifying_key().as_ref(), Some(sk.verifying_key()));
        }
    }

    #[test]
    fn make_configs_errors() {
        let ids = ids();
        assert_eq!(
            make_configs::<TestParams>(&mut OsRng, &ids, 3, None).unwrap_err(),
            InitError::InvalidThreshold(3)
        );
        assert_eq!(
            make_configs::<TestParams>(&mut OsRng, &ids[..1], 0, None).unwrap_err(),
            InitError::TooFewParties
        );
        let colliding = [PartyId::new("alice"), PartyId::new("\0alice")];
        assert_eq!(
            make_configs::<TestParams>(&mut OsRng, &colliding, 1, None).unwrap_err(),
            InitError::ShareIdCollision(PartyId::new("alice"), PartyId::new("\0alice"))
        );
    }
}
