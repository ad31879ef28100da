use std::collections::BTreeMap;

use rand::Rng;
use rand_core::OsRng;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use cmp_keygen::{
    dev::{run_sync, TestParams},
    k256::ecdsa::signature::hazmat::PrehashVerifier,
    make_keygen_session, make_refresh_session, make_signing_session, Config, FinalizeOutcome, Message, PartyId,
    RoundError, Session,
};

async fn run_session<S: Session>(tx: mpsc::Sender<Message>, rx: mpsc::Receiver<Message>, phase: S) -> S::Output {
    let mut rx = rx;
    let mut phase = phase;

    // Messages for later rounds can arrive before this party is done with the current one.
    let mut cached_messages = Vec::<Message>::new();

    let id = phase.id().clone();

    loop {
        println!("{id}: *** starting round {} ***", phase.expected_round());

        let (current, later): (Vec<_>, Vec<_>) = cached_messages
            .into_iter()
            .partition(|message| message.round() == phase.expected_round());
        cached_messages = later;

        for message in current {
            println!("{id}: applying a cached message from {}", message.from());
            phase.process_message(&mut OsRng, &message).unwrap();
        }

        while !phase.can_finalize() {
            // This can be checked if a timeout expired, to see which nodes have not responded yet.
            let unresponsive_parties = phase.missing_messages();
            assert!(!unresponsive_parties.is_empty());

            println!("{id}: waiting for a message");
            let message = rx.recv().await.unwrap();

            if message.round() > phase.expected_round() {
                println!("{id}: caching a message from {}", message.from());
                cached_messages.push(message);
                continue;
            }

            println!("{id}: applying a message from {}", message.from());
            phase.process_message(&mut OsRng, &message).unwrap();
        }

        println!("{id}: finalizing the round");

        let mut out = Vec::new();
        match phase.finalize(&mut OsRng, &mut out).map_err(RoundError::from).unwrap() {
            FinalizeOutcome::Success(output) => break output,
            FinalizeOutcome::AnotherRound(next) => {
                for message in out {
                    tx.send(message).await.unwrap();
                }
                phase = next;
            }
        }
    }
}

async fn message_dispatcher(txs: BTreeMap<PartyId, mpsc::Sender<Message>>, rx: mpsc::Receiver<Message>) {
    let mut rx = rx;
    let mut messages = Vec::<Message>::new();
    loop {
        let msg = match rx.recv().await {
            Some(msg) => msg,
            None => break,
        };
        messages.push(msg);

        while let Ok(msg) = rx.try_recv() {
            messages.push(msg)
        }

        while !messages.is_empty() {
            // Pull a random message from the list,
            // to increase the chances that they are delivered out of order.
            let message_idx = rand::thread_rng().gen_range(0..messages.len());
            let message = messages.swap_remove(message_idx);

            for (id, tx) in txs.iter() {
                if message.is_for(id) {
                    tx.send(message.clone()).await.unwrap();
                }
            }

            // Give up execution so that the tasks could process messages.
            sleep(Duration::from_millis(0)).await;

            if let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            };
        }
    }
}

async fn run_nodes<S>(phases: Vec<S>) -> BTreeMap<PartyId, S::Output>
where
    S: Session + Send + 'static,
    S::Output: Send + 'static,
{
    let num_parties = phases.len();
    let ids = phases.iter().map(|phase| phase.id().clone()).collect::<Vec<_>>();

    let (dispatcher_tx, dispatcher_rx) = mpsc::channel::<Message>(100);

    let channels = (0..num_parties).map(|_| mpsc::channel::<Message>(100));
    let (txs, rxs): (Vec<mpsc::Sender<Message>>, Vec<mpsc::Receiver<Message>>) = channels.unzip();
    let tx_map = ids.iter().cloned().zip(txs).collect();

    let dispatcher_task = message_dispatcher(tx_map, dispatcher_rx);
    let dispatcher = tokio::spawn(dispatcher_task);

    let handles: Vec<tokio::task::JoinHandle<S::Output>> = rxs
        .into_iter()
        .zip(phases)
        .map(|(rx, phase)| {
            let node_task = run_session(dispatcher_tx.clone(), rx, phase);
            tokio::spawn(node_task)
        })
        .collect();

    // Drop the last copy of the dispatcher's incoming channel so that it could finish.
    drop(dispatcher_tx);

    let mut results = BTreeMap::new();
    for (id, handle) in ids.into_iter().zip(handles) {
        results.insert(id, handle.await.unwrap());
    }

    dispatcher.await.unwrap();

    results
}

fn party_ids() -> Vec<PartyId> {
    ["alice", "bob", "carol"].into_iter().map(PartyId::from).collect()
}

fn check_consistency(configs: &BTreeMap<PartyId, Config<TestParams>>) {
    let first = configs.values().next().unwrap();
    for (id, config) in configs {
        assert_eq!(config.id(), id);
        assert_eq!(config.public_part(), first.public_part());
        assert_eq!(config.ids(), party_ids().into_iter().collect());
        config.validate().unwrap();
    }
    assert!(first.verifying_key().is_some());
}

#[tokio::test]
async fn keygen_and_refresh() {
    let ids = party_ids();
    let shared_randomness = b"1234567890";

    let phases = ids
        .iter()
        .map(|id| make_keygen_session::<TestParams>(shared_randomness, &ids, id, 1).unwrap())
        .collect::<Vec<_>>();
    let configs = run_nodes(phases).await;
    check_consistency(&configs);

    let phases = configs
        .values()
        .map(|config| make_refresh_session(b"0987654321", config.clone()).unwrap())
        .collect::<Vec<_>>();
    let refreshed = run_nodes(phases).await;
    check_consistency(&refreshed);

    for (id, config) in refreshed.iter() {
        assert_eq!(config.public_key(), configs[id].public_key());
        assert_eq!(config.public_part().threshold(), 1);
        assert_ne!(
            config.public_part().public_shares()[id],
            configs[id].public_part().public_shares()[id]
        );
    }
}

#[tokio::test]
async fn keygen_then_sign() {
    let ids = party_ids();
    let phases = ids
        .iter()
        .map(|id| make_keygen_session::<TestParams>(b"keygen", &ids, id, 1).unwrap())
        .collect::<Vec<_>>();
    let configs = run_nodes(phases).await;
    check_consistency(&configs);

    let message = b"prehashed message to be signed!!";
    let signers = [PartyId::from("alice"), PartyId::from("carol")];
    let phases = signers
        .iter()
        .map(|id| make_signing_session(b"signing", &configs[id], &signers, message).unwrap())
        .collect::<Vec<_>>();
    let signatures = run_nodes(phases).await;

    let verifying_key = configs[&signers[0]].verifying_key().unwrap();
    for signature in signatures.values() {
        verifying_key.verify_prehash(message, signature.signature()).unwrap();
    }
}

#[test]
fn keygen_with_maximal_threshold() {
    let ids = party_ids();
    let phases = ids
        .iter()
        .map(|id| {
            let phase = make_keygen_session::<TestParams>(b"sync", &ids, id, 2).unwrap();
            (id.clone(), phase)
        })
        .collect::<BTreeMap<_, _>>();
    let configs = run_sync(&mut OsRng, phases).unwrap();
    check_consistency(&configs);

    let config = configs.values().next().unwrap();
    assert_eq!(config.threshold(), 2);
    assert_eq!(config.public_part().public_shares().len(), 3);

    // A config survives a serialization round trip.
    let bytes = bincode::serde::encode_to_vec(config, bincode::config::standard()).unwrap();
    let (decoded, _len): (Config<TestParams>, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
    assert_eq!(decoded.public_part(), config.public_part());
    assert_eq!(decoded.id(), config.id());
    decoded.validate().unwrap();
}
