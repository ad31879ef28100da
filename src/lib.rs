#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]
#![cfg_attr(not(test), warn(clippy::unwrap_used, clippy::indexing_slicing))]

/*!
## Modules

[`dev`]: non-secure parameters, a centralized dealer, and an in-memory bulk-synchronous driver,
for tests and examples.

[`params`]: scheme parameters, including [`ProductionParams112`](`params::ProductionParams112`).
*/

extern crate alloc;

mod curve;
mod entities;
mod paillier;
mod protocols;
mod rounds;
mod tools;
mod uint;
mod zk;

pub mod dev;
pub mod params;

pub use ecdsa;
pub use k256;

pub use curve::{Point, RecoverableSignature, Scalar};
pub use entities::{Config, ConfigError, PartyId, PublicData, PublicPart};
pub use paillier::{PaillierParams, RPParams};
pub use params::SchemeParams;
pub use protocols::{
    make_keygen_session, make_refresh_session, make_signing_session, Phase, ProtocolKind, SigningPhase,
};
pub use rounds::{
    route, FinalizeError, FinalizeOutcome, InitError, KeygenError, KeygenErrorKind, LocalError, Message, RoundError,
    Session,
};
pub use tools::{hashing::HashOutput, Rid};
