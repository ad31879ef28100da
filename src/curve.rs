//! This module is an adapter to the ECC backend.
//! `elliptic_curves` has a somewhat unstable API,
//! and we isolate all the related logic here.

mod arithmetic;
mod ecdsa;

pub use arithmetic::{Point, Scalar};
pub(crate) use arithmetic::{Curve, ORDER};
pub use ecdsa::RecoverableSignature;
