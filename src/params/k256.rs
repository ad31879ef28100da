//! Scheme parameters for production use with the Secp256k1 curve.

use crypto_bigint::{modular::MontyForm, nlimbs, Uint};
use serde::{Deserialize, Serialize};
use sha3::Shake256;

use super::traits::SchemeParams;
use crate::paillier::PaillierParams;

/// Paillier parameters corresponding to 112 bits of security.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierProduction112;

impl PaillierParams for PaillierProduction112 {
    const PRIME_BITS: u32 = 1024;
    type HalfUint = Uint<{ nlimbs!(1024) }>;
    type HalfUintMod = MontyForm<{ nlimbs!(1024) }>;
    type Uint = Uint<{ nlimbs!(2048) }>;
    type UintMod = MontyForm<{ nlimbs!(2048) }>;
    type WideUint = Uint<{ nlimbs!(4096) }>;
    type WideUintMod = MontyForm<{ nlimbs!(4096) }>;
}

static_assertions::const_assert!(PaillierProduction112::SELF_CONSISTENT);

/// Production strength parameters corresponding to 112 bits of security.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Ord, PartialOrd)]
pub struct ProductionParams112;

impl SchemeParams for ProductionParams112 {
    type Digest = Shake256;
    const SECURITY_BITS: usize = 112;
    type Paillier = PaillierProduction112;
    const L_BOUND: u32 = 256;
    const LP_BOUND: u32 = Self::L_BOUND * 5;
    const EPS_BOUND: u32 = Self::L_BOUND * 2;
}

static_assertions::const_assert!(ProductionParams112::SELF_CONSISTENT);
