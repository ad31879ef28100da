//! Parameters intended for testing, scaled down to small integer sizes.

use crypto_bigint::{modular::MontyForm, nlimbs, Uint};
use serde::{Deserialize, Serialize};
use sha3::Shake256;

use super::traits::SchemeParams;
use crate::paillier::PaillierParams;

/// Paillier parameters **for testing purposes only**.
/// Security is weakened to allow for faster execution.
///
/// The primes are just long enough for the modulus to hold the product of two curve scalars
/// with the signing masks on top, so that the multiplicative-to-additive conversion does not wrap around.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierTest;

impl PaillierParams for PaillierTest {
    const PRIME_BITS: u32 = 397;
    type HalfUint = Uint<{ nlimbs!(512) }>;
    type HalfUintMod = MontyForm<{ nlimbs!(512) }>;
    type Uint = Uint<{ nlimbs!(1024) }>;
    type UintMod = MontyForm<{ nlimbs!(1024) }>;
    type WideUint = Uint<{ nlimbs!(2048) }>;
    type WideUintMod = MontyForm<{ nlimbs!(2048) }>;
}

static_assertions::const_assert!(PaillierTest::SELF_CONSISTENT);

/// Scheme parameters **for testing purposes only**.
/// Security is weakened to allow for faster execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TestParams;

impl SchemeParams for TestParams {
    type Digest = Shake256;
    const SECURITY_BITS: usize = 16;
    type Paillier = PaillierTest;
    const L_BOUND: u32 = 256;
    const LP_BOUND: u32 = 256;
    const EPS_BOUND: u32 = 320;
}

static_assertions::const_assert!(TestParams::SELF_CONSISTENT);
