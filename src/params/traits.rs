use core::fmt::Debug;

use crypto_bigint::Bounded;
use digest::{ExtendableOutput, Update};

use crate::{paillier::PaillierParams, tools::hashing::Chain};

/// The bit size of the curve order.
const ORDER_BITS: u32 = 256;

/// Key generation scheme parameters.
pub trait SchemeParams: 'static + Debug + Clone + Copy + Send + Sync + PartialEq + Eq {
    /// The number of bits of security provided by the scheme.
    ///
    /// Also used as the number of repetitions in the Paillier-Blum modulus
    /// and ring-Pedersen parameter proofs.
    const SECURITY_BITS: usize;
    /// The extendable output hash used for commitments, challenges and the session transcript.
    type Digest: Default + Clone + Update + ExtendableOutput;
    /// The parameters of the Paillier encryption.
    ///
    /// Note: `PaillierParams::Uint` must be able to contain the full range of `Scalar` values,
    /// so that an encrypted share is never reduced modulo the Paillier modulus.
    type Paillier: PaillierParams;

    /// The bound for secret values in the signing range proofs.
    const L_BOUND: u32; // $\ell$
    /// The bound for the additive masks in the multiplicative-to-additive conversion.
    const LP_BOUND: u32; // $\ell^\prime$
    /// The slackness of the range proofs.
    const EPS_BOUND: u32; // $\eps$

    /// Returns ``true`` if the parameters are compatible with each other.
    const SELF_CONSISTENT: bool = Self::SECURITY_BITS > 0
        && Self::SECURITY_BITS <= u32::MAX as usize
        && Self::Paillier::SELF_CONSISTENT
        // Any curve scalar is a valid secret, and the product of two of them with a mask on top
        // does not wrap around the Paillier modulus.
        && Self::L_BOUND >= ORDER_BITS
        && Self::Paillier::MODULUS_BITS > ORDER_BITS * 2 + 2
        && Self::Paillier::MODULUS_BITS > Self::LP_BOUND + 2
        // Range proof responses fit into signed integers.
        && Self::LP_BOUND + Self::EPS_BOUND + 2 < <<Self::Paillier as PaillierParams>::Uint as Bounded>::BITS
        && Self::L_BOUND + Self::EPS_BOUND + Self::Paillier::MODULUS_BITS + 2
            < <<Self::Paillier as PaillierParams>::WideUint as Bounded>::BITS;
}

pub(crate) fn chain_scheme_params<P, C>(digest: C) -> C
where
    P: SchemeParams,
    C: Chain,
{
    let security_bits = P::SECURITY_BITS as u64;
    digest
        .chain_bytes(b"SchemeParams")
        .chain(&security_bits)
        .chain(&P::Paillier::PRIME_BITS)
        .chain(&P::L_BOUND)
        .chain(&P::LP_BOUND)
        .chain(&P::EPS_BOUND)
}
