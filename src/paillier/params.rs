use core::fmt::Debug;

use crypto_bigint::{
    modular::Retrieve, subtle::CtOption, Bounded, InvMod, Integer, Invert, Monty, PowBoundedExp, RandomMod,
};
use crypto_primes::RandomPrimeWithRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::uint::{BoxedEncoding, Extendable, MulWide};

/// Integer sizes for the Paillier encryption and the ring-Pedersen parameters.
pub trait PaillierParams: 'static + Debug + PartialEq + Eq + Clone + Copy + Send + Sync {
    /// The size of one of the pair of RSA primes.
    const PRIME_BITS: u32;

    /// The size of the RSA modulus (a product of two primes).
    const MODULUS_BITS: u32 = Self::PRIME_BITS * 2;

    /// An integer that fits a single RSA prime.
    type HalfUint: Integer<Monty = Self::HalfUintMod>
        + Bounded
        + Copy
        + RandomMod
        + RandomPrimeWithRng
        + BoxedEncoding
        + MulWide<Self::HalfUint, Self::Uint>
        + Extendable<Self::Uint>
        + Serialize
        + for<'de> Deserialize<'de>
        + Zeroize;

    /// A modulo-residue counterpart of `HalfUint`.
    type HalfUintMod: Monty<Integer = Self::HalfUint>
        + Copy
        + Retrieve<Output = Self::HalfUint>
        + PowBoundedExp<Self::HalfUint>
        + Invert<Output = CtOption<Self::HalfUintMod>>;

    /// An integer that fits the RSA modulus.
    type Uint: Integer<Monty = Self::UintMod>
        + Bounded
        + Copy
        + InvMod<Output = Self::Uint>
        + RandomMod
        + RandomPrimeWithRng
        + BoxedEncoding
        + MulWide<Self::Uint, Self::WideUint>
        + Extendable<Self::WideUint>
        + Serialize
        + for<'de> Deserialize<'de>
        + Zeroize;

    /// A modulo-residue counterpart of `Uint`.
    type UintMod: Monty<Integer = Self::Uint>
        + Copy
        + Retrieve<Output = Self::Uint>
        + PowBoundedExp<Self::Uint>
        + PowBoundedExp<Self::WideUint>
        + Invert<Output = CtOption<Self::UintMod>>;

    /// An integer that fits the squared RSA modulus.
    /// Used for Paillier ciphertexts.
    type WideUint: Integer<Monty = Self::WideUintMod>
        + Bounded
        + Copy
        + RandomMod
        + BoxedEncoding
        + Serialize
        + for<'de> Deserialize<'de>;

    /// A modulo-residue counterpart of `WideUint`.
    type WideUintMod: Monty<Integer = Self::WideUint>
        + Copy
        + Retrieve<Output = Self::WideUint>
        + PowBoundedExp<Self::Uint>
        + Invert<Output = CtOption<Self::WideUintMod>>;

    /// Returns ``true`` if the integer types are wide enough for the declared bit sizes,
    /// and each type is exactly twice as wide as the previous one.
    const SELF_CONSISTENT: bool = <Self::HalfUint as Bounded>::BITS >= Self::PRIME_BITS
        && <Self::Uint as Bounded>::BITS == <Self::HalfUint as Bounded>::BITS * 2
        && <Self::WideUint as Bounded>::BITS == <Self::Uint as Bounded>::BITS * 2;
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{Bounded, Integer};

    use super::PaillierParams;
    use crate::{
        params::{dev::PaillierTest, PaillierProduction112},
        uint::{BoxedEncoding, Extendable, MulWide},
    };

    // Exercises the helper traits only through the bounds of the public trait.
    fn widths_are_consistent<P: PaillierParams>() {
        assert!(P::SELF_CONSISTENT);

        let half = <P::HalfUint as Integer>::one();
        let uint: P::Uint = half.mul_wide(&half);
        assert_eq!(uint, <P::HalfUint as Extendable<P::Uint>>::to_wide(&half));

        let bytes = BoxedEncoding::to_be_bytes(&uint);
        assert_eq!(bytes.len(), <P::Uint as Bounded>::BYTES);
        assert_eq!(<P::Uint as BoxedEncoding>::try_from_be_bytes(&bytes).unwrap(), uint);
    }

    #[test]
    fn parameter_sets() {
        widths_are_consistent::<PaillierTest>();
        widths_are_consistent::<PaillierProduction112>();
    }
}
