use alloc::string::String;
use core::ops::{Add, Mul, Neg, Sub};

use crypto_bigint::{subtle::CtOption, Bounded, Integer, Invert, NonZero, PowBoundedExp, RandomMod};
use digest::XofReader;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::traits::{BoxedEncoding, Extendable, FromXofReader};

/// A packed representation for serializing signed integers.
#[derive(Serialize, Deserialize)]
struct PackedSigned<T> {
    is_negative: bool,
    abs_value: T,
}

impl<T> From<Signed<T>> for PackedSigned<T>
where
    T: Integer + Bounded + Copy,
{
    fn from(val: Signed<T>) -> Self {
        Self {
            is_negative: val.is_negative(),
            abs_value: val.abs(),
        }
    }
}

impl<T> TryFrom<PackedSigned<T>> for Signed<T>
where
    T: Integer + Bounded + Copy,
{
    type Error = String;
    fn try_from(val: PackedSigned<T>) -> Result<Self, Self::Error> {
        Self::from_abs(val.abs_value, val.is_negative).ok_or_else(|| "Invalid values for the signed integer".into())
    }
}

/// A wrapper over unsigned integers that treats two's complement numbers as negative.
///
/// All the arithmetic is wrapping; the callers are responsible for choosing integer widths
/// that fit the values involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "PackedSigned<T>",
    into = "PackedSigned<T>",
    bound(
        serialize = "T: Integer + Bounded + Copy + Serialize",
        deserialize = "T: Integer + Bounded + Copy + for<'x> Deserialize<'x>"
    )
)]
pub(crate) struct Signed<T>(T);

impl<T> Signed<T>
where
    T: Integer + Bounded + Copy,
{
    pub fn is_negative(&self) -> bool {
        self.0.bit_vartime(T::BITS - 1)
    }

    /// Computes the absolute value of `self`.
    pub fn abs(&self) -> T {
        if self.is_negative() {
            T::zero().wrapping_sub(&self.0)
        } else {
            self.0
        }
    }

    /// Creates a signed value from an unsigned one, assuming that it encodes a positive value.
    pub fn new_positive(value: T) -> Option<Self> {
        if value.bit_vartime(T::BITS - 1) {
            return None;
        }
        Some(Self(value))
    }

    /// Creates a signed value from its absolute value and a sign.
    /// Returns `None` if `abs_value` does not fit in the positive half of the range.
    pub fn from_abs(abs_value: T, is_negative: bool) -> Option<Self> {
        let positive = Self::new_positive(abs_value)?;
        Some(if is_negative { -positive } else { positive })
    }

    /// Returns `true` if the value is within `[-2^bound_bits, 2^bound_bits]`.
    pub fn in_range_bits(&self, bound_bits: u32) -> bool {
        bound_bits < T::BITS - 1 && self.abs() <= T::one() << bound_bits
    }

    /// Returns the same value in a wider integer.
    pub fn to_wide<W>(&self) -> Signed<W>
    where
        T: Extendable<W>,
        W: Integer + Bounded + Copy,
    {
        Signed::from_abs(self.abs().to_wide(), self.is_negative()).expect("a wider integer fits the value")
    }
}

impl<T> Signed<T>
where
    T: Integer + Bounded + Copy + RandomMod,
{
    /// Returns a uniformly chosen value in `[-2^bound_bits, 2^bound_bits]`.
    ///
    /// Note: variable time in `bound_bits`.
    pub fn random_in_range_bits(rng: &mut impl CryptoRngCore, bound_bits: u32) -> Self {
        assert!(bound_bits < T::BITS - 2);
        let bound = T::one() << bound_bits;
        Self::random_in_range(rng, &bound)
    }

    fn random_in_range(rng: &mut impl CryptoRngCore, bound: &T) -> Self {
        // Sampling in `[0, 2 bound]` and shifting to the desired range.
        let positive_bound = (*bound << 1u32).wrapping_add(&T::one());
        let positive_bound = NonZero::new(positive_bound).expect("the bound is positive");
        Self(T::random_mod(rng, &positive_bound).wrapping_sub(bound))
    }

    /// Returns a uniformly chosen value in `[-2^bound_bits scale, 2^bound_bits scale]`
    /// in an integer wide enough to hold it.
    ///
    /// Note: variable time in `bound_bits` and in the bit size of `scale`.
    pub fn random_in_range_scaled<W>(rng: &mut impl CryptoRngCore, bound_bits: u32, scale: &T) -> Signed<W>
    where
        T: Extendable<W>,
        W: Integer + Bounded + Copy + RandomMod,
    {
        assert!(scale.bits_vartime() + bound_bits < W::BITS - 2);
        let bound = scale.to_wide() << bound_bits;
        Signed::<W>::random_in_range(rng, &bound)
    }
}

impl<T> Signed<T>
where
    T: Integer + Bounded + Copy + BoxedEncoding,
{
    /// Returns a value in `[-bound, bound]` derived from an extendable output hash.
    ///
    /// Used for non-interactive challenges; the result is the same on 32- and 64-bit platforms.
    ///
    /// Note: variable time in the bit size of `bound`.
    pub fn from_xof_reader_bounded(reader: &mut impl XofReader, bound: &NonZero<T>) -> Self {
        let bound = bound.as_ref();
        assert!(bound.bits_vartime() < T::BITS - 1);
        let positive_bound = (*bound << 1u32).wrapping_add(&T::one());
        let n_bits = positive_bound.bits_vartime();
        // Rejection sampling in `[0, 2 bound]`; each attempt succeeds with the probability at least 1/2.
        loop {
            let value = T::from_xof_reader(reader, n_bits);
            if value <= *bound << 1u32 {
                return Self(value.wrapping_sub(bound));
            }
        }
    }
}

impl<T> Neg for Signed<T>
where
    T: Integer + Bounded + Copy,
{
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(T::zero().wrapping_sub(&self.0))
    }
}

impl<T> Add for Signed<T>
where
    T: Integer + Bounded + Copy,
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(&rhs.0))
    }
}

impl<T> Sub for Signed<T>
where
    T: Integer + Bounded + Copy,
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(&rhs.0))
    }
}

impl<T> Mul for Signed<T>
where
    T: Integer + Bounded + Copy,
{
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        // Two's complement multiplication gives the correct result modulo `2^BITS` regardless of the signs.
        Self(self.0.wrapping_mul(&rhs.0))
    }
}

/// Raises `base` to a signed power.
///
/// Returns `None` if the exponent is negative and `base` is not invertible.
///
/// Note: variable time in the exponent.
pub(crate) fn pow_signed_vartime<M, T>(base: &M, exponent: &Signed<T>) -> Option<M>
where
    M: PowBoundedExp<T> + Invert<Output = CtOption<M>>,
    T: Integer + Bounded + Copy,
{
    let abs_value = exponent.abs();
    let result = base.pow_bounded_exp(&abs_value, abs_value.bits_vartime());
    if exponent.is_negative() {
        result.invert().into()
    } else {
        Some(result)
    }
}
