use alloc::{boxed::Box, format, string::String};
use core::{
    cmp::Ordering,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use digest::XofReader;
use k256::elliptic_curve::{
    bigint::U256, // Note that this type is different from typenum::U256
    generic_array::{typenum::Unsigned, GenericArray},
    group::ff::PrimeField,
    ops::Reduce,
    point::AffineCoordinates,
    sec1::{EncodedPoint, FromEncodedPoint, ToEncodedPoint},
    subtle::{Choice, ConditionallySelectable, CtOption},
    Curve as _, Field, FieldBytesSize, NonZeroScalar,
};
use k256::{ecdsa::VerifyingKey, Secp256k1};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_encoded_bytes::{Hex, SliceLike};
use zeroize::DefaultIsZeroes;

use crate::{
    tools::hashing::{Chain, HashableType},
    uint::BoxedEncoding,
};

pub(crate) type Curve = Secp256k1;
pub(crate) type BackendScalar = k256::Scalar;
pub(crate) type BackendPoint = k256::ProjectivePoint;

pub(crate) const ORDER: U256 = Secp256k1::ORDER;

impl HashableType for Curve {
    fn chain_type<C: Chain>(digest: C) -> C {
        let mut digest = digest;

        // Note that since only `to_words` is available, we need to chain it
        // so that the result is the same on 32- and 64-bit targets - that is, in low-endian order.
        let words = ORDER.to_words();
        for word in words {
            digest = digest.chain(&word.to_le_bytes());
        }

        digest.chain(&Point::GENERATOR)
    }
}

/// An element of the curve's scalar field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Scalar(BackendScalar);

impl Scalar {
    /// The additive identity.
    pub const ZERO: Self = Self(BackendScalar::ZERO);
    /// The multiplicative identity.
    pub const ONE: Self = Self(BackendScalar::ONE);

    pub(crate) fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(BackendScalar::random(rng))
    }

    pub(crate) fn random_nonzero(rng: &mut impl CryptoRngCore) -> Self {
        Self(*NonZeroScalar::<Secp256k1>::random(rng).as_ref())
    }

    /// Multiplies the curve generator by this scalar.
    pub fn mul_by_generator(&self) -> Point {
        Point::GENERATOR * self
    }

    /// Invert the [`Scalar`]. Returns [`None`] if the scalar is zero.
    pub fn invert(&self) -> CtOption<Self> {
        self.0.invert().map(Self)
    }

    /// Returns `true` if the scalar is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero().into()
    }

    pub(crate) fn from_xof_reader(reader: &mut impl XofReader) -> Self {
        let mut bytes = k256::FieldBytes::default();
        reader.read(&mut bytes);
        Self(<BackendScalar as Reduce<U256>>::reduce_bytes(&bytes))
    }

    /// Interprets up to `repr_len()` big-endian bytes as an integer and reduces it modulo the curve order.
    pub(crate) fn from_be_bytes_reduced(bytes: &[u8]) -> Option<Self> {
        let repr = pad_to_repr(bytes)?;
        Some(Self(<BackendScalar as Reduce<U256>>::reduce_bytes(&repr)))
    }

    /// Interprets a big-endian integer of arbitrary width as a scalar.
    ///
    /// Returns `None` unless the integer is strictly smaller than the curve order,
    /// that is, unless the integer representative of the resulting scalar is exactly equal to it.
    pub(crate) fn try_from_be_bytes_exact(bytes: &[u8]) -> Option<Self> {
        let split = bytes.len().saturating_sub(Self::repr_len());
        let (high, low) = bytes.split_at(split);
        if high.iter().any(|byte| *byte != 0) {
            return None;
        }
        let repr = pad_to_repr(low)?;
        Option::from(BackendScalar::from_repr(repr)).map(Self)
    }

    /// Interprets a 32-byte prehashed message as a scalar, the way ECDSA does.
    pub(crate) fn from_prehash(prehash: &[u8; 32]) -> Self {
        Self(<BackendScalar as Reduce<U256>>::reduce_bytes(k256::FieldBytes::from_slice(prehash)))
    }

    pub(crate) fn to_backend(self) -> BackendScalar {
        self.0
    }

    pub(crate) fn to_bytes(self) -> k256::FieldBytes {
        self.0.to_bytes()
    }

    pub(crate) fn repr_len() -> usize {
        <FieldBytesSize<Secp256k1> as Unsigned>::to_usize()
    }

    pub(crate) fn try_from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let arr = GenericArray::<u8, FieldBytesSize<Secp256k1>>::from_exact_iter(bytes.iter().cloned())
            .ok_or("Invalid length of a curve scalar")?;

        BackendScalar::from_repr_vartime(arr)
            .map(Self)
            .ok_or_else(|| "Invalid curve scalar representation".into())
    }
}

fn pad_to_repr(bytes: &[u8]) -> Option<k256::FieldBytes> {
    let mut repr = k256::FieldBytes::default();
    let offset = repr.len().checked_sub(bytes.len())?;
    repr.get_mut(offset..)?.copy_from_slice(bytes);
    Some(repr)
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        // Big-endian canonical representations compare the same way as the integers.
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl<'a> TryFrom<&'a [u8]> for Scalar {
    type Error = String;
    fn try_from(val: &'a [u8]) -> Result<Self, Self::Error> {
        Self::try_from_bytes(val)
    }
}

impl BoxedEncoding for Scalar {
    fn to_be_bytes(&self) -> Box<[u8]> {
        self.to_bytes().as_slice().into()
    }

    fn try_from_be_bytes(bytes: &[u8]) -> Result<Self, String> {
        Self::try_from_bytes(bytes)
    }
}

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(BackendScalar::conditional_select(&a.0, &b.0, choice))
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SliceLike::<Hex>::serialize(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SliceLike::<Hex>::deserialize(deserializer)
    }
}

impl DefaultIsZeroes for Scalar {}

/// A point on the curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point(BackendPoint);

impl Point {
    /// The curve generator.
    pub const GENERATOR: Self = Self(BackendPoint::GENERATOR);

    /// The point at infinity.
    pub const IDENTITY: Self = Self(BackendPoint::IDENTITY);

    /// Returns `true` if this is the point at infinity.
    pub fn is_identity(&self) -> bool {
        self == &Self::IDENTITY
    }

    /// The x-coordinate of the point reduced modulo the curve order,
    /// or zero for the point at infinity.
    pub(crate) fn x_coordinate(&self) -> Scalar {
        let bytes = self.0.to_affine().x();
        Scalar(<BackendScalar as Reduce<U256>>::reduce_bytes(&bytes))
    }

    pub(crate) fn to_backend(self) -> BackendPoint {
        self.0
    }

    /// Convert a [`Point`] to a [`VerifyingKey`] wrapped in an [`Option`]. Returns [`None`] if the
    /// `Point` is the point at infinity.
    pub fn to_verifying_key(self) -> Option<VerifyingKey> {
        VerifyingKey::from_affine(self.0.to_affine()).ok()
    }

    pub(crate) fn try_from_compressed_bytes(bytes: &[u8]) -> Result<Self, String> {
        let ep = EncodedPoint::<Secp256k1>::from_bytes(bytes).map_err(|err| format!("{err}"))?;

        // Unwrap CtOption into Option
        let cp_opt: Option<BackendPoint> = BackendPoint::from_encoded_point(&ep).into();
        cp_opt
            .map(Self)
            .ok_or_else(|| "Invalid curve point representation".into())
    }

    /// The compressed SEC1 encoding; a single zero byte for the point at infinity.
    pub(crate) fn to_compressed_bytes(self) -> Box<[u8]> {
        self.0.to_affine().to_encoded_point(true).as_bytes().into()
    }
}

impl<'a> TryFrom<&'a [u8]> for Point {
    type Error = String;
    fn try_from(val: &'a [u8]) -> Result<Self, Self::Error> {
        Self::try_from_compressed_bytes(val)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SliceLike::<Hex>::serialize(&self.to_compressed_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SliceLike::<Hex>::deserialize(deserializer)
    }
}

impl From<&NonZeroScalar<Secp256k1>> for Scalar {
    fn from(val: &NonZeroScalar<Secp256k1>) -> Self {
        Self(*val.as_ref())
    }
}

impl From<u64> for Scalar {
    fn from(val: u64) -> Self {
        Self(BackendScalar::from(val))
    }
}

impl Neg for Scalar {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Add<Scalar> for Scalar {
    type Output = Scalar;

    fn add(self, other: Scalar) -> Scalar {
        Scalar(self.0.add(&other.0))
    }
}

impl Add<&Scalar> for Scalar {
    type Output = Scalar;

    fn add(self, other: &Scalar) -> Scalar {
        Scalar(self.0.add(&other.0))
    }
}

impl AddAssign<&Scalar> for Scalar {
    fn add_assign(&mut self, other: &Scalar) {
        self.0 += &other.0;
    }
}

impl Add<Point> for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point(self.0.add(&(other.0)))
    }
}

impl Add<&Point> for &Point {
    type Output = Point;

    fn add(self, other: &Point) -> Point {
        Point(self.0.add(&(other.0)))
    }
}

impl Sub<Scalar> for Scalar {
    type Output = Scalar;

    fn sub(self, other: Scalar) -> Scalar {
        Scalar(self.0.sub(&(other.0)))
    }
}

impl Mul<Scalar> for Point {
    type Output = Point;

    fn mul(self, other: Scalar) -> Point {
        Point(self.0.mul(&(other.0)))
    }
}

impl Mul<&Scalar> for Point {
    type Output = Point;

    fn mul(self, other: &Scalar) -> Point {
        Point(self.0.mul(&(other.0)))
    }
}

impl Mul<&Scalar> for &Point {
    type Output = Point;

    fn mul(self, other: &Scalar) -> Point {
        Point(self.0.mul(&(other.0)))
    }
}

impl Mul<Scalar> for Scalar {
    type Output = Scalar;

    fn mul(self, other: Scalar) -> Scalar {
        Scalar(self.0.mul(&(other.0)))
    }
}

impl Mul<&Scalar> for Scalar {
    type Output = Scalar;

    fn mul(self, other: &Scalar) -> Scalar {
        Scalar(self.0.mul(&(other.0)))
    }
}

impl core::iter::Sum for Scalar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(Add::add).unwrap_or(Self::ZERO)
    }
}

impl core::iter::Product for Scalar {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(Mul::mul).unwrap_or(Self::ONE)
    }
}

impl core::iter::Sum for Point {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(Add::add).unwrap_or(Self::IDENTITY)
    }
}

impl<'a> core::iter::Sum<&'a Self> for Point {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.cloned().sum()
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{Point, Scalar};

    #[test]
    fn exact_conversion_rejects_overflow() {
        // The curve order itself is not a valid scalar representative.
        let order = (-Scalar::ONE).to_bytes();
        let mut order_bytes = order.to_vec();
        *order_bytes.last_mut().unwrap() += 1;
        assert!(Scalar::try_from_be_bytes_exact(&order_bytes).is_none());

        // Leading zeros are fine, any other high bytes are not.
        let x = Scalar::random(&mut OsRng);
        let mut wide = vec![0u8; 64];
        wide[32..].copy_from_slice(&x.to_bytes());
        assert_eq!(Scalar::try_from_be_bytes_exact(&wide), Some(x));

        wide[0] = 1;
        assert!(Scalar::try_from_be_bytes_exact(&wide).is_none());

        // Short inputs are left-padded.
        assert_eq!(Scalar::try_from_be_bytes_exact(&[5]), Some(Scalar::from(5u64)));
    }

    #[test]
    fn identity_serialization() {
        let bytes = Point::IDENTITY.to_compressed_bytes();
        assert_eq!(Point::try_from_compressed_bytes(&bytes).unwrap(), Point::IDENTITY);

        let point = Scalar::random(&mut OsRng).mul_by_generator();
        let bytes = point.to_compressed_bytes();
        assert_eq!(bytes.len(), 33);
        assert_eq!(Point::try_from_compressed_bytes(&bytes).unwrap(), point);
    }

    #[test]
    fn x_coordinate() {
        assert_eq!(Point::IDENTITY.x_coordinate(), Scalar::ZERO);

        // A point and its negation share the x-coordinate.
        let point = Scalar::random_nonzero(&mut OsRng).mul_by_generator();
        let negated = point * (-Scalar::ONE);
        assert_eq!(point.x_coordinate(), negated.x_coordinate());
        assert!(!point.x_coordinate().is_zero());
    }

    #[test]
    fn ordering_follows_integers() {
        assert!(Scalar::from(2u64) < Scalar::from(3u64));
        assert!(Scalar::from(256u64) > Scalar::from(255u64));
    }
}
