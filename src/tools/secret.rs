use alloc::boxed::Box;
use core::{
    fmt::Debug,
    ops::{Add, AddAssign},
};

use secrecy::{ExposeSecret, SecretBox};
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use serde_encoded_bytes::{Hex, SliceLike};
use zeroize::Zeroize;

use crate::uint::BoxedEncoding;

/// A helper wrapper for managing secret values.
///
/// On top of `secrecy::SecretBox` functionality, it provides:
/// - Safe `Clone` implementation (without needing to impl `CloneableSecret`)
/// - Safe `Debug` implementation
/// - Safe serialization/deserialization (down to `serde` API; what happens there we cannot control)
pub(crate) struct Secret<T: Zeroize>(SecretBox<T>);

impl<T> Secret<T>
where
    T: Zeroize,
{
    pub fn expose_secret(&self) -> &T {
        self.0.expose_secret()
    }
}

impl<T> Secret<T>
where
    T: Zeroize + Clone,
{
    pub fn init_with(ctr: impl FnOnce() -> T) -> Self {
        Self(SecretBox::init_with(ctr))
    }

    pub fn try_init_with<E>(ctr: impl FnOnce() -> Result<T, E>) -> Result<Self, E> {
        Ok(Self(SecretBox::try_init_with(ctr)?))
    }
}

impl<T> Clone for Secret<T>
where
    T: Zeroize + Clone,
{
    fn clone(&self) -> Self {
        Self::init_with(|| self.0.expose_secret().clone())
    }
}

impl<T> Serialize for Secret<T>
where
    T: Zeroize + BoxedEncoding,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = SecretBox::<[u8]>::from(self.0.expose_secret().to_be_bytes());
        SliceLike::<Hex>::serialize(&bytes.expose_secret(), serializer)
    }
}

impl<'de, T> Deserialize<'de> for Secret<T>
where
    T: Zeroize + Clone + BoxedEncoding,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Box<[u8]> = SliceLike::<Hex>::deserialize(deserializer)?;
        let bytes = SecretBox::<[u8]>::from(bytes);
        Self::try_init_with(|| T::try_from_be_bytes(bytes.expose_secret())).map_err(D::Error::custom)
    }
}

impl<T> Debug for Secret<T>
where
    T: Zeroize,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Secret<{}>(...)", core::any::type_name::<T>())
    }
}

impl<T> PartialEq for Secret<T>
where
    T: Zeroize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.expose_secret() == other.expose_secret()
    }
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl<'a, T> AddAssign<&'a T> for Secret<T>
where
    T: Zeroize + Clone + AddAssign<&'a T>,
{
    fn add_assign(&mut self, rhs: &'a T) {
        let sum = Self::init_with(|| {
            let mut sum = self.expose_secret().clone();
            sum += rhs;
            sum
        });
        *self = sum;
    }
}

impl<'a, T> AddAssign<&'a Secret<T>> for Secret<T>
where
    T: Zeroize + Clone + AddAssign<&'a T>,
{
    fn add_assign(&mut self, rhs: &'a Secret<T>) {
        *self += rhs.expose_secret();
    }
}

impl<'a, T> Add<&'a Secret<T>> for Secret<T>
where
    T: Zeroize + Clone + AddAssign<&'a T>,
{
    type Output = Secret<T>;

    fn add(self, rhs: &'a Secret<T>) -> Self::Output {
        let mut result = self;
        result += rhs;
        result
    }
}
