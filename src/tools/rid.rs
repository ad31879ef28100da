use core::ops::BitXorAssign;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use serde_encoded_bytes::{ArrayLike, Hex};

/// The length of a randomness contribution in bytes.
pub(crate) const RID_BYTES: usize = 32;

/// A randomness identifier.
///
/// Each party contributes a random one; the combined value is the XOR of all contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rid(#[serde(with = "ArrayLike::<Hex>")] [u8; RID_BYTES]);

impl Rid {
    pub(crate) fn random(rng: &mut impl CryptoRngCore) -> Self {
        let mut bytes = [0u8; RID_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Combines all the contributions.
    ///
    /// Only meaningful once every party's contribution is known.
    pub(crate) fn combine<'a>(contributions: impl IntoIterator<Item = &'a Rid>) -> Self {
        let mut result = Self([0u8; RID_BYTES]);
        for rid in contributions {
            result ^= rid;
        }
        result
    }
}

impl AsRef<[u8]> for Rid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl BitXorAssign<&Rid> for Rid {
    fn bitxor_assign(&mut self, rhs: &Rid) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0.iter()) {
            *lhs ^= rhs
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::Rid;

    #[test]
    fn combine_is_xor() {
        let r1 = Rid::random(&mut OsRng);
        let r2 = Rid::random(&mut OsRng);
        let combined = Rid::combine([&r1, &r2]);

        let expected = r1
            .as_ref()
            .iter()
            .zip(r2.as_ref().iter())
            .map(|(x, y)| x ^ y)
            .collect::<Vec<_>>();
        assert_eq!(combined.as_ref(), expected.as_slice());

        // Order of contributions does not matter.
        assert_eq!(Rid::combine([&r2, &r1]), combined);
    }
}
