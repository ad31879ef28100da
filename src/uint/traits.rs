use alloc::{boxed::Box, format, string::String, vec};

use crypto_bigint::{Bounded, Integer, Limb, Monty, Uint};
use digest::XofReader;

pub trait FromXofReader {
    /// Returns an integer derived deterministically from an extensible output hash,
    /// with the bit size limited to `n_bits`.
    ///
    /// Panics if `n_bits` exceeds the capacity of the integer type.
    fn from_xof_reader(reader: &mut impl XofReader, n_bits: u32) -> Self;
}

impl<T> FromXofReader for T
where
    T: Integer + Bounded + BoxedEncoding,
{
    fn from_xof_reader(reader: &mut impl XofReader, n_bits: u32) -> Self {
        assert!(n_bits <= Self::BITS);
        let n_bytes = n_bits.div_ceil(8) as usize;

        // If the number of bits is not a multiple of 8, use a mask to zeroize the high bits in the
        // generated random bytestring, so that we don't have to reject too much.
        let mask = if n_bits & 7 != 0 {
            (1 << (n_bits & 7)) - 1
        } else {
            u8::MAX
        };

        let mut bytes = vec![0u8; T::BYTES];
        let buf = AsMut::<[u8]>::as_mut(&mut bytes)
            .get_mut(T::BYTES - n_bytes..)
            .expect("`n_bytes` does not exceed `T::BYTES` (following from the assertion for `n_bits`)");
        reader.read(buf);
        buf.first_mut().map(|byte| {
            *byte &= mask;
            Some(byte)
        });
        Self::try_from_be_bytes(&bytes).expect("`bytes` length is equal to `T::BYTES`")
    }
}

pub trait ToMontgomery: Integer {
    fn to_montgomery(self, params: &<Self::Monty as Monty>::Params) -> Self::Monty {
        <Self::Monty as Monty>::new(self, params.clone())
    }
}

impl<T> ToMontgomery for T where T: Integer {}

/// Exposes a way to widen `Self` to `Wide`.
pub trait Extendable<Wide: Sized>: Sized {
    fn to_wide(&self) -> Wide;
    fn try_from_wide(value: &Wide) -> Option<Self>;
}

impl<const L: usize, const W: usize> Extendable<Uint<W>> for Uint<L> {
    fn to_wide(&self) -> Uint<W> {
        const {
            if W < L {
                panic!("Inconsistent widths in `Extendable::to_wide()`");
            }
        }

        // TODO: can potentially expose a secret `self` if the compiler decides to copy it.
        let mut result = Uint::<W>::ZERO;
        result.as_limbs_mut()[0..L].copy_from_slice(self.as_limbs());
        result
    }

    fn try_from_wide(value: &Uint<W>) -> Option<Self> {
        const {
            if W < L {
                panic!("Inconsistent widths in `Extendable::try_from_wide()`");
            }
        }

        if value.bits_vartime() > Uint::<L>::BITS {
            return None;
        }

        // TODO: can potentially expose a secret `value` if the compiler decides to copy it.
        let mut lo = Uint::<L>::ZERO;
        lo.as_limbs_mut().copy_from_slice(&value.as_limbs()[0..L]);
        Some(lo)
    }
}

/// Exposes a way to multiply `Self` by `Hi` obtaining a `Wide` result.
pub trait MulWide<Hi, Wide: Sized>: Sized {
    fn mul_wide(&self, rhs: &Hi) -> Wide;
}

impl<const L: usize, const R: usize, const W: usize> MulWide<Uint<R>, Uint<W>> for Uint<L> {
    fn mul_wide(&self, rhs: &Uint<R>) -> Uint<W> {
        const {
            if W != L + R {
                panic!("Inconsistent widths in `MulWide::mul_wide()`");
            }
        }

        // TODO: can potentially expose a secret `self` or `rhs`.
        let (lo, hi) = self.split_mul(rhs);
        let mut result = Uint::<W>::ZERO;
        result.as_limbs_mut()[0..L].copy_from_slice(lo.as_limbs());
        result.as_limbs_mut()[L..W].copy_from_slice(hi.as_limbs());
        result
    }
}

pub trait BoxedEncoding: Sized {
    fn to_be_bytes(&self) -> Box<[u8]>;
    fn try_from_be_bytes(bytes: &[u8]) -> Result<Self, String>;
}

impl<const L: usize> BoxedEncoding for Uint<L> {
    fn to_be_bytes(&self) -> Box<[u8]> {
        let mut result = vec![0u8; Self::BYTES];
        // SAFETY:
        // - `rchunks_mut` will not panic as long as `Self::BYTES` is a multiple of `Limb::BYTES`
        // - `copy_from_slice` will not panic as long as `Limb::to_be_bytes()` returns an array of size `Limb::BYTES`
        for (limb, chunk) in self.as_limbs().iter().zip(result.rchunks_exact_mut(Limb::BYTES)) {
            chunk.copy_from_slice(&limb.0.to_be_bytes());
        }
        result.into()
    }

    fn try_from_be_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() != Self::BYTES {
            return Err(format!(
                "Invalid slice length: {}, expected {}",
                bytes.len(),
                Self::BYTES
            ));
        }
        Ok(Self::from_be_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{U1024, U128, U256, U512};
    use sha3::{
        digest::{ExtendableOutput, Update},
        Shake256,
    };

    use super::{BoxedEncoding, Extendable, FromXofReader, MulWide};

    #[test]
    fn widening_and_narrowing() {
        let x = U256::from_u64(0x1234_5678_9abc_def0);
        let wide: U512 = x.to_wide();
        assert_eq!(<U256 as Extendable<U512>>::try_from_wide(&wide), Some(x));

        let too_big = U512::MAX;
        assert_eq!(<U256 as Extendable<U512>>::try_from_wide(&too_big), None);
    }

    #[test]
    fn mul_wide_matches_widened_product() {
        let x = U512::MAX;
        let y = U512::from_u64(3);
        let product: U1024 = x.mul_wide(&y);
        let expected = <U512 as Extendable<U1024>>::to_wide(&x).wrapping_mul(&<U512 as Extendable<U1024>>::to_wide(&y));
        assert_eq!(product, expected);
    }

    #[test]
    fn be_bytes() {
        let x = U256::from_be_hex("00000000000000000000000000000000000000000000000000000000deadbeef");
        let bytes = BoxedEncoding::to_be_bytes(&x);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[28..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(<U256 as BoxedEncoding>::try_from_be_bytes(&bytes).unwrap(), x);
        assert!(<U256 as BoxedEncoding>::try_from_be_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn from_xof_reader_respects_bound() {
        let mut digest = Shake256::default();
        digest.update(b"seed");
        let mut reader = digest.finalize_xof();
        for _ in 0..16 {
            let x = U128::from_xof_reader(&mut reader, 100);
            assert!(x.bits_vartime() <= 100);
        }
    }
}
