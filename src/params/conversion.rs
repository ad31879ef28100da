use crypto_bigint::{NonZero, Zero};
use k256::elliptic_curve::bigint::Encoding;

use super::traits::SchemeParams;
use crate::{
    curve::{Scalar, ORDER},
    paillier::PaillierParams,
    uint::{BoxedEncoding, Extendable, Signed},
};

type Uint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::Uint;
type WideUint<P> = <<P as SchemeParams>::Paillier as PaillierParams>::WideUint;

/// Places a big-endian representation into the low bytes of a zero `Uint`.
fn uint_from_be_bytes<P: SchemeParams>(bytes: &[u8]) -> Uint<P> {
    let mut repr = Uint::<P>::zero().to_be_bytes();
    let uint_len = repr.len();
    repr.get_mut(uint_len - bytes.len()..)
        .expect("`PaillierParams::Uint` is wider than a curve scalar")
        .copy_from_slice(bytes);
    Uint::<P>::try_from_be_bytes(&repr).expect("`repr` has the correct length")
}

/// Returns the curve order as a Paillier-sized integer.
pub(crate) fn curve_order<P: SchemeParams>() -> NonZero<Uint<P>> {
    // `k256` uses an older `crypto-bigint`, so the order is transferred through its byte representation.
    NonZero::new(uint_from_be_bytes::<P>(&ORDER.to_be_bytes())).expect("the curve order is non-zero")
}

/// Converts a [`Scalar`] to a [`Signed`], taking its integer representative in `[0, q)`.
pub(crate) fn signed_from_scalar<P: SchemeParams>(value: &Scalar) -> Signed<Uint<P>> {
    Signed::new_positive(uint_from_be_bytes::<P>(&value.to_bytes()))
        .expect("a curve scalar is smaller than the half of the `PaillierParams::Uint` range")
}

/// Reduces an integer modulo the curve order.
pub(crate) fn scalar_from_wide_uint<P: SchemeParams>(value: &WideUint<P>) -> Scalar {
    let order = NonZero::new(curve_order::<P>().as_ref().to_wide()).expect("the curve order is non-zero");
    let reduced = *value % order;
    let repr = reduced.to_be_bytes();
    let scalar_len = Scalar::repr_len();
    Scalar::try_from_bytes(
        repr.get(repr.len() - scalar_len..)
            .expect("`PaillierParams::WideUint` is wider than a curve scalar"),
    )
    .expect("the value was reduced modulo the curve order, so it is a valid curve scalar")
}

/// Converts a signed integer to a curve scalar, reducing it modulo the curve order.
pub(crate) fn scalar_from_signed<P: SchemeParams>(value: &Signed<Uint<P>>) -> Scalar {
    scalar_from_wide_signed::<P>(&value.to_wide())
}

/// Converts a wide signed integer to a curve scalar, reducing it modulo the curve order.
pub(crate) fn scalar_from_wide_signed<P: SchemeParams>(value: &Signed<WideUint<P>>) -> Scalar {
    let abs_value = scalar_from_wide_uint::<P>(&value.abs());
    if value.is_negative() {
        -abs_value
    } else {
        abs_value
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{scalar_from_signed, signed_from_scalar};
    use crate::{curve::Scalar, dev::TestParams};

    #[test]
    fn scalar_conversion() {
        let x = Scalar::random(&mut OsRng);
        let signed = signed_from_scalar::<TestParams>(&x);
        assert!(!signed.is_negative());
        assert_eq!(scalar_from_signed::<TestParams>(&signed), x);
        assert_eq!(scalar_from_signed::<TestParams>(&-signed), -x);

        // Values larger than the order are reduced.
        let y = Scalar::random(&mut OsRng);
        let sum = signed + signed_from_scalar::<TestParams>(&y);
        assert_eq!(scalar_from_signed::<TestParams>(&sum), x + y);
    }
}
