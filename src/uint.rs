mod signed;
mod traits;

pub(crate) use signed::{pow_signed_vartime, Signed};
pub(crate) use traits::{BoxedEncoding, Extendable, FromXofReader, MulWide, ToMontgomery};
