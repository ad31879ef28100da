//! Scheme parameters.

mod conversion;
mod k256;
mod traits;

pub(crate) mod dev;

pub use self::k256::{PaillierProduction112, ProductionParams112};
pub use traits::SchemeParams;

pub(crate) use conversion::{curve_order, scalar_from_signed, scalar_from_wide_signed, signed_from_scalar};
pub(crate) use traits::chain_scheme_params;
