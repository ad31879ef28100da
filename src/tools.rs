pub(crate) mod bitvec;
pub(crate) mod hashing;
mod rid;
mod secret;
pub(crate) mod sss;
pub(crate) mod transcript;

pub use rid::Rid;
pub(crate) use secret::Secret;
