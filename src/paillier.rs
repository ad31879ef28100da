mod encryption;
mod keys;
mod params;
mod ring_pedersen;
mod rsa;

pub(crate) use encryption::Ciphertext;
pub(crate) use keys::{PublicKeyPaillier, SecretKeyPaillier};
pub use params::PaillierParams;
pub use ring_pedersen::RPParams;
pub(crate) use ring_pedersen::{RPParamsWire, RPSecret};
pub(crate) use rsa::SecretPrimes;
