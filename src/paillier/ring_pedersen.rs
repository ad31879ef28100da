//! Ring-Pedersen parameters: a modulus $N$ and two elements $s, t \in \mathbb{Z}_N^*$
//! with $s = t^\lambda$ for a secret $\lambda$.

use crypto_bigint::{modular::Retrieve, subtle::CtOption, BitOps, Invert, PowBoundedExp, Zero};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::{keys::SecretKeyPaillier, params::PaillierParams, PublicKeyPaillier};
use crate::{
    tools::Secret,
    uint::{pow_signed_vartime, Signed},
};

/// The secret exponent $\lambda$ relating the ring-Pedersen bases.
#[derive(Debug, Clone)]
pub(crate) struct RPSecret<P: PaillierParams> {
    lambda: Secret<P::Uint>,
}

impl<P: PaillierParams> RPSecret<P> {
    /// Chooses $\lambda$ uniformly from $[0, \phi(N))$.
    pub fn random(rng: &mut impl CryptoRngCore, sk: &SecretKeyPaillier<P>) -> Self {
        Self {
            lambda: sk.random_residue_mod_totient(rng),
        }
    }

    pub fn lambda(&self) -> &Secret<P::Uint> {
        &self.lambda
    }
}

/// Reasons for ring-Pedersen parameters to be rejected.
#[derive(displaydoc::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RPParamsError {
    /// The modulus does not have the required bit length
    ModulusLength,
    /// The modulus is even
    EvenModulus,
    /// A base is not in the range [1, N)
    BaseOutOfRange,
    /// A base is not invertible modulo N
    BaseNotInvertible,
    /// The bases are equal
    EqualBases,
}

/// Ring-Pedersen parameters as they are sent over the wire, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct RPParamsWire<P: PaillierParams> {
    modulus: P::Uint,
    base_value: P::Uint,
    base_randomizer: P::Uint,
}

impl<P: PaillierParams> RPParamsWire<P> {
    /// Checks that $N$ is odd and has exactly `P::MODULUS_BITS` bits,
    /// and that $s$ and $t$ are distinct invertible elements of $[1, N)$.
    pub fn validate(&self) -> Result<RPParams<P>, RPParamsError> {
        if self.modulus.bits_vartime() != P::MODULUS_BITS {
            return Err(RPParamsError::ModulusLength);
        }
        let public_key = PublicKeyPaillier::<P>::new(&self.modulus).ok_or(RPParamsError::EvenModulus)?;

        for base in [&self.base_value, &self.base_randomizer] {
            if bool::from(base.is_zero()) || base >= &self.modulus {
                return Err(RPParamsError::BaseOutOfRange);
            }
            let inverse: CtOption<P::UintMod> = public_key.to_montgomery(base).invert();
            if !bool::from(inverse.is_some()) {
                return Err(RPParamsError::BaseNotInvertible);
            }
        }

        if self.base_value == self.base_randomizer {
            return Err(RPParamsError::EqualBases);
        }

        Ok(RPParams {
            base_value: public_key.to_montgomery(&self.base_value),
            base_randomizer: public_key.to_montgomery(&self.base_randomizer),
            public_key,
        })
    }

    #[cfg(test)]
    pub fn base_value_mut(&mut self) -> &mut P::Uint {
        &mut self.base_value
    }

    #[cfg(test)]
    pub fn modulus_mut(&mut self) -> &mut P::Uint {
        &mut self.modulus
    }
}

/// Validated ring-Pedersen parameters $(N, s, t)$.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RPParamsWire<P>",
    into = "RPParamsWire<P>",
    bound(serialize = "", deserialize = "")
)]
pub struct RPParams<P: PaillierParams> {
    public_key: PublicKeyPaillier<P>,
    /// $s = t^\lambda$
    base_value: P::UintMod,
    /// $t$
    base_randomizer: P::UintMod,
}

impl<P: PaillierParams> RPParams<P> {
    /// Creates parameters over the modulus of `sk`: $t = r^2$ for a random invertible $r$, and $s = t^\lambda$.
    pub(crate) fn random_with_secret(rng: &mut impl CryptoRngCore, sk: &SecretKeyPaillier<P>, secret: &RPSecret<P>) -> Self {
        let public_key = sk.public_key().clone();
        let base_randomizer = public_key.random_square_residue(rng);
        let base_value = base_randomizer.pow_bounded_exp(secret.lambda.expose_secret(), P::MODULUS_BITS);
        Self {
            public_key,
            base_value,
            base_randomizer,
        }
    }

    pub(crate) fn public_key(&self) -> &PublicKeyPaillier<P> {
        &self.public_key
    }

    /// Returns the modulus $N$.
    pub fn modulus(&self) -> &P::Uint {
        self.public_key.modulus()
    }

    /// Returns $s$.
    pub fn base_value(&self) -> P::Uint {
        self.base_value.retrieve()
    }

    /// Returns $t$.
    pub fn base_randomizer(&self) -> P::Uint {
        self.base_randomizer.retrieve()
    }

    pub(crate) fn base_value_mod(&self) -> &P::UintMod {
        &self.base_value
    }

    pub(crate) fn base_randomizer_mod(&self) -> &P::UintMod {
        &self.base_randomizer
    }

    /// Returns the commitment $s^x t^y \mod N$ to `value` ($x$) with `randomizer` ($y$).
    pub(crate) fn commit(&self, value: &Signed<P::Uint>, randomizer: &Signed<P::WideUint>) -> P::UintMod {
        let value = pow_signed_vartime(&self.base_value, value).expect("the bases are invertible modulo N");
        let randomizer =
            pow_signed_vartime(&self.base_randomizer, randomizer).expect("the bases are invertible modulo N");
        value * randomizer
    }

    pub(crate) fn to_wire(&self) -> RPParamsWire<P> {
        RPParamsWire {
            modulus: *self.modulus(),
            base_value: self.base_value(),
            base_randomizer: self.base_randomizer(),
        }
    }
}

impl<P: PaillierParams> TryFrom<RPParamsWire<P>> for RPParams<P> {
    type Error = RPParamsError;

    fn try_from(wire: RPParamsWire<P>) -> Result<Self, Self::Error> {
        wire.validate()
    }
}

impl<P: PaillierParams> From<RPParams<P>> for RPParamsWire<P> {
    fn from(params: RPParams<P>) -> Self {
        params.to_wire()
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{modular::Retrieve, PowBoundedExp};
    use rand_core::OsRng;

    use super::{RPParams, RPParamsError, RPSecret};
    use crate::{
        dev::PaillierTest,
        paillier::{PaillierParams, SecretKeyPaillier},
        uint::Signed,
    };

    type Uint = <PaillierTest as PaillierParams>::Uint;
    type WideUint = <PaillierTest as PaillierParams>::WideUint;

    fn random_params() -> (SecretKeyPaillier<PaillierTest>, RPSecret<PaillierTest>, RPParams<PaillierTest>) {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let secret = RPSecret::random(&mut OsRng, &sk);
        let params = RPParams::random_with_secret(&mut OsRng, &sk, &secret);
        (sk, secret, params)
    }

    #[test]
    fn generated_params_are_valid() {
        let (sk, secret, params) = random_params();
        assert_eq!(params.modulus(), sk.public_key().modulus());
        assert_eq!(
            params
                .base_randomizer_mod()
                .pow_bounded_exp(secret.lambda().expose_secret(), PaillierTest::MODULUS_BITS),
            *params.base_value_mod()
        );
        assert_eq!(params.to_wire().validate(), Ok(params));
    }

    #[test]
    fn malformed_params_are_rejected() {
        let (_sk, _secret, params) = random_params();

        let mut wire = params.to_wire();
        *wire.modulus_mut() = wire.modulus_mut().wrapping_add(&Uint::ONE);
        assert_eq!(wire.validate(), Err(RPParamsError::EvenModulus));

        let mut wire = params.to_wire();
        *wire.modulus_mut() = Uint::from_u64(15);
        assert_eq!(wire.validate(), Err(RPParamsError::ModulusLength));

        let mut wire = params.to_wire();
        *wire.base_value_mut() = Uint::ZERO;
        assert_eq!(wire.validate(), Err(RPParamsError::BaseOutOfRange));

        let mut wire = params.to_wire();
        *wire.base_value_mut() = *params.modulus();
        assert_eq!(wire.validate(), Err(RPParamsError::BaseOutOfRange));

        let mut wire = params.to_wire();
        *wire.base_value_mut() = params.base_randomizer();
        assert_eq!(wire.validate(), Err(RPParamsError::EqualBases));
    }

    #[test]
    fn commitments_are_homomorphic() {
        let (_sk, _secret, params) = random_params();

        let x1 = Signed::<Uint>::random_in_range_bits(&mut OsRng, 256);
        let x2 = Signed::<Uint>::random_in_range_bits(&mut OsRng, 256);
        let y1 = Signed::<Uint>::random_in_range_scaled::<WideUint>(&mut OsRng, 256, params.modulus());
        let y2 = Signed::<Uint>::random_in_range_scaled::<WideUint>(&mut OsRng, 256, params.modulus());

        assert_eq!(
            params.commit(&x1, &y1) * params.commit(&x2, &y2),
            params.commit(&(x1 + x2), &(y1 + y2))
        );
        let product = params.commit(&x1, &y1) * params.commit(&-x1, &-y1);
        assert_eq!(product.retrieve(), Uint::ONE);
    }
}
