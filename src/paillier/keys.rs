use crypto_bigint::{InvMod, Invert, Monty, NonZero, Odd, RandomMod};
use rand_core::CryptoRngCore;

use super::{params::PaillierParams, rsa::SecretPrimes};
use crate::{
    tools::Secret,
    uint::{MulWide, ToMontgomery},
};

/// A Paillier secret key: the factorization of the public modulus.
#[derive(Debug, Clone)]
pub(crate) struct SecretKeyPaillier<P: PaillierParams> {
    primes: SecretPrimes<P>,
    totient: Secret<P::Uint>,
    public_key: PublicKeyPaillier<P>,
}

impl<P: PaillierParams> SecretKeyPaillier<P> {
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_primes(SecretPrimes::random_safe(rng))
    }

    pub fn from_primes(primes: SecretPrimes<P>) -> Self {
        let totient = primes.totient();
        let public_key = PublicKeyPaillier::new(&primes.modulus()).expect("a product of two odd primes is odd");
        Self {
            primes,
            totient,
            public_key,
        }
    }

    pub fn primes(&self) -> &SecretPrimes<P> {
        &self.primes
    }

    pub fn totient(&self) -> &Secret<P::Uint> {
        &self.totient
    }

    pub fn public_key(&self) -> &PublicKeyPaillier<P> {
        &self.public_key
    }

    /// Returns a uniformly chosen value in $[0, \phi(N))$.
    pub fn random_residue_mod_totient(&self, rng: &mut impl CryptoRngCore) -> Secret<P::Uint> {
        let totient = NonZero::new(*self.totient.expose_secret()).expect("the totient of N > 1 is non-zero");
        Secret::init_with(|| P::Uint::random_mod(rng, &totient))
    }

    /// Returns $N^{-1} \mod \phi(N)$.
    pub fn inv_modulus(&self) -> Secret<P::Uint> {
        Secret::init_with(|| {
            Option::<P::Uint>::from(self.public_key.modulus().inv_mod(self.totient.expose_secret()))
                .expect("N is coprime with phi(N) for N = p q with distinct safe primes p, q")
        })
    }
}

/// A Paillier public key: the modulus $N$ along with precomputed Montgomery parameters
/// for arithmetic modulo $N$ and $N^2$.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PublicKeyPaillier<P: PaillierParams> {
    modulus: P::Uint,
    modulus_squared: P::WideUint,
    monty_params_mod_n: <P::UintMod as Monty>::Params,
    monty_params_mod_n_squared: <P::WideUintMod as Monty>::Params,
}

impl<P: PaillierParams> PublicKeyPaillier<P> {
    /// Returns `None` if the modulus is even.
    pub fn new(modulus: &P::Uint) -> Option<Self> {
        let odd_modulus = Option::<Odd<P::Uint>>::from(Odd::new(*modulus))?;
        let modulus_squared = modulus.mul_wide(modulus);
        let odd_modulus_squared =
            Option::<Odd<P::WideUint>>::from(Odd::new(modulus_squared)).expect("a square of an odd number is odd");
        Some(Self {
            modulus: *modulus,
            modulus_squared,
            monty_params_mod_n: <P::UintMod as Monty>::new_params_vartime(odd_modulus),
            monty_params_mod_n_squared: <P::WideUintMod as Monty>::new_params_vartime(odd_modulus_squared),
        })
    }

    pub fn modulus(&self) -> &P::Uint {
        &self.modulus
    }

    pub fn modulus_nonzero(&self) -> NonZero<P::Uint> {
        NonZero::new(self.modulus).expect("the modulus is odd, so non-zero")
    }

    pub fn modulus_squared(&self) -> &P::WideUint {
        &self.modulus_squared
    }

    pub fn monty_params_mod_n_squared(&self) -> &<P::WideUintMod as Monty>::Params {
        &self.monty_params_mod_n_squared
    }

    /// Returns `x` as a residue modulo $N$.
    pub fn to_montgomery(&self, x: &P::Uint) -> P::UintMod {
        x.to_montgomery(&self.monty_params_mod_n)
    }

    /// Returns a uniformly chosen element of $\mathbb{Z}_N^*$.
    pub fn random_invertible_residue(&self, rng: &mut impl CryptoRngCore) -> P::UintMod {
        let modulus = self.modulus_nonzero();
        loop {
            let r = self.to_montgomery(&P::Uint::random_mod(rng, &modulus));
            if bool::from(r.invert().is_some()) {
                return r;
            }
        }
    }

    /// Returns a uniformly chosen quadratic residue modulo $N$.
    pub fn random_square_residue(&self, rng: &mut impl CryptoRngCore) -> P::UintMod {
        let r = self.random_invertible_residue(rng);
        r * r
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{modular::Retrieve, PowBoundedExp};
    use rand_core::OsRng;

    use super::{PublicKeyPaillier, SecretKeyPaillier};
    use crate::{dev::PaillierTest, paillier::PaillierParams};

    type Uint = <PaillierTest as PaillierParams>::Uint;

    #[test]
    fn inverse_of_modulus() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        // (x^N)^(N^{-1} mod phi) == x for any invertible x
        let x = pk.random_invertible_residue(&mut OsRng);
        let e = sk.inv_modulus();
        let y = x.pow_bounded_exp(pk.modulus(), PaillierTest::MODULUS_BITS);
        assert_eq!(y.pow_bounded_exp(e.expose_secret(), PaillierTest::MODULUS_BITS), x);
    }

    #[test]
    fn even_modulus_is_rejected() {
        assert!(PublicKeyPaillier::<PaillierTest>::new(&Uint::from_u64(1000)).is_none());
        let pk = PublicKeyPaillier::<PaillierTest>::new(&Uint::from_u64(1001)).unwrap();
        assert_eq!(pk.to_montgomery(&Uint::from_u64(1002)).retrieve(), Uint::ONE);
    }
}
