use crypto_bigint::{
    modular::Retrieve, subtle::CtOption, BitOps, CheckedSub, Integer, Invert, Monty, NonZero, Odd, PowBoundedExp,
    WrappingAdd,
};
use crypto_primes::RandomPrimeWithRng;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::params::PaillierParams;
use crate::{
    tools::Secret,
    uint::{Extendable, MulWide},
};

fn reduce_mod_prime<P: PaillierParams>(x: &P::Uint, prime: Odd<P::HalfUint>) -> P::HalfUintMod {
    let prime_wide = NonZero::new(prime.get().to_wide()).expect("primes are non-zero");
    let residue = P::HalfUint::try_from_wide(&(*x % prime_wide)).expect("the residue is smaller than the prime");
    P::HalfUintMod::new(residue, <P::HalfUintMod as Monty>::new_params_vartime(prime))
}

/// A pair of safe primes forming an RSA modulus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct SecretPrimes<P: PaillierParams> {
    p: Secret<P::HalfUint>,
    q: Secret<P::HalfUint>,
}

impl<P: PaillierParams> SecretPrimes<P> {
    /// Creates a pair of distinct safe primes whose product is exactly `P::MODULUS_BITS` long.
    pub fn random_safe(rng: &mut impl CryptoRngCore) -> Self {
        loop {
            let p = Secret::init_with(|| P::HalfUint::generate_safe_prime_with_rng(rng, P::PRIME_BITS));
            let q = Secret::init_with(|| P::HalfUint::generate_safe_prime_with_rng(rng, P::PRIME_BITS));
            let primes = Self { p, q };
            if primes.p != primes.q && primes.modulus().bits_vartime() == P::MODULUS_BITS {
                return primes;
            }
        }
    }

    fn p_odd(&self) -> Odd<P::HalfUint> {
        Odd::new(*self.p.expose_secret()).expect("`p` is an odd prime")
    }

    fn q_odd(&self) -> Odd<P::HalfUint> {
        Odd::new(*self.q.expose_secret()).expect("`q` is an odd prime")
    }

    /// Returns $N = p q$.
    pub fn modulus(&self) -> P::Uint {
        self.p.expose_secret().mul_wide(self.q.expose_secret())
    }

    /// Euler's totient function of $N = p q$ - the number of positive integers up to $N$
    /// that are relatively prime to it.
    /// Since $p$ and $q$ are primes, $\phi(N) = (p - 1) (q - 1)$.
    pub fn totient(&self) -> Secret<P::Uint> {
        let one = <P::HalfUint as Integer>::one();
        let p_minus_one = Option::<P::HalfUint>::from(self.p.expose_secret().checked_sub(&one))
            .expect("`p` is prime, so greater than one");
        let q_minus_one = Option::<P::HalfUint>::from(self.q.expose_secret().checked_sub(&one))
            .expect("`q` is prime, so greater than one");
        Secret::init_with(|| p_minus_one.mul_wide(&q_minus_one))
    }

    /// Splits `x` into residues modulo `p` and `q`.
    pub fn rns_split(&self, x: &P::Uint) -> (P::HalfUintMod, P::HalfUintMod) {
        (
            reduce_mod_prime::<P>(x, self.p_odd()),
            reduce_mod_prime::<P>(x, self.q_odd()),
        )
    }

    /// Recovers an integer modulo $N$ from its residues modulo `p` and `q`.
    pub fn rns_join(&self, residues: &(P::HalfUintMod, P::HalfUintMod)) -> P::Uint {
        let (x_p, x_q) = residues;
        let q = self.q.expose_secret();

        // x = x_q + q ((x_p - x_q) q^{-1} mod p)
        let q_mod_p = reduce_mod_prime::<P>(&q.to_wide(), self.p_odd());
        let q_inv_mod_p: CtOption<P::HalfUintMod> = q_mod_p.invert();
        let q_inv_mod_p = Option::<P::HalfUintMod>::from(q_inv_mod_p).expect("`p` and `q` are distinct primes");
        let x_q = x_q.retrieve();
        let x_q_mod_p = reduce_mod_prime::<P>(&x_q.to_wide(), self.p_odd());
        let h = ((*x_p - x_q_mod_p) * q_inv_mod_p).retrieve();

        h.mul_wide(q).wrapping_add(&x_q.to_wide())
    }

    /// Returns ``true`` if `x` is a quadratic residue modulo `p` and modulo `q`.
    ///
    /// Uses Euler's criterion, so both residues must be non-zero.
    pub fn is_residue(&self, residues: &(P::HalfUintMod, P::HalfUintMod)) -> bool {
        is_residue_mod_prime::<P>(&residues.0, self.p.expose_secret())
            && is_residue_mod_prime::<P>(&residues.1, self.q.expose_secret())
    }

    /// Returns ``true`` if `x` is a quadratic residue modulo exactly one of `p` and `q`
    /// (and therefore has the Jacobi symbol $-1$ modulo $N$).
    pub fn is_jacobi_minus_one(&self, residues: &(P::HalfUintMod, P::HalfUintMod)) -> bool {
        is_residue_mod_prime::<P>(&residues.0, self.p.expose_secret())
            != is_residue_mod_prime::<P>(&residues.1, self.q.expose_secret())
    }

    /// Returns a fourth root of a value that is a quadratic residue modulo both `p` and `q`.
    ///
    /// For $p = 3 \mod 4$ the square root of a residue `a` is $a^{(p + 1) / 4}$,
    /// and the result is itself a residue, so taking it twice gives a fourth root.
    pub fn fourth_root(&self, residues: &(P::HalfUintMod, P::HalfUintMod)) -> (P::HalfUintMod, P::HalfUintMod) {
        let root = |x: &P::HalfUintMod, prime: &P::HalfUint| {
            // (p + 1) / 4 == (p >> 2) + 1 when p = 3 mod 4
            let exponent = (*prime >> 2u32).wrapping_add(&<P::HalfUint as Integer>::one());
            let square_root = x.pow_bounded_exp(&exponent, P::PRIME_BITS);
            square_root.pow_bounded_exp(&exponent, P::PRIME_BITS)
        };
        (
            root(&residues.0, self.p.expose_secret()),
            root(&residues.1, self.q.expose_secret()),
        )
    }
}

fn is_residue_mod_prime<P: PaillierParams>(x: &P::HalfUintMod, prime: &P::HalfUint) -> bool {
    let exponent = *prime >> 1u32;
    x.pow_bounded_exp(&exponent, P::PRIME_BITS) == P::HalfUintMod::one(x.params().clone())
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{NonZero, RandomMod};
    use rand_core::OsRng;

    use super::SecretPrimes;
    use crate::{dev::PaillierTest, paillier::PaillierParams};

    type Uint = <PaillierTest as PaillierParams>::Uint;

    #[test]
    fn totient_and_modulus() {
        let primes = SecretPrimes::<PaillierTest>::random_safe(&mut OsRng);
        let modulus = primes.modulus();
        assert_eq!(modulus.bits_vartime(), PaillierTest::MODULUS_BITS);
        assert!(primes.totient().expose_secret() < &modulus);
    }

    #[test]
    fn rns_and_roots() {
        let primes = SecretPrimes::<PaillierTest>::random_safe(&mut OsRng);
        let modulus = NonZero::new(primes.modulus()).unwrap();
        let x = Uint::random_mod(&mut OsRng, &modulus);
        let residues = primes.rns_split(&x);
        assert_eq!(primes.rns_join(&residues), x);

        // A fourth power is a residue, and its computed fourth root is a valid one.
        let (x_p, x_q) = residues;
        let x4 = (x_p * x_p * x_p * x_p, x_q * x_q * x_q * x_q);
        assert!(primes.is_residue(&x4));
        let (r_p, r_q) = primes.fourth_root(&x4);
        assert_eq!((r_p * r_p * r_p * r_p, r_q * r_q * r_q * r_q), x4);
    }
}
