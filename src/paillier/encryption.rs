use crypto_bigint::{modular::Retrieve, Integer, Invert, NonZero, PowBoundedExp, WrappingAdd, WrappingSub};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::{
    keys::{PublicKeyPaillier, SecretKeyPaillier},
    params::PaillierParams,
};
use crate::{
    curve::Scalar,
    uint::{pow_signed_vartime, BoxedEncoding, Extendable, MulWide, Signed, ToMontgomery},
};

/// A Paillier ciphertext, an element of $\mathbb{Z}_{N^2}$.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub(crate) struct Ciphertext<P: PaillierParams> {
    ciphertext: P::WideUint,
}

impl<P: PaillierParams> Ciphertext<P> {
    /// Encrypts `plaintext` (which must be smaller than the modulus)
    /// as $(1 + m N) r^N \mod N^2$ with a random invertible `r`.
    pub fn new(rng: &mut impl CryptoRngCore, pk: &PublicKeyPaillier<P>, plaintext: &P::Uint) -> Self {
        debug_assert!(plaintext < pk.modulus());
        let randomizer = pk.random_invertible_residue(rng).retrieve();
        Self::new_with_randomizer(pk, plaintext, &randomizer)
    }

    /// Encrypts `plaintext` with the given randomizer $r \in \mathbb{Z}_N^*$.
    pub fn new_with_randomizer(pk: &PublicKeyPaillier<P>, plaintext: &P::Uint, randomizer: &P::Uint) -> Self {
        let randomizer = randomizer
            .to_wide()
            .to_montgomery(pk.monty_params_mod_n_squared())
            .pow_bounded_exp(pk.modulus(), P::MODULUS_BITS);

        // $(1 + N)^m = 1 + m N \mod N^2$
        let message = plaintext
            .mul_wide(pk.modulus())
            .wrapping_add(&<P::WideUint as Integer>::one())
            .to_montgomery(pk.monty_params_mod_n_squared());

        Self {
            ciphertext: (message * randomizer).retrieve(),
        }
    }

    /// Encrypts a signed plaintext, represented by its residue modulo $N$.
    pub fn new_with_randomizer_signed(
        pk: &PublicKeyPaillier<P>,
        plaintext: &Signed<P::Uint>,
        randomizer: &P::Uint,
    ) -> Self {
        let abs_value = plaintext.abs() % pk.modulus_nonzero();
        let residue = if plaintext.is_negative() {
            // For a zero `abs_value` this gives $N$, which encrypts to the same value as zero.
            pk.modulus().wrapping_sub(&abs_value)
        } else {
            abs_value
        };
        Self::new_with_randomizer(pk, &residue, randomizer)
    }

    /// Encrypts a curve scalar, taking its integer representative as the plaintext.
    pub fn new_scalar(rng: &mut impl CryptoRngCore, pk: &PublicKeyPaillier<P>, plaintext: &Scalar) -> Self {
        let bytes = plaintext.to_bytes();
        let mut padded = alloc::vec![0u8; <P::Uint as crypto_bigint::Bounded>::BYTES];
        let offset = padded.len() - bytes.len();
        padded
            .get_mut(offset..)
            .expect("`P::Uint` is wider than a scalar")
            .copy_from_slice(&bytes);
        let plaintext = P::Uint::try_from_be_bytes(&padded).expect("the buffer has the exact length of `P::Uint`");
        Self::new(rng, pk, &plaintext)
    }

    /// Returns `true` if the ciphertext is an invertible element of $\mathbb{Z}_{N^2}$.
    pub fn is_valid(&self, pk: &PublicKeyPaillier<P>) -> bool {
        if &self.ciphertext >= pk.modulus_squared() {
            return false;
        }
        let ciphertext = self.ciphertext.to_montgomery(pk.monty_params_mod_n_squared());
        ciphertext.invert().is_some().into()
    }

    /// Decrypts the ciphertext as $L(c^{\phi(N)} \mod N^2) \phi(N)^{-1} \mod N$, where $L(u) = (u - 1) / N$.
    ///
    /// Returns `None` if the ciphertext is not an invertible element of $\mathbb{Z}_{N^2}$.
    pub fn decrypt(&self, sk: &SecretKeyPaillier<P>) -> Option<P::Uint> {
        let pk = sk.public_key();
        if !self.is_valid(pk) {
            return None;
        }

        let ciphertext = self.ciphertext.to_montgomery(pk.monty_params_mod_n_squared());

        let totient = sk.totient().expose_secret();
        let u = ciphertext.pow_bounded_exp(totient, P::MODULUS_BITS).retrieve();
        let modulus_wide = NonZero::new(pk.modulus().to_wide()).expect("the modulus is non-zero");
        let l = u.wrapping_sub(&<P::WideUint as Integer>::one()) / modulus_wide;
        let l = P::Uint::try_from_wide(&l)?;

        let totient_inv = Option::<P::UintMod>::from(pk.to_montgomery(totient).invert())
            .expect("phi(N) is invertible modulo N for N = p q with distinct safe primes p, q");
        Some((pk.to_montgomery(&l) * totient_inv).retrieve())
    }

    /// Decrypts the ciphertext treating plaintexts greater than $N / 2$ as negative.
    pub fn decrypt_signed(&self, sk: &SecretKeyPaillier<P>) -> Option<Signed<P::Uint>> {
        let plaintext = self.decrypt(sk)?;
        let modulus = sk.public_key().modulus();
        if plaintext > (*modulus >> 1u32) {
            Signed::from_abs(modulus.wrapping_sub(&plaintext), true)
        } else {
            Signed::new_positive(plaintext)
        }
    }

    /// Returns $C^x \mod N^2$, an encryption of the plaintext multiplied by `factor`.
    ///
    /// Returns `None` if `factor` is negative and the ciphertext is not invertible.
    pub fn homomorphic_mul(&self, pk: &PublicKeyPaillier<P>, factor: &Signed<P::Uint>) -> Option<Self> {
        let ciphertext = self.ciphertext.to_montgomery(pk.monty_params_mod_n_squared());
        pow_signed_vartime(&ciphertext, factor).map(|ciphertext| Self {
            ciphertext: ciphertext.retrieve(),
        })
    }

    /// Returns $C_1 C_2 \mod N^2$, an encryption of the sum of the plaintexts.
    pub fn homomorphic_add(&self, pk: &PublicKeyPaillier<P>, other: &Self) -> Self {
        let lhs = self.ciphertext.to_montgomery(pk.monty_params_mod_n_squared());
        let rhs = other.ciphertext.to_montgomery(pk.monty_params_mod_n_squared());
        Self {
            ciphertext: (lhs * rhs).retrieve(),
        }
    }

    /// Decrypts the ciphertext into a curve scalar.
    ///
    /// Returns `None` if the ciphertext is invalid, or if the plaintext is not smaller than the curve order
    /// (so that the scalar would not be equal to the plaintext as an integer).
    pub fn decrypt_scalar(&self, sk: &SecretKeyPaillier<P>) -> Option<Scalar> {
        let plaintext = self.decrypt(sk)?;
        Scalar::try_from_be_bytes_exact(&plaintext.to_be_bytes())
    }

    #[cfg(test)]
    pub fn from_wide(ciphertext: P::WideUint) -> Self {
        Self { ciphertext }
    }

    /// Returns a ciphertext with one bit of the underlying integer flipped.
    #[cfg(test)]
    pub fn flip_bit(&self) -> Self {
        Self {
            ciphertext: self.ciphertext ^ <P::WideUint as Integer>::one(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{modular::Retrieve, RandomMod, U256};
    use rand_core::OsRng;

    use super::Ciphertext;
    use crate::{
        curve::Scalar,
        dev::PaillierTest,
        paillier::{PaillierParams, SecretKeyPaillier},
        uint::{Extendable, Signed},
    };

    type Uint = <PaillierTest as PaillierParams>::Uint;

    const ORDER: U256 = U256::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141");

    #[test]
    fn encrypt_decrypt() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let plaintext = Uint::random_mod(&mut OsRng, &pk.modulus_nonzero());
        let ciphertext = Ciphertext::new(&mut OsRng, pk, &plaintext);
        assert_eq!(ciphertext.decrypt(&sk), Some(plaintext));

        // Encryption is randomized.
        let other = Ciphertext::new(&mut OsRng, pk, &plaintext);
        assert_ne!(ciphertext, other);
        assert_eq!(other.decrypt(&sk), Some(plaintext));
    }

    #[test]
    fn scalar_plaintext_must_be_exact() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let scalar = Scalar::random(&mut OsRng);
        let ciphertext = Ciphertext::new_scalar(&mut OsRng, pk, &scalar);
        assert_eq!(ciphertext.decrypt_scalar(&sk), Some(scalar));

        // The curve order itself reduces to zero, but is not a valid representative.
        let order: Uint = ORDER.to_wide();
        let ciphertext = Ciphertext::new(&mut OsRng, pk, &order);
        assert_eq!(ciphertext.decrypt_scalar(&sk), None);

        let below_order: Uint = ORDER.wrapping_sub(&U256::ONE).to_wide();
        let ciphertext = Ciphertext::new(&mut OsRng, pk, &below_order);
        assert_eq!(ciphertext.decrypt_scalar(&sk), Some(-Scalar::ONE));
    }

    #[test]
    fn invalid_ciphertexts_are_rejected() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        // Out of range
        let too_big = Ciphertext::<PaillierTest>::from_wide(*pk.modulus_squared());
        assert_eq!(too_big.decrypt(&sk), None);

        // Not coprime with N
        let not_invertible = Ciphertext::<PaillierTest>::from_wide(pk.modulus().to_wide());
        assert_eq!(not_invertible.decrypt(&sk), None);
    }

    #[test]
    fn signed_homomorphic_operations() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let x = Signed::<Uint>::random_in_range_bits(&mut OsRng, 256);
        let y = Signed::<Uint>::random_in_range_bits(&mut OsRng, 256);
        let a = Signed::<Uint>::random_in_range_bits(&mut OsRng, 256);

        let randomizer = pk.random_invertible_residue(&mut OsRng).retrieve();
        let cap_x = Ciphertext::new_with_randomizer_signed(pk, &x, &randomizer);
        assert_eq!(cap_x.decrypt_signed(&sk), Some(x));

        let randomizer = pk.random_invertible_residue(&mut OsRng).retrieve();
        let cap_y = Ciphertext::new_with_randomizer_signed(pk, &y, &randomizer);

        // x * a + y, both for positive and negative `a`
        let result = cap_x.homomorphic_mul(pk, &a).unwrap().homomorphic_add(pk, &cap_y);
        assert_eq!(result.decrypt_signed(&sk), Some(x * a + y));
        let result = cap_x.homomorphic_mul(pk, &-a).unwrap().homomorphic_add(pk, &cap_y);
        assert_eq!(result.decrypt_signed(&sk), Some(y - x * a));
    }
}
