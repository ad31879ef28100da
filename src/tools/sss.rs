use alloc::{collections::BTreeMap, vec::Vec};

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{Point, Scalar},
    tools::Secret,
};

/// The point at which a party's share of a polynomial is evaluated.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ShareId(Scalar);

impl ShareId {
    pub fn new(x: Scalar) -> Self {
        Self(x)
    }
}

#[derive(displaydoc::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PolynomialSumError {
    /// No polynomials to sum
    Empty,
    /// Polynomials have inconsistent degrees
    InconsistentDegree,
}

/// A secret polynomial with scalar coefficients, lowest degree first.
#[derive(Debug, Clone)]
pub(crate) struct Polynomial(Vec<Secret<Scalar>>);

impl Polynomial {
    /// Creates a polynomial of the given degree with the constant term `coeff0`
    /// and the rest of the coefficients chosen at random.
    pub fn random(rng: &mut impl CryptoRngCore, coeff0: Secret<Scalar>, degree: usize) -> Self {
        let mut coeffs = Vec::with_capacity(degree + 1);
        coeffs.push(coeff0);
        for _ in 0..degree {
            coeffs.push(Secret::init_with(|| Scalar::random_nonzero(rng)));
        }
        Self(coeffs)
    }

    pub fn evaluate(&self, x: &ShareId) -> Secret<Scalar> {
        // Evaluate in reverse to save on multiplications.
        // Basically: a0 + a1 x + a2 x^2 + a3 x^3 == (((a3 x) + a2) x + a1) x + a0
        Secret::init_with(|| {
            self.0
                .iter()
                .rev()
                .fold(Scalar::ZERO, |acc, coeff| acc * x.0 + coeff.expose_secret())
        })
    }

    pub fn public(&self) -> PublicPolynomial {
        PublicPolynomial(
            self.0
                .iter()
                .map(|coeff| coeff.expose_secret().mul_by_generator())
                .collect(),
        )
    }
}

/// A Feldman commitment to a polynomial: its coefficients multiplied by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PublicPolynomial(Vec<Point>);

impl PublicPolynomial {
    pub fn evaluate(&self, x: &ShareId) -> Point {
        self.0
            .iter()
            .rev()
            .fold(Point::IDENTITY, |acc, coeff| acc * &x.0 + *coeff)
    }

    pub fn coeff0(&self) -> Option<&Point> {
        self.0.first()
    }

    /// The number of coefficients, that is, the degree plus one.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Adds the polynomials coefficient-wise.
    pub fn sum<'a>(polynomials: impl IntoIterator<Item = &'a PublicPolynomial>) -> Result<Self, PolynomialSumError> {
        let mut polynomials = polynomials.into_iter();
        let mut result = polynomials.next().ok_or(PolynomialSumError::Empty)?.clone();
        for polynomial in polynomials {
            if polynomial.0.len() != result.0.len() {
                return Err(PolynomialSumError::InconsistentDegree);
            }
            for (acc, coeff) in result.0.iter_mut().zip(polynomial.0.iter()) {
                *acc = *acc + *coeff;
            }
        }
        Ok(result)
    }
}

/// Returns the Lagrange coefficient for `share_id` evaluated at zero.
pub(crate) fn interpolation_coeff<'a>(share_ids: impl Iterator<Item = &'a ShareId>, share_id: &ShareId) -> Scalar {
    share_ids
        .filter(|id| *id != share_id)
        .map(|id| {
            id.0 * Option::<Scalar>::from((id.0 - share_id.0).invert())
                .expect("all share IDs are distinct as enforced by BTreeMap")
        })
        .product()
}

pub(crate) fn shamir_join_points(pairs: &BTreeMap<ShareId, Point>) -> Point {
    pairs
        .iter()
        .map(|(share_id, val)| *val * interpolation_coeff(pairs.keys(), share_id))
        .sum()
}

#[cfg(test)]
pub(crate) fn shamir_join_scalars(pairs: &BTreeMap<ShareId, Scalar>) -> Scalar {
    pairs
        .iter()
        .map(|(share_id, val)| *val * interpolation_coeff(pairs.keys(), share_id))
        .sum()
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;

    use rand_core::OsRng;

    use super::{shamir_join_points, shamir_join_scalars, Polynomial, PolynomialSumError, PublicPolynomial, ShareId};
    use crate::{curve::Scalar, tools::Secret};

    fn share_ids(num: u64) -> Vec<ShareId> {
        (1..=num).map(|idx| ShareId::new(Scalar::from(idx))).collect()
    }

    #[test]
    fn evaluate() {
        let x = ShareId::new(Scalar::random(&mut OsRng));
        let coeffs = (0..4).map(|_| Scalar::random(&mut OsRng)).collect::<Vec<_>>();
        let polynomial = Polynomial(coeffs.iter().map(|c| Secret::init_with(|| *c)).collect());

        let x_val = x.0;
        let expected = coeffs[0] + coeffs[1] * x_val + coeffs[2] * x_val * x_val + coeffs[3] * x_val * x_val * x_val;

        assert_eq!(polynomial.evaluate(&x).expose_secret(), &expected);
        assert_eq!(polynomial.public().evaluate(&x), expected.mul_by_generator());
    }

    #[test]
    fn split_and_join() {
        let degree = 2;
        let secret = Scalar::random(&mut OsRng);
        let polynomial = Polynomial::random(&mut OsRng, Secret::init_with(|| secret), degree);
        let ids = share_ids(5);

        // Any `degree + 1` shares are enough.
        let scalars = ids
            .iter()
            .skip(2)
            .map(|id| (*id, *polynomial.evaluate(id).expose_secret()))
            .collect::<BTreeMap<_, _>>();
        assert_eq!(shamir_join_scalars(&scalars), secret);

        let points = scalars
            .iter()
            .map(|(id, val)| (*id, val.mul_by_generator()))
            .collect::<BTreeMap<_, _>>();
        assert_eq!(shamir_join_points(&points), secret.mul_by_generator());
    }

    #[test]
    fn sum_is_homomorphic() {
        let p1 = Polynomial::random(&mut OsRng, Secret::init_with(|| Scalar::random(&mut OsRng)), 2);
        let p2 = Polynomial::random(&mut OsRng, Secret::init_with(|| Scalar::random(&mut OsRng)), 2);
        let sum = PublicPolynomial::sum([&p1.public(), &p2.public()]).unwrap();

        let x = ShareId::new(Scalar::from(7u64));
        let expected = *p1.evaluate(&x).expose_secret() + *p2.evaluate(&x).expose_secret();
        assert_eq!(sum.evaluate(&x), expected.mul_by_generator());
    }

    #[test]
    fn sum_rejects_inconsistent_degrees() {
        let p1 = Polynomial::random(&mut OsRng, Secret::init_with(|| Scalar::ONE), 2).public();
        let p2 = Polynomial::random(&mut OsRng, Secret::init_with(|| Scalar::ONE), 1).public();
        assert_eq!(
            PublicPolynomial::sum([&p1, &p2]),
            Err(PolynomialSumError::InconsistentDegree)
        );
        assert_eq!(PublicPolynomial::sum(core::iter::empty()), Err(PolynomialSumError::Empty));
    }
}
