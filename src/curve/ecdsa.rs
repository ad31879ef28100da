use k256::ecdsa::{RecoveryId, Signature as BackendSignature, VerifyingKey};

use super::arithmetic::{Point, Scalar};

/// A wrapper for a signature and public key recovery info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: BackendSignature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Assembles a signature of `message` from its components,
    /// normalizing `s` and finding the recovery id for `verifying_key`.
    ///
    /// Returns `None` if the scalars do not form a valid signature for the key.
    pub(crate) fn from_scalars(r: &Scalar, s: &Scalar, verifying_key: &Point, message: &Scalar) -> Option<Self> {
        let signature = BackendSignature::from_scalars(r.to_backend(), s.to_backend()).ok()?;

        // Normalize the `s` component.
        // `BackendSignature`'s constructor does not require `s` to be normalized,
        // but consequent usage of it may fail otherwise.
        let signature = signature.normalize_s().unwrap_or(signature);

        let message_bytes = message.to_bytes();
        let recovery_id = RecoveryId::trial_recovery_from_prehash(
            &VerifyingKey::from_affine(verifying_key.to_backend().to_affine()).ok()?,
            &message_bytes,
            &signature,
        )
        .ok()?;

        Some(Self { signature, recovery_id })
    }

    /// The signature itself.
    pub fn signature(&self) -> &BackendSignature {
        &self.signature
    }

    /// The public key recovery info.
    pub fn recovery_id(&self) -> RecoveryId {
        self.recovery_id
    }

    /// Unwraps into the signature and recovery info objects from the backend crate.
    pub fn to_backend(self) -> (BackendSignature, RecoveryId) {
        (self.signature, self.recovery_id)
    }
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{signature::hazmat::PrehashVerifier, VerifyingKey};
    use rand_core::OsRng;

    use super::RecoverableSignature;
    use crate::curve::Scalar;

    #[test]
    fn assemble_and_recover() {
        let prehash = [7u8; 32];
        let message = Scalar::from_prehash(&prehash);

        let x = Scalar::random_nonzero(&mut OsRng);
        let k = Scalar::random_nonzero(&mut OsRng);
        let public_key = x.mul_by_generator();

        let r = k.mul_by_generator().x_coordinate();
        let k_inv = Option::<Scalar>::from(k.invert()).unwrap();
        let s = k_inv * (message + r * x);

        let signature = RecoverableSignature::from_scalars(&r, &s, &public_key, &message).unwrap();
        let (backend, recovery_id) = signature.to_backend();

        let verifying_key = public_key.to_verifying_key().unwrap();
        assert!(verifying_key.verify_prehash(&prehash, &backend).is_ok());
        assert_eq!(
            VerifyingKey::recover_from_prehash(&prehash, &backend, recovery_id).unwrap(),
            verifying_key
        );

        // A signature by a different key cannot be assembled for this one.
        let other_key = Scalar::random_nonzero(&mut OsRng).mul_by_generator();
        assert!(RecoverableSignature::from_scalars(&r, &s, &other_key, &message).is_none());

        assert!(RecoverableSignature::from_scalars(&Scalar::ZERO, &s, &public_key, &message).is_none());
    }
}
