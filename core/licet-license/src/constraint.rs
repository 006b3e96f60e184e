//! Checks on the caller-defined constraint payload of a license.

use licet_cert::BoxError;
use licet_persist::Opaque;

/// Decides whether the current environment satisfies a license's constraint
/// payload.
///
/// `Ok(false)` and `Err` both reject the license; `Err` carries the reason
/// the check could not be made. A checker that does not recognize the
/// payload type should return `Ok(false)`.
pub trait ConstraintChecker: Send + Sync {
    fn evaluate(&self, payload: &Opaque) -> Result<bool, BoxError>;
}

impl<F> ConstraintChecker for F
where
    F: Fn(&Opaque) -> Result<bool, BoxError> + Send + Sync,
{
    fn evaluate(&self, payload: &Opaque) -> Result<bool, BoxError> {
        self(payload)
    }
}
