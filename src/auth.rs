//! Identity collaborator. The real resolver lives at the transport layer;
//! services only need "who is calling, if anyone".

use uuid::Uuid;

use crate::error::RideError;

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<Uuid>;
}

/// Always resolves to one user. Used by tests and single-principal wiring.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdentity(pub Uuid);

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> Option<Uuid> {
        Some(self.0)
    }
}

/// Never resolves. Mutating operations against it fail with
/// `Unauthenticated`.
#[derive(Debug, Clone, Copy)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_user(&self) -> Option<Uuid> {
        None
    }
}

pub fn require_user(identity: &dyn IdentityProvider) -> Result<Uuid, RideError> {
    identity.current_user().ok_or(RideError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_identity_resolves() {
        let id = Uuid::new_v4();
        assert_eq!(require_user(&FixedIdentity(id)).unwrap(), id);
    }

    #[test]
    fn anonymous_is_rejected() {
        assert!(matches!(
            require_user(&Anonymous),
            Err(RideError::Unauthenticated)
        ));
    }
}
