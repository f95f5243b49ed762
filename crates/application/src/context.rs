//! Caller identity carried through every operation.

use civicwatch_domain::{UserId, UserRole};

/// The verified identity behind a request.
///
/// Built by the transport layer from the identity provider's claims and
/// passed explicitly into each service call. Core code never reaches into
/// ambient or thread-local state for "the current user".
#[derive(Debug, Clone)]
pub struct ActorContext {
    /// The authenticated user
    pub user_id: UserId,
    /// Role claim supplied by the identity provider
    pub role: UserRole,
    /// Request correlation ID for tracing
    pub correlation_id: String,
}

impl ActorContext {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// A citizen actor.
    pub fn citizen(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Citizen)
    }

    /// An authority actor.
    pub fn authority(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Authority)
    }

    /// An admin actor.
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Admin)
    }

    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicwatch_domain::UserRole;

    #[test]
    fn test_role_constructors() {
        let id = UserId::new();
        assert_eq!(ActorContext::citizen(id).role, UserRole::Citizen);
        assert_eq!(ActorContext::authority(id).role, UserRole::Authority);
        assert_eq!(ActorContext::admin(id).role, UserRole::Admin);
    }

    #[test]
    fn test_correlation_id_override() {
        let ctx = ActorContext::citizen(UserId::new()).with_correlation("req-42");
        assert_eq!(ctx.correlation_id, "req-42");
    }
}
