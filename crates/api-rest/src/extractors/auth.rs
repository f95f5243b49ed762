//! Authentication extractor.
//!
//! Tokens are minted by the identity provider; this layer only verifies the
//! signature and lifts the claims into an [`ActorContext`] for service calls.

use crate::{error::ApiError, state::AppState};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use civicwatch_application::ActorContext;
use civicwatch_domain::{UserId, UserRole};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims stored in the JWT token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User role
    pub role: UserRole,

    /// Expiration time (as UTC timestamp)
    pub exp: usize,

    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

impl Claims {
    /// Get user ID from claims
    pub fn user_id(&self) -> Result<UserId, ApiError> {
        Uuid::parse_str(&self.sub)
            .map(UserId::from)
            .map_err(|_| ApiError::InvalidToken("Invalid user ID in token".to_string()))
    }
}

/// Authenticated user information extracted from the JWT
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID
    pub user_id: UserId,

    /// User role
    pub role: UserRole,

    /// Original claims
    pub claims: Claims,

    request_id: Option<String>,
}

impl AuthenticatedUser {
    /// Actor context for core operations, correlated with the request id.
    pub fn actor(&self) -> ActorContext {
        let actor = match self.role {
            UserRole::Citizen => ActorContext::citizen(self.user_id),
            UserRole::Authority => ActorContext::authority(self.user_id),
            UserRole::Admin => ActorContext::admin(self.user_id),
        };

        match &self.request_id {
            Some(request_id) => actor.with_correlation(request_id.clone()),
            None => actor,
        }
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::InvalidToken("Invalid authorization header format".to_string())
        })?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::InvalidToken(format!("Token validation failed: {e}")))?;

        let claims = token_data.claims;
        let user_id = claims.user_id()?;

        // Placed by the request-id middleware before routing
        let request_id = parts.extensions.get::<String>().cloned();

        Ok(Self {
            user_id,
            role: claims.role,
            claims,
            request_id,
        })
    }
}
