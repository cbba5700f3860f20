use actix_web::{
    Error as ActixError, FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized,
    web::Data,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::User;
use crate::database::repositories::UserRepository;
use crate::error::AppError;

/// The identity assertion minted by the external identity provider's
/// session layer. The backend only verifies it; authentication itself
/// (the OAuth handshake) never happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Display name for the user row; falls back to the mailbox name when
    /// the provider sent none.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or("Anonymous")
                .to_string(),
        }
    }
}

impl FromRequest for Claims {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_header = req.headers().get("Authorization");

        if let Some(auth_header) = auth_header {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    // Get the config from app data
                    if let Some(config) = req.app_data::<Data<Config>>() {
                        match decode::<Claims>(
                            token,
                            &DecodingKey::from_secret(config.session_secret.as_ref()),
                            &Validation::new(Algorithm::HS256),
                        ) {
                            Ok(token_data) => {
                                return ready(Ok(token_data.claims));
                            }
                            Err(_) => {
                                return ready(Err(ErrorUnauthorized("Invalid session token")));
                            }
                        }
                    }
                }
            }
        }

        ready(Err(ErrorUnauthorized(
            "Missing or invalid authorization header",
        )))
    }
}

#[derive(Clone)]
pub struct IdentityService {
    users: UserRepository,
}

impl IdentityService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// First-sign-in hook: create the user row for a fresh session, or
    /// refresh name/image for a returning one.
    pub async fn ensure_user(&self, claims: &Claims) -> Result<User, AppError> {
        let user = self
            .users
            .upsert_from_session(
                claims.sub,
                &claims.display_name(),
                &claims.email,
                claims.picture.as_deref(),
            )
            .await?;

        Ok(user)
    }

    /// Resolve the session to its user row. A verified token whose user
    /// row is missing means the session predates this database; the caller
    /// must go through `ensure_user` first.
    pub async fn require_user(&self, claims: &Claims) -> Result<User, AppError> {
        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    pub async fn require_admin(&self, claims: &Claims) -> Result<User, AppError> {
        let user = self.require_user(claims).await?;
        if !user.is_admin() {
            return Err(AppError::Unauthorized(
                "Only admins can perform this action".to_string(),
            ));
        }
        Ok(user)
    }

    /// Admins and moderators may read the admin dashboards.
    pub async fn require_staff(&self, claims: &Claims) -> Result<User, AppError> {
        let user = self.require_user(claims).await?;
        if !user.is_staff() {
            return Err(AppError::Unauthorized(
                "Only staff can access the dashboard".to_string(),
            ));
        }
        Ok(user)
    }
}
