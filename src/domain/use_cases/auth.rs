use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::entities::token::{AuthResponse, Claims};
use crate::entities::user::{LoginUser, NewUser, NewUserResponse, User};
use crate::errors::{AppError, AuthError};
use crate::interfaces::repositories::user::UserRepository;
use crate::auth::jwt::JwtService;
use crate::auth::password::{hash_password, verify_password};

pub struct AuthHandler {
    pub user_repo: Arc<dyn UserRepository>,
    pub token_service: JwtService,
}

impl AuthHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>, token_service: JwtService) -> Self {
        AuthHandler {
            user_repo,
            token_service,
        }
    }

    /// Registers a new user after validation and password hashing. Role is
    /// always `user`; there is no in-app promotion path.
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        request.validate()?;

        let hashed_password = hash_password(&request.password)?;
        let user_insert = request.prepare_for_insert(hashed_password);

        let id = self.user_repo.create_user(&user_insert).await?;
        Ok(NewUserResponse {
            id,
            message: "User created successfully".to_string(),
        })
    }

    /// Logs in a user by validating credentials and issuing a token pair.
    /// Accounts provisioned by an external identity provider have no local
    /// hash and cannot log in with a password.
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self.user_repo.get_user_by_email(&request.email)
            .await
            .map_err(|_e| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        let password_hash = user.password_hash.as_deref()
            .ok_or(AuthError::WrongCredentials)?;

        let is_password_valid = verify_password(&request.password, password_hash)
            .map_err(|_| AuthError::WrongCredentials)?;
        if !is_password_valid {
            return Err(AuthError::WrongCredentials);
        }

        let response = self.create_auth_response(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(response)
    }

    pub fn create_auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self.token_service.create_session_token(user)
            .map_err(|e| {
                tracing::warn!("Failed to create session token: {}", e);
                AuthError::TokenCreation
            })?;

        let refresh_token = self.token_service.create_refresh_token(&user.id)
            .map_err(|e| {
                tracing::warn!("Failed to create refresh token: {}", e);
                AuthError::TokenCreation
            })?;
        Ok(AuthResponse::new(access_token, refresh_token))
    }

    /// Refreshes the access token using the refresh token.
    pub async fn refresh_token(&self, token: &str) -> Result<AuthResponse, AuthError> {
        let decoded = self.token_service.decode_refresh_token(token)?;
        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AuthError::InvalidUserId)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        self.create_auth_response(&user)
    }

    /// Re-resolves the caller from the user table. Token claims are a hint
    /// only; every privileged or mutating check goes through here so that
    /// out-of-band role changes take effect without waiting for token
    /// re-issuance.
    pub async fn resolve_identity(&self, claims: &Claims) -> Result<User, AppError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::UnauthorizedAccess)?;

        self.user_repo.get_user_by_id(&user_id)
            .await?
            .ok_or(AppError::UnauthorizedAccess)
    }

    /// Resolves the caller and gates on the persisted admin role.
    pub async fn require_admin(&self, claims: &Claims) -> Result<User, AppError> {
        let user = self.resolve_identity(claims).await?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(AppError::ForbiddenAccess)
        }
    }
}

/// Owner-or-admin gate used by every review mutation.
pub fn authorize_owner_or_admin(caller: &User, author_id: &Uuid) -> Result<(), AppError> {
    if caller.id == *author_id || caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::ForbiddenAccess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::ROLE_ADMIN;
    use chrono::Utc;

    fn user_with_role(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            name: None,
            password_hash: None,
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_may_mutate_own_review() {
        let caller = user_with_role("user");
        assert!(authorize_owner_or_admin(&caller, &caller.id).is_ok());
    }

    #[test]
    fn admin_may_mutate_any_review() {
        let caller = user_with_role(ROLE_ADMIN);
        assert!(authorize_owner_or_admin(&caller, &Uuid::new_v4()).is_ok());
    }

    #[test]
    fn other_users_are_forbidden() {
        let caller = user_with_role("user");
        let result = authorize_owner_or_admin(&caller, &Uuid::new_v4());
        assert!(matches!(result, Err(AppError::ForbiddenAccess)));
    }
}
