//! Authentication service
//!
//! Two credential pools back the login endpoint: staff accounts keyed by
//! username and borrower accounts keyed by the registrar-issued external
//! id. Every failure collapses into the same opaque error so callers
//! cannot tell an unknown identifier from a wrong password.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::staff::{Claims, Role},
    repository::Repository,
};

/// The principal resolved by a successful login
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i32,
    pub identifier: String,
    pub name: Option<String>,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate an identifier/secret pair and issue a JWT.
    ///
    /// A role hint narrows the lookup to one pool; without one, staff
    /// usernames are tried before borrower external ids.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
        role_hint: Option<Role>,
    ) -> AppResult<(String, Principal)> {
        let try_staff = role_hint.map(|r| r.is_staff()).unwrap_or(true);
        let try_borrowers = role_hint.map(|r| !r.is_staff()).unwrap_or(true);

        if try_staff {
            if let Some(staff) = self.repository.staff.get_by_username(identifier).await? {
                if self.verify_password(&staff.password, password)? {
                    let principal = Principal {
                        id: staff.id,
                        identifier: staff.username,
                        name: staff.name,
                        role: staff.role,
                    };
                    let token = self.create_token(&principal)?;
                    return Ok((token, principal));
                }
                // The pools are independent: an identifier may exist in
                // both, so a staff miss still gets a borrower lookup
            }
        }

        if try_borrowers {
            if let Some(borrower) = self.repository.borrowers.get_by_external_id(identifier).await? {
                // A borrower without a stored hash has no login access
                let hash = borrower.password.as_deref().ok_or_else(AppError::invalid_credentials)?;
                if self.verify_password(hash, password)? {
                    let principal = Principal {
                        id: borrower.id,
                        identifier: borrower.external_id,
                        name: Some(borrower.name),
                        role: Role::from(borrower.kind),
                    };
                    let token = self.create_token(&principal)?;
                    return Ok((token, principal));
                }
            }
        }

        Err(AppError::invalid_credentials())
    }

    /// Create a JWT for a resolved principal
    fn create_token(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = Claims {
            sub: principal.identifier.clone(),
            principal_id: principal.id,
            role: principal.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a password against a stored argon2 hash
    fn verify_password(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Change the authenticated principal's own password. The current
    /// password must verify first; failures are as opaque as login.
    pub async fn change_password(
        &self,
        claims: &Claims,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let new_hash = if claims.role.is_staff() {
            let staff = self.repository.staff.get_by_id(claims.principal_id).await?;
            if !self.verify_password(&staff.password, current_password)? {
                return Err(AppError::invalid_credentials());
            }
            self.hash_password(new_password)?
        } else {
            let borrower = self.repository.borrowers.get_by_id(claims.principal_id).await?;
            let stored = borrower
                .password
                .as_deref()
                .ok_or_else(AppError::invalid_credentials)?;
            if !self.verify_password(stored, current_password)? {
                return Err(AppError::invalid_credentials());
            }
            self.hash_password(new_password)?
        };

        if claims.role.is_staff() {
            self.repository.staff.set_password(claims.principal_id, &new_hash).await
        } else {
            self.repository.borrowers.set_password(claims.principal_id, &new_hash).await
        }
    }

    /// Create the configured admin account when the staff table is empty,
    /// so a fresh deployment can be signed into.
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        if self.repository.staff.count().await? > 0 {
            return Ok(());
        }

        let hash = self.hash_password(&self.config.bootstrap_admin_password)?;
        self.repository
            .staff
            .create(&self.config.bootstrap_admin_username, &hash, None, Role::Admin)
            .await?;
        tracing::info!(
            username = %self.config.bootstrap_admin_username,
            "Created bootstrap admin account"
        );
        Ok(())
    }
}
