//! Staff accounts, roles and JWT session claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

use super::borrower::BorrowerKind;

/// Closed role enumeration. Authorization is decided by the capability
/// predicates below, never by string comparison at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Student,
    Faculty,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Student => "student",
            Role::Faculty => "faculty",
        }
    }

    /// Staff roles work the front desk; students and faculty are borrowers.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }

    pub fn can_manage_catalog(&self) -> bool {
        self.is_staff()
    }

    pub fn can_manage_borrowers(&self) -> bool {
        self.is_staff()
    }

    /// Recording borrows, returns and fine payments
    pub fn can_record_loans(&self) -> bool {
        self.is_staff()
    }

    pub fn can_view_ledger(&self) -> bool {
        self.is_staff()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "librarian" => Ok(Role::Librarian),
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl From<BorrowerKind> for Role {
    fn from(kind: BorrowerKind) -> Self {
        match kind {
            BorrowerKind::Student => Role::Student,
            BorrowerKind::Faculty => Role::Faculty,
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Staff (librarian/admin) account from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Staff {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// JWT claims for authenticated principals (staff or borrowers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login identifier (staff username or borrower external id)
    pub sub: String,
    /// Staff id or borrower id depending on `role`
    pub principal_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    // Authorization checks. Each fails before the handler touches any
    // state, so a rejected request never partially executes.
    pub fn require_catalog_write(&self) -> Result<(), AppError> {
        if self.role.can_manage_catalog() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to manage the catalog".to_string()))
        }
    }

    pub fn require_borrower_write(&self) -> Result<(), AppError> {
        if self.role.can_manage_borrowers() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to manage borrowers".to_string()))
        }
    }

    pub fn require_circulation(&self) -> Result<(), AppError> {
        if self.role.can_record_loans() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to record loans".to_string()))
        }
    }

    pub fn require_ledger_read(&self) -> Result<(), AppError> {
        if self.role.can_view_ledger() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to read the ledger".to_string()))
        }
    }

    /// Staff see every borrower; a borrower only sees their own record.
    pub fn require_self_or_staff(&self, borrower_id: i32) -> Result<(), AppError> {
        if self.role.is_staff() || (!self.role.is_staff() && self.principal_id == borrower_id) {
            Ok(())
        } else {
            Err(AppError::Authorization("Access limited to your own record".to_string()))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
