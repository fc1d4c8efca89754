//! Borrower model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Borrower kind (student or faculty member)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerKind {
    Student,
    Faculty,
}

impl BorrowerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowerKind::Student => "student",
            BorrowerKind::Faculty => "faculty",
        }
    }
}

impl std::fmt::Display for BorrowerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(BorrowerKind::Student),
            "faculty" => Ok(BorrowerKind::Faculty),
            _ => Err(format!("Invalid borrower kind: {}", s)),
        }
    }
}

// SQLx conversion for BorrowerKind (stored as text)
impl sqlx::Type<Postgres> for BorrowerKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowerKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowerKind {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full borrower model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i32,
    pub name: String,
    /// Student or faculty id assigned by the college registrar
    pub external_id: String,
    pub email: String,
    pub department: Option<String>,
    pub kind: BorrowerKind,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short borrower representation embedded in assignment rows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowerSummary {
    pub id: i32,
    pub name: String,
    pub external_id: String,
    pub kind: BorrowerKind,
}

/// Borrower query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowerQuery {
    /// Case-insensitive substring match on name or email
    pub search: Option<String>,
    pub kind: Option<BorrowerKind>,
    pub department: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create borrower request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "External id must not be empty"))]
    pub external_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub department: Option<String>,
    pub kind: BorrowerKind,
    /// Optional login password. A borrower without one cannot sign in but
    /// can still borrow through the front desk.
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
}

/// Update borrower request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBorrower {
    pub name: Option<String>,
    pub external_id: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub department: Option<String>,
    pub kind: Option<BorrowerKind>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_text() {
        for kind in [BorrowerKind::Student, BorrowerKind::Faculty] {
            let parsed: BorrowerKind = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("staff".parse::<BorrowerKind>().is_err());
    }

    #[test]
    fn create_borrower_validates_email() {
        let req = CreateBorrower {
            name: "Ada".to_string(),
            external_id: "CS-1815".to_string(),
            email: "not-an-email".to_string(),
            department: None,
            kind: BorrowerKind::Student,
            password: None,
        };
        assert!(req.validate().is_err());
    }
}
